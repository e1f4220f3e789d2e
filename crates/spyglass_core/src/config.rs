//! Scroll-spy configuration
//!
//! A [`SpyConfig`] can be built in code with the `with_*` setters or loaded
//! from a TOML or JSON document:
//!
//! ```toml
//! items = ["intro", "usage", "api"]
//! current_class_name = "is-current"
//! scrolled_past_class_name = "is-past"
//! offset = -20.0
//! root = { element = "docs-scroll" }
//! ```

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::scan::ScanOptions;

/// Default throttle interval for scroll-driven scans (ms)
pub const DEFAULT_THROTTLE_MS: u64 = 100;

/// Default wait between (re)configuration and the first scan (ms)
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 100;

/// Which scroll container a spy observes
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootSelector {
    /// The whole document viewport
    #[default]
    Document,
    /// A scroll container looked up by element id
    Element(String),
}

impl RootSelector {
    /// Select a scroll container by id
    pub fn element(id: impl Into<String>) -> Self {
        RootSelector::Element(id.into())
    }
}

impl std::fmt::Display for RootSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RootSelector::Document => f.write_str("document"),
            RootSelector::Element(id) => write!(f, "#{}", id),
        }
    }
}

/// Configuration for one scroll-spy instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpyConfig {
    /// Target element ids, in scroll order
    #[serde(default)]
    pub items: Vec<String>,
    /// Class added to the child of the current target
    pub current_class_name: String,
    /// Class added to children of targets already scrolled past.
    /// Leaving it unset skips the scrolled-past computation.
    #[serde(default)]
    pub scrolled_past_class_name: Option<String>,
    /// Pixel shift applied to each target's top edge
    #[serde(default)]
    pub offset: f32,
    /// Scroll container to observe
    #[serde(default)]
    pub root: RootSelector,
    /// Tag of the rendered wrapper element
    #[serde(default = "default_component_tag")]
    pub component_tag: String,
    /// Class of the rendered wrapper element
    #[serde(default)]
    pub class_name: Option<String>,
    /// Inline style of the rendered wrapper element
    #[serde(default)]
    pub style: IndexMap<String, String>,
    /// Minimum interval between scroll-driven scans (ms)
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    /// Delay before the first scan after (re)configuration (ms)
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_component_tag() -> String {
    "ul".to_string()
}

fn default_throttle_ms() -> u64 {
    DEFAULT_THROTTLE_MS
}

fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}

impl SpyConfig {
    /// Create a configuration with the required current class and defaults
    pub fn new(current_class_name: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            current_class_name: current_class_name.into(),
            scrolled_past_class_name: None,
            offset: 0.0,
            root: RootSelector::Document,
            component_tag: default_component_tag(),
            class_name: None,
            style: IndexMap::new(),
            throttle_ms: DEFAULT_THROTTLE_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
        }
    }

    /// Set the tracked item ids
    pub fn with_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items = items.into_iter().map(Into::into).collect();
        self
    }

    /// Enable the scrolled-past class
    pub fn with_scrolled_past_class(mut self, class_name: impl Into<String>) -> Self {
        self.scrolled_past_class_name = Some(class_name.into());
        self
    }

    /// Set the top-edge offset
    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    /// Observe a different scroll container
    pub fn with_root(mut self, root: RootSelector) -> Self {
        self.root = root;
        self
    }

    /// Set the wrapper tag
    pub fn with_component_tag(mut self, tag: impl Into<String>) -> Self {
        self.component_tag = tag.into();
        self
    }

    /// Set the wrapper class
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Add an inline style property to the wrapper
    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.insert(property.into(), value.into());
        self
    }

    /// Set the throttle interval
    pub fn with_throttle_ms(mut self, ms: u64) -> Self {
        self.throttle_ms = ms;
        self
    }

    /// Set the settle delay
    pub fn with_settle_delay_ms(mut self, ms: u64) -> Self {
        self.settle_delay_ms = ms;
        self
    }

    /// Whether scrolled-past flags need computing
    pub fn tracks_scrolled_past(&self) -> bool {
        self.scrolled_past_class_name
            .as_deref()
            .is_some_and(|class| !class.is_empty())
    }

    /// Scan options derived from this configuration
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::new(self.offset, self.tracks_scrolled_past())
    }

    /// Check the configuration for values the tracker cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.current_class_name.is_empty() {
            return Err(ConfigError::MissingCurrentClass);
        }
        if !self.offset.is_finite() {
            return Err(ConfigError::InvalidOffset(self.offset));
        }
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: SpyConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: SpyConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.toml` or `.json` file
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&source),
            Some("json") => Self::from_json_str(&source),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }
}
