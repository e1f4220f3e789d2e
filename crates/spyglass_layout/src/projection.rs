//! Render projection
//!
//! Maps a published [`ViewState`] onto child descriptors: the current child
//! gets the configured current class, children already scrolled past get the
//! scrolled-past class, and everything else passes through untouched. The
//! wrapping container takes its tag, class and style from the [`SpyConfig`].

use indexmap::IndexMap;
use spyglass_core::{SpyConfig, ViewState};

/// One child element to render
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildDescriptor {
    pub tag: String,
    pub class_name: Option<String>,
    pub attributes: IndexMap<String, String>,
    pub text: Option<String>,
    /// Render key, assigned by [`project`]
    pub key: Option<usize>,
}

impl ChildDescriptor {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Shorthand for a list item
    pub fn li() -> Self {
        Self::new("li")
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Whether `class` is one of this child's classes
    pub fn has_class(&self, class: &str) -> bool {
        self.class_name
            .as_deref()
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Serialize to escaped markup
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        write_open_tag(&mut out, &self.tag, self.class_name.as_deref(), &self.attributes);
        if let Some(text) = &self.text {
            out.push_str(&html_escape::encode_text(text));
        }
        write_close_tag(&mut out, &self.tag);
        out
    }
}

/// Wrapping container with its projected children
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerDescriptor {
    pub tag: String,
    pub class_name: Option<String>,
    pub style: IndexMap<String, String>,
    pub children: Vec<ChildDescriptor>,
}

impl ContainerDescriptor {
    /// Serialize to escaped markup
    pub fn to_markup(&self) -> String {
        let mut attributes = IndexMap::new();
        if !self.style.is_empty() {
            let style = self
                .style
                .iter()
                .map(|(property, value)| format!("{}: {}", property, value))
                .collect::<Vec<_>>()
                .join("; ");
            attributes.insert("style".to_string(), style);
        }

        let mut out = String::new();
        write_open_tag(&mut out, &self.tag, self.class_name.as_deref(), &attributes);
        for child in &self.children {
            out.push_str(&child.to_markup());
        }
        write_close_tag(&mut out, &self.tag);
        out
    }
}

/// Join class names, skipping empty and repeated ones
///
/// Unlike a plain concatenation, a class already present is not emitted
/// twice: child class `"a b"` plus current class `"b"` yields `"a b"`.
pub fn class_names<'a>(classes: impl IntoIterator<Item = Option<&'a str>>) -> Option<String> {
    let mut joined: Vec<&str> = Vec::new();
    for class in classes.into_iter().flatten() {
        for part in class.split_whitespace() {
            if !joined.contains(&part) {
                joined.push(part);
            }
        }
    }
    (!joined.is_empty()).then(|| joined.join(" "))
}

/// Annotate `children` with the classes implied by `state`
///
/// `None` entries still consume an index but produce no output. Rendered
/// children receive sequential keys.
pub fn project(
    children: &[Option<ChildDescriptor>],
    state: &ViewState,
    config: &SpyConfig,
) -> ContainerDescriptor {
    let scrolled_past_class = config
        .tracks_scrolled_past()
        .then_some(config.scrolled_past_class_name.as_deref())
        .flatten();

    let mut key = 0;
    let children = children
        .iter()
        .enumerate()
        .filter_map(|(index, child)| {
            let child = child.as_ref()?;
            let current = state.view_status.get(index).copied().unwrap_or(false);
            let past = state
                .scrolled_past
                .as_ref()
                .and_then(|flags| flags.get(index).copied())
                .unwrap_or(false);

            let mut projected = child.clone();
            projected.class_name = class_names([
                child.class_name.as_deref(),
                current.then_some(config.current_class_name.as_str()),
                scrolled_past_class.filter(|_| past),
            ]);
            projected.key = Some(key);
            key += 1;
            Some(projected)
        })
        .collect();

    ContainerDescriptor {
        tag: config.component_tag.clone(),
        class_name: class_names([config.class_name.as_deref()]),
        style: config.style.clone(),
        children,
    }
}

fn write_open_tag(
    out: &mut String,
    tag: &str,
    class_name: Option<&str>,
    attributes: &IndexMap<String, String>,
) {
    out.push('<');
    out.push_str(tag);
    if let Some(class_name) = class_name {
        write_attribute(out, "class", class_name);
    }
    for (name, value) in attributes {
        write_attribute(out, name, value);
    }
    out.push('>');
}

fn write_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&html_escape::encode_double_quoted_attribute(value));
    out.push('"');
}

fn write_close_tag(out: &mut String, tag: &str) {
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(view_status: Vec<bool>, scrolled_past: Option<Vec<bool>>) -> ViewState {
        ViewState {
            in_view: (0..view_status.len()).filter(|&i| view_status[i]).collect(),
            out_view: (0..view_status.len()).filter(|&i| !view_status[i]).collect(),
            view_status,
            scrolled_past,
        }
    }

    fn nav_items() -> Vec<Option<ChildDescriptor>> {
        vec![
            Some(ChildDescriptor::li().with_text("Intro")),
            Some(ChildDescriptor::li().with_class("nav-item").with_text("Usage")),
            Some(ChildDescriptor::li().with_text("FAQ")),
        ]
    }

    #[test]
    fn test_current_class_applied() {
        let config = SpyConfig::new("is-current");
        let container = project(&nav_items(), &state(vec![false, true, false], None), &config);

        let classes: Vec<_> = container
            .children
            .iter()
            .map(|child| child.class_name.clone())
            .collect();
        assert_eq!(
            classes,
            vec![None, Some("nav-item is-current".to_string()), None]
        );
        assert_eq!(container.tag, "ul");
    }

    #[test]
    fn test_scrolled_past_class_applied() {
        let config = SpyConfig::new("is-current").with_scrolled_past_class("is-past");
        let container = project(
            &nav_items(),
            &state(vec![false, false, true], Some(vec![true, true, false])),
            &config,
        );

        assert!(container.children[0].has_class("is-past"));
        assert!(container.children[1].has_class("nav-item"));
        assert!(container.children[1].has_class("is-past"));
        assert!(container.children[2].has_class("is-current"));
        assert!(!container.children[2].has_class("is-past"));
    }

    #[test]
    fn test_empty_scrolled_past_class_is_ignored() {
        let config = SpyConfig::new("is-current").with_scrolled_past_class("");
        let container = project(
            &nav_items(),
            &state(vec![false, true, false], Some(vec![true, false, false])),
            &config,
        );
        assert_eq!(container.children[0].class_name, None);
    }

    #[test]
    fn test_holes_consume_index_but_not_key() {
        let children = vec![
            Some(ChildDescriptor::li().with_text("A")),
            None,
            Some(ChildDescriptor::li().with_text("C")),
        ];
        let config = SpyConfig::new("is-current");
        let container = project(&children, &state(vec![false, false, true], None), &config);

        assert_eq!(container.children.len(), 2);
        assert_eq!(container.children[1].text.as_deref(), Some("C"));
        assert!(container.children[1].has_class("is-current"));
        assert_eq!(container.children[0].key, Some(0));
        assert_eq!(container.children[1].key, Some(1));
    }

    #[test]
    fn test_more_children_than_state() {
        let config = SpyConfig::new("is-current");
        let container = project(&nav_items(), &state(vec![true], None), &config);

        assert!(container.children[0].has_class("is-current"));
        assert_eq!(container.children[2].class_name, None);
    }

    #[test]
    fn test_empty_children() {
        let config = SpyConfig::new("is-current");
        let container = project(&[], &ViewState::default(), &config);
        assert!(container.children.is_empty());
    }

    #[test]
    fn test_attributes_preserved() {
        let children = vec![Some(
            ChildDescriptor::li()
                .with_attribute("data-section", "intro")
                .with_attribute("role", "link"),
        )];
        let config = SpyConfig::new("is-current");
        let container = project(&children, &state(vec![true], None), &config);

        let attributes: Vec<_> = container.children[0].attributes.keys().cloned().collect();
        assert_eq!(attributes, vec!["data-section", "role"]);
    }

    #[test]
    fn test_class_names_join() {
        assert_eq!(class_names([None, Some(""), Some("  ")]), None);
        assert_eq!(
            class_names([Some("a b"), Some("b"), Some("c")]),
            Some("a b c".to_string())
        );
    }

    #[test]
    fn test_container_markup() {
        let config = SpyConfig::new("is-current")
            .with_component_tag("nav")
            .with_class_name("toc")
            .with_style("position", "sticky")
            .with_style("top", "0");
        let children = vec![Some(
            ChildDescriptor::new("a")
                .with_attribute("href", "#q&a")
                .with_text("Q & A <faq>"),
        )];
        let container = project(&children, &state(vec![true], None), &config);

        assert_eq!(
            container.to_markup(),
            "<nav class=\"toc\" style=\"position: sticky; top: 0\">\
             <a class=\"is-current\" href=\"#q&amp;a\">Q &amp; A &lt;faq&gt;</a></nav>"
        );
    }
}
