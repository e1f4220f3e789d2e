//! Spyglass Core
//!
//! Geometry and scan primitives for scroll-spy tracking:
//!
//! - **Geometry**: narrow [`ScrollRoot`] / [`TargetGeometry`] traits so the scan
//!   never touches a live UI tree
//! - **Visibility**: strict overlap test between a target and the root's window
//! - **Scan**: single-pass view state with the bottom-edge correction and the
//!   derived scrolled-past list
//! - **Configuration**: serde-backed [`SpyConfig`] loadable from TOML or JSON
//!
//! # Example
//!
//! ```rust
//! use spyglass_core::{compute_view_state, Rect, RootSnapshot, ScanOptions, TargetBox};
//!
//! let root = RootSnapshot {
//!     scroll_offset: 120.0,
//!     viewport_height: 80.0,
//!     scroll_height: 1000.0,
//!     rect: Rect::new(0.0, 0.0, 600.0, 80.0),
//! };
//!
//! // Client rects: content position minus the scroll offset
//! let targets = vec![
//!     Some(TargetBox::from_rect(Rect::new(0.0, -120.0, 600.0, 100.0))),
//!     Some(TargetBox::from_rect(Rect::new(0.0, -20.0, 600.0, 50.0))),
//! ];
//!
//! let state = compute_view_state(&targets, &root, &ScanOptions::new(0.0, true));
//! assert_eq!(state.view_status, vec![false, true]);
//! assert_eq!(state.scrolled_past, Some(vec![true, false]));
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod scan;
pub mod visibility;

pub use config::{RootSelector, SpyConfig, DEFAULT_SETTLE_DELAY_MS, DEFAULT_THROTTLE_MS};
pub use error::{ConfigError, Result};
pub use geometry::{Rect, RootSnapshot, ScrollRoot, Span, TargetBox, TargetGeometry};
pub use scan::{compute_view_state, scrolled_past, ScanOptions, ViewState};
pub use visibility::{is_in_view, target_span};
