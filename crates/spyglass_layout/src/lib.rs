//! Spyglass Layout
//!
//! Host-side pieces of scroll-spy tracking:
//!
//! - **Document**: an in-memory scroll document with an id registry, scroll
//!   containers and scroll listeners, implementing the tracker's host traits
//! - **Projection**: turns published view state into annotated child
//!   descriptors and escaped markup
//! - **Widget**: [`Scrollspy`], which mounts a tracker on a host and keeps the
//!   scroll subscription in sync with its configuration

pub mod document;
pub mod projection;
pub mod widget;


pub use document::{Document, ElementHandle, ListenerId, NodeId};
pub use projection::{class_names, project, ChildDescriptor, ContainerDescriptor};
pub use widget::{ChangeCallback, Scrollspy, SpyHost};

/// Common imports for building a scrollspy
pub mod prelude {
    pub use crate::document::Document;
    pub use crate::projection::{ChildDescriptor, ContainerDescriptor};
    pub use crate::widget::Scrollspy;
    pub use spyglass_core::{Rect, RootSelector, SpyConfig, ViewState};
    pub use spyglass_runtime::{Clock, SpyError, SystemClock, VirtualClock};
}
