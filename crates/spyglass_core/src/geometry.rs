//! Geometry primitives and the collaborator traits the scan reads from
//!
//! The tracker never touches a live UI tree directly. Everything it needs is
//! expressed through two narrow traits:
//!
//! - [`ScrollRoot`] - the scroll container being observed
//! - [`TargetGeometry`] - a resolved target element
//!
//! Both are read once per scan into plain values, so a scan always works on a
//! consistent snapshot of the layout.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in client coordinates
///
/// `y` grows downward, matching the layout engine's coordinate space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Rect {
    /// Create a rectangle from position and size
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Top edge (alias of `y`)
    pub fn top(&self) -> f32 {
        self.y
    }

    /// Bottom edge
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Translate vertically
    pub fn offset_y(&self, dy: f32) -> Self {
        Self {
            y: self.y + dy,
            ..*self
        }
    }
}

/// Vertical interval `[top, bottom]` used by the overlap test
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Span {
    pub top: f32,
    pub bottom: f32,
}

impl Span {
    pub fn new(top: f32, bottom: f32) -> Self {
        Self { top, bottom }
    }

    /// Strict two-sided overlap. Spans that only touch do not overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.top < other.bottom && self.bottom > other.top
    }
}

/// Frozen view of a scroll root taken at the start of a scan
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RootSnapshot {
    /// Current vertical scroll offset
    pub scroll_offset: f32,
    /// Height of the visible region
    pub viewport_height: f32,
    /// Total scrollable content height
    pub scroll_height: f32,
    /// Bounding rectangle of the root in client coordinates
    pub rect: Rect,
}

impl RootSnapshot {
    /// The visible window in the root's scroll-coordinate space
    pub fn window(&self) -> Span {
        Span::new(self.scroll_offset, self.scroll_offset + self.viewport_height)
    }

    /// Whether the root is scrolled to its maximum extent
    pub fn is_at_bottom(&self) -> bool {
        self.scroll_offset + self.viewport_height >= self.scroll_height
    }

    /// Whether the root has been scrolled at all
    pub fn is_scrolled(&self) -> bool {
        self.scroll_offset > 0.0
    }
}

/// A scroll container whose visible window is observed
pub trait ScrollRoot {
    /// Current vertical scroll offset
    fn scroll_offset(&self) -> f32;

    /// Height of the visible region
    fn viewport_height(&self) -> f32;

    /// Total scrollable content height
    fn scroll_height(&self) -> f32;

    /// Bounding rectangle in client coordinates
    fn bounding_rect(&self) -> Rect;

    /// Capture all root geometry at once
    fn snapshot(&self) -> RootSnapshot {
        RootSnapshot {
            scroll_offset: self.scroll_offset(),
            viewport_height: self.viewport_height(),
            scroll_height: self.scroll_height(),
            rect: self.bounding_rect(),
        }
    }
}

impl ScrollRoot for RootSnapshot {
    fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    fn viewport_height(&self) -> f32 {
        self.viewport_height
    }

    fn scroll_height(&self) -> f32 {
        self.scroll_height
    }

    fn bounding_rect(&self) -> Rect {
        self.rect
    }

    fn snapshot(&self) -> RootSnapshot {
        *self
    }
}

/// A resolved target element
pub trait TargetGeometry {
    /// Bounding rectangle in client coordinates
    fn bounding_rect(&self) -> Rect;

    /// Layout height of the element
    fn offset_height(&self) -> f32;

    /// Whether the element is still attached to its tree
    ///
    /// Disconnected targets are never in view.
    fn is_connected(&self) -> bool {
        true
    }
}

impl<T: TargetGeometry + ?Sized> TargetGeometry for &T {
    fn bounding_rect(&self) -> Rect {
        (**self).bounding_rect()
    }

    fn offset_height(&self) -> f32 {
        (**self).offset_height()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}

/// Fixed target geometry, useful for synthetic layouts
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TargetBox {
    pub rect: Rect,
    pub offset_height: f32,
}

impl TargetBox {
    /// Box whose offset height equals its rectangle height
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            rect,
            offset_height: rect.height,
        }
    }
}

impl TargetGeometry for TargetBox {
    fn bounding_rect(&self) -> Rect {
        self.rect
    }

    fn offset_height(&self) -> f32 {
        self.offset_height
    }
}
