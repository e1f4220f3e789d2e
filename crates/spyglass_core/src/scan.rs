//! Single-pass view state scan
//!
//! Walks the resolved targets in order and marks at most one of them as the
//! current ("spied") item. The first target overlapping the root's window
//! wins, with one exception: when the root is scrolled all the way down and
//! the final target is visible, the final target wins instead. Without that
//! override a short trailing section can never become current, because a
//! taller earlier section still overlaps the window at maximum scroll.

use crate::geometry::{RootSnapshot, TargetGeometry};
use crate::visibility::is_in_view;

/// Per-scan options taken from the spy configuration
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScanOptions {
    /// Pixel shift applied to every target's top edge
    pub offset: f32,
    /// Derive the scrolled-past list (only needed when it gets rendered)
    pub track_scrolled_past: bool,
}

impl ScanOptions {
    pub fn new(offset: f32, track_scrolled_past: bool) -> Self {
        Self {
            offset,
            track_scrolled_past,
        }
    }
}

/// Result of one scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    /// Indices of targets in view (at most one)
    pub in_view: Vec<usize>,
    /// Indices of all other targets
    pub out_view: Vec<usize>,
    /// One flag per target, `true` for the current one
    pub view_status: Vec<bool>,
    /// One flag per target, `true` for targets before the current one.
    /// `None` when scrolled-past tracking is disabled.
    pub scrolled_past: Option<Vec<bool>>,
}

impl ViewState {
    /// Index of the current target, if any
    pub fn current_index(&self) -> Option<usize> {
        self.view_status.iter().position(|&in_view| in_view)
    }

    /// Number of targets covered by this state
    pub fn len(&self) -> usize {
        self.view_status.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view_status.is_empty()
    }
}

/// Compute which target is current for the given root geometry
pub fn compute_view_state<T: TargetGeometry>(
    targets: &[Option<T>],
    root: &RootSnapshot,
    options: &ScanOptions,
) -> ViewState {
    let count = targets.len();
    let mut in_view = Vec::with_capacity(1);
    let mut out_view = Vec::with_capacity(count);
    let mut view_status = Vec::with_capacity(count);
    let mut has_in_view_already = false;

    for (index, target) in targets.iter().enumerate() {
        let visible = is_in_view(target.as_ref(), root, options.offset);
        let current = !has_in_view_already && visible;

        let is_last = index + 1 == count;
        if is_last && visible && !current && root.is_at_bottom() && root.is_scrolled() {
            tracing::trace!(
                index,
                scroll_offset = root.scroll_offset,
                "bottom edge reached, last target takes over"
            );
            in_view = vec![index];
            out_view = (0..index).collect();
            view_status = vec![false; index];
            view_status.push(true);
            break;
        }

        if current {
            has_in_view_already = true;
            in_view.push(index);
        } else {
            out_view.push(index);
        }
        view_status.push(current);
    }

    let scrolled_past = options
        .track_scrolled_past
        .then(|| scrolled_past(&view_status));

    tracing::trace!(
        targets = count,
        current = ?in_view.first(),
        scroll_offset = root.scroll_offset,
        "view state scanned"
    );

    ViewState {
        in_view,
        out_view,
        view_status,
        scrolled_past,
    }
}

/// Derive the scrolled-past flags from a view status list
///
/// Everything before the first current item has been scrolled past. With no
/// current item nothing has.
pub fn scrolled_past(view_status: &[bool]) -> Vec<bool> {
    match view_status.iter().position(|&in_view| in_view) {
        Some(current) => (0..view_status.len()).map(|i| i < current).collect(),
        None => vec![false; view_status.len()],
    }
}
