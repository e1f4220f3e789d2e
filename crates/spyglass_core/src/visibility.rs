//! Per-target visibility test

use crate::geometry::{RootSnapshot, Span, TargetGeometry};

/// Vertical span of a target in the root's scroll-coordinate space
///
/// `offset` shifts the target's top edge before the overlap test; the span
/// keeps the target's layout height.
pub fn target_span<T: TargetGeometry + ?Sized>(
    target: &T,
    root: &RootSnapshot,
    offset: f32,
) -> Span {
    let rect = target.bounding_rect();
    let top = rect.y - root.rect.y + root.scroll_offset + offset;
    Span::new(top, top + target.offset_height())
}

/// Whether a target overlaps the root's visible window
///
/// Absent and disconnected targets are never in view.
pub fn is_in_view<T: TargetGeometry>(target: Option<&T>, root: &RootSnapshot, offset: f32) -> bool {
    match target {
        Some(target) if target.is_connected() => {
            target_span(target, root, offset).overlaps(&root.window())
        }
        _ => false,
    }
}
