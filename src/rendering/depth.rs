/// Painter's-algorithm depth ordering. No z-buffer: items are drawn
/// farthest first so nearer geometry overdraws farther geometry.
use std::cmp::Ordering;

/// Anything with a scalar camera distance (squared distances are fine;
/// ordering is what matters).
pub trait DepthSortable {
    fn depth(&self) -> f32;
}

/// Sort farthest-first. The sort is stable, so equal depths keep their
/// input order and identical inputs always produce identical output.
pub fn sort_back_to_front<T: DepthSortable>(items: &mut [T]) {
    items.sort_by(|a, b| {
        b.depth()
            .partial_cmp(&a.depth())
            .unwrap_or(Ordering::Equal)
    });
}
