//! Drop-zone hit testing.
//!
//! Each side of a hovered group carries an edge band whose thickness is a
//! ratio of the group's shorter dimension. A pointer inside a band resolves
//! to that edge; inside several, to the nearest edge; otherwise to the
//! center. Edges always win over the center on the band boundary.

use crate::geometry::{Point, Rect};
use crate::layout::Direction;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropZone {
    Left,
    Right,
    Top,
    Bottom,
    Center {
        /// Tab-strip insertion index, when the pointer hovered a tab.
        /// `None` appends.
        tab_index: Option<usize>,
    },
}

impl DropZone {
    pub fn direction(self) -> Direction {
        match self {
            DropZone::Left => Direction::Left,
            DropZone::Right => Direction::Right,
            DropZone::Top => Direction::Above,
            DropZone::Bottom => Direction::Below,
            DropZone::Center { .. } => Direction::Within,
        }
    }
}

/// Resolves a pointer position over `rect` to a drop zone. Returns `None`
/// when the pointer is outside the rect.
pub fn classify(
    rect: Rect,
    pointer: Point,
    edge_ratio: f64,
    hovered_tab: Option<usize>,
) -> Option<DropZone> {
    if !rect.contains(pointer) {
        return None;
    }
    let band = edge_ratio * rect.shorter_side();

    // Distance to each edge, scanned in a fixed order so exact ties are
    // deterministic.
    let candidates = [
        (DropZone::Left, pointer.x - rect.min_x()),
        (DropZone::Right, rect.max_x() - pointer.x),
        (DropZone::Top, pointer.y - rect.min_y()),
        (DropZone::Bottom, rect.max_y() - pointer.y),
    ];
    let nearest = candidates
        .into_iter()
        .filter(|&(_, distance)| distance <= band)
        .min_by(|a, b| a.1.total_cmp(&b.1));
    match nearest {
        Some((zone, _)) => Some(zone),
        None => Some(DropZone::Center { tab_index: hovered_tab }),
    }
}
