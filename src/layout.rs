pub mod grid;
pub mod sizing;

use serde::{Deserialize, Serialize};

/// Axis of a branch. Serialized uppercase to match the persisted document
/// format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn perpendicular(self) -> Orientation {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

/// Placement of a view relative to a reference view. `Within` is a tab
/// insertion and is resolved by the group model, not the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
    Left,
    Right,
    Within,
}

impl Direction {
    /// The split axis this placement implies, or `None` for `Within`.
    pub fn orientation(self) -> Option<Orientation> {
        match self {
            Direction::Left | Direction::Right => Some(Orientation::Horizontal),
            Direction::Above | Direction::Below => Some(Orientation::Vertical),
            Direction::Within => None,
        }
    }

    /// Whether the new view lands after the reference along the axis.
    pub fn is_after(self) -> bool {
        matches!(self, Direction::Right | Direction::Below)
    }
}
