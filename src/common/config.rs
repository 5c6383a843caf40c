use serde::{Deserialize, Serialize};

use crate::geometry::Size;

fn yes() -> bool { true }
fn no() -> bool { false }

fn default_separator() -> f64 { 4.0 }
fn default_edge_ratio() -> f64 { 0.3 }
fn default_floating_size() -> Size { Size::new(320.0, 240.0) }

/// Behavioural settings for a dock instance.
///
/// The edge-band ratio is a tunable, not an invariant; tests override it.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct DockSettings {
    /// Thickness of the separator between sibling views, in pixels.
    #[serde(default = "default_separator")]
    pub separator_size: f64,
    /// Fraction of the drop target's shorter dimension used for each
    /// directional edge band.
    #[serde(default = "default_edge_ratio")]
    pub drop_edge_ratio: f64,
    /// Accept drops that carry no transfer payload (OS files, foreign DOM
    /// drags).
    #[serde(default = "yes")]
    pub accept_external_drops: bool,
    /// Accept payloads whose source instance differs from this one. Even when
    /// enabled these resolve through the external path, never through the
    /// local redock path.
    #[serde(default = "no")]
    pub accept_cross_instance_drops: bool,
    /// Size given to a floating group created by popping a tab out.
    #[serde(default = "default_floating_size")]
    pub floating_size: Size,
}

impl Default for DockSettings {
    fn default() -> Self {
        DockSettings {
            separator_size: default_separator(),
            drop_edge_ratio: default_edge_ratio(),
            accept_external_drops: true,
            accept_cross_instance_drops: false,
            floating_size: default_floating_size(),
        }
    }
}
