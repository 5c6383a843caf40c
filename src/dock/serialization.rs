//! The persisted layout document.
//!
//! The document is validated as a whole before any of it is applied, so a
//! malformed load never leaves the engine half-mutated. Structural checks
//! live in [`validate`]; everything it accepts, the engine can apply without
//! failing.

use serde::{Deserialize, Serialize};

use crate::common::collections::{BTreeMap, HashSet};
use crate::error::{DockError, Result};
use crate::geometry::Rect;
use crate::layout::Orientation;
use crate::view::Params;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SerializedDock {
    pub grid: SerializedGrid,
    /// Panels by id; groups refer to them through their `views` lists.
    pub panels: BTreeMap<String, SerializedPanel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_group: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub floating_groups: Vec<SerializedDetached>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub popout_groups: Vec<SerializedDetached>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SerializedGrid {
    pub root: SerializedNode,
    pub width: f64,
    pub height: f64,
    pub orientation: Orientation,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SerializedNode {
    Branch {
        data: Vec<SerializedNode>,
        size: f64,
    },
    Leaf {
        data: SerializedGroup,
        size: f64,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SerializedGroup {
    pub id: String,
    /// Panel ids in tab order.
    pub views: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_view: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SerializedPanel {
    pub id: String,
    pub content_component: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_component: Option<String>,
    /// Absent when the panel never had a custom title; the id stands in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Params::is_empty")]
    pub params: Params,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SerializedDetached {
    pub data: SerializedGroup,
    pub position: Bounds,
}

/// Flat bounds, as persisted. The in-memory [`Rect`] nests origin and size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<Rect> for Bounds {
    fn from(rect: Rect) -> Self {
        Bounds {
            x: rect.origin.x,
            y: rect.origin.y,
            width: rect.size.width,
            height: rect.size.height,
        }
    }
}

impl From<Bounds> for Rect {
    fn from(bounds: Bounds) -> Self {
        Rect::new(bounds.x, bounds.y, bounds.width, bounds.height)
    }
}

/// Structural validation of a whole document.
///
/// Checks: group ids are unique across all surfaces; every referenced panel
/// exists and belongs to exactly one group; every declared panel is
/// referenced; `activeView` is a member of its group; `activeGroup` names an
/// existing group; branches below the root hold at least two children.
pub fn validate(doc: &SerializedDock) -> Result<()> {
    let mut group_ids: HashSet<String> = HashSet::default();
    let mut seen_panels: HashSet<String> = HashSet::default();

    let mut visit_group = |group: &SerializedGroup| -> Result<()> {
        if !group_ids.insert(group.id.clone()) {
            return Err(DockError::MalformedDocument(format!(
                "duplicate group id '{}'",
                group.id
            )));
        }
        for view in &group.views {
            if !doc.panels.contains_key(view) {
                return Err(DockError::MalformedDocument(format!(
                    "group '{}' references unknown panel '{view}'",
                    group.id
                )));
            }
            if !seen_panels.insert(view.clone()) {
                return Err(DockError::MalformedDocument(format!(
                    "panel '{view}' appears in more than one group"
                )));
            }
        }
        if let Some(active) = &group.active_view
            && !group.views.contains(active)
        {
            return Err(DockError::MalformedDocument(format!(
                "group '{}' activates non-member panel '{active}'",
                group.id
            )));
        }
        Ok(())
    };

    validate_node(&doc.grid.root, true, &mut visit_group)?;
    for detached in doc.floating_groups.iter().chain(&doc.popout_groups) {
        visit_group(&detached.data)?;
    }

    for id in doc.panels.keys() {
        if !seen_panels.contains(id.as_str()) {
            return Err(DockError::MalformedDocument(format!(
                "panel '{id}' belongs to no group"
            )));
        }
    }
    if let Some(active) = &doc.active_group
        && !group_ids.contains(active.as_str())
    {
        return Err(DockError::MalformedDocument(format!(
            "active group '{active}' does not exist"
        )));
    }
    Ok(())
}

fn validate_node(
    node: &SerializedNode,
    is_root: bool,
    visit_group: &mut impl FnMut(&SerializedGroup) -> Result<()>,
) -> Result<()> {
    match node {
        SerializedNode::Leaf { data, .. } => visit_group(data),
        SerializedNode::Branch { data, .. } => {
            if !is_root && data.len() < 2 {
                return Err(DockError::MalformedDocument(format!(
                    "non-root branch with {} child(ren)",
                    data.len()
                )));
            }
            for child in data {
                validate_node(child, false, visit_group)?;
            }
            Ok(())
        }
    }
}
