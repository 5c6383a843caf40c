//! The tabbed group: an ordered tab strip with one active panel.
//!
//! Group membership invariant: `active` is `None` exactly when `panels` is
//! empty. Every mutation below maintains it; callers only observe outcomes.

use crate::common::config::DockSettings;
use crate::dnd::PanelTransfer;
use crate::model::PanelKey;

/// Which surface a group currently lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupLocation {
    Grid,
    Floating,
    Popout,
}

#[derive(Debug)]
pub struct Group {
    pub id: String,
    pub panels: Vec<PanelKey>,
    pub active: Option<PanelKey>,
    pub locked: bool,
    pub location: GroupLocation,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OpenOutcome {
    /// False when the panel was already a member and only reordered.
    pub added: bool,
    /// False when a reorder landed the panel back on its own slot.
    pub moved: bool,
    pub active_changed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemoveOutcome {
    /// Tab index the panel held before removal.
    pub index: usize,
    pub active_changed: bool,
    pub now_empty: bool,
}

impl Group {
    pub fn new(id: String) -> Self {
        Group {
            id,
            panels: Vec::new(),
            active: None,
            locked: false,
            location: GroupLocation::Grid,
        }
    }

    pub fn contains(&self, panel: PanelKey) -> bool {
        self.panels.contains(&panel)
    }

    pub fn active_index(&self) -> Option<usize> {
        let active = self.active?;
        self.panels.iter().position(|&p| p == active)
    }

    /// Adds a panel (or reorders an existing member) at `index`, defaulting
    /// to the end of the strip. The panel becomes active unless
    /// `skip_set_active` is set; an empty group always activates its first
    /// panel regardless.
    pub fn open_panel(
        &mut self,
        panel: PanelKey,
        index: Option<usize>,
        skip_set_active: bool,
    ) -> OpenOutcome {
        let (added, moved) = if let Some(from) = self.panels.iter().position(|&p| p == panel) {
            self.panels.remove(from);
            let to = index.unwrap_or(self.panels.len()).min(self.panels.len());
            self.panels.insert(to, panel);
            (false, to != from)
        } else {
            let at = index.unwrap_or(self.panels.len()).min(self.panels.len());
            self.panels.insert(at, panel);
            (true, true)
        };

        let activate = !skip_set_active || self.active.is_none();
        let active_changed = activate && self.active != Some(panel);
        if active_changed {
            self.active = Some(panel);
        }
        OpenOutcome { added, moved, active_changed }
    }

    /// Removes a panel. The previous tab neighbour becomes active, falling
    /// back to the next one, then to nothing.
    pub fn remove_panel(&mut self, panel: PanelKey) -> Option<RemoveOutcome> {
        let index = self.panels.iter().position(|&p| p == panel)?;
        self.panels.remove(index);

        let active_changed = if self.active == Some(panel) {
            self.active = self
                .panels
                .get(index.saturating_sub(1))
                .or_else(|| self.panels.get(index))
                .copied();
            true
        } else {
            false
        };
        Some(RemoveOutcome {
            index,
            active_changed,
            now_empty: self.panels.is_empty(),
        })
    }

    /// Activates a member panel. Returns whether the active panel changed.
    pub fn set_active(&mut self, panel: PanelKey) -> bool {
        if !self.contains(panel) || self.active == Some(panel) {
            return false;
        }
        self.active = Some(panel);
        true
    }

    /// Activates the tab after the current one. With `roll`, the last tab
    /// wraps to the first; without it, the edge saturates.
    pub fn move_to_next(&mut self, roll: bool) -> bool {
        self.step_active(1, roll)
    }

    pub fn move_to_previous(&mut self, roll: bool) -> bool {
        self.step_active(-1, roll)
    }

    fn step_active(&mut self, step: isize, roll: bool) -> bool {
        let Some(index) = self.active_index() else {
            return false;
        };
        let len = self.panels.len() as isize;
        let next = if roll {
            (index as isize + step).rem_euclid(len)
        } else {
            (index as isize + step).clamp(0, len - 1)
        };
        if next == index as isize {
            return false;
        }
        self.active = Some(self.panels[next as usize]);
        true
    }

    /// Drop acceptance for a pointer hovering this group.
    ///
    /// External payloads (no transfer) and cross-instance payloads resolve
    /// from settings. A local payload is refused only when the drop could
    /// not change anything: the whole group over itself, or a group's lone
    /// panel over its own group.
    pub fn can_display_overlay(
        &self,
        transfer: Option<&PanelTransfer>,
        local_instance: &str,
        settings: &DockSettings,
    ) -> bool {
        match transfer {
            None => settings.accept_external_drops,
            Some(t) if t.instance_id != local_instance => settings.accept_cross_instance_drops,
            Some(t) => {
                let whole_group = t.panel_id.is_none();
                !(t.group_id == self.id && (whole_group || self.panels.len() == 1))
            }
        }
    }
}
