//! Tracks one drag gesture: the payload in flight and the overlay currently
//! shown over a hovered group.

use tracing::debug;

use crate::common::config::DockSettings;
use crate::dnd::drop_target::{DropZone, classify};
use crate::dnd::transfer::{PanelTransfer, TransferSlot};
use crate::geometry::{Point, Rect};
use crate::model::group::Group;

#[derive(Debug, Default)]
pub struct DragController {
    slot: TransferSlot,
    overlay: Option<(String, DropZone)>,
}

impl DragController {
    pub fn drag_start(&mut self, transfer: PanelTransfer) {
        self.slot.begin(transfer);
    }

    /// Pointer moved over a group. Updates the overlay and returns the zone
    /// it shows, or `None` when the group refuses the drop.
    pub fn drag_over(
        &mut self,
        group: &Group,
        rect: Rect,
        pointer: Point,
        hovered_tab: Option<usize>,
        local_instance: &str,
        settings: &DockSettings,
    ) -> Option<DropZone> {
        // Dragging a group's lone content over that same group is filtered
        // out before the acceptance policy ever runs.
        if let Some(t) = self.slot.peek()
            && t.instance_id == local_instance
            && t.group_id == group.id
            && (t.panel_id.is_none() || group.panels.len() == 1)
        {
            debug!(group = %group.id, "suppressing self-drag");
            self.overlay = None;
            return None;
        }
        if !group.can_display_overlay(self.slot.peek(), local_instance, settings) {
            self.overlay = None;
            return None;
        }
        let zone = classify(rect, pointer, settings.drop_edge_ratio, hovered_tab);
        self.overlay = zone.map(|z| (group.id.clone(), z));
        zone
    }

    /// Pointer left the hovered group. The payload stays; the gesture may
    /// still complete elsewhere.
    pub fn drag_leave(&mut self) {
        self.overlay = None;
    }

    /// The gesture finished without a drop this instance handled.
    pub fn drag_end(&mut self) {
        self.overlay = None;
        self.slot.clear();
    }

    /// Consumes the payload on drop. `None` means the payload was stale or
    /// foreign; the caller treats that as a no-op.
    pub fn take_payload(&mut self) -> Option<PanelTransfer> {
        self.overlay = None;
        self.slot.take()
    }

    pub fn payload(&self) -> Option<&PanelTransfer> {
        self.slot.peek()
    }

    pub fn overlay(&self) -> Option<(&str, DropZone)> {
        self.overlay.as_ref().map(|(id, zone)| (id.as_str(), *zone))
    }
}
