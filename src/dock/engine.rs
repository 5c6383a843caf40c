//! The dock engine: one façade over the grid, the group/panel arenas, the
//! detached surfaces, and the drag controller.
//!
//! Every public mutation settles the whole structure before returning, and
//! structural mutations emit exactly one [`DockEvent::LayoutChanged`].
//! Activation, title, and parameter updates do not count as structural.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use slotmap::SlotMap;
use tracing::{debug, info, warn};

use crate::common::collections::{BTreeMap, HashMap};
use crate::common::config::DockSettings;
use crate::dnd::{DragController, DropZone, PanelTransfer, classify};
use crate::dock::events::DockEvent;
use crate::dock::floating::DetachedRegistry;
use crate::dock::serialization::{
    self, SerializedDetached, SerializedDock, SerializedGrid, SerializedGroup, SerializedNode,
    SerializedPanel,
};
use crate::error::{DockError, Result};
use crate::geometry::{Point, Rect};
use crate::layout::grid::{GridTree, NodeKey, NodeKind};
use crate::layout::{Direction, Orientation};
use crate::model::group::{Group, GroupLocation};
use crate::model::panel::{Panel, Patch};
use crate::model::{GroupKey, PanelKey};
use crate::view::{ComponentFactory, Params, ViewConstraints};

static INSTANCE_SEQ: AtomicU64 = AtomicU64::new(1);

/// Where a new panel goes.
#[derive(Clone, Debug)]
pub enum PanelPosition {
    RelativeToPanel { panel: String, direction: Direction },
    RelativeToGroup { group: String, direction: Direction },
    /// Explicit grid path; the final element is the insertion index.
    AtPath { path: Vec<usize> },
    Floating { rect: Option<Rect> },
}

#[derive(Debug)]
pub struct AddPanelOptions {
    pub id: String,
    pub component: String,
    pub tab_component: Option<String>,
    pub title: Option<String>,
    pub params: Params,
    pub position: Option<PanelPosition>,
    /// Add without stealing activation. The first panel of a group becomes
    /// active regardless.
    pub inactive: bool,
}

impl AddPanelOptions {
    pub fn new(id: impl Into<String>, component: impl Into<String>) -> Self {
        AddPanelOptions {
            id: id.into(),
            component: component.into(),
            tab_component: None,
            title: None,
            params: Params::new(),
            position: None,
            inactive: false,
        }
    }
}

/// What happens to current state when a document fails validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestorePolicy {
    /// Leave the engine exactly as it was.
    KeepOnError,
    /// Reset to an empty layout.
    ClearOnError,
}

pub struct DockEngine {
    instance_id: String,
    settings: DockSettings,
    grid: GridTree<GroupKey>,
    groups: SlotMap<GroupKey, Group>,
    panels: SlotMap<PanelKey, Panel>,
    panel_ids: HashMap<String, PanelKey>,
    group_ids: HashMap<String, GroupKey>,
    /// Grid-resident groups only; detached groups live in the registries.
    group_leaves: HashMap<GroupKey, NodeKey>,
    floating: DetachedRegistry,
    popout: DetachedRegistry,
    active_group: Option<GroupKey>,
    dnd: DragController,
    factory: Box<dyn ComponentFactory>,
    events: Vec<DockEvent>,
    next_group_seq: u64,
}

impl DockEngine {
    pub fn new(factory: Box<dyn ComponentFactory>, settings: DockSettings) -> Self {
        let instance_id = format!("dock_{}", INSTANCE_SEQ.fetch_add(1, Ordering::Relaxed));
        let grid = GridTree::new(Orientation::Horizontal, settings.separator_size);
        DockEngine {
            instance_id,
            settings,
            grid,
            groups: SlotMap::with_key(),
            panels: SlotMap::with_key(),
            panel_ids: HashMap::default(),
            group_ids: HashMap::default(),
            group_leaves: HashMap::default(),
            floating: DetachedRegistry::default(),
            popout: DetachedRegistry::default(),
            active_group: None,
            dnd: DragController::default(),
            factory,
            events: Vec::new(),
            next_group_seq: 1,
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn settings(&self) -> &DockSettings {
        &self.settings
    }

    /// Drains the events accumulated since the last call, in emission order.
    pub fn take_events(&mut self) -> Vec<DockEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- introspection ---------------------------------------------------

    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn get_panel(&self, id: &str) -> Option<&Panel> {
        self.panel_ids.get(id).and_then(|&k| self.panels.get(k))
    }

    pub fn get_group(&self, id: &str) -> Option<&Group> {
        self.group_ids.get(id).and_then(|&k| self.groups.get(k))
    }

    pub fn group_id_of_key(&self, key: GroupKey) -> Option<&str> {
        self.groups.get(key).map(|g| g.id.as_str())
    }

    pub fn active_group_id(&self) -> Option<&str> {
        self.active_group
            .and_then(|k| self.groups.get(k))
            .map(|g| g.id.as_str())
    }

    pub fn active_panel_id(&self) -> Option<&str> {
        let group = self.groups.get(self.active_group?)?;
        let panel = self.panels.get(group.active?)?;
        Some(panel.id.as_str())
    }

    pub fn maximized_group_id(&self) -> Option<&str> {
        let key = self.grid.maximized_view()?;
        self.groups.get(key).map(|g| g.id.as_str())
    }

    /// The rect a group currently occupies, on whichever surface it lives.
    pub fn group_rect(&self, id: &str) -> Option<Rect> {
        let key = *self.group_ids.get(id)?;
        match self.groups.get(key)?.location {
            GroupLocation::Grid => {
                let leaf = *self.group_leaves.get(&key)?;
                Some(self.grid.rect_of(leaf))
            }
            GroupLocation::Floating => self.floating.rect_of(key),
            GroupLocation::Popout => self.popout.rect_of(key),
        }
    }

    /// Ascii rendering of the grid, one line per node.
    pub fn draw_tree(&self) -> String {
        self.grid.draw_tree(&|key| {
            self.groups
                .get(*key)
                .map(|g| g.id.clone())
                .unwrap_or_else(|| "?".into())
        })
    }

    // ---- panels ----------------------------------------------------------

    pub fn add_panel(&mut self, options: AddPanelOptions) -> Result<PanelKey> {
        if self.panel_ids.contains_key(&options.id) {
            return Err(DockError::DuplicatePanel(options.id));
        }

        // Resolve the destination before touching anything.
        enum Target {
            InGroup(GroupKey),
            SplitOf(NodeKey, Direction),
            Append,
            AtPath(Vec<usize>),
            Floating(Rect),
        }
        let target = match &options.position {
            None => match self.active_group {
                Some(group) => Target::InGroup(group),
                None => Target::Append,
            },
            Some(PanelPosition::RelativeToPanel { panel, direction }) => {
                let panel_key = *self
                    .panel_ids
                    .get(panel)
                    .ok_or_else(|| DockError::UnknownPanel(panel.clone()))?;
                let group = self.panels[panel_key].group;
                self.relative_target(group, *direction, |g| Target::InGroup(g), Target::SplitOf)
            }
            Some(PanelPosition::RelativeToGroup { group, direction }) => {
                let group = *self
                    .group_ids
                    .get(group)
                    .ok_or_else(|| DockError::UnknownGroup(group.clone()))?;
                self.relative_target(group, *direction, |g| Target::InGroup(g), Target::SplitOf)
            }
            Some(PanelPosition::AtPath { path }) => Target::AtPath(path.clone()),
            Some(PanelPosition::Floating { rect }) => {
                Target::Floating(rect.unwrap_or_else(|| self.default_floating_rect()))
            }
        };

        let (group_key, group_created) = match target {
            Target::InGroup(group) => (group, false),
            Target::SplitOf(leaf, direction) => {
                (self.create_grid_group(Some(leaf), direction)?, true)
            }
            Target::Append => (self.create_grid_group(None, Direction::Right)?, true),
            Target::AtPath(path) => (self.create_grid_group_at_path(&path)?, true),
            Target::Floating(rect) => {
                (self.create_detached_group(rect, GroupLocation::Floating), true)
            }
        };

        let view = self.factory.create_panel(&options.id, &options.component);
        let mut panel = Panel::new(
            options.id.clone(),
            options.component,
            options.tab_component,
            options.params,
            group_key,
            view,
        );
        if let Some(title) = &options.title {
            panel.set_title(title);
        }
        let panel_key = self.panels.insert(panel);
        self.panel_ids.insert(options.id.clone(), panel_key);

        let group_id = self.groups[group_key].id.clone();
        if group_created {
            self.events.push(DockEvent::AddGroup { group: group_id.clone() });
        }
        self.events.push(DockEvent::AddPanel {
            panel: options.id.clone(),
            group: group_id.clone(),
        });

        let outcome = self.groups[group_key].open_panel(panel_key, None, options.inactive);
        if outcome.active_changed {
            self.events.push(DockEvent::ActivePanelChange {
                group: group_id,
                panel: Some(options.id),
            });
        }
        if !options.inactive || self.active_group.is_none() {
            self.set_active_group_key(Some(group_key));
        }

        self.refresh_group_constraints(group_key);
        self.grid.resize_to_fit();
        self.events.push(DockEvent::LayoutChanged);
        Ok(panel_key)
    }

    fn relative_target<T>(
        &self,
        group: GroupKey,
        direction: Direction,
        in_group: impl Fn(GroupKey) -> T,
        split_of: impl Fn(NodeKey, Direction) -> T,
    ) -> T {
        // Splits only exist on the grid; relative placement against a
        // detached group always tabs into it.
        if direction == Direction::Within || !self.group_leaves.contains_key(&group) {
            in_group(group)
        } else {
            split_of(self.group_leaves[&group], direction)
        }
    }

    pub fn remove_panel(&mut self, id: &str) -> Result<()> {
        let panel_key = *self
            .panel_ids
            .get(id)
            .ok_or_else(|| DockError::UnknownPanel(id.to_owned()))?;
        let group_key = self.panels[panel_key].group;
        self.detach_panel(panel_key, group_key, true);
        self.panel_ids.remove(id);
        if let Some(mut panel) = self.panels.remove(panel_key) {
            panel.dispose();
        }
        self.events.push(DockEvent::LayoutChanged);
        Ok(())
    }

    /// Structural removal from a group, with activation bookkeeping and
    /// empty-group teardown. Does not touch the panel arena.
    fn detach_panel(&mut self, panel_key: PanelKey, group_key: GroupKey, emit_remove: bool) {
        let Some(outcome) = self.groups[group_key].remove_panel(panel_key) else {
            return;
        };
        let group_id = self.groups[group_key].id.clone();
        if emit_remove {
            self.events.push(DockEvent::RemovePanel {
                panel: self.panels[panel_key].id.clone(),
                group: group_id.clone(),
            });
        }
        let keep_empty = outcome.now_empty && self.groups[group_key].locked;
        if outcome.active_changed && (!outcome.now_empty || keep_empty) {
            let active = self.group_active_panel_id(group_key);
            self.events.push(DockEvent::ActivePanelChange {
                group: group_id,
                panel: active,
            });
        }
        // Locked groups are pinned in place; emptying one leaves it behind.
        if outcome.now_empty && !keep_empty {
            self.drop_group(group_key);
        }
    }

    /// Closes every panel of a group through the ordinary removal path, so
    /// per-panel teardown runs. An already empty group just removes itself.
    pub fn close_all_panels(&mut self, group_id: &str) -> Result<()> {
        let key = *self
            .group_ids
            .get(group_id)
            .ok_or_else(|| DockError::UnknownGroup(group_id.to_owned()))?;
        let members: Vec<String> = self.groups[key]
            .panels
            .iter()
            .map(|&p| self.panels[p].id.clone())
            .collect();
        if members.is_empty() {
            self.drop_group(key);
            self.events.push(DockEvent::LayoutChanged);
            return Ok(());
        }
        for id in members {
            self.remove_panel(&id)?;
        }
        Ok(())
    }

    pub fn set_active_panel(&mut self, id: &str) -> Result<()> {
        let panel_key = *self
            .panel_ids
            .get(id)
            .ok_or_else(|| DockError::UnknownPanel(id.to_owned()))?;
        let group_key = self.panels[panel_key].group;
        if self.groups[group_key].set_active(panel_key) {
            self.events.push(DockEvent::ActivePanelChange {
                group: self.groups[group_key].id.clone(),
                panel: Some(id.to_owned()),
            });
        }
        self.set_active_group_key(Some(group_key));
        Ok(())
    }

    pub fn set_panel_title(&mut self, id: &str, title: &str) -> Result<()> {
        let panel_key = *self
            .panel_ids
            .get(id)
            .ok_or_else(|| DockError::UnknownPanel(id.to_owned()))?;
        if self.panels[panel_key].set_title(title) {
            self.events.push(DockEvent::TitleChanged {
                panel: id.to_owned(),
                title: title.to_owned(),
            });
        }
        Ok(())
    }

    pub fn update_panel_params(
        &mut self,
        id: &str,
        patches: impl IntoIterator<Item = (String, Patch)>,
    ) -> Result<()> {
        let panel_key = *self
            .panel_ids
            .get(id)
            .ok_or_else(|| DockError::UnknownPanel(id.to_owned()))?;
        if self.panels[panel_key].update_params(patches) {
            self.events.push(DockEvent::ParamsChanged { panel: id.to_owned() });
        }
        Ok(())
    }

    // ---- groups ----------------------------------------------------------

    /// Creates an empty grid group, optionally split off an existing one.
    pub fn add_group(
        &mut self,
        reference: Option<&str>,
        direction: Direction,
    ) -> Result<String> {
        let reference = match reference {
            Some(id) => {
                let key = *self
                    .group_ids
                    .get(id)
                    .ok_or_else(|| DockError::UnknownGroup(id.to_owned()))?;
                self.group_leaves.get(&key).copied()
            }
            None => None,
        };
        let key = self.create_grid_group(reference, direction)?;
        let id = self.groups[key].id.clone();
        self.events.push(DockEvent::AddGroup { group: id.clone() });
        self.set_active_group_key(Some(key));
        self.events.push(DockEvent::LayoutChanged);
        Ok(id)
    }

    /// Removes a group and every panel in it.
    pub fn remove_group(&mut self, id: &str) -> Result<()> {
        let group_key = *self
            .group_ids
            .get(id)
            .ok_or_else(|| DockError::UnknownGroup(id.to_owned()))?;
        let members = self.groups[group_key].panels.clone();
        for panel_key in members {
            let panel_id = self.panels[panel_key].id.clone();
            self.events.push(DockEvent::RemovePanel {
                panel: panel_id.clone(),
                group: id.to_owned(),
            });
            self.panel_ids.remove(&panel_id);
            if let Some(mut panel) = self.panels.remove(panel_key) {
                panel.dispose();
            }
        }
        self.groups[group_key].panels.clear();
        self.groups[group_key].active = None;
        self.drop_group(group_key);
        self.events.push(DockEvent::LayoutChanged);
        Ok(())
    }

    pub fn set_active_group(&mut self, id: &str) -> Result<()> {
        let key = *self
            .group_ids
            .get(id)
            .ok_or_else(|| DockError::UnknownGroup(id.to_owned()))?;
        self.set_active_group_key(Some(key));
        Ok(())
    }

    pub fn set_group_locked(&mut self, id: &str, locked: bool) -> Result<()> {
        let key = *self
            .group_ids
            .get(id)
            .ok_or_else(|| DockError::UnknownGroup(id.to_owned()))?;
        if self.groups[key].locked != locked {
            self.groups[key].locked = locked;
            self.events.push(DockEvent::LayoutChanged);
        }
        Ok(())
    }

    fn set_active_group_key(&mut self, key: Option<GroupKey>) {
        if self.active_group == key {
            return;
        }
        self.active_group = key;
        let group = key.and_then(|k| self.groups.get(k)).map(|g| g.id.clone());
        self.events.push(DockEvent::ActiveGroupChange { group });
    }

    fn fresh_group_id(&mut self) -> String {
        loop {
            let id = format!("group_{}", self.next_group_seq);
            self.next_group_seq += 1;
            if !self.group_ids.contains_key(&id) {
                return id;
            }
        }
    }

    fn register_group(&mut self, mut group: Group, location: GroupLocation) -> GroupKey {
        group.location = location;
        let id = group.id.clone();
        let key = self.groups.insert(group);
        self.group_ids.insert(id, key);
        key
    }

    fn create_grid_group(
        &mut self,
        reference: Option<NodeKey>,
        direction: Direction,
    ) -> Result<GroupKey> {
        let id = self.fresh_group_id();
        let key = self.register_group(Group::new(id), GroupLocation::Grid);
        match self
            .grid
            .add_view(key, ViewConstraints::default(), reference, direction)
        {
            Ok(leaf) => {
                self.group_leaves.insert(key, leaf);
                Ok(key)
            }
            Err(e) => {
                let id = self.groups[key].id.clone();
                self.group_ids.remove(&id);
                self.groups.remove(key);
                Err(e)
            }
        }
    }

    fn create_grid_group_at_path(&mut self, path: &[usize]) -> Result<GroupKey> {
        let id = self.fresh_group_id();
        let key = self.register_group(Group::new(id), GroupLocation::Grid);
        match self.grid.add_view_at_path(key, ViewConstraints::default(), path) {
            Ok(leaf) => {
                self.group_leaves.insert(key, leaf);
                Ok(key)
            }
            Err(e) => {
                let id = self.groups[key].id.clone();
                self.group_ids.remove(&id);
                self.groups.remove(key);
                Err(e)
            }
        }
    }

    fn create_detached_group(&mut self, rect: Rect, location: GroupLocation) -> GroupKey {
        let id = self.fresh_group_id();
        let key = self.register_group(Group::new(id), location);
        match location {
            GroupLocation::Floating => self.floating.add(key, rect),
            GroupLocation::Popout => self.popout.add(key, rect),
            GroupLocation::Grid => unreachable!("grid groups go through create_grid_group"),
        }
        key
    }

    fn default_floating_rect(&self) -> Rect {
        let size = self.settings.floating_size;
        Rect::new(0.0, 0.0, size.width, size.height)
    }

    /// Tears an (already empty) group out of whichever surface holds it.
    fn drop_group(&mut self, key: GroupKey) {
        let Some(group) = self.groups.remove(key) else {
            return;
        };
        self.group_ids.remove(&group.id);
        let was_maximized = self.grid.maximized_view() == Some(key);
        match group.location {
            GroupLocation::Grid => {
                if let Some(leaf) = self.group_leaves.remove(&key) {
                    let _ = self.grid.remove_view(leaf);
                }
            }
            GroupLocation::Floating => {
                self.floating.remove(key);
            }
            GroupLocation::Popout => {
                self.popout.remove(key);
            }
        }
        if was_maximized {
            self.events.push(DockEvent::MaximizedGroupChange { group: None });
        }
        self.events.push(DockEvent::RemoveGroup { group: group.id });
        if self.active_group == Some(key) {
            let next = self
                .grid
                .leaves()
                .into_iter()
                .filter_map(|leaf| self.grid.view_at(leaf))
                .next()
                .or_else(|| self.floating.iter().last().map(|e| e.group))
                .or_else(|| self.popout.iter().last().map(|e| e.group));
            self.set_active_group_key(next);
        }
    }

    /// Leaf constraints follow the strictest member panel.
    fn refresh_group_constraints(&mut self, group: GroupKey) {
        let Some(&leaf) = self.group_leaves.get(&group) else {
            return;
        };
        let mut combined = ViewConstraints::default();
        for &panel in &self.groups[group].panels {
            let c = self.panels[panel].constraints();
            combined.minimum_width = combined.minimum_width.max(c.minimum_width);
            combined.minimum_height = combined.minimum_height.max(c.minimum_height);
            combined.maximum_width = combined.maximum_width.min(c.maximum_width);
            combined.maximum_height = combined.maximum_height.min(c.maximum_height);
        }
        combined.maximum_width = combined.maximum_width.max(combined.minimum_width);
        combined.maximum_height = combined.maximum_height.max(combined.minimum_height);
        self.grid.set_constraints(leaf, combined);
    }

    fn group_active_panel_id(&self, group: GroupKey) -> Option<String> {
        let active = self.groups.get(group)?.active?;
        self.panels.get(active).map(|p| p.id.clone())
    }

    // ---- moves -----------------------------------------------------------

    /// Redocks a single panel relative to `target_group`.
    pub fn move_panel(&mut self, panel_id: &str, target_group: &str, zone: DropZone) -> Result<()> {
        let panel_key = *self
            .panel_ids
            .get(panel_id)
            .ok_or_else(|| DockError::UnknownPanel(panel_id.to_owned()))?;
        let target_key = *self
            .group_ids
            .get(target_group)
            .ok_or_else(|| DockError::UnknownGroup(target_group.to_owned()))?;
        let source_key = self.panels[panel_key].group;
        let source_id = self.groups[source_key].id.clone();

        // Splits only exist on the grid.
        let zone = if self.group_leaves.contains_key(&target_key) {
            zone
        } else {
            DropZone::Center { tab_index: None }
        };

        match zone {
            DropZone::Center { tab_index } => {
                if source_key == target_key {
                    // A drop back onto the panel's own slot changes nothing.
                    let outcome = self.groups[target_key].open_panel(panel_key, tab_index, false);
                    if outcome.active_changed {
                        self.events.push(DockEvent::ActivePanelChange {
                            group: source_id.clone(),
                            panel: Some(panel_id.to_owned()),
                        });
                    }
                    if outcome.moved {
                        self.events.push(DockEvent::MovePanel {
                            panel: panel_id.to_owned(),
                            from: source_id.clone(),
                            to: source_id,
                        });
                        self.events.push(DockEvent::LayoutChanged);
                    }
                    return Ok(());
                }
                self.detach_panel(panel_key, source_key, false);
                self.panels[panel_key].group = target_key;
                let outcome = self.groups[target_key].open_panel(panel_key, tab_index, false);
                let target_id = self.groups[target_key].id.clone();
                self.events.push(DockEvent::MovePanel {
                    panel: panel_id.to_owned(),
                    from: source_id,
                    to: target_id.clone(),
                });
                if outcome.active_changed {
                    self.events.push(DockEvent::ActivePanelChange {
                        group: target_id,
                        panel: Some(panel_id.to_owned()),
                    });
                }
                self.set_active_group_key(Some(target_key));
                self.refresh_group_constraints(target_key);
                self.events.push(DockEvent::LayoutChanged);
                Ok(())
            }
            _ => {
                let direction = zone.direction();
                if source_key == target_key && self.groups[source_key].panels.len() == 1 {
                    // Splitting a lone panel off its own group recreates the
                    // same layout.
                    debug!(panel = panel_id, "degenerate self-split ignored");
                    return Ok(());
                }
                let target_leaf = self.group_leaves[&target_key];
                let new_group = self.create_grid_group(Some(target_leaf), direction)?;
                let new_id = self.groups[new_group].id.clone();
                self.events.push(DockEvent::AddGroup { group: new_id.clone() });

                self.detach_panel(panel_key, source_key, false);
                self.panels[panel_key].group = new_group;
                self.groups[new_group].open_panel(panel_key, None, false);
                self.events.push(DockEvent::MovePanel {
                    panel: panel_id.to_owned(),
                    from: source_id,
                    to: new_id.clone(),
                });
                self.events.push(DockEvent::ActivePanelChange {
                    group: new_id,
                    panel: Some(panel_id.to_owned()),
                });
                self.set_active_group_key(Some(new_group));
                self.refresh_group_constraints(new_group);
                self.events.push(DockEvent::LayoutChanged);
                Ok(())
            }
        }
    }

    /// Redocks a whole group relative to `target_group`. A center drop
    /// merges the tabs into the target.
    pub fn move_group(&mut self, group_id: &str, target_group: &str, zone: DropZone) -> Result<()> {
        let source_key = *self
            .group_ids
            .get(group_id)
            .ok_or_else(|| DockError::UnknownGroup(group_id.to_owned()))?;
        let target_key = *self
            .group_ids
            .get(target_group)
            .ok_or_else(|| DockError::UnknownGroup(target_group.to_owned()))?;
        if source_key == target_key {
            debug!(group = group_id, "group dropped on itself");
            return Ok(());
        }

        let zone = if self.group_leaves.contains_key(&target_key) {
            zone
        } else {
            DropZone::Center { tab_index: None }
        };

        match zone {
            DropZone::Center { .. } => {
                let members = self.groups[source_key].panels.clone();
                let source_active = self.groups[source_key].active;
                let target_id = self.groups[target_key].id.clone();
                for &panel_key in &members {
                    self.panels[panel_key].group = target_key;
                    self.groups[target_key].open_panel(panel_key, None, true);
                    self.events.push(DockEvent::MovePanel {
                        panel: self.panels[panel_key].id.clone(),
                        from: group_id.to_owned(),
                        to: target_id.clone(),
                    });
                }
                if let Some(active) = source_active
                    && self.groups[target_key].set_active(active)
                {
                    self.events.push(DockEvent::ActivePanelChange {
                        group: target_id,
                        panel: self.panels.get(active).map(|p| p.id.clone()),
                    });
                }
                self.groups[source_key].panels.clear();
                self.groups[source_key].active = None;
                self.drop_group(source_key);
                self.set_active_group_key(Some(target_key));
                self.refresh_group_constraints(target_key);
                self.events.push(DockEvent::LayoutChanged);
                Ok(())
            }
            _ => {
                let direction = zone.direction();
                let target_leaf = self.group_leaves[&target_key];
                match self.group_leaves.get(&source_key).copied() {
                    Some(source_leaf) => {
                        self.grid.move_view(source_leaf, target_leaf, direction)?;
                    }
                    None => {
                        // Coming off a detached surface: re-enter the grid.
                        self.floating.remove(source_key);
                        self.popout.remove(source_key);
                        let leaf = self.grid.add_view(
                            source_key,
                            ViewConstraints::default(),
                            Some(target_leaf),
                            direction,
                        )?;
                        self.group_leaves.insert(source_key, leaf);
                        self.groups[source_key].location = GroupLocation::Grid;
                        self.refresh_group_constraints(source_key);
                    }
                }
                self.set_active_group_key(Some(source_key));
                self.events.push(DockEvent::LayoutChanged);
                Ok(())
            }
        }
    }

    // ---- detached surfaces -----------------------------------------------

    /// Detaches a grid group into a floating window.
    pub fn float_group(&mut self, id: &str, rect: Option<Rect>) -> Result<()> {
        self.detach_group(id, rect, GroupLocation::Floating)
    }

    /// Detaches a grid group into a popout window.
    pub fn popout_group(&mut self, id: &str, rect: Option<Rect>) -> Result<()> {
        self.detach_group(id, rect, GroupLocation::Popout)
    }

    fn detach_group(&mut self, id: &str, rect: Option<Rect>, location: GroupLocation) -> Result<()> {
        let key = *self
            .group_ids
            .get(id)
            .ok_or_else(|| DockError::UnknownGroup(id.to_owned()))?;
        if self.groups[key].location == location {
            if let Some(rect) = rect {
                self.set_detached_rect(key, rect);
            }
            return Ok(());
        }
        if let Some(leaf) = self.group_leaves.remove(&key) {
            let _ = self.grid.remove_view(leaf);
        }
        self.floating.remove(key);
        self.popout.remove(key);

        let rect = rect.unwrap_or_else(|| self.default_floating_rect());
        self.groups[key].location = location;
        match location {
            GroupLocation::Floating => self.floating.add(key, rect),
            GroupLocation::Popout => self.popout.add(key, rect),
            GroupLocation::Grid => unreachable!("detach targets are floating or popout"),
        }
        self.events.push(DockEvent::LayoutChanged);
        Ok(())
    }

    /// Pops a single panel out of its group into a new floating group.
    pub fn float_panel(&mut self, panel_id: &str, rect: Option<Rect>) -> Result<()> {
        let panel_key = *self
            .panel_ids
            .get(panel_id)
            .ok_or_else(|| DockError::UnknownPanel(panel_id.to_owned()))?;
        let source_key = self.panels[panel_key].group;
        if self.groups[source_key].location == GroupLocation::Floating
            && self.groups[source_key].panels.len() == 1
        {
            debug!(panel = panel_id, "panel already floats alone");
            return Ok(());
        }
        let source_id = self.groups[source_key].id.clone();
        let rect = rect.unwrap_or_else(|| self.default_floating_rect());
        let new_group = self.create_detached_group(rect, GroupLocation::Floating);
        let new_id = self.groups[new_group].id.clone();
        self.events.push(DockEvent::AddGroup { group: new_id.clone() });

        self.detach_panel(panel_key, source_key, false);
        self.panels[panel_key].group = new_group;
        self.groups[new_group].open_panel(panel_key, None, false);
        self.events.push(DockEvent::MovePanel {
            panel: panel_id.to_owned(),
            from: source_id,
            to: new_id.clone(),
        });
        self.events.push(DockEvent::ActivePanelChange {
            group: new_id,
            panel: Some(panel_id.to_owned()),
        });
        self.set_active_group_key(Some(new_group));
        self.events.push(DockEvent::LayoutChanged);
        Ok(())
    }

    pub fn set_group_rect(&mut self, id: &str, rect: Rect) -> Result<()> {
        let key = *self
            .group_ids
            .get(id)
            .ok_or_else(|| DockError::UnknownGroup(id.to_owned()))?;
        if self.set_detached_rect(key, rect) {
            self.events.push(DockEvent::LayoutChanged);
        }
        Ok(())
    }

    fn set_detached_rect(&mut self, key: GroupKey, rect: Rect) -> bool {
        self.floating.set_rect(key, rect) || self.popout.set_rect(key, rect)
    }

    // ---- maximize --------------------------------------------------------

    pub fn maximize_group(&mut self, id: &str) -> Result<()> {
        let key = *self
            .group_ids
            .get(id)
            .ok_or_else(|| DockError::UnknownGroup(id.to_owned()))?;
        let Some(&leaf) = self.group_leaves.get(&key) else {
            debug!(group = id, "detached groups cannot maximize");
            return Ok(());
        };
        self.grid.maximize(leaf)?;
        self.events.push(DockEvent::MaximizedGroupChange {
            group: Some(id.to_owned()),
        });
        self.events.push(DockEvent::LayoutChanged);
        Ok(())
    }

    pub fn exit_maximized_group(&mut self) {
        if self.grid.exit_maximize() {
            self.events.push(DockEvent::MaximizedGroupChange { group: None });
            self.events.push(DockEvent::LayoutChanged);
        }
    }

    // ---- geometry --------------------------------------------------------

    /// Lays the grid out against a new container size and pushes the
    /// resulting rects into the active panel views.
    pub fn layout(&mut self, width: f64, height: f64) {
        self.grid.layout(width, height);
        self.layout_views();
    }

    /// Re-runs layout against the last known container size.
    pub fn resize_to_fit(&mut self) {
        self.grid.resize_to_fit();
        self.layout_views();
    }

    fn layout_views(&mut self) {
        let mut jobs: Vec<(GroupKey, Rect)> = self
            .group_leaves
            .iter()
            .map(|(&group, &leaf)| (group, self.grid.rect_of(leaf)))
            .collect();
        jobs.extend(self.floating.iter().chain(self.popout.iter()).map(|e| (e.group, e.rect)));
        for (group, rect) in jobs {
            if let Some(active) = self.groups.get(group).and_then(|g| g.active)
                && let Some(panel) = self.panels.get_mut(active)
            {
                panel.view.layout(rect.size.width, rect.size.height);
            }
        }
    }

    pub fn set_separator_size(&mut self, size: f64) {
        if (self.settings.separator_size - size).abs() < f64::EPSILON {
            return;
        }
        self.settings.separator_size = size;
        self.grid.set_separator(size);
        self.grid.resize_to_fit();
        self.events.push(DockEvent::LayoutChanged);
    }

    /// Drags the separator after child `index` of the branch at `path` by
    /// `delta` pixels. Returns the clamped delta actually applied.
    pub fn drag_separator_at(&mut self, path: &[usize], index: usize, delta: f64) -> Result<f64> {
        let branch = self.grid.node_at_path(path)?;
        let applied = self.grid.drag_separator(branch, index, delta)?;
        if applied != 0.0 {
            self.events.push(DockEvent::LayoutChanged);
        }
        Ok(applied)
    }

    // ---- drag and drop ---------------------------------------------------

    pub fn drag_start_panel(&mut self, panel_id: &str) -> Result<()> {
        let panel_key = *self
            .panel_ids
            .get(panel_id)
            .ok_or_else(|| DockError::UnknownPanel(panel_id.to_owned()))?;
        let group_id = self.groups[self.panels[panel_key].group].id.clone();
        self.dnd.drag_start(PanelTransfer::panel(
            self.instance_id.clone(),
            group_id,
            panel_id,
        ));
        Ok(())
    }

    pub fn drag_start_group(&mut self, group_id: &str) -> Result<()> {
        if !self.group_ids.contains_key(group_id) {
            return Err(DockError::UnknownGroup(group_id.to_owned()));
        }
        self.dnd
            .drag_start(PanelTransfer::group(self.instance_id.clone(), group_id));
        Ok(())
    }

    /// Pointer moved over a group during a drag. Returns the drop zone the
    /// overlay shows, if any.
    pub fn drag_over(
        &mut self,
        group_id: &str,
        pointer: Point,
        hovered_tab: Option<usize>,
    ) -> Result<Option<DropZone>> {
        let key = *self
            .group_ids
            .get(group_id)
            .ok_or_else(|| DockError::UnknownGroup(group_id.to_owned()))?;
        let Some(rect) = self.group_rect(group_id) else {
            return Ok(None);
        };
        Ok(self.dnd.drag_over(
            &self.groups[key],
            rect,
            pointer,
            hovered_tab,
            &self.instance_id,
            &self.settings,
        ))
    }

    pub fn drag_leave(&mut self) {
        self.dnd.drag_leave();
    }

    pub fn drag_end(&mut self) {
        self.dnd.drag_end();
    }

    pub fn drop_overlay(&self) -> Option<(&str, DropZone)> {
        self.dnd.overlay()
    }

    /// Delivers the drop of the current gesture onto `group_id`. A missing
    /// or foreign payload is a silent no-op.
    pub fn drop_on_group(
        &mut self,
        group_id: &str,
        pointer: Point,
        hovered_tab: Option<usize>,
    ) -> Result<()> {
        let target_key = *self
            .group_ids
            .get(group_id)
            .ok_or_else(|| DockError::UnknownGroup(group_id.to_owned()))?;
        let Some(payload) = self.dnd.take_payload() else {
            debug!(group = group_id, "drop without a payload ignored");
            return Ok(());
        };
        if payload.instance_id != self.instance_id {
            // Cross-instance payloads carry ids this arena cannot resolve;
            // materializing them is the embedder's job.
            debug!(?payload, "cross-instance drop left to the embedder");
            return Ok(());
        }
        let Some(rect) = self.group_rect(group_id) else {
            return Ok(());
        };
        if !self.groups[target_key].can_display_overlay(
            Some(&payload),
            &self.instance_id,
            &self.settings,
        ) {
            debug!(?payload, group = group_id, "drop refused by target");
            return Ok(());
        }
        let Some(zone) = classify(rect, pointer, self.settings.drop_edge_ratio, hovered_tab) else {
            return Ok(());
        };
        match &payload.panel_id {
            Some(panel) => {
                if !self.panel_ids.contains_key(panel) {
                    debug!(panel, "stale drag payload ignored");
                    return Ok(());
                }
                self.move_panel(panel, group_id, zone)
            }
            None => {
                if !self.group_ids.contains_key(&payload.group_id) {
                    debug!(group = %payload.group_id, "stale drag payload ignored");
                    return Ok(());
                }
                self.move_group(&payload.group_id, group_id, zone)
            }
        }
    }

    // ---- whole-document operations ---------------------------------------

    /// Disposes every panel and resets to an empty layout.
    pub fn clear(&mut self) {
        self.reset_state(Orientation::Horizontal, self.grid.width(), self.grid.height());
        self.events.push(DockEvent::LayoutChanged);
    }

    fn reset_state(&mut self, orientation: Orientation, width: f64, height: f64) {
        for (_, panel) in self.panels.iter_mut() {
            panel.dispose();
        }
        self.panels.clear();
        self.groups.clear();
        self.panel_ids.clear();
        self.group_ids.clear();
        self.group_leaves.clear();
        self.floating.clear();
        self.popout.clear();
        self.active_group = None;
        self.dnd.drag_leave();
        self.grid = GridTree::new(orientation, self.settings.separator_size);
        self.grid.layout(width, height);
    }

    pub fn to_json(&self) -> SerializedDock {
        let mut panels: BTreeMap<String, SerializedPanel> = BTreeMap::new();
        for (_, panel) in self.panels.iter() {
            panels.insert(
                panel.id.clone(),
                SerializedPanel {
                    id: panel.id.clone(),
                    content_component: panel.content_component.clone(),
                    tab_component: panel.tab_component.clone(),
                    title: Some(panel.title.clone()),
                    params: panel.params.clone(),
                },
            );
        }
        SerializedDock {
            grid: SerializedGrid {
                root: self.serialize_node(self.grid.root()),
                width: self.grid.width(),
                height: self.grid.height(),
                orientation: self.grid.orientation(),
            },
            panels,
            active_group: self.active_group_id().map(str::to_owned),
            floating_groups: self.serialize_detached(&self.floating),
            popout_groups: self.serialize_detached(&self.popout),
        }
    }

    fn serialize_node(&self, key: NodeKey) -> SerializedNode {
        match self.grid.kind(key) {
            NodeKind::Branch { children, .. } => SerializedNode::Branch {
                data: children.iter().map(|&c| self.serialize_node(c)).collect(),
                size: self.grid.size_of(key),
            },
            NodeKind::Leaf { view } => SerializedNode::Leaf {
                data: self.serialize_group(*view),
                size: self.grid.size_of(key),
            },
        }
    }

    fn serialize_group(&self, key: GroupKey) -> SerializedGroup {
        let group = &self.groups[key];
        SerializedGroup {
            id: group.id.clone(),
            views: group
                .panels
                .iter()
                .map(|&p| self.panels[p].id.clone())
                .collect(),
            active_view: self.group_active_panel_id(key),
            locked: group.locked,
        }
    }

    fn serialize_detached(&self, registry: &DetachedRegistry) -> Vec<SerializedDetached> {
        registry
            .iter()
            .map(|entry| SerializedDetached {
                data: self.serialize_group(entry.group),
                position: entry.rect.into(),
            })
            .collect()
    }

    /// Replaces the whole layout with a persisted document. The document is
    /// validated before any state is touched; on a malformed document the
    /// engine is either left untouched or cleared, per `policy`.
    pub fn from_json(&mut self, doc: &SerializedDock, policy: RestorePolicy) -> Result<()> {
        if let Err(e) = serialization::validate(doc) {
            warn!(error = %e, "rejected malformed layout document");
            if policy == RestorePolicy::ClearOnError {
                self.reset_state(Orientation::Horizontal, self.grid.width(), self.grid.height());
                self.events.push(DockEvent::LayoutChanged);
            }
            return Err(e);
        }

        self.reset_state(doc.grid.orientation, doc.grid.width, doc.grid.height);
        match &doc.grid.root {
            SerializedNode::Branch { data, .. } => {
                for child in data {
                    self.build_node(doc, self.grid.root(), doc.grid.orientation, child)?;
                }
            }
            // A bare leaf root is valid on the wire; it lands as the root
            // branch's only child.
            leaf @ SerializedNode::Leaf { .. } => {
                self.build_node(doc, self.grid.root(), doc.grid.orientation, leaf)?;
            }
        }
        for detached in &doc.floating_groups {
            let rect = detached.position.into();
            self.build_detached(doc, &detached.data, rect, GroupLocation::Floating)?;
        }
        for detached in &doc.popout_groups {
            let rect = detached.position.into();
            self.build_detached(doc, &detached.data, rect, GroupLocation::Popout)?;
        }
        if let Some(active) = &doc.active_group {
            self.active_group = self.group_ids.get(active).copied();
        } else {
            self.active_group = self
                .grid
                .leaves()
                .first()
                .and_then(|&leaf| self.grid.view_at(leaf));
        }
        self.grid.layout(doc.grid.width, doc.grid.height);
        self.layout_views();

        info!(
            panels = self.panels.len(),
            groups = self.groups.len(),
            "layout restored from document"
        );
        self.events.push(DockEvent::LayoutFromJson);
        self.events.push(DockEvent::LayoutChanged);
        Ok(())
    }

    /// Orientation alternates with depth; only the root's is persisted.
    fn build_node(
        &mut self,
        doc: &SerializedDock,
        parent: NodeKey,
        parent_orientation: Orientation,
        node: &SerializedNode,
    ) -> Result<()> {
        match node {
            SerializedNode::Branch { data, size } => {
                let orientation = parent_orientation.perpendicular();
                let branch = self.grid.push_branch(parent, orientation, *size);
                for child in data {
                    self.build_node(doc, branch, orientation, child)?;
                }
                Ok(())
            }
            SerializedNode::Leaf { data, size } => {
                let key = self.build_group(doc, data, GroupLocation::Grid)?;
                let leaf =
                    self.grid
                        .push_leaf(parent, key, ViewConstraints::default(), *size);
                self.group_leaves.insert(key, leaf);
                self.refresh_group_constraints(key);
                Ok(())
            }
        }
    }

    fn build_detached(
        &mut self,
        doc: &SerializedDock,
        data: &SerializedGroup,
        rect: Rect,
        location: GroupLocation,
    ) -> Result<()> {
        let key = self.build_group(doc, data, location)?;
        match location {
            GroupLocation::Floating => self.floating.add(key, rect),
            GroupLocation::Popout => self.popout.add(key, rect),
            GroupLocation::Grid => unreachable!("detached groups only"),
        }
        Ok(())
    }

    fn build_group(
        &mut self,
        doc: &SerializedDock,
        data: &SerializedGroup,
        location: GroupLocation,
    ) -> Result<GroupKey> {
        let mut group = Group::new(data.id.clone());
        group.locked = data.locked;
        let key = self.register_group(group, location);
        self.next_group_seq = self.next_group_seq.max(group_seq_hint(&data.id));

        for view in &data.views {
            let serialized = doc.panels.get(view).ok_or_else(|| {
                DockError::MalformedDocument(format!("panel '{view}' missing from document"))
            })?;
            let handle = self
                .factory
                .create_panel(&serialized.id, &serialized.content_component);
            let mut panel = Panel::new(
                serialized.id.clone(),
                serialized.content_component.clone(),
                serialized.tab_component.clone(),
                serialized.params.clone(),
                key,
                handle,
            );
            if let Some(title) = &serialized.title {
                panel.set_title(title);
            }
            let panel_key = self.panels.insert(panel);
            self.panel_ids.insert(serialized.id.clone(), panel_key);
            self.groups[key].open_panel(panel_key, None, true);
        }
        if let Some(active) = &data.active_view
            && let Some(&panel_key) = self.panel_ids.get(active)
        {
            self.groups[key].set_active(panel_key);
        }
        Ok(key)
    }

    pub fn save_layout(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_json())?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "layout saved");
        Ok(())
    }

    pub fn restore_layout(&mut self, path: &Path) -> Result<()> {
        let raw = std::fs::read_to_string(path)?;
        let doc: SerializedDock = serde_json::from_str(&raw)?;
        self.from_json(&doc, RestorePolicy::KeepOnError)
    }
}

/// Seeds the id counter past ids like `group_7` found in a document, so
/// fresh ids never collide with restored ones.
fn group_seq_hint(id: &str) -> u64 {
    id.strip_prefix("group_")
        .and_then(|n| n.parse::<u64>().ok())
        .map(|n| n + 1)
        .unwrap_or(0)
}
