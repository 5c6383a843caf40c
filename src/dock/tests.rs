//! End-to-end scenarios against the engine API: panel lifecycle, redocking,
//! maximize, and document round-trips.

use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::config::DockSettings;
use crate::dnd::DropZone;
use crate::dock::engine::{AddPanelOptions, DockEngine, PanelPosition, RestorePolicy};
use crate::dock::events::DockEvent;
use crate::geometry::{Point, Rect};
use crate::layout::Direction;
use crate::model::panel::Patch;
use crate::view::NullFactory;

fn engine() -> DockEngine {
    let settings = DockSettings { separator_size: 0.0, ..DockSettings::default() };
    let mut e = DockEngine::new(Box::new(NullFactory), settings);
    e.layout(1000.0, 800.0);
    e
}

fn add(e: &mut DockEngine, id: &str) {
    e.add_panel(AddPanelOptions::new(id, "default")).unwrap();
}

fn add_relative(e: &mut DockEngine, id: &str, reference: &str, direction: Direction) {
    e.add_panel(AddPanelOptions {
        position: Some(PanelPosition::RelativeToPanel {
            panel: reference.into(),
            direction,
        }),
        ..AddPanelOptions::new(id, "default")
    })
    .unwrap();
}

fn layout_changes(events: &[DockEvent]) -> usize {
    events.iter().filter(|e| **e == DockEvent::LayoutChanged).count()
}

#[test_log::test]
fn first_panel_creates_and_activates_a_group() {
    let mut e = engine();
    add(&mut e, "p1");

    let group_id = e.active_group_id().unwrap().to_owned();
    assert_eq!(e.get_group_id_of("p1"), group_id);
    assert_eq!(e.get_group(&group_id).map(|g| g.panels.len()), Some(1));
    assert_eq!(e.active_panel_id(), Some("p1"));

    assert_eq!(
        e.take_events(),
        vec![
            DockEvent::AddGroup { group: group_id.clone() },
            DockEvent::AddPanel { panel: "p1".into(), group: group_id.clone() },
            DockEvent::ActivePanelChange { group: group_id.clone(), panel: Some("p1".into()) },
            DockEvent::ActiveGroupChange { group: Some(group_id) },
            DockEvent::LayoutChanged,
        ]
    );
}

#[test_log::test]
fn unpositioned_panels_tab_into_the_active_group() {
    let mut e = engine();
    add(&mut e, "p1");
    e.take_events();
    add(&mut e, "p2");

    let group_id = e.active_group_id().unwrap().to_owned();
    assert_eq!(e.group_count(), 1);
    assert_eq!(e.active_panel_id(), Some("p2"));
    assert_eq!(
        e.take_events(),
        vec![
            DockEvent::AddPanel { panel: "p2".into(), group: group_id.clone() },
            DockEvent::ActivePanelChange { group: group_id, panel: Some("p2".into()) },
            DockEvent::LayoutChanged,
        ]
    );
}

#[test_log::test]
fn directional_add_splits_the_grid() {
    let mut e = engine();
    add(&mut e, "p1");
    add_relative(&mut e, "p2", "p1", Direction::Right);

    assert_eq!(e.group_count(), 2);
    let left = e.group_rect(e.get_group_id_of("p1")).unwrap();
    let right = e.group_rect(e.get_group_id_of("p2")).unwrap();
    assert_eq!(left, Rect::new(0.0, 0.0, 500.0, 800.0));
    assert_eq!(right, Rect::new(500.0, 0.0, 500.0, 800.0));
    assert_eq!(e.active_panel_id(), Some("p2"));
}

#[test_log::test]
fn inactive_add_keeps_focus() {
    let mut e = engine();
    add(&mut e, "p1");
    e.add_panel(AddPanelOptions {
        inactive: true,
        ..AddPanelOptions::new("p2", "default")
    })
    .unwrap();

    assert_eq!(e.active_panel_id(), Some("p1"));
}

#[test_log::test]
fn removing_a_tab_activates_its_previous_neighbor() {
    let mut e = engine();
    add(&mut e, "p1");
    add(&mut e, "p2");
    add(&mut e, "p3");
    e.set_active_panel("p2").unwrap();
    e.take_events();

    e.remove_panel("p2").unwrap();
    assert_eq!(e.active_panel_id(), Some("p1"));
    let group_id = e.active_group_id().unwrap().to_owned();
    assert_eq!(
        e.take_events(),
        vec![
            DockEvent::RemovePanel { panel: "p2".into(), group: group_id.clone() },
            DockEvent::ActivePanelChange { group: group_id, panel: Some("p1".into()) },
            DockEvent::LayoutChanged,
        ]
    );
}

#[test_log::test]
fn removing_the_last_panel_removes_the_group() {
    let mut e = engine();
    add(&mut e, "p1");
    add_relative(&mut e, "p2", "p1", Direction::Right);
    e.take_events();

    let right_id = e.get_group_id_of("p2").to_owned();
    e.remove_panel("p2").unwrap();

    assert_eq!(e.group_count(), 1);
    assert_eq!(e.panel_count(), 1);
    // The surviving group regains the full container.
    let left_rect = e.group_rect(e.get_group_id_of("p1")).unwrap();
    assert_eq!(left_rect, Rect::new(0.0, 0.0, 1000.0, 800.0));

    let events = e.take_events();
    assert!(events.contains(&DockEvent::RemoveGroup { group: right_id }));
    assert_eq!(layout_changes(&events), 1);
    // The removed group was active; activation falls back to the survivor.
    assert_eq!(e.active_panel_id(), Some("p1"));
}

#[test_log::test]
fn emptied_locked_group_stays_in_the_grid() {
    let mut e = engine();
    add(&mut e, "p1");
    add_relative(&mut e, "p2", "p1", Direction::Right);
    let pinned = e.get_group_id_of("p2").to_owned();
    e.set_group_locked(&pinned, true).unwrap();
    e.take_events();

    e.remove_panel("p2").unwrap();
    assert_eq!(e.group_count(), 2);
    let group = e.get_group(&pinned).unwrap();
    assert!(group.panels.is_empty());
    assert_eq!(group.active, None);
    assert_eq!(
        e.take_events(),
        vec![
            DockEvent::RemovePanel { panel: "p2".into(), group: pinned.clone() },
            DockEvent::ActivePanelChange { group: pinned, panel: None },
            DockEvent::LayoutChanged,
        ]
    );
}

#[test_log::test]
fn close_all_panels_tears_the_group_down() {
    let mut e = engine();
    add(&mut e, "p1");
    add(&mut e, "p2");
    add_relative(&mut e, "p3", "p1", Direction::Right);
    e.take_events();

    let group = e.get_group_id_of("p1").to_owned();
    e.close_all_panels(&group).unwrap();

    assert_eq!(e.group_count(), 1);
    assert_eq!(e.panel_count(), 1);
    assert!(e.get_panel("p1").is_none());
    assert!(e.get_panel("p2").is_none());
    let events = e.take_events();
    assert!(events.contains(&DockEvent::RemoveGroup { group }));
}

#[test_log::test]
fn move_panel_to_an_edge_creates_a_group() {
    let mut e = engine();
    add(&mut e, "p1");
    add(&mut e, "p2");
    add_relative(&mut e, "p3", "p1", Direction::Right);
    e.take_events();

    let target = e.get_group_id_of("p3").to_owned();
    let source = e.get_group_id_of("p1").to_owned();
    e.move_panel("p2", &target, DropZone::Bottom).unwrap();

    assert_eq!(e.group_count(), 3);
    let new_group = e.get_group_id_of("p2").to_owned();
    assert_ne!(new_group, source);
    assert_ne!(new_group, target);
    // p3's column is split vertically.
    let p3_rect = e.group_rect(&target).unwrap();
    let p2_rect = e.group_rect(&new_group).unwrap();
    assert_eq!(p3_rect, Rect::new(500.0, 0.0, 500.0, 400.0));
    assert_eq!(p2_rect, Rect::new(500.0, 400.0, 500.0, 400.0));

    let events = e.take_events();
    assert!(events.contains(&DockEvent::MovePanel {
        panel: "p2".into(),
        from: source,
        to: new_group,
    }));
    assert_eq!(layout_changes(&events), 1);
}

#[test_log::test]
fn move_panel_center_merges_tabs() {
    let mut e = engine();
    add(&mut e, "p1");
    add(&mut e, "p2");
    add_relative(&mut e, "p3", "p1", Direction::Right);
    e.take_events();

    let target = e.get_group_id_of("p3").to_owned();
    e.move_panel("p2", &target, DropZone::Center { tab_index: Some(0) })
        .unwrap();

    assert_eq!(e.group_count(), 2);
    assert_eq!(e.get_group_id_of("p2"), e.get_group_id_of("p3"));
    let group = e.get_group(&target).unwrap();
    assert_eq!(group.panels.len(), 2);
    // Inserted at tab index 0, and active.
    assert_eq!(group.active_index(), Some(0));
    assert_eq!(e.active_panel_id(), Some("p2"));
}

#[test_log::test]
fn self_drop_on_the_current_tab_slot_is_silent() {
    let mut e = engine();
    add(&mut e, "p1");
    add(&mut e, "p2");
    e.take_events();

    let group = e.get_group_id_of("p2").to_owned();
    e.move_panel("p2", &group, DropZone::Center { tab_index: Some(1) })
        .unwrap();
    assert!(e.take_events().is_empty());

    // A different slot is a real reorder and still announces itself.
    e.move_panel("p2", &group, DropZone::Center { tab_index: Some(0) })
        .unwrap();
    assert_eq!(e.get_group(&group).and_then(|g| g.active_index()), Some(0));
    let events = e.take_events();
    assert!(events.contains(&DockEvent::MovePanel {
        panel: "p2".into(),
        from: group.clone(),
        to: group,
    }));
    assert_eq!(layout_changes(&events), 1);
}

#[test_log::test]
fn moving_the_last_panel_drops_the_emptied_group() {
    let mut e = engine();
    add(&mut e, "p1");
    add_relative(&mut e, "p2", "p1", Direction::Right);
    e.take_events();

    let source = e.get_group_id_of("p2").to_owned();
    let target = e.get_group_id_of("p1").to_owned();
    e.move_panel("p2", &target, DropZone::Center { tab_index: None })
        .unwrap();

    assert_eq!(e.group_count(), 1);
    let events = e.take_events();
    assert!(events.contains(&DockEvent::RemoveGroup { group: source }));
    assert_eq!(layout_changes(&events), 1);
}

#[test_log::test]
fn group_center_drop_merges_whole_group() {
    let mut e = engine();
    add(&mut e, "p1");
    add(&mut e, "p2");
    add_relative(&mut e, "p3", "p1", Direction::Right);
    e.set_active_panel("p1").unwrap();
    e.take_events();

    let source = e.get_group_id_of("p1").to_owned();
    let target = e.get_group_id_of("p3").to_owned();
    e.move_group(&source, &target, DropZone::Center { tab_index: None })
        .unwrap();

    assert_eq!(e.group_count(), 1);
    let group = e.get_group(&target).unwrap();
    assert_eq!(group.panels.len(), 3);
    // The moved group's active panel stays active after the merge.
    assert_eq!(e.active_panel_id(), Some("p1"));
}

#[test_log::test]
fn drag_and_drop_redocks_through_the_controller() {
    let mut e = engine();
    add(&mut e, "p1");
    add(&mut e, "p2");
    add_relative(&mut e, "p3", "p1", Direction::Right);
    e.take_events();

    let target = e.get_group_id_of("p3").to_owned();
    e.drag_start_panel("p2").unwrap();
    let zone = e
        .drag_over(&target, Point::new(990.0, 400.0), None)
        .unwrap();
    assert_eq!(zone, Some(DropZone::Right));
    assert_eq!(e.drop_overlay(), Some((target.as_str(), DropZone::Right)));

    e.drop_on_group(&target, Point::new(990.0, 400.0), None).unwrap();
    assert_eq!(e.group_count(), 3);
    assert_eq!(e.drop_overlay(), None);
}

#[test_log::test]
fn self_drag_of_a_lone_panel_is_suppressed() {
    let mut e = engine();
    add(&mut e, "p1");
    add_relative(&mut e, "p2", "p1", Direction::Right);
    e.take_events();

    let own = e.get_group_id_of("p2").to_owned();
    e.drag_start_panel("p2").unwrap();
    let zone = e.drag_over(&own, Point::new(990.0, 400.0), None).unwrap();
    assert_eq!(zone, None);

    e.drop_on_group(&own, Point::new(990.0, 400.0), None).unwrap();
    assert_eq!(e.group_count(), 2);
    assert!(e.take_events().is_empty());
}

#[test_log::test]
fn stale_drop_payload_is_a_silent_noop() {
    let mut e = engine();
    add(&mut e, "p1");
    add_relative(&mut e, "p2", "p1", Direction::Right);

    e.drag_start_panel("p2").unwrap();
    e.remove_panel("p2").unwrap();
    e.take_events();

    let target = e.get_group_id_of("p1").to_owned();
    e.drop_on_group(&target, Point::new(500.0, 400.0), None).unwrap();
    assert!(e.take_events().is_empty());

    // The payload was consumed; a second drop is equally inert.
    e.drop_on_group(&target, Point::new(500.0, 400.0), None).unwrap();
    assert!(e.take_events().is_empty());
}

#[test_log::test]
fn maximize_restores_exact_sizes() {
    let mut e = engine();
    add(&mut e, "p1");
    add_relative(&mut e, "p2", "p1", Direction::Right);
    add_relative(&mut e, "p3", "p2", Direction::Right);
    e.drag_separator_at(&[], 0, 57.0).unwrap();
    e.take_events();

    let ids: Vec<String> = ["p1", "p2", "p3"]
        .iter()
        .map(|p| e.get_group_id_of(p).to_owned())
        .collect();
    let before: Vec<Rect> = ids.iter().map(|g| e.group_rect(g).unwrap()).collect();

    e.maximize_group(&ids[1]).unwrap();
    assert_eq!(e.maximized_group_id(), Some(ids[1].as_str()));
    assert_eq!(e.group_rect(&ids[1]), Some(Rect::new(0.0, 0.0, 1000.0, 800.0)));
    assert_eq!(e.group_rect(&ids[0]), Some(Rect::zero()));

    e.exit_maximized_group();
    assert_eq!(e.maximized_group_id(), None);
    let after: Vec<Rect> = ids.iter().map(|g| e.group_rect(g).unwrap()).collect();
    assert_eq!(before, after);

    let events = e.take_events();
    assert_eq!(
        events,
        vec![
            DockEvent::MaximizedGroupChange { group: Some(ids[1].clone()) },
            DockEvent::LayoutChanged,
            DockEvent::MaximizedGroupChange { group: None },
            DockEvent::LayoutChanged,
        ]
    );
}

#[test_log::test]
fn floating_panel_lives_off_the_grid() {
    let mut e = engine();
    add(&mut e, "p1");
    e.add_panel(AddPanelOptions {
        position: Some(PanelPosition::Floating {
            rect: Some(Rect::new(40.0, 40.0, 300.0, 200.0)),
        }),
        ..AddPanelOptions::new("p2", "default")
    })
    .unwrap();

    let float_id = e.get_group_id_of("p2").to_owned();
    assert_eq!(e.group_rect(&float_id), Some(Rect::new(40.0, 40.0, 300.0, 200.0)));
    // The grid still holds only p1's group, at full size.
    assert_eq!(e.group_rect(e.get_group_id_of("p1")), Some(Rect::new(0.0, 0.0, 1000.0, 800.0)));
}

#[test_log::test]
fn directional_drop_on_a_floating_group_tabs_instead() {
    let mut e = engine();
    add(&mut e, "p1");
    add(&mut e, "p2");
    e.add_panel(AddPanelOptions {
        position: Some(PanelPosition::Floating { rect: None }),
        ..AddPanelOptions::new("p3", "default")
    })
    .unwrap();

    let float_id = e.get_group_id_of("p3").to_owned();
    e.move_panel("p2", &float_id, DropZone::Left).unwrap();
    assert_eq!(e.get_group(&float_id).map(|g| g.panels.len()), Some(2));
}

#[test_log::test]
fn float_and_redock_a_group() {
    let mut e = engine();
    add(&mut e, "p1");
    add_relative(&mut e, "p2", "p1", Direction::Right);
    e.take_events();

    let group = e.get_group_id_of("p2").to_owned();
    e.float_group(&group, Some(Rect::new(10.0, 10.0, 400.0, 300.0))).unwrap();
    assert_eq!(e.group_rect(&group), Some(Rect::new(10.0, 10.0, 400.0, 300.0)));
    assert_eq!(e.group_rect(e.get_group_id_of("p1")), Some(Rect::new(0.0, 0.0, 1000.0, 800.0)));

    let anchor = e.get_group_id_of("p1").to_owned();
    e.move_group(&group, &anchor, DropZone::Bottom).unwrap();
    assert_eq!(e.group_rect(&group), Some(Rect::new(0.0, 400.0, 1000.0, 400.0)));
}

#[test_log::test]
fn params_remove_differs_from_set_null() {
    let mut e = engine();
    e.add_panel(AddPanelOptions {
        params: serde_json::from_value(json!({"a": 1, "b": 2})).unwrap(),
        ..AddPanelOptions::new("p1", "default")
    })
    .unwrap();
    e.take_events();

    e.update_panel_params(
        "p1",
        [
            ("a".to_owned(), Patch::Remove),
            ("b".to_owned(), Patch::Set(serde_json::Value::Null)),
        ],
    )
    .unwrap();

    let params = &e.get_panel("p1").unwrap().params;
    assert!(!params.contains_key("a"));
    assert_eq!(params.get("b"), Some(&serde_json::Value::Null));
    assert_eq!(e.take_events(), vec![DockEvent::ParamsChanged { panel: "p1".into() }]);
}

#[test_log::test]
fn title_change_emits_once() {
    let mut e = engine();
    add(&mut e, "p1");
    e.take_events();

    e.set_panel_title("p1", "Editor").unwrap();
    e.set_panel_title("p1", "Editor").unwrap();
    assert_eq!(
        e.take_events(),
        vec![DockEvent::TitleChanged { panel: "p1".into(), title: "Editor".into() }]
    );
}

#[test_log::test]
fn duplicate_panel_id_is_rejected() {
    let mut e = engine();
    add(&mut e, "p1");
    let result = e.add_panel(AddPanelOptions::new("p1", "default"));
    assert!(matches!(result, Err(crate::error::DockError::DuplicatePanel(_))));
}

#[test_log::test]
fn round_trip_preserves_the_document() {
    let mut e = engine();
    add(&mut e, "p1");
    add(&mut e, "p2");
    add_relative(&mut e, "p3", "p1", Direction::Right);
    add_relative(&mut e, "p4", "p3", Direction::Below);
    e.add_panel(AddPanelOptions {
        position: Some(PanelPosition::Floating {
            rect: Some(Rect::new(20.0, 30.0, 300.0, 200.0)),
        }),
        ..AddPanelOptions::new("p5", "default")
    })
    .unwrap();
    let locked_group = e.get_group_id_of("p1").to_owned();
    e.set_group_locked(&locked_group, true).unwrap();
    e.set_panel_title("p2", "Console").unwrap();
    e.set_active_panel("p1").unwrap();

    let doc = e.to_json();
    let mut restored = engine();
    restored.from_json(&doc, RestorePolicy::KeepOnError).unwrap();

    assert_eq!(restored.to_json(), doc);
    assert_eq!(restored.active_group_id(), e.active_group_id());
    assert_eq!(restored.active_panel_id(), Some("p1"));
    // Geometry survives: p3's leaf occupies the same rect.
    assert_eq!(
        restored.group_rect(restored.get_group_id_of("p3")),
        e.group_rect(e.get_group_id_of("p3")),
    );

    let events = restored.take_events();
    assert!(events.contains(&DockEvent::LayoutFromJson));
    assert_eq!(layout_changes(&events), 1);
}

#[test_log::test]
fn document_without_titles_falls_back_to_panel_ids() {
    let doc: crate::dock::serialization::SerializedDock = serde_json::from_value(json!({
        "grid": {
            "root": {"type": "branch", "size": 1000.0, "data": [
                {"type": "leaf", "size": 1000.0, "data": {"id": "group_1", "views": ["p1"], "activeView": "p1"}}
            ]},
            "width": 1000.0,
            "height": 800.0,
            "orientation": "HORIZONTAL"
        },
        "panels": {"p1": {"id": "p1", "contentComponent": "default"}}
    }))
    .unwrap();

    let mut e = engine();
    e.from_json(&doc, RestorePolicy::KeepOnError).unwrap();
    assert_eq!(e.get_panel("p1").map(|p| p.title.as_str()), Some("p1"));
    assert_eq!(e.active_panel_id(), Some("p1"));
}

#[test_log::test]
fn leaf_root_document_is_accepted() {
    let doc: crate::dock::serialization::SerializedDock = serde_json::from_value(json!({
        "grid": {
            "root": {"type": "leaf", "size": 800.0, "data": {"id": "group_1", "views": ["p1"]}},
            "width": 800.0,
            "height": 600.0,
            "orientation": "HORIZONTAL"
        },
        "panels": {"p1": {"id": "p1", "contentComponent": "default", "title": "One"}}
    }))
    .unwrap();

    let mut e = engine();
    e.from_json(&doc, RestorePolicy::KeepOnError).unwrap();
    assert_eq!(e.group_count(), 1);
    assert_eq!(e.group_rect("group_1"), Some(Rect::new(0.0, 0.0, 800.0, 600.0)));
    // Re-serializing normalizes to a branch root holding the leaf.
    assert!(matches!(
        e.to_json().grid.root,
        crate::dock::serialization::SerializedNode::Branch { .. }
    ));
}

#[test_log::test]
fn malformed_document_leaves_the_engine_untouched() {
    let mut e = engine();
    add(&mut e, "p1");
    let mut doc = e.to_json();
    // Declare a panel no group references.
    doc.panels.insert(
        "ghost".into(),
        crate::dock::serialization::SerializedPanel {
            id: "ghost".into(),
            content_component: "default".into(),
            tab_component: None,
            title: Some("ghost".into()),
            params: crate::view::Params::new(),
        },
    );

    let before = e.to_json();
    let result = e.from_json(&doc, RestorePolicy::KeepOnError);
    assert!(result.is_err());
    assert_eq!(e.to_json(), before);
    assert_eq!(e.panel_count(), 1);
}

#[test_log::test]
fn malformed_document_with_clear_policy_empties_the_engine() {
    let mut e = engine();
    add(&mut e, "p1");
    let mut doc = e.to_json();
    doc.active_group = Some("nope".into());

    assert!(e.from_json(&doc, RestorePolicy::ClearOnError).is_err());
    assert_eq!(e.panel_count(), 0);
    assert_eq!(e.group_count(), 0);
    assert_eq!(e.active_group_id(), None);
}

#[test_log::test]
fn save_and_restore_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layout.json");

    let mut e = engine();
    add(&mut e, "p1");
    add_relative(&mut e, "p2", "p1", Direction::Below);
    e.save_layout(&path).unwrap();

    let mut restored = engine();
    restored.restore_layout(&path).unwrap();
    assert_eq!(restored.to_json(), e.to_json());
}

#[test_log::test]
fn clear_disposes_everything() {
    let mut e = engine();
    add(&mut e, "p1");
    add(&mut e, "p2");
    e.take_events();

    e.clear();
    assert_eq!(e.panel_count(), 0);
    assert_eq!(e.group_count(), 0);
    assert_eq!(e.active_group_id(), None);
    assert_eq!(layout_changes(&e.take_events()), 1);
}

#[test_log::test]
fn draw_tree_names_every_group() {
    let mut e = engine();
    add(&mut e, "p1");
    add_relative(&mut e, "p2", "p1", Direction::Right);
    let drawn = e.draw_tree();
    assert!(drawn.contains(e.get_group_id_of("p1")));
    assert!(drawn.contains(e.get_group_id_of("p2")));
}

impl DockEngine {
    /// Test helper: the id of the group holding `panel`.
    fn get_group_id_of(&self, panel: &str) -> &str {
        let key = self.get_panel(panel).map(|p| p.group).unwrap();
        self.group_id_of_key(key).unwrap()
    }
}
