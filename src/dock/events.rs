//! Events emitted by the engine, drained with
//! [`DockEngine::take_events`](crate::dock::engine::DockEngine::take_events).
//!
//! Ordering within one logical operation: structural additions first
//! (`AddGroup`, `AddPanel`), then activation changes (`ActivePanelChange`,
//! `ActiveGroupChange`), then exactly one `LayoutChanged`. An operation that
//! changes nothing emits nothing.

/// Events carry string identifiers rather than arena keys, so they stay
/// meaningful after the entity they describe is gone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DockEvent {
    AddGroup { group: String },
    RemoveGroup { group: String },
    ActiveGroupChange { group: Option<String> },
    AddPanel { panel: String, group: String },
    RemovePanel { panel: String, group: String },
    ActivePanelChange { group: String, panel: Option<String> },
    MovePanel { panel: String, from: String, to: String },
    MaximizedGroupChange { group: Option<String> },
    TitleChanged { panel: String, title: String },
    ParamsChanged { panel: String },
    LayoutChanged,
    /// A whole document was loaded; per-entity events are suppressed during
    /// the load.
    LayoutFromJson,
}
