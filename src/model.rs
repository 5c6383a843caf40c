pub mod group;
pub mod panel;

slotmap::new_key_type! {
    /// Arena key of a tabbed group.
    pub struct GroupKey;

    /// Arena key of a panel.
    pub struct PanelKey;
}
