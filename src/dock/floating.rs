//! Registry of groups detached from the grid.
//!
//! Floating and popped-out groups live here, each with its own bounds.
//! Insertion order doubles as stacking order; re-adding an existing group
//! raises it.

use crate::geometry::Rect;
use crate::model::GroupKey;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetachedEntry {
    pub group: GroupKey,
    pub rect: Rect,
}

#[derive(Debug, Default)]
pub struct DetachedRegistry {
    entries: Vec<DetachedEntry>,
}

impl DetachedRegistry {
    pub fn add(&mut self, group: GroupKey, rect: Rect) {
        self.entries.retain(|e| e.group != group);
        self.entries.push(DetachedEntry { group, rect });
    }

    pub fn remove(&mut self, group: GroupKey) -> Option<Rect> {
        let index = self.entries.iter().position(|e| e.group == group)?;
        Some(self.entries.remove(index).rect)
    }

    pub fn contains(&self, group: GroupKey) -> bool {
        self.entries.iter().any(|e| e.group == group)
    }

    pub fn rect_of(&self, group: GroupKey) -> Option<Rect> {
        self.entries.iter().find(|e| e.group == group).map(|e| e.rect)
    }

    pub fn set_rect(&mut self, group: GroupKey, rect: Rect) -> bool {
        match self.entries.iter_mut().find(|e| e.group == group) {
            Some(entry) => {
                entry.rect = rect;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &DetachedEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
