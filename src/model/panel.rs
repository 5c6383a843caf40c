//! A panel: identity, metadata, and the view handle that renders it.

use std::fmt;

use serde_json::Value;

use crate::model::GroupKey;
use crate::view::{PanelView, Params, ViewConstraints};

/// One entry of a parameter update. `Remove` deletes the key; `Set` with a
/// null value stores the null. The two are not the same operation.
#[derive(Clone, Debug, PartialEq)]
pub enum Patch {
    Set(Value),
    Remove,
}

pub struct Panel {
    pub id: String,
    pub title: String,
    pub content_component: String,
    pub tab_component: Option<String>,
    pub params: Params,
    pub group: GroupKey,
    pub view: Box<dyn PanelView>,
    disposed: bool,
}

impl Panel {
    pub fn new(
        id: String,
        content_component: String,
        tab_component: Option<String>,
        params: Params,
        group: GroupKey,
        mut view: Box<dyn PanelView>,
    ) -> Self {
        view.init(&params);
        Panel {
            title: id.clone(),
            id,
            content_component,
            tab_component,
            params,
            group,
            view,
            disposed: false,
        }
    }

    pub fn constraints(&self) -> ViewConstraints { self.view.constraints() }

    /// Merges a set of patches into the parameter map and notifies the view
    /// once. Returns whether anything actually changed.
    pub fn update_params(&mut self, patches: impl IntoIterator<Item = (String, Patch)>) -> bool {
        let mut changed = false;
        for (key, patch) in patches {
            match patch {
                Patch::Set(value) => {
                    if self.params.get(&key) != Some(&value) {
                        self.params.insert(key, value);
                        changed = true;
                    }
                }
                Patch::Remove => {
                    if self.params.remove(&key).is_some() {
                        changed = true;
                    }
                }
            }
        }
        if changed {
            self.view.update(&self.params);
        }
        changed
    }

    /// Updates the title, propagating to the view. Setting the current title
    /// again is a no-op.
    pub fn set_title(&mut self, title: &str) -> bool {
        if self.title == title {
            return false;
        }
        self.title = title.to_owned();
        self.view.set_title(title);
        true
    }

    /// Releases the view. Safe to call more than once; only the first call
    /// reaches the view.
    pub fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.view.dispose();
        }
    }
}

impl fmt::Debug for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Panel")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("content_component", &self.content_component)
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}
