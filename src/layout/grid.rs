//! The grid/split tree.
//!
//! A slotmap arena of nodes. Branches hold an ordered list of children along
//! one axis; leaves hold an opaque view payload (the engine stores group
//! keys here). All structural edits keep two invariants: a non-root branch
//! never ends up with exactly one child, and child sizes along a branch's
//! axis sum (with separators) to the branch's own extent once layout settles.

use slotmap::SlotMap;
use tracing::debug;

use crate::error::{DockError, Result};
use crate::geometry::Rect;
use crate::layout::sizing::{self, SizeConstraints, SizedItem};
use crate::layout::{Direction, Orientation};
use crate::view::ViewConstraints;

slotmap::new_key_type! {
    /// A node somewhere in the grid.
    pub struct NodeKey;
}

#[derive(Debug)]
pub enum NodeKind<T> {
    Branch {
        orientation: Orientation,
        children: Vec<NodeKey>,
    },
    Leaf {
        view: T,
    },
}

#[derive(Debug)]
struct GridNode<T> {
    parent: Option<NodeKey>,
    kind: NodeKind<T>,
    /// Extent along the parent branch's axis.
    size: f64,
    proportional_share: f64,
    rect: Rect,
    /// Leaf-declared constraints; unused on branches (derived instead).
    constraints: ViewConstraints,
}

struct MaximizedState {
    leaf: NodeKey,
    /// Snapshot of every node's (size, share) at maximize time, restored
    /// verbatim on exit.
    sizes: Vec<(NodeKey, f64, f64)>,
}

pub struct GridTree<T> {
    nodes: SlotMap<NodeKey, GridNode<T>>,
    root: NodeKey,
    width: f64,
    height: f64,
    separator: f64,
    maximized: Option<MaximizedState>,
}

impl<T: Copy + PartialEq> GridTree<T> {
    pub fn new(orientation: Orientation, separator: f64) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(GridNode {
            parent: None,
            kind: NodeKind::Branch { orientation, children: Vec::new() },
            size: 0.0,
            proportional_share: 0.0,
            rect: Rect::zero(),
            constraints: ViewConstraints::default(),
        });
        GridTree {
            nodes,
            root,
            width: 0.0,
            height: 0.0,
            separator,
            maximized: None,
        }
    }

    pub fn root(&self) -> NodeKey { self.root }

    pub fn width(&self) -> f64 { self.width }

    pub fn height(&self) -> f64 { self.height }

    pub fn separator(&self) -> f64 { self.separator }

    pub fn set_separator(&mut self, separator: f64) { self.separator = separator; }

    pub fn orientation(&self) -> Orientation {
        match &self.nodes[self.root].kind {
            NodeKind::Branch { orientation, .. } => *orientation,
            NodeKind::Leaf { .. } => unreachable!("root is always a branch"),
        }
    }

    pub fn kind(&self, key: NodeKey) -> &NodeKind<T> { &self.nodes[key].kind }

    pub fn size_of(&self, key: NodeKey) -> f64 { self.nodes[key].size }

    pub fn rect_of(&self, key: NodeKey) -> Rect { self.nodes[key].rect }

    pub fn parent_of(&self, key: NodeKey) -> Option<NodeKey> { self.nodes[key].parent }

    pub fn contains(&self, key: NodeKey) -> bool { self.nodes.contains_key(key) }

    pub fn view_at(&self, key: NodeKey) -> Option<T> {
        match &self.nodes.get(key)?.kind {
            NodeKind::Leaf { view } => Some(*view),
            NodeKind::Branch { .. } => None,
        }
    }

    pub fn is_empty(&self) -> bool { self.children_of(self.root).is_empty() }

    /// Leaves in document (preorder) order.
    pub fn leaves(&self) -> Vec<NodeKey> {
        let mut out = Vec::new();
        self.collect_leaves(self.root, &mut out);
        out
    }

    pub fn leaf_count(&self) -> usize { self.leaves().len() }

    pub fn leaf_for_view(&self, view: T) -> Option<NodeKey> {
        self.leaves().into_iter().find(|&k| self.view_at(k) == Some(view))
    }

    pub fn set_constraints(&mut self, leaf: NodeKey, constraints: ViewConstraints) {
        debug_assert!(matches!(self.nodes[leaf].kind, NodeKind::Leaf { .. }));
        self.nodes[leaf].constraints = constraints;
    }

    fn collect_leaves(&self, key: NodeKey, out: &mut Vec<NodeKey>) {
        match &self.nodes[key].kind {
            NodeKind::Leaf { .. } => out.push(key),
            NodeKind::Branch { children, .. } => {
                for &child in children {
                    self.collect_leaves(child, out);
                }
            }
        }
    }

    fn children_of(&self, key: NodeKey) -> &[NodeKey] {
        match &self.nodes[key].kind {
            NodeKind::Branch { children, .. } => children,
            NodeKind::Leaf { .. } => &[],
        }
    }

    fn branch_orientation(&self, key: NodeKey) -> Orientation {
        match &self.nodes[key].kind {
            NodeKind::Branch { orientation, .. } => *orientation,
            NodeKind::Leaf { .. } => unreachable!("expected a branch"),
        }
    }

    // ---- path addressing -------------------------------------------------

    pub fn node_at_path(&self, path: &[usize]) -> Result<NodeKey> {
        let mut node = self.root;
        for &index in path {
            let children = self.children_of(node);
            node = *children.get(index).ok_or_else(|| DockError::InvalidPath {
                path: path.to_vec(),
            })?;
        }
        Ok(node)
    }

    pub fn path_of(&self, key: NodeKey) -> Vec<usize> {
        let mut path = Vec::new();
        let mut node = key;
        while let Some(parent) = self.nodes[node].parent {
            let index = self
                .children_of(parent)
                .iter()
                .position(|&c| c == node)
                .expect("child missing from its parent's list");
            path.push(index);
            node = parent;
        }
        path.reverse();
        path
    }

    // ---- structural edits ------------------------------------------------

    /// Inserts a new leaf adjacent to `reference` in `direction`, or appends
    /// to the root when no reference is given. `Within` never reaches the
    /// grid; it is a tab insertion handled by the group model.
    pub fn add_view(
        &mut self,
        view: T,
        constraints: ViewConstraints,
        reference: Option<NodeKey>,
        direction: Direction,
    ) -> Result<NodeKey> {
        let leaf = self.mk_leaf(view, constraints);
        match reference {
            None => self.append_to_root(leaf),
            Some(reference) => {
                if !self.nodes.contains_key(reference) {
                    self.nodes.remove(leaf);
                    return Err(DockError::InvalidPath { path: vec![] });
                }
                self.insert_relative(leaf, reference, direction);
            }
        }
        self.relayout();
        Ok(leaf)
    }

    /// Inserts a new leaf at an explicit child-index path. The final path
    /// element is the insertion index within the branch the prefix resolves
    /// to.
    pub fn add_view_at_path(
        &mut self,
        view: T,
        constraints: ViewConstraints,
        path: &[usize],
    ) -> Result<NodeKey> {
        let Some((&index, prefix)) = path.split_last() else {
            return Err(DockError::InvalidPath { path: path.to_vec() });
        };
        let parent = self.node_at_path(prefix)?;
        if !matches!(self.nodes[parent].kind, NodeKind::Branch { .. }) {
            return Err(DockError::InvalidPath { path: path.to_vec() });
        }
        let sibling_count = self.children_of(parent).len();
        let index = index.min(sibling_count);

        let size = self.mean_child_size(parent);
        let leaf = self.mk_leaf(view, constraints);
        self.nodes[leaf].size = size;
        self.nodes[leaf].parent = Some(parent);
        match &mut self.nodes[parent].kind {
            NodeKind::Branch { children, .. } => children.insert(index, leaf),
            NodeKind::Leaf { .. } => unreachable!(),
        }
        self.relayout();
        Ok(leaf)
    }

    /// Removes a leaf and returns its payload. A parent branch left with one
    /// child is collapsed into that child.
    pub fn remove_view(&mut self, leaf: NodeKey) -> Result<T> {
        let view = self
            .view_at(leaf)
            .ok_or(DockError::InvalidPath { path: vec![] })?;
        self.unlink(leaf);
        self.nodes.remove(leaf);
        self.relayout();
        Ok(view)
    }

    /// Atomic remove + insert of an existing leaf: one logical transaction,
    /// one re-layout. The leaf keeps its `NodeKey`.
    pub fn move_view(
        &mut self,
        leaf: NodeKey,
        reference: NodeKey,
        direction: Direction,
    ) -> Result<()> {
        if leaf == reference {
            debug!("move_view onto itself is a no-op");
            return Ok(());
        }
        if self.view_at(leaf).is_none() || !self.nodes.contains_key(reference) {
            return Err(DockError::InvalidPath { path: vec![] });
        }
        self.unlink(leaf);
        self.insert_relative(leaf, reference, direction);
        self.relayout();
        Ok(())
    }

    fn mk_leaf(&mut self, view: T, constraints: ViewConstraints) -> NodeKey {
        self.nodes.insert(GridNode {
            parent: None,
            kind: NodeKind::Leaf { view },
            size: 0.0,
            proportional_share: 0.0,
            rect: Rect::zero(),
            constraints,
        })
    }

    fn mean_child_size(&self, branch: NodeKey) -> f64 {
        let children = self.children_of(branch);
        if children.is_empty() {
            self.nodes[branch].rect.extent(self.branch_orientation(branch))
        } else {
            children.iter().map(|&c| self.nodes[c].size).sum::<f64>() / children.len() as f64
        }
    }

    fn append_to_root(&mut self, leaf: NodeKey) {
        let size = self.mean_child_size(self.root);
        self.nodes[leaf].size = size;
        self.nodes[leaf].parent = Some(self.root);
        match &mut self.nodes[self.root].kind {
            NodeKind::Branch { children, .. } => children.push(leaf),
            NodeKind::Leaf { .. } => unreachable!(),
        }
    }

    /// Links an unattached node next to `reference`. Splitting along the
    /// parent's own axis inserts a sibling; splitting across it nests the
    /// reference inside a new perpendicular branch first.
    fn insert_relative(&mut self, node: NodeKey, reference: NodeKey, direction: Direction) {
        let orientation = direction
            .orientation()
            .expect("`within` is a tab insertion; the group model resolves it");
        let Some(parent) = self.nodes[reference].parent else {
            // Reference became the root after a collapse of a 2-leaf tree;
            // only possible for the root branch itself, so just append.
            self.append_to_root(node);
            return;
        };

        if self.branch_orientation(parent) == orientation {
            let index = self
                .children_of(parent)
                .iter()
                .position(|&c| c == reference)
                .expect("reference missing from its parent");
            let at = if direction.is_after() { index + 1 } else { index };

            let half = self.nodes[reference].size / 2.0;
            self.nodes[reference].size -= half;
            self.nodes[node].size = half;
            self.nodes[node].proportional_share = 0.0;
            self.nodes[node].parent = Some(parent);
            match &mut self.nodes[parent].kind {
                NodeKind::Branch { children, .. } => children.insert(at, node),
                NodeKind::Leaf { .. } => unreachable!(),
            }
        } else {
            // Wrap the reference in a new branch along the requested axis.
            let wrapper = self.nodes.insert(GridNode {
                parent: Some(parent),
                kind: NodeKind::Branch {
                    orientation,
                    children: Vec::with_capacity(2),
                },
                size: self.nodes[reference].size,
                proportional_share: self.nodes[reference].proportional_share,
                rect: self.nodes[reference].rect,
                constraints: ViewConstraints::default(),
            });
            let index = self
                .children_of(parent)
                .iter()
                .position(|&c| c == reference)
                .expect("reference missing from its parent");
            match &mut self.nodes[parent].kind {
                NodeKind::Branch { children, .. } => children[index] = wrapper,
                NodeKind::Leaf { .. } => unreachable!(),
            }

            let extent = self.nodes[reference].rect.extent(orientation);
            let half = extent / 2.0;
            self.nodes[reference].parent = Some(wrapper);
            self.nodes[reference].size = half;
            self.nodes[reference].proportional_share = 0.0;
            self.nodes[node].parent = Some(wrapper);
            self.nodes[node].size = half;
            self.nodes[node].proportional_share = 0.0;

            let pair = if direction.is_after() {
                [reference, node]
            } else {
                [node, reference]
            };
            match &mut self.nodes[wrapper].kind {
                NodeKind::Branch { children, .. } => children.extend(pair),
                NodeKind::Leaf { .. } => unreachable!(),
            }
        }
    }

    /// Detaches `key` from its parent, hands its extent to a neighbour, and
    /// collapses any branch left with fewer than two children. The node
    /// itself stays in the arena.
    fn unlink(&mut self, key: NodeKey) {
        let Some(parent) = self.nodes[key].parent else { return };
        if self.maximized.as_ref().is_some_and(|m| m.leaf == key) {
            self.maximized = None;
        }
        let index = self
            .children_of(parent)
            .iter()
            .position(|&c| c == key)
            .expect("node missing from its parent");
        let freed = self.nodes[key].size + self.separator;
        match &mut self.nodes[parent].kind {
            NodeKind::Branch { children, .. } => {
                children.remove(index);
            }
            NodeKind::Leaf { .. } => unreachable!(),
        }
        self.nodes[key].parent = None;

        let children = self.children_of(parent).to_vec();
        if let Some(&neighbor) = children.get(index.saturating_sub(1)).or(children.first()) {
            self.nodes[neighbor].size += freed;
        }
        self.collapse(parent);
    }

    /// Restores the no-single-child invariant upward from `branch`.
    fn collapse(&mut self, branch: NodeKey) {
        if branch == self.root {
            // The root may hold a single child, but a lone branch child is
            // spliced into the root so paths stay shallow.
            let children = self.children_of(self.root).to_vec();
            if children.len() == 1
                && let NodeKind::Branch { orientation, children: inner } = &self.nodes[children[0]].kind
            {
                let (orientation, inner) = (*orientation, inner.clone());
                for &child in &inner {
                    self.nodes[child].parent = Some(self.root);
                }
                self.nodes.remove(children[0]);
                match &mut self.nodes[self.root].kind {
                    NodeKind::Branch { orientation: o, children } => {
                        *o = orientation;
                        *children = inner;
                    }
                    NodeKind::Leaf { .. } => unreachable!(),
                }
            }
            return;
        }

        let children = self.children_of(branch).to_vec();
        match children.len() {
            0 => {
                // An emptied branch disappears entirely.
                self.unlink(branch);
                self.nodes.remove(branch);
            }
            1 => {
                let only = children[0];
                let parent = self.nodes[branch].parent.expect("non-root branch has a parent");
                let index = self
                    .children_of(parent)
                    .iter()
                    .position(|&c| c == branch)
                    .expect("branch missing from its parent");
                self.nodes[only].parent = Some(parent);
                self.nodes[only].size = self.nodes[branch].size;
                self.nodes[only].proportional_share = self.nodes[branch].proportional_share;
                match &mut self.nodes[parent].kind {
                    NodeKind::Branch { children, .. } => children[index] = only,
                    NodeKind::Leaf { .. } => unreachable!(),
                }
                self.nodes.remove(branch);
                self.collapse(parent);
            }
            _ => {}
        }
    }

    // ---- geometry --------------------------------------------------------

    /// Recomputes absolute rects for the whole tree from relative sizes.
    pub fn layout(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.relayout();
    }

    /// Re-runs layout against the last known container size.
    pub fn resize_to_fit(&mut self) { self.relayout(); }

    fn relayout(&mut self) {
        let root_rect = Rect::new(0.0, 0.0, self.width, self.height);
        if let Some(maximized) = &self.maximized {
            // Sizes are frozen while maximized; only rects move.
            let leaf = maximized.leaf;
            let keys: Vec<NodeKey> = self.nodes.keys().collect();
            for key in keys {
                self.nodes[key].rect = Rect::zero();
            }
            self.nodes[leaf].rect = root_rect;
            return;
        }
        self.nodes[self.root].rect = root_rect;
        self.nodes[self.root].size = root_rect.extent(self.orientation());
        self.layout_branch(self.root);
    }

    fn layout_branch(&mut self, branch: NodeKey) {
        let orientation = self.branch_orientation(branch);
        let rect = self.nodes[branch].rect;
        let children = self.children_of(branch).to_vec();
        if children.is_empty() {
            return;
        }

        let mut items: Vec<SizedItem> = children
            .iter()
            .map(|&child| {
                let node = &self.nodes[child];
                let (minimum, maximum) = self.axis_bounds(child, orientation);
                SizedItem {
                    size: node.size,
                    proportional_share: node.proportional_share,
                    constraints: SizeConstraints { minimum, maximum, snap: None },
                }
            })
            .collect();
        sizing::distribute(&mut items, rect.extent(orientation), self.separator);

        let mut offset = 0.0;
        for (&child, item) in children.iter().zip(&items) {
            self.nodes[child].size = item.size;
            self.nodes[child].proportional_share = item.proportional_share;
            self.nodes[child].rect = rect.segment(orientation, offset, item.size);
            offset += item.size + self.separator;
            if matches!(self.nodes[child].kind, NodeKind::Branch { .. }) {
                self.layout_branch(child);
            }
        }
    }

    /// Effective (minimum, maximum) of a node projected on `axis`,
    /// aggregating the whole subtree for branches.
    fn axis_bounds(&self, key: NodeKey, axis: Orientation) -> (f64, f64) {
        let constraints = self.node_constraints(key);
        match axis {
            Orientation::Horizontal => constraints.horizontal(),
            Orientation::Vertical => constraints.vertical(),
        }
    }

    pub fn node_constraints(&self, key: NodeKey) -> ViewConstraints {
        match &self.nodes[key].kind {
            NodeKind::Leaf { .. } => self.nodes[key].constraints,
            NodeKind::Branch { orientation, children } => {
                let mut along = (0.0f64, 0.0f64);
                let mut across = (0.0f64, f64::INFINITY);
                for &child in children {
                    let c = self.node_constraints(child);
                    let (child_along, child_across) = match orientation {
                        Orientation::Horizontal => (c.horizontal(), c.vertical()),
                        Orientation::Vertical => (c.vertical(), c.horizontal()),
                    };
                    along.0 += child_along.0;
                    along.1 += child_along.1;
                    across.0 = across.0.max(child_across.0);
                    across.1 = across.1.min(child_across.1);
                }
                if !children.is_empty() {
                    along.0 += self.separator * (children.len() - 1) as f64;
                    along.1 += self.separator * (children.len() - 1) as f64;
                }
                // Conflicting cross bounds resolve in favour of the minimum.
                across.1 = across.1.max(across.0);
                match orientation {
                    Orientation::Horizontal => ViewConstraints {
                        minimum_width: along.0,
                        maximum_width: along.1,
                        minimum_height: across.0,
                        maximum_height: across.1,
                    },
                    Orientation::Vertical => ViewConstraints {
                        minimum_width: across.0,
                        maximum_width: across.1,
                        minimum_height: along.0,
                        maximum_height: along.1,
                    },
                }
            }
        }
    }

    /// Fixed-mode resize: drags the separator after `index` inside `branch`.
    /// Only the two adjacent children change. Returns the applied delta.
    pub fn drag_separator(&mut self, branch: NodeKey, index: usize, delta: f64) -> Result<f64> {
        let NodeKind::Branch { orientation, children } = &self.nodes[branch].kind else {
            return Err(DockError::InvalidPath { path: self.path_of(branch) });
        };
        let (orientation, children) = (*orientation, children.clone());
        if index + 1 >= children.len() {
            return Err(DockError::InvalidPath { path: self.path_of(branch) });
        }

        let mut items: Vec<SizedItem> = children
            .iter()
            .map(|&child| {
                let node = &self.nodes[child];
                let (minimum, maximum) = self.axis_bounds(child, orientation);
                SizedItem {
                    size: node.size,
                    proportional_share: node.proportional_share,
                    constraints: SizeConstraints { minimum, maximum, snap: None },
                }
            })
            .collect();
        let applied = sizing::drag_separator(&mut items, index, delta);

        let rect = self.nodes[branch].rect;
        let mut offset = 0.0;
        for (&child, item) in children.iter().zip(&items) {
            self.nodes[child].size = item.size;
            self.nodes[child].proportional_share = item.proportional_share;
            self.nodes[child].rect = rect.segment(orientation, offset, item.size);
            offset += item.size + self.separator;
            if matches!(self.nodes[child].kind, NodeKind::Branch { .. }) {
                self.layout_branch(child);
            }
        }
        Ok(applied)
    }

    // ---- maximize --------------------------------------------------------

    /// Gives `leaf` the whole container. Sibling leaves are hidden (zero
    /// rect) but structurally untouched; their sizes are snapshotted so exit
    /// restores them bit-for-bit.
    pub fn maximize(&mut self, leaf: NodeKey) -> Result<()> {
        if self.view_at(leaf).is_none() {
            return Err(DockError::InvalidPath { path: vec![] });
        }
        let sizes = self
            .nodes
            .iter()
            .map(|(key, node)| (key, node.size, node.proportional_share))
            .collect();
        self.maximized = Some(MaximizedState { leaf, sizes });
        self.relayout();
        Ok(())
    }

    pub fn maximized_view(&self) -> Option<T> {
        self.maximized.as_ref().and_then(|m| self.view_at(m.leaf))
    }

    /// Restores the pre-maximize sizes and re-lays the tree out. Nodes
    /// removed while maximized are skipped.
    pub fn exit_maximize(&mut self) -> bool {
        let Some(state) = self.maximized.take() else {
            return false;
        };
        for (key, size, share) in state.sizes {
            if let Some(node) = self.nodes.get_mut(key) {
                node.size = size;
                node.proportional_share = share;
            }
        }
        self.relayout();
        true
    }

    // ---- serialization builders -----------------------------------------

    pub(crate) fn push_branch(
        &mut self,
        parent: NodeKey,
        orientation: Orientation,
        size: f64,
    ) -> NodeKey {
        let node = self.nodes.insert(GridNode {
            parent: Some(parent),
            kind: NodeKind::Branch { orientation, children: Vec::new() },
            size,
            proportional_share: 0.0,
            rect: Rect::zero(),
            constraints: ViewConstraints::default(),
        });
        match &mut self.nodes[parent].kind {
            NodeKind::Branch { children, .. } => children.push(node),
            NodeKind::Leaf { .. } => unreachable!("cannot attach under a leaf"),
        }
        node
    }

    pub(crate) fn push_leaf(
        &mut self,
        parent: NodeKey,
        view: T,
        constraints: ViewConstraints,
        size: f64,
    ) -> NodeKey {
        let node = self.mk_leaf(view, constraints);
        self.nodes[node].size = size;
        self.nodes[node].parent = Some(parent);
        match &mut self.nodes[parent].kind {
            NodeKind::Branch { children, .. } => children.push(node),
            NodeKind::Leaf { .. } => unreachable!("cannot attach under a leaf"),
        }
        node
    }

    // ---- debugging -------------------------------------------------------

    pub fn draw_tree(&self, label: &dyn Fn(&T) -> String) -> String {
        let tree = self.ascii_node(self.root, label);
        let mut out = String::new();
        let _ = ascii_tree::write_tree(&mut out, &tree);
        out
    }

    fn ascii_node(&self, key: NodeKey, label: &dyn Fn(&T) -> String) -> ascii_tree::Tree {
        let node = &self.nodes[key];
        match &node.kind {
            NodeKind::Leaf { view } => {
                ascii_tree::Tree::Leaf(vec![format!("{} [{:.0}]", label(view), node.size)])
            }
            NodeKind::Branch { orientation, children } => {
                let desc = format!("{orientation:?} [{:.0}]", node.size);
                let children = children.iter().map(|&c| self.ascii_node(c, label)).collect();
                ascii_tree::Tree::Node(desc, children)
            }
        }
    }

    /// Structural self-check used by tests after mutation sequences.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        for (key, node) in self.nodes.iter() {
            if let NodeKind::Branch { children, .. } = &node.kind {
                if key != self.root {
                    assert!(
                        children.len() >= 2,
                        "non-root branch {key:?} has {} children",
                        children.len()
                    );
                }
                for &child in children {
                    assert_eq!(self.nodes[child].parent, Some(key));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn tree() -> GridTree<u32> { GridTree::new(Orientation::Horizontal, 0.0) }

    fn add(t: &mut GridTree<u32>, view: u32) -> NodeKey {
        t.add_view(view, ViewConstraints::default(), None, Direction::Right).unwrap()
    }

    #[test]
    fn split_right_creates_horizontal_pair() {
        let mut t = tree();
        t.layout(800.0, 600.0);
        let a = add(&mut t, 1);
        let b = t
            .add_view(2, ViewConstraints::default(), Some(a), Direction::Right)
            .unwrap();
        t.assert_invariants();

        assert_eq!(t.orientation(), Orientation::Horizontal);
        assert_eq!(t.leaf_count(), 2);
        let total = t.size_of(a) + t.size_of(b);
        assert!((total - 800.0).abs() < 1e-6);
        assert_eq!(t.rect_of(a), Rect::new(0.0, 0.0, 400.0, 600.0));
        assert_eq!(t.rect_of(b), Rect::new(400.0, 0.0, 400.0, 600.0));
    }

    #[test]
    fn perpendicular_split_nests_a_branch() {
        let mut t = tree();
        t.layout(800.0, 600.0);
        let a = add(&mut t, 1);
        let b = t
            .add_view(2, ViewConstraints::default(), Some(a), Direction::Right)
            .unwrap();
        let c = t
            .add_view(3, ViewConstraints::default(), Some(b), Direction::Below)
            .unwrap();
        t.assert_invariants();

        assert_eq!(t.leaf_count(), 3);
        assert_eq!(t.path_of(a), vec![0]);
        assert_eq!(t.path_of(b), vec![1, 0]);
        assert_eq!(t.path_of(c), vec![1, 1]);
        assert_eq!(t.rect_of(b), Rect::new(400.0, 0.0, 400.0, 300.0));
        assert_eq!(t.rect_of(c), Rect::new(400.0, 300.0, 400.0, 300.0));
    }

    #[test]
    fn above_and_left_insert_before_reference() {
        let mut t = tree();
        t.layout(900.0, 600.0);
        let a = add(&mut t, 1);
        let b = t
            .add_view(2, ViewConstraints::default(), Some(a), Direction::Left)
            .unwrap();
        assert_eq!(t.path_of(b), vec![0]);
        assert_eq!(t.path_of(a), vec![1]);

        let c = t
            .add_view(3, ViewConstraints::default(), Some(a), Direction::Above)
            .unwrap();
        assert_eq!(t.path_of(c), vec![1, 0]);
        assert_eq!(t.path_of(a), vec![1, 1]);
        t.assert_invariants();
    }

    #[test]
    fn remove_collapses_single_child_branch() {
        let mut t = tree();
        t.layout(800.0, 600.0);
        let a = add(&mut t, 1);
        let b = t
            .add_view(2, ViewConstraints::default(), Some(a), Direction::Right)
            .unwrap();
        let c = t
            .add_view(3, ViewConstraints::default(), Some(b), Direction::Below)
            .unwrap();

        let removed = t.remove_view(c).unwrap();
        assert_eq!(removed, 3);
        t.assert_invariants();
        // The vertical wrapper is gone; b sits beside a again.
        assert_eq!(t.path_of(b), vec![1]);
        assert_eq!(t.leaf_count(), 2);
    }

    #[test]
    fn removing_last_leaf_leaves_an_empty_root() {
        let mut t = tree();
        t.layout(800.0, 600.0);
        let a = add(&mut t, 1);
        t.remove_view(a).unwrap();
        assert!(t.is_empty());
        assert_eq!(t.leaf_count(), 0);
        t.assert_invariants();
    }

    #[test]
    fn neighbor_absorbs_removed_extent() {
        let mut t = tree();
        t.layout(900.0, 600.0);
        let a = add(&mut t, 1);
        let b = add(&mut t, 2);
        let c = add(&mut t, 3);
        t.remove_view(b).unwrap();
        let total = t.size_of(a) + t.size_of(c);
        assert!((total - 900.0).abs() < 1e-6);
    }

    #[test]
    fn move_view_preserves_leaf_count_and_key() {
        let mut t = tree();
        t.layout(800.0, 600.0);
        let a = add(&mut t, 1);
        let b = add(&mut t, 2);
        let c = add(&mut t, 3);

        t.move_view(a, c, Direction::Below).unwrap();
        t.assert_invariants();
        assert_eq!(t.leaf_count(), 3);
        assert_eq!(t.view_at(a), Some(1));
        assert_eq!(t.path_of(b), vec![0]);
        assert_eq!(t.path_of(c), vec![1, 0]);
        assert_eq!(t.path_of(a), vec![1, 1]);
    }

    #[test]
    fn move_out_of_two_leaf_branch_collapses_it() {
        let mut t = tree();
        t.layout(800.0, 600.0);
        let a = add(&mut t, 1);
        let b = t
            .add_view(2, ViewConstraints::default(), Some(a), Direction::Right)
            .unwrap();
        let c = t
            .add_view(3, ViewConstraints::default(), Some(b), Direction::Below)
            .unwrap();

        // b and c share a vertical wrapper; moving c next to a must dissolve
        // the wrapper in the same transaction.
        t.move_view(c, a, Direction::Left).unwrap();
        t.assert_invariants();
        assert_eq!(t.path_of(c), vec![0]);
        assert_eq!(t.path_of(a), vec![1]);
        assert_eq!(t.path_of(b), vec![2]);
    }

    #[test]
    fn add_view_at_path_inserts_at_index() {
        let mut t = tree();
        t.layout(800.0, 600.0);
        add(&mut t, 1);
        add(&mut t, 2);
        let mid = t.add_view_at_path(9, ViewConstraints::default(), &[1]).unwrap();
        assert_eq!(t.path_of(mid), vec![1]);
        assert_eq!(t.leaf_count(), 3);
    }

    #[test]
    fn bad_path_is_an_error() {
        let mut t = tree();
        add(&mut t, 1);
        assert!(matches!(
            t.node_at_path(&[4]),
            Err(DockError::InvalidPath { .. })
        ));
        assert!(t.add_view_at_path(9, ViewConstraints::default(), &[0, 0]).is_err());
    }

    #[test]
    fn layout_respects_minimums() {
        let mut t = tree();
        t.layout(300.0, 300.0);
        let a = add(&mut t, 1);
        let b = add(&mut t, 2);
        t.set_constraints(
            a,
            ViewConstraints {
                minimum_width: 250.0,
                ..Default::default()
            },
        );
        t.layout(300.0, 300.0);
        assert!(t.size_of(a) >= 250.0);
        let total = t.size_of(a) + t.size_of(b);
        assert!((total - 300.0).abs() < 1e-6);
    }

    #[test]
    fn separators_participate_in_extent() {
        let mut t = GridTree::new(Orientation::Horizontal, 10.0);
        t.layout(810.0, 600.0);
        let a = add(&mut t, 1);
        let b = add(&mut t, 2);
        let total = t.size_of(a) + t.size_of(b);
        assert!((total - 800.0).abs() < 1e-6);
        assert_eq!(t.rect_of(b).min_x(), t.rect_of(a).max_x() + 10.0);
    }

    #[test]
    fn drag_separator_moves_only_neighbors() {
        let mut t = tree();
        t.layout(900.0, 600.0);
        let a = add(&mut t, 1);
        let b = add(&mut t, 2);
        let c = add(&mut t, 3);
        let before_c = t.size_of(c);

        let applied = t.drag_separator(t.root(), 0, 50.0).unwrap();
        assert_eq!(applied, 50.0);
        assert!((t.size_of(a) - 350.0).abs() < 1e-6);
        assert!((t.size_of(b) - 250.0).abs() < 1e-6);
        assert_eq!(t.size_of(c), before_c);
    }

    #[test]
    fn maximize_hides_siblings_and_restores_sizes() {
        let mut t = tree();
        t.layout(900.0, 600.0);
        let a = add(&mut t, 1);
        let b = add(&mut t, 2);
        let c = add(&mut t, 3);
        t.drag_separator(t.root(), 0, 60.0).unwrap();
        let before: Vec<f64> = [a, b, c].iter().map(|&k| t.size_of(k)).collect();

        t.maximize(b).unwrap();
        assert_eq!(t.maximized_view(), Some(2));
        assert_eq!(t.rect_of(b), Rect::new(0.0, 0.0, 900.0, 600.0));
        assert_eq!(t.rect_of(a), Rect::zero());

        // Layout while maximized must not disturb the frozen sizes.
        t.layout(900.0, 600.0);
        assert!(t.exit_maximize());
        let after: Vec<f64> = [a, b, c].iter().map(|&k| t.size_of(k)).collect();
        assert_eq!(before, after);
        assert_eq!(t.rect_of(a).size.height, 600.0);
    }

    #[test]
    fn draw_tree_renders_every_leaf() {
        let mut t = tree();
        t.layout(800.0, 600.0);
        add(&mut t, 1);
        add(&mut t, 2);
        let drawn = t.draw_tree(&|v| format!("view-{v}"));
        assert!(drawn.contains("view-1"));
        assert!(drawn.contains("view-2"));
    }
}
