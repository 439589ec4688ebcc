use crate::animation::ease::Ease;
use crate::animation::tween::{NodeProps, Tween};
use crate::foundation::core::{Affine, Rgba8, Vec2};
use crate::foundation::error::{ReelError, ReelResult};

/// Index of a node in a [`SceneGraph`] arena.
///
/// Ids are never reused; a pruned node keeps its slot as a tombstone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

/// A caption leaf: text already sized to its line.
#[derive(Clone, Debug, PartialEq)]
pub struct Caption {
    /// Text to lay out.
    pub text: String,
    /// Font size in pixels.
    pub font_size: f32,
    /// Fill color.
    pub color: Rgba8,
    /// Line-break width in pixels.
    pub max_width: f32,
}

/// Node payload.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// Scene root.
    Layer,
    /// Transform/opacity container.
    Group,
    /// Text leaf, anchored at its bottom-left corner.
    Caption(Caption),
    /// Pruned slot.
    Removed,
}

#[derive(Clone, Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    origin: Vec2,
    base: NodeProps,
    tween: Option<Tween>,
}

impl Node {
    fn new(kind: NodeKind, base: NodeProps) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            origin: Vec2::ZERO,
            base,
            tween: None,
        }
    }

    fn props_at(&self, at_ms: u64) -> NodeProps {
        match &self.tween {
            Some(tw) => tw.sample(at_ms),
            None => self.base,
        }
    }
}

/// Result of [`SceneGraph::prune_branch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PruneOutcome {
    /// The branch existed; this many nodes were removed.
    Pruned(usize),
    /// The group chain was shallower than requested (or already empty); nothing changed.
    NoOp,
}

/// One caption resolved to world space, ready to rasterize.
#[derive(Clone, Debug)]
pub struct DrawItem<'a> {
    /// Source node.
    pub node: NodeId,
    /// Caption payload.
    pub caption: &'a Caption,
    /// Local-to-canvas transform; local origin is the caption anchor.
    pub transform: Affine,
    /// Accumulated opacity.
    pub opacity: f64,
}

/// Arena-backed visual tree: parent/child links are indices, never pointers.
#[derive(Clone, Debug)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Create a graph holding only the root layer.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Layer, NodeProps::default())],
            root: NodeId(0),
        }
    }

    /// Root layer id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached group.
    pub fn create_group(&mut self) -> NodeId {
        self.push(Node::new(NodeKind::Group, NodeProps::default()))
    }

    /// Create a detached caption with initial props.
    pub fn create_caption(&mut self, caption: Caption, props: NodeProps) -> NodeId {
        self.push(Node::new(NodeKind::Caption(caption), props))
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    fn get(&self, id: NodeId) -> ReelResult<&Node> {
        match self.nodes.get(id.0 as usize) {
            Some(n) if n.kind != NodeKind::Removed => Ok(n),
            _ => Err(ReelError::render(format!("scene node {id:?} does not exist"))),
        }
    }

    fn get_mut(&mut self, id: NodeId) -> ReelResult<&mut Node> {
        match self.nodes.get_mut(id.0 as usize) {
            Some(n) if n.kind != NodeKind::Removed => Ok(n),
            _ => Err(ReelError::render(format!("scene node {id:?} does not exist"))),
        }
    }

    /// `true` when `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_ok()
    }

    /// Node payload.
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get(id).ok().map(|n| &n.kind)
    }

    /// Parent of a live node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).ok().and_then(|n| n.parent)
    }

    /// Children of a live node in paint order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Number of live nodes, root included.
    pub fn live_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.kind != NodeKind::Removed)
            .count()
    }

    /// Append `child` as the last child of `parent`, detaching it from any previous parent.
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> ReelResult<()> {
        if matches!(self.get(parent)?.kind, NodeKind::Caption(_)) {
            return Err(ReelError::render("captions cannot have children"));
        }
        self.get(child)?;
        if child == self.root {
            return Err(ReelError::render("the root layer cannot be reparented"));
        }
        let mut cur = Some(parent);
        while let Some(c) = cur {
            if c == child {
                return Err(ReelError::render(
                    "appending a node under its own descendant would create a cycle",
                ));
            }
            cur = self.parent(c);
        }

        self.detach(child)?;
        self.get_mut(parent)?.children.push(child);
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Remove `id` from its parent's child list; the node stays alive.
    pub fn detach(&mut self, id: NodeId) -> ReelResult<()> {
        let Some(parent) = self.get(id)?.parent else {
            return Ok(());
        };
        self.get_mut(parent)?.children.retain(|c| *c != id);
        self.get_mut(id)?.parent = None;
        Ok(())
    }

    /// Set the pivot for rotation and scale, in the node's local space.
    pub fn set_origin(&mut self, id: NodeId, origin: Vec2) -> ReelResult<()> {
        self.get_mut(id)?.origin = origin;
        Ok(())
    }

    /// Props of `id` at scene time `at_ms`.
    pub fn props_at(&self, id: NodeId, at_ms: u64) -> ReelResult<NodeProps> {
        Ok(self.get(id)?.props_at(at_ms))
    }

    /// Start a transition from the node's state at `start_ms` to `to`.
    ///
    /// Returns the scene time at which the transition settles.
    pub fn animate(
        &mut self,
        id: NodeId,
        to: NodeProps,
        start_ms: u64,
        duration_ms: u64,
        ease: Ease,
    ) -> ReelResult<u64> {
        let node = self.get_mut(id)?;
        let from = node.props_at(start_ms);
        let tween = Tween {
            from,
            to,
            start_ms,
            duration_ms,
            ease,
        };
        node.base = to;
        node.tween = Some(tween);
        Ok(tween.end_ms())
    }

    /// Number of groups on the first-group-child chain starting at `id` (inclusive).
    pub fn chain_depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cur = Some(id);
        while let Some(c) = cur {
            match self.kind(c) {
                Some(NodeKind::Group) => depth += 1,
                _ => break,
            }
            cur = self.first_group_child(c);
        }
        depth
    }

    fn first_group_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| matches!(self.kind(*c), Some(NodeKind::Group)))
    }

    /// Walk `depth` steps down the first-group-child chain from `id` and drop everything below
    /// the group reached.
    ///
    /// A chain shorter than `depth`, or a target group with no children, is a no-op.
    pub fn prune_branch(&mut self, id: NodeId, depth: usize) -> PruneOutcome {
        let mut cur = id;
        for _ in 0..depth {
            match self.first_group_child(cur) {
                Some(next) => cur = next,
                None => return PruneOutcome::NoOp,
            }
        }
        if !matches!(self.kind(cur), Some(NodeKind::Group)) {
            return PruneOutcome::NoOp;
        }

        let children = std::mem::take(&mut self.nodes[cur.0 as usize].children);
        if children.is_empty() {
            return PruneOutcome::NoOp;
        }
        let removed = children.into_iter().map(|c| self.remove_subtree(c)).sum();
        PruneOutcome::Pruned(removed)
    }

    fn remove_subtree(&mut self, id: NodeId) -> usize {
        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let Some(node) = self.nodes.get_mut(n.0 as usize) else {
                continue;
            };
            if node.kind == NodeKind::Removed {
                continue;
            }
            stack.append(&mut node.children);
            *node = Node::new(NodeKind::Removed, NodeProps::default());
            removed += 1;
        }
        removed
    }

    /// Resolve every live caption reachable from the root into paint order at `at_ms`.
    pub fn draw_list(&self, at_ms: u64) -> Vec<DrawItem<'_>> {
        let mut out = Vec::new();
        // (node, parent transform, parent opacity); children pushed reversed to paint in order.
        let mut stack = vec![(self.root, Affine::IDENTITY, 1.0f64)];
        while let Some((id, parent_xf, parent_opacity)) = stack.pop() {
            let Ok(node) = self.get(id) else {
                continue;
            };
            let props = node.props_at(at_ms);
            let xf = parent_xf * local_transform(&props, node.origin);
            let opacity = parent_opacity * props.opacity.clamp(0.0, 1.0);
            if opacity <= 0.0 {
                continue;
            }
            match &node.kind {
                NodeKind::Caption(caption) => out.push(DrawItem {
                    node: id,
                    caption,
                    transform: xf,
                    opacity,
                }),
                NodeKind::Layer | NodeKind::Group => {
                    for c in node.children.iter().rev() {
                        stack.push((*c, xf, opacity));
                    }
                }
                NodeKind::Removed => {}
            }
        }
        out
    }
}

fn local_transform(props: &NodeProps, origin: Vec2) -> Affine {
    Affine::translate(props.translate)
        * Affine::translate(origin)
        * Affine::rotate(props.rotate_deg.to_radians())
        * Affine::scale_non_uniform(props.scale.x, props.scale.y)
        * Affine::translate(-origin)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/graph.rs"]
mod tests;
