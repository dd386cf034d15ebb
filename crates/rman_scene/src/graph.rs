//! Scene Graph
//!
//! Captured commands stored as a navigable tree.
//!
//! # Overview
//!
//! Every [`Node`] holds one command and two edges: `next` continues the
//! current block and `descendent` steps into a nested block. A descendent is
//! a whole chain, so a block body is a "vertical" list hanging off its
//! `*Begin` node. The closing `*End` is the last node of that chain.
//!
//! Nodes live in a [`SlotMap`] arena. An edge created by ordinary insertion
//! owns its target; an edge created by [`SceneBuilder::insert_and_link`] is a
//! plain key into the same arena and owns nothing. Removal walks owning
//! edges only.
//!
//! ```rust,ignore
//! let mut builder = SceneBuilder::new();
//! builder.insert_and_descent(RiCall::WorldBegin {}.into());
//! builder.insert_and_next(sphere.into());
//! builder.insert_and_ascent(RiCall::WorldEnd {}.into())?;
//! let graph = builder.finish()?;
//! for visit in &graph {
//!     println!("{:indent$}{}", "", visit.command.class_name(), indent = visit.depth * 2);
//! }
//! ```

use slotmap::{SlotMap, new_key_type};

use rman_core::{ErrorCode, Result, RiError};

use crate::command::RiCommand;

new_key_type! {
    /// Arena key of a scene graph node.
    pub struct NodeId;
}

/// One captured command and its two edges.
#[derive(Debug, Clone)]
pub struct Node {
    command: RiCommand,
    next: Option<NodeId>,
    descendent: Option<NodeId>,
    /// `descendent` is a non-owning link.
    linked: bool,
}

impl Node {
    #[inline]
    #[must_use]
    pub fn command(&self) -> &RiCommand {
        &self.command
    }

    #[inline]
    #[must_use]
    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    #[inline]
    #[must_use]
    pub fn descendent(&self) -> Option<NodeId> {
        self.descendent
    }

    /// Whether the descendent edge is a link to a subtree owned elsewhere.
    #[inline]
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.linked
    }
}

/// Arena of captured commands.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, Node>,
    head: Option<NodeId>,
}

impl SceneGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First node of the top-level chain.
    #[must_use]
    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn command(&self, id: NodeId) -> Option<&RiCommand> {
        self.nodes.get(id).map(Node::command)
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Depth-first traversal from the head.
    #[must_use]
    pub fn iter(&self) -> SceneIter<'_> {
        SceneIter::new(self)
    }

    /// Feeds every command, in capture order, to `f`. Stops at the first error.
    pub fn replay<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&RiCommand) -> Result<()>,
    {
        for visit in self {
            f(visit.command)?;
        }
        Ok(())
    }

    /// Detaches `id` from its owner and destroys it together with its owned
    /// `next` and `descendent` chains. Returns the number of nodes removed.
    ///
    /// Link edges are never followed: a linked subtree survives, and links
    /// into removed nodes go stale and are skipped by traversal.
    pub fn remove_subtree(&mut self, id: NodeId) -> usize {
        if !self.nodes.contains_key(id) {
            return 0;
        }
        if self.head == Some(id) {
            self.head = None;
        }
        for node in self.nodes.values_mut() {
            if node.next == Some(id) {
                node.next = None;
            }
            if !node.linked && node.descendent == Some(id) {
                node.descendent = None;
            }
        }

        let mut removed = 0;
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let Some(node) = self.nodes.remove(current) else {
                continue;
            };
            removed += 1;
            pending.extend(node.next);
            if !node.linked {
                pending.extend(node.descendent);
            }
        }
        removed
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
    }
}

impl<'a> IntoIterator for &'a SceneGraph {
    type Item = Visit<'a>;
    type IntoIter = SceneIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
// Traversal
// ============================================================================

/// One step of a depth-first traversal.
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a> {
    pub id: NodeId,
    pub command: &'a RiCommand,
    /// Block nesting depth, `0` for the top-level chain.
    pub depth: usize,
    /// Reached through a link edge.
    pub linked: bool,
}

/// Depth-first iterator: a node's descendent chain is visited before its
/// `next`. Pending siblings are kept on an explicit stack.
#[derive(Debug, Clone)]
pub struct SceneIter<'a> {
    graph: &'a SceneGraph,
    stack: Vec<(NodeId, usize, bool)>,
}

impl<'a> SceneIter<'a> {
    fn new(graph: &'a SceneGraph) -> Self {
        let mut iter = Self {
            graph,
            stack: Vec::new(),
        };
        iter.reset();
        iter
    }

    /// Restarts the traversal at the head of the graph.
    pub fn reset(&mut self) {
        self.stack.clear();
        if let Some(head) = self.graph.head {
            self.stack.push((head, 0, false));
        }
    }
}

impl<'a> Iterator for SceneIter<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((id, depth, linked)) = self.stack.pop() {
            let Some(node) = self.graph.nodes.get(id) else {
                // stale link
                continue;
            };
            if let Some(next) = node.next {
                self.stack.push((next, depth, linked));
            }
            if let Some(descendent) = node.descendent {
                self.stack.push((descendent, depth + 1, linked || node.linked));
            }
            return Some(Visit {
                id,
                command: &node.command,
                depth,
                linked,
            });
        }
        None
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Where the next node is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Head,
    Next(NodeId),
    Descendent(NodeId),
}

#[derive(Debug, Clone)]
struct Mark {
    slot: Slot,
    blocks: Vec<NodeId>,
}

/// Cursor based construction of a [`SceneGraph`].
///
/// Every [`insert_and_descent`](Self::insert_and_descent) has to be closed
/// by exactly one [`insert_and_ascent`](Self::insert_and_ascent) at the same
/// depth; [`finish`](Self::finish) rejects a graph with open blocks.
#[derive(Debug, Default)]
pub struct SceneBuilder {
    graph: SceneGraph,
    slot: Option<Slot>,
    blocks: Vec<NodeId>,
    marks: Vec<Mark>,
}

impl SceneBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The graph built so far.
    #[must_use]
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Number of open blocks.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.blocks.len()
    }

    /// The innermost open block.
    #[must_use]
    pub fn current_block(&self) -> Option<NodeId> {
        self.blocks.last().copied()
    }

    /// Appends a leaf and stays in the current block.
    pub fn insert_and_next(&mut self, command: RiCommand) -> NodeId {
        let id = self.insert(command);
        self.slot = Some(Slot::Next(id));
        id
    }

    /// Appends a block-opening command and moves into its body.
    pub fn insert_and_descent(&mut self, command: RiCommand) -> NodeId {
        let id = self.insert(command);
        self.blocks.push(id);
        self.slot = Some(Slot::Descendent(id));
        id
    }

    /// Appends the closing command of the innermost block and continues
    /// after that block.
    pub fn insert_and_ascent(&mut self, command: RiCommand) -> Result<NodeId> {
        let Some(&begin) = self.blocks.last() else {
            return Err(RiError::error(
                ErrorCode::Nesting,
                format!("{} without an open block", command.class_name()),
            ));
        };
        let opened = self.graph.nodes[begin].command.request();
        if opened.block_end() != Some(command.request()) {
            return Err(RiError::error(
                ErrorCode::Nesting,
                format!("{} closes {opened}", command.class_name()),
            ));
        }
        self.blocks.pop();
        let id = self.insert(command);
        self.slot = Some(Slot::Next(begin));
        Ok(id)
    }

    /// Appends `command` with a non-owning link to the body of the closed
    /// block opened by `block`, and stays in the current block.
    pub fn insert_and_link(&mut self, command: RiCommand, block: NodeId) -> Result<NodeId> {
        let Some(target) = self.graph.nodes.get(block) else {
            return Err(RiError::error(
                ErrorCode::BadHandle,
                format!("{} links to an unknown node", command.class_name()),
            ));
        };
        if !target.command.request().is_block_begin() || self.blocks.contains(&block) {
            return Err(RiError::error(
                ErrorCode::IllState,
                format!(
                    "{} must link to a closed block, not {}",
                    command.class_name(),
                    target.command.class_name()
                ),
            ));
        }
        let body = target.descendent;
        let id = self.insert_and_next(command);
        let node = &mut self.graph.nodes[id];
        node.descendent = body;
        node.linked = true;
        Ok(id)
    }

    /// Saves the cursor.
    pub fn push_mark(&mut self) {
        self.marks.push(Mark {
            slot: self.slot.unwrap_or(Slot::Head),
            blocks: self.blocks.clone(),
        });
    }

    /// Restores the cursor saved by the matching [`push_mark`](Self::push_mark).
    /// Later insertions are spliced in front of whatever follows the mark.
    pub fn pop_mark(&mut self) -> Result<()> {
        let mark = self.marks.pop().ok_or_else(|| {
            RiError::error(ErrorCode::Nesting, "pop_mark without a matching push_mark")
        })?;
        self.slot = Some(mark.slot);
        self.blocks = mark.blocks;
        Ok(())
    }

    /// Ends construction.
    pub fn finish(self) -> Result<SceneGraph> {
        if let Some(&open) = self.blocks.last() {
            return Err(RiError::error(
                ErrorCode::Nesting,
                format!(
                    "{} unterminated at end of capture",
                    self.graph.nodes[open].command.class_name()
                ),
            ));
        }
        Ok(self.graph)
    }

    fn insert(&mut self, command: RiCommand) -> NodeId {
        let slot = self.slot.unwrap_or(Slot::Head);
        let follower = match slot {
            Slot::Head => self.graph.head,
            Slot::Next(id) => self.graph.nodes[id].next,
            Slot::Descendent(id) => self.graph.nodes[id].descendent,
        };
        let id = self.graph.nodes.insert(Node {
            command,
            next: follower,
            descendent: None,
            linked: false,
        });
        match slot {
            Slot::Head => self.graph.head = Some(id),
            Slot::Next(owner) => self.graph.nodes[owner].next = Some(id),
            Slot::Descendent(owner) => self.graph.nodes[owner].descendent = Some(id),
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calls::RiCall;
    use rman_core::{ObjectHandle, ParameterList, Request};

    fn sphere() -> RiCommand {
        RiCall::Sphere {
            radius: 1.0,
            zmin: -1.0,
            zmax: 1.0,
            thetamax: 360.0,
            params: ParameterList::new(),
        }
        .into()
    }

    fn requests(graph: &SceneGraph) -> Vec<Request> {
        graph.iter().map(|v| v.command.request()).collect()
    }

    #[test]
    fn empty_block_keeps_cursor_in_place() {
        let mut builder = SceneBuilder::new();
        builder.insert_and_next(sphere());
        let depth = builder.depth();
        builder.insert_and_descent(RiCall::AttributeBegin {}.into());
        builder.insert_and_ascent(RiCall::AttributeEnd {}.into()).unwrap();
        assert_eq!(builder.depth(), depth);
        assert_eq!(builder.graph().len(), 3);

        builder.insert_and_next(sphere());
        let graph = builder.finish().unwrap();
        let depths: Vec<usize> = graph.iter().map(|v| v.depth).collect();
        assert_eq!(depths, [0, 0, 1, 0]);
    }

    #[test]
    fn traversal_follows_capture_order() {
        let mut builder = SceneBuilder::new();
        builder.insert_and_descent(RiCall::WorldBegin {}.into());
        builder.insert_and_descent(RiCall::AttributeBegin {}.into());
        builder.insert_and_next(sphere());
        builder.insert_and_descent(RiCall::TransformBegin {}.into());
        builder.insert_and_ascent(RiCall::TransformEnd {}.into()).unwrap();
        builder.insert_and_ascent(RiCall::AttributeEnd {}.into()).unwrap();
        builder.insert_and_next(sphere());
        builder.insert_and_ascent(RiCall::WorldEnd {}.into()).unwrap();
        let graph = builder.finish().unwrap();

        assert_eq!(
            requests(&graph),
            [
                Request::WorldBegin,
                Request::AttributeBegin,
                Request::Sphere,
                Request::TransformBegin,
                Request::TransformEnd,
                Request::AttributeEnd,
                Request::Sphere,
                Request::WorldEnd,
            ]
        );
    }

    #[test]
    fn reset_restarts_traversal() {
        let mut builder = SceneBuilder::new();
        builder.insert_and_next(sphere());
        builder.insert_and_next(sphere());
        let graph = builder.finish().unwrap();
        let mut iter = graph.iter();
        assert!(iter.next().is_some());
        iter.reset();
        assert_eq!(iter.count(), 2);
    }

    #[test]
    fn mismatched_or_missing_ends_are_nesting_errors() {
        let mut builder = SceneBuilder::new();
        let err = builder
            .insert_and_ascent(RiCall::WorldEnd {}.into())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Nesting);

        builder.insert_and_descent(RiCall::WorldBegin {}.into());
        let err = builder
            .insert_and_ascent(RiCall::AttributeEnd {}.into())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Nesting);
        assert_eq!(builder.finish().unwrap_err().code, ErrorCode::Nesting);
    }

    #[test]
    fn linked_subtree_is_visited_but_not_owned() {
        let mut builder = SceneBuilder::new();
        let object = builder.insert_and_descent(
            RiCall::ObjectBegin {
                handle: ObjectHandle(1),
            }
            .into(),
        );
        builder.insert_and_next(sphere());
        builder.insert_and_ascent(RiCall::ObjectEnd {}.into()).unwrap();
        let instance = builder
            .insert_and_link(
                RiCall::ObjectInstance {
                    handle: ObjectHandle(1),
                }
                .into(),
                object,
            )
            .unwrap();
        let mut graph = builder.finish().unwrap();

        let linked: Vec<(Request, bool)> = graph
            .iter()
            .map(|v| (v.command.request(), v.linked))
            .collect();
        assert_eq!(
            linked,
            [
                (Request::ObjectBegin, false),
                (Request::Sphere, false),
                (Request::ObjectEnd, false),
                (Request::ObjectInstance, false),
                (Request::Sphere, true),
                (Request::ObjectEnd, true),
            ]
        );

        assert_eq!(graph.remove_subtree(instance), 1);
        assert_eq!(graph.len(), 3);
        assert_eq!(requests(&graph).len(), 3);
    }

    #[test]
    fn link_into_open_block_is_rejected() {
        let mut builder = SceneBuilder::new();
        let world = builder.insert_and_descent(RiCall::WorldBegin {}.into());
        let err = builder
            .insert_and_link(
                RiCall::ObjectInstance {
                    handle: ObjectHandle(1),
                }
                .into(),
                world,
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::IllState);
    }

    #[test]
    fn marks_splice_insertions() {
        let mut builder = SceneBuilder::new();
        builder.insert_and_next(RiCall::Identity {}.into());
        builder.push_mark();
        builder.insert_and_next(sphere());
        builder.pop_mark().unwrap();
        builder.insert_and_next(RiCall::ReverseOrientation {}.into());
        let graph = builder.finish().unwrap();
        assert_eq!(
            requests(&graph),
            [Request::Identity, Request::ReverseOrientation, Request::Sphere]
        );
        assert!(SceneBuilder::new().pop_mark().is_err());
    }

    #[test]
    fn removing_a_block_drops_its_body_and_followers() {
        let mut builder = SceneBuilder::new();
        builder.insert_and_next(sphere());
        let block = builder.insert_and_descent(RiCall::AttributeBegin {}.into());
        builder.insert_and_next(sphere());
        builder.insert_and_ascent(RiCall::AttributeEnd {}.into()).unwrap();
        builder.insert_and_next(sphere());
        let mut graph = builder.finish().unwrap();

        assert_eq!(graph.remove_subtree(block), 4);
        assert_eq!(requests(&graph), [Request::Sphere]);
    }
}
