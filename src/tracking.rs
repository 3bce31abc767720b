//! Finding nodes again after a tree was edited.
//!
//! Edits build new trees, so the nodes of the old tree have no identity in the new one.
//! [`SyntaxNode::track_nodes`] attaches an annotation to the value of each tracked node. The
//! annotation survives edits, and [`SyntaxNode::current_nodes`] looks up the nodes that carry it in
//! any later version of the tree.
//!
//! ```
//! # use greenwood::testing::*;
//! let root = sum();
//! let two = root.descendant_tokens().last().unwrap();
//! let operation = two.parent();
//!
//! let tracked = root.track_nodes([operation.clone()]).unwrap();
//! let one = tracked.descendant_tokens().next().unwrap();
//! let interner = tracked.interner().clone();
//! let edited = tracked
//!     .replace_tokens([one], |_, old| {
//!         GreenToken::new(&interner, TestLang::kind_to_raw(Int), "100")
//!             .with_trailing_trivia(old.trailing_trivia().clone())
//!     })
//!     .unwrap();
//!
//! let current = edited.current_node(&operation).unwrap();
//! assert_eq!(current.to_full_string(), "100 + 2");
//! ```

use std::sync::{Arc, Weak};

use fxhash::FxHashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::{
    annotation::SyntaxAnnotation,
    error::Result,
    green::GreenNode,
    syntax::{
        node::{Kind, NodeData},
        trivia::RawTrivia,
    },
    Language, NodeFlags, NodeOrToken, SyntaxNode,
};

/// Kind of the annotations that mark tracked nodes.
pub const TRACKING_ANNOTATION_KIND: &str = "greenwood.tracking";

/// Dead entries are pruned once the table has grown to this size, then to twice the live size.
const INITIAL_PRUNE_THRESHOLD: usize = 64;

struct TrackingTable {
    entries:  FxHashMap<usize, (Weak<NodeData>, SyntaxAnnotation)>,
    prune_at: usize,
}

/// Maps tracked node instances to their annotations, without keeping the nodes alive.
static TRACKING_TABLE: Lazy<Mutex<TrackingTable>> = Lazy::new(|| {
    Mutex::new(TrackingTable {
        entries:  FxHashMap::default(),
        prune_at: INITIAL_PRUNE_THRESHOLD,
    })
});

/// The annotation of a tracked node instance, if it is tracked.
fn tracking_annotation(node: &Arc<NodeData>) -> Option<SyntaxAnnotation> {
    let key = Arc::as_ptr(node) as usize;
    let table = TRACKING_TABLE.lock();
    table.entries.get(&key).map(|(_, annotation)| annotation.clone())
}

/// The annotation of a node instance, assigning a new one to untracked nodes.
fn get_or_create_tracking_annotation(node: &Arc<NodeData>) -> SyntaxAnnotation {
    // The table holds a weak reference to every key, so the address of a node cannot be reused
    // while its entry exists.
    let key = Arc::as_ptr(node) as usize;
    let mut table = TRACKING_TABLE.lock();
    if let Some((_, annotation)) = table.entries.get(&key) {
        return annotation.clone();
    }
    if table.entries.len() >= table.prune_at {
        table.entries.retain(|_, (weak, _)| weak.strong_count() > 0);
        table.prune_at = (table.entries.len() * 2).max(INITIAL_PRUNE_THRESHOLD);
        tracing::trace!(live = table.entries.len(), "pruned tracking table");
    }
    let annotation = SyntaxAnnotation::with_kind(TRACKING_ANNOTATION_KIND);
    table
        .entries
        .insert(key, (Arc::downgrade(node), annotation.clone()));
    annotation
}

/// One step on the way from a root down to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Child(u32),
    /// Into the structure of a trivia of the token at child index `token`.
    Trivia { token: u32, trailing: bool, index: u32 },
}

/// The paths to all nodes of a tree that carry tracking annotations, by annotation id.
pub(crate) struct TrackedNodes {
    paths: FxHashMap<u64, SmallVec<[Box<[Step]>; 1]>>,
}

impl TrackedNodes {
    fn collect(root: &GreenNode) -> Self {
        let mut paths: FxHashMap<u64, SmallVec<[Box<[Step]>; 1]>> = FxHashMap::default();
        if !root.contains_annotations() {
            return Self { paths };
        }
        let mut stack: Vec<(&GreenNode, Vec<Step>)> = vec![(root, Vec::new())];
        while let Some((node, path)) = stack.pop() {
            for annotation in node.annotations() {
                if annotation.kind() == Some(TRACKING_ANNOTATION_KIND) {
                    paths
                        .entry(annotation.id())
                        .or_default()
                        .push(path.clone().into_boxed_slice());
                }
            }
            // push in reverse so that nodes are found in document order
            for (index, child) in node.children().enumerate().rev() {
                if !child.flags().contains(NodeFlags::CONTAINS_ANNOTATIONS) {
                    continue;
                }
                let index = index as u32;
                match child {
                    NodeOrToken::Node(child) => {
                        let mut path = path.clone();
                        path.push(Step::Child(index));
                        stack.push((child, path));
                    }
                    NodeOrToken::Token(token) => {
                        let lists = [(false, token.leading_trivia()), (true, token.trailing_trivia())];
                        for (trailing, list) in lists.into_iter().rev() {
                            for (position, trivia) in list.iter().enumerate().rev() {
                                let Some(structure) = trivia.structure() else { continue };
                                if !structure.contains_annotations() {
                                    continue;
                                }
                                let mut path = path.clone();
                                path.push(Step::Trivia {
                                    token: index,
                                    trailing,
                                    index: position as u32,
                                });
                                stack.push((structure, path));
                            }
                        }
                    }
                }
            }
        }
        tracing::debug!(tracked = paths.len(), "indexed tracked nodes");
        Self { paths }
    }

    fn resolve(root: &Arc<NodeData>, path: &[Step]) -> Option<Arc<NodeData>> {
        let mut node = Arc::clone(root);
        for step in path {
            node = match *step {
                Step::Child(index) => node.child_at(index as usize).ok()?.into_node()?,
                Step::Trivia { token, trailing, index } => {
                    let token = node.child_at(token as usize).ok()?.into_token()?;
                    let trivia = RawTrivia::nth(&token, trailing, index as usize)?;
                    NodeData::structure(&trivia)?
                }
            };
        }
        Some(node)
    }
}

impl<L: Language> SyntaxNode<L> {
    /// Returns a new tree in which each of `nodes` is marked, so that its counterparts can be found
    /// with [`current_nodes`](SyntaxNode::current_nodes) in this tree and in any tree derived from it
    /// by edits.
    ///
    /// Tracking a node twice marks it only once. Fails if a node is not a descendant of this node.
    pub fn track_nodes<I>(&self, nodes: I) -> Result<SyntaxNode<L>>
    where
        I: IntoIterator<Item = SyntaxNode<L>>,
    {
        let nodes: Vec<SyntaxNode<L>> = nodes.into_iter().collect();
        tracing::debug!(nodes = nodes.len(), "tracking nodes");
        self.replace_nodes(nodes, |original, rewritten| {
            let annotation = get_or_create_tracking_annotation(&original.data);
            if rewritten.has_annotation(&annotation) {
                rewritten
            } else {
                rewritten.with_annotations([annotation])
            }
        })
    }

    /// The single node in this tree that corresponds to the tracked node `original`.
    ///
    /// `None` if `original` was never tracked, if it has no counterpart, or if edits duplicated it
    /// into several places. Use [`current_nodes`](SyntaxNode::current_nodes) for the latter.
    pub fn current_node(&self, original: &SyntaxNode<L>) -> Option<SyntaxNode<L>> {
        let mut nodes = self.current_nodes(original);
        match (nodes.pop(), nodes.is_empty()) {
            (Some(node), true) => Some(node),
            _ => None,
        }
    }

    /// All nodes in this tree that correspond to the tracked node `original`, in document order.
    pub fn current_nodes(&self, original: &SyntaxNode<L>) -> Vec<SyntaxNode<L>> {
        let Some(annotation) = tracking_annotation(&original.data) else {
            return Vec::new();
        };
        let root = self.true_root();
        let Kind::Root(root_data) = &root.data.kind else {
            return Vec::new();
        };
        let tracked = root_data
            .tracked
            .get_or_init(|| TrackedNodes::collect(root.green()));
        let Some(paths) = tracked.paths.get(&annotation.id()) else {
            return Vec::new();
        };
        paths
            .iter()
            .filter_map(|path| TrackedNodes::resolve(&root.data, path))
            .map(SyntaxNode::from_data)
            .collect()
    }
}
