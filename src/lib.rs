//! `greenwood` is a library for immutable, persistently shared syntax trees.
//!
//! Trees come in two layers:
//! - Value ("green") nodes are position independent and immutable. They only know their kind,
//!   their width and their children, so identical sub-trees can be shared between trees and
//!   between versions of the same tree. Children are held in slots; a slot may be empty, hold a
//!   single child, or hold a list node whose elements are flattened into the parent's children.
//! - Navigable ("red") nodes pair a value node with its absolute position and its parent. They are
//!   created lazily, when navigating down from a root, and are cached by their parent for as long
//!   as someone holds on to them. Syntax nodes are `Send` and `Sync`, so realized trees can be
//!   shared across threads.
//!
//! Tokens are leaves that own the trivia (whitespace, comments, directives) around them. Trivia may
//! carry a structure of its own, a complete tree whose root knows the trivia it belongs to.
//!
//! Edits never mutate: replacing, inserting or removing nodes, tokens or trivia builds new value
//! nodes along the changed paths and returns a new root. Nodes of the old tree can be found again in
//! the new one with [`SyntaxNode::track_nodes`] and [`SyntaxNode::current_node`].
#![forbid(unconditional_recursion, future_incompatible)]
#![deny(unsafe_code)]

pub mod annotation;
pub mod error;
mod green;
pub mod interning;
pub mod overlay;
#[cfg(feature = "serde1")]
mod serde_impls;
pub mod syntax;
mod tracking;
pub mod traversal;
mod utility_types;

#[doc(hidden)]
pub mod testing;

use std::fmt;

// Reexport types for working with strings.
pub use text_size::{TextLen, TextRange, TextSize};

pub use crate::{
    annotation::{Diagnostic, SyntaxAnnotation},
    error::SyntaxError,
    green::{
        Checkpoint, GreenElement, GreenElementRef, GreenNode, GreenNodeBuilder, GreenNodeChildren, GreenToken,
        GreenTrivia, GreenTriviaList, LocatedChild, NodeCache, NodeFlags,
    },
    syntax::{
        ChildSyntaxList, RemoveOptions, SyntaxElement, SyntaxNode, SyntaxToken, SyntaxTrivia, SyntaxTriviaList,
    },
    interning::{TokenInterner, TokenKey},
    tracking::TRACKING_ANNOTATION_KIND,
    traversal::Traversal,
    utility_types::{Direction, NodeOrToken, TokenAtOffset, WalkEvent},
};

/// The untyped kind of a value node, token or trivia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct RawSyntaxKind(pub u16);

impl RawSyntaxKind {
    /// The kind of list nodes. Languages must not use it for their own kinds.
    pub const LIST: RawSyntaxKind = RawSyntaxKind(u16::MAX);
}

/// The typed view of a language's kinds.
///
/// Value nodes only store [`RawSyntaxKind`]s; syntax nodes convert them on access.
pub trait Language: Sized + Clone + Copy + fmt::Debug + Eq + Ord + std::hash::Hash + Send + Sync + 'static {
    type Kind: Sized + Clone + Copy + fmt::Debug;

    fn kind_from_raw(raw: RawSyntaxKind) -> Self::Kind;

    fn kind_to_raw(kind: Self::Kind) -> RawSyntaxKind;

    /// The fixed text of tokens of this kind, if any.
    fn static_text(kind: Self::Kind) -> Option<&'static str> {
        let _ = kind;
        None
    }

    /// Whether structured trivia of this kind is a directive.
    fn is_trivia_directive(kind: Self::Kind) -> bool {
        let _ = kind;
        false
    }
}
