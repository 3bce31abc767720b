//! Implementation of the outer, "red" tree.
//!
//! Inner [`SyntaxNode`]s pair a value node with its position and its parent. Leaf [`SyntaxToken`]s
//! carry text and own the [`SyntaxTrivia`] around it. Use [`SyntaxNode::new_root`] to construct a
//! syntax tree on top of a green tree.

mod child_list;
pub use child_list::{ChildSyntaxList, SyntaxElementChildren, SyntaxNodeChildren};
mod edit;
pub use edit::RemoveOptions;
mod element;
pub use element::SyntaxElement;
pub(crate) mod node;
pub use node::SyntaxNode;
pub(crate) mod token;
pub use token::SyntaxToken;
pub(crate) mod trivia;
pub use trivia::{SyntaxTrivia, SyntaxTriviaIter, SyntaxTriviaList};

// A note on `#[inline]` usage in this module:
// All types here are generic over a `Language`, even though the language only matters for
// converting kinds. This makes the compiler less willing to inline, so most accessors used during
// navigation carry an `#[inline]` annotation. Tree traversal is noticeably slower without them.
