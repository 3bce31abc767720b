use std::sync::Arc;

use text_size::{TextRange, TextSize};

use crate::{
    annotation::SyntaxAnnotation,
    syntax::{node::NodeData, token::RawToken},
    Language, NodeOrToken, RawSyntaxKind, SyntaxNode, SyntaxToken, TokenAtOffset,
};

/// An element of the navigable tree, either a node or a token.
pub type SyntaxElement<L> = NodeOrToken<SyntaxNode<L>, SyntaxToken<L>>;

impl<L: Language> From<SyntaxNode<L>> for SyntaxElement<L> {
    fn from(node: SyntaxNode<L>) -> SyntaxElement<L> {
        NodeOrToken::Node(node)
    }
}

impl<L: Language> From<SyntaxToken<L>> for SyntaxElement<L> {
    fn from(token: SyntaxToken<L>) -> SyntaxElement<L> {
        NodeOrToken::Token(token)
    }
}

impl<L: Language> SyntaxElement<L> {
    #[inline]
    pub(crate) fn from_raw(raw: NodeOrToken<Arc<NodeData>, RawToken>) -> Self {
        match raw {
            NodeOrToken::Node(data) => NodeOrToken::Node(SyntaxNode::from_data(data)),
            NodeOrToken::Token(raw) => NodeOrToken::Token(SyntaxToken::from_raw(raw)),
        }
    }

    /// The range covered by this element, including trivia.
    #[inline]
    pub fn full_span(&self) -> TextRange {
        match self {
            NodeOrToken::Node(it) => it.full_span(),
            NodeOrToken::Token(it) => it.full_span(),
        }
    }

    /// The range covered by this element, without its outer trivia.
    #[inline]
    pub fn span(&self) -> TextRange {
        match self {
            NodeOrToken::Node(it) => it.span(),
            NodeOrToken::Token(it) => it.span(),
        }
    }

    #[inline]
    pub fn position(&self) -> TextSize {
        match self {
            NodeOrToken::Node(it) => it.position(),
            NodeOrToken::Token(it) => it.position(),
        }
    }

    #[inline]
    pub fn syntax_kind(&self) -> RawSyntaxKind {
        match self {
            NodeOrToken::Node(it) => it.syntax_kind(),
            NodeOrToken::Token(it) => it.syntax_kind(),
        }
    }

    #[inline]
    pub fn kind(&self) -> L::Kind {
        match self {
            NodeOrToken::Node(it) => it.kind(),
            NodeOrToken::Token(it) => it.kind(),
        }
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        match self {
            NodeOrToken::Node(it) => it.is_missing(),
            NodeOrToken::Token(it) => it.is_missing(),
        }
    }

    #[inline]
    pub fn has_annotation(&self, annotation: &SyntaxAnnotation) -> bool {
        match self {
            NodeOrToken::Node(it) => it.has_annotation(annotation),
            NodeOrToken::Token(it) => it.has_annotation(annotation),
        }
    }

    /// The parent node of this element, `None` for roots.
    #[inline]
    pub fn parent(&self) -> Option<SyntaxNode<L>> {
        match self {
            NodeOrToken::Node(it) => it.parent(),
            NodeOrToken::Token(it) => Some(it.parent()),
        }
    }

    /// Index of this element among the children of its parent.
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            NodeOrToken::Node(it) => it.index(),
            NodeOrToken::Token(it) => it.index(),
        }
    }

    /// Returns an iterator along the chain of parents of this element.
    #[inline]
    pub fn ancestors(&self) -> impl Iterator<Item = SyntaxNode<L>> {
        match self {
            NodeOrToken::Node(it) => it.ancestors(),
            NodeOrToken::Token(it) => it.parent().ancestors(),
        }
    }

    /// Return the leftmost token in the subtree of this element.
    #[inline]
    pub fn first_token(&self) -> Option<SyntaxToken<L>> {
        match self {
            NodeOrToken::Node(it) => it.first_token(),
            NodeOrToken::Token(it) => Some(it.clone()),
        }
    }

    /// Return the rightmost token in the subtree of this element.
    #[inline]
    pub fn last_token(&self) -> Option<SyntaxToken<L>> {
        match self {
            NodeOrToken::Node(it) => it.last_token(),
            NodeOrToken::Token(it) => Some(it.clone()),
        }
    }

    /// The tree element to the right of this one.
    #[inline]
    pub fn next_sibling_or_token(&self) -> Option<SyntaxElement<L>> {
        match self {
            NodeOrToken::Node(it) => it.next_sibling_or_token(),
            NodeOrToken::Token(it) => it.next_sibling_or_token(),
        }
    }

    /// The tree element to the left of this one.
    #[inline]
    pub fn prev_sibling_or_token(&self) -> Option<SyntaxElement<L>> {
        match self {
            NodeOrToken::Node(it) => it.prev_sibling_or_token(),
            NodeOrToken::Token(it) => it.prev_sibling_or_token(),
        }
    }

    /// Find the tokens in the subtree of this element whose full span covers the offset.
    #[inline]
    pub fn token_at_offset(&self, offset: TextSize) -> TokenAtOffset<SyntaxToken<L>> {
        assert!(self.full_span().start() <= offset && offset <= self.full_span().end());
        match self {
            NodeOrToken::Token(token) => TokenAtOffset::Single(token.clone()),
            NodeOrToken::Node(node) => node.token_at_offset(offset),
        }
    }

    /// The text of this element, including all trivia.
    pub fn to_full_string(&self) -> String {
        match self {
            NodeOrToken::Node(it) => it.to_full_string(),
            NodeOrToken::Token(it) => it.to_full_string(),
        }
    }
}
