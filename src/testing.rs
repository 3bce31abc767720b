//! A tiny language for examples and unit tests.

pub use crate::{
    GreenNode, GreenNodeBuilder, GreenToken, Language, NodeCache, NodeOrToken, RawSyntaxKind, SyntaxElement,
    TextRange, TextSize,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum TestSyntaxKind {
    Plus,
    Comma,
    Identifier,
    Int,
    Operation,
    Args,
    Root,
    Whitespace,
    Comment,
    Directive,
    __LAST,
}
pub use TestSyntaxKind::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TestLang {}

impl Language for TestLang {
    type Kind = TestSyntaxKind;

    fn kind_from_raw(raw: RawSyntaxKind) -> Self::Kind {
        const KINDS: [TestSyntaxKind; TestSyntaxKind::__LAST as usize] = [
            Plus, Comma, Identifier, Int, Operation, Args, Root, Whitespace, Comment, Directive,
        ];
        assert!(raw.0 < __LAST as u16, "unknown kind {raw:?}");
        KINDS[raw.0 as usize]
    }

    fn kind_to_raw(kind: Self::Kind) -> RawSyntaxKind {
        RawSyntaxKind(kind as u16)
    }

    fn static_text(kind: Self::Kind) -> Option<&'static str> {
        match kind {
            Plus => Some("+"),
            Comma => Some(","),
            _ => None,
        }
    }

    fn is_trivia_directive(kind: Self::Kind) -> bool {
        kind == Directive
    }
}

pub type SyntaxNode = crate::SyntaxNode<TestLang>;
pub type SyntaxToken = crate::SyntaxToken<TestLang>;

/// Builds `1 + 2` with a space after each of the first two tokens.
pub fn sum() -> SyntaxNode {
    let mut builder: GreenNodeBuilder<TestLang> = GreenNodeBuilder::new();
    builder.start_node(Root);
    builder.start_node(Operation);
    builder.token(Int, "1");
    builder.trailing_trivia(Whitespace, " ");
    builder.token(Plus, "+");
    builder.trailing_trivia(Whitespace, " ");
    builder.token(Int, "2");
    builder.finish_node();
    builder.finish_node();
    let (green, cache) = builder.finish();
    let interner = cache.map(|cache| cache.interner().clone()).unwrap_or_default();
    SyntaxNode::new_root(green, interner)
}
