//! Implementation of the inner, "green" tree.
//!
//! Value nodes are immutable, position independent and freely shared between trees. The
//! [`GreenNodeBuilder`] is the main entry point to constructing them.

mod attachments;
pub(super) mod builder;
mod element;
mod iter;
mod node;
mod token;
mod trivia;

pub use self::{
    builder::{Checkpoint, GreenNodeBuilder, NodeCache},
    element::{GreenElement, GreenElementRef},
    iter::GreenNodeChildren,
    node::{GreenNode, LocatedChild, NodeFlags},
    token::GreenToken,
    trivia::{GreenTrivia, GreenTriviaList},
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{interning::TokenInterner, NodeOrToken, RawSyntaxKind, TextSize};

    const IDENT: RawSyntaxKind = RawSyntaxKind(1);
    const COMMA: RawSyntaxKind = RawSyntaxKind(2);
    const ARGS: RawSyntaxKind = RawSyntaxKind(3);
    const CALL: RawSyntaxKind = RawSyntaxKind(4);
    const WHITESPACE: RawSyntaxKind = RawSyntaxKind(5);

    fn ident(interner: &TokenInterner, text: &str) -> GreenElement {
        GreenToken::new(interner, IDENT, text).into()
    }

    /// `f` `(` a, b, c `)` with the arguments in a list slot and an empty slot in between.
    fn call(interner: &TokenInterner) -> GreenNode {
        let comma = GreenToken::new(interner, COMMA, ",")
            .with_trailing_trivia(GreenTriviaList::new([GreenTrivia::new(interner, WHITESPACE, " ")]));
        let list = GreenNode::list([
            ident(interner, "a"),
            comma.clone().into(),
            ident(interner, "b"),
            comma.into(),
            ident(interner, "c"),
        ]);
        let args = GreenNode::new(ARGS, [list.into()]);
        GreenNode::with_slots(CALL, [Some(ident(interner, "f")), None, Some(args.into())])
    }

    #[test]
    fn assert_send_sync() {
        fn f<T: Send + Sync>() {}
        f::<GreenNode>();
        f::<GreenToken>();
        f::<GreenElement>();
        f::<GreenTrivia>();
        f::<GreenTriviaList>();
    }

    #[test]
    fn flattened_children() {
        let interner = TokenInterner::new();
        let call = call(&interner);
        assert_eq!(call.slot_count(), 3);
        assert_eq!(call.child_count(), 2);
        let args = call.slot(2).and_then(NodeOrToken::into_node).unwrap();
        assert_eq!(args.slot_count(), 1);
        assert_eq!(args.child_count(), 5);
        assert_eq!(args.children().count(), args.child_count());
        let kinds: Vec<_> = args.children().map(|child| child.kind()).collect();
        assert_eq!(kinds, [IDENT, COMMA, IDENT, COMMA, IDENT]);
        let reversed: Vec<_> = args.children().rev().map(|child| child.kind()).collect();
        assert_eq!(reversed, [IDENT, COMMA, IDENT, COMMA, IDENT]);
        assert_eq!(call.to_full_string(&interner), "fa, b, c");
    }

    #[test]
    fn locate_accounts_for_lists() {
        let interner = TokenInterner::new();
        let call = call(&interner);
        let args = call.slot(2).and_then(NodeOrToken::into_node).unwrap();
        let mut expected = TextSize::from(0);
        for index in 0..args.child_count() {
            let located = args.locate(index).unwrap();
            assert_eq!(located.slot, 0);
            assert_eq!(located.list_index, Some(index));
            assert_eq!(located.offset, expected);
            expected += located.element.full_width();
        }
        assert_eq!(expected, args.full_width());
        assert!(args.locate(5).is_err());

        let located = call.locate(1).unwrap();
        assert_eq!(located.slot, 2);
        assert_eq!(located.list_index, None);
        assert_eq!(located.offset, 1.into());
        assert_eq!(call.slot_offset(2), 1.into());
        assert_eq!(call.slot_child_index(2), 1);
    }

    #[test]
    fn create_list_normalizes_singletons() {
        let interner = TokenInterner::new();
        assert!(GreenNode::create_list(None).is_none());

        let single_token = GreenNode::create_list([ident(&interner, "a")]).unwrap();
        assert!(single_token.is_list());
        assert_eq!(single_token.slot_count(), 1);

        let node = GreenNode::new(ARGS, [ident(&interner, "a")]);
        let single_node = GreenNode::create_list([node.clone().into()]).unwrap();
        assert!(!single_node.is_list());
        assert!(single_node.ptr_eq(&node));

        let many = GreenNode::create_list([ident(&interner, "a"), ident(&interner, "b")]).unwrap();
        assert!(many.is_list());
        assert_eq!(many.child_count(), 2);
    }

    #[test]
    fn widths_exclude_outer_trivia() {
        let interner = TokenInterner::new();
        let space = GreenTriviaList::new([GreenTrivia::new(&interner, WHITESPACE, "  ")]);
        let token = GreenToken::new(&interner, IDENT, "abc")
            .with_leading_trivia(space.clone())
            .with_trailing_trivia(space);
        assert_eq!(token.width(), 3.into());
        assert_eq!(token.full_width(), 7.into());
        let node = GreenNode::new(ARGS, [GreenToken::missing(IDENT).into(), token.into()]);
        assert_eq!(node.full_width(), 7.into());
        assert_eq!(node.width(), 3.into());
        assert!(!node.is_missing());

        let missing = GreenNode::new(ARGS, [GreenToken::missing(IDENT).into()]);
        assert!(missing.is_missing());
        assert_eq!(missing.width(), 0.into());
    }

    #[test]
    fn flags_propagate() {
        let interner = TokenInterner::new();
        let directive = GreenNode::new(ARGS, [ident(&interner, "pragma")]).with_diagnostics([crate::Diagnostic::new(1)]);
        let trivia = GreenTrivia::structured(WHITESPACE, directive, true);
        let token = GreenToken::new(&interner, IDENT, "x").with_leading_trivia(GreenTriviaList::new([trivia]));
        let root = GreenNode::new(CALL, [GreenNode::new(ARGS, [token.into()]).into()]);
        assert!(root.contains_directives());
        assert!(root.contains_structured_trivia());
        assert!(root.contains_diagnostics());
        assert!(!root.contains_annotations());
        assert!(root.diagnostics().is_empty());
    }

    #[test]
    fn structural_equality() {
        let interner = TokenInterner::new();
        let a = call(&interner);
        let b = call(&interner);
        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);
        let annotated = a.with_annotations([crate::SyntaxAnnotation::new()]);
        assert_ne!(a, annotated);
        assert!(annotated.contains_annotations());
        let edited = a.with_child(0, ident(&interner, "g")).unwrap();
        assert_eq!(edited.to_full_string(&interner), "ga, b, c");
        assert_ne!(a, edited);
    }
}
