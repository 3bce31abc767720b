use std::{
    fmt,
    hash::{Hash, Hasher},
    iter,
    marker::PhantomData,
    sync::Arc,
};

use text_size::{TextRange, TextSize};

use crate::{
    annotation::{Diagnostic, SyntaxAnnotation},
    green::GreenToken,
    syntax::{
        node::{same_node, splice_child, splice_into_ancestors, NodeData},
        trivia::SyntaxTriviaList,
        SyntaxElement, SyntaxNode,
    },
    Direction, GreenNode, Language, NodeOrToken, RawSyntaxKind,
};

/// A token together with its location. Tokens are not cached by their parent, so this is cheap to
/// create and to clone.
#[derive(Clone)]
pub(crate) struct RawToken {
    pub(crate) parent: Arc<NodeData>,
    pub(crate) green:  GreenToken,
    pub(crate) index:  u32,
    pub(crate) offset: TextSize,
}

impl RawToken {
    #[inline]
    pub(crate) fn new(parent: Arc<NodeData>, green: GreenToken, index: usize, offset: TextSize) -> Self {
        Self {
            parent,
            green,
            index: index as u32,
            offset,
        }
    }

    #[inline]
    pub(crate) fn full_span(&self) -> TextRange {
        TextRange::at(self.offset, self.green.full_width())
    }

    /// Start of the token's text, after its leading trivia.
    #[inline]
    pub(crate) fn text_start(&self) -> TextSize {
        self.offset + self.green.leading_trivia().full_width()
    }

    #[inline]
    pub(crate) fn same(&self, other: &RawToken) -> bool {
        self.index == other.index && self.offset == other.offset && same_node(&self.parent, &other.parent)
    }

    /// The value tree that results from replacing this token, up to the root.
    pub(crate) fn splice(&self, replacement: GreenToken) -> GreenNode {
        let parent = splice_child(&self.parent.green, self.index, replacement.into());
        splice_into_ancestors(&self.parent, parent)
    }
}

/// A leaf of the navigable tree, carrying text and the trivia around it.
pub struct SyntaxToken<L: Language> {
    pub(crate) raw: RawToken,
    _lang:          PhantomData<L>,
}

impl<L: Language> Clone for SyntaxToken<L> {
    #[inline]
    fn clone(&self) -> Self {
        Self::from_raw(self.raw.clone())
    }
}

impl<L: Language> PartialEq for SyntaxToken<L> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.raw.same(&other.raw)
    }
}

impl<L: Language> Eq for SyntaxToken<L> {}

impl<L: Language> Hash for SyntaxToken<L> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.parent.green.as_ptr().hash(state);
        self.raw.index.hash(state);
        self.raw.offset.hash(state);
    }
}

impl<L: Language> fmt::Debug for SyntaxToken<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.kind(), self.span())?;
        if self.is_missing() {
            return write!(f, " <missing>");
        }
        let text = self.text();
        if text.len() < 25 {
            return write!(f, " {text:?}");
        }
        for idx in 21..25 {
            if text.is_char_boundary(idx) {
                let text = format!("{} ...", &text[..idx]);
                return write!(f, " {text:?}");
            }
        }
        unreachable!()
    }
}

/// Displays the token's text, without trivia.
impl<L: Language> fmt::Display for SyntaxToken<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl<L: Language> SyntaxToken<L> {
    #[inline]
    pub(crate) fn from_raw(raw: RawToken) -> Self {
        Self {
            raw,
            _lang: PhantomData,
        }
    }

    /// Returns a green tree, equal to the green tree this token belongs to, except with this token
    /// substituted.
    pub fn replace_with(&self, replacement: GreenToken) -> GreenNode {
        self.raw.splice(replacement)
    }

    /// The internal representation of the kind of this token.
    #[inline]
    pub fn syntax_kind(&self) -> RawSyntaxKind {
        self.raw.green.kind()
    }

    /// The kind of this token in terms of your language.
    #[inline]
    pub fn kind(&self) -> L::Kind {
        L::kind_from_raw(self.syntax_kind())
    }

    /// The underlying value token.
    #[inline]
    pub fn green(&self) -> &GreenToken {
        &self.raw.green
    }

    /// The node containing this token.
    #[inline]
    pub fn parent(&self) -> SyntaxNode<L> {
        SyntaxNode::from_data(Arc::clone(&self.raw.parent))
    }

    /// Flattened index of this token among its parent's children.
    #[inline]
    pub fn index(&self) -> usize {
        self.raw.index as usize
    }

    /// Returns an iterator along the chain of parents of this token.
    #[inline]
    pub fn ancestors(&self) -> impl Iterator<Item = SyntaxNode<L>> {
        self.parent().ancestors()
    }

    /// Like [`ancestors`](SyntaxToken::ancestors), but continues out of structured trivia.
    #[inline]
    pub fn ancestors_with_trivia(&self) -> impl Iterator<Item = SyntaxNode<L>> {
        self.parent().ancestors_with_trivia()
    }

    /// Absolute start of this token's full span.
    #[inline]
    pub fn position(&self) -> TextSize {
        self.raw.offset
    }

    /// The range covered by this token, including its trivia.
    #[inline]
    pub fn full_span(&self) -> TextRange {
        self.raw.full_span()
    }

    /// The range covered by the text of this token.
    #[inline]
    pub fn span(&self) -> TextRange {
        TextRange::at(self.raw.text_start(), self.raw.green.width())
    }

    /// The text of this token, without trivia. Missing tokens have empty text.
    #[inline]
    pub fn text(&self) -> &str {
        self.raw.green.text(&self.raw.parent.interner)
    }

    /// The value text of this token, which defaults to its text.
    #[inline]
    pub fn value_text(&self) -> &str {
        self.raw.green.value_text(&self.raw.parent.interner)
    }

    /// The text of this token including its leading and trailing trivia.
    pub fn to_full_string(&self) -> String {
        let mut out = String::new();
        self.raw.green.write_full_text(&self.raw.parent.interner, &mut out);
        out
    }

    /// The trivia before this token's text.
    #[inline]
    pub fn leading_trivia(&self) -> SyntaxTriviaList<L> {
        SyntaxTriviaList::new(self.raw.clone(), false)
    }

    /// The trivia after this token's text.
    #[inline]
    pub fn trailing_trivia(&self) -> SyntaxTriviaList<L> {
        SyntaxTriviaList::new(self.raw.clone(), true)
    }

    #[inline]
    pub fn has_leading_trivia(&self) -> bool {
        !self.raw.green.leading_trivia().is_empty()
    }

    #[inline]
    pub fn has_trailing_trivia(&self) -> bool {
        !self.raw.green.trailing_trivia().is_empty()
    }

    #[inline]
    pub fn has_structured_trivia(&self) -> bool {
        self.raw.green.has_structured_trivia()
    }

    #[inline]
    pub fn contains_directives(&self) -> bool {
        self.raw.green.flags().contains(crate::NodeFlags::CONTAINS_DIRECTIVES)
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        self.raw.green.is_missing()
    }

    #[inline]
    pub fn annotations(&self) -> &[SyntaxAnnotation] {
        self.raw.green.annotations()
    }

    #[inline]
    pub fn has_annotation(&self, annotation: &SyntaxAnnotation) -> bool {
        self.raw.green.has_annotation(annotation)
    }

    #[inline]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.raw.green.diagnostics()
    }

    /// The tree element to the right of this one, i.e. the next child of this token's parent after this token.
    pub fn next_sibling_or_token(&self) -> Option<SyntaxElement<L>> {
        let parent = &self.raw.parent;
        let index = self.index() + 1;
        let (element, index, offset) = super::node::children_from(parent, index, self.full_span().end()).next()?;
        Some(SyntaxElement::from_raw(parent.get_or_add_element(element, index, offset)))
    }

    /// The tree element to the left of this one, i.e. the previous child of this token's parent before this token.
    pub fn prev_sibling_or_token(&self) -> Option<SyntaxElement<L>> {
        let parent = &self.raw.parent;
        let (element, index, offset) = super::node::children_to(parent, self.index(), self.position()).next()?;
        Some(SyntaxElement::from_raw(parent.get_or_add_element(element, index, offset)))
    }

    /// Returns an iterator over all siblings of this token in the given `direction`, i.e. all of this
    /// token's parent's children from this token on to the left or the right.
    /// The first item in the iterator will always be this token.
    #[inline]
    pub fn siblings_with_tokens(&self, direction: Direction) -> impl Iterator<Item = SyntaxElement<L>> {
        let me: SyntaxElement<L> = self.clone().into();
        iter::successors(Some(me), move |el| match direction {
            Direction::Next => el.next_sibling_or_token(),
            Direction::Prev => el.prev_sibling_or_token(),
        })
    }

    /// The next token in the tree, in document order. Does not leave the tree of structured trivia
    /// this token belongs to.
    pub fn next_token(&self) -> Option<SyntaxToken<L>> {
        let mut element: SyntaxElement<L> = self.clone().into();
        loop {
            element = match element.next_sibling_or_token() {
                Some(NodeOrToken::Token(token)) => return Some(token),
                Some(NodeOrToken::Node(node)) => match node.first_token() {
                    Some(token) => return Some(token),
                    None => node.into(),
                },
                None => element.parent()?.into(),
            };
        }
    }

    /// The previous token in the tree, in document order. Does not leave the tree of structured
    /// trivia this token belongs to.
    pub fn prev_token(&self) -> Option<SyntaxToken<L>> {
        let mut element: SyntaxElement<L> = self.clone().into();
        loop {
            element = match element.prev_sibling_or_token() {
                Some(NodeOrToken::Token(token)) => return Some(token),
                Some(NodeOrToken::Node(node)) => match node.last_token() {
                    Some(token) => return Some(token),
                    None => node.into(),
                },
                None => element.parent()?.into(),
            };
        }
    }
}
