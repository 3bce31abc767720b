//! Lists and iterators over the children of a [`SyntaxNode`].

use std::iter::FusedIterator;

use text_size::TextSize;

use crate::{
    error::{Result, SyntaxError},
    green::GreenElementRef,
    GreenNodeChildren, Language, NodeOrToken, SyntaxElement, SyntaxNode,
};

#[derive(Clone, Debug)]
struct Iter<'n> {
    green:        GreenNodeChildren<'n>,
    front_offset: TextSize,
    back_offset:  TextSize,
    front_index:  usize,
}

impl<'n> Iter<'n> {
    fn new<L: Language>(parent: &'n SyntaxNode<L>) -> Self {
        let range = parent.full_span();
        Iter {
            green:        parent.green().children(),
            front_offset: range.start(),
            back_offset:  range.end(),
            front_index:  0,
        }
    }
}

impl<'n> Iterator for Iter<'n> {
    type Item = (GreenElementRef<'n>, usize, TextSize);

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        self.green.next().map(|element| {
            let offset = self.front_offset;
            let index = self.front_index;
            self.front_offset += element.full_width();
            self.front_index += 1;
            (element, index, offset)
        })
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.green.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        let element = self.green.next_back()?;
        // the remaining elements all sit between the front and the element we just took
        let index = self.front_index + self.green.len();
        self.back_offset -= element.full_width();
        Some((element, index, self.back_offset))
    }
}

impl ExactSizeIterator for Iter<'_> {
    #[inline(always)]
    fn len(&self) -> usize {
        self.green.len()
    }
}
impl FusedIterator for Iter<'_> {}

/// An iterator over the child nodes of a [`SyntaxNode`].
#[derive(Clone, Debug)]
pub struct SyntaxNodeChildren<'n, L: Language> {
    inner:  Iter<'n>,
    parent: &'n SyntaxNode<L>,
}

impl<'n, L: Language> SyntaxNodeChildren<'n, L> {
    #[inline]
    pub(super) fn new(parent: &'n SyntaxNode<L>) -> Self {
        Self {
            inner: Iter::new(parent),
            parent,
        }
    }

    fn materialize(&self, (element, index, offset): (GreenElementRef<'n>, usize, TextSize)) -> Option<SyntaxNode<L>> {
        let node = element.into_node()?;
        Some(SyntaxNode::from_data(self.parent.data.get_or_add_node(node, index, offset)))
    }
}

impl<L: Language> Iterator for SyntaxNodeChildren<'_, L> {
    type Item = SyntaxNode<L>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(child) = self.inner.next() {
            if let Some(node) = self.materialize(child) {
                return Some(node);
            }
        }
        None
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.inner.len()))
    }
}

impl<L: Language> DoubleEndedIterator for SyntaxNodeChildren<'_, L> {
    fn next_back(&mut self) -> Option<Self::Item> {
        while let Some(child) = self.inner.next_back() {
            if let Some(node) = self.materialize(child) {
                return Some(node);
            }
        }
        None
    }
}

impl<L: Language> FusedIterator for SyntaxNodeChildren<'_, L> {}

/// An iterator over the children of a [`SyntaxNode`], nodes and tokens alike.
#[derive(Clone, Debug)]
pub struct SyntaxElementChildren<'n, L: Language> {
    inner:  Iter<'n>,
    parent: &'n SyntaxNode<L>,
}

impl<'n, L: Language> SyntaxElementChildren<'n, L> {
    #[inline]
    pub(super) fn new(parent: &'n SyntaxNode<L>) -> Self {
        Self {
            inner: Iter::new(parent),
            parent,
        }
    }

    #[inline]
    fn materialize(&self, (element, index, offset): (GreenElementRef<'n>, usize, TextSize)) -> SyntaxElement<L> {
        SyntaxElement::from_raw(self.parent.data.get_or_add_element(element, index, offset))
    }
}

impl<L: Language> Iterator for SyntaxElementChildren<'_, L> {
    type Item = SyntaxElement<L>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let child = self.inner.next()?;
        Some(self.materialize(child))
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<L: Language> DoubleEndedIterator for SyntaxElementChildren<'_, L> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        let child = self.inner.next_back()?;
        Some(self.materialize(child))
    }
}

impl<L: Language> ExactSizeIterator for SyntaxElementChildren<'_, L> {
    #[inline(always)]
    fn len(&self) -> usize {
        self.inner.len()
    }
}
impl<L: Language> FusedIterator for SyntaxElementChildren<'_, L> {}

/// The children of a [`SyntaxNode`] as an indexable list, with list slots flattened.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChildSyntaxList<L: Language> {
    node: SyntaxNode<L>,
}

impl<L: Language> ChildSyntaxList<L> {
    pub(super) fn new(node: SyntaxNode<L>) -> Self {
        Self { node }
    }

    /// The node whose children this list holds.
    #[inline]
    pub fn node(&self) -> &SyntaxNode<L> {
        &self.node
    }

    /// Number of children, counting every element of list slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.node.child_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn any(&self) -> bool {
        !self.is_empty()
    }

    /// The child at `index`, or `None` if `index` is out of range.
    pub fn get(&self, index: usize) -> Option<SyntaxElement<L>> {
        self.item_at(index).ok()
    }

    /// The child at `index`.
    pub fn item_at(&self, index: usize) -> Result<SyntaxElement<L>> {
        self.node.child_or_token_at(index)
    }

    /// The first child. Fails on an empty list.
    pub fn first(&self) -> Result<SyntaxElement<L>> {
        self.iter()
            .next()
            .ok_or(SyntaxError::InvalidOperation("the child list is empty"))
    }

    /// The last child. Fails on an empty list.
    pub fn last(&self) -> Result<SyntaxElement<L>> {
        self.iter()
            .next_back()
            .ok_or(SyntaxError::InvalidOperation("the child list is empty"))
    }

    #[inline]
    pub fn iter(&self) -> SyntaxElementChildren<'_, L> {
        self.node.children_with_tokens()
    }

    /// The children from last to first.
    #[inline]
    pub fn reverse(&self) -> std::iter::Rev<SyntaxElementChildren<'_, L>> {
        self.iter().rev()
    }

    /// Flattened index of `element` among the children, if it is one.
    pub fn index_of(&self, element: &SyntaxElement<L>) -> Option<usize> {
        let parent = element.parent()?;
        if parent != self.node {
            return None;
        }
        Some(match element {
            NodeOrToken::Node(node) => node.data.index()? as usize,
            NodeOrToken::Token(token) => token.index(),
        })
    }
}

impl<'a, L: Language> IntoIterator for &'a ChildSyntaxList<L> {
    type IntoIter = SyntaxElementChildren<'a, L>;
    type Item = SyntaxElement<L>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
