use std::{
    fmt::{self, Write},
    hash::{Hash, Hasher},
    iter,
    marker::PhantomData,
    sync::{Arc, Weak},
};

use fxhash::FxHashMap;
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};

use crate::{
    annotation::{Diagnostic, SyntaxAnnotation},
    error::{Result, SyntaxError},
    green::{GreenElement, GreenElementRef, GreenNode},
    interning::TokenInterner,
    syntax::{
        child_list::{ChildSyntaxList, SyntaxElementChildren, SyntaxNodeChildren},
        token::RawToken,
        trivia::RawTrivia,
        SyntaxElement, SyntaxToken, SyntaxTrivia,
    },
    tracking::TrackedNodes,
    Direction, Language, NodeOrToken, RawSyntaxKind, TextRange, TextSize, TokenAtOffset, WalkEvent,
};

/// Where a navigable node hangs in its tree.
pub(crate) enum Kind {
    Root(RootData),
    Child { parent: Arc<NodeData>, index: u32 },
    /// The root of the structure of a piece of structured trivia.
    Structure(RawTrivia),
}

#[derive(Default)]
pub(crate) struct RootData {
    /// Nodes carrying tracking annotations, computed on first use.
    pub(crate) tracked: OnceCell<TrackedNodes>,
}

/// Key of a structure root in the cache of the node that contains the trivia's token.
type StructureKey = (u32, bool, u32);

pub(crate) struct NodeData {
    pub(crate) kind:     Kind,
    pub(crate) green:    GreenNode,
    pub(crate) offset:   TextSize,
    pub(crate) interner: TokenInterner,
    /// One entry per flattened child. Only node children are ever cached.
    children:            Box<[RwLock<Weak<NodeData>>]>,
    structures:          Mutex<FxHashMap<StructureKey, Weak<NodeData>>>,
}

impl NodeData {
    fn new(kind: Kind, green: GreenNode, offset: TextSize, interner: TokenInterner) -> Arc<NodeData> {
        let children = (0..green.child_count()).map(|_| RwLock::new(Weak::new())).collect();
        Arc::new(NodeData {
            kind,
            green,
            offset,
            interner,
            children,
            structures: Mutex::new(FxHashMap::default()),
        })
    }

    pub(crate) fn new_root(green: GreenNode, interner: TokenInterner) -> Arc<NodeData> {
        Self::new(Kind::Root(RootData::default()), green, 0.into(), interner)
    }

    #[inline]
    pub(crate) fn parent(&self) -> Option<&Arc<NodeData>> {
        match &self.kind {
            Kind::Child { parent, .. } => Some(parent),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn index(&self) -> Option<u32> {
        match &self.kind {
            Kind::Child { index, .. } => Some(*index),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn full_span(&self) -> TextRange {
        TextRange::at(self.offset, self.green.full_width())
    }

    /// The child node at flattened `index`, creating and caching it if nobody holds on to it.
    pub(crate) fn get_or_add_node(self: &Arc<Self>, green: &GreenNode, index: usize, offset: TextSize) -> Arc<NodeData> {
        let slot = &self.children[index];
        if let Some(node) = slot.read().upgrade() {
            debug_assert_eq!(node.offset, offset);
            return node;
        }
        let node = NodeData::new(
            Kind::Child {
                parent: Arc::clone(self),
                index:  index as u32,
            },
            green.clone(),
            offset,
            self.interner.clone(),
        );
        let mut cached = slot.write();
        match cached.upgrade() {
            // Another thread materialized the child while we were building ours. Theirs wins.
            Some(existing) => existing,
            None => {
                *cached = Arc::downgrade(&node);
                node
            }
        }
    }

    pub(crate) fn get_or_add_element(
        self: &Arc<Self>,
        green: GreenElementRef<'_>,
        index: usize,
        offset: TextSize,
    ) -> NodeOrToken<Arc<NodeData>, RawToken> {
        match green {
            NodeOrToken::Node(node) => NodeOrToken::Node(self.get_or_add_node(node, index, offset)),
            NodeOrToken::Token(token) => NodeOrToken::Token(RawToken::new(Arc::clone(self), token.clone(), index, offset)),
        }
    }

    pub(crate) fn child_at(self: &Arc<Self>, index: usize) -> Result<NodeOrToken<Arc<NodeData>, RawToken>> {
        let located = self.green.locate(index)?;
        Ok(self.get_or_add_element(located.element, index, self.offset + located.offset))
    }

    /// The root of the structure of `trivia`, cached by the node that contains the trivia's token.
    pub(crate) fn structure(trivia: &RawTrivia) -> Option<Arc<NodeData>> {
        let green = trivia.green().structure()?;
        let owner = &trivia.token.parent;
        let key = (trivia.token.index, trivia.trailing, trivia.index);
        let mut cache = owner.structures.lock();
        if let Some(node) = cache.get(&key).and_then(Weak::upgrade) {
            return Some(node);
        }
        let node = NodeData::new(
            Kind::Structure(trivia.clone()),
            green.clone(),
            trivia.offset,
            owner.interner.clone(),
        );
        cache.insert(key, Arc::downgrade(&node));
        Some(node)
    }
}

/// Whether two navigable nodes stand for the same location in the same tree.
pub(crate) fn same_node(mut a: &Arc<NodeData>, mut b: &Arc<NodeData>) -> bool {
    loop {
        if Arc::ptr_eq(a, b) {
            return true;
        }
        if a.offset != b.offset || !a.green.ptr_eq(&b.green) {
            return false;
        }
        match (&a.kind, &b.kind) {
            (Kind::Child { parent: pa, index: ia }, Kind::Child { parent: pb, index: ib }) => {
                if ia != ib {
                    return false;
                }
                a = pa;
                b = pb;
            }
            (Kind::Structure(ta), Kind::Structure(tb)) => {
                if ta.index != tb.index || ta.trailing != tb.trailing || ta.token.index != tb.token.index {
                    return false;
                }
                a = &ta.token.parent;
                b = &tb.token.parent;
            }
            _ => return false,
        }
    }
}

/// Replaces the child at flattened `index` of `parent`.
pub(crate) fn splice_child(parent: &GreenNode, index: u32, element: GreenElement) -> GreenNode {
    match parent.with_child(index as usize, element) {
        Ok(node) => node,
        Err(err) => unreachable!("a child's index is always in range: {err}"),
    }
}

/// Builds the value tree that results from replacing `node` by `replacement`, up to the root.
pub(crate) fn splice_into_ancestors(node: &Arc<NodeData>, mut replacement: GreenNode) -> GreenNode {
    let mut current = Arc::clone(node);
    loop {
        let next = match &current.kind {
            Kind::Root(_) => return replacement,
            Kind::Child { parent, index } => {
                replacement = splice_child(&parent.green, *index, replacement.into());
                Arc::clone(parent)
            }
            Kind::Structure(trivia) => {
                let token = trivia.with_structure(replacement);
                replacement = splice_child(&trivia.token.parent.green, trivia.token.index, token.into());
                Arc::clone(&trivia.token.parent)
            }
        };
        current = next;
    }
}

/// Inner tree node in the navigable ("red") tree.
///
/// A `SyntaxNode` is a value node together with its absolute position and its parent. Syntax
/// nodes are created lazily while navigating and compare equal if they stand for the same location
/// of the same tree.
pub struct SyntaxNode<L: Language> {
    pub(crate) data: Arc<NodeData>,
    _lang:           PhantomData<L>,
}

impl<L: Language> Clone for SyntaxNode<L> {
    #[inline]
    fn clone(&self) -> Self {
        Self::from_data(Arc::clone(&self.data))
    }
}

impl<L: Language> PartialEq for SyntaxNode<L> {
    #[inline]
    fn eq(&self, other: &SyntaxNode<L>) -> bool {
        same_node(&self.data, &other.data)
    }
}

impl<L: Language> Eq for SyntaxNode<L> {}

impl<L: Language> Hash for SyntaxNode<L> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.green.as_ptr().hash(state);
        self.data.offset.hash(state);
    }
}

impl<L: Language> fmt::Debug for SyntaxNode<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.kind(), self.full_span())
    }
}

/// Displays the text of this node, without its leading and trailing trivia.
impl<L: Language> fmt::Display for SyntaxNode<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = self.to_full_string();
        let full_span = self.full_span();
        let span = self.span();
        let start = usize::from(span.start() - full_span.start());
        let end = usize::from(span.end() - full_span.start());
        f.write_str(&full[start..end])
    }
}

impl<L: Language> SyntaxNode<L> {
    /// Creates the root of a navigable tree over `green`. Text of the tree is resolved through
    /// `interner`, which must be the interner the value tree was built with.
    pub fn new_root(green: GreenNode, interner: TokenInterner) -> Self {
        Self::from_data(NodeData::new_root(green, interner))
    }

    #[inline]
    pub(crate) fn from_data(data: Arc<NodeData>) -> Self {
        Self {
            data,
            _lang: PhantomData,
        }
    }

    /// Returns a green tree, equal to the green tree this node belongs to, except with this node
    /// substituted. The complexity of the operation is proportional to the depth of the tree,
    /// including the depth of enclosing structured trivia.
    pub fn replace_with(&self, replacement: GreenNode) -> GreenNode {
        splice_into_ancestors(&self.data, replacement)
    }

    /// The internal representation of the kind of this node.
    #[inline]
    pub fn syntax_kind(&self) -> RawSyntaxKind {
        self.data.green.kind()
    }

    /// The kind of this node in terms of your language.
    #[inline]
    pub fn kind(&self) -> L::Kind {
        L::kind_from_raw(self.syntax_kind())
    }

    /// The underlying value node of this node.
    #[inline]
    pub fn green(&self) -> &GreenNode {
        &self.data.green
    }

    /// The interner that resolves the text of this tree.
    #[inline]
    pub fn interner(&self) -> &TokenInterner {
        &self.data.interner
    }

    /// Absolute start of this node's full span.
    #[inline]
    pub fn position(&self) -> TextSize {
        self.data.offset
    }

    /// The range covered by this node, including all trivia.
    #[inline]
    pub fn full_span(&self) -> TextRange {
        self.data.full_span()
    }

    /// The range covered by this node, without the leading trivia of its first token and the trailing
    /// trivia of its last token.
    pub fn span(&self) -> TextRange {
        let green = self.green();
        let start = self.position() + green.leading_trivia_width();
        TextRange::at(start, green.width())
    }

    /// The parent node of this node, `None` for roots, including the roots of structured trivia.
    #[inline]
    pub fn parent(&self) -> Option<SyntaxNode<L>> {
        self.data.parent().cloned().map(Self::from_data)
    }

    /// If this node is the root of the structure of a trivia, that trivia.
    pub fn parent_trivia(&self) -> Option<SyntaxTrivia<L>> {
        match &self.data.kind {
            Kind::Structure(trivia) => Some(SyntaxTrivia::from_raw(trivia.clone())),
            _ => None,
        }
    }

    #[inline]
    pub fn is_structured_trivia(&self) -> bool {
        matches!(self.data.kind, Kind::Structure(_))
    }

    /// The parent of this node or, for the root of structured trivia, the node that contains the
    /// trivia's token.
    pub fn parent_or_structured_trivia_parent(&self) -> Option<SyntaxNode<L>> {
        match &self.data.kind {
            Kind::Root(_) => None,
            Kind::Child { parent, .. } => Some(Self::from_data(Arc::clone(parent))),
            Kind::Structure(trivia) => Some(Self::from_data(Arc::clone(&trivia.token.parent))),
        }
    }

    /// Returns an iterator along the chain of parents of this node, starting with this node.
    #[inline]
    pub fn ancestors(&self) -> impl Iterator<Item = SyntaxNode<L>> {
        iter::successors(Some(self.clone()), SyntaxNode::parent)
    }

    /// Like [`ancestors`](SyntaxNode::ancestors), but continues from the root of structured trivia
    /// into the tree that contains the trivia.
    #[inline]
    pub fn ancestors_with_trivia(&self) -> impl Iterator<Item = SyntaxNode<L>> {
        iter::successors(Some(self.clone()), SyntaxNode::parent_or_structured_trivia_parent)
    }

    /// The root of the tree this node belongs to. For nodes inside structured trivia, this is the
    /// root of the structure.
    pub fn root(&self) -> SyntaxNode<L> {
        let mut node = Arc::clone(&self.data);
        while let Some(parent) = node.parent().cloned() {
            node = parent;
        }
        Self::from_data(node)
    }

    /// The outermost root, walking out of structured trivia.
    pub fn true_root(&self) -> SyntaxNode<L> {
        let mut node = self.clone();
        while let Some(parent) = node.parent_or_structured_trivia_parent() {
            node = parent;
        }
        node
    }

    /// Number of slots of the underlying value node.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.green().slot_count()
    }

    /// Index of this node among the flattened children of its parent. Roots are at 0.
    #[inline]
    pub fn index(&self) -> usize {
        self.data.index().unwrap_or(0) as usize
    }

    /// The node in slot `index`, if the slot holds a single node. The node is cached, so repeated
    /// calls return the same instance for as long as it is alive.
    ///
    /// ## Panics
    /// If `index` is not less than [`slot_count`](SyntaxNode::slot_count).
    pub fn node_slot(&self, index: usize) -> Option<SyntaxNode<L>> {
        let green = self.green();
        let node = match green.slot(index)? {
            NodeOrToken::Node(node) if !node.is_list() => node,
            _ => return None,
        };
        let child_index = green.slot_child_index(index);
        let offset = self.position() + green.slot_offset(index);
        Some(Self::from_data(self.data.get_or_add_node(node, child_index, offset)))
    }

    /// Number of children with list slots flattened.
    #[inline]
    pub fn child_count(&self) -> usize {
        self.green().child_count()
    }

    /// The list of all children of this node, nodes and tokens alike.
    #[inline]
    pub fn children_and_tokens(&self) -> ChildSyntaxList<L> {
        ChildSyntaxList::new(self.clone())
    }

    /// The child at flattened `index`.
    pub fn child_or_token_at(&self, index: usize) -> Result<SyntaxElement<L>> {
        Ok(SyntaxElement::from_raw(self.data.child_at(index)?))
    }

    /// Returns an iterator over child nodes of this node.
    ///
    /// If you want to also consider leafs, see [`children_with_tokens`](SyntaxNode::children_with_tokens).
    #[inline]
    pub fn children(&self) -> SyntaxNodeChildren<'_, L> {
        SyntaxNodeChildren::new(self)
    }

    /// Returns an iterator over child elements of this node, including tokens.
    #[inline]
    pub fn children_with_tokens(&self) -> SyntaxElementChildren<'_, L> {
        SyntaxElementChildren::new(self)
    }

    /// The first child node of this node, if any.
    ///
    /// If you want to also consider leafs, see [`first_child_or_token`](SyntaxNode::first_child_or_token).
    #[inline]
    pub fn first_child(&self) -> Option<SyntaxNode<L>> {
        self.children().next()
    }

    /// The first child element of this node, if any, including tokens.
    #[inline]
    pub fn first_child_or_token(&self) -> Option<SyntaxElement<L>> {
        self.children_with_tokens().next()
    }

    /// The last child node of this node, if any.
    #[inline]
    pub fn last_child(&self) -> Option<SyntaxNode<L>> {
        self.children().next_back()
    }

    /// The last child element of this node, if any, including tokens.
    #[inline]
    pub fn last_child_or_token(&self) -> Option<SyntaxElement<L>> {
        self.children_with_tokens().next_back()
    }

    /// The node to the right of this one, i.e. the next child node (!) of this node's parent after this node.
    ///
    /// If you want to also consider leafs, see [`next_sibling_or_token`](SyntaxNode::next_sibling_or_token).
    pub fn next_sibling(&self) -> Option<SyntaxNode<L>> {
        let parent = self.data.parent()?;
        let index = self.data.index()? as usize;
        children_from(parent, index + 1, self.full_span().end())
            .find_map(|(element, index, offset)| Some((element.into_node()?, index, offset)))
            .map(|(node, index, offset)| Self::from_data(parent.get_or_add_node(node, index, offset)))
    }

    /// The tree element to the right of this one, i.e. the next child of this node's parent after this node.
    pub fn next_sibling_or_token(&self) -> Option<SyntaxElement<L>> {
        let parent = self.data.parent()?;
        let index = self.data.index()? as usize;
        let (element, index, offset) = children_from(parent, index + 1, self.full_span().end()).next()?;
        Some(SyntaxElement::from_raw(parent.get_or_add_element(element, index, offset)))
    }

    /// The node to the left of this one, i.e. the previous child node (!) of this node's parent before this node.
    pub fn prev_sibling(&self) -> Option<SyntaxNode<L>> {
        let parent = self.data.parent()?;
        let index = self.data.index()? as usize;
        children_to(parent, index, self.position())
            .find_map(|(element, index, offset)| Some((element.into_node()?, index, offset)))
            .map(|(node, index, offset)| Self::from_data(parent.get_or_add_node(node, index, offset)))
    }

    /// The tree element to the left of this one, i.e. the previous child of this node's parent before this node.
    pub fn prev_sibling_or_token(&self) -> Option<SyntaxElement<L>> {
        let parent = self.data.parent()?;
        let index = self.data.index()? as usize;
        let (element, index, offset) = children_to(parent, index, self.position()).next()?;
        Some(SyntaxElement::from_raw(parent.get_or_add_element(element, index, offset)))
    }

    /// Return the leftmost token in the subtree of this node.
    pub fn first_token(&self) -> Option<SyntaxToken<L>> {
        match self.first_child_or_token()? {
            NodeOrToken::Node(node) => node.first_token(),
            NodeOrToken::Token(token) => Some(token),
        }
    }

    /// Return the rightmost token in the subtree of this node.
    pub fn last_token(&self) -> Option<SyntaxToken<L>> {
        match self.last_child_or_token()? {
            NodeOrToken::Node(node) => node.last_token(),
            NodeOrToken::Token(token) => Some(token),
        }
    }

    /// Returns an iterator over all sibling nodes of this node in the given `direction`, i.e. all of
    /// this node's parent's child nodes (!) from this node on to the left or the right. The first
    /// item in the iterator will always be this node.
    #[inline]
    pub fn siblings(&self, direction: Direction) -> impl Iterator<Item = SyntaxNode<L>> {
        iter::successors(Some(self.clone()), move |node| match direction {
            Direction::Next => node.next_sibling(),
            Direction::Prev => node.prev_sibling(),
        })
    }

    /// Returns an iterator over all siblings of this node in the given `direction`, i.e. all of this
    /// node's parent's children from this node on to the left or the right.
    /// The first item in the iterator will always be this node.
    #[inline]
    pub fn siblings_with_tokens(&self, direction: Direction) -> impl Iterator<Item = SyntaxElement<L>> {
        let me: SyntaxElement<L> = self.clone().into();
        iter::successors(Some(me), move |el| match direction {
            Direction::Next => el.next_sibling_or_token(),
            Direction::Prev => el.prev_sibling_or_token(),
        })
    }

    /// Traverse the subtree rooted at the current node (including the current
    /// node) in preorder, excluding tokens.
    pub fn preorder(&self) -> impl Iterator<Item = WalkEvent<SyntaxNode<L>>> {
        let start = self.clone();
        iter::successors(Some(WalkEvent::Enter(self.clone())), move |pos| {
            let next = match pos {
                WalkEvent::Enter(node) => match node.first_child() {
                    Some(child) => WalkEvent::Enter(child),
                    None => WalkEvent::Leave(node.clone()),
                },
                WalkEvent::Leave(node) => {
                    if node == &start {
                        return None;
                    }
                    match node.next_sibling() {
                        Some(sibling) => WalkEvent::Enter(sibling),
                        None => WalkEvent::Leave(node.parent()?),
                    }
                }
            };
            Some(next)
        })
    }

    /// Traverse the subtree rooted at the current node (including the current
    /// node) in preorder, including tokens.
    pub fn preorder_with_tokens(&self) -> impl Iterator<Item = WalkEvent<SyntaxElement<L>>> {
        let start: SyntaxElement<L> = self.clone().into();
        iter::successors(Some(WalkEvent::Enter(start.clone())), move |pos| {
            let next = match pos {
                WalkEvent::Enter(el) => match el {
                    NodeOrToken::Node(node) => match node.first_child_or_token() {
                        Some(child) => WalkEvent::Enter(child),
                        None => WalkEvent::Leave(node.clone().into()),
                    },
                    NodeOrToken::Token(token) => WalkEvent::Leave(token.clone().into()),
                },
                WalkEvent::Leave(el) => {
                    if el == &start {
                        return None;
                    }
                    match el.next_sibling_or_token() {
                        Some(sibling) => WalkEvent::Enter(sibling),
                        None => WalkEvent::Leave(el.parent()?.into()),
                    }
                }
            };
            Some(next)
        })
    }

    /// Find the tokens in the subtree of this node whose full span covers the offset.
    /// Precondition: offset must be within the node's full span.
    pub fn token_at_offset(&self, offset: TextSize) -> TokenAtOffset<SyntaxToken<L>> {
        let range = self.full_span();
        assert!(
            range.start() <= offset && offset <= range.end(),
            "Bad offset: range {:?} offset {:?}",
            range,
            offset
        );
        if range.is_empty() {
            return TokenAtOffset::None;
        }

        let mut children = self.children_with_tokens().filter(|child| {
            let child_range = child.full_span();
            !child_range.is_empty() && (child_range.start() <= offset && offset <= child_range.end())
        });

        let Some(left) = children.next() else {
            return TokenAtOffset::None;
        };
        let right = children.next();
        debug_assert!(children.next().is_none());

        if let Some(right) = right {
            match (left.token_at_offset(offset), right.token_at_offset(offset)) {
                (TokenAtOffset::Single(left), TokenAtOffset::Single(right)) => TokenAtOffset::Between(left, right),
                _ => unreachable!(),
            }
        } else {
            left.token_at_offset(offset)
        }
    }

    /// Return the deepest node or token in the current subtree whose full span contains the range.
    /// If the range is empty and is contained in two leaf nodes, either one can be returned.
    /// Precondition: range must be contained within the current node.
    pub fn covering_element(&self, range: TextRange) -> SyntaxElement<L> {
        let mut res: SyntaxElement<L> = self.clone().into();
        loop {
            assert!(
                res.full_span().contains_range(range),
                "Bad range: node range {:?}, range {:?}",
                res.full_span(),
                range,
            );
            res = match &res {
                NodeOrToken::Token(_) => return res,
                NodeOrToken::Node(node) => {
                    match node
                        .children_with_tokens()
                        .find(|child| child.full_span().contains_range(range))
                    {
                        Some(child) => child,
                        None => return res,
                    }
                }
            };
        }
    }

    /// The token whose full span contains `position`. The end of this node's full span finds the
    /// last token. With `find_inside_trivia`, a position inside structured trivia finds the token
    /// inside the structure.
    pub fn find_token(&self, position: TextSize, find_inside_trivia: bool) -> Result<SyntaxToken<L>> {
        let full_span = self.full_span();
        if position == full_span.end() {
            return self
                .last_token()
                .ok_or(SyntaxError::InvalidOperation("node has no tokens"));
        }
        if !full_span.contains(position) {
            return Err(SyntaxError::IndexOutOfRange {
                index: u32::from(position) as usize,
                len:   u32::from(full_span.end()) as usize,
            });
        }
        let mut node = self.clone();
        let token = loop {
            let child = node
                .children_with_tokens()
                .find(|child| child.full_span().contains(position))
                .ok_or(SyntaxError::InvalidOperation("no token covers the position"))?;
            match child {
                NodeOrToken::Node(child) => node = child,
                NodeOrToken::Token(token) => break token,
            }
        };
        if find_inside_trivia && token.has_structured_trivia() && !token.span().contains(position) {
            let structure = token
                .leading_trivia()
                .iter()
                .chain(token.trailing_trivia().iter())
                .find(|trivia| trivia.full_span().contains(position))
                .and_then(|trivia| trivia.structure());
            if let Some(structure) = structure {
                return structure.find_token(position, true);
            }
        }
        Ok(token)
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        self.green().is_missing()
    }

    #[inline]
    pub fn contains_diagnostics(&self) -> bool {
        self.green().contains_diagnostics()
    }

    #[inline]
    pub fn contains_directives(&self) -> bool {
        self.green().contains_directives()
    }

    #[inline]
    pub fn contains_annotations(&self) -> bool {
        self.green().contains_annotations()
    }

    #[inline]
    pub fn has_structured_trivia(&self) -> bool {
        self.green().contains_structured_trivia()
    }

    #[inline]
    pub fn has_annotation(&self, annotation: &SyntaxAnnotation) -> bool {
        self.green().has_annotation(annotation)
    }

    #[inline]
    pub fn annotations(&self) -> &[SyntaxAnnotation] {
        self.green().annotations()
    }

    /// Annotations of the given `kind` attached to this node.
    pub fn annotations_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a SyntaxAnnotation> + 'a {
        self.annotations()
            .iter()
            .filter(move |annotation| annotation.kind() == Some(kind))
    }

    #[inline]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.green().diagnostics()
    }

    /// All nodes in this subtree, including this node and nodes inside structured trivia, that carry
    /// `annotation`.
    pub fn annotated_nodes(&self, annotation: &SyntaxAnnotation) -> impl Iterator<Item = SyntaxNode<L>> {
        let annotation = annotation.clone();
        self.traverse()
            .include_self(true)
            .descend_into_trivia(true)
            .descend_into(|node| node.contains_annotations())
            .nodes()
            .filter(move |node| node.has_annotation(&annotation))
    }

    /// All tokens in this subtree, including tokens inside structured trivia, that carry `annotation`.
    pub fn annotated_tokens(&self, annotation: &SyntaxAnnotation) -> impl Iterator<Item = SyntaxToken<L>> {
        let annotation = annotation.clone();
        self.traverse()
            .descend_into_trivia(true)
            .descend_into(|node| node.contains_annotations())
            .tokens()
            .filter(move |token| token.has_annotation(&annotation))
    }

    /// The text of this node, including all trivia.
    pub fn to_full_string(&self) -> String {
        self.green().to_full_string(self.interner())
    }

    /// A debug representation of this node. With `recursive`, also shows all descendants, one per
    /// line and indented by depth.
    pub fn debug(&self, recursive: bool) -> String {
        // NOTE: `fmt::Write` methods on `String` never fail
        let mut res = String::new();
        if recursive {
            let mut level = 0;
            for event in self.preorder_with_tokens() {
                match event {
                    WalkEvent::Enter(element) => {
                        for _ in 0..level {
                            let _ = write!(res, "  ");
                        }
                        let _ = match element {
                            NodeOrToken::Node(node) => writeln!(res, "{}", node.debug(false)),
                            NodeOrToken::Token(token) => writeln!(res, "{token:?}"),
                        };
                        level += 1;
                    }
                    WalkEvent::Leave(_) => level -= 1,
                }
            }
            debug_assert_eq!(level, 0);
        } else {
            let _ = write!(res, "{self:?}");
        }
        res
    }

    /// The whole tree below this node, one element per line. Shorthand for `debug(true)`.
    #[inline]
    pub fn debug_tree(&self) -> String {
        self.debug(true)
    }
}

/// Children of `parent` from flattened index `start_index` on, with their absolute offsets, given
/// that the child at `start_index` starts at `offset`.
pub(crate) fn children_from(
    parent: &NodeData,
    start_index: usize,
    mut offset: TextSize,
) -> impl Iterator<Item = (GreenElementRef<'_>, usize, TextSize)> {
    parent
        .green
        .children()
        .enumerate()
        .skip(start_index)
        .map(move |(index, element)| {
            let element_offset = offset;
            offset += element.full_width();
            (element, index, element_offset)
        })
}

/// Children of `parent` before flattened index `end_index`, last one first, given that the child at
/// `end_index` starts at `offset`.
pub(crate) fn children_to(
    parent: &NodeData,
    end_index: usize,
    mut offset: TextSize,
) -> impl Iterator<Item = (GreenElementRef<'_>, usize, TextSize)> {
    parent
        .green
        .children()
        .take(end_index)
        .enumerate()
        .rev()
        .map(move |(index, element)| {
            offset -= element.full_width();
            (element, index, offset)
        })
}
