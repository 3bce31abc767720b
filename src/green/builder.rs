use fxhash::FxHashMap;
use text_size::TextSize;

use crate::{
    green::{GreenElement, GreenNode, GreenToken, GreenTrivia, GreenTriviaList},
    interning::TokenInterner,
    Language, NodeOrToken, RawSyntaxKind,
};

use super::{node::GreenNodeHead, token::GreenTokenData};

/// If a node has at most `CHILDREN_CACHE_THRESHOLD` slots, we will not create a new [`GreenNode`],
/// but instead look up in the cache if this node is already present. If so we use the one in the
/// cache, otherwise we insert this node into the cache.
const CHILDREN_CACHE_THRESHOLD: usize = 3;

/// A `NodeCache` deduplicates identical tokens and small nodes during tree construction.
/// You can re-use the same cache for multiple similar trees with [`GreenNodeBuilder::with_cache`].
#[derive(Debug, Default)]
pub struct NodeCache {
    nodes:    FxHashMap<GreenNodeHead, GreenNode>,
    tokens:   FxHashMap<GreenTokenData, GreenToken>,
    interner: TokenInterner,
}

impl NodeCache {
    /// Constructs a new, empty cache with a fresh interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs a new, empty cache that will use the given interner to deduplicate source text.
    pub fn with_interner(interner: TokenInterner) -> Self {
        Self {
            nodes: FxHashMap::default(),
            tokens: FxHashMap::default(),
            interner,
        }
    }

    /// The interner used to deduplicate source text.
    #[inline]
    pub fn interner(&self) -> &TokenInterner {
        &self.interner
    }

    /// Number of distinct nodes and tokens currently cached.
    pub fn len(&self) -> usize {
        self.nodes.len() + self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn node(&mut self, kind: RawSyntaxKind, slots: Vec<Option<GreenElement>>) -> GreenNode {
        let head = GreenNodeHead::measure(kind, &slots, None);

        // Green nodes are fully immutable, so it's ok to deduplicate them.
        // This is the same optimization that Roslyn does
        // https://github.com/KirillOsenkov/Bliki/wiki/Roslyn-Immutable-Trees
        if slots.len() > CHILDREN_CACHE_THRESHOLD {
            return GreenNode::from_head(head, slots, None);
        }
        if let Some(cached) = self.nodes.get(&head) {
            if cached.data.slots[..] == slots[..] {
                return cached.clone();
            }
            // A hash collision with a different node: build it, but keep the cached one.
            tracing::trace!(kind = kind.0, "node cache collision");
            return GreenNode::from_head(head, slots, None);
        }
        let node = GreenNode::from_head(head.clone(), slots, None);
        self.nodes.insert(head, node.clone());
        node
    }

    fn token(&mut self, data: GreenTokenData) -> GreenToken {
        self.tokens
            .entry(data)
            .or_insert_with_key(|data| GreenToken::from_data(data.clone()))
            .clone()
    }

    #[inline]
    fn intern(&self, text: &str) -> Option<crate::interning::TokenKey> {
        if text.is_empty() {
            None
        } else {
            Some(self.interner.get_or_intern(text))
        }
    }
}

/// A checkpoint for maybe wrapping a node. See [`GreenNodeBuilder::checkpoint`] for details.
#[derive(Clone, Copy, Debug)]
pub struct Checkpoint(usize);

/// The cache of a builder, owned or borrowed from the caller.
#[derive(Debug)]
enum CacheRef<'a> {
    Owned(NodeCache),
    Borrowed(&'a mut NodeCache),
}

impl CacheRef<'_> {
    fn into_owned(self) -> Option<NodeCache> {
        match self {
            CacheRef::Owned(cache) => Some(cache),
            CacheRef::Borrowed(_) => None,
        }
    }
}

impl std::ops::Deref for CacheRef<'_> {
    type Target = NodeCache;

    fn deref(&self) -> &NodeCache {
        match self {
            CacheRef::Owned(cache) => cache,
            CacheRef::Borrowed(cache) => cache,
        }
    }
}

impl std::ops::DerefMut for CacheRef<'_> {
    fn deref_mut(&mut self) -> &mut NodeCache {
        match self {
            CacheRef::Owned(cache) => cache,
            CacheRef::Borrowed(cache) => cache,
        }
    }
}

#[derive(Debug)]
enum Parent<K> {
    Node(K),
    List,
}

/// A builder for green trees.
/// Construct with [`new`](GreenNodeBuilder::new), [`with_cache`](GreenNodeBuilder::with_cache), or
/// [`from_cache`](GreenNodeBuilder::from_cache). To add tree nodes, start them with
/// [`start_node`](GreenNodeBuilder::start_node), add [`token`](GreenNodeBuilder::token)s and then
/// [`finish_node`](GreenNodeBuilder::finish_node). When the whole tree is constructed, call
/// [`finish`](GreenNodeBuilder::finish) to obtain the root.
///
/// Trivia is attached to tokens: [`leading_trivia`](GreenNodeBuilder::leading_trivia) is held back
/// until the next token is added, [`trailing_trivia`](GreenNodeBuilder::trailing_trivia) goes to the
/// token that was added last.
///
/// # Examples
/// ```
/// # use greenwood::testing::*;
/// let mut builder: GreenNodeBuilder<TestLang> = GreenNodeBuilder::new();
/// builder.start_node(Root);
/// builder.token(Int, "42");
/// builder.trailing_trivia(Whitespace, " ");
/// builder.finish_node();
/// let (tree, cache) = builder.finish();
///
/// // Check it out!
/// assert_eq!(tree.kind(), TestLang::kind_to_raw(Root));
/// assert_eq!(tree.full_width(), 3.into());
/// assert_eq!(tree.width(), 2.into());
/// let interner = cache.unwrap().interner().clone();
/// assert_eq!(tree.to_full_string(&interner), "42 ");
/// ```
#[derive(Debug)]
pub struct GreenNodeBuilder<'cache, L: Language> {
    cache:    CacheRef<'cache>,
    parents:  Vec<(Parent<L::Kind>, usize)>,
    children: Vec<Option<GreenElement>>,
    leading:  Vec<GreenTrivia>,
}

impl<L: Language> GreenNodeBuilder<'static, L> {
    /// Creates new builder with an empty [`NodeCache`].
    pub fn new() -> Self {
        Self::from_cache(NodeCache::new())
    }

    /// Creates a new builder that interns text into `interner`.
    pub fn from_interner(interner: TokenInterner) -> Self {
        Self::from_cache(NodeCache::with_interner(interner))
    }

    /// Creates a new builder that owns `cache`. The cache is returned on
    /// [`finish`](GreenNodeBuilder::finish).
    pub fn from_cache(cache: NodeCache) -> Self {
        Self {
            cache:    CacheRef::Owned(cache),
            parents:  Vec::with_capacity(8),
            children: Vec::with_capacity(8),
            leading:  Vec::new(),
        }
    }
}

impl<L: Language> Default for GreenNodeBuilder<'static, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'cache, L: Language> GreenNodeBuilder<'cache, L> {
    /// Reusing a [`NodeCache`] between multiple builders saves memory, as it allows to structurally
    /// share underlying trees.
    pub fn with_cache(cache: &'cache mut NodeCache) -> Self {
        Self {
            cache:    CacheRef::Borrowed(cache),
            parents:  Vec::with_capacity(8),
            children: Vec::with_capacity(8),
            leading:  Vec::new(),
        }
    }

    /// The interner used to deduplicate source text.
    #[inline]
    pub fn interner(&self) -> &TokenInterner {
        self.cache.interner()
    }

    /// The cache of this builder, e.g. to build the structure of structured trivia with a nested
    /// builder.
    #[inline]
    pub fn cache_mut(&mut self) -> &mut NodeCache {
        &mut self.cache
    }

    /// Add a new token with the given `text` to the current branch.
    ///
    /// Pending leading trivia is attached to the new token.
    ///
    /// ## Panics
    /// In debug mode, if `kind` has static text, this function will verify that `text` matches that text.
    #[inline]
    pub fn token(&mut self, kind: L::Kind, text: &str) {
        if let Some(static_text) = L::static_text(kind) {
            debug_assert_eq!(
                static_text, text,
                r#"Received `{kind:?}` token which should have text "{static_text}", but "{text}" was given."#
            );
        }
        let key = self.cache.intern(text);
        let data = GreenTokenData::new(L::kind_to_raw(kind), key, TextSize::of(text));
        self.push_token(data);
    }

    /// Add a new token whose decoded value differs from its source text.
    pub fn token_with_value(&mut self, kind: L::Kind, text: &str, value: &str) {
        let mut data = GreenTokenData::new(L::kind_to_raw(kind), self.cache.intern(text), TextSize::of(text));
        data.value = Some(self.cache.interner.get_or_intern(value));
        self.push_token(data);
    }

    /// Add a zero-width token that the source did not contain.
    pub fn missing_token(&mut self, kind: L::Kind) {
        let mut data = GreenTokenData::new(L::kind_to_raw(kind), None, 0.into());
        data.missing = true;
        self.push_token(data);
    }

    fn push_token(&mut self, mut data: GreenTokenData) {
        if !self.leading.is_empty() {
            data.leading = GreenTriviaList::new(self.leading.drain(..));
        }
        let token = self.cache.token(data);
        self.children.push(Some(token.into()));
    }

    /// Add an empty slot for an absent optional child to the current branch.
    #[inline]
    pub fn empty_slot(&mut self) {
        assert!(
            !matches!(self.parents.last(), Some((Parent::List, _))),
            "lists cannot contain empty slots"
        );
        self.children.push(None);
    }

    /// Add text trivia that will lead the next token.
    pub fn leading_trivia(&mut self, kind: L::Kind, text: &str) {
        let trivia = GreenTrivia::new(self.cache.interner(), L::kind_to_raw(kind), text);
        self.leading.push(trivia);
    }

    /// Add text trivia that trails the last token of the current branch.
    ///
    /// ## Panics
    /// If the last element of the current branch is not a token.
    pub fn trailing_trivia(&mut self, kind: L::Kind, text: &str) {
        let trivia = GreenTrivia::new(self.cache.interner(), L::kind_to_raw(kind), text);
        self.push_trailing(trivia);
    }

    /// Add structured trivia that will lead the next token. `structure` is usually built with a
    /// separate builder sharing this builder's [cache](GreenNodeBuilder::cache_mut).
    pub fn leading_structured_trivia(&mut self, kind: L::Kind, structure: GreenNode) {
        let trivia = GreenTrivia::structured(L::kind_to_raw(kind), structure, L::is_trivia_directive(kind));
        self.leading.push(trivia);
    }

    /// Add structured trivia that trails the last token of the current branch.
    pub fn trailing_structured_trivia(&mut self, kind: L::Kind, structure: GreenNode) {
        let trivia = GreenTrivia::structured(L::kind_to_raw(kind), structure, L::is_trivia_directive(kind));
        self.push_trailing(trivia);
    }

    fn push_trailing(&mut self, trivia: GreenTrivia) {
        let first_child = self.parents.last().map_or(0, |&(_, first_child)| first_child);
        let in_branch = self.children.len() > first_child;
        let last = match self.children.last_mut() {
            Some(Some(NodeOrToken::Token(token))) if in_branch => token,
            _ => panic!("trailing trivia must follow a token in the same branch"),
        };
        let trailing = last.trailing_trivia().iter().cloned().chain(Some(trivia));
        *last = last.with_trailing_trivia(GreenTriviaList::new(trailing));
    }

    /// Start new node of the given `kind` and make it current.
    #[inline]
    pub fn start_node(&mut self, kind: L::Kind) {
        let len = self.children.len();
        self.parents.push((Parent::Node(kind), len));
    }

    /// Finish the current branch and restore the previous branch as current.
    #[inline]
    pub fn finish_node(&mut self) {
        let (kind, first_child) = match self.parents.pop() {
            Some((Parent::Node(kind), first_child)) => (kind, first_child),
            _ => panic!("`finish_node` called without a matching `start_node`"),
        };
        let slots: Vec<_> = self.children.drain(first_child..).collect();
        let node = self.cache.node(L::kind_to_raw(kind), slots);
        self.children.push(Some(node.into()));
    }

    /// Start a list slot. Elements added until [`finish_list`](GreenNodeBuilder::finish_list) become
    /// the children of a list node, which takes up a single slot in the enclosing node.
    #[inline]
    pub fn start_list(&mut self) {
        let len = self.children.len();
        self.parents.push((Parent::List, len));
    }

    /// Finish the current list. An empty list results in an empty slot.
    pub fn finish_list(&mut self) {
        let first_child = match self.parents.pop() {
            Some((Parent::List, first_child)) => first_child,
            _ => panic!("`finish_list` called without a matching `start_list`"),
        };
        if self.children.len() == first_child {
            self.children.push(None);
            return;
        }
        let slots: Vec<_> = self.children.drain(first_child..).collect();
        let list = self.cache.node(RawSyntaxKind::LIST, slots);
        self.children.push(Some(list.into()));
    }

    /// Prepare for maybe wrapping the next node with a surrounding node.
    ///
    /// The way wrapping works is that you first get a checkpoint, then you add nodes and tokens as
    /// normal, and then you *maybe* call [`start_node_at`](GreenNodeBuilder::start_node_at).
    ///
    /// # Examples
    /// ```
    /// # use greenwood::testing::*;
    /// # let mut builder: GreenNodeBuilder<TestLang> = GreenNodeBuilder::new();
    /// builder.start_node(Root);
    /// let checkpoint = builder.checkpoint();
    /// builder.token(Int, "1");
    /// // 1 + 2 = Add(1, 2)
    /// builder.start_node_at(checkpoint, Operation);
    /// builder.token(Plus, "+");
    /// builder.token(Int, "2");
    /// builder.finish_node();
    /// builder.finish_node();
    /// let (tree, _) = builder.finish();
    /// assert_eq!(tree.child_count(), 1);
    /// ```
    #[inline]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.children.len())
    }

    /// Wrap the previous branch marked by [`checkpoint`](GreenNodeBuilder::checkpoint) in a new
    /// branch and make it current.
    #[inline]
    pub fn start_node_at(&mut self, checkpoint: Checkpoint, kind: L::Kind) {
        let Checkpoint(checkpoint) = checkpoint;
        assert!(
            checkpoint <= self.children.len(),
            "checkpoint no longer valid, was finish_node called early?"
        );

        if let Some(&(_, first_child)) = self.parents.last() {
            assert!(
                checkpoint >= first_child,
                "checkpoint no longer valid, was an unmatched start_node_at called?"
            );
        }

        self.parents.push((Parent::Node(kind), checkpoint));
    }

    /// Complete building the tree.
    ///
    /// Make sure that calls to [`start_node`](GreenNodeBuilder::start_node) /
    /// [`start_node_at`](GreenNodeBuilder::start_node_at) and
    /// [`finish_node`](GreenNodeBuilder::finish_node) are balanced, i.e. that every started node has
    /// been completed!
    ///
    /// If this builder owns its cache, the cache is returned as the second return value to allow
    /// re-using it or extracting the [`TokenInterner`].
    #[inline]
    pub fn finish(mut self) -> (GreenNode, Option<NodeCache>) {
        assert!(self.parents.is_empty(), "unfinished nodes remain in the builder");
        assert!(self.leading.is_empty(), "leading trivia was not followed by a token");
        assert_eq!(self.children.len(), 1);
        let cache = self.cache.into_owned();
        match self.children.pop() {
            Some(Some(NodeOrToken::Node(node))) => (node, cache),
            _ => panic!("called `finish` on a `GreenNodeBuilder` which did not contain a single node"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test]
    fn cache_shares_small_nodes() {
        let mut cache = NodeCache::new();
        let mut trees = Vec::new();
        for _ in 0..2 {
            let mut builder: GreenNodeBuilder<TestLang> = GreenNodeBuilder::with_cache(&mut cache);
            builder.start_node(Root);
            builder.start_node(Operation);
            builder.token(Int, "1");
            builder.token(Plus, "+");
            builder.token(Int, "2");
            builder.finish_node();
            builder.finish_node();
            let (tree, owned) = builder.finish();
            assert!(owned.is_none());
            trees.push(tree);
        }
        assert!(trees[0].ptr_eq(&trees[1]));
        assert!(!cache.is_empty());
    }

    #[test]
    fn lists_and_empty_slots() {
        let mut builder: GreenNodeBuilder<TestLang> = GreenNodeBuilder::new();
        builder.start_node(Root);
        builder.empty_slot();
        builder.start_list();
        builder.finish_list();
        builder.start_list();
        builder.token(Int, "1");
        builder.token(Comma, ",");
        builder.trailing_trivia(Whitespace, " ");
        builder.token(Int, "2");
        builder.finish_list();
        builder.finish_node();
        let (tree, _) = builder.finish();
        assert_eq!(tree.slot_count(), 3);
        assert!(tree.slot(0).is_none());
        assert!(tree.slot(1).is_none());
        assert!(tree.slot(2).unwrap().is_list());
        assert_eq!(tree.child_count(), 3);
        assert_eq!(tree.full_width(), 4.into());
    }

    #[test]
    fn trivia_attaches_to_tokens() {
        let mut builder: GreenNodeBuilder<TestLang> = GreenNodeBuilder::new();
        builder.start_node(Root);
        builder.leading_trivia(Whitespace, "  ");
        builder.token(Int, "1");
        builder.trailing_trivia(Whitespace, " ");
        builder.leading_trivia(Comment, "/* c */");
        builder.missing_token(Int);
        builder.finish_node();
        let (tree, cache) = builder.finish();
        let interner = cache.unwrap().interner().clone();
        let tokens: Vec<_> = tree.children().filter_map(NodeOrToken::into_token).collect();
        assert_eq!(tokens[0].leading_trivia().full_width(), 2.into());
        assert_eq!(tokens[0].trailing_trivia().len(), 1);
        assert!(tokens[1].is_missing());
        assert_eq!(tokens[1].full_width(), 7.into());
        assert_eq!(tree.to_full_string(&interner), "  1 /* c */");
    }

    #[test]
    #[should_panic]
    fn trailing_trivia_needs_a_token() {
        let mut builder: GreenNodeBuilder<TestLang> = GreenNodeBuilder::new();
        builder.start_node(Root);
        builder.trailing_trivia(Whitespace, " ");
    }
}
