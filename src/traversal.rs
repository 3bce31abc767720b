//! Depth-first traversals of a subtree.
//!
//! A [`Traversal`] describes what to visit below a node: an optional span that visited elements must
//! overlap, a predicate deciding which nodes to descend into and whether to step into structured
//! trivia. Finishing it with [`nodes`](Traversal::nodes), [`nodes_and_tokens`](Traversal::nodes_and_tokens),
//! [`tokens`](Traversal::tokens) or [`trivia`](Traversal::trivia) gives a lazy iterator in document
//! order.
//!
//! Traversals do not recurse. They keep their position on an explicit stack, and stacks are pooled
//! across traversals so that walking a tree does not allocate once the pool is warm. A stack goes
//! back to the pool when its iterator is dropped, whether or not it ran to completion.
//!
//! ```
//! # use greenwood::testing::*;
//! let root = sum();
//! let texts: Vec<String> = root.descendant_tokens().map(|token| token.text().to_string()).collect();
//! assert_eq!(texts, ["1", "+", "2"]);
//! let trivia = root.descendant_trivia().count();
//! assert_eq!(trivia, 2);
//! ```

use std::{fmt, iter::FusedIterator, sync::Arc};

use parking_lot::Mutex;
use text_size::{TextRange, TextSize};

use crate::{
    syntax::{
        node::NodeData,
        token::RawToken,
        trivia::{self, RawTrivia},
    },
    Language, NodeOrToken, SyntaxElement, SyntaxNode, SyntaxToken, SyntaxTrivia,
};

/// Upper bound on the number of idle stacks kept for reuse.
const POOL_SIZE: usize = 16;
const INITIAL_STACK_CAPACITY: usize = 32;

static STACK_POOL: Mutex<Vec<Vec<Frame>>> = parking_lot::const_mutex(Vec::new());

fn acquire_stack() -> Vec<Frame> {
    match STACK_POOL.lock().pop() {
        Some(stack) => stack,
        None => {
            tracing::trace!("allocating traversal stack");
            Vec::with_capacity(INITIAL_STACK_CAPACITY)
        }
    }
}

fn release_stack(mut stack: Vec<Frame>) {
    stack.clear();
    let mut pool = STACK_POOL.lock();
    if pool.len() < POOL_SIZE {
        pool.push(stack);
    }
}

/// The remaining children of a node, with list slots flattened.
struct ChildCursor {
    node:       Arc<NodeData>,
    slot:       usize,
    list_index: usize,
    index:      usize,
    offset:     TextSize,
}

impl ChildCursor {
    fn new(node: Arc<NodeData>) -> Self {
        let offset = node.offset;
        Self {
            node,
            slot: 0,
            list_index: 0,
            index: 0,
            offset,
        }
    }

    fn next(&mut self) -> Option<NodeOrToken<Arc<NodeData>, RawToken>> {
        let green = &self.node.green;
        while self.slot < green.slot_count() {
            let element = match green.slot(self.slot) {
                None => {
                    self.slot += 1;
                    continue;
                }
                Some(NodeOrToken::Node(list)) if list.is_list() => {
                    if self.list_index < list.slot_count() {
                        match list.slot(self.list_index) {
                            Some(element) => {
                                self.list_index += 1;
                                element
                            }
                            None => {
                                self.list_index += 1;
                                continue;
                            }
                        }
                    } else {
                        self.slot += 1;
                        self.list_index = 0;
                        continue;
                    }
                }
                Some(element) => {
                    self.slot += 1;
                    element
                }
            };
            let (index, offset) = (self.index, self.offset);
            self.index += 1;
            self.offset += element.full_width();
            return Some(self.node.get_or_add_element(element, index, offset));
        }
        None
    }
}

/// The remaining trivia of a token's leading or trailing trivia.
struct TriviaCursor {
    token:    RawToken,
    trailing: bool,
    next:     u32,
    offset:   TextSize,
}

impl TriviaCursor {
    fn new(token: RawToken, trailing: bool) -> Self {
        let offset = trivia::start_of(&token, trailing);
        Self {
            token,
            trailing,
            next: 0,
            offset,
        }
    }

    fn next(&mut self) -> Option<RawTrivia> {
        let list = trivia::trivia_list(&self.token.green, self.trailing);
        let trivia = list.get(self.next as usize)?;
        let raw = RawTrivia {
            token:    self.token.clone(),
            trailing: self.trailing,
            index:    self.next,
            offset:   self.offset,
        };
        self.next += 1;
        self.offset += trivia.full_width();
        Some(raw)
    }
}

/// A resume point of a traversal.
enum Frame {
    Children(ChildCursor),
    Trivia(TriviaCursor),
    /// A token whose leading trivia is being visited.
    Token(RawToken),
    /// The structure of a trivia that was just visited.
    Structure(RawTrivia),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Nodes,
    NodesAndTokens,
    Tokens,
    Trivia,
}

impl Mode {
    #[inline]
    fn yields_nodes(self) -> bool {
        matches!(self, Mode::Nodes | Mode::NodesAndTokens)
    }

    #[inline]
    fn yields_tokens(self) -> bool {
        matches!(self, Mode::NodesAndTokens | Mode::Tokens)
    }
}

/// Everything a traversal can visit.
enum Visit<L: Language> {
    Node(SyntaxNode<L>),
    Token(SyntaxToken<L>),
    Trivia(SyntaxTrivia<L>),
}

type DescendInto<'a, L> = Box<dyn Fn(&SyntaxNode<L>) -> bool + 'a>;

/// Builder for depth-first traversals of the subtree of a node.
pub struct Traversal<'a, L: Language> {
    root:                SyntaxNode<L>,
    span:                Option<TextRange>,
    descend_into:        Option<DescendInto<'a, L>>,
    descend_into_trivia: bool,
    include_self:        bool,
}

impl<L: Language> fmt::Debug for Traversal<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Traversal")
            .field("root", &self.root)
            .field("span", &self.span)
            .field("descend_into", &self.descend_into.as_ref().map(|_| "<predicate>"))
            .field("descend_into_trivia", &self.descend_into_trivia)
            .field("include_self", &self.include_self)
            .finish()
    }
}

impl<'a, L: Language> Traversal<'a, L> {
    fn new(root: SyntaxNode<L>) -> Self {
        Self {
            root,
            span: None,
            descend_into: None,
            descend_into_trivia: false,
            include_self: false,
        }
    }

    /// Only visit elements whose full span overlaps `span`. Empty elements are visited if they
    /// touch `span`.
    pub fn span(mut self, span: TextRange) -> Self {
        self.span = Some(span);
        self
    }

    /// Only visit the children of nodes for which `predicate` holds, including the root.
    pub fn descend_into<'b, F>(self, predicate: F) -> Traversal<'b, L>
    where
        F: Fn(&SyntaxNode<L>) -> bool + 'b,
    {
        Traversal {
            root:                self.root,
            span:                self.span,
            descend_into:        Some(Box::new(predicate)),
            descend_into_trivia: self.descend_into_trivia,
            include_self:        self.include_self,
        }
    }

    /// Also visit the structures of structured trivia.
    pub fn descend_into_trivia(mut self, descend: bool) -> Self {
        self.descend_into_trivia = descend;
        self
    }

    /// Also visit the root itself, when visiting nodes.
    pub fn include_self(mut self, include: bool) -> Self {
        self.include_self = include;
        self
    }

    /// All descendant nodes in preorder.
    pub fn nodes(self) -> DescendantNodes<'a, L> {
        DescendantNodes(Walk::new(self, Mode::Nodes))
    }

    /// All descendant nodes and tokens in preorder.
    pub fn nodes_and_tokens(self) -> DescendantElements<'a, L> {
        DescendantElements(Walk::new(self, Mode::NodesAndTokens))
    }

    /// All descendant tokens in document order.
    pub fn tokens(self) -> DescendantTokens<'a, L> {
        DescendantTokens(Walk::new(self, Mode::Tokens))
    }

    /// The trivia of all descendant tokens in document order.
    pub fn trivia(self) -> DescendantTrivia<'a, L> {
        DescendantTrivia(Walk::new(self, Mode::Trivia))
    }
}

struct Walk<'a, L: Language> {
    stack:               Vec<Frame>,
    first:               Option<SyntaxNode<L>>,
    mode:                Mode,
    span:                Option<TextRange>,
    descend_into:        Option<DescendInto<'a, L>>,
    descend_into_trivia: bool,
}

impl<'a, L: Language> Walk<'a, L> {
    fn new(traversal: Traversal<'a, L>, mode: Mode) -> Self {
        let Traversal {
            root,
            span,
            descend_into,
            descend_into_trivia,
            include_self,
        } = traversal;
        let mut walk = Walk {
            stack: acquire_stack(),
            first: None,
            mode,
            span,
            descend_into,
            descend_into_trivia,
        };
        if walk.descends_into(&root) {
            walk.stack.push(Frame::Children(ChildCursor::new(Arc::clone(&root.data))));
        }
        if include_self && mode.yields_nodes() && walk.in_span(root.full_span()) {
            walk.first = Some(root);
        }
        walk
    }

    #[inline]
    fn in_span(&self, range: TextRange) -> bool {
        let Some(span) = self.span else { return true };
        let overlaps = span.intersect(range).map_or(false, |common| !common.is_empty());
        overlaps || (range.is_empty() && span.intersect(range).is_some())
    }

    #[inline]
    fn descends_into(&self, node: &SyntaxNode<L>) -> bool {
        self.descend_into.as_ref().map_or(true, |predicate| predicate(node))
    }

    /// Pushes the children of `node` if it should be descended into and returns it if nodes are
    /// being visited.
    fn visit_node(&mut self, node: SyntaxNode<L>) -> Option<Visit<L>> {
        if !self.in_span(node.full_span()) {
            return None;
        }
        if self.descends_into(&node) {
            self.stack
                .push(Frame::Children(ChildCursor::new(Arc::clone(&node.data))));
        }
        self.mode.yields_nodes().then_some(Visit::Node(node))
    }

    fn visit_token(&mut self, token: RawToken) -> Option<Visit<L>> {
        if !self.in_span(token.full_span()) {
            return None;
        }
        let needs_trivia =
            self.mode == Mode::Trivia || (self.descend_into_trivia && token.green.has_structured_trivia());
        if !needs_trivia {
            return self
                .mode
                .yields_tokens()
                .then(|| Visit::Token(SyntaxToken::from_raw(token)));
        }
        // popped in reverse: leading trivia, then the token, then trailing trivia
        if !token.green.trailing_trivia().is_empty() {
            self.stack
                .push(Frame::Trivia(TriviaCursor::new(token.clone(), true)));
        }
        if self.mode.yields_tokens() {
            self.stack.push(Frame::Token(token.clone()));
        }
        if !token.green.leading_trivia().is_empty() {
            self.stack.push(Frame::Trivia(TriviaCursor::new(token, false)));
        }
        None
    }

    fn visit_trivia(&mut self, trivia: RawTrivia) -> Option<Visit<L>> {
        if !self.in_span(trivia.full_span()) {
            return None;
        }
        if self.descend_into_trivia && trivia.green().has_structure() {
            self.stack.push(Frame::Structure(trivia.clone()));
        }
        (self.mode == Mode::Trivia).then(|| Visit::Trivia(SyntaxTrivia::from_raw(trivia)))
    }

    fn next_visit(&mut self) -> Option<Visit<L>> {
        if let Some(root) = self.first.take() {
            return Some(Visit::Node(root));
        }
        loop {
            let visit = match self.stack.last_mut()? {
                Frame::Children(cursor) => match cursor.next() {
                    Some(NodeOrToken::Node(node)) => self.visit_node(SyntaxNode::from_data(node)),
                    Some(NodeOrToken::Token(token)) => self.visit_token(token),
                    None => {
                        self.stack.pop();
                        None
                    }
                },
                Frame::Trivia(cursor) => match cursor.next() {
                    Some(trivia) => self.visit_trivia(trivia),
                    None => {
                        self.stack.pop();
                        None
                    }
                },
                Frame::Token(_) | Frame::Structure(_) => match self.stack.pop() {
                    Some(Frame::Token(token)) => Some(Visit::Token(SyntaxToken::from_raw(token))),
                    Some(Frame::Structure(trivia)) => {
                        let structure = NodeData::structure(&trivia).map(SyntaxNode::from_data);
                        structure.and_then(|node| self.visit_node(node))
                    }
                    _ => None,
                },
            };
            if visit.is_some() {
                return visit;
            }
        }
    }
}

impl<L: Language> Drop for Walk<'_, L> {
    fn drop(&mut self) {
        release_stack(std::mem::take(&mut self.stack));
    }
}

/// Iterator over descendant nodes, see [`Traversal::nodes`].
pub struct DescendantNodes<'a, L: Language>(Walk<'a, L>);

impl<L: Language> Iterator for DescendantNodes<'_, L> {
    type Item = SyntaxNode<L>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Visit::Node(node) = self.0.next_visit()? {
                return Some(node);
            }
        }
    }
}

impl<L: Language> FusedIterator for DescendantNodes<'_, L> {}

/// Iterator over descendant nodes and tokens, see [`Traversal::nodes_and_tokens`].
pub struct DescendantElements<'a, L: Language>(Walk<'a, L>);

impl<L: Language> Iterator for DescendantElements<'_, L> {
    type Item = SyntaxElement<L>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.0.next_visit()? {
                Visit::Node(node) => return Some(node.into()),
                Visit::Token(token) => return Some(token.into()),
                Visit::Trivia(_) => continue,
            }
        }
    }
}

impl<L: Language> FusedIterator for DescendantElements<'_, L> {}

/// Iterator over descendant tokens, see [`Traversal::tokens`].
pub struct DescendantTokens<'a, L: Language>(Walk<'a, L>);

impl<L: Language> Iterator for DescendantTokens<'_, L> {
    type Item = SyntaxToken<L>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Visit::Token(token) = self.0.next_visit()? {
                return Some(token);
            }
        }
    }
}

impl<L: Language> FusedIterator for DescendantTokens<'_, L> {}

/// Iterator over the trivia of descendant tokens, see [`Traversal::trivia`].
pub struct DescendantTrivia<'a, L: Language>(Walk<'a, L>);

impl<L: Language> Iterator for DescendantTrivia<'_, L> {
    type Item = SyntaxTrivia<L>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Visit::Trivia(trivia) = self.0.next_visit()? {
                return Some(trivia);
            }
        }
    }
}

impl<L: Language> FusedIterator for DescendantTrivia<'_, L> {}

impl<L: Language> SyntaxNode<L> {
    /// Starts describing a traversal of the subtree of this node.
    #[inline]
    pub fn traverse(&self) -> Traversal<'static, L> {
        Traversal::new(self.clone())
    }

    /// All nodes below this node in preorder, not including this node.
    #[inline]
    pub fn descendants(&self) -> DescendantNodes<'static, L> {
        self.traverse().nodes()
    }

    /// All nodes and tokens below this node in preorder, not including this node.
    #[inline]
    pub fn descendants_with_tokens(&self) -> DescendantElements<'static, L> {
        self.traverse().nodes_and_tokens()
    }

    /// All tokens below this node in document order.
    #[inline]
    pub fn descendant_tokens(&self) -> DescendantTokens<'static, L> {
        self.traverse().tokens()
    }

    /// The trivia of all tokens below this node in document order.
    #[inline]
    pub fn descendant_trivia(&self) -> DescendantTrivia<'static, L> {
        self.traverse().trivia()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test]
    fn preorder_with_self() {
        let root = sum();
        let kinds: Vec<_> = root
            .traverse()
            .include_self(true)
            .nodes_and_tokens()
            .map(|element| element.kind())
            .collect();
        assert_eq!(kinds, [Root, Operation, Int, Plus, Int]);
    }

    #[test]
    fn descend_into_prunes_children_only() {
        let root = sum();
        let nodes: Vec<_> = root
            .traverse()
            .descend_into(|node| node.kind() != Operation)
            .nodes_and_tokens()
            .map(|element| element.kind())
            .collect();
        assert_eq!(nodes, [Operation]);
    }

    #[test]
    fn span_filter_admits_touching_empty_elements() {
        let root = sum();
        let tokens: Vec<_> = root
            .traverse()
            .span(TextRange::new(2.into(), 3.into()))
            .tokens()
            .map(|token| token.text().to_string())
            .collect();
        assert_eq!(tokens, ["+"]);
    }

    #[test]
    fn trivia_in_document_order() {
        let root = sum();
        let spans: Vec<_> = root.descendant_trivia().map(|trivia| trivia.full_span()).collect();
        assert_eq!(
            spans,
            [TextRange::new(1.into(), 2.into()), TextRange::new(3.into(), 4.into())]
        );
    }

    #[test]
    fn stacks_return_to_the_pool_on_early_drop() {
        let root = sum();
        for _ in 0..(POOL_SIZE * 2) {
            let mut walk = root.descendants_with_tokens();
            assert!(walk.next().is_some());
        }
        assert!(STACK_POOL.lock().len() <= POOL_SIZE);
    }
}
