//! Pure edits of navigable trees.
//!
//! Every edit rewrites the value nodes on the paths from the edited elements up to the receiver and
//! returns the root of a new tree. The receiver and all nodes of its tree stay valid and unchanged.

use bitflags::bitflags;
use fxhash::{FxHashMap, FxHashSet};
use text_size::TextRange;

use crate::{
    annotation::SyntaxAnnotation,
    error::{Result, SyntaxError},
    green::{GreenElement, GreenElementRef, GreenTriviaList},
    syntax::{node::NodeData, SyntaxElement, SyntaxNode, SyntaxToken, SyntaxTrivia, SyntaxTriviaList},
    GreenNode, GreenToken, GreenTrivia, Language, NodeOrToken,
};

bitflags! {
    /// Which trivia of removed nodes to keep.
    ///
    /// Kept trivia moves to the front of the leading trivia of the token after the removed node or,
    /// if there is none, to the end of the trailing trivia of the token before it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RemoveOptions: u8 {
        const KEEP_NO_TRIVIA       = 0;
        /// Keep the leading trivia of the removed node's first token.
        const KEEP_LEADING_TRIVIA  = 1 << 0;
        /// Keep the trailing trivia of the removed node's last token.
        const KEEP_TRAILING_TRIVIA = 1 << 1;
        const KEEP_EXTERIOR_TRIVIA = Self::KEEP_LEADING_TRIVIA.bits() | Self::KEEP_TRAILING_TRIVIA.bits();
        /// Keep all directives inside the removed node.
        const KEEP_DIRECTIVES      = 1 << 2;
    }
}

type NodeRewrite<'f, L> = Box<dyn FnMut(&SyntaxNode<L>, GreenNode) -> Vec<GreenNode> + 'f>;
type TokenRewrite<'f, L> = Box<dyn FnMut(&SyntaxToken<L>, GreenToken) -> Vec<GreenToken> + 'f>;
type TriviaRewrite<'f, L> = Box<dyn FnMut(&SyntaxTrivia<L>, GreenTrivia) -> Vec<GreenTrivia> + 'f>;

/// Rewrites the subtree of a node bottom-up, calling back for every target.
///
/// Targets receive their already rewritten value, so targets nested in other targets compose.
/// Subtrees that cannot contain a target are not visited.
struct Rewriter<'f, L: Language> {
    root:           SyntaxNode<L>,
    nodes:          FxHashSet<SyntaxNode<L>>,
    tokens:         FxHashSet<SyntaxToken<L>>,
    trivia:         FxHashSet<SyntaxTrivia<L>>,
    spans:          Vec<TextRange>,
    into_structure: bool,
    on_node:        NodeRewrite<'f, L>,
    on_token:       TokenRewrite<'f, L>,
    on_trivia:      TriviaRewrite<'f, L>,
}

impl<'f, L: Language> Rewriter<'f, L> {
    fn new(root: &SyntaxNode<L>) -> Self {
        Self {
            root:           root.clone(),
            nodes:          FxHashSet::default(),
            tokens:         FxHashSet::default(),
            trivia:         FxHashSet::default(),
            spans:          Vec::new(),
            into_structure: false,
            on_node:        Box::new(|_: &SyntaxNode<L>, green: GreenNode| vec![green]),
            on_token:       Box::new(|_: &SyntaxToken<L>, green: GreenToken| vec![green]),
            on_trivia:      Box::new(|_: &SyntaxTrivia<L>, green: GreenTrivia| vec![green]),
        }
    }

    fn check_descendant(&mut self, node: &SyntaxNode<L>, span: TextRange) -> Result<()> {
        let mut in_structure = false;
        for ancestor in node.ancestors_with_trivia() {
            if ancestor == self.root {
                self.into_structure |= in_structure;
                self.spans.push(span);
                return Ok(());
            }
            in_structure |= ancestor.is_structured_trivia();
        }
        Err(SyntaxError::InvalidArgument("the element is not a descendant of the node being edited"))
    }

    fn add_node(&mut self, node: SyntaxNode<L>) -> Result<()> {
        self.check_descendant(&node, node.full_span())?;
        self.nodes.insert(node);
        Ok(())
    }

    fn add_token(&mut self, token: SyntaxToken<L>) -> Result<()> {
        self.check_descendant(&token.parent(), token.full_span())?;
        self.tokens.insert(token);
        Ok(())
    }

    fn add_trivia(&mut self, trivia: SyntaxTrivia<L>) -> Result<()> {
        self.check_descendant(&trivia.token().parent(), trivia.full_span())?;
        self.trivia.insert(trivia);
        Ok(())
    }

    #[inline]
    fn touches(&self, span: TextRange) -> bool {
        self.spans.iter().any(|target| target.intersect(span).is_some())
    }

    /// Rewrites the receiver. Yields the values that replace it, as produced by the callback if
    /// the receiver is a target itself.
    fn run(mut self) -> Result<Vec<GreenNode>> {
        let root = self.root.clone();
        tracing::debug!(
            nodes = self.nodes.len(),
            tokens = self.tokens.len(),
            trivia = self.trivia.len(),
            "rewriting {:?}",
            root
        );
        let rewritten = self.rewrite_node(&root)?;
        Ok(if self.nodes.contains(&root) {
            (self.on_node)(&root, rewritten)
        } else {
            vec![rewritten]
        })
    }

    /// Like [`run`](Rewriter::run), but the receiver must be replaced by exactly one node.
    fn run_single(self) -> Result<SyntaxNode<L>> {
        let interner = self.root.interner().clone();
        let mut rewritten = self.run()?;
        match (rewritten.pop(), rewritten.is_empty()) {
            (Some(green), true) => Ok(SyntaxNode::new_root(green, interner)),
            _ => Err(SyntaxError::InvalidOperation(
                "the edited node must be replaced by exactly one node",
            )),
        }
    }

    fn rewrite_node(&mut self, node: &SyntaxNode<L>) -> Result<GreenNode> {
        let green = node.green();
        if !self.touches(node.full_span()) {
            return Ok(green.clone());
        }
        let mut slots = Vec::with_capacity(green.slot_count());
        let mut changed = false;
        let mut index = 0;
        let mut offset = node.position();
        for slot in green.slots() {
            let Some(element) = slot else {
                slots.push(None);
                continue;
            };
            match element {
                NodeOrToken::Node(list) if list.is_list() => {
                    let mut items = Vec::with_capacity(list.slot_count());
                    let mut list_changed = false;
                    for item in list.slots().flatten() {
                        let red = SyntaxElement::from_raw(node.data.get_or_add_element(item, index, offset));
                        let rewritten = self.rewrite_element(&red)?;
                        list_changed |= !is_unchanged(&rewritten, item);
                        items.extend(rewritten);
                        index += 1;
                        offset += item.full_width();
                    }
                    if list_changed {
                        changed = true;
                        slots.push(if items.is_empty() {
                            None
                        } else {
                            Some(list.replace_slots(items.into_iter().map(Some).collect()).into())
                        });
                    } else {
                        slots.push(Some(element.cloned()));
                    }
                }
                _ => {
                    let red = SyntaxElement::from_raw(node.data.get_or_add_element(element, index, offset));
                    let mut rewritten = self.rewrite_element(&red)?;
                    changed |= !is_unchanged(&rewritten, element);
                    index += 1;
                    offset += element.full_width();
                    match rewritten.len() {
                        0 => slots.push(None),
                        1 => slots.push(rewritten.pop()),
                        _ => {
                            return Err(SyntaxError::InvalidOperation(
                                "only elements of a list can be replaced by several elements",
                            ))
                        }
                    }
                }
            }
        }
        Ok(if changed { green.replace_slots(slots) } else { green.clone() })
    }

    fn rewrite_element(&mut self, element: &SyntaxElement<L>) -> Result<Vec<GreenElement>> {
        Ok(match element {
            NodeOrToken::Node(node) => {
                let rewritten = self.rewrite_node(node)?;
                if self.nodes.contains(node) {
                    (self.on_node)(node, rewritten).into_iter().map(Into::into).collect()
                } else {
                    vec![rewritten.into()]
                }
            }
            NodeOrToken::Token(token) => {
                let rewritten = self.rewrite_token(token)?;
                if self.tokens.contains(token) {
                    (self.on_token)(token, rewritten).into_iter().map(Into::into).collect()
                } else {
                    vec![rewritten.into()]
                }
            }
        })
    }

    fn rewrite_token(&mut self, token: &SyntaxToken<L>) -> Result<GreenToken> {
        let mut green = token.green().clone();
        if (self.trivia.is_empty() && !self.into_structure) || !self.touches(token.full_span()) {
            return Ok(green);
        }
        if let Some(leading) = self.rewrite_trivia_list(&token.leading_trivia())? {
            green = green.with_leading_trivia(leading);
        }
        if let Some(trailing) = self.rewrite_trivia_list(&token.trailing_trivia())? {
            green = green.with_trailing_trivia(trailing);
        }
        Ok(green)
    }

    fn rewrite_trivia_list(&mut self, list: &SyntaxTriviaList<L>) -> Result<Option<GreenTriviaList>> {
        let mut items = Vec::with_capacity(list.len());
        let mut changed = false;
        for trivia in list.iter() {
            let original = trivia.green();
            let mut rewritten = original.clone();
            if self.into_structure && self.touches(trivia.full_span()) {
                if let Some(structure) = trivia.structure() {
                    let new = self.rewrite_structure(&structure)?;
                    if !new.ptr_eq(structure.green()) {
                        rewritten = GreenTrivia::structured(original.kind(), new, original.is_directive());
                    }
                }
            }
            let out = if self.trivia.contains(&trivia) {
                (self.on_trivia)(&trivia, rewritten)
            } else {
                vec![rewritten]
            };
            changed |= !(out.len() == 1 && &out[0] == original);
            items.extend(out);
        }
        Ok(changed.then(|| GreenTriviaList::new(items)))
    }

    fn rewrite_structure(&mut self, structure: &SyntaxNode<L>) -> Result<GreenNode> {
        let rewritten = self.rewrite_node(structure)?;
        if !self.nodes.contains(structure) {
            return Ok(rewritten);
        }
        let mut out = (self.on_node)(structure, rewritten);
        match (out.pop(), out.is_empty()) {
            (Some(green), true) => Ok(green),
            _ => Err(SyntaxError::InvalidOperation(
                "the structure of a trivia must be replaced by exactly one node",
            )),
        }
    }
}

fn is_unchanged(rewritten: &[GreenElement], original: GreenElementRef<'_>) -> bool {
    match (rewritten, original) {
        ([NodeOrToken::Node(new)], NodeOrToken::Node(old)) => new.ptr_eq(old),
        ([NodeOrToken::Token(new)], NodeOrToken::Token(old)) => new.ptr_eq(old),
        _ => false,
    }
}

/// Whether the child at `index` of `parent` is an element of a list slot.
fn is_list_element(parent: &NodeData, index: usize) -> bool {
    parent
        .green
        .locate(index)
        .map_or(false, |located| located.list_index.is_some())
}

fn check_list_element(in_list: bool) -> Result<()> {
    if in_list {
        Ok(())
    } else {
        Err(SyntaxError::InvalidOperation(
            "elements can only be inserted next to elements of a list",
        ))
    }
}

fn node_in_list<L: Language>(node: &SyntaxNode<L>) -> bool {
    match (node.data.parent(), node.data.index()) {
        (Some(parent), Some(index)) => is_list_element(parent, index as usize),
        _ => false,
    }
}

fn token_in_list<L: Language>(token: &SyntaxToken<L>) -> bool {
    is_list_element(&token.raw.parent, token.index())
}

/// The separator token removed together with `node`, and whether it comes before the node.
///
/// The separator after a list element goes with it. The last element, or one whose separator is
/// already `claimed`, takes the closest unclaimed separator before it, skipping other `removed`
/// elements.
fn list_separator<L: Language>(
    node: &SyntaxNode<L>,
    claimed: &FxHashSet<SyntaxToken<L>>,
    removed: &FxHashSet<SyntaxNode<L>>,
) -> Option<(SyntaxToken<L>, bool)> {
    let parent = node.data.parent()?;
    let index = node.data.index()? as usize;
    let located = parent.green.locate(index).ok()?;
    let mut position = located.list_index?;
    let list = parent.green.slot(located.slot)?.into_node()?;
    if position + 1 < list.slot_count() && matches!(list.slot(position + 1), Some(NodeOrToken::Token(_))) {
        let token = node.next_sibling_or_token()?.into_token()?;
        if !claimed.contains(&token) {
            return Some((token, false));
        }
    }
    let mut element = SyntaxElement::from(node.clone());
    while position > 0 {
        element = element.prev_sibling_or_token()?;
        position -= 1;
        match &element {
            NodeOrToken::Token(token) if !claimed.contains(token) => return Some((token.clone(), true)),
            NodeOrToken::Node(node) if !removed.contains(node) => return None,
            _ => {}
        }
    }
    None
}

/// The trivia of a removed range of tokens that `options` asks to keep, in document order.
fn kept_trivia<L: Language>(tokens: &[SyntaxToken<L>], options: RemoveOptions) -> Vec<GreenTrivia> {
    let keep_directives = options.contains(RemoveOptions::KEEP_DIRECTIVES);
    let last = tokens.len().saturating_sub(1);
    let mut kept = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        let keep_leading = i == 0 && options.contains(RemoveOptions::KEEP_LEADING_TRIVIA);
        let keep_trailing = i == last && options.contains(RemoveOptions::KEEP_TRAILING_TRIVIA);
        for (trivia, keep) in [(token.leading_trivia(), keep_leading), (token.trailing_trivia(), keep_trailing)] {
            kept.extend(
                trivia
                    .iter()
                    .filter(|trivia| keep || (keep_directives && trivia.is_directive()))
                    .map(|trivia| trivia.green().clone()),
            );
        }
    }
    kept
}

#[derive(Default)]
struct MovedTrivia {
    leading:  Vec<GreenTrivia>,
    trailing: Vec<GreenTrivia>,
}

impl<L: Language> SyntaxNode<L> {
    /// Returns a new tree in which `old` is replaced by `new`.
    pub fn replace_node(&self, old: &SyntaxNode<L>, new: GreenNode) -> Result<SyntaxNode<L>> {
        let mut new = Some(new);
        self.replace_nodes([old.clone()], move |_, rewritten| new.take().unwrap_or(rewritten))
    }

    /// Returns a new tree in which each of `nodes` is replaced by the result of `replacement`.
    ///
    /// `replacement` is called with the original node and its value with all nested replacements
    /// already applied.
    pub fn replace_nodes<I, F>(&self, nodes: I, mut replacement: F) -> Result<SyntaxNode<L>>
    where
        I: IntoIterator<Item = SyntaxNode<L>>,
        F: FnMut(&SyntaxNode<L>, GreenNode) -> GreenNode,
    {
        let mut rewriter = Rewriter::new(self);
        for node in nodes {
            rewriter.add_node(node)?;
        }
        rewriter.on_node = Box::new(move |node: &SyntaxNode<L>, green: GreenNode| vec![replacement(node, green)]);
        rewriter.run_single()
    }

    /// Returns a new tree in which the list element `old` is replaced by all of `new`.
    pub fn replace_node_with_many<I>(&self, old: &SyntaxNode<L>, new: I) -> Result<SyntaxNode<L>>
    where
        I: IntoIterator<Item = GreenNode>,
    {
        check_list_element(node_in_list(old))?;
        self.splice_nodes(old, new, |new, _| new)
    }

    /// Returns a new tree with `new` inserted before the list element `anchor`.
    pub fn insert_nodes_before<I>(&self, anchor: &SyntaxNode<L>, new: I) -> Result<SyntaxNode<L>>
    where
        I: IntoIterator<Item = GreenNode>,
    {
        check_list_element(node_in_list(anchor))?;
        self.splice_nodes(anchor, new, |mut new, anchor| {
            new.push(anchor);
            new
        })
    }

    /// Returns a new tree with `new` inserted after the list element `anchor`.
    pub fn insert_nodes_after<I>(&self, anchor: &SyntaxNode<L>, new: I) -> Result<SyntaxNode<L>>
    where
        I: IntoIterator<Item = GreenNode>,
    {
        check_list_element(node_in_list(anchor))?;
        self.splice_nodes(anchor, new, |new, anchor| {
            let mut out = vec![anchor];
            out.extend(new);
            out
        })
    }

    fn splice_nodes<I, C>(&self, target: &SyntaxNode<L>, new: I, combine: C) -> Result<SyntaxNode<L>>
    where
        I: IntoIterator<Item = GreenNode>,
        C: Fn(Vec<GreenNode>, GreenNode) -> Vec<GreenNode>,
    {
        let mut new = Some(new.into_iter().collect::<Vec<_>>());
        let mut rewriter = Rewriter::new(self);
        rewriter.add_node(target.clone())?;
        rewriter.on_node = Box::new(move |_: &SyntaxNode<L>, green: GreenNode| {
            combine(new.take().unwrap_or_default(), green)
        });
        rewriter.run_single()
    }

    /// Returns a new tree without `node`, or `None` if `node` is the receiver itself.
    pub fn remove_node(&self, node: &SyntaxNode<L>, options: RemoveOptions) -> Result<Option<SyntaxNode<L>>> {
        self.remove_nodes([node.clone()], options)
    }

    /// Returns a new tree without `nodes`, or `None` if the receiver is among them.
    ///
    /// Removing an element of a list also removes the separator token next to it. Trivia selected
    /// by `options` moves to the closest remaining token, see [`RemoveOptions`].
    pub fn remove_nodes<I>(&self, nodes: I, options: RemoveOptions) -> Result<Option<SyntaxNode<L>>>
    where
        I: IntoIterator<Item = SyntaxNode<L>>,
    {
        let mut rewriter = Rewriter::new(self);
        let nodes: Vec<SyntaxNode<L>> = nodes.into_iter().collect();
        for node in &nodes {
            rewriter.add_node(node.clone())?;
        }
        if nodes.contains(self) {
            return Ok(None);
        }

        // nodes inside other removed nodes go away with them
        let removed_set: FxHashSet<SyntaxNode<L>> = nodes.iter().cloned().collect();
        let mut removed: Vec<SyntaxNode<L>> = nodes
            .into_iter()
            .filter(|node| !node.ancestors_with_trivia().skip(1).any(|it| removed_set.contains(&it)))
            .collect();
        removed.sort_by_key(|node| node.position());

        let mut separators: FxHashSet<SyntaxToken<L>> = FxHashSet::default();
        let mut ranges = Vec::with_capacity(removed.len());
        for node in &removed {
            let mut tokens: Vec<SyntaxToken<L>> = node.descendant_tokens().collect();
            match list_separator(node, &separators, &removed_set) {
                Some((separator, true)) => {
                    tokens.insert(0, separator.clone());
                    separators.insert(separator);
                }
                Some((separator, false)) => {
                    tokens.push(separator.clone());
                    separators.insert(separator);
                }
                None => {}
            }
            ranges.push(tokens);
        }

        let survives = |token: &SyntaxToken<L>| {
            !separators.contains(token) && !token.ancestors_with_trivia().any(|it| removed_set.contains(&it))
        };
        let in_receiver = |token: &SyntaxToken<L>| token.ancestors_with_trivia().any(|it| &it == self);
        let mut moved: FxHashMap<SyntaxToken<L>, MovedTrivia> = FxHashMap::default();
        for tokens in &ranges {
            let kept = kept_trivia(tokens, options);
            if kept.is_empty() {
                continue;
            }
            let next = tokens.last().and_then(|last| {
                std::iter::successors(last.next_token(), SyntaxToken::next_token)
                    .take_while(in_receiver)
                    .find(survives)
            });
            if let Some(next) = next {
                moved.entry(next).or_default().leading.extend(kept);
                continue;
            }
            let prev = tokens.first().and_then(|first| {
                std::iter::successors(first.prev_token(), SyntaxToken::prev_token)
                    .take_while(in_receiver)
                    .find(survives)
            });
            if let Some(prev) = prev {
                moved.entry(prev).or_default().trailing.extend(kept);
            }
        }
        tracing::debug!(
            removed = removed.len(),
            separators = separators.len(),
            moved = moved.len(),
            "removing nodes"
        );

        for separator in &separators {
            rewriter.add_token(separator.clone())?;
        }
        for token in moved.keys() {
            rewriter.add_token(token.clone())?;
        }
        rewriter.on_node = Box::new(|_: &SyntaxNode<L>, _: GreenNode| Vec::new());
        rewriter.on_token = Box::new(move |token: &SyntaxToken<L>, green: GreenToken| {
            if separators.contains(token) {
                return Vec::new();
            }
            let Some(trivia) = moved.remove(token) else {
                return vec![green];
            };
            let mut green = green;
            if !trivia.leading.is_empty() {
                let leading = trivia.leading.into_iter().chain(green.leading_trivia().iter().cloned());
                green = green.with_leading_trivia(leading.collect());
            }
            if !trivia.trailing.is_empty() {
                let trailing = green.trailing_trivia().iter().cloned().chain(trivia.trailing);
                green = green.with_trailing_trivia(trailing.collect());
            }
            vec![green]
        });
        rewriter.run_single().map(Some)
    }

    /// Returns a new tree in which `old` is replaced by `new`.
    pub fn replace_token(&self, old: &SyntaxToken<L>, new: GreenToken) -> Result<SyntaxNode<L>> {
        let mut new = Some(new);
        self.replace_tokens([old.clone()], move |_, rewritten| new.take().unwrap_or(rewritten))
    }

    /// Returns a new tree in which each of `tokens` is replaced by the result of `replacement`.
    pub fn replace_tokens<I, F>(&self, tokens: I, mut replacement: F) -> Result<SyntaxNode<L>>
    where
        I: IntoIterator<Item = SyntaxToken<L>>,
        F: FnMut(&SyntaxToken<L>, GreenToken) -> GreenToken,
    {
        let mut rewriter = Rewriter::new(self);
        for token in tokens {
            rewriter.add_token(token)?;
        }
        rewriter.on_token = Box::new(move |token: &SyntaxToken<L>, green: GreenToken| vec![replacement(token, green)]);
        rewriter.run_single()
    }

    /// Returns a new tree in which the list element `old` is replaced by all of `new`.
    pub fn replace_token_with_many<I>(&self, old: &SyntaxToken<L>, new: I) -> Result<SyntaxNode<L>>
    where
        I: IntoIterator<Item = GreenToken>,
    {
        check_list_element(token_in_list(old))?;
        self.splice_tokens(old, new, |new, _| new)
    }

    /// Returns a new tree with `new` inserted before the list element `anchor`.
    pub fn insert_tokens_before<I>(&self, anchor: &SyntaxToken<L>, new: I) -> Result<SyntaxNode<L>>
    where
        I: IntoIterator<Item = GreenToken>,
    {
        check_list_element(token_in_list(anchor))?;
        self.splice_tokens(anchor, new, |mut new, anchor| {
            new.push(anchor);
            new
        })
    }

    /// Returns a new tree with `new` inserted after the list element `anchor`.
    pub fn insert_tokens_after<I>(&self, anchor: &SyntaxToken<L>, new: I) -> Result<SyntaxNode<L>>
    where
        I: IntoIterator<Item = GreenToken>,
    {
        check_list_element(token_in_list(anchor))?;
        self.splice_tokens(anchor, new, |new, anchor| {
            let mut out = vec![anchor];
            out.extend(new);
            out
        })
    }

    fn splice_tokens<I, C>(&self, target: &SyntaxToken<L>, new: I, combine: C) -> Result<SyntaxNode<L>>
    where
        I: IntoIterator<Item = GreenToken>,
        C: Fn(Vec<GreenToken>, GreenToken) -> Vec<GreenToken>,
    {
        let mut new = Some(new.into_iter().collect::<Vec<_>>());
        let mut rewriter = Rewriter::new(self);
        rewriter.add_token(target.clone())?;
        rewriter.on_token = Box::new(move |_: &SyntaxToken<L>, green: GreenToken| {
            combine(new.take().unwrap_or_default(), green)
        });
        rewriter.run_single()
    }

    /// Returns a new tree in which each of `trivia` is replaced by the result of `replacement`.
    pub fn replace_trivia<I, F>(&self, trivia: I, mut replacement: F) -> Result<SyntaxNode<L>>
    where
        I: IntoIterator<Item = SyntaxTrivia<L>>,
        F: FnMut(&SyntaxTrivia<L>, GreenTrivia) -> GreenTrivia,
    {
        let mut rewriter = Rewriter::new(self);
        for trivia in trivia {
            rewriter.add_trivia(trivia)?;
        }
        rewriter.on_trivia = Box::new(move |trivia: &SyntaxTrivia<L>, green: GreenTrivia| {
            vec![replacement(trivia, green)]
        });
        rewriter.run_single()
    }

    /// Returns a new tree in which `old` is replaced by all of `new`, which may be empty.
    pub fn replace_trivia_with_many<I>(&self, old: &SyntaxTrivia<L>, new: I) -> Result<SyntaxNode<L>>
    where
        I: IntoIterator<Item = GreenTrivia>,
    {
        self.splice_trivia(old, new, |new, _| new)
    }

    /// Returns a new tree with `new` inserted before `anchor`, in the same trivia list.
    pub fn insert_trivia_before<I>(&self, anchor: &SyntaxTrivia<L>, new: I) -> Result<SyntaxNode<L>>
    where
        I: IntoIterator<Item = GreenTrivia>,
    {
        self.splice_trivia(anchor, new, |mut new, anchor| {
            new.push(anchor);
            new
        })
    }

    /// Returns a new tree with `new` inserted after `anchor`, in the same trivia list.
    pub fn insert_trivia_after<I>(&self, anchor: &SyntaxTrivia<L>, new: I) -> Result<SyntaxNode<L>>
    where
        I: IntoIterator<Item = GreenTrivia>,
    {
        self.splice_trivia(anchor, new, |new, anchor| {
            let mut out = vec![anchor];
            out.extend(new);
            out
        })
    }

    fn splice_trivia<I, C>(&self, target: &SyntaxTrivia<L>, new: I, combine: C) -> Result<SyntaxNode<L>>
    where
        I: IntoIterator<Item = GreenTrivia>,
        C: Fn(Vec<GreenTrivia>, GreenTrivia) -> Vec<GreenTrivia>,
    {
        let mut new = Some(new.into_iter().collect::<Vec<_>>());
        let mut rewriter = Rewriter::new(self);
        rewriter.add_trivia(target.clone())?;
        rewriter.on_trivia = Box::new(move |_: &SyntaxTrivia<L>, green: GreenTrivia| {
            combine(new.take().unwrap_or_default(), green)
        });
        rewriter.run_single()
    }

    /// Returns a new tree in which the leading trivia of this node's first token is `trivia`.
    /// A node without tokens is returned unchanged, as the root of a new tree.
    pub fn with_leading_trivia<I>(&self, trivia: I) -> Result<SyntaxNode<L>>
    where
        I: IntoIterator<Item = GreenTrivia>,
    {
        let list: GreenTriviaList = trivia.into_iter().collect();
        match self.first_token() {
            Some(token) => self.replace_tokens([token], move |_, green| green.with_leading_trivia(list.clone())),
            None => Ok(SyntaxNode::new_root(self.green().clone(), self.interner().clone())),
        }
    }

    /// Returns a new tree in which the trailing trivia of this node's last token is `trivia`.
    /// A node without tokens is returned unchanged, as the root of a new tree.
    pub fn with_trailing_trivia<I>(&self, trivia: I) -> Result<SyntaxNode<L>>
    where
        I: IntoIterator<Item = GreenTrivia>,
    {
        let list: GreenTriviaList = trivia.into_iter().collect();
        match self.last_token() {
            Some(token) => self.replace_tokens([token], move |_, green| green.with_trailing_trivia(list.clone())),
            None => Ok(SyntaxNode::new_root(self.green().clone(), self.interner().clone())),
        }
    }

    /// This node with `annotations` attached, as the root of a new tree.
    pub fn with_annotations<I>(&self, annotations: I) -> SyntaxNode<L>
    where
        I: IntoIterator<Item = SyntaxAnnotation>,
    {
        SyntaxNode::new_root(self.green().with_annotations(annotations), self.interner().clone())
    }
}
