use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use bitflags::bitflags;
use fxhash::FxHasher32;

use crate::{
    annotation::{Diagnostic, SyntaxAnnotation},
    error::{Result, SyntaxError},
    green::{attachments::Attachments, GreenElement, GreenElementRef, GreenNodeChildren, GreenToken},
    interning::TokenInterner,
    NodeOrToken, RawSyntaxKind, TextSize,
};

bitflags! {
    /// Summary bits of a value node, a token or a trivia list.
    ///
    /// The `CONTAINS_*` bits describe the element and everything below it, including the inside of
    /// structured trivia.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u8 {
        const CONTAINS_DIAGNOSTICS       = 1 << 0;
        const CONTAINS_DIRECTIVES        = 1 << 1;
        const CONTAINS_STRUCTURED_TRIVIA = 1 << 2;
        const CONTAINS_ANNOTATIONS       = 1 << 3;
        const IS_MISSING                 = 1 << 4;
        const IS_LIST                    = 1 << 5;

        /// The bits a node inherits from its children.
        const INHERITED = Self::CONTAINS_DIAGNOSTICS.bits()
            | Self::CONTAINS_DIRECTIVES.bits()
            | Self::CONTAINS_STRUCTURED_TRIVIA.bits()
            | Self::CONTAINS_ANNOTATIONS.bits();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) struct GreenNodeHead {
    pub(super) kind:        RawSyntaxKind,
    pub(super) full_width:  TextSize,
    pub(super) flags:       NodeFlags,
    pub(super) child_hash:  u32,
    pub(super) child_count: u32,
}

impl GreenNodeHead {
    /// Computes the head of a node with the given slots without allocating it.
    pub(super) fn measure(kind: RawSyntaxKind, slots: &[Option<GreenElement>], attachments: Option<&Attachments>) -> Self {
        let mut hasher = FxHasher32::default();
        let mut full_width = TextSize::from(0);
        let mut flags = Attachments::flags(attachments);
        let mut child_count = 0_u32;
        let mut any_present = false;
        let mut all_missing = true;
        for slot in slots {
            slot.hash(&mut hasher);
            if let Some(element) = slot {
                full_width += element.full_width();
                flags |= element.flags() & NodeFlags::INHERITED;
                child_count += match element {
                    NodeOrToken::Node(node) if node.is_list() => node.slot_count() as u32,
                    _ => 1,
                };
                any_present = true;
                all_missing &= element.is_missing();
            }
        }
        let is_list = kind == RawSyntaxKind::LIST;
        flags.set(NodeFlags::IS_LIST, is_list);
        flags.set(NodeFlags::IS_MISSING, !is_list && any_present && all_missing);
        Self {
            kind,
            full_width,
            flags,
            child_hash: hasher.finish() as u32,
            child_count,
        }
    }
}

pub(super) struct GreenNodeData {
    pub(super) head:        GreenNodeHead,
    pub(super) slots:       Box<[Option<GreenElement>]>,
    pub(super) attachments: Option<Box<Attachments>>,
}

/// Internal node in the immutable "green" tree.
///
/// A node has a fixed number of slots. Each slot is empty, holds a single child, or holds a list
/// node whose own slots are the children of a repeated construct. Children are addressed either by
/// slot or by their flattened index, in which list slots are expanded in place.
#[derive(Clone)]
pub struct GreenNode {
    pub(super) data: Arc<GreenNodeData>,
}

/// A child of a [`GreenNode`], found by its flattened index.
#[derive(Debug, Clone, Copy)]
pub struct LocatedChild<'a> {
    pub element:    GreenElementRef<'a>,
    /// The slot that holds the child.
    pub slot:       usize,
    /// The child's position inside the slot, if the slot is a list.
    pub list_index: Option<usize>,
    /// Start of the child's full span, relative to the start of the node.
    pub offset:     TextSize,
}

impl GreenNode {
    /// Creates a new node whose slots are all occupied by `children`.
    #[inline]
    pub fn new<I>(kind: RawSyntaxKind, children: I) -> GreenNode
    where
        I: IntoIterator<Item = GreenElement>,
    {
        Self::with_slots(kind, children.into_iter().map(Some))
    }

    /// Creates a new node from slots, any of which may be empty.
    pub fn with_slots<I>(kind: RawSyntaxKind, slots: I) -> GreenNode
    where
        I: IntoIterator<Item = Option<GreenElement>>,
    {
        Self::from_slots(kind, slots.into_iter().collect(), None)
    }

    /// Creates a list node holding `children`, even if there is only one or none.
    pub fn list<I>(children: I) -> GreenNode
    where
        I: IntoIterator<Item = GreenElement>,
    {
        let slots: Vec<_> = children.into_iter().map(Some).collect();
        debug_assert!(
            slots.iter().flatten().all(|child| !child.is_list()),
            "lists cannot be nested in lists"
        );
        Self::from_slots(RawSyntaxKind::LIST, slots, None)
    }

    /// Creates the value of a list slot from `children`.
    ///
    /// No children yield an empty slot, a single node is used as is, and everything else becomes
    /// a list node. A single token is always wrapped, so that a token slot is never mistaken for a
    /// one-element list and vice versa.
    pub fn create_list<I>(children: I) -> Option<GreenNode>
    where
        I: IntoIterator<Item = GreenElement>,
    {
        let mut children: Vec<GreenElement> = children.into_iter().collect();
        match children.len() {
            0 => None,
            1 if children[0].as_node().map_or(false, |node| !node.is_list()) => children.pop()?.into_node(),
            _ => Some(Self::list(children)),
        }
    }

    pub(super) fn from_slots(
        kind: RawSyntaxKind,
        slots: Vec<Option<GreenElement>>,
        attachments: Option<Box<Attachments>>,
    ) -> GreenNode {
        let head = GreenNodeHead::measure(kind, &slots, attachments.as_deref());
        Self::from_head(head, slots, attachments)
    }

    pub(super) fn from_head(
        head: GreenNodeHead,
        slots: Vec<Option<GreenElement>>,
        attachments: Option<Box<Attachments>>,
    ) -> GreenNode {
        GreenNode {
            data: Arc::new(GreenNodeData {
                head,
                slots: slots.into_boxed_slice(),
                attachments,
            }),
        }
    }

    /// Raw kind of this node. List nodes have kind [`RawSyntaxKind::LIST`].
    #[inline]
    pub fn kind(&self) -> RawSyntaxKind {
        self.data.head.kind
    }

    /// Length of the text covered by this node, including all trivia.
    #[inline]
    pub fn full_width(&self) -> TextSize {
        self.data.head.full_width
    }

    /// Length of the text covered by this node, without the leading trivia of its first token and
    /// the trailing trivia of its last token.
    pub fn width(&self) -> TextSize {
        self.full_width() - self.leading_trivia_width() - self.trailing_trivia_width()
    }

    pub fn leading_trivia_width(&self) -> TextSize {
        self.first_terminal()
            .map_or(0.into(), |token| token.leading_trivia().full_width())
    }

    pub fn trailing_trivia_width(&self) -> TextSize {
        self.last_terminal()
            .map_or(0.into(), |token| token.trailing_trivia().full_width())
    }

    /// The first token with a non-zero width, if any.
    pub(crate) fn first_terminal(&self) -> Option<&GreenToken> {
        let mut node = self;
        loop {
            let child = node.slots().flatten().find(|child| child.full_width() > 0.into())?;
            match child {
                NodeOrToken::Node(next) => node = next,
                NodeOrToken::Token(token) => return Some(token),
            }
        }
    }

    /// The last token with a non-zero width, if any.
    pub(crate) fn last_terminal(&self) -> Option<&GreenToken> {
        let mut node = self;
        loop {
            let child = node.slots().rev().flatten().find(|child| child.full_width() > 0.into())?;
            match child {
                NodeOrToken::Node(next) => node = next,
                NodeOrToken::Token(token) => return Some(token),
            }
        }
    }

    #[inline]
    pub fn flags(&self) -> NodeFlags {
        self.data.head.flags
    }

    #[inline]
    pub fn is_list(&self) -> bool {
        self.flags().contains(NodeFlags::IS_LIST)
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        self.flags().contains(NodeFlags::IS_MISSING)
    }

    #[inline]
    pub fn contains_diagnostics(&self) -> bool {
        self.flags().contains(NodeFlags::CONTAINS_DIAGNOSTICS)
    }

    #[inline]
    pub fn contains_directives(&self) -> bool {
        self.flags().contains(NodeFlags::CONTAINS_DIRECTIVES)
    }

    #[inline]
    pub fn contains_structured_trivia(&self) -> bool {
        self.flags().contains(NodeFlags::CONTAINS_STRUCTURED_TRIVIA)
    }

    #[inline]
    pub fn contains_annotations(&self) -> bool {
        self.flags().contains(NodeFlags::CONTAINS_ANNOTATIONS)
    }

    /// Number of slots of this node, counting empty slots and counting each list slot once.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.data.slots.len()
    }

    /// The element in slot `index`, `None` if the slot is empty.
    ///
    /// ## Panics
    /// If `index` is not less than [`slot_count`](GreenNode::slot_count).
    #[inline]
    pub fn slot(&self, index: usize) -> Option<GreenElementRef<'_>> {
        self.data.slots[index].as_ref().map(GreenElement::as_ref)
    }

    /// Iterator over all slots of this node.
    #[inline]
    pub fn slots(&self) -> impl DoubleEndedIterator<Item = Option<GreenElementRef<'_>>> + ExactSizeIterator + '_ {
        self.data.slots.iter().map(|slot| slot.as_ref().map(GreenElement::as_ref))
    }

    /// Start of slot `index` relative to the start of this node.
    pub fn slot_offset(&self, index: usize) -> TextSize {
        debug_assert!(index <= self.slot_count(), "slot {index} is out of range");
        self.data.slots[..index]
            .iter()
            .flatten()
            .map(GreenElement::full_width)
            .sum()
    }

    /// Number of children with list slots flattened: an occupied slot counts once, a list slot
    /// counts as many times as the list has elements and an empty slot does not count.
    #[inline]
    pub fn child_count(&self) -> usize {
        self.data.head.child_count as usize
    }

    /// Iterator over all children of this node, with list slots flattened.
    #[inline]
    pub fn children(&self) -> GreenNodeChildren<'_> {
        GreenNodeChildren::new(&self.data.slots, self.child_count())
    }

    /// Finds the child at flattened `index`.
    pub fn locate(&self, index: usize) -> Result<LocatedChild<'_>> {
        SyntaxError::check_index(index, self.child_count())?;
        let mut remaining = index;
        let mut offset = TextSize::from(0);
        for (slot, element) in self.data.slots.iter().enumerate() {
            let Some(element) = element else { continue };
            match element {
                NodeOrToken::Node(list) if list.is_list() => {
                    if remaining < list.slot_count() {
                        let inner = list.slot(remaining);
                        debug_assert!(inner.is_some(), "list elements cannot be empty");
                        if let Some(inner) = inner {
                            return Ok(LocatedChild {
                                element: inner,
                                slot,
                                list_index: Some(remaining),
                                offset: offset + list.slot_offset(remaining),
                            });
                        }
                    }
                    remaining -= list.slot_count();
                }
                _ => {
                    if remaining == 0 {
                        return Ok(LocatedChild {
                            element: element.as_ref(),
                            slot,
                            list_index: None,
                            offset,
                        });
                    }
                    remaining -= 1;
                }
            }
            offset += element.full_width();
        }
        Err(SyntaxError::IndexOutOfRange {
            index,
            len: self.child_count(),
        })
    }

    /// Flattened index of the first child held by slot `slot`.
    pub fn slot_child_index(&self, slot: usize) -> usize {
        self.data.slots[..slot]
            .iter()
            .flatten()
            .map(|element| match element {
                NodeOrToken::Node(node) if node.is_list() => node.slot_count(),
                _ => 1,
            })
            .sum()
    }

    /// A copy of this node with slot `index` replaced.
    pub fn with_slot(&self, index: usize, element: Option<GreenElement>) -> GreenNode {
        let mut slots = self.data.slots.to_vec();
        slots[index] = element;
        Self::from_slots(self.kind(), slots, self.data.attachments.clone())
    }

    /// A copy of this node with the child at flattened `index` replaced.
    pub fn with_child(&self, index: usize, element: GreenElement) -> Result<GreenNode> {
        let located = self.locate(index)?;
        Ok(match (located.list_index, &self.data.slots[located.slot]) {
            (Some(position), Some(NodeOrToken::Node(list))) => {
                let list = list.with_slot(position, Some(element));
                self.with_slot(located.slot, Some(list.into()))
            }
            _ => self.with_slot(located.slot, Some(element)),
        })
    }

    pub(crate) fn replace_slots(&self, slots: Vec<Option<GreenElement>>) -> GreenNode {
        Self::from_slots(self.kind(), slots, self.data.attachments.clone())
    }

    pub fn annotations(&self) -> &[SyntaxAnnotation] {
        Attachments::annotations(self.data.attachments.as_deref())
    }

    pub fn has_annotation(&self, annotation: &SyntaxAnnotation) -> bool {
        self.annotations().contains(annotation)
    }

    pub fn has_annotations(&self) -> bool {
        !self.annotations().is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        Attachments::diagnostics(self.data.attachments.as_deref())
    }

    /// A copy of this node that additionally carries `annotations`.
    pub fn with_annotations<I>(&self, annotations: I) -> GreenNode
    where
        I: IntoIterator<Item = SyntaxAnnotation>,
    {
        let attachments = Attachments::with_annotations(self.data.attachments.as_deref(), annotations);
        Self::from_slots(self.kind(), self.data.slots.to_vec(), attachments)
    }

    pub fn without_annotations(&self, annotations: &[SyntaxAnnotation]) -> GreenNode {
        let attachments = Attachments::without_annotations(self.data.attachments.as_deref(), annotations);
        Self::from_slots(self.kind(), self.data.slots.to_vec(), attachments)
    }

    pub fn with_diagnostics<I>(&self, diagnostics: I) -> GreenNode
    where
        I: IntoIterator<Item = Diagnostic>,
    {
        let attachments = Attachments::with_diagnostics(self.data.attachments.as_deref(), diagnostics);
        Self::from_slots(self.kind(), self.data.slots.to_vec(), attachments)
    }

    /// Appends the full text of this node, including all trivia, to `out`.
    pub fn write_full_text(&self, interner: &TokenInterner, out: &mut String) {
        for child in self.children() {
            match child {
                NodeOrToken::Node(node) => node.write_full_text(interner, out),
                NodeOrToken::Token(token) => token.write_full_text(interner, out),
            }
        }
    }

    pub fn to_full_string(&self, interner: &TokenInterner) -> String {
        let mut text = String::with_capacity(u32::from(self.full_width()) as usize);
        self.write_full_text(interner, &mut text);
        text
    }

    /// Whether both handles point to the same allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &GreenNode) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *const () {
        Arc::as_ptr(&self.data).cast()
    }
}

impl fmt::Debug for GreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenNode")
            .field("kind", &self.kind())
            .field("full_width", &self.full_width())
            .field("slots", &self.data.slots)
            .finish()
    }
}

impl Hash for GreenNode {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.head.hash(state);
    }
}

impl PartialEq for GreenNode {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.data.head == other.data.head
                && self.data.slots == other.data.slots
                && self.data.attachments == other.data.attachments)
    }
}

impl Eq for GreenNode {}
