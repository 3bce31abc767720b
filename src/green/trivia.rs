use std::{fmt, slice, sync::Arc};

use crate::{
    green::{GreenNode, NodeFlags},
    interning::{TokenInterner, TokenKey},
    RawSyntaxKind, TextSize,
};

/// A piece of trivia attached to a [`GreenToken`](crate::GreenToken).
///
/// Trivia either carries text (whitespace, comments) or a structure: a complete value tree that
/// represents e.g. a directive.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GreenTrivia {
    kind:  RawSyntaxKind,
    width: TextSize,
    repr:  TriviaRepr,
}

#[derive(Clone, PartialEq, Eq, Hash)]
enum TriviaRepr {
    Text(TokenKey),
    Structured { structure: GreenNode, directive: bool },
}

impl GreenTrivia {
    /// Creates text trivia, interning `text`.
    pub fn new(interner: &TokenInterner, kind: RawSyntaxKind, text: &str) -> Self {
        Self::from_key(kind, interner.get_or_intern(text), TextSize::of(text))
    }

    /// Creates text trivia from an already interned string of length `width`.
    pub fn from_key(kind: RawSyntaxKind, text: TokenKey, width: TextSize) -> Self {
        Self {
            kind,
            width,
            repr: TriviaRepr::Text(text),
        }
    }

    /// Creates structured trivia. The trivia covers the full text of `structure`.
    pub fn structured(kind: RawSyntaxKind, structure: GreenNode, directive: bool) -> Self {
        Self {
            kind,
            width: structure.full_width(),
            repr: TriviaRepr::Structured { structure, directive },
        }
    }

    #[inline]
    pub fn kind(&self) -> RawSyntaxKind {
        self.kind
    }

    /// The length of text covered by this trivia.
    #[inline]
    pub fn full_width(&self) -> TextSize {
        self.width
    }

    /// The interned text of text trivia, `None` for structured trivia.
    #[inline]
    pub fn text_key(&self) -> Option<TokenKey> {
        match &self.repr {
            TriviaRepr::Text(key) => Some(*key),
            TriviaRepr::Structured { .. } => None,
        }
    }

    #[inline]
    pub fn structure(&self) -> Option<&GreenNode> {
        match &self.repr {
            TriviaRepr::Text(_) => None,
            TriviaRepr::Structured { structure, .. } => Some(structure),
        }
    }

    #[inline]
    pub fn has_structure(&self) -> bool {
        matches!(self.repr, TriviaRepr::Structured { .. })
    }

    #[inline]
    pub fn is_directive(&self) -> bool {
        matches!(self.repr, TriviaRepr::Structured { directive: true, .. })
    }

    pub fn flags(&self) -> NodeFlags {
        match &self.repr {
            TriviaRepr::Text(_) => NodeFlags::empty(),
            TriviaRepr::Structured { structure, directive } => {
                let mut flags = NodeFlags::CONTAINS_STRUCTURED_TRIVIA | (structure.flags() & NodeFlags::INHERITED);
                flags.set(NodeFlags::CONTAINS_DIRECTIVES, *directive);
                flags
            }
        }
    }

    /// Appends the text of this trivia to `out`.
    pub fn write_text(&self, interner: &TokenInterner, out: &mut String) {
        match &self.repr {
            TriviaRepr::Text(key) => out.push_str(interner.resolve(*key)),
            TriviaRepr::Structured { structure, .. } => structure.write_full_text(interner, out),
        }
    }

    pub fn to_string(&self, interner: &TokenInterner) -> String {
        let mut text = String::new();
        self.write_text(interner, &mut text);
        text
    }
}

impl fmt::Debug for GreenTrivia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("GreenTrivia");
        debug.field("kind", &self.kind).field("width", &self.width);
        match &self.repr {
            TriviaRepr::Text(key) => debug.field("text", key),
            TriviaRepr::Structured { structure, .. } => debug.field("structure", structure),
        };
        debug.finish()
    }
}

/// The leading or trailing trivia of a token.
///
/// Empty lists do not allocate.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct GreenTriviaList {
    items: Option<Arc<[GreenTrivia]>>,
    width: TextSize,
    flags: NodeFlags,
}

impl GreenTriviaList {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new<I>(trivia: I) -> Self
    where
        I: IntoIterator<Item = GreenTrivia>,
    {
        let items: Arc<[GreenTrivia]> = trivia.into_iter().collect();
        if items.is_empty() {
            return Self::empty();
        }
        let mut width = TextSize::from(0);
        let mut flags = NodeFlags::empty();
        for trivia in items.iter() {
            width += trivia.full_width();
            flags |= trivia.flags();
        }
        Self {
            items: Some(items),
            width,
            flags,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_none()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&GreenTrivia> {
        self.as_slice().get(index)
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, GreenTrivia> {
        self.as_slice().iter()
    }

    #[inline]
    pub fn as_slice(&self) -> &[GreenTrivia] {
        self.items.as_deref().unwrap_or(&[])
    }

    /// The combined length of all trivia in this list.
    #[inline]
    pub fn full_width(&self) -> TextSize {
        self.width
    }

    #[inline]
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    /// The list with the trivia at `range` replaced by `replacement`.
    pub(crate) fn splice<I>(&self, range: std::ops::Range<usize>, replacement: I) -> Self
    where
        I: IntoIterator<Item = GreenTrivia>,
    {
        let mut items = self.as_slice().to_vec();
        items.splice(range, replacement);
        Self::new(items)
    }

    pub fn write_text(&self, interner: &TokenInterner, out: &mut String) {
        for trivia in self.iter() {
            trivia.write_text(interner, out);
        }
    }
}

impl FromIterator<GreenTrivia> for GreenTriviaList {
    fn from_iter<T: IntoIterator<Item = GreenTrivia>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a GreenTriviaList {
    type IntoIter = slice::Iter<'a, GreenTrivia>;
    type Item = &'a GreenTrivia;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for GreenTriviaList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
