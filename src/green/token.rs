use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::{
    annotation::{Diagnostic, SyntaxAnnotation},
    green::{attachments::Attachments, GreenTriviaList, NodeFlags},
    interning::{TokenInterner, TokenKey},
    RawSyntaxKind, TextSize,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct GreenTokenData {
    pub(super) kind:        RawSyntaxKind,
    pub(super) text:        Option<TokenKey>,
    pub(super) value:       Option<TokenKey>,
    pub(super) text_len:    TextSize,
    pub(super) leading:     GreenTriviaList,
    pub(super) trailing:    GreenTriviaList,
    pub(super) missing:     bool,
    pub(super) attachments: Option<Box<Attachments>>,
}

impl Hash for GreenTokenData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.text.hash(state);
        self.value.hash(state);
        self.leading.hash(state);
        self.trailing.hash(state);
        self.missing.hash(state);
    }
}

impl GreenTokenData {
    pub(super) fn new(kind: RawSyntaxKind, text: Option<TokenKey>, text_len: TextSize) -> Self {
        Self {
            kind,
            text,
            value: None,
            text_len,
            leading: GreenTriviaList::empty(),
            trailing: GreenTriviaList::empty(),
            missing: false,
            attachments: None,
        }
    }
}

/// Leaf node in the immutable "green" tree.
///
/// Besides its own text, a token owns the trivia before and after it. Its full width covers both.
#[derive(Clone)]
pub struct GreenToken {
    data:  Arc<GreenTokenData>,
    flags: NodeFlags,
}

impl GreenToken {
    /// Creates a token without trivia, interning `text`.
    pub fn new(interner: &TokenInterner, kind: RawSyntaxKind, text: &str) -> GreenToken {
        let key = if text.is_empty() {
            None
        } else {
            Some(interner.get_or_intern(text))
        };
        Self::from_data(GreenTokenData::new(kind, key, TextSize::of(text)))
    }

    /// Creates a zero-width token that stands in for one the source did not contain.
    pub fn missing(kind: RawSyntaxKind) -> GreenToken {
        let mut data = GreenTokenData::new(kind, None, 0.into());
        data.missing = true;
        Self::from_data(data)
    }

    pub(super) fn from_data(data: GreenTokenData) -> GreenToken {
        let mut flags = data.leading.flags() | data.trailing.flags() | Attachments::flags(data.attachments.as_deref());
        flags.set(NodeFlags::IS_MISSING, data.missing);
        GreenToken {
            data: Arc::new(data),
            flags,
        }
    }

    fn map_data(&self, f: impl FnOnce(&mut GreenTokenData)) -> GreenToken {
        let mut data = (*self.data).clone();
        f(&mut data);
        Self::from_data(data)
    }

    /// Raw kind of this token.
    #[inline]
    pub fn kind(&self) -> RawSyntaxKind {
        self.data.kind
    }

    /// The interned key of this token's text, `None` if the token has no text.
    #[inline]
    pub fn text_key(&self) -> Option<TokenKey> {
        self.data.text
    }

    /// The source text of this token, without trivia.
    #[inline]
    pub fn text<'i>(&self, interner: &'i TokenInterner) -> &'i str {
        self.data.text.map_or("", |key| interner.resolve(key))
    }

    /// The decoded value of this token if it differs from its source text, e.g. for escaped
    /// identifiers or string literals. Falls back to the source text.
    #[inline]
    pub fn value_text<'i>(&self, interner: &'i TokenInterner) -> &'i str {
        match self.data.value {
            Some(key) => interner.resolve(key),
            None => self.text(interner),
        }
    }

    #[inline]
    pub fn value_key(&self) -> Option<TokenKey> {
        self.data.value
    }

    /// Length of this token's text, without trivia.
    #[inline]
    pub fn width(&self) -> TextSize {
        self.data.text_len
    }

    /// Length of this token's text including its leading and trailing trivia.
    #[inline]
    pub fn full_width(&self) -> TextSize {
        self.data.leading.full_width() + self.data.text_len + self.data.trailing.full_width()
    }

    #[inline]
    pub fn leading_trivia(&self) -> &GreenTriviaList {
        &self.data.leading
    }

    #[inline]
    pub fn trailing_trivia(&self) -> &GreenTriviaList {
        &self.data.trailing
    }

    #[inline]
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        self.data.missing
    }

    #[inline]
    pub fn has_structured_trivia(&self) -> bool {
        self.flags.contains(NodeFlags::CONTAINS_STRUCTURED_TRIVIA)
    }

    pub fn with_leading_trivia(&self, trivia: GreenTriviaList) -> GreenToken {
        self.map_data(|data| data.leading = trivia)
    }

    pub fn with_trailing_trivia(&self, trivia: GreenTriviaList) -> GreenToken {
        self.map_data(|data| data.trailing = trivia)
    }

    pub fn with_value(&self, value: Option<TokenKey>) -> GreenToken {
        self.map_data(|data| data.value = value)
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

    pub fn with_annotations<I>(&self, annotations: I) -> GreenToken
    where
        I: IntoIterator<Item = SyntaxAnnotation>,
    {
        self.map_data(|data| data.attachments = Attachments::with_annotations(data.attachments.as_deref(), annotations))
    }

    pub fn without_annotations(&self, annotations: &[SyntaxAnnotation]) -> GreenToken {
        self.map_data(|data| data.attachments = Attachments::without_annotations(data.attachments.as_deref(), annotations))
    }

    pub fn with_diagnostics<I>(&self, diagnostics: I) -> GreenToken
    where
        I: IntoIterator<Item = Diagnostic>,
    {
        self.map_data(|data| data.attachments = Attachments::with_diagnostics(data.attachments.as_deref(), diagnostics))
    }

    /// Appends the full text of this token, including trivia, to `out`.
    pub fn write_full_text(&self, interner: &TokenInterner, out: &mut String) {
        self.data.leading.write_text(interner, out);
        out.push_str(self.text(interner));
        self.data.trailing.write_text(interner, out);
    }

    #[inline]
    pub fn ptr_eq(&self, other: &GreenToken) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for GreenToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenToken")
            .field("kind", &self.data.kind)
            .field("text", &self.data.text)
            .field("leading", &self.data.leading)
            .field("trailing", &self.data.trailing)
            .finish()
    }
}

impl Eq for GreenToken {}
impl PartialEq for GreenToken {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.data == other.data
    }
}

impl Hash for GreenToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.hash(state)
    }
}
