use std::{
    fmt,
    hash::{Hash, Hasher},
    iter::FusedIterator,
    marker::PhantomData,
};

use text_size::{TextRange, TextSize};

use crate::{
    green::{GreenTrivia, GreenTriviaList},
    syntax::{node::NodeData, token::RawToken, SyntaxNode, SyntaxToken},
    GreenNode, GreenToken, Language, RawSyntaxKind,
};

/// A trivia together with the token it belongs to and its absolute position.
#[derive(Clone)]
pub(crate) struct RawTrivia {
    pub(crate) token:    RawToken,
    pub(crate) trailing: bool,
    pub(crate) index:    u32,
    pub(crate) offset:   TextSize,
}

impl RawTrivia {
    /// The trivia at `index` in the leading or trailing trivia of `token`.
    pub(crate) fn nth(token: &RawToken, trailing: bool, index: usize) -> Option<RawTrivia> {
        let list = trivia_list(&token.green, trailing);
        if index >= list.len() {
            return None;
        }
        let before = list.iter().take(index).map(GreenTrivia::full_width).sum::<TextSize>();
        Some(RawTrivia {
            token: token.clone(),
            trailing,
            index: index as u32,
            offset: start_of(token, trailing) + before,
        })
    }

    #[inline]
    pub(crate) fn list(&self) -> &GreenTriviaList {
        trivia_list(&self.token.green, self.trailing)
    }

    #[inline]
    pub(crate) fn green(&self) -> &GreenTrivia {
        &self.list().as_slice()[self.index as usize]
    }

    #[inline]
    pub(crate) fn full_span(&self) -> TextRange {
        TextRange::at(self.offset, self.green().full_width())
    }

    #[inline]
    pub(crate) fn same(&self, other: &RawTrivia) -> bool {
        self.index == other.index && self.trailing == other.trailing && self.token.same(&other.token)
    }

    /// This trivia's token with the trivia replaced by `replacement`, which may be empty.
    pub(crate) fn token_with<I>(&self, replacement: I) -> GreenToken
    where
        I: IntoIterator<Item = GreenTrivia>,
    {
        let index = self.index as usize;
        let list = self.list().splice(index..index + 1, replacement);
        with_trivia_list(&self.token.green, self.trailing, list)
    }

    /// This trivia's token with the structure of the trivia replaced.
    pub(crate) fn with_structure(&self, structure: GreenNode) -> GreenToken {
        let green = self.green();
        let trivia = GreenTrivia::structured(green.kind(), structure, green.is_directive());
        self.token_with([trivia])
    }
}

#[inline]
pub(crate) fn trivia_list(token: &GreenToken, trailing: bool) -> &GreenTriviaList {
    if trailing {
        token.trailing_trivia()
    } else {
        token.leading_trivia()
    }
}

#[inline]
pub(crate) fn with_trivia_list(token: &GreenToken, trailing: bool, list: GreenTriviaList) -> GreenToken {
    if trailing {
        token.with_trailing_trivia(list)
    } else {
        token.with_leading_trivia(list)
    }
}

/// Whitespace, a comment or a directive attached to a token.
pub struct SyntaxTrivia<L: Language> {
    pub(crate) raw: RawTrivia,
    _lang:          PhantomData<L>,
}

impl<L: Language> Clone for SyntaxTrivia<L> {
    #[inline]
    fn clone(&self) -> Self {
        Self::from_raw(self.raw.clone())
    }
}

impl<L: Language> PartialEq for SyntaxTrivia<L> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.raw.same(&other.raw)
    }
}

impl<L: Language> Eq for SyntaxTrivia<L> {}

impl<L: Language> Hash for SyntaxTrivia<L> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.offset.hash(state);
        self.raw.trailing.hash(state);
        self.raw.index.hash(state);
    }
}

impl<L: Language> fmt::Debug for SyntaxTrivia<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.kind(), self.full_span())?;
        match self.text() {
            Some(text) => write!(f, " {text:?}"),
            None => write!(f, " <structured>"),
        }
    }
}

impl<L: Language> fmt::Display for SyntaxTrivia<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text() {
            Some(text) => f.write_str(text),
            None => f.write_str(&self.to_full_string()),
        }
    }
}

impl<L: Language> SyntaxTrivia<L> {
    #[inline]
    pub(crate) fn from_raw(raw: RawTrivia) -> Self {
        Self {
            raw,
            _lang: PhantomData,
        }
    }

    #[inline]
    pub fn syntax_kind(&self) -> RawSyntaxKind {
        self.raw.green().kind()
    }

    #[inline]
    pub fn kind(&self) -> L::Kind {
        L::kind_from_raw(self.syntax_kind())
    }

    #[inline]
    pub fn green(&self) -> &GreenTrivia {
        self.raw.green()
    }

    /// The token this trivia is attached to.
    #[inline]
    pub fn token(&self) -> SyntaxToken<L> {
        SyntaxToken::from_raw(self.raw.token.clone())
    }

    #[inline]
    pub fn is_leading(&self) -> bool {
        !self.raw.trailing
    }

    #[inline]
    pub fn is_trailing(&self) -> bool {
        self.raw.trailing
    }

    /// Index of this trivia in its token's leading or trailing trivia.
    #[inline]
    pub fn index(&self) -> usize {
        self.raw.index as usize
    }

    #[inline]
    pub fn position(&self) -> TextSize {
        self.raw.offset
    }

    /// The range covered by this trivia. Trivia has no trivia of its own, so this is also its span.
    #[inline]
    pub fn full_span(&self) -> TextRange {
        self.raw.full_span()
    }

    #[inline]
    pub fn span(&self) -> TextRange {
        self.full_span()
    }

    /// The text of text trivia. Structured trivia has no text of its own, see
    /// [`to_full_string`](SyntaxTrivia::to_full_string).
    pub fn text(&self) -> Option<&str> {
        let key = self.raw.green().text_key()?;
        Some(self.raw.token.parent.interner.resolve(key))
    }

    /// The text covered by this trivia, including the text of its structure.
    pub fn to_full_string(&self) -> String {
        self.raw.green().to_string(&self.raw.token.parent.interner)
    }

    #[inline]
    pub fn has_structure(&self) -> bool {
        self.raw.green().has_structure()
    }

    #[inline]
    pub fn is_directive(&self) -> bool {
        self.raw.green().is_directive()
    }

    /// The root of the structure of this trivia. Its parent trivia is this trivia, and the same
    /// instance is returned for as long as it is alive.
    pub fn structure(&self) -> Option<SyntaxNode<L>> {
        NodeData::structure(&self.raw).map(SyntaxNode::from_data)
    }

    /// Returns a green tree, equal to the green tree this trivia belongs to, except with this trivia
    /// substituted.
    pub fn replace_with(&self, replacement: GreenTrivia) -> GreenNode {
        self.raw.token.splice(self.raw.token_with([replacement]))
    }
}

/// The leading or trailing trivia of a [`SyntaxToken`].
pub struct SyntaxTriviaList<L: Language> {
    token:    RawToken,
    trailing: bool,
    _lang:    PhantomData<L>,
}

impl<L: Language> Clone for SyntaxTriviaList<L> {
    fn clone(&self) -> Self {
        Self::new(self.token.clone(), self.trailing)
    }
}

impl<L: Language> fmt::Debug for SyntaxTriviaList<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<L: Language> SyntaxTriviaList<L> {
    pub(crate) fn new(token: RawToken, trailing: bool) -> Self {
        Self {
            token,
            trailing,
            _lang: PhantomData,
        }
    }

    #[inline]
    pub fn green(&self) -> &GreenTriviaList {
        trivia_list(&self.token.green, self.trailing)
    }

    #[inline]
    pub fn token(&self) -> SyntaxToken<L> {
        SyntaxToken::from_raw(self.token.clone())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.green().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.green().is_empty()
    }

    /// Absolute start of the first trivia in this list.
    #[inline]
    pub fn position(&self) -> TextSize {
        start_of(&self.token, self.trailing)
    }

    #[inline]
    pub fn full_span(&self) -> TextRange {
        TextRange::at(self.position(), self.green().full_width())
    }

    pub fn get(&self, index: usize) -> Option<SyntaxTrivia<L>> {
        RawTrivia::nth(&self.token, self.trailing, index).map(SyntaxTrivia::from_raw)
    }

    pub fn first(&self) -> Option<SyntaxTrivia<L>> {
        self.iter().next()
    }

    pub fn last(&self) -> Option<SyntaxTrivia<L>> {
        self.iter().next_back()
    }

    pub fn iter(&self) -> SyntaxTriviaIter<L> {
        let range = self.full_span();
        SyntaxTriviaIter {
            token:        self.token.clone(),
            trailing:     self.trailing,
            front:        0,
            back:         self.len() as u32,
            front_offset: range.start(),
            back_offset:  range.end(),
            _lang:        PhantomData,
        }
    }
}

impl<L: Language> IntoIterator for &SyntaxTriviaList<L> {
    type IntoIter = SyntaxTriviaIter<L>;
    type Item = SyntaxTrivia<L>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Absolute start of the leading or trailing trivia of `token`.
#[inline]
pub(crate) fn start_of(token: &RawToken, trailing: bool) -> TextSize {
    if trailing {
        token.text_start() + token.green.width()
    } else {
        token.offset
    }
}

/// An iterator over a [`SyntaxTriviaList`].
pub struct SyntaxTriviaIter<L: Language> {
    token:        RawToken,
    trailing:     bool,
    front:        u32,
    back:         u32,
    front_offset: TextSize,
    back_offset:  TextSize,
    _lang:        PhantomData<L>,
}

impl<L: Language> SyntaxTriviaIter<L> {
    #[inline]
    fn green_at(&self, index: u32) -> &GreenTrivia {
        &trivia_list(&self.token.green, self.trailing).as_slice()[index as usize]
    }

    #[inline]
    fn trivia(&self, index: u32, offset: TextSize) -> SyntaxTrivia<L> {
        SyntaxTrivia::from_raw(RawTrivia {
            token: self.token.clone(),
            trailing: self.trailing,
            index,
            offset,
        })
    }
}

impl<L: Language> Iterator for SyntaxTriviaIter<L> {
    type Item = SyntaxTrivia<L>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let index = self.front;
        let offset = self.front_offset;
        self.front_offset += self.green_at(index).full_width();
        self.front += 1;
        Some(self.trivia(index, offset))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = (self.back - self.front) as usize;
        (len, Some(len))
    }
}

impl<L: Language> DoubleEndedIterator for SyntaxTriviaIter<L> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        self.back_offset -= self.green_at(self.back).full_width();
        Some(self.trivia(self.back, self.back_offset))
    }
}

impl<L: Language> ExactSizeIterator for SyntaxTriviaIter<L> {}
impl<L: Language> FusedIterator for SyntaxTriviaIter<L> {}
