#![allow(unused)]
//! A small expression language for the integration tests.
//!
//! ```text
//! root      := statement* EOF
//! statement := expr ';'
//! expr      := term ('+' term)*
//! term      := INT | IDENT | IDENT '(' (expr (',' expr)*)? ')'
//! ```
//!
//! Spaces, newlines and `//` comments are trivia. A `#` starts a directive that runs to the end of
//! the line. Directives are structured trivia; `#pragma warning disable|restore|enable ids` gets
//! a `PragmaWarningDirective` structure.

use std::sync::Arc;

use greenwood::{
    overlay::PragmaAction, GreenNode, GreenNodeBuilder, GreenToken, GreenTrivia, Language, NodeCache, RawSyntaxKind,
    TokenInterner,
};

pub type SyntaxNode = greenwood::SyntaxNode<Calc>;
pub type SyntaxToken = greenwood::SyntaxToken<Calc>;
pub type SyntaxTrivia = greenwood::SyntaxTrivia<Calc>;
pub type SyntaxElement = greenwood::SyntaxElement<Calc>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum SyntaxKind {
    // tokens
    Int,
    Ident,
    Plus,
    Comma,
    Semicolon,
    LParen,
    RParen,
    EndOfFile,
    Unknown,
    Hash,
    PragmaKw,
    WarningKw,
    DisableKw,
    RestoreKw,
    EnableKw,
    // trivia
    Whitespace,
    Newline,
    Comment,
    DirectiveTrivia,
    // nodes
    Root,
    Statement,
    Literal,
    Name,
    Binary,
    Call,
    Error,
    PragmaWarningDirective,
    OtherDirective,
}
pub use SyntaxKind::*;

const KINDS: [SyntaxKind; OtherDirective as usize + 1] = [
    Int,
    Ident,
    Plus,
    Comma,
    Semicolon,
    LParen,
    RParen,
    EndOfFile,
    Unknown,
    Hash,
    PragmaKw,
    WarningKw,
    DisableKw,
    RestoreKw,
    EnableKw,
    Whitespace,
    Newline,
    Comment,
    DirectiveTrivia,
    Root,
    Statement,
    Literal,
    Name,
    Binary,
    Call,
    Error,
    PragmaWarningDirective,
    OtherDirective,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Calc {}

impl Language for Calc {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: RawSyntaxKind) -> Self::Kind {
        KINDS[raw.0 as usize]
    }

    fn kind_to_raw(kind: Self::Kind) -> RawSyntaxKind {
        RawSyntaxKind(kind as u16)
    }

    fn static_text(kind: Self::Kind) -> Option<&'static str> {
        match kind {
            Plus => Some("+"),
            Comma => Some(","),
            Semicolon => Some(";"),
            LParen => Some("("),
            RParen => Some(")"),
            EndOfFile => Some(""),
            Hash => Some("#"),
            PragmaKw => Some("pragma"),
            WarningKw => Some("warning"),
            DisableKw => Some("disable"),
            RestoreKw => Some("restore"),
            EnableKw => Some("enable"),
            _ => None,
        }
    }

    fn is_trivia_directive(kind: Self::Kind) -> bool {
        kind == DirectiveTrivia
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme<'s> {
    Token(SyntaxKind, &'s str),
    Trivia(SyntaxKind, &'s str),
    /// A whole directive line, without its line break.
    Directive(&'s str),
}

fn lex(text: &str, in_directive: bool) -> Vec<Lexeme<'_>> {
    let mut lexemes = Vec::new();
    let bytes = text.as_bytes();
    let mut start = 0;
    while start < text.len() {
        let rest = &text[start..];
        let take_while = |pred: fn(u8) -> bool| rest.bytes().take_while(|&b| pred(b)).count();
        let (lexeme, len) = match bytes[start] {
            b' ' | b'\t' => {
                let len = take_while(|b| b == b' ' || b == b'\t');
                (Lexeme::Trivia(Whitespace, &rest[..len]), len)
            }
            b'\n' => (Lexeme::Trivia(Newline, "\n"), 1),
            b'/' if rest.starts_with("//") => {
                let len = rest.find('\n').unwrap_or(rest.len());
                (Lexeme::Trivia(Comment, &rest[..len]), len)
            }
            b'#' if !in_directive => {
                let len = rest.find('\n').unwrap_or(rest.len());
                (Lexeme::Directive(&rest[..len]), len)
            }
            b'0'..=b'9' => {
                let len = take_while(|b| b.is_ascii_digit());
                (Lexeme::Token(Int, &rest[..len]), len)
            }
            b if b.is_ascii_alphabetic() || b == b'_' => {
                let len = take_while(|b| b.is_ascii_alphanumeric() || b == b'_');
                let word = &rest[..len];
                let kind = match word {
                    "pragma" if in_directive => PragmaKw,
                    "warning" if in_directive => WarningKw,
                    "disable" if in_directive => DisableKw,
                    "restore" if in_directive => RestoreKw,
                    "enable" if in_directive => EnableKw,
                    _ => Ident,
                };
                (Lexeme::Token(kind, word), len)
            }
            b => {
                let kind = match b {
                    b'+' => Plus,
                    b',' => Comma,
                    b';' => Semicolon,
                    b'(' => LParen,
                    b')' => RParen,
                    b'#' => Hash,
                    _ => Unknown,
                };
                let len = rest.chars().next().map_or(1, char::len_utf8);
                (Lexeme::Token(kind, &rest[..len]), len)
            }
        };
        lexemes.push(lexeme);
        start += len;
    }
    lexemes
}

struct Parser<'s, 'b, 'c> {
    lexemes: Vec<Lexeme<'s>>,
    pos:     usize,
    builder: &'b mut GreenNodeBuilder<'c, Calc>,
}

impl<'s, 'b, 'c> Parser<'s, 'b, 'c> {
    fn new(lexemes: Vec<Lexeme<'s>>, builder: &'b mut GreenNodeBuilder<'c, Calc>) -> Self {
        Self {
            lexemes,
            pos: 0,
            builder,
        }
    }

    /// The kind of the `n`th token from the current position, skipping trivia.
    fn nth(&self, n: usize) -> Option<SyntaxKind> {
        self.lexemes[self.pos..]
            .iter()
            .filter_map(|lexeme| match lexeme {
                Lexeme::Token(kind, _) => Some(*kind),
                _ => None,
            })
            .nth(n)
    }

    fn current(&self) -> Option<SyntaxKind> {
        self.nth(0)
    }

    fn trivia(&mut self, lexeme: Lexeme<'_>, trailing: bool) {
        match lexeme {
            Lexeme::Trivia(kind, text) if trailing => self.builder.trailing_trivia(kind, text),
            Lexeme::Trivia(kind, text) => self.builder.leading_trivia(kind, text),
            Lexeme::Directive(text) => {
                let structure = {
                    let mut nested = GreenNodeBuilder::with_cache(self.builder.cache_mut());
                    Parser::new(lex(text, true), &mut nested).directive();
                    nested.finish().0
                };
                if trailing {
                    self.builder.trailing_structured_trivia(DirectiveTrivia, structure);
                } else {
                    self.builder.leading_structured_trivia(DirectiveTrivia, structure);
                }
            }
            Lexeme::Token(..) => unreachable!(),
        }
    }

    fn leading(&mut self) {
        while let Some(&lexeme) = self.lexemes.get(self.pos) {
            if let Lexeme::Token(..) = lexeme {
                break;
            }
            self.trivia(lexeme, false);
            self.pos += 1;
        }
    }

    /// Adds the next token with its trivia. Trailing trivia runs up to the end of the line.
    fn bump(&mut self) {
        self.leading();
        let Some(&Lexeme::Token(kind, text)) = self.lexemes.get(self.pos) else {
            panic!("no token left to bump");
        };
        self.pos += 1;
        self.builder.token(kind, text);
        while let Some(&lexeme) = self.lexemes.get(self.pos) {
            if let Lexeme::Token(..) = lexeme {
                break;
            }
            self.trivia(lexeme, true);
            self.pos += 1;
            if lexeme == Lexeme::Trivia(Newline, "\n") {
                break;
            }
        }
    }

    fn expect(&mut self, kind: SyntaxKind) {
        if self.current() == Some(kind) {
            self.bump();
        } else {
            self.builder.missing_token(kind);
        }
    }

    fn root(&mut self) {
        self.builder.start_node(Root);
        self.builder.start_list();
        while let Some(kind) = self.current() {
            if matches!(kind, Int | Ident) {
                self.statement();
            } else {
                self.builder.start_node(Error);
                self.bump();
                self.builder.finish_node();
            }
        }
        self.builder.finish_list();
        self.leading();
        self.builder.token(EndOfFile, "");
        self.builder.finish_node();
    }

    fn statement(&mut self) {
        self.builder.start_node(Statement);
        self.expr();
        self.expect(Semicolon);
        self.builder.finish_node();
    }

    fn expr(&mut self) {
        let checkpoint = self.builder.checkpoint();
        self.term();
        while self.current() == Some(Plus) {
            self.builder.start_node_at(checkpoint, Binary);
            self.bump();
            self.term();
            self.builder.finish_node();
        }
    }

    fn term(&mut self) {
        match (self.current(), self.nth(1)) {
            (Some(Int), _) => {
                self.builder.start_node(Literal);
                self.bump();
                self.builder.finish_node();
            }
            (Some(Ident), Some(LParen)) => {
                self.builder.start_node(Call);
                self.bump();
                self.bump();
                self.builder.start_list();
                if !matches!(self.current(), Some(RParen) | None) {
                    self.expr();
                    while self.current() == Some(Comma) {
                        self.bump();
                        self.expr();
                    }
                }
                self.builder.finish_list();
                self.expect(RParen);
                self.builder.finish_node();
            }
            (Some(Ident), _) => {
                self.builder.start_node(Name);
                self.bump();
                self.builder.finish_node();
            }
            _ => {
                self.builder.start_node(Literal);
                self.builder.missing_token(Int);
                self.builder.finish_node();
            }
        }
    }

    fn directive(&mut self) {
        if self.nth(1) != Some(PragmaKw) || self.nth(2) != Some(WarningKw) {
            self.builder.start_node(OtherDirective);
            while self.current().is_some() {
                self.bump();
            }
            self.builder.finish_node();
            return;
        }
        self.builder.start_node(PragmaWarningDirective);
        self.bump();
        self.bump();
        self.bump();
        match self.current() {
            Some(DisableKw | RestoreKw | EnableKw) => self.bump(),
            _ => self.builder.missing_token(DisableKw),
        }
        self.builder.start_list();
        while self.current() == Some(Ident) {
            self.bump();
            if self.current() != Some(Comma) {
                break;
            }
            self.bump();
        }
        self.builder.finish_list();
        while self.current().is_some() {
            self.bump();
        }
        self.builder.finish_node();
    }
}

/// Parses `text` into a new tree with a fresh interner.
pub fn parse(text: &str) -> SyntaxNode {
    let mut builder = GreenNodeBuilder::new();
    Parser::new(lex(text, false), &mut builder).root();
    let (green, cache) = builder.finish();
    let interner = cache.map(|cache| cache.interner().clone()).unwrap_or_default();
    SyntaxNode::new_root(green, interner)
}

/// Parses `text` into a value tree, deduplicating against `cache`.
pub fn parse_green(text: &str, cache: &mut NodeCache) -> GreenNode {
    let mut builder = GreenNodeBuilder::with_cache(cache);
    Parser::new(lex(text, false), &mut builder).root();
    let (green, _) = builder.finish();
    green
}

/// Parses a single expression, as a value node sharing the interner of `tree`.
pub fn parse_expr(tree: &SyntaxNode, text: &str) -> GreenNode {
    let mut cache = NodeCache::with_interner(tree.interner().clone());
    let root = parse_green(&format!("{text};"), &mut cache);
    let statement = root.slot(0).and_then(|list| list.into_node()?.slot(0)?.into_node().cloned());
    let statement = statement.expect("text must be a single expression");
    statement
        .slot(0)
        .and_then(|expr| expr.into_node().cloned())
        .expect("text must be a single expression")
}

/// Parses a single statement, trivia included, as a value node sharing the interner of `tree`.
pub fn parse_statement(tree: &SyntaxNode, text: &str) -> GreenNode {
    let mut cache = NodeCache::with_interner(tree.interner().clone());
    let root = parse_green(text, &mut cache);
    let list = root.slot(0).and_then(|list| list.into_node().cloned());
    let list = list.expect("text must contain a statement");
    list.slot(0)
        .and_then(|statement| statement.into_node().cloned())
        .expect("text must contain a statement")
}

/// A token of `kind` and `text` that shares the interner of `tree`.
pub fn green_token(tree: &SyntaxNode, kind: SyntaxKind, text: &str) -> GreenToken {
    GreenToken::new(tree.interner(), Calc::kind_to_raw(kind), text)
}

/// `tree` with the text of `old` changed to `text`, keeping the token's trivia.
pub fn retext(tree: &SyntaxNode, old: &SyntaxToken, text: &str) -> SyntaxNode {
    let new = green_token(tree, old.kind(), text);
    tree.replace_tokens([old.clone()], |_, green| {
        new.with_leading_trivia(green.leading_trivia().clone())
            .with_trailing_trivia(green.trailing_trivia().clone())
    })
    .unwrap()
}

pub fn space(tree: &SyntaxNode) -> GreenTrivia {
    GreenTrivia::new(tree.interner(), Calc::kind_to_raw(Whitespace), " ")
}

pub fn comment(tree: &SyntaxNode, text: &str) -> GreenTrivia {
    GreenTrivia::new(tree.interner(), Calc::kind_to_raw(Comment), text)
}

/// The first token in `tree` with `text`.
pub fn token(tree: &SyntaxNode, text: &str) -> SyntaxToken {
    tree.descendant_tokens()
        .find(|token| token.text() == text)
        .unwrap_or_else(|| panic!("no token {text:?} in {tree}"))
}

/// The statements of a parsed root.
pub fn statements(root: &SyntaxNode) -> Vec<SyntaxNode> {
    root.children().filter(|node| node.kind() == Statement).collect()
}

/// Reads a `#pragma warning` directive structure.
pub fn pragma_warning(directive: &SyntaxNode) -> Option<(PragmaAction, Vec<Arc<str>>)> {
    if directive.kind() != PragmaWarningDirective {
        return None;
    }
    let action = match directive.child_or_token_at(3).ok()?.into_token()? {
        token if token.is_missing() => return None,
        token => match token.kind() {
            DisableKw => PragmaAction::Disable,
            RestoreKw => PragmaAction::Restore,
            EnableKw => PragmaAction::Enable,
            _ => return None,
        },
    };
    let ids = directive
        .children_with_tokens()
        .skip(4)
        .filter_map(|element| element.into_token())
        .filter(|token| token.kind() == Ident)
        .map(|token| Arc::from(token.text()))
        .collect();
    Some((action, ids))
}

/// Logs to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
