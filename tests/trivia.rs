mod common;

use common::*;
use greenwood::{TextRange, TextSize};

fn range(start: u32, end: u32) -> TextRange {
    TextRange::new(start.into(), end.into())
}

#[test]
fn leading_and_trailing_trivia() {
    let root = parse("  a; // c\n");
    let a = token(&root, "a");
    assert!(a.has_leading_trivia());
    assert!(!a.has_trailing_trivia());
    assert_eq!(a.full_span(), range(0, 3));
    assert_eq!(a.span(), range(2, 3));
    let leading = a.leading_trivia();
    assert_eq!(leading.len(), 1);
    assert_eq!(leading.full_span(), range(0, 2));
    let space = leading.first().unwrap();
    assert_eq!(space.kind(), Whitespace);
    assert!(space.is_leading());
    assert_eq!(space.text(), Some("  "));
    assert_eq!(space.token(), a);

    let semicolon = token(&root, ";");
    let trailing = semicolon.trailing_trivia();
    assert_eq!(trailing.position(), 4.into());
    assert_eq!(trailing.full_span(), range(4, 10));
    let spans: Vec<_> = trailing.iter().map(|trivia| (trivia.kind(), trivia.full_span())).collect();
    assert_eq!(
        spans,
        [
            (Whitespace, range(4, 5)),
            (Comment, range(5, 9)),
            (Newline, range(9, 10)),
        ]
    );
    let reversed: Vec<_> = trailing.iter().rev().map(|trivia| trivia.index()).collect();
    assert_eq!(reversed, [2, 1, 0]);
    assert_eq!(trailing.iter().rev().last().unwrap().full_span(), range(4, 5));

    let comment = trailing.get(1).unwrap();
    assert!(comment.is_trailing());
    assert_eq!(comment.to_string(), "// c");
    assert_eq!(comment.span(), comment.full_span());
    assert!(trailing.get(3).is_none());
    assert_eq!(trailing.last().unwrap().kind(), Newline);
}

#[test]
fn trivia_is_reachable_from_tokens_only() {
    let root = parse("a; // c\n");
    let statement = &statements(&root)[0];
    assert_eq!(statement.full_span(), range(0, 8));
    assert_eq!(statement.span(), range(0, 2));
    assert_eq!(statement.to_string(), "a;");
    assert_eq!(statement.to_full_string(), "a; // c\n");
    assert_eq!(statement.last_token().unwrap().to_full_string(), "; // c\n");
    assert_eq!(statement.last_token().unwrap().to_string(), ";");
}

#[test]
fn structured_trivia() {
    let text = "#pragma warning disable W1\nx;";
    let root = parse(text);
    let x = token(&root, "x");
    assert!(x.has_structured_trivia());
    assert!(x.contains_directives());
    assert!(root.contains_directives());
    assert!(root.has_structured_trivia());

    let directive = x.leading_trivia().first().unwrap();
    assert!(directive.has_structure());
    assert!(directive.is_directive());
    assert_eq!(directive.kind(), DirectiveTrivia);
    assert_eq!(directive.text(), None);
    assert_eq!(directive.to_full_string(), "#pragma warning disable W1");
    assert_eq!(directive.to_string(), "#pragma warning disable W1");
    assert_eq!(directive.full_span(), range(0, 26));

    let structure = directive.structure().unwrap();
    assert_eq!(structure.kind(), PragmaWarningDirective);
    assert!(structure.is_structured_trivia());
    assert!(structure.parent().is_none());
    assert_eq!(structure.parent_trivia().unwrap().full_span(), directive.full_span());
    assert_eq!(structure.full_span(), range(0, 26));
    assert_eq!(structure, directive.structure().unwrap());
    assert_eq!(structure.parent_or_structured_trivia_parent(), Some(x.parent()));
    assert_eq!(structure.true_root(), root);

    let id = structure.last_token().unwrap();
    assert_eq!(id.text(), "W1");
    assert_eq!(id.span(), range(24, 26));
    assert_eq!(id.parent().root(), structure);
    assert_eq!(id.parent().true_root(), root);
    let with_trivia: Vec<_> = id.parent().ancestors_with_trivia().map(|node| node.kind()).collect();
    assert_eq!(with_trivia, [PragmaWarningDirective, Name, Statement, Root]);
    assert_eq!(id.parent().ancestors().count(), 1);

    // the newline after the directive is plain trivia
    assert_eq!(x.leading_trivia().len(), 2);
    assert_eq!(x.leading_trivia().last().unwrap().text(), Some("\n"));
}

#[test]
fn finding_tokens_inside_trivia() {
    let root = parse("#pragma warning disable W1\nx;");
    let position = TextSize::from(3);
    assert_eq!(root.find_token(position, false).unwrap().text(), "x");
    let inside = root.find_token(position, true).unwrap();
    assert_eq!(inside.kind(), PragmaKw);
    assert!(inside.parent().is_structured_trivia());
    // the newline is not part of the structure
    assert_eq!(root.find_token(26.into(), true).unwrap().text(), "x");
}

#[test]
fn other_directives_are_structured_too() {
    let root = parse("a; #region stuff\nb;");
    let semicolon = token(&root, ";");
    let directive = semicolon
        .trailing_trivia()
        .iter()
        .find(|trivia| trivia.is_directive())
        .unwrap();
    assert!(directive.is_trailing());
    let structure = directive.structure().unwrap();
    assert_eq!(structure.kind(), OtherDirective);
    assert_eq!(structure.to_string(), "#region stuff");
    assert!(pragma_warning(&structure).is_none());
    assert_eq!(root.to_full_string(), "a; #region stuff\nb;");
}
