mod common;

use common::*;
use greenwood::{Language, RemoveOptions, SyntaxAnnotation, SyntaxError, TextRange};

fn find(root: &SyntaxNode, kind: SyntaxKind, text: &str) -> SyntaxNode {
    root.descendants()
        .find(|node| node.kind() == kind && node.to_string() == text)
        .unwrap_or_else(|| panic!("no {kind:?} node {text:?} in {root}"))
}

#[test]
fn replace_node_leaves_the_original_untouched() {
    init_tracing();
    let root = parse("1 + 2;");
    let two = find(&root, Literal, "2");
    let edited = root.replace_node(&two, parse_expr(&root, "x")).unwrap();
    assert_eq!(edited.to_full_string(), "1 + x;");
    assert_eq!(root.to_full_string(), "1 + 2;");
    // untouched siblings are shared between both trees
    let before = find(&root, Literal, "1");
    let after = find(&edited, Literal, "1");
    assert!(before.green().ptr_eq(after.green()));
    assert!(!root.green().ptr_eq(edited.green()));
}

#[test]
fn replacements_see_rewritten_descendants() {
    let root = parse("1 + 2;");
    let binary = find(&root, Binary, "1 + 2");
    let two = find(&root, Literal, "2");
    let interner = root.interner().clone();
    let mut seen = Vec::new();
    let edited = root
        .replace_nodes([binary, two], |original, rewritten| {
            seen.push(rewritten.to_full_string(&interner));
            match original.kind() {
                Literal => parse_expr(original, "3"),
                _ => rewritten,
            }
        })
        .unwrap();
    assert_eq!(seen, ["2", "1 + 3"]);
    assert_eq!(edited.to_full_string(), "1 + 3;");
}

#[test]
fn replacing_every_statement() {
    let root = parse("a; b; c;");
    let edited = root
        .replace_nodes(statements(&root), |original, _| {
            parse_statement(original, &format!("{}; ", original.first_token().unwrap().text()))
        })
        .unwrap();
    assert_eq!(edited.to_full_string(), "a; b; c; ");
}

#[test]
fn nodes_of_other_trees_are_rejected() {
    let root = parse("1;");
    let other = parse("1;");
    let literal = find(&other, Literal, "1");
    assert_eq!(
        root.replace_node(&literal, parse_expr(&root, "2")).map(|_| ()),
        Err(SyntaxError::InvalidArgument(
            "the element is not a descendant of the node being edited"
        ))
    );
    // ancestors are not descendants
    let statement = &statements(&root)[0];
    let literal = statement.first_child().unwrap();
    assert!(literal.replace_node(statement, parse_statement(&root, "x;")).is_err());
}

#[test]
fn inserting_list_elements() {
    let root = parse("a; b;");
    let [a, b] = <[SyntaxNode; 2]>::try_from(statements(&root)).unwrap();
    let c = parse_statement(&root, "c; ");

    let after = root.insert_nodes_after(&a, [c.clone()]).unwrap();
    assert_eq!(after.to_full_string(), "a; c; b;");
    let before = root.insert_nodes_before(&b, [c.clone()]).unwrap();
    assert_eq!(before.to_full_string(), "a; c; b;");
    assert_eq!(statements(&before).len(), 3);

    let d = parse_statement(&root, "d; ");
    let many = root.replace_node_with_many(&b, [c, d]).unwrap();
    assert_eq!(many.to_full_string(), "a; c; d; ");
    assert_eq!(statements(&many).len(), 3);
    let (x, y) = (parse_statement(&root, "x; "), parse_statement(&root, "y; "));
    let many = root.replace_node_with_many(&a, [x, y]).unwrap();
    assert_eq!(many.to_full_string(), "x; y; b;");
    let none = root.replace_node_with_many(&b, []).unwrap();
    assert_eq!(none.to_full_string(), "a; ");
}

#[test]
fn inserting_next_to_a_single_child_fails() {
    let root = parse("1 + 2;");
    let one = find(&root, Literal, "1");
    let result = root.insert_nodes_after(&one, [parse_expr(&root, "3")]);
    assert!(matches!(result, Err(SyntaxError::InvalidOperation(_))));
    let plus = token(&root, "+");
    let result = root.insert_tokens_before(&plus, [green_token(&root, Plus, "+")]);
    assert!(matches!(result, Err(SyntaxError::InvalidOperation(_))));
}

#[test]
fn removing_list_elements_takes_their_separator() {
    let root = parse("f(1, 2, 3);");
    let middle = find(&root, Literal, "2");
    let edited = root.remove_node(&middle, RemoveOptions::KEEP_NO_TRIVIA).unwrap().unwrap();
    assert_eq!(edited.to_full_string(), "f(1, 3);");

    let last = find(&root, Literal, "3");
    let edited = root.remove_node(&last, RemoveOptions::KEEP_NO_TRIVIA).unwrap().unwrap();
    assert_eq!(edited.to_full_string(), "f(1, 2);");

    let all: Vec<_> = root.descendants().filter(|node| node.kind() == Literal).collect();
    let edited = root.remove_nodes(all, RemoveOptions::KEEP_NO_TRIVIA).unwrap().unwrap();
    assert_eq!(edited.to_full_string(), "f();");
    let call = find(&edited, Call, "f()");
    assert_eq!(call.child_count(), 3);
    assert_eq!(call.slot_count(), 4);
}

#[test]
fn removing_neighbouring_list_elements() {
    let root = parse("f(1, 2, 3);");
    let literals: Vec<_> = root.descendants().filter(|node| node.kind() == Literal).collect();

    // both claim a separator of their own
    let last_two = root
        .remove_nodes([literals[2].clone(), literals[1].clone()], RemoveOptions::KEEP_NO_TRIVIA)
        .unwrap()
        .unwrap();
    assert_eq!(last_two.to_full_string(), "f(1);");
    assert_eq!(find(&last_two, Call, "f(1)").child_count(), 4);

    let first_two = root
        .remove_nodes([literals[0].clone(), literals[1].clone()], RemoveOptions::KEEP_NO_TRIVIA)
        .unwrap()
        .unwrap();
    assert_eq!(first_two.to_full_string(), "f(3);");

    let outer = root
        .remove_nodes([literals[0].clone(), literals[2].clone()], RemoveOptions::KEEP_NO_TRIVIA)
        .unwrap()
        .unwrap();
    assert_eq!(outer.to_full_string(), "f(2);");
}

#[test]
fn removal_moves_trivia_as_requested() {
    let root = parse("a; // one\nb;");
    let a = statements(&root)[0].clone();

    let dropped = root.remove_node(&a, RemoveOptions::KEEP_NO_TRIVIA).unwrap().unwrap();
    assert_eq!(dropped.to_full_string(), "b;");

    let kept = root.remove_node(&a, RemoveOptions::KEEP_TRAILING_TRIVIA).unwrap().unwrap();
    assert_eq!(kept.to_full_string(), " // one\nb;");
    let b = token(&kept, "b");
    assert_eq!(b.leading_trivia().len(), 3);
    assert_eq!(b.span().start(), 8.into());

    let exterior = root.remove_node(&a, RemoveOptions::KEEP_EXTERIOR_TRIVIA).unwrap().unwrap();
    assert_eq!(exterior.to_full_string(), " // one\nb;");
}

#[test]
fn removal_at_the_end_moves_trivia_to_the_end_of_file() {
    let root = parse("a; // trailing");
    let a = statements(&root)[0].clone();
    let edited = root.remove_node(&a, RemoveOptions::KEEP_TRAILING_TRIVIA).unwrap().unwrap();
    assert_eq!(edited.to_full_string(), " // trailing");
    assert_eq!(edited.last_token().unwrap().leading_trivia().len(), 2);
}

#[test]
fn removal_keeps_directives() {
    let root = parse("#pragma warning disable W1\na;\nb;");
    let a = statements(&root)[0].clone();
    let edited = root
        .remove_node(&a, RemoveOptions::KEEP_NO_TRIVIA | RemoveOptions::KEEP_DIRECTIVES)
        .unwrap()
        .unwrap();
    assert_eq!(edited.to_full_string(), "#pragma warning disable W1b;");
    assert!(edited.contains_directives());
    let without = root.remove_node(&a, RemoveOptions::KEEP_NO_TRIVIA).unwrap().unwrap();
    assert!(!without.contains_directives());
}

#[test]
fn removing_the_receiver_or_nested_nodes() {
    let root = parse("1 + 2; x;");
    assert_eq!(root.remove_node(&root, RemoveOptions::KEEP_NO_TRIVIA), Ok(None));

    let statement = statements(&root)[0].clone();
    let nested = find(&root, Literal, "2");
    let edited = root
        .remove_nodes([nested, statement], RemoveOptions::KEEP_NO_TRIVIA)
        .unwrap()
        .unwrap();
    assert_eq!(edited.to_full_string(), "x;");
}

#[test]
fn removing_a_single_child_empties_its_slot() {
    let root = parse("1 + 2;");
    let two = find(&root, Literal, "2");
    let edited = root.remove_node(&two, RemoveOptions::KEEP_NO_TRIVIA).unwrap().unwrap();
    assert_eq!(edited.to_full_string(), "1 + ;");
    let binary = find(&edited, Binary, "1 +");
    assert_eq!(binary.slot_count(), 3);
    assert_eq!(binary.child_count(), 2);
}

#[test]
fn replacing_tokens() {
    let root = parse("1 + 2;");
    let one = token(&root, "1");
    let edited = root
        .replace_tokens([one], |original, green| {
            assert_eq!(original.text(), "1");
            green_token(&root, Int, "5")
                .with_leading_trivia(green.leading_trivia().clone())
                .with_trailing_trivia(green.trailing_trivia().clone())
        })
        .unwrap();
    assert_eq!(edited.to_full_string(), "5 + 2;");

    let plus = token(&root, "+");
    let edited = root.replace_token(&plus, green_token(&root, Plus, "+")).unwrap();
    // the replacement has no trivia of its own
    assert_eq!(edited.to_full_string(), "1 +2;");
}

#[test]
fn list_tokens() {
    let root = parse("f(1, 2);");
    let comma = token(&root, ",");
    let edited = root
        .insert_tokens_after(&comma, [green_token(&root, Comma, ",")])
        .unwrap();
    assert_eq!(edited.to_full_string(), "f(1, ,2);");
    let edited = root.replace_token_with_many(&comma, []).unwrap();
    assert_eq!(edited.to_full_string(), "f(12);");
    let call = find(&edited, Call, "f(12)");
    assert_eq!(call.child_count(), 5);

    let commas = [green_token(&root, Comma, ","), green_token(&root, Comma, ",")];
    let edited = root.replace_token_with_many(&comma, commas).unwrap();
    assert_eq!(edited.to_full_string(), "f(1,,2);");
    let call = find(&edited, Call, "f(1,,2)");
    assert_eq!(call.child_count(), 7);
}

#[test]
fn editing_trivia() {
    let root = parse("a; // note\n");
    let note = root
        .descendant_trivia()
        .find(|trivia| trivia.kind() == Comment)
        .unwrap();
    assert_eq!(note.text(), Some("// note"));

    let edited = root
        .replace_trivia([note.clone()], |_, _| comment(&root, "// other"))
        .unwrap();
    assert_eq!(edited.to_full_string(), "a; // other\n");

    let edited = root.replace_trivia_with_many(&note, []).unwrap();
    assert_eq!(edited.to_full_string(), "a; \n");
    let edited = root
        .replace_trivia_with_many(&note, [comment(&root, "// x"), space(&root)])
        .unwrap();
    assert_eq!(edited.to_full_string(), "a; // x \n");
    assert_eq!(token(&edited, ";").trailing_trivia().len(), 4);

    let edited = root.insert_trivia_before(&note, [space(&root)]).unwrap();
    assert_eq!(edited.to_full_string(), "a;  // note\n");
    let edited = root.insert_trivia_after(&note, [space(&root)]).unwrap();
    assert_eq!(edited.to_full_string(), "a; // note \n");
}

#[test]
fn replacing_outer_trivia() {
    let root = parse("a;");
    let statement = statements(&root)[0].clone();
    let commented = statement.with_leading_trivia([comment(&root, "// x"), space(&root)]).unwrap();
    assert_eq!(commented.to_full_string(), "// x a;");
    assert_eq!(commented.kind(), Statement);
    assert!(commented.parent().is_none());
    let spaced = statement.with_trailing_trivia([space(&root)]).unwrap();
    assert_eq!(spaced.to_full_string(), "a; ");
    assert_eq!(spaced.span(), TextRange::new(0.into(), 2.into()));
}

#[test]
fn editing_inside_structured_trivia() {
    let root = parse("#pragma warning disable W1\nx;");
    let id = root
        .traverse()
        .descend_into_trivia(true)
        .tokens()
        .find(|token| token.text() == "W1")
        .unwrap();
    assert!(id.parent().is_structured_trivia());
    let edited = root.replace_token(&id, green_token(&root, Ident, "W2")).unwrap();
    assert_eq!(edited.to_full_string(), "#pragma warning disable W2\nx;");
    // the structure keeps its kind and directive flag
    let trivia = edited.descendant_trivia().next().unwrap();
    assert!(trivia.is_directive());
    assert_eq!(trivia.structure().unwrap().kind(), PragmaWarningDirective);
}

#[test]
fn annotations_survive_edits() {
    let root = parse("a + b;");
    let annotation = SyntaxAnnotation::with_kind("rename");
    let a = find(&root, Name, "a");
    let annotated = root
        .replace_nodes([a], |_, green| green.with_annotations([annotation.clone()]))
        .unwrap();
    assert!(annotated.contains_annotations());

    let b = token(&annotated, "b");
    let edited = annotated.replace_token(&b, green_token(&root, Ident, "c")).unwrap();
    let found: Vec<_> = edited.annotated_nodes(&annotation).collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].to_full_string(), "a ");
    assert_eq!(found[0].annotations(), [annotation.clone()]);
    assert!(edited.annotated_tokens(&annotation).next().is_none());
    assert_eq!(Calc::kind_from_raw(found[0].syntax_kind()), Name);
}
