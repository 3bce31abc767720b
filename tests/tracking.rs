mod common;

use common::*;
use greenwood::{RemoveOptions, SyntaxError};

fn find(root: &SyntaxNode, kind: SyntaxKind, text: &str) -> SyntaxNode {
    root.descendants()
        .find(|node| node.kind() == kind && node.to_string() == text)
        .unwrap_or_else(|| panic!("no {kind:?} node {text:?} in {root}"))
}

#[test]
fn tracked_nodes_follow_edits() {
    init_tracing();
    let root = parse("a + b; c;");
    let binary = find(&root, Binary, "a + b");
    let tracked = root.track_nodes([binary.clone()]).unwrap();
    assert_eq!(tracked.to_full_string(), root.to_full_string());
    assert_eq!(tracked.current_node(&binary).unwrap().to_string(), "a + b");

    // an edit elsewhere
    let c = token(&tracked, "c");
    let edited = retext(&tracked, &c, "d");
    assert_eq!(edited.to_full_string(), "a + b; d;");
    let current = edited.current_node(&binary).unwrap();
    assert_eq!(current.to_string(), "a + b");
    assert_eq!(current.kind(), Binary);
    assert_eq!(current.root(), edited);

    // an edit inside the tracked node keeps it tracked
    let a = find(&edited, Name, "a");
    let edited = edited.replace_node(&a, parse_expr(&root, "x ")).unwrap();
    assert_eq!(edited.current_node(&binary).unwrap().to_string(), "x + b");

    // the node can be found from any node of the new tree
    let statement = statements(&edited)[1].clone();
    assert_eq!(statement.current_nodes(&binary).len(), 1);
}

#[test]
fn tracking_several_nodes() {
    let root = parse("a; b; c;");
    let [a, b, c] = <[SyntaxNode; 3]>::try_from(statements(&root)).unwrap();
    let tracked = root.track_nodes([a.clone(), c.clone(), a.clone()]).unwrap();
    let b_now = tracked.current_node(&b);
    assert!(b_now.is_none());
    let removed = tracked
        .remove_node(&tracked.current_node(&a).unwrap(), RemoveOptions::KEEP_NO_TRIVIA)
        .unwrap()
        .unwrap();
    assert!(removed.current_node(&a).is_none());
    assert_eq!(removed.current_node(&c).unwrap().to_string(), "c;");
    assert_eq!(removed.current_node(&c).unwrap().position(), 3.into());
}

#[test]
fn duplicated_nodes_have_no_single_counterpart() {
    let root = parse("a; b;");
    let a = statements(&root)[0].clone();
    let tracked = root.track_nodes([a.clone()]).unwrap();
    let current = tracked.current_node(&a).unwrap();
    let duplicated = tracked
        .insert_nodes_after(&current, [current.green().clone()])
        .unwrap();
    assert_eq!(duplicated.to_full_string(), "a; a; b;");
    assert!(duplicated.current_node(&a).is_none());
    let all = duplicated.current_nodes(&a);
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].position(), 0.into());
    assert_eq!(all[1].position(), 3.into());
}

#[test]
fn replaced_nodes_lose_their_tracking() {
    let root = parse("a; b;");
    let a = statements(&root)[0].clone();
    let tracked = root.track_nodes([a.clone()]).unwrap();
    let current = tracked.current_node(&a).unwrap();
    let replaced = tracked.replace_node(&current, parse_statement(&root, "z; ")).unwrap();
    assert_eq!(replaced.to_full_string(), "z; b;");
    assert!(replaced.current_node(&a).is_none());
    assert!(replaced.current_nodes(&a).is_empty());
}

#[test]
fn untracked_nodes_have_no_counterparts() {
    let root = parse("a; b;");
    let [a, b] = <[SyntaxNode; 2]>::try_from(statements(&root)).unwrap();
    let tracked = root.track_nodes([a]).unwrap();
    assert!(tracked.current_nodes(&b).is_empty());
    // the node of the tracked tree is not the tracked node itself
    let a_now = statements(&tracked)[0].clone();
    assert!(tracked.current_node(&a_now).is_none());
    assert_eq!(root.track_nodes([]).unwrap().to_full_string(), "a; b;");
}

#[test]
fn only_descendants_can_be_tracked() {
    let root = parse("a;");
    let other = parse("a;");
    let result = root.track_nodes([statements(&other)[0].clone()]);
    assert!(matches!(result, Err(SyntaxError::InvalidArgument(_))));
}

#[test]
fn tracking_inside_structured_trivia() {
    let root = parse("#pragma warning disable W1\nx;");
    let directive = root.descendant_trivia().next().unwrap().structure().unwrap();
    let tracked = root.track_nodes([directive.clone()]).unwrap();
    assert_eq!(tracked.to_full_string(), root.to_full_string());

    let x = token(&tracked, "x");
    let edited = retext(&tracked, &x, "y");
    assert_eq!(edited.to_full_string(), "#pragma warning disable W1\ny;");
    let current = edited.current_node(&directive).unwrap();
    assert_eq!(current.kind(), PragmaWarningDirective);
    assert!(current.is_structured_trivia());
    assert_eq!(current.true_root(), edited);
    assert_eq!(current.to_string(), "#pragma warning disable W1");
}
