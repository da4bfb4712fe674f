//! Structural invariants of parsed trees, checked over generated programs
//!
//! For every tree: each non-root node has exactly one parent, sibling ranges
//! are ordered and disjoint, and child ranges nest within the parent range.

#![allow(clippy::unwrap_used)]

use perl5::parser::{SyntaxNode, parse};
use proptest::prelude::*;

const STATEMENTS: &[&str] = &[
    "my $x = 1;",
    "our @list = (1, 2, 3);",
    "my %h = (a => 1);",
    "local $_ = shift;",
    "state $n;",
    "package Foo;",
    "use strict;",
    "sub f { return $_[0] + 1; }",
    "if ($x) { $y++; } else { --$y; }",
    "for my $i (@list) { print $i; }",
    "while ($n--) { last if $n < 0; }",
    "$obj->method($a, $b)->{key}[0];",
    "my $r = $a ? [1, 2] : { k => 'v' };",
    "my @s = sort { $a <=> $b } map { $_ * 2 } @list;",
    "$x .= \"str\" unless $done;",
    "{ my $inner = @{$ref}; }",
    "package Bar { our $v; }",
    "# comment\n",
];

fn program() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(STATEMENTS), 0..12)
        .prop_map(|statements| statements.join("\n"))
}

fn check_node(node: &SyntaxNode) -> Result<(), TestCaseError> {
    let range = node.text_range();
    let mut previous_end = range.start();
    for child in node.children_with_tokens() {
        let child_range = child.text_range();
        prop_assert!(
            child_range.start() >= previous_end,
            "{:?} overlaps its previous sibling",
            child
        );
        prop_assert!(range.contains_range(child_range), "{:?} escapes {:?}", child, node);
        previous_end = child_range.end();
        if let Some(child_node) = child.as_node() {
            let parent = child_node.parent();
            prop_assert_eq!(parent.as_ref(), Some(node));
            check_node(child_node)?;
        }
    }
    prop_assert_eq!(previous_end, range.end(), "children do not cover {:?}", node);
    Ok(())
}

proptest! {
    #[test]
    fn test_generated_programs_keep_tree_invariants(source in program()) {
        let parse = parse(&source);
        let root = parse.syntax();
        prop_assert!(root.parent().is_none());
        prop_assert_eq!(root.text().to_string(), source);
        check_node(&root)?;
    }

    #[test]
    fn test_valid_programs_parse_without_errors(source in program()) {
        let parse = parse(&source);
        prop_assert!(parse.ok(), "errors: {:?}\ninput: {}", parse.errors, source);
    }

    #[test]
    fn test_truncated_programs_keep_tree_invariants(
        source in program(),
        cut in any::<prop::sample::Index>(),
    ) {
        let boundaries: Vec<usize> = source
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(source.len()))
            .collect();
        let truncated = &source[..boundaries[cut.index(boundaries.len())]];
        let parse = parse(truncated);
        prop_assert_eq!(parse.syntax().text().to_string(), truncated);
        check_node(&parse.syntax())?;
    }
}
