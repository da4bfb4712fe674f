//! Parser tests over complete Perl statements
//!
//! Every case checks that the source parses without errors, that the tree
//! reproduces the input text, and that the expected construct is present.

#![allow(clippy::unwrap_used)]

use perl5::parser::{ErrorCode, SyntaxKind, parse};
use rstest::rstest;

use crate::helpers::source_fixtures;

fn assert_parses(source: &str) -> perl5::parser::Parse {
    let parse = parse(source);
    assert!(
        parse.ok(),
        "Failed to parse: {:?}\nInput: {}",
        parse.errors,
        source
    );
    assert_eq!(parse.syntax().text().to_string(), source, "tree is not lossless");
    parse
}

fn contains_kind(parse: &perl5::parser::Parse, kind: SyntaxKind) -> bool {
    parse.syntax().descendants().any(|node| node.kind() == kind)
}

// ============================================================================
// Statements
// ============================================================================

#[rstest]
#[case("package Foo;", SyntaxKind::PACKAGE_STATEMENT)]
#[case("package Foo::Bar 1.02 { }", SyntaxKind::PACKAGE_STATEMENT)]
#[case("use strict;", SyntaxKind::USE_STATEMENT)]
#[case("use List::Util qw(first sum);", SyntaxKind::USE_STATEMENT)]
#[case("no warnings 'once';", SyntaxKind::USE_STATEMENT)]
#[case("use 5.010;", SyntaxKind::USE_STATEMENT)]
#[case("sub run { }", SyntaxKind::SUB_DEFINITION)]
#[case("sub max($$) { }", SyntaxKind::PROTOTYPE)]
#[case("if ($x) { } elsif ($y) { } else { }", SyntaxKind::ELSIF_CLAUSE)]
#[case("unless ($x) { }", SyntaxKind::IF_STATEMENT)]
#[case("while (1) { last; }", SyntaxKind::WHILE_STATEMENT)]
#[case("until ($done) { }", SyntaxKind::WHILE_STATEMENT)]
#[case("foreach my $x (@list) { }", SyntaxKind::FOR_STATEMENT)]
#[case("for (my $i = 0; $i < 10; $i++) { }", SyntaxKind::FOR_STATEMENT)]
#[case("return;", SyntaxKind::RETURN_STATEMENT)]
#[case("{ my $scoped; }", SyntaxKind::BLOCK)]
#[case("print $x if $debug;", SyntaxKind::STATEMENT_MODIFIER)]
#[case("$i++ while $i < 10;", SyntaxKind::STATEMENT_MODIFIER)]
fn test_statements(#[case] source: &str, #[case] kind: SyntaxKind) {
    let parse = assert_parses(source);
    assert!(contains_kind(&parse, kind), "expected {:?} in {}", kind, source);
}

// ============================================================================
// Expressions
// ============================================================================

#[rstest]
#[case("$x = $y = 1;", SyntaxKind::ASSIGN_EXPR)]
#[case("$x ||= {};", SyntaxKind::ASSIGN_EXPR)]
#[case("$a ? $b : $c;", SyntaxKind::TERNARY_EXPR)]
#[case("$a // $b;", SyntaxKind::BINARY_EXPR)]
#[case("$s =~ $re;", SyntaxKind::BINARY_EXPR)]
#[case("open($fh, '<', $f) or die;", SyntaxKind::BINARY_EXPR)]
#[case("!$ok;", SyntaxKind::UNARY_EXPR)]
#[case("\\@list;", SyntaxKind::UNARY_EXPR)]
#[case("$i++;", SyntaxKind::OP3_SUFFIX_EXPR)]
#[case("$i--;", SyntaxKind::OP3_SUFFIX_EXPR)]
#[case("++$i;", SyntaxKind::OP3_PREFIX_EXPR)]
#[case("$list[0];", SyntaxKind::ELEMENT_EXPR)]
#[case("$self->{name};", SyntaxKind::ELEMENT_EXPR)]
#[case("$obj->method(1, 2);", SyntaxKind::METHOD_CALL_EXPR)]
#[case("Foo::Bar->new;", SyntaxKind::METHOD_CALL_EXPR)]
#[case("$code->(1);", SyntaxKind::CALL_EXPR)]
#[case("push @list, $x;", SyntaxKind::CALL_EXPR)]
#[case("my @even = grep { $_ % 2 == 0 } @all;", SyntaxKind::ARG_LIST)]
#[case("my $ref = [1, 2, 3];", SyntaxKind::ANON_ARRAY_EXPR)]
#[case("my $ref = { a => 1, b => 2 };", SyntaxKind::ANON_HASH_EXPR)]
#[case("my $cb = sub { return 1; };", SyntaxKind::ANON_SUB_EXPR)]
#[case("@{$ref};", SyntaxKind::DEREF_EXPR)]
#[case("$#list;", SyntaxKind::ARRAY_INDEX_VARIABLE)]
#[case("my @pair = (1, 2);", SyntaxKind::LIST_EXPR)]
#[case("my ($a, $b) = @_;", SyntaxKind::VARIABLE_DECLARATION)]
fn test_expressions(#[case] source: &str, #[case] kind: SyntaxKind) {
    let parse = assert_parses(source);
    assert!(contains_kind(&parse, kind), "expected {:?} in {}", kind, source);
}

#[rstest]
#[case(source_fixtures::MODULE)]
#[case(source_fixtures::TWO_PACKAGES)]
#[case(source_fixtures::CONTROL_FLOW)]
fn test_fixtures_parse_cleanly(#[case] source: &str) {
    assert_parses(source);
}

#[test]
fn test_trivia_is_preserved() {
    let source = "# leading comment\nmy $x; # trailing\n\n=pod\n\ndocs\n\n=cut\nmy $y;\n";
    let parse = assert_parses(source);
    let comments = parse
        .syntax()
        .descendants_with_tokens()
        .filter(|element| element.kind() == SyntaxKind::LINE_COMMENT)
        .count();
    assert_eq!(comments, 2);
}

// ============================================================================
// Error recovery
// ============================================================================

#[rstest]
#[case("my $x = 1\nmy $y;", ErrorCode::E0201)]
#[case("sub { ", ErrorCode::E0202)]
#[case("package;", ErrorCode::E0301)]
#[case("my;", ErrorCode::E0302)]
#[case("$x = ;", ErrorCode::E0402)]
fn test_error_codes(#[case] source: &str, #[case] code: ErrorCode) {
    let parse = parse(source);
    assert!(
        parse.errors.iter().any(|error| error.code == code),
        "expected {} for {:?}, got {:?}",
        code,
        source,
        parse.errors
    );
    assert_eq!(parse.syntax().text().to_string(), source);
}

#[test]
fn test_recovery_keeps_later_statements() {
    let parse = parse("my $x = ;\n) ) )\nsub after { }\n");
    assert!(!parse.ok());
    assert!(contains_kind(&parse, SyntaxKind::ERROR));
    assert!(contains_kind(&parse, SyntaxKind::SUB_DEFINITION));
}
