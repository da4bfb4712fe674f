//! Element factory and visitor dispatch over whole files

#![allow(clippy::unwrap_used)]

use perl5::parser::{SyntaxKind, SyntaxNode, parse};
use perl5::psi::{
    self, AstNode, ElementFactory, Expr, Op3SuffixExpr, PerlElement, PerlVisitor, Stmt,
    SubDefinition, Variable,
};
use proptest::prelude::*;
use rstest::rstest;

use crate::helpers::source_fixtures;

#[rstest]
#[case(source_fixtures::MODULE)]
#[case(source_fixtures::TWO_PACKAGES)]
#[case(source_fixtures::CONTROL_FLOW)]
fn test_every_node_has_an_element(#[case] source: &str) {
    let factory = ElementFactory::global().unwrap();
    for node in parse(source).syntax().descendants() {
        let element = factory.create(&node).unwrap();
        assert_eq!(element.kind(), node.kind());
        assert_eq!(element.syntax(), &node);
    }
}

#[test]
fn test_wrapping_is_idempotent() {
    let root = parse(source_fixtures::MODULE).syntax();
    let factory = ElementFactory::global().unwrap();
    for node in root.descendants() {
        assert_eq!(factory.create(&node).unwrap(), factory.create(&node).unwrap());
    }

    let sub_node = root
        .descendants()
        .find(|n| n.kind() == SyntaxKind::SUB_DEFINITION)
        .unwrap();
    let first = SubDefinition::cast(sub_node.clone()).unwrap();
    let second = SubDefinition::cast(sub_node).unwrap();
    assert_eq!(first.name().unwrap(), second.name().unwrap());
    assert_eq!(first.body().is_some(), second.body().is_some());
}

#[test]
fn test_unregistered_kind_is_rejected() {
    let mut factory = ElementFactory::new();
    factory.register(SyntaxKind::SOURCE_FILE, |node| {
        psi::SourceFile::cast(node).map(PerlElement::SourceFile)
    });
    let err = factory.validate(SyntaxKind::NODE_KINDS).unwrap_err();
    assert_eq!(err.kind, SyntaxKind::BLOCK);
    assert!(psi::init().is_ok());
}

// ============================================================================
// Visitors
// ============================================================================

/// Counts calls per capability method.
#[derive(Default)]
struct CapabilityCounter {
    elements: usize,
    exprs: usize,
    stmts: usize,
    variables: usize,
}

impl PerlVisitor for CapabilityCounter {
    fn visit_element(&mut self, _node: &SyntaxNode) {
        self.elements += 1;
    }
    fn visit_expr(&mut self, _expr: &Expr) {
        self.exprs += 1;
    }
    fn visit_stmt(&mut self, _stmt: &Stmt) {
        self.stmts += 1;
    }
    fn visit_variable(&mut self, _variable: &Variable) {
        self.variables += 1;
    }
}

#[test]
fn test_walk_makes_one_call_per_node() {
    let root = parse(source_fixtures::CONTROL_FLOW).syntax();
    let mut counter = CapabilityCounter::default();
    psi::walk(&root, &mut counter).unwrap();

    let total = root.descendants().count();
    assert_eq!(
        counter.elements + counter.exprs + counter.stmts + counter.variables,
        total
    );

    let variables = root
        .descendants()
        .filter(|n| Variable::can_cast(n.kind()))
        .count();
    assert_eq!(counter.variables, variables);
    assert!(counter.stmts > 0);
}

/// Collects the names of subs.
#[derive(Default)]
struct SubNames(Vec<String>);

impl PerlVisitor for SubNames {
    fn visit_sub_definition(&mut self, node: &SubDefinition) {
        self.0.push(node.name().unwrap().to_string());
    }
}

#[test]
fn test_visitor_overriding_one_method() {
    let mut names = SubNames::default();
    psi::walk(&parse(source_fixtures::MODULE).syntax(), &mut names).unwrap();
    assert_eq!(names.0, vec!["new", "increment"]);
}

// ============================================================================
// Suffix increment
// ============================================================================

const OPERANDS: &[&str] = &["$i", "$x->{count}", "$list[0]", "$h{key}", "$$ref", "$obj->{a}[1]"];

proptest! {
    #[test]
    fn test_suffix_expr_always_has_operand(
        operand in prop::sample::select(OPERANDS),
        decrement in any::<bool>(),
    ) {
        let op = if decrement { "--" } else { "++" };
        let source = format!("{operand}{op};");
        let root = parse(&source).syntax();
        let suffix = root
            .descendants()
            .find_map(Op3SuffixExpr::cast)
            .unwrap();
        prop_assert!(suffix.expr().is_ok());
        prop_assert_eq!(suffix.is_increment(), !decrement);
        prop_assert_eq!(suffix.expr().unwrap().syntax().text().to_string(), operand);
    }
}
