//! Visitor over typed elements.
//!
//! Every method has a default that forwards to the next capability up:
//!
//! ```text
//! visit_scalar_variable ─┐
//! visit_array_variable  ─┼→ visit_variable ─┐
//! ...                   ─┘                  │
//! visit_op3_suffix_expr ─┬──────────────────┴→ visit_expr ─┐
//! ...                   ─┘                                 ├→ visit_element
//! visit_if_statement    ─┬→ visit_stmt ────────────────────┤
//! ...                   ─┘                                 │
//! visit_condition, visit_arg_list, ... ────────────────────┘
//! ```
//!
//! so a single `accept` always ends in exactly one call: the most specific
//! method the visitor overrides.

use super::expr::*;
use super::nodes::*;
use super::{AstNode, ElementFactory, UnknownNodeType};
use crate::parser::SyntaxNode;

macro_rules! forward {
    ($($method:ident($ty:ident) => $target:ident($wrap:path)),* $(,)?) => {
        $(
            fn $method(&mut self, node: &$ty) {
                self.$target(&$wrap(node.clone()))
            }
        )*
    };
}

macro_rules! to_element {
    ($($method:ident($ty:ident)),* $(,)?) => {
        $(
            fn $method(&mut self, node: &$ty) {
                self.visit_element(node.syntax())
            }
        )*
    };
}

/// Visitor over typed elements. Default implementations fall back to the
/// capability methods and end in a no-op `visit_element`.
pub trait PerlVisitor {
    fn visit_element(&mut self, _node: &SyntaxNode) {}

    fn visit_expr(&mut self, expr: &Expr) {
        self.visit_element(expr.syntax())
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        self.visit_element(stmt.syntax())
    }

    fn visit_variable(&mut self, variable: &Variable) {
        self.visit_expr(&Expr::Variable(variable.clone()))
    }

    forward! {
        visit_block(Block) => visit_stmt(Stmt::Block),
        visit_package_statement(PackageStatement) => visit_stmt(Stmt::Package),
        visit_use_statement(UseStatement) => visit_stmt(Stmt::Use),
        visit_sub_definition(SubDefinition) => visit_stmt(Stmt::SubDefinition),
        visit_if_statement(IfStatement) => visit_stmt(Stmt::If),
        visit_while_statement(WhileStatement) => visit_stmt(Stmt::While),
        visit_for_statement(ForStatement) => visit_stmt(Stmt::For),
        visit_return_statement(ReturnStatement) => visit_stmt(Stmt::Return),
        visit_expr_statement(ExprStatement) => visit_stmt(Stmt::Expr),

        visit_scalar_variable(ScalarVariable) => visit_variable(Variable::Scalar),
        visit_array_variable(ArrayVariable) => visit_variable(Variable::Array),
        visit_hash_variable(HashVariable) => visit_variable(Variable::Hash),
        visit_array_index_variable(ArrayIndexVariable) => visit_variable(Variable::ArrayIndex),

        visit_variable_declaration(VariableDeclaration) => visit_expr(Expr::Declaration),
        visit_assign_expr(AssignExpr) => visit_expr(Expr::Assign),
        visit_ternary_expr(TernaryExpr) => visit_expr(Expr::Ternary),
        visit_binary_expr(BinaryExpr) => visit_expr(Expr::Binary),
        visit_unary_expr(UnaryExpr) => visit_expr(Expr::Unary),
        visit_op3_prefix_expr(Op3PrefixExpr) => visit_expr(Expr::Op3Prefix),
        visit_op3_suffix_expr(Op3SuffixExpr) => visit_expr(Expr::Op3Suffix),
        visit_element_expr(ElementExpr) => visit_expr(Expr::Element),
        visit_method_call_expr(MethodCallExpr) => visit_expr(Expr::MethodCall),
        visit_call_expr(CallExpr) => visit_expr(Expr::Call),
        visit_list_expr(ListExpr) => visit_expr(Expr::List),
        visit_anon_array_expr(AnonArrayExpr) => visit_expr(Expr::AnonArray),
        visit_anon_hash_expr(AnonHashExpr) => visit_expr(Expr::AnonHash),
        visit_anon_sub_expr(AnonSubExpr) => visit_expr(Expr::AnonSub),
        visit_deref_expr(DerefExpr) => visit_expr(Expr::Deref),
        visit_literal(Literal) => visit_expr(Expr::Literal),
        visit_bareword(Bareword) => visit_expr(Expr::Bareword),
    }

    to_element! {
        visit_source_file(SourceFile),
        visit_prototype(Prototype),
        visit_elsif_clause(ElsifClause),
        visit_else_clause(ElseClause),
        visit_condition(Condition),
        visit_statement_modifier(StatementModifier),
        visit_arg_list(ArgList),
        visit_error(ErrorNode),
    }
}

/// Accept `visitor` on `root` and every node below it, in preorder.
pub fn walk(root: &SyntaxNode, visitor: &mut dyn PerlVisitor) -> Result<(), UnknownNodeType> {
    let factory = ElementFactory::global()?;
    for node in root.descendants() {
        factory.create(&node)?.accept(visitor);
    }
    Ok(())
}
