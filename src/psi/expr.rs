//! Expressions, following perlop precedence tiers.

use smol_str::SmolStr;

use super::nodes::{Block, Variable, VariableDeclaration};
use super::{
    AstNode, StructuralError, child, first_significant_token, mandatory_child, missing, nth_child,
    token,
};
use crate::parser::{SyntaxKind, SyntaxNode, SyntaxToken};

/// Any expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Assign(AssignExpr),
    Ternary(TernaryExpr),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Op3Prefix(Op3PrefixExpr),
    Op3Suffix(Op3SuffixExpr),
    Element(ElementExpr),
    MethodCall(MethodCallExpr),
    Call(CallExpr),
    List(ListExpr),
    AnonArray(AnonArrayExpr),
    AnonHash(AnonHashExpr),
    AnonSub(AnonSubExpr),
    Deref(DerefExpr),
    Literal(Literal),
    Bareword(Bareword),
    Declaration(VariableDeclaration),
    Variable(Variable),
}

impl AstNode for Expr {
    fn can_cast(kind: SyntaxKind) -> bool {
        matches!(
            kind,
            SyntaxKind::ASSIGN_EXPR
                | SyntaxKind::TERNARY_EXPR
                | SyntaxKind::BINARY_EXPR
                | SyntaxKind::UNARY_EXPR
                | SyntaxKind::OP3_PREFIX_EXPR
                | SyntaxKind::OP3_SUFFIX_EXPR
                | SyntaxKind::ELEMENT_EXPR
                | SyntaxKind::METHOD_CALL_EXPR
                | SyntaxKind::CALL_EXPR
                | SyntaxKind::LIST_EXPR
                | SyntaxKind::ANON_ARRAY_EXPR
                | SyntaxKind::ANON_HASH_EXPR
                | SyntaxKind::ANON_SUB_EXPR
                | SyntaxKind::DEREF_EXPR
                | SyntaxKind::LITERAL
                | SyntaxKind::BAREWORD_EXPR
                | SyntaxKind::VARIABLE_DECLARATION
        ) || Variable::can_cast(kind)
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::ASSIGN_EXPR => Some(Self::Assign(AssignExpr(node))),
            SyntaxKind::TERNARY_EXPR => Some(Self::Ternary(TernaryExpr(node))),
            SyntaxKind::BINARY_EXPR => Some(Self::Binary(BinaryExpr(node))),
            SyntaxKind::UNARY_EXPR => Some(Self::Unary(UnaryExpr(node))),
            SyntaxKind::OP3_PREFIX_EXPR => Some(Self::Op3Prefix(Op3PrefixExpr(node))),
            SyntaxKind::OP3_SUFFIX_EXPR => Some(Self::Op3Suffix(Op3SuffixExpr(node))),
            SyntaxKind::ELEMENT_EXPR => Some(Self::Element(ElementExpr(node))),
            SyntaxKind::METHOD_CALL_EXPR => Some(Self::MethodCall(MethodCallExpr(node))),
            SyntaxKind::CALL_EXPR => Some(Self::Call(CallExpr(node))),
            SyntaxKind::LIST_EXPR => Some(Self::List(ListExpr(node))),
            SyntaxKind::ANON_ARRAY_EXPR => Some(Self::AnonArray(AnonArrayExpr(node))),
            SyntaxKind::ANON_HASH_EXPR => Some(Self::AnonHash(AnonHashExpr(node))),
            SyntaxKind::ANON_SUB_EXPR => Some(Self::AnonSub(AnonSubExpr(node))),
            SyntaxKind::DEREF_EXPR => Some(Self::Deref(DerefExpr(node))),
            SyntaxKind::LITERAL => Some(Self::Literal(Literal(node))),
            SyntaxKind::BAREWORD_EXPR => Some(Self::Bareword(Bareword(node))),
            SyntaxKind::VARIABLE_DECLARATION => {
                VariableDeclaration::cast(node).map(Self::Declaration)
            }
            _ => Variable::cast(node).map(Self::Variable),
        }
    }

    fn syntax(&self) -> &SyntaxNode {
        match self {
            Self::Assign(n) => n.syntax(),
            Self::Ternary(n) => n.syntax(),
            Self::Binary(n) => n.syntax(),
            Self::Unary(n) => n.syntax(),
            Self::Op3Prefix(n) => n.syntax(),
            Self::Op3Suffix(n) => n.syntax(),
            Self::Element(n) => n.syntax(),
            Self::MethodCall(n) => n.syntax(),
            Self::Call(n) => n.syntax(),
            Self::List(n) => n.syntax(),
            Self::AnonArray(n) => n.syntax(),
            Self::AnonHash(n) => n.syntax(),
            Self::AnonSub(n) => n.syntax(),
            Self::Deref(n) => n.syntax(),
            Self::Literal(n) => n.syntax(),
            Self::Bareword(n) => n.syntax(),
            Self::Declaration(n) => n.syntax(),
            Self::Variable(n) => n.syntax(),
        }
    }
}

/// Operator token: the first direct token child, operands being nodes.
fn operator(node: &SyntaxNode) -> Result<SyntaxToken, StructuralError> {
    first_significant_token(node).ok_or_else(|| missing(node, "operator"))
}

/// Items of a comma list; a lone expression is a one-item list.
fn flatten_list(expr: Option<Expr>) -> Vec<Expr> {
    match expr {
        Some(Expr::List(list)) if !list.is_parenthesized() => list.items().collect(),
        Some(expr) => vec![expr],
        None => Vec::new(),
    }
}

// ============================================================================
// Operators
// ============================================================================

ast_node!(AssignExpr, ASSIGN_EXPR);

impl AssignExpr {
    pub fn lhs(&self) -> Result<Expr, StructuralError> {
        nth_child(&self.0, 0, "assignment target")
    }

    pub fn rhs(&self) -> Result<Expr, StructuralError> {
        nth_child(&self.0, 1, "assigned value")
    }

    pub fn op(&self) -> Result<SyntaxKind, StructuralError> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .map(|t| t.kind())
            .find(|k| k.is_assign_op())
            .ok_or_else(|| missing(&self.0, "assignment operator"))
    }
}

ast_node!(TernaryExpr, TERNARY_EXPR);

impl TernaryExpr {
    pub fn condition(&self) -> Result<Expr, StructuralError> {
        nth_child(&self.0, 0, "condition")
    }

    pub fn then_branch(&self) -> Result<Expr, StructuralError> {
        nth_child(&self.0, 1, "then branch")
    }

    pub fn else_branch(&self) -> Result<Expr, StructuralError> {
        nth_child(&self.0, 2, "else branch")
    }
}

ast_node!(BinaryExpr, BINARY_EXPR);

impl BinaryExpr {
    pub fn lhs(&self) -> Result<Expr, StructuralError> {
        nth_child(&self.0, 0, "left operand")
    }

    pub fn rhs(&self) -> Result<Expr, StructuralError> {
        nth_child(&self.0, 1, "right operand")
    }

    pub fn op(&self) -> Result<SyntaxKind, StructuralError> {
        operator(&self.0).map(|t| t.kind())
    }
}

ast_node!(UnaryExpr, UNARY_EXPR);

impl UnaryExpr {
    pub fn op(&self) -> Result<SyntaxKind, StructuralError> {
        operator(&self.0).map(|t| t.kind())
    }

    pub fn operand(&self) -> Result<Expr, StructuralError> {
        mandatory_child(&self.0, "operand")
    }
}

ast_node!(
    /// Prefix auto-increment or auto-decrement: `++$i`, `--$i`.
    Op3PrefixExpr,
    OP3_PREFIX_EXPR
);

impl Op3PrefixExpr {
    pub fn expr(&self) -> Result<Expr, StructuralError> {
        mandatory_child(&self.0, "operand")
    }

    pub fn is_increment(&self) -> bool {
        token(&self.0, SyntaxKind::PLUS_PLUS).is_some()
    }
}

ast_node!(
    /// Suffix auto-increment or auto-decrement: `$i++`, `$i--`.
    ///
    /// Always has exactly one operand; the parser never builds one without it.
    Op3SuffixExpr,
    OP3_SUFFIX_EXPR
);

impl Op3SuffixExpr {
    pub fn expr(&self) -> Result<Expr, StructuralError> {
        mandatory_child(&self.0, "operand")
    }

    pub fn is_increment(&self) -> bool {
        token(&self.0, SyntaxKind::PLUS_PLUS).is_some()
    }
}

// ============================================================================
// Postfix
// ============================================================================

ast_node!(ElementExpr, ELEMENT_EXPR);

impl ElementExpr {
    /// The subscripted value: `$x` in `$x[0]`, `$r->{a}` in `$r->{a}[1]`.
    pub fn base(&self) -> Result<Expr, StructuralError> {
        nth_child(&self.0, 0, "subscripted value")
    }

    pub fn index(&self) -> Option<Expr> {
        self.0.children().filter_map(Expr::cast).nth(1)
    }

    /// `[...]` rather than `{...}`.
    pub fn is_array_subscript(&self) -> bool {
        token(&self.0, SyntaxKind::L_BRACKET).is_some()
    }

    pub fn has_arrow(&self) -> bool {
        token(&self.0, SyntaxKind::ARROW).is_some()
    }
}

ast_node!(MethodCallExpr, METHOD_CALL_EXPR);

impl MethodCallExpr {
    pub fn receiver(&self) -> Result<Expr, StructuralError> {
        mandatory_child(&self.0, "invocant")
    }

    /// Method name, or the scalar holding it for `$obj->$method`.
    pub fn method_name(&self) -> Result<SyntaxToken, StructuralError> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| !t.kind().is_trivia())
            .skip_while(|t| t.kind() != SyntaxKind::ARROW)
            .nth(1)
            .ok_or_else(|| missing(&self.0, "method name"))
    }

    pub fn args(&self) -> Option<ArgList> {
        child(&self.0)
    }
}

ast_node!(CallExpr, CALL_EXPR);

impl CallExpr {
    /// Called function name; `None` for calls through a code reference.
    pub fn name(&self) -> Option<SmolStr> {
        token(&self.0, SyntaxKind::IDENT)
            .or_else(|| token(&self.0, SyntaxKind::RETURN_KW))
            .map(|t| SmolStr::new(t.text()))
    }

    /// The code reference in `$code->(...)`.
    pub fn callee(&self) -> Option<Expr> {
        child(&self.0)
    }

    pub fn args(&self) -> Option<ArgList> {
        child(&self.0)
    }
}

ast_node!(ArgList, ARG_LIST);

impl ArgList {
    /// Block argument of `map { ... } @list` and friends.
    pub fn block(&self) -> Option<Block> {
        child(&self.0)
    }

    pub fn args(&self) -> Vec<Expr> {
        flatten_list(child(&self.0))
    }

    pub fn is_parenthesized(&self) -> bool {
        token(&self.0, SyntaxKind::L_PAREN).is_some()
    }
}

// ============================================================================
// Terms
// ============================================================================

ast_node!(ListExpr, LIST_EXPR);

impl ListExpr {
    pub fn items(&self) -> impl Iterator<Item = Expr> + '_ {
        self.0.children().filter_map(Expr::cast)
    }

    pub fn is_parenthesized(&self) -> bool {
        token(&self.0, SyntaxKind::L_PAREN).is_some()
    }
}

ast_node!(AnonArrayExpr, ANON_ARRAY_EXPR);

impl AnonArrayExpr {
    pub fn items(&self) -> Vec<Expr> {
        flatten_list(child(&self.0))
    }
}

ast_node!(AnonHashExpr, ANON_HASH_EXPR);

impl AnonHashExpr {
    /// Keys and values, interleaved.
    pub fn items(&self) -> Vec<Expr> {
        flatten_list(child(&self.0))
    }
}

ast_node!(AnonSubExpr, ANON_SUB_EXPR);

impl AnonSubExpr {
    pub fn body(&self) -> Result<Block, StructuralError> {
        mandatory_child(&self.0, "sub body")
    }
}

ast_node!(DerefExpr, DEREF_EXPR);

impl DerefExpr {
    pub fn sigil(&self) -> Result<SyntaxKind, StructuralError> {
        operator(&self.0).map(|t| t.kind())
    }

    /// `$ref` in `@$ref`; `None` for the block form `@{ ... }`.
    pub fn target(&self) -> Option<Expr> {
        child(&self.0)
    }

    pub fn block(&self) -> Option<Block> {
        child(&self.0)
    }
}

/// Literal flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Number,
    String,
    QwList,
}

ast_node!(Literal, LITERAL);

impl Literal {
    pub fn token(&self) -> Result<SyntaxToken, StructuralError> {
        first_significant_token(&self.0).ok_or_else(|| missing(&self.0, "literal token"))
    }

    pub fn kind(&self) -> Result<LiteralKind, StructuralError> {
        match self.token()?.kind() {
            SyntaxKind::NUMBER => Ok(LiteralKind::Number),
            SyntaxKind::STRING => Ok(LiteralKind::String),
            SyntaxKind::QW_LIST => Ok(LiteralKind::QwList),
            _ => Err(missing(&self.0, "literal token")),
        }
    }
}

ast_node!(Bareword, BAREWORD_EXPR);

impl Bareword {
    pub fn name(&self) -> Result<SmolStr, StructuralError> {
        token(&self.0, SyntaxKind::IDENT)
            .map(|t| SmolStr::new(t.text()))
            .ok_or_else(|| missing(&self.0, "bareword"))
    }
}
