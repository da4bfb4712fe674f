//! Element factory: syntax kind → typed element constructor.

use std::sync::LazyLock;

use rustc_hash::FxHashMap;
use tracing::{debug, error};

use super::expr::*;
use super::nodes::*;
use super::{AstNode, PerlVisitor, UnknownNodeType};
use crate::parser::{SyntaxKind, SyntaxNode};

/// Builds a typed element from a node of the kind it was registered for.
pub type ElementConstructor = fn(SyntaxNode) -> Option<PerlElement>;

macro_rules! perl_elements {
    ($($variant:ident($ty:ident) = $kind:ident => $visit:ident),* $(,)?) => {
        /// Every typed element, one variant per composite syntax kind.
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum PerlElement {
            $($variant($ty),)*
        }

        impl PerlElement {
            pub fn syntax(&self) -> &SyntaxNode {
                match self {
                    $(Self::$variant(n) => n.syntax(),)*
                }
            }

            /// Dispatch to the most specific method `visitor` implements.
            pub fn accept(&self, visitor: &mut dyn PerlVisitor) {
                match self {
                    $(Self::$variant(n) => visitor.$visit(n),)*
                }
            }
        }

        impl ElementFactory {
            fn register_perl_elements(&mut self) {
                $(
                    self.register(SyntaxKind::$kind, |node| {
                        $ty::cast(node).map(PerlElement::$variant)
                    });
                )*
            }
        }
    };
}

perl_elements! {
    SourceFile(SourceFile) = SOURCE_FILE => visit_source_file,
    Block(Block) = BLOCK => visit_block,
    PackageStatement(PackageStatement) = PACKAGE_STATEMENT => visit_package_statement,
    UseStatement(UseStatement) = USE_STATEMENT => visit_use_statement,
    SubDefinition(SubDefinition) = SUB_DEFINITION => visit_sub_definition,
    Prototype(Prototype) = PROTOTYPE => visit_prototype,
    IfStatement(IfStatement) = IF_STATEMENT => visit_if_statement,
    ElsifClause(ElsifClause) = ELSIF_CLAUSE => visit_elsif_clause,
    ElseClause(ElseClause) = ELSE_CLAUSE => visit_else_clause,
    Condition(Condition) = CONDITION => visit_condition,
    WhileStatement(WhileStatement) = WHILE_STATEMENT => visit_while_statement,
    ForStatement(ForStatement) = FOR_STATEMENT => visit_for_statement,
    ReturnStatement(ReturnStatement) = RETURN_STATEMENT => visit_return_statement,
    ExprStatement(ExprStatement) = EXPR_STATEMENT => visit_expr_statement,
    StatementModifier(StatementModifier) = STATEMENT_MODIFIER => visit_statement_modifier,
    VariableDeclaration(VariableDeclaration) = VARIABLE_DECLARATION => visit_variable_declaration,
    ScalarVariable(ScalarVariable) = SCALAR_VARIABLE => visit_scalar_variable,
    ArrayVariable(ArrayVariable) = ARRAY_VARIABLE => visit_array_variable,
    HashVariable(HashVariable) = HASH_VARIABLE => visit_hash_variable,
    ArrayIndexVariable(ArrayIndexVariable) = ARRAY_INDEX_VARIABLE => visit_array_index_variable,
    AssignExpr(AssignExpr) = ASSIGN_EXPR => visit_assign_expr,
    TernaryExpr(TernaryExpr) = TERNARY_EXPR => visit_ternary_expr,
    BinaryExpr(BinaryExpr) = BINARY_EXPR => visit_binary_expr,
    UnaryExpr(UnaryExpr) = UNARY_EXPR => visit_unary_expr,
    Op3PrefixExpr(Op3PrefixExpr) = OP3_PREFIX_EXPR => visit_op3_prefix_expr,
    Op3SuffixExpr(Op3SuffixExpr) = OP3_SUFFIX_EXPR => visit_op3_suffix_expr,
    ElementExpr(ElementExpr) = ELEMENT_EXPR => visit_element_expr,
    MethodCallExpr(MethodCallExpr) = METHOD_CALL_EXPR => visit_method_call_expr,
    CallExpr(CallExpr) = CALL_EXPR => visit_call_expr,
    ArgList(ArgList) = ARG_LIST => visit_arg_list,
    ListExpr(ListExpr) = LIST_EXPR => visit_list_expr,
    AnonArrayExpr(AnonArrayExpr) = ANON_ARRAY_EXPR => visit_anon_array_expr,
    AnonHashExpr(AnonHashExpr) = ANON_HASH_EXPR => visit_anon_hash_expr,
    AnonSubExpr(AnonSubExpr) = ANON_SUB_EXPR => visit_anon_sub_expr,
    DerefExpr(DerefExpr) = DEREF_EXPR => visit_deref_expr,
    Literal(Literal) = LITERAL => visit_literal,
    Bareword(Bareword) = BAREWORD_EXPR => visit_bareword,
    Error(ErrorNode) = ERROR => visit_error,
}

impl PerlElement {
    pub fn kind(&self) -> SyntaxKind {
        self.syntax().kind()
    }

    /// The element viewed through its expression capability, if it has one.
    pub fn as_expr(&self) -> Option<Expr> {
        Expr::cast(self.syntax().clone())
    }

    pub fn as_stmt(&self) -> Option<Stmt> {
        Stmt::cast(self.syntax().clone())
    }
}

/// Registry of element constructors keyed by syntax kind.
#[derive(Debug, Clone, Default)]
pub struct ElementFactory {
    constructors: FxHashMap<SyntaxKind, ElementConstructor>,
}

static GLOBAL: LazyLock<Result<ElementFactory, UnknownNodeType>> = LazyLock::new(|| {
    let factory = ElementFactory::perl();
    match &factory {
        Ok(f) => debug!(kinds = f.len(), "element factory initialised"),
        Err(err) => error!(%err, "element factory is incomplete"),
    }
    factory
});

impl ElementFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory covering every composite kind the parser emits.
    pub fn perl() -> Result<Self, UnknownNodeType> {
        let mut factory = Self::new();
        factory.register_perl_elements();
        factory.validate(SyntaxKind::NODE_KINDS)?;
        Ok(factory)
    }

    /// The process-wide factory, built and validated on first use.
    pub fn global() -> Result<&'static ElementFactory, UnknownNodeType> {
        GLOBAL.as_ref().map_err(|err| *err)
    }

    /// Register `constructor` for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: SyntaxKind, constructor: ElementConstructor) -> &mut Self {
        self.constructors.insert(kind, constructor);
        self
    }

    /// Check that every kind in `kinds` has a constructor.
    pub fn validate(&self, kinds: &[SyntaxKind]) -> Result<(), UnknownNodeType> {
        match kinds.iter().find(|kind| !self.constructors.contains_key(kind)) {
            Some(&kind) => Err(UnknownNodeType { kind }),
            None => Ok(()),
        }
    }

    /// Wrap `node` in its typed element. Cheap: clones a node handle.
    pub fn create(&self, node: &SyntaxNode) -> Result<PerlElement, UnknownNodeType> {
        let kind = node.kind();
        self.constructors
            .get(&kind)
            .and_then(|constructor| constructor(node.clone()))
            .ok_or(UnknownNodeType { kind })
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}
