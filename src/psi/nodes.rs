//! Statements, declarations and variables.

use smol_str::SmolStr;

use super::expr::Expr;
use super::{
    AstNode, StructuralError, child, first_significant_token, mandatory_child, missing, token,
};
use crate::parser::{SyntaxKind, SyntaxNode, SyntaxToken};

// ============================================================================
// Root
// ============================================================================

ast_node!(SourceFile, SOURCE_FILE);

impl SourceFile {
    pub fn statements(&self) -> impl Iterator<Item = Stmt> + '_ {
        self.0.children().filter_map(Stmt::cast)
    }
}

ast_node!(
    /// Unparseable input kept in the tree by error recovery.
    ErrorNode,
    ERROR
);

// ============================================================================
// Statements
// ============================================================================

/// Any statement that can appear in a file or block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Stmt {
    Block(Block),
    Package(PackageStatement),
    Use(UseStatement),
    SubDefinition(SubDefinition),
    If(IfStatement),
    While(WhileStatement),
    For(ForStatement),
    Return(ReturnStatement),
    Expr(ExprStatement),
}

impl AstNode for Stmt {
    fn can_cast(kind: SyntaxKind) -> bool {
        matches!(
            kind,
            SyntaxKind::BLOCK
                | SyntaxKind::PACKAGE_STATEMENT
                | SyntaxKind::USE_STATEMENT
                | SyntaxKind::SUB_DEFINITION
                | SyntaxKind::IF_STATEMENT
                | SyntaxKind::WHILE_STATEMENT
                | SyntaxKind::FOR_STATEMENT
                | SyntaxKind::RETURN_STATEMENT
                | SyntaxKind::EXPR_STATEMENT
        )
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::BLOCK => Some(Self::Block(Block(node))),
            SyntaxKind::PACKAGE_STATEMENT => Some(Self::Package(PackageStatement(node))),
            SyntaxKind::USE_STATEMENT => Some(Self::Use(UseStatement(node))),
            SyntaxKind::SUB_DEFINITION => Some(Self::SubDefinition(SubDefinition(node))),
            SyntaxKind::IF_STATEMENT => Some(Self::If(IfStatement(node))),
            SyntaxKind::WHILE_STATEMENT => Some(Self::While(WhileStatement(node))),
            SyntaxKind::FOR_STATEMENT => Some(Self::For(ForStatement(node))),
            SyntaxKind::RETURN_STATEMENT => Some(Self::Return(ReturnStatement(node))),
            SyntaxKind::EXPR_STATEMENT => Some(Self::Expr(ExprStatement(node))),
            _ => None,
        }
    }

    fn syntax(&self) -> &SyntaxNode {
        match self {
            Self::Block(n) => n.syntax(),
            Self::Package(n) => n.syntax(),
            Self::Use(n) => n.syntax(),
            Self::SubDefinition(n) => n.syntax(),
            Self::If(n) => n.syntax(),
            Self::While(n) => n.syntax(),
            Self::For(n) => n.syntax(),
            Self::Return(n) => n.syntax(),
            Self::Expr(n) => n.syntax(),
        }
    }
}

ast_node!(Block, BLOCK);

impl Block {
    pub fn statements(&self) -> impl Iterator<Item = Stmt> + '_ {
        self.0.children().filter_map(Stmt::cast)
    }

    pub fn is_closed(&self) -> bool {
        token(&self.0, SyntaxKind::R_BRACE).is_some()
    }
}

ast_node!(PackageStatement, PACKAGE_STATEMENT);

impl PackageStatement {
    pub fn name_token(&self) -> Result<SyntaxToken, StructuralError> {
        token(&self.0, SyntaxKind::IDENT).ok_or_else(|| missing(&self.0, "package name"))
    }

    pub fn name(&self) -> Result<SmolStr, StructuralError> {
        self.name_token().map(|t| SmolStr::new(t.text()))
    }

    pub fn version(&self) -> Option<SyntaxToken> {
        token(&self.0, SyntaxKind::NUMBER)
    }

    /// Body of the `package NAME { ... }` form.
    pub fn block(&self) -> Option<Block> {
        child(&self.0)
    }
}

ast_node!(UseStatement, USE_STATEMENT);

impl UseStatement {
    /// `no Module` rather than `use Module`.
    pub fn is_no(&self) -> bool {
        first_significant_token(&self.0).is_some_and(|t| t.kind() == SyntaxKind::NO_KW)
    }

    /// Absent for `use VERSION;`.
    pub fn module_name(&self) -> Option<SmolStr> {
        token(&self.0, SyntaxKind::IDENT).map(|t| SmolStr::new(t.text()))
    }

    pub fn version(&self) -> Option<SyntaxToken> {
        token(&self.0, SyntaxKind::NUMBER)
    }

    /// Import list, e.g. `qw(max min)`.
    pub fn imports(&self) -> Option<Expr> {
        child(&self.0)
    }
}

ast_node!(SubDefinition, SUB_DEFINITION);

impl SubDefinition {
    pub fn name_token(&self) -> Result<SyntaxToken, StructuralError> {
        token(&self.0, SyntaxKind::IDENT).ok_or_else(|| missing(&self.0, "sub name"))
    }

    pub fn name(&self) -> Result<SmolStr, StructuralError> {
        self.name_token().map(|t| SmolStr::new(t.text()))
    }

    pub fn prototype(&self) -> Option<Prototype> {
        child(&self.0)
    }

    /// Absent for forward declarations (`sub foo;`).
    pub fn body(&self) -> Option<Block> {
        child(&self.0)
    }
}

ast_node!(Prototype, PROTOTYPE);

impl Prototype {
    /// Text between the parentheses.
    pub fn text(&self) -> String {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| !matches!(t.kind(), SyntaxKind::L_PAREN | SyntaxKind::R_PAREN))
            .map(|t| t.text().to_string())
            .collect()
    }
}

ast_node!(IfStatement, IF_STATEMENT);

impl IfStatement {
    pub fn is_unless(&self) -> bool {
        first_significant_token(&self.0).is_some_and(|t| t.kind() == SyntaxKind::UNLESS_KW)
    }

    pub fn condition(&self) -> Result<Condition, StructuralError> {
        mandatory_child(&self.0, "condition")
    }

    pub fn then_block(&self) -> Result<Block, StructuralError> {
        mandatory_child(&self.0, "block")
    }

    pub fn elsif_clauses(&self) -> impl Iterator<Item = ElsifClause> + '_ {
        self.0.children().filter_map(ElsifClause::cast)
    }

    pub fn else_clause(&self) -> Option<ElseClause> {
        child(&self.0)
    }
}

ast_node!(ElsifClause, ELSIF_CLAUSE);

impl ElsifClause {
    pub fn condition(&self) -> Result<Condition, StructuralError> {
        mandatory_child(&self.0, "condition")
    }

    pub fn block(&self) -> Result<Block, StructuralError> {
        mandatory_child(&self.0, "block")
    }
}

ast_node!(ElseClause, ELSE_CLAUSE);

impl ElseClause {
    pub fn block(&self) -> Result<Block, StructuralError> {
        mandatory_child(&self.0, "block")
    }
}

ast_node!(
    /// Parenthesised header of `if`, `while` and `for`.
    Condition,
    CONDITION
);

impl Condition {
    pub fn expr(&self) -> Result<Expr, StructuralError> {
        mandatory_child(&self.0, "condition expression")
    }

    /// All expressions in order; three for a C-style `for` header.
    pub fn exprs(&self) -> impl Iterator<Item = Expr> + '_ {
        self.0.children().filter_map(Expr::cast)
    }

    pub fn is_c_style(&self) -> bool {
        token(&self.0, SyntaxKind::SEMICOLON).is_some()
    }
}

ast_node!(WhileStatement, WHILE_STATEMENT);

impl WhileStatement {
    pub fn is_until(&self) -> bool {
        first_significant_token(&self.0).is_some_and(|t| t.kind() == SyntaxKind::UNTIL_KW)
    }

    pub fn condition(&self) -> Result<Condition, StructuralError> {
        mandatory_child(&self.0, "condition")
    }

    pub fn body(&self) -> Result<Block, StructuralError> {
        mandatory_child(&self.0, "loop body")
    }
}

ast_node!(ForStatement, FOR_STATEMENT);

impl ForStatement {
    /// `foreach my $x (...)`
    pub fn declaration(&self) -> Option<VariableDeclaration> {
        child(&self.0)
    }

    /// Loop variable, declared or not.
    pub fn iterator(&self) -> Option<ScalarVariable> {
        match self.declaration() {
            Some(decl) => decl.variables().find_map(|v| match v {
                Variable::Scalar(s) => Some(s),
                _ => None,
            }),
            None => child(&self.0),
        }
    }

    pub fn header(&self) -> Result<Condition, StructuralError> {
        mandatory_child(&self.0, "loop header")
    }

    pub fn body(&self) -> Result<Block, StructuralError> {
        mandatory_child(&self.0, "loop body")
    }
}

ast_node!(ReturnStatement, RETURN_STATEMENT);

impl ReturnStatement {
    pub fn value(&self) -> Option<Expr> {
        child(&self.0)
    }

    pub fn modifier(&self) -> Option<StatementModifier> {
        child(&self.0)
    }
}

ast_node!(ExprStatement, EXPR_STATEMENT);

impl ExprStatement {
    pub fn expr(&self) -> Result<Expr, StructuralError> {
        mandatory_child(&self.0, "expression")
    }

    pub fn modifier(&self) -> Option<StatementModifier> {
        child(&self.0)
    }
}

ast_node!(StatementModifier, STATEMENT_MODIFIER);

impl StatementModifier {
    /// `if`, `unless`, `while`, `until`, `for` or `foreach`.
    pub fn keyword(&self) -> Result<SyntaxKind, StructuralError> {
        first_significant_token(&self.0)
            .map(|t| t.kind())
            .ok_or_else(|| missing(&self.0, "modifier keyword"))
    }

    pub fn condition(&self) -> Result<Expr, StructuralError> {
        mandatory_child(&self.0, "modifier expression")
    }
}

// ============================================================================
// Declarations
// ============================================================================

/// The keyword introducing a variable declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Declarator {
    My,
    Our,
    Local,
    State,
}

impl Declarator {
    pub fn from_kind(kind: SyntaxKind) -> Option<Self> {
        match kind {
            SyntaxKind::MY_KW => Some(Self::My),
            SyntaxKind::OUR_KW => Some(Self::Our),
            SyntaxKind::LOCAL_KW => Some(Self::Local),
            SyntaxKind::STATE_KW => Some(Self::State),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::My => "my",
            Self::Our => "our",
            Self::Local => "local",
            Self::State => "state",
        }
    }
}

ast_node!(VariableDeclaration, VARIABLE_DECLARATION);

impl VariableDeclaration {
    pub fn declarator(&self) -> Result<Declarator, StructuralError> {
        first_significant_token(&self.0)
            .and_then(|t| Declarator::from_kind(t.kind()))
            .ok_or_else(|| missing(&self.0, "declarator keyword"))
    }

    /// Variables introduced directly by this declaration.
    ///
    /// Empty for `local $h{key}`, which localises an element rather than
    /// declaring a variable.
    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.0.children().filter_map(Variable::cast)
    }

    /// `my ($a, $b)` rather than `my $a`.
    pub fn is_list(&self) -> bool {
        token(&self.0, SyntaxKind::L_PAREN).is_some()
    }
}

// ============================================================================
// Variables
// ============================================================================

/// Split `Foo::Bar::x` into (`Some("Foo::Bar")`, `"x"`).
pub fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.rfind("::") {
        Some(0) => (Some(super::DEFAULT_NAMESPACE), &name[2..]),
        Some(idx) => (Some(&name[..idx]), &name[idx + 2..]),
        None => (None, name),
    }
}

macro_rules! variable_node {
    ($name:ident, $kind:ident, $token:ident, $sigil_len:expr) => {
        ast_node!($name, $kind);

        impl $name {
            pub fn name_token(&self) -> Result<SyntaxToken, StructuralError> {
                token(&self.0, SyntaxKind::$token)
                    .ok_or_else(|| missing(&self.0, "variable name"))
            }

            /// Name without the sigil, package qualifier kept: `Foo::x` for `$Foo::x`.
            pub fn name(&self) -> Result<SmolStr, StructuralError> {
                self.name_token()
                    .map(|t| SmolStr::new(t.text().get($sigil_len..).unwrap_or_default()))
            }

            /// The declaration this variable is introduced by, if any.
            pub fn declaration(&self) -> Option<VariableDeclaration> {
                self.0.parent().and_then(VariableDeclaration::cast)
            }
        }
    };
}

variable_node!(ScalarVariable, SCALAR_VARIABLE, SCALAR_NAME, 1);
variable_node!(ArrayVariable, ARRAY_VARIABLE, ARRAY_NAME, 1);
variable_node!(HashVariable, HASH_VARIABLE, HASH_NAME, 1);
variable_node!(ArrayIndexVariable, ARRAY_INDEX_VARIABLE, ARRAY_LAST_INDEX, 2);

/// Any sigiled variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Variable {
    Scalar(ScalarVariable),
    Array(ArrayVariable),
    Hash(HashVariable),
    ArrayIndex(ArrayIndexVariable),
}

impl AstNode for Variable {
    fn can_cast(kind: SyntaxKind) -> bool {
        matches!(
            kind,
            SyntaxKind::SCALAR_VARIABLE
                | SyntaxKind::ARRAY_VARIABLE
                | SyntaxKind::HASH_VARIABLE
                | SyntaxKind::ARRAY_INDEX_VARIABLE
        )
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::SCALAR_VARIABLE => Some(Self::Scalar(ScalarVariable(node))),
            SyntaxKind::ARRAY_VARIABLE => Some(Self::Array(ArrayVariable(node))),
            SyntaxKind::HASH_VARIABLE => Some(Self::Hash(HashVariable(node))),
            SyntaxKind::ARRAY_INDEX_VARIABLE => Some(Self::ArrayIndex(ArrayIndexVariable(node))),
            _ => None,
        }
    }

    fn syntax(&self) -> &SyntaxNode {
        match self {
            Self::Scalar(n) => n.syntax(),
            Self::Array(n) => n.syntax(),
            Self::Hash(n) => n.syntax(),
            Self::ArrayIndex(n) => n.syntax(),
        }
    }
}

impl Variable {
    pub fn name(&self) -> Result<SmolStr, StructuralError> {
        match self {
            Self::Scalar(n) => n.name(),
            Self::Array(n) => n.name(),
            Self::Hash(n) => n.name(),
            Self::ArrayIndex(n) => n.name(),
        }
    }

    pub fn sigil(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "$",
            Self::Array(_) => "@",
            Self::Hash(_) => "%",
            Self::ArrayIndex(_) => "$#",
        }
    }

    pub fn declaration(&self) -> Option<VariableDeclaration> {
        self.syntax().parent().and_then(VariableDeclaration::cast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn first<N: AstNode>(source: &str) -> N {
        let parse = parse(source);
        parse.syntax().descendants().find_map(N::cast).unwrap()
    }

    #[test]
    fn test_package_statement() {
        let package: PackageStatement = first("package Foo::Bar 1.02;");
        assert_eq!(package.name().unwrap(), "Foo::Bar");
        assert_eq!(package.version().unwrap().text(), "1.02");
        assert!(package.block().is_none());
    }

    #[test]
    fn test_package_missing_name_is_structural_error() {
        let package: PackageStatement = first("package ;");
        let err = package.name().unwrap_err();
        assert_eq!(err.node, SyntaxKind::PACKAGE_STATEMENT);
        assert_eq!(err.expected, "package name");
    }

    #[test]
    fn test_use_statement() {
        let use_stmt: UseStatement = first("use List::Util qw(max);");
        assert!(!use_stmt.is_no());
        assert_eq!(use_stmt.module_name().unwrap(), "List::Util");
        assert!(use_stmt.imports().is_some());

        let version: UseStatement = first("use 5.010;");
        assert!(version.module_name().is_none());
        assert_eq!(version.version().unwrap().text(), "5.010");

        let no: UseStatement = first("no strict 'refs';");
        assert!(no.is_no());
    }

    #[test]
    fn test_sub_definition() {
        let sub: SubDefinition = first("sub max($$) { return 1; }");
        assert_eq!(sub.name().unwrap(), "max");
        assert_eq!(sub.prototype().unwrap().text(), "$$");
        assert_eq!(sub.body().unwrap().statements().count(), 1);

        let forward: SubDefinition = first("sub later;");
        assert!(forward.body().is_none());
    }

    #[test]
    fn test_if_statement_clauses() {
        let stmt: IfStatement =
            first("unless ($a) { 1 } elsif ($b) { 2 } elsif ($c) { 3 } else { 4 }");
        assert!(stmt.is_unless());
        assert!(stmt.condition().unwrap().expr().is_ok());
        assert_eq!(stmt.elsif_clauses().count(), 2);
        assert!(stmt.else_clause().unwrap().block().is_ok());
    }

    #[test]
    fn test_for_statement_iterator() {
        let foreach: ForStatement = first("foreach my $item (@list) { }");
        assert_eq!(foreach.iterator().unwrap().name().unwrap(), "item");
        assert!(!foreach.header().unwrap().is_c_style());

        let c_style: ForStatement = first("for (my $i = 0; $i < 3; $i++) { }");
        assert!(c_style.iterator().is_none());
        let header = c_style.header().unwrap();
        assert!(header.is_c_style());
        assert_eq!(header.exprs().count(), 3);
    }

    #[test]
    fn test_variable_declaration_list() {
        let decl: VariableDeclaration = first("my ($self, @rest, %opts) = @_;");
        assert_eq!(decl.declarator().unwrap(), Declarator::My);
        assert!(decl.is_list());
        let names: Vec<_> = decl
            .variables()
            .map(|v| format!("{}{}", v.sigil(), v.name().unwrap()))
            .collect();
        assert_eq!(names, vec!["$self", "@rest", "%opts"]);
    }

    #[test]
    fn test_local_element_declares_nothing() {
        let decl: VariableDeclaration = first("local $ENV{PATH} = '';");
        assert_eq!(decl.declarator().unwrap(), Declarator::Local);
        assert_eq!(decl.variables().count(), 0);
    }

    #[test]
    fn test_variable_names() {
        let scalar: ScalarVariable = first("$Foo::Bar::x;");
        assert_eq!(scalar.name().unwrap(), "Foo::Bar::x");
        assert!(scalar.declaration().is_none());

        let last: ArrayIndexVariable = first("$#items;");
        assert_eq!(last.name().unwrap(), "items");
    }

    #[test]
    fn test_split_qualified() {
        assert_eq!(split_qualified("x"), (None, "x"));
        assert_eq!(split_qualified("Foo::Bar::x"), (Some("Foo::Bar"), "x"));
        assert_eq!(split_qualified("::x"), (Some("main"), "x"));
    }

    #[test]
    fn test_wrapping_is_idempotent() {
        let parse = parse("my $x = 1;");
        let node = parse
            .syntax()
            .descendants()
            .find(|n| n.kind() == SyntaxKind::SCALAR_VARIABLE)
            .unwrap();
        let a = ScalarVariable::cast(node.clone()).unwrap();
        let b = ScalarVariable::cast(node).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.name(), b.name());
        assert_eq!(a.declaration(), b.declaration());
    }
}
