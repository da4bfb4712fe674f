//! Syntax kinds for the Rowan-based CST
//!
//! This enum defines all possible node and token kinds in the syntax tree.
//! Composite kinds follow the Perl 5 statement and expression grammar.

/// All syntax kinds (tokens and nodes) in Perl 5 source
///
/// Tokens are leaf nodes (variables, barewords, operators).
/// Nodes are composite (statements, expressions, declarations).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // =========================================================================
    // TRIVIA (whitespace, comments, POD - preserved but not semantically meaningful)
    // =========================================================================
    WHITESPACE = 0,
    LINE_COMMENT,       // # comment
    POD,                // =pod ... =cut
    DATA_SECTION,       // __END__ / __DATA__ and everything after

    // =========================================================================
    // LITERALS AND NAMES
    // =========================================================================
    IDENT,              // foo, Foo::Bar
    NUMBER,             // 42, 3.14, 0x1f
    STRING,             // 'single' or "double"
    QW_LIST,            // qw(a b c)
    SCALAR_NAME,        // $x, $Foo::x
    ARRAY_NAME,         // @x
    HASH_NAME,          // %x
    ARRAY_LAST_INDEX,   // $#x

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    L_BRACE,            // {
    R_BRACE,            // }
    L_BRACKET,          // [
    R_BRACKET,          // ]
    L_PAREN,            // (
    R_PAREN,            // )
    SEMICOLON,          // ;
    COLON,              // :
    COMMA,              // ,
    FAT_COMMA,          // =>
    ARROW,              // ->
    DOT,                // .
    DOT_DOT,            // ..
    QUESTION,           // ?
    DOLLAR,             // $ (dereference sigil)
    AT,                 // @ (dereference sigil)
    EQ,                 // =
    PLUS_EQ,            // +=
    MINUS_EQ,           // -=
    STAR_EQ,            // *=
    SLASH_EQ,           // /=
    DOT_EQ,             // .=
    PIPE_PIPE_EQ,       // ||=
    SLASH_SLASH_EQ,     // //=
    AMP_AMP_EQ,         // &&=
    EQ_EQ,              // ==
    BANG_EQ,            // !=
    LT,                 // <
    GT,                 // >
    LT_EQ,              // <=
    GT_EQ,              // >=
    SPACESHIP,          // <=>
    EQ_TILDE,           // =~
    BANG_TILDE,         // !~
    PLUS,               // +
    MINUS,              // -
    STAR,               // *
    SLASH,              // /
    PERCENT,            // %
    STAR_STAR,          // **
    PLUS_PLUS,          // ++
    MINUS_MINUS,        // --
    BANG,               // !
    BACKSLASH,          // \
    AMP_AMP,            // &&
    PIPE_PIPE,          // ||
    SLASH_SLASH,        // //
    AMP,                // &
    PIPE,               // |
    CARET,              // ^
    TILDE,              // ~

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    MY_KW,
    OUR_KW,
    LOCAL_KW,
    STATE_KW,
    SUB_KW,
    PACKAGE_KW,
    USE_KW,
    NO_KW,
    IF_KW,
    UNLESS_KW,
    ELSIF_KW,
    ELSE_KW,
    WHILE_KW,
    UNTIL_KW,
    FOR_KW,
    FOREACH_KW,
    RETURN_KW,
    AND_KW,
    OR_KW,
    NOT_KW,
    XOR_KW,
    EQ_KW,              // eq
    NE_KW,              // ne
    LT_KW,              // lt
    GT_KW,              // gt
    LE_KW,              // le
    GE_KW,              // ge
    CMP_KW,             // cmp

    // =========================================================================
    // NODES - statements
    // =========================================================================
    SOURCE_FILE,
    BLOCK,
    PACKAGE_STATEMENT,
    USE_STATEMENT,
    SUB_DEFINITION,
    PROTOTYPE,
    IF_STATEMENT,
    ELSIF_CLAUSE,
    ELSE_CLAUSE,
    CONDITION,
    WHILE_STATEMENT,
    FOR_STATEMENT,
    RETURN_STATEMENT,
    EXPR_STATEMENT,
    STATEMENT_MODIFIER,

    // =========================================================================
    // NODES - declarations and variables
    // =========================================================================
    VARIABLE_DECLARATION,
    SCALAR_VARIABLE,
    ARRAY_VARIABLE,
    HASH_VARIABLE,
    ARRAY_INDEX_VARIABLE,

    // =========================================================================
    // NODES - expressions
    // =========================================================================
    ASSIGN_EXPR,
    TERNARY_EXPR,
    BINARY_EXPR,
    UNARY_EXPR,
    OP3_PREFIX_EXPR,    // ++$x, --$x
    OP3_SUFFIX_EXPR,    // $x++, $x--
    ELEMENT_EXPR,       // $x[0], $h{k}, $r->[0]
    METHOD_CALL_EXPR,   // $obj->method(...)
    CALL_EXPR,          // foo(...), print $x
    ARG_LIST,
    LIST_EXPR,
    ANON_ARRAY_EXPR,
    ANON_HASH_EXPR,
    ANON_SUB_EXPR,
    DEREF_EXPR,         // @$x, %{$x}, $$x
    LITERAL,
    BAREWORD_EXPR,

    // Special
    ERROR,

    #[doc(hidden)]
    __LAST,
}

impl SyntaxKind {
    /// Every composite kind the parser can emit.
    ///
    /// The element factory must have a constructor for each of these.
    pub const NODE_KINDS: &'static [SyntaxKind] = &[
        Self::SOURCE_FILE,
        Self::BLOCK,
        Self::PACKAGE_STATEMENT,
        Self::USE_STATEMENT,
        Self::SUB_DEFINITION,
        Self::PROTOTYPE,
        Self::IF_STATEMENT,
        Self::ELSIF_CLAUSE,
        Self::ELSE_CLAUSE,
        Self::CONDITION,
        Self::WHILE_STATEMENT,
        Self::FOR_STATEMENT,
        Self::RETURN_STATEMENT,
        Self::EXPR_STATEMENT,
        Self::STATEMENT_MODIFIER,
        Self::VARIABLE_DECLARATION,
        Self::SCALAR_VARIABLE,
        Self::ARRAY_VARIABLE,
        Self::HASH_VARIABLE,
        Self::ARRAY_INDEX_VARIABLE,
        Self::ASSIGN_EXPR,
        Self::TERNARY_EXPR,
        Self::BINARY_EXPR,
        Self::UNARY_EXPR,
        Self::OP3_PREFIX_EXPR,
        Self::OP3_SUFFIX_EXPR,
        Self::ELEMENT_EXPR,
        Self::METHOD_CALL_EXPR,
        Self::CALL_EXPR,
        Self::ARG_LIST,
        Self::LIST_EXPR,
        Self::ANON_ARRAY_EXPR,
        Self::ANON_HASH_EXPR,
        Self::ANON_SUB_EXPR,
        Self::DEREF_EXPR,
        Self::LITERAL,
        Self::BAREWORD_EXPR,
        Self::ERROR,
    ];

    /// Check if this is a trivia token (whitespace, comment, POD)
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::WHITESPACE | Self::LINE_COMMENT | Self::POD | Self::DATA_SECTION
        )
    }

    /// Check if this is a keyword
    pub fn is_keyword(self) -> bool {
        (self as u16) >= (Self::MY_KW as u16) && (self as u16) <= (Self::CMP_KW as u16)
    }

    /// Check if this is a punctuation token
    pub fn is_punct(self) -> bool {
        (self as u16) >= (Self::L_BRACE as u16) && (self as u16) <= (Self::TILDE as u16)
    }

    /// Check if this is a composite node kind
    pub fn is_node(self) -> bool {
        (self as u16) >= (Self::SOURCE_FILE as u16) && (self as u16) <= (Self::ERROR as u16)
    }

    /// Check if this is a variable declarator keyword (`my`, `our`, `local`, `state`)
    pub fn is_declarator(self) -> bool {
        matches!(self, Self::MY_KW | Self::OUR_KW | Self::LOCAL_KW | Self::STATE_KW)
    }

    /// Check if this is an assignment operator
    pub fn is_assign_op(self) -> bool {
        matches!(
            self,
            Self::EQ
                | Self::PLUS_EQ
                | Self::MINUS_EQ
                | Self::STAR_EQ
                | Self::SLASH_EQ
                | Self::DOT_EQ
                | Self::PIPE_PIPE_EQ
                | Self::SLASH_SLASH_EQ
                | Self::AMP_AMP_EQ
        )
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

impl From<rowan::SyntaxKind> for SyntaxKind {
    fn from(raw: rowan::SyntaxKind) -> Self {
        assert!(raw.0 < SyntaxKind::__LAST as u16);
        // Safety: we control all syntax kinds and check bounds above
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }
}

/// Language definition for Rowan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PerlLanguage {}

impl rowan::Language for PerlLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        raw.into()
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type aliases for convenience
pub type SyntaxNode = rowan::SyntaxNode<PerlLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<PerlLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<PerlLanguage>;
pub type SyntaxNodeChildren = rowan::SyntaxNodeChildren<PerlLanguage>;
