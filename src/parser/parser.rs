//! Recursive descent parser for Perl 5
//!
//! Builds a rowan GreenNode tree from tokens.
//! Supports error recovery and produces a lossless CST: every input byte ends
//! up in exactly one token of the tree.

use super::errors::{ErrorCode, SyntaxError};
use super::lexer::{Lexer, Token};
use super::syntax_kind::SyntaxKind;
use rowan::{Checkpoint, GreenNode, GreenNodeBuilder, TextRange, TextSize};

/// Lookahead sentinel past the last token.
const EOF: SyntaxKind = SyntaxKind::__LAST;

/// Nesting levels followed before the rest of a group becomes an ERROR node.
const MAX_DEPTH: u32 = 256;

/// List operators whose leading `{ ... }` argument is a block, not a hash.
const BLOCK_TAKING_CALLS: &[&str] = &[
    "map", "grep", "sort", "eval", "do", "first", "any", "all", "none",
];

/// Keywords that introduce a statement modifier (`EXPR if COND;`).
const MODIFIER_KEYWORDS: &[SyntaxKind] = &[
    SyntaxKind::IF_KW,
    SyntaxKind::UNLESS_KW,
    SyntaxKind::WHILE_KW,
    SyntaxKind::UNTIL_KW,
    SyntaxKind::FOR_KW,
    SyntaxKind::FOREACH_KW,
];

/// Parse result containing the green tree and any errors
#[derive(Debug, Clone)]
pub struct Parse {
    pub green: GreenNode,
    pub errors: Vec<SyntaxError>,
}

impl Parse {
    /// Get the root syntax node
    pub fn syntax(&self) -> super::SyntaxNode {
        super::SyntaxNode::new_root(self.green.clone())
    }

    /// Check if parsing succeeded without errors
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse Perl source code into a CST
pub fn parse(input: &str) -> Parse {
    let tokens: Vec<_> = Lexer::new(input).collect();
    let mut parser = Parser::new(&tokens);
    parser.parse_source_file();
    parser.finish()
}

/// The parser state
struct Parser<'a> {
    tokens: &'a [Token<'a>],
    pos: usize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<SyntaxError>,
    depth: u32,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token<'a>]) -> Self {
        Self {
            tokens,
            pos: 0,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
            depth: 0,
        }
    }

    fn finish(self) -> Parse {
        Parse {
            green: self.builder.finish(),
            errors: self.errors,
        }
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    fn current(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    /// Kind of the raw current token, trivia included.
    fn current_raw(&self) -> SyntaxKind {
        self.current().map(|t| t.kind).unwrap_or(EOF)
    }

    fn nth_token(&self, n: usize) -> Option<&Token<'a>> {
        self.tokens[self.pos.min(self.tokens.len())..]
            .iter()
            .filter(|t| !t.kind.is_trivia())
            .nth(n)
    }

    /// Look ahead, skipping trivia
    fn nth(&self, n: usize) -> SyntaxKind {
        self.nth_token(n).map(|t| t.kind).unwrap_or(EOF)
    }

    fn peek(&self) -> SyntaxKind {
        self.nth(0)
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.peek() == kind
    }

    fn at_any(&self, kinds: &[SyntaxKind]) -> bool {
        kinds.contains(&self.peek())
    }

    fn at_eof(&self) -> bool {
        self.peek() == EOF
    }

    /// Tokens that end an expression without belonging to it.
    fn at_expr_terminator(&self) -> bool {
        matches!(
            self.peek(),
            SyntaxKind::R_PAREN
                | SyntaxKind::R_BRACKET
                | SyntaxKind::R_BRACE
                | SyntaxKind::SEMICOLON
                | SyntaxKind::COLON
                | SyntaxKind::OR_KW
                | SyntaxKind::AND_KW
                | SyntaxKind::XOR_KW
                | EOF
        ) || self.at_any(MODIFIER_KEYWORDS)
    }

    /// Whether `kind` can begin an argument of a list operator (`print $x`).
    fn starts_list_argument(kind: SyntaxKind) -> bool {
        matches!(
            kind,
            SyntaxKind::SCALAR_NAME
                | SyntaxKind::ARRAY_NAME
                | SyntaxKind::HASH_NAME
                | SyntaxKind::ARRAY_LAST_INDEX
                | SyntaxKind::NUMBER
                | SyntaxKind::STRING
                | SyntaxKind::QW_LIST
                | SyntaxKind::IDENT
                | SyntaxKind::L_BRACE
                | SyntaxKind::L_BRACKET
                | SyntaxKind::BACKSLASH
                | SyntaxKind::SUB_KW
                | SyntaxKind::DOLLAR
                | SyntaxKind::AT
                | SyntaxKind::BANG
        ) || kind.is_declarator()
    }

    /// Whether the next token can begin an expression.
    fn at_expr_start(&self) -> bool {
        let kind = self.peek();
        Self::starts_list_argument(kind)
            || matches!(
                kind,
                SyntaxKind::L_PAREN
                    | SyntaxKind::MINUS
                    | SyntaxKind::PLUS
                    | SyntaxKind::TILDE
                    | SyntaxKind::PLUS_PLUS
                    | SyntaxKind::MINUS_MINUS
                    | SyntaxKind::NOT_KW
                    | SyntaxKind::PERCENT
                    | SyntaxKind::AMP
                    | SyntaxKind::RETURN_KW
            )
    }

    // =========================================================================
    // Token consumption
    // =========================================================================

    /// Consume leading trivia and the next significant token.
    fn bump(&mut self) {
        self.skip_trivia();
        if let Some(token) = self.current() {
            self.builder.token(token.kind.into(), token.text);
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: SyntaxKind, code: ErrorCode) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.error(format!("expected {:?}", kind), code);
            false
        }
    }

    fn skip_trivia(&mut self) {
        while self.current().map(|t| t.kind.is_trivia()).unwrap_or(false) {
            if let Some(token) = self.current() {
                self.builder.token(token.kind.into(), token.text);
            }
            self.pos += 1;
        }
    }

    /// Statement terminator: required unless the enclosing block or file ends.
    fn expect_semicolon(&mut self) {
        if self.eat(SyntaxKind::SEMICOLON) || self.at(SyntaxKind::R_BRACE) || self.at_eof() {
            return;
        }
        self.error("expected `;`", ErrorCode::E0201);
    }

    // =========================================================================
    // Error handling
    // =========================================================================

    fn error(&mut self, message: impl Into<String>, code: ErrorCode) {
        let range = match self.nth_token(0) {
            Some(t) => TextRange::at(t.offset, TextSize::of(t.text)),
            None => {
                let end = self
                    .tokens
                    .last()
                    .map(|t| t.offset + TextSize::of(t.text))
                    .unwrap_or_default();
                TextRange::empty(end)
            }
        };
        self.errors.push(SyntaxError::new(message, range, code));
    }

    /// Record an error and wrap the offending token in an ERROR node.
    fn error_bump(&mut self, message: impl Into<String>, code: ErrorCode) {
        self.error(message, code);
        if self.at_eof() {
            return;
        }
        self.start_node(SyntaxKind::ERROR);
        self.bump();
        self.finish_node();
    }

    /// Run `parse` one nesting level deeper. Past `MAX_DEPTH` the rest of
    /// the current group is wrapped in an ERROR node and `too_deep` returned.
    fn nested<T>(&mut self, too_deep: T, parse: impl FnOnce(&mut Self) -> T) -> T {
        if self.depth >= MAX_DEPTH {
            self.skip_group();
            return too_deep;
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Consume tokens up to the closer of the enclosing bracket, a `;`
    /// outside brackets, or the end of input. Nothing is reported when the
    /// group is already exhausted.
    fn skip_group(&mut self) {
        if self.at_expr_terminator() {
            return;
        }
        self.error(format!("nesting deeper than {MAX_DEPTH} levels"), ErrorCode::E0205);
        self.start_node(SyntaxKind::ERROR);
        let mut open = 0usize;
        loop {
            match self.peek() {
                EOF => break,
                SyntaxKind::SEMICOLON if open == 0 => break,
                SyntaxKind::L_PAREN | SyntaxKind::L_BRACKET | SyntaxKind::L_BRACE => open += 1,
                SyntaxKind::R_PAREN | SyntaxKind::R_BRACKET | SyntaxKind::R_BRACE => {
                    if open == 0 {
                        break;
                    }
                    open -= 1;
                }
                _ => {}
            }
            self.bump();
        }
        self.finish_node();
    }

    // =========================================================================
    // Node building helpers
    // =========================================================================

    fn start_node(&mut self, kind: SyntaxKind) {
        self.skip_trivia();
        self.builder.start_node(kind.into());
    }

    fn start_node_at(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        self.builder.start_node_at(checkpoint, kind.into());
    }

    fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.skip_trivia();
        self.builder.checkpoint()
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// SourceFile = Statement*
    fn parse_source_file(&mut self) {
        self.builder.start_node(SyntaxKind::SOURCE_FILE.into());
        self.parse_statements(false);
        self.skip_trivia();
        self.finish_node();
    }

    /// Statements up to the end of input, or up to `}` inside a block.
    fn parse_statements(&mut self, in_block: bool) {
        loop {
            if self.at_eof() || (in_block && self.at(SyntaxKind::R_BRACE)) {
                break;
            }
            let pos_before = self.pos;
            self.nested((), Self::parse_statement);
            // Safety: if we didn't make progress, force-skip a token
            if self.pos == pos_before {
                self.error_bump(
                    format!("unexpected token: {:?}", self.peek()),
                    ErrorCode::E0901,
                );
            }
        }
    }

    fn parse_statement(&mut self) {
        match self.peek() {
            SyntaxKind::SEMICOLON => self.bump(),
            SyntaxKind::PACKAGE_KW => self.parse_package(),
            SyntaxKind::USE_KW | SyntaxKind::NO_KW => self.parse_use(),
            SyntaxKind::SUB_KW if self.nth(1) == SyntaxKind::IDENT => self.parse_sub_definition(),
            SyntaxKind::IF_KW | SyntaxKind::UNLESS_KW => self.parse_if(),
            SyntaxKind::WHILE_KW | SyntaxKind::UNTIL_KW => self.parse_while(),
            SyntaxKind::FOR_KW | SyntaxKind::FOREACH_KW => self.parse_for(),
            SyntaxKind::RETURN_KW => self.parse_return(),
            SyntaxKind::L_BRACE => self.parse_block(),
            SyntaxKind::ERROR => self.error_bump("invalid character", ErrorCode::E0101),
            _ if self.at_expr_start() => self.parse_expr_statement(),
            kind => self.error_bump(format!("unexpected token: {:?}", kind), ErrorCode::E0901),
        }
    }

    /// Block = '{' Statement* '}'
    fn parse_block(&mut self) {
        self.start_node(SyntaxKind::BLOCK);
        self.expect(SyntaxKind::L_BRACE, ErrorCode::E0303);
        self.parse_statements(true);
        self.expect(SyntaxKind::R_BRACE, ErrorCode::E0202);
        self.finish_node();
    }

    /// Package = 'package' Name Version? (';' | Block)
    fn parse_package(&mut self) {
        self.start_node(SyntaxKind::PACKAGE_STATEMENT);
        self.bump(); // package
        self.expect(SyntaxKind::IDENT, ErrorCode::E0301);
        self.eat(SyntaxKind::NUMBER);
        if self.at(SyntaxKind::L_BRACE) {
            self.parse_block();
        } else {
            self.expect_semicolon();
        }
        self.finish_node();
    }

    /// Use = ('use' | 'no') (Module Version? | Version) List? ';'
    fn parse_use(&mut self) {
        self.start_node(SyntaxKind::USE_STATEMENT);
        self.bump(); // use / no
        if self.eat(SyntaxKind::IDENT) {
            if self.at(SyntaxKind::NUMBER)
                && !matches!(self.nth(1), SyntaxKind::COMMA | SyntaxKind::FAT_COMMA)
            {
                self.bump();
            }
        } else if !self.eat(SyntaxKind::NUMBER) {
            self.error("expected module name or version", ErrorCode::E0301);
        }
        if !self.at_expr_terminator() {
            self.parse_expr();
        }
        self.expect_semicolon();
        self.finish_node();
    }

    /// Sub = 'sub' Name Prototype? (Block | ';')
    fn parse_sub_definition(&mut self) {
        self.start_node(SyntaxKind::SUB_DEFINITION);
        self.bump(); // sub
        self.expect(SyntaxKind::IDENT, ErrorCode::E0301);
        if self.at(SyntaxKind::L_PAREN) {
            self.parse_prototype();
        }
        if self.at(SyntaxKind::L_BRACE) {
            self.parse_block();
        } else if !self.eat(SyntaxKind::SEMICOLON) {
            self.error("expected sub body", ErrorCode::E0303);
        }
        self.finish_node();
    }

    /// Prototype or signature, kept as raw tokens: '(' ... ')'
    fn parse_prototype(&mut self) {
        self.start_node(SyntaxKind::PROTOTYPE);
        self.bump(); // (
        while !self.at_any(&[SyntaxKind::R_PAREN, SyntaxKind::L_BRACE, EOF]) {
            self.bump();
        }
        self.expect(SyntaxKind::R_PAREN, ErrorCode::E0203);
        self.finish_node();
    }

    /// If = ('if' | 'unless') Condition Block Elsif* Else?
    fn parse_if(&mut self) {
        self.start_node(SyntaxKind::IF_STATEMENT);
        self.bump(); // if / unless
        self.parse_condition();
        self.parse_block();
        while self.at(SyntaxKind::ELSIF_KW) {
            self.start_node(SyntaxKind::ELSIF_CLAUSE);
            self.bump();
            self.parse_condition();
            self.parse_block();
            self.finish_node();
        }
        if self.at(SyntaxKind::ELSE_KW) {
            self.start_node(SyntaxKind::ELSE_CLAUSE);
            self.bump();
            self.parse_block();
            self.finish_node();
        }
        self.finish_node();
    }

    /// Condition = '(' Expr ')'
    fn parse_condition(&mut self) {
        self.start_node(SyntaxKind::CONDITION);
        self.expect(SyntaxKind::L_PAREN, ErrorCode::E0902);
        if self.at(SyntaxKind::R_PAREN) {
            self.error("expected condition", ErrorCode::E0401);
        } else {
            self.parse_expr();
        }
        self.expect(SyntaxKind::R_PAREN, ErrorCode::E0203);
        self.finish_node();
    }

    /// While = ('while' | 'until') Condition Block
    fn parse_while(&mut self) {
        self.start_node(SyntaxKind::WHILE_STATEMENT);
        self.bump();
        self.parse_condition();
        self.parse_block();
        self.finish_node();
    }

    /// For = ('for' | 'foreach') Iterator? '(' (Expr | Init ';' Test ';' Step) ')' Block
    fn parse_for(&mut self) {
        self.start_node(SyntaxKind::FOR_STATEMENT);
        self.bump();
        if self.peek().is_declarator() {
            self.parse_variable_declaration();
        } else if self.at(SyntaxKind::SCALAR_NAME) {
            self.parse_variable();
        }

        self.start_node(SyntaxKind::CONDITION);
        self.expect(SyntaxKind::L_PAREN, ErrorCode::E0902);
        if !self.at_any(&[SyntaxKind::R_PAREN, SyntaxKind::SEMICOLON]) {
            self.parse_expr();
        }
        if self.eat(SyntaxKind::SEMICOLON) {
            if !self.at(SyntaxKind::SEMICOLON) {
                self.parse_expr();
            }
            self.expect(SyntaxKind::SEMICOLON, ErrorCode::E0201);
            if !self.at(SyntaxKind::R_PAREN) {
                self.parse_expr();
            }
        }
        self.expect(SyntaxKind::R_PAREN, ErrorCode::E0203);
        self.finish_node();

        self.parse_block();
        self.finish_node();
    }

    /// Return = 'return' Expr? Modifier? ';'
    fn parse_return(&mut self) {
        self.start_node(SyntaxKind::RETURN_STATEMENT);
        self.bump();
        if !self.at_expr_terminator() {
            self.parse_expr();
        }
        self.parse_statement_modifier();
        self.expect_semicolon();
        self.finish_node();
    }

    /// ExprStatement = Expr Modifier? ';'
    fn parse_expr_statement(&mut self) {
        self.start_node(SyntaxKind::EXPR_STATEMENT);
        self.parse_expr();
        self.parse_statement_modifier();
        self.expect_semicolon();
        self.finish_node();
    }

    /// Modifier = ('if' | 'unless' | 'while' | 'until' | 'for' | 'foreach') Expr
    fn parse_statement_modifier(&mut self) {
        if !self.at_any(MODIFIER_KEYWORDS) {
            return;
        }
        self.start_node(SyntaxKind::STATEMENT_MODIFIER);
        self.bump();
        if self.parse_expr().is_none() {
            self.error("expected modifier condition", ErrorCode::E0401);
        }
        self.finish_node();
    }

    // =========================================================================
    // Expressions (lowest precedence first, following perlop)
    // =========================================================================

    /// Returns the kind of the node produced, or `None` if nothing was parsed.
    fn parse_expr(&mut self) -> Option<SyntaxKind> {
        self.parse_low_or()
    }

    fn binary(
        &mut self,
        ops: &[SyntaxKind],
        operand: fn(&mut Self) -> Option<SyntaxKind>,
    ) -> Option<SyntaxKind> {
        let checkpoint = self.checkpoint();
        let mut kind = operand(self)?;
        while self.at_any(ops) {
            self.start_node_at(checkpoint, SyntaxKind::BINARY_EXPR);
            self.bump();
            if operand(self).is_none() {
                self.error("expected operand", ErrorCode::E0402);
            }
            self.finish_node();
            kind = SyntaxKind::BINARY_EXPR;
        }
        Some(kind)
    }

    fn parse_low_or(&mut self) -> Option<SyntaxKind> {
        self.binary(&[SyntaxKind::OR_KW, SyntaxKind::XOR_KW], Self::parse_low_and)
    }

    fn parse_low_and(&mut self) -> Option<SyntaxKind> {
        self.binary(&[SyntaxKind::AND_KW], Self::parse_low_not)
    }

    fn parse_low_not(&mut self) -> Option<SyntaxKind> {
        if self.at(SyntaxKind::NOT_KW) {
            self.start_node(SyntaxKind::UNARY_EXPR);
            self.bump();
            if self.nested(Some(SyntaxKind::ERROR), Self::parse_low_not).is_none() {
                self.error("expected operand", ErrorCode::E0402);
            }
            self.finish_node();
            return Some(SyntaxKind::UNARY_EXPR);
        }
        self.parse_list()
    }

    /// List = Assign ((',' | '=>') Assign)* ','?
    fn parse_list(&mut self) -> Option<SyntaxKind> {
        let checkpoint = self.checkpoint();
        let first = if self.at_any(&[SyntaxKind::COMMA, SyntaxKind::FAT_COMMA]) {
            None
        } else {
            self.parse_assign()
        };
        if !self.at_any(&[SyntaxKind::COMMA, SyntaxKind::FAT_COMMA]) {
            return first;
        }
        self.start_node_at(checkpoint, SyntaxKind::LIST_EXPR);
        while self.at_any(&[SyntaxKind::COMMA, SyntaxKind::FAT_COMMA]) {
            self.bump();
            if self.at_expr_terminator() || self.parse_assign().is_none() {
                break;
            }
        }
        self.finish_node();
        Some(SyntaxKind::LIST_EXPR)
    }

    fn parse_assign(&mut self) -> Option<SyntaxKind> {
        self.nested(Some(SyntaxKind::ERROR), Self::parse_assign_expr)
    }

    /// Assign = Ternary (AssignOp Assign)?
    fn parse_assign_expr(&mut self) -> Option<SyntaxKind> {
        let checkpoint = self.checkpoint();
        let kind = self.parse_ternary()?;
        if self.peek().is_assign_op() {
            self.start_node_at(checkpoint, SyntaxKind::ASSIGN_EXPR);
            self.bump();
            if self.parse_assign().is_none() {
                self.error("expected value to assign", ErrorCode::E0402);
            }
            self.finish_node();
            return Some(SyntaxKind::ASSIGN_EXPR);
        }
        Some(kind)
    }

    /// Ternary = Range ('?' Assign ':' Assign)?
    fn parse_ternary(&mut self) -> Option<SyntaxKind> {
        let checkpoint = self.checkpoint();
        let kind = self.parse_range()?;
        if self.at(SyntaxKind::QUESTION) {
            self.start_node_at(checkpoint, SyntaxKind::TERNARY_EXPR);
            self.bump();
            if self.parse_assign().is_none() {
                self.error("expected expression", ErrorCode::E0402);
            }
            self.expect(SyntaxKind::COLON, ErrorCode::E0902);
            if self.parse_assign().is_none() {
                self.error("expected expression", ErrorCode::E0402);
            }
            self.finish_node();
            return Some(SyntaxKind::TERNARY_EXPR);
        }
        Some(kind)
    }

    fn parse_range(&mut self) -> Option<SyntaxKind> {
        self.binary(&[SyntaxKind::DOT_DOT], Self::parse_or)
    }

    fn parse_or(&mut self) -> Option<SyntaxKind> {
        self.binary(
            &[SyntaxKind::PIPE_PIPE, SyntaxKind::SLASH_SLASH],
            Self::parse_and,
        )
    }

    fn parse_and(&mut self) -> Option<SyntaxKind> {
        self.binary(&[SyntaxKind::AMP_AMP], Self::parse_bit_or)
    }

    fn parse_bit_or(&mut self) -> Option<SyntaxKind> {
        self.binary(&[SyntaxKind::PIPE, SyntaxKind::CARET], Self::parse_bit_and)
    }

    fn parse_bit_and(&mut self) -> Option<SyntaxKind> {
        self.binary(&[SyntaxKind::AMP], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> Option<SyntaxKind> {
        self.binary(
            &[
                SyntaxKind::EQ_EQ,
                SyntaxKind::BANG_EQ,
                SyntaxKind::SPACESHIP,
                SyntaxKind::EQ_KW,
                SyntaxKind::NE_KW,
                SyntaxKind::CMP_KW,
            ],
            Self::parse_relational,
        )
    }

    fn parse_relational(&mut self) -> Option<SyntaxKind> {
        self.binary(
            &[
                SyntaxKind::LT,
                SyntaxKind::GT,
                SyntaxKind::LT_EQ,
                SyntaxKind::GT_EQ,
                SyntaxKind::LT_KW,
                SyntaxKind::GT_KW,
                SyntaxKind::LE_KW,
                SyntaxKind::GE_KW,
            ],
            Self::parse_additive,
        )
    }

    fn parse_additive(&mut self) -> Option<SyntaxKind> {
        self.binary(
            &[SyntaxKind::PLUS, SyntaxKind::MINUS, SyntaxKind::DOT],
            Self::parse_multiplicative,
        )
    }

    fn parse_multiplicative(&mut self) -> Option<SyntaxKind> {
        self.binary(
            &[SyntaxKind::STAR, SyntaxKind::SLASH, SyntaxKind::PERCENT],
            Self::parse_binding,
        )
    }

    fn parse_binding(&mut self) -> Option<SyntaxKind> {
        self.binary(
            &[SyntaxKind::EQ_TILDE, SyntaxKind::BANG_TILDE],
            Self::parse_unary,
        )
    }

    /// Unary = ('!' | '~' | '\' | '-' | '+') Unary | Power
    fn parse_unary(&mut self) -> Option<SyntaxKind> {
        if self.at_any(&[
            SyntaxKind::BANG,
            SyntaxKind::TILDE,
            SyntaxKind::BACKSLASH,
            SyntaxKind::MINUS,
            SyntaxKind::PLUS,
        ]) {
            self.start_node(SyntaxKind::UNARY_EXPR);
            self.bump();
            if self.nested(Some(SyntaxKind::ERROR), Self::parse_unary).is_none() {
                self.error("expected operand", ErrorCode::E0402);
            }
            self.finish_node();
            return Some(SyntaxKind::UNARY_EXPR);
        }
        self.parse_power()
    }

    /// Power = IncDec ('**' Unary)?
    fn parse_power(&mut self) -> Option<SyntaxKind> {
        let checkpoint = self.checkpoint();
        let kind = self.parse_inc_dec()?;
        if self.at(SyntaxKind::STAR_STAR) {
            self.start_node_at(checkpoint, SyntaxKind::BINARY_EXPR);
            self.bump();
            if self.nested(Some(SyntaxKind::ERROR), Self::parse_unary).is_none() {
                self.error("expected exponent", ErrorCode::E0402);
            }
            self.finish_node();
            return Some(SyntaxKind::BINARY_EXPR);
        }
        Some(kind)
    }

    /// IncDec = ('++' | '--') IncDec | Postfix ('++' | '--')?
    fn parse_inc_dec(&mut self) -> Option<SyntaxKind> {
        if self.at_any(&[SyntaxKind::PLUS_PLUS, SyntaxKind::MINUS_MINUS]) {
            self.start_node(SyntaxKind::OP3_PREFIX_EXPR);
            self.bump();
            if self.nested(Some(SyntaxKind::ERROR), Self::parse_inc_dec).is_none() {
                self.error("expected operand", ErrorCode::E0402);
            }
            self.finish_node();
            return Some(SyntaxKind::OP3_PREFIX_EXPR);
        }
        let checkpoint = self.checkpoint();
        let kind = self.parse_postfix()?;
        if self.at_any(&[SyntaxKind::PLUS_PLUS, SyntaxKind::MINUS_MINUS]) {
            self.start_node_at(checkpoint, SyntaxKind::OP3_SUFFIX_EXPR);
            self.bump();
            self.finish_node();
            return Some(SyntaxKind::OP3_SUFFIX_EXPR);
        }
        Some(kind)
    }

    /// Postfix = Term ('->' (Subscript | Args | Method Args?) | Subscript)*
    fn parse_postfix(&mut self) -> Option<SyntaxKind> {
        let checkpoint = self.checkpoint();
        let mut kind = self.parse_term()?;
        loop {
            match self.peek() {
                SyntaxKind::ARROW => match self.nth(1) {
                    SyntaxKind::L_BRACKET | SyntaxKind::L_BRACE => {
                        self.start_node_at(checkpoint, SyntaxKind::ELEMENT_EXPR);
                        self.bump(); // ->
                        self.parse_subscript();
                        self.finish_node();
                        kind = SyntaxKind::ELEMENT_EXPR;
                    }
                    SyntaxKind::L_PAREN => {
                        self.start_node_at(checkpoint, SyntaxKind::CALL_EXPR);
                        self.bump(); // ->
                        self.parse_paren_args();
                        self.finish_node();
                        kind = SyntaxKind::CALL_EXPR;
                    }
                    next if next == SyntaxKind::IDENT
                        || next == SyntaxKind::SCALAR_NAME
                        || next.is_keyword() =>
                    {
                        self.start_node_at(checkpoint, SyntaxKind::METHOD_CALL_EXPR);
                        self.bump(); // ->
                        self.bump(); // method name
                        if self.at(SyntaxKind::L_PAREN) {
                            self.parse_paren_args();
                        }
                        self.finish_node();
                        kind = SyntaxKind::METHOD_CALL_EXPR;
                    }
                    _ => {
                        self.bump(); // ->
                        self.error("expected method name or subscript", ErrorCode::E0902);
                        break;
                    }
                },
                // `$x[0]`, `$h{k}`, `$r->[0][1]`: subscripts glued to a variable
                SyntaxKind::L_BRACKET | SyntaxKind::L_BRACE
                    if self.current_raw() == self.peek()
                        && matches!(
                            kind,
                            SyntaxKind::SCALAR_VARIABLE
                                | SyntaxKind::ARRAY_VARIABLE
                                | SyntaxKind::ELEMENT_EXPR
                                | SyntaxKind::DEREF_EXPR
                        ) =>
                {
                    self.start_node_at(checkpoint, SyntaxKind::ELEMENT_EXPR);
                    self.parse_subscript();
                    self.finish_node();
                    kind = SyntaxKind::ELEMENT_EXPR;
                }
                _ => break,
            }
        }
        Some(kind)
    }

    /// Subscript = '[' Expr ']' | '{' Expr '}'
    fn parse_subscript(&mut self) {
        if self.eat(SyntaxKind::L_BRACKET) {
            if self.parse_expr().is_none() {
                self.error("expected index", ErrorCode::E0401);
            }
            self.expect(SyntaxKind::R_BRACKET, ErrorCode::E0204);
        } else {
            self.expect(SyntaxKind::L_BRACE, ErrorCode::E0902);
            if self.parse_expr().is_none() {
                self.error("expected key", ErrorCode::E0401);
            }
            self.expect(SyntaxKind::R_BRACE, ErrorCode::E0202);
        }
    }

    /// ArgList = '(' Expr? ')'
    fn parse_paren_args(&mut self) {
        self.start_node(SyntaxKind::ARG_LIST);
        self.bump(); // (
        if !self.at(SyntaxKind::R_PAREN) {
            self.parse_expr();
        }
        self.expect(SyntaxKind::R_PAREN, ErrorCode::E0203);
        self.finish_node();
    }

    /// Arguments of a list operator written without parentheses.
    fn parse_bare_args(&mut self, takes_block: bool) {
        self.start_node(SyntaxKind::ARG_LIST);
        if takes_block && self.at(SyntaxKind::L_BRACE) {
            self.parse_block();
        }
        if !self.at_expr_terminator() {
            self.parse_list();
        }
        self.finish_node();
    }

    fn parse_term(&mut self) -> Option<SyntaxKind> {
        let kind = self.peek();
        match kind {
            SyntaxKind::SCALAR_NAME
            | SyntaxKind::ARRAY_NAME
            | SyntaxKind::HASH_NAME
            | SyntaxKind::ARRAY_LAST_INDEX => Some(self.parse_variable()),
            k if k.is_declarator() => {
                self.parse_variable_declaration();
                Some(SyntaxKind::VARIABLE_DECLARATION)
            }
            SyntaxKind::NUMBER | SyntaxKind::STRING | SyntaxKind::QW_LIST => {
                self.start_node(SyntaxKind::LITERAL);
                self.bump();
                self.finish_node();
                Some(SyntaxKind::LITERAL)
            }
            SyntaxKind::L_PAREN => {
                self.start_node(SyntaxKind::LIST_EXPR);
                self.bump();
                if !self.at(SyntaxKind::R_PAREN) {
                    self.parse_expr();
                }
                self.expect(SyntaxKind::R_PAREN, ErrorCode::E0203);
                self.finish_node();
                Some(SyntaxKind::LIST_EXPR)
            }
            SyntaxKind::L_BRACKET => {
                self.start_node(SyntaxKind::ANON_ARRAY_EXPR);
                self.bump();
                if !self.at(SyntaxKind::R_BRACKET) {
                    self.parse_expr();
                }
                self.expect(SyntaxKind::R_BRACKET, ErrorCode::E0204);
                self.finish_node();
                Some(SyntaxKind::ANON_ARRAY_EXPR)
            }
            SyntaxKind::L_BRACE => {
                self.start_node(SyntaxKind::ANON_HASH_EXPR);
                self.bump();
                if !self.at(SyntaxKind::R_BRACE) {
                    self.parse_expr();
                }
                self.expect(SyntaxKind::R_BRACE, ErrorCode::E0202);
                self.finish_node();
                Some(SyntaxKind::ANON_HASH_EXPR)
            }
            SyntaxKind::SUB_KW => {
                self.start_node(SyntaxKind::ANON_SUB_EXPR);
                self.bump();
                if self.at(SyntaxKind::L_PAREN) {
                    self.parse_prototype();
                }
                self.parse_block();
                self.finish_node();
                Some(SyntaxKind::ANON_SUB_EXPR)
            }
            SyntaxKind::DOLLAR | SyntaxKind::AT | SyntaxKind::PERCENT
                if matches!(
                    self.nth(1),
                    SyntaxKind::SCALAR_NAME | SyntaxKind::DOLLAR | SyntaxKind::L_BRACE
                ) =>
            {
                self.parse_deref();
                Some(SyntaxKind::DEREF_EXPR)
            }
            SyntaxKind::AMP if self.nth(1) == SyntaxKind::IDENT => {
                self.start_node(SyntaxKind::CALL_EXPR);
                self.bump(); // &
                self.bump(); // name
                if self.at(SyntaxKind::L_PAREN) {
                    self.parse_paren_args();
                }
                self.finish_node();
                Some(SyntaxKind::CALL_EXPR)
            }
            SyntaxKind::AMP
                if matches!(self.nth(1), SyntaxKind::SCALAR_NAME | SyntaxKind::L_BRACE) =>
            {
                self.parse_deref();
                Some(SyntaxKind::DEREF_EXPR)
            }
            SyntaxKind::RETURN_KW => {
                self.start_node(SyntaxKind::CALL_EXPR);
                self.bump();
                if !self.at_expr_terminator() {
                    self.parse_bare_args(false);
                }
                self.finish_node();
                Some(SyntaxKind::CALL_EXPR)
            }
            SyntaxKind::IDENT => Some(self.parse_bareword_or_call()),
            SyntaxKind::ERROR => {
                self.error_bump("invalid character", ErrorCode::E0101);
                None
            }
            _ if self.at_expr_terminator() => {
                self.error("expected expression", ErrorCode::E0401);
                None
            }
            _ => {
                self.error_bump(format!("unexpected token: {:?}", kind), ErrorCode::E0401);
                None
            }
        }
    }

    /// Variable = '$x' | '@x' | '%x' | '$#x'
    fn parse_variable(&mut self) -> SyntaxKind {
        let node_kind = match self.peek() {
            SyntaxKind::ARRAY_NAME => SyntaxKind::ARRAY_VARIABLE,
            SyntaxKind::HASH_NAME => SyntaxKind::HASH_VARIABLE,
            SyntaxKind::ARRAY_LAST_INDEX => SyntaxKind::ARRAY_INDEX_VARIABLE,
            _ => SyntaxKind::SCALAR_VARIABLE,
        };
        self.start_node(node_kind);
        self.bump();
        self.finish_node();
        node_kind
    }

    /// Declaration = ('my' | 'our' | 'state') (Variable | '(' VarList ')')
    ///             | 'local' (Postfix | '(' VarList ')')
    fn parse_variable_declaration(&mut self) {
        self.start_node(SyntaxKind::VARIABLE_DECLARATION);
        let declarator = self.peek();
        self.bump();
        match self.peek() {
            SyntaxKind::L_PAREN => {
                self.bump();
                while !self.at_any(&[SyntaxKind::R_PAREN, EOF]) {
                    match self.peek() {
                        SyntaxKind::SCALAR_NAME
                        | SyntaxKind::ARRAY_NAME
                        | SyntaxKind::HASH_NAME => {
                            self.parse_variable();
                        }
                        // `my (undef, $x) = @_;`
                        SyntaxKind::IDENT => {
                            self.start_node(SyntaxKind::BAREWORD_EXPR);
                            self.bump();
                            self.finish_node();
                        }
                        SyntaxKind::COMMA => self.bump(),
                        _ => {
                            self.error("expected variable", ErrorCode::E0302);
                            break;
                        }
                    }
                }
                self.expect(SyntaxKind::R_PAREN, ErrorCode::E0203);
            }
            SyntaxKind::SCALAR_NAME | SyntaxKind::ARRAY_NAME | SyntaxKind::HASH_NAME
                if declarator != SyntaxKind::LOCAL_KW =>
            {
                self.parse_variable();
            }
            _ if declarator == SyntaxKind::LOCAL_KW && !self.at_expr_terminator() => {
                if self.nested(Some(SyntaxKind::ERROR), Self::parse_postfix).is_none() {
                    self.error("expected lvalue after `local`", ErrorCode::E0302);
                }
            }
            _ => self.error("expected variable after declarator", ErrorCode::E0302),
        }
        self.finish_node();
    }

    /// Deref = Sigil (ScalarVariable | Deref | Block)
    fn parse_deref(&mut self) {
        self.start_node(SyntaxKind::DEREF_EXPR);
        self.bump(); // sigil
        match self.peek() {
            SyntaxKind::SCALAR_NAME => {
                self.parse_variable();
            }
            SyntaxKind::DOLLAR => self.nested((), Self::parse_deref),
            _ => self.parse_block(),
        }
        self.finish_node();
    }

    /// Bareword, `name(args)`, or list operator `name args`.
    fn parse_bareword_or_call(&mut self) -> SyntaxKind {
        let next = self.nth(1);
        if next == SyntaxKind::L_PAREN {
            self.start_node(SyntaxKind::CALL_EXPR);
            self.bump();
            self.parse_paren_args();
            self.finish_node();
            return SyntaxKind::CALL_EXPR;
        }
        let quoted_or_class = matches!(next, SyntaxKind::FAT_COMMA | SyntaxKind::ARROW);
        if !quoted_or_class && Self::starts_list_argument(next) {
            let takes_block = self
                .nth_token(0)
                .map(|t| BLOCK_TAKING_CALLS.contains(&t.text))
                .unwrap_or(false);
            self.start_node(SyntaxKind::CALL_EXPR);
            self.bump();
            self.parse_bare_args(takes_block);
            self.finish_node();
            return SyntaxKind::CALL_EXPR;
        }
        self.start_node(SyntaxKind::BAREWORD_EXPR);
        self.bump();
        self.finish_node();
        SyntaxKind::BAREWORD_EXPR
    }
}
