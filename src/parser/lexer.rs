//! Logos-based lexer for Perl 5
//!
//! Fast tokenization using the logos crate. Line-oriented constructs that a
//! regular lexer cannot anchor (POD blocks, `__END__`/`__DATA__`) are cut
//! out by the [`Lexer`] wrapper before logos sees them.

use super::syntax_kind::SyntaxKind;
use logos::Logos;
use rowan::TextSize;

/// A token with its kind, text, and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
    pub offset: TextSize,
}

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, LogosToken>,
    offset: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            source: input,
            inner: LogosToken::lexer(input),
            offset: 0,
        }
    }

    fn at_line_start(&self, start: usize) -> bool {
        start == 0 || self.source.as_bytes()[start - 1] == b'\n'
    }

    /// Length and kind of a POD block or data section starting at `start`.
    fn line_block(&self, start: usize) -> Option<(usize, SyntaxKind)> {
        if !self.at_line_start(start) {
            return None;
        }
        let rest = &self.source[start..];
        if rest.starts_with("__END__") || rest.starts_with("__DATA__") {
            return Some((rest.len(), SyntaxKind::DATA_SECTION));
        }
        let bytes = rest.as_bytes();
        if bytes.len() > 1 && bytes[0] == b'=' && bytes[1].is_ascii_alphabetic() {
            return Some((pod_len(rest), SyntaxKind::POD));
        }
        None
    }
}

/// A POD block runs through the end of its `=cut` line, or to end of input.
fn pod_len(rest: &str) -> usize {
    let mut line_start = 0;
    while line_start < rest.len() {
        let line_end = rest[line_start..]
            .find('\n')
            .map(|i| line_start + i + 1)
            .unwrap_or(rest.len());
        if line_start > 0 && rest[line_start..].starts_with("=cut") {
            return line_end;
        }
        line_start = line_end;
    }
    rest.len()
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.offset as usize;
        if start >= self.source.len() {
            return None;
        }

        if let Some((len, kind)) = self.line_block(start) {
            let text = &self.source[start..start + len];
            let offset = TextSize::new(self.offset);
            self.offset += len as u32;
            // Resynchronise logos on the byte after the block.
            self.inner = LogosToken::lexer(self.source);
            self.inner.bump(self.offset as usize);
            return Some(Token { kind, text, offset });
        }

        let logos_token = self.inner.next()?;
        let text = self.inner.slice();
        let offset = TextSize::new(self.offset);
        self.offset += text.len() as u32;

        let kind = match logos_token {
            Ok(t) => t.into(),
            Err(()) => SyntaxKind::ERROR,
        };

        Some(Token { kind, text, offset })
    }
}

/// Tokenize an entire string into a Vec
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

/// Logos token enum - maps to SyntaxKind
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum LogosToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[regex(r"#[^\n]*")]
    LineComment,

    // =========================================================================
    // LITERALS AND NAMES
    // =========================================================================
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)*")]
    Ident,

    #[regex(r"[0-9][0-9_]*")]
    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9]+")]
    #[regex(r"0[xX][0-9a-fA-F_]+")]
    Number,

    #[regex(r"'([^'\\]|\\(.|\n))*'")]
    #[regex(r#""([^"\\]|\\(.|\n))*""#)]
    String,

    #[regex(r"qw[ \t]*\([^)]*\)")]
    #[regex(r"qw[ \t]*/[^/]*/")]
    #[regex(r"qw[ \t]*\{[^}]*\}")]
    #[regex(r"qw[ \t]*\[[^\]]*\]")]
    QwList,

    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)*")]
    #[regex(r"\$::[A-Za-z_][A-Za-z0-9_]*")]
    #[regex(r"\$[0-9]+")]
    #[regex(r"\$[!@]")]
    ScalarName,

    #[regex(r"@[A-Za-z_][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)*")]
    ArrayName,

    #[regex(r"%[A-Za-z_][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)*")]
    HashName,

    #[regex(r"\$#[A-Za-z_][A-Za-z0-9_]*")]
    ArrayLastIndex,

    // =========================================================================
    // MULTI-CHARACTER PUNCTUATION
    // =========================================================================
    #[token("<=>")]
    Spaceship,
    #[token("||=")]
    PipePipeEq,
    #[token("//=")]
    SlashSlashEq,
    #[token("&&=")]
    AmpAmpEq,
    #[token("=>")]
    FatComma,
    #[token("->")]
    Arrow,
    #[token("..")]
    DotDot,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token(".=")]
    DotEq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("=~")]
    EqTilde,
    #[token("!~")]
    BangTilde,
    #[token("**")]
    StarStar,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("//")]
    SlashSlash,

    // =========================================================================
    // SINGLE-CHARACTER PUNCTUATION
    // =========================================================================
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("?")]
    Question,
    #[token("$")]
    Dollar,
    #[token("@")]
    At,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,
    #[token("\\")]
    Backslash,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    #[token("my")]
    MyKw,
    #[token("our")]
    OurKw,
    #[token("local")]
    LocalKw,
    #[token("state")]
    StateKw,
    #[token("sub")]
    SubKw,
    #[token("package")]
    PackageKw,
    #[token("use")]
    UseKw,
    #[token("no")]
    NoKw,
    #[token("if")]
    IfKw,
    #[token("unless")]
    UnlessKw,
    #[token("elsif")]
    ElsifKw,
    #[token("else")]
    ElseKw,
    #[token("while")]
    WhileKw,
    #[token("until")]
    UntilKw,
    #[token("for")]
    ForKw,
    #[token("foreach")]
    ForeachKw,
    #[token("return")]
    ReturnKw,
    #[token("and")]
    AndKw,
    #[token("or")]
    OrKw,
    #[token("not")]
    NotKw,
    #[token("xor")]
    XorKw,
    #[token("eq")]
    EqKw,
    #[token("ne")]
    NeKw,
    #[token("lt")]
    LtKw,
    #[token("gt")]
    GtKw,
    #[token("le")]
    LeKw,
    #[token("ge")]
    GeKw,
    #[token("cmp")]
    CmpKw,
}

impl From<LogosToken> for SyntaxKind {
    fn from(token: LogosToken) -> Self {
        use LogosToken::*;
        match token {
            Whitespace => SyntaxKind::WHITESPACE,
            LineComment => SyntaxKind::LINE_COMMENT,
            Ident => SyntaxKind::IDENT,
            Number => SyntaxKind::NUMBER,
            String => SyntaxKind::STRING,
            QwList => SyntaxKind::QW_LIST,
            ScalarName => SyntaxKind::SCALAR_NAME,
            ArrayName => SyntaxKind::ARRAY_NAME,
            HashName => SyntaxKind::HASH_NAME,
            ArrayLastIndex => SyntaxKind::ARRAY_LAST_INDEX,

            Spaceship => SyntaxKind::SPACESHIP,
            PipePipeEq => SyntaxKind::PIPE_PIPE_EQ,
            SlashSlashEq => SyntaxKind::SLASH_SLASH_EQ,
            AmpAmpEq => SyntaxKind::AMP_AMP_EQ,
            FatComma => SyntaxKind::FAT_COMMA,
            Arrow => SyntaxKind::ARROW,
            DotDot => SyntaxKind::DOT_DOT,
            PlusEq => SyntaxKind::PLUS_EQ,
            MinusEq => SyntaxKind::MINUS_EQ,
            StarEq => SyntaxKind::STAR_EQ,
            SlashEq => SyntaxKind::SLASH_EQ,
            DotEq => SyntaxKind::DOT_EQ,
            EqEq => SyntaxKind::EQ_EQ,
            BangEq => SyntaxKind::BANG_EQ,
            LtEq => SyntaxKind::LT_EQ,
            GtEq => SyntaxKind::GT_EQ,
            EqTilde => SyntaxKind::EQ_TILDE,
            BangTilde => SyntaxKind::BANG_TILDE,
            StarStar => SyntaxKind::STAR_STAR,
            PlusPlus => SyntaxKind::PLUS_PLUS,
            MinusMinus => SyntaxKind::MINUS_MINUS,
            AmpAmp => SyntaxKind::AMP_AMP,
            PipePipe => SyntaxKind::PIPE_PIPE,
            SlashSlash => SyntaxKind::SLASH_SLASH,

            LBrace => SyntaxKind::L_BRACE,
            RBrace => SyntaxKind::R_BRACE,
            LBracket => SyntaxKind::L_BRACKET,
            RBracket => SyntaxKind::R_BRACKET,
            LParen => SyntaxKind::L_PAREN,
            RParen => SyntaxKind::R_PAREN,
            Semicolon => SyntaxKind::SEMICOLON,
            Colon => SyntaxKind::COLON,
            Comma => SyntaxKind::COMMA,
            Dot => SyntaxKind::DOT,
            Question => SyntaxKind::QUESTION,
            Dollar => SyntaxKind::DOLLAR,
            At => SyntaxKind::AT,
            Eq => SyntaxKind::EQ,
            Lt => SyntaxKind::LT,
            Gt => SyntaxKind::GT,
            Plus => SyntaxKind::PLUS,
            Minus => SyntaxKind::MINUS,
            Star => SyntaxKind::STAR,
            Slash => SyntaxKind::SLASH,
            Percent => SyntaxKind::PERCENT,
            Bang => SyntaxKind::BANG,
            Backslash => SyntaxKind::BACKSLASH,
            Amp => SyntaxKind::AMP,
            Pipe => SyntaxKind::PIPE,
            Caret => SyntaxKind::CARET,
            Tilde => SyntaxKind::TILDE,

            MyKw => SyntaxKind::MY_KW,
            OurKw => SyntaxKind::OUR_KW,
            LocalKw => SyntaxKind::LOCAL_KW,
            StateKw => SyntaxKind::STATE_KW,
            SubKw => SyntaxKind::SUB_KW,
            PackageKw => SyntaxKind::PACKAGE_KW,
            UseKw => SyntaxKind::USE_KW,
            NoKw => SyntaxKind::NO_KW,
            IfKw => SyntaxKind::IF_KW,
            UnlessKw => SyntaxKind::UNLESS_KW,
            ElsifKw => SyntaxKind::ELSIF_KW,
            ElseKw => SyntaxKind::ELSE_KW,
            WhileKw => SyntaxKind::WHILE_KW,
            UntilKw => SyntaxKind::UNTIL_KW,
            ForKw => SyntaxKind::FOR_KW,
            ForeachKw => SyntaxKind::FOREACH_KW,
            ReturnKw => SyntaxKind::RETURN_KW,
            AndKw => SyntaxKind::AND_KW,
            OrKw => SyntaxKind::OR_KW,
            NotKw => SyntaxKind::NOT_KW,
            XorKw => SyntaxKind::XOR_KW,
            EqKw => SyntaxKind::EQ_KW,
            NeKw => SyntaxKind::NE_KW,
            LtKw => SyntaxKind::LT_KW,
            GtKw => SyntaxKind::GT_KW,
            LeKw => SyntaxKind::LE_KW,
            GeKw => SyntaxKind::GE_KW,
            CmpKw => SyntaxKind::CMP_KW,
        }
    }
}
