//! SyntaxKind enum for the Kotlin CST.
//!
//! A superset of `TokenKind` (mapped to SCREAMING_SNAKE_CASE) plus composite
//! node kinds for CST nodes produced by the parser.

use kfmt_common::token::TokenKind;

/// Every kind of syntax element in the Kotlin CST.
///
/// Token kinds (leaves) are mapped 1:1 from [`TokenKind`]. Composite node
/// kinds represent parser-produced tree nodes. The first two values are
/// sentinels used by the event-based parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // ── Sentinels ──────────────────────────────────────────────────────
    /// Placeholder kind for incomplete/unfinished parser events.
    TOMBSTONE = 0,
    /// Wrapper for tokens/nodes that couldn't be parsed.
    ERROR_NODE = 1,

    // ── Keywords (24) ──────────────────────────────────────────────────
    AS_KW,
    CLASS_KW,
    CONSTRUCTOR_KW,
    ELSE_KW,
    FALSE_KW,
    FOR_KW,
    FUN_KW,
    IF_KW,
    IMPORT_KW,
    IN_KW,
    INIT_KW,
    INTERFACE_KW,
    IS_KW,
    NULL_KW,
    OBJECT_KW,
    PACKAGE_KW,
    RETURN_KW,
    SUPER_KW,
    THIS_KW,
    TRUE_KW,
    VAL_KW,
    VAR_KW,
    WHEN_KW,
    WHILE_KW,

    // ── Operators (24) ─────────────────────────────────────────────────
    PLUS,
    MINUS,
    STAR,
    SLASH,
    PERCENT,
    EQ,
    EQ_EQ,
    NOT_EQ,
    LT,
    GT,
    LT_EQ,
    GT_EQ,
    AMP_AMP,
    PIPE_PIPE,
    BANG,
    QUESTION,
    /// `?:`
    ELVIS,
    /// `?.`
    QUESTION_DOT,
    ARROW,
    DOT_DOT,
    COLON_COLON,
    AT,
    DOLLAR,
    UNDERSCORE,

    // ── Delimiters and punctuation (10) ────────────────────────────────
    L_PAREN,
    R_PAREN,
    L_BRACKET,
    R_BRACKET,
    L_BRACE,
    R_BRACE,
    COMMA,
    DOT,
    COLON,
    SEMICOLON,

    // ── Literal tokens (12) ────────────────────────────────────────────
    INT_LITERAL,
    FLOAT_LITERAL,
    CHAR_LITERAL,
    STRING_START,
    STRING_END,
    STRING_CONTENT,
    /// `$name` inside a string template.
    SHORT_INTERPOLATION,
    INTERPOLATION_START,
    INTERPOLATION_END,
    RAW_STRING_START,
    RAW_STRING_END,
    RAW_STRING_CONTENT,

    // ── Trivia tokens (4) ──────────────────────────────────────────────
    WHITESPACE,
    LINE_COMMENT,
    BLOCK_COMMENT,
    KDOC,

    // ── Other tokens (3) ───────────────────────────────────────────────
    IDENT,
    EOF,
    ERROR_TOKEN,

    // ── Composite node kinds ───────────────────────────────────────────
    SOURCE_FILE,
    PACKAGE_DIRECTIVE,
    IMPORT_LIST,
    IMPORT_DIRECTIVE,
    /// `a.b.c` in package/import directives and type names.
    DOTTED_NAME,
    MODIFIER_LIST,
    CLASS_DECL,
    PRIMARY_CONSTRUCTOR,
    PARAMETER_LIST,
    PARAMETER,
    SUPERTYPE_LIST,
    SUPERTYPE,
    CLASS_BODY,
    INIT_BLOCK,
    FUN_DECL,
    PROPERTY_DECL,
    TYPE_REF,
    TYPE_ARGUMENT_LIST,
    BLOCK,
    IF_EXPR,
    WHILE_STMT,
    FOR_STMT,
    RETURN_STMT,
    BINARY_EXPR,
    PREFIX_EXPR,
    PAREN_EXPR,
    CALL_EXPR,
    VALUE_ARGUMENT_LIST,
    VALUE_ARGUMENT,
    DOT_QUALIFIED_EXPR,
    SAFE_QUALIFIED_EXPR,
    INDEX_EXPR,
    NAME_REF,
    LITERAL,
    STRING_TEMPLATE,
    RAW_STRING_TEMPLATE,
    /// `${...}` with its expression, inside a string template.
    INTERPOLATION,
}

impl SyntaxKind {
    /// Whether this kind is a trivia token (whitespace or comments).
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::WHITESPACE
                | SyntaxKind::LINE_COMMENT
                | SyntaxKind::BLOCK_COMMENT
                | SyntaxKind::KDOC
        )
    }

    /// Whether this kind is a comment token (KDoc included).
    pub fn is_comment(self) -> bool {
        matches!(
            self,
            SyntaxKind::LINE_COMMENT | SyntaxKind::BLOCK_COMMENT | SyntaxKind::KDOC
        )
    }
}

impl From<TokenKind> for SyntaxKind {
    fn from(kind: TokenKind) -> Self {
        match kind {
            TokenKind::As => SyntaxKind::AS_KW,
            TokenKind::Class => SyntaxKind::CLASS_KW,
            TokenKind::Constructor => SyntaxKind::CONSTRUCTOR_KW,
            TokenKind::Else => SyntaxKind::ELSE_KW,
            TokenKind::False => SyntaxKind::FALSE_KW,
            TokenKind::For => SyntaxKind::FOR_KW,
            TokenKind::Fun => SyntaxKind::FUN_KW,
            TokenKind::If => SyntaxKind::IF_KW,
            TokenKind::Import => SyntaxKind::IMPORT_KW,
            TokenKind::In => SyntaxKind::IN_KW,
            TokenKind::Init => SyntaxKind::INIT_KW,
            TokenKind::Interface => SyntaxKind::INTERFACE_KW,
            TokenKind::Is => SyntaxKind::IS_KW,
            TokenKind::Null => SyntaxKind::NULL_KW,
            TokenKind::Object => SyntaxKind::OBJECT_KW,
            TokenKind::Package => SyntaxKind::PACKAGE_KW,
            TokenKind::Return => SyntaxKind::RETURN_KW,
            TokenKind::Super => SyntaxKind::SUPER_KW,
            TokenKind::This => SyntaxKind::THIS_KW,
            TokenKind::True => SyntaxKind::TRUE_KW,
            TokenKind::Val => SyntaxKind::VAL_KW,
            TokenKind::Var => SyntaxKind::VAR_KW,
            TokenKind::When => SyntaxKind::WHEN_KW,
            TokenKind::While => SyntaxKind::WHILE_KW,
            TokenKind::Plus => SyntaxKind::PLUS,
            TokenKind::Minus => SyntaxKind::MINUS,
            TokenKind::Star => SyntaxKind::STAR,
            TokenKind::Slash => SyntaxKind::SLASH,
            TokenKind::Percent => SyntaxKind::PERCENT,
            TokenKind::Eq => SyntaxKind::EQ,
            TokenKind::EqEq => SyntaxKind::EQ_EQ,
            TokenKind::NotEq => SyntaxKind::NOT_EQ,
            TokenKind::Lt => SyntaxKind::LT,
            TokenKind::Gt => SyntaxKind::GT,
            TokenKind::LtEq => SyntaxKind::LT_EQ,
            TokenKind::GtEq => SyntaxKind::GT_EQ,
            TokenKind::AmpAmp => SyntaxKind::AMP_AMP,
            TokenKind::PipePipe => SyntaxKind::PIPE_PIPE,
            TokenKind::Bang => SyntaxKind::BANG,
            TokenKind::Question => SyntaxKind::QUESTION,
            TokenKind::Elvis => SyntaxKind::ELVIS,
            TokenKind::QuestionDot => SyntaxKind::QUESTION_DOT,
            TokenKind::Arrow => SyntaxKind::ARROW,
            TokenKind::DotDot => SyntaxKind::DOT_DOT,
            TokenKind::ColonColon => SyntaxKind::COLON_COLON,
            TokenKind::At => SyntaxKind::AT,
            TokenKind::Dollar => SyntaxKind::DOLLAR,
            TokenKind::Underscore => SyntaxKind::UNDERSCORE,
            TokenKind::LParen => SyntaxKind::L_PAREN,
            TokenKind::RParen => SyntaxKind::R_PAREN,
            TokenKind::LBracket => SyntaxKind::L_BRACKET,
            TokenKind::RBracket => SyntaxKind::R_BRACKET,
            TokenKind::LBrace => SyntaxKind::L_BRACE,
            TokenKind::RBrace => SyntaxKind::R_BRACE,
            TokenKind::Comma => SyntaxKind::COMMA,
            TokenKind::Dot => SyntaxKind::DOT,
            TokenKind::Colon => SyntaxKind::COLON,
            TokenKind::Semicolon => SyntaxKind::SEMICOLON,
            TokenKind::IntLiteral => SyntaxKind::INT_LITERAL,
            TokenKind::FloatLiteral => SyntaxKind::FLOAT_LITERAL,
            TokenKind::CharLiteral => SyntaxKind::CHAR_LITERAL,
            TokenKind::StringStart => SyntaxKind::STRING_START,
            TokenKind::StringEnd => SyntaxKind::STRING_END,
            TokenKind::StringContent => SyntaxKind::STRING_CONTENT,
            TokenKind::ShortInterpolation => SyntaxKind::SHORT_INTERPOLATION,
            TokenKind::InterpolationStart => SyntaxKind::INTERPOLATION_START,
            TokenKind::InterpolationEnd => SyntaxKind::INTERPOLATION_END,
            TokenKind::RawStringStart => SyntaxKind::RAW_STRING_START,
            TokenKind::RawStringEnd => SyntaxKind::RAW_STRING_END,
            TokenKind::RawStringContent => SyntaxKind::RAW_STRING_CONTENT,
            TokenKind::Whitespace => SyntaxKind::WHITESPACE,
            TokenKind::LineComment => SyntaxKind::LINE_COMMENT,
            TokenKind::BlockComment => SyntaxKind::BLOCK_COMMENT,
            TokenKind::KDoc => SyntaxKind::KDOC,
            TokenKind::Ident => SyntaxKind::IDENT,
            TokenKind::Eof => SyntaxKind::EOF,
            TokenKind::Error => SyntaxKind::ERROR_TOKEN,
        }
    }
}
