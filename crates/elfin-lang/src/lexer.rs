//! Lexical analysis for the ELFIN DSL.
//!
//! Tokenization uses logos. Whitespace and line comments (both `//` and the
//! corpus's `#` convention) are stripped during lexing and never become
//! tokens. `/* */` block comments are deliberately not recognized: their
//! characters lex as ordinary `/` and `*` tokens and surface as parse
//! errors, which is the documented behavior for that divergence.
//!
//! # Design
//!
//! - `Token` — all ELFIN token types (keywords, operators, literals, names)
//! - `tokenize` — best-effort entry point; unknown characters produce an
//!   `InvalidChar` diagnostic and are skipped so the rest of the file
//!   still lexes
//! - NUMBER follows `[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?`
//! - STRING follows `"[^"]*"` with no escape processing (embedded quotes
//!   are unrepresentable; documented limitation)
//!
//! Unit annotations such as `[m/s^2]` have no dedicated token type: inside
//! a parameter's bracket the parser reinterprets ordinary NAME, `*`, `/`,
//! `^` and NUMBER tokens as unit syntax (contextual interpretation).

use crate::error::{CompileError, ErrorKind};
use crate::foundation::Span;
use logos::Logos;

/// ELFIN token.
///
/// Represents all lexical elements of the language: section keywords,
/// operators, delimiters, and the NAME/NUMBER/STRING data tokens.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")] // Skip whitespace
#[logos(skip r"//[^\n]*")] // Skip // comments
#[logos(skip r"#[^\n]*")] // Skip # comments (corpus convention)
pub enum Token {
    // === Section keywords ===
    /// Keyword `import`
    #[token("import")]
    Import,
    /// Keyword `from`
    #[token("from")]
    From,
    /// Keyword `helpers`
    #[token("helpers")]
    Helpers,
    /// Keyword `system`
    #[token("system")]
    System,
    /// Keyword `lyapunov`
    #[token("lyapunov")]
    Lyapunov,
    /// Keyword `barrier`
    #[token("barrier")]
    Barrier,
    /// Keyword `mode`
    #[token("mode")]
    Mode,
    /// Keyword `planner`
    #[token("planner")]
    Planner,
    /// Keyword `integration`
    #[token("integration")]
    Integration,

    // === Block field keywords ===
    /// Keyword `continuous_state`
    #[token("continuous_state")]
    ContinuousState,
    /// Keyword `input`
    #[token("input")]
    Input,
    /// Keyword `inputs` (accepted pluralized form)
    #[token("inputs")]
    Inputs,
    /// Keyword `params`
    #[token("params")]
    Params,
    /// Keyword `flow_dynamics`
    #[token("flow_dynamics")]
    FlowDynamics,
    /// Keyword `controller`
    #[token("controller")]
    Controller,
    /// Keyword `config`
    #[token("config")]
    Config,
    /// Keyword `obstacles`
    #[token("obstacles")]
    Obstacles,

    // === Expression keywords ===
    /// Keyword `if`
    #[token("if")]
    If,
    /// Keyword `then`
    #[token("then")]
    Then,
    /// Keyword `else`
    #[token("else")]
    Else,

    // === Operators ===
    /// Operator `+`
    #[token("+")]
    Plus,
    /// Operator `-`
    #[token("-")]
    Minus,
    /// Operator `**` (power; matched before `*` by longest-match)
    #[token("**")]
    StarStar,
    /// Operator `*`
    #[token("*")]
    Star,
    /// Operator `/`
    #[token("/")]
    Slash,
    /// Operator `^` (unit exponent, inside annotation brackets)
    #[token("^")]
    Caret,
    /// Operator `==`
    #[token("==")]
    EqEq,
    /// Operator `!=`
    #[token("!=")]
    BangEq,
    /// Operator `<=`
    #[token("<=")]
    LtEq,
    /// Operator `>=`
    #[token(">=")]
    GtEq,
    /// Operator `<`
    #[token("<")]
    Lt,
    /// Operator `>`
    #[token(">")]
    Gt,
    /// Operator `=`
    #[token("=")]
    Eq,

    // === Punctuation ===
    /// Punctuation `:`
    #[token(":")]
    Colon,
    /// Punctuation `;`
    #[token(";")]
    Semicolon,
    /// Punctuation `,`
    #[token(",")]
    Comma,
    /// Punctuation `.`
    #[token(".")]
    Dot,
    /// Delimiter `(`
    #[token("(")]
    LParen,
    /// Delimiter `)`
    #[token(")")]
    RParen,
    /// Delimiter `{`
    #[token("{")]
    LBrace,
    /// Delimiter `}`
    #[token("}")]
    RBrace,
    /// Delimiter `[`
    #[token("[")]
    LBracket,
    /// Delimiter `]`
    #[token("]")]
    RBracket,

    // === Literals ===
    /// Numeric literal: `[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?`
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    /// String literal: `"[^"]*"` (no escapes)
    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    Str(String),

    /// Name (identifier): `[a-zA-Z_][a-zA-Z0-9_]*`
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Name(String),
}

impl Token {
    /// The identifier-like lexeme of this token, if it has one.
    ///
    /// Keywords are ordinary words (`params`, `config`, ...), so contexts
    /// that take an arbitrary name (member fields, object keys) accept
    /// them too and recover the original spelling here.
    pub fn name_lexeme(&self) -> Option<&str> {
        match self {
            Token::Name(name) => Some(name),
            Token::Import => Some("import"),
            Token::From => Some("from"),
            Token::Helpers => Some("helpers"),
            Token::System => Some("system"),
            Token::Lyapunov => Some("lyapunov"),
            Token::Barrier => Some("barrier"),
            Token::Mode => Some("mode"),
            Token::Planner => Some("planner"),
            Token::Integration => Some("integration"),
            Token::ContinuousState => Some("continuous_state"),
            Token::Input => Some("input"),
            Token::Inputs => Some("inputs"),
            Token::Params => Some("params"),
            Token::FlowDynamics => Some("flow_dynamics"),
            Token::Controller => Some("controller"),
            Token::Config => Some("config"),
            Token::Obstacles => Some("obstacles"),
            Token::If => Some("if"),
            Token::Then => Some("then"),
            Token::Else => Some("else"),
            _ => None,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Import => write!(f, "import"),
            Token::From => write!(f, "from"),
            Token::Helpers => write!(f, "helpers"),
            Token::System => write!(f, "system"),
            Token::Lyapunov => write!(f, "lyapunov"),
            Token::Barrier => write!(f, "barrier"),
            Token::Mode => write!(f, "mode"),
            Token::Planner => write!(f, "planner"),
            Token::Integration => write!(f, "integration"),
            Token::ContinuousState => write!(f, "continuous_state"),
            Token::Input => write!(f, "input"),
            Token::Inputs => write!(f, "inputs"),
            Token::Params => write!(f, "params"),
            Token::FlowDynamics => write!(f, "flow_dynamics"),
            Token::Controller => write!(f, "controller"),
            Token::Config => write!(f, "config"),
            Token::Obstacles => write!(f, "obstacles"),
            Token::If => write!(f, "if"),
            Token::Then => write!(f, "then"),
            Token::Else => write!(f, "else"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::StarStar => write!(f, "**"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Caret => write!(f, "^"),
            Token::EqEq => write!(f, "=="),
            Token::BangEq => write!(f, "!="),
            Token::LtEq => write!(f, "<="),
            Token::GtEq => write!(f, ">="),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::Eq => write!(f, "="),
            Token::Colon => write!(f, ":"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Number(n) => write!(f, "{}", n),
            Token::Str(s) => write!(f, "\"{}\"", s),
            Token::Name(n) => write!(f, "{}", n),
        }
    }
}

/// Result of lexing one source file.
///
/// `tokens` and `spans` are parallel: `spans[i]` is the byte range of
/// `tokens[i]`.
#[derive(Debug)]
pub struct LexOutput {
    /// Tokens in source order
    pub tokens: Vec<Token>,
    /// Byte span of each token
    pub spans: Vec<Span>,
    /// Diagnostics for characters that could not be tokenized
    pub diagnostics: Vec<CompileError>,
}

/// Tokenize one source file.
///
/// Never fails mid-stream: characters the lexer cannot match produce an
/// `InvalidChar` diagnostic and are skipped, so a single stray character
/// does not prevent the rest of the file from lexing.
pub fn tokenize(source: &str, file_id: u16) -> LexOutput {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut spans = Vec::new();
    let mut diagnostics = Vec::new();

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = Span::new(file_id, range.start as u32, range.end as u32);
        match result {
            Ok(token) => {
                tokens.push(token);
                spans.push(span);
            }
            Err(()) => {
                diagnostics.push(CompileError::new(
                    ErrorKind::InvalidChar,
                    span,
                    format!("invalid character '{}'", lexer.slice()),
                ));
            }
        }
    }

    LexOutput {
        tokens,
        spans,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test helper: lex source and return just the tokens.
    fn lex(source: &str) -> Vec<Token> {
        tokenize(source, 0).tokens
    }

    #[test]
    fn test_keywords() {
        let tokens = lex("system lyapunov barrier mode planner integration");
        assert_eq!(
            tokens,
            vec![
                Token::System,
                Token::Lyapunov,
                Token::Barrier,
                Token::Mode,
                Token::Planner,
                Token::Integration,
            ]
        );
    }

    #[test]
    fn test_field_keywords() {
        let tokens = lex("continuous_state input inputs params flow_dynamics controller");
        assert_eq!(
            tokens,
            vec![
                Token::ContinuousState,
                Token::Input,
                Token::Inputs,
                Token::Params,
                Token::FlowDynamics,
                Token::Controller,
            ]
        );
    }

    #[test]
    fn test_names() {
        let tokens = lex("theta omega_dot _tmp x2");
        assert_eq!(
            tokens,
            vec![
                Token::Name("theta".to_string()),
                Token::Name("omega_dot".to_string()),
                Token::Name("_tmp".to_string()),
                Token::Name("x2".to_string()),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = lex("42 9.81 5.67e-8 1e10");
        assert_eq!(
            tokens,
            vec![
                Token::Number(42.0),
                Token::Number(9.81),
                Token::Number(5.67e-8),
                Token::Number(1e10),
            ]
        );
    }

    #[test]
    fn test_strings_no_escapes() {
        let tokens = lex(r#""helpers.elfin" "a\b""#);
        // Backslash is an ordinary character; there is no escape processing.
        assert_eq!(
            tokens,
            vec![
                Token::Str("helpers.elfin".to_string()),
                Token::Str(r"a\b".to_string()),
            ]
        );
    }

    #[test]
    fn test_operators() {
        let tokens = lex("+ - * ** / ^ == != < <= > >= =");
        assert_eq!(
            tokens,
            vec![
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::StarStar,
                Token::Slash,
                Token::Caret,
                Token::EqEq,
                Token::BangEq,
                Token::Lt,
                Token::LtEq,
                Token::Gt,
                Token::GtEq,
                Token::Eq,
            ]
        );
    }

    #[test]
    fn test_power_is_not_two_stars() {
        let tokens = lex("x**2");
        assert_eq!(
            tokens,
            vec![
                Token::Name("x".to_string()),
                Token::StarStar,
                Token::Number(2.0),
            ]
        );
    }

    #[test]
    fn test_line_comments_both_forms() {
        let tokens = lex("system // comment\nS # other comment\n{");
        assert_eq!(
            tokens,
            vec![Token::System, Token::Name("S".to_string()), Token::LBrace]
        );
    }

    #[test]
    fn test_block_comments_are_not_stripped() {
        // /* */ is not part of the grammar; its characters lex as operators
        // and must surface as a parse error downstream.
        let tokens = lex("/* x */");
        assert_eq!(
            tokens,
            vec![
                Token::Slash,
                Token::Star,
                Token::Name("x".to_string()),
                Token::Star,
                Token::Slash,
            ]
        );
    }

    #[test]
    fn test_unit_annotation_tokens() {
        let tokens = lex("[m/s^2]");
        assert_eq!(
            tokens,
            vec![
                Token::LBracket,
                Token::Name("m".to_string()),
                Token::Slash,
                Token::Name("s".to_string()),
                Token::Caret,
                Token::Number(2.0),
                Token::RBracket,
            ]
        );
    }

    #[test]
    fn test_invalid_char_recovery() {
        let out = tokenize("x @ y", 0);
        assert_eq!(
            out.tokens,
            vec![Token::Name("x".to_string()), Token::Name("y".to_string())]
        );
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].kind, ErrorKind::InvalidChar);
    }

    #[test]
    fn test_name_lexeme_covers_keywords() {
        assert_eq!(Token::Params.name_lexeme(), Some("params"));
        assert_eq!(Token::Config.name_lexeme(), Some("config"));
        assert_eq!(Token::Name("mass".to_string()).name_lexeme(), Some("mass"));
        assert_eq!(Token::Plus.name_lexeme(), None);
        assert_eq!(Token::Number(1.0).name_lexeme(), None);
    }

    #[test]
    fn test_spans_are_byte_ranges() {
        let out = tokenize("m = 1.0", 0);
        assert_eq!(out.spans[0].start, 0);
        assert_eq!(out.spans[0].end, 1);
        assert_eq!(out.spans[2].start, 4);
        assert_eq!(out.spans[2].end, 7);
    }
}
