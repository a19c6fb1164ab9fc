//! Hand-written recursive descent parser for the ELFIN DSL.
//!
//! ## Architecture
//!
//! - `stream`: TokenStream wrapper with lookahead and recovery points
//! - `error`: ParseError and constructors
//! - `expr`: expression parser (precedence climbing)
//! - `decl`: section parsers (keyword-dispatched)
//! - `units`: unit-annotation parser for `[...]` brackets
//!
//! ## Error recovery
//!
//! Parsing never aborts at the first problem. Top-level recovery skips to
//! the next section keyword; inside a block, recovery skips to the next
//! statement terminator (`;`) or block delimiter (`}`), so one file can
//! report many independent errors.

mod decl;
mod error;
mod expr;
mod stream;
mod units;

pub use error::{ParseError, ParseErrorKind};
pub(crate) use stream::TokenStream;

use crate::ast::{CompilationUnit, Declaration, Expr};
use crate::foundation::Span;
use crate::lexer::Token;

/// Parse a single expression from a token stream.
///
/// `tokens` and `spans` are the parallel arrays produced by
/// [`crate::lexer::tokenize`].
///
/// # Errors
/// Returns parse errors if the tokens are not exactly one valid expression.
pub fn parse_expr(tokens: &[Token], spans: &[Span], file_id: u16) -> Result<Expr, Vec<ParseError>> {
    let mut stream = TokenStream::new(tokens, spans, file_id);
    match expr::parse_expr(&mut stream) {
        Ok(parsed) => {
            if stream.at_end() {
                Ok(parsed)
            } else {
                Err(vec![ParseError::unexpected_token(
                    stream.peek(),
                    "after expression",
                    stream.current_span(),
                )])
            }
        }
        Err(e) => Err(vec![e]),
    }
}

/// Parse all top-level declarations from a token stream.
///
/// Always returns the declarations that could be recovered, alongside the
/// errors encountered; a structurally broken file still yields partial IR.
pub fn parse_declarations(
    tokens: &[Token],
    spans: &[Span],
    file_id: u16,
) -> (Vec<Declaration>, Vec<ParseError>) {
    let mut stream = TokenStream::new(tokens, spans, file_id);
    decl::parse_declarations(&mut stream)
}

/// Parse a unit annotation body (the part between `[` and `]`).
pub(crate) fn parse_unit_annotation(
    stream: &mut TokenStream,
) -> Result<crate::ast::UnitExpr, ParseError> {
    units::parse_unit_expr(stream)
}

/// Parse one source file's tokens into a [`CompilationUnit`].
pub fn parse_unit(
    tokens: &[Token],
    spans: &[Span],
    file_id: u16,
) -> (CompilationUnit, Vec<ParseError>) {
    let (decls, errors) = parse_declarations(tokens, spans, file_id);
    let mut unit = CompilationUnit::new();
    unit.decls = decls;
    (unit, errors)
}
