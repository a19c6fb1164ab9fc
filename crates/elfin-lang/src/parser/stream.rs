//! Token stream wrapper for the hand-written parser.

use crate::foundation::Span;
use crate::lexer::Token;

/// Token stream with lookahead and position tracking.
///
/// Holds the parallel token/span arrays produced by the lexer and provides
/// consuming, lookahead and span-merging operations for the recursive
/// descent parser.
pub struct TokenStream<'src> {
    tokens: &'src [Token],
    spans: &'src [Span],
    pos: usize,
    file_id: u16,
}

impl<'src> TokenStream<'src> {
    /// Create a new token stream.
    pub fn new(tokens: &'src [Token], spans: &'src [Span], file_id: u16) -> Self {
        debug_assert_eq!(tokens.len(), spans.len());
        Self {
            tokens,
            spans,
            pos: 0,
            file_id,
        }
    }

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> Option<&'src Token> {
        self.tokens.get(self.pos)
    }

    /// Peek at the nth token ahead without consuming.
    pub fn peek_nth(&self, n: usize) -> Option<&'src Token> {
        self.tokens.get(self.pos + n)
    }

    /// Advance to the next token and return the consumed one.
    pub fn advance(&mut self) -> Option<&'src Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check if the current token matches the expected token's variant.
    pub fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Advance past the current token if it matches; returns whether it did.
    pub fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect a specific token and advance if it matches.
    ///
    /// Returns the consumed token's span, or an error if it doesn't match.
    pub fn expect(&mut self, expected: Token) -> Result<Span, super::ParseError> {
        if self.check(&expected) {
            let span = self.current_span();
            self.advance();
            Ok(span)
        } else {
            Err(super::ParseError::expected_token(
                &expected,
                self.peek(),
                self.current_span(),
            ))
        }
    }

    /// Check if we've reached the end of the token stream.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Get the current position in the token stream.
    pub fn current_pos(&self) -> usize {
        self.pos
    }

    /// Span covering everything from a starting position to the last
    /// consumed token.
    pub fn span_from(&self, start: usize) -> Span {
        let end_idx = self.pos.saturating_sub(1);
        match (self.spans.get(start), self.spans.get(end_idx)) {
            (Some(a), Some(b)) if end_idx >= start => a.merge(b),
            (Some(a), _) => *a,
            _ => self.eof_span(),
        }
    }

    /// Span of the current token (zero-length at EOF).
    pub fn current_span(&self) -> Span {
        self.spans
            .get(self.pos)
            .copied()
            .unwrap_or_else(|| self.eof_span())
    }

    fn eof_span(&self) -> Span {
        let end = self.spans.last().map(|s| s.end).unwrap_or(0);
        Span::new(self.file_id, end, end)
    }

    /// Synchronize to the next section keyword for top-level error recovery.
    pub fn synchronize(&mut self) {
        while let Some(token) = self.peek() {
            if is_section_keyword(token) {
                break;
            }
            self.advance();
        }
    }

    /// Synchronize to the next statement boundary for in-block recovery.
    ///
    /// Consumes up to and including the next `;`; stops without consuming
    /// before `}` or any section/field keyword. Callers that need
    /// guaranteed progress must advance themselves when this is a no-op.
    pub fn synchronize_statement(&mut self) {
        while let Some(token) = self.peek() {
            match token {
                Token::Semicolon => {
                    self.advance();
                    return;
                }
                Token::RBrace => return,
                t if is_section_keyword(t) || is_field_keyword(t) => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

/// Keywords that open a top-level section.
pub(super) fn is_section_keyword(token: &Token) -> bool {
    matches!(
        token,
        Token::Import
            | Token::Helpers
            | Token::System
            | Token::Lyapunov
            | Token::Barrier
            | Token::Mode
            | Token::Planner
            | Token::Integration
    )
}

/// Keywords that open a field inside a section body.
pub(super) fn is_field_keyword(token: &Token) -> bool {
    matches!(
        token,
        Token::ContinuousState
            | Token::Input
            | Token::Inputs
            | Token::Params
            | Token::FlowDynamics
            | Token::Controller
            | Token::Config
            | Token::Obstacles
    )
}
