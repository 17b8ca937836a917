//! Token cursor over the `sqlparser` tokenizer output.

use sqlparser::dialect::GenericDialect;
use sqlparser::tokenizer::{Token, Tokenizer, Word};

use crate::error::{ParseError, ParseResult};

/// Words that end an expression or table reference and therefore cannot be
/// used as an implicit alias.
const RESERVED: &[&str] = &[
    "ALL",
    "AND",
    "AS",
    "ASC",
    "BETWEEN",
    "BY",
    "CASE",
    "DEFINING_WHERE",
    "DESC",
    "DISTINCT",
    "ELSE",
    "END",
    "ESCAPE",
    "FROM",
    "GROUP",
    "HAS",
    "HAS_LIKE",
    "HAVING",
    "IN",
    "INNER",
    "IS",
    "JOIN",
    "LEFT",
    "LIKE",
    "LIMIT",
    "NOT",
    "OFFSET",
    "ON",
    "OR",
    "ORDER",
    "OUTER",
    "RIGHT",
    "SELECT",
    "THEN",
    "UNION",
    "WHEN",
    "WHERE",
    "WITH",
];

/// Returns `true` if an unquoted `word` cannot be an implicit alias.
pub(crate) fn is_reserved(word: &str) -> bool {
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(word))
}

/// A forward-only cursor over non-whitespace tokens.
pub(crate) struct TokenStream {
    tokens: Vec<Token>,
    index: usize,
}

impl TokenStream {
    /// Tokenizes `sql` with the generic dialect.
    pub(crate) fn new(sql: &str) -> ParseResult<Self> {
        if sql.trim().is_empty() {
            return Err(ParseError::EmptyQuery);
        }
        let dialect = GenericDialect {};
        let tokens = Tokenizer::new(&dialect, sql)
            .tokenize()?
            .into_iter()
            .filter(|t| !matches!(t, Token::Whitespace(_) | Token::EOF))
            .collect();
        Ok(Self { tokens, index: 0 })
    }

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    pub(crate) fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.index + n)
    }

    pub(crate) fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    /// Text describing the next token, for error messages.
    pub(crate) fn found(&self) -> String {
        self.peek().map_or_else(|| "end of query".to_string(), ToString::to_string)
    }

    /// The error for a missing `expected` at the current position.
    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        if self.is_at_end() {
            ParseError::UnexpectedEnd(expected.to_string())
        } else {
            ParseError::UnexpectedToken { expected: expected.to_string(), found: self.found() }
        }
    }

    /// Returns `true` if the `n`th token ahead is the unquoted keyword `keyword`.
    pub(crate) fn peek_nth_keyword(&self, n: usize, keyword: &str) -> bool {
        matches!(
            self.peek_nth(n),
            Some(Token::Word(Word { value, quote_style: None, .. }))
                if value.eq_ignore_ascii_case(keyword)
        )
    }

    pub(crate) fn peek_keyword(&self, keyword: &str) -> bool {
        self.peek_nth_keyword(0, keyword)
    }

    /// Consumes `keyword` if it is next.
    pub(crate) fn parse_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Consumes the whole keyword sequence if it is next, otherwise nothing.
    pub(crate) fn parse_keywords(&mut self, keywords: &[&str]) -> bool {
        let matched = keywords.iter().enumerate().all(|(n, kw)| self.peek_nth_keyword(n, kw));
        if matched {
            self.index += keywords.len();
        }
        matched
    }

    pub(crate) fn expect_keyword(&mut self, keyword: &str) -> ParseResult<()> {
        if self.parse_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(keyword))
        }
    }

    /// Consumes `token` if it is next.
    pub(crate) fn consume(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, token: &Token) -> ParseResult<()> {
        if self.consume(token) {
            Ok(())
        } else {
            Err(self.unexpected(&token.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_is_skipped() {
        let mut tokens = TokenStream::new("select  foo\n from syn1").unwrap();
        assert!(tokens.parse_keyword("SELECT"));
        assert!(!tokens.parse_keyword("from"));
        assert!(matches!(tokens.next_token(), Some(Token::Word(_))));
        assert!(tokens.parse_keywords(&["FROM"]));
        assert!(matches!(tokens.next_token(), Some(Token::Word(_))));
        assert!(tokens.is_at_end());
    }

    #[test]
    fn quoted_words_are_not_keywords() {
        let tokens = TokenStream::new("\"select\"").unwrap();
        assert!(!tokens.peek_keyword("select"));
    }

    #[test]
    fn empty_input() {
        assert!(matches!(TokenStream::new("  "), Err(ParseError::EmptyQuery)));
    }

    #[test]
    fn keyword_sequence_is_all_or_nothing() {
        let mut tokens = TokenStream::new("GROUP foo").unwrap();
        assert!(!tokens.parse_keywords(&["GROUP", "BY"]));
        assert!(tokens.peek_keyword("GROUP"));
    }
}
