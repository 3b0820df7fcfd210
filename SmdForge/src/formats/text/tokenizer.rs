//! Position-aware tokenizer for SMD text
//!
//! The whole input is lexed up front into an immutable token list; the
//! tokenizer is a cursor (index) into it, so stepping back is free and
//! diagnostics can always point at a concrete token.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};

lazy_static! {
    // A quoted run may contain whitespace and backslash-escaped quotes.
    static ref WORD: Regex = Regex::new(r#"("(?:\\.|[^"\\])*"|\S+)(\s*)"#).expect("valid regex");
    static ref LEADING_WHITESPACE: Regex = Regex::new(r"^\s*").expect("valid regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A maximal non-whitespace run, or a double-quoted run
    Word,
    /// End of a source line
    EndOfLine,
}

/// One lexed token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Whitespace between the previous token (or line start) and this one
    pub whitespace_before: String,
    /// Token text; `"\n"` for end-of-line tokens
    pub text: String,
    /// 1-based source line
    pub line: usize,
    /// 0-based byte column
    pub column: usize,
}

impl Token {
    fn word(whitespace_before: &str, text: &str, line: usize, column: usize) -> Self {
        Self {
            kind: TokenKind::Word,
            whitespace_before: whitespace_before.to_string(),
            text: text.to_string(),
            line,
            column,
        }
    }

    fn end_of_line(whitespace_before: &str, line: usize, column: usize) -> Self {
        Self {
            kind: TokenKind::EndOfLine,
            whitespace_before: whitespace_before.to_string(),
            text: "\n".to_string(),
            line,
            column,
        }
    }

    pub fn is_eol(&self) -> bool {
        self.kind == TokenKind::EndOfLine
    }

    /// Case-insensitive keyword check on a word token
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(keyword)
    }

    /// Build a parse error pointing at this token
    pub fn error(&self, message: impl Into<String>) -> Error {
        parse_error(Some(self), message)
    }
}

fn parse_error(token: Option<&Token>, message: impl Into<String>) -> Error {
    Error::Parse {
        line: token.map_or(0, |t| t.line),
        column: token.map_or(0, |t| t.column),
        token: token.map(|t| t.text.clone()),
        message: message.into(),
    }
}

/// Cursor over the tokens of one text file
#[derive(Debug, Clone)]
pub struct Tokenizer {
    tokens: Vec<Token>,
    index: usize,
}

impl Tokenizer {
    /// Lex `data`. Never fails; malformed text surfaces later as a parse or
    /// format error from whoever consumes the tokens.
    pub fn new(data: &str) -> Self {
        let mut lines: Vec<&str> = data
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        while lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }

        let mut tokens = Vec::new();
        for (line_index, line) in lines.into_iter().enumerate() {
            let line_number = line_index + 1;
            let mut whitespace_before = LEADING_WHITESPACE
                .find(line)
                .map_or("", |m| m.as_str());
            let mut search_from = whitespace_before.len();

            for caps in WORD.captures_iter(&line[search_from..]) {
                let (Some(word), Some(trailing)) = (caps.get(1), caps.get(2)) else {
                    continue;
                };
                tokens.push(Token::word(
                    whitespace_before,
                    word.as_str(),
                    line_number,
                    search_from + word.start(),
                ));
                whitespace_before = trailing.as_str();
            }
            search_from = line.len();
            tokens.push(Token::end_of_line(whitespace_before, line_number, search_from));
        }

        Self { tokens, index: 0 }
    }

    /// All tokens, independent of the cursor
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Move the cursor, clamped to `0..=len`
    pub fn set_index(&mut self, index: usize) {
        self.index = index.min(self.tokens.len());
    }

    /// True once every token has been consumed
    pub fn eof(&self) -> bool {
        self.index >= self.tokens.len()
    }

    /// The token under the cursor
    pub fn current(&self) -> Result<&Token> {
        self.tokens
            .get(self.index)
            .ok_or_else(|| parse_error(self.tokens.last(), "end of file reached"))
    }

    /// The token before the cursor, if any
    pub fn previous(&self) -> Option<&Token> {
        self.index.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    /// Return the token under the cursor and advance past it
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<&Token> {
        if self.eof() {
            return Err(parse_error(self.tokens.last(), "end of file reached"));
        }
        self.index += 1;
        Ok(&self.tokens[self.index - 1])
    }

    /// Step the cursor back one token
    pub fn back(&mut self) -> Result<&mut Self> {
        if self.index == 0 {
            return Err(parse_error(self.tokens.first(), "beginning of file reached"));
        }
        self.index -= 1;
        Ok(self)
    }

    /// Step the cursor forward one token
    pub fn advance(&mut self) -> Result<&mut Self> {
        if self.eof() {
            return Err(parse_error(self.tokens.last(), "end of file reached"));
        }
        self.index += 1;
        Ok(self)
    }

    /// Consume word tokens up to and including the next end-of-line token.
    ///
    /// Returns `None` at end of input. The returned slice excludes the
    /// end-of-line token itself.
    pub fn next_line(&mut self) -> Option<Line<'_>> {
        if self.eof() {
            return None;
        }
        let start = self.index;
        while self.index < self.tokens.len() && !self.tokens[self.index].is_eol() {
            self.index += 1;
        }
        let end = self.index;
        if end < self.tokens.len() {
            self.index += 1;
        }
        Some(Line {
            words: &self.tokens[start..end],
            eol: self.tokens.get(end),
        })
    }
}

/// The word tokens of one source line
#[derive(Debug, Clone, Copy)]
pub struct Line<'a> {
    pub words: &'a [Token],
    eol: Option<&'a Token>,
}

impl Line<'_> {
    /// 1-based source line number
    pub fn number(&self) -> usize {
        self.words
            .first()
            .or(self.eol)
            .map_or(0, |token| token.line)
    }

    pub fn is_blank(&self) -> bool {
        self.words.is_empty()
    }

    /// Single keyword line such as `end` or `nodes`
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.words.len() == 1 && self.words[0].is_keyword(keyword)
    }

    /// Line text from the first word on, with the original inner spacing
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, token) in self.words.iter().enumerate() {
            if i > 0 {
                out.push_str(&token.whitespace_before);
            }
            out.push_str(&token.text);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_and_line_ends() {
        let tokenizer = Tokenizer::new("nodes\n0 \"root bone\" -1\nend\n");
        let texts: Vec<&str> = tokenizer.tokens().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(
            texts,
            ["nodes", "\n", "0", "\"root bone\"", "-1", "\n", "end", "\n"]
        );
        assert_eq!(tokenizer.tokens()[3].line, 2);
        assert_eq!(tokenizer.tokens()[3].column, 2);
    }

    #[test]
    fn test_whitespace_reproduces_source() {
        let source = "  version 1\r\n0  0.5 0 0\t0 0 0  \n\n   \nend";
        let tokenizer = Tokenizer::new(source);
        let rebuilt: String = tokenizer
            .tokens()
            .iter()
            .map(|t| format!("{}{}", t.whitespace_before, t.text))
            .collect();
        assert_eq!(rebuilt, source.replace('\r', "") + "\n");
    }

    #[test]
    fn test_escaped_quote_stays_in_word() {
        let tokenizer = Tokenizer::new(r#"3 "say \"hi\"" 0"#);
        assert_eq!(tokenizer.tokens()[1].text, r#""say \"hi\"""#);
        assert_eq!(tokenizer.tokens()[2].text, "0");
    }

    #[test]
    fn test_cursor_movement() {
        let mut tokenizer = Tokenizer::new("a b");
        assert_eq!(tokenizer.next().unwrap().text, "a");
        assert_eq!(tokenizer.current().unwrap().text, "b");
        assert_eq!(tokenizer.previous().unwrap().text, "a");
        tokenizer.back().unwrap();
        assert_eq!(tokenizer.index(), 0);
        tokenizer.advance().unwrap().advance().unwrap().advance().unwrap();
        assert!(tokenizer.eof());
        assert!(tokenizer.current().is_err());
    }

    #[test]
    fn test_boundaries_fail_with_edge_token() {
        let mut tokenizer = Tokenizer::new("first last");
        let err = tokenizer.back().unwrap_err();
        assert!(err.is_parse_error());
        assert!(err.to_string().contains("first"));

        tokenizer.set_index(usize::MAX);
        assert!(tokenizer.eof());
        let err = tokenizer.advance().unwrap_err();
        assert!(err.to_string().contains("\\n"));
        assert!(tokenizer.next().is_err());
    }

    #[test]
    fn test_empty_input() {
        let mut tokenizer = Tokenizer::new("");
        assert!(tokenizer.is_empty());
        assert!(tokenizer.eof());
        assert!(tokenizer.back().unwrap_err().is_parse_error());
        assert!(tokenizer.advance().unwrap_err().is_parse_error());
        assert!(tokenizer.next_line().is_none());
    }

    #[test]
    fn test_next_line() {
        let mut tokenizer = Tokenizer::new("time 0\n\n1  0.5 0.25 0  0 0 0\n");
        let first = tokenizer.next_line().unwrap();
        assert_eq!(first.words.len(), 2);
        assert_eq!(first.number(), 1);
        assert!(tokenizer.next_line().unwrap().is_blank());
        let third = tokenizer.next_line().unwrap();
        assert_eq!(third.text(), "1  0.5 0.25 0  0 0 0");
        assert_eq!(third.number(), 3);
        assert!(tokenizer.next_line().is_none());
    }
}
