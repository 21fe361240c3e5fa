//! Path text parser.
//!
//! Grammar: `$` followed by legs. A leg is `.member`, `."quoted"`,
//! `.*`, a bracket selector (`[N]`, `[last]`, `[last-N]`,
//! `[M to N]`, `[*]`), or `..` immediately followed by another leg.
//! Whitespace is tolerated between tokens.

use crate::types::{ArrayIndex, JsonPath, PathLeg};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathParseError {
    #[error("expected root identifier '$' at start of path")]
    ExpectedRoot,
    #[error("unexpected character {0:?} in path")]
    UnexpectedChar(char),
    #[error("unexpected end of path")]
    UnexpectedEnd,
    #[error("invalid array index")]
    InvalidIndex,
    #[error("unclosed quoted member name")]
    UnclosedString,
    #[error("invalid escape sequence in member name")]
    InvalidEscape,
    #[error("recursive descent must be followed by a leg")]
    DanglingEllipsis,
}

struct PathParser<'a> {
    input: &'a str,
    pos: usize,
}

impl JsonPath {
    /// Parse a path expression.
    pub fn parse(input: &str) -> Result<JsonPath, PathParseError> {
        let mut parser = PathParser { input, pos: 0 };
        parser.parse_path()
    }
}

impl<'a> PathParser<'a> {
    fn parse_path(&mut self) -> Result<JsonPath, PathParseError> {
        self.skip_whitespace();
        if self.peek() != Some('$') {
            return Err(PathParseError::ExpectedRoot);
        }
        self.advance();

        let mut legs = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some('.') => {
                    self.advance();
                    if self.peek() == Some('.') {
                        self.advance();
                        legs.push(PathLeg::Ellipsis);
                        legs.push(self.parse_leg_after_ellipsis()?);
                    } else {
                        legs.push(self.parse_member_leg()?);
                    }
                }
                Some('[') => legs.push(self.parse_bracket_leg()?),
                Some(c) => return Err(PathParseError::UnexpectedChar(c)),
            }
        }
        Ok(JsonPath::new(legs))
    }

    /// After `..` a leg must follow directly: `a`, `"quoted"`, `*`,
    /// or a bracket selector.
    fn parse_leg_after_ellipsis(&mut self) -> Result<PathLeg, PathParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some('[') => self.parse_bracket_leg(),
            Some(_) => self
                .parse_member_leg()
                .map_err(|e| match e {
                    PathParseError::UnexpectedEnd => PathParseError::DanglingEllipsis,
                    other => other,
                }),
            None => Err(PathParseError::DanglingEllipsis),
        }
    }

    fn parse_member_leg(&mut self) -> Result<PathLeg, PathParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some('*') => {
                self.advance();
                Ok(PathLeg::MemberWildcard)
            }
            Some('"') => Ok(PathLeg::Member(self.parse_quoted_name()?)),
            Some(_) => Ok(PathLeg::Member(self.parse_identifier()?)),
            None => Err(PathParseError::UnexpectedEnd),
        }
    }

    fn parse_bracket_leg(&mut self) -> Result<PathLeg, PathParseError> {
        self.expect('[')?;
        self.skip_whitespace();

        if self.peek() == Some('*') {
            self.advance();
            self.skip_whitespace();
            self.expect(']')?;
            return Ok(PathLeg::CellWildcard);
        }

        let begin = self.parse_array_index()?;
        self.skip_whitespace();

        // `[M to N]` is an inclusive range.
        if self.peek_keyword("to") {
            self.pos += 2;
            self.skip_whitespace();
            let end = self.parse_array_index()?;
            self.skip_whitespace();
            self.expect(']')?;
            return Ok(PathLeg::Range { begin, end });
        }

        self.expect(']')?;
        Ok(PathLeg::Cell(begin))
    }

    fn parse_array_index(&mut self) -> Result<ArrayIndex, PathParseError> {
        if self.peek_keyword("last") {
            self.pos += 4;
            self.skip_whitespace();
            if self.peek() == Some('-') {
                self.advance();
                self.skip_whitespace();
                let n = self.parse_number()?;
                Ok(ArrayIndex::from_end(n))
            } else {
                Ok(ArrayIndex::from_end(0))
            }
        } else {
            Ok(ArrayIndex::forward(self.parse_number()?))
        }
    }

    fn parse_number(&mut self) -> Result<u32, PathParseError> {
        let start = self.pos;
        while matches!(self.peek(), Some('0'..='9')) {
            self.advance();
        }
        if self.pos == start {
            return Err(PathParseError::InvalidIndex);
        }
        self.input[start..self.pos]
            .parse()
            .map_err(|_| PathParseError::InvalidIndex)
    }

    fn parse_identifier(&mut self) -> Result<String, PathParseError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                self.advance();
            } else {
                break;
            }
        }
        if self.pos == start {
            return match self.peek() {
                Some(c) => Err(PathParseError::UnexpectedChar(c)),
                None => Err(PathParseError::UnexpectedEnd),
            };
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_quoted_name(&mut self) -> Result<String, PathParseError> {
        self.expect('"')?;
        let mut name = String::new();
        loop {
            match self.peek() {
                None => return Err(PathParseError::UnclosedString),
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        Some('"') => name.push('"'),
                        Some('\\') => name.push('\\'),
                        Some('/') => name.push('/'),
                        Some('n') => name.push('\n'),
                        Some('t') => name.push('\t'),
                        Some('r') => name.push('\r'),
                        _ => return Err(PathParseError::InvalidEscape),
                    }
                    self.advance();
                }
                Some(c) => {
                    name.push(c);
                    self.advance();
                }
            }
        }
        Ok(name)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// True if `word` starts at the cursor and is not glued to a
    /// longer identifier.
    fn peek_keyword(&self, word: &str) -> bool {
        let rest = &self.input[self.pos..];
        if !rest.starts_with(word) {
            return false;
        }
        match rest[word.len()..].chars().next() {
            Some(c) => !(c.is_ascii_alphanumeric() || c == '_'),
            None => true,
        }
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), PathParseError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.advance();
                Ok(())
            }
            Some(c) => Err(PathParseError::UnexpectedChar(c)),
            None => Err(PathParseError::UnexpectedEnd),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }
}
