//! Content stream tokenizer.
//!
//! Splits raw content stream bytes into operands, structural delimiters and
//! operator keywords. Comments are skipped. Inline image data is not
//! tokenized; the parser reads it raw with [`ContentLexer::read_inline_data`].

use smol_str::SmolStr;

use crate::error::{FolioError, Result};

/// Content stream token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Integer(i64),
    Real(f64),
    Bool(bool),
    Null,
    /// Name without the leading slash, `#xx` escapes decoded
    Name(SmolStr),
    /// Literal or hexadecimal string
    Str(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    DictStart,
    DictEnd,
    /// Operator or any other bare word
    Keyword(SmolStr),
}

/// Lexer over a single content stream.
pub struct ContentLexer<'a> {
    data: &'a [u8],
    pos: usize,
}

pub(crate) fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x00' | b'\x0c')
}

fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn is_keyword_end(b: u8) -> bool {
    is_whitespace(b) || is_delimiter(b)
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl<'a> ContentLexer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current position in stream.
    pub fn tell(&self) -> usize {
        self.pos
    }

    /// Set current position in stream.
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn skip_whitespace(&mut self) {
        let data = self.data;
        while self.pos < data.len() {
            let b = data[self.pos];
            if b == b'%' {
                while self.pos < data.len() && !matches!(data[self.pos], b'\r' | b'\n') {
                    self.pos += 1;
                }
                continue;
            }
            if !is_whitespace(b) {
                break;
            }
            self.pos += 1;
        }
    }

    fn parse_name(&mut self) -> Token {
        let data = self.data;
        let mut pos = self.pos + 1; // skip '/'
        let mut name = Vec::with_capacity(16);

        while pos < data.len() {
            let b = data[pos];
            if is_keyword_end(b) {
                break;
            }
            if b == b'#'
                && let (Some(h1), Some(h2)) = (
                    data.get(pos + 1).copied().and_then(hex_value),
                    data.get(pos + 2).copied().and_then(hex_value),
                )
            {
                name.push((h1 << 4) | h2);
                pos += 3;
                continue;
            }
            name.push(b);
            pos += 1;
        }

        self.pos = pos;
        Token::Name(SmolStr::new(String::from_utf8_lossy(&name)))
    }

    /// Numbers are `[+-]digits[.digits]` or `[+-].digits`. A malformed
    /// number is returned as a keyword so the operator gets skipped.
    fn parse_number(&mut self) -> Token {
        let data = self.data;
        let start = self.pos;
        let mut pos = start;
        if matches!(data.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        let mut digits = 0;
        let mut has_dot = false;
        while pos < data.len() {
            match data[pos] {
                b'0'..=b'9' => digits += 1,
                b'.' if !has_dot => has_dot = true,
                _ => break,
            }
            pos += 1;
        }
        if digits == 0 || (pos < data.len() && !is_keyword_end(data[pos])) {
            return self.parse_keyword();
        }
        self.pos = pos;

        // The slice is ASCII by construction.
        let text = std::str::from_utf8(&data[start..pos]).unwrap_or("0");
        let text = text.strip_prefix('+').unwrap_or(text);
        if has_dot {
            let value = text.parse::<f64>().unwrap_or(0.0);
            return Token::Real(value);
        }
        match text.parse::<i64>() {
            Ok(value) => Token::Integer(value),
            // Integers past i64 degrade to reals.
            Err(_) => Token::Real(text.parse::<f64>().unwrap_or(0.0)),
        }
    }

    fn parse_string(&mut self) -> Result<Token> {
        let data = self.data;
        let mut pos = self.pos + 1; // skip '('
        let mut depth = 1;
        let mut result = Vec::with_capacity(32);

        while pos < data.len() && depth > 0 {
            let c = data[pos];
            pos += 1;
            match c {
                b'(' => {
                    depth += 1;
                    result.push(b'(');
                }
                b')' => {
                    depth -= 1;
                    if depth > 0 {
                        result.push(b')');
                    }
                }
                b'\\' => {
                    let Some(&esc) = data.get(pos) else {
                        break;
                    };
                    pos += 1;
                    match esc {
                        b'n' => result.push(b'\n'),
                        b'r' => result.push(b'\r'),
                        b't' => result.push(b'\t'),
                        b'b' => result.push(0x08),
                        b'f' => result.push(0x0c),
                        // Line continuation.
                        b'\r' => {
                            if data.get(pos) == Some(&b'\n') {
                                pos += 1;
                            }
                        }
                        b'\n' => {}
                        b'0'..=b'7' => {
                            let mut octal = u32::from(esc - b'0');
                            for _ in 0..2 {
                                match data.get(pos) {
                                    Some(&d @ b'0'..=b'7') => {
                                        octal = octal * 8 + u32::from(d - b'0');
                                        pos += 1;
                                    }
                                    _ => break,
                                }
                            }
                            result.push((octal & 0xFF) as u8);
                        }
                        c => result.push(c),
                    }
                }
                c => result.push(c),
            }
        }

        self.pos = pos;
        if depth > 0 {
            return Err(FolioError::UnexpectedEof);
        }
        Ok(Token::Str(result))
    }

    fn parse_hex_string(&mut self) -> Result<Token> {
        let data = self.data;
        let mut pos = self.pos + 1; // skip '<'
        let mut result = Vec::with_capacity(32);
        let mut pending: Option<u8> = None;

        loop {
            let Some(&c) = data.get(pos) else {
                self.pos = pos;
                return Err(FolioError::UnexpectedEof);
            };
            pos += 1;
            if c == b'>' {
                break;
            }
            if is_whitespace(c) {
                continue;
            }
            let Some(nibble) = hex_value(c) else {
                // Resume after the closing bracket.
                let rest = &data[pos..];
                self.pos = pos + rest.iter().position(|&b| b == b'>').map_or(rest.len(), |i| i + 1);
                return Err(FolioError::TokenError {
                    pos: pos - 1,
                    msg: format!("invalid hex digit {:?}", char::from(c)),
                });
            };
            match pending.take() {
                Some(high) => result.push((high << 4) | nibble),
                None => pending = Some(nibble),
            }
        }
        // An odd final digit is followed by an implicit zero.
        if let Some(high) = pending {
            result.push(high << 4);
        }

        self.pos = pos;
        Ok(Token::Str(result))
    }

    fn parse_keyword(&mut self) -> Token {
        let data = self.data;
        let start = self.pos;
        let mut pos = start;
        while pos < data.len() && !is_keyword_end(data[pos]) {
            pos += 1;
        }
        // A stray delimiter such as ')' forms a keyword of its own.
        if pos == start {
            pos += 1;
        }
        self.pos = pos;
        match &data[start..pos] {
            b"true" => Token::Bool(true),
            b"false" => Token::Bool(false),
            b"null" => Token::Null,
            bytes => Token::Keyword(SmolStr::new(String::from_utf8_lossy(bytes))),
        }
    }

    /// Returns the next token with its position.
    ///
    /// Errors leave the lexer past the offending input, so tokenizing can
    /// continue.
    pub fn next_token(&mut self) -> Option<Result<(usize, Token)>> {
        self.skip_whitespace();
        let data = self.data;
        let start = self.pos;
        let b = *data.get(start)?;

        let result = match b {
            b'/' => Ok(self.parse_name()),
            b'(' => self.parse_string(),
            b'<' if data.get(start + 1) == Some(&b'<') => {
                self.pos += 2;
                Ok(Token::DictStart)
            }
            b'<' => self.parse_hex_string(),
            b'>' if data.get(start + 1) == Some(&b'>') => {
                self.pos += 2;
                Ok(Token::DictEnd)
            }
            b'[' => {
                self.pos += 1;
                Ok(Token::ArrayStart)
            }
            b']' => {
                self.pos += 1;
                Ok(Token::ArrayEnd)
            }
            b'+' | b'-' | b'.' | b'0'..=b'9' => Ok(self.parse_number()),
            _ => Ok(self.parse_keyword()),
        };
        Some(result.map(|token| (start, token)))
    }

    /// Reads inline image data following the `ID` operator, up to the `EI`
    /// that ends it. The lexer is left after `EI`.
    ///
    /// One whitespace byte separates `ID` from the data. `EI` only counts
    /// when it is surrounded by whitespace (or ends the stream).
    pub fn read_inline_data(&mut self) -> Vec<u8> {
        let data = self.data;
        let mut start = self.pos;
        if data.get(start).copied().is_some_and(is_whitespace) {
            start += 1;
        }
        let mut pos = start;
        while pos + 2 <= data.len() {
            if &data[pos..pos + 2] == b"EI"
                && pos > start
                && is_whitespace(data[pos - 1])
                && data.get(pos + 2).is_none_or(|&b| is_whitespace(b))
            {
                self.pos = pos + 2;
                return data[start..pos - 1].to_vec();
            }
            pos += 1;
        }
        self.pos = data.len();
        data[start.min(data.len())..].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(data: &[u8]) -> Vec<Token> {
        let mut lexer = ContentLexer::new(data);
        let mut out = Vec::new();
        while let Some(result) = lexer.next_token() {
            out.push(result.unwrap().1);
        }
        out
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokens(b"1 -2 +3 .5 -.25 4."),
            vec![
                Token::Integer(1),
                Token::Integer(-2),
                Token::Integer(3),
                Token::Real(0.5),
                Token::Real(-0.25),
                Token::Real(4.0),
            ]
        );
    }

    #[test]
    fn test_malformed_number_is_keyword() {
        assert_eq!(tokens(b"1.2.3"), vec![Token::Keyword("1.2.3".into())]);
        assert_eq!(tokens(b"-"), vec![Token::Keyword("-".into())]);
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            tokens(b"(a\\(b\\)c\\101\\\nd (nested))"),
            vec![Token::Str(b"a(b)cAd (nested)".to_vec())]
        );
    }

    #[test]
    fn test_hex_string_odd_digit() {
        assert_eq!(tokens(b"<4F3>"), vec![Token::Str(vec![0x4f, 0x30])]);
    }

    #[test]
    fn test_keywords_and_literals() {
        assert_eq!(
            tokens(b"true false null T* '"),
            vec![
                Token::Bool(true),
                Token::Bool(false),
                Token::Null,
                Token::Keyword("T*".into()),
                Token::Keyword("'".into()),
            ]
        );
    }

    #[test]
    fn test_unterminated_string_is_error() {
        let mut lexer = ContentLexer::new(b"(abc");
        assert!(matches!(lexer.next_token(), Some(Err(FolioError::UnexpectedEof))));
        assert!(lexer.next_token().is_none());
    }

    #[test]
    fn test_inline_data() {
        let mut lexer = ContentLexer::new(b" \x01EI\x02 EI Q");
        // An `EI` inside the data is not preceded by whitespace.
        assert_eq!(lexer.read_inline_data(), b"\x01EI\x02".to_vec());
        assert_eq!(
            lexer.next_token().unwrap().unwrap().1,
            Token::Keyword("Q".into())
        );
    }
}
