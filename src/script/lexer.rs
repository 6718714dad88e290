// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Tokenizer for embedded page scripts

use crate::error::{Error, Result};

/// Token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier or keyword
    Ident(String),
    /// String literal with escapes decoded
    Str(String),
    /// Numeric literal
    Num(f64),
    /// Template literal (content kept raw)
    Template(String),
    /// Regular expression literal (content kept raw)
    Regex(String),
    /// Punctuator
    Punct(&'static str),
    /// End of input
    Eof,
}

/// A token with its byte offset
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
    /// A line terminator precedes this token
    pub newline_before: bool,
}

impl Token {
    /// Check for a specific punctuator
    pub fn is_punct(&self, p: &str) -> bool {
        matches!(self.kind, TokenKind::Punct(q) if q == p)
    }

    /// Check for a specific identifier or keyword
    pub fn is_ident(&self, name: &str) -> bool {
        matches!(self.kind, TokenKind::Ident(ref n) if n == name)
    }
}

// Longest first
const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "<<", ">>", "**", "{", "}", "(", ")", "[", "]", ";", ",", "<", ">", "+", "-",
    "*", "/", "%", "&", "|", "^", "!", "~", "?", ":", "=", ".", "@", "#",
];

/// Keywords after which a `/` starts a regular expression
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else",
];

/// Tokenize script text
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
    newline_before: bool,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
            newline_before: false,
        }
    }

    fn run(mut self) -> Result<Vec<Token>> {
        loop {
            self.skip_trivia()?;
            let start = self.pos;
            let Some(c) = self.peek_char() else {
                self.push(TokenKind::Eof, start);
                return Ok(self.tokens);
            };

            let kind = if c == '"' || c == '\'' {
                TokenKind::Str(self.read_string(c)?)
            } else if c == '`' {
                TokenKind::Template(self.read_template()?)
            } else if c.is_ascii_digit()
                || (c == '.' && self.byte_at(self.pos + 1).map_or(false, |b| b.is_ascii_digit()))
            {
                TokenKind::Num(self.read_number()?)
            } else if is_ident_start(c) {
                TokenKind::Ident(self.read_identifier())
            } else if c == '/' && self.regex_allowed() {
                TokenKind::Regex(self.read_regex()?)
            } else {
                TokenKind::Punct(self.read_punct()?)
            };
            self.push(kind, start);
        }
    }

    fn push(&mut self, kind: TokenKind, offset: usize) {
        self.tokens.push(Token {
            kind,
            offset,
            newline_before: self.newline_before,
        });
        self.newline_before = false;
    }

    fn peek_char(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn byte_at(&self, idx: usize) -> Option<u8> {
        self.bytes.get(idx).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.peek_char() {
                Some(c) if is_line_terminator(c) => {
                    self.newline_before = true;
                    self.bump();
                }
                Some(c) if c.is_whitespace() || c == '\u{feff}' => {
                    self.bump();
                }
                Some('/') if self.byte_at(self.pos + 1) == Some(b'/') => {
                    while let Some(c) = self.peek_char() {
                        if is_line_terminator(c) {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.byte_at(self.pos + 1) == Some(b'*') => {
                    let start = self.pos;
                    let Some(end) = self.src[self.pos + 2..].find("*/") else {
                        return Err(Error::script("unterminated comment", start));
                    };
                    let comment = &self.src[self.pos..self.pos + 2 + end];
                    if comment.chars().any(is_line_terminator) {
                        self.newline_before = true;
                    }
                    self.pos += end + 4;
                }
                // HTML comment openers sometimes wrap inline scripts
                Some('<') if self.src[self.pos..].starts_with("<!--") => {
                    self.pos += 4;
                }
                Some('-') if self.src[self.pos..].starts_with("-->") && self.at_line_start() => {
                    self.pos += 3;
                }
                _ => return Ok(()),
            }
        }
    }

    fn at_line_start(&self) -> bool {
        self.tokens.is_empty() || self.newline_before
    }

    fn regex_allowed(&self) -> bool {
        match self.tokens.last() {
            None => true,
            Some(tok) => match &tok.kind {
                TokenKind::Punct(p) => !matches!(*p, ")" | "]" | "}" | "++" | "--"),
                TokenKind::Ident(name) => REGEX_PRECEDING_KEYWORDS.contains(&name.as_str()),
                _ => false,
            },
        }
    }

    fn read_identifier(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if is_ident_part(c) {
                self.bump();
            } else {
                break;
            }
        }
        self.src[start..self.pos].to_string()
    }

    fn read_punct(&mut self) -> Result<&'static str> {
        let rest = &self.src[self.pos..];
        for &p in PUNCTUATORS {
            // `?.5` is a conditional followed by a number
            if p == "?." && self.byte_at(self.pos + 2).map_or(false, |b| b.is_ascii_digit()) {
                continue;
            }
            if rest.starts_with(p) {
                self.pos += p.len();
                return Ok(p);
            }
        }
        let c = self.peek_char().unwrap_or('\0');
        Err(Error::script(format!("unexpected character '{}'", c), self.pos))
    }

    fn read_number(&mut self) -> Result<f64> {
        let start = self.pos;
        let rest = &self.src[self.pos..];

        let radix = match rest.get(..2) {
            Some("0x") | Some("0X") => 16,
            Some("0o") | Some("0O") => 8,
            Some("0b") | Some("0B") => 2,
            _ => 10,
        };

        if radix != 10 {
            self.pos += 2;
            let digits_start = self.pos;
            while self
                .peek_char()
                .map_or(false, |c| c.is_digit(radix) || c == '_')
            {
                self.bump();
            }
            let digits: String = self.src[digits_start..self.pos]
                .chars()
                .filter(|c| *c != '_')
                .collect();
            self.skip_bigint_suffix();
            return u64::from_str_radix(&digits, radix)
                .map(|v| v as f64)
                .map_err(|_| Error::script("invalid numeric literal", start));
        }

        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_digit() || c == '_')
        {
            self.bump();
        }
        if self.peek_char() == Some('.') {
            self.bump();
            while self
                .peek_char()
                .map_or(false, |c| c.is_ascii_digit() || c == '_')
            {
                self.bump();
            }
        }
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            let save = self.pos;
            self.bump();
            if matches!(self.peek_char(), Some('+') | Some('-')) {
                self.bump();
            }
            if self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                    self.bump();
                }
            } else {
                self.pos = save;
            }
        }

        let text: String = self.src[start..self.pos]
            .chars()
            .filter(|c| *c != '_')
            .collect();
        self.skip_bigint_suffix();
        text.parse::<f64>()
            .map_err(|_| Error::script("invalid numeric literal", start))
    }

    fn skip_bigint_suffix(&mut self) {
        if self.peek_char() == Some('n') {
            self.bump();
        }
    }

    fn read_string(&mut self, quote: char) -> Result<String> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();

        loop {
            match self.bump() {
                None => return Err(Error::script("unterminated string literal", start)),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => self.read_escape(&mut out, start)?,
                Some(c) if c == '\n' || c == '\r' => {
                    return Err(Error::script("unterminated string literal", start))
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn read_escape(&mut self, out: &mut String, start: usize) -> Result<()> {
        let Some(c) = self.bump() else {
            return Err(Error::script("unterminated string literal", start));
        };
        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !self.peek_char().map_or(false, |c| c.is_ascii_digit()) => out.push('\0'),
            'x' => {
                let code = self.read_hex(2, start)?;
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            'u' => {
                let code = self.read_unicode_escape(start)?;
                if (0xD800..0xDC00).contains(&code) && self.src[self.pos..].starts_with("\\u") {
                    let save = self.pos;
                    self.pos += 2;
                    let low = self.read_unicode_escape(start)?;
                    if (0xDC00..0xE000).contains(&low) {
                        let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                        out.push(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER));
                        return Ok(());
                    }
                    self.pos = save;
                }
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            '\r' => {
                // Line continuation
                if self.peek_char() == Some('\n') {
                    self.bump();
                }
            }
            c if is_line_terminator(c) => {}
            other => out.push(other),
        }
        Ok(())
    }

    fn read_unicode_escape(&mut self, start: usize) -> Result<u32> {
        if self.peek_char() == Some('{') {
            self.bump();
            let digits_start = self.pos;
            while self.peek_char().map_or(false, |c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            let code = u32::from_str_radix(&self.src[digits_start..self.pos], 16)
                .map_err(|_| Error::script("invalid unicode escape", start))?;
            if self.bump() != Some('}') {
                return Err(Error::script("invalid unicode escape", start));
            }
            return Ok(code);
        }
        self.read_hex(4, start)
    }

    fn read_hex(&mut self, len: usize, start: usize) -> Result<u32> {
        let end = self.pos + len;
        let digits = self
            .src
            .get(self.pos..end)
            .filter(|d| d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| Error::script("invalid hex escape", start))?;
        let code = u32::from_str_radix(digits, 16)
            .map_err(|_| Error::script("invalid hex escape", start))?;
        self.pos = end;
        Ok(code)
    }

    fn read_template(&mut self) -> Result<String> {
        let start = self.pos;
        self.bump();
        let content_start = self.pos;
        let mut depth = 0usize;

        loop {
            match self.bump() {
                None => return Err(Error::script("unterminated template literal", start)),
                Some('\\') => {
                    self.bump();
                }
                Some('$') if self.peek_char() == Some('{') => {
                    self.bump();
                    depth += 1;
                }
                Some('}') if depth > 0 => depth -= 1,
                Some('`') if depth == 0 => {
                    return Ok(self.src[content_start..self.pos - 1].to_string())
                }
                Some(c) if is_line_terminator(c) => self.newline_before = true,
                Some(_) => {}
            }
        }
    }

    fn read_regex(&mut self) -> Result<String> {
        let start = self.pos;
        self.bump();
        let mut in_class = false;

        loop {
            match self.bump() {
                None => return Err(Error::script("unterminated regular expression", start)),
                Some(c) if is_line_terminator(c) => {
                    return Err(Error::script("unterminated regular expression", start))
                }
                Some('\\') => {
                    self.bump();
                }
                Some('[') => in_class = true,
                Some(']') => in_class = false,
                Some('/') if !in_class => break,
                Some(_) => {}
            }
        }

        // Flags
        while self.peek_char().map_or(false, is_ident_part) {
            self.bump();
        }
        Ok(self.src[start..self.pos].to_string())
    }
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn is_ident_start(c: char) -> bool {
    c == '$' || c == '_' || c.is_alphabetic()
}

fn is_ident_part(c: char) -> bool {
    c == '$' || c == '_' || c.is_alphanumeric() || c == '\u{200c}' || c == '\u{200d}'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            kinds("CHAT.RoomUsers.initPresent([{id: 1}]);"),
            vec![
                TokenKind::Ident("CHAT".into()),
                TokenKind::Punct("."),
                TokenKind::Ident("RoomUsers".into()),
                TokenKind::Punct("."),
                TokenKind::Ident("initPresent".into()),
                TokenKind::Punct("("),
                TokenKind::Punct("["),
                TokenKind::Punct("{"),
                TokenKind::Ident("id".into()),
                TokenKind::Punct(":"),
                TokenKind::Num(1.0),
                TokenKind::Punct("}"),
                TokenKind::Punct("]"),
                TokenKind::Punct(")"),
                TokenKind::Punct(";"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("0x1F")[0], TokenKind::Num(31.0));
        assert_eq!(kinds("1.5e3")[0], TokenKind::Num(1500.0));
        assert_eq!(kinds(".25")[0], TokenKind::Num(0.25));
        assert_eq!(kinds("1_000")[0], TokenKind::Num(1000.0));
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\"b\né\x41😀""#)[0],
            TokenKind::Str("a\"b\n\u{e9}A\u{1F600}".into())
        );
        assert_eq!(kinds(r"'it\'s'")[0], TokenKind::Str("it's".into()));
    }

    #[test]
    fn test_comments_and_newlines() {
        let tokens = tokenize("a // note\n/* block */ b").unwrap();
        assert!(tokens[0].is_ident("a"));
        assert!(tokens[1].is_ident("b"));
        assert!(tokens[1].newline_before);
    }

    #[test]
    fn test_regex_vs_division() {
        let tokens = kinds("var r = /[/]x/g; var d = a / b;");
        assert_eq!(tokens[3], TokenKind::Regex("/[/]x/g".into()));
        assert!(tokens.contains(&TokenKind::Punct("/")));
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("var a = 'oops").unwrap_err();
        assert!(matches!(err, Error::Script { offset: 8, .. }));
    }
}
