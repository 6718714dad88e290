// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! CSS selector parsing and matching
//!
//! Compound selectors only (`tag#id.class[attr^="x"]`), optionally joined
//! with commas. No combinators or pseudo-classes.

use crate::error::{Error, Result};

use super::document::Element;

/// A parsed CSS selector: a list of alternatives
#[derive(Debug, Clone)]
pub struct Selector {
    alternatives: Vec<Vec<SelectorPart>>,
}

/// A part of a compound selector
#[derive(Debug, Clone)]
pub enum SelectorPart {
    /// Universal selector (*)
    Universal,
    /// Tag name
    Tag(String),
    /// ID selector (#id)
    Id(String),
    /// Class selector (.class)
    Class(String),
    /// Attribute selector ([attr], [attr=value], etc.)
    Attribute(AttributeSelector),
}

/// Attribute selector
#[derive(Debug, Clone)]
pub struct AttributeSelector {
    pub name: String,
    pub operator: Option<AttributeOperator>,
    pub value: Option<String>,
}

/// Attribute selector operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOperator {
    /// [attr=value] - exact match
    Equals,
    /// [attr^=value] - starts with
    Prefix,
    /// [attr$=value] - ends with
    Suffix,
    /// [attr*=value] - contains substring
    Substring,
}

impl Selector {
    /// Parse a CSS selector string
    pub fn parse(selector: &str) -> Result<Self> {
        let selector = selector.trim();
        if selector.is_empty() {
            return Err(Error::Selector("empty selector".into()));
        }

        let mut parser = SelectorParser::new(selector);
        parser.parse()
    }

    /// Check if an element matches any alternative
    pub fn matches(&self, element: &Element) -> bool {
        self.alternatives
            .iter()
            .any(|parts| parts.iter().all(|part| Self::part_matches(part, element)))
    }

    fn part_matches(part: &SelectorPart, element: &Element) -> bool {
        match part {
            SelectorPart::Universal => true,
            SelectorPart::Tag(tag) => element
                .name()
                .map_or(false, |n| n.eq_ignore_ascii_case(tag)),
            SelectorPart::Id(id) => element.attr("id").map_or(false, |v| v == *id),
            SelectorPart::Class(class) => element.has_class(class),
            SelectorPart::Attribute(attr) => Self::attribute_matches(attr, element),
        }
    }

    fn attribute_matches(attr: &AttributeSelector, element: &Element) -> bool {
        let Some(value) = element.attr(&attr.name) else {
            return false;
        };

        let (Some(op), Some(target)) = (&attr.operator, &attr.value) else {
            return true; // Just checking existence
        };

        match op {
            AttributeOperator::Equals => value == *target,
            AttributeOperator::Prefix => value.starts_with(target.as_str()),
            AttributeOperator::Suffix => value.ends_with(target.as_str()),
            AttributeOperator::Substring => value.contains(target.as_str()),
        }
    }
}

/// Simple selector parser
struct SelectorParser {
    input: Vec<char>,
    pos: usize,
}

impl SelectorParser {
    fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    fn parse(&mut self) -> Result<Selector> {
        let mut alternatives = vec![self.parse_compound()?];

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(',') => {
                    self.advance();
                    self.skip_whitespace();
                    alternatives.push(self.parse_compound()?);
                }
                Some(c) => {
                    return Err(Error::Selector(format!("unsupported selector syntax at '{}'", c)))
                }
            }
        }

        Ok(Selector { alternatives })
    }

    fn parse_compound(&mut self) -> Result<Vec<SelectorPart>> {
        let mut parts = Vec::new();

        while let Some(c) = self.peek() {
            match c {
                '#' => {
                    self.advance();
                    parts.push(SelectorPart::Id(self.read_identifier()?));
                }
                '.' => {
                    self.advance();
                    parts.push(SelectorPart::Class(self.read_identifier()?));
                }
                '[' => parts.push(SelectorPart::Attribute(self.parse_attribute()?)),
                '*' => {
                    self.advance();
                    parts.push(SelectorPart::Universal);
                }
                c if parts.is_empty() && (c.is_alphabetic() || c == '_') => {
                    parts.push(SelectorPart::Tag(self.read_identifier()?.to_lowercase()));
                }
                _ => break,
            }
        }

        if parts.is_empty() {
            return Err(Error::Selector("expected selector".into()));
        }
        Ok(parts)
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, char::is_whitespace) {
            self.advance();
        }
    }

    fn read_identifier(&mut self) -> Result<String> {
        let mut result = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                result.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if result.is_empty() {
            return Err(Error::Selector("expected identifier".into()));
        }
        Ok(result)
    }

    fn parse_attribute(&mut self) -> Result<AttributeSelector> {
        self.advance(); // consume '['

        self.skip_whitespace();
        let name = self.read_identifier()?;
        self.skip_whitespace();

        let mut operator = None;
        let mut value = None;

        if let Some(c) = self.peek() {
            if c != ']' {
                let op = match c {
                    '=' => AttributeOperator::Equals,
                    '^' => AttributeOperator::Prefix,
                    '$' => AttributeOperator::Suffix,
                    '*' => AttributeOperator::Substring,
                    _ => return Err(Error::Selector(format!("unknown operator: {}", c))),
                };
                self.advance();
                if op != AttributeOperator::Equals {
                    self.expect('=')?;
                }
                operator = Some(op);

                self.skip_whitespace();
                value = Some(self.read_string_or_ident()?);
                self.skip_whitespace();
            }
        }

        self.expect(']')?;

        Ok(AttributeSelector {
            name,
            operator,
            value,
        })
    }

    fn read_string_or_ident(&mut self) -> Result<String> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.advance();
                let mut result = String::new();
                loop {
                    match self.advance() {
                        Some(c) if c == quote => return Ok(result),
                        Some('\\') => {
                            if let Some(escaped) = self.advance() {
                                result.push(escaped);
                            }
                        }
                        Some(c) => result.push(c),
                        None => return Err(Error::Selector("unterminated string".into())),
                    }
                }
            }
            _ => self.read_identifier(),
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.advance() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(Error::Selector(format!(
                "expected '{}', got '{}'",
                expected, c
            ))),
            None => Err(Error::Selector(format!("expected '{}', got EOF", expected))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::Document;

    #[test]
    fn test_selector_parsing() {
        assert!(Selector::parse("input").is_ok());
        assert!(Selector::parse(".class").is_ok());
        assert!(Selector::parse("#fkey").is_ok());
        assert!(Selector::parse("[name]").is_ok());
        assert!(Selector::parse("input[name='session']").is_ok());
        assert!(Selector::parse("a[href^=\"/users/\"], a.signature").is_ok());

        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("div > a").is_err());
        assert!(Selector::parse("[href~=x]").is_err());
    }

    #[test]
    fn test_matching() {
        let doc = Document::parse(
            r#"<div class="topbar links"><a href="/users/7/bob" class="user">bob</a>
               <a href="https://stackexchange.com">network</a></div>"#,
        )
        .unwrap();

        assert_eq!(doc.select_all("a").unwrap().len(), 2);
        assert_eq!(doc.select_all("div.links").unwrap().len(), 1);
        assert_eq!(doc.select_all("a[href*=stackexchange]").unwrap().len(), 1);
        assert_eq!(doc.select_all("a[href$=bob], div").unwrap().len(), 2);
        assert!(doc.select_all("a[title]").unwrap().is_empty());
    }
}
