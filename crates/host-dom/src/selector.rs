//! Parser for the selector dialect the engine emits and consumes.
//!
//! Covers exactly what the synthesizer produces plus the safety-gate
//! critical selectors: tag names, `#id`, compound `.class` chains,
//! `[attr]`, `[attr="v"]`, `[attr*="v"]`, `:nth-of-type(n)`, and the
//! child (` > `) / descendant (whitespace) combinators.

use crate::errors::HostError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedSelector {
    /// Compounds left-to-right; the last one is the subject.
    pub parts: Vec<(Combinator, Compound)>,
}

/// Relationship between a compound and the one to its left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    /// First compound in the selector.
    Subject,
    Child,
    Descendant,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrCheck>,
    /// 1-based index among same-tag siblings (`:nth-of-type`).
    pub ordinal: Option<usize>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.ordinal.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttrCheck {
    pub name: String,
    pub op: AttrOp,
    pub value: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttrOp {
    Exists,
    Equals,
    Contains,
}

impl ParsedSelector {
    pub fn parse(raw: &str) -> Result<Self, HostError> {
        let mut scanner = Scanner::new(raw);
        let mut parts = Vec::new();

        scanner.skip_ws();
        if scanner.done() {
            return Err(HostError::InvalidSelector("empty selector".into()));
        }

        let first = scanner.compound()?;
        parts.push((Combinator::Subject, first));

        loop {
            let had_ws = scanner.skip_ws();
            if scanner.done() {
                break;
            }
            let combinator = if scanner.eat('>') {
                scanner.skip_ws();
                Combinator::Child
            } else if had_ws {
                Combinator::Descendant
            } else {
                return Err(HostError::InvalidSelector(format!(
                    "unexpected input at offset {}",
                    scanner.pos
                )));
            };
            parts.push((combinator, scanner.compound()?));
        }

        Ok(Self { parts })
    }

    pub fn subject(&self) -> &Compound {
        // parse() guarantees at least one part
        &self.parts.last().expect("non-empty selector").1
    }
}

struct Scanner<'a> {
    chars: Vec<char>,
    pos: usize,
    raw: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(raw: &'a str) -> Self {
        Self {
            chars: raw.chars().collect(),
            pos: 0,
            raw,
        }
    }

    fn done(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn ident(&mut self) -> Option<String> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '-' || c == '_') {
            self.pos += 1;
        }
        if self.pos == start {
            None
        } else {
            Some(self.chars[start..self.pos].iter().collect())
        }
    }

    fn compound(&mut self) -> Result<Compound, HostError> {
        let mut compound = Compound {
            tag: self.ident().map(|t| t.to_ascii_lowercase()),
            ..Compound::default()
        };

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    let id = self.require_ident("id")?;
                    compound.id = Some(id);
                }
                Some('.') => {
                    self.pos += 1;
                    let class = self.require_ident("class")?;
                    compound.classes.push(class);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.attr_check()?);
                }
                Some(':') => {
                    self.pos += 1;
                    compound.ordinal = Some(self.nth_of_type()?);
                }
                _ => break,
            }
        }

        if compound.is_empty() {
            return Err(HostError::InvalidSelector(format!(
                "empty compound in {:?}",
                self.raw
            )));
        }
        Ok(compound)
    }

    fn require_ident(&mut self, what: &str) -> Result<String, HostError> {
        self.ident()
            .ok_or_else(|| HostError::InvalidSelector(format!("missing {} in {:?}", what, self.raw)))
    }

    fn attr_check(&mut self) -> Result<AttrCheck, HostError> {
        let name = self.require_ident("attribute name")?;
        let op = if self.eat('*') {
            if !self.eat('=') {
                return Err(HostError::InvalidSelector(format!(
                    "expected '=' after '*' in {:?}",
                    self.raw
                )));
            }
            AttrOp::Contains
        } else if self.eat('=') {
            AttrOp::Equals
        } else {
            AttrOp::Exists
        };

        let value = if op == AttrOp::Exists {
            None
        } else {
            if !self.eat('"') {
                return Err(HostError::InvalidSelector(format!(
                    "expected quoted value in {:?}",
                    self.raw
                )));
            }
            let start = self.pos;
            while matches!(self.peek(), Some(c) if c != '"') {
                self.pos += 1;
            }
            if !self.eat('"') {
                return Err(HostError::InvalidSelector(format!(
                    "unterminated value in {:?}",
                    self.raw
                )));
            }
            Some(self.chars[start..self.pos - 1].iter().collect())
        };

        if !self.eat(']') {
            return Err(HostError::InvalidSelector(format!(
                "unterminated attribute in {:?}",
                self.raw
            )));
        }
        Ok(AttrCheck { name, op, value })
    }

    fn nth_of_type(&mut self) -> Result<usize, HostError> {
        const NAME: &str = "nth-of-type";
        let ident = self.require_ident("pseudo-class")?;
        if ident != NAME {
            return Err(HostError::InvalidSelector(format!(
                "unsupported pseudo-class :{}",
                ident
            )));
        }
        if !self.eat('(') {
            return Err(HostError::InvalidSelector(format!(
                "expected '(' after :{}",
                NAME
            )));
        }
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        let ordinal: usize = digits
            .parse()
            .map_err(|_| HostError::InvalidSelector(format!("bad ordinal in {:?}", self.raw)))?;
        if ordinal == 0 {
            return Err(HostError::InvalidSelector("ordinal must be 1-based".into()));
        }
        if !self.eat(')') {
            return Err(HostError::InvalidSelector(format!(
                "unterminated :{}",
                NAME
            )));
        }
        Ok(ordinal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_id_selector() {
        let parsed = ParsedSelector::parse("#sidebar-ad").unwrap();
        assert_eq!(parsed.parts.len(), 1);
        assert_eq!(parsed.subject().id.as_deref(), Some("sidebar-ad"));
    }

    #[test]
    fn parses_compound_classes() {
        let parsed = ParsedSelector::parse(".ad.banner-300").unwrap();
        assert_eq!(parsed.subject().classes, vec!["ad", "banner-300"]);
    }

    #[test]
    fn parses_attribute_forms() {
        let exact = ParsedSelector::parse(r#"[role="main"]"#).unwrap();
        assert_eq!(
            exact.subject().attrs[0],
            AttrCheck {
                name: "role".into(),
                op: AttrOp::Equals,
                value: Some("main".into()),
            }
        );

        let contains = ParsedSelector::parse(r#"[class*="wrapper"]"#).unwrap();
        assert_eq!(contains.subject().attrs[0].op, AttrOp::Contains);

        let exists = ParsedSelector::parse("[hidden]").unwrap();
        assert_eq!(exists.subject().attrs[0].op, AttrOp::Exists);
    }

    #[test]
    fn parses_structural_path() {
        let parsed = ParsedSelector::parse("div#root > section > div:nth-of-type(2)").unwrap();
        assert_eq!(parsed.parts.len(), 3);
        assert_eq!(parsed.parts[1].0, Combinator::Child);
        assert_eq!(parsed.subject().ordinal, Some(2));
    }

    #[test]
    fn quoted_values_may_contain_spaces() {
        let parsed = ParsedSelector::parse(r#"[aria-label="sponsored content"]"#).unwrap();
        assert_eq!(
            parsed.subject().attrs[0].value.as_deref(),
            Some("sponsored content")
        );
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["", "   ", "#", ".", "[role", ":hover", "div:nth-of-type(0)"] {
            assert!(ParsedSelector::parse(bad).is_err(), "accepted {:?}", bad);
        }
    }
}
