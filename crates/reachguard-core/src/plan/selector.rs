//! Structural selectors for role rules.
//!
//! A deliberately small subset of CSS: compound selectors made of an
//! optional tag (or `*`), `#id`, `.class`, and `[attr]` / `[attr=value]`
//! for `role`, `type`, `id` and `class`, with `,` separating alternatives.
//! Combinators and pseudo-classes are rejected. Nothing here looks at content.

use std::fmt;

use thiserror::Error;

use crate::document::ElementRef;

/// Selector parse error.
#[derive(Debug, Error, PartialEq)]
#[error("invalid selector '{selector}' at {position}: {message}")]
pub struct SelectorError {
    pub selector: String,
    pub position: usize,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attribute {
    Role,
    Type,
    Id,
    Class,
}

impl Attribute {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "role" => Some(Attribute::Role),
            "type" => Some(Attribute::Type),
            "id" => Some(Attribute::Id),
            "class" => Some(Attribute::Class),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct AttributeMatch {
    attribute: Attribute,
    value: Option<String>,
}

impl AttributeMatch {
    fn matches(&self, element: &ElementRef) -> bool {
        match (self.attribute, &self.value) {
            (Attribute::Role, None) => element.role.is_some(),
            (Attribute::Role, Some(v)) => element.role.as_deref() == Some(v.as_str()),
            (Attribute::Type, None) => element.input_type.is_some(),
            (Attribute::Type, Some(v)) => element
                .input_type
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case(v)),
            (Attribute::Id, None) => element.dom_id.is_some(),
            (Attribute::Id, Some(v)) => element.dom_id.as_deref() == Some(v.as_str()),
            (Attribute::Class, None) => !element.classes.is_empty(),
            (Attribute::Class, Some(v)) => element.classes.join(" ") == *v,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeMatch>,
}

impl Compound {
    fn matches(&self, element: &ElementRef) -> bool {
        if let Some(ref tag) = self.tag {
            if element.tag != *tag {
                return false;
            }
        }
        if let Some(ref id) = self.id {
            if element.dom_id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|c| element.has_class(c))
            && self.attributes.iter().all(|a| a.matches(element))
    }
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Compound>,
}

impl Selector {
    /// Parse a selector list such as `button.primary, [role=button]`.
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let mut parser = Parser {
            source,
            chars: source.char_indices().peekable(),
        };
        let alternatives = parser.parse_list()?;
        Ok(Self {
            source: source.trim().to_string(),
            alternatives,
        })
    }

    /// Whether any alternative matches the element's role tags.
    pub fn matches(&self, element: &ElementRef) -> bool {
        self.alternatives.iter().any(|c| c.matches(element))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl Parser<'_> {
    fn error(&self, position: usize, message: impl Into<String>) -> SelectorError {
        SelectorError {
            selector: self.source.to_string(),
            position,
            message: message.into(),
        }
    }

    fn position(&mut self) -> usize {
        self.chars.peek().map(|(i, _)| *i).unwrap_or(self.source.len())
    }

    fn skip_whitespace(&mut self) {
        while self.chars.peek().is_some_and(|(_, c)| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn parse_list(&mut self) -> Result<Vec<Compound>, SelectorError> {
        let mut alternatives = Vec::new();
        loop {
            self.skip_whitespace();
            let start = self.position();
            let compound = self.parse_compound()?;
            if compound == Compound::default() && !self.saw_universal(start) {
                return Err(self.error(start, "empty selector"));
            }
            alternatives.push(compound);
            self.skip_whitespace();
            match self.chars.next() {
                None => return Ok(alternatives),
                Some((_, ',')) => continue,
                Some((i, c)) if c == '>' || c == '+' || c == '~' || c.is_alphanumeric() => {
                    return Err(self.error(i, "combinators are not supported"));
                }
                Some((i, c)) => return Err(self.error(i, format!("unexpected '{}'", c))),
            }
        }
    }

    fn saw_universal(&self, start: usize) -> bool {
        self.source[start..].starts_with('*')
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();

        let first = self.chars.peek().map(|(_, c)| *c);
        match first {
            Some('*') => {
                self.chars.next();
            }
            Some(c) if is_ident_char(c) => {
                compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
            }
            _ => {}
        }

        while let Some(&(i, c)) = self.chars.peek() {
            match c {
                '#' => {
                    self.chars.next();
                    compound.id = Some(self.parse_ident()?);
                }
                '.' => {
                    self.chars.next();
                    compound.classes.push(self.parse_ident()?);
                }
                '[' => {
                    self.chars.next();
                    compound.attributes.push(self.parse_attribute(i)?);
                }
                ':' => return Err(self.error(i, "pseudo-classes are not supported")),
                _ => break,
            }
        }

        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String, SelectorError> {
        let start = self.position();
        let mut ident = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if !is_ident_char(c) {
                break;
            }
            ident.push(c);
            self.chars.next();
        }
        if ident.is_empty() {
            return Err(self.error(start, "expected identifier"));
        }
        Ok(ident)
    }

    fn parse_attribute(&mut self, open: usize) -> Result<AttributeMatch, SelectorError> {
        self.skip_whitespace();
        let name_pos = self.position();
        let name = self.parse_ident()?;
        let attribute = Attribute::parse(&name.to_ascii_lowercase())
            .ok_or_else(|| self.error(name_pos, format!("unsupported attribute '{}'", name)))?;
        self.skip_whitespace();

        let value = match self.chars.next() {
            Some((_, ']')) => None,
            Some((_, '=')) => {
                self.skip_whitespace();
                let value = self.parse_value()?;
                self.skip_whitespace();
                match self.chars.next() {
                    Some((_, ']')) => Some(value),
                    Some((i, _)) => return Err(self.error(i, "expected ']'")),
                    None => return Err(self.error(open, "unterminated attribute selector")),
                }
            }
            Some((i, _)) => return Err(self.error(i, "only '=' attribute matching is supported")),
            None => return Err(self.error(open, "unterminated attribute selector")),
        };

        Ok(AttributeMatch { attribute, value })
    }

    fn parse_value(&mut self) -> Result<String, SelectorError> {
        match self.chars.peek().copied() {
            Some((start, quote @ ('"' | '\''))) => {
                self.chars.next();
                let mut value = String::new();
                for (_, c) in self.chars.by_ref() {
                    if c == quote {
                        return Ok(value);
                    }
                    value.push(c);
                }
                Err(self.error(start, "unterminated string"))
            }
            _ => self.parse_ident(),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}
