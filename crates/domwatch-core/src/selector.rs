#![forbid(unsafe_code)]

//! Selector parsing and matching.
//!
//! Supports the subset of CSS selectors that live selections need:
//!
//! ```text
//! list      := complex ( "," complex )*
//! complex   := compound ( combinator compound )*
//! combinator:= <whitespace> | ">" | "+" | "~"
//! compound  := ( type | "*" )? ( "#" ident | "." ident | "[" attr "]" )*
//! attr      := ident ( ( "=" | "~=" | "|=" | "^=" | "$=" | "*=" ) value )?
//! value     := ident | '"' .. '"' | "'" .. "'"
//! ```
//!
//! Pseudo-classes, pseudo-elements, and namespace prefixes are rejected with
//! [`SelectorError::Unsupported`] rather than silently ignored.
//!
//! # Invariants
//!
//! 1. Type and attribute names compare ASCII case-insensitively; ids, classes,
//!    and attribute values compare exactly.
//! 2. Combinators are evaluated against the full ancestor chain of the
//!    candidate, including ancestors outside the query root.
//! 3. An element matches a list if it matches any member.
//!
//! Positions in errors are character offsets into the input.

use std::fmt;

use crate::document::{NodeId, Tree};

/// Errors from [`Selector::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    /// The selector was empty or only whitespace.
    Empty,
    /// Input ended in the middle of a selector.
    UnexpectedEnd,
    /// A character that cannot appear at this position.
    UnexpectedChar { ch: char, pos: usize },
    /// Valid CSS that this engine does not implement.
    Unsupported { construct: &'static str, pos: usize },
    /// A combinator with nothing on one of its sides.
    DanglingCombinator { pos: usize },
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty selector"),
            Self::UnexpectedEnd => write!(f, "unexpected end of selector"),
            Self::UnexpectedChar { ch, pos } => {
                write!(f, "unexpected character {ch:?} at position {pos}")
            }
            Self::Unsupported { construct, pos } => {
                write!(f, "unsupported {construct} at position {pos}")
            }
            Self::DanglingCombinator { pos } => {
                write!(f, "combinator at position {pos} is missing a selector")
            }
        }
    }
}

impl std::error::Error for SelectorError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    op: AttrOp,
    value: String,
}

impl AttrSelector {
    fn matches(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        let v = self.value.as_str();
        match self.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == v,
            AttrOp::Includes => {
                !v.is_empty()
                    && !v.contains(char::is_whitespace)
                    && actual.split_ascii_whitespace().any(|w| w == v)
            }
            AttrOp::DashMatch => {
                actual == v || (actual.starts_with(v) && actual[v.len()..].starts_with('-'))
            }
            AttrOp::Prefix => !v.is_empty() && actual.starts_with(v),
            AttrOp::Suffix => !v.is_empty() && actual.ends_with(v),
            AttrOp::Substring => !v.is_empty() && actual.contains(v),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    /// `None` is the universal selector (explicit `*` or omitted).
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
}

impl Compound {
    fn matches(&self, tree: &Tree, id: NodeId) -> bool {
        let Some(el) = tree.element(id) else {
            return false;
        };
        if let Some(tag) = &self.tag
            && el.tag != *tag
        {
            return false;
        }
        if !self.ids.iter().all(|want| el.attr("id") == Some(want.as_str())) {
            return false;
        }
        let class_attr = el.attr("class").unwrap_or_default();
        if !self
            .classes
            .iter()
            .all(|want| class_attr.split_ascii_whitespace().any(|c| c == want))
        {
            return false;
        }
        self.attrs.iter().all(|a| a.matches(el.attr(&a.name)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
    combinators: Vec<Combinator>,
}

impl Complex {
    fn matches(&self, tree: &Tree, id: NodeId) -> bool {
        self.matches_at(tree, self.compounds.len() - 1, id)
    }

    fn matches_at(&self, tree: &Tree, idx: usize, id: NodeId) -> bool {
        if !self.compounds[idx].matches(tree, id) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match self.combinators[idx - 1] {
            Combinator::Child => tree
                .parent(id)
                .is_some_and(|p| self.matches_at(tree, idx - 1, p)),
            Combinator::Descendant => {
                let mut cur = tree.parent(id);
                while let Some(p) = cur {
                    if self.matches_at(tree, idx - 1, p) {
                        return true;
                    }
                    cur = tree.parent(p);
                }
                false
            }
            Combinator::NextSibling => tree
                .previous_element_sibling(id)
                .is_some_and(|s| self.matches_at(tree, idx - 1, s)),
            Combinator::SubsequentSibling => {
                let mut cur = tree.previous_element_sibling(id);
                while let Some(s) = cur {
                    if self.matches_at(tree, idx - 1, s) {
                        return true;
                    }
                    cur = tree.previous_element_sibling(s);
                }
                false
            }
        }
    }
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    complexes: Vec<Complex>,
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Selector {
    /// Parse a selector list.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        if input.trim().is_empty() {
            return Err(SelectorError::Empty);
        }
        let mut parser = Parser::new(input);
        let mut complexes = Vec::new();
        loop {
            parser.skip_ws();
            complexes.push(parser.complex()?);
            parser.skip_ws();
            match parser.peek() {
                None => break,
                Some(',') => {
                    parser.bump();
                    parser.skip_ws();
                    if parser.peek().is_none() {
                        return Err(SelectorError::UnexpectedEnd);
                    }
                }
                Some(ch) => {
                    return Err(SelectorError::UnexpectedChar {
                        ch,
                        pos: parser.pos,
                    });
                }
            }
        }
        Ok(Self {
            source: input.trim().to_string(),
            complexes,
        })
    }

    /// The trimmed source text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub(crate) fn matches(&self, tree: &Tree, id: NodeId) -> bool {
        tree.element(id).is_some() && self.complexes.iter().any(|c| c.matches(tree, id))
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Returns whether any whitespace was consumed.
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(ch) => SelectorError::UnexpectedChar { ch, pos: self.pos },
            None => SelectorError::UnexpectedEnd,
        }
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start_ok = match self.peek() {
            Some('-') => self.peek_at(1).is_some_and(|c| is_ident_start(c) && c != '-'),
            Some(c) => is_ident_start(c),
            None => false,
        };
        if !start_ok {
            return Err(self.unexpected());
        }
        let mut out = String::new();
        while let Some(c) = self.peek().filter(|&c| is_ident_char(c)) {
            out.push(c);
            self.pos += 1;
        }
        Ok(out)
    }

    fn complex(&mut self) -> Result<Complex, SelectorError> {
        if matches!(self.peek(), Some('>' | '+' | '~')) {
            return Err(SelectorError::DanglingCombinator { pos: self.pos });
        }
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(_) if had_ws => Combinator::Descendant,
                Some(ch) => return Err(SelectorError::UnexpectedChar { ch, pos: self.pos }),
            };
            if combinator != Combinator::Descendant {
                let pos = self.pos;
                self.bump();
                self.skip_ws();
                if matches!(self.peek(), None | Some(',' | '>' | '+' | '~')) {
                    return Err(SelectorError::DanglingCombinator { pos });
                }
            }
            combinators.push(combinator);
            compounds.push(self.compound()?);
        }
        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let start = self.pos;
        let mut compound = Compound::default();
        match self.peek() {
            Some('*') => {
                self.bump();
            }
            Some(c) if is_ident_start(c) => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.ids.push(self.ident()?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.bump();
                    compound.attrs.push(self.attribute()?);
                }
                Some(':') => {
                    let construct = if self.peek_at(1) == Some(':') {
                        "pseudo-element"
                    } else {
                        "pseudo-class"
                    };
                    return Err(SelectorError::Unsupported {
                        construct,
                        pos: self.pos,
                    });
                }
                Some('|') => {
                    return Err(SelectorError::Unsupported {
                        construct: "namespace prefix",
                        pos: self.pos,
                    });
                }
                _ => break,
            }
        }
        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> Result<AttrSelector, SelectorError> {
        self.skip_ws();
        if self.peek() == Some('|') {
            return Err(SelectorError::Unsupported {
                construct: "namespace prefix",
                pos: self.pos,
            });
        }
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();
        let op = match (self.peek(), self.peek_at(1)) {
            (Some(']'), _) => {
                self.bump();
                return Ok(AttrSelector {
                    name,
                    op: AttrOp::Exists,
                    value: String::new(),
                });
            }
            (Some('='), _) => AttrOp::Equals,
            (Some('~'), Some('=')) => AttrOp::Includes,
            (Some('|'), Some('=')) => AttrOp::DashMatch,
            (Some('^'), Some('=')) => AttrOp::Prefix,
            (Some('$'), Some('=')) => AttrOp::Suffix,
            (Some('*'), Some('=')) => AttrOp::Substring,
            _ => return Err(self.unexpected()),
        };
        self.pos += if op == AttrOp::Equals { 1 } else { 2 };
        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let mut out = String::new();
                loop {
                    match self.bump() {
                        Some(c) if c == quote => break,
                        Some(c) => out.push(c),
                        None => return Err(SelectorError::UnexpectedEnd),
                    }
                }
                out
            }
            _ => self.ident()?,
        };
        self.skip_ws();
        match self.peek() {
            Some(']') => {
                self.bump();
                Ok(AttrSelector { name, op, value })
            }
            _ => Err(self.unexpected()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
