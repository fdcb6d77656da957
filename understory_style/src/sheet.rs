// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stylesheet text → `identifier → state → attribute → value` tables.
//!
//! The grammar is a flat list of blocks:
//!
//! ```text
//! DefaultButtonStyle : hover {
//!     textcolor : #FFFFFF;      // comment
//!     text : "two words"
//! }
//! ```
//!
//! Whitespace and `;` separate tokens; `{`, `}` and `:` are tokens on their own;
//! `//` comments run to the end of the line. A double-quoted value may contain
//! spaces. The state after the identifier is optional and defaults to Normal;
//! unknown state names also map to Normal. Attribute names are lowercased.
//! A repeated identifier merges into the existing block.

use indexmap::IndexMap;
use thiserror::Error;
use tracing::error;

use crate::types::StyleStateType;

/// Structural errors found while parsing a stylesheet.
///
/// Value-level problems are not errors; they are reported when values are
/// converted. Grammar problems are collected over the whole input and returned
/// together, and the blocks read so far are kept in the sheet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} error(s) while parsing stylesheet '{file}': {}", .diagnostics.len(), .diagnostics.join("; "))]
pub struct StyleSheetError {
    /// File name the errors were found in.
    pub file: String,
    /// One message per error, in input order.
    pub diagnostics: Vec<String>,
}

/// Attribute tables of one identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleBlock {
    /// File the block was last declared in.
    pub file: String,
    states: [IndexMap<String, String>; 4],
}

impl StyleBlock {
    /// Attributes declared for `state`, lowercased key → raw value.
    pub fn attributes(&self, state: StyleStateType) -> &IndexMap<String, String> {
        &self.states[state.index()]
    }

    /// Set one attribute. The key is lowercased.
    pub fn insert(&mut self, state: StyleStateType, key: &str, value: impl Into<String>) {
        self.states[state.index()].insert(key.to_ascii_lowercase(), value.into());
    }
}

/// All blocks read from one or more stylesheets, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct StyleSheet {
    blocks: IndexMap<String, StyleBlock>,
}

impl StyleSheet {
    /// Create an empty sheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one stylesheet text and merge it into this sheet.
    pub fn parse(content: &str, file: &str) -> Result<Self, StyleSheetError> {
        let mut sheet = Self::new();
        sheet.parse_into(content, file)?;
        Ok(sheet)
    }

    /// Parse `content` and merge its blocks into this sheet.
    pub fn parse_into(&mut self, content: &str, file: &str) -> Result<(), StyleSheetError> {
        let mut parser = Parser {
            tokens: tokenize(content),
            pos: 0,
            file,
            ident: String::new(),
            diagnostics: Vec::new(),
            sheet: self,
        };
        parser.file_rule();
        if parser.diagnostics.is_empty() {
            Ok(())
        } else {
            error!(file, "there were errors during stylesheet parsing");
            Err(StyleSheetError {
                file: file.to_owned(),
                diagnostics: parser.diagnostics,
            })
        }
    }

    /// The block for `identifier`.
    pub fn get(&self, identifier: &str) -> Option<&StyleBlock> {
        self.blocks.get(identifier)
    }

    /// Mutable block for `identifier`, created empty if missing.
    pub fn entry(&mut self, identifier: &str) -> &mut StyleBlock {
        self.blocks.entry(identifier.to_owned()).or_default()
    }

    /// Whether `identifier` is declared.
    pub fn contains(&self, identifier: &str) -> bool {
        self.blocks.contains_key(identifier)
    }

    /// Declared identifiers in declaration order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the sheet has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Remove every block.
    pub fn clear(&mut self) {
        self.blocks.clear();
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Str(String),
    Open,
    Close,
    Colon,
    Eof,
}

impl Token {
    fn describe(&self) -> &str {
        match self {
            Self::Str(s) => s,
            Self::Open => "{",
            Self::Close => "}",
            Self::Colon => ":",
            Self::Eof => "end of file",
        }
    }
}

fn symbols(content: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut buffer = String::new();
    let mut chars = content.chars().peekable();
    let flush = |buffer: &mut String, out: &mut Vec<String>| {
        if !buffer.is_empty() {
            out.push(core::mem::take(buffer));
        }
    };
    while let Some(c) = chars.next() {
        match c {
            ' ' | '\t' | '\r' | '\n' | ';' => flush(&mut buffer, &mut out),
            '{' | '}' | ':' => {
                flush(&mut buffer, &mut out);
                out.push(c.to_string());
            }
            '/' if chars.peek() == Some(&'/') => {
                flush(&mut buffer, &mut out);
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        break;
                    }
                }
            }
            _ => buffer.push(c),
        }
    }
    flush(&mut buffer, &mut out);
    out
}

fn tokenize(content: &str) -> Vec<Token> {
    let raw = symbols(content);
    let mut tokens = Vec::with_capacity(raw.len());
    let mut it = raw.into_iter();
    while let Some(sym) = it.next() {
        let token = match sym.as_str() {
            "{" => Token::Open,
            "}" => Token::Close,
            ":" => Token::Colon,
            _ => match sym.strip_prefix('"') {
                None => Token::Str(sym),
                Some(rest) if rest.ends_with('"') => {
                    Token::Str(rest[..rest.len() - 1].to_owned())
                }
                Some(rest) => {
                    let mut joined = rest.to_owned();
                    let mut closed = false;
                    for next in it.by_ref() {
                        joined.push(' ');
                        if let Some(last) = next.strip_suffix('"') {
                            joined.push_str(last);
                            closed = true;
                            break;
                        }
                        joined.push_str(&next);
                    }
                    if closed { Token::Str(joined) } else { Token::Eof }
                }
            },
        };
        tokens.push(token);
    }
    tokens
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    file: &'a str,
    ident: String,
    diagnostics: Vec<String>,
    sheet: &'a mut StyleSheet,
}

impl Parser<'_> {
    fn next(&mut self) -> Token {
        let token = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        self.pos += 1;
        token
    }

    fn error(&mut self, message: String) {
        error!(
            identifier = %self.ident,
            file = self.file,
            "stylesheet parsing error: {message}"
        );
        self.diagnostics
            .push(format!("{message} near '{}'", self.ident));
    }

    fn file_rule(&mut self) {
        let mut token = self.next();
        while let Token::Str(ident) = token {
            self.clause(ident);
            token = self.next();
        }
    }

    fn clause(&mut self, ident: String) {
        self.ident = ident.clone();
        let block = self.sheet.entry(&ident);
        block.file = self.file.to_owned();

        let mut token = self.next();
        let state = match token {
            Token::Colon => match self.next() {
                Token::Str(name) => {
                    let state = match name.to_ascii_lowercase().as_str() {
                        "active" => StyleStateType::Active,
                        "hover" => StyleStateType::Hover,
                        "focused" => StyleStateType::Focused,
                        _ => StyleStateType::Normal,
                    };
                    token = self.next();
                    if token != Token::Open {
                        self.error(format!("expected '{{' but '{}' found", token.describe()));
                        return self.expect_close(&token);
                    }
                    Some(state)
                }
                other => {
                    self.error(format!(
                        "expected 'normal', 'active', 'hover' or 'focused' but '{}' found",
                        other.describe()
                    ));
                    token = other;
                    None
                }
            },
            Token::Open => Some(StyleStateType::Normal),
            _ => {
                self.error(format!("expected ':' but '{}' found", token.describe()));
                None
            }
        };
        if let Some(state) = state {
            token = self.next();
            while let Token::Str(attribute) = token {
                self.object_def(&ident, state, &attribute);
                token = self.next();
            }
        }
        self.expect_close(&token);
    }

    fn expect_close(&mut self, token: &Token) {
        if *token != Token::Close {
            self.error(format!("expected '}}' but '{}' found", token.describe()));
        }
    }

    fn object_def(&mut self, ident: &str, state: StyleStateType, attribute: &str) {
        match self.next() {
            Token::Colon => match self.next() {
                Token::Str(value) => self.sheet.entry(ident).insert(state, attribute, value),
                other => self.error(format!(
                    "expected attribute value but '{}' found",
                    other.describe()
                )),
            },
            other => self.error(format!("expected ':' but '{}' found", other.describe())),
        }
    }
}
