//! Template — parsed route template AST
//!
//! A route template is parsed exactly once into a tree of literal, `<key>`,
//! and `(...)` optional-group nodes. Matching and reverse routing both walk
//! this shared AST; neither re-scans the raw template text.
//!
//! # Grammar
//!
//! ```text
//! template := node*
//! node     := literal | "<" key ">" | "(" node* ")"
//! key      := [A-Za-z_][A-Za-z0-9_]*
//! ```
//!
//! The parser is a balanced-bracket scanner, not a regex substitution —
//! nested optional groups like `(<a>(/<b>))` parse into nested `Group` nodes
//! and cannot be corrupted by sibling delimiters.

use crate::{RouteError, MAX_GROUP_DEPTH, MAX_TEMPLATE_LENGTH};

/// One node of a parsed route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateNode {
    /// Verbatim text, matched literally and emitted literally.
    Literal(String),
    /// A `<key>` placeholder, matched by a named capture group.
    Key(String),
    /// A `(...)` optional group; may be entirely absent from a matched path
    /// and entirely elided from a generated URI.
    Group(Vec<TemplateNode>),
}

/// A parsed route template.
///
/// Immutable once constructed. [`Route`](crate::Route) holds one and derives
/// both its compiled matcher and its reverse-routing walk from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    raw: String,
    nodes: Vec<TemplateNode>,
}

impl Template {
    /// Parse a template string.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidTemplate`] for unbalanced groups or
    /// malformed key names, [`RouteError::TemplateTooLong`] /
    /// [`RouteError::DepthExceeded`] for limit violations.
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        if raw.len() > MAX_TEMPLATE_LENGTH {
            return Err(RouteError::TemplateTooLong {
                len: raw.len(),
                max: MAX_TEMPLATE_LENGTH,
            });
        }

        let mut parser = Parser {
            template: raw,
            chars: raw.chars(),
            depth: 0,
        };
        let nodes = parser.parse_nodes(false)?;

        Ok(Self {
            raw: raw.to_string(),
            nodes,
        })
    }

    /// The raw template text as written.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The top-level nodes of the parsed tree.
    #[must_use]
    pub fn nodes(&self) -> &[TemplateNode] {
        &self.nodes
    }

    /// Every `<key>` name in the template, in appearance order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        fn collect<'a>(nodes: &'a [TemplateNode], out: &mut Vec<&'a str>) {
            for node in nodes {
                match node {
                    TemplateNode::Literal(_) => {}
                    TemplateNode::Key(name) => out.push(name),
                    TemplateNode::Group(children) => collect(children, out),
                }
            }
        }
        let mut keys = Vec::new();
        collect(&self.nodes, &mut keys);
        keys
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

struct Parser<'a> {
    template: &'a str,
    chars: std::str::Chars<'a>,
    depth: usize,
}

impl Parser<'_> {
    fn err(&self, reason: impl Into<String>) -> RouteError {
        RouteError::InvalidTemplate {
            template: self.template.to_string(),
            reason: reason.into(),
        }
    }

    /// Parse a run of nodes until end of input (top level) or a closing `)`
    /// (inside a group).
    fn parse_nodes(&mut self, in_group: bool) -> Result<Vec<TemplateNode>, RouteError> {
        let mut nodes = Vec::new();
        let mut literal = String::new();

        loop {
            match self.chars.next() {
                None => {
                    if in_group {
                        return Err(self.err("unclosed optional group"));
                    }
                    flush_literal(&mut literal, &mut nodes);
                    return Ok(nodes);
                }
                Some(')') => {
                    if !in_group {
                        return Err(self.err("unexpected \")\" outside an optional group"));
                    }
                    flush_literal(&mut literal, &mut nodes);
                    return Ok(nodes);
                }
                Some('(') => {
                    flush_literal(&mut literal, &mut nodes);
                    self.depth += 1;
                    if self.depth > MAX_GROUP_DEPTH {
                        return Err(RouteError::DepthExceeded {
                            depth: self.depth,
                            max: MAX_GROUP_DEPTH,
                        });
                    }
                    let children = self.parse_nodes(true)?;
                    self.depth -= 1;
                    nodes.push(TemplateNode::Group(children));
                }
                Some('<') => {
                    flush_literal(&mut literal, &mut nodes);
                    nodes.push(TemplateNode::Key(self.parse_key()?));
                }
                Some('>') => {
                    return Err(self.err("unexpected \">\" outside a key placeholder"));
                }
                Some(c) => literal.push(c),
            }
        }
    }

    /// Parse a key name after `<`, consuming through the closing `>`.
    fn parse_key(&mut self) -> Result<String, RouteError> {
        let mut name = String::new();
        loop {
            match self.chars.next() {
                None => return Err(self.err("unclosed key placeholder")),
                Some('>') => {
                    if name.is_empty() {
                        return Err(self.err("empty key placeholder"));
                    }
                    return Ok(name);
                }
                Some(c) if c.is_ascii_alphanumeric() || c == '_' => {
                    if name.is_empty() && c.is_ascii_digit() {
                        return Err(self.err(format!("key name cannot start with digit '{c}'")));
                    }
                    name.push(c);
                }
                Some(c) => {
                    return Err(self.err(format!("invalid character '{c}' in key name")));
                }
            }
        }
    }
}

fn flush_literal(literal: &mut String, nodes: &mut Vec<TemplateNode>) {
    if !literal.is_empty() {
        nodes.push(TemplateNode::Literal(std::mem::take(literal)));
    }
}
