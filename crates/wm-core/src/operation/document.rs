//! Operation documents and their declared identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of an operation, taken from its header keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    /// Keyword used in operation source text
    pub fn keyword(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "query" => Some(OperationKind::Query),
            "mutation" => Some(OperationKind::Mutation),
            "subscription" => Some(OperationKind::Subscription),
            _ => None,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// An operation document
///
/// Only the header is interpreted: the kind keyword and the optional
/// declared name. The body is carried verbatim as part of the document's
/// identity and never validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Document {
    kind: OperationKind,
    name: Option<String>,
    source: String,
}

impl Document {
    /// Create a document from its parts
    pub fn new(kind: OperationKind, name: Option<String>, source: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.filter(|n| !n.is_empty()),
            source: source.into(),
        }
    }

    /// A named query whose source is just its header
    pub fn query(name: &str) -> Self {
        Self::new(OperationKind::Query, Some(name.to_string()), format!("query {}", name))
    }

    /// A named mutation whose source is just its header
    pub fn mutation(name: &str) -> Self {
        Self::new(OperationKind::Mutation, Some(name.to_string()), format!("mutation {}", name))
    }

    /// Read the kind and declared name from operation source text
    ///
    /// Returns `None` when the text does not start with an operation
    /// header. A leading `{` is the anonymous query shorthand.
    pub fn parse(source: impl Into<String>) -> Option<Self> {
        let source = source.into();
        let rest = skip_ignored(&source);

        if rest.starts_with('{') {
            return Some(Self::new(OperationKind::Query, None, source));
        }

        let (keyword, rest) = take_name(rest);
        let kind = OperationKind::from_keyword(keyword)?;
        let (name, _) = take_name(skip_ignored(rest));
        let name = (!name.is_empty()).then(|| name.to_string());

        Some(Self::new(kind, name, source))
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Declared name, or `""` for anonymous operations
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Skip whitespace, commas and `#` line comments
fn skip_ignored(mut text: &str) -> &str {
    loop {
        text = text.trim_start_matches(|c: char| c.is_whitespace() || c == ',' || c == '\u{feff}');
        match text.strip_prefix('#') {
            Some(comment) => {
                text = comment.find('\n').map(|end| &comment[end..]).unwrap_or("");
            }
            None => return text,
        }
    }
}

/// Split a leading name token (`[_A-Za-z][_0-9A-Za-z]*`) off the text
fn take_name(text: &str) -> (&str, &str) {
    let starts_ok = text
        .chars()
        .next()
        .map(|c| c == '_' || c.is_ascii_alphabetic())
        .unwrap_or(false);
    if !starts_ok {
        return ("", text);
    }
    let end = text
        .find(|c: char| !(c == '_' || c.is_ascii_alphanumeric()))
        .unwrap_or(text.len());
    text.split_at(end)
}
