//! Abstract Syntax Tree for httpd.conf
//!
//! This module defines the nested entry structure produced by the parser.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Root AST node - the full configuration file in source order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Top-level entries, in source order. Comments and blank lines are
    /// dropped during parsing and never appear here.
    pub entries: Vec<Entry>,
}

/// A single configuration entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entry {
    /// A flat directive: name plus ordered arguments
    Directive(Directive),

    /// A nested block scope: <Kind ...> ... </Kind>
    Block(Block),
}

/// A directive statement
///
/// `arguments` preserves source order and original token text; a quoted
/// argument keeps its quote characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub name: String,
    pub arguments: Vec<String>,
}

/// A block scope with kind-specific attributes and nested entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    pub entries: Vec<Entry>,
}

/// Block kinds with their decoded open-tag attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    /// <VirtualHost ip[:port]> - the whole address is optional
    VirtualHost { addr: Option<HostAddr> },

    /// <Directory /path>
    Directory { directory: String },

    /// Any other bracketed tag (<IfModule ...>, <Location ...>, ...) with its
    /// raw header tokens preserved in order
    Other { name: String, arguments: Vec<String> },
}

/// A VirtualHost address: dotted-quad IP with an optional port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostAddr {
    pub ip_addr: [u32; 4],
    pub port: Option<u32>,
}

impl fmt::Display for HostAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.ip_addr;
        write!(f, "{}.{}.{}.{}", a, b, c, d)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        Ok(())
    }
}

// ============================================================
// Utility Implementations
// ============================================================

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Top-level directives with the given name, in source order
    pub fn directives<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Directive> {
        self.entries.iter().filter_map(move |entry| match entry {
            Entry::Directive(directive) if directive.name == name => Some(directive),
            _ => None,
        })
    }
}

impl Directive {
    pub fn new(name: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

impl BlockKind {
    /// Tag name as written in the open and close tags
    pub fn tag_name(&self) -> &str {
        match self {
            BlockKind::VirtualHost { .. } => "VirtualHost",
            BlockKind::Directory { .. } => "Directory",
            BlockKind::Other { name, .. } => name,
        }
    }
}
