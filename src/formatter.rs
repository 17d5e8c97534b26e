//! Canonical re-emission of a parsed Document
//!
//! Formatting is not part of the parsing contract - original whitespace and
//! comments are gone - but the canonical form is stable and re-parses to a
//! structurally identical Document, which makes it useful both as a
//! round-trip oracle and for config-rewriting tools.

use crate::parser::{BlockKind, Document, Entry};

const INDENT: &str = "    ";

/// Render a Document to canonical httpd.conf text
pub fn format(document: &Document) -> String {
    let mut out = String::new();
    for entry in &document.entries {
        write_entry(&mut out, entry, 0);
    }
    out
}

fn write_entry(out: &mut String, entry: &Entry, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    match entry {
        Entry::Directive(directive) => {
            out.push_str(&directive.name);
            for argument in &directive.arguments {
                out.push(' ');
                out.push_str(argument);
            }
            out.push('\n');
        }
        Entry::Block(block) => {
            out.push('<');
            out.push_str(&open_tag(&block.kind));
            out.push_str(">\n");
            for child in &block.entries {
                write_entry(out, child, depth + 1);
            }
            for _ in 0..depth {
                out.push_str(INDENT);
            }
            out.push_str("</");
            out.push_str(block.kind.tag_name());
            out.push_str(">\n");
        }
    }
}

fn open_tag(kind: &BlockKind) -> String {
    match kind {
        BlockKind::VirtualHost { addr: None } => "VirtualHost".to_string(),
        BlockKind::VirtualHost { addr: Some(addr) } => format!("VirtualHost {}", addr),
        BlockKind::Directory { directory } => format!("Directory {}", directory),
        BlockKind::Other { name, arguments } => {
            let mut tag = name.clone();
            for argument in arguments {
                tag.push(' ');
                tag.push_str(argument);
            }
            tag
        }
    }
}
