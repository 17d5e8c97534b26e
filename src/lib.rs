//! Apache httpd.conf Parser
//!
//! This crate parses Apache-style `httpd.conf` text into a nested AST for
//! programmatic inspection: tooling that reads, validates, or transforms
//! virtual-host configuration without shelling out to Apache.
//!
//! Parsing is a pure, single-pass transformation - one immutable source
//! string in, one [`Document`] (or one [`ParseError`]) out. The parser does
//! no semantic validation and no filesystem access; loading a file is the
//! [`loader`] module's job.
//!
//! # Example
//!
//! ```
//! use apacheconf_parser::{parse, BlockKind, Entry};
//!
//! let source = r#"
//!     ServerName blah.co.za
//!     <VirtualHost 10.10.10.2:123>
//!         DocumentRoot /usr/www/users/blah
//!     </VirtualHost>
//! "#;
//!
//! let document = parse(source).unwrap();
//! assert_eq!(document.len(), 2);
//!
//! let Entry::Block(vhost) = &document.entries[1] else {
//!     panic!("expected a block");
//! };
//! let BlockKind::VirtualHost { addr: Some(addr) } = &vhost.kind else {
//!     panic!("expected an addressed VirtualHost");
//! };
//! assert_eq!(addr.ip_addr, [10, 10, 10, 2]);
//! assert_eq!(addr.port, Some(123));
//! ```

pub mod formatter;
pub mod loader;
pub mod parser;

pub use formatter::format;
pub use loader::{load_default, load_file, LoadError, DEFAULT_CONF_PATH};
pub use parser::{
    parse, tokenize, Block, BlockKind, Directive, Document, Entry, HostAddr, LexError, Location,
    ParseError, Position, Token,
};

/// Serialize a Document to pretty-printed JSON
pub fn to_json(document: &Document) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(document)
}
