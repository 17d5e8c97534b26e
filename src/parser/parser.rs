//! httpd.conf Parser
//!
//! Recursive descent parser that converts tokens into the nested AST.
//!
//! Entry dispatch is ordered and unambiguous: comments never reach the
//! parser (the lexer drops them), a `<` starts a block, anything else is a
//! directive. Parsing is all-or-nothing; no partial AST is ever returned.

use crate::parser::ast::*;
use crate::parser::lexer::{tokenize, LexError, Location, Spanned, Token};
use std::fmt;
use thiserror::Error;

/// Resolved source position for error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Parser error types
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Lexer error: {0}")]
    Lex(#[from] LexError),

    #[error("Malformed directive at {position}: {message}")]
    MalformedDirective { position: Position, message: String },

    #[error("Malformed <{kind}> header at {position}: {message}")]
    MalformedBlockHeader {
        kind: String,
        position: Position,
        message: String,
    },

    #[error("Unterminated <{kind}> block opened at {position}")]
    UnterminatedBlock { kind: String, position: Position },

    #[error("Unexpected token at {position}: expected {expected}, found {found}")]
    UnexpectedToken {
        position: Position,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },
}

type ParseResult<T> = Result<T, ParseError>;

/// Parser state
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Spanned<Token>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser from source text
    pub fn new(source: &'a str) -> ParseResult<Self> {
        let tokens = tokenize(source)?;
        Ok(Self {
            source,
            tokens,
            pos: 0,
        })
    }

    /// Parse the entire configuration into a Document
    pub fn parse(&mut self) -> ParseResult<Document> {
        let mut entries = Vec::new();

        while !self.is_eof() {
            if self.check(&Token::Newline) {
                self.advance();
            } else {
                entries.push(self.parse_entry()?);
            }
        }

        Ok(Document { entries })
    }

    // ========================================
    // Entries
    // ========================================

    fn parse_entry(&mut self) -> ParseResult<Entry> {
        match self.peek() {
            Some(Token::TagOpen) => Ok(Entry::Block(self.parse_block()?)),
            Some(Token::Word(_)) => Ok(Entry::Directive(self.parse_directive()?)),
            Some(tok) => Err(ParseError::UnexpectedToken {
                position: self.current_position(),
                expected: "a directive or a block open tag".to_string(),
                found: tok.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: "a directive or a block open tag".to_string(),
            }),
        }
    }

    // ========================================
    // Directives
    // ========================================

    fn parse_directive(&mut self) -> ParseResult<Directive> {
        let position = self.current_position();
        let name = self.expect_word()?;

        let mut arguments = Vec::new();
        while let Some(Token::Word(_) | Token::QuotedString(_)) = self.peek() {
            if let Some(Token::Word(text) | Token::QuotedString(text)) = self.advance() {
                arguments.push(text);
            }
        }

        // Logical line end: a newline, or the end of input. Continuation
        // backslashes were already elided by the lexer.
        match self.peek() {
            Some(Token::Newline) => {
                self.advance();
            }
            None => {}
            Some(tok) => {
                return Err(ParseError::UnexpectedToken {
                    position: self.current_position(),
                    expected: "an argument or end of line".to_string(),
                    found: tok.to_string(),
                });
            }
        }

        if arguments.is_empty() {
            return Err(ParseError::MalformedDirective {
                position,
                message: format!("directive '{}' has no arguments", name),
            });
        }

        Ok(Directive { name, arguments })
    }

    // ========================================
    // Blocks
    // ========================================

    fn parse_block(&mut self) -> ParseResult<Block> {
        let open_position = self.current_position();
        self.expect(&Token::TagOpen)?;
        let kind_name = self.expect_word()?;

        let mut header = Vec::new();
        while let Some(Token::Word(_) | Token::QuotedString(_)) = self.peek() {
            if let Some(Token::Word(text) | Token::QuotedString(text)) = self.advance() {
                header.push(text);
            }
        }
        self.expect(&Token::TagClose)?;

        let kind = decode_block_header(&kind_name, header, open_position)?;
        let entries = self.parse_block_entries(&kind_name, open_position)?;

        Ok(Block { kind, entries })
    }

    fn parse_block_entries(
        &mut self,
        kind: &str,
        open_position: Position,
    ) -> ParseResult<Vec<Entry>> {
        let mut entries = Vec::new();

        loop {
            match self.peek() {
                Some(Token::Newline) => {
                    self.advance();
                }
                Some(Token::CloseTagOpen) => {
                    self.advance();
                    let close_position = self.current_position();
                    let close_kind = self.expect_word()?;
                    if close_kind != kind {
                        return Err(ParseError::UnexpectedToken {
                            position: close_position,
                            expected: format!("</{}>", kind),
                            found: format!("</{}>", close_kind),
                        });
                    }
                    self.expect(&Token::TagClose)?;
                    break;
                }
                Some(Token::TagOpen) => {
                    // Lenient close: real-world configs sometimes close a
                    // block with a headerless open tag (`<VirtualHost>`
                    // instead of `</VirtualHost>`). Accept it as this
                    // block's close tag when the kind matches.
                    if self.at_lenient_close(kind) {
                        self.advance();
                        self.advance();
                        self.advance();
                        break;
                    }
                    entries.push(Entry::Block(self.parse_block()?));
                }
                Some(Token::Word(_)) => {
                    entries.push(Entry::Directive(self.parse_directive()?));
                }
                Some(tok) => {
                    return Err(ParseError::UnexpectedToken {
                        position: self.current_position(),
                        expected: format!("a directive, a nested block, or </{}>", kind),
                        found: tok.to_string(),
                    });
                }
                None => {
                    return Err(ParseError::UnterminatedBlock {
                        kind: kind.to_string(),
                        position: open_position,
                    });
                }
            }
        }

        Ok(entries)
    }

    /// True when the upcoming tokens are `<kind>` with no header tokens
    fn at_lenient_close(&self, kind: &str) -> bool {
        matches!(self.peek_nth(1), Some(Token::Word(name)) if name == kind)
            && matches!(self.peek_nth(2), Some(Token::TagClose))
    }

    // ========================================
    // Token utilities
    // ========================================

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.value)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|s| &s.value)
    }

    fn advance(&mut self) -> Option<Token> {
        if self.pos < self.tokens.len() {
            let token = self.tokens[self.pos].value.clone();
            self.pos += 1;
            Some(token)
        } else {
            None
        }
    }

    fn check(&self, token: &Token) -> bool {
        match self.peek() {
            Some(tok) => std::mem::discriminant(tok) == std::mem::discriminant(token),
            None => false,
        }
    }

    fn expect(&mut self, expected: &Token) -> ParseResult<()> {
        if self.check(expected) {
            self.advance();
            Ok(())
        } else {
            match self.peek() {
                Some(tok) => Err(ParseError::UnexpectedToken {
                    position: self.current_position(),
                    expected: expected.to_string(),
                    found: tok.to_string(),
                }),
                None => Err(ParseError::UnexpectedEof {
                    expected: expected.to_string(),
                }),
            }
        }
    }

    fn expect_word(&mut self) -> ParseResult<String> {
        if let Some(Token::Word(_)) = self.peek() {
            if let Some(Token::Word(text)) = self.advance() {
                return Ok(text);
            }
        }
        match self.peek() {
            Some(tok) => Err(ParseError::UnexpectedToken {
                position: self.current_position(),
                expected: "an identifier".to_string(),
                found: tok.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: "an identifier".to_string(),
            }),
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn current_span(&self) -> Location {
        self.tokens.get(self.pos).map(|s| s.span).unwrap_or(Location {
            start: self.source.len(),
            end: self.source.len(),
        })
    }

    fn current_position(&self) -> Position {
        position_at(self.source, self.current_span().start)
    }
}

/// Decode a block's header tokens into kind-specific attributes
fn decode_block_header(
    kind: &str,
    mut header: Vec<String>,
    position: Position,
) -> ParseResult<BlockKind> {
    match kind {
        "VirtualHost" => match header.len() {
            0 => Ok(BlockKind::VirtualHost { addr: None }),
            1 => Ok(BlockKind::VirtualHost {
                addr: Some(parse_host_addr(&header[0], position)?),
            }),
            n => Err(ParseError::MalformedBlockHeader {
                kind: kind.to_string(),
                position,
                message: format!("expected a single address, found {} tokens", n),
            }),
        },
        "Directory" => {
            if header.len() == 1 {
                Ok(BlockKind::Directory {
                    directory: header.remove(0),
                })
            } else {
                Err(ParseError::MalformedBlockHeader {
                    kind: kind.to_string(),
                    position,
                    message: format!("expected a single path, found {} tokens", header.len()),
                })
            }
        }
        _ => Ok(BlockKind::Other {
            name: kind.to_string(),
            arguments: header,
        }),
    }
}

/// Parse a VirtualHost address token: `ip` or `ip:port`
///
/// Octets and ports must parse as integers but are not range-validated.
fn parse_host_addr(text: &str, position: Position) -> ParseResult<HostAddr> {
    let malformed = |message: String| ParseError::MalformedBlockHeader {
        kind: "VirtualHost".to_string(),
        position,
        message,
    };

    let (ip_text, port) = match text.rsplit_once(':') {
        Some((ip_text, port_text)) => {
            let port = port_text
                .parse::<u32>()
                .map_err(|_| malformed(format!("invalid port '{}'", port_text)))?;
            (ip_text, Some(port))
        }
        None => (text, None),
    };

    let pieces: Vec<&str> = ip_text.split('.').collect();
    if pieces.len() != 4 {
        return Err(malformed(format!(
            "expected a dotted-quad address, found '{}'",
            ip_text
        )));
    }

    let mut ip_addr = [0u32; 4];
    for (slot, piece) in ip_addr.iter_mut().zip(&pieces) {
        *slot = piece
            .parse::<u32>()
            .map_err(|_| malformed(format!("invalid address octet '{}'", piece)))?;
    }

    Ok(HostAddr { ip_addr, port })
}

/// Resolve a byte offset to a 1-based line/column position
fn position_at(source: &str, offset: usize) -> Position {
    let clamped = offset.min(source.len());
    let mut line = 1;
    let mut column = 1;
    for c in source[..clamped].chars() {
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    Position {
        offset,
        line,
        column,
    }
}

/// Parse an httpd.conf source string into a Document
pub fn parse(source: &str) -> ParseResult<Document> {
    let mut parser = Parser::new(source)?;
    parser.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directive(name: &str, arguments: &[&str]) -> Entry {
        Entry::Directive(Directive::new(
            name,
            arguments.iter().map(|s| s.to_string()).collect(),
        ))
    }

    #[test]
    fn test_parse_empty() {
        let document = parse("").unwrap();
        assert!(document.is_empty());
    }

    #[test]
    fn test_parse_whitespace_and_comments_only() {
        let document = parse("\n  \n# this is a comment\n\t\n").unwrap();
        assert!(document.is_empty());
    }

    #[test]
    fn test_comment_without_newline() {
        let document = parse("# this is a comment").unwrap();
        assert!(document.is_empty());
    }

    #[test]
    fn test_parse_simple_directive() {
        let document = parse("Options Indexes Includes FollowSymLinks ExecCGI").unwrap();
        assert_eq!(
            document.entries,
            vec![directive(
                "Options",
                &["Indexes", "Includes", "FollowSymLinks", "ExecCGI"]
            )]
        );
    }

    #[test]
    fn test_entry_order_is_preserved() {
        let document = parse("A 1\nB 2\n").unwrap();
        assert_eq!(
            document.entries,
            vec![directive("A", &["1"]), directive("B", &["2"])]
        );
    }

    #[test]
    fn test_inline_comment_after_directive() {
        let document = parse("ServerName blah.co.za # the main host\n").unwrap();
        assert_eq!(document.entries, vec![directive("ServerName", &["blah.co.za"])]);
    }

    #[test]
    fn test_parse_directory_block() {
        let source = "<Directory /usr/www/users/blah>\n  Options Indexes Includes FollowSymLinks ExecCGI\n</Directory>";
        let document = parse(source).unwrap();
        assert_eq!(
            document.entries,
            vec![Entry::Block(Block {
                kind: BlockKind::Directory {
                    directory: "/usr/www/users/blah".to_string(),
                },
                entries: vec![directive(
                    "Options",
                    &["Indexes", "Includes", "FollowSymLinks", "ExecCGI"]
                )],
            })]
        );
    }

    #[test]
    fn test_virtualhost_port_is_optional() {
        let document = parse("<VirtualHost 10.11.12.13>\n</VirtualHost>").unwrap();
        assert_eq!(
            document.entries,
            vec![Entry::Block(Block {
                kind: BlockKind::VirtualHost {
                    addr: Some(HostAddr {
                        ip_addr: [10, 11, 12, 13],
                        port: None,
                    }),
                },
                entries: vec![],
            })]
        );
    }

    #[test]
    fn test_virtualhost_with_port() {
        let document = parse("<VirtualHost 10.10.10.2:123>\n</VirtualHost>").unwrap();
        assert_eq!(
            document.entries,
            vec![Entry::Block(Block {
                kind: BlockKind::VirtualHost {
                    addr: Some(HostAddr {
                        ip_addr: [10, 10, 10, 2],
                        port: Some(123),
                    }),
                },
                entries: vec![],
            })]
        );
    }

    #[test]
    fn test_lenient_close_without_slash() {
        // Observed in real configs: the block closed by `<VirtualHost>`
        // instead of `</VirtualHost>`
        let source = "<VirtualHost 10.10.10.1:443>\nServerName test.co.za\n<VirtualHost>\n";
        let document = parse(source).unwrap();
        assert_eq!(
            document.entries,
            vec![Entry::Block(Block {
                kind: BlockKind::VirtualHost {
                    addr: Some(HostAddr {
                        ip_addr: [10, 10, 10, 1],
                        port: Some(443),
                    }),
                },
                entries: vec![directive("ServerName", &["test.co.za"])],
            })]
        );
    }

    #[test]
    fn test_headerless_virtualhost_opens_at_top_level() {
        let document = parse("<VirtualHost>\nServerName a.example\n</VirtualHost>").unwrap();
        assert_eq!(
            document.entries,
            vec![Entry::Block(Block {
                kind: BlockKind::VirtualHost { addr: None },
                entries: vec![directive("ServerName", &["a.example"])],
            })]
        );
    }

    #[test]
    fn test_line_continuation_across_three_lines() {
        let source = "SetEnvIf User-Agent \".*MSIE.*\" \\\n  nokeepalive ssl-unclean-shutdown \\\n    downgrade-1.0 force-response-1.0\n";
        let document = parse(source).unwrap();
        assert_eq!(
            document.entries,
            vec![directive(
                "SetEnvIf",
                &[
                    "User-Agent",
                    "\".*MSIE.*\"",
                    "nokeepalive",
                    "ssl-unclean-shutdown",
                    "downgrade-1.0",
                    "force-response-1.0",
                ]
            )]
        );
    }

    #[test]
    fn test_nested_blocks_with_comments() {
        let source = "
        ServerName blah.co.za
        Options some options
        ####
        # lets add a comment here
        <VirtualHost 10.10.10.2:123>
          ServerName www.test123.co.za
          DocumentRoot /usr/www/users/blah
          <Directory /usr/www/users/blah>
            # and another comment goes here
            Options Indexes Includes FollowSymLinks ExecCGI
          </Directory>
        </VirtualHost>";
        let document = parse(source).unwrap();

        assert_eq!(document.len(), 3);
        assert_eq!(document.entries[0], directive("ServerName", &["blah.co.za"]));
        assert_eq!(document.entries[1], directive("Options", &["some", "options"]));

        let Entry::Block(vhost) = &document.entries[2] else {
            panic!("expected a VirtualHost block");
        };
        assert_eq!(
            vhost.kind,
            BlockKind::VirtualHost {
                addr: Some(HostAddr {
                    ip_addr: [10, 10, 10, 2],
                    port: Some(123),
                }),
            }
        );
        assert_eq!(vhost.entries.len(), 3);

        let Entry::Block(dir) = &vhost.entries[2] else {
            panic!("expected a Directory block");
        };
        assert_eq!(
            dir.kind,
            BlockKind::Directory {
                directory: "/usr/www/users/blah".to_string(),
            }
        );
        assert_eq!(dir.entries.len(), 1);
    }

    #[test]
    fn test_virtualhost_inside_virtualhost() {
        let source = "<VirtualHost 1.2.3.4>\n<VirtualHost 5.6.7.8:80>\nServerName inner\n</VirtualHost>\n</VirtualHost>";
        let document = parse(source).unwrap();
        let Entry::Block(outer) = &document.entries[0] else {
            panic!("expected a block");
        };
        let Entry::Block(inner) = &outer.entries[0] else {
            panic!("expected a nested block");
        };
        assert_eq!(
            inner.kind,
            BlockKind::VirtualHost {
                addr: Some(HostAddr {
                    ip_addr: [5, 6, 7, 8],
                    port: Some(80),
                }),
            }
        );
        assert_eq!(inner.entries.len(), 1);
    }

    #[test]
    fn test_generic_block_kind() {
        let source = "<IfModule mod_ssl.c>\nSSLEngine on\n</IfModule>";
        let document = parse(source).unwrap();
        assert_eq!(
            document.entries,
            vec![Entry::Block(Block {
                kind: BlockKind::Other {
                    name: "IfModule".to_string(),
                    arguments: vec!["mod_ssl.c".to_string()],
                },
                entries: vec![directive("SSLEngine", &["on"])],
            })]
        );
    }

    #[test]
    fn test_directive_without_arguments_is_malformed() {
        let err = parse("ServerName\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedDirective { .. }));
    }

    #[test]
    fn test_unterminated_block() {
        let err = parse("<VirtualHost 10.10.10.1:443>\nServerName test.co.za\n").unwrap_err();
        match err {
            ParseError::UnterminatedBlock { kind, position } => {
                assert_eq!(kind, "VirtualHost");
                assert_eq!(position.line, 1);
                assert_eq!(position.column, 1);
            }
            other => panic!("expected UnterminatedBlock, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_octet_is_malformed_header() {
        let err = parse("<VirtualHost 10.x.12.13>\n</VirtualHost>").unwrap_err();
        assert!(matches!(err, ParseError::MalformedBlockHeader { .. }));
    }

    #[test]
    fn test_non_numeric_port_is_malformed_header() {
        let err = parse("<VirtualHost 10.1.12.13:web>\n</VirtualHost>").unwrap_err();
        assert!(matches!(err, ParseError::MalformedBlockHeader { .. }));
    }

    #[test]
    fn test_directory_with_two_paths_is_malformed_header() {
        let err = parse("<Directory /a /b>\n</Directory>").unwrap_err();
        assert!(matches!(err, ParseError::MalformedBlockHeader { .. }));
    }

    #[test]
    fn test_mismatched_close_tag() {
        let err = parse("<Directory /a>\n</VirtualHost>").unwrap_err();
        match err {
            ParseError::UnexpectedToken { expected, found, .. } => {
                assert_eq!(expected, "</Directory>");
                assert_eq!(found, "</VirtualHost>");
            }
            other => panic!("expected UnexpectedToken, got {:?}", other),
        }
    }

    #[test]
    fn test_stray_close_tag_at_top_level() {
        let err = parse("</Directory>\n").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn test_error_position_points_to_the_failing_line() {
        let err = parse("ServerName a.example\nServerName\n").unwrap_err();
        match err {
            ParseError::MalformedDirective { position, .. } => {
                assert_eq!(position.line, 2);
                assert_eq!(position.column, 1);
            }
            other => panic!("expected MalformedDirective, got {:?}", other),
        }
    }

    #[test]
    fn test_octets_are_not_range_validated() {
        // "parses as integer" is the only requirement on octets
        let document = parse("<VirtualHost 999.0.0.1>\n</VirtualHost>").unwrap();
        let Entry::Block(block) = &document.entries[0] else {
            panic!("expected a block");
        };
        assert_eq!(
            block.kind,
            BlockKind::VirtualHost {
                addr: Some(HostAddr {
                    ip_addr: [999, 0, 0, 1],
                    port: None,
                }),
            }
        );
    }

    #[test]
    fn test_parse_is_deterministic() {
        let source = "<VirtualHost 10.10.10.2:123>\nServerName www.test123.co.za\n</VirtualHost>";
        let first = parse(source).unwrap();
        let second = parse(source).unwrap();
        assert_eq!(first, second);
    }
}
