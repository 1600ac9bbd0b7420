pub(crate) mod chars;
mod cursor;
pub(crate) mod grammar;
pub mod lexer;
pub mod token;
mod tree_builder;

pub use lexer::{Lexer, tokenize};
pub use token::{AttrValue, BlockValue, Position, Token, TokenKind};
pub use tree_builder::block_node;
use tree_builder::TreeBuilder;

use crate::ast::Ast;
use crate::error::{ErrorKind, ParseError};
use crate::html::HtmlConfig;

/// Parser trait - converts source code to AST
pub trait Parser {
    fn parse(&self, source: &str) -> Result<Ast, ParseError>;
}

/// DUEL view parser
#[derive(Debug, Clone, Copy)]
pub struct DuelParser<'c> {
    config: &'c HtmlConfig,
}

impl<'c> DuelParser<'c> {
    pub fn new(config: &'c HtmlConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'c HtmlConfig {
        self.config
    }

    /// Build a tree from already scanned tokens
    pub fn parse_tokens(&self, tokens: impl IntoIterator<Item = Token>) -> Result<Ast, ParseError> {
        TreeBuilder::new(tokens.into_iter(), self.config).build()
    }

    /// Build a tree straight from a lexer
    ///
    /// A syntax error raised by a failed read carries the underlying
    /// `io::Error` as its cause.
    pub fn parse_lexer(&self, lexer: &mut Lexer<'_>) -> Result<Ast, ParseError> {
        let result = TreeBuilder::new(lexer.by_ref(), self.config).build();

        result.map_err(|err| match lexer.last_error() {
            Some(cause) if err.kind == ErrorKind::Syntax => {
                let mut err = err.with_cause(cause);
                err.kind = ErrorKind::Io;
                err
            }
            _ => err,
        })
    }
}

impl Parser for DuelParser<'_> {
    fn parse(&self, source: &str) -> Result<Ast, ParseError> {
        let mut lexer = Lexer::new(source, self.config);
        self.parse_lexer(&mut lexer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io::{self, Read};

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"))
        }
    }

    #[test]
    fn test_parse_simple_view() {
        let config = HtmlConfig::standard();
        let ast = DuelParser::new(&config).parse("<view name=\"foo\">bar</view>").unwrap();
        assert_eq!(ast.views.len(), 1);
        assert_eq!(ast.views().next().unwrap().to_string(), "<view name=\"foo\">bar</view>");
    }

    #[test]
    fn test_parse_tokens_matches_parse() {
        let config = HtmlConfig::standard();
        let parser = DuelParser::new(&config);
        let source = "<view name=\"a\"><p if=\"x\">y</p></view>";
        let from_tokens = parser.parse_tokens(tokenize(source, &config)).unwrap();
        assert_eq!(from_tokens, parser.parse(source).unwrap());
    }

    #[test]
    fn test_read_failure_carries_cause() {
        let config = HtmlConfig::standard();
        let mut lexer = Lexer::from_reader(BrokenReader, &config);
        let err = DuelParser::new(&config).parse_lexer(&mut lexer).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Io);
        assert_eq!(err.message, "Syntax error: connection reset");
        assert_eq!(err.source().map(|e| e.to_string()), Some("connection reset".to_string()));
    }

    #[test]
    fn test_unterminated_block_is_syntax_error() {
        let config = HtmlConfig::standard();
        let err = DuelParser::new(&config).parse("<view name=\"a\"><%= oops").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!(err.message, "Syntax error: Unterminated block");
        assert!(err.cause.is_none());
    }
}
