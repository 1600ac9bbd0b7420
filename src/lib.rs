//! DUEL template front end.
//!
//! Tokenizes `.duel` markup and builds a typed syntax tree of named views:
//! HTML elements, foreign code blocks and the DUEL control tags (`for`,
//! `if`/`else`, `call`/`part`, `view`).

pub mod ast;
pub mod entities;
pub mod error;
pub mod html;
pub mod parser;
pub mod visit;

pub use ast::{Ast, NodeId, NodeRef};
pub use error::{CompileError, ErrorKind, ParseError};
pub use html::HtmlConfig;
pub use parser::{DuelParser, Lexer, Parser, Position, Token, tokenize};
pub use visit::{LinkCollector, Visitor, walk};

/// Parse one document into its views
pub fn parse(source: &str, config: &HtmlConfig) -> Result<Ast, ParseError> {
    DuelParser::new(config).parse(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_views() {
        let config = HtmlConfig::standard();
        let ast = parse("<view name=\"a\">x</view>\n<view name=\"b\" client-only>y</view>\n", &config).unwrap();
        let names: Vec<_> = ast.views().filter_map(|v| v.view_name()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(ast.view("b").is_some_and(|v| v.is_client_only()));
        assert!(ast.view("c").is_none());
    }

    #[test]
    fn test_serialize_ast() {
        let config = HtmlConfig::standard();
        let ast = parse("<view name=\"a\"><%= x %></view>", &config).unwrap();
        let json = serde_json::to_value(&ast).unwrap();
        assert_eq!(json[0]["type"], "command");
        assert_eq!(json[0]["name"], "a");
        assert_eq!(json[0]["children"][0]["kind"], "expression");
        assert_eq!(json[0]["children"][0]["value"], " x ");
    }
}
