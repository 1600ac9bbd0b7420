//! Tokenizer behavior through the public API
//!
//! Run with: cargo test --test lexer_tests

use duel_compiler::parser::{AttrValue, BlockValue, Lexer, Position, Token, TokenKind, tokenize};
use duel_compiler::HtmlConfig;
use std::io::{self, Read};

fn lex(source: &str) -> Vec<Token> {
    tokenize(source, &HtmlConfig::standard())
}

fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source).iter().map(Token::kind).collect()
}

/// Concatenated text of all literal tokens
fn literal_text(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter_map(|token| match token {
            Token::Literal { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_self_closing_element() {
    let tokens = lex("<div/>");
    assert_eq!(
        tokens,
        vec![
            Token::element_begin("div", Position::new(0, 0, 0)),
            Token::element_end("div", Position::new(4, 0, 4)),
        ]
    );
}

#[test]
fn test_attribute_positions_skip_whitespace() {
    let tokens = lex("<a  href = \"x\">");
    assert_eq!(
        tokens,
        vec![
            Token::element_begin("a", Position::new(0, 0, 0)),
            Token::attr_name("href", Position::new(4, 0, 4)),
            Token::attr_text("x", Position::new(11, 0, 11)),
        ]
    );
}

#[test]
fn test_attribute_value_forms() {
    let tokens = lex("<input value=plain checked title='it&apos;s' data=\"<%= d %>\">");
    let values: Vec<&AttrValue> = tokens
        .iter()
        .filter_map(|token| match token {
            Token::AttributeValue { value, .. } => Some(value),
            _ => None,
        })
        .collect();

    assert_eq!(
        values,
        vec![
            &AttrValue::Text { text: "plain".into() },
            &AttrValue::Text { text: "it's".into() },
            &AttrValue::Block { block: BlockValue::new("<%=", "%>", " d ") },
        ]
    );
    assert!(tokens.contains(&Token::attr_name("checked", Position::new(19, 0, 19))));
}

#[test]
fn test_script_body_stays_text() {
    let source = "<script>if (a < b) { x = \"<strong>\"; }</script><p>";
    let tokens = lex(source);

    assert_eq!(tokens.first().map(Token::kind), Some(TokenKind::ElementBegin));
    assert_eq!(literal_text(&tokens), "if (a < b) { x = \"<strong>\"; }");
    assert!(tokens.contains(&Token::element_end("script", Position::new(38, 0, 38))));
    assert_eq!(tokens.last(), Some(&Token::element_begin("p", Position::new(47, 0, 47))));
}

#[test]
fn test_style_comment_is_unwrapped() {
    let tokens = lex("<style><!-- p { color: red } --></style>");
    assert_eq!(literal_text(&tokens), " p { color: red } ");
    assert!(!tokens.iter().any(|t| t.kind() == TokenKind::Block));
}

#[test]
fn test_foreign_block_families() {
    let tokens = lex("<%@ page %><?php echo 1; ?><?= $x ?><#= t #><!--[if IE]><![endif]-->");
    let blocks: Vec<String> = tokens
        .iter()
        .filter_map(|token| match token {
            Token::Block { block, .. } => Some(block.begin.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(blocks, vec!["<%@", "<?", "<?=", "<#=", "<!--[", "<!["]);
}

#[test]
fn test_entities_round_trip_through_text() {
    assert_eq!(literal_text(&lex("&lt;b&gt; &amp; &#66;&#x41;")), "<b> & BA");
    assert_eq!(literal_text(&lex("&#xnot; &bogus; &")), "&#xnot; &bogus; &");

    // decoded text with no markup characters re-tokenizes unchanged
    let decoded = literal_text(&lex("caf&eacute; &ndash; ok"));
    assert_eq!(literal_text(&lex(&decoded)), decoded);
}

#[test]
fn test_crlf_positions() {
    let tokens = lex("a\r\n<b>");
    assert_eq!(tokens[0], Token::literal("a\n", Position::new(0, 0, 0)));
    assert_eq!(tokens[1], Token::element_begin("b", Position::new(3, 1, 0)));
}

#[test]
fn test_unterminated_block_latches_error() {
    let config = HtmlConfig::standard();
    let mut lexer = Lexer::new("ok <%= never closed", &config);

    assert_eq!(lexer.next_token(), Token::literal("ok ", Position::new(0, 0, 0)));
    assert!(!lexer.has_next());
    let error = Token::Error {
        message: "Unterminated block".into(),
        position: Position::new(3, 0, 3),
    };
    assert_eq!(lexer.next_token(), error);
    // latched until cleared
    assert_eq!(lexer.next_token(), error);
    assert!(lexer.last_error().is_none());
}

#[test]
fn test_every_block_family_must_terminate() {
    let sources = [
        "<p><%= x",
        "<p><%-- note",
        "<p><!-- note",
        "<p><!--[if IE]",
        "<p><![CDATA[ raw",
        "<p><![endif]",
        "<p><?php echo 1;",
        "<p><?= $x",
        "<p><#= t",
        "<p><!",
    ];
    for source in sources {
        let tokens = lex(source);
        assert_eq!(kinds(source), vec![TokenKind::ElementBegin, TokenKind::Error], "{}", source);
        assert_eq!(
            tokens.last(),
            Some(&Token::Error { message: "Unterminated block".into(), position: Position::new(3, 0, 3) }),
            "{}",
            source
        );
    }
}

#[test]
fn test_conditional_comment_without_bracket_close_is_fatal() {
    let tokens = lex("<!--[note -->");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind(), TokenKind::Error);
}

#[test]
fn test_iterator_stops_after_error() {
    let tokens = lex("<p><!-- open");
    assert_eq!(kinds("<p><!-- open"), vec![TokenKind::ElementBegin, TokenKind::Error]);
    assert!(tokens.last().is_some_and(Token::is_terminal));
}

#[test]
fn test_peek_does_not_consume() {
    let config = HtmlConfig::standard();
    let mut lexer = Lexer::new("<i>x</i>", &config);
    assert_eq!(lexer.peek().kind(), TokenKind::ElementBegin);
    assert_eq!(lexer.peek().kind(), TokenKind::ElementBegin);
    assert_eq!(lexer.next_token().kind(), TokenKind::ElementBegin);
    assert_eq!(lexer.next_token(), Token::literal("x", Position::new(3, 0, 3)));
    assert_eq!(lexer.next_token(), Token::element_end("i", Position::new(4, 0, 4)));
    assert!(!lexer.has_next());
    assert_eq!(lexer.next_token().kind(), TokenKind::End);
}

struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
    }
}

#[test]
fn test_reader_failure() {
    let config = HtmlConfig::standard();
    let mut lexer = Lexer::from_reader(FailingReader, &config);
    assert_eq!(lexer.peek().kind(), TokenKind::Error);
    assert_eq!(lexer.last_error().map(|e| e.kind()), Some(io::ErrorKind::BrokenPipe));

    lexer.clear_last_error();
    assert!(lexer.last_error().is_none());
    assert_eq!(lexer.next_token().kind(), TokenKind::End);
}

#[test]
fn test_reader_success() {
    let config = HtmlConfig::standard();
    let tokens: Vec<Token> = Lexer::from_reader("<b>hi</b>".as_bytes(), &config).collect();
    assert_eq!(tokens.len(), 3);
}
