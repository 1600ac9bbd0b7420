//! Pull tokenizer for DUEL markup.
//!
//! Tokens are scanned lazily, one per call. Every tentative recognition marks
//! the cursor and rolls back exactly when the construct does not match, so a
//! failed block or tag falls through to literal text.

use super::chars::{is_attr_name_char, is_digit, is_hex_digit, is_letter, is_name_char, is_name_start_char, is_whitespace};
use super::cursor::Cursor;
use super::grammar::*;
use super::token::{BlockValue, Position, Token, TokenKind};
use crate::html::HtmlConfig;
use std::io::{self, Read};
use std::sync::Arc;

/// Scanning state; a latched `End` or `Error` repeats until cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Text,
    ElementBegin,
    AttributeName,
    AttributeValue,
    ElementEnd,
    End,
    Error,
}

/// A foreign block ran off the end of the input
#[derive(Debug)]
struct Unterminated;

#[derive(Debug)]
pub struct Lexer<'c> {
    cursor: Cursor,
    config: &'c HtmlConfig,
    mode: Mode,
    /// Scanned by `peek`, not yet consumed
    pending: Option<Token>,
    latched: Option<Token>,
    last_tag: String,
    /// Inside a raw-text element
    suspend: bool,
    start: Position,
    last_error: Option<Arc<io::Error>>,
    error_reported: bool,
}

impl<'c> Lexer<'c> {
    pub fn new(source: impl Into<Arc<str>>, config: &'c HtmlConfig) -> Self {
        Self {
            cursor: Cursor::new(source),
            config,
            mode: Mode::Text,
            pending: None,
            latched: None,
            last_tag: String::new(),
            suspend: false,
            start: Position::default(),
            last_error: None,
            error_reported: false,
        }
    }

    /// Read the whole stream up front; a failed read latches an error token
    pub fn from_reader<R: Read>(mut reader: R, config: &'c HtmlConfig) -> Self {
        let mut source = String::new();
        match reader.read_to_string(&mut source) {
            Ok(_) => Self::new(source, config),
            Err(err) => {
                let mut lexer = Self::new("", config);
                let message = err.to_string();
                lexer.last_error = Some(Arc::new(err));
                lexer.latch(Token::Error { message, position: Position::default() });
                lexer
            }
        }
    }

    pub fn source(&self) -> &str {
        self.cursor.source()
    }

    pub fn position(&self) -> Position {
        self.cursor.position()
    }

    pub fn last_error(&self) -> Option<Arc<io::Error>> {
        self.last_error.clone()
    }

    /// Drop the stored cause; a latched error resumes scanning as text
    pub fn clear_last_error(&mut self) {
        self.last_error = None;
        self.error_reported = false;

        if self.peek().kind() == TokenKind::Error {
            self.pending = None;
            self.latched = None;
            self.mode = Mode::Text;
        }
    }

    /// False once the next token is `End` or `Error`
    pub fn has_next(&mut self) -> bool {
        !self.peek().is_terminal()
    }

    pub fn peek(&mut self) -> &Token {
        let token = match self.pending.take() {
            Some(token) => token,
            None => self.scan(),
        };
        self.pending.insert(token)
    }

    pub fn next_token(&mut self) -> Token {
        match self.pending.take() {
            Some(token) => token,
            None => self.scan(),
        }
    }

    fn scan(&mut self) -> Token {
        match self.scan_token() {
            Ok(token) => self.accept(token),
            Err(Unterminated) => self.latch(Token::Error {
                message: "Unterminated block".to_string(),
                position: self.start,
            }),
        }
    }

    /// Switch mode to follow the token just produced
    fn accept(&mut self, token: Token) -> Token {
        self.mode = match token.kind() {
            TokenKind::Literal | TokenKind::Block => Mode::Text,
            TokenKind::ElementBegin => Mode::ElementBegin,
            TokenKind::ElementEnd => Mode::ElementEnd,
            TokenKind::AttributeName => Mode::AttributeName,
            TokenKind::AttributeValue => Mode::AttributeValue,
            TokenKind::End | TokenKind::Error => return self.latch(token),
        };
        token
    }

    fn latch(&mut self, token: Token) -> Token {
        self.mode = if token.kind() == TokenKind::Error { Mode::Error } else { Mode::End };
        self.latched = Some(token.clone());
        token
    }

    fn scan_token(&mut self) -> Result<Token, Unterminated> {
        loop {
            self.start = self.cursor.position();

            match self.mode {
                Mode::Text => {
                    match self.cursor.current() {
                        None => return Ok(Token::End { position: self.start }),
                        Some(OP_ELEM_BEGIN) => {
                            if let Some(token) = self.try_scan_block(false)? {
                                return Ok(token);
                            }
                            if let Some(token) = self.try_scan_tag() {
                                return Ok(token);
                            }
                        }
                        Some(_) => {}
                    }
                    return Ok(self.scan_literal());
                }

                Mode::ElementBegin | Mode::AttributeValue => {
                    self.cursor.skip_while(is_whitespace);
                    self.start = self.cursor.position();

                    match self.cursor.current() {
                        None => return Ok(Token::End { position: self.start }),
                        Some(OP_ELEM_CLOSE) => {
                            if self.cursor.advance() == Some(OP_ELEM_END) {
                                // self-closing also ends raw text
                                self.suspend = false;
                                return Ok(Token::element_end(self.last_tag.clone(), self.start));
                            }
                        }
                        Some(OP_ELEM_END) => {
                            self.cursor.advance();
                            self.mode = Mode::Text;
                            continue;
                        }
                        Some(_) => {}
                    }

                    if let Some(token) = self.try_scan_attr_name() {
                        return Ok(token);
                    }

                    // junk inside the tag
                    self.cursor.skip_while(|ch| ch != OP_ELEM_CLOSE && ch != OP_ELEM_END);
                }

                Mode::AttributeName => {
                    if let Some(token) = self.try_scan_attr_value()? {
                        return Ok(token);
                    }
                    self.mode = Mode::ElementBegin;
                }

                Mode::ElementEnd => {
                    self.cursor.skip_while(|ch| ch != OP_ELEM_END);
                    self.cursor.advance();
                    self.mode = Mode::Text;
                }

                Mode::End | Mode::Error => {
                    return Ok(self
                        .latched
                        .clone()
                        .unwrap_or(Token::End { position: self.start }));
                }
            }
        }
    }

    fn scan_literal(&mut self) -> Token {
        let mut text = String::new();

        while let Some(ch) = self.cursor.current() {
            match ch {
                OP_ELEM_BEGIN if !text.is_empty() => break,
                OP_ENTITY_BEGIN => self.decode_entity(&mut text),
                _ => {
                    text.push(ch);
                    self.cursor.advance();
                }
            }
        }

        Token::literal(text, self.start)
    }

    /// Decode a character reference at `&` into `buffer`, or emit a bare `&`
    fn decode_entity(&mut self, buffer: &mut String) {
        let mark = self.cursor.mark();

        let decoded = if self.cursor.advance() == Some(OP_ENTITY_NUM) {
            self.scan_code_point().map(String::from)
        } else {
            let name = self.take_while(ENTITY_NAME_CAPACITY, is_letter);
            self.config.decode_entity(&name).map(str::to_string)
        };

        match decoded {
            Some(value) => {
                buffer.push_str(&value);
                if self.cursor.is(OP_ENTITY_END) {
                    self.cursor.advance();
                }
            }
            None => {
                self.cursor.reset(mark);
                buffer.push(OP_ENTITY_BEGIN);
                self.cursor.advance();
            }
        }
    }

    /// `&#66;`, `&#x42;` or `&#X42;`, with the cursor on `#`
    fn scan_code_point(&mut self) -> Option<char> {
        let hex = matches!(self.cursor.advance(), Some(OP_ENTITY_HEX | OP_ENTITY_HEX_ALT));
        let digits = if hex {
            self.cursor.advance();
            self.take_while(HEX_DIGIT_CAPACITY, is_hex_digit)
        } else {
            self.take_while(DECIMAL_DIGIT_CAPACITY, is_digit)
        };

        let value = i32::from_str_radix(&digits, if hex { 16 } else { 10 }).ok()?;
        if value <= 0 {
            return None;
        }
        char::from_u32(value as u32)
    }

    fn try_scan_tag(&mut self) -> Option<Token> {
        let mark = self.cursor.mark();

        let is_end_tag = self.cursor.advance() == Some(OP_ELEM_CLOSE);
        if is_end_tag {
            self.cursor.advance();
        }

        let name = match self.cursor.current() {
            Some(ch) if is_name_start_char(ch) => self.take_while(NAME_CAPACITY, is_name_char),
            _ => String::new(),
        };

        if name.is_empty() {
            self.cursor.reset(mark);
            return None;
        }

        if self.suspend {
            if is_end_tag && name == self.last_tag {
                self.suspend = false;
            } else {
                self.cursor.reset(mark);
                return None;
            }
        }

        self.suspend = !is_end_tag && RAW_TEXT_TAGS.contains(&name.as_str());
        self.last_tag = name;

        Some(if is_end_tag {
            Token::element_end(self.last_tag.clone(), self.start)
        } else {
            Token::element_begin(self.last_tag.clone(), self.start)
        })
    }

    fn try_scan_attr_name(&mut self) -> Option<Token> {
        let name = self.take_while(NAME_CAPACITY, is_attr_name_char);
        if name.is_empty() {
            return None;
        }
        Some(Token::attr_name(name, self.start))
    }

    /// `= value` after an attribute name; `None` when there is no `=`
    fn try_scan_attr_value(&mut self) -> Result<Option<Token>, Unterminated> {
        self.cursor.skip_while(is_whitespace);
        if !self.cursor.is(OP_PAIR_DELIM) {
            return Ok(None);
        }
        self.cursor.advance();
        self.cursor.skip_while(is_whitespace);
        self.start = self.cursor.position();

        let quote = match self.cursor.current() {
            Some(ch @ (OP_STRING_DELIM | OP_STRING_DELIM_ALT)) => {
                self.cursor.advance();
                Some(ch)
            }
            _ => None,
        };

        let block = if self.cursor.is(OP_ELEM_BEGIN) {
            self.try_scan_block(true)?
        } else {
            None
        };

        let token = match block {
            Some(token) => token,
            None => self.scan_attr_literal(quote),
        };

        if quote.is_some() && self.cursor.current() == quote {
            self.cursor.advance();
        }

        Ok(Some(token))
    }

    /// Unquoted values stop at whitespace or `>`
    fn scan_attr_literal(&mut self, quote: Option<char>) -> Token {
        let mut text = String::new();

        while let Some(ch) = self.cursor.current() {
            let at_end = match quote {
                Some(quote) => ch == quote,
                None => is_whitespace(ch) || ch == OP_ELEM_END,
            };
            if at_end {
                break;
            }

            if ch == OP_ENTITY_BEGIN {
                self.decode_entity(&mut text);
            } else {
                text.push(ch);
                self.cursor.advance();
            }
        }

        Token::attr_text(text, self.start)
    }

    /// Recognize a foreign block at `<`; `as_attr` when scanning an attribute value
    fn try_scan_block(&mut self, as_attr: bool) -> Result<Option<Token>, Unterminated> {
        let mark = self.cursor.mark();

        let scanned = match self.cursor.advance() {
            Some('%') => self.scan_code_block()?,
            Some('!') => self.scan_markup_declaration()?,
            Some('?') => self.scan_processing_instruction()?,
            Some('#') => self.scan_t4_block()?,
            _ => None,
        };

        let Some(block) = scanned else {
            self.cursor.reset(mark);
            return Ok(None);
        };

        let start = self.start;
        let token = if block.begin == CDATA.begin {
            if as_attr {
                Token::attr_text(block.value, start)
            } else {
                Token::literal(block.value, start)
            }
        } else if self.suspend && !as_attr && block.begin == COMMENT.begin {
            // commented-out raw text is still raw text
            Token::literal(block.value, start)
        } else if as_attr {
            Token::attr_block(block, start)
        } else {
            Token::block(block, start)
        };

        Ok(Some(token))
    }

    /// `<%--`, `<%X` or `<%`, with the cursor on `%`
    fn scan_code_block(&mut self) -> Result<Option<BlockValue>, Unterminated> {
        match self.cursor.advance() {
            Some('-') => self.scan_block_value("--", CODE_COMMENT.begin, CODE_COMMENT.end),
            Some(marker) if CODE_BLOCK_MARKERS.contains(&marker) => {
                let begin = format!("{}{}", CODE_BLOCK.begin, marker);
                self.scan_block_value(&marker.to_string(), &begin, CODE_BLOCK.end)
            }
            _ => self.scan_block_value("", CODE_BLOCK.begin, CODE_BLOCK.end),
        }
    }

    /// Comments, CDATA, conditional comments and SGML declarations
    fn scan_markup_declaration(&mut self) -> Result<Option<BlockValue>, Unterminated> {
        const DOCTYPE: &str = "doctype";

        let mark = self.cursor.mark();
        match self.cursor.advance() {
            Some('-') => {
                if let Some(block) = self.scan_block_value(
                    &CONDITIONAL_COMMENT.begin[2..],
                    CONDITIONAL_COMMENT.begin,
                    CONDITIONAL_COMMENT.end,
                )? {
                    return Ok(Some(block));
                }
                self.cursor.reset(mark);
                self.cursor.advance();
                self.scan_block_value(&COMMENT.begin[2..], COMMENT.begin, COMMENT.end)
            }
            Some('[') => {
                if let Some(block) = self.scan_block_value(&CDATA.begin[2..], CDATA.begin, CDATA.end)? {
                    return Ok(Some(block));
                }
                self.cursor.reset(mark);
                self.cursor.advance();
                self.scan_block_value(
                    &CONDITIONAL_REVEALED.begin[2..],
                    CONDITIONAL_REVEALED.begin,
                    CONDITIONAL_REVEALED.end,
                )
            }
            _ => {
                let block = self.scan_block_value("", DECLARATION.begin, DECLARATION.end)?;
                Ok(block.map(|block| match block.value.get(..DOCTYPE.len()) {
                    Some(head) if head.eq_ignore_ascii_case(DOCTYPE) => {
                        BlockValue::new(OP_DOCTYPE, DECLARATION.end, block.value[DOCTYPE.len()..].trim())
                    }
                    _ => block,
                }))
            }
        }
    }

    fn scan_processing_instruction(&mut self) -> Result<Option<BlockValue>, Unterminated> {
        match self.cursor.advance() {
            Some('=') => self.scan_block_value("=", PHP_EXPRESSION.begin, PHP_EXPRESSION.end),
            _ => self.scan_block_value("", PROCESSING_INSTRUCTION.begin, PROCESSING_INSTRUCTION.end),
        }
    }

    fn scan_t4_block(&mut self) -> Result<Option<BlockValue>, Unterminated> {
        match self.cursor.advance() {
            Some('-') => self.scan_block_value("--", T4_COMMENT.begin, T4_COMMENT.end),
            Some(marker) if T4_BLOCK_MARKERS.contains(&marker) => {
                let begin = format!("{}{}", T4_BLOCK.begin, marker);
                self.scan_block_value(&marker.to_string(), &begin, T4_BLOCK.end)
            }
            _ => self.scan_block_value("", T4_BLOCK.begin, T4_BLOCK.end),
        }
    }

    /// Match the rest of the begin delimiter (`lead`), then read raw text up to `end`
    ///
    /// `Ok(None)` means the begin delimiter did not match; running out of
    /// input before `end` is fatal.
    fn scan_block_value(&mut self, lead: &str, begin: &str, end: &str) -> Result<Option<BlockValue>, Unterminated> {
        debug_assert!(begin.len() <= BLOCK_LOOKAHEAD);

        for expected in lead.chars() {
            if !self.cursor.is(expected) {
                return Ok(None);
            }
            self.cursor.advance();
        }

        let mut value = String::new();
        while let Some(ch) = self.cursor.current() {
            value.push(ch);
            self.cursor.advance();

            if value.ends_with(end) {
                value.truncate(value.len() - end.len());
                return Ok(Some(BlockValue::new(begin, end, value)));
            }
        }

        Err(Unterminated)
    }

    /// Consume up to `capacity` chars matching `pred`
    fn take_while(&mut self, capacity: usize, pred: impl Fn(char) -> bool) -> String {
        let mut taken = String::new();
        let mut count = 0;

        while let Some(ch) = self.cursor.current() {
            if count >= capacity || !pred(ch) {
                break;
            }
            taken.push(ch);
            count += 1;
            self.cursor.advance();
        }

        taken
    }
}

/// Yields tokens up to `End`; an `Error` is yielded once
impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        match self.next_token() {
            Token::End { .. } => None,
            Token::Error { .. } if self.error_reported => None,
            token @ Token::Error { .. } => {
                self.error_reported = true;
                Some(token)
            }
            token => Some(token),
        }
    }
}

/// Tokenize a whole document
pub fn tokenize(source: &str, config: &HtmlConfig) -> Vec<Token> {
    Lexer::new(source, config).collect()
}
