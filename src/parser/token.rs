use serde::Serialize;
use std::fmt;

/// Position in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Position {
    /// Byte offset in source
    pub byte: usize,
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed, in characters)
    pub col: usize,
}

impl Position {
    pub fn new(byte: usize, line: usize, col: usize) -> Self {
        Self { byte, line, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

/// Raw text wrapped in a pair of foreign delimiters, e.g. `<%= expr %>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BlockValue {
    pub begin: String,
    pub end: String,
    pub value: String,
}

impl BlockValue {
    pub fn new(begin: impl Into<String>, end: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            begin: begin.into(),
            end: end.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for BlockValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.begin, self.value, self.end)
    }
}

/// Attribute value as scanned: either decoded text or a foreign block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttrValue {
    Text { text: String },
    Block { block: BlockValue },
}

/// Kind of token, also used as the lexer's scanning mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Literal,
    ElementBegin,
    ElementEnd,
    AttributeName,
    AttributeValue,
    Block,
    End,
    Error,
}

/// Tokens produced by the lexer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "token", rename_all = "snake_case")]
pub enum Token {
    /// Plain text with entities decoded
    Literal { text: String, position: Position },
    /// Opening tag name: `<div`
    ElementBegin { name: String, position: Position },
    /// Closing tag `</div>`, or the synthetic close of `<div/>`
    ElementEnd { name: String, position: Position },
    AttributeName { name: String, position: Position },
    AttributeValue { value: AttrValue, position: Position },
    /// Foreign code block in content position
    Block { block: BlockValue, position: Position },
    /// End of input
    End { position: Position },
    Error { message: String, position: Position },
}

impl Token {
    pub fn literal(text: impl Into<String>, position: Position) -> Self {
        Token::Literal { text: text.into(), position }
    }

    pub fn element_begin(name: impl Into<String>, position: Position) -> Self {
        Token::ElementBegin { name: name.into(), position }
    }

    pub fn element_end(name: impl Into<String>, position: Position) -> Self {
        Token::ElementEnd { name: name.into(), position }
    }

    pub fn attr_name(name: impl Into<String>, position: Position) -> Self {
        Token::AttributeName { name: name.into(), position }
    }

    pub fn attr_text(text: impl Into<String>, position: Position) -> Self {
        Token::AttributeValue {
            value: AttrValue::Text { text: text.into() },
            position,
        }
    }

    pub fn attr_block(block: BlockValue, position: Position) -> Self {
        Token::AttributeValue {
            value: AttrValue::Block { block },
            position,
        }
    }

    pub fn block(block: BlockValue, position: Position) -> Self {
        Token::Block { block, position }
    }

    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Literal { .. } => TokenKind::Literal,
            Token::ElementBegin { .. } => TokenKind::ElementBegin,
            Token::ElementEnd { .. } => TokenKind::ElementEnd,
            Token::AttributeName { .. } => TokenKind::AttributeName,
            Token::AttributeValue { .. } => TokenKind::AttributeValue,
            Token::Block { .. } => TokenKind::Block,
            Token::End { .. } => TokenKind::End,
            Token::Error { .. } => TokenKind::Error,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Token::Literal { position, .. } => *position,
            Token::ElementBegin { position, .. } => *position,
            Token::ElementEnd { position, .. } => *position,
            Token::AttributeName { position, .. } => *position,
            Token::AttributeValue { position, .. } => *position,
            Token::Block { position, .. } => *position,
            Token::End { position } => *position,
            Token::Error { position, .. } => *position,
        }
    }

    /// End of input or a latched error
    pub fn is_terminal(&self) -> bool {
        matches!(self, Token::End { .. } | Token::Error { .. })
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Literal { text, .. } => write!(f, "Literal({:?})", text),
            Token::ElementBegin { name, .. } => write!(f, "ElementBegin({})", name),
            Token::ElementEnd { name, .. } => write!(f, "ElementEnd({})", name),
            Token::AttributeName { name, .. } => write!(f, "AttributeName({})", name),
            Token::AttributeValue { value: AttrValue::Text { text }, .. } => {
                write!(f, "AttributeValue({:?})", text)
            }
            Token::AttributeValue { value: AttrValue::Block { block }, .. } => {
                write!(f, "AttributeValue({})", block)
            }
            Token::Block { block, .. } => write!(f, "Block({})", block),
            Token::End { .. } => write!(f, "End"),
            Token::Error { message, .. } => write!(f, "Error({})", message),
        }
    }
}
