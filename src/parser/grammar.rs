//! Punctuation and delimiters recognized by the lexer.

pub const OP_ELEM_BEGIN: char = '<';
pub const OP_ELEM_CLOSE: char = '/';
pub const OP_ELEM_END: char = '>';
pub const OP_PAIR_DELIM: char = '=';
pub const OP_STRING_DELIM: char = '"';
pub const OP_STRING_DELIM_ALT: char = '\'';
pub const OP_ENTITY_BEGIN: char = '&';
pub const OP_ENTITY_NUM: char = '#';
pub const OP_ENTITY_HEX: char = 'x';
pub const OP_ENTITY_HEX_ALT: char = 'X';
pub const OP_ENTITY_END: char = ';';

/// Comment delimiters; comments inside raw-text elements are unwrapped
pub const OP_COMMENT: &str = "<!--";
pub const OP_COMMENT_END: &str = "-->";
pub const OP_DOCTYPE: &str = "<!DOCTYPE";

/// Longest begin delimiter probed when recognizing a foreign block
pub const BLOCK_LOOKAHEAD: usize = 16;
/// Longest named entity considered
pub const ENTITY_NAME_CAPACITY: usize = 32;
pub const HEX_DIGIT_CAPACITY: usize = 8;
pub const DECIMAL_DIGIT_CAPACITY: usize = 10;
/// Longest tag or attribute name
pub const NAME_CAPACITY: usize = 64;

/// Tags whose content is raw text
pub const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// One begin/end pair of a foreign block family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    pub begin: &'static str,
    pub end: &'static str,
}

impl Delimiters {
    const fn new(begin: &'static str, end: &'static str) -> Self {
        Self { begin, end }
    }
}

// ASP/JSP/ERB family
pub const CODE_COMMENT: Delimiters = Delimiters::new("<%--", "--%>");
pub const CODE_BLOCK: Delimiters = Delimiters::new("<%", "%>");
/// Suffixes after `<%`: directive, expression, declaration, data-bind, extension, encoded expression
pub const CODE_BLOCK_MARKERS: &[char] = &['@', '=', '!', '#', '$', ':'];

// SGML family
pub const CONDITIONAL_COMMENT: Delimiters = Delimiters::new("<!--[", "]>");
pub const COMMENT: Delimiters = Delimiters::new(OP_COMMENT, OP_COMMENT_END);
/// Unwrapped into plain text wherever it appears
pub const CDATA: Delimiters = Delimiters::new("<![CDATA[", "]]>");
pub const CONDITIONAL_REVEALED: Delimiters = Delimiters::new("<![", ">");
pub const DECLARATION: Delimiters = Delimiters::new("<!", ">");

// PHP / XML processing instructions
pub const PHP_EXPRESSION: Delimiters = Delimiters::new("<?=", "?>");
pub const PROCESSING_INSTRUCTION: Delimiters = Delimiters::new("<?", "?>");

// T4 family
pub const T4_COMMENT: Delimiters = Delimiters::new("<#--", "--#>");
pub const T4_BLOCK: Delimiters = Delimiters::new("<#", "#>");
/// Suffixes after `<#`: directive, expression, class feature
pub const T4_BLOCK_MARKERS: &[char] = &['@', '=', '+'];
