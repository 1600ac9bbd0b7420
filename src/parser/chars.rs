//! Character classes used by the lexer.
//!
//! Names follow the XML `Name` production; attribute names follow the looser
//! HTML5 attribute rules.

pub fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\u{000C}')
}

pub fn is_whitespace_str(text: &str) -> bool {
    text.chars().all(is_whitespace)
}

pub fn is_letter(ch: char) -> bool {
    ch.is_ascii_alphabetic()
}

pub fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

pub fn is_hex_digit(ch: char) -> bool {
    ch.is_ascii_hexdigit()
}

/// HTML name start char
/// http://www.w3.org/TR/xml/#sec-common-syn
pub fn is_name_start_char(ch: char) -> bool {
    matches!(ch,
        'a'..='z'
        | 'A'..='Z'
        | ':'
        | '_'
        | '\u{00C0}'..='\u{00D6}'
        | '\u{00D8}'..='\u{00F6}'
        | '\u{00F8}'..='\u{02FF}'
        | '\u{0370}'..='\u{037D}'
        | '\u{037F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
    )
}

/// HTML name char
pub fn is_name_char(ch: char) -> bool {
    is_name_start_char(ch)
        || matches!(ch,
            '0'..='9'
            | '-'
            | '.'
            | '\u{00B7}'
            | '\u{0300}'..='\u{036F}'
            | '\u{203F}'..='\u{2040}'
        )
}

/// HTML attribute name char
/// http://www.w3.org/TR/html5/syntax.html#attributes-0
pub fn is_attr_name_char(ch: char) -> bool {
    match ch {
        '\0' | '"' | '\'' | '>' | '/' | '=' => false,
        _ => !is_whitespace(ch) && !is_unsafe(ch),
    }
}

/// Control chars and permanently undefined code points
fn is_unsafe(ch: char) -> bool {
    matches!(ch,
        '\u{007F}'..='\u{0084}'
        | '\u{0086}'..='\u{009F}'
        | '\u{FDD0}'..='\u{FDEF}'
    )
}
