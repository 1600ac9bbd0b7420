use crate::ast::NodeId;
use crate::parser::{Position, Token};
use std::fmt;
use std::io;
use std::sync::Arc;

/// Kind of parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Lexer latched an error token
    Syntax,
    /// Reading the source failed
    Io,
    InvalidAttribute,
    MissingAttributeName,
    MissingViewName,
    ContentOutsideView,
    /// Tree bookkeeping failed; never caused by input alone
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Syntax => "Syntax error",
            ErrorKind::Io => "I/O error",
            ErrorKind::InvalidAttribute => "Invalid attribute",
            ErrorKind::MissingAttributeName => "Missing attribute name",
            ErrorKind::MissingViewName => "Missing view name",
            ErrorKind::ContentOutsideView => "Content outside view",
            ErrorKind::Internal => "Internal error",
        }
    }
}

/// Error raised while tokenizing or building the tree
///
/// Node errors carry the offending node, token errors the offending token.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    pub position: Position,
    pub cause: Option<Arc<io::Error>>,
    pub node: Option<NodeId>,
    pub token: Option<Token>,
    pub help: Option<String>,
}

impl ParseError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            message: message.into(),
            position,
            cause: None,
            node: None,
            token: None,
            help: None,
        }
    }

    /// Error about a node; `position` is `None` for synthesized nodes
    pub fn node(kind: ErrorKind, message: impl Into<String>, node: NodeId, position: Option<Position>) -> Self {
        Self::new(kind, message, position.unwrap_or_default()).with_node(node)
    }

    /// Error about a token, positioned at the token
    pub fn token(kind: ErrorKind, message: impl Into<String>, token: Token) -> Self {
        Self::new(kind, message, token.position()).with_token(token)
    }

    pub fn with_cause(mut self, cause: Arc<io::Error>) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn with_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }

    /// Add help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render the error with source context
    pub fn render(&self, source: &str, filename: &str) -> String {
        self.render_inner(source, filename, false)
    }

    /// Render the error with ANSI color codes
    pub fn render_color(&self, source: &str, filename: &str) -> String {
        self.render_inner(source, filename, true)
    }

    fn render_inner(&self, source: &str, filename: &str, color: bool) -> String {
        let red = if color { "\x1b[1;31m" } else { "" };
        let dim = if color { "\x1b[2m" } else { "" };
        let cyan = if color { "\x1b[1;38;5;73m" } else { "" };
        let reset = if color { "\x1b[0m" } else { "" };

        let mut output = String::new();
        output.push('\n');

        let line = self.position.line + 1;
        let col = self.position.col + 1;
        output.push_str(&format!(" {}file:{} {}:{}:{}\n", dim, reset, filename, line, col));
        output.push_str(&format!("{}error:{} {}\n", red, reset, self.message));

        if let Some(source_line) = source_line(source, self.position.line) {
            let line_num_width = format!("{}", line).len().max(2);
            let shown = if color { highlight_markup(source_line) } else { source_line.to_string() };
            output.push_str(&format!("{}{:>width$} |{}\n", dim, "", reset, width = line_num_width));
            output.push_str(&format!("{}{:>width$} |{} {}\n", dim, line, reset, shown, width = line_num_width));

            let underline_len = caret_len(source_line, self.position.col);
            output.push_str(&format!(
                "{}{:>width$} |{} {}{}{}{}\n",
                dim, "", reset,
                " ".repeat(self.position.col), red, "^".repeat(underline_len), reset,
                width = line_num_width
            ));
        }

        if let Some(ref help) = self.help {
            output.push('\n');
            for (i, help_line) in help.lines().enumerate() {
                if i == 0 {
                    output.push_str(&format!(" {}help:{} {}\n", cyan, reset, help_line));
                } else {
                    output.push_str(&format!("       {}\n", help_line));
                }
            }
        }

        output.push('\n');
        output
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_deref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Error while checking one document (parsing or reading it)
#[derive(Debug)]
pub enum CompileError {
    Parse(ParseError),
    Io(io::Error),
    /// A document parsed but declared no view
    NoViews,
}

impl CompileError {
    /// Render the error with source context (no color)
    pub fn render(&self, source: &str, filename: &str) -> String {
        match self {
            CompileError::Parse(err) => err.render(source, filename),
            other => format!("\n file: {}\nerror: {}\n\n", filename, other),
        }
    }

    /// Render the error with ANSI color codes
    pub fn render_color(&self, source: &str, filename: &str) -> String {
        match self {
            CompileError::Parse(err) => err.render_color(source, filename),
            other => format!("\n \x1b[2mfile:\x1b[0m {}\n\x1b[1;31merror:\x1b[0m {}\n\n", filename, other),
        }
    }
}

impl From<ParseError> for CompileError {
    fn from(err: ParseError) -> Self {
        CompileError::Parse(err)
    }
}

impl From<io::Error> for CompileError {
    fn from(err: io::Error) -> Self {
        CompileError::Io(err)
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Parse(err) => write!(f, "{}", err),
            CompileError::Io(err) => write!(f, "I/O error: {}", err),
            CompileError::NoViews => write!(f, "Syntax error: no view found"),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Parse(err) => Some(err),
            CompileError::Io(err) => Some(err),
            CompileError::NoViews => None,
        }
    }
}

/// Line `index` (0-based) with `\r\n`, `\r` and `\n` all treated as breaks
fn source_line(source: &str, index: usize) -> Option<&str> {
    let bytes = source.as_bytes();
    let mut line = 0;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\n' || bytes[i] == b'\r' {
            if line == index {
                return Some(&source[start..i]);
            }
            if bytes[i] == b'\r' && bytes.get(i + 1) == Some(&b'\n') {
                i += 1;
            }
            line += 1;
            start = i + 1;
        }
        i += 1;
    }
    (line == index).then(|| &source[start..])
}

/// Underline the tag or block starting at `col`, else a single char
fn caret_len(line: &str, col: usize) -> usize {
    let mut rest = line.chars().skip(col).peekable();
    if rest.peek() != Some(&'<') {
        return 1;
    }
    let mut len = 0;
    for c in rest {
        len += 1;
        if c == '>' {
            break;
        }
    }
    len
}

/// Color tags and foreign blocks in a source line
fn highlight_markup(line: &str) -> String {
    const TAG: &str = "\x1b[38;5;180m";
    const BLOCK: &str = "\x1b[38;5;72m";
    const RESET: &str = "\x1b[0m";

    let mut result = String::with_capacity(line.len() * 2);
    let mut rest = line;
    while let Some(start) = rest.find('<') {
        result.push_str(&rest[..start]);
        let tail = &rest[start..];
        let (color, end) = if tail.starts_with("<%") || tail.starts_with("<#") || tail.starts_with("<?") {
            let close = &tail[1..2];
            (BLOCK, tail.find(&format!("{}>", close)).map(|i| i + 2))
        } else {
            (TAG, tail.find('>').map(|i| i + 1))
        };
        let end = end.unwrap_or(tail.len());
        result.push_str(color);
        result.push_str(&tail[..end]);
        result.push_str(RESET);
        rest = &tail[end..];
    }
    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_render_points_at_position() {
        let source = "<view name=\"a\">\n  <for bogus=\"x\">\n</view>";
        let err = ParseError::new(
            ErrorKind::InvalidAttribute,
            "Invalid attribute on FOR command: bogus",
            Position::new(18, 1, 2),
        )
        .with_help("FOR accepts each, in, count and data");
        let rendered = err.render(source, "list.duel");
        assert!(rendered.contains("file: list.duel:2:3"));
        assert!(rendered.contains("error: Invalid attribute on FOR command: bogus"));
        assert!(rendered.contains(" 2 |   <for bogus=\"x\">"));
        assert!(rendered.contains("   |   ^^^^^^^^^^^^^^^"));
        assert!(rendered.contains("help: FOR accepts each, in, count and data"));
    }

    #[test]
    fn test_render_handles_crlf_sources() {
        let source = "<view name=\"a\">\r\n<%= x\r\n";
        let err = ParseError::new(ErrorKind::Syntax, "Syntax error: Unterminated block", Position::new(17, 1, 0));
        let rendered = err.render(source, "a.duel");
        assert!(rendered.contains(" 2 | <%= x\n"));
    }

    #[test]
    fn test_render_non_ascii_line() {
        let source = "<view name=\"a\">\n<%= café";
        let err = ParseError::new(ErrorKind::Syntax, "Syntax error: Unterminated block", Position::new(16, 1, 0));
        let rendered = err.render(source, "cafe.duel");
        assert!(rendered.contains(" 2 | <%= café\n"));
        assert!(rendered.contains("   | ^^^^^^^^\n"));

        assert_eq!(caret_len("é <b>ü</b>", 2), 3);
        assert_eq!(caret_len("<ñ", 0), 2);
        assert_eq!(caret_len("ñ", 5), 1);
    }

    #[test]
    fn test_cause_is_exposed_as_source() {
        let cause = Arc::new(io::Error::new(io::ErrorKind::UnexpectedEof, "stream closed"));
        let err = ParseError::new(ErrorKind::Io, "stream closed", Position::default()).with_cause(cause);
        assert_eq!(err.source().map(|e| e.to_string()), Some("stream closed".to_string()));
        let compile: CompileError = err.into();
        assert!(compile.source().is_some());
    }

    #[test]
    fn test_compile_error_display() {
        assert_eq!(CompileError::NoViews.to_string(), "Syntax error: no view found");
        let rendered = CompileError::NoViews.render("", "empty.duel");
        assert!(rendered.contains("file: empty.duel"));
    }

    #[test]
    fn test_highlight_keeps_text() {
        let line = "a <b>c</b> <%= d %>";
        let highlighted = highlight_markup(line);
        let plain: String = highlighted.replace("\x1b[38;5;180m", "").replace("\x1b[38;5;72m", "").replace("\x1b[0m", "");
        assert_eq!(plain, line);
    }
}
