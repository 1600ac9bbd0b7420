use super::token::{AttrValue, BlockValue, Position, Token};
use crate::ast::{Ast, Block, BlockKind, CommandKind, Document, NodeId, TEST_ATTR, IF_ATTR, Value};
use crate::error::{ErrorKind, ParseError};
use crate::html::HtmlConfig;

/// Builds an AST from a token stream
///
/// Holds one token of lookahead in `next`; putting a token back is just
/// refilling that slot.
pub struct TreeBuilder<'c, I: Iterator<Item = Token>> {
    tokens: I,
    next: Option<Token>,
    document: Document,
    config: &'c HtmlConfig,
}

impl<'c, I: Iterator<Item = Token>> TreeBuilder<'c, I> {
    pub fn new(tokens: I, config: &'c HtmlConfig) -> Self {
        Self {
            tokens,
            next: None,
            document: Document::new(),
            config,
        }
    }

    pub fn build(mut self) -> Result<Ast, ParseError> {
        let root = self.document.root();
        while self.has_next() {
            self.parse_next(root)?;
        }

        let mut views = Vec::new();
        for child in self.document.children(root).to_vec() {
            if self.document.command(child) == Some(CommandKind::View) {
                self.scrub_view(child)?;
                views.push(child);
            } else if !self.document.is_whitespace_literal(child) {
                return Err(ParseError::node(
                    ErrorKind::ContentOutsideView,
                    "Content must sit within a named view.",
                    child,
                    self.document.position(child),
                )
                .with_help("Wrap markup in <view name=\"...\">...</view>"));
            }
        }

        Ok(Ast::new(self.document, views))
    }

    /// Fill the lookahead slot; false at end of input
    fn has_next(&mut self) -> bool {
        if self.next.is_none() {
            self.next = self.tokens.next();
        }
        !matches!(self.next, None | Some(Token::End { .. }))
    }

    fn put_back(&mut self, token: Token) {
        debug_assert!(self.next.is_none(), "lookahead slot already full");
        self.next = Some(token);
    }

    fn parse_next(&mut self, parent: NodeId) -> Result<(), ParseError> {
        if !self.has_next() {
            return Ok(());
        }
        let Some(token) = self.next.take() else {
            return Ok(());
        };

        match token {
            Token::Literal { text, position } => {
                self.parse_literal(parent, text, position);
                Ok(())
            }
            Token::ElementBegin { name, position } => self.parse_element(parent, &name, position),
            Token::ElementEnd { ref name, .. } => {
                // Hand the close back to whichever element it belongs to
                if self.document.element(parent).is_some() && self.document.is_ancestor_or_self(parent, name) {
                    self.put_back(token);
                }
                Ok(())
            }
            Token::Block { block, position } => {
                let node = self.document.create_block(block_node(block), Some(position));
                self.document.append_child(parent, node);
                Ok(())
            }
            Token::Error { ref message, .. } => {
                let message = format!("Syntax error: {}", message);
                Err(ParseError::token(ErrorKind::Syntax, message, token))
            }
            Token::AttributeName { .. } | Token::AttributeValue { .. } => {
                let message = format!("Invalid token: {}", token);
                Err(ParseError::token(ErrorKind::Syntax, message, token))
            }
            Token::End { .. } => {
                self.put_back(token);
                Ok(())
            }
        }
    }

    /// Merge into a trailing literal of the content target, else append
    fn parse_literal(&mut self, parent: NodeId, text: String, position: Position) {
        let target = self.document.content_target(parent);
        if let Some(last) = self.document.last_child(target) {
            if self.document.append_text(last, &text) {
                return;
            }
        }

        let literal = self.document.create_literal(text, Some(position));
        self.document.append_child(parent, literal);
    }

    fn parse_element(&mut self, parent: NodeId, tag: &str, position: Position) -> Result<(), ParseError> {
        let element = self.document.create_element(tag, Some(position), self.config);
        self.document.append_child(parent, element);

        let mut attr_name: Option<String> = None;

        while self.has_next() {
            let Some(token) = self.next.take() else {
                break;
            };

            match token {
                Token::AttributeName { name, position } => {
                    self.document.set_attribute(element, &name, None, Some(position))?;
                    attr_name = Some(name);
                }
                Token::AttributeValue { ref value, position } => {
                    let Some(name) = attr_name.take() else {
                        return Err(ParseError::token(
                            ErrorKind::MissingAttributeName,
                            "Attribute name was missing",
                            token,
                        ));
                    };
                    let value = match value {
                        AttrValue::Text { text } => Value::Literal(text.clone()),
                        AttrValue::Block { block } => Value::Block(block_node(block.clone())),
                    };
                    self.document.set_attribute(element, &name, Some(value), Some(position))?;
                }
                Token::ElementEnd { ref name, .. } => {
                    let tag = name.to_ascii_lowercase();
                    if self.document.is_self(element, &tag) {
                        return self.rewrite_conditional(element);
                    }
                    if self.document.is_ancestor(element, &tag) {
                        self.put_back(token);
                        return self.rewrite_conditional(element);
                    }
                    // stray close tag
                }
                token => {
                    if !self.document.can_have_children(element) {
                        self.put_back(token);
                        return self.rewrite_conditional(element);
                    }

                    if self.starts_next_case(element, &token) {
                        self.put_back(token);
                        return Ok(());
                    }

                    self.put_back(token);
                    self.parse_next(element)?;
                }
            }
        }

        self.rewrite_conditional(element)
    }

    /// An `<else>` inside an IF branch closes that branch
    fn starts_next_case(&self, element: NodeId, token: &Token) -> bool {
        let Token::ElementBegin { name, .. } = token else {
            return false;
        };

        name.eq_ignore_ascii_case(CommandKind::If.ext_name())
            && self.document.command(element) == Some(CommandKind::If)
            && self
                .document
                .parent(element)
                .is_some_and(|parent| self.document.command(parent) == Some(CommandKind::Xor))
    }

    /// Move an `if` attribute into an IF wrapper around the element
    fn rewrite_conditional(&mut self, element: NodeId) -> Result<(), ParseError> {
        let takes_conditional = self
            .document
            .element_kind(element)
            .is_some_and(|kind| kind.takes_conditional());
        if !takes_conditional {
            return Ok(());
        }

        let Some(attr) = self.document.remove_attribute(element, IF_ATTR) else {
            return Ok(());
        };

        let position = attr.value.as_ref().and(attr.position).or(self.document.position(element));
        let wrapper = self.document.create_command(CommandKind::If, position);
        self.document.set_attribute(wrapper, TEST_ATTR, attr.value, attr.position)?;

        let replaced = match self.document.parent(element) {
            Some(parent) => self.document.replace_child(parent, wrapper, Some(element)),
            None => false,
        };
        if !replaced {
            return Err(ParseError::node(
                ErrorKind::Internal,
                "Conditional rewrite failed",
                element,
                self.document.position(element),
            ));
        }

        self.document.append_child(wrapper, element);
        Ok(())
    }

    fn scrub_view(&mut self, view: NodeId) -> Result<(), ParseError> {
        let named = self
            .document
            .node(view)
            .view_name()
            .is_some_and(|name| !name.is_empty());
        if !named {
            return Err(ParseError::node(
                ErrorKind::MissingViewName,
                "View is missing name attribute",
                view,
                self.document.position(view),
            )
            .with_help("Add a name: <view name=\"Example\">"));
        }

        if let Some(last) = self.document.last_child(view) {
            if self.document.is_whitespace_literal(last) {
                self.document.remove_child(view, last);
            }
        }
        if let Some(first) = self.document.first_child(view) {
            if self.document.is_whitespace_literal(first) {
                self.document.remove_child(view, first);
            }
        }

        Ok(())
    }
}

/// Block factory, keyed on the begin delimiter
pub fn block_node(block: BlockValue) -> Block {
    let kind = match block.begin.as_str() {
        "<%=" => BlockKind::Expression,
        "<%" => BlockKind::Statement,
        "<%#" => BlockKind::MarkupExpression,
        "<!--" => BlockKind::Comment,
        "<%--" => BlockKind::CodeComment,
        begin if begin.eq_ignore_ascii_case("<!doctype") => BlockKind::DocType,
        _ => return Block::new(BlockKind::Unknown, block.to_string()),
    };
    Block::new(kind, block.value)
}
