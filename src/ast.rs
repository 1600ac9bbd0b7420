//! Arena syntax tree.
//!
//! Every node of one parse lives in a single `Document`, addressed by
//! `NodeId`. Containers own ordered child ids; each node records the
//! container currently holding it. Structural redirections (XOR branches,
//! CALL default parts, IF chains) happen inside `Document::append_child`.

use crate::error::{ErrorKind, ParseError};
use crate::html::{HtmlConfig, META_KEY_ATTRIBUTES};
use crate::parser::Position;
use crate::parser::chars::is_whitespace_str;
use crate::parser::grammar::RAW_TEXT_TAGS;
use indexmap::IndexMap;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::fmt;

/// Conditional attribute on plain elements and ELSE branches
pub const IF_ATTR: &str = "if";
/// Normalized conditional attribute on IF
pub const TEST_ATTR: &str = "test";
pub const NAME_ATTR: &str = "name";
pub const DEFER_ATTR: &str = "defer";
pub const CLIENT_ONLY_ATTR: &str = "client-only";
pub const SERVER_ONLY_ATTR: &str = "server-only";

const FOR_ATTRIBUTES: &[&str] = &["each", "in", "count", "data"];
const CALL_ATTRIBUTES: &[&str] = &["view", "data", "index", "count", "key", IF_ATTR];
const META_CONTENT_ATTR: &str = "content";

/// Index of a node within its `Document`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Kind of foreign block kept in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Expression,
    MarkupExpression,
    Statement,
    CodeComment,
    Comment,
    DocType,
    /// Unrecognized delimiters; the value holds the verbatim text
    Unknown,
}

impl BlockKind {
    pub fn begin(self) -> &'static str {
        match self {
            BlockKind::Expression => "<%=",
            BlockKind::MarkupExpression => "<%#",
            BlockKind::Statement => "<%",
            BlockKind::CodeComment => "<%--",
            BlockKind::Comment => "<!--",
            BlockKind::DocType => "<!DOCTYPE",
            BlockKind::Unknown => "",
        }
    }

    pub fn end(self) -> &'static str {
        match self {
            BlockKind::Expression | BlockKind::MarkupExpression | BlockKind::Statement => "%>",
            BlockKind::CodeComment => "--%>",
            BlockKind::Comment => "-->",
            BlockKind::DocType => ">",
            BlockKind::Unknown => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Block {
    pub kind: BlockKind,
    pub value: String,
}

impl Block {
    pub fn new(kind: BlockKind, value: impl Into<String>) -> Self {
        Self { kind, value: value.into() }
    }

    pub fn expression(value: impl Into<String>) -> Self {
        Self::new(BlockKind::Expression, value)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            BlockKind::DocType if !self.value.is_empty() => {
                write!(f, "{} {}{}", self.kind.begin(), self.value, self.kind.end())
            }
            kind => write!(f, "{}{}{}", kind.begin(), self.value, kind.end()),
        }
    }
}

/// Attribute value: literal text or a foreign block
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Value {
    Literal(String),
    Block(Block),
}

impl Value {
    pub fn literal(text: impl Into<String>) -> Self {
        Value::Literal(text.into())
    }

    pub fn expression(text: impl Into<String>) -> Self {
        Value::Block(Block::expression(text))
    }

    /// Literal text becomes an expression; blocks are kept
    pub fn promoted(self) -> Self {
        match self {
            Value::Literal(text) => Value::expression(text),
            block => block,
        }
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Value::Literal(text) => Some(text),
            Value::Block(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Literal(text) => write!(f, "{}", text),
            Value::Block(block) => write!(f, "{}", block),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub value: Option<Value>,
    pub position: Option<Position>,
}

impl Attribute {
    pub fn new(value: Option<Value>, position: Option<Position>) -> Self {
        Self { value, position }
    }
}

/// Name/value pair for building elements directly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePair {
    pub name: String,
    pub value: Option<Value>,
}

impl AttributePair {
    pub fn new(name: impl Into<String>, value: Option<Value>) -> Self {
        Self { name: name.into(), value }
    }
}

/// The six control tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    For,
    If,
    Xor,
    Call,
    Part,
    View,
}

impl CommandKind {
    pub const ALL: [CommandKind; 6] = [
        CommandKind::For,
        CommandKind::If,
        CommandKind::Xor,
        CommandKind::Call,
        CommandKind::Part,
        CommandKind::View,
    ];

    /// Internal name
    pub fn name(self) -> &'static str {
        match self {
            CommandKind::For => "$for",
            CommandKind::If => "$if",
            CommandKind::Xor => "$xor",
            CommandKind::Call => "$call",
            CommandKind::Part => "$part",
            CommandKind::View => "$view",
        }
    }

    /// Source tag: `if` opens a XOR chain, `else` adds a branch
    pub fn ext_name(self) -> &'static str {
        match self {
            CommandKind::For => "for",
            CommandKind::If => "else",
            CommandKind::Xor => "if",
            CommandKind::Call => "call",
            CommandKind::Part => "part",
            CommandKind::View => "view",
        }
    }

    pub fn from_ext_name(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.ext_name().eq_ignore_ascii_case(tag))
    }

    /// Tag stored on the element
    pub fn tag(self) -> &'static str {
        match self {
            CommandKind::View => "view",
            command => command.name(),
        }
    }

    /// Attribute values are code: literals are promoted to expressions
    fn code_attributes(self) -> bool {
        matches!(self, CommandKind::For | CommandKind::If | CommandKind::Xor | CommandKind::Call)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Html,
    /// `<meta>`, with URL detection on `content`
    Meta,
    For,
    If,
    Xor { last_case: Option<NodeId> },
    Call { default_part: Option<NodeId>, defer: bool },
    Part { name: String },
    View { name: Option<String>, client_only: bool, server_only: bool },
}

impl ElementKind {
    pub fn for_command(command: CommandKind) -> Self {
        match command {
            CommandKind::For => ElementKind::For,
            CommandKind::If => ElementKind::If,
            CommandKind::Xor => ElementKind::Xor { last_case: None },
            CommandKind::Call => ElementKind::Call { default_part: None, defer: false },
            CommandKind::Part => ElementKind::Part { name: String::new() },
            CommandKind::View => ElementKind::View { name: None, client_only: false, server_only: false },
        }
    }

    pub fn command(&self) -> Option<CommandKind> {
        match self {
            ElementKind::Html | ElementKind::Meta => None,
            ElementKind::For => Some(CommandKind::For),
            ElementKind::If => Some(CommandKind::If),
            ElementKind::Xor { .. } => Some(CommandKind::Xor),
            ElementKind::Call { .. } => Some(CommandKind::Call),
            ElementKind::Part { .. } => Some(CommandKind::Part),
            ElementKind::View { .. } => Some(CommandKind::View),
        }
    }

    /// Elements whose `if` attribute is rewritten into an IF wrapper
    pub fn takes_conditional(&self) -> bool {
        matches!(self, ElementKind::Html | ElementKind::Meta | ElementKind::For | ElementKind::Call { .. })
    }

    /// Equality ignoring XOR/CALL bookkeeping ids
    fn same_state(&self, other: &ElementKind) -> bool {
        match (self, other) {
            (ElementKind::Xor { .. }, ElementKind::Xor { .. }) => true,
            (ElementKind::Call { defer: a, .. }, ElementKind::Call { defer: b, .. }) => a == b,
            _ => self == other,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub kind: ElementKind,
    pub attributes: IndexMap<String, Attribute>,
    pub children: Vec<NodeId>,
    pub void: bool,
    /// Tag may carry URL attributes
    pub linkable: bool,
}

impl Element {
    fn new(tag: String, kind: ElementKind, config: Option<&HtmlConfig>) -> Self {
        let plain = kind.command().is_none();
        let void = plain && config.is_some_and(|c| c.is_void_tag(&tag));
        let linkable = plain && config.is_some_and(|c| c.is_link_tag(&tag));
        Self {
            tag,
            kind,
            attributes: IndexMap::new(),
            children: Vec::new(),
            void,
            linkable,
        }
    }

    pub fn attribute_value(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name).and_then(|attr| attr.value.as_ref())
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Synthetic document container
    Root { children: Vec<NodeId> },
    Literal(String),
    Element(Element),
    Block(Block),
}

#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    position: Option<Position>,
    parent: Option<NodeId>,
}

impl Node {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// Node storage for one parse
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Root { children: Vec::new() },
                position: Some(Position::default()),
                parent: None,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { doc: self, id }
    }

    fn slot(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn slot_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn alloc(&mut self, kind: NodeKind, position: Option<Position>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { kind, position, parent: None });
        id
    }

    // === Creation ===

    pub fn create_literal(&mut self, text: impl Into<String>, position: Option<Position>) -> NodeId {
        self.alloc(NodeKind::Literal(text.into()), position)
    }

    pub fn create_block(&mut self, block: Block, position: Option<Position>) -> NodeId {
        self.alloc(NodeKind::Block(block), position)
    }

    /// Element factory: control tags become commands, everything else a lower-cased element
    pub fn create_element(&mut self, tag: &str, position: Option<Position>, config: &HtmlConfig) -> NodeId {
        if let Some(command) = CommandKind::from_ext_name(tag) {
            return self.create_command(command, position);
        }

        let tag = tag.to_ascii_lowercase();
        let kind = if tag == "meta" { ElementKind::Meta } else { ElementKind::Html };
        let element = Element::new(tag, kind, Some(config));
        self.alloc(NodeKind::Element(element), position)
    }

    pub fn create_command(&mut self, command: CommandKind, position: Option<Position>) -> NodeId {
        let mut element = Element::new(command.tag().to_string(), ElementKind::for_command(command), None);
        if command == CommandKind::Part {
            element
                .attributes
                .insert(NAME_ATTR.to_string(), Attribute::new(Some(Value::literal("")), position));
        }
        self.alloc(NodeKind::Element(element), position)
    }

    // === Queries ===

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.slot(id).kind
    }

    pub fn position(&self, id: NodeId) -> Option<Position> {
        self.slot(id).position
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.slot(id).kind {
            NodeKind::Root { children } => children,
            NodeKind::Element(element) => &element.children,
            NodeKind::Literal(_) | NodeKind::Block(_) => &[],
        }
    }

    fn children_mut(&mut self, id: NodeId) -> Option<&mut Vec<NodeId>> {
        match &mut self.slot_mut(id).kind {
            NodeKind::Root { children } => Some(children),
            NodeKind::Element(element) => Some(&mut element.children),
            NodeKind::Literal(_) | NodeKind::Block(_) => None,
        }
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.slot(id).kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.slot_mut(id).kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_kind(&self, id: NodeId) -> Option<&ElementKind> {
        self.element(id).map(|element| &element.kind)
    }

    pub fn command(&self, id: NodeId) -> Option<CommandKind> {
        self.element_kind(id).and_then(ElementKind::command)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.slot(id).kind {
            NodeKind::Literal(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_whitespace_literal(&self, id: NodeId) -> bool {
        self.text(id).is_some_and(is_whitespace_str)
    }

    /// Concatenate onto a literal; false when `id` is not a literal
    pub fn append_text(&mut self, id: NodeId, more: &str) -> bool {
        match &mut self.slot_mut(id).kind {
            NodeKind::Literal(text) => {
                text.push_str(more);
                true
            }
            _ => false,
        }
    }

    pub fn can_have_children(&self, id: NodeId) -> bool {
        match &self.slot(id).kind {
            NodeKind::Root { .. } => true,
            NodeKind::Element(element) => !element.void,
            NodeKind::Literal(_) | NodeKind::Block(_) => false,
        }
    }

    /// Container a plain (non-IF, non-PART) child of `parent` ends up in
    pub fn content_target(&self, parent: NodeId) -> NodeId {
        match self.element_kind(parent) {
            Some(ElementKind::Xor { last_case: Some(case) }) => *case,
            Some(ElementKind::Call { default_part: Some(part), .. }) => *part,
            _ => parent,
        }
    }

    pub fn is_self(&self, id: NodeId, tag: &str) -> bool {
        match self.element(id) {
            Some(element) => match element.kind.command() {
                Some(command) => command.ext_name().eq_ignore_ascii_case(tag) || command.name().eq_ignore_ascii_case(tag),
                None => element.tag.eq_ignore_ascii_case(tag),
            },
            None => false,
        }
    }

    pub fn is_ancestor(&self, id: NodeId, tag: &str) -> bool {
        let mut current = self.parent(id);
        while let Some(ancestor) = current {
            if self.is_self(ancestor, tag) {
                return true;
            }
            current = self.parent(ancestor);
        }
        false
    }

    pub fn is_ancestor_or_self(&self, id: NodeId, tag: &str) -> bool {
        self.is_self(id, tag) || self.is_ancestor(id, tag)
    }

    /// URL-bearing attribute, including `<meta content>` for known link properties
    pub fn is_link_attribute(&self, id: NodeId, name: &str, config: &HtmlConfig) -> bool {
        let Some(element) = self.element(id) else {
            return false;
        };

        if element.kind == ElementKind::Meta
            && name.eq_ignore_ascii_case(META_CONTENT_ATTR)
            && meta_content_is_link(element, config)
        {
            return true;
        }

        element.linkable && config.is_link_attr(name)
    }

    // === Mutation ===

    /// Append with XOR, CALL and IF redirection
    ///
    /// Returns the container that received the child, or `None` when the
    /// child was dropped (leading whitespace inside a CALL).
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Option<NodeId> {
        let child_command = self.command(child);

        match self.command(parent) {
            Some(CommandKind::Xor) => {
                if child_command == Some(CommandKind::If) {
                    self.attach(parent, child)?;
                    self.set_last_case(parent, Some(child));
                    Some(parent)
                } else {
                    let case = self.current_case(parent);
                    self.attach(case, child)
                }
            }
            Some(CommandKind::Call) => {
                if child_command == Some(CommandKind::Part) {
                    return self.attach(parent, child);
                }
                let part = match self.default_part(parent) {
                    Some(part) => part,
                    None if self.is_whitespace_literal(child) => return None,
                    None => self.create_default_part(parent),
                };
                self.append_child(part, child)
            }
            _ if child_command == Some(CommandKind::If) => {
                let xor = match self.last_child(parent) {
                    Some(last) if self.command(last) == Some(CommandKind::Xor) => last,
                    _ => {
                        let position = self.position(child);
                        let xor = self.create_command(CommandKind::Xor, position);
                        self.attach(parent, xor)?;
                        xor
                    }
                };
                self.append_child(xor, child)
            }
            _ => self.attach(parent, child),
        }
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(children) = self.children_mut(parent) else {
            return false;
        };
        let Some(index) = children.iter().position(|&id| id == child) else {
            return false;
        };

        children.remove(index);
        self.slot_mut(child).parent = None;
        self.refresh_bookkeeping(parent);
        true
    }

    /// Replace `old` in place; a missing `old` appends
    pub fn replace_child(&mut self, parent: NodeId, new: NodeId, old: Option<NodeId>) -> bool {
        let Some(old) = old else {
            return self.append_child(parent, new).is_some();
        };

        if !self.children(parent).contains(&old) {
            // CALL content sits in its default part
            return match self.default_part(parent) {
                Some(part) => self.replace_child(part, new, Some(old)),
                None => false,
            };
        }

        if let Some(previous) = self.parent(new) {
            self.remove_child(previous, new);
        }

        let Some(children) = self.children_mut(parent) else {
            return false;
        };
        let Some(index) = children.iter().position(|&id| id == old) else {
            return false;
        };

        children[index] = new;
        self.slot_mut(new).parent = Some(parent);
        self.slot_mut(old).parent = None;
        self.refresh_bookkeeping(parent);
        true
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) -> Option<NodeId> {
        debug_assert!(self.can_have_children(parent), "void element cannot take children");

        if let Some(previous) = self.parent(child) {
            self.remove_child(previous, child);
        }
        self.children_mut(parent)?.push(child);
        self.slot_mut(child).parent = Some(parent);
        Some(parent)
    }

    /// Current IF branch of a XOR, created on first use
    fn current_case(&mut self, xor: NodeId) -> NodeId {
        if let Some(ElementKind::Xor { last_case: Some(case) }) = self.element_kind(xor) {
            return *case;
        }

        let position = self.position(xor);
        let case = self.create_command(CommandKind::If, position);
        self.attach(xor, case);
        self.set_last_case(xor, Some(case));
        case
    }

    fn set_last_case(&mut self, xor: NodeId, case: Option<NodeId>) {
        if let Some(ElementKind::Xor { last_case }) = self.element_mut(xor).map(|e| &mut e.kind) {
            *last_case = case;
        }
    }

    fn default_part(&self, call: NodeId) -> Option<NodeId> {
        match self.element_kind(call) {
            Some(ElementKind::Call { default_part, .. }) => *default_part,
            _ => None,
        }
    }

    fn create_default_part(&mut self, call: NodeId) -> NodeId {
        let position = self.position(call);
        let part = self.create_command(CommandKind::Part, position);
        self.attach(call, part);
        if let Some(ElementKind::Call { default_part, .. }) = self.element_mut(call).map(|e| &mut e.kind) {
            *default_part = Some(part);
        }
        part
    }

    /// Re-point XOR/CALL bookkeeping after children were removed or swapped
    fn refresh_bookkeeping(&mut self, parent: NodeId) {
        match self.command(parent) {
            Some(CommandKind::Xor) => {
                let last_if = self
                    .children(parent)
                    .iter()
                    .rev()
                    .copied()
                    .find(|&child| self.command(child) == Some(CommandKind::If));
                self.set_last_case(parent, last_if);
            }
            Some(CommandKind::Call) => {
                let stale = self
                    .default_part(parent)
                    .is_some_and(|part| self.parent(part) != Some(parent));
                if stale {
                    if let Some(ElementKind::Call { default_part, .. }) = self.element_mut(parent).map(|e| &mut e.kind) {
                        *default_part = None;
                    }
                }
            }
            _ => {}
        }
    }

    // === Attributes ===

    /// Set an attribute, validating command attributes
    ///
    /// Attributes set on a XOR land on its current IF branch.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: Option<Value>,
        position: Option<Position>,
    ) -> Result<(), ParseError> {
        let target = if self.command(id) == Some(CommandKind::Xor) { self.current_case(id) } else { id };
        let at = position.or(self.position(target));
        let invalid = |message: String| ParseError::node(ErrorKind::InvalidAttribute, message, target, at);

        let Some(element) = self.element_mut(target) else {
            return Err(ParseError::node(
                ErrorKind::Internal,
                format!("Attribute set on a non-element node: {}", name),
                target,
                at,
            ));
        };

        let lowered = name.to_ascii_lowercase();
        let value = match element.kind.command() {
            Some(command) if command.code_attributes() => value.map(Value::promoted),
            _ => value,
        };

        match &mut element.kind {
            ElementKind::Html | ElementKind::Meta => {
                element.attributes.insert(name.to_string(), Attribute::new(value, position));
            }
            ElementKind::For => {
                if !FOR_ATTRIBUTES.contains(&lowered.as_str()) {
                    return Err(invalid(format!("Invalid attribute on FOR command: {}", name)));
                }
                element.attributes.insert(lowered, Attribute::new(value, position));
            }
            ElementKind::If => {
                if lowered != TEST_ATTR && lowered != IF_ATTR {
                    return Err(invalid(format!("Attribute invalid on IF/ELSE command: {}", name)));
                }
                element.attributes.insert(TEST_ATTR.to_string(), Attribute::new(value, position));
            }
            ElementKind::Xor { .. } => {
                return Err(ParseError::node(
                    ErrorKind::Internal,
                    format!("XOR cannot hold attribute: {}", name),
                    target,
                    at,
                ));
            }
            ElementKind::Call { defer, .. } => {
                if lowered == DEFER_ATTR {
                    *defer = true;
                    return Ok(());
                }
                if !CALL_ATTRIBUTES.contains(&lowered.as_str()) {
                    return Err(invalid(format!("Attribute invalid on CALL command: {}", name)));
                }
                element.attributes.insert(lowered, Attribute::new(value, position));
            }
            ElementKind::Part { name: part_name } => {
                if lowered != NAME_ATTR {
                    return Err(invalid(format!("Attribute invalid on PART declaration: {}", name)));
                }
                let text = match value {
                    None => String::new(),
                    Some(Value::Literal(text)) => text,
                    Some(Value::Block(_)) => return Err(invalid("PART name must be a string literal".to_string())),
                };
                part_name.clone_from(&text);
                element
                    .attributes
                    .insert(NAME_ATTR.to_string(), Attribute::new(Some(Value::Literal(text)), position));
            }
            ElementKind::View { name: view_name, client_only, server_only } => match lowered.as_str() {
                NAME_ATTR => match value {
                    None => *view_name = None,
                    Some(Value::Literal(text)) => *view_name = Some(text),
                    Some(Value::Block(_)) => return Err(invalid("VIEW name must be a string literal".to_string())),
                },
                CLIENT_ONLY_ATTR => *client_only = true,
                SERVER_ONLY_ATTR => *server_only = true,
                _ => return Err(invalid(format!("Attribute invalid on VIEW declaration: {}", name))),
            },
        }

        Ok(())
    }

    pub fn add_attributes(
        &mut self,
        id: NodeId,
        pairs: impl IntoIterator<Item = AttributePair>,
    ) -> Result<(), ParseError> {
        for pair in pairs {
            self.set_attribute(id, &pair.name, pair.value, None)?;
        }
        Ok(())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&Attribute> {
        self.element(id)?.attributes.get(name)
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<Attribute> {
        self.element_mut(id)?.attributes.shift_remove(name)
    }
}

/// `content` is a link when the first present key attribute names a known link property
fn meta_content_is_link(element: &Element, config: &HtmlConfig) -> bool {
    let found = META_KEY_ATTRIBUTES
        .iter()
        .find_map(|&key| element.attribute_value(key).map(|value| (key, value)));

    match found {
        Some((key, Value::Literal(property))) => config
            .meta_link_key(property)
            .is_some_and(|expected| expected.eq_ignore_ascii_case(key)),
        _ => false,
    }
}

/// Parsed document: the arena plus its views in source order
#[derive(Debug, Clone)]
pub struct Ast {
    pub document: Document,
    pub views: Vec<NodeId>,
}

impl Ast {
    pub fn new(document: Document, views: Vec<NodeId>) -> Self {
        Self { document, views }
    }

    pub fn views(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.views.iter().map(|&id| self.document.node(id))
    }

    pub fn view(&self, name: &str) -> Option<NodeRef<'_>> {
        self.views().find(|view| view.view_name() == Some(name))
    }
}

impl PartialEq for Ast {
    fn eq(&self, other: &Self) -> bool {
        self.views().eq(other.views())
    }
}

impl Serialize for Ast {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.views())
    }
}

/// Read handle on one node
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'a Document {
        self.doc
    }

    pub fn kind(&self) -> &'a NodeKind {
        self.doc.kind(self.id)
    }

    pub fn position(&self) -> Option<Position> {
        self.doc.position(self.id)
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.doc.parent(self.id).map(|id| self.doc.node(id))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let doc = self.doc;
        doc.children(self.id).iter().map(move |&id| doc.node(id))
    }

    pub fn first_child(&self) -> Option<NodeRef<'a>> {
        self.doc.first_child(self.id).map(|id| self.doc.node(id))
    }

    pub fn last_child(&self) -> Option<NodeRef<'a>> {
        self.doc.last_child(self.id).map(|id| self.doc.node(id))
    }

    pub fn child_count(&self) -> usize {
        self.doc.children(self.id).len()
    }

    pub fn element(&self) -> Option<&'a Element> {
        self.doc.element(self.id)
    }

    pub fn element_kind(&self) -> Option<&'a ElementKind> {
        self.doc.element_kind(self.id)
    }

    pub fn command(&self) -> Option<CommandKind> {
        self.doc.command(self.id)
    }

    pub fn tag(&self) -> Option<&'a str> {
        self.element().map(|element| element.tag.as_str())
    }

    pub fn attributes(&self) -> Option<&'a IndexMap<String, Attribute>> {
        self.element().map(|element| &element.attributes)
    }

    pub fn attribute(&self, name: &str) -> Option<&'a Attribute> {
        self.doc.attribute(self.id, name)
    }

    pub fn text(&self) -> Option<&'a str> {
        self.doc.text(self.id)
    }

    pub fn block(&self) -> Option<&'a Block> {
        match self.kind() {
            NodeKind::Block(block) => Some(block),
            _ => None,
        }
    }

    pub fn view_name(&self) -> Option<&'a str> {
        match self.element_kind()? {
            ElementKind::View { name, .. } => name.as_deref(),
            _ => None,
        }
    }

    pub fn part_name(&self) -> Option<&'a str> {
        match self.element_kind()? {
            ElementKind::Part { name } => Some(name),
            _ => None,
        }
    }

    pub fn is_defer(&self) -> bool {
        matches!(self.element_kind(), Some(ElementKind::Call { defer: true, .. }))
    }

    pub fn is_client_only(&self) -> bool {
        matches!(self.element_kind(), Some(ElementKind::View { client_only: true, .. }))
    }

    pub fn is_server_only(&self) -> bool {
        matches!(self.element_kind(), Some(ElementKind::View { server_only: true, .. }))
    }

    pub fn is_link_attribute(&self, name: &str, config: &HtmlConfig) -> bool {
        self.doc.is_link_attribute(self.id, name, config)
    }
}

impl<'a, 'b> PartialEq<NodeRef<'b>> for NodeRef<'a> {
    fn eq(&self, other: &NodeRef<'b>) -> bool {
        match (self.kind(), other.kind()) {
            (NodeKind::Root { .. }, NodeKind::Root { .. }) => self.children().eq(other.children()),
            (NodeKind::Literal(a), NodeKind::Literal(b)) => a == b,
            (NodeKind::Block(a), NodeKind::Block(b)) => a == b,
            (NodeKind::Element(a), NodeKind::Element(b)) => {
                a.tag == b.tag
                    && a.kind.same_state(&b.kind)
                    && a.attributes.len() == b.attributes.len()
                    && a.attributes
                        .iter()
                        .all(|(name, attr)| b.attributes.get(name).is_some_and(|other| other.value == attr.value))
                    && self.children().eq(other.children())
            }
            _ => false,
        }
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("source", &self.to_string())
            .finish()
    }
}

impl fmt::Display for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            NodeKind::Root { .. } => self.children().try_for_each(|child| write!(f, "{}", child)),
            NodeKind::Literal(text) => {
                let raw = self.parent().and_then(|p| p.tag()).is_some_and(|tag| RAW_TEXT_TAGS.contains(&tag));
                if raw {
                    write!(f, "{}", text)
                } else {
                    write!(f, "{}", Escaped { text, in_attribute: false })
                }
            }
            NodeKind::Block(block) => write!(f, "{}", block),
            NodeKind::Element(element) => {
                write!(f, "<{}", element.tag)?;

                if let ElementKind::View { name, client_only, server_only } = &element.kind {
                    if let Some(name) = name.as_deref().filter(|name| !name.is_empty()) {
                        write!(f, " name=\"{}\"", Escaped { text: name, in_attribute: true })?;
                    }
                    if *client_only {
                        write!(f, " {}", CLIENT_ONLY_ATTR)?;
                    }
                    if *server_only {
                        write!(f, " {}", SERVER_ONLY_ATTR)?;
                    }
                } else {
                    for (name, attr) in &element.attributes {
                        match &attr.value {
                            Some(Value::Literal(text)) => {
                                write!(f, " {}=\"{}\"", name, Escaped { text, in_attribute: true })?
                            }
                            Some(Value::Block(block)) => write!(f, " {}=\"{}\"", name, block)?,
                            None => write!(f, " {}", name)?,
                        }
                    }
                    if let ElementKind::Call { defer: true, .. } = element.kind {
                        write!(f, " {}", DEFER_ATTR)?;
                    }
                }

                if element.children.is_empty() {
                    return write!(f, " />");
                }

                write!(f, ">")?;
                for child in self.children() {
                    write!(f, "{}", child)?;
                }
                write!(f, "</{}>", element.tag)
            }
        }
    }
}

/// Markup-significant characters as entity references
struct Escaped<'a> {
    text: &'a str,
    in_attribute: bool,
}

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.text;
        while let Some(index) = rest.find(|c| c == '&' || c == '<' || (self.in_attribute && c == '"')) {
            f.write_str(&rest[..index])?;
            f.write_str(match &rest[index..index + 1] {
                "&" => "&amp;",
                "<" => "&lt;",
                _ => "&quot;",
            })?;
            rest = &rest[index + 1..];
        }
        f.write_str(rest)
    }
}

struct Children<'a>(NodeRef<'a>);

impl Serialize for Children<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.children())
    }
}

struct Attributes<'a>(&'a IndexMap<String, Attribute>);

impl Serialize for Attributes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(name, attr)| (name, &attr.value)))
    }
}

impl Serialize for NodeRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;

        match self.kind() {
            NodeKind::Root { .. } => {
                map.serialize_entry("type", "root")?;
                map.serialize_entry("children", &Children(*self))?;
            }
            NodeKind::Literal(text) => {
                map.serialize_entry("type", "literal")?;
                map.serialize_entry("value", text)?;
            }
            NodeKind::Block(block) => {
                map.serialize_entry("type", "block")?;
                map.serialize_entry("kind", &block.kind)?;
                map.serialize_entry("value", &block.value)?;
            }
            NodeKind::Element(element) => {
                let node_type = if element.kind.command().is_some() { "command" } else { "element" };
                map.serialize_entry("type", node_type)?;
                map.serialize_entry("tag", &element.tag)?;

                match &element.kind {
                    ElementKind::View { name, client_only, server_only } => {
                        map.serialize_entry("name", name)?;
                        map.serialize_entry("client_only", client_only)?;
                        map.serialize_entry("server_only", server_only)?;
                    }
                    ElementKind::Call { defer, .. } => {
                        map.serialize_entry("defer", defer)?;
                        map.serialize_entry("attributes", &Attributes(&element.attributes))?;
                    }
                    _ => map.serialize_entry("attributes", &Attributes(&element.attributes))?,
                }

                if let Some(position) = self.position() {
                    map.serialize_entry("position", &position)?;
                }
                map.serialize_entry("children", &Children(*self))?;
            }
        }

        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> HtmlConfig {
        HtmlConfig::standard()
    }

    fn pos(byte: usize) -> Option<Position> {
        Some(Position::new(byte, 0, byte))
    }

    #[test]
    fn test_factory_dispatch() {
        let config = config();
        let mut doc = Document::new();
        let cases = [
            ("FOR", Some(CommandKind::For), "$for"),
            ("if", Some(CommandKind::Xor), "$xor"),
            ("Else", Some(CommandKind::If), "$if"),
            ("call", Some(CommandKind::Call), "$call"),
            ("part", Some(CommandKind::Part), "$part"),
            ("VIEW", Some(CommandKind::View), "view"),
            ("META", None, "meta"),
            ("DiV", None, "div"),
        ];
        for (tag, command, stored) in cases {
            let id = doc.create_element(tag, None, &config);
            assert_eq!(doc.command(id), command, "{}", tag);
            assert_eq!(doc.element(id).map(|e| e.tag.as_str()), Some(stored));
        }
        let meta = doc.create_element("meta", None, &config);
        assert_eq!(doc.element_kind(meta), Some(&ElementKind::Meta));
        assert!(doc.element(meta).is_some_and(|e| e.void));
    }

    #[test]
    fn test_void_and_commands() {
        let config = config();
        let mut doc = Document::new();
        let img = doc.create_element("img", None, &config);
        let part = doc.create_element("part", None, &config);
        assert!(!doc.can_have_children(img));
        assert!(doc.can_have_children(part));
        // part names default to an empty literal
        assert_eq!(doc.node(part).part_name(), Some(""));
        assert_eq!(doc.attribute(part, "name").and_then(|a| a.value.clone()), Some(Value::literal("")));
    }

    #[test]
    fn test_append_if_wraps_in_xor() {
        let config = config();
        let mut doc = Document::new();
        let div = doc.create_element("div", pos(0), &config);
        let first = doc.create_element("else", pos(5), &config);
        let second = doc.create_element("else", pos(9), &config);

        let xor = doc.append_child(div, first).unwrap();
        assert_eq!(doc.command(xor), Some(CommandKind::Xor));
        assert_eq!(doc.parent(xor), Some(div));
        assert_eq!(doc.position(xor), pos(5));

        // next IF sibling extends the same chain
        assert_eq!(doc.append_child(div, second), Some(xor));
        assert_eq!(doc.children(div), &[xor]);
        assert_eq!(doc.children(xor), &[first, second]);
        assert_eq!(doc.content_target(xor), second);
    }

    #[test]
    fn test_append_into_xor_goes_to_current_case() {
        let config = config();
        let mut doc = Document::new();
        let xor = doc.create_element("if", pos(0), &config);
        let text = doc.create_literal("zero", pos(3));

        let case = doc.append_child(xor, text).unwrap();
        assert_eq!(doc.command(case), Some(CommandKind::If));
        assert_eq!(doc.children(xor), &[case]);
        assert_eq!(doc.children(case), &[text]);
        assert_eq!(doc.parent(text), Some(case));
    }

    #[test]
    fn test_xor_attributes_land_on_case() {
        let config = config();
        let mut doc = Document::new();
        let xor = doc.create_element("if", pos(0), &config);
        doc.set_attribute(xor, "TEST", Some(Value::literal("a > 1")), pos(8)).unwrap();

        let case = doc.first_child(xor).unwrap();
        assert!(doc.element(xor).is_some_and(|e| e.attributes.is_empty()));
        assert_eq!(
            doc.attribute(case, TEST_ATTR).and_then(|a| a.value.clone()),
            Some(Value::expression("a > 1"))
        );
    }

    #[test]
    fn test_call_default_part() {
        let config = config();
        let mut doc = Document::new();
        let call = doc.create_element("call", pos(0), &config);
        let space = doc.create_literal("\n  ", pos(10));
        let part = doc.create_element("part", pos(13), &config);
        let text = doc.create_literal("other text", pos(30));

        assert_eq!(doc.append_child(call, space), None);
        assert_eq!(doc.parent(space), None);
        assert_eq!(doc.append_child(call, part), Some(call));

        let default_part = doc.append_child(call, text).unwrap();
        assert_ne!(default_part, part);
        assert_eq!(doc.node(default_part).part_name(), Some(""));
        assert_eq!(doc.position(default_part), pos(0));
        assert_eq!(doc.children(call), &[part, default_part]);

        // whitespace is kept once the default part exists
        let more = doc.create_literal(" ", None);
        assert_eq!(doc.append_child(call, more), Some(default_part));
    }

    #[test]
    fn test_if_in_call_is_wrapped_inside_default_part() {
        let config = config();
        let mut doc = Document::new();
        let call = doc.create_element("call", pos(0), &config);
        let branch = doc.create_element("else", pos(16), &config);

        let xor = doc.append_child(call, branch).unwrap();
        assert_eq!(doc.command(xor), Some(CommandKind::Xor));
        let default_part = doc.parent(xor).unwrap();
        assert_eq!(doc.node(default_part).part_name(), Some(""));
        assert_eq!(doc.children(call), &[default_part]);
        assert_eq!(doc.children(xor), &[branch]);
    }

    #[test]
    fn test_replace_and_remove_keep_parents_consistent() {
        let config = config();
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.create_element("a", None, &config);
        let b = doc.create_literal("b", None);
        let wrapper = doc.create_command(CommandKind::If, None);
        doc.append_child(root, a);
        doc.append_child(root, b);

        assert!(doc.replace_child(root, wrapper, Some(a)));
        assert_eq!(doc.children(root), &[wrapper, b]);
        assert_eq!(doc.parent(a), None);
        assert_eq!(doc.parent(wrapper), Some(root));

        assert!(doc.remove_child(root, b));
        assert!(!doc.remove_child(root, b));
        assert_eq!(doc.parent(b), None);

        // missing old appends
        let c = doc.create_literal("c", None);
        assert!(doc.replace_child(root, c, None));
        assert_eq!(doc.last_child(root), Some(c));

        // moving a child detaches it from its previous container
        doc.append_child(a, c);
        assert_eq!(doc.children(root), &[wrapper]);
        assert_eq!(doc.parent(c), Some(a));
    }

    #[test]
    fn test_command_attribute_validation() {
        let config = config();
        let mut doc = Document::new();
        let for_node = doc.create_element("for", pos(0), &config);
        let err = doc.set_attribute(for_node, "bogus", None, pos(5)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidAttribute);
        assert_eq!(err.message, "Invalid attribute on FOR command: bogus");
        assert_eq!(err.node, Some(for_node));
        assert_eq!(err.position, Position::new(5, 0, 5));

        doc.set_attribute(for_node, "EACH", Some(Value::literal("items")), None).unwrap();
        assert_eq!(
            doc.attribute(for_node, "each").and_then(|a| a.value.clone()),
            Some(Value::expression("items"))
        );

        let if_node = doc.create_element("else", None, &config);
        doc.set_attribute(if_node, "if", Some(Value::literal("x")), None).unwrap();
        assert!(doc.attribute(if_node, TEST_ATTR).is_some());
        assert_eq!(
            doc.set_attribute(if_node, "when", None, None).unwrap_err().message,
            "Attribute invalid on IF/ELSE command: when"
        );

        let call = doc.create_element("call", None, &config);
        doc.set_attribute(call, "defer", None, None).unwrap();
        assert!(doc.node(call).is_defer());
        assert!(doc.attribute(call, "defer").is_none());
        assert_eq!(
            doc.set_attribute(call, "target", None, None).unwrap_err().message,
            "Attribute invalid on CALL command: target"
        );

        let part = doc.create_element("part", None, &config);
        assert_eq!(
            doc.set_attribute(part, "name", Some(Value::expression("x")), None).unwrap_err().message,
            "PART name must be a string literal"
        );
        assert_eq!(
            doc.set_attribute(part, "id", None, None).unwrap_err().message,
            "Attribute invalid on PART declaration: id"
        );

        let view = doc.create_element("view", None, &config);
        doc.set_attribute(view, "name", Some(Value::literal("Foo")), None).unwrap();
        doc.set_attribute(view, "client-only", None, None).unwrap();
        assert_eq!(doc.node(view).view_name(), Some("Foo"));
        assert!(doc.node(view).is_client_only());
        assert!(!doc.node(view).is_server_only());
        assert_eq!(
            doc.set_attribute(view, "name", Some(Value::expression("x")), None).unwrap_err().message,
            "VIEW name must be a string literal"
        );
        assert_eq!(
            doc.set_attribute(view, "class", None, None).unwrap_err().message,
            "Attribute invalid on VIEW declaration: class"
        );
    }

    #[test]
    fn test_html_attributes_kept_verbatim() {
        let config = config();
        let mut doc = Document::new();
        let div = doc.create_element("div", None, &config);
        doc.add_attributes(
            div,
            [
                AttributePair::new("Class", Some(Value::literal("a"))),
                AttributePair::new("hidden", None),
            ],
        )
        .unwrap();
        let names: Vec<&str> = doc.element(div).unwrap().attributes.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Class", "hidden"]);
        assert_eq!(doc.remove_attribute(div, "Class").and_then(|a| a.value), Some(Value::literal("a")));
        assert!(doc.attribute(div, "Class").is_none());
    }

    #[test]
    fn test_is_self_and_ancestors() {
        let config = config();
        let mut doc = Document::new();
        let root = doc.root();
        let div = doc.create_element("div", None, &config);
        let xor = doc.create_element("if", None, &config);
        let case = doc.create_element("else", None, &config);
        doc.append_child(root, div);
        doc.append_child(div, xor);
        doc.append_child(xor, case);

        assert!(doc.is_self(xor, "if"));
        assert!(doc.is_self(xor, "$XOR"));
        assert!(doc.is_self(case, "else"));
        assert!(doc.is_self(case, "$if"));
        assert!(!doc.is_self(case, "if"));
        assert!(doc.is_self(div, "DIV"));
        assert!(doc.is_ancestor(case, "if"));
        assert!(doc.is_ancestor(case, "div"));
        assert!(!doc.is_ancestor(case, "span"));
        assert!(doc.is_ancestor_or_self(div, "div"));
        assert!(!doc.is_self(root, "div"));
    }

    #[test]
    fn test_link_attributes() {
        let config = config();
        let mut doc = Document::new();
        let a = doc.create_element("a", None, &config);
        assert!(doc.is_link_attribute(a, "href", &config));
        assert!(!doc.is_link_attribute(a, "title", &config));

        let meta = doc.create_element("meta", None, &config);
        doc.set_attribute(meta, "property", Some(Value::literal("og:image")), None).unwrap();
        assert!(doc.is_link_attribute(meta, "content", &config));

        // wrong key attribute for the property
        let twitter = doc.create_element("meta", None, &config);
        doc.set_attribute(twitter, "property", Some(Value::literal("twitter:image")), None).unwrap();
        assert!(!doc.is_link_attribute(twitter, "content", &config));

        let named = doc.create_element("meta", None, &config);
        doc.set_attribute(named, "name", Some(Value::literal("twitter:image")), None).unwrap();
        assert!(doc.is_link_attribute(named, "content", &config));

        let description = doc.create_element("meta", None, &config);
        doc.set_attribute(description, "name", Some(Value::literal("description")), None).unwrap();
        assert!(!doc.is_link_attribute(description, "content", &config));
    }

    #[test]
    fn test_structural_equality_ignores_positions() {
        let config = config();
        let build = |offset: usize| {
            let mut doc = Document::new();
            let root = doc.root();
            let div = doc.create_element("div", pos(offset), &config);
            doc.set_attribute(div, "class", Some(Value::literal("x")), pos(offset + 5)).unwrap();
            let text = doc.create_literal("hi", pos(offset + 10));
            doc.append_child(root, div);
            doc.append_child(div, text);
            (doc, div)
        };

        let (a, a_div) = build(0);
        let (b, b_div) = build(100);
        assert_eq!(a.node(a_div), b.node(b_div));
        assert_eq!(a.node(a.root()), b.node(b.root()));

        let (mut c, c_div) = build(0);
        c.set_attribute(c_div, "class", Some(Value::literal("y")), None).unwrap();
        assert_ne!(a.node(a_div), c.node(c_div));
    }

    #[test]
    fn test_render() {
        let config = config();
        let mut doc = Document::new();
        let view = doc.create_element("view", None, &config);
        doc.set_attribute(view, "name", Some(Value::literal("Foo")), None).unwrap();
        doc.set_attribute(view, "server-only", None, None).unwrap();

        let a = doc.create_element("a", None, &config);
        doc.set_attribute(a, "href", Some(Value::expression(" url ")), None).unwrap();
        doc.set_attribute(a, "download", None, None).unwrap();
        let text = doc.create_literal("link", None);
        let br = doc.create_element("br", None, &config);
        let doctype = doc.create_block(Block::new(BlockKind::DocType, "html"), None);

        doc.append_child(view, doctype);
        doc.append_child(view, a);
        doc.append_child(a, text);
        doc.append_child(view, br);

        assert_eq!(
            doc.node(view).to_string(),
            "<view name=\"Foo\" server-only><!DOCTYPE html><a href=\"<%= url %>\" download>link</a><br /></view>"
        );
        assert_eq!(Block::new(BlockKind::DocType, "").to_string(), "<!DOCTYPE>");
        assert_eq!(Block::new(BlockKind::Unknown, "<?php x ?>").to_string(), "<?php x ?>");
    }

    #[test]
    fn test_render_escapes_literal_text() {
        let config = config();
        let mut doc = Document::new();
        let p = doc.create_element("p", None, &config);
        doc.set_attribute(p, "title", Some(Value::literal("say \"hi\" & <go>")), None).unwrap();
        let text = doc.create_literal("<b>\"x\" & y", None);
        doc.append_child(p, text);
        assert_eq!(
            doc.node(p).to_string(),
            "<p title=\"say &quot;hi&quot; &amp; &lt;go>\">&lt;b>\"x\" &amp; y</p>"
        );

        let script = doc.create_element("script", None, &config);
        let code = doc.create_literal("if (a < b && c) {}", None);
        doc.append_child(script, code);
        assert_eq!(doc.node(script).to_string(), "<script>if (a < b && c) {}</script>");
    }

    #[test]
    fn test_serialize_element() {
        let config = config();
        let mut doc = Document::new();
        let p = doc.create_element("p", pos(0), &config);
        doc.set_attribute(p, "title", Some(Value::expression("t")), None).unwrap();
        let text = doc.create_literal("x", None);
        doc.append_child(p, text);

        let json = serde_json::to_value(doc.node(p)).unwrap();
        assert_eq!(json["type"], "element");
        assert_eq!(json["tag"], "p");
        assert_eq!(json["attributes"]["title"]["kind"], "expression");
        assert_eq!(json["children"][0]["type"], "literal");
        assert_eq!(json["children"][0]["value"], "x");
    }
}
