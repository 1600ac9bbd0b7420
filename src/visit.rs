//! Read-only traversal of parsed views.

use crate::ast::{Ast, NodeRef, Value};
use crate::html::HtmlConfig;
use crate::parser::Position;
use serde::Serialize;

/// Visitor over a parsed tree
pub trait Visitor {
    /// Called before visiting children. Return `false` to skip children.
    fn enter(&mut self, _node: NodeRef<'_>) -> bool {
        true
    }

    /// Called after visiting children.
    fn exit(&mut self, _node: NodeRef<'_>) {}
}

/// Walk every view in source order
pub fn walk<V: Visitor + ?Sized>(ast: &Ast, visitor: &mut V) {
    for view in ast.views() {
        walk_node(view, visitor);
    }
}

pub fn walk_node<V: Visitor + ?Sized>(node: NodeRef<'_>, visitor: &mut V) {
    if visitor.enter(node) {
        for child in node.children() {
            walk_node(child, visitor);
        }
    }
    visitor.exit(node);
}

/// URL-bearing attribute found in a view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub view: String,
    pub tag: String,
    pub attribute: String,
    pub value: Value,
    pub position: Option<Position>,
}

/// Collects link attributes for URL rewriting
#[derive(Debug)]
pub struct LinkCollector<'c> {
    config: &'c HtmlConfig,
    view: String,
    pub links: Vec<Link>,
}

impl<'c> LinkCollector<'c> {
    pub fn new(config: &'c HtmlConfig) -> Self {
        Self {
            config,
            view: String::new(),
            links: Vec::new(),
        }
    }

    pub fn collect(ast: &Ast, config: &'c HtmlConfig) -> Vec<Link> {
        let mut collector = Self::new(config);
        walk(ast, &mut collector);
        collector.links
    }
}

impl Visitor for LinkCollector<'_> {
    fn enter(&mut self, node: NodeRef<'_>) -> bool {
        if let Some(name) = node.view_name() {
            self.view = name.to_string();
        }

        let (Some(tag), Some(attributes)) = (node.tag(), node.attributes()) else {
            return true;
        };

        for (name, attr) in attributes {
            let Some(value) = &attr.value else {
                continue;
            };
            if node.is_link_attribute(name, self.config) {
                self.links.push(Link {
                    view: self.view.clone(),
                    tag: tag.to_string(),
                    attribute: name.clone(),
                    value: value.clone(),
                    position: attr.position,
                });
            }
        }

        true
    }
}
