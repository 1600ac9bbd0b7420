//! HTML classification tables.
//!
//! One `HtmlConfig` is built at startup and passed by reference to the lexer,
//! the parser and the element factory. It is never mutated afterwards.

use crate::entities::NAMED_ENTITIES;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// Void elements: cannot have children or a closing tag.
/// https://html.spec.whatwg.org/multipage/syntax.html#void-elements
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "br", "col", "embed", "frame", "hr", "img",
    "input", "isindex", "keygen", "link", "meta", "param", "source", "track",
    "wbr",
];

/// Elements whose URL-bearing attributes may be rewritten at runtime
const LINK_ELEMENTS: &[&str] = &[
    "a", "area", "audio", "base", "blockquote", "body", "del", "embed", "form",
    "frame", "iframe", "img", "input", "ins", "link", "object", "q", "script",
    "source", "track", "video",
];

/// Attributes holding a URL on a link element
const LINK_ATTRIBUTES: &[&str] = &[
    "action", "background", "cite", "data", "formaction", "href", "longdesc",
    "manifest", "poster", "src",
];

/// Attributes rendered by presence alone
const BOOL_ATTRIBUTES: &[&str] = &[
    "async", "autofocus", "autoplay", "checked", "controls", "defer",
    "disabled", "formnovalidate", "hidden", "loop", "multiple", "muted",
    "novalidate", "open", "readonly", "required", "selected",
];

/// `<meta>` properties whose `content` is a URL, keyed by the attribute naming them
const META_LINK_PROPERTIES: &[(&str, &str)] = &[
    // Open Graph
    ("og:url", "property"),
    ("og:image", "property"),
    ("og:image:url", "property"),
    ("og:image:secure_url", "property"),
    ("og:video", "property"),
    ("og:video:url", "property"),
    ("og:video:secure_url", "property"),
    ("og:audio", "property"),
    ("og:audio:url", "property"),
    ("og:audio:secure_url", "property"),
    // Schema.org microdata
    ("image", "itemprop"),
    // Twitter cards
    ("twitter:image", "name"),
    ("twitter:image:src", "name"),
    ("twitter:image0", "name"),
    ("twitter:image1", "name"),
    ("twitter:image2", "name"),
    ("twitter:image3", "name"),
    ("twitter:player", "name"),
    ("twitter:player:stream", "name"),
];

/// Attributes that name a meta property, in lookup order
pub const META_KEY_ATTRIBUTES: &[&str] = &["name", "property", "itemprop"];

/// Tag and attribute classification plus the entity table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HtmlConfig {
    pub void_tags: HashSet<String>,
    pub link_tags: HashSet<String>,
    pub link_attrs: HashSet<String>,
    pub bool_attrs: HashSet<String>,
    /// meta property → key attribute (`property`, `itemprop` or `name`)
    pub meta_link_properties: HashMap<String, String>,
    /// entity name → decoded text
    pub entities: HashMap<String, String>,
}

impl HtmlConfig {
    /// The embedded standard tables
    pub fn standard() -> Self {
        fn set(items: &[&str]) -> HashSet<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        fn map(items: &[(&str, &str)]) -> HashMap<String, String> {
            items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
        }

        Self {
            void_tags: set(VOID_ELEMENTS),
            link_tags: set(LINK_ELEMENTS),
            link_attrs: set(LINK_ATTRIBUTES),
            bool_attrs: set(BOOL_ATTRIBUTES),
            meta_link_properties: map(META_LINK_PROPERTIES),
            entities: map(NAMED_ENTITIES),
        }
    }

    /// Load tables from JSON; omitted tables keep their standard contents
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn is_void_tag(&self, tag: &str) -> bool {
        self.void_tags.contains(tag)
    }

    pub fn is_link_tag(&self, tag: &str) -> bool {
        self.link_tags.contains(tag)
    }

    pub fn is_link_attr(&self, name: &str) -> bool {
        self.link_attrs.contains(name)
    }

    pub fn is_bool_attribute(&self, name: &str) -> bool {
        self.bool_attrs.contains(&name.to_ascii_lowercase())
    }

    /// Key attribute (`name`, `property`, `itemprop`) under which a meta property denotes a URL
    pub fn meta_link_key(&self, property: &str) -> Option<&str> {
        self.meta_link_properties.get(property).map(String::as_str)
    }

    pub fn decode_entity(&self, name: &str) -> Option<&str> {
        if name.is_empty() {
            return None;
        }
        self.entities.get(name).map(String::as_str)
    }
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self::standard()
    }
}
