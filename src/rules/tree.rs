//! In-memory rule tree.
//!
//! # Responsibilities
//! - Represent directives (`name value;`) and blocks (`name args { ... }`)
//! - Preserve insertion order exactly (emission order == precedence order)
//! - Offer small lookup helpers for tests and assertions
//!
//! # Design Decisions
//! - Values are opaque pass-through strings; the tree never interprets them
//! - Built fresh per run and never mutated after emission

/// One node of the rule tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Directive(Directive),
    Block(Block),
}

impl From<Directive> for Node {
    fn from(d: Directive) -> Self {
        Node::Directive(d)
    }
}

impl From<Block> for Node {
    fn from(b: Block) -> Self {
        Node::Block(b)
    }
}

/// A single `name value;` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub value: Option<String>,
}

impl Directive {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// A directive without arguments, e.g. `stub_status;`.
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

/// A named block with optional arguments and ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub name: String,
    pub args: Option<String>,
    pub children: Vec<Node>,
}

impl Block {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: None,
            children: Vec::new(),
        }
    }

    pub fn with_args(name: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Some(args.into()),
            children: Vec::new(),
        }
    }

    /// Builder-style append of a `name value;` directive.
    pub fn directive(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.children.push(Directive::new(name, value).into());
        self
    }

    /// Builder-style append of any node.
    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn push(&mut self, node: impl Into<Node>) {
        self.children.push(node.into());
    }

    pub fn extend<I, N>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
    }

    /// Direct child directives, in order.
    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.children.iter().filter_map(|n| match n {
            Node::Directive(d) => Some(d),
            Node::Block(_) => None,
        })
    }

    /// Direct child blocks, in order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.children.iter().filter_map(|n| match n {
            Node::Block(b) => Some(b),
            Node::Directive(_) => None,
        })
    }

    /// All values of the direct child directives called `name`.
    pub fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.directives()
            .filter(move |d| d.name == name)
            .filter_map(|d| d.value.as_deref())
    }

    /// Value of the first direct child directive called `name`.
    pub fn value<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        self.values(name).next()
    }
}

/// A complete document: the unit the emitter serializes to one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: impl Into<Node>) {
        self.nodes.push(node.into());
    }

    /// Top-level blocks, in order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Block(b) => Some(b),
            Node::Directive(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_preserves_order() {
        let block = Block::with_args("location", "/")
            .directive("set", "$loc_in \"slash_block\"")
            .child(Directive::bare("stub_status"))
            .directive("set", "$loc_out \"x\"");

        let names: Vec<_> = block.directives().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["set", "stub_status", "set"]);
        assert_eq!(block.value("set"), Some("$loc_in \"slash_block\""));
        assert_eq!(block.values("set").count(), 2);
    }

    #[test]
    fn test_blocks_filter() {
        let mut server = Block::new("server");
        server.push(Directive::new("listen", "80"));
        server.push(Block::with_args("location", "/"));

        assert_eq!(server.blocks().count(), 1);
        assert_eq!(server.directives().count(), 1);
    }

    #[test]
    fn test_value_lookup_with_owned_name() {
        let server = Block::new("server").directive("listen", "80");
        let name = String::from("listen");
        let found = server.value(&name);
        assert_eq!(found, Some("80"));
        assert_eq!(server.value("missing"), None);
    }
}
