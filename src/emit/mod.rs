//! Emitter: rule tree → configuration text.
//!
//! # Responsibilities
//! - Serialize a [`Document`] in the serving runtime's block syntax
//! - Preserve node order exactly (precedence is positional)
//! - Produce byte-identical output for identical trees
//!
//! # Design Decisions
//! - Four-space indentation, one statement per line
//! - A blank line separates a block from the statement before it
//! - Values are written verbatim; multi-line values are not re-indented

use crate::rules::tree::{Block, Directive, Document, Node};

const INDENT: &str = "    ";

/// Render a document to text.
pub fn render(doc: &Document) -> String {
    let mut out = String::new();
    write_nodes(&mut out, &doc.nodes, 0);
    out
}

fn write_nodes(out: &mut String, nodes: &[Node], depth: usize) {
    for (i, node) in nodes.iter().enumerate() {
        match node {
            Node::Directive(d) => write_directive(out, d, depth),
            Node::Block(b) => {
                if i > 0 {
                    out.push('\n');
                }
                write_block(out, b, depth);
            }
        }
    }
}

fn write_directive(out: &mut String, d: &Directive, depth: usize) {
    indent(out, depth);
    out.push_str(&d.name);
    if let Some(value) = &d.value {
        out.push(' ');
        out.push_str(value);
    }
    out.push_str(";\n");
}

fn write_block(out: &mut String, b: &Block, depth: usize) {
    indent(out, depth);
    out.push_str(&b.name);
    if let Some(args) = &b.args {
        out.push(' ');
        out.push_str(args);
    }
    out.push_str(" {\n");
    write_nodes(out, &b.children, depth + 1);
    indent(out, depth);
    out.push_str("}\n");
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_nested_blocks() {
        let mut doc = Document::new();
        doc.push(Directive::new("load_module", "/mod.so"));
        doc.push(
            Block::new("server")
                .directive("listen", "80")
                .child(Block::with_args("location", "/info").directive("return", "200"))
                .child(Block::with_args("location", "/stub_status").child(Directive::bare("stub_status"))),
        );

        let expected = "\
load_module /mod.so;

server {
    listen 80;

    location /info {
        return 200;
    }

    location /stub_status {
        stub_status;
    }
}
";
        assert_eq!(render(&doc), expected);
    }

    #[test]
    fn test_empty_document_renders_empty() {
        assert_eq!(render(&Document::new()), "");
    }

    #[test]
    fn test_render_is_deterministic() {
        let mut doc = Document::new();
        doc.push(Block::new("events").directive("worker_connections", "1024"));
        assert_eq!(render(&doc), render(&doc.clone()));
    }
}
