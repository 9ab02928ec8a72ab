//! SVG writer for the finished scene tree.

use regex::Regex;
use std::borrow::Cow;
use std::io::{self, Write};
use std::sync::LazyLock;

use super::Document;
use super::node::Node;

/// Characters not allowed in XML 1.0 documents.
static CONTROL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x00-\x08\x0b-\x0c\x0e-\x1f]").expect("control character pattern is valid")
});

/// Escapes an attribute value.
pub fn enc(x: &str) -> Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(x)
}

/// Escapes character content, dropping characters XML cannot carry.
pub fn enc_text(x: &str) -> Cow<'_, str> {
    match CONTROL_RE.replace_all(x, "") {
        Cow::Borrowed(s) => html_escape::encode_text(s),
        Cow::Owned(s) => Cow::Owned(html_escape::encode_text(&s).into_owned()),
    }
}

/// Streams a scene tree as SVG markup.
pub struct SvgWriter<W: Write> {
    out: W,
    /// Indent nested elements; text elements are never indented inside.
    pretty: bool,
}

impl<W: Write> SvgWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, pretty: false }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Writes a complete document with XML declaration.
    pub fn write_document(&mut self, doc: &Document) -> io::Result<()> {
        self.out
            .write_all(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n")?;
        self.write_node(&doc.root, 0)?;
        if self.pretty {
            self.out.write_all(b"\n")?;
        }
        self.out.flush()
    }

    pub fn write_node(&mut self, node: &Node, depth: usize) -> io::Result<()> {
        write!(self.out, "<{}", node.tag)?;
        for (k, v) in &node.attrs {
            write!(self.out, " {}=\"{}\"", k, enc(v))?;
        }
        if node.children.is_empty() && node.text.is_none() {
            return self.out.write_all(b"/>");
        }
        self.out.write_all(b">")?;
        if let Some(text) = &node.text {
            if node.tag == "style" {
                write!(self.out, "<![CDATA[{}]]>", text)?;
            } else {
                self.out.write_all(enc_text(text).as_bytes())?;
            }
        }
        // Whitespace inside text elements would be rendered.
        let indent = self.pretty && node.tag != "text" && node.text.is_none();
        for child in &node.children {
            if indent {
                write!(self.out, "\n{}", "  ".repeat(depth + 1))?;
            }
            self.write_node(child, depth + 1)?;
        }
        if indent && !node.children.is_empty() {
            write!(self.out, "\n{}", "  ".repeat(depth))?;
        }
        write!(self.out, "</{}>", node.tag)
    }
}

/// Serializes a document to a string.
pub fn to_svg_string(doc: &Document) -> String {
    let mut writer = SvgWriter::new(Vec::new());
    // Writing to a Vec cannot fail.
    let _ = writer.write_document(doc);
    String::from_utf8_lossy(&writer.into_inner()).into_owned()
}
