//! Deterministic HTML serializer with the fragment rewrite rules applied.
//!
//! `scraper` trees are read-only, so instead of mutating the DOM the rules
//! are applied while writing each element back out:
//!
//! - `div.fragment` is written as `pre`
//! - an empty `div.line` gets a single non-breaking space
//! - paragraphs matching the copyright pattern get `class="copyright"`
//! - the header title `div.title` is written as `h1`, optionally with new text

use regex::Regex;
use scraper::{ElementRef, Node};

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose text is written verbatim.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Rewrite rules applied while serializing.
pub(crate) struct Rules<'a> {
    /// Paragraph text matching this gets the `copyright` class.
    pub copyright: &'a Regex,
    /// When serializing the page header: the (possibly renamed) title.
    pub header_title: Option<&'a str>,
}

/// Serialize `el` and its subtree.
pub(crate) fn outer_html(el: ElementRef<'_>, rules: &Rules<'_>) -> String {
    let mut out = String::new();
    write_element(el, rules, &mut out);
    out
}

fn write_element(el: ElementRef<'_>, rules: &Rules<'_>, out: &mut String) {
    let element = el.value();
    let name = element.name();
    let has_class = |class: &str| element.classes().any(|c| c == class);

    let title = rules
        .header_title
        .filter(|_| name == "div" && has_class("title"));

    let tag = if name == "div" && has_class("fragment") {
        "pre"
    } else if title.is_some() {
        "h1"
    } else {
        name
    };

    let is_copyright = name == "p" && rules.copyright.is_match(&el.text().collect::<String>());

    out.push('<');
    out.push_str(tag);
    let mut wrote_class = false;
    for (attr, value) in element.attrs() {
        if attr == "class" && is_copyright {
            wrote_class = true;
            push_attr(out, "class", "copyright");
            continue;
        }
        push_attr(out, attr, value);
    }
    if is_copyright && !wrote_class {
        push_attr(out, "class", "copyright");
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    if let Some(title) = title {
        escape_text(title, out);
        close(tag, out);
        return;
    }

    if name == "div" && has_class("line") && !el.has_children() {
        out.push_str("&nbsp;");
        close(tag, out);
        return;
    }

    let raw = RAW_TEXT_ELEMENTS.contains(&name);
    for child in el.children() {
        match child.value() {
            Node::Text(text) if raw => out.push_str(text),
            Node::Text(text) => escape_text(text, out),
            Node::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->");
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    write_element(child_el, rules, out);
                }
            }
            _ => {}
        }
    }
    close(tag, out);
}

fn close(tag: &str, out: &mut String) {
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    escape_attr(value, out);
    out.push('"');
}

/// Escape text content, writing non-breaking spaces as entities.
pub(crate) fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

/// Escape an attribute value for a double-quoted attribute.
pub(crate) fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}
