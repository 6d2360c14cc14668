//! Markup fragments for `set_inner_html` / `inner_html`.
//!
//! Parsing uses `quick-xml` with HTML-friendly settings: end tag names are
//! checked here rather than by the reader so that void elements (`<br>`,
//! `<img>`, ...) need no closing tag, and attributes are read with
//! `html_attributes` so unquoted and valueless attributes are accepted.
//! Comments, declarations, and processing instructions are dropped.

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{HostError, HostResult};
use crate::node::{NodeId, NodeKind};
use crate::tree::HostTree;

/// Elements that never have content or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// A parsed node, not yet inserted into a tree.
///
/// A fragment is a flat list in document order; `parent` indexes an earlier
/// entry of the same list, or is `None` for top-level nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MarkupNode {
    pub(crate) parent: Option<usize>,
    pub(crate) content: MarkupContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MarkupContent {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

/// Parse a markup fragment into a flat list of nodes in document order.
pub(crate) fn parse_fragment(markup: &str) -> HostResult<Vec<MarkupNode>> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().check_end_names = false;

    let mut nodes = Vec::new();
    // Open elements: index into `nodes` and tag name.
    let mut open: Vec<(usize, String)> = Vec::new();

    loop {
        let position = reader.buffer_position() as u64;
        let parent = open.last().map(|(index, _)| *index);
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let (tag, attributes) = element_head(&start, position)?;
                let void = is_void(&tag);
                nodes.push(MarkupNode {
                    parent,
                    content: MarkupContent::Element {
                        tag: tag.clone(),
                        attributes,
                    },
                });
                if !void {
                    open.push((nodes.len() - 1, tag));
                }
            }
            Ok(Event::Empty(start)) => {
                let (tag, attributes) = element_head(&start, position)?;
                nodes.push(MarkupNode {
                    parent,
                    content: MarkupContent::Element { tag, attributes },
                });
            }
            Ok(Event::End(end)) => {
                let tag = String::from_utf8_lossy(end.name().as_ref()).to_ascii_lowercase();
                if is_void(&tag) {
                    continue;
                }
                let Some((_, open_tag)) = open.pop() else {
                    return Err(HostError::markup(
                        format!("unexpected closing tag </{tag}>"),
                        position,
                    ));
                };
                if open_tag != tag {
                    return Err(HostError::markup(
                        format!("expected </{open_tag}>, found </{tag}>"),
                        position,
                    ));
                }
            }
            Ok(Event::Text(text)) => {
                let content = text
                    .unescape()
                    .map_err(|e| HostError::markup(e.to_string(), position))?;
                if !content.is_empty() {
                    nodes.push(MarkupNode {
                        parent,
                        content: MarkupContent::Text(content.into_owned()),
                    });
                }
            }
            Ok(Event::CData(data)) => {
                nodes.push(MarkupNode {
                    parent,
                    content: MarkupContent::Text(String::from_utf8_lossy(&data).into_owned()),
                });
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(HostError::markup(e.to_string(), position)),
        }
    }

    if let Some((_, tag)) = open.last() {
        return Err(HostError::markup(
            format!("unclosed <{tag}>"),
            reader.buffer_position() as u64,
        ));
    }

    Ok(nodes)
}

fn element_head(
    start: &BytesStart<'_>,
    position: u64,
) -> HostResult<(String, Vec<(String, String)>)> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase();
    let mut attributes: Vec<(String, String)> = Vec::new();
    for attr in start.html_attributes() {
        let attr = attr.map_err(|e| HostError::markup(e.to_string(), position))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
        let value = attr
            .unescape_value()
            .map_err(|e| HostError::markup(e.to_string(), position))?
            .into_owned();
        // First occurrence wins, as in HTML.
        if !attributes.iter().any(|(k, _)| *k == key) {
            attributes.push((key, value));
        }
    }
    Ok((tag, attributes))
}

enum Step {
    Open(NodeId),
    Close(NodeId),
}

/// Serialize the children of `id` back to markup.
pub(crate) fn serialize_children(tree: &HostTree, id: NodeId, out: &mut String) -> HostResult<()> {
    let mut stack: Vec<Step> = tree.children(id)?.iter().rev().map(|&c| Step::Open(c)).collect();

    while let Some(step) = stack.pop() {
        match step {
            Step::Close(id) => {
                if let Some(element) = tree.data(id).and_then(|data| data.element()) {
                    out.push_str("</");
                    out.push_str(&element.tag);
                    out.push('>');
                }
            }
            Step::Open(id) => {
                let data = tree.data(id).ok_or(HostError::InvalidNode)?;
                match &data.kind {
                    NodeKind::Text(text) => out.push_str(&escape(text.as_str())),
                    NodeKind::Element(element) => {
                        out.push('<');
                        out.push_str(&element.tag);
                        for (name, value) in &element.attributes {
                            out.push(' ');
                            out.push_str(name);
                            out.push_str("=\"");
                            out.push_str(&escape(value.as_str()));
                            out.push('"');
                        }
                        out.push('>');
                        if !is_void(&element.tag) {
                            stack.push(Step::Close(id));
                            stack.extend(data.children.iter().rev().map(|&c| Step::Open(c)));
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(parent: Option<usize>, tag: &str, attributes: &[(&str, &str)]) -> MarkupNode {
        MarkupNode {
            parent,
            content: MarkupContent::Element {
                tag: tag.to_string(),
                attributes: attributes
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
        }
    }

    fn text(parent: Option<usize>, text: &str) -> MarkupNode {
        MarkupNode {
            parent,
            content: MarkupContent::Text(text.to_string()),
        }
    }

    #[test]
    fn test_parse_nested_fragment() {
        let nodes = parse_fragment("Hi <b class='my-button'><i>XOX</i></b>").unwrap();
        assert_eq!(
            nodes,
            vec![
                text(None, "Hi "),
                element(None, "b", &[("class", "my-button")]),
                element(Some(1), "i", &[]),
                text(Some(2), "XOX"),
            ]
        );
    }

    #[test]
    fn test_void_and_valueless_attributes() {
        let nodes = parse_fragment("<p>a<br>b<input disabled></p>").unwrap();
        assert_eq!(nodes.len(), 5);
        assert!(nodes[1..].iter().all(|node| node.parent == Some(0)));
        assert_eq!(nodes[4], element(Some(0), "input", &[("disabled", "")]));
    }

    #[test]
    fn test_entities_are_unescaped() {
        let nodes = parse_fragment("a &amp; b").unwrap();
        assert_eq!(nodes, vec![text(None, "a & b")]);
    }

    #[test]
    fn test_mismatched_tags_are_rejected() {
        assert!(matches!(
            parse_fragment("<div><span></div>"),
            Err(HostError::Markup { .. })
        ));
        assert!(matches!(parse_fragment("</div>"), Err(HostError::Markup { .. })));
        assert!(matches!(parse_fragment("<div>"), Err(HostError::Markup { .. })));
    }

    #[test]
    fn test_comments_are_dropped() {
        let nodes = parse_fragment("<!-- note --><span></span>").unwrap();
        assert_eq!(nodes, vec![element(None, "span", &[])]);
    }

    #[test]
    fn test_deep_nesting_is_flat() {
        let depth = 20_000;
        let markup = format!("{}x{}", "<b>".repeat(depth), "</b>".repeat(depth));
        let nodes = parse_fragment(&markup).unwrap();
        assert_eq!(nodes.len(), depth + 1);
        assert_eq!(nodes[depth], text(Some(depth - 1), "x"));
    }
}
