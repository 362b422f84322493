//! Conversion between MxGraph XML text and ordered cell sequences.
//!
//! An MxGraph document is one `mxGraphModel` node with a single `root` child,
//! and `root` holds a flat list of `mxCell` elements. Cell order is the
//! render (z-)order.
//!
//! ```text
//! <mxGraphModel>
//!     <root>
//!         <mxCell id="0"/>
//!         <mxCell id="1" parent="0"/>
//!     </root>
//! </mxGraphModel>
//! ```

use super::cell::{Cell, XmlElement, XmlNode};
use crate::error::{Result, WhiteboardError};
use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use std::borrow::Cow;
use std::io;

/// Tag of the elements collected as cells.
pub const CELL_TAG: &str = "mxCell";
/// Outer container tag.
pub const MODEL_TAG: &str = "mxGraphModel";
/// Inner container tag.
pub const ROOT_TAG: &str = "root";

/// Deepest element nesting `parse` accepts.
pub const MAX_NESTING_DEPTH: usize = 256;

const INDENT_SIZE: usize = 4;

/// Parse document text into its cells, in document order.
///
/// Every `mxCell` is collected wherever it appears; cells nested inside a
/// collected cell stay part of that cell's content. Other elements are dropped.
/// Empty or whitespace-only text is an empty document.
///
/// # Errors
///
/// - [`WhiteboardError::Parse`] if the text is not well-formed XML or nests
///   elements deeper than [`MAX_NESTING_DEPTH`]
/// - [`WhiteboardError::MalformedElement`] if a cell has no `id`
///
/// # Examples
///
/// ```
/// use whiteboard_sync::document::parse;
///
/// let cells = parse(r#"<mxGraphModel><root><mxCell id="0"/><mxCell id="1" parent="0"/></root></mxGraphModel>"#).unwrap();
/// assert_eq!(cells.len(), 2);
/// assert_eq!(cells[1].id(), "1");
/// ```
pub fn parse(text: &str) -> Result<Vec<Cell>> {
    let mut cells = Vec::new();
    if let Some(root) = parse_tree(text)? {
        collect_cells(root, &mut cells)?;
    }
    Ok(cells)
}

/// Serialize cells inside the fixed `mxGraphModel`/`root` container.
///
/// Output is deterministic: attributes sorted by name, four-space indentation,
/// no XML declaration, blank lines removed, every line ending in `\n`.
pub fn render(cells: &[Cell]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_SIZE);

    writer
        .write_event(Event::Start(BytesStart::new(MODEL_TAG)))
        .map_err(write_error)?;
    if cells.is_empty() {
        writer
            .write_event(Event::Empty(BytesStart::new(ROOT_TAG)))
            .map_err(write_error)?;
    } else {
        writer
            .write_event(Event::Start(BytesStart::new(ROOT_TAG)))
            .map_err(write_error)?;
        for cell in cells {
            write_element(&mut writer, cell.element())?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(ROOT_TAG)))
            .map_err(write_error)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(MODEL_TAG)))
        .map_err(write_error)?;

    let text = String::from_utf8(writer.into_inner())
        .map_err(|e| WhiteboardError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
    Ok(remove_blank_lines(&text))
}

/// Parse text into its single root element, or `None` for blank input.
fn parse_tree(text: &str) -> Result<Option<XmlElement>> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            WhiteboardError::Parse(format!("at byte {}: {}", reader.buffer_position(), e))
        })?;

        match event {
            Event::Start(start) => {
                // Bounds the recursion in cell hashing and rendering.
                if stack.len() >= MAX_NESTING_DEPTH {
                    return Err(WhiteboardError::Parse(format!(
                        "at byte {}: elements nested deeper than {}",
                        reader.buffer_position(),
                        MAX_NESTING_DEPTH
                    )));
                }
                stack.push(element_from_start(&start)?);
            }
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                attach(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| WhiteboardError::Parse("unbalanced closing tag".into()))?;
                attach(element, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                let value = text
                    .unescape()
                    .map_err(|e| WhiteboardError::Parse(e.to_string()))?;
                push_text(value.into_owned(), &mut stack)?;
            }
            Event::CData(data) => {
                let value = String::from_utf8(data.into_inner().into_owned())
                    .map_err(|e| WhiteboardError::Parse(e.to_string()))?;
                push_text(value, &mut stack)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes carry no cells.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(WhiteboardError::Parse(format!(
            "unexpected end of input inside <{}>",
            open.name
        )));
    }
    Ok(root)
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| WhiteboardError::Parse(e.to_string()))?
        .to_string();
    let mut element = XmlElement::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| WhiteboardError::Parse(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| WhiteboardError::Parse(e.to_string()))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| WhiteboardError::Parse(e.to_string()))?
            .into_owned();
        element.attributes.insert(key, value);
    }

    Ok(element)
}

fn attach(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(XmlNode::Element(element));
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(WhiteboardError::Parse(format!(
            "second root element <{}>",
            element.name
        ))),
    }
}

fn push_text(text: String, stack: &mut [XmlElement]) -> Result<()> {
    if text.trim().is_empty() {
        return Ok(());
    }
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(XmlNode::Text(text));
            Ok(())
        }
        None => Err(WhiteboardError::Parse("text outside of the root element".into())),
    }
}

fn collect_cells(element: XmlElement, cells: &mut Vec<Cell>) -> Result<()> {
    if element.name == CELL_TAG {
        cells.push(Cell::new(element)?);
        return Ok(());
    }
    for child in element.children {
        if let XmlNode::Element(child) = child {
            collect_cells(child, cells)?;
        }
    }
    Ok(())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<()> {
    let escaped: Vec<(&str, String)> = element
        .attributes
        .iter()
        .map(|(key, value)| (key.as_str(), escape_markup(value)))
        .collect();

    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &escaped {
        start.push_attribute(Attribute {
            key: QName(key.as_bytes()),
            value: Cow::Borrowed(value.as_bytes()),
        });
    }

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(write_error);
    }

    writer.write_event(Event::Start(start)).map_err(write_error)?;
    for child in &element.children {
        match child {
            XmlNode::Element(child) => write_element(writer, child)?,
            XmlNode::Text(text) => {
                let escaped = escape_markup(text);
                writer
                    .write_event(Event::Text(BytesText::from_escaped(escaped.as_str())))
                    .map_err(write_error)?;
            }
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(write_error)
}

/// Escape markup characters plus line breaks and tabs, so that values
/// survive indentation and blank-line removal unchanged.
fn escape_markup(value: &str) -> String {
    let escaped = escape(value);
    if !escaped.contains(['\n', '\r', '\t']) {
        return escaped.into_owned();
    }
    let mut out = String::with_capacity(escaped.len() + 8);
    for ch in escaped.chars() {
        match ch {
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            other => out.push(other),
        }
    }
    out
}

fn remove_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 1);
    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn write_error(err: quick_xml::Error) -> WhiteboardError {
    WhiteboardError::Io(io::Error::new(io::ErrorKind::Other, err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_CELLS: &str = r#"<mxGraphModel dx="1426" dy="794">
  <root>
    <mxCell id="0"/>
    <mxCell id="1" parent="0"/>
    <mxCell id="2" value="Hello" style="rounded=1;" vertex="1" parent="1">
      <mxGeometry x="40" y="40" width="120" height="60" as="geometry"/>
    </mxCell>
  </root>
</mxGraphModel>"#;

    #[test]
    fn test_parse_collects_cells_in_order() {
        let cells = parse(TWO_CELLS).unwrap();
        let ids: Vec<&str> = cells.iter().map(Cell::id).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
        assert_eq!(cells[2].element().children.len(), 1);
    }

    #[test]
    fn test_parse_empty_text_is_empty_document() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("  \n ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed_markup() {
        assert!(matches!(
            parse("<mxGraphModel><root><mxCell id=\"0\"></root></mxGraphModel>"),
            Err(WhiteboardError::Parse(_))
        ));
        assert!(matches!(
            parse("<mxGraphModel><root>"),
            Err(WhiteboardError::Parse(_))
        ));
        assert!(matches!(parse("just text"), Err(WhiteboardError::Parse(_))));
    }

    #[test]
    fn test_parse_rejects_cell_without_id() {
        let result = parse("<mxGraphModel><root><mxCell parent=\"0\"/></root></mxGraphModel>");
        assert!(matches!(result, Err(WhiteboardError::MalformedElement(_))));
    }

    #[test]
    fn test_parse_drops_foreign_elements() {
        let text = r#"<mxfile><diagram><mxGraphModel><root><mxCell id="0"/><note id="x"/></root></mxGraphModel></diagram></mxfile>"#;
        let cells = parse(text).unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].id(), "0");
    }

    #[test]
    fn test_parse_ignores_whitespace_and_attribute_order() {
        let compact = r#"<mxGraphModel><root><mxCell id="2" parent="1" vertex="1"><mxGeometry x="1" as="geometry"/></mxCell></root></mxGraphModel>"#;
        let spaced = "<mxGraphModel>\n <root>\n  <mxCell vertex=\"1\" parent=\"1\" id=\"2\">\n   <mxGeometry as=\"geometry\" x=\"1\"/>\n  </mxCell>\n </root>\n</mxGraphModel>";
        assert_eq!(parse(compact).unwrap(), parse(spaced).unwrap());
    }

    #[test]
    fn test_render_layout() {
        let cells = parse(r#"<mxGraphModel><root><mxCell parent="0" id="1"/></root></mxGraphModel>"#).unwrap();
        let rendered = render(&cells).unwrap();
        assert_eq!(
            rendered,
            "<mxGraphModel>\n    <root>\n        <mxCell id=\"1\" parent=\"0\"/>\n    </root>\n</mxGraphModel>\n"
        );
    }

    #[test]
    fn test_render_empty_document() {
        let rendered = render(&[]).unwrap();
        assert_eq!(rendered, "<mxGraphModel>\n    <root/>\n</mxGraphModel>\n");
        assert!(parse(&rendered).unwrap().is_empty());
    }

    #[test]
    fn test_render_has_no_blank_lines() {
        let rendered = render(&parse(TWO_CELLS).unwrap()).unwrap();
        assert!(rendered.lines().all(|line| !line.trim().is_empty()));
        assert!(!rendered.starts_with("<?xml"));
    }

    #[test]
    fn test_round_trip_preserves_cells() {
        let cells = parse(TWO_CELLS).unwrap();
        let again = parse(&render(&cells).unwrap()).unwrap();
        assert_eq!(cells, again);
    }

    #[test]
    fn test_round_trip_escapes_special_characters() {
        let text = r#"<mxGraphModel><root><mxCell id="9" value="a &lt; b &amp; &quot;c&quot;&#10;&#10;line"/></root></mxGraphModel>"#;
        let cells = parse(text).unwrap();
        assert_eq!(
            cells[0].element().attribute("value"),
            Some("a < b & \"c\"\n\nline")
        );
        let again = parse(&render(&cells).unwrap()).unwrap();
        assert_eq!(cells, again);
    }

    fn nested(depth: usize) -> String {
        format!(
            r#"<mxGraphModel><root><mxCell id="2">{}{}</mxCell></root></mxGraphModel>"#,
            "<g>".repeat(depth),
            "</g>".repeat(depth)
        )
    }

    #[test]
    fn test_parse_rejects_excessive_nesting() {
        let result = parse(&nested(200_000));
        assert!(matches!(result, Err(WhiteboardError::Parse(_))));
    }

    #[test]
    fn test_parse_accepts_nesting_up_to_limit() {
        // mxGraphModel, root and mxCell sit above the nested groups.
        let cells = parse(&nested(MAX_NESTING_DEPTH - 3)).unwrap();
        assert_eq!(cells.len(), 1);
        assert!(render(&cells).is_ok());

        let result = parse(&nested(MAX_NESTING_DEPTH - 2));
        assert!(matches!(result, Err(WhiteboardError::Parse(_))));
    }
}
