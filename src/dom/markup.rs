//! Markup parsing and serialization on top of quick-xml.
//!
//! quick-xml is an XML reader, so HTML leniency is layered on here: checks
//! are disabled, void elements never open a scope, stray end tags are
//! dropped and anything left open is closed at end of input.

use compact_str::CompactString;
use quick_xml::{
    Reader, Writer,
    escape::{resolve_predefined_entity, unescape_with},
    events::{BytesEnd, BytesStart, BytesText, Event},
};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::io::Cursor;

use super::{HostError, NodeId, NodeKind, TreeEngine};

pub type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// HTML elements that never have children.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

#[inline]
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

#[inline]
pub fn create_xml_reader(content: &[u8]) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(content);
    reader.config_mut().trim_text(false);
    reader.config_mut().enable_all_checks(false);
    reader
}

// ============================================================================
// Escaping
// ============================================================================

/// Escape character data for serialization.
///
/// `&`, `<`, `>` and U+00A0 become `&amp;`, `&lt;`, `&gt;` and `&nbsp;`.
pub fn escape_data(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '\u{a0}']) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn resolve_entity(name: &str) -> Option<&'static str> {
    match name {
        "nbsp" => Some("\u{a0}"),
        _ => resolve_predefined_entity(name),
    }
}

/// Resolve entity and character references in raw markup text.
///
/// Text containing an unknown reference is kept as written.
pub fn decode_entities(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }
    unescape_with(raw, resolve_entity).unwrap_or(Cow::Borrowed(raw))
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse `markup` and append the resulting nodes to `parent`.
///
/// Elements opened inside a native template land in its content fragment.
pub fn parse_fragment<E>(engine: &mut E, parent: NodeId, markup: &str) -> Result<(), HostError>
where
    E: TreeEngine + ?Sized,
{
    let doc = engine.owner_document(parent);
    let markup = escape_stray_markup(markup);
    let mut reader = create_xml_reader(markup.as_bytes());
    // (insertion point, tag name) for every open element
    let mut open: SmallVec<[(NodeId, CompactString); 16]> = SmallVec::new();
    let mut text = String::new();

    loop {
        let target = open.last().map_or(parent, |(node, _)| *node);
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(HostError::Parse {
                    position: reader.error_position() as u64,
                    message: e.to_string(),
                });
            }
        };

        match event {
            Event::Start(elem) => {
                flush_text(engine, doc, target, &mut text)?;
                let (element, name) = open_element(engine, doc, &elem);
                engine.append_child(target, element)?;
                if !is_void_element(&name) {
                    let insertion = engine.template_content(element).unwrap_or(element);
                    open.push((insertion, name));
                }
            }
            Event::Empty(elem) => {
                flush_text(engine, doc, target, &mut text)?;
                let (element, _) = open_element(engine, doc, &elem);
                engine.append_child(target, element)?;
            }
            Event::End(elem) => {
                flush_text(engine, doc, target, &mut text)?;
                let name = tag_name(elem.name().as_ref());
                if let Some(pos) = open.iter().rposition(|(_, open_name)| *open_name == name) {
                    open.truncate(pos);
                }
            }
            Event::Text(raw) => text.push_str(&decode_entities(&String::from_utf8_lossy(&raw))),
            Event::GeneralRef(reference) => {
                let raw = format!("&{};", String::from_utf8_lossy(&reference));
                text.push_str(&decode_entities(&raw));
            }
            Event::CData(data) => text.push_str(&String::from_utf8_lossy(&data)),
            Event::Comment(data) => {
                flush_text(engine, doc, target, &mut text)?;
                let comment = engine.create_comment(doc, &String::from_utf8_lossy(&data));
                engine.append_child(target, comment)?;
            }
            Event::Eof => {
                flush_text(engine, doc, target, &mut text)?;
                break;
            }
            // declarations, processing instructions and doctypes carry no content
            _ => {}
        }
    }

    Ok(())
}

/// Escape every `&` that does not start a reference and every `<` that does
/// not start a tag, comment or declaration.
///
/// HTML reads both as text; the XML reader would reject the first and open
/// a nameless element for the second. Comments and CDATA pass through as is.
fn escape_stray_markup(markup: &str) -> Cow<'_, str> {
    let mut out = String::new();
    let mut copied = 0;
    let mut pos = 0;

    while let Some(offset) = markup[pos..].find(['&', '<']) {
        pos += offset;
        let rest = &markup[pos..];
        let opaque = [("<!--", "-->"), ("<![CDATA[", "]]>")]
            .into_iter()
            .find(|(open, _)| rest.starts_with(open));
        if let Some((_, close)) = opaque {
            pos += rest.find(close).map_or(rest.len(), |end| end + close.len());
            continue;
        }

        let after = &rest[1..];
        let replacement = if rest.starts_with('&') {
            (!starts_reference(after)).then_some("&amp;")
        } else {
            (!starts_tag(after)).then_some("&lt;")
        };
        if let Some(replacement) = replacement {
            out.push_str(&markup[copied..pos]);
            out.push_str(replacement);
            copied = pos + 1;
        }
        pos += 1;
    }

    if out.is_empty() {
        return Cow::Borrowed(markup);
    }
    out.push_str(&markup[copied..]);
    Cow::Owned(out)
}

/// `name;`, `#digits;` or `#xhex;`
fn starts_reference(after: &str) -> bool {
    let name = after.strip_prefix('#').unwrap_or(after);
    let len = name.bytes().take_while(|b| b.is_ascii_alphanumeric()).count();
    len > 0 && name.as_bytes().get(len) == Some(&b';')
}

fn starts_tag(after: &str) -> bool {
    let mut bytes = after.bytes();
    match bytes.next() {
        Some(b'!' | b'?') => true,
        Some(b'/') => bytes.next().is_some_and(|b| b.is_ascii_alphabetic()),
        Some(b) => b.is_ascii_alphabetic(),
        None => false,
    }
}

#[inline]
fn tag_name(raw: &[u8]) -> CompactString {
    CompactString::from(String::from_utf8_lossy(raw).to_ascii_lowercase())
}

fn open_element<E>(engine: &mut E, doc: NodeId, elem: &BytesStart<'_>) -> (NodeId, CompactString)
where
    E: TreeEngine + ?Sized,
{
    let name = tag_name(elem.name().as_ref());
    let element = engine.create_element(doc, &name);
    for attr in elem.html_attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
        let raw = String::from_utf8_lossy(attr.value.as_ref());
        engine.set_attribute(element, &key, &decode_entities(&raw));
    }
    (element, name)
}

fn flush_text<E>(
    engine: &mut E,
    doc: NodeId,
    target: NodeId,
    text: &mut String,
) -> Result<(), HostError>
where
    E: TreeEngine + ?Sized,
{
    if !text.is_empty() {
        let node = engine.create_text(doc, text);
        engine.append_child(target, node)?;
        text.clear();
    }
    Ok(())
}

// ============================================================================
// Serialization
// ============================================================================

/// Serialize `node` itself.
///
/// `content_of` maps an element to the node whose children stand in for its
/// own (template content); elements it returns `None` for serialize their
/// tree children.
pub fn serialize_node<E, F>(engine: &E, node: NodeId, content_of: &F) -> Result<String, HostError>
where
    E: TreeEngine + ?Sized,
    F: Fn(NodeId) -> Option<NodeId>,
{
    let mut writer = XmlWriter::new(Cursor::new(Vec::new()));
    write_node(engine, node, &mut writer, content_of)?;
    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}

/// Serialize the children of `node`, concatenated.
pub fn serialize_children<E, F>(
    engine: &E,
    node: NodeId,
    content_of: &F,
) -> Result<String, HostError>
where
    E: TreeEngine + ?Sized,
    F: Fn(NodeId) -> Option<NodeId>,
{
    let mut writer = XmlWriter::new(Cursor::new(Vec::new()));
    for child in engine.children(node) {
        write_node(engine, child, &mut writer, content_of)?;
    }
    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}

#[inline]
fn emit(writer: &mut XmlWriter, event: Event<'_>) -> Result<(), HostError> {
    writer
        .write_event(event)
        .map_err(|e| HostError::Write(e.to_string()))
}

fn write_node<E, F>(
    engine: &E,
    node: NodeId,
    writer: &mut XmlWriter,
    content_of: &F,
) -> Result<(), HostError>
where
    E: TreeEngine + ?Sized,
    F: Fn(NodeId) -> Option<NodeId>,
{
    match engine.kind(node) {
        NodeKind::Element => {
            let name = engine.local_name(node).unwrap_or_default();
            let mut start = BytesStart::new(name);
            for (key, value) in engine.attributes(node) {
                start.push_attribute((key, value));
            }

            if is_void_element(name) {
                return emit(writer, Event::Empty(start));
            }

            emit(writer, Event::Start(start))?;
            let holder = content_of(node).unwrap_or(node);
            for child in engine.children(holder) {
                write_node(engine, child, writer, content_of)?;
            }
            emit(writer, Event::End(BytesEnd::new(name)))
        }
        NodeKind::Text => {
            let data = engine.text(node).unwrap_or_default();
            emit(writer, Event::Text(BytesText::from_escaped(escape_data(data))))
        }
        NodeKind::Comment => {
            let data = engine.text(node).unwrap_or_default();
            emit(writer, Event::Comment(BytesText::from_escaped(data)))
        }
        NodeKind::Document | NodeKind::Fragment => {
            for child in engine.children(node) {
                write_node(engine, child, writer, content_of)?;
            }
            Ok(())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
