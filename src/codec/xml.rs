//! Streaming XML flattening for metadata full text
//!
//! Turns an XML document into flat `(field name, text)` pairs suitable
//! for full-text indexing: one field per attribute, one field per
//! element with character data, one field for the whole document. Field
//! names are the slash-joined stack of open element local-names under a
//! caller-supplied prefix; namespaces are ignored. This is a
//! deterministic path-to-text lowering, not a general XML-to-object
//! mapping.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::Result;

/// Flatten one XML document.
///
/// Emits, in document order:
/// - `<prefix>/<path>@<attr>` for each attribute, where `<path>` is the
///   element stack joined with `/`;
/// - `<prefix>/<path>` for each element whose accumulated character data
///   is non-empty, at element end;
/// - `<prefix>` once at document end with the whole accumulated text.
///
/// Malformed input fails the whole call.
pub fn flatten_xml(prefix: &str, xml: &str) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut out = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut text_stack: Vec<String> = Vec::new();
    let mut full_text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                path.push(local_name(e.name().as_ref()));
                text_stack.push(String::new());
                emit_attributes(prefix, &path, &e, &mut out)?;
            }
            Event::Empty(e) => {
                path.push(local_name(e.name().as_ref()));
                emit_attributes(prefix, &path, &e, &mut out)?;
                path.pop();
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                append(&mut full_text, text.trim());
                if let Some(buf) = text_stack.last_mut() {
                    append(buf, text.trim());
                }
            }
            Event::CData(e) => {
                let raw = e.into_inner();
                let text = String::from_utf8_lossy(&raw);
                append(&mut full_text, text.trim());
                if let Some(buf) = text_stack.last_mut() {
                    append(buf, text.trim());
                }
            }
            Event::End(_) => {
                let text = text_stack.pop().unwrap_or_default();
                if !text.is_empty() {
                    out.push((format!("{prefix}/{}", path.join("/")), text));
                }
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !full_text.is_empty() {
        out.push((prefix.to_string(), full_text));
    }
    Ok(out)
}

fn emit_attributes(
    prefix: &str,
    path: &[String],
    element: &quick_xml::events::BytesStart<'_>,
    out: &mut Vec<(String, String)>,
) -> Result<()> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        // xmlns declarations are not data
        if attr.key.as_ref().starts_with(b"xmlns") {
            continue;
        }
        let name = local_name(attr.key.as_ref());
        let value = attr.unescape_value()?;
        out.push((
            format!("{prefix}/{}@{name}", path.join("/")),
            value.into_owned(),
        ));
    }
    Ok(())
}

/// Local part of a qualified name; the namespace prefix never reaches a
/// field name.
fn local_name(qname: &[u8]) -> String {
    let local = qname
        .iter()
        .position(|&b| b == b':')
        .map_or(qname, |idx| &qname[idx + 1..]);
    String::from_utf8_lossy(local).into_owned()
}

fn append(buf: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    if !buf.is_empty() {
        buf.push(' ');
    }
    buf.push_str(text);
}
