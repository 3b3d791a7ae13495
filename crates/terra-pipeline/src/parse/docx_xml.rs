//! Minimal OOXML body walker: pulls top-level `<w:p>` and `<w:tbl>`
//! elements out of `word/document.xml` in document order, without
//! building a full DOM. Paragraph style ids and run text are read
//! inline; table cells recurse one level to absorb their own paragraphs.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

pub struct RawParagraph {
    pub style_id: Option<String>,
    pub text: String,
}

pub struct RawTable {
    pub rows: Vec<Vec<String>>,
}

pub enum BodyElement {
    Paragraph(RawParagraph),
    Table(RawTable),
}

fn local_name(qname: &[u8]) -> &[u8] {
    match qname.iter().rposition(|&b| b == b':') {
        Some(idx) => &qname[idx + 1..],
        None => qname,
    }
}

fn attr_val(e: &quick_xml::events::BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| local_name(a.key.as_ref()) == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Reads one `<w:p>` element's style id and concatenated run text; the
/// caller has already consumed the opening `Start` event.
fn read_paragraph(reader: &mut Reader<&[u8]>, buf: &mut Vec<u8>) -> RawParagraph {
    let mut depth = 0i32;
    let mut style_id = None;
    let mut text = String::new();
    loop {
        buf.clear();
        match reader.read_event_into(buf) {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e.name().as_ref());
                if name == b"p" {
                    depth += 1;
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name = local_name(e.name().as_ref());
                if name == b"pStyle" {
                    style_id = attr_val(e, b"val");
                } else if name == b"br" || name == b"tab" {
                    text.push(' ');
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Ok(t) = e.unescape() {
                    text.push_str(&t);
                }
            }
            Ok(Event::End(ref e)) => {
                let name = local_name(e.name().as_ref());
                if name == b"p" {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    RawParagraph { style_id, text }
}

fn read_cell(reader: &mut Reader<&[u8]>, buf: &mut Vec<u8>) -> String {
    let mut depth = 0i32;
    let mut text = String::new();
    let mut first = true;
    loop {
        buf.clear();
        match reader.read_event_into(buf) {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e.name().as_ref());
                if name == b"tc" {
                    depth += 1;
                } else if name == b"p" && depth == 0 {
                    let para = read_paragraph(reader, buf);
                    if !first {
                        text.push('\n');
                    }
                    first = false;
                    text.push_str(&para.text);
                }
            }
            Ok(Event::End(ref e)) => {
                let name = local_name(e.name().as_ref());
                if name == b"tc" {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    text
}

fn read_row(reader: &mut Reader<&[u8]>, buf: &mut Vec<u8>) -> Vec<String> {
    let mut depth = 0i32;
    let mut cells = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(buf) {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e.name().as_ref());
                if name == b"tr" {
                    depth += 1;
                } else if name == b"tc" && depth == 0 {
                    cells.push(read_cell(reader, buf));
                }
            }
            Ok(Event::End(ref e)) => {
                let name = local_name(e.name().as_ref());
                if name == b"tr" {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    cells
}

fn read_table(reader: &mut Reader<&[u8]>, buf: &mut Vec<u8>) -> RawTable {
    let mut depth = 0i32;
    let mut rows = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(buf) {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e.name().as_ref());
                if name == b"tbl" {
                    depth += 1;
                } else if name == b"tr" && depth == 0 {
                    rows.push(read_row(reader, buf));
                }
            }
            Ok(Event::End(ref e)) => {
                let name = local_name(e.name().as_ref());
                if name == b"tbl" {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    RawTable { rows }
}

/// Walks `word/document.xml`'s `<w:body>`, returning its direct `<w:p>`
/// and `<w:tbl>` children in source order. Paragraphs and tables nested
/// inside a table cell are absorbed by the cell reader, not re-emitted
/// as top-level elements.
pub fn walk_body(xml: &str) -> Vec<BodyElement> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut out = Vec::new();
    let mut in_body = false;
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e.name().as_ref());
                if name == b"body" {
                    in_body = true;
                } else if in_body && name == b"p" {
                    out.push(BodyElement::Paragraph(read_paragraph(&mut reader, &mut buf)));
                } else if in_body && name == b"tbl" {
                    out.push(BodyElement::Table(read_table(&mut reader, &mut buf)));
                }
            }
            Ok(Event::End(ref e)) => {
                if local_name(e.name().as_ref()) == b"body" {
                    in_body = false;
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    out
}
