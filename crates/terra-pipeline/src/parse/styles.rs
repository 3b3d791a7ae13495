//! Reads `word/styles.xml`'s paragraph styles into a `styleId -> level`
//! map, recognizing `Heading N` / `heading N` / `标题N` style names —
//! resolution (a) of spec §4.1 stage 2.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

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

fn level_from_style_name(name: &str) -> Option<u8> {
    let lower = name.to_lowercase();
    for n in 1u8..=6 {
        if lower == format!("heading {n}") || lower == format!("heading{n}") || name == format!("标题{n}") {
            return Some(n);
        }
    }
    None
}

pub fn heading_levels(xml: &str) -> HashMap<String, u8> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut out = HashMap::new();
    let mut cur_id: Option<String> = None;
    let mut cur_name: Option<String> = None;
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = local_name(e.name().as_ref());
                if name == b"style" {
                    cur_id = attr_val(e, b"styleId");
                    cur_name = None;
                } else if name == b"name" {
                    cur_name = attr_val(e, b"val");
                }
            }
            Ok(Event::End(ref e)) => {
                if local_name(e.name().as_ref()) == b"style" {
                    if let (Some(id), Some(name)) = (cur_id.take(), cur_name.take()) {
                        if let Some(level) = level_from_style_name(&name) {
                            out.insert(id, level);
                        }
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_heading_style_names() {
        let xml = r#"<w:styles xmlns:w="x">
            <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style>
            <w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/></w:style>
            <w:style w:type="paragraph" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
        </w:styles>"#;
        let map = heading_levels(xml);
        assert_eq!(map.get("Heading1"), Some(&1));
        assert_eq!(map.get("Heading2"), Some(&2));
        assert_eq!(map.get("Normal"), None);
    }
}
