//! Heading detection, level-counter numbering, and the de-duplication
//! heuristics of spec §4.1 stage 2: style/appendix/numeric-prefix level
//! resolution, immediate-duplicate skip, TOC-region suppression, and the
//! bounded repeated-title window.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, VecDeque};
use terra_core::config::ParseConfig;
use terra_core::model::BlockType;

use super::docx_xml::BodyElement;

pub struct ParsedOutlineNode {
    pub level: u8,
    pub node_no: String,
    pub title: String,
    pub parent_idx: Option<usize>,
}

pub struct ParsedBlock {
    pub outline_idx: Option<usize>,
    pub block_type: BlockType,
    pub text: String,
    pub table_idx: Option<usize>,
}

pub struct ParsedTable {
    pub outline_idx: Option<usize>,
    pub table_no: Option<String>,
    pub title: Option<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Default)]
pub struct ParsedStructure {
    pub outline: Vec<ParsedOutlineNode>,
    pub blocks: Vec<ParsedBlock>,
    pub tables: Vec<ParsedTable>,
}

impl std::fmt::Debug for ParsedOutlineNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({}) {}", self.node_no, self.level, self.title)
    }
}
impl std::fmt::Debug for ParsedBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}:{:.20}", self.block_type, self.text)
    }
}
impl std::fmt::Debug for ParsedTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "table {:?} rows={}", self.table_no, self.rows.len())
    }
}

const APPENDIX_PREFIXES: [&str; 3] = ["附表", "附件", "附图"];

static NUM_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)*)\s*(.*)$").unwrap());
static TABLE_TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^表([\d.\-]+)\s*[:：]?\s*(.+)$").unwrap());
static TRAILING_PAGE_NO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\d](\d{1,4})\s*$").unwrap());

fn appendix_level(text: &str) -> Option<u8> {
    let trimmed = text.trim();
    for prefix in APPENDIX_PREFIXES {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            let has_digit = rest.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false);
            return Some(if has_digit { 2 } else { 1 });
        }
    }
    None
}

/// Numeric-dot-prefix heading detection: excludes date-like runs (a
/// leading segment > 100, or text immediately followed by "年").
fn numeric_level(text: &str) -> Option<u8> {
    let trimmed = text.trim();
    let caps = NUM_PREFIX_RE.captures(trimmed)?;
    let num_part = caps.get(1)?.as_str();
    let rest = caps.get(2)?.as_str().trim();
    if rest.is_empty() {
        return None;
    }
    let first_seg: i64 = num_part.split('.').next().unwrap_or("").parse().unwrap_or(0);
    if first_seg > 100 {
        return None;
    }
    if rest.starts_with('年') {
        return None;
    }
    let first_char = rest.chars().next()?;
    if !first_char.is_alphabetic() {
        return None;
    }
    Some(num_part.split('.').count().min(6) as u8)
}

fn detect_heading_level(style_id: Option<&str>, text: &str, style_levels: &HashMap<String, u8>) -> Option<u8> {
    if let Some(sid) = style_id {
        if let Some(&lvl) = style_levels.get(sid) {
            return Some(lvl);
        }
    }
    if let Some(lvl) = appendix_level(text) {
        return Some(lvl);
    }
    numeric_level(text)
}

fn ends_with_bare_page_number(text: &str) -> bool {
    TRAILING_PAGE_NO_RE.is_match(text.trim())
}

struct Builder<'a> {
    cfg: ParseConfig,
    style_levels: &'a HashMap<String, u8>,
    counters: [u32; 6],
    last_idx_at_level: [Option<usize>; 7],
    current_outline_idx: Option<usize>,
    last_heading: Option<(String, u8, Option<usize>)>,
    inserted_titles: VecDeque<String>,
    in_toc: bool,
    pending_table_caption: Option<(Option<String>, String)>,
    out: ParsedStructure,
}

impl<'a> Builder<'a> {
    fn new(style_levels: &'a HashMap<String, u8>, cfg: ParseConfig) -> Self {
        Self {
            cfg,
            style_levels,
            counters: [0; 6],
            last_idx_at_level: [None; 7],
            current_outline_idx: None,
            last_heading: None,
            inserted_titles: VecDeque::new(),
            in_toc: false,
            pending_table_caption: None,
            out: ParsedStructure::default(),
        }
    }

    fn is_repeated_in_window(&self, title: &str) -> bool {
        if self.inserted_titles.len() <= self.cfg.repeated_title_min_seen {
            return false;
        }
        self.inserted_titles
            .iter()
            .take(self.cfg.repeated_title_window)
            .any(|t| t == title)
    }

    fn remember_title(&mut self, title: &str) {
        self.inserted_titles.push_back(title.to_string());
        while self.inserted_titles.len() > self.cfg.repeated_title_buffer_cap {
            self.inserted_titles.pop_front();
        }
    }

    fn insert_heading(&mut self, level: u8, title: &str) {
        let level_idx = (level - 1) as usize;
        let parent_idx = if level_idx == 0 { None } else { self.last_idx_at_level[level as usize - 1] };

        if let Some((t, l, p)) = &self.last_heading {
            if t == title && *l == level && *p == parent_idx {
                return; // rule (i): immediate duplicate
            }
        }
        if self.is_repeated_in_window(title) {
            return; // rule (iii): repeated-outline artifact window
        }

        self.counters[level_idx] += 1;
        for c in self.counters.iter_mut().skip(level as usize) {
            *c = 0;
        }
        let node_no: String = self.counters[..level as usize]
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(".");

        let idx = self.out.outline.len();
        self.out.outline.push(ParsedOutlineNode {
            level,
            node_no,
            title: title.to_string(),
            parent_idx,
        });
        self.out.blocks.push(ParsedBlock {
            outline_idx: Some(idx),
            block_type: BlockType::Heading,
            text: title.to_string(),
            table_idx: None,
        });

        self.last_idx_at_level[level as usize] = Some(idx);
        self.current_outline_idx = Some(idx);
        self.last_heading = Some((title.to_string(), level, parent_idx));
        self.remember_title(title);
    }

    fn handle_paragraph(&mut self, style_id: Option<&str>, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        if trimmed == "目录" {
            self.in_toc = true;
        }

        let level = detect_heading_level(style_id, trimmed, self.style_levels);

        if let Some(level) = level {
            if self.in_toc {
                if level == 1 && !ends_with_bare_page_number(trimmed) {
                    self.in_toc = false; // exits TOC on a plain level-1 heading
                } else {
                    return; // absorbed as a TOC entry, not inserted
                }
            }
            self.insert_heading(level, trimmed);
            return;
        }

        if let Some(caps) = TABLE_TITLE_RE.captures(trimmed) {
            let table_no = caps.get(1).map(|m| m.as_str().to_string());
            let title = caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
            self.pending_table_caption = Some((table_no, title));
        } else {
            self.pending_table_caption = None;
        }

        self.out.blocks.push(ParsedBlock {
            outline_idx: self.current_outline_idx,
            block_type: BlockType::Para,
            text: trimmed.to_string(),
            table_idx: None,
        });
    }

    fn handle_table(&mut self, rows: Vec<Vec<String>>) {
        let (table_no, title) = self.pending_table_caption.take().unzip();
        let table_idx = self.out.tables.len();
        self.out.tables.push(ParsedTable {
            outline_idx: self.current_outline_idx,
            table_no,
            title,
            rows,
        });
        self.out.blocks.push(ParsedBlock {
            outline_idx: self.current_outline_idx,
            block_type: BlockType::Table,
            text: String::new(),
            table_idx: Some(table_idx),
        });
    }
}

pub fn build_structure(elements: Vec<BodyElement>, style_levels: &HashMap<String, u8>, cfg: ParseConfig) -> ParsedStructure {
    let mut builder = Builder::new(style_levels, cfg);
    for el in elements {
        match el {
            BodyElement::Paragraph(p) => builder.handle_paragraph(p.style_id.as_deref(), &p.text),
            BodyElement::Table(t) => builder.handle_table(t.rows),
        }
    }
    builder.out
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::docx_xml::RawParagraph;

    fn para(text: &str) -> BodyElement {
        BodyElement::Paragraph(RawParagraph { style_id: None, text: text.to_string() })
    }

    #[test]
    fn basic_outline_with_node_numbers() {
        let elements = vec![para("1 综合说明"), para("1.1 项目概况"), para("2 防治措施")];
        let structure = build_structure(elements, &HashMap::new(), ParseConfig::default());
        assert_eq!(structure.outline.len(), 3);
        assert_eq!(structure.outline[0].node_no, "1");
        assert_eq!(structure.outline[0].level, 1);
        assert_eq!(structure.outline[1].node_no, "1.1");
        assert_eq!(structure.outline[1].level, 2);
        assert_eq!(structure.outline[1].parent_idx, Some(0));
        assert_eq!(structure.outline[2].node_no, "2");
        assert_eq!(structure.outline[2].level, 1);
        // a heading block is inserted for every outline node, at increasing order-index
        let heading_blocks: Vec<_> = structure.blocks.iter().filter(|b| b.block_type == BlockType::Heading).collect();
        assert_eq!(heading_blocks.len(), 3);
    }

    #[test]
    fn rejects_date_like_run() {
        let elements = vec![para("2023年11月9日 项目启动")];
        let structure = build_structure(elements, &HashMap::new(), ParseConfig::default());
        assert!(structure.outline.is_empty());
    }

    #[test]
    fn accepts_dotted_numeric_heading() {
        let elements = vec![para("1.2.3 项目概况")];
        let structure = build_structure(elements, &HashMap::new(), ParseConfig::default());
        assert_eq!(structure.outline.len(), 1);
        assert_eq!(structure.outline[0].level, 3);
        assert_eq!(structure.outline[0].node_no, "0.0.1");
    }

    #[test]
    fn toc_repeat_is_absorbed() {
        let elements = vec![
            para("1 综合说明"),
            para("目录"),
            para("1 综合说明 2"), // TOC line: same title, ends with a bare page number
        ];
        let structure = build_structure(elements, &HashMap::new(), ParseConfig::default());
        assert_eq!(structure.outline.len(), 1, "TOC repeat of an already-seen title must be dropped");
    }

    #[test]
    fn immediate_duplicate_heading_is_skipped() {
        let elements = vec![para("1 综合说明"), para("1 综合说明")];
        let structure = build_structure(elements, &HashMap::new(), ParseConfig::default());
        assert_eq!(structure.outline.len(), 1);
    }

    #[test]
    fn appendix_marker_levels() {
        let elements = vec![para("附件"), para("附件1")];
        let structure = build_structure(elements, &HashMap::new(), ParseConfig::default());
        assert_eq!(structure.outline.len(), 2);
        assert_eq!(structure.outline[0].level, 1);
        assert_eq!(structure.outline[1].level, 2);
    }

    #[test]
    fn table_title_is_read_from_preceding_paragraph() {
        let elements = vec![
            para("表3-1：挖填方量统计表"),
            BodyElement::Table(super::super::docx_xml::RawTable {
                rows: vec![vec!["挖方".into(), "填方".into()], vec!["100".into(), "80".into()]],
            }),
        ];
        let structure = build_structure(elements, &HashMap::new(), ParseConfig::default());
        assert_eq!(structure.tables.len(), 1);
        assert_eq!(structure.tables[0].table_no.as_deref(), Some("3-1"));
        assert_eq!(structure.tables[0].title.as_deref(), Some("挖填方量统计表"));
    }
}
