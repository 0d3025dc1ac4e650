//! Writing a formatted tree back into its DOCX package.
//!
//! The original parts are re-parsed and walked in the same order as on load. Wherever a
//! node's on-disk value differs from the tree, the affected property element is spliced
//! into the original XML text; everything else is left byte-for-byte as it was.

use std::io::{Cursor, Write};
use std::ops::Range;
use std::path::Path;

use zip::write::SimpleFileOptions;

use crate::error::Error;
use crate::model::{Document, FontFormat, LineSpacing, ParagraphFormat, Section};

use super::styles::{StylesInfo, alignment_val, paragraph_style_nodes, parse_styles, read_style};
use super::{
    DOCUMENT_PART, STYLES_PART, WML_NS, body_of, body_paragraphs, open_package,
    paragraph_style_name, pts_to_twips, read_document_part, read_font, read_paragraph_format,
    read_section, read_zip_text, run_nodes, section_nodes, wml,
};

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

// Child sequences from the WordprocessingML schema. Word rejects out-of-order children.
const PARAGRAPH_ORDER: &[&str] = &["pPr"];
const RUN_ORDER: &[&str] = &["rPr"];

const PPR_ORDER: &[&str] = &[
    "pStyle", "keepNext", "keepLines", "pageBreakBefore", "framePr", "widowControl", "numPr",
    "suppressLineNumbers", "pBdr", "shd", "tabs", "suppressAutoHyphens", "kinsoku", "wordWrap",
    "overflowPunct", "topLinePunct", "autoSpaceDE", "autoSpaceDN", "bidi", "adjustRightInd",
    "snapToGrid", "spacing", "ind", "contextualSpacing", "mirrorIndents", "suppressOverlap", "jc",
    "textDirection", "textAlignment", "textboxTightWrap", "outlineLvl", "divId", "cnfStyle",
    "rPr", "sectPr", "pPrChange",
];

const RPR_ORDER: &[&str] = &[
    "rStyle", "rFonts", "b", "bCs", "i", "iCs", "caps", "smallCaps", "strike", "dstrike",
    "outline", "shadow", "emboss", "imprint", "noProof", "snapToGrid", "vanish", "webHidden",
    "color", "spacing", "w", "kern", "position", "sz", "szCs", "highlight", "u", "effect", "bdr",
    "shd", "fitText", "vertAlign", "rtl", "cs", "em", "lang", "eastAsianLayout", "specVanish",
    "oMath", "rPrChange",
];

const SECT_ORDER: &[&str] = &[
    "headerReference", "footerReference", "footnotePr", "endnotePr", "type", "pgSz", "pgMar",
    "paperSrc", "pgBorders", "lnNumType", "pgNumType", "cols", "formProt", "vAlign",
    "noEndnote", "titlePg", "textDirection", "bidi", "rtlGutter", "docGrid", "printerSettings",
    "sectPrChange",
];

const STYLE_ORDER: &[&str] = &[
    "name", "aliases", "basedOn", "next", "link", "autoRedefine", "uiPriority", "semiHidden",
    "unhideWhenUsed", "qFormat", "locked", "personal", "personalCompose", "personalReply",
    "rsid", "pPr", "rPr", "tblPr", "trPr", "tcPr", "tblStylePr",
];

// w:pgMar requires every attribute; sides default to 1in, header/footer to 0.5in.
const PG_MAR_DEFAULTS: &[(&str, &str)] = &[
    ("top", "1440"),
    ("right", "1440"),
    ("bottom", "1440"),
    ("left", "1440"),
    ("header", "720"),
    ("footer", "720"),
    ("gutter", "0"),
];

enum Change {
    /// Set or remove attributes on a leaf property element, creating it when absent.
    Attrs {
        local: &'static str,
        set: Vec<(&'static str, String)>,
        remove: Vec<&'static str>,
        /// Attributes written only when the element is created.
        on_create: &'static [(&'static str, &'static str)],
    },
    Drop(&'static str),
    /// Apply changes inside a property container, creating it when absent.
    Nested {
        local: &'static str,
        order: &'static [&'static str],
        changes: Vec<Change>,
    },
}

impl Change {
    fn set(local: &'static str, set: Vec<(&'static str, String)>) -> Self {
        Change::Attrs {
            local,
            set,
            remove: Vec::new(),
            on_create: &[],
        }
    }

    fn local(&self) -> &'static str {
        match self {
            Change::Attrs { local, .. } | Change::Nested { local, .. } => *local,
            Change::Drop(local) => *local,
        }
    }
}

struct Edit {
    range: Range<usize>,
    text: String,
}

fn qname(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{prefix}:{local}")
    }
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn order_index(order: &[&str], local: &str) -> usize {
    order.iter().position(|o| *o == local).unwrap_or(usize::MAX)
}

fn child_local<'a>(node: roxmltree::Node<'a, 'a>) -> &'a str {
    if node.tag_name().namespace() == Some(WML_NS) {
        node.tag_name().name()
    } else {
        ""
    }
}

/// Byte offset just past the `>` of a node's start tag.
fn start_tag_end(src: &str, node: roxmltree::Node) -> usize {
    let range = node.range();
    let mut quote: Option<u8> = None;
    for (i, &b) in src.as_bytes()[range.start..range.end].iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => return range.start + i + 1,
                _ => {}
            },
        }
    }
    range.end
}

fn is_self_closing(src: &str, node: roxmltree::Node) -> bool {
    let end = start_tag_end(src, node);
    end >= 2 && &src[end - 2..end] == "/>"
}

fn closing_tag_start(src: &str, node: roxmltree::Node) -> usize {
    let range = node.range();
    src[range.clone()]
        .rfind("</")
        .map(|i| range.start + i)
        .unwrap_or(range.end)
}

/// Qualified tag name as written in the source, e.g. `w:p`.
fn source_tag_name(src: &str, node: roxmltree::Node) -> String {
    src[node.range().start + 1..]
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '/' && *c != '>')
        .collect()
}

fn tag_prefix(src: &str, node: roxmltree::Node) -> String {
    let name = source_tag_name(src, node);
    name.split_once(':')
        .map(|(prefix, _)| prefix.to_string())
        .unwrap_or_default()
}

struct Splicer<'s> {
    src: &'s str,
    w: String,
    edits: Vec<Edit>,
}

impl<'s> Splicer<'s> {
    fn new(src: &'s str, xml: &roxmltree::Document) -> Self {
        Self {
            src,
            w: tag_prefix(src, xml.root_element()),
            edits: Vec::new(),
        }
    }

    fn replace(&mut self, range: Range<usize>, text: String) {
        self.edits.push(Edit { range, text });
    }

    fn insert(&mut self, offset: usize, text: String) {
        self.edits.push(Edit {
            range: offset..offset,
            text,
        });
    }

    fn render_attrs(
        &self,
        existing: Option<roxmltree::Node>,
        set: &[(&'static str, String)],
        remove: &[&str],
        on_create: &[(&str, &str)],
    ) -> String {
        let mut out = String::new();
        let mut written: Vec<&str> = Vec::new();
        match existing {
            Some(node) => {
                for attr in node.attributes() {
                    let is_wml = attr.namespace() == Some(WML_NS);
                    if is_wml && remove.contains(&attr.name()) {
                        continue;
                    }
                    let value = match set.iter().find(|(k, _)| is_wml && *k == attr.name()) {
                        Some((k, v)) => {
                            written.push(*k);
                            v.as_str()
                        }
                        None => attr.value(),
                    };
                    let name = match attr.namespace() {
                        Some(XML_NS) => qname("xml", attr.name()),
                        Some(uri) => qname(node.lookup_prefix(uri).unwrap_or(""), attr.name()),
                        None => attr.name().to_string(),
                    };
                    out.push_str(&format!(" {name}=\"{}\"", escape_attr(value)));
                }
            }
            None => {
                for (k, v) in on_create {
                    if let Some((_, value)) = set.iter().find(|(s, _)| s == k) {
                        written.push(*k);
                        out.push_str(&format!(" {}=\"{}\"", qname(&self.w, k), escape_attr(value)));
                    } else {
                        out.push_str(&format!(" {}=\"{}\"", qname(&self.w, k), escape_attr(v)));
                    }
                }
            }
        }
        for (k, v) in set {
            if !written.contains(k) {
                out.push_str(&format!(" {}=\"{}\"", qname(&self.w, k), escape_attr(v)));
            }
        }
        out
    }

    fn render_new(&self, change: &Change) -> Option<String> {
        match change {
            Change::Attrs {
                local,
                set,
                on_create,
                ..
            } => {
                let attrs = self.render_attrs(None, set, &[], on_create);
                Some(format!("<{}{attrs}/>", qname(&self.w, local)))
            }
            Change::Drop(_) => None,
            Change::Nested {
                local,
                order,
                changes,
            } => {
                let mut children: Vec<(usize, String)> = changes
                    .iter()
                    .filter_map(|c| self.render_new(c).map(|t| (order_index(order, c.local()), t)))
                    .collect();
                if children.is_empty() {
                    return None;
                }
                children.sort_by_key(|(i, _)| *i);
                let name = qname(&self.w, local);
                let body: String = children.into_iter().map(|(_, t)| t).collect();
                Some(format!("<{name}>{body}</{name}>"))
            }
        }
    }

    fn change_children(
        &mut self,
        parent: roxmltree::Node<'_, '_>,
        order: &[&str],
        changes: Vec<Change>,
    ) {
        if changes.is_empty() {
            return;
        }
        let children: Vec<_> = parent.children().filter(|n| n.is_element()).collect();
        let mut inserts: Vec<(usize, String)> = Vec::new();

        for change in changes {
            let local = change.local();
            let existing = children.iter().copied().find(|c| child_local(*c) == local);
            match (change, existing) {
                (Change::Drop(_), Some(node)) => self.replace(node.range(), String::new()),
                (Change::Drop(_), None) => {}
                (
                    Change::Attrs {
                        local,
                        set,
                        remove,
                        ..
                    },
                    Some(node),
                ) => {
                    let attrs = self.render_attrs(Some(node), &set, &remove, &[]);
                    let text = format!("<{}{attrs}/>", qname(&self.w, local));
                    self.replace(node.range(), text);
                }
                (
                    Change::Nested {
                        order: inner,
                        changes,
                        ..
                    },
                    Some(node),
                ) if !is_self_closing(self.src, node) => {
                    self.change_children(node, inner, changes);
                }
                (change @ Change::Nested { .. }, Some(node)) => {
                    if let Some(text) = self.render_new(&change) {
                        self.replace(node.range(), text);
                    }
                }
                (change, None) => {
                    if let Some(text) = self.render_new(&change) {
                        inserts.push((order_index(order, local), text));
                    }
                }
            }
        }

        if inserts.is_empty() {
            return;
        }
        inserts.sort_by_key(|(i, _)| *i);

        if is_self_closing(self.src, parent) {
            let range = parent.range();
            let open = self.src[range.start..range.end - 2].trim_end();
            let name = source_tag_name(self.src, parent);
            let body: String = inserts.into_iter().map(|(_, t)| t).collect();
            self.replace(range, format!("{open}>{body}</{name}>"));
            return;
        }

        let close = closing_tag_start(self.src, parent);
        for (index, text) in inserts {
            let offset = children
                .iter()
                .find(|c| order_index(order, child_local(**c)) > index)
                .map(|c| c.range().start)
                .unwrap_or(close);
            self.insert(offset, text);
        }
    }

    /// The rewritten text, or `None` when nothing changed.
    fn finish(mut self) -> Result<Option<String>, Error> {
        if self.edits.is_empty() {
            return Ok(None);
        }
        self.edits.sort_by_key(|e| (e.range.start, e.range.end));
        let mut out = String::with_capacity(self.src.len() + self.edits.len() * 32);
        let mut cursor = 0;
        for edit in &self.edits {
            if edit.range.start < cursor {
                return Err(Error::InvalidDocx("overlapping XML edits".into()));
            }
            out.push_str(&self.src[cursor..edit.range.start]);
            out.push_str(&edit.text);
            cursor = edit.range.end;
        }
        out.push_str(&self.src[cursor..]);
        log::debug!("Applied {} XML edit(s)", self.edits.len());
        Ok(Some(out))
    }
}

fn same_length(a: Option<f32>, b: Option<f32>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => pts_to_twips(a) == pts_to_twips(b),
        _ => false,
    }
}

fn line_attrs(spacing: LineSpacing) -> (i64, &'static str) {
    match spacing {
        LineSpacing::Auto(mult) => ((mult * 240.0).round() as i64, "auto"),
        LineSpacing::Exact(pts) => (pts_to_twips(pts), "exact"),
        LineSpacing::AtLeast(pts) => (pts_to_twips(pts), "atLeast"),
    }
}

fn same_line_spacing(a: Option<LineSpacing>, b: Option<LineSpacing>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => line_attrs(a) == line_attrs(b),
        _ => false,
    }
}

fn format_changes(orig: &ParagraphFormat, new: &ParagraphFormat) -> Vec<Change> {
    let mut changes = Vec::new();

    let mut set = Vec::new();
    let mut remove = Vec::new();
    if !same_length(orig.space_before, new.space_before) {
        match new.space_before {
            Some(v) => {
                set.push(("before", pts_to_twips(v).to_string()));
                remove.push("beforeAutospacing");
            }
            None => remove.push("before"),
        }
    }
    if !same_length(orig.space_after, new.space_after) {
        match new.space_after {
            Some(v) => {
                set.push(("after", pts_to_twips(v).to_string()));
                remove.push("afterAutospacing");
            }
            None => remove.push("after"),
        }
    }
    if !same_line_spacing(orig.line_spacing, new.line_spacing) {
        match new.line_spacing {
            Some(ls) => {
                let (line, rule) = line_attrs(ls);
                set.push(("line", line.to_string()));
                set.push(("lineRule", rule.to_string()));
            }
            None => remove.extend(["line", "lineRule"]),
        }
    }
    if !set.is_empty() || !remove.is_empty() {
        changes.push(Change::Attrs {
            local: "spacing",
            set,
            remove,
            on_create: &[],
        });
    }

    if !same_length(orig.indent_first_line, new.indent_first_line) {
        let change = match new.indent_first_line {
            Some(v) if v >= 0.0 => Change::Attrs {
                local: "ind",
                set: vec![("firstLine", pts_to_twips(v).to_string())],
                remove: vec!["hanging", "hangingChars", "firstLineChars"],
                on_create: &[],
            },
            Some(v) => Change::Attrs {
                local: "ind",
                set: vec![("hanging", pts_to_twips(-v).to_string())],
                remove: vec!["firstLine", "firstLineChars", "hangingChars"],
                on_create: &[],
            },
            None => Change::Attrs {
                local: "ind",
                set: Vec::new(),
                remove: vec!["firstLine", "hanging"],
                on_create: &[],
            },
        };
        changes.push(change);
    }

    if orig.alignment != new.alignment {
        changes.push(match new.alignment {
            Some(a) => Change::set("jc", vec![("val", alignment_val(a).to_string())]),
            None => Change::Drop("jc"),
        });
    }

    changes
}

fn font_changes(orig: &FontFormat, new: &FontFormat) -> Vec<Change> {
    let mut changes = Vec::new();
    if orig.name != new.name {
        changes.push(match &new.name {
            // Theme fonts take precedence over explicit ones, so drop them.
            Some(name) => Change::Attrs {
                local: "rFonts",
                set: vec![("ascii", name.clone()), ("hAnsi", name.clone())],
                remove: vec!["asciiTheme", "hAnsiTheme"],
                on_create: &[],
            },
            None => Change::Attrs {
                local: "rFonts",
                set: Vec::new(),
                remove: vec!["ascii", "hAnsi"],
                on_create: &[],
            },
        });
    }
    let half_points = |size: Option<f32>| size.map(|s| (s * 2.0).round() as i64);
    if half_points(orig.size) != half_points(new.size) {
        changes.push(match half_points(new.size) {
            Some(hp) => Change::set("sz", vec![("val", hp.to_string())]),
            None => Change::Drop("sz"),
        });
    }
    changes
}

fn margin_changes(orig: &Section, new: &Section) -> Vec<Change> {
    let sides = [
        ("top", orig.margin_top, new.margin_top),
        ("bottom", orig.margin_bottom, new.margin_bottom),
        ("left", orig.margin_left, new.margin_left),
        ("right", orig.margin_right, new.margin_right),
    ];
    let set: Vec<(&'static str, String)> = sides
        .into_iter()
        .filter(|(_, old, new)| pts_to_twips(*old) != pts_to_twips(*new))
        .map(|(side, _, new)| (side, pts_to_twips(new).to_string()))
        .collect();
    if set.is_empty() {
        return Vec::new();
    }
    vec![Change::Attrs {
        local: "pgMar",
        set,
        remove: Vec::new(),
        on_create: PG_MAR_DEFAULTS,
    }]
}

fn check_count(what: &str, in_tree: usize, in_package: usize) -> Result<(), Error> {
    if in_tree == in_package {
        return Ok(());
    }
    Err(Error::InvalidDocx(format!(
        "document tree has {in_tree} {what}(s) but the package has {in_package}"
    )))
}

fn rewrite_document(
    xml_content: &str,
    doc: &Document,
    styles: &StylesInfo,
) -> Result<Option<String>, Error> {
    let xml = roxmltree::Document::parse(xml_content)?;
    let body = body_of(&xml)?;
    let mut splicer = Splicer::new(xml_content, &xml);

    let sect_nodes = section_nodes(body);
    check_count("section", doc.sections.len(), sect_nodes.len())?;
    for (node, section) in sect_nodes.into_iter().zip(&doc.sections) {
        let changes = margin_changes(&read_section(node), section);
        splicer.change_children(node, SECT_ORDER, changes);
    }

    let para_nodes: Vec<_> = body_paragraphs(body).collect();
    check_count("paragraph", doc.paragraphs.len(), para_nodes.len())?;
    for (node, para) in para_nodes.into_iter().zip(&doc.paragraphs) {
        let ppr = wml(node, "pPr");
        let mut ppr_changes = format_changes(&read_paragraph_format(ppr), &para.format);
        if paragraph_style_name(ppr, styles) != para.style {
            match styles.id_for_name(&para.style) {
                Some(id) => ppr_changes.push(Change::set("pStyle", vec![("val", id.to_string())])),
                None => log::warn!(
                    "Style '{}' not defined in package, keeping reference",
                    para.style
                ),
            }
        }
        if !ppr_changes.is_empty() {
            splicer.change_children(
                node,
                PARAGRAPH_ORDER,
                vec![Change::Nested {
                    local: "pPr",
                    order: PPR_ORDER,
                    changes: ppr_changes,
                }],
            );
        }

        let runs = run_nodes(node);
        check_count("run", para.runs.len(), runs.len())?;
        for (run_node, run) in runs.into_iter().zip(&para.runs) {
            let changes = font_changes(&read_font(wml(run_node, "rPr")), &run.font);
            if !changes.is_empty() {
                splicer.change_children(
                    run_node,
                    RUN_ORDER,
                    vec![Change::Nested {
                        local: "rPr",
                        order: RPR_ORDER,
                        changes,
                    }],
                );
            }
        }
    }

    splicer.finish()
}

fn rewrite_styles(xml_content: &str, doc: &Document) -> Result<Option<String>, Error> {
    let xml = roxmltree::Document::parse(xml_content)?;
    let mut splicer = Splicer::new(xml_content, &xml);

    for node in paragraph_style_nodes(xml.root_element()) {
        let orig = read_style(node);
        let Some(style) = doc.styles.values().find(|s| s.style_id == orig.style_id) else {
            continue;
        };

        let mut changes = Vec::new();
        let ppr = format_changes(&orig.format, &style.format);
        if !ppr.is_empty() {
            changes.push(Change::Nested {
                local: "pPr",
                order: PPR_ORDER,
                changes: ppr,
            });
        }
        let mut rpr = font_changes(&orig.font, &style.font);
        if orig.bold != style.bold {
            rpr.push(match style.bold {
                Some(true) => Change::Attrs {
                    local: "b",
                    set: Vec::new(),
                    remove: vec!["val"],
                    on_create: &[],
                },
                Some(false) => Change::set("b", vec![("val", "0".to_string())]),
                None => Change::Drop("b"),
            });
        }
        if !rpr.is_empty() {
            changes.push(Change::Nested {
                local: "rPr",
                order: RPR_ORDER,
                changes: rpr,
            });
        }
        splicer.change_children(node, STYLE_ORDER, changes);
    }

    splicer.finish()
}

/// Serialize the tree into a new DOCX package.
pub fn to_bytes(doc: &Document) -> Result<Vec<u8>, Error> {
    let package = doc
        .package
        .as_deref()
        .ok_or_else(|| Error::InvalidDocx("document was not loaded from a DOCX package".into()))?;
    let mut zip = open_package(package)?;

    let styles_xml = read_zip_text(&mut zip, STYLES_PART);
    let styles = parse_styles(styles_xml.as_deref());
    let document_xml = read_document_part(&mut zip)?;

    let new_document = rewrite_document(&document_xml, doc, &styles)?;
    let new_styles = match &styles_xml {
        Some(xml) if !styles.styles.is_empty() => rewrite_styles(xml, doc)?,
        _ => None,
    };

    let mut out = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for i in 0..zip.len() {
        let file = zip.by_index_raw(i)?;
        let name = file.name().to_string();
        let replacement = match name.as_str() {
            DOCUMENT_PART => new_document.as_deref(),
            STYLES_PART => new_styles.as_deref(),
            _ => None,
        };
        match replacement {
            Some(xml) => {
                drop(file);
                let options = SimpleFileOptions::default()
                    .compression_method(zip::CompressionMethod::Deflated);
                out.start_file(name, options)?;
                out.write_all(xml.as_bytes())?;
            }
            None => out.raw_copy_file(file)?,
        }
    }
    Ok(out.finish()?.into_inner())
}

pub fn save(doc: &Document, path: &Path) -> Result<(), Error> {
    let bytes = to_bytes(doc)?;
    std::fs::write(path, &bytes).map_err(Error::Io)
}
