mod styles;
mod write;

use std::io::{Cursor, Read, Seek};
use std::path::Path;
use std::time::Instant;

use crate::error::Error;
use crate::model::{Document, FontFormat, LineSpacing, Paragraph, ParagraphFormat, Run, Section};

use styles::{StylesInfo, parse_alignment, parse_styles};

pub use write::{save, to_bytes};

pub(super) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub(super) const DOCUMENT_PART: &str = "word/document.xml";
pub(super) const STYLES_PART: &str = "word/styles.xml";

pub(super) fn twips_to_pts(twips: f32) -> f32 {
    twips / 20.0
}

pub(super) fn pts_to_twips(pts: f32) -> i64 {
    (pts * 20.0).round() as i64
}

pub(super) fn wml<'a>(
    node: roxmltree::Node<'a, 'a>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'a>> {
    node.children()
        .find(|n| n.tag_name().name() == name && n.tag_name().namespace() == Some(WML_NS))
}

pub(super) fn wml_children<'a>(
    node: roxmltree::Node<'a, 'a>,
    name: &'a str,
) -> impl Iterator<Item = roxmltree::Node<'a, 'a>> + 'a {
    node.children()
        .filter(move |n| n.tag_name().name() == name && n.tag_name().namespace() == Some(WML_NS))
}

pub(super) fn wml_attr<'a>(node: roxmltree::Node<'a, 'a>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((WML_NS, "val")))
}

/// Parse a WML boolean toggle element (e.g., w:b, w:i, w:strike).
/// Present with no val, or any val other than "0"/"false"/"off", means true.
pub(super) fn wml_bool(parent: roxmltree::Node, name: &str) -> Option<bool> {
    wml(parent, name).map(|n| {
        n.attribute((WML_NS, "val"))
            .is_none_or(|v| !matches!(v, "0" | "false" | "off"))
    })
}

pub(super) fn twips_attr(node: roxmltree::Node, attr: &str) -> Option<f32> {
    node.attribute((WML_NS, attr))
        .and_then(|v| v.parse::<f32>().ok())
        .map(twips_to_pts)
}

pub(super) fn read_zip_text<R: Read + Seek>(
    zip: &mut zip::ZipArchive<R>,
    name: &str,
) -> Option<String> {
    let mut content = String::new();
    zip.by_name(name).ok()?.read_to_string(&mut content).ok()?;
    Some(content)
}

/// Top-level paragraphs of the body, in document order.
pub(super) fn body_paragraphs<'a>(
    body: roxmltree::Node<'a, 'a>,
) -> impl Iterator<Item = roxmltree::Node<'a, 'a>> + 'a {
    wml_children(body, "p")
}

/// Section property nodes: the ones closing a section inside a paragraph's `w:pPr`,
/// then the trailing body-level one.
pub(super) fn section_nodes<'a>(body: roxmltree::Node<'a, 'a>) -> Vec<roxmltree::Node<'a, 'a>> {
    let mut sections = Vec::new();
    for child in body.children() {
        if child.tag_name().namespace() != Some(WML_NS) {
            continue;
        }
        match child.tag_name().name() {
            "p" => {
                if let Some(sect) = wml(child, "pPr").and_then(|ppr| wml(ppr, "sectPr")) {
                    sections.push(sect);
                }
            }
            "sectPr" => sections.push(child),
            _ => {}
        }
    }
    sections
}

/// Runs of a paragraph, including those wrapped in hyperlinks.
pub(super) fn run_nodes<'a>(para: roxmltree::Node<'a, 'a>) -> Vec<roxmltree::Node<'a, 'a>> {
    let mut runs = Vec::new();
    for child in para.children() {
        if child.tag_name().namespace() != Some(WML_NS) {
            continue;
        }
        match child.tag_name().name() {
            "r" => runs.push(child),
            "hyperlink" => runs.extend(wml_children(child, "r")),
            _ => {}
        }
    }
    runs
}

fn read_run_text(run: roxmltree::Node) -> String {
    let mut text = String::new();
    for child in run.children() {
        if child.tag_name().namespace() != Some(WML_NS) {
            continue;
        }
        match child.tag_name().name() {
            "t" => text.push_str(child.text().unwrap_or("")),
            "tab" | "ptab" => text.push('\t'),
            "br" | "cr" => text.push('\n'),
            "noBreakHyphen" => text.push('-'),
            _ => {}
        }
    }
    text
}

/// The font name is only known when `ascii` and `hAnsi` agree and no theme font
/// overrides them; anything else reads as unset.
pub(super) fn read_font(rpr: Option<roxmltree::Node>) -> FontFormat {
    let name = rpr.and_then(|n| wml(n, "rFonts")).and_then(|fonts| {
        let themed = ["asciiTheme", "hAnsiTheme"]
            .iter()
            .any(|a| fonts.attribute((WML_NS, *a)).is_some());
        let ascii = fonts.attribute((WML_NS, "ascii"))?;
        let h_ansi = fonts.attribute((WML_NS, "hAnsi"))?;
        (!themed && ascii == h_ansi).then(|| ascii.to_string())
    });
    let size = rpr
        .and_then(|n| wml_attr(n, "sz"))
        .and_then(|v| v.parse::<f32>().ok())
        .map(|hp| hp / 2.0);
    FontFormat { name, size }
}

pub(super) fn parse_line_spacing(spacing: roxmltree::Node, line_val: f32) -> LineSpacing {
    match spacing.attribute((WML_NS, "lineRule")) {
        Some("exact") => LineSpacing::Exact(twips_to_pts(line_val.abs())),
        Some("atLeast") => LineSpacing::AtLeast(twips_to_pts(line_val)),
        _ => LineSpacing::Auto(line_val / 240.0),
    }
}

pub(super) fn read_paragraph_format(ppr: Option<roxmltree::Node>) -> ParagraphFormat {
    let spacing = ppr.and_then(|n| wml(n, "spacing"));
    let line_spacing = spacing.and_then(|n| {
        n.attribute((WML_NS, "line"))
            .and_then(|v| v.parse::<f32>().ok())
            .map(|line_val| parse_line_spacing(n, line_val))
    });
    let alignment = ppr.and_then(|n| wml_attr(n, "jc")).and_then(parse_alignment);

    // A hanging indent is a negative first-line indent.
    let ind = ppr.and_then(|n| wml(n, "ind"));
    let indent_first_line = ind.and_then(|n| {
        twips_attr(n, "firstLine").or_else(|| twips_attr(n, "hanging").map(|v| -v))
    });

    ParagraphFormat {
        line_spacing,
        alignment,
        space_before: spacing.and_then(|n| twips_attr(n, "before")),
        space_after: spacing.and_then(|n| twips_attr(n, "after")),
        indent_first_line,
    }
}

pub(super) fn read_section(sect: roxmltree::Node) -> Section {
    let pg_mar = wml(sect, "pgMar");
    let defaults = Section::default();
    Section {
        margin_top: pg_mar
            .and_then(|n| twips_attr(n, "top"))
            .unwrap_or(defaults.margin_top),
        margin_bottom: pg_mar
            .and_then(|n| twips_attr(n, "bottom"))
            .unwrap_or(defaults.margin_bottom),
        margin_left: pg_mar
            .and_then(|n| twips_attr(n, "left"))
            .unwrap_or(defaults.margin_left),
        margin_right: pg_mar
            .and_then(|n| twips_attr(n, "right"))
            .unwrap_or(defaults.margin_right),
    }
}

/// Display name of the style a paragraph references, or the default paragraph style.
fn paragraph_style_name(ppr: Option<roxmltree::Node>, styles: &StylesInfo) -> String {
    ppr.and_then(|n| wml_attr(n, "pStyle"))
        .and_then(|id| styles.name_for_id(id))
        .unwrap_or(styles.default_paragraph.as_str())
        .to_string()
}

fn read_paragraph(node: roxmltree::Node, styles: &StylesInfo) -> Paragraph {
    let ppr = wml(node, "pPr");
    let runs = run_nodes(node)
        .into_iter()
        .map(|r| Run {
            text: read_run_text(r),
            font: read_font(wml(r, "rPr")),
        })
        .collect();
    Paragraph {
        style: paragraph_style_name(ppr, styles),
        format: read_paragraph_format(ppr),
        runs,
    }
}

pub(super) fn open_package(bytes: &[u8]) -> Result<zip::ZipArchive<Cursor<&[u8]>>, Error> {
    zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|_| Error::InvalidDocx("file is not a ZIP archive".into()))
}

pub(super) fn read_document_part<R: Read + Seek>(
    zip: &mut zip::ZipArchive<R>,
) -> Result<String, Error> {
    let mut xml_content = String::new();
    zip.by_name(DOCUMENT_PART)
        .map_err(|_| Error::InvalidDocx("missing word/document.xml (is this a DOCX file?)".into()))?
        .read_to_string(&mut xml_content)?;
    Ok(xml_content)
}

pub(super) fn body_of<'a>(
    xml: &'a roxmltree::Document<'a>,
) -> Result<roxmltree::Node<'a, 'a>, Error> {
    wml(xml.root_element(), "body").ok_or_else(|| Error::InvalidDocx("missing w:body".into()))
}

pub fn load(path: &Path) -> Result<Document, Error> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::Io(
            std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())),
        ),
        _ => Error::Io(e),
    })?;
    load_bytes(bytes)
}

pub fn load_bytes(bytes: impl Into<Vec<u8>>) -> Result<Document, Error> {
    let t0 = Instant::now();
    let bytes = bytes.into();

    let (sections, paragraphs, styles) = {
        let mut zip = open_package(&bytes)?;
        let styles_xml = read_zip_text(&mut zip, STYLES_PART);
        let styles = parse_styles(styles_xml.as_deref());
        let xml_content = read_document_part(&mut zip)?;

        let xml = roxmltree::Document::parse(&xml_content)?;
        let body = body_of(&xml)?;

        let sections: Vec<Section> = section_nodes(body).into_iter().map(read_section).collect();
        let paragraphs: Vec<Paragraph> = body_paragraphs(body)
            .map(|p| read_paragraph(p, &styles))
            .collect();
        (sections, paragraphs, styles.styles)
    };

    log::debug!(
        "Loaded {} section(s), {} paragraph(s), {} paragraph style(s) in {:.1}ms",
        sections.len(),
        paragraphs.len(),
        styles.len(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );

    let mut doc = Document {
        sections,
        paragraphs,
        styles: Default::default(),
        package: Some(bytes),
    };
    for style in styles {
        doc.add_style(style);
    }
    Ok(doc)
}
