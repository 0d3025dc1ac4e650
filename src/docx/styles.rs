use crate::model::{Alignment, NamedStyle};

use super::{WML_NS, read_font, read_paragraph_format, wml, wml_bool};

pub(super) struct StylesInfo {
    pub(super) styles: Vec<NamedStyle>,
    /// Name of the style paragraphs without a `w:pStyle` fall back to.
    pub(super) default_paragraph: String,
}

impl StylesInfo {
    fn empty() -> Self {
        Self {
            styles: Vec::new(),
            default_paragraph: String::from("Normal"),
        }
    }

    pub(super) fn name_for_id(&self, style_id: &str) -> Option<&str> {
        self.styles
            .iter()
            .find(|s| s.style_id == style_id)
            .map(|s| s.name.as_str())
    }

    pub(super) fn id_for_name(&self, name: &str) -> Option<&str> {
        self.styles
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.style_id.as_str())
    }
}

/// Only the values `alignment_val` writes map to an alignment. Others (`start`, `end`,
/// `distribute`, the kashida variants) read as unset so a formatting pass rewrites them.
pub(super) fn parse_alignment(val: &str) -> Option<Alignment> {
    match val {
        "left" => Some(Alignment::Left),
        "center" => Some(Alignment::Center),
        "right" => Some(Alignment::Right),
        "both" => Some(Alignment::Justify),
        _ => None,
    }
}

pub(super) fn alignment_val(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
        Alignment::Justify => "both",
    }
}

/// Word stores a handful of built-in style names in lowercase and shows them capitalized.
pub(super) fn ui_style_name(stored: &str) -> String {
    match stored {
        "caption" | "footer" | "header" | "title" | "subtitle" => {
            let mut chars = stored.chars();
            chars
                .next()
                .map(|c| c.to_ascii_uppercase().to_string() + chars.as_str())
                .unwrap_or_default()
        }
        _ => match stored.strip_prefix("heading ") {
            Some(level) if level.len() == 1 && level.chars().all(|c| c.is_ascii_digit()) => {
                format!("Heading {level}")
            }
            _ => stored.to_string(),
        },
    }
}

/// Paragraph-type `w:style` elements that carry a style id.
pub(super) fn paragraph_style_nodes<'a>(
    root: roxmltree::Node<'a, 'a>,
) -> impl Iterator<Item = roxmltree::Node<'a, 'a>> + 'a {
    root.children().filter(|n| {
        n.tag_name().name() == "style"
            && n.tag_name().namespace() == Some(WML_NS)
            && n.attribute((WML_NS, "type")) == Some("paragraph")
            && n.attribute((WML_NS, "styleId")).is_some()
    })
}

pub(super) fn read_style(style_node: roxmltree::Node) -> NamedStyle {
    let style_id = style_node.attribute((WML_NS, "styleId")).unwrap_or_default();
    let name = wml(style_node, "name")
        .and_then(|n| n.attribute((WML_NS, "val")))
        .map(ui_style_name)
        .unwrap_or_else(|| style_id.to_string());
    let rpr = wml(style_node, "rPr");

    NamedStyle {
        name,
        style_id: style_id.to_string(),
        font: read_font(rpr),
        format: read_paragraph_format(wml(style_node, "pPr")),
        bold: rpr.and_then(|n| wml_bool(n, "b")),
    }
}

pub(super) fn parse_styles(xml_content: Option<&str>) -> StylesInfo {
    let Some(xml_content) = xml_content else {
        return StylesInfo::empty();
    };
    let xml = match roxmltree::Document::parse(xml_content) {
        Ok(xml) => xml,
        Err(e) => {
            log::warn!("Ignoring unreadable word/styles.xml: {e}");
            return StylesInfo::empty();
        }
    };

    let mut info = StylesInfo::empty();
    let mut default_paragraph = None;
    for style_node in paragraph_style_nodes(xml.root_element()) {
        let style = read_style(style_node);
        let is_default = style_node
            .attribute((WML_NS, "default"))
            .is_some_and(|v| v == "1" || v == "true");
        if is_default && default_paragraph.is_none() {
            default_paragraph = Some(style.name.clone());
        }
        info.styles.push(style);
    }
    if let Some(name) = default_paragraph {
        info.default_paragraph = name;
    }
    info
}
