//! The formatting pass: margins, run fonts and paragraph layout, heading styles, and
//! paragraph spacing, applied in that order to a document tree.

mod headings;
mod margins;
mod spacing;
mod text;

pub use headings::{HEADING_LEVELS, apply_heading_styles};
pub use margins::apply_margins;
pub use spacing::{BODY_FIRST_LINE_INDENT_IN, apply_paragraph_spacing};
pub use text::apply_text_formatting;

use std::time::Instant;

use crate::model::Document;
use crate::rules::{FormattingRule, Institution};

/// Resolve `institution` (unknown names fall back to the National Standard) and run the
/// full pass. The tree is moved in and handed back so a single call owns it exclusively.
pub fn format_document(mut doc: Document, institution: &str) -> Document {
    let resolved = Institution::resolve(institution);
    if resolved.name() != institution {
        log::debug!("Institution '{institution}' not in catalog, using '{resolved}'");
    }
    format_with_rule(&mut doc, &resolved.rule());
    doc
}

/// Run the four steps with an already-resolved rule.
pub fn format_with_rule(doc: &mut Document, rule: &FormattingRule) {
    let t0 = Instant::now();

    let sections = apply_margins(doc, rule);
    log::debug!("Margins set on {sections} section(s)");

    let styled = apply_text_formatting(doc, rule);
    log::debug!(
        "Text formatting applied to {styled} of {} paragraph(s)",
        doc.paragraphs.len()
    );

    let headings = apply_heading_styles(doc, rule);
    log::debug!("Redefined {headings} heading style(s)");

    let spaced = apply_paragraph_spacing(doc, rule);
    log::debug!("Spacing fixed on {spaced} paragraph(s)");

    log::info!(
        "Formatted {} paragraph(s) in {} section(s) with {} {}pt, line spacing {} ({:.1}ms)",
        doc.paragraphs.len(),
        doc.sections.len(),
        rule.font_name,
        rule.font_size_pt,
        rule.line_spacing_multiple,
        t0.elapsed().as_secs_f64() * 1000.0,
    );
}
