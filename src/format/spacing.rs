use crate::model::{Document, inches_to_pts};
use crate::rules::FormattingRule;

pub const BODY_FIRST_LINE_INDENT_IN: f32 = 0.5;

/// Spacing before/after on every paragraph, blank ones included, and a first-line
/// indent on everything that isn't a heading.
pub fn apply_paragraph_spacing(doc: &mut Document, rule: &FormattingRule) -> usize {
    let indent = inches_to_pts(BODY_FIRST_LINE_INDENT_IN);
    for para in &mut doc.paragraphs {
        para.format.space_before = Some(rule.paragraph_spacing_before_pt);
        para.format.space_after = Some(rule.paragraph_spacing_after_pt);
        if !para.is_heading() {
            para.format.indent_first_line = Some(indent);
        }
    }
    doc.paragraphs.len()
}
