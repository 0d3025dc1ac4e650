use crate::model::{Document, inches_to_pts};
use crate::rules::FormattingRule;

/// Set all four page margins of every section from the rule.
pub fn apply_margins(doc: &mut Document, rule: &FormattingRule) -> usize {
    let top = inches_to_pts(rule.margin_top_in);
    let bottom = inches_to_pts(rule.margin_bottom_in);
    let left = inches_to_pts(rule.margin_left_in);
    let right = inches_to_pts(rule.margin_right_in);

    for section in &mut doc.sections {
        section.margin_top = top;
        section.margin_bottom = bottom;
        section.margin_left = left;
        section.margin_right = right;
    }
    doc.sections.len()
}
