use crate::model::{Alignment, Document, LineSpacing};
use crate::rules::FormattingRule;

/// Font on every run, line spacing and justification on every paragraph that has
/// visible text. Blank paragraphs are left exactly as they were so separator lines
/// don't pick up justified alignment.
pub fn apply_text_formatting(doc: &mut Document, rule: &FormattingRule) -> usize {
    let mut touched = 0;
    for para in doc.paragraphs.iter_mut().filter(|p| !p.is_blank()) {
        for run in &mut para.runs {
            run.font.name = Some(rule.font_name.to_string());
            run.font.size = Some(rule.font_size_pt);
        }
        para.format.line_spacing = Some(LineSpacing::Auto(rule.line_spacing_multiple));
        if !para.is_heading() {
            para.format.alignment = Some(Alignment::Justify);
        }
        touched += 1;
    }
    touched
}
