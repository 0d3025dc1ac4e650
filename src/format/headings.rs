use crate::model::{Alignment, Document};
use crate::rules::FormattingRule;

/// Heading levels rewritten by the pass, with their fixed point sizes.
pub const HEADING_LEVELS: [(&str, f32); 3] =
    [("Heading 1", 14.0), ("Heading 2", 13.0), ("Heading 3", 12.0)];

const HEADING_SPACE_BEFORE: f32 = 12.0;
const HEADING_SPACE_AFTER: f32 = 6.0;

/// Redefine the `Heading 1..3` named styles. Levels missing from the document are skipped.
pub fn apply_heading_styles(doc: &mut Document, rule: &FormattingRule) -> usize {
    let mut touched = 0;
    for (name, size) in HEADING_LEVELS {
        let Some(style) = doc.style_mut(name) else {
            log::debug!("No '{name}' style in document, skipping");
            continue;
        };
        style.font.name = Some(rule.font_name.to_string());
        style.font.size = Some(size);
        style.bold = Some(true);
        style.format.alignment = Some(Alignment::Left);
        style.format.space_before = Some(HEADING_SPACE_BEFORE);
        style.format.space_after = Some(HEADING_SPACE_AFTER);
        touched += 1;
    }
    touched
}
