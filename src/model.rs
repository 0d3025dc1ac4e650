use std::collections::HashMap;

pub const POINTS_PER_INCH: f32 = 72.0;

pub fn inches_to_pts(inches: f32) -> f32 {
    inches * POINTS_PER_INCH
}

/// A paragraph is a heading when its style name starts with "Heading".
/// Every step that treats headings differently goes through this predicate.
pub fn is_heading_style(style_name: &str) -> bool {
    style_name.starts_with("Heading")
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LineSpacing {
    Auto(f32),    // multiplier (e.g. 1.0 = single, 2.0 = double)
    Exact(f32),   // fixed height in points
    AtLeast(f32), // minimum height in points
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FontFormat {
    pub name: Option<String>,
    pub size: Option<f32>, // points
}

/// Direct paragraph formatting. `None` means the value is inherited from the style chain.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParagraphFormat {
    pub line_spacing: Option<LineSpacing>,
    pub alignment: Option<Alignment>,
    pub space_before: Option<f32>,      // points
    pub space_after: Option<f32>,       // points
    pub indent_first_line: Option<f32>, // points
}

/// Page margins of one section, in points.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl Default for Section {
    fn default() -> Self {
        Self {
            margin_top: 72.0,
            margin_bottom: 72.0,
            margin_left: 72.0,
            margin_right: 72.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Run {
    pub text: String,
    pub font: FontFormat,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: FontFormat::default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Paragraph {
    /// Display name of the referenced paragraph style ("Normal", "Heading 1", ...).
    pub style: String,
    pub format: ParagraphFormat,
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn new(style: impl Into<String>) -> Self {
        Self {
            style: style.into(),
            format: ParagraphFormat::default(),
            runs: Vec::new(),
        }
    }

    pub fn with_run(mut self, run: Run) -> Self {
        self.runs.push(run);
        self
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }

    pub fn is_heading(&self) -> bool {
        is_heading_style(&self.style)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NamedStyle {
    pub name: String,
    /// `w:styleId` the style is stored under in the package.
    pub style_id: String,
    pub font: FontFormat,
    pub format: ParagraphFormat,
    pub bold: Option<bool>,
}

impl NamedStyle {
    pub fn new(name: impl Into<String>, style_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            style_id: style_id.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub sections: Vec<Section>,
    pub paragraphs: Vec<Paragraph>,
    /// Paragraph styles keyed by display name.
    pub styles: HashMap<String, NamedStyle>,
    /// Raw bytes of the DOCX package the tree was loaded from.
    pub(crate) package: Option<Vec<u8>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_style(&mut self, style: NamedStyle) {
        self.styles.insert(style.name.clone(), style);
    }

    pub fn style(&self, name: &str) -> Option<&NamedStyle> {
        self.styles.get(name)
    }

    pub fn style_mut(&mut self, name: &str) -> Option<&mut NamedStyle> {
        self.styles.get_mut(name)
    }

    pub fn has_package(&self) -> bool {
        self.package.is_some()
    }
}
