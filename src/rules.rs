//! Per-institution formatting rules.

use std::fmt;

/// Complete set of typographic parameters for one formatting standard.
#[derive(Clone, Debug, PartialEq)]
pub struct FormattingRule {
    pub font_name: &'static str,
    pub font_size_pt: f32,
    pub line_spacing_multiple: f32,
    pub margin_top_in: f32,
    pub margin_bottom_in: f32,
    pub margin_left_in: f32,
    pub margin_right_in: f32,
    pub paragraph_spacing_before_pt: f32,
    pub paragraph_spacing_after_pt: f32,
}

impl FormattingRule {
    /// Rule for `name`, falling back to the National Standard for unknown names.
    pub fn for_institution(name: &str) -> Self {
        Institution::resolve(name).rule()
    }
}

const NATIONAL_STANDARD: FormattingRule = FormattingRule {
    font_name: "Times New Roman",
    font_size_pt: 12.0,
    line_spacing_multiple: 1.5,
    margin_top_in: 1.18,
    margin_bottom_in: 1.18,
    margin_left_in: 1.57,
    margin_right_in: 1.18,
    paragraph_spacing_before_pt: 0.0,
    paragraph_spacing_after_pt: 6.0,
};

const UI: FormattingRule = FormattingRule {
    line_spacing_multiple: 2.0,
    paragraph_spacing_after_pt: 0.0,
    ..NATIONAL_STANDARD
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Institution {
    #[default]
    NationalStandard,
    Itb,
    Ui,
    Ugm,
}

impl Institution {
    pub const ALL: [Institution; 4] = [
        Institution::NationalStandard,
        Institution::Itb,
        Institution::Ui,
        Institution::Ugm,
    ];

    /// Exact, case-sensitive lookup by display name.
    pub fn parse_strict(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.name() == name)
    }

    /// Total lookup: anything that isn't a known display name resolves to the default.
    pub fn resolve(name: &str) -> Self {
        Self::parse_strict(name).unwrap_or_default()
    }

    pub fn name(self) -> &'static str {
        match self {
            Institution::NationalStandard => "National Standard",
            Institution::Itb => "ITB",
            Institution::Ui => "UI",
            Institution::Ugm => "UGM",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Institution::NationalStandard => {
                "Standard formatting for Indonesian academic documents"
            }
            Institution::Itb => "Institut Teknologi Bandung template",
            Institution::Ui => "Universitas Indonesia template",
            Institution::Ugm => "Universitas Gadjah Mada template",
        }
    }

    pub fn rule(self) -> FormattingRule {
        match self {
            Institution::NationalStandard | Institution::Itb | Institution::Ugm => {
                NATIONAL_STANDARD
            }
            Institution::Ui => UI,
        }
    }
}

impl fmt::Display for Institution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of document being formatted. Carried for record-keeping only; no formatting
/// decision depends on it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DocumentType {
    #[default]
    AcademicPaper,
    Thesis,
    InternshipReport,
    Dissertation,
    Other(String),
}

impl DocumentType {
    pub const KNOWN: [DocumentType; 4] = [
        DocumentType::AcademicPaper,
        DocumentType::Thesis,
        DocumentType::InternshipReport,
        DocumentType::Dissertation,
    ];

    pub fn parse(label: &str) -> Self {
        match label {
            "Academic Papers" => DocumentType::AcademicPaper,
            "Thesis" => DocumentType::Thesis,
            "Internship Report" => DocumentType::InternshipReport,
            "Dissertation" => DocumentType::Dissertation,
            other => DocumentType::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            DocumentType::AcademicPaper => "Academic Papers",
            DocumentType::Thesis => "Thesis",
            DocumentType::InternshipReport => "Internship Report",
            DocumentType::Dissertation => "Dissertation",
            DocumentType::Other(label) => label,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the caller asked for: an institution name and a document type label.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormatRequest {
    pub institution: Institution,
    pub document_type: DocumentType,
}

impl FormatRequest {
    pub fn new(institution: &str, document_type: &str) -> Self {
        Self {
            institution: Institution::resolve(institution),
            document_type: DocumentType::parse(document_type),
        }
    }

    pub fn rule(&self) -> FormattingRule {
        self.institution.rule()
    }
}
