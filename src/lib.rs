mod docx;
mod error;
pub mod format;
pub mod model;
pub mod rules;

pub use docx::{load, load_bytes, save, to_bytes};
pub use error::Error;
pub use format::{format_document, format_with_rule};
pub use model::Document;
pub use rules::{DocumentType, FormatRequest, FormattingRule, Institution};

use std::path::{Path, PathBuf};
use std::time::Instant;

/// `formatted_<file name>` next to the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("document.docx"));
    input.with_file_name(format!("formatted_{name}"))
}

pub fn format_docx(input: &Path, output: &Path, request: &FormatRequest) -> Result<(), Error> {
    let t0 = Instant::now();

    let doc = docx::load(input)?;
    let t_load = t0.elapsed();

    let doc = format_request(doc, request);
    let t_format = t0.elapsed();

    let bytes = docx::to_bytes(&doc)?;
    std::fs::write(output, &bytes).map_err(Error::Io)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: load={:.1}ms, format={:.1}ms, save={:.1}ms, total={:.1}ms (output {} bytes)",
        t_load.as_secs_f64() * 1000.0,
        (t_format - t_load).as_secs_f64() * 1000.0,
        (t_total - t_format).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(())
}

pub fn format_docx_bytes(input: &[u8], request: &FormatRequest) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();

    let doc = docx::load_bytes(input)?;
    let t_load = t0.elapsed();

    let doc = format_request(doc, request);
    let t_format = t0.elapsed();

    let bytes = docx::to_bytes(&doc)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: load={:.1}ms, format={:.1}ms, save={:.1}ms, total={:.1}ms (output {} bytes)",
        t_load.as_secs_f64() * 1000.0,
        (t_format - t_load).as_secs_f64() * 1000.0,
        (t_total - t_format).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(bytes)
}

fn format_request(mut doc: Document, request: &FormatRequest) -> Document {
    log::info!(
        "Formatting {} as '{}' ({})",
        request.document_type,
        request.institution,
        request.institution.description(),
    );
    format_with_rule(&mut doc, &request.rule());
    doc
}
