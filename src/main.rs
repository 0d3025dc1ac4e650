use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use rapihin::{DocumentType, FormatRequest, Institution};

/// Reformat a DOCX file to an academic formatting standard.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Input .docx file
    #[arg(required_unless_present = "list_templates")]
    input: Option<PathBuf>,

    /// Output path (default: formatted_<input name> next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Institution template; unknown names fall back to "National Standard"
    #[arg(short, long, default_value = "National Standard")]
    institution: String,

    /// Document type, recorded in the log only
    #[arg(short = 't', long, default_value = "Academic Papers")]
    document_type: String,

    /// Print the available institutions and document types, then exit
    #[arg(long)]
    list_templates: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn print_templates() {
    println!("Institutions:");
    for institution in Institution::ALL {
        let rule = institution.rule();
        println!(
            "  {:<18} {} ({} {}pt, line spacing {}, spacing after {}pt)",
            institution.name(),
            institution.description(),
            rule.font_name,
            rule.font_size_pt,
            rule.line_spacing_multiple,
            rule.paragraph_spacing_after_pt,
        );
    }
    println!("Document types:");
    for document_type in DocumentType::KNOWN {
        println!("  {document_type}");
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if cli.list_templates {
        print_templates();
        return ExitCode::SUCCESS;
    }

    let Some(input) = cli.input else {
        eprintln!("Error: no input file given");
        return ExitCode::FAILURE;
    };

    if Institution::parse_strict(&cli.institution).is_none() {
        log::warn!(
            "Unknown institution '{}', using '{}'",
            cli.institution,
            Institution::default()
        );
    }

    let output = cli
        .output
        .unwrap_or_else(|| rapihin::default_output_path(&input));
    let request = FormatRequest::new(&cli.institution, &cli.document_type);

    match rapihin::format_docx(&input, &output, &request) {
        Ok(()) => {
            println!("Formatted {} -> {}", input.display(), output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
