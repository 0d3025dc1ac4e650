//! Dump the formatting properties the formatter reads and writes.
//!
//! Usage:
//!   docx-inspect <file.docx> [--styles]
//!
//! Prints page margins per section and spacing/indent/alignment/font per body paragraph.
//! With --styles, also prints the paragraph styles whose name starts with "heading".
//! Useful for diffing a document against its formatted_ counterpart.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use zip::ZipArchive;

const WML: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

fn read_entry(archive: &mut ZipArchive<fs::File>, name: &str) -> Option<String> {
    let mut entry = archive.by_name(name).ok()?;
    let mut content = String::new();
    entry.read_to_string(&mut content).ok()?;
    Some(content)
}

fn child<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children()
        .find(|n| n.tag_name().name() == name && n.tag_name().namespace() == Some(WML))
}

fn attr<'a>(node: Option<roxmltree::Node<'a, 'a>>, name: &str) -> &'a str {
    node.and_then(|n| n.attribute((WML, name))).unwrap_or("-")
}

fn twips(node: Option<roxmltree::Node>, name: &str) -> String {
    node.and_then(|n| n.attribute((WML, name)))
        .and_then(|v| v.parse::<f32>().ok())
        .map(|v| format!("{:.2}pt", v / 20.0))
        .unwrap_or_else(|| "-".to_string())
}

fn describe_ppr(ppr: Option<roxmltree::Node>) -> String {
    let spacing = ppr.and_then(|n| child(n, "spacing"));
    let ind = ppr.and_then(|n| child(n, "ind"));
    let jc = ppr.and_then(|n| child(n, "jc"));
    format!(
        "line={}/{} before={} after={} firstLine={} hanging={} jc={}",
        attr(spacing, "line"),
        attr(spacing, "lineRule"),
        twips(spacing, "before"),
        twips(spacing, "after"),
        twips(ind, "firstLine"),
        twips(ind, "hanging"),
        attr(jc, "val"),
    )
}

fn describe_rpr(rpr: Option<roxmltree::Node>) -> String {
    let fonts = rpr.and_then(|n| child(n, "rFonts"));
    let sz = rpr.and_then(|n| child(n, "sz"));
    let bold = rpr.and_then(|n| child(n, "b")).is_some();
    format!(
        "font={} size={} bold={bold}",
        attr(fonts, "ascii"),
        sz.and_then(|n| n.attribute((WML, "val")))
            .and_then(|v| v.parse::<f32>().ok())
            .map(|hp| format!("{}pt", hp / 2.0))
            .unwrap_or_else(|| "-".to_string()),
    )
}

fn dump_document(xml: &str) {
    let Ok(doc) = roxmltree::Document::parse(xml) else {
        eprintln!("word/document.xml is not well-formed");
        return;
    };
    let Some(body) = child(doc.root_element(), "body") else {
        eprintln!("word/document.xml has no w:body");
        return;
    };

    let sections = body.descendants().filter(|n| {
        n.tag_name().name() == "sectPr" && n.tag_name().namespace() == Some(WML)
    });
    for (i, sect) in sections.enumerate() {
        let mar = child(sect, "pgMar");
        println!(
            "section {i}: top={} bottom={} left={} right={}",
            twips(mar, "top"),
            twips(mar, "bottom"),
            twips(mar, "left"),
            twips(mar, "right"),
        );
    }

    let paragraphs = body
        .children()
        .filter(|n| n.tag_name().name() == "p" && n.tag_name().namespace() == Some(WML));
    for (i, p) in paragraphs.enumerate() {
        let ppr = child(p, "pPr");
        let text: String = p
            .descendants()
            .filter(|n| n.tag_name().name() == "t")
            .filter_map(|n| n.text())
            .collect();
        let preview: String = text.chars().take(40).collect();
        println!(
            "p{i:<4} [{}] {} | {:?}",
            attr(ppr.and_then(|n| child(n, "pStyle")), "val"),
            describe_ppr(ppr),
            preview,
        );
        let runs = p
            .descendants()
            .filter(|n| n.tag_name().name() == "r" && n.tag_name().namespace() == Some(WML));
        for run in runs {
            println!("        r: {}", describe_rpr(child(run, "rPr")));
        }
    }
}

fn dump_styles(xml: &str) {
    let Ok(doc) = roxmltree::Document::parse(xml) else {
        eprintln!("word/styles.xml is not well-formed");
        return;
    };
    for style in doc.root_element().children().filter(|n| n.tag_name().name() == "style") {
        let name = attr(child(style, "name"), "val");
        if !name.to_lowercase().starts_with("heading") {
            continue;
        }
        println!(
            "style {:<12} ({}) {} | {}",
            name,
            style.attribute((WML, "styleId")).unwrap_or("-"),
            describe_ppr(child(style, "pPr")),
            describe_rpr(child(style, "rPr")),
        );
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let show_styles = args.iter().any(|a| a == "--styles");
    let Some(path) = args.iter().skip(1).find(|a| !a.starts_with('-')).map(PathBuf::from) else {
        eprintln!("Usage: docx-inspect <file.docx> [--styles]");
        std::process::exit(1);
    };

    let file = match fs::File::open(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            std::process::exit(1);
        }
    };
    let mut archive = match ZipArchive::new(file) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{}: not a DOCX package ({e})", path.display());
            std::process::exit(1);
        }
    };

    match read_entry(&mut archive, "word/document.xml") {
        Some(xml) => dump_document(&xml),
        None => eprintln!("missing word/document.xml"),
    }
    if show_styles {
        match read_entry(&mut archive, "word/styles.xml") {
            Some(xml) => dump_styles(&xml),
            None => println!("no word/styles.xml"),
        }
    }
}
