//! Error reporting with source context.
//!
//! Uses ariadne for pretty-printed diagnostics.

use ariadne::{ColorGenerator, Config, IndexType, Label, Report, ReportKind, Source};
use srvconf_validate::{Diagnostic, DiagnosticCode};
use std::io::Write;

/// Report diagnostics of one file to the given writer.
pub fn report_diagnostics<W: Write>(
    diagnostics: &[Diagnostic],
    path: &str,
    source: &str,
    color: bool,
    writer: &mut W,
) -> std::io::Result<usize> {
    let mut colors = ColorGenerator::new();

    for diag in diagnostics {
        let range = diag.span.start..diag.span.end;
        Report::build(ReportKind::Error, (path, range.clone()))
            .with_code(diag.code.code())
            .with_message(&diag.message)
            .with_label(
                Label::new((path, range))
                    .with_message(label(diag))
                    .with_color(colors.next()),
            )
            .with_config(
                Config::default()
                    .with_compact(false)
                    .with_color(color)
                    .with_index_type(IndexType::Byte),
            )
            .finish()
            .write((path, Source::from(source)), &mut *writer)?;
    }

    Ok(diagnostics.len())
}

fn label(diag: &Diagnostic) -> String {
    match (diag.code, &diag.owner_key) {
        (DiagnosticCode::UnknownValue, Some(key)) => format!("not an allowed value of `{key}`"),
        (DiagnosticCode::UnknownKey, _) => "not in the schema".to_string(),
        _ => format!("`{}` is not declared", diag.payload),
    }
}

/// Print a summary of the check.
pub fn print_summary<W: Write>(errors: usize, files: usize, writer: &mut W) -> std::io::Result<()> {
    let file_text = if files == 1 { "file" } else { "files" };
    if errors == 0 {
        writeln!(
            writer,
            "\x1b[32m\u{2713}\x1b[0m No errors found in {files} {file_text}"
        )?;
    } else {
        let error_text = if errors == 1 { "error" } else { "errors" };
        writeln!(
            writer,
            "\x1b[31m\u{2717}\x1b[0m {errors} {error_text} in {files} {file_text}"
        )?;
    }
    Ok(())
}
