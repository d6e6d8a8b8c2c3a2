//! Substituting journal abbreviations into a bibliography file.
//!
//! A full name is replaced wherever it is a whole field value, i.e. delimited as `{NAME}` or
//! `"NAME"`, and is always written back as `{ABBR}`. Ampersands are written as `\&` so that the
//! result stays valid (La)TeX.

use std::{
    collections::{HashMap, HashSet},
    fs,
    io::Write,
    path::Path,
};

use crate::{AbbreviationRecord, Error, ErrorKind};

use log::{debug, info, trace};
use tempfile::NamedTempFile;

const PROGRESS_INTERVAL: usize = 100;

/// A summary of a rewrite.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// How many database records were processed.
    pub records: usize,
    /// How many delimited occurrences were replaced.
    pub substitutions: usize,
    /// Full names that were not found in the bibliography.
    pub unmatched: Vec<String>,
}

/// Replace every delimited full name in `text` with its abbreviation.
///
/// Records are processed in order. When several records share a full name the abbreviation of
/// the last one is used, and the name is only processed once.
#[must_use]
pub fn rewrite(text: &str, records: &[AbbreviationRecord]) -> (String, RewriteReport) {
    let latest: HashMap<&str, &str> = records
        .iter()
        .map(|r| (r.full_name.as_str(), r.abbreviation.as_str()))
        .collect();

    let mut text = text.to_owned();
    let mut report = RewriteReport::default();
    let mut seen = HashSet::new();

    for (i, record) in records.iter().enumerate() {
        let full_name = record.full_name.as_str();
        if seen.insert(full_name) {
            let abbreviation = latest
                .get(full_name)
                .copied()
                .unwrap_or(record.abbreviation.as_str());
            let count = substitute(&mut text, full_name, abbreviation);
            if count == 0 {
                debug!("No occurrence of '{full_name}' found");
                report.unmatched.push(full_name.to_owned());
            } else {
                trace!("Replaced {count} occurrence(s) of '{full_name}' with '{abbreviation}'");
                report.substitutions += count;
            }
        }

        report.records = i + 1;
        if is_progress_point(report.records) {
            info!("Processed {} of {} records", report.records, records.len());
        }
    }

    (text, report)
}

const fn is_progress_point(processed: usize) -> bool {
    processed % PROGRESS_INTERVAL == 0
}

/// Rewrite the bibliography at `path` in place.
///
/// The rewritten content is written to a temporary file beside `path` which then replaces it,
/// so the original is left untouched if anything fails.
///
/// # Errors
///
/// An [`Err`] with [`ErrorKind::IO`] when the file cannot be read or replaced.
pub fn rewrite_file(path: &Path, records: &[AbbreviationRecord]) -> Result<RewriteReport, Error> {
    info!("Rewriting journal names in {}", path.display());
    let text = fs::read_to_string(path).map_err(|e| {
        Error::wrap_with(ErrorKind::IO, format!("Cannot read '{}'", path.display()), e)
    })?;

    let (rewritten, report) = rewrite(&text, records);
    if rewritten != text {
        replace_file(path, &rewritten)?;
    }

    info!(
        "Replaced {} occurrence(s) from {} records, {} not found",
        report.substitutions,
        report.records,
        report.unmatched.len()
    );
    Ok(report)
}

fn replace_file(path: &Path, content: &str) -> Result<(), Error> {
    let write_err = |e: std::io::Error| {
        Error::wrap_with(
            ErrorKind::IO,
            format!("Cannot write rewritten bibliography to '{}'", path.display()),
            e,
        )
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir).map_err(write_err)?;
    file.write_all(content.as_bytes()).map_err(write_err)?;
    if let Ok(metadata) = fs::metadata(path) {
        file.as_file()
            .set_permissions(metadata.permissions())
            .map_err(write_err)?;
    }
    file.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

fn substitute(text: &mut String, full_name: &str, abbreviation: &str) -> usize {
    let replacement = format!("{{{}}}", escape_ampersand(abbreviation));
    let escaped_name = escape_ampersand(full_name);

    let mut names = vec![full_name];
    if escaped_name != full_name {
        names.push(escaped_name.as_str());
    }

    let mut count = 0;
    for name in names {
        for pattern in [format!("{{{name}}}"), format!("\"{name}\"")] {
            let found = text.matches(pattern.as_str()).count();
            if found > 0 {
                *text = text.replace(pattern.as_str(), &replacement);
                count += found;
            }
        }
    }
    count
}

/// Write every `&` as `\&`, leaving already escaped ampersands alone.
#[must_use]
pub fn escape_ampersand(s: &str) -> String {
    s.replace("\\&", "&").replace('&', "\\&")
}
