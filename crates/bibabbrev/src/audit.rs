//! Finding journal fields the rewrite missed.
//!
//! The rewrite only matches exact delimited text, so a `journal` field with different spacing
//! or line breaks keeps its full name. The audit parses the bibliography and compares each
//! normalised `journal` field with the known full names.

use std::collections::HashMap;

use crate::{extract::collapse_whitespace, AbbreviationRecord, Error, ErrorKind};

use biblatex::{Bibliography, Chunk};
use log::{trace, warn};

/// An entry whose `journal` field still holds a full name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Finding {
    /// The cite key of the entry.
    pub cite: String,
    /// The full name found in the `journal` field.
    pub full_name: String,
    /// The abbreviation it should have been replaced with.
    pub abbreviation: String,
}

/// Audit BibTeX `text` against `records`.
///
/// # Errors
///
/// An [`Err`] with [`ErrorKind::Bibliography`] when the bibliography cannot be parsed.
pub fn audit(text: &str, records: &[AbbreviationRecord]) -> Result<Vec<Finding>, Error> {
    let bibliography = Bibliography::parse(text)
        .ok_or_else(|| Error::new(ErrorKind::Bibliography, "Cannot parse the BibTeX"))?;

    let known: HashMap<String, &str> = records
        .iter()
        .map(|r| (normalise(&r.full_name), r.abbreviation.as_str()))
        .collect();

    let mut findings = Vec::new();
    for entry in bibliography {
        let Some(chunks) = entry
            .fields
            .get("journal")
            .or_else(|| entry.fields.get("journaltitle"))
        else {
            continue;
        };
        let journal = normalise(&chunks_to_string(chunks));
        if let Some(abbreviation) = known.get(&journal) {
            warn!(
                "Entry '{}' still has the full journal name '{}'",
                entry.key, journal
            );
            findings.push(Finding {
                cite: entry.key.clone(),
                full_name: journal,
                abbreviation: (*abbreviation).to_owned(),
            });
        }
    }

    trace!("Audit found {} unabbreviated journal field(s)", findings.len());
    Ok(findings)
}

fn chunks_to_string(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|c| match c {
            Chunk::Normal(s) | Chunk::Verbatim(s) => s.as_str(),
        })
        .collect()
}

fn normalise(s: &str) -> String {
    collapse_whitespace(&s.replace("\\&", "&"))
}
