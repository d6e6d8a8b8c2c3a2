#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::missing_safety_doc,
    clippy::missing_const_for_fn
)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

//! # bibabbrev
//!
//! bibabbrev scrapes a page of astronomical journal abbreviations into a local XML database and
//! uses that database to replace full journal names in a `BibTeX` file with their
//! abbreviations.
//!
//! The usual flow is [`check_or_build`] followed by [`rewrite_bibliography`].

pub mod audit;
pub mod builder;
pub mod config;
pub mod database;
mod error;
pub mod extract;
pub mod fetch;
pub mod rewrite;

pub use builder::Outcome;
pub use config::Config;
pub use database::{AbbreviationDatabase, AbbreviationRecord};
pub use error::{Error, ErrorKind};
pub use rewrite::RewriteReport;

use std::fs;

use audit::Finding;
use log::{trace, warn};

type Client = reqwest::blocking::Client;

/// Load the database at [`Config::database`], building it from [`Config::url`] when it does
/// not exist or the configuration asks for a rebuild.
///
/// # Errors
///
/// An [`Err`] is returned when the page cannot be fetched or has no abbreviations block, when a
/// database or supplementary document cannot be parsed, or on IO failure.
#[inline]
pub fn check_or_build(config: &Config) -> Result<Outcome, Error> {
    trace!("Check or build database at '{}'", config.database.display());
    builder::check_or_build::<Client>(config)
}

/// Replace full journal names in [`Config::bib_file`] with the abbreviations from `db`.
///
/// # Errors
///
/// An [`Err`] is returned when the bibliography cannot be read or replaced.
#[inline]
pub fn rewrite_bibliography(
    config: &Config,
    db: &AbbreviationDatabase,
) -> Result<RewriteReport, Error> {
    rewrite::rewrite_file(&config.bib_file, db.records())
}

/// Report entries of [`Config::bib_file`] whose `journal` field still holds a full name.
///
/// A bibliography that cannot be parsed is skipped with a warning rather than failing the run.
///
/// # Errors
///
/// An [`Err`] is returned when the bibliography cannot be read.
#[inline]
pub fn audit_bibliography(
    config: &Config,
    db: &AbbreviationDatabase,
) -> Result<Vec<Finding>, Error> {
    let path = &config.bib_file;
    let text = fs::read_to_string(path).map_err(|e| {
        Error::wrap_with(ErrorKind::IO, format!("Cannot read '{}'", path.display()), e)
    })?;

    match audit::audit(&text, db.records()) {
        Ok(findings) => Ok(findings),
        Err(e) => {
            warn!("Skipping audit of {}: {e}", path.display());
            Ok(Vec::new())
        }
    }
}
