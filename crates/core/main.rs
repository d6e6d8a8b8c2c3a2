#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::missing_safety_doc,
    clippy::missing_const_for_fn
)]
#![allow(clippy::as_conversions, clippy::mod_module_files)]

use std::{path::PathBuf, process};

use bibabbrev as lib;

use lib::config::{home_dir, DEFAULT_URL};
use lib::{Config, Outcome};

use chrono::Duration;
use clap::Parser;
use eyre::{eyre, Context, Result};
use log::{error, trace};

fn main() {
    if let Err(err) = try_main() {
        error!("{:#}", err);
        process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();

    // quiet ignores verbosity but errors are still shown
    let verbosity = if cli.quiet {
        0
    } else {
        cli.verbosity as usize + 2
    };

    stderrlog::new().verbosity(verbosity).init()?;

    let config = cli.to_config()?;

    let outcome =
        lib::check_or_build(&config).wrap_err("Cannot prepare the abbreviations database")?;
    let db = match outcome {
        Outcome::Existing(db) => db,
        Outcome::Built(db) => {
            trace!("Database built with {} web sourced journals", db.num_journals());
            db
        }
    };

    if cli.build_only {
        print_summary(
            cli.quiet,
            &format!(
                "{} abbreviations available in {}",
                db.records().len(),
                config.database.display()
            ),
        );
        return Ok(());
    }

    let report = lib::rewrite_bibliography(&config, &db)
        .wrap_err_with(|| format!("Cannot rewrite {}", config.bib_file.display()))?;
    let findings = lib::audit_bibliography(&config, &db)?;

    print_summary(
        cli.quiet,
        &format!(
            "Replaced {} journal name(s) in {} ({} still unabbreviated)",
            report.substitutions,
            config.bib_file.display(),
            findings.len()
        ),
    );

    Ok(())
}

fn print_summary(quiet: bool, summary: &str) {
    if !quiet {
        println!("{summary}");
    }
}

#[derive(Parser)]
#[clap(name = "bibabbrev")]
#[clap(about = "Replace full journal names in a BibTeX file with their standard abbreviations")]
#[clap(version, author)]
struct Cli {
    /// The bibliography to rewrite in place
    ///
    /// Defaults to ~/Library/texmf/bibtex/bib/references.bib
    #[clap(short, long)]
    bib_file: Option<PathBuf>,

    /// The abbreviations database, built when it does not exist
    ///
    /// Defaults to ~/Library/texmf/bibtex/abbrev.db.xml
    #[clap(short, long)]
    database: Option<PathBuf>,

    /// Extra abbreviations appended to the scraped ones when building the database
    ///
    /// Defaults to ~/Library/texmf/bibtex/abbrev.supplement.xml when that file exists.
    #[clap(short, long)]
    supplement: Option<PathBuf>,

    /// The page to scrape abbreviations from
    #[clap(short, long, default_value = DEFAULT_URL)]
    url: String,

    /// Rebuild the database even if it already exists
    #[clap(long)]
    force_rebuild: bool,

    /// Rebuild the database when it is older than this many days
    #[clap(long)]
    max_age_days: Option<u32>,

    /// Only check or build the database, leave the bibliography untouched
    #[clap(long)]
    build_only: bool,

    /// How chatty the program is when performing commands
    ///
    /// The number of times this flag is used will increase how chatty
    /// the program is.
    #[clap(short, long, parse(from_occurrences))]
    verbosity: u8,

    /// Prevents the program from writing to stdout, errors will still be printed to stderr.
    #[clap(short, long)]
    quiet: bool,
}

impl Cli {
    fn to_config(&self) -> Result<Config> {
        let defaults = home_dir().ok().map(|home| Config::from_home(&home));

        let bib_file = match (&self.bib_file, &defaults) {
            (Some(path), _) => path.clone(),
            (None, Some(defaults)) => defaults.bib_file.clone(),
            (None, None) => {
                return Err(eyre!("No home directory found - use the --bib-file option"))
            }
        };

        let database = match (&self.database, &defaults) {
            (Some(path), _) => path.clone(),
            (None, Some(defaults)) => defaults.database.clone(),
            (None, None) => {
                return Err(eyre!("No home directory found - use the --database option"))
            }
        };

        let supplement = match &self.supplement {
            Some(path) if !path.is_file() => {
                return Err(eyre!(
                    "Supplementary database '{}' does not exist",
                    path.display()
                ))
            }
            Some(path) => Some(path.clone()),
            None => defaults.and_then(|defaults| defaults.supplement),
        };

        trace!("bib file: {}", bib_file.display());
        trace!("database: {}", database.display());
        if let Some(supplement) = &supplement {
            trace!("supplement: {}", supplement.display());
        }

        Ok(Config {
            bib_file,
            database,
            supplement,
            url: self.url.clone(),
            force_rebuild: self.force_rebuild,
            max_age: self.max_age_days.map(|days| Duration::days(i64::from(days))),
        })
    }
}
