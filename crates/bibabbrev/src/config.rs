//! Locations and rebuild policy for a run.

use std::path::{Path, PathBuf};

use crate::{Error, ErrorKind};

use chrono::Duration;

/// The page the abbreviations are scraped from by default.
pub const DEFAULT_URL: &str = "http://adsabs.harvard.edu/abs_doc/refereed.html";

const BIB_FILE: &str = "Library/texmf/bibtex/bib/references.bib";
const DATABASE: &str = "Library/texmf/bibtex/abbrev.db.xml";
const SUPPLEMENT: &str = "Library/texmf/bibtex/abbrev.supplement.xml";

/// Resolved settings for building the database and rewriting a bibliography.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// The bibliography rewritten in place.
    pub bib_file: PathBuf,
    /// Where the abbreviations database is kept.
    pub database: PathBuf,
    /// Hand maintained records appended to the scraped ones.
    pub supplement: Option<PathBuf>,
    /// The abbreviations page.
    pub url: String,
    /// Rebuild even when the database already exists.
    pub force_rebuild: bool,
    /// Rebuild an existing database older than this.
    pub max_age: Option<Duration>,
}

impl Config {
    /// Default settings laid out under `home`.
    ///
    /// The supplement is only used when the file exists.
    #[must_use]
    pub fn from_home(home: &Path) -> Self {
        let supplement = default_supplement(home);
        Self {
            bib_file: home.join(BIB_FILE),
            database: home.join(DATABASE),
            supplement: supplement.is_file().then_some(supplement),
            url: DEFAULT_URL.to_owned(),
            force_rebuild: false,
            max_age: None,
        }
    }

    /// Default settings laid out under the current user's home directory.
    ///
    /// # Errors
    ///
    /// An [`Err`] with [`ErrorKind::Config`] when the home directory cannot be determined.
    pub fn with_defaults() -> Result<Self, Error> {
        home_dir().map(|home| Self::from_home(&home))
    }
}

/// The default supplementary database location under `home`, whether or not it exists.
#[must_use]
pub fn default_supplement(home: &Path) -> PathBuf {
    home.join(SUPPLEMENT)
}

/// The current user's home directory.
///
/// # Errors
///
/// An [`Err`] with [`ErrorKind::Config`] when it cannot be determined.
pub fn home_dir() -> Result<PathBuf, Error> {
    dirs::home_dir().ok_or_else(|| {
        Error::new(
            ErrorKind::Config,
            "Cannot determine the home directory for default paths",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_fs::{
        fixture::{FileTouch, PathChild},
        TempDir,
    };

    #[test]
    fn defaults_follow_home_layout() {
        let config = Config::from_home(Path::new("/home/astro"));

        assert_eq!(
            PathBuf::from("/home/astro/Library/texmf/bibtex/bib/references.bib"),
            config.bib_file
        );
        assert_eq!(
            PathBuf::from("/home/astro/Library/texmf/bibtex/abbrev.db.xml"),
            config.database
        );
        assert_eq!(DEFAULT_URL, config.url);
        assert_eq!(None, config.supplement);
        assert!(!config.force_rebuild);
    }

    #[test]
    fn existing_default_supplement_is_used() {
        let home = TempDir::new().unwrap();
        std::fs::create_dir_all(home.path().join("Library/texmf/bibtex")).unwrap();
        home.child(SUPPLEMENT).touch().unwrap();

        let config = Config::from_home(home.path());

        assert_eq!(Some(home.path().join(SUPPLEMENT)), config.supplement);
    }
}
