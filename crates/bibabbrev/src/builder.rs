//! Building the abbreviations database and deciding when to.

use std::path::Path;

use crate::{
    database::load_supplementary,
    extract::Extractor,
    fetch::{fetch_page, Client},
    AbbreviationDatabase, AbbreviationRecord, Config, Error,
};

use chrono::{Local, NaiveDateTime, SubsecRound};
use log::{debug, info};

/// What [`check_or_build`] did to produce the database.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The database file already existed and was loaded.
    Existing(AbbreviationDatabase),
    /// A new database was built and written.
    Built(AbbreviationDatabase),
}

impl Outcome {
    /// The database regardless of how it was obtained.
    #[must_use]
    pub fn into_database(self) -> AbbreviationDatabase {
        match self {
            Self::Existing(db) | Self::Built(db) => db,
        }
    }
}

/// Load the configured database, building it first when it does not exist.
///
/// An existing database is only rebuilt with [`Config::force_rebuild`] or when
/// [`Config::max_age`] is set and `last_updated` is older or missing.
///
/// # Errors
///
/// An [`Err`] is returned when an existing database cannot be parsed or when building fails,
/// see [`build`].
pub fn check_or_build<C: Client>(config: &Config) -> Result<Outcome, Error> {
    let path = config.database.as_path();

    if path.is_file() && config.force_rebuild {
        info!("Abbreviations database found at: {}", path.display());
        info!("Rebuild forced - building database...");
    } else if path.is_file() {
        info!("Abbreviations database found at: {}", path.display());
        let db = AbbreviationDatabase::load(path)?;

        if is_stale(&db, config, now()) {
            info!("Database is older than the allowed age - building database...");
        } else {
            return Ok(Outcome::Existing(db));
        }
    } else {
        info!("No abbreviations database found at: {}", path.display());
        info!("Building database...");
    }

    build::<C>(config).map(Outcome::Built)
}

fn is_stale(db: &AbbreviationDatabase, config: &Config, now: NaiveDateTime) -> bool {
    config.max_age.is_some_and(|max_age| {
        db.last_updated()
            .map_or(true, |last_updated| now - last_updated > max_age)
    })
}

/// Fetch and extract the primary records, append any supplementary records and write the
/// database to [`Config::database`].
///
/// # Errors
///
/// An [`Err`] is returned when the page cannot be fetched or parsed, when the supplementary
/// document cannot be read or when the database cannot be written. Nothing is written on
/// error.
pub fn build<C: Client>(config: &Config) -> Result<AbbreviationDatabase, Error> {
    info!("Fetching abbreviations from {}", config.url);
    let page = fetch_page::<C>(&config.url)?;
    let primary = extract_records(&page)?;
    info!("Extracted {} journal abbreviations", primary.len());

    let supplementary = match &config.supplement {
        Some(path) => read_supplementary(path)?,
        None => Vec::new(),
    };

    let db = AbbreviationDatabase::merged(primary, supplementary, now());
    db.save(&config.database)?;
    info!(
        "Wrote {} records to {}",
        db.records().len(),
        config.database.display()
    );

    Ok(db)
}

// The database stores microseconds, truncate so a written database reads back equal.
fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(6)
}

fn extract_records(page: &str) -> Result<Vec<AbbreviationRecord>, Error> {
    let extractor = Extractor::parse(page);
    let mut records = Vec::new();
    for record in extractor.records()? {
        let record = record?;
        debug!("{} => {}", record.full_name, record.abbreviation);
        records.push(record);
    }
    Ok(records)
}

fn read_supplementary(path: &Path) -> Result<Vec<AbbreviationRecord>, Error> {
    let records = load_supplementary(path)?;
    info!(
        "Appending {} supplementary records from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::fetch::{impl_text_producer, MockTextClient, NetworkErrorProducer};
    use crate::ErrorKind;

    use assert_fs::{
        fixture::{FileWriteStr, PathChild},
        TempDir,
    };
    use chrono::Duration;

    impl_text_producer! {
        PageProducer => Ok(include_str!("../../../tests/data/refereed.html").to_owned()),
        NoPreProducer => Ok("<html><body>Service moved</body></html>".to_owned()),
        UnreachableProducer => unreachable!("an existing database must not be fetched again"),
        LineBreakProducer => Ok("<html><body><pre><a href=\"x\">ApJ</a> The Astrophysical Journal\n\
            <br>\n<a href=\"y\">SoPh</a> Solar Physics\n</pre></body></html>"
            .to_owned()),
    }

    const SUPPLEMENT: &str = r#"<root>
    <journals>
        <journal abbreviation="SoPh" name="Solar Physics"/>
        <journal abbreviation="ApJL" name="The Astrophysical Journal"/>
    </journals>
</root>"#;

    fn config(dir: &TempDir) -> Config {
        Config {
            bib_file: dir.child("references.bib").path().to_path_buf(),
            database: dir.child("abbrev.db.xml").path().to_path_buf(),
            supplement: None,
            url: "http://example.com/refereed.html".to_owned(),
            force_rebuild: false,
            max_age: None,
        }
    }

    #[test]
    fn build_writes_scraped_records() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);

        let outcome = check_or_build::<MockTextClient<PageProducer>>(&config).unwrap();
        let Outcome::Built(db) = outcome else {
            panic!("database should have been built");
        };

        assert_eq!(5, db.records().len());
        assert_eq!(5, db.num_journals());
        assert_eq!(
            AbbreviationRecord::new("Ap&SS", "Astrophysics and Space Science"),
            db.records()[2]
        );
        assert_eq!(db, AbbreviationDatabase::load(&config.database).unwrap());
    }

    #[test]
    fn supplementary_records_are_appended_but_not_counted() {
        let dir = TempDir::new().unwrap();
        let supplement = dir.child("supplement.xml");
        supplement.write_str(SUPPLEMENT).unwrap();
        let config = Config {
            supplement: Some(supplement.path().to_path_buf()),
            ..config(&dir)
        };

        let db = build::<MockTextClient<PageProducer>>(&config).unwrap();
        let stored = AbbreviationDatabase::load(&config.database).unwrap();

        assert_eq!(7, stored.records().len());
        assert_eq!(5, stored.num_journals());
        assert_eq!("SoPh", stored.records()[5].abbreviation);
        assert_eq!(db, stored);
    }

    #[test]
    fn existing_database_is_not_fetched_or_modified() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        build::<MockTextClient<PageProducer>>(&config).unwrap();
        let before = std::fs::read_to_string(&config.database).unwrap();

        let outcome = check_or_build::<MockTextClient<UnreachableProducer>>(&config).unwrap();

        assert!(matches!(outcome, Outcome::Existing(_)));
        assert_eq!(before, std::fs::read_to_string(&config.database).unwrap());
    }

    #[test]
    fn force_rebuild_fetches_again() {
        let dir = TempDir::new().unwrap();
        let database = dir.child("abbrev.db.xml");
        database.write_str(SUPPLEMENT).unwrap();
        let config = Config {
            force_rebuild: true,
            ..config(&dir)
        };

        let outcome = check_or_build::<MockTextClient<PageProducer>>(&config).unwrap();

        assert!(matches!(outcome, Outcome::Built(_)));
        assert_eq!(5, outcome.into_database().records().len());
    }

    #[test]
    fn force_rebuild_replaces_corrupt_database() {
        let dir = TempDir::new().unwrap();
        dir.child("abbrev.db.xml").write_str("<root><journals>").unwrap();
        let config = Config {
            force_rebuild: true,
            ..config(&dir)
        };

        let outcome = check_or_build::<MockTextClient<PageProducer>>(&config).unwrap();

        assert!(matches!(outcome, Outcome::Built(_)));
        let stored = AbbreviationDatabase::load(&config.database).unwrap();
        assert_eq!(5, stored.records().len());
    }

    #[test]
    fn line_breaks_in_block_do_not_stop_the_build() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);

        let db = build::<MockTextClient<LineBreakProducer>>(&config).unwrap();

        assert_eq!(
            vec![
                AbbreviationRecord::new("ApJ", "The Astrophysical Journal"),
                AbbreviationRecord::new("SoPh", "Solar Physics"),
            ],
            db.into_records()
        );
        assert!(config.database.is_file());
    }

    #[test]
    fn database_without_timestamp_is_stale_when_max_age_set() {
        let dir = TempDir::new().unwrap();
        dir.child("abbrev.db.xml").write_str(SUPPLEMENT).unwrap();
        let config = Config {
            max_age: Some(Duration::days(30)),
            ..config(&dir)
        };

        let outcome = check_or_build::<MockTextClient<PageProducer>>(&config).unwrap();

        assert!(matches!(outcome, Outcome::Built(_)));
    }

    #[test]
    fn staleness_compares_last_updated_with_max_age() {
        let built = NaiveDateTime::parse_from_str("2016-01-27 12:00:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        let db = AbbreviationDatabase::new(vec![], built);
        let dir = TempDir::new().unwrap();
        let config = Config {
            max_age: Some(Duration::days(7)),
            ..config(&dir)
        };

        assert!(!is_stale(&db, &config, built + Duration::days(6)));
        assert!(is_stale(&db, &config, built + Duration::days(8)));
        let config = Config {
            max_age: None,
            ..config
        };
        assert!(!is_stale(&db, &config, built + Duration::days(800)));
    }

    #[test]
    fn network_error_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);

        let err = check_or_build::<MockTextClient<NetworkErrorProducer>>(&config).unwrap_err();

        assert_eq!(ErrorKind::Network, err.kind());
        assert!(!config.database.exists());
    }

    #[test]
    fn page_without_pre_block_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);

        let err = build::<MockTextClient<NoPreProducer>>(&config).unwrap_err();

        assert_eq!(ErrorKind::MissingBlock, err.kind());
        assert!(!config.database.exists());
    }

    #[test]
    fn malformed_existing_database_is_an_error() {
        let dir = TempDir::new().unwrap();
        dir.child("abbrev.db.xml").write_str("<root><journals>").unwrap();

        let err = check_or_build::<MockTextClient<UnreachableProducer>>(&config(&dir)).unwrap_err();

        assert_eq!(ErrorKind::DatabaseParse, err.kind());
    }
}
