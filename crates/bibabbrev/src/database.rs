//! The abbreviations database and its persisted XML document.
//!
//! The document keeps the layout the database has always had on disk:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <root>
//!     <journals>
//!         <journal abbreviation="Ap&amp;SS" name="Astrophysics and Space Science"/>
//!     </journals>
//!     <num_journals>1</num_journals>
//!     <last_updated>2016-01-27 14:03:22.123456</last_updated>
//! </root>
//! ```
//!
//! Supplementary documents share the `journals` collection but need not carry the metadata
//! elements.

use std::{fs, path::Path};

use crate::{Error, ErrorKind};

use chrono::NaiveDateTime;
use log::trace;
use quick_xml::se::Serializer;
use serde::{Deserialize, Serialize};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// A single journal name and its abbreviation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbbreviationRecord {
    /// The abbreviation, e.g. `Ap&SS`.
    #[serde(rename = "@abbreviation")]
    pub abbreviation: String,
    /// The full journal name, e.g. `Astrophysics and Space Science`.
    #[serde(rename = "@name")]
    pub full_name: String,
}

impl AbbreviationRecord {
    /// Construct a record from anything string like.
    pub fn new<A, N>(abbreviation: A, full_name: N) -> Self
    where
        A: Into<String>,
        N: Into<String>,
    {
        Self {
            abbreviation: abbreviation.into(),
            full_name: full_name.into(),
        }
    }
}

/// An ordered set of [`AbbreviationRecord`]s with build metadata.
///
/// The database is never edited in place, a new one is built and written over the old one.
#[derive(Clone, Debug, PartialEq)]
pub struct AbbreviationDatabase {
    records: Vec<AbbreviationRecord>,
    num_journals: usize,
    last_updated: Option<NaiveDateTime>,
}

impl AbbreviationDatabase {
    /// Create a database where every record counts towards `num_journals`.
    #[must_use]
    pub fn new(records: Vec<AbbreviationRecord>, last_updated: NaiveDateTime) -> Self {
        let num_journals = records.len();
        Self {
            records,
            num_journals,
            last_updated: Some(last_updated),
        }
    }

    /// Create a database from primary records with supplementary records appended.
    ///
    /// `num_journals` only counts the primary records.
    #[must_use]
    pub fn merged(
        mut primary: Vec<AbbreviationRecord>,
        supplementary: Vec<AbbreviationRecord>,
        last_updated: NaiveDateTime,
    ) -> Self {
        let num_journals = primary.len();
        primary.extend(supplementary);
        Self {
            records: primary,
            num_journals,
            last_updated: Some(last_updated),
        }
    }

    /// The records in database order.
    #[must_use]
    pub fn records(&self) -> &[AbbreviationRecord] {
        &self.records
    }

    /// Consume the database returning the records.
    #[must_use]
    pub fn into_records(self) -> Vec<AbbreviationRecord> {
        self.records
    }

    /// The number of records scraped from the web source.
    #[must_use]
    pub const fn num_journals(&self) -> usize {
        self.num_journals
    }

    /// When the database was built, if recorded.
    #[must_use]
    pub const fn last_updated(&self) -> Option<NaiveDateTime> {
        self.last_updated
    }

    /// Read and parse a database document from `path`.
    ///
    /// # Errors
    ///
    /// An [`Err`] with [`ErrorKind::IO`] when the file cannot be read and
    /// [`ErrorKind::DatabaseParse`] when its content is not a database document.
    pub fn load(path: &Path) -> Result<Self, Error> {
        trace!("Loading abbreviations database from '{}'", path.display());
        let xml = fs::read_to_string(path).map_err(|e| {
            Error::wrap_with(
                ErrorKind::IO,
                format!("Cannot read '{}'", path.display()),
                e,
            )
        })?;
        Self::from_xml(&xml).map_err(|e| {
            Error::wrap_with(
                ErrorKind::DatabaseParse,
                format!("Cannot parse '{}'", path.display()),
                e,
            )
        })
    }

    /// Parse a database document.
    ///
    /// A missing `num_journals` falls back to the number of records.
    ///
    /// # Errors
    ///
    /// An [`Err`] with [`ErrorKind::DatabaseParse`] when the document is malformed or an
    /// element or attribute is missing.
    pub fn from_xml(xml: &str) -> Result<Self, Error> {
        let document: Document =
            quick_xml::de::from_str(xml).map_err(|e| Error::wrap(ErrorKind::DatabaseParse, e))?;

        let last_updated = document
            .last_updated
            .as_deref()
            .map(parse_timestamp)
            .transpose()?;
        let records = document.journals.journal;

        Ok(Self {
            num_journals: document.num_journals.unwrap_or(records.len()),
            records,
            last_updated,
        })
    }

    /// Compose the database as a pretty printed document using four space indents.
    ///
    /// # Errors
    ///
    /// An [`Err`] with [`ErrorKind::DatabaseParse`] if serialization fails.
    pub fn to_xml(&self) -> Result<String, Error> {
        let document = Document {
            journals: Journals {
                journal: self.records.clone(),
            },
            num_journals: Some(self.num_journals),
            last_updated: self
                .last_updated
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
        };

        let mut xml = String::from(XML_DECLARATION);
        let mut ser = Serializer::with_root(&mut xml, Some("root"))
            .map_err(|e| Error::wrap(ErrorKind::DatabaseParse, e))?;
        ser.indent(' ', 4);
        document
            .serialize(ser)
            .map_err(|e| Error::wrap(ErrorKind::DatabaseParse, e))?;
        xml.push('\n');

        Ok(xml)
    }

    /// Write the database to `path` replacing any existing file.
    ///
    /// # Errors
    ///
    /// An [`Err`] when composing the document fails or the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let xml = self.to_xml()?;
        fs::write(path, xml).map_err(|e| {
            Error::wrap_with(
                ErrorKind::IO,
                format!("Cannot write database to '{}'", path.display()),
                e,
            )
        })
    }
}

/// Read the records of a supplementary document, metadata is ignored.
///
/// # Errors
///
/// See [`AbbreviationDatabase::load`].
pub fn load_supplementary(path: &Path) -> Result<Vec<AbbreviationRecord>, Error> {
    AbbreviationDatabase::load(path).map(AbbreviationDatabase::into_records)
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, Error> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_PARSE_FORMAT).map_err(|e| {
        Error::wrap_with(
            ErrorKind::DatabaseParse,
            format!("Invalid last_updated value '{s}'"),
            e,
        )
    })
}

#[derive(Serialize, Deserialize)]
struct Document {
    journals: Journals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    num_journals: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_updated: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct Journals {
    #[serde(default)]
    journal: Vec<AbbreviationRecord>,
}
