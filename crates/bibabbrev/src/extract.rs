//! Scraping abbreviation records out of the abbreviations page.
//!
//! The page lists journals inside a single `<pre>` block as alternating abbreviation elements
//! and name text:
//!
//! ```html
//! <pre>
//! <a name="A">A</a>
//! <a href="...">A&amp;A</a>      Astronomy and Astrophysics
//! <a href="...">Ap&amp;SS</a>    Astrophysics and Space Science
//! </pre>
//! ```
//!
//! Elements carrying a `name` attribute are section labels and are not data.

use crate::{AbbreviationRecord, Error, ErrorKind};

use log::trace;
use scraper::{ElementRef, Html, Node, Selector};

/// A parsed abbreviations page.
pub struct Extractor {
    document: Html,
}

impl Extractor {
    /// Parse the raw page markup.
    #[must_use]
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// Iterate the records of the first `<pre>` block in document order.
    ///
    /// Entities are decoded and whitespace runs are collapsed to single spaces in both the
    /// abbreviation and the full name. Each item is an [`Err`] with
    /// [`ErrorKind::MalformedBlock`] when a data element has no following name or the name is
    /// empty. Elements without text, such as `<br>`, are skipped.
    ///
    /// # Errors
    ///
    /// An [`Err`] with [`ErrorKind::MissingBlock`] when the page has no `<pre>` block.
    pub fn records(
        &self,
    ) -> Result<impl Iterator<Item = Result<AbbreviationRecord, Error>> + '_, Error> {
        let selector = Selector::parse("pre").expect("pre should always be a valid selector");
        let pre = self.document.select(&selector).next().ok_or_else(|| {
            Error::new(
                ErrorKind::MissingBlock,
                "Cannot parse page. Expected tag <pre></pre> not found.",
            )
        })?;
        trace!("Found <pre> block - reading abbreviations");

        Ok(pre
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|element| element.value().attr("name").is_none())
            .filter(has_text)
            .map(record_from_element))
    }
}

// Elements like <br> or <hr> carry no abbreviation and are not data.
fn has_text(element: &ElementRef<'_>) -> bool {
    element.text().any(|t| !t.trim().is_empty())
}

fn record_from_element(element: ElementRef<'_>) -> Result<AbbreviationRecord, Error> {
    let abbreviation = collapse_whitespace(&element.text().collect::<String>());

    let full_name = element
        .next_sibling()
        .map(|sibling| match sibling.value() {
            Node::Text(text) => collapse_whitespace(text),
            _ => ElementRef::wrap(sibling)
                .map(|e| collapse_whitespace(&e.text().collect::<String>()))
                .unwrap_or_default(),
        })
        .ok_or_else(|| {
            Error::new(
                ErrorKind::MalformedBlock,
                format!("Abbreviation '{abbreviation}' is not followed by a journal name"),
            )
        })?;

    if full_name.is_empty() {
        return Err(Error::new(
            ErrorKind::MalformedBlock,
            format!("Abbreviation '{abbreviation}' is followed by an empty journal name"),
        ));
    }

    Ok(AbbreviationRecord {
        abbreviation,
        full_name,
    })
}

/// Collapse every run of whitespace, newlines included, into a single space and trim both ends.
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
