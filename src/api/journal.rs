use serde::Deserialize;

use super::{ApiClient, Base, Envelope};
use crate::error::{AcctError, Result};

/// One posting line of a journal document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JournalLine {
    #[serde(default)]
    pub accountcode: String,
    #[serde(default)]
    pub accountname: String,
    #[serde(default)]
    pub debitamount: f64,
    #[serde(default)]
    pub creditamount: f64,
}

/// A journal document with its posting lines, shown when a report row is
/// expanded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JournalDocument {
    #[serde(default)]
    pub docno: String,
    #[serde(default)]
    pub docdate: String,
    #[serde(default)]
    pub accountdescription: String,
    #[serde(default, alias = "journaldetail")]
    pub details: Vec<JournalLine>,
}

impl JournalDocument {
    pub fn total_debit(&self) -> f64 {
        self.details.iter().map(|l| l.debitamount).sum()
    }

    pub fn total_credit(&self) -> f64 {
        self.details.iter().map(|l| l.creditamount).sum()
    }
}

/// Fetch a journal document by its document number.
///
/// This is an id-lookup helper: callers show the error AND receive it, so
/// a form can block navigation when the document cannot be loaded.
pub fn get_journal_by_docno(api: &ApiClient, docno: &str) -> Result<JournalDocument> {
    let path = format!("gl/journal/docno/{docno}");
    let envelope: Envelope<JournalDocument> = api.get(Base::Main, &path, &[])?;
    match envelope.data {
        Some(doc) if envelope.success => Ok(doc),
        _ => Err(AcctError::JournalNotFound(docno.to_string())),
    }
}
