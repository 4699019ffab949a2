use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AcctError {
    #[error("Config directory not found at {0}. Run 'acct init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Not logged in. Run 'acct login' first.")]
    NotLoggedIn,

    #[error("No shop selected. Run 'acct shops' to list shops, then 'acct select-shop <id>'.")]
    NoShopSelected,

    #[error("Session expired or rejected by the server. Run 'acct login' again.")]
    SessionExpired,

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Shop selection failed: {0}")]
    SelectShopFailed(String),

    #[error("{endpoint} returned HTTP {status}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("Unexpected response from {endpoint}: {reason}")]
    BadResponse { endpoint: String, reason: String },

    #[error("Journal document '{0}' not found")]
    JournalNotFound(String),

    #[error("Unknown report kind '{0}'")]
    UnknownReportKind(String),

    #[error("PDF generation was rejected by the server: {0}")]
    PdfJobRejected(String),

    #[error("PDF job did not complete after {attempts} status checks")]
    PdfJobTimeout { attempts: u32 },

    #[error("Another PDF download is already in progress for this report")]
    PdfJobBusy,

    #[error("Font file not found: {0}. Download the Sarabun family (regular and bold TTF) and place it in the configured font directory.")]
    FontNotFound(PathBuf),

    #[error("Failed to build spreadsheet: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Failed to render PDF: {0}")]
    Pdf(String),

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD.")]
    InvalidDate(String),

    #[error("Invalid period: month {0} is out of range 1-12")]
    InvalidMonth(u32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AcctError>;
