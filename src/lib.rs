pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod notify;
pub mod numfmt;
pub mod report;

pub use config::{Config, FilterSnapshots, ShopSession};
pub use error::{AcctError, Result};
pub use report::{ReportController, ReportKind};
