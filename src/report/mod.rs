pub mod controller;
pub mod dates;
pub mod export;
pub mod family;
pub mod poller;
pub mod row;

pub use controller::{FetchedPage, ReportBackend, ReportController, ReportFilter, ReportQuery};
pub use family::{FamilySpec, ReportKind, PAGE_SIZE_ALL, PAGE_SIZE_OPTIONS};
pub use row::ReportRow;
