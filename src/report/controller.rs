//! Per-report reactive state and fetch orchestration.
//!
//! One `ReportController` owns everything a report screen shows: filter
//! values, the loaded page of rows, pagination counters, master-data lists
//! and the expansion side map. It talks to the network through the
//! [`ReportBackend`] seam and to the user through [`Notify`], which keeps
//! the whole lifecycle testable against mocks.
//!
//! Filter changes are coalesced: a page-size change resets the page and
//! issues exactly one fetch, and every fetch is stamped with a generation
//! number so a response that was overtaken by a newer filter change is
//! dropped instead of clobbering fresher rows.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};
use serde_json::{Map, Value};

use crate::api::master::{ChartAccount, Counterparty, CounterpartySide};
use crate::api::shop::ShopProfile;
use crate::config::FilterSnapshot;
use crate::error::{AcctError, Result};
use crate::notify::Notify;
use crate::report::dates;
use crate::report::family::{month_name_th, FamilySpec, FilterField, PAGE_SIZE_ALL, PAGE_SIZE_OPTIONS};
use crate::report::poller::{self, CheckOutcome, PdfJob, Sleeper, SubmitOutcome};
use crate::report::row::ReportRow;

/// A fully resolved report request: pagination plus every query parameter
/// the family's endpoint expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub limit: u32,
    pub offset: u32,
    pub params: Vec<(String, String)>,
}

impl ReportQuery {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// One page of raw report rows plus the server's record count, when the
/// envelope carried one.
pub struct FetchedPage {
    pub rows: Vec<Map<String, Value>>,
    pub total: Option<u64>,
}

/// Everything the controller needs from the outside world. Implemented by
/// the HTTP client in production and by mocks in tests. `Sync` because the
/// two master-data loads run as a concurrent pair.
pub trait ReportBackend: Sync {
    fn fetch_shop(&self, shop_id: &str) -> Result<ShopProfile>;
    fn fetch_page(&self, spec: &FamilySpec, query: &ReportQuery) -> Result<FetchedPage>;
    fn load_accounts(&self) -> Result<Vec<ChartAccount>>;
    fn load_counterparties(&self, side: CounterpartySide) -> Result<Vec<Counterparty>>;
    fn submit_pdf(&self, spec: &FamilySpec, query: &ReportQuery) -> Result<SubmitOutcome>;
    fn check_pdf(&self, spec: &FamilySpec, job: &PdfJob) -> CheckOutcome;
    fn download_pdf(&self, spec: &FamilySpec, job: &PdfJob) -> Result<PathBuf>;
}

/// User-editable filter state for one report instance.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    /// Buddhist-era year, for period families.
    pub year_be: Option<i32>,
    pub month: Option<u32>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub account_code: Option<String>,
    pub counterparty_code: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

pub struct ReportController<'a> {
    spec: &'static FamilySpec,
    backend: &'a dyn ReportBackend,
    notify: &'a dyn Notify,
    shop_id: String,
    pub filter: ReportFilter,
    shop: Option<ShopProfile>,
    rows: Vec<ReportRow>,
    total_records: u64,
    expanded: HashMap<String, bool>,
    accounts: Vec<ChartAccount>,
    counterparties: Vec<Counterparty>,
    generation: u64,
    pdf_busy: bool,
}

impl<'a> ReportController<'a> {
    pub fn new(
        spec: &'static FamilySpec,
        backend: &'a dyn ReportBackend,
        notify: &'a dyn Notify,
        shop_id: String,
    ) -> Self {
        ReportController {
            spec,
            backend,
            notify,
            shop_id,
            filter: ReportFilter {
                page: 1,
                page_size: spec.default_page_size,
                ..ReportFilter::default()
            },
            shop: None,
            rows: Vec::new(),
            total_records: 0,
            expanded: HashMap::new(),
            accounts: Vec::new(),
            counterparties: Vec::new(),
            generation: 0,
            pdf_busy: false,
        }
    }

    pub fn spec(&self) -> &'static FamilySpec {
        self.spec
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn total_records(&self) -> u64 {
        self.total_records
    }

    pub fn shop(&self) -> Option<&ShopProfile> {
        self.shop.as_ref()
    }

    pub fn accounts(&self) -> &[ChartAccount] {
        &self.accounts
    }

    pub fn counterparties(&self) -> &[Counterparty] {
        &self.counterparties
    }

    /// Fill unset filters with this month's defaults, load the shop profile
    /// and master data, then fetch the first page if the family's required
    /// filters are already satisfied.
    ///
    /// A failed shop-profile load reports the error and leaves the report
    /// empty; no report fetch is attempted.
    pub fn initialize(&mut self, today: NaiveDate) -> bool {
        if self.spec.period_filter() {
            if self.filter.year_be.is_none() {
                self.filter.year_be = Some(dates::be_year(today.year()));
            }
            if self.filter.month.is_none() {
                self.filter.month = Some(today.month());
            }
        } else {
            if self.filter.from_date.is_none() {
                self.filter.from_date = NaiveDate::from_ymd_opt(today.year(), today.month(), 1);
            }
            if self.filter.to_date.is_none() {
                self.filter.to_date = dates::last_day_of_month(today.year(), today.month()).ok();
            }
        }

        if !self.ensure_shop() {
            return false;
        }
        self.load_master_data();

        if self.missing_filter().is_none() {
            self.fetch(true)
        } else {
            // Status reports wait for an account selection before their
            // first fetch; that is not an error at this point.
            true
        }
    }

    /// Validate filters and fetch the current page, replacing the loaded
    /// rows wholesale. With `reset_page` the page snaps back to 1 and a
    /// record-count notification is shown.
    ///
    /// Returns false without touching the network when a required filter
    /// is missing. On a network failure the rows are cleared so stale data
    /// never shows under new filters.
    pub fn fetch(&mut self, reset_page: bool) -> bool {
        if self.shop.is_none() && !self.ensure_shop() {
            return false;
        }
        if !self.validate_filters() {
            return false;
        }
        if reset_page {
            self.filter.page = 1;
        }

        let generation = self.begin_fetch();
        let query = match self.build_query(self.filter.page_size) {
            Ok(query) => query,
            Err(e) => {
                self.notify.warn("Invalid filter", &e.to_string());
                return false;
            }
        };

        match self.backend.fetch_page(self.spec, &query) {
            Ok(page) => self.apply_page(generation, page, reset_page),
            Err(e) => {
                self.rows.clear();
                self.total_records = 0;
                self.notify.error("Failed to load report data", &e.to_string());
                false
            }
        }
    }

    /// Move to page `n`. A no-op outside `[1, total_pages]` or when the
    /// page is unchanged.
    pub fn go_to_page(&mut self, page: u32) -> bool {
        if page < 1 || u64::from(page) > self.total_pages() || page == self.filter.page {
            return false;
        }
        self.filter.page = page;
        self.expanded.clear();
        self.fetch(false)
    }

    /// Change the page size. Resets to page 1 and issues exactly one fetch
    /// for the whole change; the page reset cannot trigger a second one.
    pub fn set_items_per_page(&mut self, size: u32) -> bool {
        if size == self.filter.page_size || !PAGE_SIZE_OPTIONS.contains(&size) {
            return false;
        }
        self.filter.page_size = size;
        self.expanded.clear();
        self.fetch(true)
    }

    /// Apply the current filters from the top: validates, drops row
    /// expansion state and fetches page 1.
    pub fn search(&mut self) -> bool {
        if !self.validate_filters() {
            return false;
        }
        self.expanded.clear();
        self.fetch(true)
    }

    /// Pages in the current result set. Always 1 under the sentinel page
    /// size.
    pub fn total_pages(&self) -> u64 {
        if self.filter.page_size == PAGE_SIZE_ALL {
            return 1;
        }
        let size = u64::from(self.filter.page_size.max(1));
        self.total_records.div_ceil(size)
    }

    /// Column totals over the loaded page only, in the family's configured
    /// order.
    pub fn totals(&self) -> Vec<(&'static str, f64)> {
        self.spec
            .totals
            .iter()
            .map(|t| (t.label, self.rows.iter().map(|r| r.number(t.field)).sum()))
            .collect()
    }

    pub fn is_download_disabled(&self) -> bool {
        self.missing_filter().is_some() || self.rows.is_empty()
    }

    /// Flip one row's expansion flag; returns the new state.
    pub fn toggle_row(&mut self, uid: &str) -> bool {
        if self.expanded.remove(uid).is_some() {
            false
        } else {
            self.expanded.insert(uid.to_string(), true);
            true
        }
    }

    pub fn is_expanded(&self, uid: &str) -> bool {
        self.expanded.contains_key(uid)
    }

    /// Run the family's server-side PDF job with an unlimited page size and
    /// download the result. Re-validates filters first; a second call while
    /// a poll is in flight is refused.
    pub fn download_pdf<S: Sleeper>(&mut self, sleeper: &S) -> Option<PathBuf> {
        if !self.validate_filters() {
            return None;
        }
        if self.shop.is_none() && !self.ensure_shop() {
            return None;
        }
        if self.pdf_busy {
            self.notify.warn(
                "PDF generation already running",
                "Wait for the current download to finish",
            );
            return None;
        }
        let query = match self.build_query(PAGE_SIZE_ALL) {
            Ok(query) => query,
            Err(e) => {
                self.notify.warn("Invalid filter", &e.to_string());
                return None;
            }
        };

        self.pdf_busy = true;
        let backend = self.backend;
        let spec = self.spec;
        let result = poller::generate_pdf(
            sleeper,
            || backend.submit_pdf(spec, &query),
            |job| backend.check_pdf(spec, job),
            |job| backend.download_pdf(spec, job),
        );
        self.pdf_busy = false;

        match result {
            Ok(path) => {
                self.notify
                    .success("PDF saved", &path.display().to_string());
                Some(path)
            }
            Err(e) => {
                self.notify.error("Failed to generate PDF", &e.to_string());
                None
            }
        }
    }

    /// Subtitle line for exports: the selected period or date range.
    pub fn subtitle(&self) -> String {
        if self.spec.period_filter() {
            match (self.filter.year_be, self.filter.month) {
                (Some(year), Some(month)) => {
                    format!("ประจำเดือน {} {}", month_name_th(month), year)
                }
                _ => String::new(),
            }
        } else {
            match (self.filter.from_date, self.filter.to_date) {
                (Some(from), Some(to)) => format!(
                    "ตั้งแต่วันที่ {} ถึง {}",
                    dates::format_date_thai(&dates::format_date_api(from)),
                    dates::format_date_thai(&dates::format_date_api(to)),
                ),
                _ => String::new(),
            }
        }
    }

    /// Header line for exports: shop name and tax id.
    pub fn shop_line(&self) -> String {
        match &self.shop {
            Some(shop) if !shop.tax_id().is_empty() => format!(
                "{} เลขประจำตัวผู้เสียภาษี {}",
                shop.name_th(),
                shop.tax_id()
            ),
            Some(shop) => shop.name_th().to_string(),
            None => String::new(),
        }
    }

    pub fn snapshot(&self) -> FilterSnapshot {
        FilterSnapshot {
            page: self.filter.page,
            page_size: self.filter.page_size,
            search: self.filter.counterparty_code.clone().unwrap_or_default(),
        }
    }

    pub fn restore(&mut self, snapshot: &FilterSnapshot) {
        if snapshot.page >= 1 {
            self.filter.page = snapshot.page;
        }
        if PAGE_SIZE_OPTIONS.contains(&snapshot.page_size) {
            self.filter.page_size = snapshot.page_size;
        }
        if !snapshot.search.is_empty() {
            self.filter.counterparty_code = Some(snapshot.search.clone());
        }
    }

    fn ensure_shop(&mut self) -> bool {
        if self.shop_id.is_empty() {
            self.notify
                .error("Shop not selected", "Select a shop and try again");
            return false;
        }
        match self.backend.fetch_shop(&self.shop_id) {
            Ok(profile) => {
                self.shop = Some(profile);
                true
            }
            Err(e) => {
                self.notify
                    .error("Failed to load shop profile", &e.to_string());
                false
            }
        }
    }

    /// Load the master lists this family filters on. The two loads run as
    /// a concurrent pair and both are awaited before returning.
    fn load_master_data(&mut self) {
        let need_accounts = self.spec.requires(FilterField::Account);
        let side = self.spec.counterparty;
        if !need_accounts && side.is_none() {
            return;
        }

        let backend = self.backend;
        let (accounts, counterparties) = std::thread::scope(|scope| {
            let accounts = scope.spawn(move || need_accounts.then(|| backend.load_accounts()));
            let counterparties =
                scope.spawn(move || side.map(|side| backend.load_counterparties(side)));
            (accounts.join(), counterparties.join())
        });

        match accounts {
            Ok(Some(Ok(list))) => self.accounts = list,
            Ok(Some(Err(e))) => {
                self.accounts.clear();
                self.notify
                    .warn("Failed to load chart of accounts", &e.to_string());
            }
            Ok(None) => {}
            Err(_) => self
                .notify
                .warn("Failed to load chart of accounts", "loader thread panicked"),
        }
        match counterparties {
            Ok(Some(Ok(list))) => self.counterparties = list,
            Ok(Some(Err(e))) => {
                self.counterparties.clear();
                self.notify
                    .warn("Failed to load counterparty list", &e.to_string());
            }
            Ok(None) => {}
            Err(_) => self
                .notify
                .warn("Failed to load counterparty list", "loader thread panicked"),
        }
    }

    fn missing_filter(&self) -> Option<FilterField> {
        for field in self.spec.required {
            let missing = match field {
                FilterField::Period => {
                    self.filter.year_be.is_none() || self.filter.month.is_none()
                }
                FilterField::DateRange => {
                    self.filter.from_date.is_none() || self.filter.to_date.is_none()
                }
                FilterField::Account => self
                    .filter
                    .account_code
                    .as_deref()
                    .map_or(true, str::is_empty),
            };
            if missing {
                return Some(*field);
            }
        }
        None
    }

    fn validate_filters(&self) -> bool {
        match self.missing_filter() {
            None => true,
            Some(FilterField::Period) => {
                self.notify
                    .warn("Select a period", "Choose a year and month before searching");
                false
            }
            Some(FilterField::DateRange) => {
                self.notify.warn(
                    "Select a date range",
                    "Choose from and to dates before searching",
                );
                false
            }
            Some(FilterField::Account) => {
                self.notify.warn(
                    "Select an account",
                    "Choose a chart-of-accounts entry before searching",
                );
                false
            }
        }
    }

    fn begin_fetch(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Build the wire query for the current filters at the given page size.
    /// The sentinel page size maps to an unlimited fetch from offset 0.
    fn build_query(&self, page_size: u32) -> Result<ReportQuery> {
        let (limit, offset) = if page_size == PAGE_SIZE_ALL {
            (PAGE_SIZE_ALL, 0)
        } else {
            (page_size, self.filter.page.saturating_sub(1) * page_size)
        };

        let mut params: Vec<(String, String)> = self
            .spec
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        if self.spec.period_filter() {
            let year = self
                .filter
                .year_be
                .ok_or_else(|| AcctError::InvalidDate("missing period".to_string()))?;
            let month = self
                .filter
                .month
                .ok_or_else(|| AcctError::InvalidDate("missing period".to_string()))?;
            let (fromdate, todate) = dates::period_range(year, month)?;
            params.push(("year".to_string(), year.to_string()));
            params.push(("period".to_string(), month.to_string()));
            params.push(("fromdate".to_string(), fromdate));
            params.push(("todate".to_string(), todate));
        } else {
            let from = self
                .filter
                .from_date
                .ok_or_else(|| AcctError::InvalidDate("missing date range".to_string()))?;
            let to = self
                .filter
                .to_date
                .ok_or_else(|| AcctError::InvalidDate("missing date range".to_string()))?;
            params.push(("fromdate".to_string(), dates::format_date_api(from)));
            params.push(("todate".to_string(), dates::format_date_api(to)));
        }

        params.push(("shopid".to_string(), self.shop_id.clone()));
        if let Some(shop) = &self.shop {
            params.push(("shopname".to_string(), shop.name_th().to_string()));
            params.push(("taxid".to_string(), shop.tax_id().to_string()));
            params.push(("address".to_string(), shop.address_th().to_string()));
        }
        if self.spec.requires(FilterField::Account) {
            params.push((
                "accountcode".to_string(),
                self.filter.account_code.clone().unwrap_or_default(),
            ));
            params.push((
                "custcode".to_string(),
                self.filter.counterparty_code.clone().unwrap_or_default(),
            ));
        }

        Ok(ReportQuery {
            limit,
            offset,
            params,
        })
    }

    /// Install a fetched page unless a newer filter change has already
    /// superseded this request.
    fn apply_page(&mut self, generation: u64, page: FetchedPage, reset_page: bool) -> bool {
        if generation != self.generation {
            return false;
        }
        self.rows = page
            .rows
            .into_iter()
            .enumerate()
            .map(|(index, fields)| ReportRow::new(self.spec.key, index, fields))
            .collect();
        self.total_records = page.total.unwrap_or(self.rows.len() as u64);
        if reset_page {
            self.notify.success(
                "Loaded",
                &format!("{} records found", self.total_records),
            );
        }
        true
    }
}
