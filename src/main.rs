use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tabled::{settings::Style, Table, Tabled};

use acct::api::auth;
use acct::api::journal;
use acct::api::master::{self, CounterpartySide};
use acct::api::report::ApiBackend;
use acct::api::ApiClient;
use acct::config::{
    clear_session, config_dir, load_config, load_filters, load_session, resolve_dir, save_filters,
    save_session, CONFIG_TEMPLATE,
};
use acct::error::{AcctError, Result};
use acct::notify::{Notify, TermNotify};
use acct::report::controller::ReportController;
use acct::report::family::{ReportKind, PAGE_SIZE_ALL};
use acct::report::poller::ThreadSleeper;
use acct::report::{dates, export as report_export};
use acct::{export, numfmt};

#[derive(Parser)]
#[command(name = "acct")]
#[command(version, about = "Accounting back-office reports from the command line", long_about = None)]
struct Cli {
    /// Path to config directory (default: ~/.acct or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template config file
    Init,

    /// Log in with backend credentials or an identity-provider token
    Login {
        /// Backend username
        #[arg(short, long, requires = "password")]
        username: Option<String>,

        /// Backend password
        #[arg(short, long)]
        password: Option<String>,

        /// Identity-provider token (alternative to username/password)
        #[arg(long, conflicts_with_all = ["username", "password"])]
        token: Option<String>,

        /// Display name to store alongside a token login
        #[arg(long, requires = "token")]
        display_name: Option<String>,
    },

    /// Log out and clear the stored session
    Logout,

    /// List shops available to the logged-in user
    Shops {
        /// Toggle the favorite flag on this shop id before listing
        #[arg(long, value_name = "SHOP_ID")]
        favorite: Option<String>,
    },

    /// Bind the session to one shop
    SelectShop {
        /// Shop id from 'acct shops'
        shop_id: String,
    },

    /// Show session and configuration status
    Status,

    /// List the chart of accounts
    Accounts,

    /// List debtors, or show one by code
    Debtors {
        /// Debtor code for a single lookup
        code: Option<String>,
    },

    /// List creditors, or show one by code
    Creditors {
        /// Creditor code for a single lookup
        code: Option<String>,
    },

    /// Show a journal document with its posting lines
    Journal {
        /// Document number
        docno: String,
    },

    /// Fetch a report page; optionally export it or download the
    /// server-rendered PDF
    Report {
        /// Report kind: vat-purchase, vat-sale, withholding-pnd3,
        /// withholding-pnd53, withheld, payable, receivable
        kind: String,

        /// Buddhist-era year for period reports (e.g. 2568)
        #[arg(long)]
        year: Option<i32>,

        /// Month 1-12 for period reports
        #[arg(long)]
        month: Option<u32>,

        /// Range start (YYYY-MM-DD) for date-range reports
        #[arg(long)]
        from: Option<String>,

        /// Range end (YYYY-MM-DD) for date-range reports
        #[arg(long)]
        to: Option<String>,

        /// Account code filter (required for payable/receivable)
        #[arg(long)]
        account: Option<String>,

        /// Counterparty code filter
        #[arg(long)]
        counterparty: Option<String>,

        /// Page to fetch
        #[arg(long)]
        page: Option<u32>,

        /// Rows per page
        #[arg(long, conflicts_with = "all")]
        page_size: Option<u32>,

        /// Fetch everything on one page
        #[arg(long)]
        all: bool,

        /// Expand these document numbers with their journal lines
        #[arg(long, value_name = "DOCNO")]
        expand: Vec<String>,

        /// Export the loaded page to a spreadsheet
        #[arg(long, value_name = "PATH")]
        xlsx: Option<PathBuf>,

        /// Render the loaded page to a PDF locally
        #[arg(long, value_name = "PATH")]
        export_pdf: Option<PathBuf>,

        /// Ask the server to render the full report PDF and download it
        #[arg(long)]
        download_pdf: bool,

        /// Open the downloaded PDF with the system viewer
        #[arg(long, requires = "download_pdf")]
        open: bool,
    },

    /// Clear saved filter snapshots, for one report kind or all of them
    ResetFilters {
        /// Report kind; omit to clear everything
        kind: Option<String>,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    let result = dispatch(cli.command, &cfg_dir);

    // Any 401 invalidates the whole session, like the browser client's
    // forced redirect to login.
    if matches!(result, Err(AcctError::SessionExpired)) {
        let _ = clear_session(&cfg_dir);
    }

    result
}

fn dispatch(command: Commands, cfg_dir: &PathBuf) -> Result<()> {
    match command {
        Commands::Init => cmd_init(cfg_dir),
        Commands::Login {
            username,
            password,
            token,
            display_name,
        } => cmd_login(cfg_dir, username, password, token, display_name),
        Commands::Logout => cmd_logout(cfg_dir),
        Commands::Shops { favorite } => cmd_shops(cfg_dir, favorite),
        Commands::SelectShop { shop_id } => cmd_select_shop(cfg_dir, &shop_id),
        Commands::Status => cmd_status(cfg_dir),
        Commands::Accounts => cmd_accounts(cfg_dir),
        Commands::Debtors { code } => cmd_counterparties(cfg_dir, CounterpartySide::Debtor, code),
        Commands::Creditors { code } => {
            cmd_counterparties(cfg_dir, CounterpartySide::Creditor, code)
        }
        Commands::Journal { docno } => cmd_journal(cfg_dir, &docno),
        Commands::Report {
            kind,
            year,
            month,
            from,
            to,
            account,
            counterparty,
            page,
            page_size,
            all,
            expand,
            xlsx,
            export_pdf,
            download_pdf,
            open,
        } => cmd_report(
            cfg_dir,
            ReportArgs {
                kind,
                year,
                month,
                from,
                to,
                account,
                counterparty,
                page,
                page_size,
                all,
                expand,
                xlsx,
                export_pdf,
                download_pdf,
                open,
            },
        ),
        Commands::ResetFilters { kind } => cmd_reset_filters(cfg_dir, kind),
    }
}

/// Initialize config directory with a template config file
fn cmd_init(cfg_dir: &PathBuf) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(AcctError::AlreadyInitialized(cfg_dir.clone()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::create_dir_all(cfg_dir.join("output"))?;
    fs::create_dir_all(cfg_dir.join("fonts"))?;

    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;

    println!("Initialized acct config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Point the client at your backend:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!(
        "  2. Drop Sarabun-Regular.ttf and Sarabun-Bold.ttf into {}/fonts",
        cfg_dir.display()
    );
    println!("  3. Log in:       acct login --username <user> --password <pass>");
    println!("  4. Pick a shop:  acct shops && acct select-shop <id>");
    println!();
    println!("Then fetch your first report:");
    println!("  acct report vat-sale");

    Ok(())
}

// Table row structs for tabled
#[derive(Tabled)]
struct ShopRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "FAVORITE")]
    favorite: String,
}

#[derive(Tabled)]
struct CounterpartyRow {
    #[tabled(rename = "CODE")]
    code: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "TAX ID")]
    taxid: String,
}

#[derive(Tabled)]
struct JournalLineRow {
    #[tabled(rename = "ACCOUNT")]
    account: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "DEBIT")]
    debit: String,
    #[tabled(rename = "CREDIT")]
    credit: String,
}

fn cmd_login(
    cfg_dir: &PathBuf,
    username: Option<String>,
    password: Option<String>,
    token: Option<String>,
    display_name: Option<String>,
) -> Result<()> {
    if !cfg_dir.exists() {
        return Err(AcctError::ConfigNotFound(cfg_dir.clone()));
    }
    let config = load_config(cfg_dir)?;
    let api = ApiClient::new(&config.api, "");

    let mut session = load_session(cfg_dir)?;

    match (username, password, token) {
        (Some(username), Some(password), None) => {
            let tokens = auth::login(&api, &username, &password)?;
            session.token = tokens.token;
            session.refresh = tokens.refresh;
            session.is_authenticated = true;
            session.username = username;
            // a password login replaces any provider identity
            session.display_name.clear();
        }
        (None, _, Some(provider_token)) => {
            let tokens = auth::token_login(&api, &provider_token)?;
            session.token = tokens.token;
            session.refresh = tokens.refresh;
            session.is_authenticated = true;
            session.display_name = display_name.unwrap_or_default();
            session.username.clear();
        }
        _ => {
            return Err(AcctError::LoginFailed(
                "provide --username and --password, or --token".to_string(),
            ))
        }
    }

    save_session(cfg_dir, &session)?;
    println!("Logged in as {}", session.display_user());
    if !session.has_shop() {
        println!("Select a shop next: acct shops && acct select-shop <id>");
    }
    Ok(())
}

fn cmd_logout(cfg_dir: &PathBuf) -> Result<()> {
    if !cfg_dir.exists() {
        return Err(AcctError::ConfigNotFound(cfg_dir.clone()));
    }
    let config = load_config(cfg_dir)?;
    let session = load_session(cfg_dir)?;

    if session.logged_in() {
        let api = ApiClient::new(&config.api, &session.token);
        // best effort; local state is cleared either way
        if let Err(e) = auth::logout(&api) {
            eprintln!("warning: backend logout failed: {e}");
        }
    }

    clear_session(cfg_dir)?;
    println!("Logged out.");
    Ok(())
}

fn cmd_shops(cfg_dir: &PathBuf, favorite: Option<String>) -> Result<()> {
    let (config, session) = require_login(cfg_dir)?;
    let api = ApiClient::new(&config.api, &session.token);

    if let Some(shop_id) = favorite {
        let shops = auth::list_shops(&api)?;
        let current = shops
            .iter()
            .find(|s| s.shopid == shop_id)
            .map(|s| s.isfavorite)
            .unwrap_or(false);
        auth::favorite_shop(&api, &shop_id, !current)?;
    }

    let shops = auth::list_shops(&api)?;
    if shops.is_empty() {
        println!("No shops available for this account.");
        return Ok(());
    }

    let rows: Vec<ShopRow> = shops
        .iter()
        .map(|shop| ShopRow {
            id: shop.shopid.clone(),
            name: shop.name.clone(),
            favorite: if shop.isfavorite { "*" } else { "" }.to_string(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

fn cmd_select_shop(cfg_dir: &PathBuf, shop_id: &str) -> Result<()> {
    let (config, mut session) = require_login(cfg_dir)?;
    let api = ApiClient::new(&config.api, &session.token);

    let shops = auth::list_shops(&api)?;
    let entry = shops
        .iter()
        .find(|s| s.shopid == shop_id)
        .ok_or_else(|| AcctError::SelectShopFailed(format!("unknown shop id '{shop_id}'")))?;

    auth::select_shop(&api, shop_id)?;

    session.shop_id = entry.shopid.clone();
    session.shop_name = entry.name.clone();
    save_session(cfg_dir, &session)?;

    println!("Selected shop {} ({})", entry.name, entry.shopid);
    Ok(())
}

fn cmd_status(cfg_dir: &PathBuf) -> Result<()> {
    if !cfg_dir.exists() {
        return Err(AcctError::ConfigNotFound(cfg_dir.clone()));
    }
    let config = load_config(cfg_dir)?;
    let session = load_session(cfg_dir)?;
    let filters = load_filters(cfg_dir)?;

    println!("Acct Status");
    println!("{}", "-".repeat(50));
    println!("Config directory: {}", cfg_dir.display());
    println!("API:              {}", config.api.base_url);
    println!("Report API:       {}", config.api.report_url());

    if session.logged_in() {
        println!("Logged in as:     {}", session.display_user());
    } else {
        println!("Logged in as:     (not logged in)");
    }
    if session.has_shop() {
        println!(
            "Shop:             {} ({})",
            session.shop_name, session.shop_id
        );
    } else {
        println!("Shop:             (none selected)");
    }
    if !filters.reports.is_empty() {
        println!("Saved filters:    {} report(s)", filters.reports.len());
    }

    Ok(())
}

fn cmd_accounts(cfg_dir: &PathBuf) -> Result<()> {
    let (config, session) = require_shop(cfg_dir)?;
    let api = ApiClient::new(&config.api, &session.token);

    let accounts = master::list_chart_of_accounts(&api)?;
    if accounts.is_empty() {
        println!("Chart of accounts is empty.");
        return Ok(());
    }

    for account in &accounts {
        println!("{}", account.display_label());
    }
    println!();
    println!("{} accounts", accounts.len());
    Ok(())
}

fn cmd_counterparties(
    cfg_dir: &PathBuf,
    side: CounterpartySide,
    code: Option<String>,
) -> Result<()> {
    let (config, session) = require_shop(cfg_dir)?;
    let api = ApiClient::new(&config.api, &session.token);

    if let Some(code) = code {
        let record = master::get_counterparty(&api, side, &code)?;
        println!("{}", record.display_label());
        if !record.taxid.is_empty() {
            println!("Tax id: {}", record.taxid);
        }
        return Ok(());
    }

    let records = master::list_counterparties(&api, side)?;
    if records.is_empty() {
        println!("No records.");
        return Ok(());
    }

    let rows: Vec<CounterpartyRow> = records
        .iter()
        .map(|record| CounterpartyRow {
            code: record.code.clone(),
            name: record.name_th().to_string(),
            taxid: record.taxid.clone(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

fn cmd_journal(cfg_dir: &PathBuf, docno: &str) -> Result<()> {
    let (config, session) = require_shop(cfg_dir)?;
    let api = ApiClient::new(&config.api, &session.token);

    let doc = journal::get_journal_by_docno(&api, docno)?;
    print_journal(&doc);
    Ok(())
}

fn print_journal(doc: &journal::JournalDocument) {
    println!("{} ({})", doc.docno, dates::format_date_thai(&doc.docdate));
    if !doc.accountdescription.is_empty() {
        println!("{}", doc.accountdescription);
    }

    let rows: Vec<JournalLineRow> = doc
        .details
        .iter()
        .map(|line| JournalLineRow {
            account: line.accountcode.clone(),
            name: line.accountname.clone(),
            debit: numfmt::format_amount_display(line.debitamount, 2),
            credit: numfmt::format_amount_display(line.creditamount, 2),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    let debit = doc.total_debit();
    let credit = doc.total_credit();
    println!(
        "Debit {} / Credit {} ({})",
        numfmt::format_number(debit, 2),
        numfmt::format_number(credit, 2),
        if numfmt::is_balanced(debit, credit) {
            "balanced"
        } else {
            "NOT BALANCED"
        }
    );
}

struct ReportArgs {
    kind: String,
    year: Option<i32>,
    month: Option<u32>,
    from: Option<String>,
    to: Option<String>,
    account: Option<String>,
    counterparty: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
    all: bool,
    expand: Vec<String>,
    xlsx: Option<PathBuf>,
    export_pdf: Option<PathBuf>,
    download_pdf: bool,
    open: bool,
}

fn cmd_report(cfg_dir: &PathBuf, args: ReportArgs) -> Result<()> {
    let (config, session) = require_shop(cfg_dir)?;
    let kind = ReportKind::from_key(&args.kind)?;
    let spec = kind.spec();

    let api = ApiClient::new(&config.api, &session.token);
    let output_dir = resolve_dir(&config.pdf.output_dir, cfg_dir);
    let backend = ApiBackend::new(&api, output_dir);
    let notify = TermNotify;
    let mut controller = ReportController::new(spec, &backend, &notify, session.shop_id.clone());

    // restore the saved paging for this report kind; explicit flags win
    let mut filters = load_filters(cfg_dir)?;
    if let Some(snapshot) = filters.get(spec.key) {
        controller.restore(snapshot);
    }

    if let Some(year) = args.year {
        controller.filter.year_be = Some(year);
    }
    if let Some(month) = args.month {
        controller.filter.month = Some(month);
    }
    if let Some(from) = &args.from {
        controller.filter.from_date = Some(dates::parse_date_arg(from)?);
    }
    if let Some(to) = &args.to {
        controller.filter.to_date = Some(dates::parse_date_arg(to)?);
    }
    if let Some(account) = args.account {
        controller.filter.account_code = Some(account);
    }
    if let Some(counterparty) = args.counterparty {
        controller.filter.counterparty_code = Some(counterparty);
    }
    if args.all {
        controller.filter.page_size = PAGE_SIZE_ALL;
    } else if let Some(size) = args.page_size {
        controller.filter.page_size = size;
    }
    if let Some(page) = args.page {
        controller.filter.page = page.max(1);
    }

    let today = chrono::Local::now().date_naive();
    if !controller.initialize(today) {
        // the failure was already reported through a notification
        return Ok(());
    }

    print_report(&controller);

    for docno in &args.expand {
        if let Some(uid) = controller
            .rows()
            .iter()
            .find(|row| row.text("docno") == *docno)
            .map(|row| row.uid.clone())
        {
            controller.toggle_row(&uid);
            match journal::get_journal_by_docno(&api, docno) {
                Ok(doc) => {
                    println!();
                    print_journal(&doc);
                }
                Err(e) => eprintln!("warning: could not expand {docno}: {e}"),
            }
        } else {
            eprintln!("warning: document {docno} is not on this page");
        }
    }

    if let Some(path) = &args.xlsx {
        let sheet = report_export::sheet(spec, controller.rows());
        export::excel::write_workbook(&sheet, path)?;
        println!("Saved {}", path.display());
    }

    if let Some(path) = &args.export_pdf {
        let subtitle = match (controller.shop_line(), controller.subtitle()) {
            (shop, period) if shop.is_empty() => period,
            (shop, period) if period.is_empty() => shop,
            (shop, period) => format!("{shop} {period}"),
        };
        let table = report_export::table(spec, controller.rows(), subtitle);
        let font_dir = resolve_dir(&config.pdf.font_dir, cfg_dir);
        export::pdf::render(&table, &font_dir, path)?;
        println!("Saved {}", path.display());
    }

    if args.download_pdf {
        if controller.is_download_disabled() {
            notify.warn("Nothing to download", "Load a report with data first");
        } else if let Some(path) = controller.download_pdf(&ThreadSleeper) {
            if args.open {
                open_path(&path)?;
            }
        }
    }

    filters.remember(spec.key, controller.snapshot());
    save_filters(cfg_dir, &filters)?;

    Ok(())
}

fn print_report(controller: &ReportController) {
    let spec = controller.spec();

    println!("{}", spec.title);
    let subtitle = controller.subtitle();
    if !subtitle.is_empty() {
        println!("{subtitle}");
    }

    if controller.rows().is_empty() {
        println!("No data for the selected filters.");
        return;
    }

    let mut builder = tabled::builder::Builder::default();
    builder.push_record(spec.columns.iter().map(|c| c.header.to_string()));
    for row in controller.rows() {
        builder.push_record(
            spec.columns
                .iter()
                .map(|column| report_export::render_cell(column, row)),
        );
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");

    for (label, value) in controller.totals() {
        println!("  {label}: {}", numfmt::format_number(value, 2));
    }
    println!(
        "Page {} of {} ({} records)",
        controller.filter.page,
        controller.total_pages(),
        controller.total_records()
    );
}

fn cmd_reset_filters(cfg_dir: &PathBuf, kind: Option<String>) -> Result<()> {
    if !cfg_dir.exists() {
        return Err(AcctError::ConfigNotFound(cfg_dir.clone()));
    }

    let key = match &kind {
        Some(kind) => Some(ReportKind::from_key(kind)?.spec().key),
        None => None,
    };

    let mut filters = load_filters(cfg_dir)?;
    filters.clear(key);
    save_filters(cfg_dir, &filters)?;

    match key {
        Some(key) => println!("Cleared saved filters for {key}"),
        None => println!("Cleared all saved filters"),
    }
    Ok(())
}

fn require_login(cfg_dir: &PathBuf) -> Result<(acct::Config, acct::ShopSession)> {
    if !cfg_dir.exists() {
        return Err(AcctError::ConfigNotFound(cfg_dir.clone()));
    }
    let config = load_config(cfg_dir)?;
    let session = load_session(cfg_dir)?;
    session.require_login()?;
    Ok((config, session))
}

fn require_shop(cfg_dir: &PathBuf) -> Result<(acct::Config, acct::ShopSession)> {
    if !cfg_dir.exists() {
        return Err(AcctError::ConfigNotFound(cfg_dir.clone()));
    }
    let config = load_config(cfg_dir)?;
    let session = load_session(cfg_dir)?;
    session.require_shop()?;
    Ok((config, session))
}

fn open_path(pdf_path: &std::path::Path) -> Result<()> {
    // Open with system default viewer
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(pdf_path)
            .spawn()
            .map_err(AcctError::Io)?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(pdf_path)
            .spawn()
            .map_err(AcctError::Io)?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", pdf_path.to_str().unwrap_or("")])
            .spawn()
            .map_err(AcctError::Io)?;
    }
    Ok(())
}
