use serde::Deserialize;

use super::shop::LocalizedText;
use super::{ApiClient, Base, Envelope};
use crate::error::{AcctError, Result};

/// One row of the chart of accounts. Levels 1 and 2 are section headings;
/// only level 3 and deeper can carry postings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartAccount {
    #[serde(default)]
    pub accountcode: String,
    #[serde(default)]
    pub accountname: String,
    #[serde(default)]
    pub accountlevel: u8,
}

impl ChartAccount {
    pub fn is_heading(&self) -> bool {
        self.accountlevel <= 2
    }

    /// Indented picker-style label; headings and selectable accounts use
    /// different separators so they read apart in a flat list.
    pub fn display_label(&self) -> String {
        let indent = "    ".repeat(self.accountlevel.saturating_sub(1) as usize);
        if self.is_heading() {
            format!("{indent}{} - {}", self.accountcode, self.accountname)
        } else {
            format!("{indent}{} ~ {}", self.accountcode, self.accountname)
        }
    }
}

/// A debtor or creditor master record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Counterparty {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub names: Vec<LocalizedText>,
    #[serde(default)]
    pub taxid: String,
}

impl Counterparty {
    pub fn name_th(&self) -> &str {
        self.names
            .iter()
            .find(|n| n.code == "th")
            .map(|n| n.name.as_str())
            .unwrap_or("")
    }

    pub fn display_label(&self) -> String {
        format!("{} ~ {}", self.code, self.name_th())
    }
}

/// Which side of the ledger a counterparty list comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterpartySide {
    Debtor,
    Creditor,
}

impl CounterpartySide {
    fn endpoint(self) -> &'static str {
        match self {
            CounterpartySide::Debtor => "debtor",
            CounterpartySide::Creditor => "creditor",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CounterpartySide::Debtor => "ลูกหนี้",
            CounterpartySide::Creditor => "เจ้าหนี้",
        }
    }
}

const MASTER_PAGE_LIMIT: u32 = 1000;

/// Full chart of accounts, sorted by account code.
pub fn list_chart_of_accounts(api: &ApiClient) -> Result<Vec<ChartAccount>> {
    let envelope: Envelope<Vec<ChartAccount>> = api.get(
        Base::Main,
        "gl/chartofaccount",
        &[
            ("q", String::new()),
            ("page", "1".to_string()),
            ("limit", MASTER_PAGE_LIMIT.to_string()),
            ("sort", "accountcode:1".to_string()),
        ],
    )?;
    Ok(envelope.data.unwrap_or_default())
}

/// Full debtor or creditor list.
pub fn list_counterparties(api: &ApiClient, side: CounterpartySide) -> Result<Vec<Counterparty>> {
    let envelope: Envelope<Vec<Counterparty>> = api.get(
        Base::Main,
        side.endpoint(),
        &[
            ("q", String::new()),
            ("page", "1".to_string()),
            ("limit", MASTER_PAGE_LIMIT.to_string()),
        ],
    )?;
    Ok(envelope.data.unwrap_or_default())
}

/// Look one counterparty up by its code. Unlike the list loaders this
/// propagates failure so a calling form can refuse to proceed.
pub fn get_counterparty(
    api: &ApiClient,
    side: CounterpartySide,
    code: &str,
) -> Result<Counterparty> {
    let path = format!("{}/{}", side.endpoint(), code);
    let envelope: Envelope<Counterparty> = api.get(Base::Main, &path, &[])?;
    match envelope.data {
        Some(record) if envelope.success => Ok(record),
        _ => Err(AcctError::BadResponse {
            endpoint: path,
            reason: envelope
                .message
                .unwrap_or_else(|| format!("no record for code '{code}'")),
        }),
    }
}
