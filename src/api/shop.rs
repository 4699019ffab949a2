use serde::Deserialize;

use super::{ApiClient, Base, Envelope};
use crate::error::{AcctError, Result};

/// One localized string; `code` is the language code ("th", "en").
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalizedText {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShopSettings {
    #[serde(default)]
    pub taxid: String,
}

/// Shop master record. Reports stamp its Thai name, address and tax id
/// into their headers and PDF parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShopProfile {
    #[serde(default)]
    pub names: Vec<LocalizedText>,
    #[serde(default)]
    pub address: Vec<LocalizedText>,
    #[serde(default)]
    pub settings: ShopSettings,
}

impl ShopProfile {
    pub fn name_th(&self) -> &str {
        localized(&self.names, "th")
    }

    pub fn address_th(&self) -> &str {
        localized(&self.address, "th")
    }

    pub fn tax_id(&self) -> &str {
        &self.settings.taxid
    }
}

fn localized<'a>(texts: &'a [LocalizedText], code: &str) -> &'a str {
    texts
        .iter()
        .find(|t| t.code == code)
        .map(|t| t.name.as_str())
        .unwrap_or("")
}

pub fn get_shop(api: &ApiClient, shop_id: &str) -> Result<ShopProfile> {
    let path = format!("shop/{shop_id}");
    let envelope: Envelope<ShopProfile> = api.get(Base::Main, &path, &[])?;
    if !envelope.success {
        return Err(AcctError::BadResponse {
            endpoint: path,
            reason: envelope
                .message
                .unwrap_or_else(|| "shop profile not returned".to_string()),
        });
    }
    envelope.data.ok_or_else(|| AcctError::BadResponse {
        endpoint: format!("shop/{shop_id}"),
        reason: "empty shop profile".to_string(),
    })
}
