use serde::{Deserialize, Serialize};

use crate::error::{AcctError, Result};

/// Persisted login and shop-selection state.
///
/// Constructed once at startup and passed to whatever needs it; only the
/// auth commands write it back. A 401 from any endpoint invalidates the
/// whole session.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct ShopSession {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub refresh: String,
    #[serde(default)]
    pub shop_id: String,
    #[serde(default)]
    pub shop_name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub is_authenticated: bool,
}

impl ShopSession {
    pub fn logged_in(&self) -> bool {
        self.is_authenticated && !self.token.is_empty()
    }

    pub fn has_shop(&self) -> bool {
        !self.shop_id.is_empty()
    }

    /// Display name from the identity provider when present, else the
    /// username used for password login.
    pub fn display_user(&self) -> &str {
        if !self.display_name.is_empty() {
            &self.display_name
        } else {
            &self.username
        }
    }

    pub fn require_login(&self) -> Result<()> {
        if self.logged_in() {
            Ok(())
        } else {
            Err(AcctError::NotLoggedIn)
        }
    }

    pub fn require_shop(&self) -> Result<()> {
        self.require_login()?;
        if self.has_shop() {
            Ok(())
        } else {
            Err(AcctError::NoShopSelected)
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
