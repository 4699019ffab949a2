use serde::Deserialize;
use serde_json::json;

use super::{ApiClient, Base, Envelope};
use crate::error::{AcctError, Result};

/// Login responses carry the tokens at the top level of the body, outside
/// the usual data envelope.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    token: String,
    #[serde(default)]
    refresh: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopEntry {
    #[serde(default)]
    pub shopid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub isfavorite: bool,
}

pub struct Tokens {
    pub token: String,
    pub refresh: String,
}

/// Username/password login. Returns the bearer and refresh tokens.
pub fn login(api: &ApiClient, username: &str, password: &str) -> Result<Tokens> {
    let body = json!({ "username": username, "password": password });
    let resp: LoginResponse = api.post_value(Base::Main, "login", &body)?;
    if !resp.success || resp.token.is_empty() {
        return Err(AcctError::LoginFailed(
            resp.message
                .unwrap_or_else(|| "invalid credentials".to_string()),
        ));
    }
    Ok(Tokens {
        token: resp.token,
        refresh: resp.refresh,
    })
}

/// Exchange an identity-provider token for a backend session.
pub fn token_login(api: &ApiClient, provider_token: &str) -> Result<Tokens> {
    let body = json!({ "token": provider_token });
    let resp: LoginResponse = api.post_value(Base::Main, "tokenlogin", &body)?;
    if !resp.success || resp.token.is_empty() {
        return Err(AcctError::LoginFailed(
            resp.message
                .unwrap_or_else(|| "identity provider token rejected".to_string()),
        ));
    }
    Ok(Tokens {
        token: resp.token,
        refresh: resp.refresh,
    })
}

/// Invalidate the session server-side. Failures are reported to the caller,
/// which clears local state regardless.
pub fn logout(api: &ApiClient) -> Result<()> {
    let _: Envelope<serde_json::Value> = api.post(Base::Main, "logout", &json!({}))?;
    Ok(())
}

/// Shops the logged-in user can work in.
pub fn list_shops(api: &ApiClient) -> Result<Vec<ShopEntry>> {
    let envelope: Envelope<Vec<ShopEntry>> = api.get(
        Base::Main,
        "list-shop",
        &[
            ("page", "1".to_string()),
            ("perPage", "100".to_string()),
            ("limit", "100".to_string()),
        ],
    )?;
    Ok(envelope.data.unwrap_or_default())
}

/// Bind the session to one shop.
pub fn select_shop(api: &ApiClient, shop_id: &str) -> Result<()> {
    let envelope: Envelope<serde_json::Value> =
        api.post(Base::Main, "select-shop", &json!({ "shopid": shop_id }))?;
    if !envelope.success {
        return Err(AcctError::SelectShopFailed(
            envelope
                .message
                .unwrap_or_else(|| format!("shop '{shop_id}' was not accepted")),
        ));
    }
    Ok(())
}

/// Toggle the favorite flag on a shop.
pub fn favorite_shop(api: &ApiClient, shop_id: &str, favorite: bool) -> Result<()> {
    let envelope: Envelope<serde_json::Value> = api.put(
        Base::Main,
        "favorite-shop",
        &json!({ "shopid": shop_id, "isfavorite": favorite }),
    )?;
    if !envelope.success {
        return Err(AcctError::SelectShopFailed(
            envelope
                .message
                .unwrap_or_else(|| "favorite flag was not saved".to_string()),
        ));
    }
    Ok(())
}
