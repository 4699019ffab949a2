mod filters;
mod session;
mod settings;

pub use filters::{FilterSnapshot, FilterSnapshots};
pub use session::ShopSession;
pub use settings::{ApiSettings, Config, PdfSettings};

use crate::error::{AcctError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.acct/)
pub fn config_dir() -> Result<PathBuf> {
    // First try XDG-style directories
    if let Some(proj_dirs) = ProjectDirs::from("", "", "acct") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    // Fallback to ~/.acct/
    let home = dirs_home().ok_or_else(|| {
        AcctError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".acct"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if path.starts_with("~/") {
        if let Some(home) = dirs_home() {
            return home.join(&path[2..]);
        }
    }
    PathBuf::from(path)
}

/// Resolve a configured directory relative to the config dir when it is not
/// absolute and does not start with ~.
pub fn resolve_dir(configured: &str, config_dir: &Path) -> PathBuf {
    let expanded = expand_path(configured);
    if expanded.is_absolute() {
        expanded
    } else {
        config_dir.join(expanded)
    }
}

/// Load the main config.toml
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Err(AcctError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| AcctError::ConfigParse { path, source: e })
}

/// Load session.toml (defaults to a logged-out session if missing)
pub fn load_session(config_dir: &Path) -> Result<ShopSession> {
    let path = config_dir.join("session.toml");
    if !path.exists() {
        return Ok(ShopSession::default());
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| AcctError::ConfigParse { path, source: e })
}

/// Save session.toml
pub fn save_session(config_dir: &Path, session: &ShopSession) -> Result<()> {
    let path = config_dir.join("session.toml");
    let content = toml::to_string_pretty(session).map_err(|e| {
        AcctError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })?;
    fs::write(path, content)?;
    Ok(())
}

/// Remove the persisted session entirely (logout, or a 401 from the API).
pub fn clear_session(config_dir: &Path) -> Result<()> {
    let path = config_dir.join("session.toml");
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Load filters.toml (defaults to empty if missing)
pub fn load_filters(config_dir: &Path) -> Result<FilterSnapshots> {
    let path = config_dir.join("filters.toml");
    if !path.exists() {
        return Ok(FilterSnapshots::default());
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| AcctError::ConfigParse { path, source: e })
}

/// Save filters.toml
pub fn save_filters(config_dir: &Path, filters: &FilterSnapshots) -> Result<()> {
    let path = config_dir.join("filters.toml");
    let content = toml::to_string_pretty(filters).map_err(|e| {
        AcctError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })?;
    fs::write(path, content)?;
    Ok(())
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[api]
base_url = "https://api.shopaccounting.example/"
# report_url = "https://report.shopaccounting.example/"  # defaults to base_url
# ocr_url = "https://ocr.shopaccounting.example/"        # bank statement OCR service
# timeout_secs = 30

[pdf]
# Downloaded and rendered files land here.
output_dir = "output"
# Must contain Sarabun-Regular.ttf and Sarabun-Bold.ttf for PDF export.
font_dir = "fonts"
"#;
