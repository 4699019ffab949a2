use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub api: ApiSettings,
    pub pdf: PdfSettings,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ApiSettings {
    /// Base URL of the main accounting API.
    pub base_url: String,
    /// Base URL of the report-generation API. Defaults to `base_url`.
    #[serde(default)]
    pub report_url: Option<String>,
    /// Base URL of the bank-statement OCR service. Unused by the report
    /// commands, kept so one config file covers the whole environment.
    #[serde(default)]
    pub ocr_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PdfSettings {
    /// Directory where downloaded and rendered PDFs are written.
    pub output_dir: String,
    /// Directory holding Sarabun-Regular.ttf and Sarabun-Bold.ttf.
    pub font_dir: String,
}

impl ApiSettings {
    pub fn report_url(&self) -> &str {
        self.report_url.as_deref().unwrap_or(&self.base_url)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(30)
    }
}
