//! Report endpoints and the production [`ReportBackend`].
//!
//! Each family exposes a paginated fetch on the main API and the
//! three-call PDF job surface on the report API: submit, check, download.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::master::{self, ChartAccount, Counterparty, CounterpartySide};
use super::shop::{self, ShopProfile};
use super::{ApiClient, Base, Envelope};
use crate::error::{AcctError, Result};
use crate::report::controller::{FetchedPage, ReportBackend, ReportQuery};
use crate::report::family::FamilySpec;
use crate::report::poller::{CheckOutcome, PdfJob, SubmitOutcome};

#[derive(Debug, Deserialize)]
struct JobData {
    #[serde(default)]
    jobid: String,
    #[serde(default)]
    filename: String,
}

/// [`ReportBackend`] over the live HTTP client. Downloaded PDFs land in
/// `output_dir`.
pub struct ApiBackend<'a> {
    api: &'a ApiClient,
    output_dir: PathBuf,
}

impl<'a> ApiBackend<'a> {
    pub fn new(api: &'a ApiClient, output_dir: PathBuf) -> Self {
        ApiBackend { api, output_dir }
    }

    fn query_params(query: &ReportQuery) -> Vec<(&str, String)> {
        let mut params = vec![
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ];
        params.extend(query.params.iter().map(|(k, v)| (k.as_str(), v.clone())));
        params
    }

    fn job_body(query: &ReportQuery) -> Value {
        let mut body = Map::new();
        body.insert("limit".to_string(), json!(query.limit));
        body.insert("offset".to_string(), json!(query.offset));
        for (key, value) in &query.params {
            body.insert(key.clone(), Value::String(value.clone()));
        }
        Value::Object(body)
    }
}

impl ReportBackend for ApiBackend<'_> {
    fn fetch_shop(&self, shop_id: &str) -> Result<ShopProfile> {
        shop::get_shop(self.api, shop_id)
    }

    fn fetch_page(&self, spec: &FamilySpec, query: &ReportQuery) -> Result<FetchedPage> {
        let envelope: Envelope<Vec<Map<String, Value>>> =
            self.api
                .get(Base::Main, spec.endpoint, &Self::query_params(query))?;
        if !envelope.success {
            return Err(AcctError::BadResponse {
                endpoint: spec.endpoint.to_string(),
                reason: envelope
                    .message
                    .unwrap_or_else(|| "report fetch refused".to_string()),
            });
        }
        let total = envelope.total_records();
        Ok(FetchedPage {
            rows: envelope.data.unwrap_or_default(),
            total,
        })
    }

    fn load_accounts(&self) -> Result<Vec<ChartAccount>> {
        master::list_chart_of_accounts(self.api)
    }

    fn load_counterparties(&self, side: CounterpartySide) -> Result<Vec<Counterparty>> {
        master::list_counterparties(self.api, side)
    }

    fn submit_pdf(&self, spec: &FamilySpec, query: &ReportQuery) -> Result<SubmitOutcome> {
        let envelope: Envelope<JobData> =
            self.api
                .post(Base::Report, spec.pdf_endpoint, &Self::job_body(query))?;
        if !envelope.success {
            return Ok(SubmitOutcome::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "the render job was refused".to_string()),
            ));
        }
        match envelope.data {
            Some(job) if !job.jobid.is_empty() => Ok(SubmitOutcome::Accepted(PdfJob {
                job_id: job.jobid,
                file_name: job.filename,
            })),
            _ => Err(AcctError::BadResponse {
                endpoint: spec.pdf_endpoint.to_string(),
                reason: "job id missing from submit response".to_string(),
            }),
        }
    }

    fn check_pdf(&self, spec: &FamilySpec, job: &PdfJob) -> CheckOutcome {
        let path = format!("{}/check", spec.pdf_endpoint);
        let result: Result<Envelope<Value>> = self.api.get(
            Base::Report,
            &path,
            &[
                ("jobid", job.job_id.clone()),
                ("filename", job.file_name.clone()),
            ],
        );
        match result {
            Ok(envelope) if envelope.success => CheckOutcome::Completed,
            Ok(_) => CheckOutcome::Pending,
            // 500 from the status check means the renderer is overloaded;
            // the poller backs off once before asking again
            Err(AcctError::Api { status: 500, .. }) => CheckOutcome::SlowServer,
            Err(_) => CheckOutcome::TransientError,
        }
    }

    fn download_pdf(&self, spec: &FamilySpec, job: &PdfJob) -> Result<PathBuf> {
        let path = format!("{}/download", spec.pdf_endpoint);
        let bytes = self.api.get_bytes(
            Base::Report,
            &path,
            &[
                ("jobid", job.job_id.clone()),
                ("filename", job.file_name.clone()),
            ],
        )?;

        std::fs::create_dir_all(&self.output_dir)?;
        let name = Path::new(&job.file_name)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "report.pdf".into());
        let dest = self.output_dir.join(name);
        std::fs::write(&dest, bytes)?;
        Ok(dest)
    }
}
