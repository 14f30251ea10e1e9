//! HTTP client for the prescription service gateway.
//!
//! The gateway mirrors the service's call results: a prescription lookup
//! answers `{"Ok": {...}}` or `{"Err": "message"}`, a medicine lookup
//! answers the record, `null`, or 404.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, warn};

use super::{ApiError, RemoteStore};
use crate::config::Config;
use crate::models::{Medicine, PrescribedMedicine, Prescription};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
enum CallResult<T> {
    Ok(T),
    Err(String),
}

#[derive(Debug, Deserialize)]
struct PrescriptionResponse {
    id: String,
    prescription_code: String,
    patient_name: String,
    #[serde(default)]
    patient_contact: String,
    #[serde(default)]
    medicines: Vec<PrescriptionMedicineResponse>,
    #[serde(default)]
    additional_notes: String,
    /// Nanoseconds since the Unix epoch
    created_at: i64,
    accessed_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PrescriptionMedicineResponse {
    medicine_id: String,
    custom_dosage: Option<String>,
    #[serde(default)]
    custom_instructions: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MedicineResponse {
    name: Option<String>,
    #[serde(default)]
    dosage: String,
    #[serde(default)]
    frequency: String,
    #[serde(default)]
    duration: String,
    #[serde(default)]
    side_effects: String,
    guide_text: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl PrescriptionResponse {
    fn into_prescription(self) -> Prescription {
        Prescription {
            id: self.id,
            code: self.prescription_code,
            patient_name: self.patient_name,
            patient_contact: self.patient_contact,
            created_at: DateTime::<Utc>::from_timestamp_nanos(self.created_at),
            accessed_at: self.accessed_at.map(DateTime::<Utc>::from_timestamp_nanos),
            notes: self.additional_notes,
            medicines: self
                .medicines
                .into_iter()
                .map(|m| PrescribedMedicine {
                    medicine_id: m.medicine_id,
                    custom_dosage: non_empty(m.custom_dosage),
                    custom_instructions: non_empty(m.custom_instructions),
                })
                .collect(),
        }
    }
}

impl MedicineResponse {
    /// A record without a name is unusable and reported as malformed.
    fn into_medicine(self, id: &str) -> Result<Medicine, ApiError> {
        let name = non_empty(self.name)
            .ok_or_else(|| ApiError::InvalidResponse(format!("medicine {} has no name", id)))?;

        Ok(Medicine {
            name,
            dosage: self.dosage,
            frequency: self.frequency,
            duration: self.duration,
            side_effects: self.side_effects,
            guide_text: non_empty(self.guide_text),
        })
    }
}

// ============================================================================
// Client
// ============================================================================

/// HTTP implementation of [`RemoteStore`].
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    initial_backoff: Duration,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let raw = base_url.into();
        let base_url = Url::parse(raw.trim_end_matches('/'))
            .map_err(|e| ApiError::InvalidRequest(format!("invalid base URL {}: {}", raw, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidRequest(format!("invalid base URL {}", raw)));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Build a client from configuration. Fails when no base URL is configured.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let base_url = config
            .api_base_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No API base URL configured"))?;

        Ok(Self::with_timeout(base_url, config.request_timeout())?)
    }

    /// Override the first rate-limit back-off delay (doubles on each retry).
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Append path segments to the base URL, percent-encoding each one so
    /// an id can never address a different resource.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        if let Some(bad) = segments.iter().find(|s| matches!(s.trim(), "" | "." | "..")) {
            return Err(ApiError::InvalidRequest(format!("invalid path segment {:?}", bad)));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidRequest(format!("invalid base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: Response) -> Result<Option<Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status() == StatusCode::TOO_MANY_REQUESTS {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url, query: &[(&str, &str)]) -> Result<T, ApiError> {
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let response = self.client.get(url.clone()).query(query).send().await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let text = response.text().await?;
                    return serde_json::from_str(&text).map_err(|e| {
                        ApiError::InvalidResponse(format!("Failed to parse JSON from {}: {}", url, e))
                    });
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }
}

#[async_trait]
impl RemoteStore for ApiClient {
    async fn get_prescription(&self, id: &str, code: &str) -> Result<Prescription, ApiError> {
        let url = self.endpoint(&["prescriptions", id])?;
        let result: CallResult<PrescriptionResponse> = self.get(url, &[("code", code)]).await?;

        match result {
            CallResult::Ok(p) => {
                debug!(id = %p.id, lines = p.medicines.len(), "Prescription response received");
                Ok(p.into_prescription())
            }
            CallResult::Err(message) => Err(ApiError::Rejected(message)),
        }
    }

    async fn get_medicine(&self, id: &str) -> Result<Option<Medicine>, ApiError> {
        let url = self.endpoint(&["medicines", id])?;

        match self.get::<Option<MedicineResponse>>(url, &[]).await {
            Ok(Some(m)) => m.into_medicine(id).map(Some),
            Ok(None) | Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
