//! Prescription access orchestration.
//!
//! `PrescriptionAccessor::access` validates the request, fetches the
//! prescription, resolves every medicine line and records the access in
//! history. Only validation and the prescription fetch can fail; medicine
//! lookups degrade to placeholders and are reported as a count.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::RemoteStore;
use crate::cache::HistoryCache;
use crate::models::{AccessedPrescription, HistoryEntry, MedicineLine};
use crate::resolver::MedicineResolver;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// Missing id or code, detected before any I/O.
    #[error("{0}")]
    Validation(String),

    /// The remote store refused or could not be reached; message passed through.
    #[error("{0}")]
    RemoteRejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    RemoteRejected,
}

impl AccessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccessError::Validation(_) => ErrorKind::Validation,
            AccessError::RemoteRejected(_) => ErrorKind::RemoteRejected,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AccessError::Validation(m) | AccessError::RemoteRejected(m) => m,
        }
    }
}

/// Trim both inputs and require them to be non-empty.
fn validate<'a>(id: &'a str, code: &'a str) -> Result<(&'a str, &'a str), AccessError> {
    let (id, code) = (id.trim(), code.trim());
    match (id.is_empty(), code.is_empty()) {
        (false, false) => Ok((id, code)),
        (true, true) => Err(AccessError::Validation(
            "Prescription ID and code are required".to_string(),
        )),
        (true, false) => Err(AccessError::Validation("Prescription ID is required".to_string())),
        (false, true) => Err(AccessError::Validation("Prescription code is required".to_string())),
    }
}

pub struct PrescriptionAccessor {
    store: Arc<dyn RemoteStore>,
    resolver: MedicineResolver,
    history: Arc<HistoryCache>,
}

impl PrescriptionAccessor {
    pub fn new(store: Arc<dyn RemoteStore>, history: Arc<HistoryCache>) -> Self {
        Self {
            resolver: MedicineResolver::new(Arc::clone(&store)),
            store,
            history,
        }
    }

    /// The history this accessor records into.
    pub fn history(&self) -> &Arc<HistoryCache> {
        &self.history
    }

    pub async fn access(&self, id: &str, code: &str) -> Result<AccessedPrescription, AccessError> {
        let (id, code) = validate(id, code)?;

        info!(id = %id, "Accessing prescription");
        let prescription = self.store.get_prescription(id, code).await.map_err(|e| {
            warn!(id = %id, error = %e, "Prescription fetch rejected");
            AccessError::RemoteRejected(e.to_string())
        })?;

        let resolutions = self.resolver.resolve_all(&prescription.medicine_ids()).await;
        let degraded_count = resolutions.iter().filter(|r| r.is_degraded()).count();

        let medicine_lines: Vec<MedicineLine> = prescription
            .medicines
            .iter()
            .cloned()
            .zip(resolutions)
            .map(|(prescribed, resolution)| MedicineLine::new(prescribed, resolution.into_medicine()))
            .collect();

        let entry = HistoryEntry::from_access(&prescription, &medicine_lines, Utc::now());
        self.history.upsert(entry).await;

        info!(
            id = %prescription.id,
            lines = medicine_lines.len(),
            degraded = degraded_count,
            "Prescription accessed"
        );

        Ok(AccessedPrescription {
            prescription,
            medicine_lines,
            degraded_count,
        })
    }
}
