use async_trait::async_trait;

use super::ApiError;
use crate::models::{Medicine, Prescription};

/// The authoritative store holding canonical prescription and medicine records.
///
/// Implementations own their transport concerns (timeouts, retries).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch a prescription by id, authorized by its access code.
    async fn get_prescription(&self, id: &str, code: &str) -> Result<Prescription, ApiError>;

    /// Fetch a medicine record. `Ok(None)` when the store has no such medicine.
    async fn get_medicine(&self, id: &str) -> Result<Option<Medicine>, ApiError>;
}
