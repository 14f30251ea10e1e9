//! Medicine resolution with placeholder fallback.
//!
//! Resolution never fails: any lookup problem yields a placeholder record
//! so a prescription line always has something to show.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::api::RemoteStore;
use crate::models::{Medicine, AS_PRESCRIBED, CONTACT_DOCTOR};

/// Outcome of resolving one medicine id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(Medicine),
    /// The lookup failed and a placeholder stands in.
    Placeholder(Medicine),
}

impl Resolution {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Resolution::Placeholder(_))
    }

    pub fn medicine(&self) -> &Medicine {
        match self {
            Resolution::Found(m) | Resolution::Placeholder(m) => m,
        }
    }

    pub fn into_medicine(self) -> Medicine {
        match self {
            Resolution::Found(m) | Resolution::Placeholder(m) => m,
        }
    }
}

/// Build the stand-in record for a medicine that could not be resolved.
pub fn placeholder_medicine(id: &str) -> Medicine {
    Medicine {
        name: format!("Medicine (ID: {})", id),
        dosage: AS_PRESCRIBED.to_string(),
        frequency: AS_PRESCRIBED.to_string(),
        duration: AS_PRESCRIBED.to_string(),
        side_effects: CONTACT_DOCTOR.to_string(),
        guide_text: None,
    }
}

#[derive(Clone)]
pub struct MedicineResolver {
    store: Arc<dyn RemoteStore>,
}

impl MedicineResolver {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, id: &str) -> Resolution {
        match self.store.get_medicine(id).await {
            Ok(Some(medicine)) if !medicine.name.trim().is_empty() => {
                debug!(id = %id, name = %medicine.name, "Resolved medicine");
                Resolution::Found(medicine)
            }
            Ok(Some(_)) => {
                warn!(id = %id, "Medicine record has no name, using placeholder");
                Resolution::Placeholder(placeholder_medicine(id))
            }
            Ok(None) => {
                warn!(id = %id, "Medicine not found, using placeholder");
                Resolution::Placeholder(placeholder_medicine(id))
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Failed to fetch medicine, using placeholder");
                Resolution::Placeholder(placeholder_medicine(id))
            }
        }
    }

    /// Resolve every id concurrently. Output order matches input order.
    pub async fn resolve_all(&self, ids: &[String]) -> Vec<Resolution> {
        join_all(ids.iter().map(|id| self.resolve(id))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::models::Prescription;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Medicines named after their id; ids starting with "err" fail,
    /// "missing" is absent, "blank" has no name. Numeric ids delay.
    struct StubStore;

    #[async_trait]
    impl RemoteStore for StubStore {
        async fn get_prescription(&self, _id: &str, _code: &str) -> Result<Prescription, ApiError> {
            Err(ApiError::Rejected("not used".to_string()))
        }

        async fn get_medicine(&self, id: &str) -> Result<Option<Medicine>, ApiError> {
            if let Ok(ms) = id.parse::<u64>() {
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }
            if id.starts_with("err") {
                return Err(ApiError::ServerError("boom".to_string()));
            }
            let name = match id {
                "missing" => return Ok(None),
                "blank" => String::new(),
                _ => format!("Medicine {}", id),
            };
            Ok(Some(Medicine {
                name,
                dosage: "10mg".to_string(),
                frequency: "Daily".to_string(),
                duration: "5 days".to_string(),
                side_effects: "None".to_string(),
                guide_text: None,
            }))
        }
    }

    fn resolver() -> MedicineResolver {
        MedicineResolver::new(Arc::new(StubStore))
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_placeholder_medicine() {
        let med = placeholder_medicine("abc");
        assert_eq!(med.name, "Medicine (ID: abc)");
        assert_eq!(med.dosage, AS_PRESCRIBED);
        assert_eq!(med.frequency, AS_PRESCRIBED);
        assert_eq!(med.duration, AS_PRESCRIBED);
        assert_eq!(med.side_effects, CONTACT_DOCTOR);
        assert_eq!(med.guide_text, None);
    }

    #[tokio::test]
    async fn test_resolve_found() {
        let resolution = resolver().resolve("a").await;
        assert!(!resolution.is_degraded());
        assert_eq!(resolution.medicine().name, "Medicine a");
    }

    #[tokio::test]
    async fn test_resolve_falls_back() {
        for id in ["err1", "missing", "blank"] {
            let resolution = resolver().resolve(id).await;
            assert!(resolution.is_degraded(), "{} should degrade", id);
            assert_eq!(resolution.into_medicine(), placeholder_medicine(id));
        }
    }

    #[tokio::test]
    async fn test_resolve_all_empty() {
        assert!(resolver().resolve_all(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_all_preserves_order_and_isolates_failures() {
        // Earlier ids finish last
        let input = ids(&["30", "err2", "20", "missing", "1"]);
        let results = resolver().resolve_all(&input).await;

        assert_eq!(results.len(), input.len());
        let names: Vec<&str> = results.iter().map(|r| r.medicine().name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Medicine 30",
                "Medicine (ID: err2)",
                "Medicine 20",
                "Medicine (ID: missing)",
                "Medicine 1",
            ]
        );
        let degraded: Vec<bool> = results.iter().map(Resolution::is_degraded).collect();
        assert_eq!(degraded, vec![false, true, false, true, false]);
    }
}
