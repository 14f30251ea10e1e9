//! MedSeal core - prescription retrieval with an offline access history.
//!
//! A patient accesses a prescription by id and code. The prescription is
//! fetched from the authoritative [`RemoteStore`], each medicine line is
//! resolved (falling back to a placeholder when a lookup fails) and a
//! summary is recorded in the bounded [`HistoryCache`]. Cached summaries
//! can be turned back into a displayable prescription with [`rehydrate`]
//! without any network access.
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use std::sync::Arc;
//! use medseal_core::{ApiClient, Config, FileStorage, HistoryCache, PrescriptionAccessor};
//!
//! let config = Config::load()?;
//! let store = Arc::new(ApiClient::from_config(&config)?);
//! let storage = Arc::new(FileStorage::new(config.history_dir()?)?);
//! let history = Arc::new(HistoryCache::load_with_policy(storage, config.history_policy));
//!
//! let accessor = PrescriptionAccessor::new(store, history);
//! let accessed = accessor.access("42", "ABCD").await?;
//! println!("{} lines, {} degraded", accessed.medicine_lines.len(), accessed.degraded_count);
//!
//! for entry in accessor.history().list().await {
//!     let offline = medseal_core::rehydrate(&entry);
//!     println!("{}: {} medicines", offline.prescription.id, offline.medicine_lines.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod rehydrate;
pub mod resolver;

pub use access::{AccessError, ErrorKind, PrescriptionAccessor};
pub use api::{ApiClient, ApiError, RemoteStore};
pub use cache::{FileStorage, HistoryCache, HistoryStorage, MemoryStorage, RecencyPolicy, HISTORY_CAPACITY};
pub use config::Config;
pub use models::{
    AccessedPrescription, HistoryEntry, Medicine, MedicineLine, MedicineSummary, PrescribedMedicine,
    Prescription,
};
pub use rehydrate::rehydrate;
pub use resolver::{placeholder_medicine, MedicineResolver, Resolution};
