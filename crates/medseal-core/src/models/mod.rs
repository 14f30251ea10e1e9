//! Data models for prescriptions, medicines and access history.
//!
//! - `Medicine`: a resolved medicine record (or a placeholder standing in for one)
//! - `Prescription`, `PrescribedMedicine`: the prescription as returned by the remote store
//! - `MedicineLine`, `AccessedPrescription`: a prescription with every line resolved
//! - `HistoryEntry`, `MedicineSummary`: the denormalized snapshot kept for offline display

pub mod history;
pub mod medicine;
pub mod prescription;

pub use history::{HistoryEntry, MedicineSummary, NOT_AVAILABLE};
pub use medicine::{Medicine, AS_PRESCRIBED, CONTACT_DOCTOR};
pub use prescription::{AccessedPrescription, MedicineLine, PrescribedMedicine, Prescription};
