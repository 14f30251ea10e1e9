//! History snapshot models.
//!
//! A `HistoryEntry` is a compact, denormalized copy of an accessed
//! prescription. It carries everything needed to show the prescription
//! again without network access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MedicineLine, Prescription};

/// Stored in place of a dosage when none is known.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineSummary {
    pub name: String,
    pub dosage: String,
    pub instructions: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub code: String,
    pub patient_name: String,
    pub created_at: DateTime<Utc>,
    pub accessed_at: DateTime<Utc>,
    pub medicines_count: usize,
    pub doctor_notes: String,
    pub medicines: Vec<MedicineSummary>,
}

impl HistoryEntry {
    /// Derive the snapshot for a freshly accessed prescription.
    pub fn from_access(
        prescription: &Prescription,
        lines: &[MedicineLine],
        accessed_at: DateTime<Utc>,
    ) -> Self {
        let medicines: Vec<MedicineSummary> = lines.iter().map(MedicineSummary::from_line).collect();

        Self {
            id: prescription.id.clone(),
            code: prescription.code.clone(),
            patient_name: prescription.patient_name.clone(),
            created_at: prescription.created_at,
            accessed_at,
            medicines_count: medicines.len(),
            doctor_notes: prescription.notes.clone(),
            medicines,
        }
    }

    pub fn has_notes(&self) -> bool {
        !self.doctor_notes.trim().is_empty()
    }
}

impl MedicineSummary {
    fn from_line(line: &MedicineLine) -> Self {
        let dosage = match line.effective_dosage().trim() {
            "" => NOT_AVAILABLE.to_string(),
            d => d.to_string(),
        };

        Self {
            name: line.medicine.name.clone(),
            dosage,
            instructions: line.custom_instructions.clone().unwrap_or_default(),
        }
    }
}
