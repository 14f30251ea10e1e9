//! Prescription models.
//!
//! A `Prescription` is what the remote store hands back: its lines only
//! reference medicines by id. An `AccessedPrescription` pairs it with
//! fully resolved `MedicineLine`s and lives only for one access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Medicine;

/// A medicine line as prescribed, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescribedMedicine {
    pub medicine_id: String,
    pub custom_dosage: Option<String>,
    pub custom_instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: String,
    pub code: String,
    pub patient_name: String,
    pub patient_contact: String,
    pub created_at: DateTime<Utc>,
    pub accessed_at: Option<DateTime<Utc>>,
    pub notes: String,
    pub medicines: Vec<PrescribedMedicine>,
}

impl Prescription {
    /// Medicine ids in line order.
    pub fn medicine_ids(&self) -> Vec<String> {
        self.medicines.iter().map(|m| m.medicine_id.clone()).collect()
    }
}

/// A prescribed medicine with its resolved record attached.
///
/// `medicine` is always populated; when the remote lookup failed it holds
/// a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineLine {
    pub medicine_id: String,
    pub custom_dosage: Option<String>,
    pub custom_instructions: Option<String>,
    pub medicine: Medicine,
}

impl MedicineLine {
    pub fn new(prescribed: PrescribedMedicine, medicine: Medicine) -> Self {
        Self {
            medicine_id: prescribed.medicine_id,
            custom_dosage: prescribed.custom_dosage,
            custom_instructions: prescribed.custom_instructions,
            medicine,
        }
    }

    /// Custom dosage if one was prescribed, otherwise the medicine's own dosage.
    pub fn effective_dosage(&self) -> &str {
        match self.custom_dosage.as_deref() {
            Some(d) if !d.trim().is_empty() => d,
            _ => &self.medicine.dosage,
        }
    }
}

/// Result of a successful access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessedPrescription {
    pub prescription: Prescription,
    pub medicine_lines: Vec<MedicineLine>,
    /// Lines whose medicine fell back to a placeholder.
    pub degraded_count: usize,
}

impl AccessedPrescription {
    pub fn is_degraded(&self) -> bool {
        self.degraded_count > 0
    }
}
