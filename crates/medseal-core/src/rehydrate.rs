//! Offline reconstruction of a prescription from its history snapshot.

use crate::models::{
    AccessedPrescription, HistoryEntry, Medicine, MedicineLine, PrescribedMedicine, Prescription,
    AS_PRESCRIBED, CONTACT_DOCTOR, NOT_AVAILABLE,
};

/// Rebuild a displayable prescription from `entry` alone.
///
/// Pure and total: no network or storage access. Line ids are synthesized
/// from position (`<entry id>-med-<index>`) since the snapshot does not keep
/// the remote ids. Details the snapshot does not carry get fixed defaults.
pub fn rehydrate(entry: &HistoryEntry) -> AccessedPrescription {
    let medicine_lines: Vec<MedicineLine> = entry
        .medicines
        .iter()
        .enumerate()
        .map(|(index, summary)| {
            let custom_dosage = match summary.dosage.trim() {
                "" | NOT_AVAILABLE => None,
                d => Some(d.to_string()),
            };
            let custom_instructions =
                Some(summary.instructions.clone()).filter(|i| !i.trim().is_empty());

            MedicineLine {
                medicine_id: format!("{}-med-{}", entry.id, index),
                medicine: Medicine {
                    name: summary.name.clone(),
                    dosage: custom_dosage.clone().unwrap_or_else(|| AS_PRESCRIBED.to_string()),
                    frequency: AS_PRESCRIBED.to_string(),
                    duration: AS_PRESCRIBED.to_string(),
                    side_effects: CONTACT_DOCTOR.to_string(),
                    guide_text: None,
                },
                custom_dosage,
                custom_instructions,
            }
        })
        .collect();

    let prescription = Prescription {
        id: entry.id.clone(),
        code: entry.code.clone(),
        patient_name: entry.patient_name.clone(),
        patient_contact: String::new(),
        created_at: entry.created_at,
        accessed_at: Some(entry.accessed_at),
        notes: entry.doctor_notes.clone(),
        medicines: medicine_lines
            .iter()
            .map(|line| PrescribedMedicine {
                medicine_id: line.medicine_id.clone(),
                custom_dosage: line.custom_dosage.clone(),
                custom_instructions: line.custom_instructions.clone(),
            })
            .collect(),
    };

    AccessedPrescription {
        prescription,
        medicine_lines,
        degraded_count: 0,
    }
}
