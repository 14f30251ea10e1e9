use serde::{Deserialize, Serialize};

/// Default text for frequency, duration and dosage when nothing better is known.
pub const AS_PRESCRIBED: &str = "As prescribed";

/// Instructive text shown wherever medicine details could not be retrieved.
pub const CONTACT_DOCTOR: &str = "Contact your doctor for details";

/// A medicine record. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medicine {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub side_effects: String,
    #[serde(default)]
    pub guide_text: Option<String>,
}

impl Medicine {
    /// Whether a patient-facing guide is attached.
    pub fn has_guide(&self) -> bool {
        self.guide_text
            .as_deref()
            .map(|g| !g.trim().is_empty())
            .unwrap_or(false)
    }
}
