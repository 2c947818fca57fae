//! Priority resolution from alert type and patient acuity.
//!
//! Pure functions only. The lookup-driven resolver that fails open when the
//! patient directory is unavailable lives in the alerts engine.

use serde::{Deserialize, Serialize};

use crate::alert::{AlertPriority, AlertType};
use crate::directory::Patient;

/// Clinical acuity classification supplied by the patient directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionLevel {
    Critical,
    Serious,
    Moderate,
    Stable,
    Good,
}

impl ConditionLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionLevel::Critical => "critical",
            ConditionLevel::Serious => "serious",
            ConditionLevel::Moderate => "moderate",
            ConditionLevel::Stable => "stable",
            ConditionLevel::Good => "good",
        }
    }

    /// Parse a stored condition label. Unknown labels yield `None`.
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "critical" => Some(ConditionLevel::Critical),
            "serious" => Some(ConditionLevel::Serious),
            "moderate" => Some(ConditionLevel::Moderate),
            "stable" => Some(ConditionLevel::Stable),
            "good" => Some(ConditionLevel::Good),
            _ => None,
        }
    }
}

/// Priority used when no patient context is available.
pub const FALLBACK_PRIORITY: AlertPriority = AlertPriority::Medium;

/// Map a patient's condition to an alert priority.
pub fn priority_for_condition(condition: ConditionLevel) -> AlertPriority {
    match condition {
        ConditionLevel::Critical => AlertPriority::Critical,
        ConditionLevel::Serious => AlertPriority::High,
        ConditionLevel::Moderate => AlertPriority::Medium,
        ConditionLevel::Stable | ConditionLevel::Good => AlertPriority::Low,
    }
}

/// Resolve a priority from the alert type and the patient's condition.
///
/// Emergencies are always critical. Without a condition the result is
/// [`FALLBACK_PRIORITY`].
pub fn resolve_priority(alert_type: AlertType, condition: Option<ConditionLevel>) -> AlertPriority {
    if alert_type == AlertType::Emergency {
        return AlertPriority::Critical;
    }
    condition.map_or(FALLBACK_PRIORITY, priority_for_condition)
}

/// The most severe patient among `patients`. Ties keep the first one seen.
pub fn most_severe_patient(patients: &[Patient]) -> Option<&Patient> {
    patients
        .iter()
        .min_by_key(|p| priority_for_condition(p.condition_level).weight())
}
