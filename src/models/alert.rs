use serde::{Deserialize, Serialize};

use super::enums::{AlertSeverity, AlertType};

/// A data-quality signal attached to a record.
///
/// Alerts are the only channel through which problems reach the end user:
/// malformed fields, inconsistencies and genuine gaps all end up here
/// rather than as errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    #[serde(rename = "affectedField", alias = "campo_afectado", default)]
    pub field: String,
    #[serde(alias = "mensaje", default)]
    pub message: String,
    #[serde(alias = "accion_sugerida", default, skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl Alert {
    pub fn new(
        alert_type: AlertType,
        severity: AlertSeverity,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            alert_type,
            severity,
            field: field.into(),
            message: message.into(),
            suggested_action: None,
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.suggested_action = Some(action.into());
        self
    }

    pub fn format_incorrect(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(AlertType::FormatIncorrect, AlertSeverity::Medium, field, message)
    }

    pub fn inconsistency(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            AlertType::DiagnosticInconsistency,
            AlertSeverity::Medium,
            field,
            message,
        )
    }

    pub fn missing_data(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(AlertType::MissingData, AlertSeverity::High, field, message)
    }

    /// Identity used to collapse exact repeats in an alert list.
    pub fn dedup_key(&self) -> (AlertType, &str, &str) {
        (self.alert_type, self.field.as_str(), self.message.as_str())
    }
}
