//! Tool response envelope.
//!
//! Every tool answers with either `{"ok": true, "result": ...}` or
//! `{"ok": false, "error": {...}}`. Failures are values, never transport errors.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// A caller-facing failure description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ToolError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
            code: None,
        }
    }

    pub fn with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: Some(details.into()),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Replace the headline, moving the previous one into `details` when none is set.
    pub fn headline(mut self, message: impl Into<String>) -> Self {
        let previous = std::mem::replace(&mut self.message, message.into());
        if self.details.is_none() {
            self.details = Some(previous);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolResponse<T> {
    Success(T),
    Failure(ToolError),
}

impl<T> ToolResponse<T> {
    pub fn success(result: T) -> Self {
        Self::Success(result)
    }

    pub fn failure(error: impl Into<ToolError>) -> Self {
        Self::Failure(error.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn result(&self) -> Option<&T> {
        match self {
            Self::Success(result) => Some(result),
            Self::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ToolError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(error) => Some(error),
        }
    }
}

impl<T: Serialize> Serialize for ToolResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ToolResponse", 2)?;
        match self {
            Self::Success(result) => {
                state.serialize_field("ok", &true)?;
                state.serialize_field("result", result)?;
            }
            Self::Failure(error) => {
                state.serialize_field("ok", &false)?;
                state.serialize_field("error", error)?;
            }
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope() {
        let response = ToolResponse::success(json!({"hits": []}));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"ok": true, "result": {"hits": []}})
        );
    }

    #[test]
    fn test_failure_envelope() {
        let response: ToolResponse<()> = ToolResponse::failure(ToolError::with_details(
            "Failed to connect to Oracle.",
            "ORA-12541",
        ));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "ok": false,
                "error": {"message": "Failed to connect to Oracle.", "details": "ORA-12541"}
            })
        );
    }

    #[test]
    fn test_exactly_one_of_result_or_error() {
        let ok = serde_json::to_value(ToolResponse::success(1)).unwrap();
        assert!(ok.get("error").is_none());
        let failed =
            serde_json::to_value(ToolResponse::<i32>::failure(ToolError::new("x"))).unwrap();
        assert!(failed.get("result").is_none());
    }

    #[test]
    fn test_headline_keeps_previous_message() {
        let error = ToolError::new("ORA-00942: table or view does not exist")
            .headline("Oracle schema search failed.");
        assert_eq!(error.message, "Oracle schema search failed.");
        assert_eq!(
            error.details.as_deref(),
            Some("ORA-00942: table or view does not exist")
        );
    }
}
