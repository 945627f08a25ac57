use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde_json::json;

use super::catalog::CatalogError;

/// Recoverable failure reported by the portal. No variant leaves a partial write behind.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
    #[error("student '{student_id}' already applied to opportunity '{opportunity_id}'")]
    DuplicateApplication {
        student_id: String,
        opportunity_id: String,
    },
    #[error("application deadline {deadline} has passed (today is {today})")]
    DeadlinePassed {
        deadline: NaiveDate,
        today: NaiveDate,
    },
    #[error("cannot {action}: {reason}")]
    InvalidState {
        action: &'static str,
        reason: String,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl PortalError {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub(crate) fn invalid_state(action: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidState {
            action,
            reason: reason.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PortalError::NotFound { .. } => StatusCode::NOT_FOUND,
            PortalError::DuplicateApplication { .. } | PortalError::InvalidState { .. } => {
                StatusCode::CONFLICT
            }
            PortalError::DeadlinePassed { .. } | PortalError::InvalidInput(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PortalError::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
