use crate::application::error::{AppError, ErrorReport};
use crate::application::repos::StoreError;
use crate::domain::error::DomainError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const NOT_FOUND: &str = "not_found";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const INVALID_BRUSH: &str = "invalid_brush";
    pub const STORAGE_UNCONFIGURED: &str = "storage_unconfigured";
    pub const STORAGE: &str = "storage_error";
    pub const INTERNAL: &str = "internal_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    report: Option<ErrorReport>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
            report: None,
        }
    }

    fn with_report(mut self, report: ErrorReport) -> Self {
        self.report = Some(report);
        self
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        let status = error.status_code();
        let message = error.presentation_message();
        let report = ErrorReport::from_error("infra::http::api", status, &error);
        let api_error = match &error {
            AppError::Domain(DomainError::NotFound { entity }) => {
                Self::new(status, codes::NOT_FOUND, message, Some(format!("unknown {entity}")))
            }
            AppError::Domain(DomainError::Validation { field, message: reason })
                if *field == "brush" || *field == "start" || *field == "end" =>
            {
                Self::new(
                    status,
                    codes::INVALID_BRUSH,
                    message,
                    Some(format!("{field}: {reason}")),
                )
            }
            AppError::Domain(DomainError::Validation { field, message: reason }) => Self::new(
                status,
                codes::INVALID_INPUT,
                message,
                Some(format!("{field}: {reason}")),
            ),
            AppError::Validation(reason) => {
                Self::new(status, codes::INVALID_INPUT, message, Some(reason.clone()))
            }
            AppError::Store(StoreError::NotConfigured { reason }) => Self::new(
                status,
                codes::STORAGE_UNCONFIGURED,
                message,
                Some(reason.clone()),
            ),
            AppError::Store(StoreError::InvalidKey { .. }) => {
                Self::new(status, codes::INVALID_INPUT, message, Some(error.to_string()))
            }
            AppError::Store(_) => Self::new(status, codes::STORAGE, message, None),
            AppError::Infra(_)
            | AppError::Domain(DomainError::Invariant { .. })
            | AppError::Unexpected(_) => Self::new(status, codes::INTERNAL, message, None),
        };
        api_error.with_report(report)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let hint = self.hint.clone();
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        // Attach a structured report so shared logging middleware can emit rich diagnostics.
        let report = self.report.unwrap_or_else(|| {
            ErrorReport::from_message(
                "infra::http::api",
                self.status,
                format!("{}: {}", self.code, hint.as_deref().unwrap_or(self.message)),
            )
        });
        report.attach(&mut response);
        response
    }
}
