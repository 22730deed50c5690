//! Application Error - Unified error type for the application
//!
//! Defines [`AppError`] struct and [`AppResult<T>`] type alias.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use super::kind::ErrorKind;

/// Unified application error.
///
/// ## Fields
/// * `kind` - classification, mapped onto an HTTP status code
/// * `title` - the public, client-facing message (Problem JSON `title`)
/// * `detail` - optional public elaboration (Problem JSON `detail`)
/// * `source` - the underlying error, logged server-side, never serialized
///
/// ## Examples
/// ```rust
/// use kernel::error::{app_error::AppError, kind::ErrorKind};
///
/// let err = AppError::new(ErrorKind::NotFound, "Token not found");
///
/// let err = AppError::new(ErrorKind::BadRequest, "Invalid request body")
///     .with_detail("tokenId must be a positive integer");
/// ```
pub struct AppError {
    kind: ErrorKind,
    title: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

/// Shorthand for `Result<T, AppError>`.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a new error with a kind and public title.
    #[inline]
    pub fn new(kind: ErrorKind, title: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            title: title.into(),
            detail: None,
            source: None,
        }
    }

    // ========================================================================
    // Convenience constructors
    // ========================================================================

    /// 400 Bad Request
    #[inline]
    pub fn bad_request(title: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::BadRequest, title)
    }

    /// 401 Unauthorized
    #[inline]
    pub fn unauthorized(title: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Unauthorized, title)
    }

    /// 403 Forbidden
    #[inline]
    pub fn forbidden(title: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Forbidden, title)
    }

    /// 404 Not Found
    #[inline]
    pub fn not_found(title: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::NotFound, title)
    }

    /// 409 Conflict
    #[inline]
    pub fn conflict(title: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Conflict, title)
    }

    /// 429 Too Many Requests
    #[inline]
    pub fn too_many_requests(title: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::TooManyRequests, title)
    }

    /// 500 Internal Server Error
    #[inline]
    pub fn internal(title: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InternalServerError, title)
    }

    /// 501 Not Implemented
    #[inline]
    pub fn not_implemented(title: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::NotImplemented, title)
    }

    /// 503 Service Unavailable
    #[inline]
    pub fn service_unavailable(title: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, title)
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Attach a public `detail` string.
    #[inline]
    pub fn with_detail(mut self, detail: impl Into<Cow<'static, str>>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach the underlying error (server-side diagnostics only).
    #[inline]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[inline]
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    #[inline]
    pub fn is_server_error(&self) -> bool {
        self.kind.is_server_error()
    }

    #[inline]
    pub fn is_client_error(&self) -> bool {
        self.kind.is_client_error()
    }

    /// Serialize as an RFC 7807 Problem JSON value.
    pub fn to_problem_json(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "type": format!("https://httpstatuses.io/{}", self.status_code()),
            "title": self.title(),
            "status": self.status_code(),
        });
        if let Some(detail) = self.detail() {
            body["detail"] = serde_json::Value::String(detail.to_string());
        }
        body
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("AppError");
        builder.field("kind", &self.kind);
        builder.field("title", &self.title);
        if let Some(detail) = &self.detail {
            builder.field("detail", detail);
        }
        if let Some(source) = &self.source {
            builder.field("source", source);
        }
        builder.finish()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.title)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({})", detail)?;
        }
        Ok(())
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

// ============================================================================
// Result extension traits
// ============================================================================

/// Convert `Result<T, E>` into `AppResult<T>` with a kind and public title.
pub trait ResultExt<T, E> {
    fn map_app_err(self, kind: ErrorKind, title: impl Into<Cow<'static, str>>) -> AppResult<T>
    where
        E: Error + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn map_app_err(self, kind: ErrorKind, title: impl Into<Cow<'static, str>>) -> AppResult<T>
    where
        E: Error + Send + Sync + 'static,
    {
        self.map_err(|e| AppError::new(kind, title).with_source(e))
    }
}

/// Convert `Option<T>` into `AppResult<T>`.
pub trait OptionExt<T> {
    fn ok_or_app_err(self, kind: ErrorKind, title: impl Into<Cow<'static, str>>) -> AppResult<T>;

    fn ok_or_not_found(self, title: impl Into<Cow<'static, str>>) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_app_err(self, kind: ErrorKind, title: impl Into<Cow<'static, str>>) -> AppResult<T> {
        self.ok_or_else(|| AppError::new(kind, title))
    }

    fn ok_or_not_found(self, title: impl Into<Cow<'static, str>>) -> AppResult<T> {
        self.ok_or_app_err(ErrorKind::NotFound, title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_error() {
        let err = AppError::new(ErrorKind::NotFound, "Token not found");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.title(), "Token not found");
        assert!(err.detail().is_none());
    }

    #[test]
    fn test_convenience_constructors() {
        assert_eq!(AppError::bad_request("test").status_code(), 400);
        assert_eq!(AppError::unauthorized("test").status_code(), 401);
        assert_eq!(AppError::forbidden("test").status_code(), 403);
        assert_eq!(AppError::not_found("test").status_code(), 404);
        assert_eq!(AppError::conflict("test").status_code(), 409);
        assert_eq!(AppError::too_many_requests("test").status_code(), 429);
        assert_eq!(AppError::internal("test").status_code(), 500);
        assert_eq!(AppError::not_implemented("test").status_code(), 501);
        assert_eq!(AppError::service_unavailable("test").status_code(), 503);
    }

    #[test]
    fn test_with_detail() {
        let err = AppError::bad_request("Invalid request body")
            .with_detail("tokenId must be a positive integer");
        assert_eq!(err.detail(), Some("tokenId must be a positive integer"));
    }

    #[test]
    fn test_with_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = AppError::internal("Failed to read registry").with_source(io_err);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_display() {
        let err = AppError::not_found("Token not found");
        assert_eq!(err.to_string(), "[Not Found] Token not found");
    }

    #[test]
    fn test_problem_json_shape() {
        let body = AppError::unauthorized("Authentication failed").to_problem_json();
        assert_eq!(body["title"], "Authentication failed");
        assert_eq!(body["status"], 401);
        assert!(body.get("detail").is_none());

        let body = AppError::bad_request("Invalid request body")
            .with_detail("missing field `signature`")
            .to_problem_json();
        assert_eq!(body["detail"], "missing field `signature`");
    }

    #[test]
    fn test_option_ext() {
        let none: Option<i32> = None;
        let result = none.ok_or_not_found("Token not found");
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().status_code(), 404);

        let some: Option<i32> = Some(42);
        let result = some.ok_or_not_found("Token not found");
        assert_eq!(result.unwrap(), 42);
    }
}
