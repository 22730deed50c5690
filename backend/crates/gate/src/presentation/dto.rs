//! Request/Response DTOs

use crate::domain::entities::ContentPayload;
use serde::{Deserialize, Serialize};

/// Response for GET /api/nonce
#[derive(Debug, Serialize)]
pub struct NonceResponse {
    pub nonce: String,
}

/// Request body for POST /api/gate-access.
///
/// Everything is optional at the schema level: a bearer-only request
/// carries no body fields at all, and which proof fields are required
/// depends on the server's auth mode. The use case does the real
/// classification.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateAccessRequest {
    pub address: Option<String>,
    pub signature: Option<String>,
    pub token_id: Option<u64>,
    /// Legacy flow: unix milliseconds at signing time
    pub timestamp: Option<i64>,
    /// SIWE flow: the exact signed message
    pub message: Option<String>,
    /// SIWE flow: the nonce echoed back
    pub nonce: Option<String>,
}

/// Response for a granted POST /api/gate-access
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateAccessResponse {
    pub success: bool,
    pub access: &'static str,
    pub content: ContentPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// Request body for POST /api/form-submission-gate
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSubmissionRequest {
    pub address: String,
    pub signature: String,
    pub token_id: u64,
    /// Unix milliseconds at signing time
    pub timestamp: i64,
    pub name: Option<String>,
    pub message: Option<String>,
}

/// Response for a successful POST /api/form-submission-gate
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSubmissionResponse {
    pub success: bool,
    pub token_id: u64,
    pub used_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_access_request_accepts_empty_body() {
        let req: GateAccessRequest = serde_json::from_str("{}").unwrap();
        assert!(req.address.is_none());
        assert!(req.token_id.is_none());
    }

    #[test]
    fn test_gate_access_request_camel_case() {
        let req: GateAccessRequest = serde_json::from_str(
            r#"{"address":"0xabc","signature":"0xdef","tokenId":7,"timestamp":1000}"#,
        )
        .unwrap();
        assert_eq!(req.token_id, Some(7));
        assert_eq!(req.timestamp, Some(1000));
    }

    #[test]
    fn test_form_submission_requires_core_fields() {
        let result: Result<FormSubmissionRequest, _> =
            serde_json::from_str(r#"{"address":"0xabc"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_gate_access_response_shape() {
        let response = GateAccessResponse {
            success: true,
            access: "granted",
            content: ContentPayload::fallback(7),
            access_token: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["access"], "granted");
        assert!(json.get("accessToken").is_none());
        assert_eq!(json["content"]["audioError"], true);
    }
}
