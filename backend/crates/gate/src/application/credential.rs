//! JWT credential issuance and verification
//!
//! Short-lived bearer tokens minted after a successful wallet proof so a
//! gallery page can re-enter the gate without a fresh signature. The
//! token embeds the token id it was minted for; the fast path still runs
//! ownership and usage checks, so a credential is never a substitute for
//! those.

use crate::application::config::JwtSettings;
use crate::domain::value_objects::EthAddress;
use crate::error::{GateError, GateResult};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

const TOKEN_KIND_ACCESS: &str = "access";
const SCOPE_GATE_ACCESS: &str = "gate:access";

/// Which proof flow minted the credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    Siwe,
    Legacy,
}

/// Subset of verified SIWE claims carried inside the credential for
/// audit purposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiweProjection {
    pub domain: String,
    pub address: String,
    pub chain_id: u64,
    pub nonce: String,
    pub issued_at: String,
    pub uri: String,
}

/// Claims of an issued access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Wallet address the proof verified (lowercase)
    pub sub: String,
    pub iss: String,
    pub aud: Vec<String>,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub scopes: Vec<String>,
    #[serde(rename = "tokenId")]
    pub token_id: u64,
    /// Always "access"; rejects refresh or foreign tokens structurally
    pub kind: String,
    pub auth: AuthMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub siwe: Option<SiweProjection>,
    /// SHA-256 hex digest of the exact proof message that was signed
    #[serde(rename = "siweHash")]
    pub proof_hash: String,
}

/// Inputs for minting a credential after a successful proof
#[derive(Debug)]
pub struct CredentialInput<'a> {
    pub address: &'a EthAddress,
    pub token_id: u64,
    pub auth: AuthMethod,
    pub siwe: Option<SiweProjection>,
    /// The exact message the wallet signed
    pub proof_message: &'a str,
}

/// Issues and verifies gate access tokens.
///
/// HMAC-SHA256 by default; RS256 when a PEM key pair is configured.
pub struct JwtCredentialService {
    header: Header,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    settings: JwtSettings,
    algorithm: Algorithm,
}

impl JwtCredentialService {
    /// Symmetric-key service. The secret must be at least 32 bytes.
    pub fn hs256(secret: &str, settings: JwtSettings) -> GateResult<Self> {
        if secret.len() < 32 {
            return Err(GateError::Internal(
                "JWT secret must be at least 32 bytes".to_string(),
            ));
        }
        Ok(Self {
            header: Header::new(Algorithm::HS256),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            settings,
            algorithm: Algorithm::HS256,
        })
    }

    /// Asymmetric-key service from PEM-encoded RSA keys.
    pub fn rs256(private_pem: &[u8], public_pem: &[u8], settings: JwtSettings) -> GateResult<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| GateError::Internal(format!("invalid RSA private key: {e}")))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| GateError::Internal(format!("invalid RSA public key: {e}")))?;
        Ok(Self {
            header: Header::new(Algorithm::RS256),
            encoding_key,
            decoding_key,
            settings,
            algorithm: Algorithm::RS256,
        })
    }

    /// Mint an access token for a freshly verified proof.
    pub fn issue(&self, input: CredentialInput<'_>) -> GateResult<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = AccessTokenClaims {
            sub: input.address.as_str().to_string(),
            iss: self.settings.issuer.clone(),
            aud: self.settings.audience.clone(),
            iat: now,
            exp: now + self.settings.access_ttl.as_secs() as i64,
            jti: uuid::Uuid::new_v4().to_string(),
            scopes: vec![SCOPE_GATE_ACCESS.to_string()],
            token_id: input.token_id,
            kind: TOKEN_KIND_ACCESS.to_string(),
            auth: input.auth,
            siwe: input.siwe,
            proof_hash: platform::crypto::sha256_hex(input.proof_message.as_bytes()),
        };

        encode(&self.header, &claims, &self.encoding_key)
            .map_err(|e| GateError::Signing(e.to_string()))
    }

    /// Verify a bearer token and return its claims.
    ///
    /// Returns `None` on any failure (signature, issuer, audience,
    /// expiry, structure) without distinguishing them; the caller falls
    /// back to body authentication.
    pub fn verify(&self, token: &str) -> Option<AccessTokenClaims> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[&self.settings.issuer]);
        validation.set_audience(&self.settings.audience);
        validation.leeway = self.settings.leeway.as_secs();

        let claims = match decode::<AccessTokenClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!(error = %e, "bearer token rejected");
                return None;
            }
        };

        if claims.kind != TOKEN_KIND_ACCESS {
            tracing::debug!(kind = %claims.kind, "bearer token has wrong kind");
            return None;
        }
        if !claims.scopes.iter().any(|s| s == SCOPE_GATE_ACCESS) {
            tracing::debug!("bearer token missing gate scope");
            return None;
        }

        Some(claims)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::JwtSettings;
    use std::time::Duration;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    fn service() -> JwtCredentialService {
        JwtCredentialService::hs256(SECRET, JwtSettings::default()).unwrap()
    }

    fn address() -> EthAddress {
        EthAddress::parse("0x1234567890abcdef1234567890abcdef12345678").unwrap()
    }

    #[test]
    fn test_secret_length_enforced() {
        assert!(JwtCredentialService::hs256("short", JwtSettings::default()).is_err());
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let service = service();
        let addr = address();
        let token = service
            .issue(CredentialInput {
                address: &addr,
                token_id: 42,
                auth: AuthMethod::Legacy,
                siwe: None,
                proof_message: "I own key #42",
            })
            .unwrap();

        let claims = service.verify(&token).expect("token should verify");
        assert_eq!(claims.sub, addr.as_str());
        assert_eq!(claims.token_id, 42);
        assert_eq!(claims.kind, "access");
        assert_eq!(claims.auth, AuthMethod::Legacy);
        assert_eq!(
            claims.proof_hash,
            platform::crypto::sha256_hex(b"I own key #42")
        );
        assert!(claims.scopes.contains(&"gate:access".to_string()));
    }

    #[test]
    fn test_verify_rejects_tampered_token() {
        let service = service();
        let addr = address();
        let token = service
            .issue(CredentialInput {
                address: &addr,
                token_id: 1,
                auth: AuthMethod::Siwe,
                siwe: None,
                proof_message: "m",
            })
            .unwrap();

        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });
        assert!(service.verify(&tampered).is_none());
    }

    #[test]
    fn test_verify_rejects_foreign_issuer() {
        let service = service();
        let foreign = JwtCredentialService::hs256(
            SECRET,
            JwtSettings {
                issuer: "someone-else".to_string(),
                ..JwtSettings::default()
            },
        )
        .unwrap();

        let addr = address();
        let token = foreign
            .issue(CredentialInput {
                address: &addr,
                token_id: 1,
                auth: AuthMethod::Siwe,
                siwe: None,
                proof_message: "m",
            })
            .unwrap();

        assert!(service.verify(&token).is_none());
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let service = JwtCredentialService::hs256(
            SECRET,
            JwtSettings {
                leeway: Duration::ZERO,
                ..JwtSettings::default()
            },
        )
        .unwrap();

        let now = chrono::Utc::now().timestamp();
        let claims = AccessTokenClaims {
            sub: address().as_str().to_string(),
            iss: "keygate".to_string(),
            aud: vec!["keygate".to_string()],
            iat: now - 7200,
            exp: now - 3600,
            jti: "test".to_string(),
            scopes: vec!["gate:access".to_string()],
            token_id: 1,
            kind: "access".to_string(),
            auth: AuthMethod::Legacy,
            siwe: None,
            proof_hash: platform::crypto::sha256_hex(b"m"),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(service.verify(&token).is_none());
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer("Bearer "), None);
        assert_eq!(extract_bearer("Basic abc"), None);
        assert_eq!(extract_bearer("bearer abc"), None);
    }
}
