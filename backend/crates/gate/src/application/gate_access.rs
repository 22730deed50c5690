//! Gate access use case
//!
//! The admission pipeline for POST /api/gate-access:
//! rate limit, authenticate (bearer fast path, else SIWE or legacy body
//! proof), on-chain ownership, usage lookup, content generation,
//! credential minting. Authentication sub-failures all collapse to the
//! uniform 401; only the post-auth checks have distinct statuses.

use crate::application::config::GateConfig;
use crate::application::credential::{
    AuthMethod, CredentialInput, JwtCredentialService, SiweProjection,
};
use crate::application::rate_limit::{GateRoute, RateLimitGate};
use crate::application::verify_legacy::{LegacyVerifier, LegacyVerifyInput};
use crate::application::verify_siwe::{SiweVerifier, SiweVerifyInput};
use crate::domain::entities::ContentPayload;
use crate::domain::repository::{
    ContentProvider, NonceRepository, OwnershipOracle, RateLimitRepository, TokenUsageRepository,
};
use crate::domain::value_objects::EthAddress;
use crate::error::{AuthFailure, GateError, GateResult};
use std::sync::Arc;

/// One gate-access request after transport decoding.
#[derive(Debug)]
pub struct GateAccessInput {
    pub identifier: String,
    pub host: Option<String>,
    pub path: String,
    pub method: String,
    /// Token from the Authorization header, if present
    pub bearer: Option<String>,
    pub address: Option<String>,
    pub signature: Option<String>,
    pub token_id: Option<u64>,
    pub timestamp_ms: Option<i64>,
    pub message: Option<String>,
    pub nonce: Option<String>,
}

/// The authentication material present in one request, classified.
///
/// Exactly one variant applies per attempt; classification happens
/// before any verification so each verifier only sees its own shape.
#[derive(Debug)]
pub enum AuthAttempt {
    Jwt {
        token: String,
    },
    Siwe {
        address: EthAddress,
        signature: String,
        token_id: u64,
        message: String,
        nonce: String,
    },
    Legacy {
        address: EthAddress,
        signature: String,
        token_id: u64,
        timestamp_ms: i64,
    },
}

/// A verified identity plus the proof that produced it (absent for the
/// bearer fast path, which has no fresh proof to re-mint from).
struct Authenticated {
    address: EthAddress,
    token_id: u64,
    proof: Option<VerifiedProof>,
}

struct VerifiedProof {
    method: AuthMethod,
    message: String,
    siwe: Option<SiweProjection>,
}

/// Successful admission result
#[derive(Debug)]
pub struct GateAccessOutput {
    pub content: ContentPayload,
    pub access_token: Option<String>,
}

/// Orchestrates one gate-access attempt.
pub struct GateAccessUseCase<K, U, O, C> {
    kv: Arc<K>,
    usage: Arc<U>,
    oracle: Arc<O>,
    content: Arc<C>,
    credentials: Arc<JwtCredentialService>,
    config: Arc<GateConfig>,
}

impl<K, U, O, C> GateAccessUseCase<K, U, O, C>
where
    K: NonceRepository + RateLimitRepository,
    U: TokenUsageRepository,
    O: OwnershipOracle,
    C: ContentProvider,
{
    pub fn new(
        kv: Arc<K>,
        usage: Arc<U>,
        oracle: Arc<O>,
        content: Arc<C>,
        credentials: Arc<JwtCredentialService>,
        config: Arc<GateConfig>,
    ) -> Self {
        Self {
            kv,
            usage,
            oracle,
            content,
            credentials,
            config,
        }
    }

    pub async fn execute(&self, input: GateAccessInput) -> GateResult<GateAccessOutput> {
        RateLimitGate::new(self.kv.clone(), self.config.clone())
            .check(&input.identifier, GateRoute::GateAccess)
            .await?;

        let authed = self.authenticate(&input).await?;

        let owns = self
            .oracle
            .owner_owns_token(&authed.address, authed.token_id)
            .await?;
        if !owns {
            tracing::info!(
                address = %authed.address,
                token_id = authed.token_id,
                "ownership check failed"
            );
            return Err(GateError::NotOwner);
        }

        match self.usage.get_usage(authed.token_id).await? {
            None => return Err(GateError::TokenNotFound),
            Some(record) if record.used => return Err(GateError::TokenAlreadyUsed),
            Some(_) => {}
        }

        // Admission has succeeded. Content and credential minting are
        // best-effort from here: failures degrade the response body but
        // never turn a granted request into an error.
        let content = match self
            .content
            .generate(authed.token_id, &authed.address)
            .await
        {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, token_id = authed.token_id, "content generation failed");
                ContentPayload::fallback(authed.token_id)
            }
        };

        let access_token = match authed.proof {
            Some(proof) => {
                let minted = self.credentials.issue(CredentialInput {
                    address: &authed.address,
                    token_id: authed.token_id,
                    auth: proof.method,
                    siwe: proof.siwe,
                    proof_message: &proof.message,
                });
                match minted {
                    Ok(token) => Some(token),
                    Err(e) => {
                        tracing::error!(error = %e, "credential minting failed");
                        None
                    }
                }
            }
            None => None,
        };

        tracing::info!(
            address = %authed.address,
            token_id = authed.token_id,
            "gate access granted"
        );
        Ok(GateAccessOutput {
            content,
            access_token,
        })
    }

    /// Resolve the request to a verified address and token id.
    async fn authenticate(&self, input: &GateAccessInput) -> GateResult<Authenticated> {
        match self.classify(input)? {
            AuthAttempt::Jwt { token } => {
                if let Some(claims) = self.credentials.verify(&token) {
                    // The body may restate the token id; it must agree
                    // with the credential or the attempt is rejected.
                    if let Some(body_token_id) = input.token_id {
                        if body_token_id != claims.token_id {
                            return Err(GateError::auth(AuthFailure::TokenIdMismatch));
                        }
                    }
                    let address = EthAddress::parse(&claims.sub)
                        .map_err(|_| GateError::auth(AuthFailure::JwtRejected))?;
                    tracing::debug!(address = %address, "bearer fast path accepted");
                    return Ok(Authenticated {
                        address,
                        token_id: claims.token_id,
                        proof: None,
                    });
                }
                // A rejected bearer falls back to body auth; only when
                // the body carries no proof material is it final.
                if input.signature.is_none() {
                    return Err(GateError::auth(AuthFailure::JwtRejected));
                }
                tracing::debug!("bearer rejected, trying body proof");
                let attempt = self.classify_body(input)?;
                self.verify_body(attempt, input).await
            }
            attempt => self.verify_body(attempt, input).await,
        }
    }

    /// Verify a body-borne proof attempt.
    async fn verify_body(
        &self,
        attempt: AuthAttempt,
        input: &GateAccessInput,
    ) -> GateResult<Authenticated> {
        match attempt {
            // A bare Jwt attempt reaching this point means the bearer
            // was already rejected and no body proof exists.
            AuthAttempt::Jwt { .. } => Err(GateError::auth(AuthFailure::JwtRejected)),
            AuthAttempt::Siwe {
                address,
                signature,
                token_id,
                message,
                nonce,
            } => {
                let verifier = SiweVerifier::new(self.kv.clone(), self.config.clone());
                let claims = verifier
                    .verify(SiweVerifyInput {
                        message: &message,
                        signature: &signature,
                        nonce: &nonce,
                        address: &address,
                        identifier: &input.identifier,
                        request_host: input.host.as_deref(),
                    })
                    .await?;
                Ok(Authenticated {
                    address: address.clone(),
                    token_id,
                    proof: Some(VerifiedProof {
                        method: AuthMethod::Siwe,
                        siwe: Some(SiweProjection {
                            domain: claims.domain,
                            address: address.as_str().to_string(),
                            chain_id: claims.chain_id,
                            nonce: claims.nonce,
                            issued_at: claims.issued_at,
                            uri: claims.uri,
                        }),
                        message,
                    }),
                })
            }
            AuthAttempt::Legacy {
                address,
                signature,
                token_id,
                timestamp_ms,
            } => {
                let verifier = LegacyVerifier::new(self.config.clone());
                let proof = verifier.verify(LegacyVerifyInput {
                    address: &address,
                    signature: &signature,
                    token_id,
                    timestamp_ms,
                    request_host: input.host.as_deref(),
                    path: &input.path,
                    method: &input.method,
                })?;
                Ok(Authenticated {
                    address,
                    token_id,
                    proof: Some(VerifiedProof {
                        method: AuthMethod::Legacy,
                        message: proof.message,
                        siwe: None,
                    }),
                })
            }
        }
    }

    /// Classify the request's auth material. A bearer header wins; the
    /// body is classified by the server's auth mode.
    fn classify(&self, input: &GateAccessInput) -> GateResult<AuthAttempt> {
        if let Some(token) = &input.bearer {
            return Ok(AuthAttempt::Jwt {
                token: token.clone(),
            });
        }
        self.classify_body(input)
    }

    /// Classify the body's auth material per the server's mode.
    ///
    /// Missing core fields are a 400; a body that has them but lacks the
    /// mode-specific proof fields is an auth rejection.
    fn classify_body(&self, input: &GateAccessInput) -> GateResult<AuthAttempt> {
        let address_raw = input
            .address
            .as_deref()
            .ok_or_else(|| GateError::Validation("address is required".to_string()))?;
        let address = EthAddress::parse(address_raw)
            .map_err(|e| GateError::Validation(format!("address: {e}")))?;
        let signature = input
            .signature
            .clone()
            .ok_or_else(|| GateError::Validation("signature is required".to_string()))?;
        let token_id = input
            .token_id
            .ok_or_else(|| GateError::Validation("tokenId is required".to_string()))?;

        if self.config.siwe_enabled {
            match (&input.message, &input.nonce) {
                (Some(message), Some(nonce)) => Ok(AuthAttempt::Siwe {
                    address,
                    signature,
                    token_id,
                    message: message.clone(),
                    nonce: nonce.clone(),
                }),
                _ => Err(GateError::auth(AuthFailure::MissingProofFields)),
            }
        } else {
            match input.timestamp_ms {
                Some(timestamp_ms) => Ok(AuthAttempt::Legacy {
                    address,
                    signature,
                    token_id,
                    timestamp_ms,
                }),
                None => Err(GateError::auth(AuthFailure::MissingProofFields)),
            }
        }
    }
}
