//! SIWE (EIP-4361) message parsing
//!
//! Parses the plaintext "Sign-In with Ethereum" block a wallet signs.
//! Parsing is strict about the frame (preamble, address, field order is
//! not enforced but required fields must be present) and tolerant about
//! optional fields. Claims are immutable once parsed; all policy checks
//! (domain, nonce, chain, signature) live in the application layer.

use chrono::{DateTime, Utc};

const PREAMBLE_SUFFIX: &str = " wants you to sign in with your Ethereum account:";

/// Claims parsed out of a SIWE message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiweClaims {
    pub domain: String,
    pub address: String,
    pub statement: Option<String>,
    pub uri: String,
    pub version: String,
    pub chain_id: u64,
    pub nonce: String,
    pub issued_at: String,
    pub expiration_time: Option<String>,
    pub not_before: Option<String>,
}

/// Error when parsing a SIWE message
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SiweParseError {
    #[error("missing or malformed preamble line")]
    BadPreamble,
    #[error("missing address line")]
    MissingAddress,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("field has invalid value: {0}")]
    BadField(&'static str),
}

impl SiweClaims {
    /// Parse a SIWE message block.
    pub fn parse(message: &str) -> Result<Self, SiweParseError> {
        let mut lines = message.lines();

        let preamble = lines.next().ok_or(SiweParseError::BadPreamble)?;
        let domain = preamble
            .strip_suffix(PREAMBLE_SUFFIX)
            .ok_or(SiweParseError::BadPreamble)?;
        if domain.is_empty() {
            return Err(SiweParseError::BadPreamble);
        }

        let address = lines
            .next()
            .filter(|l| !l.is_empty())
            .ok_or(SiweParseError::MissingAddress)?;

        // Optional statement: a blank line, then free text, then another
        // blank line before the field block. Field lines always contain
        // ": ", statements conventionally do not start a field.
        let rest: Vec<&str> = lines.collect();
        let mut statement = None;
        let mut field_lines = Vec::new();
        for line in &rest {
            if line.is_empty() {
                continue;
            }
            if is_field_line(line) {
                field_lines.push(*line);
            } else if statement.is_none() && field_lines.is_empty() {
                statement = Some(line.to_string());
            } else {
                // Resources list entries ("- uri") and continuations are
                // ignored; they carry no gate policy.
            }
        }

        let mut uri = None;
        let mut version = None;
        let mut chain_id = None;
        let mut nonce = None;
        let mut issued_at = None;
        let mut expiration_time = None;
        let mut not_before = None;

        for line in field_lines {
            if let Some((key, value)) = line.split_once(": ") {
                match key {
                    "URI" => uri = Some(value.to_string()),
                    "Version" => version = Some(value.to_string()),
                    "Chain ID" => {
                        chain_id = Some(
                            value
                                .parse::<u64>()
                                .map_err(|_| SiweParseError::BadField("Chain ID"))?,
                        )
                    }
                    "Nonce" => nonce = Some(value.to_string()),
                    "Issued At" => issued_at = Some(value.to_string()),
                    "Expiration Time" => expiration_time = Some(value.to_string()),
                    "Not Before" => not_before = Some(value.to_string()),
                    _ => {}
                }
            }
        }

        Ok(Self {
            domain: domain.to_string(),
            address: address.to_string(),
            statement,
            uri: uri.ok_or(SiweParseError::MissingField("URI"))?,
            version: version.ok_or(SiweParseError::MissingField("Version"))?,
            chain_id: chain_id.ok_or(SiweParseError::MissingField("Chain ID"))?,
            nonce: nonce.ok_or(SiweParseError::MissingField("Nonce"))?,
            issued_at: issued_at.ok_or(SiweParseError::MissingField("Issued At"))?,
            expiration_time,
            not_before,
        })
    }

    /// Whether `now` falls inside the message's own validity window
    /// (`Not Before` / `Expiration Time`, both optional).
    ///
    /// Unparseable timestamps fail closed.
    pub fn is_within_validity_window(&self, now: DateTime<Utc>) -> bool {
        if let Some(nbf) = &self.not_before {
            match DateTime::parse_from_rfc3339(nbf) {
                Ok(t) if now >= t => {}
                _ => return false,
            }
        }
        if let Some(exp) = &self.expiration_time {
            match DateTime::parse_from_rfc3339(exp) {
                Ok(t) if now < t => {}
                _ => return false,
            }
        }
        true
    }
}

fn is_field_line(line: &str) -> bool {
    const FIELD_KEYS: [&str; 9] = [
        "URI: ",
        "Version: ",
        "Chain ID: ",
        "Nonce: ",
        "Issued At: ",
        "Expiration Time: ",
        "Not Before: ",
        "Request ID: ",
        "Resources:",
    ];
    FIELD_KEYS.iter().any(|k| line.starts_with(k))
}

/// Normalize a domain for comparison: lowercase, scheme stripped,
/// trailing slash and port stripped.
pub fn normalize_domain(raw: &str) -> String {
    let s = raw.trim().to_ascii_lowercase();
    let s = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"))
        .unwrap_or(&s);
    let s = s.trim_end_matches('/');
    match s.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name.to_string(),
        _ => s.to_string(),
    }
}
