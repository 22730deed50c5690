//! Domain Value Objects

use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated Ethereum address, stored lowercase.
///
/// Comparison is therefore case-insensitive by construction: wallets and
/// messages disagree on checksum casing, so everything is normalized at
/// the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EthAddress(String);

/// Error when parsing an Ethereum address
#[derive(Debug, Clone, thiserror::Error)]
pub enum AddressError {
    #[error("address must start with 0x")]
    MissingPrefix,
    #[error("address must be 20 bytes of hex")]
    InvalidLength,
    #[error("address contains non-hex characters")]
    InvalidHex,
}

impl EthAddress {
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let hex_part = raw.strip_prefix("0x").ok_or(AddressError::MissingPrefix)?;
        if hex_part.len() != 40 {
            return Err(AddressError::InvalidLength);
        }
        if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidHex);
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against an unvalidated string.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for EthAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EthAddress> for String {
    fn from(value: EthAddress) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_lowercase() {
        let addr = EthAddress::parse("0xAbCd000000000000000000000000000000001234").unwrap();
        assert_eq!(addr.as_str(), "0xabcd000000000000000000000000000000001234");
    }

    #[test]
    fn test_matches_case_insensitive() {
        let addr = EthAddress::parse("0xabcd000000000000000000000000000000001234").unwrap();
        assert!(addr.matches("0xABCD000000000000000000000000000000001234"));
        assert!(!addr.matches("0xabcd000000000000000000000000000000005678"));
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(matches!(
            EthAddress::parse("abcd000000000000000000000000000000001234"),
            Err(AddressError::MissingPrefix)
        ));
        assert!(matches!(
            EthAddress::parse("0xabcd"),
            Err(AddressError::InvalidLength)
        ));
        assert!(matches!(
            EthAddress::parse("0xzzcd000000000000000000000000000000001234"),
            Err(AddressError::InvalidHex)
        ));
    }

    #[test]
    fn test_serde_roundtrip() {
        let json = "\"0xABCD000000000000000000000000000000001234\"";
        let addr: EthAddress = serde_json::from_str(json).unwrap();
        assert_eq!(addr.as_str(), "0xabcd000000000000000000000000000000001234");

        let out = serde_json::to_string(&addr).unwrap();
        assert_eq!(out, "\"0xabcd000000000000000000000000000000001234\"");
    }
}
