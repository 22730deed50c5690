//! Ethereum signature recovery
//!
//! EIP-191 `personal_sign` message hashing and secp256k1 public-key
//! recovery. Wallets sign `keccak256("\x19Ethereum Signed Message:\n" +
//! len(message) + message)` and emit a 65-byte `r || s || v` signature;
//! the signer's address is recoverable from the digest and signature alone.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};

/// Compute Keccak-256 hash
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// EIP-191 digest of a personal-sign message
pub fn eip191_hash(message: &[u8]) -> [u8; 32] {
    let mut data = Vec::with_capacity(message.len() + 32);
    data.extend_from_slice(b"\x19Ethereum Signed Message:\n");
    data.extend_from_slice(message.len().to_string().as_bytes());
    data.extend_from_slice(message);
    keccak256(&data)
}

/// Error when recovering a signer address
#[derive(Debug, Clone, thiserror::Error)]
pub enum RecoverError {
    #[error("signature is not valid hex")]
    InvalidHex,
    #[error("signature must be 65 bytes (r || s || v)")]
    InvalidLength,
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),
    #[error("signature is not a valid secp256k1 signature")]
    InvalidSignature,
    #[error("public key recovery failed")]
    RecoveryFailed,
}

/// Derive the lowercase `0x`-prefixed address of a verifying key
pub fn address_from_verifying_key(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    // Skip the 0x04 uncompressed-point tag; address is the low 20 bytes
    // of keccak256 over the 64-byte public key.
    let hash = keccak256(&point.as_bytes()[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

/// Recover the signer address of an EIP-191 personal-sign message.
///
/// `signature_hex` is the wallet-emitted 65-byte signature, hex encoded
/// with or without a `0x` prefix. The trailing recovery byte may be in
/// either convention (0/1 or 27/28).
///
/// Returns the lowercase `0x`-prefixed signer address.
pub fn recover_personal_sign_address(
    message: &str,
    signature_hex: &str,
) -> Result<String, RecoverError> {
    let raw = hex::decode(signature_hex.trim_start_matches("0x"))
        .map_err(|_| RecoverError::InvalidHex)?;
    if raw.len() != 65 {
        return Err(RecoverError::InvalidLength);
    }

    let v = raw[64];
    let recovery_byte = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        other => return Err(RecoverError::InvalidRecoveryId(other)),
    };
    let recovery_id =
        RecoveryId::from_byte(recovery_byte).ok_or(RecoverError::InvalidRecoveryId(v))?;

    let signature =
        Signature::from_slice(&raw[..64]).map_err(|_| RecoverError::InvalidSignature)?;

    let digest = eip191_hash(message.as_bytes());
    let key = VerifyingKey::recover_from_prehash(&digest, &signature, recovery_id)
        .map_err(|_| RecoverError::RecoveryFailed)?;

    Ok(address_from_verifying_key(&key))
}


#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;

    #[test]
    fn test_keccak256_known_value() {
        // keccak256 of empty input
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_eip191_prefix_applied() {
        // Digest must differ from a plain keccak of the message.
        let plain = keccak256(b"hello");
        let prefixed = eip191_hash(b"hello");
        assert_ne!(plain, prefixed);
    }

    #[test]
    fn test_sign_and_recover_roundtrip() {
        let key = SigningKey::random(&mut rand::rngs::OsRng);
        let address = testing::address_of(&key);
        let signature = testing::personal_sign(&key, "I own key #42");

        let recovered = recover_personal_sign_address("I own key #42", &signature).unwrap();
        assert_eq!(recovered, address);
    }

    #[test]
    fn test_recovery_byte_conventions() {
        let key = SigningKey::random(&mut rand::rngs::OsRng);
        let address = testing::address_of(&key);
        let signature = testing::personal_sign(&key, "message");

        // Rewrite v from 27/28 to 0/1; recovery must still work.
        let mut raw = hex::decode(signature.trim_start_matches("0x")).unwrap();
        raw[64] -= 27;
        let alt = format!("0x{}", hex::encode(raw));

        assert_eq!(
            recover_personal_sign_address("message", &alt).unwrap(),
            address
        );
    }

    #[test]
    fn test_recover_rejects_malformed_input() {
        assert!(matches!(
            recover_personal_sign_address("m", "not-hex"),
            Err(RecoverError::InvalidHex)
        ));
        assert!(matches!(
            recover_personal_sign_address("m", "0xdeadbeef"),
            Err(RecoverError::InvalidLength)
        ));

        let mut raw = vec![1u8; 65];
        raw[64] = 9; // bogus recovery byte
        assert!(matches!(
            recover_personal_sign_address("m", &hex::encode(raw)),
            Err(RecoverError::InvalidRecoveryId(9))
        ));
    }

    #[test]
    fn test_different_message_recovers_different_address() {
        let key = SigningKey::random(&mut rand::rngs::OsRng);
        let address = testing::address_of(&key);
        let signature = testing::personal_sign(&key, "original message");

        let recovered = recover_personal_sign_address("tampered message", &signature);
        // Recovery either fails or yields some other address.
        match recovered {
            Ok(other) => assert_ne!(other, address),
            Err(_) => {}
        }
    }
}
