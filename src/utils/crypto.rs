// Cryptographic utilities for session ids, state tokens and cookie sealing

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Nonce size for AES-256-GCM encryption (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Encryption key size for AES-256 (256 bits)
pub const ENCRYPTION_KEY_SIZE: usize = 32;

/// Separator between a signed value and its signature
const SIGNATURE_SEPARATOR: char = '.';

/// Generate a cryptographically secure CSRF token
///
/// 24 bytes (192 bits) of entropy, base64url encoded to 32 characters so it
/// stays short inside the authorization URL.
#[must_use]
pub fn generate_csrf_token() -> String {
    generate_nonce(24)
}

/// Generate a cryptographically secure nonce of specified byte length
///
/// # Returns
///
/// A base64url-encoded string representing the specified bytes of random data
#[must_use]
pub fn generate_nonce(length: usize) -> String {
    let mut nonce = vec![0u8; length];
    rand::rng().fill_bytes(&mut nonce);
    general_purpose::URL_SAFE_NO_PAD.encode(nonce)
}

/// Derive a purpose-bound 32-byte key from the session secret
///
/// Separate purposes (cookie signing, state sealing) get unrelated keys from
/// the same secret, so a value produced for one purpose never verifies for
/// another.
#[must_use]
pub fn derive_key(secret: &[u8], purpose: &str) -> [u8; ENCRYPTION_KEY_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(purpose.as_bytes());
    hasher.update([0u8]);
    hasher.update(secret);
    hasher.finalize().into()
}

/// Generic encryption function for any serializable data using AES-256-GCM
///
/// # Returns
///
/// A Base64URL-encoded string containing the nonce + ciphertext
///
/// # Errors
///
/// Returns an error if:
/// - Serialization fails
/// - Key length is invalid
/// - AES encryption fails
pub fn encrypt_data<T: Serialize>(data: &T, key: &[u8]) -> Result<String> {
    if key.len() != ENCRYPTION_KEY_SIZE {
        return Err(anyhow!(
            "Invalid key length: expected {ENCRYPTION_KEY_SIZE} bytes, got {}",
            key.len()
        ));
    }

    let json_data = serde_json::to_string(data).context("Failed to serialize data")?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let ciphertext = cipher
        .encrypt(nonce, json_data.as_bytes())
        .map_err(|e| anyhow!("AES encryption failed: {e}"))?;

    // Combine nonce + ciphertext and encode as base64
    let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    combined.extend_from_slice(&nonce_bytes);
    combined.extend_from_slice(&ciphertext);

    Ok(general_purpose::URL_SAFE_NO_PAD.encode(&combined))
}

/// Generic decryption function for any deserializable data using AES-256-GCM
///
/// # Errors
///
/// Returns an error if:
/// - Key length is invalid
/// - Base64 decoding fails
/// - Data length is invalid
/// - AES decryption fails
/// - Deserialization fails
pub fn decrypt_data<T: DeserializeOwned>(encrypted_data: &str, key: &[u8]) -> Result<T> {
    if key.len() != ENCRYPTION_KEY_SIZE {
        return Err(anyhow!(
            "Invalid key length: expected {ENCRYPTION_KEY_SIZE} bytes, got {}",
            key.len()
        ));
    }

    let combined = general_purpose::URL_SAFE_NO_PAD
        .decode(encrypted_data)
        .context("Failed to decode base64 data")?;

    if combined.len() < NONCE_SIZE {
        return Err(anyhow!("Invalid data length"));
    }

    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| anyhow!("AES decryption failed: {e}"))?;

    let data: T = serde_json::from_slice(&plaintext)
        .context("Failed to deserialize data from decrypted JSON")?;

    Ok(data)
}

/// Append an HMAC-SHA256 signature to `value`
///
/// The output has the form `{value}.{signature}` with a base64url signature.
/// `value` must not contain `.`.
///
/// # Errors
///
/// Returns an error if the value contains the separator or the key is rejected
pub fn sign_value(value: &str, key: &[u8]) -> Result<String> {
    if value.contains(SIGNATURE_SEPARATOR) {
        return Err(anyhow!("Value to sign must not contain '{SIGNATURE_SEPARATOR}'"));
    }

    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|_| anyhow!("Invalid HMAC key length"))?;
    mac.update(value.as_bytes());
    let signature = general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{value}{SIGNATURE_SEPARATOR}{signature}"))
}

/// Verify a value produced by [`sign_value`] and return the original value
///
/// The comparison is constant-time. Returns `None` for anything malformed or
/// signed with a different key.
#[must_use]
pub fn verify_signed_value<'a>(signed: &'a str, key: &[u8]) -> Option<&'a str> {
    let (value, signature) = signed.rsplit_once(SIGNATURE_SEPARATOR)?;
    let signature = general_purpose::URL_SAFE_NO_PAD.decode(signature).ok()?;

    let mut mac = <HmacSha256 as Mac>::new_from_slice(key).ok()?;
    mac.update(value.as_bytes());
    mac.verify_slice(&signature).ok()?;

    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    const TEST_SECRET: &[u8] = b"test_secret_key_for_hmac_testing_32b";

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Payload {
        state: String,
        issued_at: i64,
    }

    #[test]
    fn test_csrf_tokens_are_unique_and_url_safe() {
        let first = generate_csrf_token();
        let second = generate_csrf_token();

        assert_ne!(first, second);
        assert_eq!(first.len(), 32);
        assert!(first
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_derive_key_separates_purposes() {
        let signing = derive_key(TEST_SECRET, "session-cookie");
        let sealing = derive_key(TEST_SECRET, "oauth-state");

        assert_ne!(signing, sealing);
        assert_eq!(signing, derive_key(TEST_SECRET, "session-cookie"));
    }

    #[test]
    fn test_encrypted_data_opens_with_same_key_only() {
        let key = derive_key(TEST_SECRET, "oauth-state");
        let other_key = derive_key(b"another secret", "oauth-state");
        let payload = Payload {
            state: "abc".to_string(),
            issued_at: 1_700_000_000,
        };

        let sealed = encrypt_data(&payload, &key).unwrap();
        let opened: Payload = decrypt_data(&sealed, &key).unwrap();
        assert_eq!(opened, payload);

        assert!(decrypt_data::<Payload>(&sealed, &other_key).is_err());
    }

    #[test]
    fn test_encrypt_rejects_short_key() {
        let result = encrypt_data(&"data", b"short");
        assert!(result.unwrap_err().to_string().contains("Invalid key length"));
    }

    #[test]
    fn test_decrypt_rejects_truncated_input() {
        let key = derive_key(TEST_SECRET, "oauth-state");
        let result = decrypt_data::<Payload>("AAAA", &key);
        assert!(result.unwrap_err().to_string().contains("Invalid data length"));
    }

    #[test]
    fn test_signed_value_verifies() {
        let key = derive_key(TEST_SECRET, "session-cookie");
        let signed = sign_value("session-id-123", &key).unwrap();

        assert!(signed.starts_with("session-id-123."));
        assert_eq!(verify_signed_value(&signed, &key), Some("session-id-123"));
    }

    #[test]
    fn test_tampered_signed_value_is_rejected() {
        let key = derive_key(TEST_SECRET, "session-cookie");
        let signed = sign_value("session-id-123", &key).unwrap();
        let (_, signature) = signed.rsplit_once('.').unwrap();
        let forged = format!("session-id-456.{signature}");

        assert_eq!(verify_signed_value(&forged, &key), None);
        assert_eq!(verify_signed_value("session-id-123", &key), None);
        assert_eq!(verify_signed_value("session-id-123.!!!", &key), None);
    }

    #[test]
    fn test_rotated_secret_invalidates_signature() {
        let old_key = derive_key(b"old secret", "session-cookie");
        let new_key = derive_key(b"new secret", "session-cookie");
        let signed = sign_value("session-id-123", &old_key).unwrap();

        assert_eq!(verify_signed_value(&signed, &new_key), None);
    }

    #[test]
    fn test_sign_accepts_keys_of_any_length() {
        for key in [&b""[..], b"k", &[7u8; 128]] {
            let signed = sign_value("session-id", key).unwrap();
            assert_eq!(verify_signed_value(&signed, key), Some("session-id"));
        }
    }

    #[test]
    fn test_sign_rejects_separator_in_value() {
        let key = derive_key(TEST_SECRET, "session-cookie");
        assert!(sign_value("a.b", &key).is_err());
    }
}
