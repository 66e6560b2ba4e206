use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Rate-Limit Key Hashing
// =============================================================================

/// One-way hash of rate-limit key material
///
/// The attempt log only ever stores this value, so a dump of the table does
/// not reveal client IPs or email addresses.
///
/// # Returns
/// * `sha256:<64 hex chars>`
pub fn hash_rate_limit_key(material: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(material.as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

// =============================================================================
// HMAC Signing (Console Sessions)
// =============================================================================

/// Compute a hex-encoded HMAC-SHA256 signature
pub fn sign_hmac(data: &str, secret: &str) -> Option<String> {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return None;
        }
    };
    mac.update(data.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Verify HMAC-SHA256 signature
///
/// Comparison is constant-time via `verify_slice`.
pub fn verify_hmac(data: &str, signature: &str, secret: &str) -> bool {
    // Create HMAC instance with secret key
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return false;
        }
    };

    mac.update(data.as_bytes());

    // Decode hex signature
    let sig_bytes = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Invalid hex signature format");
            return false;
        }
    };

    mac.verify_slice(&sig_bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_rate_limit_key_format() {
        let result = hash_rate_limit_key("email:alice@example.com");

        let hex_part = result.strip_prefix("sha256:").unwrap();
        assert_eq!(hex_part.len(), 64);
        assert!(hex_part.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_rate_limit_key_known_value() {
        // SHA256("global")
        assert_eq!(
            hash_rate_limit_key("global"),
            format!("sha256:{}", hex::encode(Sha256::digest(b"global")))
        );
    }

    #[test]
    fn test_hash_rate_limit_key_distinguishes_inputs() {
        assert_eq!(hash_rate_limit_key("ip:1.2.3.4"), hash_rate_limit_key("ip:1.2.3.4"));
        assert_ne!(hash_rate_limit_key("ip:1.2.3.4"), hash_rate_limit_key("ip:1.2.3.5"));
    }

    #[test]
    fn test_verify_hmac_valid() {
        let secret = "test-secret-key";
        let data = "test data";

        let signature = sign_hmac(data, secret).unwrap();

        assert!(verify_hmac(data, &signature, secret));
    }

    #[test]
    fn test_verify_hmac_invalid_signature() {
        let secret = "test-secret-key";
        let data = "test data";
        let wrong_signature = "0".repeat(64);

        assert!(!verify_hmac(data, &wrong_signature, secret));
        assert!(!verify_hmac(data, "not-hex", secret));
    }

    #[test]
    fn test_verify_hmac_wrong_secret() {
        let data = "test data";
        let signature = sign_hmac(data, "test-secret-key").unwrap();

        assert!(!verify_hmac(data, &signature, "wrong-secret"));
    }
}
