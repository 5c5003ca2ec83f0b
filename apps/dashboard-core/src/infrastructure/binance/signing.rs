//! REST Request Signing
//!
//! Builds the canonical query string for authenticated REST calls and signs
//! it with HMAC-SHA256.
//!
//! # Canonical Form
//!
//! Parameters are serialized as URI-encoded `key=value` pairs joined with
//! `&`, in **insertion order**. The exchange verifies the signature against
//! the exact byte sequence it receives, so reordering (or sorting) breaks
//! authentication. The request timestamp (epoch milliseconds) is appended as
//! the final parameter before signing, and the lower-hex signature is
//! appended after it as a trailing `signature` parameter.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Errors from signature computation.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    /// The secret could not be used as an HMAC key.
    #[error("invalid signing secret")]
    InvalidSecret,
}

/// Ordered request parameters awaiting signature.
///
/// Insertion order is preserved all the way onto the wire.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Create an empty parameter list.
    #[must_use]
    pub const fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Append one parameter.
    #[must_use]
    pub fn push(mut self, key: &str, value: impl ToString) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    /// Append one parameter when the value is present.
    #[must_use]
    pub fn push_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.push(key, value),
            None => self,
        }
    }

    /// Whether no parameters have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Canonical `key=value&...` encoding in insertion order.
    #[must_use]
    pub fn encode(&self) -> String {
        self.pairs
            .iter()
            .map(|(key, value)| format!("{}={}", uri_encode(key), uri_encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Percent-encode a single key or value.
///
/// Unreserved characters (RFC 3986) pass through; everything else is encoded
/// as upper-hex `%XX`. Exchange parameters are plain ASCII in practice, so
/// this exists for byte-for-byte parity with the server, not for exotic
/// payloads.
fn uri_encode(raw: &str) -> String {
    let mut encoded = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            other => {
                encoded.push('%');
                encoded.push_str(&format!("{other:02X}"));
            }
        }
    }
    encoded
}

/// Compute the lower-hex HMAC-SHA256 signature of a canonical query string.
///
/// # Errors
///
/// Returns [`SigningError::InvalidSecret`] if the secret cannot key the MAC.
pub fn sign(secret: &str, query_string: &str) -> Result<String, SigningError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SigningError::InvalidSecret)?;
    mac.update(query_string.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Produce the final signed query string: canonical params with `timestamp`
/// appended, followed by the trailing `signature` parameter.
///
/// # Errors
///
/// Returns [`SigningError`] if signature computation fails.
pub fn signed_query(
    params: QueryParams,
    timestamp_ms: i64,
    secret: &str,
) -> Result<String, SigningError> {
    let query = params.push("timestamp", timestamp_ms).encode();
    let signature = sign(secret, &query)?;
    Ok(format!("{query}&signature={signature}"))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // Secret and query string from the exchange API documentation.
    const DOC_SECRET: &str = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
    const DOC_QUERY: &str = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC\
        &quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
    const DOC_SIGNATURE: &str =
        "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71";

    #[test]
    fn matches_documentation_vector() {
        assert_eq!(sign(DOC_SECRET, DOC_QUERY).unwrap(), DOC_SIGNATURE);
    }

    #[test]
    fn signing_is_deterministic() {
        let first = sign("secret", "a=1&b=2").unwrap();
        let second = sign("secret", "a=1&b=2").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn parameter_order_changes_the_signature() {
        let forward = sign("secret", "a=1&b=2").unwrap();
        let reversed = sign("secret", "b=2&a=1").unwrap();
        assert_ne!(forward, reversed);
    }

    #[test]
    fn encode_preserves_insertion_order() {
        let params = QueryParams::new()
            .push("symbol", "ETHUSDT")
            .push("side", "BUY")
            .push("quantity", "0.5");
        assert_eq!(params.encode(), "symbol=ETHUSDT&side=BUY&quantity=0.5");
    }

    #[test]
    fn push_opt_skips_missing_values() {
        let params = QueryParams::new()
            .push("symbol", "ETHUSDT")
            .push_opt("orderId", None::<u64>)
            .push_opt("limit", Some(10));
        assert_eq!(params.encode(), "symbol=ETHUSDT&limit=10");
    }

    #[test]
    fn reserved_characters_are_percent_encoded() {
        assert_eq!(uri_encode("a b&c=d"), "a%20b%26c%3Dd");
        assert_eq!(uri_encode("1.5-x_~"), "1.5-x_~");
    }

    #[test]
    fn signed_query_appends_timestamp_then_signature() {
        let params = QueryParams::new().push("symbol", "ETHUSDT");
        let signed = signed_query(params, 1_700_000_000_000, "secret").unwrap();

        let expected_query = "symbol=ETHUSDT&timestamp=1700000000000";
        let expected_sig = sign("secret", expected_query).unwrap();
        assert_eq!(signed, format!("{expected_query}&signature={expected_sig}"));
    }
}
