use base64::engine::{general_purpose, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use tracing::debug;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Request signing for the marketplace organizer API.
///
/// The API authenticates with an app id plus a secret pair and expects every
/// request to carry a timestamp, a nonce and an HMAC-SHA256 signature over
/// the method, the key headers, the URI and the body.
pub struct MarketplaceAuth;

impl MarketplaceAuth {
    /// Generate a random nonce for API requests
    pub fn generate_nonce() -> String {
        rand::thread_rng().gen_range(10000000..99999999).to_string()
    }

    /// Get current timestamp for API requests
    pub fn get_timestamp() -> i64 {
        Utc::now().timestamp()
    }

    /// Generate the request signature the marketplace API verifies
    pub fn generate_signature(
        secret_id: &str,
        secret_key: &str,
        method: &str,
        uri: &str,
        timestamp: i64,
        nonce: &str,
        body: &str,
    ) -> String {
        let header_string = format!(
            "X-Api-Key={}&X-Api-Nonce={}&X-Api-Timestamp={}",
            secret_id, nonce, timestamp
        );

        let content = format!("{}\n{}\n{}\n{}", method, header_string, uri, body);

        debug!("String to sign: {}", content);

        let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(content.as_bytes());

        let hex_hash = hex::encode(mac.finalize().into_bytes());

        general_purpose::STANDARD.encode(hex_hash.as_bytes())
    }
}
