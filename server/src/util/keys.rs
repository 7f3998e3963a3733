//! Project key generation.
//!
//! Project keys are public identifiers embedded in widget script URLs,
//! formatted as `fp_` followed by 10 URL-safe characters.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;

pub const PROJECT_KEY_PREFIX: &str = "fp_";

const PROJECT_KEY_BODY_LEN: usize = 10;

/// Generate a new random project key.
pub fn generate_project_key() -> String {
    let mut bytes = [0u8; 8];
    OsRng.fill_bytes(&mut bytes);

    let encoded = URL_SAFE_NO_PAD.encode(bytes);
    format!("{}{}", PROJECT_KEY_PREFIX, &encoded[..PROJECT_KEY_BODY_LEN])
}

/// Check that `key` has the shape of a project key.
pub fn is_valid_project_key(key: &str) -> bool {
    match key.strip_prefix(PROJECT_KEY_PREFIX) {
        Some(body) => {
            body.len() == PROJECT_KEY_BODY_LEN
                && body
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        }
        None => false,
    }
}
