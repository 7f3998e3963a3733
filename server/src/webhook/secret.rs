//! Webhook secret generation.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;

pub const SECRET_PREFIX: &str = "whsec_";

/// Length of the random body after [`SECRET_PREFIX`].
pub const SECRET_BODY_LEN: usize = 32;

/// Generate a fresh webhook signing secret: `whsec_` + 32 URL-safe characters.
///
/// 24 bytes from the OS CSPRNG encode to exactly 32 base64url characters,
/// so no padding or escaping is ever needed.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 24];
    OsRng.fill_bytes(&mut bytes);

    let encoded = URL_SAFE_NO_PAD.encode(bytes);
    format!("{}{}", SECRET_PREFIX, &encoded[..SECRET_BODY_LEN])
}
