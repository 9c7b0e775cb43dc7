//! Token version claim and forward-compatibility gate.
//!
//! Every issued token carries a `ver` claim of the form `"v<integer>"`.
//! Verifiers accept any version at or below the maximum they support and
//! reject only versions newer than that — a deliberate forward-compatibility
//! gate, not a strict equality check. Issuers and verifiers can therefore be
//! upgraded independently as long as verifiers are upgraded first.

use crate::error::ApiKeyError;

/// Fixed prefix of the `ver` claim.
pub const TOKEN_VERSION_PREFIX: &str = "v";

/// The protocol version stamped into newly issued tokens.
pub const CURRENT_TOKEN_VERSION: u32 = 1;

/// The highest protocol version this verifier understands.
///
/// Tokens at or below this version are accepted for backward compatibility;
/// tokens above it are rejected as malformed.
pub const MAX_SUPPORTED_TOKEN_VERSION: u32 = 1;

/// Formats the `ver` claim value for newly issued tokens (e.g. `"v1"`).
#[must_use]
pub fn format_token_version() -> String {
    format!("{TOKEN_VERSION_PREFIX}{CURRENT_TOKEN_VERSION}")
}

/// Parses and gates a `ver` claim value.
///
/// The value must be the fixed prefix followed by a 1–3 digit integer, and
/// the integer must not exceed [`MAX_SUPPORTED_TOKEN_VERSION`].
///
/// # Errors
///
/// Returns [`ApiKeyError::MalformedToken`] if the value does not match the
/// pattern or names a version newer than this verifier supports.
pub fn parse_token_version(value: &str) -> Result<u32, ApiKeyError> {
    let digits = value
        .strip_prefix(TOKEN_VERSION_PREFIX)
        .ok_or_else(|| ApiKeyError::malformed_token(format!("Invalid token version: {value}")))?;

    if digits.is_empty() || digits.len() > 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiKeyError::malformed_token(format!("Invalid token version: {value}")));
    }

    // 1-3 ASCII digits always fit in u32
    let version: u32 = digits
        .parse()
        .map_err(|_| ApiKeyError::malformed_token(format!("Invalid token version: {value}")))?;

    if version > MAX_SUPPORTED_TOKEN_VERSION {
        return Err(ApiKeyError::malformed_token(format!(
            "Unsupported token version: {value} (max supported: \
             {TOKEN_VERSION_PREFIX}{MAX_SUPPORTED_TOKEN_VERSION})"
        )));
    }

    Ok(version)
}
