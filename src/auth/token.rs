use crate::auth::AuthError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Map, Value};

/// Decodes the claims of a JWT without verifying it, the backend does that.
pub fn decode_claims(token: &str) -> Result<Map<String, Value>, AuthError> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|payload| !payload.is_empty())
        .ok_or(AuthError::MalformedToken)?;

    // Some issuers encode with the standard alphabet
    let payload: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();
    let bytes = URL_SAFE_NO_PAD.decode(payload)?;
    match serde_json::from_slice::<Value>(&bytes)? {
        Value::Object(claims) => Ok(claims),
        _ => Err(AuthError::MalformedToken),
    }
}

/// The first present claim of `names`, as an integer. A present but non-numeric claim yields
/// `None` rather than falling through to the next name.
pub fn numeric_claim(claims: &Map<String, Value>, names: &[&str]) -> Option<i64> {
    let value = names.iter().find_map(|name| claims.get(*name).filter(|value| !value.is_null()))?;
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|n| n.fract() == 0.0).map(|n| n as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
pub fn encode_token(claims: &Value) -> String {
    format!("eyJhbGciOiJIUzI1NiJ9.{}.signature", URL_SAFE_NO_PAD.encode(claims.to_string()))
}
