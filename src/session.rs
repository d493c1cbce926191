use base64::{Engine, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha256};

/// Identity
///
/// The `{id, surname}` pair recovered from a verified session token. The only
/// way to obtain one from request data is [`verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub surname: String,
}

/// The single failure signal of [`verify`]. Malformed tokens, undecodable
/// payloads and signature mismatches are deliberately indistinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid session token")]
pub struct InvalidSession;

const TOKEN_SEPARATOR: char = '.';
const FIELD_SEPARATOR: char = '|';

/// issue
///
/// Builds the token `payload.signature` for a user. The payload is the base64
/// form of `id|surname` and the signature is the hex SHA-256 of
/// `payload|secret`. Output depends only on the inputs: no nonce, no timestamp.
pub fn issue(id: &str, surname: &str, secret: &str) -> String {
    let payload = STANDARD.encode(format!("{id}{FIELD_SEPARATOR}{surname}"));
    let signature = sign(&payload, secret);
    format!("{payload}{TOKEN_SEPARATOR}{signature}")
}

/// verify
///
/// Checks the signature against `secret` before looking at the payload, then
/// decodes it back into an [`Identity`].
pub fn verify(token: &str, secret: &str) -> Result<Identity, InvalidSession> {
    let (payload, signature) = token.split_once(TOKEN_SEPARATOR).ok_or(InvalidSession)?;
    if payload.is_empty() || signature.is_empty() {
        return Err(InvalidSession);
    }

    let expected = sign(payload, secret);
    if !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
        return Err(InvalidSession);
    }

    let decoded = STANDARD.decode(payload).map_err(|_| InvalidSession)?;
    let decoded = String::from_utf8(decoded).map_err(|_| InvalidSession)?;
    let (id, surname) = decoded.split_once(FIELD_SEPARATOR).ok_or(InvalidSession)?;

    Ok(Identity {
        id: id.to_string(),
        surname: surname.to_string(),
    })
}

fn sign(payload: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hasher.update([FIELD_SEPARATOR as u8]);
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

// Runtime does not depend on where the first mismatching byte is.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
