use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Why a request's credential was refused.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing Authorization header")]
    Missing,
    #[error("Authorization header is not a bearer token")]
    Malformed,
    #[error("invalid API token")]
    Invalid,
}

/// Validates an `Authorization` header value against the expected API token.
///
/// The scheme name is matched case-insensitively. Both tokens are hashed before a constant-time
/// comparison, so neither their contents nor their lengths show in the timing.
///
/// The token is configured once at startup and passed in; nothing is read from the environment
/// per request.
pub fn validate_bearer(authorization: Option<&str>, expected: &str) -> Result<(), AuthError> {
    let header = authorization.ok_or(AuthError::Missing)?;
    let token = header
        .trim_start()
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::Malformed)?;

    if bool::from(hash_token(token).ct_eq(&hash_token(expected))) {
        Ok(())
    } else {
        Err(AuthError::Invalid)
    }
}

fn hash_token(token: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_matching_token() {
        assert_eq!(validate_bearer(Some("Bearer s3cret"), "s3cret"), Ok(()));
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(validate_bearer(Some("bearer s3cret"), "s3cret"), Ok(()));
        assert_eq!(validate_bearer(Some("BEARER s3cret"), "s3cret"), Ok(()));
        assert_eq!(
            validate_bearer(Some("bearer wrong"), "s3cret"),
            Err(AuthError::Invalid)
        );
    }

    #[test]
    fn rejects_missing_malformed_and_wrong_tokens() {
        assert_eq!(validate_bearer(None, "s3cret"), Err(AuthError::Missing));
        assert_eq!(
            validate_bearer(Some("Basic czNjcmV0"), "s3cret"),
            Err(AuthError::Malformed)
        );
        assert_eq!(
            validate_bearer(Some("Bearer "), "s3cret"),
            Err(AuthError::Malformed)
        );
        assert_eq!(
            validate_bearer(Some("Bearers3cret"), "s3cret"),
            Err(AuthError::Malformed)
        );
        assert_eq!(
            validate_bearer(Some("Bearer s3cre7"), "s3cret"),
            Err(AuthError::Invalid)
        );
    }

    #[test]
    fn tokens_of_other_lengths_are_compared_as_digests() {
        assert_eq!(hash_token("x").len(), hash_token("s3cret-longer").len());
        assert_eq!(validate_bearer(Some("Bearer x"), "s3cret"), Err(AuthError::Invalid));
        assert_eq!(
            validate_bearer(Some("Bearer s3cret-longer"), "s3cret"),
            Err(AuthError::Invalid)
        );
    }
}
