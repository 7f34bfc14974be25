use axum::http::{header, HeaderMap};
use uuid::Uuid;

use crate::error::ApiError;
use crate::utils::{verify_token, Role};

/// The authenticated caller, as established from the bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

/// Validates the `Authorization: Bearer <token>` header and returns the
/// caller's identity. Missing header is 401; a token that fails
/// verification is 400.
pub fn authenticate(headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Unauthorized("Access denied. No token provided."))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized("Invalid token format."))?;

    let claims = verify_token(token).map_err(|_| ApiError::InvalidToken)?;
    let id = claims.subject_id().ok_or(ApiError::InvalidToken)?;

    Ok(AuthUser {
        id,
        role: claims.role,
    })
}

/// Authenticates and additionally requires a specific role.
pub fn require_role(headers: &HeaderMap, role: Role) -> Result<AuthUser, ApiError> {
    let user = authenticate(headers)?;
    if user.role != role {
        return Err(ApiError::Forbidden);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::create_token;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn missing_header_is_unauthorized() {
        let err = authenticate(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn non_bearer_header_is_unauthorized() {
        std::env::set_var("JWT_SECRET", "test-secret");
        let err = authenticate(&headers_with("Token abc123")).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn tampered_token_is_invalid() {
        std::env::set_var("JWT_SECRET", "test-secret");
        let err = authenticate(&headers_with("Bearer not.a.token")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken));
    }

    #[test]
    fn valid_token_yields_auth_user() {
        std::env::set_var("JWT_SECRET", "test-secret");
        let id = Uuid::new_v4();
        let token = create_token(id, Role::Storekeeper).unwrap();
        let user = authenticate(&headers_with(&format!("Bearer {}", token))).unwrap();

        assert_eq!(user.id, id);
        assert_eq!(user.role, Role::Storekeeper);
    }

    #[test]
    fn wrong_role_is_forbidden() {
        std::env::set_var("JWT_SECRET", "test-secret");
        let token = create_token(Uuid::new_v4(), Role::Supplier).unwrap();
        let headers = headers_with(&format!("Bearer {}", token));

        let err = require_role(&headers, Role::Finance).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
        assert!(require_role(&headers, Role::Supplier).is_ok());
    }
}
