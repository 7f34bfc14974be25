use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::env;
use uuid::Uuid;
use chrono::{Duration, Utc};

/// Caller role carried in the token. Login and token issuance live in the
/// identity service; this crate only validates and reads the claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Storekeeper,
    Supplier,
    Finance,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // storekeeper / supplier / finance id
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(24); // Token expires in 24 hours

        Self {
            sub: user_id.to_string(),
            role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }

    pub fn subject_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

pub fn create_token(user_id: Uuid, role: Role) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims::new(user_id, role);
    let secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

pub fn verify_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_secret() {
        env::set_var("JWT_SECRET", "test-secret");
    }

    #[test]
    fn token_round_trip_preserves_claims() {
        set_secret();
        let id = Uuid::new_v4();
        let token = create_token(id, Role::Supplier).unwrap();
        let claims = verify_token(&token).unwrap();

        assert_eq!(claims.subject_id(), Some(id));
        assert_eq!(claims.role, Role::Supplier);
    }

    #[test]
    fn garbage_token_is_rejected() {
        set_secret();
        assert!(verify_token("not-a-jwt").is_err());
    }

    #[test]
    fn role_claim_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Storekeeper).unwrap();
        assert_eq!(json, "\"storekeeper\"");
        let back: Role = serde_json::from_str("\"finance\"").unwrap();
        assert_eq!(back, Role::Finance);
    }
}
