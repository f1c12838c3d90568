//! Bearer token issuing and verification across independently built keys.

#![allow(clippy::unwrap_used)]

use secrecy::SecretString;

use gallery_core::{Role, UserId};
use gallery_server::services::auth::{CredentialError, TokenKeys};
use gallery_integration_tests::TEST_SECRET;

fn keys() -> TokenKeys {
    TokenKeys::new(&SecretString::from(TEST_SECRET), 1)
}

#[test]
fn test_token_from_one_instance_verifies_on_another() {
    let token = keys().issue(UserId::new(5), Role::Admin).unwrap();

    let identity = keys().verify(Some(&format!("Bearer {token}"))).unwrap();
    assert_eq!(identity.user_id, UserId::new(5));
    assert!(identity.is_admin());
}

#[test]
fn test_bare_token_is_accepted() {
    let token = keys().issue(UserId::new(6), Role::User).unwrap();

    let identity = keys().verify(Some(&token)).unwrap();
    assert_eq!(identity.role, Role::User);
}

#[test]
fn test_fixed_admin_string_is_not_a_credential() {
    let result = keys().verify(Some("Bearer admin-token"));
    assert!(matches!(result, Err(CredentialError::InvalidOrExpired)));
}

#[test]
fn test_token_signed_with_other_secret_is_rejected() {
    let other = TokenKeys::new(&SecretString::from("Qw3!rT9#uI5$oP1&aS7*dF2^gH8@jK4"), 1);
    let token = other.issue(UserId::new(5), Role::Admin).unwrap();

    assert!(matches!(
        keys().verify(Some(&token)),
        Err(CredentialError::InvalidOrExpired)
    ));
}

#[test]
fn test_expired_token_is_rejected() {
    let expired = TokenKeys::new(&SecretString::from(TEST_SECRET), -1);
    let token = expired.issue(UserId::new(5), Role::User).unwrap();

    assert!(matches!(
        keys().verify(Some(&token)),
        Err(CredentialError::InvalidOrExpired)
    ));
}

#[test]
fn test_missing_and_empty_headers() {
    assert!(matches!(
        keys().verify(None),
        Err(CredentialError::Unauthenticated)
    ));
    assert!(matches!(
        keys().verify(Some("Bearer   ")),
        Err(CredentialError::Malformed)
    ));
}
