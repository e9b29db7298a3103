//! Tests for `AuthService`.

use std::sync::Arc;

use chrono::NaiveDate;
use warrantydesk_core::db::unix_timestamp;

use super::auth_svc::{AuthService, Registration};
use super::error::ServiceError;
use crate::auth::jwt::JwtManager;
use crate::config::JwtSettings;
use crate::storage::{Database, NewRefreshToken};

const KEY: &[u8] = b"test-secret-key-for-testing-only-32b";
const NATIONAL_CODE: &str = "1234567890";
const PASSWORD: &str = "secret-123";

fn settings() -> JwtSettings {
    JwtSettings::new("warrantydesk", "warrantydesk-app", KEY).unwrap()
}

async fn setup() -> (AuthService, Database, Arc<JwtManager>) {
    setup_with(settings()).await
}

async fn setup_with(settings: JwtSettings) -> (AuthService, Database, Arc<JwtManager>) {
    let db = Database::open_in_memory().await.unwrap();
    let jwt = Arc::new(JwtManager::new(&settings));
    let svc = AuthService::new(db.clone(), Arc::clone(&jwt));
    (svc, db, jwt)
}

/// Standard registration used by most tests.
fn ali() -> Registration {
    Registration {
        first_name: "Ali".into(),
        last_name: "Rezaei".into(),
        national_code: NATIONAL_CODE.into(),
        mobile_number: "09120000001".into(),
        password: PASSWORD.into(),
        date_of_birth: NaiveDate::from_ymd_opt(1980, 3, 21).unwrap(),
    }
}

// === Register ===

#[tokio::test]
async fn register_creates_user_with_hashed_password() {
    let (svc, db, _jwt) = setup().await;

    let user = svc.register(&ali()).await.unwrap();
    assert_eq!(user.national_code, NATIONAL_CODE);
    assert_eq!(user.date_of_birth, "1980-03-21");
    assert_ne!(user.password_hash, PASSWORD);
    assert!(uuid::Uuid::parse_str(&user.id).is_ok());

    let stored = db.get_user_by_national_code(NATIONAL_CODE).await.unwrap();
    assert_eq!(stored.unwrap().id, user.id);
}

#[tokio::test]
async fn register_duplicate_national_code_conflicts() {
    let (svc, _db, _jwt) = setup().await;
    svc.register(&ali()).await.unwrap();

    let mut again = ali();
    again.mobile_number = "09120000002".into();
    let err = svc.register(&again).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn register_duplicate_mobile_conflicts() {
    let (svc, _db, _jwt) = setup().await;
    svc.register(&ali()).await.unwrap();

    let mut other = ali();
    other.national_code = "0987654321".into();
    let err = svc.register(&other).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn register_validates_fields() {
    let (svc, _db, _jwt) = setup().await;

    let cases: [fn(&mut Registration); 4] = [
        |r| r.first_name = " ".into(),
        |r| r.national_code = "123".into(),
        |r| r.mobile_number = "0912".into(),
        |r| r.password = "short".into(),
    ];
    for mutate in cases {
        let mut reg = ali();
        mutate(&mut reg);
        let err = svc.register(&reg).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");
    }
}

// === Login ===

#[tokio::test]
async fn login_issues_pair_and_records_ledger_entry() {
    let (svc, db, jwt) = setup().await;
    let user = svc.register(&ali()).await.unwrap();

    let before = unix_timestamp();
    let tokens = svc.login(NATIONAL_CODE, PASSWORD).await.unwrap();

    let claims = jwt.validate(&tokens.access_token).unwrap();
    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.name, "Ali Rezaei");
    assert!(tokens.access_expires_at >= before + 900);
    assert!(tokens.access_expires_at <= unix_timestamp() + 900);

    let hash = JwtManager::hash_token(&tokens.refresh_token);
    let entry = db
        .find_active_refresh_token(&hash, &user.id)
        .await
        .unwrap()
        .unwrap();
    assert!(entry.expires_at >= before + 604_800);
    assert!(!entry.is_revoked());
}

#[tokio::test]
async fn each_login_gets_a_distinct_refresh_token() {
    let (svc, _db, _jwt) = setup().await;
    svc.register(&ali()).await.unwrap();

    let first = svc.login(NATIONAL_CODE, PASSWORD).await.unwrap();
    let second = svc.login(NATIONAL_CODE, PASSWORD).await.unwrap();
    assert_ne!(first.refresh_token, second.refresh_token);
    assert_ne!(first.access_token, second.access_token);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let (svc, _db, _jwt) = setup().await;
    svc.register(&ali()).await.unwrap();

    let wrong_password = svc.login(NATIONAL_CODE, "wrong-password").await.unwrap_err();
    let unknown_user = svc.login("0000000000", PASSWORD).await.unwrap_err();

    assert!(matches!(wrong_password, ServiceError::InvalidCredentials));
    assert!(matches!(unknown_user, ServiceError::InvalidCredentials));
    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
}

// === Refresh ===

#[tokio::test]
async fn refresh_rotates_the_pair() {
    let (svc, _db, jwt) = setup().await;
    let user = svc.register(&ali()).await.unwrap();
    let login = svc.login(NATIONAL_CODE, PASSWORD).await.unwrap();

    let refreshed = svc
        .refresh(&login.access_token, &login.refresh_token)
        .await
        .unwrap();

    assert_ne!(refreshed.refresh_token, login.refresh_token);
    assert_eq!(jwt.validate(&refreshed.access_token).unwrap().sub, user.id);
}

#[tokio::test]
async fn reusing_a_rotated_refresh_token_fails() {
    let (svc, _db, _jwt) = setup().await;
    svc.register(&ali()).await.unwrap();
    let login = svc.login(NATIONAL_CODE, PASSWORD).await.unwrap();

    svc.refresh(&login.access_token, &login.refresh_token)
        .await
        .unwrap();
    let err = svc
        .refresh(&login.access_token, &login.refresh_token)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InvalidRefreshToken));
    assert_eq!(err.to_string(), "Invalid Refresh Token");
}

#[tokio::test]
async fn successor_refresh_token_can_be_rotated_again() {
    let (svc, _db, _jwt) = setup().await;
    svc.register(&ali()).await.unwrap();
    let login = svc.login(NATIONAL_CODE, PASSWORD).await.unwrap();

    let second = svc
        .refresh(&login.access_token, &login.refresh_token)
        .await
        .unwrap();
    let third = svc
        .refresh(&second.access_token, &second.refresh_token)
        .await
        .unwrap();
    assert_ne!(third.refresh_token, second.refresh_token);
}

#[tokio::test]
async fn refresh_accepts_an_expired_access_token() {
    let (svc, _db, jwt) = setup_with(settings().with_ttls(-60, 604_800)).await;
    svc.register(&ali()).await.unwrap();
    let login = svc.login(NATIONAL_CODE, PASSWORD).await.unwrap();

    assert!(jwt.validate(&login.access_token).is_err());
    assert!(
        svc.refresh(&login.access_token, &login.refresh_token)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn refresh_with_expired_refresh_token_fails() {
    let (svc, db, jwt) = setup().await;
    let user = svc.register(&ali()).await.unwrap();

    let (access_token, _) = jwt.issue_access_token(&user.id, "Ali Rezaei").unwrap();
    let refresh_token = "expired-refresh-token";
    db.create_refresh_token(&NewRefreshToken {
        id: "t-expired",
        user_id: &user.id,
        token_hash: &JwtManager::hash_token(refresh_token),
        expires_at: unix_timestamp() - 1,
    })
    .await
    .unwrap();

    let err = svc.refresh(&access_token, refresh_token).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidRefreshToken));
    assert!(!db.get_refresh_token("t-expired").await.unwrap().is_revoked());
}

#[tokio::test]
async fn refresh_with_unknown_refresh_token_fails() {
    let (svc, _db, _jwt) = setup().await;
    svc.register(&ali()).await.unwrap();
    let login = svc.login(NATIONAL_CODE, PASSWORD).await.unwrap();

    let err = svc
        .refresh(&login.access_token, "never-issued")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidRefreshToken));
}

#[tokio::test]
async fn refresh_token_is_bound_to_its_owner() {
    let (svc, _db, _jwt) = setup().await;
    svc.register(&ali()).await.unwrap();
    let mut sara = ali();
    sara.first_name = "Sara".into();
    sara.national_code = "2222222222".into();
    sara.mobile_number = "09120000002".into();
    svc.register(&sara).await.unwrap();

    let ali_login = svc.login(NATIONAL_CODE, PASSWORD).await.unwrap();
    let sara_login = svc.login("2222222222", PASSWORD).await.unwrap();

    let err = svc
        .refresh(&sara_login.access_token, &ali_login.refresh_token)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidRefreshToken));
}

#[tokio::test]
async fn refresh_with_forged_access_token_fails() {
    let (svc, _db, jwt) = setup().await;
    svc.register(&ali()).await.unwrap();
    let login = svc.login(NATIONAL_CODE, PASSWORD).await.unwrap();

    let other_key = JwtSettings::new("warrantydesk", "warrantydesk-app", &[9u8; 32]).unwrap();
    let forger = JwtManager::new(&other_key);
    let user_id = jwt.validate(&login.access_token).unwrap().sub;
    let (forged, _) = forger.issue_access_token(&user_id, "Ali Rezaei").unwrap();

    let err = svc.refresh(&forged, &login.refresh_token).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidToken));
    assert_eq!(err.to_string(), "Invalid Token");

    let garbage = svc.refresh("garbage", &login.refresh_token).await.unwrap_err();
    assert!(matches!(garbage, ServiceError::InvalidToken));
}

#[tokio::test]
async fn refresh_with_non_uuid_subject_fails() {
    let (svc, _db, jwt) = setup().await;
    let (token, _) = jwt.issue_access_token("not-a-uuid", "Ali Rezaei").unwrap();

    let err = svc.refresh(&token, "anything").await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidToken));
}

// === End to end ===

#[tokio::test]
async fn register_login_refresh_scenario() {
    let (svc, _db, jwt) = setup_with(settings().with_ttls(-1, 604_800)).await;

    let user = svc.register(&ali()).await.unwrap();
    let login = svc.login(NATIONAL_CODE, PASSWORD).await.unwrap();
    assert!(jwt.validate_ignoring_expiry(&login.access_token).is_ok());
    assert!(login.refresh_expires_at - login.access_expires_at > 604_000);

    let refreshed = svc
        .refresh(&login.access_token, &login.refresh_token)
        .await
        .unwrap();
    let claims = jwt.validate_ignoring_expiry(&refreshed.access_token).unwrap();
    assert_eq!(claims.sub, user.id);

    let reuse = svc
        .refresh(&login.access_token, &login.refresh_token)
        .await
        .unwrap_err();
    assert!(matches!(reuse, ServiceError::InvalidRefreshToken));
}
