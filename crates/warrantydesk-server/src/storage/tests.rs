//! Storage layer tests for the Warrantydesk server.

use warrantydesk_core::{CaseStatus, DocumentType};
use warrantydesk_core::db::unix_timestamp;

use super::db::{Database, DatabaseError};
use super::queries::{DisabilityUpdate, NewRefreshToken, NewUser, ProfileUpdate};
use super::queries_cases::{NewComment, NewInvoice, NewVehicle};
use super::queries_documents::NewDocument;

async fn test_db() -> Database {
    Database::open_in_memory().await.unwrap()
}

fn ali(id: &'static str, national_code: &'static str, mobile: &'static str) -> NewUser<'static> {
    NewUser {
        id,
        first_name: "Ali",
        last_name: "Rezaei",
        national_code,
        mobile_number: mobile,
        password_hash: "hash123",
        date_of_birth: "1980-03-21",
    }
}

async fn db_with_user() -> Database {
    let db = test_db().await;
    db.create_user(&ali("u1", "1234567890", "09120000001"))
        .await
        .unwrap();
    db
}

async fn db_with_vehicle() -> Database {
    let db = db_with_user().await;
    db.create_vehicle(&NewVehicle {
        id: "v1",
        user_id: "u1",
        vin: "NAAM11CA0AK123456",
        model_name: "Samand",
        production_year: 2015,
        plate_number: Some("12B345-67"),
        color: None,
    })
    .await
    .unwrap();
    db
}

fn ledger_entry<'a>(id: &'a str, hash: &'a str, expires_at: i64) -> NewRefreshToken<'a> {
    NewRefreshToken {
        id,
        user_id: "u1",
        token_hash: hash,
        expires_at,
    }
}

// === User tests ===

#[tokio::test]
async fn create_and_get_user() {
    let db = db_with_user().await;

    let user = db.get_user("u1").await.unwrap();
    assert_eq!(user.national_code, "1234567890");
    assert_eq!(user.full_name(), "Ali Rezaei");
    assert_eq!(user.is_mobile_verified, 0);
    assert!(user.email.is_none());

    assert!(matches!(
        db.get_user("nope").await,
        Err(DatabaseError::NotFound(_))
    ));
}

#[tokio::test]
async fn get_user_by_national_code() {
    let db = db_with_user().await;

    let user = db.get_user_by_national_code("1234567890").await.unwrap();
    assert_eq!(user.unwrap().id, "u1");

    assert!(
        db.get_user_by_national_code("0000000000")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn duplicate_national_code_or_mobile_is_conflict() {
    let db = db_with_user().await;

    let same_code = db.create_user(&ali("u2", "1234567890", "09120000002")).await;
    assert!(matches!(same_code, Err(DatabaseError::Conflict(_))));

    let same_mobile = db.create_user(&ali("u3", "1111111111", "09120000001")).await;
    assert!(matches!(same_mobile, Err(DatabaseError::Conflict(_))));
}

#[tokio::test]
async fn update_user_profile() {
    let db = db_with_user().await;

    let updated = db
        .update_user_profile(
            "u1",
            &ProfileUpdate {
                first_name: "Reza",
                last_name: "Karimi",
                email: Some("reza@example.com"),
                address: None,
                postal_code: Some("1234567890"),
            },
        )
        .await
        .unwrap();
    assert!(updated);

    let user = db.get_user("u1").await.unwrap();
    assert_eq!(user.full_name(), "Reza Karimi");
    assert_eq!(user.email.as_deref(), Some("reza@example.com"));
    assert_eq!(user.national_code, "1234567890");

    let missing = db
        .update_user_profile(
            "nope",
            &ProfileUpdate {
                first_name: "a",
                last_name: "b",
                email: None,
                address: None,
                postal_code: None,
            },
        )
        .await
        .unwrap();
    assert!(!missing);
}

// === Disability record tests ===

#[tokio::test]
async fn disability_info_absent_until_set() {
    let db = db_with_user().await;
    assert!(db.get_disability_info("u1").await.unwrap().is_none());
}

#[tokio::test]
async fn disability_info_is_one_per_user() {
    let db = db_with_user().await;

    let first = db
        .upsert_disability_info(
            "d1",
            "u1",
            &DisabilityUpdate {
                disability_percentage: 25,
                case_number: Some("J-1001"),
                certificate_issue_date: Some("2010-05-01"),
            },
        )
        .await
        .unwrap();
    let second = db
        .upsert_disability_info(
            "d2",
            "u1",
            &DisabilityUpdate {
                disability_percentage: 40,
                case_number: None,
                certificate_issue_date: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.disability_percentage, 40);
    assert!(second.case_number.is_none());

    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM disability_infos WHERE user_id = 'u1'")
            .fetch_one(db.pool())
            .await
            .unwrap();
    assert_eq!(count, 1);

    let now = unix_timestamp();
    let direct = sqlx::query(
        "INSERT INTO disability_infos (id, user_id, disability_percentage, created_at, updated_at) VALUES ('d3', 'u1', 10, ?, ?)",
    )
    .bind(now)
    .bind(now)
    .execute(db.pool())
    .await
    .map_err(DatabaseError::from);
    assert!(matches!(direct, Err(DatabaseError::Conflict(_))));
}

#[tokio::test]
async fn disability_percentage_is_range_checked() {
    let db = db_with_user().await;
    let result = db
        .upsert_disability_info(
            "d1",
            "u1",
            &DisabilityUpdate {
                disability_percentage: 101,
                case_number: None,
                certificate_issue_date: None,
            },
        )
        .await;
    assert!(result.is_err());
    assert!(db.get_disability_info("u1").await.unwrap().is_none());
}

// === Refresh-token ledger tests ===

#[tokio::test]
async fn create_and_find_refresh_token() {
    let db = db_with_user().await;
    let expires_at = unix_timestamp() + 3600;

    let token = db
        .create_refresh_token(&ledger_entry("t1", "hash-1", expires_at))
        .await
        .unwrap();
    assert_eq!(token.user_id, "u1");
    assert!(!token.is_revoked());

    let found = db.find_active_refresh_token("hash-1", "u1").await.unwrap();
    assert_eq!(found.unwrap().id, "t1");
}

#[tokio::test]
async fn find_active_requires_matching_owner() {
    let db = db_with_user().await;
    db.create_user(&ali("u2", "2222222222", "09120000002"))
        .await
        .unwrap();
    db.create_refresh_token(&ledger_entry("t1", "hash-1", unix_timestamp() + 3600))
        .await
        .unwrap();

    assert!(
        db.find_active_refresh_token("hash-1", "u2")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn find_active_does_not_filter_expiry() {
    let db = db_with_user().await;
    db.create_refresh_token(&ledger_entry("t1", "hash-1", unix_timestamp() - 10))
        .await
        .unwrap();

    let found = db
        .find_active_refresh_token("hash-1", "u1")
        .await
        .unwrap()
        .unwrap();
    assert!(found.is_expired_at(unix_timestamp()));
}

#[tokio::test]
async fn expiry_is_strict() {
    let db = db_with_user().await;
    let token = db
        .create_refresh_token(&ledger_entry("t1", "hash-1", 1_000))
        .await
        .unwrap();

    assert!(!token.is_expired_at(999));
    assert!(token.is_expired_at(1_000));
    assert!(token.is_expired_at(1_001));
}

#[tokio::test]
async fn revoke_refresh_token_is_one_way() {
    let db = db_with_user().await;
    db.create_refresh_token(&ledger_entry("t1", "hash-1", unix_timestamp() + 3600))
        .await
        .unwrap();

    assert!(db.revoke_refresh_token("t1").await.unwrap());
    assert!(!db.revoke_refresh_token("t1").await.unwrap());

    assert!(db.get_refresh_token("t1").await.unwrap().is_revoked());
    assert!(
        db.find_active_refresh_token("hash-1", "u1")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn rotate_revokes_old_and_inserts_successor() {
    let db = db_with_user().await;
    let expires_at = unix_timestamp() + 3600;
    db.create_refresh_token(&ledger_entry("t1", "hash-1", expires_at))
        .await
        .unwrap();

    let rotated = db
        .rotate_refresh_token("t1", &ledger_entry("t2", "hash-2", expires_at))
        .await
        .unwrap();
    assert!(rotated);

    assert!(db.get_refresh_token("t1").await.unwrap().is_revoked());
    let successor = db.get_refresh_token("t2").await.unwrap();
    assert!(!successor.is_revoked());
    assert_eq!(successor.token_hash, "hash-2");
}

#[tokio::test]
async fn rotating_a_revoked_entry_writes_nothing() {
    let db = db_with_user().await;
    let expires_at = unix_timestamp() + 3600;
    db.create_refresh_token(&ledger_entry("t1", "hash-1", expires_at))
        .await
        .unwrap();

    assert!(
        db.rotate_refresh_token("t1", &ledger_entry("t2", "hash-2", expires_at))
            .await
            .unwrap()
    );
    // Second rotation of the same predecessor loses.
    assert!(
        !db.rotate_refresh_token("t1", &ledger_entry("t3", "hash-3", expires_at))
            .await
            .unwrap()
    );

    assert!(matches!(
        db.get_refresh_token("t3").await,
        Err(DatabaseError::NotFound(_))
    ));
}

// === Vehicle tests ===

#[tokio::test]
async fn create_vehicle_starts_submitted() {
    let db = db_with_vehicle().await;

    let vehicle = db.get_vehicle("v1").await.unwrap();
    assert_eq!(vehicle.user_id, "u1");
    assert_eq!(vehicle.case_status().unwrap(), CaseStatus::Submitted);
    assert_eq!(vehicle.plate_number.as_deref(), Some("12B345-67"));
    assert!(vehicle.color.is_none());
}

#[tokio::test]
async fn list_vehicles_is_scoped_to_owner() {
    let db = db_with_vehicle().await;
    db.create_user(&ali("u2", "2222222222", "09120000002"))
        .await
        .unwrap();

    assert_eq!(db.list_vehicles("u1").await.unwrap().len(), 1);
    assert!(db.list_vehicles("u2").await.unwrap().is_empty());
}

#[tokio::test]
async fn list_vehicles_newest_first() {
    let db = db_with_vehicle().await;
    db.create_vehicle(&NewVehicle {
        id: "v2",
        user_id: "u1",
        vin: "NAAM11CA0AK654321",
        model_name: "Dena",
        production_year: 2018,
        plate_number: None,
        color: Some("White"),
    })
    .await
    .unwrap();

    let ids: Vec<String> = db
        .list_vehicles("u1")
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.id)
        .collect();
    assert_eq!(ids, vec!["v2", "v1"]);
}

#[tokio::test]
async fn transition_follows_the_lifecycle() {
    let db = db_with_vehicle().await;

    assert!(
        db.transition_vehicle_status("v1", CaseStatus::Submitted, CaseStatus::AwaitingDocuments)
            .await
            .unwrap()
    );
    assert_eq!(
        db.get_vehicle("v1").await.unwrap().status,
        "AwaitingDocuments"
    );

    // Skipping ahead is refused without a write.
    assert!(
        !db.transition_vehicle_status("v1", CaseStatus::AwaitingDocuments, CaseStatus::Completed)
            .await
            .unwrap()
    );
    assert_eq!(
        db.get_vehicle("v1").await.unwrap().status,
        "AwaitingDocuments"
    );
}

#[tokio::test]
async fn transition_from_stale_status_writes_nothing() {
    let db = db_with_vehicle().await;

    assert!(
        !db.transition_vehicle_status("v1", CaseStatus::AwaitingDocuments, CaseStatus::UnderReview)
            .await
            .unwrap()
    );
    assert_eq!(db.get_vehicle("v1").await.unwrap().status, "Submitted");
    assert!(
        !db.transition_vehicle_status("nope", CaseStatus::Submitted, CaseStatus::Rejected)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn terminal_case_cannot_move() {
    let db = db_with_vehicle().await;
    assert!(
        db.transition_vehicle_status("v1", CaseStatus::Submitted, CaseStatus::Rejected)
            .await
            .unwrap()
    );

    for next in CaseStatus::ALL {
        assert!(
            !db.transition_vehicle_status("v1", CaseStatus::Rejected, next)
                .await
                .unwrap()
        );
    }
    assert_eq!(db.get_vehicle("v1").await.unwrap().status, "Rejected");
}

// === Payment invoice tests ===

fn invoice(id: &str) -> NewInvoice<'_> {
    NewInvoice {
        id,
        vehicle_id: "v1",
        amount: 500_000,
    }
}

#[tokio::test]
async fn open_payment_request_moves_vehicle_to_awaiting_payment() {
    let db = db_with_vehicle().await;

    let invoice = db
        .open_payment_request(&invoice("i1"), CaseStatus::Submitted)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(invoice.amount, 500_000);
    assert!(!invoice.is_paid());
    assert!(invoice.paid_at.is_none());
    assert_eq!(
        db.get_vehicle("v1").await.unwrap().case_status().unwrap(),
        CaseStatus::AwaitingPayment
    );
}

#[tokio::test]
async fn open_payment_request_for_missing_vehicle_writes_nothing() {
    let db = db_with_user().await;

    let opened = db
        .open_payment_request(
            &NewInvoice {
                id: "i1",
                vehicle_id: "ghost",
                amount: 500_000,
            },
            CaseStatus::Submitted,
        )
        .await
        .unwrap();
    assert!(opened.is_none());
    assert!(matches!(
        db.get_invoice("i1").await,
        Err(DatabaseError::NotFound(_))
    ));
}

#[tokio::test]
async fn open_payment_request_from_stale_status_writes_nothing() {
    let db = db_with_vehicle().await;

    let opened = db
        .open_payment_request(&invoice("i1"), CaseStatus::UnderReview)
        .await
        .unwrap();
    assert!(opened.is_none());
    assert!(db.list_invoices("v1").await.unwrap().is_empty());
    assert_eq!(db.get_vehicle("v1").await.unwrap().status, "Submitted");
}

#[tokio::test]
async fn open_payment_request_on_closed_case_writes_nothing() {
    let db = db_with_vehicle().await;
    db.transition_vehicle_status("v1", CaseStatus::Submitted, CaseStatus::Rejected)
        .await
        .unwrap();

    let opened = db
        .open_payment_request(&invoice("i1"), CaseStatus::Rejected)
        .await
        .unwrap();
    assert!(opened.is_none());
    assert!(db.list_invoices("v1").await.unwrap().is_empty());
}

#[tokio::test]
async fn settle_invoice_marks_paid_and_completes_case() {
    let db = db_with_vehicle().await;
    db.open_payment_request(&invoice("i1"), CaseStatus::Submitted)
        .await
        .unwrap();

    assert!(db.settle_invoice("i1", Some("TRACE-1")).await.unwrap());

    let invoice = db.get_invoice("i1").await.unwrap();
    assert!(invoice.is_paid());
    assert!(invoice.paid_at.is_some());
    assert_eq!(invoice.gateway_trace_id.as_deref(), Some("TRACE-1"));
    assert_eq!(
        db.get_vehicle("v1").await.unwrap().case_status().unwrap(),
        CaseStatus::Completed
    );
}

#[tokio::test]
async fn settle_invoice_twice_is_a_noop() {
    let db = db_with_vehicle().await;
    db.open_payment_request(&invoice("i1"), CaseStatus::Submitted)
        .await
        .unwrap();

    assert!(db.settle_invoice("i1", Some("TRACE-1")).await.unwrap());
    let first = db.get_invoice("i1").await.unwrap();

    assert!(!db.settle_invoice("i1", Some("TRACE-2")).await.unwrap());
    let second = db.get_invoice("i1").await.unwrap();
    assert_eq!(second.gateway_trace_id.as_deref(), Some("TRACE-1"));
    assert_eq!(second.paid_at, first.paid_at);

    assert!(!db.settle_invoice("missing", None).await.unwrap());
}

#[tokio::test]
async fn list_invoices_oldest_first() {
    let db = db_with_vehicle().await;
    db.open_payment_request(&invoice("i1"), CaseStatus::Submitted)
        .await
        .unwrap()
        .unwrap();
    db.open_payment_request(&invoice("i2"), CaseStatus::AwaitingPayment)
        .await
        .unwrap()
        .unwrap();

    let ids: Vec<String> = db
        .list_invoices("v1")
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(ids, vec!["i1", "i2"]);
}

// === Comment tests ===

#[tokio::test]
async fn comments_are_chronological() {
    let db = db_with_vehicle().await;

    db.create_comment(&NewComment {
        id: "c1",
        vehicle_id: "v1",
        author_id: Some("u1"),
        content: "Documents uploaded",
        is_from_company: false,
    })
    .await
    .unwrap();
    let reply = db
        .create_comment(&NewComment {
            id: "c2",
            vehicle_id: "v1",
            author_id: None,
            content: "Received, under review",
            is_from_company: true,
        })
        .await
        .unwrap();
    assert!(reply.is_from_company());
    assert!(reply.author_id.is_none());

    let comments = db.list_comments("v1").await.unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].id, "c1");
    assert!(!comments[0].is_from_company());
    assert_eq!(comments[1].id, "c2");
}

// === Document tests ===

fn scan<'a>(id: &'a str, file_name: &'a str, kind: DocumentType) -> NewDocument<'a> {
    NewDocument {
        id,
        vehicle_id: "v1",
        file_name,
        stored_file_name: "stored.pdf",
        file_path: "uploads/v1/stored.pdf",
        file_size: 1024,
        content_type: "application/pdf",
        document_type: kind,
    }
}

#[tokio::test]
async fn documents_are_listed_in_upload_order() {
    let db = db_with_vehicle().await;

    let card = db
        .create_document(&scan("d1", "card.pdf", DocumentType::DisabilityCard))
        .await
        .unwrap();
    assert_eq!(card.kind().unwrap(), DocumentType::DisabilityCard);
    assert_eq!(card.file_size, 1024);

    db.create_document(&scan("d2", "contract.pdf", DocumentType::Contract))
        .await
        .unwrap();

    let names: Vec<String> = db
        .list_documents("v1")
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.file_name)
        .collect();
    assert_eq!(names, vec!["card.pdf", "contract.pdf"]);
    assert!(db.list_documents("v2").await.unwrap().is_empty());
}

#[tokio::test]
async fn document_for_missing_vehicle_is_rejected() {
    let db = db_with_user().await;
    let mut doc = scan("d1", "card.pdf", DocumentType::Other);
    doc.vehicle_id = "ghost";

    assert!(db.create_document(&doc).await.is_err());
}
