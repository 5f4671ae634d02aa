use mailscout_core::error::AppError;
use mailscout_core::models::UpsertOutcome;
use mailscout_core::traits::{AddressBook, AddressBookFactory};

use crate::integration::common::{record, setup_test_db};

#[tokio::test]
async fn insert_and_list() {
    let (db, _dir) = setup_test_db();
    let book = db.open().await.unwrap();
    book.ensure_schema().await.unwrap();

    let outcome = book
        .upsert(&record("bakery1", "hello@bakery1.com"))
        .await
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::Inserted);

    let rows = book.list(10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].business_name, "bakery1");
    assert_eq!(rows[0].business_address, "1 Main St, bakery1");
    assert_eq!(rows[0].business_website, "bakery1.com");
    assert_eq!(rows[0].email_address, "hello@bakery1.com");
    assert!(!rows[0].email_sent);

    book.close().await.unwrap();
}

#[tokio::test]
async fn duplicate_pair_is_ignored() {
    let (db, _dir) = setup_test_db();
    let book = db.open().await.unwrap();
    book.ensure_schema().await.unwrap();

    let first = book.upsert(&record("bakery1", "hello@bakery1.com")).await;
    let second = book.upsert(&record("bakery1", "hello@bakery1.com")).await;

    assert_eq!(first.unwrap(), UpsertOutcome::Inserted);
    assert_eq!(second.unwrap(), UpsertOutcome::Ignored);
    assert_eq!(book.count().await.unwrap(), 1);
}

#[tokio::test]
async fn same_business_keeps_distinct_emails() {
    let (db, _dir) = setup_test_db();
    let book = db.open().await.unwrap();
    book.ensure_schema().await.unwrap();

    book.upsert(&record("bakery1", "hello@bakery1.com"))
        .await
        .unwrap();
    book.upsert(&record("bakery1", "orders@bakery1.com"))
        .await
        .unwrap();
    book.upsert(&record("bakery2", "hello@bakery1.com"))
        .await
        .unwrap();

    assert_eq!(book.count().await.unwrap(), 3);
}

#[tokio::test]
async fn invalid_email_is_rejected_before_insert() {
    let (db, _dir) = setup_test_db();
    let book = db.open().await.unwrap();
    book.ensure_schema().await.unwrap();

    let err = book
        .upsert(&record("bakery1", "not-an-email"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidRecord(_)));
    assert_eq!(book.count().await.unwrap(), 0);
}

#[tokio::test]
async fn ensure_schema_is_idempotent() {
    let (db, _dir) = setup_test_db();
    let book = db.open().await.unwrap();

    book.ensure_schema().await.unwrap();
    book.upsert(&record("bakery1", "hello@bakery1.com"))
        .await
        .unwrap();
    book.ensure_schema().await.unwrap();

    assert_eq!(book.count().await.unwrap(), 1);
}

#[tokio::test]
async fn list_is_newest_first_and_limited() {
    let (db, _dir) = setup_test_db();
    let book = db.open().await.unwrap();
    book.ensure_schema().await.unwrap();

    for i in 1..=3 {
        book.upsert(&record(&format!("shop{i}"), &format!("info@shop{i}.com")))
            .await
            .unwrap();
    }

    let rows = book.list(2).await.unwrap();
    let names: Vec<&str> = rows.iter().map(|r| r.business_name.as_str()).collect();
    assert_eq!(names, vec!["shop3", "shop2"]);
}

#[tokio::test]
async fn rows_survive_reopen() {
    let (db, _dir) = setup_test_db();

    let book = db.open().await.unwrap();
    book.ensure_schema().await.unwrap();
    book.upsert(&record("bakery1", "hello@bakery1.com"))
        .await
        .unwrap();
    book.close().await.unwrap();

    let book = db.open().await.unwrap();
    book.ensure_schema().await.unwrap();
    let outcome = book
        .upsert(&record("bakery1", "hello@bakery1.com"))
        .await
        .unwrap();

    assert_eq!(outcome, UpsertOutcome::Ignored);
    assert_eq!(book.count().await.unwrap(), 1);
}
