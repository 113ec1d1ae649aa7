//! Mapper against a live PostgreSQL.
//!
//! Every test here is `#[ignore]`d, so a plain `cargo test` skips row decoding
//! and the `Vec<Box<_>>`/`Vec<Arc<_>>` fills entirely. Run them with
//! `DATABASE_URL=postgres://... cargo test --test mapper_pg -- --ignored`.
//! The disconnected paths are covered by the unit tests in `src/mapper`.

use resource_sdk::mapper::{Mapper, Record};
use resource_sdk::store::{connect, ensure_token_table};
use resource_sdk::{impl_record, AccessTokenEntry, MapperError, Selector, TokenStore};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Debug, Default, PartialEq)]
struct Item {
    id: i64,
    status: Option<String>,
    region: Option<String>,
}

impl_record!(Item { id, status, region => "region_code" });

async fn mapper_with_table(table: &str) -> Mapper {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for ignored tests");
    let pool = connect(&url, 2).await.unwrap();
    sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(&format!(
        "CREATE TABLE {} (id BIGINT PRIMARY KEY, status TEXT, region_code TEXT)",
        table
    ))
    .execute(&pool)
    .await
    .unwrap();
    Mapper::new(pool)
}

async fn seed(mapper: &Mapper, table: &str) {
    for (id, status) in [(1, "active"), (2, "closed")] {
        let item = Item {
            id,
            status: Some(status.into()),
            region: None,
        };
        assert_eq!(mapper.create(table, &item).await.unwrap(), 1);
    }
}

#[tokio::test]
#[ignore]
async fn find_many_filters_by_selector() {
    let table = "mapper_items_find";
    let mapper = mapper_with_table(table).await;
    seed(&mapper, table).await;

    let mut items: Vec<Item> = vec![Item::default(); 3];
    let n = mapper
        .find_many(&mut items, table, &[Selector::eq("status", "active")])
        .await
        .unwrap();
    assert_eq!(n, 1);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, 1);
    assert_eq!(items[0].region, None);

    let mut boxed: Vec<Box<Item>> = Vec::new();
    mapper
        .find_many(&mut boxed, table, &[Selector::null("region_code", "IS")])
        .await
        .unwrap();
    assert_eq!(boxed.len(), 2);

    let mut limited: Vec<Arc<Item>> = Vec::new();
    mapper.find_many_limited(&mut limited, table, &[], Some(1)).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
#[ignore]
async fn empty_result_is_not_an_error_but_get_is_not_found() {
    let table = "mapper_items_empty";
    let mapper = mapper_with_table(table).await;
    seed(&mapper, table).await;
    let nothing = [Selector::eq("status", "archived")];

    let mut items: Vec<Item> = vec![Item::default()];
    assert_eq!(mapper.find_many(&mut items, table, &nothing).await.unwrap(), 0);
    assert!(items.is_empty());

    let mut one = Item {
        id: 99,
        ..Item::default()
    };
    assert!(!mapper.find_one(&mut one, table, &nothing).await.unwrap());
    assert_eq!(one.id, 99);

    let err = mapper.get(&mut one, table, &nothing).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(!mapper.exists(table, &nothing).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn find_one_takes_a_single_row_of_many() {
    let table = "mapper_items_one";
    let mapper = mapper_with_table(table).await;
    seed(&mapper, table).await;

    let mut one = Item::default();
    assert!(mapper.find_one(&mut one, table, &[]).await.unwrap());
    assert!(one.id == 1 || one.id == 2);
    assert!(one.status.is_some());
}

#[tokio::test]
#[ignore]
async fn update_and_delete_report_affected_rows() {
    let table = "mapper_items_write";
    let mapper = mapper_with_table(table).await;
    seed(&mapper, table).await;

    let changed = Item {
        id: 2,
        status: Some("active".into()),
        region: Some("north".into()),
    };
    let key = [Selector::eq("id", 2i64)];
    assert_eq!(mapper.update(table, &changed, &key).await.unwrap(), 1);

    let mut fetched = Item::default();
    mapper.get(&mut fetched, table, &key).await.unwrap();
    assert_eq!(fetched, changed);

    assert!(mapper.exists(table, &[Selector::eq("region_code", "north")]).await.unwrap());
    assert_eq!(mapper.delete(table, &[Selector::eq("status", "active")]).await.unwrap(), 2);
    assert!(!mapper.exists(table, &[]).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn duplicate_key_surfaces_query_error() {
    let table = "mapper_items_dup";
    let mapper = mapper_with_table(table).await;
    seed(&mapper, table).await;
    let err = mapper.create(table, &Item { id: 1, ..Item::default() }).await.unwrap_err();
    assert!(matches!(err, MapperError::Query { operation: "insert", .. }));
}

#[tokio::test]
#[ignore]
async fn persisted_tokens_load_into_store() {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for ignored tests");
    let pool = connect(&url, 2).await.unwrap();
    let table = "mapper_access_tokens";
    sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
        .execute(&pool)
        .await
        .unwrap();
    ensure_token_table(&pool, table).await.unwrap();
    let mapper = Mapper::new(pool);

    let writer = TokenStore::new();
    let mut entry = AccessTokenEntry::new(Uuid::new_v4(), "persisted-key", "operator");
    entry.comment = "from table".into();
    writer.persist(&mapper, table, entry.clone()).await.unwrap();

    let reader = TokenStore::new();
    assert_eq!(reader.load_persisted(&mapper, table).await.unwrap(), 1);
    let found = reader.lookup("persisted-key").unwrap();
    assert_eq!(found, entry);
    assert_eq!(resource_sdk::tokens::StoredToken::schema().columns().len(), 5);
}
