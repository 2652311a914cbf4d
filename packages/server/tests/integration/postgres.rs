//! The same lifecycle scenarios against the Postgres record store: JSON
//! search and sort in SQL, the partial unique indexes, and conditional
//! transitions under real transactions.

use std::sync::Arc;

use chrono::Utc;
use common::storage::memory::MemoryBlobStore;
use image::ImageFormat;
use reqwest::Method;
use serde_json::{Value, json};

use server::lifecycle::{Actor, LifecycleError, ListQuery, ResourceInput, ResourceLifecycle};
use server::media::MediaAttachmentManager;
use server::schema::{CATEGORY, ResourceSchema, SERVICE, TAG};
use server::store::{NewRecord, RecordStore, Scope, StoreError, unique_index_name};

use crate::common::{TestApp, admin_token, image_bytes, postgres_store, routes};

fn new_record(kind: &str, fields: Value) -> NewRecord {
    NewRecord {
        kind: kind.to_string(),
        fields: fields.as_object().cloned().unwrap(),
        media: Default::default(),
        actor: Some(1),
    }
}

async fn ids_of(store: &dyn RecordStore, schema: &ResourceSchema, query: ListQuery) -> Vec<i32> {
    let spec = query.resolve(schema, Scope::Active).unwrap();
    store
        .query(schema.kind, &spec)
        .await
        .unwrap()
        .items
        .iter()
        .map(|r| r.id)
        .collect()
}

mod store {
    use super::*;

    #[tokio::test]
    async fn transitions_only_apply_from_the_right_partition() {
        let store = postgres_store().await;
        let tag = store
            .insert(new_record("tag", json!({ "name": "Rust", "slug": "rust" })))
            .await
            .unwrap();

        assert!(!store.restore("tag", tag.id).await.unwrap());
        assert!(!store.hard_delete("tag", tag.id).await.unwrap());

        assert!(store.soft_delete("tag", tag.id, Utc::now()).await.unwrap());
        assert!(!store.soft_delete("tag", tag.id, Utc::now()).await.unwrap());
        assert!(store.find("tag", tag.id).await.unwrap().is_none());
        assert!(store.find_trashed("tag", tag.id).await.unwrap().is_some());
        assert_eq!(store.trashed_ids("tag").await.unwrap(), vec![tag.id]);

        // Another kind never sees the record.
        assert!(!store.hard_delete("category", tag.id).await.unwrap());

        assert!(store.hard_delete("tag", tag.id).await.unwrap());
        assert!(store.find_trashed("tag", tag.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unique_index_ignores_trashed_rows() {
        let store = postgres_store().await;
        let first = store
            .insert(new_record("category", json!({ "name": "Design", "slug": "design" })))
            .await
            .unwrap();

        let err = store
            .insert(new_record("category", json!({ "name": "DESIGN", "slug": "design-2" })))
            .await
            .unwrap_err();
        let StoreError::UniqueViolation(message) = err else {
            panic!("expected unique violation, got {err:?}");
        };
        assert!(message.contains(&unique_index_name("category", "name")), "{message}");

        assert!(store.soft_delete("category", first.id, Utc::now()).await.unwrap());
        store
            .insert(new_record("category", json!({ "name": "Design", "slug": "design" })))
            .await
            .unwrap();

        // Bringing the first one back would duplicate an Active value.
        assert!(matches!(
            store.restore("category", first.id).await,
            Err(StoreError::UniqueViolation(_))
        ));
    }

    #[tokio::test]
    async fn is_taken_is_case_insensitive_and_skips_trash() {
        let store = postgres_store().await;
        let tag = store
            .insert(new_record("tag", json!({ "name": "Rust", "slug": "rust" })))
            .await
            .unwrap();

        assert!(store.is_taken("tag", "name", "RUST", None).await.unwrap());
        assert!(!store.is_taken("tag", "name", "rust", Some(tag.id)).await.unwrap());
        assert!(!store.is_taken("category", "name", "rust", None).await.unwrap());

        store.soft_delete("tag", tag.id, Utc::now()).await.unwrap();
        assert!(!store.is_taken("tag", "name", "rust", None).await.unwrap());
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let store = postgres_store().await;
        let mut ids = Vec::new();
        for name in ["100% cotton", "1000 items", "under_score", "underscore"] {
            let record = store
                .insert(new_record("tag", json!({ "name": name })))
                .await
                .unwrap();
            ids.push(record.id);
        }
        let search = |term: &str| ListQuery {
            search: Some(term.to_string()),
            ..Default::default()
        };

        assert_eq!(ids_of(&store, &TAG, search("100%")).await, vec![ids[0]]);
        assert_eq!(ids_of(&store, &TAG, search("UNDER_")).await, vec![ids[2]]);
        assert_eq!(ids_of(&store, &TAG, search("score")).await, vec![ids[2], ids[3]]);
    }

    #[tokio::test]
    async fn numeric_fields_sort_by_value_with_id_tie_break() {
        let store = postgres_store().await;
        let mut ids = Vec::new();
        for (name, position) in [("a", 10), ("b", 9), ("c", 10), ("d", 100)] {
            let record = store
                .insert(new_record(
                    "service",
                    json!({ "name": name, "description": "x", "position": position }),
                ))
                .await
                .unwrap();
            ids.push(record.id);
        }
        let sorted = |order: &str| ListQuery {
            sort_by: Some("position".into()),
            sort_order: Some(order.into()),
            ..Default::default()
        };

        assert_eq!(
            ids_of(&store, &SERVICE, sorted("asc")).await,
            vec![ids[1], ids[0], ids[2], ids[3]]
        );
        assert_eq!(
            ids_of(&store, &SERVICE, sorted("desc")).await,
            vec![ids[3], ids[0], ids[2], ids[1]]
        );
    }

    #[tokio::test]
    async fn pages_cover_every_row_once() {
        let store = postgres_store().await;
        let mut expected = Vec::new();
        for i in 0..25 {
            let record = store
                .insert(new_record("tag", json!({ "name": format!("tag {i:02}") })))
                .await
                .unwrap();
            expected.push(record.id);
        }

        let mut seen = Vec::new();
        for page in 1..=4 {
            let spec = ListQuery {
                page: Some(page.to_string()),
                ..Default::default()
            }
            .resolve(&TAG, Scope::Active)
            .unwrap();
            let result = store.query("tag", &spec).await.unwrap();
            assert_eq!(result.total, 25);
            assert_eq!(result.total_pages(), 3);
            seen.extend(result.items.iter().map(|r| r.id));
        }
        assert_eq!(seen, expected);
    }
}

mod lifecycle {
    use super::*;

    fn lifecycle(schema: &'static ResourceSchema, store: Arc<dyn RecordStore>) -> ResourceLifecycle {
        ResourceLifecycle::new(
            schema,
            store,
            MediaAttachmentManager::new(Arc::new(MemoryBlobStore::new()), 1024 * 1024),
        )
    }

    fn input(fields: Value) -> ResourceInput {
        ResourceInput {
            fields: fields.as_object().cloned().unwrap(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn concurrent_creates_admit_one_name() {
        let store: Arc<dyn RecordStore> = Arc::new(postgres_store().await);
        let left = lifecycle(&CATEGORY, store.clone());
        let right = lifecycle(&CATEGORY, store.clone());

        let (a, b) = tokio::join!(
            left.create(input(json!({ "name": "Design" })), Actor { id: 1 }),
            right.create(input(json!({ "name": "design" })), Actor { id: 2 }),
        );

        let (ok, err) = match (a, b) {
            (Ok(record), Err(err)) | (Err(err), Ok(record)) => (record, err),
            other => panic!("expected exactly one success, got {other:?}"),
        };
        assert_eq!(ok.fields["slug"], "design");
        let LifecycleError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert!(errors.contains("name"));
        assert_eq!(left.list_all("name").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn restore_all_skips_conflicting_records() {
        let store: Arc<dyn RecordStore> = Arc::new(postgres_store().await);
        let tags = lifecycle(&TAG, store);
        let rust = tags
            .create(input(json!({ "name": "Rust" })), Actor { id: 1 })
            .await
            .unwrap();
        let go = tags
            .create(input(json!({ "name": "Go" })), Actor { id: 1 })
            .await
            .unwrap();
        tags.soft_delete(rust.id).await.unwrap();
        tags.soft_delete(go.id).await.unwrap();
        tags.create(input(json!({ "name": "rust" })), Actor { id: 1 })
            .await
            .unwrap();

        assert_eq!(tags.restore_all().await.unwrap(), 1);
        assert!(tags.get(go.id).await.is_ok());
        assert!(matches!(
            tags.get(rust.id).await,
            Err(LifecycleError::NotFound { .. })
        ));
    }
}

mod http {
    use super::*;

    #[tokio::test]
    async fn trash_round_trip() {
        let app = TestApp::spawn_postgres().await;
        let token = admin_token();
        let first = app.create_category(&token, "Branding").await;

        let duplicate = app
            .post_with_token(
                &routes::collection("categories"),
                &json!({ "name": "BRANDING" }),
                &token,
            )
            .await;
        assert_eq!(duplicate.status, 422);
        assert!(duplicate.body["data"]["name"].is_array());

        let res = app
            .delete_with_token(&routes::record("categories", first), &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let trash = app
            .get_with_token(&routes::trash("categories"), &token)
            .await;
        assert_eq!(trash.ids(), vec![first]);

        let second = app.create_category(&token, "Branding").await;
        let restore = app
            .post_empty_with_token(&routes::restore("categories", first), &token)
            .await;
        assert_eq!(restore.status, 422, "{}", restore.text);

        let purge = app
            .delete_with_token(&routes::purge("categories", first), &token)
            .await;
        assert_eq!(purge.status, 200, "{}", purge.text);
        let trash = app
            .get_with_token(&routes::trash("categories"), &token)
            .await;
        assert!(trash.ids().is_empty());

        let active = app
            .get_with_token(&routes::collection("categories"), &token)
            .await;
        assert_eq!(active.ids(), vec![second]);
    }

    #[tokio::test]
    async fn purge_removes_the_cover_files() {
        let app = TestApp::spawn_postgres().await;
        let token = admin_token();
        let category = app.create_category(&token, "News").await.to_string();

        let created = app
            .multipart_with_token(
                Method::POST,
                &routes::collection("articles"),
                &[
                    ("title", "Launch"),
                    ("content", "Body"),
                    ("category_id", category.as_str()),
                    ("status", "published"),
                    ("publication_date", "2024-06-01"),
                ],
                &[("cover", "launch.jpg", image_bytes(300, 200, ImageFormat::Jpeg))],
                &token,
            )
            .await;
        assert_eq!(created.status, 201, "{}", created.text);
        assert_eq!(created.data()["fields"]["author_id"], 1);
        assert_eq!(created.data()["fields"]["publication_date"], "2024-06-01");
        let id = created.id();
        let path = created.data()["media"]["cover"]["path"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(app.blob_exists(&path).await);

        app.delete_with_token(&routes::record("articles", id), &token)
            .await;
        let res = app
            .delete_with_token(&routes::purge("articles", id), &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(!app.blob_exists(&path).await);
        assert!(app.stored_files().is_empty());
    }

    #[tokio::test]
    async fn settings_are_seeded_once() {
        let app = TestApp::spawn_postgres().await;

        let res = app
            .get_with_token(routes::SETTINGS, &admin_token())
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let keys: Vec<&str> = res
            .data()
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["fields"]["key"].as_str().unwrap())
            .collect();
        assert!(keys.contains(&"site_name"));
        let mut unique = keys.clone();
        unique.dedup();
        assert_eq!(unique, keys);
    }
}
