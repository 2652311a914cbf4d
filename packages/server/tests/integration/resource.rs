use serde_json::json;

use crate::common::{TestApp, admin_token, routes, token_for};

mod creation {
    use super::*;

    #[tokio::test]
    async fn create_assigns_slug_and_audit_fields() {
        let app = TestApp::spawn().await;
        let token = token_for(7, &["content:read", "content:write"]);

        let res = app
            .post_with_token(
                &routes::collection("categories"),
                &json!({ "name": "Web Design", "description": "Sites" }),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.body["message"], "Category created successfully");
        let data = res.data();
        assert_eq!(data["fields"]["name"], "Web Design");
        assert_eq!(data["fields"]["slug"], "web-design");
        assert_eq!(data["created_by"], 7);
        assert_eq!(data["updated_by"], 7);
        assert!(data["deleted_at"].is_null());
        assert!(data["created_at"].is_string());
    }

    #[tokio::test]
    async fn article_author_is_the_caller() {
        let app = TestApp::spawn().await;
        let token = token_for(9, &["content:read", "content:write"]);
        let category = app.create_category(&token, "News").await;

        let res = app
            .post_with_token(
                &routes::collection("articles"),
                &json!({
                    "title": "Bylines",
                    "content": "Body",
                    "category_id": category,
                    "status": "draft",
                    "author_id": 1,
                    "publication_date": "2024-13-01",
                }),
                &token,
            )
            .await;
        assert_eq!(res.status, 422);
        assert!(res.body["data"]["publication_date"].is_array());
        assert!(res.body["data"].get("author_id").is_none());

        let res = app
            .post_with_token(
                &routes::collection("articles"),
                &json!({
                    "title": "Bylines",
                    "content": "Body",
                    "category_id": category,
                    "status": "draft",
                    "author_id": 1,
                    "publication_date": "2024-12-01",
                }),
                &token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.data()["fields"]["author_id"], 9);
        assert_eq!(res.data()["fields"]["publication_date"], "2024-12-01");
    }

    #[tokio::test]
    async fn missing_required_field_is_unprocessable() {
        let app = TestApp::spawn().await;

        let res = app
            .post_with_token(
                &routes::collection("categories"),
                &json!({ "description": "No name" }),
                &admin_token(),
            )
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["success"], false);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(res.body["data"]["name"].is_array());
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected_on_the_source_field() {
        let app = TestApp::spawn().await;
        let token = admin_token();
        app.create_category(&token, "Branding").await;

        let res = app
            .post_with_token(
                &routes::collection("categories"),
                &json!({ "name": "branding" }),
                &token,
            )
            .await;

        assert_eq!(res.status, 422);
        assert!(res.body["data"]["name"].is_array());
    }

    #[tokio::test]
    async fn foreign_key_must_reference_an_active_record() {
        let app = TestApp::spawn().await;
        let token = admin_token();
        let category = app.create_category(&token, "News").await;
        app.delete_with_token(&routes::record("categories", category), &token)
            .await;

        let res = app
            .post_with_token(
                &routes::collection("articles"),
                &json!({
                    "title": "Launch",
                    "content": "We launched.",
                    "category_id": category,
                    "status": "draft",
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 422);
        assert!(res.body["data"]["category_id"].is_array());
    }

    #[tokio::test]
    async fn unknown_resource_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .get_with_token(&routes::collection("widgets"), &admin_token())
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let app = TestApp::spawn().await;

        let res = app
            .client
            .post(format!("http://{}{}", app.addr, routes::collection("tags")))
            .header("Authorization", format!("Bearer {}", admin_token()))
            .header("Content-Type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 400);
    }
}

mod access {
    use super::*;

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::collection("tags")).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app
            .get_with_token(&routes::collection("tags"), "not-a-jwt")
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn reader_cannot_write() {
        let app = TestApp::spawn().await;
        let reader = token_for(2, &["content:read"]);

        let res = app
            .post_with_token(&routes::collection("tags"), &json!({ "name": "Rust" }), &reader)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn writer_cannot_purge() {
        let app = TestApp::spawn().await;
        let writer = token_for(2, &["content:read", "content:write"]);
        let id = app
            .create("tags", &json!({ "name": "Rust" }), &writer)
            .await;
        app.delete_with_token(&routes::record("tags", id), &writer)
            .await;

        let res = app
            .delete_with_token(&routes::purge("tags", id), &writer)
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn content_permissions_do_not_cover_users() {
        let app = TestApp::spawn().await;
        let editor = token_for(2, &["content:read", "content:write"]);

        let res = app
            .get_with_token(&routes::collection("users"), &editor)
            .await;

        assert_eq!(res.status, 403);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn pages_are_ordered_by_id_with_metadata() {
        let app = TestApp::spawn().await;
        let token = admin_token();
        let mut ids = Vec::new();
        for i in 0..25 {
            ids.push(
                app.create("tags", &json!({ "name": format!("Tag {i:02}") }), &token)
                    .await,
            );
        }

        let res = app
            .get_with_token(
                &format!("{}?page=3&per_page=10", routes::collection("tags")),
                &token,
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.ids(), ids[20..].to_vec());
        let pagination = &res.data()["pagination"];
        assert_eq!(pagination["page"], 3);
        assert_eq!(pagination["per_page"], 10);
        assert_eq!(pagination["total"], 25);
        assert_eq!(pagination["total_pages"], 3);
    }

    #[tokio::test]
    async fn default_page_size_is_ten() {
        let app = TestApp::spawn().await;
        let token = admin_token();
        for i in 0..12 {
            app.create("tags", &json!({ "name": format!("t{i}") }), &token)
                .await;
        }

        let res = app
            .get_with_token(&routes::collection("tags"), &token)
            .await;

        assert_eq!(res.ids().len(), 10);
        assert_eq!(res.data()["pagination"]["per_page"], 10);
    }

    #[tokio::test]
    async fn search_matches_case_insensitively() {
        let app = TestApp::spawn().await;
        let token = admin_token();
        let design = app.create_category(&token, "Web Design").await;
        app.create_category(&token, "Photography").await;

        let res = app
            .get_with_token(
                &format!("{}?search=DESIGN", routes::collection("categories")),
                &token,
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.ids(), vec![design]);
    }

    #[tokio::test]
    async fn sort_by_name_descending() {
        let app = TestApp::spawn().await;
        let token = admin_token();
        let a = app.create_category(&token, "Alpha").await;
        let c = app.create_category(&token, "Charlie").await;
        let b = app.create_category(&token, "Bravo").await;

        let res = app
            .get_with_token(
                &format!(
                    "{}?sort_by=name&sort_order=desc",
                    routes::collection("categories")
                ),
                &token,
            )
            .await;

        assert_eq!(res.ids(), vec![c, b, a]);
    }

    #[tokio::test]
    async fn malformed_parameters_are_rejected() {
        let app = TestApp::spawn().await;
        let token = admin_token();

        for query in [
            "page=0",
            "page=abc",
            "per_page=101",
            "sort_by=password",
            "sort_order=sideways",
        ] {
            let res = app
                .get_with_token(&format!("{}?{query}", routes::collection("tags")), &token)
                .await;
            assert_eq!(res.status, 400, "{query}: {}", res.text);
            assert_eq!(res.body["code"], "INVALID_PARAMETER");
        }
    }

    #[tokio::test]
    async fn trashed_records_leave_the_active_listing() {
        let app = TestApp::spawn().await;
        let token = admin_token();
        let keep = app.create_category(&token, "Keep").await;
        let gone = app.create_category(&token, "Gone").await;

        app.delete_with_token(&routes::record("categories", gone), &token)
            .await;

        let active = app
            .get_with_token(&routes::collection("categories"), &token)
            .await;
        assert_eq!(active.ids(), vec![keep]);

        let trash = app
            .get_with_token(&routes::trash("categories"), &token)
            .await;
        assert_eq!(trash.status, 200);
        assert_eq!(trash.ids(), vec![gone]);
        assert!(trash.data()["items"][0]["deleted_at"].is_string());
    }

    #[tokio::test]
    async fn hidden_fields_are_never_listed() {
        let app = TestApp::spawn().await;
        let token = admin_token();
        app.create_user(&token, "ada@example.com", "s3cret-pass").await;

        let res = app
            .get_with_token(&routes::collection("users"), &token)
            .await;

        let item = &res.data()["items"][0];
        assert_eq!(item["fields"]["email"], "ada@example.com");
        assert!(item["fields"].get("password").is_none());
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn get_only_sees_active_records() {
        let app = TestApp::spawn().await;
        let token = admin_token();
        let id = app.create_category(&token, "Temp").await;

        let res = app
            .get_with_token(&routes::record("categories", id), &token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.id(), id);

        app.delete_with_token(&routes::record("categories", id), &token)
            .await;

        let res = app
            .get_with_token(&routes::record("categories", id), &token)
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn soft_delete_twice_is_not_found() {
        let app = TestApp::spawn().await;
        let token = admin_token();
        let id = app.create_category(&token, "Once").await;

        let first = app
            .delete_with_token(&routes::record("categories", id), &token)
            .await;
        assert_eq!(first.status, 200);
        assert_eq!(first.data()["id"], id);

        let second = app
            .delete_with_token(&routes::record("categories", id), &token)
            .await;
        assert_eq!(second.status, 404);
    }

    #[tokio::test]
    async fn restore_brings_a_record_back() {
        let app = TestApp::spawn().await;
        let token = admin_token();
        let id = app.create_category(&token, "Phoenix").await;
        app.delete_with_token(&routes::record("categories", id), &token)
            .await;

        let res = app
            .post_empty_with_token(&routes::restore("categories", id), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.data()["deleted_at"].is_null());
        let active = app
            .get_with_token(&routes::record("categories", id), &token)
            .await;
        assert_eq!(active.status, 200);
    }

    #[tokio::test]
    async fn restore_of_an_active_record_is_not_found() {
        let app = TestApp::spawn().await;
        let token = admin_token();
        let id = app.create_category(&token, "Alive").await;

        let res = app
            .post_empty_with_token(&routes::restore("categories", id), &token)
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn trashed_name_can_be_reused_but_then_blocks_restore() {
        let app = TestApp::spawn().await;
        let token = admin_token();
        let old = app.create_category(&token, "Design").await;
        app.delete_with_token(&routes::record("categories", old), &token)
            .await;

        let replacement = app
            .post_with_token(
                &routes::collection("categories"),
                &json!({ "name": "Design" }),
                &token,
            )
            .await;
        assert_eq!(replacement.status, 201);

        let res = app
            .post_empty_with_token(&routes::restore("categories", old), &token)
            .await;
        assert_eq!(res.status, 422);
        assert!(res.body["data"]["name"].is_array());
    }

    #[tokio::test]
    async fn restore_all_skips_conflicts() {
        let app = TestApp::spawn().await;
        let token = admin_token();
        let a = app.create_category(&token, "A").await;
        let b = app.create_category(&token, "B").await;
        for id in [a, b] {
            app.delete_with_token(&routes::record("categories", id), &token)
                .await;
        }
        app.create_category(&token, "B").await;

        let res = app
            .post_empty_with_token(&routes::restore_all("categories"), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["restored"], 1);
        let trash = app
            .get_with_token(&routes::trash("categories"), &token)
            .await;
        assert_eq!(trash.ids(), vec![b]);
    }

    #[tokio::test]
    async fn purge_requires_the_record_to_be_trashed() {
        let app = TestApp::spawn().await;
        let token = admin_token();
        let id = app.create_category(&token, "Doomed").await;

        let active = app
            .delete_with_token(&routes::purge("categories", id), &token)
            .await;
        assert_eq!(active.status, 404);

        app.delete_with_token(&routes::record("categories", id), &token)
            .await;
        let purged = app
            .delete_with_token(&routes::purge("categories", id), &token)
            .await;
        assert_eq!(purged.status, 200);

        let again = app
            .post_empty_with_token(&routes::restore("categories", id), &token)
            .await;
        assert_eq!(again.status, 404);
        let trash = app
            .get_with_token(&routes::trash("categories"), &token)
            .await;
        assert!(trash.ids().is_empty());
    }

    #[tokio::test]
    async fn update_merges_and_rederives_slug() {
        let app = TestApp::spawn().await;
        let writer = token_for(3, &["content:read", "content:write"]);
        let id = app
            .create(
                "categories",
                &json!({ "name": "Old Name", "description": "kept" }),
                &admin_token(),
            )
            .await;

        let res = app
            .put_with_token(
                &routes::record("categories", id),
                &json!({ "name": "New Name" }),
                &writer,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let data = res.data();
        assert_eq!(data["fields"]["name"], "New Name");
        assert_eq!(data["fields"]["slug"], "new-name");
        assert_eq!(data["fields"]["description"], "kept");
        assert_eq!(data["created_by"], 1);
        assert_eq!(data["updated_by"], 3);
    }

    #[tokio::test]
    async fn update_of_a_trashed_record_is_not_found() {
        let app = TestApp::spawn().await;
        let token = admin_token();
        let id = app.create_category(&token, "Frozen").await;
        app.delete_with_token(&routes::record("categories", id), &token)
            .await;

        let res = app
            .put_with_token(
                &routes::record("categories", id),
                &json!({ "name": "Thawed" }),
                &token,
            )
            .await;

        assert_eq!(res.status, 404);
    }
}
