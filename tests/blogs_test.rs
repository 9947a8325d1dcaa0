mod common;

use serde_json::{Value, json};

use common::{blog_body, spawn_app};

#[tokio::test]
async fn create_missing_excerpt_is_rejected_without_writing() {
    let app = spawn_app().await;
    let mut body = blog_body("Launch", "launch");
    body.as_object_mut().unwrap().remove("excerpt");

    let response = app
        .server
        .post("/api/admin/blogs")
        .authorization_bearer(&app.token)
        .json(&body)
        .await;
    assert_eq!(response.status_code(), 400);
    let error = response.json::<Value>()["error"].as_str().unwrap().to_string();
    assert!(error.contains("excerpt"), "{error}");

    let list: Value = app
        .server
        .get("/api/admin/blogs")
        .authorization_bearer(&app.token)
        .await
        .json();
    assert_eq!(list["pagination"]["total"], 0);
}

#[tokio::test]
async fn duplicate_slug_is_rejected_and_first_kept() {
    let app = spawn_app().await;
    let first = app.create("/api/admin/blogs", blog_body("First", "Hello World")).await;
    assert_eq!(first["slug"], "hello-world");

    let response = app
        .server
        .post("/api/admin/blogs")
        .authorization_bearer(&app.token)
        .json(&blog_body("Second", "hello world"))
        .await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(response.json::<Value>()["error"], "Slug already exists");

    let detail: Value = app.server.get("/api/blogs/hello-world").await.json();
    assert_eq!(detail["blog"]["title"], "First");
}

#[tokio::test]
async fn public_reads_list_every_post_and_include_related() {
    let app = spawn_app().await;
    let mut main = blog_body("Main", "main");
    main["tags"] = json!(["design"]);
    app.create("/api/admin/blogs", main).await;

    let mut related = blog_body("Related", "related");
    related["tags"] = json!(["design"]);
    app.create("/api/admin/blogs", related).await;

    let mut draft = blog_body("Draft", "draft");
    draft["tags"] = json!(["other"]);
    draft["is_published"] = json!(false);
    app.create("/api/admin/blogs", draft).await;

    let list: Value = app.server.get("/api/blogs").await.json();
    assert_eq!(list["pagination"]["total"], 3);
    assert_eq!(list["pagination"]["limit"], 10);

    let detail: Value = app.server.get("/api/blogs/main").await.json();
    let related = detail["relatedBlogs"].as_array().unwrap();
    assert_eq!(related.len(), 1);
    assert_eq!(related[0]["slug"], "related");

    let draft: Value = app.server.get("/api/blogs/draft").await.json();
    assert_eq!(draft["blog"]["is_published"], false);
    assert_eq!(app.server.get("/api/blogs/missing").await.status_code(), 404);

    let admin: Value = app
        .server
        .get("/api/admin/blogs")
        .authorization_bearer(&app.token)
        .await
        .json();
    assert_eq!(admin["pagination"]["total"], 3);
}

#[tokio::test]
async fn admin_crud_by_id() {
    let app = spawn_app().await;
    let blog = app.create("/api/admin/blogs", blog_body("Post", "post")).await;
    let path = format!("/api/admin/blogs/{}", blog["id"].as_str().unwrap());

    let updated = app
        .server
        .put(&path)
        .authorization_bearer(&app.token)
        .json(&blog_body("Post, revised", "post"))
        .await;
    assert_eq!(updated.status_code(), 200);
    assert_eq!(updated.json::<Value>()["title"], "Post, revised");

    let deleted = app.server.delete(&path).authorization_bearer(&app.token).await;
    assert_eq!(deleted.status_code(), 200);
    assert_eq!(deleted.json::<Value>()["success"], true);

    let gone = app.server.get(&path).authorization_bearer(&app.token).await;
    assert_eq!(gone.status_code(), 404);
    assert_eq!(gone.json::<Value>()["error"], "Blog not found");
}

#[tokio::test]
async fn malformed_id_and_unknown_fields_are_bad_requests() {
    let app = spawn_app().await;
    let bad_id = app
        .server
        .get("/api/admin/blogs/not-an-id")
        .authorization_bearer(&app.token)
        .await;
    assert_eq!(bad_id.status_code(), 400);
    assert_eq!(bad_id.json::<Value>()["error"], "Invalid blog ID");

    let mut body = blog_body("X", "x");
    body["views"] = json!(10);
    let unknown = app
        .server
        .post("/api/admin/blogs")
        .authorization_bearer(&app.token)
        .json(&body)
        .await;
    assert_eq!(unknown.status_code(), 400);
}
