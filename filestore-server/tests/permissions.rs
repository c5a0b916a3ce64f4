//! Blackbox tests for file permissions.
//!
//! These tests assert which grants callers may set on files, the grants they receive by default,
//! and how bucket and file permissions combine when file security is enabled.

use anyhow::Result;
use filestore_test::server::{TEST_API_KEY, TestServer};
use filestore_test::session;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};

async fn create_bucket(server: &TestServer, body: Value) -> Result<()> {
    let response = reqwest::Client::new()
        .post(server.url("/v1/buckets"))
        .header("x-filestore-key", TEST_API_KEY)
        .json(&body)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    Ok(())
}

fn upload_form(file_id: &str, name: &str, permissions: &[&str]) -> Result<Form> {
    let part = Part::bytes(b"\x89PNG fake image".to_vec())
        .file_name(name.to_owned())
        .mime_str("image/png")?;

    let mut form = Form::new().text("fileId", file_id.to_owned()).part("file", part);
    for permission in permissions {
        form = form.text("permissions[]", permission.to_string());
    }
    Ok(form)
}

#[tokio::test]
async fn test_default_and_forbidden_grants() -> Result<()> {
    filestore_test::tracing::init();
    let server = TestServer::new().await;
    let client = reqwest::Client::new();
    let token = session::user_token("alice");

    create_bucket(
        &server,
        json!({
            "bucketId": "photos",
            "name": "Photos",
            "permissions": ["read(any)", "create(users)", "update(users)", "delete(users)"],
        }),
    )
    .await?;

    // Without explicit permissions, the uploader receives read, update and delete
    let response = client
        .post(server.url("/v1/buckets/photos/files"))
        .bearer_auth(&token)
        .multipart(upload_form("unique()", "permissions.png", &[])?)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let file: Value = response.json().await?;
    let permissions = file["$permissions"].as_array().unwrap();
    assert_eq!(permissions.len(), 3);
    for expected in ["read(user:alice)", "update(user:alice)", "delete(user:alice)"] {
        assert!(permissions.contains(&json!(expected)), "{expected}");
    }
    assert_eq!(file["bucketId"], "photos");
    assert_eq!(file["mimeType"], "image/png");

    // Granting a role the caller does not hold is rejected
    let response = client
        .post(server.url("/v1/buckets/photos/files"))
        .bearer_auth(&token)
        .multipart(upload_form("unique()", "other.png", &["read(user:notme)"])?)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: Value = response.json().await?;
    let message = error["message"].as_str().unwrap();
    assert!(message.starts_with("Permissions must be one of:"), "{message}");
    assert!(message.contains("any"));
    assert!(message.contains("users"));
    assert!(message.contains("user:alice"));
    assert_eq!(error["code"], 400);

    // Shared roles and the caller's own roles can be granted
    let response = client
        .post(server.url("/v1/buckets/photos/files"))
        .bearer_auth(&token)
        .multipart(upload_form(
            "shared",
            "shared.png",
            &["read(any)", "update(user:alice)"],
        )?)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let file: Value = response.json().await?;
    assert_eq!(
        file["$permissions"],
        json!(["read(any)", "update(user:alice)"])
    );

    Ok(())
}

#[tokio::test]
async fn test_guest_cannot_upload() -> Result<()> {
    let server = TestServer::new().await;

    create_bucket(
        &server,
        json!({
            "bucketId": "photos",
            "name": "Photos",
            "permissions": ["read(any)", "create(users)"],
        }),
    )
    .await?;

    let response = reqwest::Client::new()
        .post(server.url("/v1/buckets/photos/files"))
        .multipart(upload_form("unique()", "guest.png", &[])?)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_invalid_credentials() -> Result<()> {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();

    let response = client
        .get(server.url("/v1/buckets"))
        .header("x-filestore-key", "wrong")
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .get(server.url("/v1/buckets/photos/files"))
        .bearer_auth("not-a-token")
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .get(server.url("/v1/buckets/photos/files"))
        .header("authorization", "Basic dXNlcjpwdw==")
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_malformed_permission() -> Result<()> {
    let server = TestServer::new().await;

    create_bucket(
        &server,
        json!({
            "bucketId": "docs",
            "name": "Docs",
            "permissions": ["create(users)"],
        }),
    )
    .await?;

    let response = reqwest::Client::new()
        .post(server.url("/v1/buckets/docs/files"))
        .bearer_auth(session::user_token("alice"))
        .multipart(upload_form("unique()", "a.txt", &["read(label:vip)"])?)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: Value = response.json().await?;
    assert_eq!(error["type"], "invalid_permission");

    Ok(())
}

#[tokio::test]
async fn test_file_security() -> Result<()> {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();
    let alice = session::user_token("alice");
    let bob = session::user_token("bob");

    create_bucket(
        &server,
        json!({
            "bucketId": "private",
            "name": "Private",
            "permissions": ["create(users)"],
            "fileSecurity": true,
        }),
    )
    .await?;

    let response = client
        .post(server.url("/v1/buckets/private/files"))
        .bearer_auth(&alice)
        .multipart(upload_form("notes", "notes.png", &[])?)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    // The file grants read to alice only
    let response = client
        .get(server.url("/v1/buckets/private/files/notes"))
        .bearer_auth(&alice)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(server.url("/v1/buckets/private/files/notes"))
        .bearer_auth(&bob)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Listing is filtered by the file permissions
    let list: Value = client
        .get(server.url("/v1/buckets/private/files"))
        .bearer_auth(&alice)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(list["total"], 1);
    assert_eq!(list["files"][0]["$id"], "notes");

    let list: Value = client
        .get(server.url("/v1/buckets/private/files"))
        .bearer_auth(&bob)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(list["total"], 0);

    // Bob cannot delete, alice can
    let response = client
        .delete(server.url("/v1/buckets/private/files/notes"))
        .bearer_auth(&bob)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .delete(server.url("/v1/buckets/private/files/notes"))
        .bearer_auth(&alice)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.bytes().await?.is_empty());

    let response = client
        .get(server.url("/v1/buckets/private/files/notes"))
        .bearer_auth(&alice)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_team_grants() -> Result<()> {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();
    let alice = session::team_token("alice", "eng", "m1", &["owner"]);
    let carol = session::team_token("carol", "eng", "m2", &[]);

    create_bucket(
        &server,
        json!({
            "bucketId": "team",
            "name": "Team",
            "permissions": ["create(users)"],
            "fileSecurity": true,
        }),
    )
    .await?;

    let response = client
        .post(server.url("/v1/buckets/team/files"))
        .bearer_auth(&alice)
        .multipart(upload_form("plan", "plan.png", &["read(team:eng)"])?)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Other members of the team can read the file
    let response = client
        .get(server.url("/v1/buckets/team/files/plan"))
        .bearer_auth(&carol)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    // Carol does not hold the owner role and cannot grant it
    let response = client
        .post(server.url("/v1/buckets/team/files"))
        .bearer_auth(&carol)
        .multipart(upload_form("x", "x.png", &["read(team:eng/owner)"])?)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_update_permissions() -> Result<()> {
    let server = TestServer::new().await;
    let client = reqwest::Client::new();
    let alice = session::user_token("alice");

    create_bucket(
        &server,
        json!({
            "bucketId": "photos",
            "name": "Photos",
            "permissions": ["create(users)"],
            "fileSecurity": true,
        }),
    )
    .await?;

    let response = client
        .post(server.url("/v1/buckets/photos/files"))
        .bearer_auth(&alice)
        .multipart(upload_form("cat", "cat.png", &[])?)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .put(server.url("/v1/buckets/photos/files/cat"))
        .bearer_auth(&alice)
        .json(&json!({"permissions": ["read(user:notme)"]}))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: Value = response.json().await?;
    assert!(
        error["message"]
            .as_str()
            .unwrap()
            .starts_with("Permissions must be one of:")
    );

    let response = client
        .put(server.url("/v1/buckets/photos/files/cat"))
        .bearer_auth(&alice)
        .json(&json!({"name": "kitten.png", "permissions": ["read(any)", "update(user:alice)"]}))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let file: Value = response.json().await?;
    assert_eq!(file["name"], "kitten.png");
    assert_eq!(
        file["$permissions"],
        json!(["read(any)", "update(user:alice)"])
    );

    // Now readable by guests, but no longer deletable by alice
    let response = client
        .get(server.url("/v1/buckets/photos/files/cat"))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .delete(server.url("/v1/buckets/photos/files/cat"))
        .bearer_auth(&alice)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}
