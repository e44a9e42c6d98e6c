//! Integration tests for the Roadmate API
//!
//! These run the full router in-process against PostgreSQL:
//! - signup / login / token round trip
//! - uniform 401 and 403 responses
//! - task ranking through HTTP
//! - roster management and profile rows

mod common;

use axum::http::StatusCode;
use common::{unique_name, TestContext, PASSWORD};
use roadmate_shared::auth::jwt::TokenSigner;
use serde_json::{json, Value};
use uuid::Uuid;

fn sort_indices(tasks: &Value) -> Vec<(String, i64)> {
    tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| {
            (
                t["title"].as_str().unwrap().to_string(),
                t["sort_index"].as_i64().unwrap(),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_signup_login_and_foreign_project_forbidden() {
    let ctx = TestContext::new().await.unwrap();
    let username = unique_name("alice");

    let (status, signup) = ctx
        .send(
            "POST",
            "/auth/signup",
            None,
            Some(json!({ "username": username, "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", signup);
    assert!(signup["token"].as_str().unwrap().split('.').count() == 3);

    let (status, login) = ctx
        .send(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": username, "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", login);
    assert_eq!(login["userId"], signup["userId"]);

    let signer = TokenSigner::new(ctx.config.jwt.secret.as_bytes());
    let identity = signer.verify(login["token"].as_str().unwrap()).unwrap();
    assert_eq!(identity.username, username);

    let bob = ctx.signup("bob").await;
    let project_id = ctx.create_project(&bob).await;

    let (status, body) = ctx
        .send(
            "POST",
            &format!("/me/projects/{}/tasks", project_id),
            Some(login["token"].as_str().unwrap()),
            Some(json!({ "title": "Sneak in" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (_, tasks) = ctx
        .send(
            "GET",
            &format!("/me/projects/{}/tasks", project_id),
            Some(&bob.token),
            None,
        )
        .await;
    assert!(tasks.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unauthenticated_responses_are_uniform() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.signup("carol").await;

    let foreign = TokenSigner::new(b"some-other-secret-that-is-32-bytes-long")
        .issue(user.id, &user.username)
        .unwrap();

    let missing = ctx.send("GET", "/me/profile", None, None).await;
    let garbage = ctx.send("GET", "/me/profile", Some("not.a.token"), None).await;
    let wrong_key = ctx.send("GET", "/me/profile", Some(&foreign), None).await;

    assert_eq!(missing.0, StatusCode::UNAUTHORIZED);
    assert_eq!(missing, garbage);
    assert_eq!(missing, wrong_key);
    assert_eq!(missing.1["error"], "unauthorized");
}

#[tokio::test]
async fn test_login_failures_are_uniform() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.signup("dave").await;

    let wrong_password = ctx
        .send(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": user.username, "password": "wrong-password" })),
        )
        .await;
    let unknown_user = ctx
        .send(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": unique_name("nobody"), "password": PASSWORD })),
        )
        .await;

    assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_user);
}

#[tokio::test]
async fn test_duplicate_username_conflicts_in_any_case() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.signup("erin").await;

    let (status, body) = ctx
        .send(
            "POST",
            "/auth/signup",
            None,
            Some(json!({ "username": user.username.to_uppercase(), "password": PASSWORD })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_signup_validation() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .send(
            "POST",
            "/auth/signup",
            None,
            Some(json!({ "username": unique_name("frank"), "password": "short" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "password");

    let (status, _) = ctx
        .send(
            "POST",
            "/auth/signup",
            None,
            Some(json!({ "username": " ab ", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_valid_username() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.signup("gina").await;

    let (status, _) = ctx.send("GET", "/auth/validUsername?username=", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, short) = ctx.send("GET", "/auth/validUsername?username=ab", None, None).await;
    assert_eq!(short["available"], false);

    let (_, taken) = ctx
        .send(
            "GET",
            &format!("/auth/validUsername?username={}", user.username),
            None,
            None,
        )
        .await;
    assert_eq!(taken["available"], false);

    let (_, free) = ctx
        .send(
            "GET",
            &format!("/auth/validUsername?username={}", unique_name("free")),
            None,
            None,
        )
        .await;
    assert_eq!(free["available"], true);
}

#[tokio::test]
async fn test_task_insert_shifts_column() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.signup("hank").await;
    let project_id = ctx.create_project(&owner).await;
    let uri = format!("/me/projects/{}/tasks", project_id);

    for title in ["a", "b", "c", "d"] {
        let (status, task) = ctx
            .send("POST", &uri, Some(&owner.token), Some(json!({ "title": title })))
            .await;
        assert_eq!(status, StatusCode::OK, "{}", task);
    }

    let (status, inserted) = ctx
        .send(
            "POST",
            &uri,
            Some(&owner.token),
            Some(json!({ "title": "new", "sort_index": 1, "difficulty": 4 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", inserted);
    assert_eq!(inserted["sort_index"], 1);
    assert_eq!(inserted["status"], "backlog");
    assert_eq!(inserted["difficulty"], 4);

    let (_, other_column) = ctx
        .send(
            "POST",
            &uri,
            Some(&owner.token),
            Some(json!({ "title": "wip", "status": "inProgress" })),
        )
        .await;
    assert_eq!(other_column["sort_index"], 0);

    let (status, tasks) = ctx.send("GET", &uri, Some(&owner.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        sort_indices(&tasks),
        vec![
            ("a".to_string(), 0),
            ("new".to_string(), 1),
            ("b".to_string(), 2),
            ("c".to_string(), 3),
            ("d".to_string(), 4),
            ("wip".to_string(), 0),
        ]
    );
}

#[tokio::test]
async fn test_task_input_rejections() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.signup("ivan").await;
    let outsider = ctx.signup("judy").await;
    let project_id = ctx.create_project(&owner).await;
    let uri = format!("/me/projects/{}/tasks", project_id);

    for body in [
        json!({ "title": "t", "sort_index": -1 }),
        json!({ "title": "t", "difficulty": 9 }),
        json!({ "title": "t", "status": "archived" }),
        json!({ "title": "t", "assignee_id": outsider.id }),
    ] {
        let (status, response) = ctx.send("POST", &uri, Some(&owner.token), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", response);
        assert_eq!(response["error"], "invalid_argument");
    }

    let (_, tasks) = ctx.send("GET", &uri, Some(&owner.token), None).await;
    assert!(tasks.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_and_foreign_projects_look_the_same() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.signup("kate").await;
    let stranger = ctx.signup("leo").await;
    let project_id = ctx.create_project(&owner).await;

    let foreign = ctx
        .send(
            "GET",
            &format!("/me/projects/{}/tasks", project_id),
            Some(&stranger.token),
            None,
        )
        .await;
    let missing = ctx
        .send(
            "GET",
            &format!("/me/projects/{}/tasks", Uuid::new_v4()),
            Some(&stranger.token),
            None,
        )
        .await;

    assert_eq!(foreign.0, StatusCode::FORBIDDEN);
    assert_eq!(foreign, missing);

    let (status, _) = ctx
        .send(
            "DELETE",
            &format!("/me/projects/{}", project_id),
            Some(&stranger.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_roster_management() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.signup("mia").await;
    let member = ctx.signup("ned").await;
    let project_id = ctx.create_project(&owner).await;
    let members_uri = format!("/me/projects/{}/members", project_id);
    let tasks_uri = format!("/me/projects/{}/tasks", project_id);

    let (status, added) = ctx
        .send(
            "POST",
            &members_uri,
            Some(&owner.token),
            Some(json!({ "username": member.username, "roleKey": "backend" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", added);
    assert_eq!(added["roleKey"], "backend");

    let (status, _) = ctx
        .send(
            "POST",
            &members_uri,
            Some(&owner.token),
            Some(json!({ "username": member.username, "roleKey": "backend" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = ctx
        .send(
            "POST",
            &members_uri,
            Some(&owner.token),
            Some(json!({ "username": unique_name("ghost"), "roleKey": "backend" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, task) = ctx
        .send(
            "POST",
            &tasks_uri,
            Some(&owner.token),
            Some(json!({ "title": "assigned", "assignee_id": member.id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", task);
    assert_eq!(task["assignee_username"], member.username.as_str());

    let (status, _) = ctx
        .send(
            "POST",
            &members_uri,
            Some(&member.token),
            Some(json!({ "username": unique_name("x"), "roleKey": "backend" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(
            "DELETE",
            &format!("{}/{}", members_uri, owner.id),
            Some(&owner.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A non-owner targeting their own id is refused as a non-owner
    let (status, body) = ctx
        .send(
            "DELETE",
            &format!("{}/{}", members_uri, member.id),
            Some(&member.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = ctx
        .send(
            "DELETE",
            &format!("{}/{}", members_uri, member.id),
            Some(&owner.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .send(
            "POST",
            &tasks_uri,
            Some(&member.token),
            Some(json!({ "title": "after removal" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, projects) = ctx.send("GET", "/me/projects", Some(&owner.token), None).await;
    let listed = projects
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == project_id.to_string())
        .unwrap();
    assert_eq!(listed["members"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_project_update_and_delete() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.signup("olga").await;
    let project_id = ctx.create_project(&owner).await;

    let (status, updated) = ctx
        .send(
            "PUT",
            "/me/projects",
            Some(&owner.token),
            Some(json!({ "id": project_id, "name": "Renamed", "description": "New" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["name"], "Renamed");

    let (status, _) = ctx
        .send(
            "DELETE",
            &format!("/me/projects/{}", project_id),
            Some(&owner.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .send(
            "PUT",
            "/me/projects",
            Some(&owner.token),
            Some(json!({ "id": project_id, "name": "Again", "description": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_profile_rows() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.signup("pam").await;
    let token = Some(user.token.as_str());

    let (status, _) = ctx
        .send(
            "PUT",
            "/me/profile",
            token,
            Some(json!({ "name": "Pam", "headline": "  ", "bio": "Hi" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, skill) = ctx
        .send(
            "POST",
            "/me/skills",
            token,
            Some(json!({ "name": "Rust", "proficiency": 7 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", skill);

    let (status, _) = ctx
        .send(
            "POST",
            "/me/skills",
            token,
            Some(json!({ "name": "rust", "proficiency": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = ctx
        .send(
            "POST",
            "/me/educations",
            token,
            Some(json!({
                "school": "MIT", "degree": "BSc", "major": "CS",
                "startyear": 2023, "endyear": 2019
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .send(
            "POST",
            "/me/educations",
            token,
            Some(json!({
                "school": "MIT", "degree": "BSc", "major": "CS",
                "startyear": 2019, "endyear": 2023
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, profile) = ctx.send("GET", "/me/profile", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["username"], user.username.as_str());
    assert_eq!(profile["name"], "Pam");
    assert_eq!(profile["headline"], "");
    assert_eq!(profile["skills"][0]["name"], "Rust");
    assert_eq!(profile["educations"][0]["startyear"], 2019);

    let (status, _) = ctx
        .send("DELETE", &format!("/me/skills/{}", Uuid::new_v4()), token, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send(
            "DELETE",
            &format!("/me/skills/{}", skill["id"].as_str().unwrap()),
            token,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_and_root() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "connected");

    let (status, body) = ctx.send("GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}
