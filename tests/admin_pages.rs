// End-to-end tests driving the admin pages over HTTP against in-memory records.
use std::net::SocketAddr;

use anyhow::anyhow;
use campus::{build_router, in_memory_state, AdminConfig, InMemoryRepository, Issue, User};
use campus_core::config::{CoreConfig, Environment};
use chrono::{Duration, Utc};
use reqwest::header::{COOKIE, REFERER, SET_COOKIE};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use uuid::Uuid;

const TENANT: &str = "school-a";

struct TestServer {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn stop(self) {
        let _ = self.shutdown.send(());
    }
}

fn test_config() -> AdminConfig {
    AdminConfig::from_core(CoreConfig {
        database_url: None,
        environment: Environment::Development,
        node_name: "test-node".into(),
        http_bind: "127.0.0.1:0".into(),
        local_utc_offset_minutes: Some(0),
        session_cookie: "campus_session".into(),
    })
}

fn seeded_repository() -> InMemoryRepository {
    let repository = InMemoryRepository::new();
    let now = Utc::now();
    for (first, class, active) in [("Dana", "12A", true), ("Avi", "12A", false), ("Noa", "11B", true)]
    {
        repository.insert_user(User {
            id: Uuid::new_v4(),
            tenant_id: TENANT.into(),
            first_name: first.into(),
            last_name: "Levi".into(),
            user_name: first.to_lowercase(),
            class_name: Some(class.into()),
            active,
            last_login: Some(now - Duration::days(1)),
            created_at: now - Duration::days(90),
        });
    }
    repository.insert_user(User {
        id: Uuid::new_v4(),
        tenant_id: "school-b".into(),
        first_name: "Other".into(),
        last_name: "Tenant".into(),
        user_name: "other".into(),
        class_name: None,
        active: true,
        last_login: None,
        created_at: now,
    });
    for (subject, closed) in [("Math", false), ("Physics", true)] {
        repository.insert_issue(Issue {
            id: Uuid::new_v4(),
            tenant_id: TENANT.into(),
            student_first_name: "Noa".into(),
            student_last_name: "Levi".into(),
            class_name: Some("11B".into()),
            subject: subject.into(),
            description: Some(format!("{subject} exam paper missing")),
            reporter: "m.katz".into(),
            closed,
            created_at: now - Duration::days(3),
            updated_at: now - Duration::days(3),
        });
    }
    repository
}

async fn spawn_server(repository: InMemoryRepository) -> anyhow::Result<TestServer> {
    let router = build_router(in_memory_state(test_config(), repository));
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await
            .ok();
    });
    Ok(TestServer { addr, shutdown: tx })
}

fn session_cookie(response: &reqwest::Response) -> anyhow::Result<String> {
    let raw = response
        .headers()
        .get(SET_COOKIE)
        .ok_or_else(|| anyhow!("no session cookie issued"))?
        .to_str()?;
    let pair = raw
        .split(';')
        .next()
        .ok_or_else(|| anyhow!("malformed cookie"))?;
    Ok(pair.trim().to_string())
}

fn names(body: &Value) -> Vec<String> {
    body["rows"]
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| row["full_name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn health_endpoint_reports_ok() -> anyhow::Result<()> {
    let server = spawn_server(InMemoryRepository::new()).await?;
    let response = reqwest::get(server.url("/health")).await?;
    assert!(response.status().is_success());
    assert_eq!(response.text().await?, "ok");
    server.stop();
    Ok(())
}

#[tokio::test]
async fn directory_filter_persists_within_page_and_resets_on_switch() -> anyhow::Result<()> {
    let server = spawn_server(seeded_repository()).await?;
    let client = reqwest::Client::new();
    let directory = format!("/tenants/{TENANT}/directory");

    let first = client.get(server.url(&directory)).send().await?;
    assert_eq!(first.status(), StatusCode::OK);
    let cookie = session_cookie(&first)?;
    let body: Value = first.json().await?;
    assert_eq!(body["total"], 3);
    assert_eq!(names(&body), vec!["Noa Levi", "Avi Levi", "Dana Levi"]);

    let filtered: Value = client
        .post(server.url(&directory))
        .header(COOKIE, &cookie)
        .header(REFERER, server.url(&directory))
        .json(&json!({ "show_active_or_open": true }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(names(&filtered), vec!["Noa Levi", "Dana Levi"]);

    let reloaded: Value = client
        .get(server.url(&format!("{directory}?sort=first_name&dir=desc")))
        .header(COOKIE, &cookie)
        .header(REFERER, server.url(&directory))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(names(&reloaded), vec!["Noa Levi", "Dana Levi"]);
    assert_eq!(reloaded["sort"]["key"], "first_name");

    let switched: Value = client
        .get(server.url(&directory))
        .header(COOKIE, &cookie)
        .header(REFERER, server.url(&format!("/tenants/{TENANT}/issues")))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(switched["shown"], 3);

    server.stop();
    Ok(())
}

#[tokio::test]
async fn issues_page_renders_visible_controls_only() -> anyhow::Result<()> {
    let server = spawn_server(seeded_repository()).await?;
    let body: Value = reqwest::get(server.url(&format!("/tenants/{TENANT}/issues")))
        .await?
        .json()
        .await?;

    let filter = body["filter"].as_object().ok_or_else(|| anyhow!("no filter panel"))?;
    assert!(filter.contains_key("subject_search"));
    assert!(filter.contains_key("show_closed"));
    assert!(!filter.contains_key("user_name_search"));
    assert_eq!(body["rows"].as_array().map(Vec::len), Some(2));

    server.stop();
    Ok(())
}

#[tokio::test]
async fn long_search_text_is_rejected() -> anyhow::Result<()> {
    let server = spawn_server(seeded_repository()).await?;
    let response = reqwest::Client::new()
        .post(server.url(&format!("/tenants/{TENANT}/issues")))
        .json(&json!({ "subject_search": "x".repeat(101) }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await?;
    assert!(body["fields"]["subject_search"].is_array());

    server.stop();
    Ok(())
}

#[tokio::test]
async fn issue_lifecycle_updates_listing() -> anyhow::Result<()> {
    let server = spawn_server(seeded_repository()).await?;
    let client = reqwest::Client::new();
    let issues = format!("/tenants/{TENANT}/issues");

    let created = client
        .post(server.url(&format!("{issues}/new")))
        .header("x-viewer-user", "r.cohen")
        .json(&json!({
            "student_first_name": "Avi",
            "student_last_name": "Levi",
            "class_name": "12A",
            "subject": "Chemistry",
            "description": "graded twice"
        }))
        .send()
        .await?;
    assert_eq!(created.status(), StatusCode::CREATED);
    let created: Value = created.json().await?;
    assert_eq!(created["reporter"], "r.cohen");
    assert_eq!(created["status"], "open");
    let id = created["id"].as_str().ok_or_else(|| anyhow!("no id"))?.to_string();

    let closed: Value = client
        .put(server.url(&format!("{issues}/{id}/closed")))
        .json(&json!({ "closed": true }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(closed["status"], "closed");

    let only_closed: Value = client
        .post(server.url(&issues))
        .header(REFERER, server.url(&issues))
        .json(&json!({ "show_closed": true }))
        .send()
        .await?
        .json()
        .await?;
    let subjects: Vec<_> = only_closed["rows"]
        .as_array()
        .map(|rows| rows.iter().filter_map(|r| r["subject"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(subjects.len(), 2);
    assert!(subjects.contains(&"Chemistry"));
    assert!(subjects.contains(&"Physics"));

    let missing = client
        .put(server.url(&format!("{issues}/{}/closed", Uuid::new_v4())))
        .json(&json!({ "closed": true }))
        .send()
        .await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    server.stop();
    Ok(())
}

#[tokio::test]
async fn incomplete_issue_is_rejected() -> anyhow::Result<()> {
    let server = spawn_server(InMemoryRepository::new()).await?;
    let response = reqwest::Client::new()
        .post(server.url(&format!("/tenants/{TENANT}/issues/new")))
        .json(&json!({
            "student_first_name": "Avi",
            "student_last_name": "",
            "class_name": "12A",
            "subject": " "
        }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await?;
    assert!(body["fields"]["student_last_name"].is_array());
    assert!(body["fields"]["subject"].is_array());

    server.stop();
    Ok(())
}

#[tokio::test]
async fn reset_endpoint_clears_stored_filter() -> anyhow::Result<()> {
    let server = spawn_server(seeded_repository()).await?;
    let client = reqwest::Client::new();
    let directory = format!("/tenants/{TENANT}/directory");

    let first = client
        .post(server.url(&directory))
        .header(REFERER, server.url(&directory))
        .json(&json!({ "show_active_or_open": true }))
        .send()
        .await?;
    let cookie = session_cookie(&first)?;

    let reset = client
        .delete(server.url(&format!("/tenants/{TENANT}/filters/directory")))
        .header(COOKIE, &cookie)
        .send()
        .await?;
    assert_eq!(reset.status(), StatusCode::OK);

    let after: Value = client
        .get(server.url(&directory))
        .header(COOKIE, &cookie)
        .header(REFERER, server.url(&directory))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(after["shown"], 3);

    let unknown = client
        .delete(server.url(&format!("/tenants/{TENANT}/filters/gradebook")))
        .send()
        .await?;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    server.stop();
    Ok(())
}
