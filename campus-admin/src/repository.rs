use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use campus_core::config::CoreConfig;
use campus_core::db::DatabasePool;
use campus_core::errors::{CampusError, Result};
use campus_filters::{Issue, User};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sqlx::FromRow;
use uuid::Uuid;

use crate::forms::NewIssue;

/// Source of directory members for a tenant.
#[async_trait]
pub trait UserSource: Send + Sync {
    async fn list_users(&self, tenant: &str) -> Result<Vec<User>>;
}

/// Source and sink of exam issues for a tenant.
#[async_trait]
pub trait IssueSource: Send + Sync {
    async fn list_issues(&self, tenant: &str) -> Result<Vec<Issue>>;
    async fn create_issue(&self, tenant: &str, issue: NewIssue, reporter: &str) -> Result<Issue>;
    async fn set_closed(&self, tenant: &str, id: Uuid, closed: bool) -> Result<Issue>;
}

/// Applies the embedded migrations for both page families.
pub async fn migrate(pool: &DatabasePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool.inner())
        .await
        .map_err(|err| CampusError::DatabaseError(err.to_string()))
}

/// Connects using the supplied configuration, migrates, and returns both sources.
pub async fn connect_postgres(config: &CoreConfig) -> Result<(PgUserSource, PgIssueSource)> {
    let pool = DatabasePool::connect(config).await?;
    migrate(&pool).await?;
    Ok((PgUserSource::new(pool.clone()), PgIssueSource::new(pool)))
}

/// Directory members stored in Postgres.
#[derive(Clone)]
pub struct PgUserSource {
    pool: DatabasePool,
}

impl PgUserSource {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Exam issues stored in Postgres.
#[derive(Clone)]
pub struct PgIssueSource {
    pool: DatabasePool,
}

impl PgIssueSource {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserSource for PgUserSource {
    async fn list_users(&self, tenant: &str) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, tenant_id, first_name, last_name, user_name, class_name,
                   active, last_login, created_at
            FROM directory_users
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant)
        .fetch_all(self.pool.inner())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl IssueSource for PgIssueSource {
    async fn list_issues(&self, tenant: &str) -> Result<Vec<Issue>> {
        let rows = sqlx::query_as::<_, IssueRecord>(
            r#"
            SELECT id, tenant_id, student_first_name, student_last_name, class_name,
                   subject, description, reporter, closed, created_at, updated_at
            FROM exam_issues
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant)
        .fetch_all(self.pool.inner())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_issue(&self, tenant: &str, issue: NewIssue, reporter: &str) -> Result<Issue> {
        let row = sqlx::query_as::<_, IssueRecord>(
            r#"
            INSERT INTO exam_issues (
                id, tenant_id, student_first_name, student_last_name, class_name,
                subject, description, reporter, closed
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE)
            RETURNING
                id, tenant_id, student_first_name, student_last_name, class_name,
                subject, description, reporter, closed, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(tenant)
        .bind(&issue.student_first_name)
        .bind(&issue.student_last_name)
        .bind(&issue.class_name)
        .bind(&issue.subject)
        .bind(&issue.description)
        .bind(reporter)
        .fetch_one(self.pool.inner())
        .await?;

        Ok(row.into())
    }

    async fn set_closed(&self, tenant: &str, id: Uuid, closed: bool) -> Result<Issue> {
        let row = sqlx::query_as::<_, IssueRecord>(
            r#"
            UPDATE exam_issues
            SET closed = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING
                id, tenant_id, student_first_name, student_last_name, class_name,
                subject, description, reporter, closed, created_at, updated_at
            "#,
        )
        .bind(tenant)
        .bind(id)
        .bind(closed)
        .fetch_optional(self.pool.inner())
        .await?;

        row.map(Into::into)
            .ok_or_else(|| CampusError::NotFound(format!("issue {id}")))
    }
}

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    tenant_id: String,
    first_name: String,
    last_name: String,
    user_name: String,
    class_name: Option<String>,
    active: bool,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(row: UserRecord) -> Self {
        User {
            id: row.id,
            tenant_id: row.tenant_id,
            first_name: row.first_name,
            last_name: row.last_name,
            user_name: row.user_name,
            class_name: row.class_name,
            active: row.active,
            last_login: row.last_login,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct IssueRecord {
    id: Uuid,
    tenant_id: String,
    student_first_name: String,
    student_last_name: String,
    class_name: Option<String>,
    subject: String,
    description: Option<String>,
    reporter: String,
    closed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<IssueRecord> for Issue {
    fn from(row: IssueRecord) -> Self {
        Issue {
            id: row.id,
            tenant_id: row.tenant_id,
            student_first_name: row.student_first_name,
            student_last_name: row.student_last_name,
            class_name: row.class_name,
            subject: row.subject,
            description: row.description,
            reporter: row.reporter,
            closed: row.closed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// In-memory multi-tenant repository used for local runs and tests.
#[derive(Default, Clone)]
pub struct InMemoryRepository {
    users: Arc<RwLock<HashMap<String, Vec<User>>>>,
    issues: Arc<RwLock<HashMap<String, Vec<Issue>>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user under its own tenant.
    pub fn insert_user(&self, user: User) {
        let mut users = self.users.write();
        users.entry(user.tenant_id.clone()).or_default().push(user);
    }

    /// Adds an issue under its own tenant.
    pub fn insert_issue(&self, issue: Issue) {
        let mut issues = self.issues.write();
        issues.entry(issue.tenant_id.clone()).or_default().push(issue);
    }
}

#[async_trait]
impl UserSource for InMemoryRepository {
    async fn list_users(&self, tenant: &str) -> Result<Vec<User>> {
        let users = self.users.read();
        Ok(users.get(tenant).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl IssueSource for InMemoryRepository {
    async fn list_issues(&self, tenant: &str) -> Result<Vec<Issue>> {
        let issues = self.issues.read();
        Ok(issues.get(tenant).cloned().unwrap_or_default())
    }

    async fn create_issue(&self, tenant: &str, issue: NewIssue, reporter: &str) -> Result<Issue> {
        let now = Utc::now();
        let created = Issue {
            id: Uuid::new_v4(),
            tenant_id: tenant.to_string(),
            student_first_name: issue.student_first_name,
            student_last_name: issue.student_last_name,
            class_name: Some(issue.class_name),
            subject: issue.subject,
            description: issue.description,
            reporter: reporter.to_string(),
            closed: false,
            created_at: now,
            updated_at: now,
        };
        self.insert_issue(created.clone());
        Ok(created)
    }

    async fn set_closed(&self, tenant: &str, id: Uuid, closed: bool) -> Result<Issue> {
        let mut issues = self.issues.write();
        let issue = issues
            .get_mut(tenant)
            .and_then(|items| items.iter_mut().find(|issue| issue.id == id))
            .ok_or_else(|| CampusError::NotFound(format!("issue {id}")))?;

        if issue.closed != closed {
            issue.closed = closed;
            issue.updated_at = Utc::now();
        }
        Ok(issue.clone())
    }
}
