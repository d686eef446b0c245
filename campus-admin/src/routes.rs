use std::sync::Arc;

use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::header::REFERER;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use campus_core::{CampusError, ValidationReport};
use campus_filters::{
    FilterContext, FilterState, Navigation, PageFamily, SessionBackend, SortSpec,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AdminConfig;
use crate::error::{AppError, AppResult};
use crate::forms::{FilterSubmission, IssueStatusUpdate, NewIssue};
use crate::orchestrator::{PageOrchestrator, PageRequest};
use crate::projection::{FilterPanel, IssueRow, PageResponse, UserRow};
use crate::repository::{IssueSource, UserSource};

pub const VIEWER_LAST_LOGIN_HEADER: &str = "x-viewer-last-login";
pub const VIEWER_USER_HEADER: &str = "x-viewer-user";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    users: Arc<dyn UserSource>,
    issues: Arc<dyn IssueSource>,
    pages: PageOrchestrator<Arc<dyn SessionBackend>>,
    settings: Arc<AdminConfig>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserSource>,
        issues: Arc<dyn IssueSource>,
        sessions: Arc<dyn SessionBackend>,
        settings: AdminConfig,
    ) -> Self {
        let pages = PageOrchestrator::new(sessions, settings.defaults.clone());
        Self {
            users,
            issues,
            pages,
            settings: Arc::new(settings),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/tenants/:tenant/directory",
            get(directory_page).post(filter_directory),
        )
        .route("/tenants/:tenant/issues", get(issues_page).post(filter_issues))
        .route("/tenants/:tenant/issues/new", post(create_issue))
        .route("/tenants/:tenant/issues/:id/closed", put(set_issue_closed))
        .route("/tenants/:tenant/filters/:family", delete(reset_filter))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}

#[derive(Debug, Default, Deserialize)]
struct SortQuery {
    sort: Option<String>,
    dir: Option<String>,
}

impl SortQuery {
    fn spec(&self) -> SortSpec {
        SortSpec::from_query(self.sort.as_deref(), self.dir.as_deref())
    }
}

/// Request facts shared by both listing pages.
struct PageInput {
    tenant: String,
    sort: SortSpec,
    navigation: Navigation,
    context: FilterContext,
}

impl PageInput {
    fn new(tenant: String, query: &SortQuery, uri: &OriginalUri, headers: &HeaderMap) -> Self {
        let referer = headers
            .get(REFERER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        Self {
            tenant,
            sort: query.spec(),
            navigation: Navigation::new(uri.0.path(), referer),
            context: FilterContext {
                viewer_last_login: viewer_last_login(headers),
            },
        }
    }

    fn request<'a>(
        self,
        session_id: &'a str,
        family: PageFamily,
        submission: Option<FilterState>,
    ) -> PageRequest<'a> {
        PageRequest {
            session_id,
            family,
            navigation: self.navigation,
            sort: self.sort,
            context: self.context,
            submission,
        }
    }
}

fn viewer_last_login(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let raw = headers.get(VIEWER_LAST_LOGIN_HEADER)?.to_str().ok()?;
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(value) => Some(value.with_timezone(&Utc)),
        Err(err) => {
            debug!(%err, raw, "ignoring unparseable viewer last login");
            None
        }
    }
}

fn viewer_name(headers: &HeaderMap) -> String {
    headers
        .get(VIEWER_USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("anonymous")
        .to_string()
}

/// Session id from the cookie, issuing a fresh one when absent.
fn ensure_session(jar: CookieJar, cookie_name: &str) -> (CookieJar, String) {
    if let Some(existing) = jar.get(cookie_name) {
        if !existing.value().is_empty() {
            let id = existing.value().to_string();
            return (jar, id);
        }
    }

    let id = Uuid::new_v4().to_string();
    let cookie = Cookie::build((cookie_name.to_string(), id.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    debug!(session = %id, "issued new session");
    (jar.add(cookie), id)
}

fn ensure_valid(report: ValidationReport) -> AppResult<()> {
    if report.is_valid() {
        Ok(())
    } else {
        Err(AppError::invalid(&report))
    }
}

fn submitted_state(state: &AppState, form: FilterSubmission) -> AppResult<FilterState> {
    ensure_valid(form.validate())?;
    Ok(form.into_state(state.settings.local_zone))
}

async fn render_directory(
    state: AppState,
    input: PageInput,
    jar: CookieJar,
    submission: Option<FilterState>,
) -> AppResult<(CookieJar, Json<PageResponse<UserRow>>)> {
    let (jar, session_id) = ensure_session(jar, state.settings.session_cookie());
    let users = state.users.list_users(&input.tenant).await?;
    let outcome = state.pages.run(
        input.request(&session_id, PageFamily::Directory, submission),
        users,
    );
    Ok((jar, Json(PageResponse::from_outcome(PageFamily::Directory, outcome))))
}

async fn render_issues(
    state: AppState,
    input: PageInput,
    jar: CookieJar,
    submission: Option<FilterState>,
) -> AppResult<(CookieJar, Json<PageResponse<IssueRow>>)> {
    let (jar, session_id) = ensure_session(jar, state.settings.session_cookie());
    let issues = state.issues.list_issues(&input.tenant).await?;
    let outcome = state.pages.run(
        input.request(&session_id, PageFamily::Issues, submission),
        issues,
    );
    Ok((jar, Json(PageResponse::from_outcome(PageFamily::Issues, outcome))))
}

async fn directory_page(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    Query(query): Query<SortQuery>,
    uri: OriginalUri,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<PageResponse<UserRow>>)> {
    let input = PageInput::new(tenant, &query, &uri, &headers);
    render_directory(state, input, jar, None).await
}

async fn filter_directory(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    Query(query): Query<SortQuery>,
    uri: OriginalUri,
    headers: HeaderMap,
    jar: CookieJar,
    Json(form): Json<FilterSubmission>,
) -> AppResult<(CookieJar, Json<PageResponse<UserRow>>)> {
    let submission = submitted_state(&state, form)?;
    let input = PageInput::new(tenant, &query, &uri, &headers);
    render_directory(state, input, jar, Some(submission)).await
}

async fn issues_page(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    Query(query): Query<SortQuery>,
    uri: OriginalUri,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<PageResponse<IssueRow>>)> {
    let input = PageInput::new(tenant, &query, &uri, &headers);
    render_issues(state, input, jar, None).await
}

async fn filter_issues(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    Query(query): Query<SortQuery>,
    uri: OriginalUri,
    headers: HeaderMap,
    jar: CookieJar,
    Json(form): Json<FilterSubmission>,
) -> AppResult<(CookieJar, Json<PageResponse<IssueRow>>)> {
    let submission = submitted_state(&state, form)?;
    let input = PageInput::new(tenant, &query, &uri, &headers);
    render_issues(state, input, jar, Some(submission)).await
}

async fn create_issue(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<NewIssue>,
) -> AppResult<(StatusCode, Json<IssueRow>)> {
    let payload = payload.normalized();
    ensure_valid(payload.validate())?;

    let reporter = viewer_name(&headers);
    let issue = state.issues.create_issue(&tenant, payload, &reporter).await?;
    info!(%tenant, issue = %issue.id, %reporter, "exam issue created");
    Ok((StatusCode::CREATED, Json(issue.into())))
}

async fn set_issue_closed(
    State(state): State<AppState>,
    Path((tenant, id)): Path<(String, Uuid)>,
    Json(update): Json<IssueStatusUpdate>,
) -> AppResult<Json<IssueRow>> {
    let issue = state.issues.set_closed(&tenant, id, update.closed).await?;
    info!(%tenant, issue = %id, closed = update.closed, "exam issue status changed");
    Ok(Json(issue.into()))
}

#[derive(Debug, Serialize)]
struct ResetResponse {
    family: PageFamily,
    filter: FilterPanel,
}

async fn reset_filter(
    State(state): State<AppState>,
    Path((_tenant, family)): Path<(String, String)>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<ResetResponse>)> {
    let family = PageFamily::parse(&family)
        .ok_or_else(|| AppError::not_found(format!("unknown page family '{family}'")))?;
    let (jar, session_id) = ensure_session(jar, state.settings.session_cookie());
    let defaults = state
        .pages
        .reset(&session_id, family)
        .map_err(|err| AppError::from(CampusError::from(err)))?;

    Ok((
        jar,
        Json(ResetResponse {
            family,
            filter: FilterPanel::from_state(&defaults),
        }),
    ))
}
