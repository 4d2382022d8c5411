use std::collections::HashMap;
use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use manuscript_core::article::{Article, ArticleCreate, ArticlePatch};
use manuscript_core::events::{EditorEvent, VersionCommitted};
use manuscript_core::ledger::{diff_contents, DiffLine, Version};
use manuscript_core::patch::{PatchError, PendingSuggestions, Suggestion};
use manuscript_core::store::ListFilter;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub const DEFAULT_AUTHOR: &str = "anonymous";

/// Article, version history and editing routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/articles", post(create_article).get(list_articles))
        .route(
            "/v1/articles/{id}",
            get(get_article)
                .patch(update_article)
                .put(update_article)
                .delete(delete_article),
        )
        .route("/v1/articles/{id}/versions", get(list_versions))
        .route("/v1/articles/{id}/versions/{number}", get(get_version))
        .route("/v1/articles/{id}/revert/{number}", post(revert_article))
        .route("/v1/articles/{id}/diff", get(diff_versions))
        .route("/v1/articles/{id}/suggestions/apply", post(apply_suggestions))
        .route("/v1/articles/{id}/events", get(article_events))
}

#[derive(Debug, Deserialize)]
struct AuthorQuery {
    #[serde(default = "default_author")]
    author: String,
}

fn default_author() -> String {
    DEFAULT_AUTHOR.to_string()
}

fn publish_commit(state: &AppState, article: &Article, reverted_from: Option<u32>) {
    let receivers = state.event_bus().publish(EditorEvent::VersionCommitted(
        VersionCommitted::latest(article, reverted_from),
    ));
    tracing::debug!(
        article_id = %article.article_id(),
        version = article.current_version(),
        receivers,
        "published version event"
    );
}

async fn create_article(
    State(state): State<AppState>,
    Query(query): Query<AuthorQuery>,
    Json(input): Json<ArticleCreate>,
) -> ApiResult<(StatusCode, Json<Article>)> {
    let article = state.store().create(input, &query.author).await?;
    publish_commit(&state, &article, None);
    Ok((StatusCode::CREATED, Json(article)))
}

async fn list_articles(
    State(state): State<AppState>,
    Query(filter): Query<ListFilter>,
) -> ApiResult<Json<Vec<Article>>> {
    Ok(Json(state.store().list(&filter).await?))
}

async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Article>> {
    Ok(Json(state.store().get(id).await?))
}

async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AuthorQuery>,
    Json(patch): Json<ArticlePatch>,
) -> ApiResult<Json<Article>> {
    let outcome = state.store().update(id, patch, &query.author).await?;
    if outcome.committed {
        publish_commit(&state, &outcome.article, None);
    }
    Ok(Json(outcome.article))
}

async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.store().delete(id).await?;
    state
        .event_bus()
        .publish(EditorEvent::ArticleDeleted { article_id: id });
    Ok(StatusCode::NO_CONTENT)
}

async fn list_versions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Version>>> {
    Ok(Json(state.store().list_versions(id).await?))
}

async fn get_version(
    State(state): State<AppState>,
    Path((id, number)): Path<(Uuid, u32)>,
) -> ApiResult<Json<Version>> {
    Ok(Json(state.store().get_version(id, number).await?))
}

async fn revert_article(
    State(state): State<AppState>,
    Path((id, number)): Path<(Uuid, u32)>,
    Query(query): Query<AuthorQuery>,
) -> ApiResult<Json<Article>> {
    let article = state.store().revert(id, number, &query.author).await?;
    publish_commit(&state, &article, Some(number));
    Ok(Json(article))
}

#[derive(Debug, Deserialize)]
struct DiffQuery {
    from: Option<u32>,
    to: Option<u32>,
}

#[derive(Debug, Serialize)]
struct DiffResponse {
    from: u32,
    to: u32,
    lines: Vec<DiffLine>,
}

/// Line diff between two versions; defaults to the latest change.
async fn diff_versions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DiffQuery>,
) -> ApiResult<Json<DiffResponse>> {
    let article = state.store().get(id).await?;
    let to = query.to.unwrap_or_else(|| article.current_version());
    let from = query.from.unwrap_or_else(|| to.saturating_sub(1).max(1));

    let document = article.document();
    let old = document
        .require_version(from)
        .map_err(|e| ApiError::NotFound(e.to_string()))?;
    let new = document
        .require_version(to)
        .map_err(|e| ApiError::NotFound(e.to_string()))?;

    Ok(Json(DiffResponse {
        from,
        to,
        lines: diff_contents(old.content(), new.content()),
    }))
}

#[derive(Debug, Deserialize)]
struct ApplySuggestionsRequest {
    /// Version the suggestions were computed against.
    base_version: u32,
    suggestions: Vec<Suggestion>,
    /// Indices into `suggestions` to apply; all of them when absent.
    #[serde(default)]
    selected: Option<Vec<usize>>,
    #[serde(default)]
    changes_summary: Option<String>,
}

#[derive(Debug, Serialize)]
struct RejectedSuggestion {
    index: usize,
    stale: bool,
    error: String,
}

impl RejectedSuggestion {
    fn new(index: usize, error: &PatchError) -> Self {
        Self {
            index,
            stale: error.is_stale(),
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ApplySuggestionsResponse {
    article: Article,
    applied: Vec<usize>,
    rejected: Vec<RejectedSuggestion>,
}

/// Apply suggestions to the current content and commit the result.
async fn apply_suggestions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AuthorQuery>,
    Json(request): Json<ApplySuggestionsRequest>,
) -> ApiResult<Json<ApplySuggestionsResponse>> {
    let article = state.store().get(id).await?;
    if article.current_version() != request.base_version {
        return Err(ApiError::Conflict(format!(
            "suggestions were computed for version {}, article is at version {}",
            request.base_version,
            article.current_version()
        )));
    }

    let count = request.suggestions.len();
    let mut selected = match request.selected {
        Some(indices) => {
            if let Some(i) = indices.iter().find(|&&i| i >= count) {
                return Err(ApiError::BadRequest(format!(
                    "selected index {i} out of range (0..{count})"
                )));
            }
            indices
        }
        None => (0..count).collect(),
    };
    selected.sort_unstable();
    selected.dedup();

    // Suggestions that do not match the current text never enter the pending set.
    let mut pending = PendingSuggestions::new();
    let mut ids = Vec::with_capacity(count);
    let mut index_of = HashMap::with_capacity(count);
    let mut rejected = Vec::new();
    for (index, suggestion) in request.suggestions.into_iter().enumerate() {
        match suggestion.check(article.content()) {
            Ok(()) => {
                let id = pending.push(suggestion);
                index_of.insert(id, index);
                ids.push(Some(id));
            }
            Err(error) => {
                if selected.binary_search(&index).is_ok() {
                    rejected.push(RejectedSuggestion::new(index, &error));
                }
                ids.push(None);
            }
        }
    }

    let selected_ids: Vec<_> = selected
        .iter()
        .filter_map(|&i| ids.get(i).copied().flatten())
        .collect();
    let outcome = pending.apply_batch(article.content(), &selected_ids);
    rejected.extend(outcome.rejected.iter().filter_map(|r| {
        index_of
            .get(&r.id)
            .map(|&index| RejectedSuggestion::new(index, &r.error))
    }));
    rejected.sort_by_key(|r| r.index);
    let applied: Vec<usize> = outcome
        .applied
        .iter()
        .filter_map(|id| index_of.get(id).copied())
        .collect();

    let article = if applied.is_empty() {
        article
    } else {
        let mut patch = ArticlePatch::content(request.base_version, outcome.content);
        patch.changes_summary = Some(
            request
                .changes_summary
                .unwrap_or_else(|| format!("Applied {} suggestion(s)", applied.len())),
        );
        let updated = state.store().update(id, patch, &query.author).await?;
        if updated.committed {
            publish_commit(&state, &updated.article, None);
        }
        updated.article
    };

    tracing::info!(
        article_id = %id,
        applied = applied.len(),
        rejected = rejected.len(),
        "suggestions applied"
    );
    Ok(Json(ApplySuggestionsResponse {
        article,
        applied,
        rejected,
    }))
}

fn event_name(event: &EditorEvent) -> &'static str {
    match event {
        EditorEvent::Welcome => "welcome",
        EditorEvent::VersionCommitted(_) => "versionCommitted",
        EditorEvent::ArticleDeleted { .. } => "articleDeleted",
    }
}

fn to_sse(event: &EditorEvent) -> Option<Event> {
    match Event::default().event(event_name(event)).json_data(event) {
        Ok(sse) => Some(sse),
        Err(e) => {
            tracing::warn!(error = %e, "failed to encode event");
            None
        }
    }
}

/// Server-sent events for one article's commits and deletion.
async fn article_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    state.store().get(id).await?;
    let receiver = state.event_bus().subscribe();

    let updates = BroadcastStream::new(receiver).filter_map(move |message| match message {
        Ok(event) if event.article_id() == Some(id) => to_sse(&event),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(article_id = %id, error = %e, "event listener lagged");
            None
        }
    });
    let stream = tokio_stream::iter(to_sse(&EditorEvent::Welcome))
        .chain(updates)
        .map(Ok);

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
