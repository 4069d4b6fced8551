// HTTP request handlers
use crate::application::block_factory::Placement;
use crate::application::editor_session::EditorSession;
use crate::application::grid_adapter::{Breakpoint, GridItem, ResponsiveGrid};
use crate::application::layout_editor::BlockPatch;
use crate::domain::block::GridPosition;
use crate::domain::layout::DashboardSummary;
use crate::domain::template::{BlockTemplate, TemplateCategory};
use crate::infrastructure::event_stream::{ndjson_response, notification_stream};
use crate::infrastructure::http_response::{accepts_brotli, json_bytes_response};
use crate::infrastructure::layout_document::{BlockDocument, LayoutDocument};
use crate::presentation::api_error::ApiError;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Deserialize)]
pub struct TemplateQuery {
    pub category: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateDashboardRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct UpdateDetailsRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// A new block, either built from a template or given in full.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum AddBlockRequest {
    Block {
        block: BlockDocument,
    },
    #[serde(rename_all = "camelCase")]
    FromTemplate {
        template_id: String,
        #[serde(default)]
        position: Placement,
    },
}

#[derive(Deserialize)]
pub struct ReorderRequest {
    pub from: usize,
    pub to: usize,
}

#[derive(Deserialize)]
pub struct PasteRequest {
    pub blocks: Vec<BlockDocument>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectRequest {
    pub block_id: Option<String>,
}

#[derive(Deserialize)]
pub struct EventsQuery {
    pub dashboard: Option<String>,
}

/// Outcome of an editor operation.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    pub applied: bool,
    pub version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub block_ids: Vec<String>,
}

impl MutationResponse {
    fn from_session(session: &EditorSession, applied: bool) -> Self {
        Self {
            applied,
            version: session.version(),
            selected: session.selected().map(str::to_string),
            block_ids: Vec::new(),
        }
    }

    fn with_block_ids(mut self, ids: Vec<String>) -> Self {
        self.block_ids = ids;
        self
    }
}

async fn open_session(state: &AppState, id: &str) -> Result<Arc<Mutex<EditorSession>>, ApiError> {
    state
        .dashboard_service
        .open_dashboard(id)
        .await?
        .ok_or_else(|| ApiError::dashboard_not_found(id))
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List block templates, optionally for one category
pub async fn list_templates(
    Query(query): Query<TemplateQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BlockTemplate>>, ApiError> {
    let registry = state.dashboard_service.templates();
    let templates = match query.category {
        Some(category) => {
            let category: TemplateCategory = category.parse().map_err(ApiError::BadRequest)?;
            registry.by_category(category).into_iter().cloned().collect()
        }
        None => registry.all().to_vec(),
    };
    Ok(Json(templates))
}

pub async fn get_template(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<BlockTemplate>, ApiError> {
    state
        .dashboard_service
        .templates()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("template `{}` not found", id)))
}

pub async fn list_dashboards(State(state): State<Arc<AppState>>) -> Result<Json<Vec<DashboardSummary>>, ApiError> {
    Ok(Json(state.dashboard_service.list_dashboards().await?))
}

pub async fn create_dashboard(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateDashboardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("dashboard name must not be empty".to_string()));
    }
    let session = state.dashboard_service.create_dashboard(&request.name).await;
    let mut session = session.lock().await;
    session.update_details(None, request.description, request.tags);

    Ok((StatusCode::CREATED, Json(LayoutDocument::from(session.layout()))))
}

pub async fn get_dashboard(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<LayoutDocument>, ApiError> {
    let session = open_session(&state, &id).await?;
    let session = session.lock().await;
    Ok(Json(LayoutDocument::from(session.layout())))
}

pub async fn update_details(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateDetailsRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let session = open_session(&state, &id).await?;
    let mut session = session.lock().await;
    let applied = session.update_details(request.name, request.description, request.tags);
    Ok(Json(MutationResponse::from_session(&session, applied)))
}

pub async fn delete_dashboard(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    if state.dashboard_service.delete_dashboard(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::dashboard_not_found(&id))
    }
}

pub async fn close_dashboard(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> StatusCode {
    if state.dashboard_service.close_dashboard(&id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

pub async fn add_block(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddBlockRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = open_session(&state, &id).await?;
    let mut session = session.lock().await;
    let block_id = match request {
        AddBlockRequest::FromTemplate { template_id, position } => session.add_from_template(&template_id, position)?,
        AddBlockRequest::Block { block } => {
            let block = block.into_block().map_err(|e| ApiError::BadRequest(e.to_string()))?;
            let block_id = block.id().to_string();
            session.add_block(block)?;
            block_id
        }
    };

    let block = session
        .layout()
        .block(&block_id)
        .map(BlockDocument::from)
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("block `{}` vanished after insert", block_id)))?;
    Ok((StatusCode::CREATED, Json(block)))
}

pub async fn update_block(
    Path((id, block_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(patch): Json<BlockPatch>,
) -> Result<Json<MutationResponse>, ApiError> {
    let session = open_session(&state, &id).await?;
    let mut session = session.lock().await;
    let applied = session.update_block(&block_id, patch)?;
    Ok(Json(MutationResponse::from_session(&session, applied)))
}

pub async fn delete_block(
    Path((id, block_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<MutationResponse>, ApiError> {
    let session = open_session(&state, &id).await?;
    let mut session = session.lock().await;
    let applied = session.delete_block(&block_id);
    Ok(Json(MutationResponse::from_session(&session, applied)))
}

pub async fn duplicate_block(
    Path((id, block_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<MutationResponse>, ApiError> {
    let session = open_session(&state, &id).await?;
    let mut session = session.lock().await;
    let copy = session
        .duplicate_block(&block_id)?
        .ok_or_else(|| ApiError::NotFound(format!("block `{}` not found", block_id)))?;
    Ok(Json(MutationResponse::from_session(&session, true).with_block_ids(vec![copy])))
}

pub async fn reposition_block(
    Path((id, block_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(position): Json<GridPosition>,
) -> Result<Json<MutationResponse>, ApiError> {
    let session = open_session(&state, &id).await?;
    let mut session = session.lock().await;
    let applied = session.reposition_block(&block_id, position);
    Ok(Json(MutationResponse::from_session(&session, applied)))
}

pub async fn reorder_blocks(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let session = open_session(&state, &id).await?;
    let mut session = session.lock().await;
    let applied = session.reorder_blocks(request.from, request.to);
    Ok(Json(MutationResponse::from_session(&session, applied)))
}

pub async fn paste_blocks(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<PasteRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let blocks = request
        .blocks
        .into_iter()
        .map(BlockDocument::into_block)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let session = open_session(&state, &id).await?;
    let mut session = session.lock().await;
    let ids = session.paste_blocks(blocks)?;
    Ok(Json(MutationResponse::from_session(&session, !ids.is_empty()).with_block_ids(ids)))
}

pub async fn select_block(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let session = open_session(&state, &id).await?;
    let mut session = session.lock().await;
    let applied = session.select_block(request.block_id.as_deref());
    Ok(Json(MutationResponse::from_session(&session, applied)))
}

pub async fn responsive_grid(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ResponsiveGrid>, ApiError> {
    let session = open_session(&state, &id).await?;
    let session = session.lock().await;
    Ok(Json(session.responsive_grid()))
}

/// Drag/resize results reported by the grid for one breakpoint
pub async fn grid_layout_change(
    Path((id, breakpoint)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(items): Json<Vec<GridItem>>,
) -> Result<Json<MutationResponse>, ApiError> {
    let breakpoint: Breakpoint = breakpoint.parse().map_err(ApiError::BadRequest)?;
    let session = open_session(&state, &id).await?;
    let mut session = session.lock().await;
    let applied = session.apply_grid_changes(breakpoint, items);
    Ok(Json(MutationResponse::from_session(&session, applied)))
}

/// Download the layout document
pub async fn export_dashboard(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let compress = accepts_brotli(&headers);
    let session = open_session(&state, &id).await?;
    let json = session.lock().await.export_layout();

    let filename = download_filename(&id);
    match json_bytes_response(json.into_bytes(), compress, Some(&filename)).await {
        Ok(response) => Ok(response),
        Err(status) => Ok(status.into_response()),
    }
}

/// Attachment name for an export; only `[A-Za-z0-9_-]` survive from the id.
fn download_filename(id: &str) -> String {
    let stem: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        return "dashboard.json".to_string();
    }
    format!("{}.json", stem)
}

/// Replace the layout with an uploaded document
pub async fn import_dashboard(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<LayoutDocument>, ApiError> {
    let session = open_session(&state, &id).await?;
    let mut session = session.lock().await;
    session.import_layout(&body)?;
    Ok(Json(LayoutDocument::from(session.layout())))
}

pub async fn save_dashboard(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<MutationResponse>, ApiError> {
    let session = open_session(&state, &id).await?;
    let session = session.lock().await;
    session.save().await?;
    Ok(Json(MutationResponse::from_session(&session, true)))
}

/// Stream notifications as newline-delimited JSON
pub async fn stream_events(
    Query(query): Query<EventsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let rx = state.dashboard_service.notifications().subscribe();
    ndjson_response(notification_stream(rx, query.dashboard))
}
