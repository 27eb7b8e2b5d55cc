use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};

use crate::themealdb::MealDbClient;
use cookbook_core::models::{Recipe, RecipeUpdate, recipe_from_fields, validate_recipe_name};
use cookbook_core::planner::{DragSource, DropOutcome, DropTarget, MealPlan, SlotKey};
use cookbook_core::service::CookbookService;
use cookbook_core::shopping::ShoppingList;
use cookbook_core::store::Backend;

const BODY_LIMIT: usize = 1024 * 1024; // 1 MB

#[derive(Clone)]
struct AppState {
    service: Arc<Mutex<CookbookService>>,
    client: Arc<MealDbClient>,
}

impl AppState {
    fn service(&self) -> MutexGuard<'_, CookbookService> {
        self.service.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Deserialize)]
struct AssignSlotRequest {
    recipe_id: String,
}

#[derive(Deserialize)]
struct DropRequest {
    source: DragSource,
    #[serde(default)]
    destination: Option<DropTarget>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    backend: Backend,
}

#[derive(Serialize)]
struct PlannedSlotResponse {
    slot: SlotKey,
    recipe: Recipe,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => {
                error!(error = %format!("{err:#}"), "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

fn parse_slot(raw: &str) -> Result<SlotKey, ApiError> {
    raw.parse()
        .map_err(|e: anyhow::Error| ApiError::BadRequest(e.to_string()))
}

// --- Middleware ---

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Handlers: catalog ---

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend: state.service().backend(),
    })
}

async fn search_catalog(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Json<Vec<Recipe>> {
    Json(state.client.search(&params.q).await)
}

async fn random_recipe(State(state): State<AppState>) -> Result<Json<Recipe>, ApiError> {
    state
        .client
        .random()
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No random recipe available".to_string()))
}

// --- Handlers: saved recipes ---

async fn list_recipes(State(state): State<AppState>) -> Result<Json<Vec<Recipe>>, ApiError> {
    let recipes = state.service().list_recipes().context("storage error")?;
    Ok(Json(recipes))
}

/// Accepts a TheMealDB meal object or a legacy flat record.
async fn save_recipe(
    State(state): State<AppState>,
    Json(fields): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<Recipe>), ApiError> {
    let recipe = recipe_from_fields(&fields).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let saved = state
        .service()
        .save_recipe(&recipe)
        .context("storage error")?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Recipe>, ApiError> {
    state
        .service()
        .get_recipe(&id)
        .context("storage error")?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Recipe {id} not found")))
}

async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<RecipeUpdate>,
) -> Result<Json<Recipe>, ApiError> {
    validate_recipe_name(&update.name).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    state
        .service()
        .update_recipe(&id, &update)
        .context("storage error")?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Recipe {id} not found")))
}

async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    // Deleting an unknown id succeeds
    state
        .service()
        .delete_recipe(&id)
        .context("storage error")?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Handlers: meal plan ---

async fn get_plan(State(state): State<AppState>) -> Json<MealPlan> {
    Json(state.service().plan().clone())
}

async fn clear_plan(State(state): State<AppState>) -> StatusCode {
    state.service().clear_plan();
    StatusCode::NO_CONTENT
}

async fn assign_slot(
    State(state): State<AppState>,
    Path(slot): Path<String>,
    Json(req): Json<AssignSlotRequest>,
) -> Result<Json<PlannedSlotResponse>, ApiError> {
    let slot = parse_slot(&slot)?;
    let mut svc = state.service();
    if svc
        .get_recipe(&req.recipe_id)
        .context("storage error")?
        .is_none()
    {
        return Err(ApiError::NotFound(format!(
            "Recipe {} not found",
            req.recipe_id
        )));
    }
    let recipe = svc.assign_slot(slot, &req.recipe_id)?;
    Ok(Json(PlannedSlotResponse { slot, recipe }))
}

async fn clear_slot(
    State(state): State<AppState>,
    Path(slot): Path<String>,
) -> Result<StatusCode, ApiError> {
    let slot = parse_slot(&slot)?;
    state.service().clear_slot(slot);
    Ok(StatusCode::NO_CONTENT)
}

async fn drop_recipe(
    State(state): State<AppState>,
    Json(req): Json<DropRequest>,
) -> Result<Json<DropOutcome>, ApiError> {
    let mut svc = state.service();
    if let DragSource::SavedList { recipe_id } = &req.source {
        if svc.get_recipe(recipe_id).context("storage error")?.is_none() {
            return Err(ApiError::NotFound(format!("Recipe {recipe_id} not found")));
        }
    }
    let outcome = svc.handle_drop(&req.source, req.destination.as_ref())?;
    info!(?outcome, "meal plan drop");
    Ok(Json(outcome))
}

async fn shopping_list(State(state): State<AppState>) -> Result<Json<ShoppingList>, ApiError> {
    state
        .service()
        .shopping_list()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Nothing to list: the meal plan is empty".to_string()))
}

// --- Router ---

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/catalog/search", get(search_catalog))
        .route("/api/catalog/random", get(random_recipe))
        .route("/api/recipes", get(list_recipes).post(save_recipe))
        .route(
            "/api/recipes/{id}",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        .route("/api/plan", get(get_plan).delete(clear_plan))
        .route("/api/plan/slots/{slot}", put(assign_slot).delete(clear_slot))
        .route("/api/plan/drop", post(drop_recipe))
        .route("/api/plan/shopping-list", get(shopping_list))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(
    service: CookbookService,
    client: MealDbClient,
    port: u16,
    bind: &str,
) -> anyhow::Result<()> {
    let backend = service.backend();
    let state = AppState {
        service: Arc::new(Mutex::new(service)),
        client: Arc::new(client),
    };

    let app = build_router(state);

    if bind != "127.0.0.1" && bind != "localhost" {
        eprintln!(
            "Warning: Listening on {bind}. Any device on your network can read and change your cookbook."
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("Failed to bind {bind}:{port}"))?;
    info!(%backend, "serving cookbook on http://{bind}:{port}");
    eprintln!("Listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
