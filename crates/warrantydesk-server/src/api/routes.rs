//! Router, shared state and handlers.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;
use warrantydesk_core::{DocumentType, FeePolicy};

use super::dto::{
    AuthResponse, CommentResponse, CreateCommentRequest, CreateVehicleRequest, DisabilityResponse,
    DocumentResponse, LoginRequest, PaymentCallbackQuery, PaymentRequestResponse,
    ProfileResponse, RefreshTokenRequest, RegisterRequest, UpdateDisabilityRequest,
    UpdateProfileRequest, VehicleResponse,
};
use super::extract::{ApiJson, AuthUser};
use crate::auth::JwtManager;
use crate::config::PaymentUrls;
use crate::server::{
    AuthService, CommentService, DocumentService, DocumentStore, DocumentUpload,
    MAX_DOCUMENT_BYTES, PaymentGateway, PaymentService, ProfileService, ServiceError,
    VehicleService,
};
use crate::storage::{Database, Document, Vehicle};

/// Request body ceiling on the upload route: one maximal file plus
/// multipart framing and the other form fields.
const MAX_UPLOAD_BODY: usize = MAX_DOCUMENT_BYTES + 64 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub jwt: Arc<JwtManager>,
    pub auth: Arc<AuthService>,
    pub profile: Arc<ProfileService>,
    pub vehicles: Arc<VehicleService>,
    pub comments: Arc<CommentService>,
    pub documents: Arc<DocumentService>,
    pub payments: Arc<PaymentService>,
    pub urls: Arc<PaymentUrls>,
}

impl AppState {
    pub fn new(
        db: Database,
        jwt: Arc<JwtManager>,
        fee: Arc<dyn FeePolicy>,
        gateway: Arc<dyn PaymentGateway>,
        documents: Arc<dyn DocumentStore>,
        urls: PaymentUrls,
    ) -> Self {
        Self {
            auth: Arc::new(AuthService::new(db.clone(), Arc::clone(&jwt))),
            profile: Arc::new(ProfileService::new(db.clone())),
            vehicles: Arc::new(VehicleService::new(db.clone())),
            comments: Arc::new(CommentService::new(db.clone())),
            documents: Arc::new(DocumentService::new(db.clone(), documents)),
            payments: Arc::new(PaymentService::new(db, fee, gateway)),
            jwt,
            urls: Arc::new(urls),
        }
    }
}

/// Build the application router. CORS is only enabled when an allowed
/// origin is given.
pub fn build_router(state: AppState, cors_origin: Option<HeaderValue>) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh-token", post(refresh_token))
        .route("/api/profile", get(get_profile).put(update_profile))
        .route(
            "/api/profile/disability",
            get(get_disability).put(update_disability),
        )
        .route("/api/vehicles", post(create_vehicle))
        .route("/api/vehicles/my-vehicles", get(my_vehicles))
        .route(
            "/api/vehicles/{vehicle_id}/comments",
            get(list_comments).post(create_comment),
        )
        .route(
            "/api/vehicles/{vehicle_id}/documents",
            get(list_documents)
                .post(upload_document)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY)),
        )
        .route("/api/payment/request/{vehicle_id}", post(request_payment))
        .route("/api/payment/callback", get(payment_callback))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    match cors_origin {
        Some(origin) => router.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST, Method::PUT])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE]),
        ),
        None => router,
    }
}

type ApiResult<T> = Result<T, ServiceError>;

/// `GET /health`
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// =========================================================================
// Auth
// =========================================================================

/// `POST /api/auth/register`
async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    state.auth.register(&req.into()).await?;
    Ok(Json(AuthResponse::message(true, "Registration successful")))
}

/// `POST /api/auth/login`
async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let tokens = state.auth.login(&req.national_code, &req.password).await?;
    Ok(Json(AuthResponse::with_tokens("Login successful", tokens)))
}

/// `POST /api/auth/refresh-token`
async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshTokenRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let tokens = state.auth.refresh(&req.token, &req.refresh_token).await?;
    Ok(Json(AuthResponse::with_tokens("Token refreshed", tokens)))
}

// =========================================================================
// Profile
// =========================================================================

/// `GET /api/profile`
async fn get_profile(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = state.profile.get_profile(&user.user_id).await?;
    Ok(Json(profile.into()))
}

/// `PUT /api/profile`
async fn update_profile(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = state
        .profile
        .update_profile(&user.user_id, &req.as_update())
        .await?;
    Ok(Json(profile.into()))
}

/// `GET /api/profile/disability`
async fn get_disability(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<DisabilityResponse>> {
    let info = state
        .profile
        .get_disability(&user.user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Disability record".to_string()))?;
    Ok(Json(info.into()))
}

/// `PUT /api/profile/disability`
async fn update_disability(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UpdateDisabilityRequest>,
) -> ApiResult<Json<DisabilityResponse>> {
    let info = state
        .profile
        .set_disability(&user.user_id, &req.into())
        .await?;
    Ok(Json(info.into()))
}

// =========================================================================
// Vehicles
// =========================================================================

fn vehicle_response(vehicle: Vehicle) -> ApiResult<VehicleResponse> {
    VehicleResponse::try_from(vehicle).map_err(|e| ServiceError::internal("Stored case status", e))
}

/// `POST /api/vehicles`
async fn create_vehicle(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateVehicleRequest>,
) -> ApiResult<(StatusCode, Json<VehicleResponse>)> {
    let vehicle = state
        .vehicles
        .create_vehicle(&user.user_id, &req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(vehicle_response(vehicle)?)))
}

/// `GET /api/vehicles/my-vehicles`
async fn my_vehicles(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<VehicleResponse>>> {
    let vehicles = state.vehicles.list_vehicles(&user.user_id).await?;
    let body = vehicles
        .into_iter()
        .map(vehicle_response)
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(body))
}

// =========================================================================
// Comments
// =========================================================================

/// `GET /api/vehicles/{vehicle_id}/comments`
async fn list_comments(
    user: AuthUser,
    Path(vehicle_id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<CommentResponse>>> {
    let comments = state
        .comments
        .list_comments(&vehicle_id, &user.user_id)
        .await?;
    Ok(Json(comments.into_iter().map(Into::into).collect()))
}

/// `POST /api/vehicles/{vehicle_id}/comments`
async fn create_comment(
    user: AuthUser,
    Path(vehicle_id): Path<String>,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentResponse>)> {
    let comment = state
        .comments
        .create_comment(&vehicle_id, &user.user_id, &req.content)
        .await?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}

// =========================================================================
// Documents
// =========================================================================

fn document_response(document: Document) -> ApiResult<DocumentResponse> {
    DocumentResponse::try_from(document)
        .map_err(|e| ServiceError::internal("Stored document type", e))
}

/// `GET /api/vehicles/{vehicle_id}/documents`
async fn list_documents(
    user: AuthUser,
    Path(vehicle_id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<DocumentResponse>>> {
    let documents = state
        .documents
        .list_documents(&vehicle_id, &user.user_id)
        .await?;
    let body = documents
        .into_iter()
        .map(document_response)
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(body))
}

/// `POST /api/vehicles/{vehicle_id}/documents`, a `multipart/form-data`
/// body with a `file` part and an optional `type` part.
async fn upload_document(
    user: AuthUser,
    Path(vehicle_id): Path<String>,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<DocumentResponse>)> {
    let mut multipart = multipart.map_err(|e| ServiceError::validation(e.body_text()))?;

    let mut file = None;
    let mut document_type = DocumentType::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::validation(e.body_text()))?
    {
        let name = field.name().map(str::to_ascii_lowercase);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServiceError::validation(e.body_text()))?;
                file = Some((file_name, content_type, bytes));
            }
            Some("type") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ServiceError::validation(e.body_text()))?;
                document_type = raw
                    .parse()
                    .map_err(|e: warrantydesk_core::Error| ServiceError::validation(e.to_string()))?;
            }
            _ => {}
        }
    }

    let Some((file_name, content_type, bytes)) = file else {
        return Err(ServiceError::validation("File is required"));
    };

    let upload = DocumentUpload {
        file_name,
        content_type,
        document_type,
        bytes: bytes.to_vec(),
    };
    let document = state
        .documents
        .upload_document(&vehicle_id, &user.user_id, &upload)
        .await?;
    Ok((StatusCode::CREATED, Json(document_response(document)?)))
}

// =========================================================================
// Payment
// =========================================================================

/// `POST /api/payment/request/{vehicle_id}`
async fn request_payment(
    user: AuthUser,
    Path(vehicle_id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<PaymentRequestResponse>> {
    let request = state
        .payments
        .create_payment_request(&vehicle_id, &user.user_id)
        .await?;
    Ok(Json(request.into()))
}

/// `GET /api/payment/callback`. Called by the gateway without a bearer
/// token. Only the invoice id and its current paid state are trusted, and
/// a query that cannot be read sends the browser to the failure page.
async fn payment_callback(
    State(state): State<AppState>,
    query: Result<Query<PaymentCallbackQuery>, QueryRejection>,
) -> ApiResult<Redirect> {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Unreadable payment callback");
            return Ok(Redirect::to(&state.urls.failure_redirect()));
        }
    };

    let settled = state
        .payments
        .verify_payment(&query.invoice_id, query.is_success, query.trace_id.as_deref())
        .await?;

    let target = if settled {
        state.urls.success_redirect()
    } else {
        state.urls.failure_redirect()
    };
    Ok(Redirect::to(&target))
}
