use crate::handlers::common::{
    created_response, json_body, map_service_error, no_content_response, success_response,
    validate_input, PaginatedResponse,
};
use crate::{
    commands::promotions::{CreatePromotionCommand, UpdatePromotionCommand},
    errors::{ApiError, ErrorResponse},
    models::Promotion,
    services::promotions::{DeclineReason, PromotionFilter, ValidationResult},
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Storefront-facing routes, nested under `/promotions`.
pub fn promotion_routes() -> Router<AppState> {
    Router::new()
        .route("/validate", post(validate_promotion))
        .route("/redeem", post(redeem_promotion))
}

/// Back-office routes, nested under `/admin/promotions`.
pub fn admin_promotion_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_promotions).post(create_promotion))
        .route(
            "/:id",
            get(get_promotion)
                .put(update_promotion)
                .delete(delete_promotion),
        )
        .route("/:id/activate", post(activate_promotion))
        .route("/:id/deactivate", post(deactivate_promotion))
}

// Request DTOs

/// Body of a validation request. Both fields are optional at the JSON level
/// so that missing values surface as `400 Invalid input` with the standard
/// error body.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidatePromotionRequest {
    #[schema(example = "WELCOME10")]
    pub code: Option<String>,
    #[schema(value_type = Option<f64>, example = 120.0)]
    pub order_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedeemPromotionRequest {
    pub code: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub order_amount: Option<Decimal>,
    pub order_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPromotionsQuery {
    /// 1-based page number
    pub page: Option<u64>,
    /// Page size, clamped to the configured maximum
    pub per_page: Option<u64>,
    /// Only active or only inactive promotions
    pub active: Option<bool>,
}

// Response DTOs

/// Discount granted by an accepted code.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppliedPromotionResponse {
    pub id: Uuid,
    pub code: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub discount_percent: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub discount_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub min_order: Decimal,
}

/// Outcome of validating or redeeming a code. Business declines are
/// reported here with `valid: false`, never as an HTTP error.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromotionValidationResponse {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<AppliedPromotionResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<DeclineReason>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<f64>)]
    pub min_order: Option<Decimal>,
}

impl From<ValidationResult> for PromotionValidationResponse {
    fn from(result: ValidationResult) -> Self {
        match result {
            ValidationResult::Valid(applied) => Self {
                valid: true,
                promotion: Some(AppliedPromotionResponse {
                    id: applied.promotion_id,
                    code: applied.code,
                    discount_percent: applied.discount_percent,
                    discount_amount: applied.discount_amount,
                    min_order: applied.min_order,
                }),
                error: None,
                reason: None,
                min_order: None,
            },
            ValidationResult::Declined(declined) => Self {
                valid: false,
                promotion: None,
                error: Some(declined.message),
                reason: Some(declined.reason),
                min_order: declined.min_order,
            },
        }
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::BadRequest(format!("Invalid input: {} is required", field)))
}

// Handlers

/// Check whether a promotion code applies to an order
#[utoipa::path(
    post,
    path = "/api/v1/promotions/validate",
    request_body = ValidatePromotionRequest,
    responses(
        (status = 200, description = "Code evaluated; see `valid`", body = PromotionValidationResponse),
        (status = 400, description = "Malformed input", body = ErrorResponse),
        (status = 500, description = "Promotion store unavailable", body = ErrorResponse)
    ),
    tag = "Promotions"
)]
pub async fn validate_promotion(
    State(state): State<AppState>,
    payload: Result<Json<ValidatePromotionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(payload)?;
    let code = required(request.code, "code")?;
    let order_amount = required(request.order_amount, "orderAmount")?;

    let result = state
        .services
        .promotions
        .validate(&code, order_amount)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PromotionValidationResponse::from(result)))
}

/// Redeem a promotion code for a committed order
#[utoipa::path(
    post,
    path = "/api/v1/promotions/redeem",
    request_body = RedeemPromotionRequest,
    responses(
        (status = 200, description = "Code redeemed or declined; see `valid`", body = PromotionValidationResponse),
        (status = 400, description = "Malformed input", body = ErrorResponse),
        (status = 500, description = "Promotion store unavailable", body = ErrorResponse)
    ),
    tag = "Promotions"
)]
pub async fn redeem_promotion(
    State(state): State<AppState>,
    payload: Result<Json<RedeemPromotionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(payload)?;
    let code = required(request.code, "code")?;
    let order_amount = required(request.order_amount, "orderAmount")?;

    let result = state
        .services
        .promotions
        .redeem(&code, order_amount, request.order_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PromotionValidationResponse::from(result)))
}

/// List promotions, newest first
#[utoipa::path(
    get,
    path = "/api/v1/admin/promotions",
    params(ListPromotionsQuery),
    responses(
        (status = 200, description = "Page of promotions", body = PaginatedResponse<Promotion>)
    ),
    tag = "Promotions Admin"
)]
pub async fn list_promotions(
    State(state): State<AppState>,
    Query(query): Query<ListPromotionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let service = &state.services.promotions;
    let page = query.page.unwrap_or(1).max(1);
    let per_page = service.page_size(query.per_page);

    let (promotions, total) = service
        .list(
            PromotionFilter {
                active: query.active,
            },
            page,
            Some(per_page),
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        promotions, page, per_page, total,
    )))
}

/// Create a promotion
#[utoipa::path(
    post,
    path = "/api/v1/admin/promotions",
    request_body = CreatePromotionCommand,
    responses(
        (status = 201, description = "Promotion created", body = Promotion),
        (status = 400, description = "Invalid promotion", body = ErrorResponse),
        (status = 409, description = "Code already exists", body = ErrorResponse)
    ),
    tag = "Promotions Admin"
)]
pub async fn create_promotion(
    State(state): State<AppState>,
    payload: Result<Json<CreatePromotionCommand>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let command = json_body(payload)?;
    validate_input(&command)?;

    let promotion = state
        .services
        .promotions
        .create(command)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(promotion))
}

/// Fetch a promotion by id
#[utoipa::path(
    get,
    path = "/api/v1/admin/promotions/{id}",
    params(("id" = Uuid, Path, description = "Promotion id")),
    responses(
        (status = 200, description = "Promotion", body = Promotion),
        (status = 404, description = "Unknown promotion", body = ErrorResponse)
    ),
    tag = "Promotions Admin"
)]
pub async fn get_promotion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let promotion = state
        .services
        .promotions
        .get(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(promotion))
}

/// Partially update a promotion
#[utoipa::path(
    put,
    path = "/api/v1/admin/promotions/{id}",
    params(("id" = Uuid, Path, description = "Promotion id")),
    request_body = UpdatePromotionCommand,
    responses(
        (status = 200, description = "Updated promotion", body = Promotion),
        (status = 400, description = "Invalid update", body = ErrorResponse),
        (status = 404, description = "Unknown promotion", body = ErrorResponse)
    ),
    tag = "Promotions Admin"
)]
pub async fn update_promotion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdatePromotionCommand>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let command = json_body(payload)?;
    validate_input(&command)?;

    let promotion = state
        .services
        .promotions
        .update(id, command)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(promotion))
}

/// Delete a promotion
#[utoipa::path(
    delete,
    path = "/api/v1/admin/promotions/{id}",
    params(("id" = Uuid, Path, description = "Promotion id")),
    responses(
        (status = 204, description = "Promotion deleted"),
        (status = 404, description = "Unknown promotion", body = ErrorResponse)
    ),
    tag = "Promotions Admin"
)]
pub async fn delete_promotion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .promotions
        .delete(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Activate a promotion
#[utoipa::path(
    post,
    path = "/api/v1/admin/promotions/{id}/activate",
    params(("id" = Uuid, Path, description = "Promotion id")),
    responses(
        (status = 200, description = "Promotion activated", body = Promotion),
        (status = 404, description = "Unknown promotion", body = ErrorResponse)
    ),
    tag = "Promotions Admin"
)]
pub async fn activate_promotion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let promotion = state
        .services
        .promotions
        .activate(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(promotion))
}

/// Deactivate a promotion
#[utoipa::path(
    post,
    path = "/api/v1/admin/promotions/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Promotion id")),
    responses(
        (status = 200, description = "Promotion deactivated", body = Promotion),
        (status = 404, description = "Unknown promotion", body = ErrorResponse)
    ),
    tag = "Promotions Admin"
)]
pub async fn deactivate_promotion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let promotion = state
        .services
        .promotions
        .deactivate(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(promotion))
}
