use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront Promotions API",
        description = r#"
# Storefront Promotions API

Promotion code admission for the storefront checkout, plus the back-office
endpoints used to manage codes.

## Validation

`POST /api/v1/promotions/validate` answers whether a code applies to an order
amount. Business declines (unknown, inactive, expired, not yet valid, below the
minimum order, usage limit reached) come back as `200` with `valid: false` and a
machine-readable `reason`. Malformed input is a `400`.

## Redemption

`POST /api/v1/promotions/redeem` re-validates the code and consumes one use.
Concurrent redemptions never exceed the configured usage limit.

## Error Handling

Errors share one body format:

```json
{
  "error": "Bad Request",
  "message": "Invalid input: code must not be empty",
  "request_id": "5f0c...",
  "timestamp": "2026-10-19T10:30:00Z"
}
```
        "#
    ),
    tags(
        (name = "Promotions", description = "Storefront promotion code checks"),
        (name = "Promotions Admin", description = "Back-office promotion management")
    ),
    paths(
        crate::handlers::promotions::validate_promotion,
        crate::handlers::promotions::redeem_promotion,
        crate::handlers::promotions::list_promotions,
        crate::handlers::promotions::create_promotion,
        crate::handlers::promotions::get_promotion,
        crate::handlers::promotions::update_promotion,
        crate::handlers::promotions::delete_promotion,
        crate::handlers::promotions::activate_promotion,
        crate::handlers::promotions::deactivate_promotion,
    ),
    components(
        schemas(
            crate::models::Promotion,
            crate::commands::promotions::CreatePromotionCommand,
            crate::commands::promotions::UpdatePromotionCommand,
            crate::handlers::promotions::ValidatePromotionRequest,
            crate::handlers::promotions::RedeemPromotionRequest,
            crate::handlers::promotions::PromotionValidationResponse,
            crate::handlers::promotions::AppliedPromotionResponse,
            crate::handlers::common::PaginationMeta,
            crate::services::promotions::DeclineReason,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

/// Serves the generated document at `/api-docs/openapi.json`.
pub fn openapi_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDocV1::openapi()) }),
    )
}
