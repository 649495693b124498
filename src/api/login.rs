use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

use crate::store::JsonStore;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "user001")]
    pub user_id: String,
}

/* =========================
Login (identity lookup)
========================= */
/// Swagger doc for login endpoint
#[utoipa::path(
    post,
    path = "/login",
    request_body(
        content = LoginRequest,
        description = "User identity payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "User found", body = Object, example = json!({
            "success": true,
            "user": { "id": "user001", "name": "Ayesha Rahman", "role": "manager" }
        })),
        (status = 404, description = "User ID not found", body = Object, example = json!({
            "success": false,
            "error": "User ID not found"
        }))
    ),
    tag = "Auth"
)]
#[instrument(name = "login", skip(store, payload), fields(user_id = %payload.user_id))]
pub async fn login(
    payload: web::Json<LoginRequest>,
    store: web::Data<JsonStore>,
) -> actix_web::Result<impl Responder> {
    let users = store.load_users().map_err(|e| {
        error!(error = %e, "Failed to load users");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match users.iter().find(|u| u.user_id == payload.user_id) {
        Some(user) => {
            info!("login succeeded");
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "user": {
                    "id": user.user_id,
                    "name": user.name,
                    "role": user.role,
                }
            })))
        }
        None => Ok(HttpResponse::NotFound().json(json!({
            "success": false,
            "error": "User ID not found"
        }))),
    }
}
