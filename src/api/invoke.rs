use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::agent::{AgentError, AgentService};
use crate::model::role::Role;

#[derive(Deserialize, ToSchema)]
pub struct AgentRequest {
    #[schema(example = "user002")]
    pub user_id: String,
    /// Advisory only; authorization is decided from the stored record.
    #[serde(default)]
    #[schema(example = "employee")]
    pub role: Role,
    #[schema(example = "Apply for casual leave from 2026-09-01 for 3 days, family trip")]
    pub query: String,
}

/* =========================
Agent invocation
========================= */
/// Swagger doc for agent_invoke endpoint
#[utoipa::path(
    post,
    path = "/agent/invoke",
    request_body(
        content = AgentRequest,
        description = "Free-text query plus caller identity",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Raw result of the resolved operation", body = Object,
         example = json!({
            "success": true,
            "message": "Leave application submitted and is now pending approval.",
            "request_id": "req_8949fb",
            "new_balance": 2
         })),
        (status = 422, description = "Query could not be resolved to an operation", body = Object,
         example = json!({
            "success": false,
            "error": "could not map the query to any operation: sing me a song"
         })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Agent"
)]
pub async fn agent_invoke(
    payload: web::Json<AgentRequest>,
    agent: web::Data<AgentService>,
) -> actix_web::Result<impl Responder> {
    info!(user_id = %payload.user_id, role = %payload.role, query = %payload.query, "agent invocation");

    match agent
        .invoke(&payload.user_id, payload.role, &payload.query)
        .await
    {
        // The operation's result flows back unmodified, success or not.
        Ok(result) => Ok(HttpResponse::Ok().json(result)),
        Err(AgentError::Resolution(msg)) => {
            info!(error = %msg, "query resolution failed");
            Ok(HttpResponse::UnprocessableEntity().json(json!({
                "success": false,
                "error": msg
            })))
        }
        Err(AgentError::Internal(err)) => {
            error!(error = %err, "agent invocation failed");
            Err(actix_web::error::ErrorInternalServerError("Internal Server Error"))
        }
    }
}
