use crate::api::invoke::AgentRequest;
use crate::api::login::LoginRequest;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::role::Role;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Management Agent API",
        version = "1.0.0",
        description = r#"
## Agentic Leave Management System

A single-endpoint API that resolves free-text leave-management queries to one
of a fixed set of operations and returns that operation's result directly.

### 🔹 Operations
- **get_leave_balance** — remaining days per leave type
- **apply_for_leave** — validation, balance debit, pending request creation
- **check_leave_status** — a user's request history
- **get_all_pending_requests** — managers only
- **manage_leave_request** — approve/reject, with credit-back on rejection

### 🔐 Access
Manager-only operations verify the caller's stored role; a non-manager
invocation returns an access-denied result rather than an HTTP error.

### 📦 Response Format
Every operation returns `{success: true, ...}` or `{success: false, error}`.
Resolution failures (query maps to no operation) return HTTP 422.

---
Built with **Rust**, **Actix Web**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::login::login,
        crate::api::invoke::agent_invoke,
    ),
    components(
        schemas(
            LoginRequest,
            AgentRequest,
            LeaveRequest,
            LeaveStatus,
            Role,
        )
    ),
    tags(
        (name = "Auth", description = "Identity lookup"),
        (name = "Agent", description = "Free-text query resolution and execution"),
    )
)]
pub struct ApiDoc;
