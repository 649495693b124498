use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::{Value, json};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use crate::model::{
    leave_request::{LeaveRequest, LeaveStatus},
    role::Role,
    user::User,
};
use crate::store::JsonStore;

/// Action a manager takes on a pending request.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum LeaveAction {
    Approved,
    Rejected,
}

/// Domain-level failures. These are data, not exceptions: they serialize into
/// the `{success: false, error}` envelope and never reach the HTTP boundary
/// as a 5xx. Only persistence failures propagate (as `anyhow::Error`).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToolError {
    #[error("User with ID '{0}' not found.")]
    UserNotFound(String),
    #[error("Leave request '{0}' not found.")]
    RequestNotFound(String),
    #[error("Invalid start date. Cannot apply for leave in the past.")]
    PastStartDate,
    #[error("Invalid leave type '{got}'. Valid types: {valid}.")]
    InvalidLeaveType { got: String, valid: String },
    #[error("number_of_days must be at least 1.")]
    ZeroDays,
    #[error("Insufficient leave balance: requested {requested} day(s), available {available}.")]
    InsufficientBalance { requested: u32, available: u32 },
    #[error("Access denied. Only managers can view all pending requests.")]
    NotManagerPending,
    #[error("Only managers can approve or reject leave requests.")]
    NotManagerManage,
    #[error("Request '{id}' is already {status}.")]
    AlreadyDecided { id: String, status: LeaveStatus },
    #[error("Employee '{0}' not found. Action aborted.")]
    OwnerMissing(String),
}

/// Successful operation payloads, serialized flat into the result envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolReply {
    Balance {
        user_name: String,
        balances: BTreeMap<String, u32>,
    },
    Applied {
        message: String,
        request_id: String,
        new_balance: u32,
    },
    Requests {
        requests: Vec<LeaveRequest>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Managed {
        message: String,
    },
}

pub type ToolResult = Result<ToolReply, ToolError>;

/// Render a tool result as the wire envelope: `success: true` merged into the
/// payload, or `{success: false, error}`.
pub fn envelope(result: &ToolResult) -> Value {
    match result {
        Ok(reply) => match serde_json::to_value(reply) {
            Ok(Value::Object(mut map)) => {
                map.insert("success".to_string(), Value::Bool(true));
                Value::Object(map)
            }
            _ => json!({ "success": true }),
        },
        Err(err) => json!({ "success": false, "error": err.to_string() }),
    }
}

/// Authorization gate: does this actor hold the manager role?
/// An absent actor is not an error, it is simply not a manager.
pub fn is_manager(users: &[User], user_id: &str) -> bool {
    users
        .iter()
        .find(|u| u.user_id == user_id)
        .map(|u| u.role == Role::Manager)
        .unwrap_or(false)
}

fn new_request_id() -> String {
    format!("req_{}", &Uuid::new_v4().to_simple().to_string()[..6])
}

pub fn get_leave_balance(store: &JsonStore, user_id: &str) -> anyhow::Result<ToolResult> {
    let users = store.load_users()?;
    match users.iter().find(|u| u.user_id == user_id) {
        Some(user) => Ok(Ok(ToolReply::Balance {
            user_name: user.name.clone(),
            balances: user.leave_balances.clone(),
        })),
        None => Ok(Err(ToolError::UserNotFound(user_id.to_string()))),
    }
}

pub fn apply_for_leave(
    store: &JsonStore,
    user_id: &str,
    leave_type: &str,
    start_date: NaiveDate,
    number_of_days: u32,
    reason: &str,
) -> anyhow::Result<ToolResult> {
    if start_date < Local::now().date_naive() {
        return Ok(Err(ToolError::PastStartDate));
    }

    let mut users = store.load_users()?;
    let Some(user) = users.iter_mut().find(|u| u.user_id == user_id) else {
        return Ok(Err(ToolError::UserNotFound(user_id.to_string())));
    };

    let Some(&available) = user.leave_balances.get(leave_type) else {
        let valid = user
            .leave_balances
            .keys()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        return Ok(Err(ToolError::InvalidLeaveType {
            got: leave_type.to_string(),
            valid,
        }));
    };

    if number_of_days == 0 {
        return Ok(Err(ToolError::ZeroDays));
    }
    if available < number_of_days {
        return Ok(Err(ToolError::InsufficientBalance {
            requested: number_of_days,
            available,
        }));
    }

    let new_balance = available - number_of_days;
    user.leave_balances
        .insert(leave_type.to_string(), new_balance);
    store.save_users(&users)?;

    let request = LeaveRequest {
        request_id: new_request_id(),
        user_id: user_id.to_string(),
        leave_type: leave_type.to_string(),
        start_date,
        number_of_days,
        reason: reason.to_string(),
        status: LeaveStatus::Pending,
    };
    let mut requests = store.load_requests()?;
    requests.push(request.clone());
    store.save_requests(&requests)?;

    tracing::info!(user_id, request_id = %request.request_id, leave_type, "leave application submitted");

    Ok(Ok(ToolReply::Applied {
        message: "Leave application submitted and is now pending approval.".to_string(),
        request_id: request.request_id,
        new_balance,
    }))
}

pub fn check_leave_status(store: &JsonStore, user_id: &str) -> anyhow::Result<ToolResult> {
    let requests = store.load_requests()?;
    let mine: Vec<LeaveRequest> = requests
        .into_iter()
        .filter(|r| r.user_id == user_id)
        .collect();
    let message = mine
        .is_empty()
        .then(|| format!("No leave requests found for user '{user_id}'."));
    Ok(Ok(ToolReply::Requests { requests: mine, message }))
}

pub fn get_all_pending_requests(store: &JsonStore, manager_id: &str) -> anyhow::Result<ToolResult> {
    let users = store.load_users()?;
    if !is_manager(&users, manager_id) {
        return Ok(Err(ToolError::NotManagerPending));
    }

    let requests = store.load_requests()?;
    let pending: Vec<LeaveRequest> = requests
        .into_iter()
        .filter(|r| r.status == LeaveStatus::Pending)
        .collect();
    let message = pending
        .is_empty()
        .then(|| "No pending leave requests found.".to_string());
    Ok(Ok(ToolReply::Requests {
        requests: pending,
        message,
    }))
}

pub fn manage_leave_request(
    store: &JsonStore,
    manager_id: &str,
    request_id: &str,
    action: LeaveAction,
) -> anyhow::Result<ToolResult> {
    let mut users = store.load_users()?;
    if !is_manager(&users, manager_id) {
        return Ok(Err(ToolError::NotManagerManage));
    }

    let mut requests = store.load_requests()?;
    let Some(pos) = requests.iter().position(|r| r.request_id == request_id) else {
        return Ok(Err(ToolError::RequestNotFound(request_id.to_string())));
    };

    // Terminal states stay terminal.
    if requests[pos].status != LeaveStatus::Pending {
        return Ok(Err(ToolError::AlreadyDecided {
            id: request_id.to_string(),
            status: requests[pos].status,
        }));
    }

    match action {
        LeaveAction::Approved => {
            requests[pos].status = LeaveStatus::Approved;
        }
        LeaveAction::Rejected => {
            requests[pos].status = LeaveStatus::Rejected;
            let owner_id = requests[pos].user_id.clone();
            match users.iter_mut().find(|u| u.user_id == owner_id) {
                Some(owner) => {
                    *owner
                        .leave_balances
                        .entry(requests[pos].leave_type.clone())
                        .or_insert(0) += requests[pos].number_of_days;
                    store.save_users(&users)?;
                }
                None => {
                    // Inconsistent store: the owning actor vanished. Put the
                    // in-memory record back to pending and bail before any
                    // write, so the request is not stranded in a terminal
                    // state with no credited balance.
                    requests[pos].status = LeaveStatus::Pending;
                    tracing::warn!(request_id, owner_id, "reject aborted: owning user missing");
                    return Ok(Err(ToolError::OwnerMissing(owner_id)));
                }
            }
        }
    }

    store.save_requests(&requests)?;
    tracing::info!(manager_id, request_id, action = %action, "leave request decided");

    Ok(Ok(ToolReply::Managed {
        message: format!("Leave request '{request_id}' {action} successfully."),
    }))
}
