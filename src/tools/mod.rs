pub mod leave;

use std::str::FromStr;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde_json::{Value, json};
use strum_macros::{Display, EnumString};

use crate::store::JsonStore;
use leave::{LeaveAction, ToolResult};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ToolName {
    GetLeaveBalance,
    ApplyForLeave,
    CheckLeaveStatus,
    GetAllPendingRequests,
    ManageLeaveRequest,
}

/// Privilege class. A documentation hint for the resolver only: enforcement
/// lives inside each manager-only handler, so a misrouted call still fails
/// with an access error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Access {
    Public,
    ManagerOnly,
}

pub enum ParamKind {
    Str,
    Date,
    Int,
    Action,
}

pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    /// Bound from the authenticated caller, never from resolver output.
    pub identity: bool,
}

pub struct ToolSpec {
    pub name: ToolName,
    pub description: &'static str,
    pub access: Access,
    pub params: &'static [ParamSpec],
}

pub static CATALOG: &[ToolSpec] = &[
    ToolSpec {
        name: ToolName::GetLeaveBalance,
        description: "Fetch available leave balances (casual, sick, earned) for a user.",
        access: Access::Public,
        params: &[ParamSpec {
            name: "user_id",
            kind: ParamKind::Str,
            description: "The unique identifier of the user, e.g., 'user001'.",
            identity: true,
        }],
    },
    ToolSpec {
        name: ToolName::ApplyForLeave,
        description:
            "Apply for a leave by specifying user ID, leave type, days, start date, and reason.",
        access: Access::Public,
        params: &[
            ParamSpec {
                name: "user_id",
                kind: ParamKind::Str,
                description: "The unique identifier of the user applying for leave.",
                identity: true,
            },
            ParamSpec {
                name: "leave_type",
                kind: ParamKind::Str,
                description: "The type of leave: 'casual_leave', 'sick_leave', or 'earned_leave'.",
                identity: false,
            },
            ParamSpec {
                name: "start_date",
                kind: ParamKind::Date,
                description: "The start date of the leave in YYYY-MM-DD format.",
                identity: false,
            },
            ParamSpec {
                name: "number_of_days",
                kind: ParamKind::Int,
                description: "The total number of days for the leave.",
                identity: false,
            },
            ParamSpec {
                name: "reason",
                kind: ParamKind::Str,
                description: "The reason for taking the leave.",
                identity: false,
            },
        ],
    },
    ToolSpec {
        name: ToolName::CheckLeaveStatus,
        description: "Check the leave request history and status for a user.",
        access: Access::Public,
        params: &[ParamSpec {
            name: "user_id",
            kind: ParamKind::Str,
            description: "The unique identifier of the user checking their leave status.",
            identity: true,
        }],
    },
    ToolSpec {
        name: ToolName::GetAllPendingRequests,
        description:
            "FOR MANAGERS ONLY. Fetch all leave requests that are currently pending approval.",
        access: Access::ManagerOnly,
        params: &[ParamSpec {
            name: "manager_id",
            kind: ParamKind::Str,
            description: "The user ID of the manager making the request, e.g., 'user001'.",
            identity: true,
        }],
    },
    ToolSpec {
        name: ToolName::ManageLeaveRequest,
        description: "FOR MANAGERS ONLY. Approve or reject a specific leave request by its ID.",
        access: Access::ManagerOnly,
        params: &[
            ParamSpec {
                name: "manager_id",
                kind: ParamKind::Str,
                description: "The user ID of the manager taking the action.",
                identity: true,
            },
            ParamSpec {
                name: "request_id",
                kind: ParamKind::Str,
                description: "The unique ID of the leave request to be managed, e.g., 'req_8949fb'.",
                identity: false,
            },
            ParamSpec {
                name: "action",
                kind: ParamKind::Action,
                description: "The action to take: 'approved' or 'rejected'.",
                identity: false,
            },
        ],
    },
];

/// The catalog rendered once, for resolver prompts and diagnostics.
pub static CATALOG_JSON: Lazy<Value> = Lazy::new(|| {
    Value::Array(
        CATALOG
            .iter()
            .map(|spec| {
                let params: Vec<Value> = spec
                    .params
                    .iter()
                    .filter(|p| !p.identity)
                    .map(|p| {
                        json!({
                            "name": p.name,
                            "type": match p.kind {
                                ParamKind::Str => "string",
                                ParamKind::Date => "date (YYYY-MM-DD)",
                                ParamKind::Int => "integer",
                                ParamKind::Action => "'approved' | 'rejected'",
                            },
                            "description": p.description,
                        })
                    })
                    .collect();
                json!({
                    "name": spec.name.to_string(),
                    "description": spec.description,
                    "access": match spec.access {
                        Access::Public => "public",
                        Access::ManagerOnly => "manager_only",
                    },
                    "parameters": params,
                })
            })
            .collect(),
    )
});

#[derive(Debug, thiserror::Error)]
pub enum BindError {
    #[error("missing required argument '{0}'")]
    Missing(&'static str),
    #[error("argument '{name}' is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// One operation, fully bound and validated. Identity parameters always come
/// from the authenticated caller, never from the resolver's argument payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    GetLeaveBalance {
        user_id: String,
    },
    ApplyForLeave {
        user_id: String,
        leave_type: String,
        start_date: NaiveDate,
        number_of_days: u32,
        reason: String,
    },
    CheckLeaveStatus {
        user_id: String,
    },
    GetAllPendingRequests {
        manager_id: String,
    },
    ManageLeaveRequest {
        manager_id: String,
        request_id: String,
        action: LeaveAction,
    },
}

impl ToolInvocation {
    pub fn bind(name: ToolName, args: &Value, caller_id: &str) -> Result<Self, BindError> {
        let caller = caller_id.to_string();
        match name {
            ToolName::GetLeaveBalance => Ok(Self::GetLeaveBalance { user_id: caller }),
            ToolName::CheckLeaveStatus => Ok(Self::CheckLeaveStatus { user_id: caller }),
            ToolName::GetAllPendingRequests => {
                Ok(Self::GetAllPendingRequests { manager_id: caller })
            }
            ToolName::ApplyForLeave => Ok(Self::ApplyForLeave {
                user_id: caller,
                leave_type: str_arg(args, "leave_type")?,
                start_date: date_arg(args, "start_date")?,
                number_of_days: int_arg(args, "number_of_days")?,
                reason: str_arg(args, "reason")?,
            }),
            ToolName::ManageLeaveRequest => Ok(Self::ManageLeaveRequest {
                manager_id: caller,
                request_id: str_arg(args, "request_id")?,
                action: action_arg(args, "action")?,
            }),
        }
    }

    pub fn name(&self) -> ToolName {
        match self {
            Self::GetLeaveBalance { .. } => ToolName::GetLeaveBalance,
            Self::ApplyForLeave { .. } => ToolName::ApplyForLeave,
            Self::CheckLeaveStatus { .. } => ToolName::CheckLeaveStatus,
            Self::GetAllPendingRequests { .. } => ToolName::GetAllPendingRequests,
            Self::ManageLeaveRequest { .. } => ToolName::ManageLeaveRequest,
        }
    }
}

fn str_arg(args: &Value, name: &'static str) -> Result<String, BindError> {
    match args.get(name) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::String(_)) => Err(BindError::Invalid {
            name,
            reason: "must not be empty".to_string(),
        }),
        Some(other) => Err(BindError::Invalid {
            name,
            reason: format!("expected a string, got {other}"),
        }),
        None => Err(BindError::Missing(name)),
    }
}

fn date_arg(args: &Value, name: &'static str) -> Result<NaiveDate, BindError> {
    let raw = str_arg(args, name)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| BindError::Invalid {
        name,
        reason: format!("'{raw}' is not a YYYY-MM-DD date: {e}"),
    })
}

fn int_arg(args: &Value, name: &'static str) -> Result<u32, BindError> {
    let value = args.get(name).ok_or(BindError::Missing(name))?;
    // Model resolvers occasionally quote numbers; accept both forms.
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) if n <= u32::MAX as u64 => Ok(n as u32),
        _ => Err(BindError::Invalid {
            name,
            reason: format!("expected a non-negative integer, got {value}"),
        }),
    }
}

fn action_arg(args: &Value, name: &'static str) -> Result<LeaveAction, BindError> {
    let raw = str_arg(args, name)?;
    LeaveAction::from_str(&raw.to_lowercase()).map_err(|_| BindError::Invalid {
        name,
        reason: format!("'{raw}' is not one of 'approved', 'rejected'"),
    })
}

/// Run one bound operation against the store, holding the store's advisory
/// lock for the whole load-mutate-save cycle.
pub fn execute(store: &JsonStore, invocation: &ToolInvocation) -> anyhow::Result<ToolResult> {
    let _guard = store.guard();
    match invocation {
        ToolInvocation::GetLeaveBalance { user_id } => leave::get_leave_balance(store, user_id),
        ToolInvocation::ApplyForLeave {
            user_id,
            leave_type,
            start_date,
            number_of_days,
            reason,
        } => leave::apply_for_leave(
            store,
            user_id,
            leave_type,
            *start_date,
            *number_of_days,
            reason,
        ),
        ToolInvocation::CheckLeaveStatus { user_id } => leave::check_leave_status(store, user_id),
        ToolInvocation::GetAllPendingRequests { manager_id } => {
            leave::get_all_pending_requests(store, manager_id)
        }
        ToolInvocation::ManageLeaveRequest {
            manager_id,
            request_id,
            action,
        } => leave::manage_leave_request(store, manager_id, request_id, *action),
    }
}
