use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "request_id": "req_8949fb",
    "user_id": "user002",
    "leave_type": "casual_leave",
    "start_date": "2026-09-01",
    "number_of_days": 3,
    "reason": "Family trip",
    "status": "pending"
}))]
pub struct LeaveRequest {
    #[schema(example = "req_8949fb")]
    pub request_id: String,
    #[schema(example = "user002")]
    pub user_id: String,
    #[schema(example = "casual_leave")]
    pub leave_type: String,
    #[schema(example = "2026-09-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = 3)]
    pub number_of_days: u32,
    #[schema(example = "Family trip")]
    pub reason: String,
    #[schema(example = "pending")]
    pub status: LeaveStatus,
}
