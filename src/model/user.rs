use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::role::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    /// Remaining days per leave type, e.g. "casual_leave" -> 5.
    pub leave_balances: BTreeMap<String, u32>,
}
