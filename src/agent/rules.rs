//! Deterministic keyword resolver. Default when no model key is configured,
//! and the resolver used by the test suite. It only needs to pick the
//! operation and scrape best-effort arguments; binding validates the rest.

use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate};
use serde_json::json;

use super::{QueryResolver, ResolveError, ResolveRequest, ToolChoice};
use crate::tools::ToolName;

pub struct RuleResolver;

#[async_trait]
impl QueryResolver for RuleResolver {
    async fn resolve(&self, request: &ResolveRequest<'_>) -> Result<ToolChoice, ResolveError> {
        resolve_query(request.query)
            .ok_or_else(|| ResolveError::Unresolved(request.query.to_string()))
    }
}

fn resolve_query(query: &str) -> Option<ToolChoice> {
    let lower = query.to_lowercase();
    let tokens = tokenize(&lower);

    // Approve/reject a specific request, identified by its req_ id.
    if let (Some(action), Some(request_id)) = (find_action(&lower), find_request_id(&tokens)) {
        return Some(ToolChoice {
            tool: ToolName::ManageLeaveRequest,
            arguments: json!({ "request_id": request_id, "action": action }),
        });
    }

    // "Who needs approval", "show pending requests". An approve/reject intent
    // without a request id also lands here, so the manager sees what to act on.
    if lower.contains("pending") || lower.contains("approv") || lower.contains("reject") {
        return Some(ToolChoice {
            tool: ToolName::GetAllPendingRequests,
            arguments: json!({}),
        });
    }

    // A leave application needs an intent verb plus at least one concrete
    // argument, otherwise "I want to know my leave status" would match.
    let leave_type = find_leave_type(&lower);
    let start_date = find_date(&tokens, &lower);
    let days = find_days(&tokens);
    let apply_intent = ["apply", "take", "book", "need", "want", "request"]
        .iter()
        .any(|w| lower.contains(w));
    if apply_intent && (leave_type.is_some() || start_date.is_some() || days.is_some()) {
        let mut arguments = serde_json::Map::new();
        if let Some(t) = leave_type {
            arguments.insert("leave_type".to_string(), json!(t));
        }
        if let Some(d) = start_date {
            arguments.insert("start_date".to_string(), json!(d.to_string()));
        }
        if let Some(n) = days {
            arguments.insert("number_of_days".to_string(), json!(n));
        }
        // The query itself is the best reason a keyword parser can extract.
        arguments.insert("reason".to_string(), json!(query));
        return Some(ToolChoice {
            tool: ToolName::ApplyForLeave,
            arguments: arguments.into(),
        });
    }

    if lower.contains("status") || lower.contains("history") || lower.contains("my request") {
        return Some(ToolChoice {
            tool: ToolName::CheckLeaveStatus,
            arguments: json!({}),
        });
    }

    if lower.contains("balance") || lower.contains("remaining") || lower.contains("left") {
        return Some(ToolChoice {
            tool: ToolName::GetLeaveBalance,
            arguments: json!({}),
        });
    }

    None
}

fn tokenize(lower: &str) -> Vec<&str> {
    lower
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| c.is_ascii_punctuation() && c != '_' && c != '-'))
        .filter(|t| !t.is_empty())
        .collect()
}

fn find_request_id(tokens: &[&str]) -> Option<String> {
    tokens
        .iter()
        .find(|t| t.starts_with("req_") && t.len() > 4)
        .map(|t| t.to_string())
}

fn find_action(lower: &str) -> Option<&'static str> {
    if lower.contains("reject") {
        Some("rejected")
    } else if lower.contains("approv") {
        Some("approved")
    } else {
        None
    }
}

fn find_leave_type(lower: &str) -> Option<&'static str> {
    if lower.contains("casual") {
        Some("casual_leave")
    } else if lower.contains("sick") {
        Some("sick_leave")
    } else if lower.contains("earned") {
        Some("earned_leave")
    } else {
        None
    }
}

fn find_date(tokens: &[&str], lower: &str) -> Option<NaiveDate> {
    if let Some(date) = tokens
        .iter()
        .find_map(|t| NaiveDate::parse_from_str(t, "%Y-%m-%d").ok())
    {
        return Some(date);
    }
    let today = Local::now().date_naive();
    if lower.contains("tomorrow") {
        return today.checked_add_days(Days::new(1));
    }
    if lower.contains("today") {
        return Some(today);
    }
    None
}

fn find_days(tokens: &[&str]) -> Option<u32> {
    tokens.windows(2).find_map(|w| {
        let n = w[0].parse::<u32>().ok()?;
        w[1].starts_with("day").then_some(n)
    })
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    fn resolve(query: &str) -> Option<ToolChoice> {
        resolve_query(query)
    }

    #[test]
    fn balance_queries() {
        let choice = resolve("How many casual leave days do I have left?").unwrap();
        assert_eq!(choice.tool, ToolName::GetLeaveBalance);
        let choice = resolve("show my leave balance").unwrap();
        assert_eq!(choice.tool, ToolName::GetLeaveBalance);
    }

    #[test]
    fn status_queries() {
        let choice = resolve("What is the status of my requests?").unwrap();
        assert_eq!(choice.tool, ToolName::CheckLeaveStatus);
        let choice = resolve("I want to know my leave history").unwrap();
        assert_eq!(choice.tool, ToolName::CheckLeaveStatus);
    }

    #[test]
    fn apply_query_extracts_arguments() {
        let choice =
            resolve("Apply for casual leave from 2030-05-20 for 3 days, family trip").unwrap();
        assert_eq!(choice.tool, ToolName::ApplyForLeave);
        assert_eq!(choice.arguments["leave_type"], "casual_leave");
        assert_eq!(choice.arguments["start_date"], "2030-05-20");
        assert_eq!(choice.arguments["number_of_days"], 3);
        assert!(matches!(choice.arguments["reason"], Value::String(_)));
    }

    #[test]
    fn apply_query_understands_tomorrow() {
        let choice = resolve("I need 2 days of sick leave starting tomorrow").unwrap();
        assert_eq!(choice.tool, ToolName::ApplyForLeave);
        assert_eq!(choice.arguments["leave_type"], "sick_leave");
        let expected = Local::now()
            .date_naive()
            .checked_add_days(Days::new(1))
            .unwrap();
        assert_eq!(choice.arguments["start_date"], expected.to_string());
        assert_eq!(choice.arguments["number_of_days"], 2);
    }

    #[test]
    fn pending_queries() {
        let choice = resolve("Show me who needs leave approval").unwrap();
        assert_eq!(choice.tool, ToolName::GetAllPendingRequests);
        let choice = resolve("list all pending requests").unwrap();
        assert_eq!(choice.tool, ToolName::GetAllPendingRequests);
    }

    #[test]
    fn manage_queries_extract_id_and_action() {
        let choice = resolve("Approve request req_123456").unwrap();
        assert_eq!(choice.tool, ToolName::ManageLeaveRequest);
        assert_eq!(choice.arguments["request_id"], "req_123456");
        assert_eq!(choice.arguments["action"], "approved");

        let choice = resolve("please reject req_8949fb.").unwrap();
        assert_eq!(choice.tool, ToolName::ManageLeaveRequest);
        assert_eq!(choice.arguments["request_id"], "req_8949fb");
        assert_eq!(choice.arguments["action"], "rejected");
    }

    #[test]
    fn approve_without_an_id_falls_back_to_the_pending_list() {
        let choice = resolve("anything to approve?").unwrap();
        assert_eq!(choice.tool, ToolName::GetAllPendingRequests);
    }

    #[test]
    fn unrelated_queries_do_not_resolve() {
        assert!(resolve("sing me a song about payroll").is_none());
        assert!(resolve("").is_none());
    }
}
