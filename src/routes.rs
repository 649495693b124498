use crate::{
    api::{invoke, login},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let invoke_limiter = Arc::new(build_limiter(config.rate_invoke_per_min));

    cfg.service(
        web::resource("/login")
            .wrap(login_limiter.clone())
            .route(web::post().to(login::login)),
    );

    cfg.service(
        web::scope("/agent").service(
            web::resource("/invoke")
                .wrap(invoke_limiter.clone())
                .route(web::post().to(invoke::agent_invoke)),
        ),
    );
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use actix_web::web::Data;
    use actix_web::{App, test};
    use chrono::{Days, Local};
    use serde_json::{Value, json};
    use tempfile::TempDir;

    use super::*;
    use crate::agent::AgentService;
    use crate::agent::rules::RuleResolver;
    use crate::model::role::Role;
    use crate::model::user::User;
    use crate::store::JsonStore;

    fn test_config() -> Config {
        Config {
            server_addr: "127.0.0.1:0".to_string(),
            data_dir: "unused".to_string(),
            rate_login_per_min: 10_000,
            rate_invoke_per_min: 10_000,
            model_api_base: String::new(),
            model_api_key: None,
            model_name: String::new(),
        }
    }

    fn seed(dir: &TempDir) -> (Data<JsonStore>, Data<AgentService>) {
        let store = JsonStore::open(dir.path()).unwrap();
        store
            .save_users(&[
                User {
                    user_id: "m1".to_string(),
                    name: "Manager One".to_string(),
                    role: Role::Manager,
                    leave_balances: BTreeMap::from([("casual_leave".to_string(), 10)]),
                },
                User {
                    user_id: "u1".to_string(),
                    name: "Employee One".to_string(),
                    role: Role::Employee,
                    leave_balances: BTreeMap::from([("casual_leave".to_string(), 5)]),
                },
            ])
            .unwrap();
        let store = Data::new(store);
        let agent = Data::new(AgentService::new(
            store.clone().into_inner(),
            Arc::new(RuleResolver),
        ));
        (store, agent)
    }

    macro_rules! test_app {
        ($store:expr, $agent:expr) => {
            test::init_service(
                App::new()
                    .app_data($store.clone())
                    .app_data($agent.clone())
                    .configure(|cfg| configure(cfg, test_config())),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn login_finds_known_users_and_404s_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let (store, agent) = seed(&dir);
        let app = test_app!(store, agent);

        let req = test::TestRequest::post()
            .peer_addr("127.0.0.1:40000".parse().unwrap())
            .uri("/login")
            .set_json(json!({"user_id": "m1"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["user"]["name"], "Manager One");
        assert_eq!(body["user"]["role"], "manager");

        let req = test::TestRequest::post()
            .peer_addr("127.0.0.1:40000".parse().unwrap())
            .uri("/login")
            .set_json(json!({"user_id": "nobody"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn apply_reject_restore_flow_over_http() {
        let dir = tempfile::tempdir().unwrap();
        let (store, agent) = seed(&dir);
        let app = test_app!(store, agent);

        let start = Local::now()
            .date_naive()
            .checked_add_days(Days::new(1))
            .unwrap();
        let req = test::TestRequest::post()
            .peer_addr("127.0.0.1:40000".parse().unwrap())
            .uri("/agent/invoke")
            .set_json(json!({
                "user_id": "u1",
                "role": "employee",
                "query": format!("Apply for casual leave from {start} for 3 days, family trip"),
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true, "apply failed: {body}");
        assert_eq!(body["new_balance"], 2);
        let request_id = body["request_id"].as_str().unwrap().to_string();

        // The manager rejects; the balance is credited back.
        let req = test::TestRequest::post()
            .peer_addr("127.0.0.1:40000".parse().unwrap())
            .uri("/agent/invoke")
            .set_json(json!({
                "user_id": "m1",
                "role": "manager",
                "query": format!("reject {request_id}"),
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true, "reject failed: {body}");

        let req = test::TestRequest::post()
            .peer_addr("127.0.0.1:40000".parse().unwrap())
            .uri("/agent/invoke")
            .set_json(json!({
                "user_id": "u1",
                "query": "what is my leave balance left?",
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["balances"]["casual_leave"], 5);
    }

    #[actix_web::test]
    async fn employees_are_denied_manager_operations() {
        let dir = tempfile::tempdir().unwrap();
        let (store, agent) = seed(&dir);
        let app = test_app!(store, agent);

        let req = test::TestRequest::post()
            .peer_addr("127.0.0.1:40000".parse().unwrap())
            .uri("/agent/invoke")
            .set_json(json!({
                "user_id": "u1",
                "role": "employee",
                "query": "show me all pending requests",
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], false);
        assert_eq!(
            body["error"],
            "Access denied. Only managers can view all pending requests."
        );
    }

    #[actix_web::test]
    async fn unresolvable_queries_return_422() {
        let dir = tempfile::tempdir().unwrap();
        let (store, agent) = seed(&dir);
        let app = test_app!(store, agent);

        let req = test::TestRequest::post()
            .peer_addr("127.0.0.1:40000".parse().unwrap())
            .uri("/agent/invoke")
            .set_json(json!({
                "user_id": "u1",
                "query": "tell me a joke",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 422);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }
}
