use admin_gate::{
    handlers,
    routing::{Endpoint, PatternError, RoutePattern, RouteTable, normalize_path},
};
use axum::http::Method;

fn endpoint(name: &'static str) -> Endpoint {
    Endpoint::new(name, handlers::health)
}

// --- Pattern Compilation ---

#[test]
fn test_named_param_round_trip() {
    let pattern = RoutePattern::compile("/admin/categories/{id}").unwrap();

    assert!(pattern.matches("/admin/categories/42"));
    let params = pattern.extract_params("/admin/categories/42").unwrap();
    assert_eq!(params.get("id").map(String::as_str), Some("42"));
    assert_eq!(params.len(), 1);
}

#[test]
fn test_param_does_not_span_segments() {
    let pattern = RoutePattern::compile("/admin/categories/{id}").unwrap();

    assert!(!pattern.matches("/admin/categories/42/extra"));
    assert!(pattern.extract_params("/admin/categories/42/extra").is_none());
    assert!(!pattern.matches("/admin/categories/"));
}

#[test]
fn test_trailing_slash_is_ignored() {
    let pattern = RoutePattern::compile("/admin/login/").unwrap();

    assert_eq!(pattern.template(), "/admin/login");
    assert!(pattern.matches("/admin/login"));
    assert!(pattern.matches("/admin/login/"));
}

#[test]
fn test_root_pattern_only_matches_root() {
    let pattern = RoutePattern::compile("/").unwrap();

    assert!(pattern.matches("/"));
    assert!(pattern.matches(""));
    assert!(!pattern.matches("/admin"));
}

#[test]
fn test_constrained_param() {
    let pattern = RoutePattern::compile("/posts/{year:[0-9]{4}}/{slug}").unwrap();

    assert_eq!(pattern.param_names(), ["year", "slug"]);
    assert!(!pattern.matches("/posts/20x5/hello"));

    let params = pattern.extract_params("/posts/2025/hello").unwrap();
    assert_eq!(params["year"], "2025");
    assert_eq!(params["slug"], "hello");
}

#[test]
fn test_literal_text_is_escaped() {
    let pattern = RoutePattern::compile("/files/report.csv").unwrap();

    assert!(pattern.matches("/files/report.csv"));
    assert!(!pattern.matches("/files/reportxcsv"));
}

#[test]
fn test_invalid_templates_are_rejected() {
    assert!(matches!(
        RoutePattern::compile("/admin/{id"),
        Err(PatternError::UnclosedBrace(_))
    ));
    assert!(matches!(
        RoutePattern::compile("/admin/{1st}"),
        Err(PatternError::InvalidParamName { .. })
    ));
    assert!(matches!(
        RoutePattern::compile("/admin/{id}/{id}"),
        Err(PatternError::DuplicateParam { .. })
    ));
    assert!(matches!(
        RoutePattern::compile("/admin/{id:[0-9}"),
        Err(PatternError::Regex { .. })
    ));
}

#[test]
fn test_normalize_path() {
    assert_eq!(normalize_path("/"), "/");
    assert_eq!(normalize_path(""), "/");
    assert_eq!(normalize_path("/admin///"), "/admin");
    assert_eq!(normalize_path("/admin/login"), "/admin/login");
}

// --- Route Table ---

#[test]
fn test_first_registered_route_wins() {
    let mut table = RouteTable::new();
    table
        .get("/admin/{section}", endpoint("catch_all"), &[])
        .unwrap()
        .get("/admin/dashboard", endpoint("dashboard"), &[])
        .unwrap();

    let (route, params) = table.find(&Method::GET, "/admin/dashboard").unwrap();
    assert_eq!(route.name(), "catch_all");
    assert_eq!(params["section"], "dashboard");
}

#[test]
fn test_routes_are_scoped_by_method() {
    let mut table = RouteTable::new();
    table
        .post("/admin/login", endpoint("login_submit"), &["guest", "password.policy"])
        .unwrap();

    assert!(table.find(&Method::GET, "/admin/login").is_none());

    let (route, _) = table.find(&Method::POST, "/admin/login/").unwrap();
    assert_eq!(route.guards(), ["guest", "password.policy"]);
    assert_eq!(table.len(), 1);
}

#[test]
fn test_guard_ids_lists_every_reference() {
    let mut table = RouteTable::new();
    table
        .get("/a", endpoint("a"), &["admin.auth"])
        .unwrap()
        .get("/b", endpoint("b"), &["admin.auth", "guest"])
        .unwrap();

    let mut ids: Vec<&str> = table.guard_ids().collect();
    ids.sort_unstable();
    assert_eq!(ids, ["admin.auth", "admin.auth", "guest"]);
}

#[test]
fn test_application_route_table_builds() {
    let table = admin_gate::routes::route_table().unwrap();

    let (route, _) = table.find(&Method::GET, "/admin/dashboard").unwrap();
    assert_eq!(route.guards(), ["admin.auth"]);

    let (route, _) = table.find(&Method::POST, "/admin/login").unwrap();
    assert_eq!(route.guards(), ["guest", "password.policy"]);

    assert!(table.find(&Method::GET, "/admin/missing").is_none());
}
