use axum::body::Body;
use axum::http::Request;
use axum::Router;
use b2b_core::B2BApp;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn router_with(app: B2BApp) -> Router {
    b2b_admin::build_with(app, b2b_admin::memory_store())
        .unwrap()
        .into_router()
}

fn router() -> Router {
    router_with(B2BApp::new())
}

fn request(method: &str, uri: &str, tenant: &str, permissions: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-tenant-id", tenant)
        .header("x-user-id", "u1")
        .header("x-permissions", permissions)
        .header("content-type", "application/json")
}

async fn send(router: &Router, req: Request<Body>) -> (u16, Value) {
    let res = router.clone().oneshot(req).await.unwrap();
    let status = res.status().as_u16();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
    };
    (status, body)
}

#[tokio::test]
async fn calls_without_the_permission_tag_are_forbidden() {
    let router = router();
    let (status, body) = send(
        &router,
        request("GET", "/products", "T1", "orders:list")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, 403);
    assert_eq!(body["name"], "Forbidden");
    assert_eq!(body["data"]["permission"], "products:list");
}

#[tokio::test]
async fn service_wildcard_grants_every_action() {
    let router = router();
    let (status, body) = send(
        &router,
        request("POST", "/products", "T1", "products:*")
            .header("x-site-id", "S1")
            .body(Body::from(r#"{"name":"Widget"}"#))
            .unwrap(),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["tenantId"], "T1");
    assert_eq!(body["siteId"], "S1");
    assert_eq!(body["skuCount"], 0);

    let (status, body) = send(
        &router,
        request("GET", "/products", "T1", "products:*")
            .header("x-site-id", "S1")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["name"], "Widget");
}

#[tokio::test]
async fn widget_is_invisible_across_tenants_over_http() {
    let router = router();
    let (_, created) = send(
        &router,
        request("POST", "/products", "T1", "*")
            .header("x-site-id", "S1")
            .body(Body::from(r#"{"name":"Widget"}"#))
            .unwrap(),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &router,
        request("GET", "/products", "T2", "*")
            .header("x-site-id", "S2")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["total"], 0);

    let (status, _) = send(
        &router,
        request("GET", &format!("/products/{id}"), "T2", "*")
            .header("x-site-id", "S2")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, 404);

    let (status, body) = send(
        &router,
        request("DELETE", &format!("/products/{id}"), "T2", "*")
            .header("x-site-id", "S2")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"success": true}));

    let (status, body) = send(
        &router,
        request("GET", &format!("/products/{id}"), "T1", "*")
            .header("x-site-id", "S1")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["name"], "Widget");
}

#[tokio::test]
async fn custom_methods_have_their_own_tags() {
    let router = router();
    send(
        &router,
        request("POST", "/departments", "T1", "*")
            .body(Body::from(r#"{"name":"HQ"}"#))
            .unwrap(),
    )
    .await;

    let (status, _) = send(
        &router,
        request("GET", "/departments/tree", "T1", "departments:list")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, 403);

    let (status, body) = send(
        &router,
        request("GET", "/departments/tree", "T1", "departments:tree")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body[0]["name"], "HQ");
    assert_eq!(body[0]["children"], json!([]));
}

#[tokio::test]
async fn assign_is_posted_to_the_custom_route() {
    let router = router();
    let (_, role) = send(
        &router,
        request("POST", "/roles", "T1", "*")
            .body(Body::from(r#"{"name":"Editor","code":"editor"}"#))
            .unwrap(),
    )
    .await;

    let payload = json!({
        "userId": "u7",
        "assignments": [{"siteId": "S1", "roleId": role["id"]}]
    });
    let (status, body) = send(
        &router,
        request("POST", "/user-site-roles/assign", "T1", "*")
            .body(Body::from(payload.to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["userId"], "u7");
    assert_eq!(body["assignments"][0]["siteId"], "S1");

    let (status, body) = send(
        &router,
        request("GET", "/user-site-roles?userId=u7", "T1", "*")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn site_required_tables_forbid_create_without_site() {
    let router = router();
    let (status, body) = send(
        &router,
        request("POST", "/media", "T1", "*")
            .body(Body::from(r#"{"name":"logo","url":"https://cdn.example.com/logo.png"}"#))
            .unwrap(),
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(body["className"], "forbidden");
}

#[tokio::test]
async fn validation_errors_carry_field_messages() {
    let router = router();
    let (status, body) = send(
        &router,
        request("POST", "/roles", "T1", "*")
            .body(Body::from(r#"{"name":"","code":"x"}"#))
            .unwrap(),
    )
    .await;
    assert_eq!(status, 422);
    assert_eq!(body["name"], "Unprocessable");
    assert_eq!(body["errors"]["name"][0], "name must not be empty");
}

#[tokio::test]
async fn enforcement_can_be_switched_off() {
    let app = B2BApp::new();
    app.set("permissions.enforce", "false");
    let router = router_with(app);

    let (status, _) = send(
        &router,
        Request::builder()
            .uri("/sites")
            .header("x-tenant-id", "T1")
            .header("x-user-id", "u1")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn health_needs_no_context() {
    let router = router();
    let (status, body) = send(
        &router,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body, json!("ok"));
}
