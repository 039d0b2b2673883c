use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use b2b_axum::axum;
use b2b_core::errors::B2BError;
use b2b_core::store::Row;
use b2b_core::{
    B2BApp, B2BService, ListQuery, Page, RequestContext, ServiceCapabilities, ServiceMethodKind,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Knows a single row, `p1`, owned by tenant `T1`.
struct Products;

#[async_trait::async_trait]
impl B2BService for Products {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::standard_crud().with_custom("tree")
    }

    async fn list(&self, ctx: &RequestContext, query: ListQuery) -> anyhow::Result<Page> {
        let mut data = Vec::new();
        if ctx.tenant_id == "T1" {
            data.push(json!({"id": "p1", "name": "Widget"}).as_object().cloned().unwrap_or_default());
        }
        Ok(Page {
            total: data.len() as u64,
            data,
            page: query.page,
            limit: query.limit,
        })
    }

    async fn get(&self, ctx: &RequestContext, id: &str) -> anyhow::Result<Option<Row>> {
        if ctx.tenant_id == "T1" && id == "p1" {
            let mut row = Row::new();
            row.insert("id".into(), json!("p1"));
            return Ok(Some(row));
        }
        Ok(None)
    }

    async fn create(&self, ctx: &RequestContext, data: Value) -> anyhow::Result<Row> {
        let mut row = b2b_core::payload_object(data)?;
        row.insert("tenantId".into(), json!(ctx.tenant_id));
        Ok(row)
    }

    async fn update(&self, _ctx: &RequestContext, _id: &str, _data: Value) -> anyhow::Result<Option<Row>> {
        Ok(None)
    }

    async fn remove(&self, _ctx: &RequestContext, _id: &str) -> anyhow::Result<bool> {
        Ok(true)
    }

    async fn custom(
        &self,
        ctx: &RequestContext,
        method: &str,
        _query: ListQuery,
        data: Option<Value>,
    ) -> anyhow::Result<Value> {
        Ok(json!({"method": method, "dept": ctx.dept_id, "data": data}))
    }
}

struct Boom;

#[async_trait::async_trait]
impl B2BService for Boom {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::from_methods(vec![ServiceMethodKind::Create])
    }

    async fn create(&self, _ctx: &RequestContext, _data: Value) -> anyhow::Result<Row> {
        Err(anyhow::anyhow!("boom"))
    }
}

struct Invalid;

#[async_trait::async_trait]
impl B2BService for Invalid {
    async fn create(&self, _ctx: &RequestContext, _data: Value) -> anyhow::Result<Row> {
        Err(B2BError::unprocessable("Invalid")
            .with_errors(json!({"name": ["required"]}))
            .into_anyhow())
    }
}

fn router() -> axum::Router {
    axum(B2BApp::new())
        .use_service("/products", Arc::new(Products))
        .use_service("/boom", Arc::new(Boom))
        .use_service("/invalid", Arc::new(Invalid))
        .service("/health", || async { "ok" })
        .into_router()
}

fn request(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-tenant-id", "T1")
        .header("x-user-id", "u1")
        .header("content-type", "application/json")
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn missing_tenant_header_is_not_authenticated() {
    let res = router()
        .oneshot(
            Request::builder()
                .uri("/products")
                .header("x-user-id", "u1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 401);
    let body = json_body(res).await;
    assert_eq!(body["name"], "NotAuthenticated");
    assert_eq!(body["className"], "not-authenticated");
}

#[tokio::test]
async fn list_returns_page_shape() {
    let res = router()
        .oneshot(request("GET", "/products?page=2&limit=5").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    let body = json_body(res).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["page"], 2);
    assert_eq!(body["limit"], 5);
    assert_eq!(body["data"][0]["name"], "Widget");
}

#[tokio::test]
async fn unbounded_limit_serializes_as_null() {
    let res = router()
        .oneshot(request("GET", "/products").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = json_body(res).await;
    assert!(body["limit"].is_null());
    assert_eq!(body["page"], 1);
}

#[tokio::test]
async fn bad_paging_is_bad_request() {
    let res = router()
        .oneshot(request("GET", "/products?page=abc").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
}

#[tokio::test]
async fn get_invisible_row_is_not_found() {
    let res = router()
        .oneshot(request("GET", "/products/p2").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 404);

    let res = router()
        .oneshot(request("GET", "/products/p1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(json_body(res).await["id"], "p1");
}

#[tokio::test]
async fn create_returns_the_row() {
    let res = router()
        .oneshot(
            request("POST", "/products")
                .body(Body::from(r#"{"name":"Widget"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body = json_body(res).await;
    assert_eq!(body["name"], "Widget");
    assert_eq!(body["tenantId"], "T1");
}

#[tokio::test]
async fn update_of_invisible_row_returns_null() {
    let res = router()
        .oneshot(
            request("PUT", "/products/p9")
                .body(Body::from(r#"{"name":"x"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert!(json_body(res).await.is_null());
}

#[tokio::test]
async fn delete_reports_success() {
    let res = router()
        .oneshot(request("DELETE", "/products/p1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(json_body(res).await, json!({"success": true}));
}

#[tokio::test]
async fn custom_methods_are_routed_by_name() {
    let res = router()
        .oneshot(
            request("GET", "/products/tree")
                .header("x-current-dept-id", "D1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(
        json_body(res).await,
        json!({"method": "tree", "dept": "D1", "data": null})
    );

    let res = router()
        .oneshot(
            request("POST", "/products/tree")
                .body(Body::from(r#"{"x":1}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(json_body(res).await["data"], json!({"x": 1}));

    let res = router()
        .oneshot(request("POST", "/products/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 405);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let res = router()
        .oneshot(
            request("POST", "/products")
                .body(Body::from("{\"name\":\"x\""))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    assert!(res.headers().get("x-request-id").is_some());
    let body = json_body(res).await;
    assert_eq!(body["name"], "BadRequest");
    assert_eq!(body["code"], 400);
    assert!(body.get("errors").is_some());
}

#[tokio::test]
async fn request_id_is_preserved_when_provided() {
    let provided = HeaderValue::from_static("req-test-123");
    let res = router()
        .oneshot(
            request("GET", "/products")
                .header("x-request-id", provided.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.headers().get("x-request-id").unwrap(), &provided);
}

#[tokio::test]
async fn unprocessable_keeps_status_and_errors() {
    let res = router()
        .oneshot(request("POST", "/invalid").body(Body::from("{}")).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 422);
    let body = json_body(res).await;
    assert_eq!(body["name"], "Unprocessable");
    assert_eq!(body["errors"], json!({"name": ["required"]}));
}

#[tokio::test]
async fn unstructured_errors_become_general_error() {
    let res = router()
        .oneshot(request("POST", "/boom").body(Body::from("{}")).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 500);
    let body = json_body(res).await;
    assert_eq!(body["name"], "GeneralError");
    assert_eq!(body["className"], "general-error");
    assert!(body["message"].as_str().unwrap().contains("boom"));
}

#[tokio::test]
async fn health_answers_ok() {
    let res = router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"ok");
}
