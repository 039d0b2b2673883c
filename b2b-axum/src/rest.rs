use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::rejection::JsonRejection,
    extract::{Path, Query, State},
    http::HeaderMap,
    routing, Json, Router,
};
use b2b_core::errors::B2BError;
use b2b_core::{B2BApp, ListQuery, Page, ServiceHandle};
use serde_json::{json, Value};

use crate::context::context_from_headers;
use crate::B2BAxumError;

type HandlerResult<T> = Result<Json<T>, B2BAxumError>;

/// State of one mounted service.
#[derive(Clone)]
struct ServiceRoute {
    app: B2BApp,
    name: Arc<str>,
}

impl ServiceRoute {
    fn handle(&self) -> Result<ServiceHandle, B2BAxumError> {
        Ok(self.app.service(&self.name)?)
    }
}

fn map_json_rejection(rejection: JsonRejection) -> B2BAxumError {
    B2BError::bad_request("Failed to parse the request body as JSON")
        .with_errors(json!({"_schema": [rejection.body_text()]}))
        .into()
}

fn parse_optional_body(body: &Bytes) -> Result<Option<Value>, B2BAxumError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some).map_err(|e| {
        B2BError::bad_request("Failed to parse the request body as JSON")
            .with_errors(json!({"_schema": [e.to_string()]}))
            .into()
    })
}

async fn list(
    State(route): State<ServiceRoute>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> HandlerResult<Page> {
    let ctx = context_from_headers(&headers)?;
    let query = ListQuery::from_pairs(query)?;
    let page = route.handle()?.list(ctx, query).await?;
    Ok(Json(page))
}

async fn create(
    State(route): State<ServiceRoute>,
    headers: HeaderMap,
    data: Result<Json<Value>, JsonRejection>,
) -> HandlerResult<Value> {
    let ctx = context_from_headers(&headers)?;
    let Json(data) = data.map_err(map_json_rejection)?;
    let row = route.handle()?.create(ctx, data).await?;
    Ok(Json(Value::Object(row)))
}

/// `GET /{id}`: a custom method when `id` names one, otherwise `get`.
async fn get_or_custom(
    State(route): State<ServiceRoute>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Path(id): Path<String>,
) -> HandlerResult<Value> {
    let ctx = context_from_headers(&headers)?;
    let svc = route.handle()?;

    if svc.capabilities().custom(&id).is_some() {
        let query = ListQuery::from_pairs(query)?;
        let out = svc.custom(ctx, &id, query, None).await?;
        return Ok(Json(out));
    }

    match svc.get(ctx, &id).await? {
        Some(row) => Ok(Json(Value::Object(row))),
        None => Err(B2BError::not_found(format!("No record found for id '{id}'")).into()),
    }
}

/// `POST /{method}`: custom methods only.
async fn custom(
    State(route): State<ServiceRoute>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Path(method): Path<String>,
    body: Bytes,
) -> HandlerResult<Value> {
    let ctx = context_from_headers(&headers)?;
    let query = ListQuery::from_pairs(query)?;
    let data = parse_optional_body(&body)?;
    let out = route.handle()?.custom(ctx, &method, query, data).await?;
    Ok(Json(out))
}

async fn update(
    State(route): State<ServiceRoute>,
    headers: HeaderMap,
    Path(id): Path<String>,
    data: Result<Json<Value>, JsonRejection>,
) -> HandlerResult<Value> {
    let ctx = context_from_headers(&headers)?;
    let Json(data) = data.map_err(map_json_rejection)?;
    let row = route.handle()?.update(ctx, &id, data).await?;
    Ok(Json(row.map(Value::Object).unwrap_or(Value::Null)))
}

async fn remove(
    State(route): State<ServiceRoute>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> HandlerResult<Value> {
    let ctx = context_from_headers(&headers)?;
    let removed = route.handle()?.remove(ctx, &id).await?;
    Ok(Json(json!({ "success": removed })))
}

/// REST routes for one registered service:
///
/// - `GET /` list, `POST /` create
/// - `GET /{id}` get (or a custom method named `id`)
/// - `POST /{method}` custom method
/// - `PUT /{id}` update, `DELETE /{id}` remove
pub fn service_router(service_name: &str, app: B2BApp) -> Router<()> {
    let state = ServiceRoute {
        app,
        name: Arc::from(service_name),
    };

    Router::new()
        .route("/", routing::get(list).post(create))
        .route(
            "/{id}",
            routing::get(get_or_custom)
                .post(custom)
                .put(update)
                .delete(remove),
        )
        .with_state(state)
}
