//! HTTP routing.
//!
//! # Responsibility
//! - Map the entity CRUD surface and the operator console onto axum routes.
//! - Log one `http_request` event per handled request.

use crate::state::SharedState;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use log::{error, info};
use serde_json::{json, Value};
use std::time::Instant;

mod console;
mod entities;

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(console::index))
        .route("/healthz", get(healthz))
        .route(
            "/departments/",
            get(entities::list_departments).post(entities::create_department),
        )
        .route(
            "/departments/:id",
            get(entities::get_department).delete(entities::delete_department),
        )
        .route(
            "/employees/",
            get(entities::list_employees).post(entities::create_employee),
        )
        .route(
            "/employees/:id",
            get(entities::get_employee).delete(entities::delete_employee),
        )
        .route(
            "/employees/:id/projects",
            put(entities::assign_employee_projects),
        )
        .route("/employees/:id/roles", put(entities::assign_employee_roles))
        .route(
            "/projects/",
            get(entities::list_projects).post(entities::create_project),
        )
        .route(
            "/projects/:id",
            get(entities::get_project).delete(entities::delete_project),
        )
        .route(
            "/roles/",
            get(entities::list_roles).post(entities::create_role),
        )
        .route(
            "/roles/:id",
            get(entities::get_role).delete(entities::delete_role),
        )
        .route("/seed-data", post(console::seed_data))
        .route("/run-query", post(console::run_query))
        .route("/save-query", post(console::save_query))
        .route("/add-query", post(console::add_query))
        .route("/update-queries", post(console::update_queries))
        .route("/delete-query/:id", post(console::delete_query))
        .route("/clear-results", post(console::clear_results))
        .route("/download-results", get(console::download_results))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn healthz() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": staffdesk_core::core_version(),
    }))
}

async fn log_request(request: Request, next: Next) -> Response {
    let started_at = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = started_at.elapsed().as_millis();
    if status.is_server_error() {
        error!(
            "event=http_request module=server status=error method={} path={} code={} duration_ms={}",
            method,
            path,
            status.as_u16(),
            elapsed_ms
        );
    } else {
        info!(
            "event=http_request module=server status=ok method={} path={} code={} duration_ms={}",
            method,
            path,
            status.as_u16(),
            elapsed_ms
        );
    }
    response
}
