//! Operator console: seeding, query runner, saved queries and result log.

use crate::error::ApiResult;
use crate::render::{render_index, render_status};
use crate::state::{run_blocking, AppState, SharedState};
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::{Form, Json};
use log::info;
use serde::{Deserialize, Serialize};
use staffdesk_core::{
    seed_demo_data, DepartmentService, EmployeeService, SeedRequest, SqliteDepartmentRepository,
    SqliteEmployeeRepository,
};
use std::collections::HashMap;

const DOWNLOAD_FILE_NAME: &str = "saved_queries.json";
const QUERY_FIELD_PREFIX: &str = "query_";

#[derive(Debug, Deserialize)]
pub struct SeedForm {
    #[serde(default = "default_departments")]
    pub n_departments: u32,
    #[serde(default = "default_employees")]
    pub n_employees: u32,
}

fn default_departments() -> u32 {
    SeedRequest::default().n_departments
}

fn default_employees() -> u32 {
    SeedRequest::default().n_employees
}

#[derive(Debug, Deserialize)]
pub struct QueryForm {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct SavedResponse {
    pub saved: bool,
}

/// Renders the console with current entities, results and saved queries.
fn console_page(state: &AppState) -> ApiResult<Html<String>> {
    let conn = state.open_connection()?;
    let departments = DepartmentService::new(SqliteDepartmentRepository::new(&conn)).get_all()?;
    let employees = EmployeeService::new(SqliteEmployeeRepository::new(&conn)).get_all()?;
    let stored_queries = state.query_store()?.load()?;
    let results = state.results()?;
    Ok(Html(render_index(
        &departments,
        &employees,
        results.entries(),
        &stored_queries,
    )))
}

pub async fn index(State(state): State<SharedState>) -> ApiResult<Html<String>> {
    run_blocking(&state, console_page).await
}

pub async fn seed_data(
    State(state): State<SharedState>,
    Form(form): Form<SeedForm>,
) -> ApiResult<Html<String>> {
    let request = SeedRequest {
        n_departments: form.n_departments,
        n_employees: form.n_employees,
    };
    let summary = run_blocking(&state, move |state| {
        let mut conn = state.open_connection()?;
        Ok(seed_demo_data(&mut conn, &request, &mut rand::thread_rng())?)
    })
    .await?;
    Ok(Html(render_status(
        "Seed complete",
        &format!(
            "Seeded {} Departments & {} Employees",
            summary.departments, summary.employees
        ),
    )))
}

pub async fn run_query(
    State(state): State<SharedState>,
    Form(form): Form<QueryForm>,
) -> ApiResult<Html<String>> {
    run_blocking(&state, move |state| {
        let outcomes = {
            let conn = state.open_connection()?;
            state.evaluator().run_batch(&conn, &form.query)
        };
        let expressions = outcomes.len();
        let failed = outcomes.iter().filter(|outcome| outcome.is_error()).count();
        let log_len = {
            let mut results = state.results()?;
            results.extend(outcomes);
            results.len()
        };
        info!(
            "event=run_query module=server status=ok expressions={} failed={} log_len={}",
            expressions, failed, log_len
        );
        console_page(state)
    })
    .await
}

pub async fn save_query(
    State(state): State<SharedState>,
    Form(form): Form<QueryForm>,
) -> ApiResult<Json<SavedResponse>> {
    run_blocking(&state, move |state| {
        let saved = state.query_store()?.add_if_new(&form.query)?;
        Ok(Json(SavedResponse { saved }))
    })
    .await
}

pub async fn add_query(
    State(state): State<SharedState>,
    Form(form): Form<QueryForm>,
) -> ApiResult<Html<String>> {
    let query = form.query.trim().to_string();
    let saved = run_blocking(&state, move |state| {
        Ok(state.query_store()?.add_if_new(&form.query)?)
    })
    .await?;
    let page = if saved {
        render_status("Query saved", &format!("Saved query: {query}"))
    } else {
        render_status(
            "Query not saved",
            "The query is empty or already stored.",
        )
    };
    Ok(Html(page))
}

/// Accepts fields named `<id>` or `query_<id>`; other fields are ignored.
pub async fn update_queries(
    State(state): State<SharedState>,
    Form(fields): Form<HashMap<String, String>>,
) -> ApiResult<Html<String>> {
    let edits = parse_query_edits(&fields);
    run_blocking(&state, move |state| {
        let changed = state.query_store()?.update_many(&edits)?;
        info!(
            "event=update_queries module=server status=ok submitted={} changed={}",
            edits.len(),
            changed
        );
        console_page(state)
    })
    .await
}

pub async fn delete_query(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Html<String>> {
    run_blocking(&state, move |state| {
        state.query_store()?.delete(id)?;
        console_page(state)
    })
    .await
}

pub async fn clear_results(State(state): State<SharedState>) -> ApiResult<Html<String>> {
    run_blocking(&state, |state| {
        state.results()?.clear();
        console_page(state)
    })
    .await
}

pub async fn download_results(State(state): State<SharedState>) -> ApiResult<impl IntoResponse> {
    let document =
        run_blocking(&state, |state| Ok(state.query_store()?.raw_document()?)).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\""),
            ),
        ],
        document,
    ))
}

fn parse_query_edits(fields: &HashMap<String, String>) -> Vec<(i64, String)> {
    let mut edits: Vec<(i64, String)> = fields
        .iter()
        .filter_map(|(key, value)| {
            let id_text = key.strip_prefix(QUERY_FIELD_PREFIX).unwrap_or(key);
            id_text
                .parse::<i64>()
                .ok()
                .map(|id| (id, value.clone()))
        })
        .collect();
    edits.sort_by_key(|(id, _)| *id);
    edits
}
