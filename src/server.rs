use axum::http::StatusCode;
use axum::{routing::post, Json, Router};
use serde::Deserialize;

use crate::data::{GenerationOutput, SemesterId};
use crate::error::ScheduleError;
use crate::scheduler;
use crate::snapshot::InMemoryStore;

/// Request body: the semester to schedule plus the full catalog snapshot.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    semester_id: SemesterId,
    #[serde(flatten)]
    catalog: InMemoryStore,
}

async fn generate_handler(
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerationOutput>, (StatusCode, String)> {
    match scheduler::generate_schedule(&request.catalog, request.semester_id) {
        Ok(output) => Ok(Json(output)),
        Err(e @ ScheduleError::SemesterNotFound(_)) => Err((StatusCode::NOT_FOUND, e.to_string())),
        Err(e) => Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string())),
    }
}

pub async fn run_server() {
    let app = Router::new().route("/v1/schedule/generate", post(generate_handler));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080")
        .await
        .unwrap();

    println!("Server running at http://{}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
