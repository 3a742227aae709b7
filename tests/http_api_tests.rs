#![cfg(feature = "http_api")]

mod common;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode, header},
};
use common::{XLSX, construction_schedule, workbook_bytes};
use schedule_expander::{ExpanderConfig, SpreadsheetExtractor, http_api};
use serde_json::Value;
use tower::util::ServiceExt;

fn new_router() -> axum::Router {
    let state = http_api::AppState::new(ExpanderConfig::default());
    http_api::router(state)
}

fn upload(uri: &str, content_type: &str, bytes: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", content_type)
        .body(Body::from(bytes))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let response = new_router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn schedule_upload_returns_workbook_attachment() {
    let response = new_router()
        .oneshot(upload("/schedule", XLSX, construction_schedule()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"dias_de_atividade.xlsx\""
    );
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn filtered_upload_is_named_after_the_date() {
    let response = new_router()
        .oneshot(upload(
            "/schedule?date=02/03/2024",
            XLSX,
            construction_schedule(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"atividades_02-03-2024.xlsx\""
    );
}

#[tokio::test]
async fn dates_endpoint_lists_sorted_days_and_summary() {
    let response = new_router()
        .oneshot(upload("/schedule/dates", XLSX, construction_schedule()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body["dates"],
        serde_json::json!([
            "01/03/2024",
            "02/03/2024",
            "03/03/2024",
            "04/03/2024",
            "05/03/2024"
        ])
    );
    assert_eq!(body["summary"]["row_count"], 5);
    assert_eq!(body["summary"]["skipped_inverted_ranges"], 1);
}

#[tokio::test]
async fn unsupported_type_maps_to_415() {
    let response = new_router()
        .oneshot(upload("/schedule", "text/plain", b"Atividade;Inicio".to_vec()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(json_body(response).await["error"], "unsupported_media_type");
}

#[tokio::test]
async fn missing_columns_and_bad_filters_are_client_errors() {
    let app = new_router();
    let bytes = workbook_bytes(&[&["Tarefa", "Responsável"], &["Fundação", "Ana"]]);
    let response = app
        .clone()
        .oneshot(upload("/schedule", XLSX, bytes))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["error"], "unprocessable");
    assert!(body["message"].as_str().unwrap().contains("Data de Inicio"));

    let response = app
        .oneshot(upload(
            "/schedule?date=not-a-date",
            XLSX,
            construction_schedule(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn aliases_endpoint_exposes_configuration() {
    let response = new_router()
        .oneshot(Request::builder().uri("/aliases").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["activity"][0], "ITEM");
}

#[tokio::test]
async fn execution_column_can_be_left_out_of_the_workbook() {
    let response = new_router()
        .oneshot(upload(
            "/schedule?execution_date=false",
            XLSX,
            construction_schedule(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let table = SpreadsheetExtractor::new().read_table(&bytes).unwrap();
    assert_eq!(
        table.headers,
        vec!["Atividade", "Data de Inicio", "Data de Termino"]
    );
    assert_eq!(table.rows.len(), 5);

    let response = new_router()
        .oneshot(upload("/schedule", XLSX, construction_schedule()))
        .await
        .unwrap();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let table = SpreadsheetExtractor::new().read_table(&bytes).unwrap();
    assert_eq!(table.headers.last().map(String::as_str), Some("Data de Execução"));
}
