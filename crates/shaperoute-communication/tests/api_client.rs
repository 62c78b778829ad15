//! ApiClient and NominatimGeocoder against an in-process HTTP server.

use axum::extract::{Multipart, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use shaperoute_communication::{ApiClient, Geocoder, NominatimGeocoder, RouteBackend};
use shaperoute_core::{Position, RouteRequest};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn symbols_body() -> Value {
    json!({
        "symbols": [
            {"id": "star_01", "name": "star", "original_filename": "star.svg", "num_points": 100, "normalized_length": 3.2},
            {"id": "heart_02", "name": "heart", "original_filename": "heart.svg", "num_points": 80, "normalized_length": 2.7}
        ]
    })
}

fn route_body(request: &Value) -> Value {
    json!({
        "coordinates": [[48.8566, 2.3522], [48.8600, 2.3600], [48.8566, 2.3522]],
        "distance_m": 5234.7,
        "symbol_id": request["symbol_id"],
        "start": [request["start_lat"], request["start_lon"]]
    })
}

fn sample_request() -> RouteRequest {
    RouteRequest::new("star_01", Position::new(48.8566, 2.3522), 5.0)
}

#[tokio::test]
async fn test_list_shapes_is_stable() {
    let base = serve(Router::new().route("/symbols", get(|| async { Json(symbols_body()) }))).await;
    let client = ApiClient::new(base).unwrap();

    let first = client.list_shapes().await.unwrap();
    let second = client.list_shapes().await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(first[0].id, "star_01");
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_generate_route_sends_wire_body() {
    let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let captured = seen.clone();
    let router = Router::new().route(
        "/route",
        post(move |Json(body): Json<Value>| {
            let captured = captured.clone();
            async move {
                *captured.lock().unwrap() = Some(body.clone());
                Json(route_body(&body))
            }
        }),
    );
    let client = ApiClient::new(serve(router).await).unwrap();

    let route = client.generate_route(&sample_request()).await.unwrap();

    assert_eq!(
        seen.lock().unwrap().clone().unwrap(),
        json!({"symbol_id": "star_01", "start_lat": 48.8566, "start_lon": 2.3522, "target_distance_km": 5.0})
    );
    assert_eq!(route.coordinates.len(), 3);
    assert_eq!(route.distance_meters, 5234.7);
    assert_eq!(route.shape_id, "star_01");
    assert_eq!(route.start, Position::new(48.8566, 2.3522));
}

#[tokio::test]
async fn test_generate_route_with_track() {
    let router = Router::new().route(
        "/route/gpx",
        post(|Json(body): Json<Value>| async move {
            let mut value = route_body(&body);
            value["gpx_content"] = json!("<?xml version=\"1.0\"?><gpx></gpx>");
            Json(value)
        }),
    );
    let client = ApiClient::new(serve(router).await).unwrap();

    let result = client.generate_route_with_track(&sample_request()).await.unwrap();
    assert_eq!(result.route.shape_id, "star_01");
    assert!(result.gpx_content.contains("<gpx>"));
}

#[tokio::test]
async fn test_fetch_track_file_returns_raw_bytes() {
    let payload: &'static [u8] = b"<gpx><trk><name>star_01</name></trk></gpx>";
    let router = Router::new().route(
        "/route/gpx/download",
        post(move || async move {
            (
                [("content-type", "application/gpx+xml")],
                payload.to_vec(),
            )
        }),
    );
    let client = ApiClient::new(serve(router).await).unwrap();

    let bytes = client.fetch_track_file(&sample_request()).await.unwrap();
    assert_eq!(bytes, payload);
}

#[tokio::test]
async fn test_backend_error_detail_is_protocol_error() {
    let router = Router::new().route(
        "/route",
        post(|| async {
            (
                StatusCode::NOT_FOUND,
                Json(json!({"detail": "Symbol 'nope' not found"})),
            )
                .into_response()
        }),
    );
    let client = ApiClient::new(serve(router).await).unwrap();

    let err = client.generate_route(&sample_request()).await.unwrap_err();
    assert!(err.is_protocol());
    assert!(err.to_string().contains("404"));
    assert!(err.to_string().contains("Symbol 'nope' not found"));
}

#[tokio::test]
async fn test_malformed_body_is_protocol_error() {
    let router = Router::new().route("/symbols", get(|| async { Json(json!({"shapes": []})) }));
    let client = ApiClient::new(serve(router).await).unwrap();

    let err = client.list_shapes().await.unwrap_err();
    assert!(err.is_protocol());
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    // Bind then drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(format!("http://{}", addr)).unwrap();
    let err = client.list_shapes().await.unwrap_err();
    assert!(err.is_network());
}

#[tokio::test]
async fn test_upload_shape_and_health() {
    let router = Router::new()
        .route(
            "/symbols",
            post(|mut multipart: Multipart| async move {
                let field = multipart.next_field().await.unwrap().unwrap();
                let name = field.name().unwrap().to_string();
                let file_name = field.file_name().unwrap().to_string();
                let data = field.bytes().await.unwrap();
                assert_eq!(name, "file");
                assert!(!data.is_empty());
                (
                    StatusCode::CREATED,
                    Json(json!({
                        "metadata": {
                            "id": "moon_0a1b2c3d",
                            "name": "moon",
                            "original_filename": file_name,
                            "num_points": 64,
                            "normalized_length": 2.1
                        },
                        "polyline": [[0.0, 0.0], [1.0, 1.0]]
                    })),
                )
            }),
        )
        .route("/health", get(|| async { Json(json!({"status": "healthy"})) }));
    let client = ApiClient::new(serve(router).await).unwrap();

    let shape = client
        .upload_shape("moon.svg", b"<svg><path d=\"M0 0 L1 1\"/></svg>".to_vec())
        .await
        .unwrap();
    assert_eq!(shape.id, "moon_0a1b2c3d");
    assert_eq!(shape.source_file_name, "moon.svg");

    assert_eq!(client.health().await.unwrap(), "healthy");
}

#[tokio::test]
async fn test_geocoder_first_match_and_no_match() {
    let router = Router::new().route(
        "/search",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            assert_eq!(params.get("format").map(String::as_str), Some("json"));
            assert_eq!(params.get("limit").map(String::as_str), Some("1"));
            let body = match params.get("q").map(String::as_str) {
                Some("Paris, France") => json!([{"lat": "48.8588897", "lon": "2.3200410", "display_name": "Paris"}]),
                _ => json!([]),
            };
            Json(body)
        }),
    );
    let base = serve(router).await;
    let geocoder = NominatimGeocoder::with_endpoint(format!("{}/search", base));

    let position = geocoder.search("Paris, France").await.unwrap();
    assert_eq!(position, Position::new(48.8588897, 2.320041));

    let err = geocoder.search("Atlantis").await.unwrap_err();
    assert_eq!(err.to_string(), "No location found for 'Atlantis'");
}
