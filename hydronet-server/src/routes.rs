//! HTTP handlers over the network loaded at startup.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use geojson::FeatureCollection;
use hydronet_core::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub network: Arc<Network>,
}

/// Position on a branch, the branch referenced by name.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocationDto {
    pub branch: String,
    pub offset: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SegmentDto {
    pub branch: String,
    pub offset: f64,
    pub end_offset: f64,
    pub direction_is_positive: bool,
    pub length: f64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct NetworkSummary {
    pub name: String,
    pub node_count: usize,
    pub branch_count: usize,
    pub total_length: f64,
}

#[derive(Debug, Deserialize)]
pub struct ShortestPathRequest {
    pub source: LocationDto,
    pub target: LocationDto,
}

#[derive(Debug, Serialize)]
pub struct ShortestPathResponse {
    /// `false` when the two locations are not connected; segments are then empty.
    pub reachable: bool,
    pub length: f64,
    pub segments: Vec<SegmentDto>,
    pub geojson: FeatureCollection,
}

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub locations: Vec<LocationDto>,
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub length: f64,
    pub unit: &'static str,
    pub segments: Vec<SegmentDto>,
    pub contains_loops: bool,
    pub is_disconnected: bool,
    pub has_duplicate_offsets: bool,
    pub location_offsets: Vec<Option<f64>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/network", get(network_summary))
        .route("/shortest-path", post(shortest_path_handler))
        .route("/route", post(route_handler))
        .with_state(state)
}

fn resolve(network: &Network, location: &LocationDto) -> Result<NetworkLocation, ApiError> {
    if !location.offset.is_finite() {
        return Err(ApiError::BadRequest(format!(
            "Offset on {} is not a finite number",
            location.branch
        )));
    }
    let branch = network
        .branch_by_name(&location.branch)
        .ok_or_else(|| ApiError::UnknownBranch(location.branch.clone()))?;
    Ok(NetworkLocation::new(branch, location.offset))
}

fn segment_dto(network: &Network, segment: &NetworkSegment) -> SegmentDto {
    SegmentDto {
        branch: network
            .branch(segment.branch)
            .map(|branch| branch.name.clone())
            .unwrap_or_default(),
        offset: segment.offset,
        end_offset: segment.end_offset,
        direction_is_positive: segment.direction_is_positive,
        length: segment.length(),
    }
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /network
pub async fn network_summary(State(state): State<AppState>) -> Json<NetworkSummary> {
    let network = &state.network;
    Json(NetworkSummary {
        name: network.name.clone(),
        node_count: network.node_count(),
        branch_count: network.branch_count(),
        total_length: network.total_length(),
    })
}

/// POST /shortest-path
pub async fn shortest_path_handler(
    State(state): State<AppState>,
    Json(request): Json<ShortestPathRequest>,
) -> Result<Json<ShortestPathResponse>, ApiError> {
    let source = resolve(&state.network, &request.source)?;
    let target = resolve(&state.network, &request.target)?;

    let network = Arc::clone(&state.network);
    let response = tokio::task::spawn_blocking(move || {
        let path = shortest_path(&network, &source, &target);
        let geojson = segments_to_geojson(&network, &path)?;
        Ok::<_, ApiError>(ShortestPathResponse {
            reachable: !path.is_empty(),
            length: path_length(&path),
            segments: path.iter().map(|s| segment_dto(&network, s)).collect(),
            geojson,
        })
    })
    .await??;

    tracing::debug!(
        source = %request.source.branch,
        target = %request.target.branch,
        reachable = response.reachable,
        length = response.length,
        "Shortest path computed"
    );
    Ok(Json(response))
}

/// POST /route
pub async fn route_handler(
    State(state): State<AppState>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<RouteResponse>, ApiError> {
    if request.locations.len() < 2 {
        return Err(ApiError::BadRequest(
            "A route needs at least two locations".to_string(),
        ));
    }
    let locations = request
        .locations
        .iter()
        .map(|location| resolve(&state.network, location))
        .collect::<Result<Vec<_>, _>>()?;

    let network = Arc::clone(&state.network);
    let response = tokio::task::spawn_blocking(move || {
        let route = create_route(&network, &locations)?;
        Ok::<_, ApiError>(RouteResponse {
            length: route.length(),
            unit: route.unit(),
            segments: route
                .segments()
                .iter()
                .map(|s| segment_dto(&network, s))
                .collect(),
            contains_loops: route_contain_loops(&route),
            is_disconnected: is_disconnected(&network, &route),
            has_duplicate_offsets: has_duplicate_offsets(&route),
            location_offsets: route_location_offsets(&route),
        })
    })
    .await??;

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use geo::{Point, line_string};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    /// Two branches in a row plus an isolated one
    fn state() -> AppState {
        let mut network = Network::new("test");
        let a = network.add_node("a", Point::new(0.0, 0.0));
        let b = network.add_node("b", Point::new(100.0, 0.0));
        let c = network.add_node("c", Point::new(200.0, 0.0));
        let d = network.add_node("d", Point::new(0.0, 500.0));
        let e = network.add_node("e", Point::new(100.0, 500.0));
        network
            .add_branch("ab", a, b, line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)])
            .unwrap();
        network
            .add_branch("bc", b, c, line_string![(x: 100.0, y: 0.0), (x: 200.0, y: 0.0)])
            .unwrap();
        network
            .add_branch("de", d, e, line_string![(x: 0.0, y: 500.0), (x: 100.0, y: 500.0)])
            .unwrap();
        AppState {
            network: Arc::new(network),
        }
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = router(state()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_network_summary() {
        let request = Request::builder().uri("/network").body(Body::empty()).unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "test");
        assert_eq!(body["node_count"], 5);
        assert_eq!(body["branch_count"], 3);
        assert_eq!(body["total_length"], 300.0);
    }

    #[tokio::test]
    async fn test_shortest_path_across_node() {
        let (status, body) = send(post_json(
            "/shortest-path",
            json!({
                "source": { "branch": "ab", "offset": 40.0 },
                "target": { "branch": "bc", "offset": 30.0 }
            }),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reachable"], true);
        assert_eq!(body["length"], 90.0);
        let segments = body["segments"].as_array().unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0]["branch"], "ab");
        assert_eq!(segments[0]["offset"], 40.0);
        assert_eq!(segments[0]["end_offset"], 100.0);
        assert_eq!(segments[1]["branch"], "bc");
        assert_eq!(segments[1]["end_offset"], 30.0);
        assert_eq!(body["geojson"]["features"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_shortest_path_disconnected() {
        let (status, body) = send(post_json(
            "/shortest-path",
            json!({
                "source": { "branch": "ab", "offset": 40.0 },
                "target": { "branch": "de", "offset": 30.0 }
            }),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reachable"], false);
        assert!(body["segments"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_branch_is_not_found() {
        let (status, body) = send(post_json(
            "/shortest-path",
            json!({
                "source": { "branch": "nope", "offset": 1.0 },
                "target": { "branch": "ab", "offset": 2.0 }
            }),
        ))
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "UNKNOWN_BRANCH");
    }

    #[tokio::test]
    async fn test_route_validation_flags() {
        let (status, body) = send(post_json(
            "/route",
            json!({
                "locations": [
                    { "branch": "ab", "offset": 10.0 },
                    { "branch": "bc", "offset": 50.0 },
                    { "branch": "ab", "offset": 60.0 }
                ]
            }),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["unit"], "m");
        assert_eq!(body["is_disconnected"], false);
        // ab at 60 lies inside the first walked segment
        assert_eq!(body["contains_loops"], true);
        assert_eq!(body["length"], 230.0);
    }

    #[tokio::test]
    async fn test_route_disconnected() {
        let (status, body) = send(post_json(
            "/route",
            json!({
                "locations": [
                    { "branch": "ab", "offset": 10.0 },
                    { "branch": "de", "offset": 50.0 }
                ]
            }),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_disconnected"], true);
        assert!(body["segments"].as_array().unwrap().is_empty());
        assert!(body["location_offsets"][0].is_null());
        assert_eq!(body["has_duplicate_offsets"], true);
    }

    #[tokio::test]
    async fn test_route_needs_two_locations() {
        let (status, body) = send(post_json(
            "/route",
            json!({ "locations": [{ "branch": "ab", "offset": 10.0 }] }),
        ))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }
}
