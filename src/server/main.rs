//! Query server for address lookups.
//!
//! Thin HTTP layer over the query engine: free-text search, polygon
//! containment with cursor paging, and proximity search.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use alder::query::filter::{FilterInput, OneOrMany};
use alder::models::{BatchResult, FeatureCollection};
use alder::store::{ElasticStore, EsClient};
use alder::{AddressQueryService, ContainmentRequest, ProximityRequest, QueryError, SearchRequest};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Address lookup query server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    listen: String,

    /// Elasticsearch URL
    #[arg(long, default_value = "http://localhost:9200")]
    es_url: String,

    /// Elasticsearch index name
    #[arg(long, default_value = "addresses")]
    index: String,
}

/// Application state shared across handlers
struct AppState {
    es_client: EsClient,
    service: AddressQueryService<ElasticStore>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Alder Query Server");
    info!("Connecting to Elasticsearch at {}", args.es_url);

    let es_client = EsClient::connect(&args.es_url, &args.index).await?;
    es_client.ensure_index().await?;

    let doc_count = es_client.doc_count().await?;
    info!(
        "Connected to index '{}' with {} documents",
        args.index, doc_count
    );

    let service = AddressQueryService::new(ElasticStore::new(es_client.clone()));
    let state = Arc::new(AppState { es_client, service });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/search", get(search_handler))
        .route("/v1/within", get(within_handler))
        .route("/v1/near", get(near_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let healthy = state.es_client.is_healthy().await;

    Ok(Json(HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        elasticsearch: healthy,
    }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    elasticsearch: bool,
}

/// Free-text fuzzy search
async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQueryParams>,
) -> Result<Json<FeatureCollection>, (StatusCode, String)> {
    let request = SearchRequest {
        query: params.query,
        limit: params.limit,
    };

    let result = state.service.search(&request).await.map_err(map_error)?;
    Ok(Json(result))
}

/// Containment search inside a WKT region, cursor-paged
async fn within_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WithinQueryParams>,
) -> Result<Json<BatchResult>, (StatusCode, String)> {
    let request = ContainmentRequest {
        region_wkt: params.wkt,
        limit: params.limit,
        batch_size: params.batch_size,
        cursor: params.cursor,
        filters: build_filters(
            params.city,
            params.street,
            params.postcode,
            params.district,
            params.region,
            params.number,
        ),
    };

    let result = state.service.within(&request).await.map_err(map_error)?;
    Ok(Json(result))
}

/// Proximity search around a point
async fn near_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NearQueryParams>,
) -> Result<Json<FeatureCollection>, (StatusCode, String)> {
    let request = ProximityRequest {
        point: [params.point_lon, params.point_lat],
        max_distance: params.max_distance,
        filters: build_filters(
            params.city,
            params.street,
            params.postcode,
            params.district,
            params.region,
            params.number,
        ),
    };

    let result = state.service.near(&request).await.map_err(map_error)?;
    Ok(Json(result))
}

#[derive(Deserialize)]
struct SearchQueryParams {
    /// Search text
    query: String,
    /// Number of results
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct WithinQueryParams {
    /// WKT POLYGON or MULTIPOLYGON
    wkt: String,
    limit: Option<usize>,
    batch_size: Option<usize>,
    /// Cursor from the previous page
    cursor: Option<String>,
    // Filters; multi-valued fields take comma-separated values
    city: Option<String>,
    street: Option<String>,
    postcode: Option<String>,
    district: Option<String>,
    region: Option<String>,
    number: Option<String>,
}

#[derive(Deserialize)]
struct NearQueryParams {
    /// Point longitude
    #[serde(rename = "point.lon")]
    point_lon: f64,
    /// Point latitude
    #[serde(rename = "point.lat")]
    point_lat: f64,
    /// Match radius in meters (defaults to 1000)
    max_distance: Option<f64>,
    // Filters; multi-valued fields take comma-separated values
    city: Option<String>,
    street: Option<String>,
    postcode: Option<String>,
    district: Option<String>,
    region: Option<String>,
    number: Option<String>,
}

fn build_filters(
    city: Option<String>,
    street: Option<String>,
    postcode: Option<String>,
    district: Option<String>,
    region: Option<String>,
    number: Option<String>,
) -> FilterInput {
    FilterInput {
        city: city.map(OneOrMany::One),
        street: street.map(OneOrMany::One),
        postcode: postcode.map(OneOrMany::One),
        district: district.map(OneOrMany::One),
        region: region.map(OneOrMany::One),
        number,
    }
}

fn map_error(err: QueryError) -> (StatusCode, String) {
    match &err {
        QueryError::GeometryParse(_)
        | QueryError::InvalidCursor { .. }
        | QueryError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        QueryError::Store(_) => {
            tracing::error!("store fetch failed: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}
