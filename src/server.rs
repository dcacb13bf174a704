use crate::config::AppConfig;
use crate::join::JoinIndex;
use crate::processing::Choropleth;
use crate::tooltip::{HoverSession, TooltipState};
use crate::types::{County, EducationRecord, FeatureId};
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::Point;
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

// Wrapper for RTree indexing
pub struct CountyIndex {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for CountyIndex {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

/// The rendered map plus the one shared hover session: a single pointer
/// drives the single tooltip.
pub struct AppState {
    pub counties: Vec<County>,
    pub joined: Vec<Option<EducationRecord>>,
    pub map: Choropleth,
    pub tree: RTree<CountyIndex>,
    pub hover: Mutex<HoverSession>,
}

impl AppState {
    pub fn new(records: &[EducationRecord], counties: Vec<County>, map: Choropleth) -> Self {
        let index = JoinIndex::new(records);
        let joined = counties
            .iter()
            .map(|county| index.lookup(county.id.as_ref()).cloned())
            .collect();

        // Counties without area have no bounding box and can never be hit.
        let tree_items: Vec<CountyIndex> = counties
            .iter()
            .enumerate()
            .filter_map(|(i, county)| {
                let rect = county.geometry.bounding_rect()?;
                Some(CountyIndex {
                    index: i,
                    aabb: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
                })
            })
            .collect();
        info!(indexed = tree_items.len(), "built county spatial index");

        Self {
            counties,
            joined,
            map,
            tree: RTree::bulk_load(tree_items),
            hover: Mutex::new(HoverSession::default()),
        }
    }

    /// Index of the county containing the point. Overlaps resolve to the
    /// county drawn first.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<usize> {
        let point = Point::new(x, y);
        self.tree
            .locate_in_envelope_intersecting(&AABB::from_point([x, y]))
            .map(|candidate| candidate.index)
            .filter(|&i| self.counties[i].geometry.contains(&point))
            .min()
    }
}

#[derive(Deserialize)]
pub struct HoverQuery {
    x: f64,
    y: f64,
    page_x: Option<f64>,
    page_y: Option<f64>,
}

#[derive(Serialize)]
pub struct CountyHit {
    fips: Option<FeatureId>,
    education: f64,
    fill: &'static str,
}

#[derive(Serialize)]
pub struct HoverResponse {
    county: Option<CountyHit>,
    tooltip: TooltipState,
}

pub fn build_router(state: Arc<AppState>, output_dir: &Path) -> Router {
    Router::new()
        .route("/api/hover", get(hover_handler))
        .fallback_service(ServeDir::new(output_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: &AppConfig, state: AppState) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], config.server.port));
    let app = build_router(Arc::new(state), &config.output.dir);

    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn hover_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HoverQuery>,
) -> Json<HoverResponse> {
    let hit = state.hit_test(params.x, params.y);
    let target = hit.map(|i| (i, state.joined[i].as_ref()));

    let tooltip = {
        let mut session = state.hover.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        session
            .pointer_move(
                target,
                params.page_x.unwrap_or(params.x),
                params.page_y.unwrap_or(params.y),
            )
            .clone()
    };

    let county = hit.map(|i| {
        let shape = &state.map.shapes[i];
        CountyHit {
            fips: shape.fips.clone(),
            education: shape.education,
            fill: shape.fill,
        }
    });
    Json(HoverResponse { county, tooltip })
}
