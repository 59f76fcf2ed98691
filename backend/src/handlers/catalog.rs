//! Catalog constants endpoint

use axum::Json;
use shared::catalog::{catalog, Catalog};

/// Product categories, units and movement reasons per type
pub async fn get_catalog() -> Json<Catalog> {
    Json(catalog())
}
