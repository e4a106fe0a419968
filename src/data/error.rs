use std::path::PathBuf;

use thiserror::Error;

/// Why a dataset could not be loaded. Always non-fatal to the app.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse mortality table {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: simd_json::Error,
    },
    #[error("failed to parse GeoJSON {}: {source}", path.display())]
    GeoJson {
        path: PathBuf,
        source: Box<geojson::Error>,
    },
    #[error("{} is not a GeoJSON FeatureCollection", path.display())]
    NotFeatureCollection { path: PathBuf },
}
