mod error;

pub use error::LoadError;

use std::fs;
use std::path::Path;

use geojson::{GeoJson, PolygonType, Value};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info, warn};

use crate::map::{Country, CountryLayer, Polygon, Ring};
use crate::mortality::MortalityTable;
use crate::scale::UNKNOWN_ENTITY;

const ENTITY_FIELD: &str = "Entity";
const YEAR_FIELD: &str = "Year";

/// Both static datasets. A table that failed to load stays `None`.
#[derive(Default)]
pub struct Datasets {
    pub countries: Option<CountryLayer>,
    pub mortality: Option<MortalityTable>,
}

/// Load the country outlines and the mortality table concurrently.
///
/// Each load is attempted once. Failures are logged and leave that table
/// unset so dependent lookups degrade to "no data".
pub fn load_all(geo_path: &Path, data_path: &Path) -> Datasets {
    let (countries, mortality) = rayon::join(|| load_countries(geo_path), || load_mortality(data_path));

    let countries = match countries {
        Ok(layer) => {
            info!(path = %geo_path.display(), countries = layer.len(), "loaded country outlines");
            Some(layer)
        }
        Err(err) => {
            warn!(error = %err, "country outlines unavailable");
            None
        }
    };

    let mortality = match mortality {
        Ok(table) => {
            info!(
                path = %data_path.display(),
                rows = table.len(),
                years = ?table.year_span(),
                indicators = table.indicators().len(),
                "loaded mortality table"
            );
            Some(table)
        }
        Err(err) => {
            warn!(error = %err, "mortality table unavailable");
            None
        }
    };

    Datasets { countries, mortality }
}

/// Load the per-country, per-year mortality table from a JSON array of rows
pub fn load_mortality(path: &Path) -> Result<MortalityTable, LoadError> {
    let mut bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_mortality(&mut bytes).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse rows shaped like `{"Entity": "Chile", "Year": 2010, "<indicator>": 12.0, ...}`.
///
/// Rows without an entity or an integral year are skipped. Only numeric
/// fields become indicator values.
pub fn parse_mortality(bytes: &mut [u8]) -> Result<MortalityTable, simd_json::Error> {
    let rows: Vec<Map<String, JsonValue>> = simd_json::serde::from_slice(bytes)?;

    let mut builder = MortalityTable::builder();
    let mut skipped = 0usize;

    for row in &rows {
        let entity = row.get(ENTITY_FIELD).and_then(JsonValue::as_str);
        let year = row.get(YEAR_FIELD).and_then(json_year);
        let (Some(entity), Some(year)) = (entity, year) else {
            skipped += 1;
            continue;
        };

        let values = row
            .iter()
            .filter(|(key, _)| key.as_str() != ENTITY_FIELD && key.as_str() != YEAR_FIELD)
            .filter_map(|(key, value)| value.as_f64().map(|v| (key.as_str(), v)));
        builder.push(entity, year, values);
    }

    if skipped > 0 {
        debug!(skipped, "skipped rows without entity or year");
    }

    Ok(builder.build())
}

fn json_year(value: &JsonValue) -> Option<i32> {
    if let Some(year) = value.as_i64() {
        return i32::try_from(year).ok();
    }
    value
        .as_f64()
        .filter(|y| y.fract() == 0.0 && y.abs() < i32::MAX as f64)
        .map(|y| y as i32)
}

/// Load country polygons from a GeoJSON FeatureCollection
pub fn load_countries(path: &Path) -> Result<CountryLayer, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let geojson: GeoJson = content.parse().map_err(|source| LoadError::GeoJson {
        path: path.to_path_buf(),
        source: Box::new(source),
    })?;
    countries_from_geojson(geojson).ok_or_else(|| LoadError::NotFeatureCollection {
        path: path.to_path_buf(),
    })
}

/// Build the country layer. Features without a `name` property become
/// "Unknown"; features without polygon geometry are dropped.
pub fn countries_from_geojson(geojson: GeoJson) -> Option<CountryLayer> {
    let GeoJson::FeatureCollection(fc) = geojson else {
        return None;
    };

    let countries = fc
        .features
        .into_iter()
        .filter_map(|feature| {
            let name = feature
                .properties
                .as_ref()
                .and_then(|p| p.get("name"))
                .and_then(|v| v.as_str())
                .unwrap_or(UNKNOWN_ENTITY)
                .to_string();

            let polygons = feature.geometry.map(|g| polygons_of(&g.value)).unwrap_or_default();
            if polygons.is_empty() {
                debug!(%name, "feature has no polygon geometry");
                return None;
            }
            Some(Country::new(name, polygons))
        })
        .collect();

    Some(CountryLayer::new(countries))
}

fn polygons_of(value: &Value) -> Vec<Polygon> {
    match value {
        Value::Polygon(rings) => polygon_of(rings).into_iter().collect(),
        Value::MultiPolygon(polygons) => polygons.iter().filter_map(polygon_of).collect(),
        Value::GeometryCollection(geometries) => {
            geometries.iter().flat_map(|g| polygons_of(&g.value)).collect()
        }
        _ => Vec::new(),
    }
}

#[inline(always)]
fn on_globe(lon: f64, lat: f64) -> bool {
    (-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat)
}

/// Rings keep only vertices on the globe. A polygon whose exterior ring
/// no longer closes an area is dropped.
fn polygon_of(rings: &PolygonType) -> Option<Polygon> {
    let mut dropped = 0usize;
    let rings: Vec<Ring> = rings
        .iter()
        .map(|coords| {
            coords
                .iter()
                .filter(|c| c.len() >= 2)
                .map(|c| (c[0], c[1]))
                .filter(|&(lon, lat)| {
                    let keep = on_globe(lon, lat);
                    dropped += usize::from(!keep);
                    keep
                })
                .collect()
        })
        .collect();

    if dropped > 0 {
        debug!(dropped, "dropped out-of-range coordinates");
    }
    match rings.first() {
        Some(exterior) if exterior.len() >= 3 => Some(Polygon::new(rings)),
        _ => None,
    }
}
