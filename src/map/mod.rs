mod countries;
mod geometry;
mod projection;
mod spatial;

pub use countries::{Country, CountryLayer, Polygon, Ring};
pub use projection::{Viewport, MAX_ZOOM, MIN_ZOOM};
pub use spatial::BBox;

#[cfg(test)]
pub(crate) use countries::tests::sample_layer;
