use rayon::prelude::*;

use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_line, ring_contains};
use crate::map::projection::Viewport;
use crate::map::spatial::{BBox, FeatureGrid};

/// A closed ring of (lon, lat) coordinates
pub type Ring = Vec<(f64, f64)>;

/// Grid cell size in degrees for the country index
const INDEX_CELL_DEGREES: f64 = 10.0;

/// One polygon: exterior ring first, then holes
#[derive(Clone, Debug)]
pub struct Polygon {
    pub rings: Vec<Ring>,
    pub bbox: BBox,
}

impl Polygon {
    pub fn new(rings: Vec<Ring>) -> Self {
        let bbox = rings.first().map(|ring| BBox::of_points(ring)).unwrap_or(BBox::EMPTY);
        Self { rings, bbox }
    }

    /// Even-odd test over every ring, so holes punch through
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        if !self.bbox.contains(lon, lat) {
            return false;
        }
        self.rings
            .iter()
            .filter(|ring| ring_contains(ring, lon, lat))
            .count()
            % 2
            == 1
    }
}

/// A named country outline made of one or more polygons
#[derive(Clone, Debug)]
pub struct Country {
    pub name: String,
    pub polygons: Vec<Polygon>,
    pub bbox: BBox,
}

impl Country {
    pub fn new(name: impl Into<String>, polygons: Vec<Polygon>) -> Self {
        let bbox = polygons
            .iter()
            .fold(BBox::EMPTY, |acc, polygon| acc.union(polygon.bbox));
        Self {
            name: name.into(),
            polygons,
            bbox,
        }
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.bbox.contains(lon, lat) && self.polygons.iter().any(|p| p.contains(lon, lat))
    }
}

/// All country features plus a spatial index for hit testing
pub struct CountryLayer {
    countries: Vec<Country>,
    grid: FeatureGrid,
}

impl CountryLayer {
    pub fn new(countries: Vec<Country>) -> Self {
        let grid = FeatureGrid::build(countries.iter().map(|c| &c.bbox), INDEX_CELL_DEGREES);
        Self { countries, grid }
    }

    pub fn get(&self, idx: usize) -> Option<&Country> {
        self.countries.get(idx)
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.countries.iter().position(|c| c.name == name)
    }

    /// Index of the first country containing the point
    pub fn country_at(&self, lon: f64, lat: f64) -> Option<usize> {
        self.grid
            .candidates(lon, lat)
            .iter()
            .copied()
            .find(|&idx| self.countries[idx].contains(lon, lat))
    }

    /// Country under the center of every terminal cell, row-major.
    /// Rows are sampled in parallel.
    pub fn fill_cells(&self, cols: usize, rows: usize, viewport: &Viewport) -> Vec<Option<usize>> {
        (0..rows)
            .into_par_iter()
            .flat_map_iter(|row| {
                (0..cols).map(move |col| {
                    // Braille cells are 2x4 pixels
                    let px = col as f64 * 2.0 + 1.0;
                    let py = row as f64 * 4.0 + 2.0;
                    let (lon, lat) = viewport.unproject_f(px, py);
                    self.country_at(lon, lat)
                })
            })
            .collect()
    }

    /// Draw country outlines; `only` restricts drawing to a single country
    pub fn draw_borders(&self, canvas: &mut BrailleCanvas, viewport: &Viewport, only: Option<usize>) {
        let selected = match only {
            Some(idx) => self.countries.get(idx).into_iter().collect::<Vec<_>>(),
            None => self.countries.iter().collect(),
        };

        for country in selected {
            for polygon in &country.polygons {
                for ring in &polygon.rings {
                    draw_ring(canvas, ring, viewport);
                }
            }
        }
    }
}

/// Edges longer than half the globe wrap across the antimeridian
const MAX_EDGE_LON: f64 = 180.0;

fn draw_ring(canvas: &mut BrailleCanvas, ring: &[(f64, f64)], viewport: &Viewport) {
    for edge in ring.windows(2) {
        let (a, b) = (edge[0], edge[1]);
        if (b.0 - a.0).abs() > MAX_EDGE_LON {
            continue;
        }
        let from = viewport.project(a.0, a.1);
        let to = viewport.project(b.0, b.1);
        if viewport.line_might_be_visible(from, to) {
            draw_line(canvas, from.0, from.1, to.0, to.1);
        }
    }
}
