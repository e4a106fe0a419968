use std::f64::consts::PI;

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 8.0;
const ZOOM_STEP: f64 = 1.5;
const MAX_LAT: f64 = 85.0;

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom level (1 shows the whole world across the canvas width)
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

/// Normalized Web Mercator coordinates in [0, 1]
#[inline(always)]
fn mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = (lon + 180.0) / 360.0;
    let lat_rad = lat.clamp(-MAX_LAT, MAX_LAT) * PI / 180.0;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
    (x, y)
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    /// World view centered slightly north of the equator
    pub fn world(width: usize, height: usize) -> Self {
        Self::new(0.0, 20.0, MIN_ZOOM, width, height)
    }

    #[inline(always)]
    fn scale(&self) -> f64 {
        self.zoom * self.width.max(1) as f64
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = 360.0 / self.scale();
        self.center_lon += dx as f64 * scale;
        self.center_lat -= dy as f64 * scale * 0.5; // Mercator distortion

        // Wrap longitude
        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }

        self.center_lat = self.center_lat.clamp(-MAX_LAT, MAX_LAT);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, ZOOM_STEP);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / ZOOM_STEP);
    }

    /// Zoom by factor while keeping the point under the cursor in place
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        self.unproject_f(px as f64, py as f64)
    }

    /// Unproject fractional pixel coordinates (cell centers fall between pixels)
    pub fn unproject_f(&self, px: f64, py: f64) -> (f64, f64) {
        let scale = self.scale();
        let (center_x, center_y) = mercator(self.center_lon, self.center_lat);

        let x = (px - self.width as f64 / 2.0) / scale + center_x;
        let y = (py - self.height as f64 / 2.0) / scale + center_y;

        let lon = x * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI;

        (lon, lat)
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let (x, y) = mercator(lon, lat);
        let (center_x, center_y) = mercator(self.center_lon, self.center_lat);
        let scale = self.scale();

        let px = ((x - center_x) * scale + self.width as f64 / 2.0) as i32;
        let py = ((y - center_y) * scale + self.height as f64 / 2.0) as i32;

        (px, py)
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0
            && min_x < self.width as i32
            && max_y >= 0
            && min_y < self.height as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        let (x, y) = vp.project(0.0, 0.0);
        assert_eq!(x, 50);
        assert_eq!(y, 50);
    }

    #[test]
    fn test_unproject_inverts_project() {
        let vp = Viewport::new(10.0, 20.0, 2.0, 400, 200);
        let (lon, lat) = vp.unproject_f(130.0, 70.0);
        let (px, py) = vp.project(lon, lat);
        assert!((px - 130).abs() <= 1);
        assert!((py - 70).abs() <= 1);
    }

    #[test]
    fn test_pan() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        vp.pan(10, 0);
        assert!(vp.center_lon > 0.0);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut vp = Viewport::world(100, 100);
        for _ in 0..20 {
            vp.zoom_in();
        }
        assert_eq!(vp.zoom, MAX_ZOOM);
        for _ in 0..20 {
            vp.zoom_out_at(10, 10);
        }
        assert_eq!(vp.zoom, MIN_ZOOM);
    }
}
