/// Metres per degree of latitude.
const METRES_PER_DEGREE: f64 = 111_320.0;

/// Equirectangular projection of a lat/lon window onto a pixel rectangle.
#[derive(Debug, Clone, Copy)]
pub struct MapProjection {
    pub center_lat: f64,
    pub center_lon: f64,
    /// Vertical extent of the window in degrees of latitude.
    pub span_deg: f64,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl MapProjection {
    fn px_per_degree(&self) -> f64 {
        self.height as f64 / self.span_deg.max(1e-6)
    }

    pub fn project(&self, lat: f64, lon: f64) -> (i32, i32) {
        let scale = self.px_per_degree();
        let lon_scale = self.center_lat.to_radians().cos();
        let px = self.x as f64 + self.width as f64 / 2.0 + (lon - self.center_lon) * lon_scale * scale;
        let py = self.y as f64 + self.height as f64 / 2.0 - (lat - self.center_lat) * scale;
        (px.round() as i32, py.round() as i32)
    }

    pub fn metres_to_px(&self, metres: f64) -> i32 {
        (metres / METRES_PER_DEGREE * self.px_per_degree()).round() as i32
    }

    pub fn contains(&self, point: (i32, i32)) -> bool {
        point.0 >= self.x
            && point.1 >= self.y
            && point.0 < self.x + self.width as i32
            && point.1 < self.y + self.height as i32
    }
}
