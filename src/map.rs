use ratatui::layout::Rect;
use serde::{Deserialize, Serialize};

/// Default tile source, `{s}` is the subdomain.
pub const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

const TILE_SIZE: f64 = 256.0;
/// Approximate pixel footprint of one terminal cell.
const CELL_PX_WIDTH: f64 = 8.0;
const CELL_PX_HEIGHT: f64 = 16.0;

pub const MIN_ZOOM: u8 = 2;
pub const MAX_ZOOM: u8 = 18;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Geographic extent of a rendered map area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl Bounds {
    pub fn contains(&self, c: Coordinate) -> bool {
        (self.west..=self.east).contains(&c.lng) && (self.south..=self.north).contains(&c.lat)
    }
}

/// Center and zoom of the map pane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapViewport {
    pub center: Coordinate,
    pub zoom: u8,
}

impl Default for MapViewport {
    fn default() -> Self {
        Self::tanzania()
    }
}

impl MapViewport {
    /// Country-wide view shown before a region is picked.
    pub fn tanzania() -> Self {
        Self {
            center: Coordinate {
                lat: -6.369028,
                lng: 34.888822,
            },
            zoom: 6,
        }
    }

    /// Degrees covered by one tile pixel at the current zoom.
    pub fn degrees_per_pixel(&self) -> f64 {
        360.0 / (TILE_SIZE * 2f64.powi(self.zoom as i32))
    }

    pub fn bounds(&self, width: u16, height: u16) -> Bounds {
        let dpp = self.degrees_per_pixel();
        let half_w = width as f64 * CELL_PX_WIDTH * dpp / 2.0;
        let half_h = height as f64 * CELL_PX_HEIGHT * dpp / 2.0;
        Bounds {
            west: self.center.lng - half_w,
            east: self.center.lng + half_w,
            south: self.center.lat - half_h,
            north: self.center.lat + half_h,
        }
    }

    /// Coordinate under the middle of screen cell (`column`, `row`), or `None`
    /// when the cell lies outside `area`.
    pub fn coordinate_at(&self, area: Rect, column: u16, row: u16) -> Option<Coordinate> {
        if area.width == 0 || area.height == 0 {
            return None;
        }
        if column < area.x || row < area.y || column >= area.right() || row >= area.bottom() {
            return None;
        }
        let bounds = self.bounds(area.width, area.height);
        let fx = ((column - area.x) as f64 + 0.5) / area.width as f64;
        let fy = ((row - area.y) as f64 + 0.5) / area.height as f64;
        Some(Coordinate {
            lat: (bounds.north - fy * (bounds.north - bounds.south)).clamp(-90.0, 90.0),
            lng: wrap_lng(bounds.west + fx * (bounds.east - bounds.west)),
        })
    }

    /// Shift the center by whole terminal cells (positive `dy` moves south).
    pub fn panned(&self, dx: i32, dy: i32) -> Self {
        let dpp = self.degrees_per_pixel();
        Self {
            center: Coordinate {
                lat: (self.center.lat - dy as f64 * CELL_PX_HEIGHT * dpp).clamp(-85.0, 85.0),
                lng: wrap_lng(self.center.lng + dx as f64 * CELL_PX_WIDTH * dpp),
            },
            zoom: self.zoom,
        }
    }

    pub fn zoomed(&self, delta: i8) -> Self {
        let zoom = (self.zoom as i16 + delta as i16).clamp(MIN_ZOOM as i16, MAX_ZOOM as i16);
        Self {
            center: self.center,
            zoom: zoom as u8,
        }
    }
}

fn wrap_lng(lng: f64) -> f64 {
    if (-180.0..=180.0).contains(&lng) {
        lng
    } else {
        (lng + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// Slippy-map tile indices containing `c` at `zoom`.
pub fn tile_xy(c: Coordinate, zoom: u8) -> (u32, u32) {
    let n = 2f64.powi(zoom as i32);
    let lat = c.lat.clamp(-85.0511, 85.0511).to_radians();
    let x = ((c.lng + 180.0) / 360.0 * n).floor();
    let y = ((1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) / 2.0 * n).floor();
    let max = n - 1.0;
    (x.clamp(0.0, max) as u32, y.clamp(0.0, max) as u32)
}

pub fn tile_url(template: &str, subdomain: char, z: u8, x: u32, y: u32) -> String {
    template
        .replace("{s}", &subdomain.to_string())
        .replace("{z}", &z.to_string())
        .replace("{x}", &x.to_string())
        .replace("{y}", &y.to_string())
}

/// Tile URL for the tile under the viewport center.
pub fn center_tile_url(template: &str, viewport: &MapViewport) -> String {
    let (x, y) = tile_xy(viewport.center, viewport.zoom);
    let subdomain = ['a', 'b', 'c'][((x % 3 + y % 3) % 3) as usize];
    tile_url(template, subdomain, viewport.zoom, x, y)
}

/// openstreetmap.org link for the current view, pinned at the marker if any.
pub fn browse_url(viewport: &MapViewport, marker: Option<Coordinate>) -> String {
    let view = format!(
        "#map={}/{:.5}/{:.5}",
        viewport.zoom, viewport.center.lat, viewport.center.lng
    );
    match marker {
        Some(m) => format!(
            "https://www.openstreetmap.org/?mlat={:.6}&mlon={:.6}{}",
            m.lat, m.lng, view
        ),
        None => format!("https://www.openstreetmap.org/{}", view),
    }
}
