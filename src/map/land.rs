use rayon::prelude::*;

use crate::geo::{normalize_lat, normalize_lon};

/// A closed ring of (lon, lat) vertices. The closing edge is implied.
pub type Ring = Vec<(f64, f64)>;

/// Exterior ring followed by any holes
pub type Polygon = Vec<Ring>;

/// Coarse land/water raster for O(1) land lookups (0.25° cells = 1440×720)
#[derive(Clone)]
pub struct LandMask {
    /// Row-major, row 0 at the south pole
    cells: Vec<bool>,
}

impl LandMask {
    const RESOLUTION: f64 = 0.25;
    const WIDTH: usize = 1440;
    const HEIGHT: usize = 720;

    /// A mask with no land
    pub fn empty() -> Self {
        Self {
            cells: vec![false; Self::WIDTH * Self::HEIGHT],
        }
    }

    /// Rasterize polygons with an even-odd scanline fill per polygon.
    /// Rows are filled in parallel.
    pub fn from_polygons(polygons: &[Polygon]) -> Self {
        let mut mask = Self::empty();
        let bounds: Vec<(f64, f64)> = polygons.iter().map(lat_bounds).collect();

        mask.cells
            .par_chunks_mut(Self::WIDTH)
            .enumerate()
            .for_each(|(row, cells)| {
                let lat = -90.0 + (row as f64 + 0.5) * Self::RESOLUTION;
                let mut crossings = Vec::new();

                for (polygon, &(min_lat, max_lat)) in polygons.iter().zip(&bounds) {
                    if lat < min_lat || lat > max_lat {
                        continue;
                    }
                    crossings.clear();
                    for ring in polygon {
                        ring_crossings(ring, lat, &mut crossings);
                    }
                    crossings.sort_by(f64::total_cmp);

                    for span in crossings.chunks_exact(2) {
                        fill_span(cells, span[0], span[1]);
                    }
                }
            });

        mask
    }

    /// Fast O(1) land check
    #[inline(always)]
    pub fn is_on_land(&self, lon: f64, lat: f64) -> bool {
        let lon_idx = ((normalize_lon(lon) / Self::RESOLUTION) as usize).min(Self::WIDTH - 1);
        let lat_idx = ((normalize_lat(lat) / Self::RESOLUTION) as usize).min(Self::HEIGHT - 1);
        self.cells[lat_idx * Self::WIDTH + lon_idx]
    }

    /// Share of cells marked as land
    pub fn land_fraction(&self) -> f64 {
        self.cells.iter().filter(|&&c| c).count() as f64 / self.cells.len() as f64
    }

    pub fn has_land(&self) -> bool {
        self.cells.iter().any(|&c| c)
    }
}

/// Latitude extent of a polygon's rings
fn lat_bounds(polygon: &Polygon) -> (f64, f64) {
    polygon
        .iter()
        .flatten()
        .fold((f64::MAX, f64::MIN), |(lo, hi), &(_, lat)| (lo.min(lat), hi.max(lat)))
}

/// Longitudes where a ring's edges cross a parallel
fn ring_crossings(ring: &Ring, lat: f64, out: &mut Vec<f64>) {
    if ring.len() < 3 {
        return;
    }
    let mut prev = ring[ring.len() - 1];
    for &point in ring {
        let (lon0, lat0) = prev;
        let (lon1, lat1) = point;
        if (lat0 > lat) != (lat1 > lat) {
            out.push(lon0 + (lat - lat0) * (lon1 - lon0) / (lat1 - lat0));
        }
        prev = point;
    }
}

/// Mark cells whose centers fall within [lon0, lon1)
fn fill_span(cells: &mut [bool], lon0: f64, lon1: f64) {
    let res = LandMask::RESOLUTION;
    let first = ((lon0 + 180.0) / res - 0.5).ceil().max(0.0) as usize;
    let last = ((lon1 + 180.0) / res - 0.5).ceil().min(cells.len() as f64) as usize;
    if first < last {
        cells[first..last].fill(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(lon0: f64, lat0: f64, lon1: f64, lat1: f64) -> Ring {
        vec![(lon0, lat0), (lon1, lat0), (lon1, lat1), (lon0, lat1)]
    }

    #[test]
    fn test_empty_has_no_land() {
        let mask = LandMask::empty();
        assert!(!mask.has_land());
        assert!(!mask.is_on_land(0.0, 0.0));
    }

    #[test]
    fn test_square_is_filled() {
        let mask = LandMask::from_polygons(&[vec![square(-10.0, -10.0, 10.0, 10.0)]]);
        assert!(mask.is_on_land(0.0, 0.0));
        assert!(mask.is_on_land(9.8, -9.8));
        assert!(!mask.is_on_land(10.2, 0.0));
        assert!(!mask.is_on_land(0.0, 10.2));
        assert!(!mask.is_on_land(120.0, 45.0));
    }

    #[test]
    fn test_hole_is_water() {
        let mask = LandMask::from_polygons(&[vec![
            square(-20.0, -20.0, 20.0, 20.0),
            square(-5.0, -5.0, 5.0, 5.0),
        ]]);
        assert!(mask.is_on_land(-15.0, 0.0));
        assert!(!mask.is_on_land(0.0, 0.0));
    }

    #[test]
    fn test_overlapping_polygons_union() {
        let mask = LandMask::from_polygons(&[
            vec![square(0.0, 0.0, 20.0, 20.0)],
            vec![square(10.0, 10.0, 30.0, 30.0)],
        ]);
        assert!(mask.is_on_land(15.0, 15.0));
        assert!(mask.is_on_land(25.0, 25.0));
        assert!(mask.is_on_land(5.0, 5.0));
    }

    #[test]
    fn test_edges_of_world() {
        let mask = LandMask::from_polygons(&[vec![square(-180.0, -90.0, 180.0, -80.0)]]);
        assert!(mask.is_on_land(-180.0, -90.0));
        assert!(mask.is_on_land(179.9, -85.0));
        assert!(!mask.is_on_land(0.0, -70.0));
        let fraction = mask.land_fraction();
        assert!(fraction > 0.05 && fraction < 0.06);
    }
}
