use serde::{Deserialize, Serialize};

/// Spheroid placement on the lattice: centre at `((side + 1) / 2, (side + 1) / 2)`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpheroidGeometry {
    pub side: usize,
    pub radius: u32,
}

/// Initial region of an interior lattice site.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// Strictly inside the initial spheroid; no matrix.
    Spheroid,
    /// On the spheroid rim, in the interface column.
    InterfaceRim,
    /// On the spheroid rim, in the bulk.
    BulkRim,
    /// Outside the spheroid, in the interface column.
    InterfaceChannel,
    /// Outside the spheroid, in the bulk.
    Bulk,
}

impl Region {
    pub fn is_interface(self) -> bool {
        matches!(self, Region::InterfaceRim | Region::InterfaceChannel)
    }

    pub fn is_seeded(self) -> bool {
        matches!(self, Region::Spheroid | Region::InterfaceRim | Region::BulkRim)
    }
}

impl SpheroidGeometry {
    pub fn new(side: usize, radius: u32) -> Self {
        SpheroidGeometry { side, radius }
    }

    pub fn center(&self) -> f64 {
        (self.side as f64 + 1.0) / 2.0
    }

    /// Squared distance of a (possibly fractional or out-of-lattice) coordinate to the centre.
    #[inline(always)]
    pub fn offset_sq(&self, x: f64, y: f64) -> f64 {
        let c = self.center();
        let dx = x - c;
        let dy = y - c;
        dx * dx + dy * dy
    }

    pub fn is_interface_column(&self, x: usize) -> bool {
        x as f64 == self.center()
    }

    /// True when the site lies on or beyond the sphere inflated by one site.
    pub fn outside_inflated_sphere(&self, x: f64, y: f64) -> bool {
        let inflated = self.radius as f64 + 1.0;
        self.offset_sq(x, y) >= inflated * inflated
    }

    /// Whether the initial spheroid fits inside the lattice without wrapping.
    pub fn fits(&self) -> bool {
        2.0 * (self.radius as f64) < self.side as f64
    }

    pub fn classify(&self, x: usize, y: usize) -> Region {
        let d2 = self.offset_sq(x as f64, y as f64);
        let r2 = (self.radius as f64) * (self.radius as f64);
        let interface = self.is_interface_column(x);
        if d2 < r2 {
            Region::Spheroid
        } else if d2 == r2 {
            if interface { Region::InterfaceRim } else { Region::BulkRim }
        } else if interface {
            Region::InterfaceChannel
        } else {
            Region::Bulk
        }
    }
}

/// Region of every interior site, fixed at initialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionMap {
    side: usize,
    regions: Vec<Region>,
}

impl RegionMap {
    pub fn new(geometry: &SpheroidGeometry) -> Self {
        let side = geometry.side;
        let regions = (1..=side)
            .flat_map(|x| (1..=side).map(move |y| (x, y)))
            .map(|(x, y)| geometry.classify(x, y))
            .collect();
        RegionMap { side, regions }
    }

    /// Region of interior site `(x, y)`, both in `1..=side`.
    pub fn get(&self, x: usize, y: usize) -> Region {
        self.regions[(x - 1) * self.side + (y - 1)]
    }

    pub fn count(&self, region: Region) -> usize {
        self.regions.iter().filter(|&&r| r == region).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_side_has_integer_center_and_interface_column() {
        let g = SpheroidGeometry::new(11, 3);
        assert_eq!(g.center(), 6.0);
        assert!(g.is_interface_column(6));
        assert!(!g.is_interface_column(5));
    }

    #[test]
    fn even_side_has_no_interface_column() {
        let g = SpheroidGeometry::new(10, 3);
        assert!((1..=10).all(|x| !g.is_interface_column(x)));
    }

    #[test]
    fn classification_follows_distance_and_column() {
        let g = SpheroidGeometry::new(11, 3);
        assert_eq!(g.classify(6, 6), Region::Spheroid);
        assert_eq!(g.classify(6, 9), Region::InterfaceRim);
        assert_eq!(g.classify(9, 6), Region::BulkRim);
        assert_eq!(g.classify(6, 11), Region::InterfaceChannel);
        assert_eq!(g.classify(1, 1), Region::Bulk);
    }

    #[test]
    fn region_map_counts_rim_sites() {
        let g = SpheroidGeometry::new(11, 3);
        let map = RegionMap::new(&g);
        // (0, +-3) lies in the interface column, (+-3, 0) in the bulk.
        assert_eq!(map.count(Region::InterfaceRim), 2);
        assert_eq!(map.count(Region::BulkRim), 2);
        assert_eq!(map.get(6, 9), Region::InterfaceRim);
        assert_eq!(map.count(Region::InterfaceChannel), 11 - 7);
    }

    #[test]
    fn fits_reports_oversized_spheroid() {
        assert!(SpheroidGeometry::new(81, 20).fits());
        assert!(!SpheroidGeometry::new(11, 6).fits());
    }
}
