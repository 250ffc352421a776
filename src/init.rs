use sandwich_common::{CellState, Lattice, Region, RegionMap, SimParams, SpheroidGeometry};

/// Initial `(cell, ecm)` densities of the three seeded materials.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct InitialDensities {
    pub cell_density: f64,
    pub interface_ecm_density: f64,
    pub bulk_ecm_density: f64,
}

impl InitialDensities {
    pub fn from_params(params: &SimParams) -> Self {
        InitialDensities {
            cell_density: params.initial_cell_density,
            interface_ecm_density: params.interface_ecm_density,
            bulk_ecm_density: params.bulk_ecm_density,
        }
    }

    /// State of a site at `t = 0` given its region.
    pub fn state_for(&self, region: Region) -> CellState {
        match region {
            Region::Spheroid => CellState::new(self.cell_density, 0.0),
            Region::InterfaceRim => CellState::new(self.cell_density, self.interface_ecm_density),
            Region::BulkRim => CellState::new(self.cell_density, self.bulk_ecm_density),
            Region::InterfaceChannel => CellState::new(0.0, self.interface_ecm_density),
            Region::Bulk => CellState::new(0.0, self.bulk_ecm_density),
        }
    }
}

/// Builds the sandwich lattice: a seeded spheroid, an interface column of
/// low-density matrix through its centre and bulk matrix everywhere else.
/// The ghost ring is left at zero.
pub fn initialize_lattice(regions: &RegionMap, densities: &InitialDensities, side: usize) -> Lattice {
    let mut lattice = Lattice::new(side);
    for x in 1..=side {
        for y in 1..=side {
            lattice.set(x, y, densities.state_for(regions.get(x, y)));
        }
    }
    lattice
}

/// Classifies the geometry and seeds the lattice from runtime parameters.
pub fn initial_conditions(params: &SimParams) -> (Lattice, RegionMap) {
    let geometry = SpheroidGeometry::new(params.lattice_side, params.initial_radius);
    let regions = RegionMap::new(&geometry);
    let lattice = initialize_lattice(&regions, &InitialDensities::from_params(params), params.lattice_side);
    (lattice, regions)
}
