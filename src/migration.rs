use sandwich_common::{Lattice, SandwichError, SpheroidGeometry};

/// Number of symmetric wedges the sampled wedge stands in for.
pub const WEDGE_SYMMETRY: f64 = 4.0;

/// Breakdown of the outward spread measured on a final lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationAnalysis {
    /// Cell density summed over sites outside the inflated initial sphere.
    pub outside_sphere_total: f64,
    pub outside_sphere_sites: usize,
    /// Cell density summed over the wedge part of those sites.
    pub wedge_total: f64,
    pub wedge_sites: usize,
    /// `(S - 4 W) / S`, rounded to three decimals.
    pub ratio: f64,
}

/// Cell densities of every interior site with `dx^2 + dy^2 >= (r + 1)^2`.
pub fn outside_sphere(lattice: &Lattice, geometry: &SpheroidGeometry) -> Vec<f64> {
    lattice
        .interior()
        .filter(|&(x, y, _)| geometry.outside_inflated_sphere(x as f64, y as f64))
        .map(|(_, _, cell)| cell.cell_density)
        .collect()
}

/// Cell densities outside the inflated sphere within the diagonal wedge
/// `x in [c, n]`, `y in [n - (x + 1), x + 1)`, stepping by one from each lower
/// bound. Sampled coordinates are truncated and wrapped onto the torus.
pub fn wedge_outside(lattice: &Lattice, geometry: &SpheroidGeometry) -> Vec<f64> {
    let n = geometry.side as f64;
    let x_start = geometry.center();
    let mut values = Vec::new();

    let mut i = 0u32;
    loop {
        let x = x_start + i as f64;
        if x >= n + 1.0 {
            break;
        }
        let y_start = n - (x + 1.0);
        let y_end = x + 1.0;
        let mut j = 0u32;
        loop {
            let y = y_start + j as f64;
            if y >= y_end {
                break;
            }
            if geometry.outside_inflated_sphere(x, y) {
                let cell = lattice.get_wrapped(x.trunc() as i64, y.trunc() as i64);
                values.push(cell.cell_density);
            }
            j += 1;
        }
        i += 1;
    }
    values
}

/// Rounds to three decimal digits.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Fraction of the outward cell density attributed to interface-mediated
/// spread, extrapolating the sampled wedge to all four quadrants.
pub fn analyze_migration(lattice: &Lattice, geometry: &SpheroidGeometry) -> Result<MigrationAnalysis, SandwichError> {
    let outside = outside_sphere(lattice, geometry);
    let wedge = wedge_outside(lattice, geometry);
    let outside_sphere_total: f64 = outside.iter().sum();
    let wedge_total: f64 = wedge.iter().sum();

    if !outside_sphere_total.is_finite() || !wedge_total.is_finite() {
        return Err(SandwichError::NonFiniteRatio);
    }
    if outside_sphere_total == 0.0 {
        return Err(SandwichError::DegenerateMigrationRatio);
    }

    let ratio = round3((outside_sphere_total - WEDGE_SYMMETRY * wedge_total) / outside_sphere_total);
    Ok(MigrationAnalysis {
        outside_sphere_total,
        outside_sphere_sites: outside.len(),
        wedge_total,
        wedge_sites: wedge.len(),
        ratio,
    })
}
