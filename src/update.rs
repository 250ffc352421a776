use crate::neighbors::{NeighborField, NeighborSums};
use crate::state::LatticeState;
use rayon::prelude::*;
use sandwich_common::{CellState, SandwichError, SimParams};

/// Upper bound on cell density; exceeding values are set to exactly this.
pub const MAX_CELL_DENSITY: f64 = 1.0;

/// Rate constants of the cell/ECM reaction rule.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ReactionKinetics {
    /// `2^(1/tau)`, unconstrained per-step growth.
    pub growth_factor: f64,
    /// `d1`
    pub degradation_rate: f64,
    /// `d2`
    pub neighbor_degradation_rate: f64,
    /// `m`
    pub growth_rate: f64,
    /// `f_c`
    pub critical_ecm_density: f64,
}

impl ReactionKinetics {
    pub fn from_params(params: &SimParams) -> Self {
        ReactionKinetics {
            growth_factor: params.growth_factor,
            degradation_rate: params.degradation_rate,
            neighbor_degradation_rate: params.neighbor_degradation_rate,
            growth_rate: params.growth_rate,
            critical_ecm_density: params.critical_ecm_density,
        }
    }

    /// New state of one site from its own and its neighbours' previous values.
    ///
    /// ECM is degraded by resident cells (`d1`) and by neighbouring cells (`d2`).
    /// Cell density grows by `2^(1/tau)`, gains inflow from neighbours weighted
    /// by local permissiveness `exp(-ecm / f_c)`, and loses outflow weighted by
    /// the neighbours' permissiveness. Only the cell density is clamped.
    #[inline(always)]
    pub fn update_cell(&self, cell: CellState, neighbors: &[CellState; 4]) -> CellState {
        let sums = NeighborSums::from_neighbors(neighbors, self.critical_ecm_density);
        let cd = cell.cell_density;
        let ecm = cell.ecm_density;
        let ecm_decay = (-ecm / self.critical_ecm_density).exp();

        let new_ecm = ecm
            - self.degradation_rate * cd * ecm
            - self.neighbor_degradation_rate * sums.cell_density * ecm;

        let new_cd = self.growth_factor * cd
            + self.growth_rate * sums.cell_density * sums.ecm_density * ecm_decay
            - self.growth_rate * sums.ecm_permissiveness * sums.ecm_density * cd;

        // NaN must survive the clamp so inspection can report it.
        let new_cd = if new_cd > MAX_CELL_DENSITY { MAX_CELL_DENSITY } else { new_cd };
        CellState::new(new_cd, new_ecm)
    }
}

/// Outcome counters of one update step.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct StepReport {
    pub negative_ecm_sites: usize,
}

/// Computes the interior of `state.next` from `state.current` and the
/// neighbours gathered from it. Rows are independent and updated in parallel;
/// `state.current` is never written.
pub fn update_interior(state: &mut LatticeState, neighbors: &NeighborField, kinetics: &ReactionKinetics) {
    let side = state.side();
    if side == 0 {
        return;
    }
    let padded = side + 2;
    let current = &state.current;

    state.next.cells_mut()[padded..(side + 1) * padded]
        .par_chunks_mut(padded)
        .zip(neighbors.rows().collect::<Vec<_>>())
        .enumerate()
        .for_each(|(row, (out, row_neighbors))| {
            let input = current.interior_row(row + 1);
            for ((out_cell, &cell), site_neighbors) in out[1..=side].iter_mut().zip(input).zip(row_neighbors) {
                *out_cell = kinetics.update_cell(cell, site_neighbors);
            }
        });
}

/// Scans a freshly updated interior for non-finite values and negative ECM.
pub fn inspect_interior(state: &LatticeState, step: u32) -> Result<StepReport, SandwichError> {
    let mut report = StepReport::default();
    for (x, y, cell) in state.current.interior() {
        if !cell.is_finite() {
            return Err(SandwichError::NonFiniteState { step, x, y });
        }
        if cell.ecm_density < 0.0 {
            report.negative_ecm_sites += 1;
        }
    }
    Ok(report)
}
