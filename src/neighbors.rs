use rayon::prelude::*;
use sandwich_common::{CellState, Lattice};

/// Von Neumann neighbour order: +x, -x, +y, -y.
pub const NEIGHBOR_OFFSETS: [(i64, i64); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// The four toroidal neighbours of every interior site, rebuilt each step.
#[derive(Debug, Clone)]
pub struct NeighborField {
    side: usize,
    neighbors: Vec<[CellState; 4]>,
}

/// Per-site sums over the von Neumann neighbourhood used by the update rule.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct NeighborSums {
    pub cell_density: f64,
    pub ecm_density: f64,
    /// Sum of `exp(-ecm / f_c)` over the neighbours.
    pub ecm_permissiveness: f64,
}

impl NeighborField {
    /// Gathers neighbours through the wrap index, so the result does not depend
    /// on the state of the lattice's ghost ring.
    pub fn gather(lattice: &Lattice) -> Self {
        let side = lattice.side();
        let mut neighbors = vec![[CellState::default(); 4]; side * side];
        if side > 0 {
            neighbors
                .par_chunks_mut(side)
                .enumerate()
                .for_each(|(row, out)| {
                    let x = (row + 1) as i64;
                    for (col, slot) in out.iter_mut().enumerate() {
                        let y = (col + 1) as i64;
                        *slot = NEIGHBOR_OFFSETS.map(|(dx, dy)| lattice.get_wrapped(x + dx, y + dy));
                    }
                });
        }
        NeighborField { side, neighbors }
    }

    pub fn side(&self) -> usize {
        self.side
    }

    /// Neighbours of interior site `(x, y)` in `+x, -x, +y, -y` order.
    #[inline(always)]
    pub fn get(&self, x: usize, y: usize) -> &[CellState; 4] {
        &self.neighbors[(x - 1) * self.side + (y - 1)]
    }

    /// Neighbour rows in interior order, one slice of `side` entries per `x`.
    pub fn rows(&self) -> impl Iterator<Item = &[[CellState; 4]]> {
        self.neighbors.chunks(self.side.max(1))
    }
}

impl NeighborSums {
    pub fn from_neighbors(neighbors: &[CellState; 4], critical_ecm_density: f64) -> Self {
        neighbors.iter().fold(NeighborSums::default(), |acc, n| NeighborSums {
            cell_density: acc.cell_density + n.cell_density,
            ecm_density: acc.ecm_density + n.ecm_density,
            ecm_permissiveness: acc.ecm_permissiveness + (-n.ecm_density / critical_ecm_density).exp(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(side: usize) -> Lattice {
        let mut lattice = Lattice::new(side);
        for x in 1..=side {
            for y in 1..=side {
                lattice.set(x, y, CellState::new((x * 10 + y) as f64, y as f64));
            }
        }
        lattice
    }

    #[test]
    fn interior_site_sees_orthogonal_neighbors_in_order() {
        let lattice = numbered(4);
        let field = NeighborField::gather(&lattice);
        let n = field.get(2, 3);
        assert_eq!(n[0], lattice.get(3, 3));
        assert_eq!(n[1], lattice.get(1, 3));
        assert_eq!(n[2], lattice.get(2, 4));
        assert_eq!(n[3], lattice.get(2, 2));
    }

    #[test]
    fn corner_site_wraps_around_the_torus() {
        let lattice = numbered(4);
        let field = NeighborField::gather(&lattice);
        let n = field.get(1, 1);
        assert_eq!(n[0], lattice.get(2, 1));
        assert_eq!(n[1], lattice.get(4, 1));
        assert_eq!(n[2], lattice.get(1, 2));
        assert_eq!(n[3], lattice.get(1, 4));
    }

    #[test]
    fn matches_reads_through_a_refreshed_ghost_ring() {
        let mut lattice = numbered(5);
        let field = NeighborField::gather(&lattice);
        lattice.apply_periodic_boundary();
        for x in 1..=5 {
            for y in 1..=5 {
                let expected = [
                    lattice.get(x + 1, y),
                    lattice.get(x - 1, y),
                    lattice.get(x, y + 1),
                    lattice.get(x, y - 1),
                ];
                assert_eq!(field.get(x, y), &expected);
            }
        }
    }

    #[test]
    fn stale_ghost_ring_is_ignored() {
        let mut lattice = numbered(3);
        lattice.set(0, 1, CellState::new(999.0, 999.0));
        let field = NeighborField::gather(&lattice);
        assert_eq!(field.get(1, 1)[1], lattice.get(3, 1));
    }

    #[test]
    fn sums_cover_all_four_neighbors() {
        let neighbors = [
            CellState::new(0.1, 0.0),
            CellState::new(0.2, 0.1),
            CellState::new(0.3, 0.2),
            CellState::new(0.4, 0.3),
        ];
        let sums = NeighborSums::from_neighbors(&neighbors, 0.1);
        assert!((sums.cell_density - 1.0).abs() < 1e-12);
        assert!((sums.ecm_density - 0.6).abs() < 1e-12);
        let expected = 1.0 + (-1.0f64).exp() + (-2.0f64).exp() + (-3.0f64).exp();
        assert!((sums.ecm_permissiveness - expected).abs() < 1e-12);
    }
}
