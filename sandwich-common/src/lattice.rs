use serde::{Deserialize, Serialize};

/// Cell and extracellular-matrix density at one lattice site.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellState {
    pub cell_density: f64,
    pub ecm_density: f64,
}

impl CellState {
    pub fn new(cell_density: f64, ecm_density: f64) -> Self {
        CellState { cell_density, ecm_density }
    }

    pub fn is_finite(&self) -> bool {
        self.cell_density.is_finite() && self.ecm_density.is_finite()
    }
}

/// Maps any signed coordinate onto the interior `1..=side` of a torus.
#[inline(always)]
pub fn wrap_index(i: i64, side: usize) -> usize {
    ((i - 1).rem_euclid(side as i64) + 1) as usize
}

/// Square lattice of `CellState` with a one-site ghost ring.
///
/// Storage is row-major over `(side + 2) x (side + 2)` sites, `x` being the
/// slow axis. Interior coordinates run over `1..=side`; indices `0` and
/// `side + 1` are ghost storage that only mirrors the opposite interior edge
/// after [`Lattice::apply_periodic_boundary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    side: usize,
    cells: Vec<CellState>,
}

impl Lattice {
    /// Creates a zero-filled lattice with `side x side` interior sites.
    pub fn new(side: usize) -> Self {
        let padded = side + 2;
        Lattice {
            side,
            cells: vec![CellState::default(); padded * padded],
        }
    }

    pub fn side(&self) -> usize {
        self.side
    }

    /// Side length including the ghost ring.
    pub fn padded_side(&self) -> usize {
        self.side + 2
    }

    #[inline(always)]
    pub fn index(&self, x: usize, y: usize) -> usize {
        x * self.padded_side() + y
    }

    #[inline(always)]
    pub fn get(&self, x: usize, y: usize) -> CellState {
        self.cells[self.index(x, y)]
    }

    #[inline(always)]
    pub fn set(&mut self, x: usize, y: usize, state: CellState) {
        let idx = self.index(x, y);
        self.cells[idx] = state;
    }

    /// Reads the site at a signed coordinate, wrapping it onto the interior torus.
    /// Never touches the ghost ring.
    #[inline(always)]
    pub fn get_wrapped(&self, x: i64, y: i64) -> CellState {
        self.get(wrap_index(x, self.side), wrap_index(y, self.side))
    }

    /// Raw padded storage, row-major.
    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [CellState] {
        &mut self.cells
    }

    /// Interior sites as `(x, y, state)`, `x` outer.
    pub fn interior(&self) -> impl Iterator<Item = (usize, usize, CellState)> + '_ {
        (1..=self.side).flat_map(move |x| (1..=self.side).map(move |y| (x, y, self.get(x, y))))
    }

    /// Interior row `x` (sites `y = 1..=side`).
    pub fn interior_row(&self, x: usize) -> &[CellState] {
        let start = self.index(x, 1);
        &self.cells[start..start + self.side]
    }

    /// Copies row `side` into row 0, row 1 into row `side + 1`, then the same
    /// for columns, giving every interior site four toroidal neighbours.
    pub fn apply_periodic_boundary(&mut self) {
        apply_periodic_boundary(self.side, &mut self.cells);
    }

    /// Returns a copy whose cell density is floored at `floor`, for log-scale display only.
    pub fn floored_for_display(&self, floor: f64) -> Lattice {
        let mut copy = self.clone();
        for x in 1..=self.side {
            for y in 1..=self.side {
                let idx = copy.index(x, y);
                if copy.cells[idx].cell_density < floor {
                    copy.cells[idx].cell_density = floor;
                }
            }
        }
        copy
    }
}

/// Periodic boundary over any padded row-major buffer of `(side + 2)^2` elements.
///
/// Rows are copied first across the full padded width, then columns across the
/// full padded height, so the corners also receive their toroidal images.
pub fn apply_periodic_boundary<T: Copy>(side: usize, data: &mut [T]) {
    let padded = side + 2;
    debug_assert_eq!(data.len(), padded * padded);
    if side == 0 {
        return;
    }

    data.copy_within(side * padded..(side + 1) * padded, 0);
    data.copy_within(padded..2 * padded, (side + 1) * padded);

    for x in 0..padded {
        let row = x * padded;
        data[row] = data[row + side];
        data[row + side + 1] = data[row + 1];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(side: usize) -> Lattice {
        let mut lattice = Lattice::new(side);
        for x in 1..=side {
            for y in 1..=side {
                lattice.set(x, y, CellState::new((x * 100 + y) as f64, (x + y) as f64 * 0.5));
            }
        }
        lattice
    }

    #[test]
    fn wrap_index_maps_onto_interior() {
        assert_eq!(wrap_index(0, 5), 5);
        assert_eq!(wrap_index(6, 5), 1);
        assert_eq!(wrap_index(-1, 5), 4);
        assert_eq!(wrap_index(3, 5), 3);
        assert_eq!(wrap_index(11, 5), 1);
    }

    #[test]
    fn periodic_boundary_mirrors_opposite_edges() {
        let side = 6;
        let mut lattice = numbered(side);
        lattice.apply_periodic_boundary();
        for i in 1..=side {
            assert_eq!(lattice.get(0, i), lattice.get(side, i));
            assert_eq!(lattice.get(side + 1, i), lattice.get(1, i));
            assert_eq!(lattice.get(i, 0), lattice.get(i, side));
            assert_eq!(lattice.get(i, side + 1), lattice.get(i, 1));
        }
        assert_eq!(lattice.get(0, 0), lattice.get(side, side));
        assert_eq!(lattice.get(side + 1, side + 1), lattice.get(1, 1));
        assert_eq!(lattice.get(0, side + 1), lattice.get(side, 1));
    }

    #[test]
    fn periodic_boundary_is_idempotent() {
        let mut once = numbered(5);
        once.apply_periodic_boundary();
        let mut twice = once.clone();
        twice.apply_periodic_boundary();
        assert_eq!(once, twice);
    }

    #[test]
    fn periodic_boundary_handles_four_channel_buffers() {
        let side = 3;
        let padded = side + 2;
        let mut data: Vec<[f64; 4]> = (0..padded * padded).map(|i| [i as f64; 4]).collect();
        apply_periodic_boundary(side, &mut data);
        for i in 1..=side {
            assert_eq!(data[i], data[side * padded + i]);
            assert_eq!(data[i * padded + side + 1], data[i * padded + 1]);
        }
    }

    #[test]
    fn ghost_ring_agrees_with_wrapped_reads() {
        let side = 4;
        let mut lattice = numbered(side);
        lattice.apply_periodic_boundary();
        for x in 0..=side + 1 {
            for y in 0..=side + 1 {
                assert_eq!(lattice.get(x, y), lattice.get_wrapped(x as i64, y as i64));
            }
        }
    }

    #[test]
    fn display_floor_leaves_source_untouched() {
        let mut lattice = Lattice::new(2);
        lattice.set(1, 1, CellState::new(1e-9, 0.3));
        lattice.set(1, 2, CellState::new(0.5, 0.3));
        let floored = lattice.floored_for_display(1e-5);
        assert_eq!(floored.get(1, 1).cell_density, 1e-5);
        assert_eq!(floored.get(1, 2).cell_density, 0.5);
        assert_eq!(lattice.get(1, 1).cell_density, 1e-9);
        assert_eq!(floored.get(0, 0).cell_density, 0.0);
    }
}
