use sandwich_common::Lattice;

/// Holds the lattice state on the CPU as a pair of ping-pong buffers.
#[derive(Debug)] // Removed Clone as large state shouldn't be cloned casually
pub struct LatticeState {
    // Current step's input; frozen while a step is computed.
    pub current: Lattice,
    // Current step's output, next step's input.
    pub next: Lattice,
}

impl LatticeState {
    /// Wraps an initial lattice and allocates a matching output buffer.
    pub fn new(initial: Lattice) -> Self {
        let next = Lattice::new(initial.side());
        LatticeState { current: initial, next }
    }

    pub fn side(&self) -> usize {
        self.current.side()
    }

    /// Swaps the input and output buffers. The ghost ring of the new current
    /// buffer is stale until the next periodic boundary pass.
    pub fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandwich_common::CellState;

    #[test]
    fn swap_exchanges_buffers() {
        let mut initial = Lattice::new(3);
        initial.set(2, 2, CellState::new(0.5, 0.1));
        let mut state = LatticeState::new(initial.clone());
        assert_eq!(state.next, Lattice::new(3));

        state.next.set(1, 1, CellState::new(0.25, 0.0));
        state.swap_buffers();
        assert_eq!(state.current.get(1, 1), CellState::new(0.25, 0.0));
        assert_eq!(state.next, initial);
    }
}
