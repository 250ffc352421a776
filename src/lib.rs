//! Cell and extracellular-matrix co-evolution on a toroidal lattice, for a
//! tumour spheroid invading a matrix "sandwich" with one low-density
//! interface channel.

pub mod init;
pub mod migration;
pub mod neighbors;
pub mod output;
pub mod simulation;
pub mod state;
pub mod update;

pub use migration::{analyze_migration, MigrationAnalysis};
pub use simulation::{run, RunOutcome, SandwichSimulation};
