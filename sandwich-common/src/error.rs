use thiserror::Error;

/// Failure kinds surfaced by the sandwich model instead of silently propagating NaN/Inf.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SandwichError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("Invalid parameter '{name}' = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
    #[error("Non-finite lattice state after step {step} at ({x}, {y})")]
    NonFiniteState { step: u32, x: usize, y: usize },
    #[error("Migration ratio is undefined: no cell density outside the inflated initial sphere")]
    DegenerateMigrationRatio,
    #[error("Migration ratio is undefined: outside-sphere sums are not finite")]
    NonFiniteRatio,
}
