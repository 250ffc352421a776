use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::error::SandwichError;
use crate::sim_params::{SimParams, DEFAULT_DOUBLING_TIME_STEPS, DEFAULT_NEIGHBOR_DEGRADATION_RATIO};
use std::path::Path;

// Lattice geometry of the sandwich model
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GeometryConfig {
    /// User-facing system size `a`; the lattice side is `a + 1`.
    pub system_size: u32,
    pub initial_radius: u32,
}

// Initial densities of the spheroid and the two matrix regions
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct DensityConfig {
    pub initial_cell_density: f64,
    pub interface_ecm_density: f64,
    pub bulk_ecm_density: f64,
}

// Reaction kinetics
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct KineticsConfig {
    /// Local ECM degradation rate `d1`.
    pub degradation_rate: f64,
    /// Migration/growth coupling `m`.
    pub growth_rate: f64,
    /// Critical ECM density `f_c`.
    pub critical_ecm_density: f64,
    #[serde(default = "default_doubling_time_steps")]
    pub doubling_time_steps: f64,
    #[serde(default = "default_neighbor_degradation_ratio")]
    pub neighbor_degradation_ratio: f64,
}

// Configuration for timing
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    pub steps: u32,
    /// Snapshot interval in steps; 0 records only the first and last state.
    #[serde(default)]
    pub record_interval_steps: u32,
}

// Configuration for output settings
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_record: bool,
    pub save_csv: bool,
    pub format: Option<String>, // Output format: "json", "bincode", "messagepack"
}

fn default_doubling_time_steps() -> f64 {
    DEFAULT_DOUBLING_TIME_STEPS
}

fn default_neighbor_degradation_ratio() -> f64 {
    DEFAULT_NEIGHBOR_DEGRADATION_RATIO
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SandwichConfig {
    pub geometry: GeometryConfig,
    pub densities: DensityConfig,
    pub kinetics: KineticsConfig,
    pub timing: TimingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            base_filename: "sandwich".to_string(),
            save_record: true,
            save_csv: false,
            format: None,
        }
    }
}

/// Baseline sandwich run: a = 80, r = 20, t = 100.
impl Default for SandwichConfig {
    fn default() -> Self {
        SandwichConfig {
            geometry: GeometryConfig {
                system_size: 80,
                initial_radius: 20,
            },
            densities: DensityConfig {
                initial_cell_density: 1.0,
                interface_ecm_density: 0.26,
                bulk_ecm_density: 0.5,
            },
            kinetics: KineticsConfig {
                degradation_rate: 0.0,
                growth_rate: 0.2,
                critical_ecm_density: 0.1,
                doubling_time_steps: DEFAULT_DOUBLING_TIME_STEPS,
                neighbor_degradation_ratio: DEFAULT_NEIGHBOR_DEGRADATION_RATIO,
            },
            timing: TimingConfig {
                steps: 100,
                record_interval_steps: 0,
            },
            output: OutputConfig::default(),
        }
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), SandwichError> {
    if !value.is_finite() {
        return Err(SandwichError::InvalidParameter { name, value, reason: "must be finite" });
    }
    if value < 0.0 {
        return Err(SandwichError::InvalidParameter { name, value, reason: "must be non-negative" });
    }
    Ok(())
}

fn positive(name: &'static str, value: f64) -> Result<(), SandwichError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SandwichError::InvalidParameter { name, value, reason: "must be positive and finite" });
    }
    Ok(())
}

impl SandwichConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config: SandwichConfig = toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML from '{}': {}", path_ref.display(), e))?;

        config.validate()?;
        Ok(config)
    }

    /// Range checks on the model inputs. Geometry that does not fit the
    /// lattice is accepted; it only degrades the migration measurement.
    pub fn validate(&self) -> Result<(), SandwichError> {
        if self.geometry.system_size == 0 {
            return Err(SandwichError::InvalidGeometry("system_size must be greater than 0".to_string()));
        }
        non_negative("initial_cell_density", self.densities.initial_cell_density)?;
        non_negative("interface_ecm_density", self.densities.interface_ecm_density)?;
        non_negative("bulk_ecm_density", self.densities.bulk_ecm_density)?;
        non_negative("degradation_rate", self.kinetics.degradation_rate)?;
        non_negative("growth_rate", self.kinetics.growth_rate)?;
        non_negative("neighbor_degradation_ratio", self.kinetics.neighbor_degradation_ratio)?;
        positive("critical_ecm_density", self.kinetics.critical_ecm_density)?;
        positive("doubling_time_steps", self.kinetics.doubling_time_steps)?;
        Ok(())
    }

    /// Converts the configuration into simulation parameters used at runtime.
    pub fn get_sim_params(&self) -> SimParams {
        let kinetics = &self.kinetics;
        let degradation_rate = kinetics.degradation_rate;

        SimParams {
            system_size: self.geometry.system_size,
            lattice_side: self.geometry.system_size as usize + 1,
            initial_radius: self.geometry.initial_radius,
            initial_cell_density: self.densities.initial_cell_density,
            interface_ecm_density: self.densities.interface_ecm_density,
            bulk_ecm_density: self.densities.bulk_ecm_density,
            degradation_rate,
            neighbor_degradation_rate: kinetics.neighbor_degradation_ratio * degradation_rate,
            growth_rate: kinetics.growth_rate,
            critical_ecm_density: kinetics.critical_ecm_density,
            doubling_time_steps: kinetics.doubling_time_steps,
            growth_factor: 2f64.powf(1.0 / kinetics.doubling_time_steps),
            steps: self.timing.steps,
            record_interval_steps: self.timing.record_interval_steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SandwichConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_rates_are_accepted() {
        let mut config = SandwichConfig::default();
        config.kinetics.degradation_rate = 0.0;
        config.kinetics.growth_rate = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn each_bad_parameter_gets_its_own_error() {
        let mut config = SandwichConfig::default();
        config.kinetics.critical_ecm_density = 0.0;
        assert!(matches!(
            config.validate(),
            Err(SandwichError::InvalidParameter { name: "critical_ecm_density", .. })
        ));

        let mut config = SandwichConfig::default();
        config.kinetics.growth_rate = -0.1;
        assert!(matches!(
            config.validate(),
            Err(SandwichError::InvalidParameter { name: "growth_rate", .. })
        ));

        let mut config = SandwichConfig::default();
        config.kinetics.degradation_rate = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(SandwichError::InvalidParameter { name: "degradation_rate", .. })
        ));

        let mut config = SandwichConfig::default();
        config.geometry.system_size = 0;
        assert!(matches!(config.validate(), Err(SandwichError::InvalidGeometry(_))));
    }

    #[test]
    fn sim_params_derive_lattice_side_and_rates() {
        let mut config = SandwichConfig::default();
        config.kinetics.degradation_rate = 0.5;
        let params = config.get_sim_params();
        assert_eq!(params.lattice_side, 81);
        assert!((params.neighbor_degradation_rate - 0.05).abs() < 1e-15);
        assert!((params.growth_factor.powf(48.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn toml_sections_parse_with_defaults() {
        let text = r#"
            [geometry]
            system_size = 10
            initial_radius = 3

            [densities]
            initial_cell_density = 1.0
            interface_ecm_density = 0.26
            bulk_ecm_density = 0.5

            [kinetics]
            degradation_rate = 0.0
            growth_rate = 0.2
            critical_ecm_density = 0.1

            [timing]
            steps = 5
        "#;
        let config: SandwichConfig = toml::from_str(text).expect("valid config");
        assert_eq!(config.kinetics.doubling_time_steps, 48.0);
        assert_eq!(config.kinetics.neighbor_degradation_ratio, 0.1);
        assert_eq!(config.timing.record_interval_steps, 0);
        assert_eq!(config.output.base_filename, "sandwich");
    }
}
