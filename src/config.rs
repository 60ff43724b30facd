use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, SimError},
    scheduler::ServiceDiscipline,
};

/// Parameters of one M/M/1 round-robin run.
///
/// Missing TOML keys fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Arrival rate λ (jobs per time unit).
    pub arrival_rate: f64,
    /// Service rate μ; mean service demand is 1/μ.
    pub service_rate: f64,
    /// Round-robin time slice.
    pub quantum: f64,
    /// Virtual time at which the run stops.
    pub horizon: f64,
    /// Maximum number of arrivals; unbounded when absent.
    pub population: Option<u64>,
    pub seed: u64,
    pub discipline: ServiceDiscipline,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            arrival_rate: 3.8,
            service_rate: 8.0,
            quantum: 0.5,
            horizon: 50_000.0,
            population: None,
            seed: 0,
            discipline: ServiceDiscipline::RoundRobin,
        }
    }
}

impl SimConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| SimError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        positive("arrival_rate", self.arrival_rate)?;
        positive("service_rate", self.service_rate)?;
        positive("quantum", self.quantum)?;
        positive("horizon", self.horizon)?;
        Ok(())
    }

    /// ρ = λ/μ
    pub fn traffic_intensity(&self) -> f64 {
        self.arrival_rate / self.service_rate
    }
}

fn positive(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidConfig { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimConfig::default();
        config.validate().unwrap();
        assert!((config.traffic_intensity() - 0.475).abs() < 1e-12);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = SimConfig::from_toml_str("arrival_rate = 2.0\nseed = 9\n").unwrap();
        assert_eq!(config.arrival_rate, 2.0);
        assert_eq!(config.seed, 9);
        assert_eq!(config.quantum, 0.5);
        assert_eq!(config.population, None);
        assert_eq!(config.discipline, ServiceDiscipline::RoundRobin);
    }

    #[test]
    fn discipline_is_snake_case() {
        let config = SimConfig::from_toml_str("discipline = \"round_robin\"").unwrap();
        assert_eq!(config.discipline, ServiceDiscipline::RoundRobin);
        assert!(SimConfig::from_toml_str("discipline = \"fcfs\"").is_err());
    }

    #[test]
    fn rejects_non_positive_parameters() {
        for (field, config) in [
            (
                "arrival_rate",
                SimConfig {
                    arrival_rate: 0.0,
                    ..SimConfig::default()
                },
            ),
            (
                "service_rate",
                SimConfig {
                    service_rate: -8.0,
                    ..SimConfig::default()
                },
            ),
            (
                "quantum",
                SimConfig {
                    quantum: f64::NAN,
                    ..SimConfig::default()
                },
            ),
            (
                "horizon",
                SimConfig {
                    horizon: f64::INFINITY,
                    ..SimConfig::default()
                },
            ),
        ] {
            match config.validate() {
                Err(SimError::InvalidConfig { field: got, .. }) => assert_eq!(got, field),
                other => panic!("expected {field} to be rejected, got {other:?}"),
            }
        }
    }
}
