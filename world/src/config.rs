use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use world_core::{RuntimeParams, WorldParams};

/// Contents of a world configuration file. Missing keys keep their defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub world: WorldParams,
    pub runtime: RuntimeParams,
}

impl WorldConfig {
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let s = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&s).with_context(|| format!("invalid config {}", path.display()))
    }
}

/// Command line options shared by the binaries.
#[derive(clap::Args, Debug, Default)]
pub struct Overrides {
    /// JSON file with `world` and `runtime` sections
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub population: Option<u32>,
    #[arg(long)]
    pub initial_active: Option<u32>,
    #[arg(long)]
    pub seed: Option<u64>,
    #[arg(long)]
    pub max_days: Option<u32>,
}

impl Overrides {
    pub fn resolve(&self) -> anyhow::Result<WorldConfig> {
        let mut cfg = match &self.config {
            Some(path) => WorldConfig::load(path)?,
            None => WorldConfig::default(),
        };
        let wp = &mut cfg.world;
        if let Some(n) = self.population {
            wp.population = n;
        }
        if let Some(n) = self.initial_active {
            wp.initial_active = n;
        }
        if self.seed.is_some() {
            wp.seed = self.seed;
        }
        if self.max_days.is_some() {
            wp.max_days = self.max_days;
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use world_core::{Boundary, DischargePolicy, PairScan};

    #[test]
    fn test_partial_config() {
        let cfg = WorldConfig::from_json(
            r#"{
                "world": {
                    "population": 120,
                    "boundary": { "rect": { "width": 50, "height": 40 } }
                },
                "runtime": {
                    "infection_radius": 2.5,
                    "discharge": "recover",
                    "pair_scan": "brute_force"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.world.population, 120);
        assert_eq!(cfg.world.boundary, Boundary::rect(50.0, 40.0).unwrap());
        assert_eq!(cfg.world.ticks_per_day, WorldParams::default().ticks_per_day);
        assert_eq!(cfg.runtime.infection_radius, 2.5);
        assert_eq!(cfg.runtime.discharge, DischargePolicy::Recover);
        assert_eq!(cfg.runtime.pair_scan, PairScan::BruteForce);
    }

    #[test]
    fn test_bad_probability_rejected() {
        let r = WorldConfig::from_json(r#"{ "runtime": { "death_probability": 1.2 } }"#);
        assert!(r.is_err());
    }

    #[test]
    fn test_overrides() {
        let o = Overrides {
            population: Some(42),
            seed: Some(9),
            ..Default::default()
        };
        let cfg = o.resolve().unwrap();
        assert_eq!(cfg.world.population, 42);
        assert_eq!(cfg.world.seed, Some(9));
        assert_eq!(cfg.world.max_days, None);
        assert_eq!(cfg.runtime, RuntimeParams::default());
    }
}
