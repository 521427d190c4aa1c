use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter};

use super::boundary::Boundary;
use crate::error::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Probability(f64);

impl Probability {
    pub const ZERO: Self = Self(0.0);
    pub const ONE: Self = Self(1.0);

    pub fn new(p: f64) -> Result<Self, ConfigError> {
        if (0.0..=1.0).contains(&p) {
            Ok(Self(p))
        } else {
            Err(ConfigError::Probability(p))
        }
    }

    #[inline]
    pub fn r(&self) -> f64 {
        self.0
    }

    /// One Bernoulli trial.
    #[inline]
    pub fn hit<R: Rng>(&self, rng: &mut R) -> bool {
        rng.gen::<f64>() < self.0
    }
}

impl TryFrom<f64> for Probability {
    type Error = ConfigError;

    fn try_from(p: f64) -> Result<Self, Self::Error> {
        Self::new(p)
    }
}

impl From<Probability> for f64 {
    fn from(p: Probability) -> Self {
        p.0
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    EnumCount,
    Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum HealthType {
    Healthy,
    Latent,
    Active,
    Dead,
    Recovered,
}

impl HealthType {
    /// The fixed table of legal transitions.
    pub fn can_transition_to(self, to: HealthType) -> bool {
        use HealthType::*;
        matches!(
            (self, to),
            (Healthy, Active)
                | (Healthy, Latent)
                | (Active, Latent)
                | (Active, Dead)
                | (Active, Recovered)
                | (Latent, Active)
        )
    }

    /// Whether an active agent may pass the infection on to this one.
    #[inline]
    pub fn is_exposable(self) -> bool {
        matches!(self, HealthType::Healthy | HealthType::Latent)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// What an active agent becomes once its infection period is over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DischargePolicy {
    /// back to the latent state, contagious again once reactivated
    #[default]
    RelapseToLatent,
    /// terminal, immune and non-contagious
    Recover,
}

/// How candidate (source, target) pairs are enumerated by a transmission pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairScan {
    BruteForce,
    #[default]
    Grid,
}

/// Parameters fixed for the life of a world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldParams {
    pub population: u32,
    pub initial_active: u32,
    pub initial_latent_fraction: Probability,
    pub boundary: Boundary,
    /// only read by renderers
    pub agent_radius: f64,
    pub ticks_per_day: u32,
    pub checks_per_day: u32,
    /// `None` draws a seed from the OS
    pub seed: Option<u64>,
    pub max_days: Option<u32>,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            population: 500,
            initial_active: 1,
            initial_latent_fraction: Probability(0.25),
            boundary: Boundary::open_area(),
            agent_radius: 3.0,
            ticks_per_day: 10,
            checks_per_day: 10,
            seed: None,
            max_days: None,
        }
    }
}

impl WorldParams {
    pub fn initial_latent(&self) -> u32 {
        (self.population as f64 * self.initial_latent_fraction.r()).round() as u32
    }

    /// Ticks between two transmission passes.
    pub fn check_interval(&self) -> u64 {
        (self.ticks_per_day / self.checks_per_day) as u64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population == 0 {
            return Err(ConfigError::NonPositivePopulation);
        }
        let latent = self.initial_latent();
        if self.initial_active as u64 + latent as u64 > self.population as u64 {
            return Err(ConfigError::TooManySeeded {
                active: self.initial_active,
                latent,
                population: self.population,
            });
        }
        if self.ticks_per_day == 0 {
            return Err(ConfigError::ZeroTicksPerDay);
        }
        if self.checks_per_day == 0 {
            return Err(ConfigError::ZeroChecksPerDay);
        }
        if self.checks_per_day > self.ticks_per_day {
            return Err(ConfigError::ChecksExceedTicks {
                checks: self.checks_per_day,
                ticks: self.ticks_per_day,
            });
        }
        non_negative("agent_radius", self.agent_radius)?;
        self.boundary.validate()?;
        Ok(())
    }
}

/// Parameters that may be replaced between two ticks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeParams {
    /// initial speed of every agent
    pub speed: f64,
    pub max_speed: f64,
    pub velocity_jitter: f64,
    pub stuck_perturbation: Probability,
    pub stuck_impulse: f64,
    pub infection_radius: f64,
    pub infection_probability: Probability,
    pub prob_active_given_exposed_healthy: Probability,
    pub prob_active_given_exposed_latent: Probability,
    pub latent_to_active_probability: Probability,
    pub death_probability: Probability,
    /// days
    pub infection_period: u32,
    pub discharge: DischargePolicy,
    pub pair_scan: PairScan,
    pub pair_cooldown_ticks: Option<u64>,
}

impl Default for RuntimeParams {
    fn default() -> Self {
        Self {
            speed: 0.5,
            max_speed: 2.0,
            velocity_jitter: 0.01,
            stuck_perturbation: Probability(0.2),
            stuck_impulse: 0.5,
            infection_radius: 10.0,
            infection_probability: Probability(0.25),
            prob_active_given_exposed_healthy: Probability(0.1),
            prob_active_given_exposed_latent: Probability(0.05),
            latent_to_active_probability: Probability::ZERO,
            death_probability: Probability::ZERO,
            infection_period: 30,
            discharge: DischargePolicy::default(),
            pair_scan: PairScan::default(),
            pair_cooldown_ticks: None,
        }
    }
}

impl RuntimeParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("speed", self.speed)?;
        positive("max_speed", self.max_speed)?;
        non_negative("velocity_jitter", self.velocity_jitter)?;
        non_negative("stuck_impulse", self.stuck_impulse)?;
        non_negative("infection_radius", self.infection_radius)?;
        if self.infection_period == 0 {
            return Err(ConfigError::ZeroInfectionPeriod);
        }
        Ok(())
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { name, value })
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

/// Borrowed view of everything a single tick needs.
pub struct ParamsForStep<'a> {
    pub wp: &'a WorldParams,
    pub rp: &'a RuntimeParams,
    pub seed: u64,
    pub tick: u64,
    pub day: u32,
}

impl<'a> ParamsForStep<'a> {
    pub fn new(wp: &'a WorldParams, rp: &'a RuntimeParams, seed: u64, tick: u64) -> Self {
        Self {
            wp,
            rp,
            seed,
            tick,
            day: (tick / wp.ticks_per_day as u64) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_probability_bounds() {
        assert!(Probability::new(0.0).is_ok());
        assert!(Probability::new(1.0).is_ok());
        assert_eq!(Probability::new(1.5), Err(ConfigError::Probability(1.5)));
        assert_eq!(Probability::new(-0.1), Err(ConfigError::Probability(-0.1)));
        assert!(Probability::new(f64::NAN).is_err());
    }

    #[test]
    fn test_probability_from_json() {
        let p: Probability = serde_json::from_str("0.3").unwrap();
        assert_eq!(p.r(), 0.3);
        assert!(serde_json::from_str::<Probability>("2.0").is_err());
    }

    #[test]
    fn test_transition_table() {
        use HealthType::*;
        let legal = [
            (Healthy, Active),
            (Healthy, Latent),
            (Active, Latent),
            (Active, Dead),
            (Active, Recovered),
            (Latent, Active),
        ];
        for from in HealthType::iter() {
            for to in HealthType::iter() {
                assert_eq!(
                    from.can_transition_to(to),
                    legal.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
        for from in [Dead, Recovered] {
            assert!(HealthType::iter().all(|to| !from.can_transition_to(to)));
        }
    }

    #[test]
    fn test_world_params_validation() {
        assert_eq!(WorldParams::default().validate(), Ok(()));

        let wp = WorldParams {
            population: 0,
            ..Default::default()
        };
        assert_eq!(wp.validate(), Err(ConfigError::NonPositivePopulation));

        let wp = WorldParams {
            population: 10,
            initial_active: 5,
            initial_latent_fraction: Probability::new(0.6).unwrap(),
            ..Default::default()
        };
        assert!(matches!(
            wp.validate(),
            Err(ConfigError::TooManySeeded { latent: 6, .. })
        ));

        let wp = WorldParams {
            ticks_per_day: 4,
            checks_per_day: 5,
            ..Default::default()
        };
        assert!(matches!(
            wp.validate(),
            Err(ConfigError::ChecksExceedTicks { .. })
        ));

        let wp = WorldParams {
            checks_per_day: 0,
            ..Default::default()
        };
        assert_eq!(wp.validate(), Err(ConfigError::ZeroChecksPerDay));
    }

    #[test]
    fn test_runtime_params_validation() {
        assert_eq!(RuntimeParams::default().validate(), Ok(()));
        let rp = RuntimeParams {
            max_speed: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            rp.validate(),
            Err(ConfigError::NonPositive {
                name: "max_speed",
                ..
            })
        ));
        let rp = RuntimeParams {
            speed: -1.0,
            ..Default::default()
        };
        assert!(rp.validate().is_err());
        let rp = RuntimeParams {
            infection_radius: f64::INFINITY,
            ..Default::default()
        };
        assert!(rp.validate().is_err());
        let rp = RuntimeParams {
            infection_period: 0,
            ..Default::default()
        };
        assert_eq!(rp.validate(), Err(ConfigError::ZeroInfectionPeriod));
    }

    #[test]
    fn test_check_interval_and_day() {
        let wp = WorldParams {
            ticks_per_day: 10,
            checks_per_day: 3,
            ..Default::default()
        };
        assert_eq!(wp.check_interval(), 3);
        let rp = RuntimeParams::default();
        assert_eq!(ParamsForStep::new(&wp, &rp, 0, 29).day, 2);
        assert_eq!(ParamsForStep::new(&wp, &rp, 0, 30).day, 3);
    }
}
