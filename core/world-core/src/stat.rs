use std::{
    fmt,
    ops::{Index, IndexMut},
};

use serde::Serialize;
use strum::{EnumCount, IntoEnumIterator};

use crate::world::commons::HealthType;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HealthDiff {
    pub from: HealthType,
    pub to: HealthType,
}

impl HealthDiff {
    pub fn new(from: HealthType, to: HealthType) -> Self {
        Self { from, to }
    }
}

/// Number of agents per health state.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct HealthCount([u32; HealthType::COUNT]);

impl HealthCount {
    /// Single pass over the current states; keeps nothing between calls.
    pub fn tally<I: IntoIterator<Item = HealthType>>(states: I) -> Self {
        let mut c = Self::default();
        for h in states {
            c[h] += 1;
        }
        c
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    /// Latent and active agents.
    pub fn n_infected(&self) -> u32 {
        self[HealthType::Latent] + self[HealthType::Active]
    }

    pub fn iter(&self) -> impl Iterator<Item = (HealthType, u32)> + '_ {
        HealthType::iter().map(|h| (h, self[h]))
    }
}

impl Index<HealthType> for HealthCount {
    type Output = u32;

    fn index(&self, index: HealthType) -> &Self::Output {
        &self.0[index.index()]
    }
}

impl IndexMut<HealthType> for HealthCount {
    fn index_mut(&mut self, index: HealthType) -> &mut Self::Output {
        &mut self.0[index.index()]
    }
}

impl fmt::Display for HealthCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (h, n) in self.iter() {
            if !first {
                write!(f, " ")?;
            }
            first = false;
            write!(f, "{h}={n}")?;
        }
        Ok(())
    }
}

impl Serialize for HealthCount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Totals of one simulated day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DailyRecord {
    pub day: u32,
    /// states at the end of the day
    pub counts: HealthCount,
    pub new_infections: u32,
    pub new_activations: u32,
    pub new_deaths: u32,
    pub new_recoveries: u32,
}

#[derive(Default, Debug)]
struct Tally {
    new_infections: u32,
    new_activations: u32,
    new_deaths: u32,
    new_recoveries: u32,
}

#[derive(Default, Debug)]
pub struct Stat {
    today: Tally,
    history: Vec<DailyRecord>,
}

impl Stat {
    pub fn reset(&mut self) {
        self.today = Tally::default();
        self.history.clear();
    }

    pub fn record(&mut self, hd: &HealthDiff) {
        let t = &mut self.today;
        match (hd.from, hd.to) {
            (HealthType::Healthy, _) => t.new_infections += 1,
            (HealthType::Latent, HealthType::Active) => t.new_activations += 1,
            (_, HealthType::Dead) => t.new_deaths += 1,
            (_, HealthType::Recovered) => t.new_recoveries += 1,
            _ => {}
        }
    }

    pub fn close_day(&mut self, day: u32, counts: HealthCount) -> &DailyRecord {
        let t = std::mem::take(&mut self.today);
        self.history.push(DailyRecord {
            day,
            counts,
            new_infections: t.new_infections,
            new_activations: t.new_activations,
            new_deaths: t.new_deaths,
            new_recoveries: t.new_recoveries,
        });
        &self.history[self.history.len() - 1]
    }

    pub fn history(&self) -> &[DailyRecord] {
        &self.history
    }
}
