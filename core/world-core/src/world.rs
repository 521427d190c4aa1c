pub mod agent;
pub mod boundary;
pub mod commons;
pub mod contact;
mod field;

use rand::Rng;
use rayon::prelude::*;

use self::{
    agent::{Agent, AgentId, AgentView},
    boundary::Boundary,
    commons::{HealthType, ParamsForStep, RuntimeParams, WorldParams},
    contact::{Contacts, Exposure},
    field::Field,
};
use crate::{
    error::{PlacementError, WorldError},
    stat::{DailyRecord, HealthCount, HealthDiff, Stat},
    util::random::{self, Stream},
};
use math::Point;

/// Draws per agent before placement gives up.
const MAX_PLACEMENT_ATTEMPTS: usize = 10_000;

pub struct World {
    pub id: String,
    world_params: WorldParams,
    runtime_params: RuntimeParams,
    seed: u64,
    agent_origins: Vec<Point>,
    agents: Vec<Agent>,
    field: Field,
    contacts: Contacts,
    exposures: Vec<Exposure>,
    tick: u64,
    running: bool,
    stat: Stat,
}

impl World {
    pub fn new(
        id: String,
        runtime_params: RuntimeParams,
        world_params: WorldParams,
    ) -> Result<Self, WorldError> {
        world_params.validate()?;
        runtime_params.validate()?;
        let seed = world_params
            .seed
            .unwrap_or_else(|| rand::thread_rng().gen());
        let agent_origins = place(&world_params.boundary, world_params.population, seed)?;
        tracing::info!(
            id = %id,
            seed,
            population = world_params.population,
            "created world"
        );

        let mut w = Self {
            id,
            field: Field::new(&world_params.boundary, runtime_params.infection_radius),
            world_params,
            runtime_params,
            seed,
            agents: Vec::with_capacity(agent_origins.len()),
            agent_origins,
            contacts: Contacts::default(),
            exposures: Vec::new(),
            tick: 0,
            running: true,
            stat: Stat::default(),
        };
        w.populate();
        Ok(w)
    }

    /// Puts every agent back at its initial position with its initial state
    /// and rewinds the clock. The same seed gives the same run again.
    pub fn reset(&mut self) {
        self.populate();
        self.contacts.clear();
        self.exposures.clear();
        self.stat.reset();
        self.tick = 0;
        tracing::info!(id = %self.id, "reset world");
    }

    fn populate(&mut self) {
        let wp = &self.world_params;
        let rp = &self.runtime_params;
        let n_active = wp.initial_active as usize;
        let n_latent = wp.initial_latent() as usize;
        self.agents.clear();
        self.agents
            .extend(self.agent_origins.iter().enumerate().map(|(i, &pt)| {
                let mut a = Agent::new(AgentId(i as u32), pt, wp.agent_radius, self.seed, rp);
                if i < n_active {
                    a.set_state(HealthType::Active, Some(0));
                } else if i < n_active + n_latent {
                    a.set_state(HealthType::Latent, None);
                }
                a
            }));
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advances the world by one tick. Does nothing while stopped.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        self.exposures.clear();
        self.tick += 1;

        let boundary = &self.world_params.boundary;
        let rp = &self.runtime_params;
        self.agents
            .par_iter_mut()
            .for_each(|a| a.move_in(boundary, rp));

        let pfs = ParamsForStep::new(&self.world_params, &self.runtime_params, self.seed, self.tick);
        let new_day = self.tick % self.world_params.ticks_per_day as u64 == 0;
        if new_day {
            let diffs: Vec<HealthDiff> = self
                .agents
                .par_iter_mut()
                .filter_map(|a| a.progress(&pfs))
                .collect();
            for hd in &diffs {
                self.stat.record(hd);
            }
        }

        if self.tick % self.world_params.check_interval() == 0 {
            let result = contact::spread(&self.agents, &mut self.field, &mut self.contacts, &pfs);
            tracing::trace!(
                tick = self.tick,
                exposures = result.exposures.len(),
                infections = result.infections.len(),
                "transmission pass"
            );
            for inf in result.infections {
                let since = (inf.to == HealthType::Active).then_some(pfs.day);
                let hd = self.agents[inf.index].set_state(inf.to, since);
                self.stat.record(&hd);
            }
            self.exposures = result.exposures;
        }

        if new_day {
            let counts = self.counts();
            let record = self.stat.close_day(pfs.day, counts);
            tracing::debug!(id = %self.id, day = record.day, %counts, "day closed");
        }
    }

    /// Agents per health state.
    pub fn counts(&self) -> HealthCount {
        HealthCount::tally(self.agents.iter().map(Agent::state))
    }

    /// True iff no agent is active.
    pub fn no_infected_remain(&self) -> bool {
        self.agents.iter().all(|a| a.state() != HealthType::Active)
    }

    #[inline]
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    #[inline]
    pub fn current_day(&self) -> u32 {
        (self.tick / self.world_params.ticks_per_day as u64) as u32
    }

    pub fn is_ended(&self) -> bool {
        self.no_infected_remain()
            || self
                .world_params
                .max_days
                .map_or(false, |d| self.current_day() >= d)
    }

    pub fn agents(&self) -> impl ExactSizeIterator<Item = AgentView<'_>> + '_ {
        self.agents.iter().map(AgentView::new)
    }

    /// Exposures found by this tick's transmission pass, if it ran one.
    pub fn exposures(&self) -> &[Exposure] {
        &self.exposures
    }

    pub fn history(&self) -> &[DailyRecord] {
        self.stat.history()
    }

    pub fn world_params(&self) -> &WorldParams {
        &self.world_params
    }

    pub fn runtime_params(&self) -> &RuntimeParams {
        &self.runtime_params
    }

    pub fn set_runtime_params(&mut self, runtime_params: RuntimeParams) -> Result<(), WorldError> {
        runtime_params.validate()?;
        if runtime_params.infection_radius != self.runtime_params.infection_radius {
            self.field = Field::new(&self.world_params.boundary, runtime_params.infection_radius);
        }
        self.runtime_params = runtime_params;
        Ok(())
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[cfg(test)]
    fn reverse_agents(&mut self) {
        self.agents.reverse();
    }
}

/// Rejection sampling over the bounding box of the boundary.
fn place(boundary: &Boundary, population: u32, seed: u64) -> Result<Vec<Point>, PlacementError> {
    let rng = &mut random::keyed_rng(seed, Stream::Placement, &[]);
    (0..population as usize)
        .map(|agent| {
            (0..MAX_PLACEMENT_ATTEMPTS)
                .map(|_| boundary.sample(rng))
                .find(|pt| boundary.contains(pt))
                .ok_or(PlacementError {
                    agent,
                    attempts: MAX_PLACEMENT_ATTEMPTS,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::commons::Probability;

    fn params(seed: u64) -> (RuntimeParams, WorldParams) {
        let rp = RuntimeParams {
            infection_probability: Probability::new(0.5).unwrap(),
            latent_to_active_probability: Probability::new(0.2).unwrap(),
            death_probability: Probability::new(0.01).unwrap(),
            infection_period: 5,
            speed: 2.0,
            ..Default::default()
        };
        let wp = WorldParams {
            population: 300,
            initial_active: 5,
            initial_latent_fraction: Probability::new(0.1).unwrap(),
            boundary: Boundary::rect(150.0, 100.0).unwrap(),
            seed: Some(seed),
            ..Default::default()
        };
        (rp, wp)
    }

    #[test]
    fn test_initial_seeding() {
        let (rp, wp) = params(1);
        let w = World::new("w".into(), rp, wp).unwrap();
        let c = w.counts();
        assert_eq!(c[HealthType::Active], 5);
        assert_eq!(c[HealthType::Latent], 30);
        assert_eq!(c[HealthType::Healthy], 265);
        assert!(w.is_running());
        assert_eq!(w.current_day(), 0);
        assert!(w.agents().all(|a| w.world_params().boundary.contains(&a.pt())));
    }

    #[test]
    fn test_order_independence() {
        let (rp, wp) = params(2);
        let mut a = World::new("a".into(), rp.clone(), wp.clone()).unwrap();
        let mut b = World::new("b".into(), rp, wp).unwrap();
        b.reverse_agents();
        for _ in 0..200 {
            a.tick();
            b.tick();
            assert_eq!(a.counts(), b.counts());
        }
        assert_eq!(a.history(), b.history());
    }

    #[test]
    fn test_stopped_world_does_not_change() {
        let (rp, wp) = params(3);
        let mut w = World::new("w".into(), rp, wp).unwrap();
        w.tick();
        w.stop();
        let before: Vec<_> = w.agents().map(|a| (a.pt(), a.state())).collect();
        for _ in 0..50 {
            w.tick();
        }
        let after: Vec<_> = w.agents().map(|a| (a.pt(), a.state())).collect();
        assert_eq!(before, after);
        assert_eq!(w.current_tick(), 1);

        w.start();
        w.tick();
        assert_eq!(w.current_tick(), 2);
    }

    #[test]
    fn test_conservation_and_history() {
        let (rp, wp) = params(4);
        let mut w = World::new("w".into(), rp, wp).unwrap();
        for _ in 0..300 {
            w.tick();
            assert_eq!(w.counts().total(), 300);
        }
        assert_eq!(w.current_day(), 30);
        assert_eq!(w.history().len(), 30);
        for (i, r) in w.history().iter().enumerate() {
            assert_eq!(r.day, i as u32 + 1);
            assert_eq!(r.counts.total(), 300);
        }
    }

    #[test]
    fn test_reset_replays() {
        let (rp, wp) = params(5);
        let mut w = World::new("w".into(), rp, wp).unwrap();
        let initial: Vec<_> = w.agents().map(|a| (a.pt(), a.state())).collect();
        for _ in 0..100 {
            w.tick();
        }
        let first = w.counts();
        w.reset();
        assert_eq!(w.current_tick(), 0);
        assert!(w.history().is_empty());
        let again: Vec<_> = w.agents().map(|a| (a.pt(), a.state())).collect();
        assert_eq!(initial, again);
        for _ in 0..100 {
            w.tick();
        }
        assert_eq!(w.counts(), first);
    }

    #[test]
    fn test_sliver_boundary_fails_placement() {
        let wp = WorldParams {
            population: 3,
            boundary: Boundary::polygon([(0.0, 0.0), (1000.0, 1000.0), (1000.0, 1000.00001)])
                .unwrap(),
            seed: Some(6),
            ..Default::default()
        };
        assert!(matches!(
            World::new("w".into(), RuntimeParams::default(), wp),
            Err(WorldError::Placement(PlacementError {
                attempts: MAX_PLACEMENT_ATTEMPTS,
                ..
            }))
        ));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let wp = WorldParams {
            ticks_per_day: 0,
            ..Default::default()
        };
        assert!(World::new("w".into(), RuntimeParams::default(), wp).is_err());

        let (rp, wp) = params(7);
        let mut w = World::new("w".into(), rp, wp).unwrap();
        let bad = RuntimeParams {
            max_speed: -1.0,
            ..Default::default()
        };
        assert!(w.set_runtime_params(bad).is_err());
        let wider = RuntimeParams {
            infection_radius: 25.0,
            ..Default::default()
        };
        w.set_runtime_params(wider).unwrap();
        assert_eq!(w.runtime_params().infection_radius, 25.0);
    }

    #[test]
    fn test_exposures_only_on_check_ticks() {
        let rp = RuntimeParams {
            speed: 0.0,
            velocity_jitter: 0.0,
            infection_radius: 1000.0,
            infection_probability: Probability::ZERO,
            ..Default::default()
        };
        let wp = WorldParams {
            population: 20,
            initial_active: 1,
            initial_latent_fraction: Probability::ZERO,
            boundary: Boundary::rect(50.0, 50.0).unwrap(),
            ticks_per_day: 10,
            checks_per_day: 2,
            seed: Some(9),
            ..Default::default()
        };
        assert_eq!(wp.check_interval(), 5);
        let mut w = World::new("w".into(), rp, wp).unwrap();
        for tick in 1..=12u64 {
            w.tick();
            if tick % 5 == 0 {
                assert_eq!(w.exposures().len(), 19, "tick {tick}");
                assert!(w.exposures().iter().all(|e| e.tick == tick));
            } else {
                assert!(w.exposures().is_empty(), "tick {tick}");
            }
        }
    }

    #[test]
    fn test_max_days_ends_run() {
        let (mut rp, mut wp) = params(8);
        rp.infection_period = 1000;
        rp.death_probability = Probability::ZERO;
        wp.max_days = Some(2);
        let mut w = World::new("w".into(), rp, wp).unwrap();
        assert!(!w.is_ended());
        while !w.is_ended() {
            w.tick();
        }
        assert_eq!(w.current_day(), 2);
        assert_eq!(w.current_tick(), 20);
    }
}
