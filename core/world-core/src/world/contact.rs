use std::collections::HashMap;

use rayon::prelude::*;
use serde::Serialize;

use super::{
    agent::{Agent, AgentId},
    commons::{HealthType, PairScan, ParamsForStep},
    field::Field,
};
use crate::util::random::{self, Stream};

/// An active agent came within the infection radius of a susceptible one.
/// Renderers draw the source's radius ring for these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Exposure {
    pub source: AgentId,
    pub target: AgentId,
    pub tick: u64,
}

/// Ticks at which each ordered pair was last rolled, for the optional
/// per-pair cooldown.
#[derive(Default)]
pub(crate) struct Contacts(HashMap<(AgentId, AgentId), u64>);

impl Contacts {
    pub fn clear(&mut self) {
        self.0.clear();
    }

    fn is_cooling_down(&self, key: &(AgentId, AgentId), pfs: &ParamsForStep) -> bool {
        match (pfs.rp.pair_cooldown_ticks, self.0.get(key)) {
            (Some(k), Some(&last)) => pfs.tick < last.saturating_add(k),
            _ => false,
        }
    }

    fn record(&mut self, exposures: &[Exposure], pfs: &ParamsForStep) {
        let Some(k) = pfs.rp.pair_cooldown_ticks else {
            return;
        };
        self.0.retain(|_, last| pfs.tick < last.saturating_add(k));
        for e in exposures {
            self.0.insert((e.source, e.target), e.tick);
        }
    }
}

pub(crate) struct Infection {
    pub index: usize,
    pub to: HealthType,
}

#[derive(Default)]
pub(crate) struct SpreadResult {
    pub infections: Vec<Infection>,
    pub exposures: Vec<Exposure>,
}

/// Outcome of all exposures of one target during a pass. The most severe
/// outcome wins, which does not depend on the order the sources are visited.
fn expose_target(
    agents: &[Agent],
    candidates: impl Iterator<Item = usize>,
    target: &Agent,
    contacts: &Contacts,
    pfs: &ParamsForStep,
) -> (Vec<Exposure>, Option<HealthType>) {
    let rp = pfs.rp;
    let mut exposures = Vec::new();
    let mut outcome: Option<HealthType> = None;
    for source in candidates.map(|i| &agents[i]) {
        if source.id() == target.id()
            || source.state() != HealthType::Active
            || source.pt().dist(&target.pt()) > rp.infection_radius
        {
            continue;
        }
        let key = (source.id(), target.id());
        if contacts.is_cooling_down(&key, pfs) {
            continue;
        }
        exposures.push(Exposure {
            source: source.id(),
            target: target.id(),
            tick: pfs.tick,
        });

        let rng = &mut random::keyed_rng(
            pfs.seed,
            Stream::Contact,
            &[pfs.tick, source.id().0 as u64, target.id().0 as u64],
        );
        if !rp.infection_probability.hit(rng) {
            continue;
        }
        let p_active = match target.state() {
            HealthType::Latent => rp.prob_active_given_exposed_latent,
            _ => rp.prob_active_given_exposed_healthy,
        };
        let to = if p_active.hit(rng) {
            HealthType::Active
        } else {
            HealthType::Latent
        };
        outcome = outcome.max(Some(to));
    }
    (exposures, outcome.filter(|&to| to != target.state()))
}

/// One transmission pass over a snapshot of the agents. Nothing is mutated
/// here; the caller applies the returned infections afterwards, so an agent
/// infected during this pass cannot infect others in the same pass.
pub(crate) fn spread(
    agents: &[Agent],
    field: &mut Field,
    contacts: &mut Contacts,
    pfs: &ParamsForStep,
) -> SpreadResult {
    if pfs.rp.pair_scan == PairScan::Grid {
        field.refresh(agents);
    }
    let field = &*field;
    let snapshot = &*contacts;
    let per_target: Vec<_> = agents
        .par_iter()
        .enumerate()
        .filter(|(_, t)| t.state().is_exposable())
        .map(|(index, target)| {
            let (exposures, to) = match pfs.rp.pair_scan {
                PairScan::BruteForce => {
                    expose_target(agents, 0..agents.len(), target, snapshot, pfs)
                }
                PairScan::Grid => {
                    expose_target(agents, field.around(&target.pt()), target, snapshot, pfs)
                }
            };
            (exposures, to.map(|to| Infection { index, to }))
        })
        .collect();

    let mut result = SpreadResult::default();
    for (exposures, infection) in per_target {
        result.exposures.extend(exposures);
        result.infections.extend(infection);
    }
    contacts.record(&result.exposures, pfs);
    result
}
