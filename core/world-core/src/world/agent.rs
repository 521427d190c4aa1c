use std::{f64, fmt};

use math::Point;
use rand::{rngs::SmallRng, Rng};
use serde::{Deserialize, Serialize};

use super::{
    boundary::Boundary,
    commons::{DischargePolicy, HealthType, ParamsForStep, RuntimeParams},
};
use crate::{
    stat::HealthDiff,
    util::random::{self, Stream},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct Body {
    pt: Point,
    v: Point,
}

impl Body {
    fn new<R: Rng>(pt: Point, rng: &mut R, rp: &RuntimeParams) -> Self {
        let th: f64 = rng.gen::<f64>() * f64::consts::PI * 2.0;
        let mut v = Point::new(th.cos(), th.sin()) * rp.speed;
        v.apply_mut(|c| *c = c.clamp(-rp.max_speed, rp.max_speed));
        Self { pt, v }
    }

    fn update_velocity<R: Rng>(&mut self, rng: &mut R, rp: &RuntimeParams) {
        self.v.x += random::symmetric(rng, rp.velocity_jitter);
        self.v.y += random::symmetric(rng, rp.velocity_jitter);
        self.v
            .apply_mut(|c| *c = c.clamp(-rp.max_speed, rp.max_speed));
    }

    fn field_update<R: Rng>(&mut self, boundary: &Boundary, rng: &mut R, rp: &RuntimeParams) {
        self.update_velocity(rng, rp);
        boundary.confine(&mut self.pt, &mut self.v, rng, rp);
    }
}

#[derive(Debug)]
struct AgentHealth {
    state: HealthType,
    /// day the current state was entered, where it matters
    since: Option<u32>,
}

impl AgentHealth {
    fn transit(&mut self, to: HealthType, since: Option<u32>) -> HealthDiff {
        let from = self.state;
        if !from.can_transition_to(to) {
            panic!("illegal health transition: {from} -> {to}");
        }
        self.state = to;
        self.since = since;
        HealthDiff::new(from, to)
    }

    fn step<R: Rng>(&mut self, rng: &mut R, pfs: &ParamsForStep) -> Option<HealthDiff> {
        let rp = pfs.rp;
        match self.state {
            HealthType::Latent => rp
                .latent_to_active_probability
                .hit(rng)
                .then(|| self.transit(HealthType::Active, Some(pfs.day))),
            HealthType::Active => {
                let expired = self
                    .since
                    .map_or(false, |d| pfs.day.saturating_sub(d) >= rp.infection_period);
                if expired {
                    Some(match rp.discharge {
                        DischargePolicy::RelapseToLatent => self.transit(HealthType::Latent, None),
                        DischargePolicy::Recover => {
                            self.transit(HealthType::Recovered, Some(pfs.day))
                        }
                    })
                } else if rp.death_probability.hit(rng) {
                    Some(self.transit(HealthType::Dead, Some(pfs.day)))
                } else {
                    None
                }
            }
            HealthType::Healthy | HealthType::Dead | HealthType::Recovered => None,
        }
    }
}

#[derive(Debug)]
pub struct Agent {
    id: AgentId,
    body: Body,
    health: AgentHealth,
    radius: f64,
    rng: SmallRng,
}

impl Agent {
    pub(crate) fn new(id: AgentId, pt: Point, radius: f64, seed: u64, rp: &RuntimeParams) -> Self {
        let mut rng = random::keyed_rng(seed, Stream::Agent, &[id.0 as u64]);
        Self {
            id,
            body: Body::new(pt, &mut rng, rp),
            health: AgentHealth {
                state: HealthType::Healthy,
                since: None,
            },
            radius,
            rng,
        }
    }

    #[inline]
    pub fn id(&self) -> AgentId {
        self.id
    }

    #[inline]
    pub fn pt(&self) -> Point {
        self.body.pt
    }

    #[inline]
    pub fn velocity(&self) -> Point {
        self.body.v
    }

    #[inline]
    pub fn state(&self) -> HealthType {
        self.health.state
    }

    #[inline]
    pub fn since(&self) -> Option<u32> {
        self.health.since
    }

    /// Panics when `to` is not reachable from the current state.
    pub(crate) fn set_state(&mut self, to: HealthType, since: Option<u32>) -> HealthDiff {
        self.health.transit(to, since)
    }

    /// Dead agents do not move.
    pub(crate) fn move_in(&mut self, boundary: &Boundary, rp: &RuntimeParams) {
        if self.health.state == HealthType::Dead {
            return;
        }
        self.body.field_update(boundary, &mut self.rng, rp);
    }

    /// Once-a-day disease progression.
    pub(crate) fn progress(&mut self, pfs: &ParamsForStep) -> Option<HealthDiff> {
        self.health.step(&mut self.rng, pfs)
    }
}

/// Read-only handle given to renderers.
#[derive(Clone, Copy)]
pub struct AgentView<'a>(&'a Agent);

impl<'a> AgentView<'a> {
    pub(crate) fn new(agent: &'a Agent) -> Self {
        Self(agent)
    }

    pub fn id(&self) -> AgentId {
        self.0.id
    }

    pub fn pt(&self) -> Point {
        self.0.body.pt
    }

    pub fn velocity(&self) -> Point {
        self.0.body.v
    }

    pub fn state(&self) -> HealthType {
        self.0.health.state
    }

    pub fn radius(&self) -> f64 {
        self.0.radius
    }
}

impl fmt::Debug for AgentView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentView")
            .field("id", &self.id())
            .field("pt", &self.pt())
            .field("state", &self.state())
            .finish()
    }
}
