//! Whole-world runs through the public API.

use world_core::{
    Boundary, HealthType, PairScan, Probability, RuntimeParams, World, WorldParams,
};

fn stationary(seed: u64) -> (RuntimeParams, WorldParams) {
    let rp = RuntimeParams {
        speed: 0.0,
        velocity_jitter: 0.0,
        infection_radius: 10.0,
        infection_probability: Probability::ONE,
        prob_active_given_exposed_healthy: Probability::ZERO,
        death_probability: Probability::ZERO,
        ..Default::default()
    };
    let wp = WorldParams {
        population: 100,
        initial_active: 1,
        initial_latent_fraction: Probability::ZERO,
        boundary: Boundary::rect(100.0, 100.0).unwrap(),
        ticks_per_day: 1,
        checks_per_day: 1,
        seed: Some(seed),
        ..Default::default()
    };
    (rp, wp)
}

#[test]
fn test_single_pass_infects_neighbourhood() {
    let (rp, wp) = stationary(2024);
    let mut w = World::new("e2e".into(), rp, wp).unwrap();

    let source = w
        .agents()
        .find(|a| a.state() == HealthType::Active)
        .unwrap();
    let (source_id, source_pt) = (source.id(), source.pt());
    let near: Vec<_> = w
        .agents()
        .filter(|a| a.id() != source_id && a.pt().dist(&source_pt) <= 10.0)
        .map(|a| a.id())
        .collect();

    w.tick();

    let c = w.counts();
    assert_eq!(c[HealthType::Active], 1);
    assert_eq!(c[HealthType::Latent] as usize, near.len());
    assert_eq!(c[HealthType::Healthy] as usize, 99 - near.len());
    for a in w.agents() {
        if near.contains(&a.id()) {
            assert_eq!(a.state(), HealthType::Latent, "{} was in range", a.id());
        } else if a.id() != source_id {
            assert_eq!(a.state(), HealthType::Healthy, "{} was out of range", a.id());
        }
    }
    assert_eq!(w.exposures().len(), near.len());
    assert!(w.exposures().iter().all(|e| e.source == source_id));
}

#[test]
fn test_single_pass_all_active() {
    let (mut rp, wp) = stationary(7);
    rp.prob_active_given_exposed_healthy = Probability::ONE;
    let mut w = World::new("e2e".into(), rp, wp).unwrap();
    let source_pt = w
        .agents()
        .find(|a| a.state() == HealthType::Active)
        .unwrap()
        .pt();
    let n_near = w
        .agents()
        .filter(|a| a.state() == HealthType::Healthy && a.pt().dist(&source_pt) <= 10.0)
        .count() as u32;

    w.tick();
    let c = w.counts();
    assert_eq!(c[HealthType::Active], 1 + n_near);
    assert_eq!(c[HealthType::Latent], 0);
}

#[test]
fn test_no_spontaneous_infection() {
    let rp = RuntimeParams {
        infection_probability: Probability::ZERO,
        ..Default::default()
    };
    let wp = WorldParams {
        population: 200,
        initial_active: 0,
        initial_latent_fraction: Probability::new(0.1).unwrap(),
        seed: Some(11),
        ..Default::default()
    };
    let mut w = World::new("quiet".into(), rp, wp).unwrap();
    assert!(w.no_infected_remain());
    for _ in 0..500 {
        w.tick();
    }
    let c = w.counts();
    assert_eq!(c[HealthType::Healthy], 180);
    assert_eq!(c[HealthType::Latent], 20);
    assert_eq!(c.total(), 200);
}

#[test]
fn test_same_seed_same_run() {
    let rp = RuntimeParams {
        infection_probability: Probability::new(0.3).unwrap(),
        latent_to_active_probability: Probability::new(0.1).unwrap(),
        death_probability: Probability::new(0.02).unwrap(),
        infection_period: 7,
        ..Default::default()
    };
    let wp = WorldParams {
        population: 250,
        initial_active: 3,
        boundary: Boundary::office(),
        seed: Some(99),
        ..Default::default()
    };
    let mut a = World::new("a".into(), rp.clone(), wp.clone()).unwrap();
    let mut b = World::new("b".into(), rp, wp).unwrap();
    for _ in 0..150 {
        a.tick();
        b.tick();
    }
    let snapshot = |w: &World| {
        w.agents()
            .map(|v| (v.pt(), v.velocity(), v.state()))
            .collect::<Vec<_>>()
    };
    assert_eq!(snapshot(&a), snapshot(&b));
    assert_eq!(a.history(), b.history());
}

#[test]
fn test_brute_force_and_grid_agree() {
    let rp = RuntimeParams {
        infection_probability: Probability::new(0.4).unwrap(),
        prob_active_given_exposed_healthy: Probability::new(0.3).unwrap(),
        latent_to_active_probability: Probability::new(0.1).unwrap(),
        infection_period: 4,
        speed: 1.5,
        ..Default::default()
    };
    let wp = WorldParams {
        population: 400,
        initial_active: 4,
        boundary: Boundary::rect(200.0, 120.0).unwrap(),
        seed: Some(5),
        ..Default::default()
    };
    let run = |scan: PairScan| {
        let rp = RuntimeParams {
            pair_scan: scan,
            ..rp.clone()
        };
        let mut w = World::new("scan".into(), rp, wp.clone()).unwrap();
        for _ in 0..200 {
            w.tick();
        }
        w.history().to_vec()
    };
    assert_eq!(run(PairScan::Grid), run(PairScan::BruteForce));
}

#[test]
fn test_recover_policy_terminates() {
    let rp = RuntimeParams {
        infection_probability: Probability::new(0.5).unwrap(),
        prob_active_given_exposed_healthy: Probability::ONE,
        infection_period: 3,
        discharge: world_core::DischargePolicy::Recover,
        ..Default::default()
    };
    let wp = WorldParams {
        population: 150,
        initial_active: 2,
        initial_latent_fraction: Probability::ZERO,
        seed: Some(3),
        ..Default::default()
    };
    let mut w = World::new("sir".into(), rp, wp).unwrap();
    let mut guard = 0;
    while !w.is_ended() {
        w.tick();
        guard += 1;
        assert!(guard < 100_000, "active agents never cleared");
    }
    let c = w.counts();
    assert_eq!(c[HealthType::Active], 0);
    assert!(c[HealthType::Recovered] >= 2);
    assert_eq!(c.total(), 150);
}
