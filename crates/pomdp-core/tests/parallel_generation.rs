mod common;

use common::{Cmd, Echo, Pos, SignalModel, probe_index};
use pomdp_core::filter::{
    CancelToken, FilterConfig, FilterError, FilterStats, ParallelConfig, ParticleFilter, Proposal,
};
use pomdp_core::model::GenerativeModel;
use rand::SeedableRng;
use rand::rngs::SmallRng;

#[test]
fn parallel_path_fills_the_request() {
    let model = SignalModel::new(0.85);
    let (index, root) = probe_index(&model);
    let filter = ParticleFilter::default();
    let prior = [Pos::Left, Pos::Left, Pos::Right];
    let mut rng = SmallRng::seed_from_u64(21);
    let mut stats = FilterStats::default();

    let particles = filter
        .generate_particles_parallel(
            &model,
            &index,
            root,
            &Cmd::Probe,
            &Echo::HearLeft,
            16,
            Proposal::Prior(&prior),
            ParallelConfig { workers: 4 },
            &mut rng,
            Some(&mut stats),
            None,
        )
        .expect("request fills");

    assert_eq!(particles.len(), 16);
    assert!(particles.iter().all(|state| model.is_valid(state)));
    assert!(stats.accepted >= 16);
    assert_eq!(stats.attempts, model.steps_taken());
}

#[test]
fn parallel_uninformed_proposal_fills_the_request() {
    let model = SignalModel::new(0.85);
    let (index, root) = probe_index(&model);
    let filter = ParticleFilter::default();
    let mut rng = SmallRng::seed_from_u64(22);

    let particles = filter
        .generate_particles_parallel(
            &model,
            &index,
            root,
            &Cmd::Probe,
            &Echo::HearRight,
            8,
            Proposal::Uninformed,
            ParallelConfig { workers: 3 },
            &mut rng,
            None,
            None,
        )
        .expect("request fills");

    assert_eq!(particles.len(), 8);
}

#[test]
fn parallel_unknown_target_returns_empty_without_stepping() {
    let model = SignalModel::new(0.85);
    let (index, root) = probe_index(&model);
    let filter = ParticleFilter::default();
    let prior = [Pos::Left];
    let mut rng = SmallRng::seed_from_u64(23);

    let particles = filter
        .generate_particles_parallel(
            &model,
            &index,
            root,
            &Cmd::Grab,
            &Echo::HearLeft,
            8,
            Proposal::Prior(&prior),
            ParallelConfig::default(),
            &mut rng,
            None,
            None,
        )
        .expect("defined outcome");

    assert!(particles.is_empty());
    assert_eq!(model.steps_taken(), 0);
}

#[test]
fn parallel_exhaustion_is_recoverable() {
    let model = SignalModel::new(1.0);
    let (index, root) = probe_index(&model);
    let filter = ParticleFilter::new(FilterConfig {
        attempts_per_particle: 8,
    });
    let prior = [Pos::Right, Pos::Right];
    let mut rng = SmallRng::seed_from_u64(24);

    let err = filter
        .generate_particles_parallel(
            &model,
            &index,
            root,
            &Cmd::Probe,
            &Echo::HearLeft,
            4,
            Proposal::Prior(&prior),
            ParallelConfig { workers: 4 },
            &mut rng,
            None,
            None,
        )
        .expect_err("target observation is unreachable");

    match err {
        FilterError::ExhaustedProposal { accepted, attempts } => {
            assert!(accepted.is_empty());
            assert!(attempts <= 32);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn parallel_cancellation_stops_cleanly() {
    let model = SignalModel::new(0.85);
    let (index, root) = probe_index(&model);
    let filter = ParticleFilter::default();
    let prior = [Pos::Left, Pos::Right];
    let mut rng = SmallRng::seed_from_u64(25);

    let token = CancelToken::new();
    token.cancel();

    let err = filter
        .generate_particles_parallel(
            &model,
            &index,
            root,
            &Cmd::Probe,
            &Echo::HearLeft,
            8,
            Proposal::Prior(&prior),
            ParallelConfig { workers: 2 },
            &mut rng,
            None,
            Some(&token),
        )
        .expect_err("token already fired");

    match err {
        FilterError::Cancelled { accepted, attempts } => {
            assert!(accepted.is_empty());
            assert_eq!(attempts, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(model.steps_taken(), 0);
}
