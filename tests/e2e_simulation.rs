//! End-to-end simulation run tests.
//!
//! These tests drive full runs through the public API: reproducibility,
//! per-run isolation, config loading and the non-convergence outcome.

use std::io::Write;

use ghost::{run_sessions, Config, GhostError, Simulation, StrategyKind};

fn seeded(seed: u64, strategy: StrategyKind) -> Config {
    let mut config = Config::default();
    config.decoy.universe_size = 200;
    config.decoy.real_recipient = 42;
    config.simulation.cycles = 50;
    config.simulation.seed = Some(seed);
    config.simulation.strategy = strategy;
    config
}

/// Same seed and configuration give byte-identical emitted sequences
#[test]
fn test_runs_are_reproducible() {
    for strategy in [StrategyKind::Tree, StrategyKind::Batch] {
        let a = Simulation::new(seeded(1234, strategy)).unwrap().run().unwrap();
        let b = Simulation::new(seeded(1234, strategy)).unwrap().run().unwrap();

        let a_bytes = serde_json::to_vec(&a.emitted).unwrap();
        let b_bytes = serde_json::to_vec(&b.emitted).unwrap();
        assert_eq!(a_bytes, b_bytes);
        assert_eq!(a.real_messages_sent, b.real_messages_sent);
    }
}

/// Different seeds diverge
#[test]
fn test_different_seeds_diverge() {
    let a = Simulation::new(seeded(1, StrategyKind::Tree)).unwrap().run().unwrap();
    let b = Simulation::new(seeded(2, StrategyKind::Tree)).unwrap().run().unwrap();
    assert_ne!(a.emitted, b.emitted);
}

/// Every burst that required a real message sent exactly one
#[test]
fn test_real_messages_match_requiring_bursts() {
    let mut config = seeded(77, StrategyKind::Tree);
    config.simulation.cycles = 200;
    let report = Simulation::new(config).unwrap().run().unwrap();

    assert_eq!(report.real_messages_sent, report.bursts_with_real);
    assert!(report.bursts_with_real > 0);
    assert!(report.bursts_with_real + report.gated <= report.cycles);
}

/// Without gating every coin flip that wants a real message gets one
#[test]
fn test_gating_disabled_never_gates() {
    let mut config = seeded(8, StrategyKind::Tree);
    config.simulation.gate_on_frequency = false;
    config.simulation.real_probability = 1.0;
    let report = Simulation::new(config).unwrap().run().unwrap();

    assert_eq!(report.gated, 0);
    assert_eq!(report.bursts_with_real, report.cycles);
    assert_eq!(report.real_messages_sent, report.cycles);
}

/// With gating on, a conspicuous real recipient holds back real messages
#[test]
fn test_gating_holds_real_when_conspicuous() {
    let mut config = seeded(1, StrategyKind::Tree);
    config.decoy.universe_size = 20;
    config.decoy.real_recipient = 3;
    config.simulation.gate_on_frequency = true;
    config.simulation.real_probability = 1.0;
    config.simulation.cycles = 500;
    let report = Simulation::new(config).unwrap().run().unwrap();

    // Every cycle wanted the real message; each either sent it or was gated
    assert!(report.gated > 0, "gate never fired");
    assert!(report.bursts_with_real > 0);
    assert_eq!(report.bursts_with_real + report.gated, report.cycles);
    assert_eq!(report.real_messages_sent, report.bursts_with_real);
}

/// Real recipient stays unremarkable over a long run
#[test]
fn test_real_recipient_not_exposed() {
    let mut config = seeded(31337, StrategyKind::Tree);
    config.decoy.universe_size = 50;
    config.simulation.cycles = 500;
    let report = Simulation::new(config).unwrap().run().unwrap();

    // Adaptive selection and gating keep the real id near the mean
    assert!(report.real_exposure() < 2.0, "exposure {}", report.real_exposure());
}

/// A tight iteration cap surfaces as a distinct error, not a hang
#[test]
fn test_iteration_cap_surfaces_non_convergence() {
    let mut config = seeded(5, StrategyKind::Tree);
    config.decoy.min_transmissions = 1;
    config.decoy.max_transmissions = 1;
    config.decoy.max_burst_iterations = Some(1);
    config.simulation.gate_on_frequency = false;
    config.simulation.real_probability = 1.0;
    config.simulation.cycles = 200;

    // Each burst fails with probability 1/2; 200 in a row succeeding is not happening
    match Simulation::new(config).unwrap().run() {
        Err(GhostError::NonConvergentBurst { issued, cap }) => {
            assert_eq!(issued, 1);
            assert_eq!(cap, 1);
        },
        other => panic!("expected non-convergence, got {other:?}"),
    }
}

/// Parallel sessions match their sequential counterparts
#[test]
fn test_sessions_do_not_share_state() {
    let config = seeded(500, StrategyKind::Tree);
    let reports = run_sessions(&config, 4).unwrap();
    assert_eq!(reports.len(), 4);

    for (i, report) in reports.iter().enumerate() {
        let solo = Simulation::new(seeded(500 + i as u64, StrategyKind::Tree))
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(report.emitted, solo.emitted);
        assert_eq!(report.real_recipient_frequency, solo.real_recipient_frequency);
    }
}

/// Invalid configuration fails before anything runs
#[test]
fn test_invalid_configuration_rejected() {
    let mut config = seeded(1, StrategyKind::Tree);
    config.decoy.min_hops = 5;
    config.decoy.max_hops = 2;
    assert!(matches!(
        Simulation::new(config.clone()),
        Err(GhostError::InvalidConfiguration(_))
    ));
    assert!(matches!(
        run_sessions(&config, 2),
        Err(GhostError::InvalidConfiguration(_))
    ));
}

/// Config files drive a run end to end
#[test]
fn test_run_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[decoy]
universe_size = 10
min_hops = 3
max_hops = 3
max_branching = 1
min_transmissions = 1
max_transmissions = 1
real_recipient = 5

[simulation]
cycles = 10
strategy = "tree"
seed = 11
real_probability = 1.0
gate_on_frequency = false
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    let report = Simulation::new(config).unwrap().run().unwrap();

    assert_eq!(report.real_messages_sent, 10);
    // Single 3-hop paths only
    assert_eq!(report.emitted_count() as u64, report.transmissions * 3);
}

/// Batch bursts carry one real slot each and are B^H wide
#[test]
fn test_batch_run_shape() {
    let mut config = seeded(9, StrategyKind::Batch);
    config.decoy.max_hops = 3;
    config.decoy.max_branching = 3;
    config.simulation.gate_on_frequency = false;
    config.simulation.real_probability = 1.0;
    config.simulation.cycles = 20;

    let report = Simulation::new(config).unwrap().run().unwrap();
    assert_eq!(report.transmissions, 20);
    assert_eq!(report.real_messages_sent, 20);
    assert_eq!(report.emitted_count(), 20 * 27);
    for burst in report.emitted.chunks(27) {
        assert!(burst.contains(&report.real_recipient));
    }
}
