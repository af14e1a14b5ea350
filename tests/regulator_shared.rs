//! The regulator and the command loop sharing one session.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use aether_core::{AetherConfig, Contextus, Outcome, Regulator, SharedContextus};
use parking_lot::Mutex;

// ─── helpers ─────────────────────────────────────────────────────────────────

fn shared(seed: u64) -> SharedContextus {
    let config = AetherConfig {
        regulator_interval_ms: [1, 3],
        ..AetherConfig::seeded(seed)
    };
    Arc::new(Mutex::new(Contextus::new(config).expect("boot failed")))
}

// ─── tests ───────────────────────────────────────────────────────────────────

#[test]
fn test_commands_interleave_with_regulator() {
    let ctx = shared(21);
    let handle = Regulator::spawn(Arc::clone(&ctx));

    for i in 0..40 {
        let command = match i % 4 {
            0 => format!("CREO 'M{i}'"),
            1 => "PERTURBO 3 1 2".to_string(),
            2 => "CONVERGO".to_string(),
            _ => "OSTENDO".to_string(),
        };
        let reply = ctx.lock().execute(&command);
        assert!(reply.is_ok(), "{command}: {reply:?}");
        thread::sleep(Duration::from_millis(1));
    }
    handle.stop();

    let guard = ctx.lock();
    assert!(guard.materia(guard.genesis_name()).is_some());
    for name in guard.names() {
        let core = guard.materia(&name).unwrap();
        assert!(core.energy().is_finite(), "{name}");
        assert!(core.sextet.dielectricity >= 0.1, "{name}");
    }
}

#[test]
fn test_regulator_redeemed_focus_heals() {
    let ctx = shared(22);
    {
        let mut guard = ctx.lock();
        guard.execute("CREO 'UMBRA'").unwrap();
        let (core, rng) = guard.materia_with_rng("UMBRA").unwrap();
        for _ in 0..3 {
            core.perturb(2, 2, 1.0, 1.0, rng).unwrap();
        }
        core.set_identity_wave(0.0);
        let report = Regulator::tick(&mut guard).unwrap();
        assert_eq!(report.redeemed, vec!["UMBRA"]);
    }

    let mut guard = ctx.lock();
    assert_eq!(guard.focus(), Some("UMBRA"));
    assert!(matches!(
        guard.execute("PERTURBO").unwrap(),
        Outcome::Coherent { .. }
    ));
    assert_eq!(guard.focus(), Some("GENESIS"));
}
