//! Background regulator: autonomous upkeep of every non-genesis materia.
//!
//! One regulation pass ([`Regulator::tick`]) computes two thresholds from the
//! whole registry and then visits the non-genesis materiae in sorted order:
//!
//! ```text
//! r_thresh = avg(R > 0) · U(4.5, 5.5)
//! c_thresh = avg(C)     · U(0.05, 0.15)
//!
//! identity < 0.1 and |memory| > 2   → redeem into genesis
//! R > r_thresh and R > 1            → destruct
//! C < c_thresh                      → create
//! ```
//!
//! [`Regulator::spawn`] runs passes on a background thread against a
//! [`SharedContextus`]. The thread and the REPL contend for the same coarse
//! lock, so a pass never interleaves with a command.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{info, warn};
use parking_lot::Mutex;
use rand::Rng;

use crate::contextus::Contextus;
use crate::error::AetherResult;

/// A session shared between the REPL and the regulator thread.
pub type SharedContextus = Arc<Mutex<Contextus>>;

/// Identity below which a materia with enough memory is redeemed.
const FADING_IDENTITY: f64 = 0.1;

/// Memory length a fading materia must exceed before it is redeemed.
const FADING_MEMORY: usize = 2;

/// Resistance a materia must exceed before it can be destructed.
const RESISTANCE_FLOOR: f64 = 1.0;

/// Longest uninterrupted sleep while waiting for the next pass.
const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// What one pass did, by materia name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Redeemed into genesis.
    pub redeemed: Vec<String>,
    /// Destructed.
    pub destructed: Vec<String>,
    /// Created (converged).
    pub created: Vec<String>,
}

impl TickReport {
    /// `true` when the pass touched nothing.
    pub fn is_quiet(&self) -> bool {
        self.redeemed.is_empty() && self.destructed.is_empty() && self.created.is_empty()
    }
}

/// Regulation passes.
pub struct Regulator;

impl Regulator {
    /// Run one regulation pass.
    pub fn tick(ctx: &mut Contextus) -> AetherResult<TickReport> {
        let mut report = TickReport::default();
        let names = ctx.names();
        if names.is_empty() {
            return Ok(report);
        }

        let (mut r_sum, mut r_count, mut c_sum) = (0.0, 0usize, 0.0);
        for core in names.iter().filter_map(|n| ctx.materia(n)) {
            if core.sextet.resistance > 0.0 {
                r_sum += core.sextet.resistance;
                r_count += 1;
            }
            c_sum += core.sextet.capacitance;
        }
        let avg_r = match r_sum / r_count.max(1) as f64 {
            avg if avg > 0.0 => avg,
            _ => 10.0,
        };
        let avg_c = match c_sum / names.len() as f64 {
            avg if avg != 0.0 => avg,
            _ => 1.0,
        };
        let rng = ctx.rng_mut();
        let r_thresh = avg_r * rng.gen_range(4.5..5.5);
        let c_thresh = avg_c * rng.gen_range(0.05..0.15);

        let genesis = ctx.genesis_name().to_string();
        for name in names.into_iter().filter(|n| *n != genesis) {
            let Some(core) = ctx.materia(&name) else {
                continue;
            };
            let fading =
                core.identity_wave() < FADING_IDENTITY && core.memory_len() > FADING_MEMORY;
            let resistance = core.sextet.resistance;
            let capacitance = core.sextet.capacitance;

            if fading {
                info!("regulator: identity of '{name}' fading; redeeming");
                ctx.redeem(Some(vec![name.clone()]), 1.0)?;
                report.redeemed.push(name);
            } else if resistance > r_thresh && resistance > RESISTANCE_FLOOR {
                if let Some((core, rng)) = ctx.materia_with_rng(&name) {
                    core.destruct(rng);
                }
                report.destructed.push(name);
            } else if capacitance < c_thresh {
                if let Some((core, rng)) = ctx.materia_with_rng(&name) {
                    core.create(rng);
                }
                report.created.push(name);
            }
        }
        Ok(report)
    }

    /// Start a background thread that sleeps a random configured interval,
    /// then runs one pass under the session lock, until stopped.
    pub fn spawn(shared: SharedContextus) -> RegulatorHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let thread = thread::spawn(move || {
            let mut wait = next_interval(&mut shared.lock());
            while sleep_unless_stopped(wait, &flag) {
                let mut ctx = shared.lock();
                match Regulator::tick(&mut ctx) {
                    Ok(report) if !report.is_quiet() => info!("regulator pass: {report:?}"),
                    Ok(_) => {}
                    Err(e) => warn!("regulator pass failed: {e}"),
                }
                wait = next_interval(&mut ctx);
            }
        });
        info!("regulator started");
        RegulatorHandle {
            stop,
            thread: Some(thread),
        }
    }
}

/// Handle to a running regulator thread. Dropping it stops the thread.
#[derive(Debug)]
pub struct RegulatorHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl RegulatorHandle {
    /// Signal the thread and wait for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    /// `true` once a stop has been requested.
    pub fn is_stopping(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("regulator thread panicked");
            }
            info!("regulator stopped");
        }
    }
}

impl Drop for RegulatorHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn next_interval(ctx: &mut Contextus) -> Duration {
    let [lo, hi] = ctx.config().regulator_interval_ms;
    Duration::from_millis(ctx.rng_mut().gen_range(lo..=hi))
}

/// Sleep for `total` in short slices. Returns `false` if a stop was requested.
fn sleep_unless_stopped(total: Duration, stop: &AtomicBool) -> bool {
    let mut remaining = total;
    while !remaining.is_zero() {
        if stop.load(Ordering::SeqCst) {
            return false;
        }
        let slice = remaining.min(SLEEP_SLICE);
        thread::sleep(slice);
        remaining -= slice;
    }
    !stop.load(Ordering::SeqCst)
}
