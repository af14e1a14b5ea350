/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! FluxCore: the square flux grid behind every materia.
//!
//! Two transitions mutate a core:
//!
//! ```text
//! perturb(x, y, a, m):  grid[x][y] += a·m·P  (÷ (D + ε) when |a| > 100)
//!                       energy     += |Δ|·Pt
//!                       memory     ← Δ
//! converge():           interior cell ← mean(3×3) + M
//! ```
//!
//! Both end in a sextet recompute (see [`FluxCore::energy`] and [`Sextet`]).
//! While the entropic cascade anomaly is active a recompute may schedule a
//! follow-up perturbation. Follow-ups go onto a work queue that the mutating
//! call drains, never deeper than the configured cascade limit.
//!
//! # Invariants
//!
//! - **FX-001**: every write is bounds-checked; no operation resizes the grid.
//! - **FX-002**: memory holds at most [`MEMORY_CAPACITY`] deltas, oldest evicted first.
//! - **FX-003**: energy is non-negative after every mutation.

use core::fmt;
use std::collections::VecDeque;

use heapless::Deque;
use ndarray::{s, Array2};
use rand::Rng;

use crate::config::AetherConfig;
use crate::error::{AetherError, AetherResult};
use crate::sextet::{Architecture, Sextet, DIELECTRIC_FLOOR, EPSILON};

/// Square flux grid.
pub type Grid = Array2<f64>;

/// Capacity of the perturbation memory ring.
pub const MEMORY_CAPACITY: usize = 100;

/// Amplitude above which a perturbation is treated as a high-amplitude pulse.
const HIGH_AMPLITUDE: f64 = 100.0;

/// Per-step probability that an entropic cascade spawns a follow-up.
const CASCADE_PROBABILITY: f64 = 0.1;

/// Per-step resistance decay under an entropic cascade.
const CASCADE_DECAY: f64 = 0.99;

/// Amplitude base for a miracle, before dielectric scaling.
const MIRACLE_AMPLITUDE: f64 = 1e6;

// ─── Anomaly ────────────────────────────────────────────────────────────────

/// Persistent mode attached to a core.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Anomaly {
    /// Decays resistance and injects Epanechnikov-shaped perturbations.
    EntropicCascade,
    /// Any other named anomaly. Recorded, no physical effect.
    Named(String),
}

impl Anomaly {
    /// Classify an anomaly name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "ENTROPIC_CASCADE" => Anomaly::EntropicCascade,
            other => Anomaly::Named(other.to_string()),
        }
    }

    /// Name as written in `ANOMALIA '…'`.
    pub fn name(&self) -> &str {
        match self {
            Anomaly::EntropicCascade => "ENTROPIC_CASCADE",
            Anomaly::Named(n) => n,
        }
    }
}

// ─── Annotations ────────────────────────────────────────────────────────────

/// Compact snapshot of a core, stored when it is redeemed into another.
#[derive(Clone, Debug, PartialEq)]
pub struct Echo {
    /// Energy at redemption.
    pub energy: f64,
    /// Identity wave at redemption.
    pub identity_wave: f64,
    /// Memory length at redemption.
    pub memory_len: usize,
    /// Sextet at redemption.
    pub sextet: Sextet,
}

impl fmt::Display for Echo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{FLUXUS: {:.2}, IDENTITAS: {:.2}, MEMORIA: {}, SEXTET: {}}}",
            self.energy, self.identity_wave, self.memory_len, self.sextet
        )
    }
}

/// Value stored under a context-embedding key.
#[derive(Clone, Debug, PartialEq)]
pub enum Annotation {
    /// Free text (prompts, oracle replies, names, transferred wisdom).
    Text(String),
    /// Snapshot of a redeemed core.
    Echo(Echo),
}

impl Annotation {
    /// The text payload, if this is a text annotation.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Annotation::Text(t) => Some(t),
            Annotation::Echo(_) => None,
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotation::Text(t) => f.write_str(t),
            Annotation::Echo(e) => write!(f, "{e}"),
        }
    }
}

// ─── Report ─────────────────────────────────────────────────────────────────

/// Structured display of a core. `Display` renders the three-part REPL view.
#[derive(Clone, Debug, PartialEq)]
pub struct MateriaReport {
    /// Current energy.
    pub energy: f64,
    /// Current identity wave.
    pub identity_wave: f64,
    /// Number of remembered perturbations.
    pub memory_len: usize,
    /// Current sextet.
    pub sextet: Sextet,
    /// Intellectus architecture, if any.
    pub architecture: Option<Architecture>,
    /// Active anomaly name, if any.
    pub anomaly: Option<String>,
    /// Annotations in insertion order, rendered.
    pub annotations: Vec<(String, String)>,
}

impl fmt::Display for MateriaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FLUXUS: {:.2} | IDENTITAS: {:.2} | MEMORIA: {}",
            self.energy, self.identity_wave, self.memory_len
        )?;
        if let Some(arch) = self.architecture {
            write!(f, " | MODUS: {arch}")?;
        }
        if let Some(anomaly) = &self.anomaly {
            write!(f, " | ANOMALIA: {anomaly}")?;
        }
        write!(f, "\nSEXTET: {}\nCONTEXTUS:", self.sextet)?;
        for (k, v) in &self.annotations {
            write!(f, "\n  '{k}': {v}")?;
        }
        Ok(())
    }
}

// ─── Physics knobs ──────────────────────────────────────────────────────────

/// Session-level knobs every core carries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Physics {
    /// Add magnetism to smoothed cells during converge.
    pub converge_bias: bool,
    /// Maximum follow-up perturbations drained per mutation.
    pub cascade_limit: usize,
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            converge_bias: true,
            cascade_limit: 32,
        }
    }
}

impl From<&AetherConfig> for Physics {
    fn from(config: &AetherConfig) -> Self {
        Self {
            converge_bias: config.converge_bias,
            cascade_limit: config.cascade_limit,
        }
    }
}

/// A follow-up perturbation scheduled by the cascade.
#[derive(Clone, Copy, Debug)]
struct Pending {
    x: usize,
    y: usize,
    amplitude: f64,
}

// ─── FluxCore ───────────────────────────────────────────────────────────────

/// A materia: flux grid, energy, memory, identity, annotations, and sextet.
#[derive(Debug)]
pub struct FluxCore {
    grid: Grid,
    energy: f64,
    memory: Deque<f64, MEMORY_CAPACITY>,
    identity_wave: f64,
    embeddings: Vec<(String, Annotation)>,
    /// Derived properties. Overwritten by every recompute.
    pub sextet: Sextet,
    anomaly: Option<Anomaly>,
    architecture: Option<Architecture>,
    physics: Physics,
}

impl FluxCore {
    /// A fresh plain materia: zero grid, zero energy, empty memory.
    pub fn new(size: usize, physics: Physics) -> Self {
        Self {
            grid: Grid::zeros((size, size)),
            energy: 0.0,
            memory: Deque::new(),
            identity_wave: 0.0,
            embeddings: Vec::new(),
            sextet: Sextet::quiescent(),
            anomaly: None,
            architecture: None,
            physics,
        }
    }

    /// A fresh Intellectus with the architecture's initial overrides applied.
    pub fn intellectus(size: usize, architecture: Architecture, physics: Physics) -> Self {
        let mut core = Self::new(size, physics);
        architecture.profile().seed(&mut core.sextet);
        core.architecture = Some(architecture);
        core
    }

    // ── Read accessors ─────────────────────────────────────────────────────

    /// Side length of the grid.
    pub fn size(&self) -> usize {
        self.grid.nrows()
    }

    /// The flux grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Current energy: `Σ|grid| / (resistance + ε)` after each recompute.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// `(energy / |memory|) × dielectricity`, refreshed whenever memory is non-empty.
    pub fn identity_wave(&self) -> f64 {
        self.identity_wave
    }

    /// Remembered perturbation deltas, oldest first.
    pub fn memory(&self) -> impl Iterator<Item = f64> + '_ {
        self.memory.iter().copied()
    }

    /// Number of remembered perturbations.
    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    /// Architecture, if this is an Intellectus.
    pub fn architecture(&self) -> Option<Architecture> {
        self.architecture
    }

    /// Active anomaly.
    pub fn anomaly(&self) -> Option<&Anomaly> {
        self.anomaly.as_ref()
    }

    /// Set or clear the anomaly.
    pub fn set_anomaly(&mut self, anomaly: Option<Anomaly>) {
        self.anomaly = anomaly;
    }

    /// Overwrite the identity wave.
    pub fn set_identity_wave(&mut self, value: f64) {
        self.identity_wave = value;
    }

    /// Raise energy to at least `floor`.
    pub fn floor_energy(&mut self, floor: f64) {
        self.energy = self.energy.max(floor);
    }

    // ── Annotations ────────────────────────────────────────────────────────

    /// Attach an annotation. An existing key is overwritten in place.
    pub fn embed(&mut self, key: impl Into<String>, value: Annotation) {
        let key = key.into();
        match self.embeddings.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.embeddings.push((key, value)),
        }
    }

    /// Attach a text annotation.
    pub fn embed_text(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.embed(key, Annotation::Text(text.into()));
    }

    /// Look up an annotation.
    pub fn annotation(&self, key: &str) -> Option<&Annotation> {
        self.embeddings.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// All annotations in insertion order.
    pub fn annotations(&self) -> impl Iterator<Item = (&str, &Annotation)> {
        self.embeddings.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Annotations as a single line of text: `{'K': V, …}`.
    pub fn render_annotations(&self) -> String {
        let body: Vec<String> = self
            .embeddings
            .iter()
            .map(|(k, v)| format!("'{k}': {v}"))
            .collect();
        format!("{{{}}}", body.join(", "))
    }

    // ── Transitions ────────────────────────────────────────────────────────

    /// Add `amplitude × modifier × permeability` to cell `(x, y)`.
    ///
    /// Returns the applied delta. Fails with [`AetherError::IndexOutOfRange`]
    /// when the cell is outside the grid.
    pub fn perturb<R: Rng + ?Sized>(
        &mut self,
        x: usize,
        y: usize,
        amplitude: f64,
        modifier: f64,
        rng: &mut R,
    ) -> AetherResult<f64> {
        let size = self.size();
        if x >= size || y >= size {
            return Err(AetherError::IndexOutOfRange { x, y, size });
        }
        Ok(self.pulse(x, y, amplitude, modifier, rng))
    }

    /// Perturb a uniformly drawn cell. Returns the applied delta.
    pub fn perturb_random<R: Rng + ?Sized>(
        &mut self,
        amplitude: f64,
        modifier: f64,
        rng: &mut R,
    ) -> f64 {
        let (x, y) = self.random_cell(rng);
        self.pulse(x, y, amplitude, modifier, rng)
    }

    /// Replace every interior cell with the mean of its 3×3 neighbourhood,
    /// biased by magnetism when the session enables it.
    pub fn converge<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let n = self.size();
        let bias = if self.physics.converge_bias {
            self.sextet.magnetism
        } else {
            0.0
        };
        let mut next = self.grid.clone();
        for i in 1..n.saturating_sub(1) {
            for j in 1..n.saturating_sub(1) {
                let mean = self
                    .grid
                    .slice(s![i - 1..i + 2, j - 1..j + 2])
                    .mean()
                    .unwrap_or(0.0);
                next[[i, j]] = mean + bias;
            }
        }
        self.grid = next;
        self.settle(0.0, rng);
    }

    /// Inject chaotic energy: uniform(−1, 1) at a random cell, inverted.
    pub fn destruct<R: Rng + ?Sized>(&mut self, rng: &mut R) -> f64 {
        let amplitude = rng.gen_range(-1.0..1.0);
        self.perturb_random(amplitude, -1.0, rng)
    }

    /// Reinforce the current state through convergence.
    pub fn create<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.converge(rng);
    }

    /// Perturb a random cell with resistance and permeability suspended.
    ///
    /// The amplitude is `1e6 / (dielectricity + ε)`. Resistance and
    /// permeability are restored afterwards; everything else keeps the
    /// recomputed values. Returns the applied delta.
    pub fn miracle<R: Rng + ?Sized>(&mut self, modifier: f64, rng: &mut R) -> f64 {
        let (resistance, permeability) = (self.sextet.resistance, self.sextet.permeability);
        self.sextet.resistance = EPSILON;
        self.sextet.permeability = 1e9;
        let amplitude = MIRACLE_AMPLITUDE / (self.sextet.dielectricity + EPSILON);
        let delta = self.perturb_random(amplitude, modifier, rng);
        self.sextet.resistance = resistance;
        self.sextet.permeability = permeability;
        delta
    }

    // ── Composition ────────────────────────────────────────────────────────

    /// Fold `other` into this core.
    ///
    /// The grid gains `other.grid × other.identity / (self.identity + ε)`;
    /// energy, identity, and the whole sextet are summed.
    pub fn absorb(&mut self, other: &FluxCore) {
        if self.grid.dim() == other.grid.dim() {
            let weight = other.identity_wave / (self.identity_wave + EPSILON);
            self.grid.scaled_add(weight, &other.grid);
        } else {
            log::warn!(
                "absorb: grid {}x{} cannot take {}x{}; scalars only",
                self.size(),
                self.size(),
                other.size(),
                other.size()
            );
        }
        self.energy += other.energy;
        self.identity_wave += other.identity_wave;
        self.sextet = self.sextet.summed(&other.sextet);
    }

    /// Split into two opposed halves.
    ///
    /// Scalars are halved in both; the first grid is `grid / 2`, the second
    /// `−grid / 2`. The halved dielectricity is held at its floor and
    /// permittivity follows it. Architecture is inherited; memory,
    /// annotations, and anomaly start empty.
    pub fn split(&self) -> (FluxCore, FluxCore) {
        let mut sextet = self.sextet.scaled(0.5);
        sextet.dielectricity = sextet.dielectricity.max(DIELECTRIC_FLOOR);
        sextet.permittivity = 1.0 - sextet.dielectricity;
        let half = |grid: Grid| FluxCore {
            grid,
            energy: self.energy / 2.0,
            memory: Deque::new(),
            identity_wave: self.identity_wave / 2.0,
            embeddings: Vec::new(),
            sextet,
            anomaly: None,
            architecture: self.architecture,
            physics: self.physics,
        };
        (half(&self.grid / 2.0), half(&self.grid / -2.0))
    }

    /// Accumulate another grid cell-wise. Shapes must match.
    pub fn add_grid(&mut self, other: &Grid) -> AetherResult<()> {
        self.check_shape(other)?;
        self.grid += other;
        Ok(())
    }

    // ── Grounding ──────────────────────────────────────────────────────────

    /// Overwrite the sextet from an external reading.
    ///
    /// Non-finite readings are ignored field by field, and dielectricity is
    /// held at its floor.
    pub fn ground(&mut self, reading: &Sextet) {
        let keep = |new: f64, old: f64| if new.is_finite() { new } else { old };
        let s = &mut self.sextet;
        s.resistance = keep(reading.resistance, s.resistance);
        s.capacitance = keep(reading.capacitance, s.capacitance);
        s.permeability = keep(reading.permeability, s.permeability);
        s.magnetism = keep(reading.magnetism, s.magnetism);
        s.permittivity = keep(reading.permittivity, s.permittivity);
        s.dielectricity = keep(reading.dielectricity, s.dielectricity).max(DIELECTRIC_FLOOR);
    }

    /// Replace the grid with an externally observed one and recompute.
    ///
    /// The recompute overwrites the sextet, so a sensor reading must be
    /// applied with [`FluxCore::ground`] after this, not before.
    pub fn apply_ground_truth<R: Rng + ?Sized>(
        &mut self,
        observed: &Grid,
        rng: &mut R,
    ) -> AetherResult<()> {
        self.check_shape(observed)?;
        self.grid.assign(observed);
        self.settle(0.0, rng);
        Ok(())
    }

    // ── Reports ────────────────────────────────────────────────────────────

    /// Structured view for display.
    pub fn report(&self) -> MateriaReport {
        MateriaReport {
            energy: self.energy,
            identity_wave: self.identity_wave,
            memory_len: self.memory.len(),
            sextet: self.sextet,
            architecture: self.architecture,
            anomaly: self.anomaly.as_ref().map(|a| a.name().to_string()),
            annotations: self
                .embeddings
                .iter()
                .map(|(k, v)| (k.clone(), v.to_string()))
                .collect(),
        }
    }

    /// Compact snapshot for redemption records.
    pub fn echo(&self) -> Echo {
        Echo {
            energy: self.energy,
            identity_wave: self.identity_wave,
            memory_len: self.memory.len(),
            sextet: self.sextet,
        }
    }

    // ── Internal helpers ───────────────────────────────────────────────────

    fn random_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> (usize, usize) {
        let n = self.size().max(1);
        (rng.gen_range(0..n), rng.gen_range(0..n))
    }

    fn check_shape(&self, other: &Grid) -> AetherResult<()> {
        if other.dim() != self.grid.dim() {
            let (rows, cols) = other.dim();
            return Err(AetherError::IndexOutOfRange {
                x: rows.saturating_sub(1),
                y: cols.saturating_sub(1),
                size: self.size(),
            });
        }
        Ok(())
    }

    /// Write one in-bounds perturbation and settle the consequences.
    fn pulse<R: Rng + ?Sized>(
        &mut self,
        x: usize,
        y: usize,
        amplitude: f64,
        modifier: f64,
        rng: &mut R,
    ) -> f64 {
        let delta = self.write(x, y, amplitude, modifier);
        self.settle(delta, rng);
        delta
    }

    fn write(&mut self, x: usize, y: usize, amplitude: f64, modifier: f64) -> f64 {
        let mut delta = amplitude * modifier * self.sextet.permeability;
        if amplitude.abs() > HIGH_AMPLITUDE {
            delta *= 1.0 / (self.sextet.dielectricity + EPSILON);
        }
        self.grid[[x, y]] += delta;
        self.energy += delta.abs() * self.sextet.permittivity;
        self.remember(delta);
        delta
    }

    fn remember(&mut self, delta: f64) {
        if self.memory.is_full() {
            self.memory.pop_front();
        }
        // Capacity was just ensured.
        let _ = self.memory.push_back(delta);
    }

    /// Recompute after a mutation, then drain any cascade follow-ups.
    fn settle<R: Rng + ?Sized>(&mut self, change: f64, rng: &mut R) {
        let mut queue = VecDeque::new();
        self.recompute(change, rng, &mut queue);

        let mut drained = 0usize;
        while let Some(next) = queue.pop_front() {
            if drained >= self.physics.cascade_limit {
                log::warn!(
                    "entropic cascade hit limit {}; dropping {} follow-ups",
                    self.physics.cascade_limit,
                    queue.len() + 1
                );
                break;
            }
            drained += 1;
            let delta = self.write(next.x, next.y, next.amplitude, 1.0);
            self.recompute(delta, rng, &mut queue);
        }
    }

    fn recompute<R: Rng + ?Sized>(
        &mut self,
        change: f64,
        rng: &mut R,
        queue: &mut VecDeque<Pending>,
    ) {
        let stats = GridStats::of(&self.grid);
        let s = &mut self.sextet;
        s.capacitance = self.energy;
        s.resistance = stats.variance * (1.0 + s.capacitance / 100.0);
        s.magnetism = stats.mean_abs;
        s.permeability = 1.0 / (1.0 + s.magnetism);
        s.dielectricity = (1.0 / (1.0 + change.abs() + EPSILON)).max(DIELECTRIC_FLOOR);
        s.permittivity = 1.0 - s.dielectricity;

        if self.anomaly == Some(Anomaly::EntropicCascade) {
            s.resistance *= CASCADE_DECAY;
            if rng.gen_bool(CASCADE_PROBABILITY) {
                let u: f64 = rng.gen_range(-1.0..=1.0);
                let amplitude = 0.75 * (1.0 - u * u);
                let (x, y) = self.random_cell(rng);
                queue.push_back(Pending { x, y, amplitude });
            }
        }

        self.energy = stats.sum_abs / (self.sextet.resistance + EPSILON);
        if !self.memory.is_empty() {
            self.identity_wave =
                (self.energy / self.memory.len() as f64) * self.sextet.dielectricity;
        }

        if let Some(arch) = self.architecture {
            arch.profile().after_update(&mut self.sextet, change);
        }
    }
}

/// Whole-grid statistics used by the recompute.
struct GridStats {
    sum_abs: f64,
    mean_abs: f64,
    variance: f64,
}

impl GridStats {
    fn of(grid: &Grid) -> Self {
        let n = grid.len().max(1) as f64;
        let sum_abs: f64 = grid.iter().map(|v| v.abs()).sum();
        let mean = grid.iter().sum::<f64>() / n;
        let variance = grid.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        Self {
            sum_abs,
            mean_abs: sum_abs / n,
            variance,
        }
    }
}
