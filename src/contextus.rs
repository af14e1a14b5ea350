/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! The session: materia registry, focus, RNG, and the verb dispatcher.
//!
//! ```text
//! raw text ─▶ parse ─▶ modifier ─▶ handler ─▶ FluxCore ops ─▶ Outcome
//! ```
//!
//! # Invariants
//!
//! - **CX-001**: the genesis materia always exists between commands. A command
//!   that finds it missing recreates it first.
//! - **CX-002**: a stale focus falls back to genesis.
//! - **CX-003**: every random draw comes from the session RNG, so a fixed seed
//!   and a fixed command sequence reproduce the same state.
//! - **CX-004**: registry iteration that affects state runs in sorted name order.

use std::fs::File;
use std::io::{BufReader, Read};

use hashbrown::HashMap;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::AetherConfig;
use crate::error::{AetherError, AetherResult};
use crate::flux::{Annotation, Anomaly, FluxCore, Grid, Physics};
use crate::inflection::InflectionTable;
use crate::lockers::lockers;
use crate::oracle::{OfflineOracle, Oracle, DEFAULT_MODEL};
use crate::outcome::{Outcome, Role};
use crate::parser::{self, Command, Verb};
use crate::sensor::SextetSensor;
use crate::sextet::Architecture;
use crate::triad::{bytes_to_amp, text_to_amp, triad, triads};

/// Golden ratio. Genesis is born from a φ-amplitude pulse at its centre.
pub const PHI: f64 = 1.618_033_988_749_895;

/// φ³. Genesis identity after a redemption.
pub const PHI_CUBED: f64 = PHI * PHI * PHI;

/// Name given by a bare `CREO`.
pub const ANONYMOUS: &str = "ANONYMOUS";

/// Locker count used by a bare `TOGGEO` or one with a non-integer count.
pub const DEFAULT_LOCKERS: usize = 100;

/// `EXERCEO` reads its stream in chunks of this many bytes.
pub const STREAM_CHUNK: usize = 256;

const DEFAULT_ANOMALY: &str = "ENTROPIC_CASCADE";

const ORACLE_PREAMBLE: &str = "Synthesize insight from the following context: ";

/// A running AetherOS session.
pub struct Contextus {
    materiae: HashMap<String, FluxCore>,
    focus: Option<String>,
    config: AetherConfig,
    rng: StdRng,
    inflections: InflectionTable,
    oracle: Box<dyn Oracle>,
    sensor: Option<Box<dyn SextetSensor>>,
}

impl Contextus {
    /// Validate `config`, seed the RNG, and boot genesis.
    pub fn new(config: AetherConfig) -> AetherResult<Self> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let inflections = InflectionTable::new(&mut rng);
        let mut ctx = Self {
            materiae: HashMap::new(),
            focus: None,
            config,
            rng,
            inflections,
            oracle: Box::new(OfflineOracle),
            sensor: None,
        };
        ctx.ensure_genesis()?;
        ctx.focus = Some(ctx.config.genesis_name.clone());
        info!(
            "boot complete: genesis '{}' on {}x{} grid",
            ctx.config.genesis_name, ctx.config.grid_size, ctx.config.grid_size
        );
        Ok(ctx)
    }

    /// Replace the oracle.
    pub fn with_oracle(mut self, oracle: impl Oracle + 'static) -> Self {
        self.oracle = Box::new(oracle);
        self
    }

    /// Attach a sensor. Grounds the focus before `PERTURBO`, `CONVERGO`, `MIRACULUM`.
    pub fn attach_sensor(&mut self, sensor: impl SextetSensor + 'static) {
        self.sensor = Some(Box::new(sensor));
    }

    /// Detach the sensor, if any.
    pub fn detach_sensor(&mut self) {
        self.sensor = None;
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    /// Session configuration.
    pub fn config(&self) -> &AetherConfig {
        &self.config
    }

    /// Name of the genesis materia.
    pub fn genesis_name(&self) -> &str {
        &self.config.genesis_name
    }

    /// Current focus as stored. May be stale until the next command heals it.
    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    /// Look up a materia.
    pub fn materia(&self, name: &str) -> Option<&FluxCore> {
        self.materiae.get(name)
    }

    /// Look up a materia mutably.
    pub fn materia_mut(&mut self, name: &str) -> Option<&mut FluxCore> {
        self.materiae.get_mut(name)
    }

    /// A materia together with the session RNG, for operations that draw.
    pub fn materia_with_rng(&mut self, name: &str) -> Option<(&mut FluxCore, &mut StdRng)> {
        let core = self.materiae.get_mut(name)?;
        Some((core, &mut self.rng))
    }

    /// The session RNG.
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.materiae.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered materiae.
    pub fn len(&self) -> usize {
        self.materiae.len()
    }

    /// `true` when the registry is empty. Never the case between commands.
    pub fn is_empty(&self) -> bool {
        self.materiae.is_empty()
    }

    // ── Dispatch ───────────────────────────────────────────────────────────

    /// Parse and run one command.
    ///
    /// Malformed input and the self-referential truth guard are errors.
    /// An unknown verb and every domain failure come back as an [`Outcome`].
    pub fn execute(&mut self, raw: &str) -> AetherResult<Outcome> {
        let cmd = match parser::parse(raw, self.config.verb_match) {
            Ok(cmd) => cmd,
            Err(AetherError::UnknownVerb(token)) => return Ok(Outcome::UnknownVerb { token }),
            Err(e) => return Err(e),
        };
        let modifier = self.inflections.modifier_for(&cmd.inflection);
        debug!("dispatch {} (modifier {modifier:.3})", cmd.token());

        match cmd.verb {
            Verb::Creo => self.creo(&cmd),
            Verb::Instauro => self.instauro(&cmd),
            Verb::Focus => self.set_focus(&cmd),
            Verb::Ostendo => self.ostendo(&cmd),
            Verb::Perturbo => self.perturbo(&cmd, modifier),
            Verb::Convergo => self.convergo(&cmd),
            Verb::Anomalia => self.anomalia(&cmd),
            Verb::Veritas => self.veritas(&cmd),
            Verb::Miraculum => self.miraculum(modifier),
            Verb::Redimo => {
                let targets = (!cmd.literal_args.is_empty()).then(|| cmd.literal_args.clone());
                self.redeem(targets, modifier)
            }
            Verb::Dialectica => self.dialectica(&cmd),
            Verb::Interrogo => self.interrogo(&cmd),
            Verb::Doceo => self.doceo(&cmd),
            Verb::Discere => self.discere(&cmd),
            Verb::Exerceo => self.exerceo(&cmd),
            Verb::Toggeo => self.toggeo(&cmd),
        }
    }

    // ── Registry ───────────────────────────────────────────────────────────

    fn physics(&self) -> Physics {
        Physics::from(&self.config)
    }

    /// Recreate genesis if it is missing: φ pulse at the centre, then converge.
    fn ensure_genesis(&mut self) -> AetherResult<()> {
        if self.materiae.contains_key(&self.config.genesis_name) {
            return Ok(());
        }
        if !self.materiae.is_empty() {
            warn!("genesis '{}' missing; recreating", self.config.genesis_name);
        }
        let size = self.config.grid_size;
        let mut genesis = FluxCore::new(size, self.physics());
        genesis.perturb(size / 2, size / 2, PHI, 1.0, &mut self.rng)?;
        genesis.create(&mut self.rng);
        self.materiae.insert(self.config.genesis_name.clone(), genesis);
        Ok(())
    }

    /// Heal the focus and return its name.
    fn heal_focus(&mut self) -> AetherResult<String> {
        self.ensure_genesis()?;
        if let Some(name) = &self.focus {
            if self.materiae.contains_key(name) {
                return Ok(name.clone());
            }
            warn!("focus '{name}' is gone; falling back to genesis");
        }
        let genesis = self.config.genesis_name.clone();
        self.focus = Some(genesis.clone());
        Ok(genesis)
    }

    /// The focused materia with the session RNG, optionally grounded by the sensor.
    fn focused(&mut self, ground: bool) -> AetherResult<(String, &mut FluxCore, &mut StdRng)> {
        let name = self.heal_focus()?;
        let (size, physics) = (self.config.grid_size, self.physics());
        let core = self
            .materiae
            .entry(name.clone())
            .or_insert_with(|| FluxCore::new(size, physics));
        let rng = &mut self.rng;
        if ground {
            if let Some(sensor) = self.sensor.as_mut() {
                let reading = sensor.sextet();
                if let Some(observed) = sensor.visual_grid() {
                    if let Err(e) = core.apply_ground_truth(&observed, rng) {
                        warn!("sensor grid rejected for '{name}': {e}");
                    }
                }
                // The observed grid recomputes the sextet; the reading wins.
                core.ground(&reading);
            }
        }
        Ok((name, core, rng))
    }

    fn insert_and_focus(&mut self, name: &str, core: FluxCore) {
        self.materiae.insert(name.to_string(), core);
        self.focus = Some(name.to_string());
    }

    // ── Handlers ───────────────────────────────────────────────────────────

    fn creo(&mut self, cmd: &Command) -> AetherResult<Outcome> {
        let name = cmd.first_literal().unwrap_or(ANONYMOUS).to_string();
        if self.materiae.contains_key(&name) {
            return Ok(Outcome::AlreadyExists { name });
        }
        let core = FluxCore::new(self.config.grid_size, self.physics());
        self.insert_and_focus(&name, core);
        info!("created materia '{name}'");
        Ok(Outcome::Created { name })
    }

    fn instauro(&mut self, cmd: &Command) -> AetherResult<Outcome> {
        let Some(name) = cmd.first_literal().map(str::to_string) else {
            return Ok(missing(Verb::Instauro, "NOMEN"));
        };
        if self.materiae.contains_key(&name) {
            return Ok(Outcome::AlreadyExists { name });
        }
        let requested = cmd
            .keyword_literal("MODO")
            .unwrap_or_else(|| Architecture::Transformer.name().to_string());
        let architecture = match requested.parse::<Architecture>() {
            Ok(arch) => arch,
            Err(name) => return Ok(Outcome::UnknownArchitecture { name }),
        };
        let core = FluxCore::intellectus(self.config.grid_size, architecture, self.physics());
        self.insert_and_focus(&name, core);
        info!("instantiated intellectus '{name}' ({architecture})");
        Ok(Outcome::Instantiated { name, architecture })
    }

    fn set_focus(&mut self, cmd: &Command) -> AetherResult<Outcome> {
        let Some(name) = cmd.first_literal().map(str::to_string) else {
            return Ok(missing(Verb::Focus, "NOMEN"));
        };
        if !self.materiae.contains_key(&name) {
            return Ok(Outcome::NotFound {
                role: Role::Materia,
                name,
            });
        }
        self.focus = Some(name.clone());
        Ok(Outcome::Focused { name })
    }

    fn ostendo(&mut self, cmd: &Command) -> AetherResult<Outcome> {
        let name = match cmd.first_literal() {
            Some(name) => name.to_string(),
            None => self.heal_focus()?,
        };
        match self.materiae.get(&name) {
            Some(core) => Ok(Outcome::Report(core.report())),
            None => Ok(Outcome::NotFound {
                role: Role::Materia,
                name,
            }),
        }
    }

    fn perturbo(&mut self, cmd: &Command, modifier: f64) -> AetherResult<Outcome> {
        // Triads are reduced before any mutation so a strict-policy
        // rejection leaves the grid untouched.
        let triads = triads(&cmd.numeric_args, modifier, self.config.triad_policy)?;

        let (_, core, rng) = self.focused(true)?;
        core.destruct(rng);
        if let Some(literal) = cmd.first_literal() {
            core.embed_text("oracle_prompt", literal);
            core.perturb_random(text_to_amp(literal), modifier, rng);
        } else if !triads.is_empty() {
            for value in triads {
                core.perturb_random(value, 1.0, rng);
            }
        } else {
            core.perturb_random(1.0, modifier, rng);
        }
        core.create(rng);
        Ok(coherent(cmd, core))
    }

    fn convergo(&mut self, cmd: &Command) -> AetherResult<Outcome> {
        let (_, core, rng) = self.focused(true)?;
        core.destruct(rng);
        core.create(rng);
        Ok(coherent(cmd, core))
    }

    fn anomalia(&mut self, cmd: &Command) -> AetherResult<Outcome> {
        let name = cmd.first_literal().unwrap_or(DEFAULT_ANOMALY).to_string();
        let (focus, core, _) = self.focused(false)?;
        core.set_anomaly(Some(Anomaly::from_name(&name)));
        info!("anomaly '{name}' induced on '{focus}'");
        Ok(Outcome::AnomalyInduced { name })
    }

    fn veritas(&mut self, cmd: &Command) -> AetherResult<Outcome> {
        if cmd
            .literal_args
            .iter()
            .any(|l| l == Verb::Veritas.root())
        {
            return Err(AetherError::SelfReferentialTruth);
        }
        self.ensure_genesis()?;
        if self.materiae.len() < 2 {
            return Ok(Outcome::TruthNeedsPlurality);
        }

        let size = self.config.grid_size;
        let count = self.materiae.len() as f64;
        let mut avg_grid = Grid::zeros((size, size));
        let mut avg_energy = 0.0;
        for name in self.names() {
            if let Some(core) = self.materiae.get(&name) {
                if core.grid().dim() == avg_grid.dim() {
                    avg_grid += core.grid();
                }
                avg_energy += core.energy();
            }
        }
        avg_grid /= count;
        avg_energy /= count;

        let genesis_name = self.config.genesis_name.clone();
        if let Some((genesis, rng)) = self.materia_with_rng(&genesis_name) {
            genesis.add_grid(&avg_grid)?;
            genesis.perturb(0, 0, avg_energy, 1.0, rng)?;
        }
        info!("truth synthesised into genesis from {count} materiae");
        Ok(Outcome::TruthSynthesized)
    }

    fn miraculum(&mut self, modifier: f64) -> AetherResult<Outcome> {
        let (_, core, rng) = self.focused(true)?;
        core.miracle(modifier, rng);
        Ok(Outcome::Miracle {
            identity: core.identity_wave(),
        })
    }

    /// Fold `targets` (or every non-genesis materia) into genesis.
    ///
    /// Each absorbed materia leaves an `echo_NAME` annotation on genesis and
    /// is removed. Genesis is then pulsed at its centre with
    /// `triad([E, redeemed E, C]) × modifier`, its identity set to φ³, and
    /// its energy floored at pre-merge energy plus redeemed energy.
    pub fn redeem(&mut self, targets: Option<Vec<String>>, modifier: f64) -> AetherResult<Outcome> {
        self.ensure_genesis()?;
        let genesis_name = self.config.genesis_name.clone();
        let targets = match targets {
            Some(names) => names,
            None => self
                .names()
                .into_iter()
                .filter(|n| *n != genesis_name)
                .collect(),
        };

        let Some(mut genesis) = self.materiae.remove(&genesis_name) else {
            return Ok(Outcome::NotFound {
                role: Role::Materia,
                name: genesis_name,
            });
        };
        let pre_energy = genesis.energy();
        let mut redeemed_energy = 0.0;
        let mut absorbed = Vec::new();
        for name in targets {
            if name == genesis_name {
                continue;
            }
            let Some(core) = self.materiae.remove(&name) else {
                continue;
            };
            redeemed_energy += core.energy();
            genesis.absorb(&core);
            genesis.embed(format!("echo_{name}"), Annotation::Echo(core.echo()));
            info!("redeemed '{name}' into genesis");
            absorbed.push(name);
        }

        let synthesis = triad(
            &[genesis.energy(), redeemed_energy, genesis.sextet.capacitance],
            modifier,
            self.config.triad_policy,
        )?;
        let centre = genesis.size() / 2;
        let pulse = genesis.perturb(centre, centre, synthesis, 1.0, &mut self.rng);
        genesis.set_identity_wave(PHI_CUBED);
        genesis.floor_energy(pre_energy + redeemed_energy);
        let identity = genesis.identity_wave();
        self.materiae.insert(genesis_name, genesis);
        pulse?;

        Ok(Outcome::Redeemed { absorbed, identity })
    }

    fn dialectica(&mut self, cmd: &Command) -> AetherResult<Outcome> {
        let [source, thesis, antithesis] = match cmd.literal_args.as_slice() {
            [s, a, b, ..] => [s.clone(), a.clone(), b.clone()],
            _ => return Ok(missing(Verb::Dialectica, "TRIA NOMINA")),
        };
        if thesis == antithesis {
            return Ok(missing(Verb::Dialectica, "DUO NOMINA DIVERSA"));
        }
        let Some(core) = self.materiae.get(&source) else {
            return Ok(Outcome::NotFound {
                role: Role::Source,
                name: source,
            });
        };
        if core.architecture().is_none() {
            return Ok(Outcome::DialecticNeedsIntellectus);
        }
        for name in [&thesis, &antithesis] {
            if *name != source && self.materiae.contains_key(name) {
                return Ok(Outcome::AlreadyExists { name: name.clone() });
            }
        }

        let Some(core) = self.materiae.remove(&source) else {
            return Ok(Outcome::NotFound {
                role: Role::Source,
                name: source,
            });
        };
        let (mut a, mut b) = core.split();
        a.embed_text("inter_echo", antithesis.clone());
        b.embed_text("inter_echo", thesis.clone());
        self.materiae.insert(antithesis.clone(), b);
        self.insert_and_focus(&thesis, a);
        info!("dialectic split '{source}' into '{thesis}' and '{antithesis}'");
        Ok(Outcome::DialecticComplete {
            source,
            thesis,
            antithesis,
        })
    }

    fn interrogo(&mut self, cmd: &Command) -> AetherResult<Outcome> {
        let Some(name) = cmd.first_literal().map(str::to_string) else {
            return Ok(missing(Verb::Interrogo, "NOMEN"));
        };
        let Some(core) = self.materiae.get(&name) else {
            return Ok(Outcome::NotFound {
                role: Role::Materia,
                name,
            });
        };
        let prompt = match core.annotation("oracle_prompt").and_then(Annotation::as_text) {
            Some(text) => text.to_string(),
            None => format!("{ORACLE_PREAMBLE}{}", core.render_annotations()),
        };
        let model = cmd
            .raw_keyword_literal("ORACULO")
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let reply = match self.oracle.query(&model, &prompt) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("oracle '{model}' failed: {e}");
                format!("ORACULUM ERRORUM: {e}")
            }
        };

        if let Some((core, rng)) = self.materia_with_rng(&name) {
            let amplitude = text_to_amp(&reply) * core.sextet.permittivity;
            core.perturb_random(amplitude, 1.0, rng);
            core.embed_text("ORACULUM_RESPONSUM", reply.clone());
        }
        Ok(Outcome::OracleAnswered { name, reply })
    }

    fn doceo(&mut self, cmd: &Command) -> AetherResult<Outcome> {
        let Some(target) = cmd.first_literal().map(str::to_string) else {
            return Ok(missing(Verb::Doceo, "SCOPUM"));
        };
        let Some(source) = cmd.keyword_literal("CUM") else {
            return Ok(missing(Verb::Doceo, "FONTEM CUM 'CUM'"));
        };
        if !self.materiae.contains_key(&target) {
            return Ok(Outcome::NotFound {
                role: Role::Target,
                name: target,
            });
        }
        let Some(wisdom) = self.materiae.get(&source).map(FluxCore::render_annotations) else {
            return Ok(Outcome::NotFound {
                role: Role::Source,
                name: source,
            });
        };
        if let Some((core, rng)) = self.materia_with_rng(&target) {
            teach(core, rng, &source, wisdom);
        }
        Ok(Outcome::WisdomIntegrated { source, target })
    }

    fn discere(&mut self, cmd: &Command) -> AetherResult<Outcome> {
        let Some(source) = cmd.keyword_literal("EX") else {
            return Ok(missing(Verb::Discere, "FONTEM CUM 'EX'"));
        };
        let Some(wisdom) = self.materiae.get(&source).map(FluxCore::render_annotations) else {
            return Ok(Outcome::NotFound {
                role: Role::Source,
                name: source,
            });
        };
        let (target, core, rng) = self.focused(false)?;
        teach(core, rng, &source, wisdom);
        Ok(Outcome::WisdomIntegrated { source, target })
    }

    fn exerceo(&mut self, cmd: &Command) -> AetherResult<Outcome> {
        let Some(name) = cmd.first_literal().map(str::to_string) else {
            return Ok(missing(Verb::Exerceo, "NOMEN"));
        };
        let Some(path) = cmd.raw_keyword_literal("FLUMINE") else {
            return Ok(Outcome::StreamRequired);
        };
        let Some((core, rng)) = self.materia_with_rng(&name) else {
            return Ok(Outcome::NotFound {
                role: Role::Materia,
                name,
            });
        };

        let unreadable = |e: std::io::Error| Outcome::StreamUnreadable {
            path: path.clone(),
            reason: e.to_string(),
        };
        let mut reader = match File::open(&path) {
            Ok(file) => BufReader::new(file),
            Err(e) => return Ok(unreadable(e)),
        };

        info!("training '{name}' on '{path}'");
        let mut buf = [0u8; STREAM_CHUNK];
        let mut chunks = 0usize;
        loop {
            let n = match read_chunk(&mut reader, &mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => return Ok(unreadable(e)),
            };
            core.perturb_random(bytes_to_amp(&buf[..n]), 1.0, rng);
            core.converge(rng);
            chunks += 1;
        }
        info!("training '{name}' complete: {chunks} chunks");
        Ok(Outcome::Trained { name, chunks })
    }

    fn toggeo(&mut self, cmd: &Command) -> AetherResult<Outcome> {
        let requested = cmd
            .numeric_args
            .first()
            .filter(|n| **n >= 0.0 && n.fract() == 0.0)
            .map(|n| *n as usize)
            .unwrap_or(DEFAULT_LOCKERS);
        if requested > self.config.max_lockers {
            return Ok(Outcome::TooManyLockers {
                requested,
                limit: self.config.max_lockers,
            });
        }
        let (open, positions) = lockers(requested);
        Ok(Outcome::Lockers {
            token: cmd.token(),
            open,
            positions,
        })
    }
}

impl core::fmt::Debug for Contextus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Contextus")
            .field("materiae", &self.names())
            .field("focus", &self.focus)
            .field("config", &self.config)
            .field("sensor", &self.sensor.is_some())
            .finish()
    }
}

fn missing(verb: Verb, expected: &'static str) -> Outcome {
    Outcome::MissingArgument { verb, expected }
}

fn coherent(cmd: &Command, core: &FluxCore) -> Outcome {
    Outcome::Coherent {
        token: cmd.token(),
        energy: core.energy(),
        identity: core.identity_wave(),
    }
}

/// Pulse `core` with the amplitude of `wisdom` and record where it came from.
fn teach(core: &mut FluxCore, rng: &mut StdRng, source: &str, wisdom: String) {
    core.perturb_random(text_to_amp(&wisdom), 1.0, rng);
    core.embed_text(format!("SAPIENTIA_EX_{source}"), wisdom);
}

/// Fill `buf` as far as the stream allows. Returns 0 only at end of stream.
fn read_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::ScriptedOracle;

    fn session() -> Contextus {
        Contextus::new(AetherConfig::seeded(42)).unwrap()
    }

    fn run(ctx: &mut Contextus, raw: &str) -> Outcome {
        ctx.execute(raw).unwrap()
    }

    #[test]
    fn test_boot_creates_and_focuses_genesis() {
        let ctx = session();
        assert_eq!(ctx.names(), vec!["GENESIS"]);
        assert_eq!(ctx.focus(), Some("GENESIS"));
        let genesis = ctx.materia("GENESIS").unwrap();
        assert_eq!(genesis.memory_len(), 1);
        assert!(genesis.energy() >= 0.0);
    }

    #[test]
    fn test_creo_defaults_and_duplicates() {
        let mut ctx = session();
        assert_eq!(
            run(&mut ctx, "CREO"),
            Outcome::Created {
                name: ANONYMOUS.into()
            }
        );
        assert_eq!(
            run(&mut ctx, "CREO 'anonymous'"),
            Outcome::AlreadyExists {
                name: ANONYMOUS.into()
            }
        );
        assert_eq!(ctx.focus(), Some(ANONYMOUS));
    }

    #[test]
    fn test_focus_requires_existing_name() {
        let mut ctx = session();
        assert_eq!(
            run(&mut ctx, "FOCUS 'NOX'"),
            Outcome::NotFound {
                role: Role::Materia,
                name: "NOX".into()
            }
        );
        assert!(matches!(
            run(&mut ctx, "FOCUS"),
            Outcome::MissingArgument {
                verb: Verb::Focus,
                ..
            }
        ));
        assert_eq!(ctx.focus(), Some("GENESIS"));
    }

    #[test]
    fn test_instauro_architectures() {
        let mut ctx = session();
        assert_eq!(
            run(&mut ctx, "INSTAURO 'ADAM'"),
            Outcome::Instantiated {
                name: "ADAM".into(),
                architecture: Architecture::Transformer
            }
        );
        assert_eq!(
            run(&mut ctx, "INSTAURO 'EVA' MODO 'functional'"),
            Outcome::Instantiated {
                name: "EVA".into(),
                architecture: Architecture::Functional
            }
        );
        assert_eq!(
            run(&mut ctx, "INSTAURO 'LILITH' MODO 'LISP'"),
            Outcome::UnknownArchitecture {
                name: "LISP".into()
            }
        );
        assert_eq!(ctx.materia("EVA").unwrap().sextet.permeability, 1.5);
    }

    #[test]
    fn test_perturbo_literal_sets_oracle_prompt() {
        let mut ctx = session();
        run(&mut ctx, "CREO 'LUX'");
        let out = run(&mut ctx, "PERTURBOABAM 'fiat'");
        assert!(matches!(out, Outcome::Coherent { ref token, .. } if token == "PERTURBOABAM"));
        let core = ctx.materia("LUX").unwrap();
        assert_eq!(
            core.annotation("oracle_prompt").and_then(Annotation::as_text),
            Some("FIAT")
        );
        // destruct + literal pulse
        assert_eq!(core.memory_len(), 2);
    }

    #[test]
    fn test_perturbo_numeric_one_pulse_per_triad() {
        let mut ctx = session();
        run(&mut ctx, "CREO 'LUX'");
        run(&mut ctx, "PERTURBO 1 2 3 4 5");
        // destruct + two triads
        assert_eq!(ctx.materia("LUX").unwrap().memory_len(), 3);
    }

    #[test]
    fn test_strict_triad_rejects_short_chunk_before_mutating() {
        let config = AetherConfig {
            triad_policy: crate::config::TriadPolicy::Strict,
            ..AetherConfig::seeded(1)
        };
        let mut ctx = Contextus::new(config).unwrap();
        run(&mut ctx, "CREO 'LUX'");
        let err = ctx.execute("PERTURBO 1 2 3 4").unwrap_err();
        assert_eq!(err, AetherError::InsufficientArguments { needed: 3, got: 1 });
        assert_eq!(ctx.materia("LUX").unwrap().memory_len(), 0);
    }

    #[test]
    fn test_stale_focus_heals_to_genesis() {
        let mut ctx = session();
        run(&mut ctx, "CREO 'LUX'");
        run(&mut ctx, "REDIMO 'LUX'");
        assert_eq!(ctx.focus(), Some("LUX"));
        let out = run(&mut ctx, "CONVERGO");
        assert!(matches!(out, Outcome::Coherent { .. }));
        assert_eq!(ctx.focus(), Some("GENESIS"));
    }

    #[test]
    fn test_anomalia_defaults_to_cascade() {
        let mut ctx = session();
        assert_eq!(
            run(&mut ctx, "ANOMALIA"),
            Outcome::AnomalyInduced {
                name: DEFAULT_ANOMALY.into()
            }
        );
        assert_eq!(
            ctx.materia("GENESIS").unwrap().anomaly(),
            Some(&Anomaly::EntropicCascade)
        );
    }

    #[test]
    fn test_veritas_guard_and_plurality() {
        let mut ctx = session();
        assert_eq!(
            ctx.execute("VERITAS 'veritas'").unwrap_err(),
            AetherError::SelfReferentialTruth
        );
        assert_eq!(run(&mut ctx, "VERITAS"), Outcome::TruthNeedsPlurality);
        run(&mut ctx, "CREO 'LUX'");
        let before = ctx.materia("GENESIS").unwrap().memory_len();
        assert_eq!(run(&mut ctx, "VERITAS"), Outcome::TruthSynthesized);
        assert_eq!(ctx.materia("GENESIS").unwrap().memory_len(), before + 1);
    }

    #[test]
    fn test_redeem_all_removes_sources() {
        let mut ctx = session();
        run(&mut ctx, "CREO 'A'");
        run(&mut ctx, "CREO 'B'");
        let out = run(&mut ctx, "REDIMO");
        match out {
            Outcome::Redeemed { absorbed, identity } => {
                assert_eq!(absorbed, vec!["A", "B"]);
                assert!((identity - PHI_CUBED).abs() < 1e-12);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(ctx.names(), vec!["GENESIS"]);
        let genesis = ctx.materia("GENESIS").unwrap();
        assert!(genesis.annotation("echo_A").is_some());
        assert!(genesis.annotation("echo_B").is_some());
    }

    #[test]
    fn test_dialectica_requires_intellectus() {
        let mut ctx = session();
        run(&mut ctx, "CREO 'PLAIN'");
        assert_eq!(
            run(&mut ctx, "DIALECTICA 'PLAIN' IN 'A' ET 'B'"),
            Outcome::DialecticNeedsIntellectus
        );
        assert_eq!(
            run(&mut ctx, "DIALECTICA 'NOX' IN 'A' ET 'B'"),
            Outcome::NotFound {
                role: Role::Source,
                name: "NOX".into()
            }
        );
        assert!(matches!(
            run(&mut ctx, "DIALECTICA 'PLAIN'"),
            Outcome::MissingArgument { .. }
        ));
    }

    #[test]
    fn test_dialectica_refuses_identical_halves() {
        let mut ctx = session();
        run(&mut ctx, "INSTAURO 'ADAM'");
        assert_eq!(
            run(&mut ctx, "DIALECTICA 'ADAM' IN 'X' ET 'X'").to_string(),
            "DIALECTICA REQUIRET DUO NOMINA DIVERSA"
        );
        assert_eq!(ctx.names(), vec!["ADAM", "GENESIS"]);
        assert_eq!(ctx.focus(), Some("ADAM"));
    }

    #[test]
    fn test_interrogo_with_scripted_oracle() {
        let mut ctx = session().with_oracle(ScriptedOracle::new(["FIAT LUX"]));
        run(&mut ctx, "CREO 'LUX'");
        run(&mut ctx, "PERTURBO 'lumen'");
        let out = run(&mut ctx, "INTERROGO 'LUX'");
        assert_eq!(
            out,
            Outcome::OracleAnswered {
                name: "LUX".into(),
                reply: "FIAT LUX".into()
            }
        );
        let core = ctx.materia("LUX").unwrap();
        assert_eq!(
            core.annotation("ORACULUM_RESPONSUM").and_then(Annotation::as_text),
            Some("FIAT LUX")
        );
    }

    #[test]
    fn test_interrogo_offline_reports_error_text() {
        let mut ctx = session();
        match run(&mut ctx, "INTERROGO 'GENESIS'") {
            Outcome::OracleAnswered { reply, .. } => {
                assert!(reply.starts_with("ORACULUM ERRORUM:"), "{reply}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_exerceo_missing_stream_and_file() {
        let mut ctx = session();
        assert_eq!(run(&mut ctx, "EXERCEO 'GENESIS'"), Outcome::StreamRequired);
        assert!(matches!(
            run(&mut ctx, "EXERCEO 'GENESIS' FLUMINE '/nonexistent/aether.bin'"),
            Outcome::StreamUnreadable { .. }
        ));
    }

    #[test]
    fn test_toggeo_default_and_limit() {
        let mut ctx = session();
        match run(&mut ctx, "TOGGEO") {
            Outcome::Lockers { open, positions, .. } => {
                assert_eq!(open, 10);
                assert_eq!(positions.last(), Some(&100));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(run(&mut ctx, "TOGGEOE 16").to_string(), "TOGGEOE 4 APERTOS");
        assert!(matches!(
            run(&mut ctx, "TOGGEO 2000000"),
            Outcome::TooManyLockers { .. }
        ));
    }

    #[test]
    fn test_toggeo_non_integer_counts_fall_back() {
        let mut ctx = session();
        for raw in ["TOGGEO 2.9", "TOGGEO -4"] {
            match run(&mut ctx, raw) {
                Outcome::Lockers { open, positions, .. } => {
                    assert_eq!(open, 10, "{raw}");
                    assert_eq!(positions.last(), Some(&100), "{raw}");
                }
                other => panic!("{raw}: unexpected {other:?}"),
            }
        }
        assert_eq!(run(&mut ctx, "TOGGEO 9.0").to_string(), "TOGGEO 3 APERTOS");
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        let mut ctx = session();
        assert_eq!(ctx.execute("   ").unwrap_err(), AetherError::EmptyCommand);
        assert!(matches!(
            ctx.execute("42"),
            Err(AetherError::MalformedCommand(_))
        ));
        assert_eq!(
            run(&mut ctx, "DELEO"),
            Outcome::UnknownVerb {
                token: "DELEO".into()
            }
        );
    }
}
