//! A scripted AetherOS session.
//!
//! Creates a plain materia and an Intellectus, perturbs them, splits the
//! Intellectus dialectically, consults a scripted oracle, and redeems
//! everything back into genesis.
//!
//! ```text
//! cargo run --example genesis
//! ```

use aether_core::{AetherConfig, Contextus, ScriptedOracle};

const SCRIPT: &[&str] = &[
    "OSTENDO",
    "CREO 'LUX'",
    "PERTURBOO 10 20 30",
    "PERTURBOABAM 'fiat lux'",
    "INSTAURO 'ADAM' MODO 'OBJECT'",
    "PERTURBOE 3 1 4 1 5 9",
    "CONVERGO",
    "DIALECTICA 'ADAM' IN 'THESIS' ET 'ANTITHESIS'",
    "INTERROGO 'LUX'",
    "DOCEO 'THESIS' CUM 'LUX'",
    "ANOMALIA",
    "PERTURBO",
    "MIRACULUM",
    "VERITAS",
    "TOGGEO",
    "REDIMO",
    "OSTENDO 'GENESIS'",
];

fn main() {
    env_logger::init();

    let oracle = ScriptedOracle::new(["LUX IN TENEBRIS LUCET"]);
    let mut ctx = match Contextus::new(AetherConfig::seeded(1618)) {
        Ok(ctx) => ctx.with_oracle(oracle),
        Err(e) => {
            eprintln!("boot failed: {e}");
            return;
        }
    };

    for command in SCRIPT {
        println!("aetheros({})> {command}", ctx.focus().unwrap_or("?"));
        match ctx.execute(command) {
            Ok(outcome) => println!("< {outcome}"),
            Err(e) => println!("< ERRORUM: {e}"),
        }
    }
    println!("< VALE.");
}
