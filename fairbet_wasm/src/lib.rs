//! Browser bindings for the fairness verifier. Inputs and outputs are JSON strings
//! shaped like the HTTP API (`SeedBundle`, `GameDescriptor`, `Outcome`).

use fairbet_core::{server_seed_hash, verify, GameDescriptor, Outcome, SeedBundle};
use wasm_bindgen::prelude::*;

fn verify_json(seed_json: &str, game_json: &str) -> Result<String, String> {
    let seed: SeedBundle = serde_json::from_str(seed_json).map_err(|e| format!("seed: {e}"))?;
    let game: GameDescriptor =
        serde_json::from_str(game_json).map_err(|e| format!("game: {e}"))?;
    let outcome = verify(&seed, &game).map_err(|e| e.to_string())?;
    serde_json::to_string(&outcome).map_err(|e| e.to_string())
}

fn matches_json(seed_json: &str, game_json: &str, reported_json: &str) -> Result<bool, String> {
    let computed: Outcome =
        serde_json::from_str(&verify_json(seed_json, game_json)?).map_err(|e| e.to_string())?;
    let reported: Outcome =
        serde_json::from_str(reported_json).map_err(|e| format!("reported: {e}"))?;
    Ok(computed.agrees_with(&reported))
}

/// Recomputes a round's outcome; returns the outcome as JSON.
#[wasm_bindgen(js_name = verifyFairness)]
pub fn verify_fairness(seed_json: &str, game_json: &str) -> Result<String, JsValue> {
    verify_json(seed_json, game_json).map_err(|e| JsValue::from_str(&e))
}

/// True when the reported outcome matches what the seeds produce.
#[wasm_bindgen(js_name = matchesReported)]
pub fn matches_reported(
    seed_json: &str,
    game_json: &str,
    reported_json: &str,
) -> Result<bool, JsValue> {
    matches_json(seed_json, game_json, reported_json).map_err(|e| JsValue::from_str(&e))
}

#[wasm_bindgen(js_name = serverSeedHash)]
pub fn server_seed_hash_js(server_seed: &str) -> String {
    server_seed_hash(server_seed)
}
