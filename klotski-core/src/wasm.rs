//! WASM bindings for klotski-core
//!
//! Provides a JavaScript-friendly API for the solver.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::{render, Board, SolverConfig};

/// WASM-friendly wrapper around Board
#[wasm_bindgen]
pub struct WasmSolver {
    inner: Board,
}

#[wasm_bindgen]
impl WasmSolver {
    /// Classic layout with the given Zobrist seed
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<WasmSolver, JsError> {
        let config = SolverConfig {
            seed,
            ..SolverConfig::default()
        };
        Self::with_config(&config)
    }

    /// Build from a TOML configuration document
    #[wasm_bindgen(js_name = fromConfig)]
    pub fn from_config(toml: &str) -> Result<WasmSolver, JsError> {
        let config = SolverConfig::from_toml_str(toml)?;
        Self::with_config(&config)
    }

    /// Solve and return the steps as an array of
    /// `{ label, direction, distance, grid }`
    pub fn solve(&mut self) -> Result<JsValue, JsError> {
        let steps: Vec<WasmStep> = self
            .inner
            .solve()?
            .into_iter()
            .map(|step| WasmStep {
                label: step.label,
                direction: step.direction.name(),
                distance: step.distance,
                grid: render(&step.arrangement),
            })
            .collect();
        serde_wasm_bindgen::to_value(&steps).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Bordered text grid of the starting arrangement
    #[wasm_bindgen(js_name = renderInitial)]
    pub fn render_initial(&self) -> String {
        render(self.inner.root())
    }

    /// Arrangements examined by the last solve
    #[wasm_bindgen(js_name = statesExplored)]
    pub fn states_explored(&self) -> usize {
        self.inner.stats().examined
    }
}

impl WasmSolver {
    fn with_config(config: &SolverConfig) -> Result<WasmSolver, JsError> {
        Ok(WasmSolver {
            inner: config.board()?,
        })
    }
}

/// Serializable solution step for JavaScript
#[derive(Serialize)]
struct WasmStep {
    label: char,
    direction: &'static str,
    distance: u8,
    grid: String,
}
