//! Thin orchestration around the solver backend: enforces the wall-clock
//! limit, fixes the seed, and captures the backend log for diagnostics.

use crate::model::configuration::{DEFAULT_TIME_LIMIT_SECS, SOLVER_SEED};
use crate::roster::builder::RosterModel;
use crate::solver::search::{Backend, SolveParams, SolveStats, SolveStatus};
use log::info;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SolveOptions {
    pub time_limit_secs: u64,
    pub seed: u64,
}

impl Default for SolveOptions {
    fn default() -> Self {
        SolveOptions {
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            seed: SOLVER_SEED,
        }
    }
}

impl SolveOptions {
    pub fn with_time_limit(time_limit_secs: u64) -> SolveOptions {
        SolveOptions {
            time_limit_secs,
            ..SolveOptions::default()
        }
    }
}

/// Result of one driven solve. `values` follows the model's variable
/// creation order; the registries in [`RosterModel`] give them meaning.
#[derive(Debug, Clone)]
pub struct SolveReport {
    pub status: SolveStatus,
    pub values: Option<Vec<i64>>,
    pub objective: Option<i64>,
    pub stats: SolveStats,
    /// Newline-joined backend log, surfaced as `diagnostics.logOutput`.
    pub log_output: String,
}

impl SolveReport {
    pub fn has_solution(&self) -> bool {
        self.values.is_some()
    }
}

pub fn drive(rm: &RosterModel, backend: &dyn Backend, options: &SolveOptions) -> SolveReport {
    let params = SolveParams {
        time_limit: Duration::from_secs(options.time_limit_secs.max(1)),
        seed: options.seed,
    };
    info!(
        "solving: {} vars, {} constraints, limit {}s",
        rm.model.num_vars(),
        rm.model.num_constraints(),
        options.time_limit_secs
    );

    let outcome = backend.solve(&rm.model, &params);
    info!(
        "solver status {} after {} nodes ({}ms)",
        outcome.status.as_str(),
        outcome.stats.nodes,
        outcome.stats.elapsed.as_millis()
    );

    SolveReport {
        status: outcome.status,
        values: outcome.values,
        objective: outcome.objective,
        stats: outcome.stats,
        log_output: outcome.log.join("\n"),
    }
}
