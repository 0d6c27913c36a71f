//! Pipeline entry point. One blocking call: validate, expand the demand,
//! analyse availability, build the model, solve, render. An early failure
//! short-circuits into an error document instead of aborting.

use crate::model::input::RosterInput;
use crate::model::output::OutputDocument;
use crate::roster::driver::SolveOptions;
use crate::roster::{availability, builder, calendar, driver, render, validate};
use crate::solver::search::{Backend, BnbSolver};
use log::info;

/// Runs the whole pipeline on a parsed input document.
pub fn run_roster(
    input: &RosterInput,
    backend: &dyn Backend,
    options: &SolveOptions,
) -> OutputDocument {
    let normalized = match validate::validate(input) {
        Ok(normalized) => normalized,
        Err(failure) => {
            info!("input rejected with {} error(s)", failure.errors.len());
            return render::render_rejected(
                raw_people_order(input),
                &failure.errors,
                failure.warnings,
            );
        }
    };
    info!(
        "validated input: {} people, {} days, {} warnings",
        normalized.people.len(),
        normalized.days,
        normalized.warnings.len()
    );

    let demand = match calendar::expand(&normalized) {
        Ok(demand) => demand,
        Err(error) => {
            let people: Vec<String> = normalized.people.iter().map(|p| p.id.clone()).collect();
            return render::render_rejected(
                people,
                &[error],
                normalized.warnings.clone(),
            );
        }
    };
    info!("expanded demand: total need {}", demand.total_need);

    let availability = availability::analyze(&normalized, &demand);
    if availability.has_warnings() {
        info!(
            "{} slot(s) have fewer available people than needed",
            availability.warnings.len()
        );
    }

    let model = builder::build(&normalized, &demand);
    let report = driver::drive(&model, backend, options);

    if report.has_solution() {
        render::render_solved(&normalized, &demand, &availability, &model, &report)
    } else {
        render::render_unsolved(&normalized, &demand, &availability, &model, &report)
    }
}

/// Parses and runs in one step; malformed JSON is recovered into an error
/// document like any validation failure.
pub fn run_roster_json(
    json: &str,
    backend: &dyn Backend,
    options: &SolveOptions,
) -> OutputDocument {
    match RosterInput::from_json(json) {
        Ok(input) => run_roster(&input, backend, options),
        Err(error) => render::render_rejected(Vec::new(), &[error], Vec::new()),
    }
}

/// Default entry used by the CLI: the in-tree backend with the fixed seed.
pub fn solve_document(json: &str, options: &SolveOptions) -> OutputDocument {
    run_roster_json(json, &BnbSolver::new(), options)
}

fn raw_people_order(input: &RosterInput) -> Vec<String> {
    input
        .people
        .as_ref()
        .map(|people| {
            people
                .iter()
                .filter_map(|p| p.id.clone())
                .collect::<Vec<String>>()
        })
        .unwrap_or_default()
}
