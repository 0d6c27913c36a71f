/*
 * Copyright (c) 2025 Clément GRENNERAT
 *
 * This program is free software: you can redistribute it and/or modify it under the terms of the
 * GNU General Public License as published by the Free Software Foundation, version 3.
 * This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without
 * even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
 * See the GNU General Public License for more details.
 * You should have received a copy of the GNU General Public License along with this program.
 * If not, see https://www.gnu.org/licenses/.
 *
 */

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use log::{LevelFilter, info, warn};
use prettytable::{Cell, Row, Table, format};
use roster_scheduler_core::model::output::OutputDocument;
use roster_scheduler_core::roster::driver::SolveOptions;
use roster_scheduler_core::roster::engine::solve_document;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Monthly duty-roster solver: reads one input document, writes one
/// output document atomically.
#[derive(Parser)]
#[command(name = "roster-scheduler")]
#[command(about = "Solves a monthly staff duty roster from a JSON demand document")]
struct Cli {
    /// Input JSON document.
    #[arg(long = "in", alias = "input", value_name = "PATH")]
    input: PathBuf,

    /// Output JSON document (written via temp file + rename).
    #[arg(long = "out", alias = "output", value_name = "PATH")]
    output: PathBuf,

    /// Wall-clock solve limit in seconds.
    #[arg(
        long = "time_limit",
        alias = "time-limit",
        env = "ROSTER_TIME_LIMIT",
        value_name = "SECONDS",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    time_limit: u64,

    /// Print the solved roster grid on stdout.
    #[arg(long)]
    print: bool,
}

fn main() {
    // Load .env file if present
    dotenv().ok();

    env_logger::Builder::new()
        .filter(None, LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    if let Err(error) = run(&cli) {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

/// Crashes and I/O failures exit non-zero; an infeasible roster is still a
/// successful run and exits 0 with the error document written.
fn run(cli: &Cli) -> anyhow::Result<()> {
    let json = fs::read_to_string(&cli.input)
        .with_context(|| format!("reading input '{}'", cli.input.display()))?;

    let options = SolveOptions::with_time_limit(cli.time_limit);
    let document = solve_document(&json, &options);

    write_atomic(&cli.output, &document)
        .with_context(|| format!("writing output '{}'", cli.output.display()))?;

    match (&document.infeasible, &document.reason) {
        (Some(true), Some(reason)) => warn!("no roster produced: {reason}"),
        _ => {
            if let Some(summary) = &document.summary {
                info!(
                    "roster written: {} assignments, shortage {}, excess {}, wish-off violations {}",
                    summary.totals.assigned,
                    summary.totals.shortage,
                    summary.totals.excess,
                    summary.totals.wish_off_violations
                );
            }
            if cli.print {
                roster_table(&document).printstd();
            }
        }
    }
    Ok(())
}

/// Results are never left half-written: serialize into a sibling temp file,
/// then rename over the target.
fn write_atomic(path: &Path, document: &OutputDocument) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut file, document)?;
    file.write_all(b"\n")?;
    file.persist(path)?;
    Ok(())
}

/// Roster grid in a human-readable format, one row per date.
fn roster_table(document: &OutputDocument) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);

    let mut header = Row::new(vec![Cell::new("Date").style_spec("buFc")]);
    for staff_id in &document.people_order {
        header.add_cell(Cell::new(staff_id).style_spec("buFc"));
    }
    table.add_row(header);

    for row in document.matrix.iter().flatten() {
        let mut cells = Row::new(vec![Cell::new(&row.date.to_string())]);
        for staff_id in &document.people_order {
            let code = row.shifts.get(staff_id).map(String::as_str).unwrap_or("");
            cells.add_cell(Cell::new(code));
        }
        table.add_row(cells);
    }
    table
}
