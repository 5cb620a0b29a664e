// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

mod sim;
mod traffic;

use crate::{
    sim::{RunSummary, SimConfig, simulate},
    traffic::generate,
};
use crossing_model::prelude::{IntersectionId, LaneId};
use crossing_policy::prelude::{FcfsRequestHandler, PriorityConfig, PriorityRequestHandler};
use rayon::prelude::*;
use serde::Serialize;
use std::{fs::File, io::BufWriter, time::Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

const INTERSECTIONS: u32 = 8;
const BASE_SEED: u64 = 42;
const REPORT_PATH: &str = "crossing_report.json";

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandlerKind {
    Fcfs,
    Priority,
}

impl HandlerKind {
    fn label(self) -> &'static str {
        match self {
            HandlerKind::Fcfs => "fcfs",
            HandlerKind::Priority => "priority",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct Report {
    description: String,
    elapsed_ms: u128,
    runs: Vec<RunSummary>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    enable_tracing();

    let cfg = SimConfig::default();
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| REPORT_PATH.to_string());

    let jobs: Vec<(u32, HandlerKind)> = (0..INTERSECTIONS)
        .flat_map(|i| [(i, HandlerKind::Fcfs), (i, HandlerKind::Priority)])
        .collect();

    let t0 = Instant::now();
    let runs: Vec<RunSummary> = jobs
        .par_iter()
        .map(|&(i, kind)| -> Result<RunSummary, Box<dyn std::error::Error + Send + Sync>> {
            let seed = BASE_SEED + u64::from(i);
            let arrivals = generate(&cfg.traffic, seed)?;
            let id = IntersectionId::new(i);
            let summary = match kind {
                HandlerKind::Fcfs => simulate(
                    id,
                    kind.label(),
                    seed,
                    &cfg,
                    &arrivals,
                    FcfsRequestHandler::new(),
                )?,
                HandlerKind::Priority => simulate(
                    id,
                    kind.label(),
                    seed,
                    &cfg,
                    &arrivals,
                    PriorityRequestHandler::new(PriorityConfig::with_favored_lane(LaneId::new(1))),
                )?,
            };
            Ok(summary)
        })
        .collect::<Result<_, _>>()
        .map_err(|e| e as Box<dyn std::error::Error>)?;
    let elapsed = t0.elapsed();

    for kind in [HandlerKind::Fcfs, HandlerKind::Priority] {
        let of_kind: Vec<&RunSummary> = runs.iter().filter(|r| r.handler == kind.label()).collect();
        let completed: usize = of_kind.iter().map(|r| r.completed).sum();
        let mean_delay =
            of_kind.iter().map(|r| r.delay.mean).sum::<f64>() / of_kind.len().max(1) as f64;
        info!(
            handler = kind.label(),
            completed,
            mean_delay,
            "aggregate"
        );
    }

    let report = Report {
        description: format!(
            "{} independent intersections, each run with first-come-first-served and priority-based arbitration",
            INTERSECTIONS
        ),
        elapsed_ms: elapsed.as_millis(),
        runs,
    };
    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &report)?;

    println!("Wrote: {path}");
    Ok(())
}
