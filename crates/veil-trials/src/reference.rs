//! Reference solver pair: an analytic log-structured-storage cost model with
//! coordinate-descent refinement.
//!
//! Stands in for the production nonlinear solver so trials, sweeps and the
//! CLI run end-to-end. The robust regime approximates the divergence-ball
//! inner maximization by exponential tilting; overflow in the tilt surfaces
//! as the typed unstable variant, exactly how an adapter around a real solver
//! should report it.

use rand::Rng;
use serde::{Deserialize, Serialize};

use veil_core::{RngHandle, WorkloadVector};
use veil_search::{CostEvaluator, DesignOptimizer, Evaluation, NominalInit, RobustInit};

/// Bounds for the tunable design dimensions.
const BITS_BOUNDS: (f64, f64) = (0.5, 20.0);
const RATIO_BOUNDS: (f64, f64) = (1.5, 50.0);

/// Divisor converting a Lagrange weight into a tilt temperature.
const TILT_SCALE: f64 = 10.0;

/// Fixed environment description sampled once per trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSystem {
    /// Total number of stored entries.
    pub entries: f64,
    /// Bits per stored entry.
    pub entry_bits: f64,
    /// Write-buffer capacity in bits.
    pub buffer_bits: f64,
    /// Entries packed into one page.
    pub page_entries: f64,
    /// Pages touched per level by a range scan.
    pub scan_selectivity: f64,
}

impl ReferenceSystem {
    /// Samples a system description from the generator's valid ranges.
    /// Sampled once per trial and held constant across candidates. The memory
    /// budget scales with the entry count so that small filter allocations
    /// always remain feasible.
    pub fn sample(rng: &mut RngHandle) -> Self {
        let inner = rng.inner_mut();
        let entries = inner.gen_range(1.0e6..1.0e8);
        Self {
            entries,
            entry_bits: inner.gen_range(512.0..4096.0),
            buffer_bits: entries * inner.gen_range(2.0..32.0),
            page_entries: inner.gen_range(64.0..512.0),
            scan_selectivity: inner.gen_range(1.0..10.0),
        }
    }
}

impl Default for ReferenceSystem {
    fn default() -> Self {
        Self {
            entries: 1.0e7,
            entry_bits: 1024.0,
            buffer_bits: 1.0e8,
            page_entries: 128.0,
            scan_selectivity: 4.0,
        }
    }
}

/// Tunable configuration produced by the reference solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TuningDesign {
    /// Filter bits per entry.
    pub bits_per_entry: f64,
    /// Merge fan-out between adjacent levels.
    pub size_ratio: f64,
}

impl TuningDesign {
    fn clamped(bits_per_entry: f64, size_ratio: f64) -> Self {
        Self {
            bits_per_entry: bits_per_entry.clamp(BITS_BOUNDS.0, BITS_BOUNDS.1),
            size_ratio: size_ratio.clamp(RATIO_BOUNDS.0, RATIO_BOUNDS.1),
        }
    }
}

/// Analytic solver implementing both external interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceOracle {
    /// Coordinate-descent iterations per evaluation.
    pub refine_steps: usize,
}

impl Default for ReferenceOracle {
    fn default() -> Self {
        Self { refine_steps: 64 }
    }
}

/// Number of levels the tree settles into for a given design. Filter bits
/// come out of the shared memory budget; a design that starves the write
/// buffer is infeasible and costs infinitely much.
fn levels(system: &ReferenceSystem, design: &TuningDesign) -> f64 {
    let buffer = system.buffer_bits - design.bits_per_entry * system.entries;
    if buffer <= 0.0 {
        return f64::INFINITY;
    }
    let data_bits = system.entries * system.entry_bits;
    let depth = (data_bits / buffer).max(1.0).ln() / design.size_ratio.ln();
    depth.max(1.0)
}

/// Per-class costs: empty point read, point read, range scan, write.
fn class_costs(system: &ReferenceSystem, design: &TuningDesign) -> [f64; 4] {
    let levels = levels(system, design);
    let miss = (-design.bits_per_entry).exp();
    [
        levels * miss,
        1.0 + (levels - 1.0) * miss,
        system.scan_selectivity * levels,
        design.size_ratio * levels / system.page_entries,
    ]
}

fn expected_cost(system: &ReferenceSystem, design: &TuningDesign, workload: &[f64]) -> f64 {
    if workload.len() != 4 {
        return f64::NAN;
    }
    let costs = class_costs(system, design);
    workload
        .iter()
        .zip(costs.iter())
        .map(|(&share, &cost)| share * cost)
        .sum()
}

/// Worst-case cost over the divergence ball, by exponential tilting of the
/// workload towards its expensive classes.
fn tilted_cost(
    system: &ReferenceSystem,
    design: &TuningDesign,
    workload: &[f64],
    temperature: f64,
) -> f64 {
    if workload.len() != 4 {
        return f64::NAN;
    }
    let costs = class_costs(system, design);
    if costs.iter().any(|c| !c.is_finite()) {
        // Infeasible, not unstable: the refinement walks away from it.
        return f64::INFINITY;
    }
    let mut tilted = [0.0; 4];
    let mut total = 0.0;
    for idx in 0..4 {
        let weight = workload[idx] * (temperature * costs[idx]).exp();
        if !weight.is_finite() {
            return f64::NAN;
        }
        tilted[idx] = weight;
        total += weight;
    }
    tilted
        .iter()
        .zip(costs.iter())
        .map(|(&weight, &cost)| weight / total * cost)
        .sum()
}

impl ReferenceOracle {
    fn refine<F>(&self, objective: F, start: TuningDesign) -> Evaluation<TuningDesign>
    where
        F: Fn(&TuningDesign) -> f64,
    {
        let mut current = start;
        let mut score = objective(&current);
        if score.is_nan() {
            return Evaluation::Unstable;
        }
        let mut step_bits = 1.0;
        let mut step_ratio = 2.0;
        let mut converged = false;
        for _ in 0..self.refine_steps {
            let mut improved = false;
            let moves = [
                (step_bits, 0.0),
                (-step_bits, 0.0),
                (0.0, step_ratio),
                (0.0, -step_ratio),
            ];
            for (delta_bits, delta_ratio) in moves {
                let candidate = TuningDesign::clamped(
                    current.bits_per_entry + delta_bits,
                    current.size_ratio + delta_ratio,
                );
                let candidate_score = objective(&candidate);
                // NaN is numerical instability; infinity is mere
                // infeasibility and never improves on the incumbent.
                if candidate_score.is_nan() {
                    return Evaluation::Unstable;
                }
                if candidate_score < score {
                    current = candidate;
                    score = candidate_score;
                    improved = true;
                }
            }
            if !improved {
                step_bits *= 0.5;
                step_ratio *= 0.5;
            }
            if step_bits < 1e-3 {
                converged = true;
                break;
            }
        }
        Evaluation::Stable {
            design: current,
            converged,
        }
    }
}

impl DesignOptimizer for ReferenceOracle {
    type System = ReferenceSystem;
    type Design = TuningDesign;

    fn nominal_design(
        &self,
        system: &ReferenceSystem,
        workload: &WorkloadVector,
        init: Option<&NominalInit>,
    ) -> Evaluation<TuningDesign> {
        let start = match init {
            Some(init) => TuningDesign::clamped(init.bits as f64, init.ratio),
            None => TuningDesign::clamped(5.0, 10.0),
        };
        let components = workload.components().to_vec();
        self.refine(
            move |design| expected_cost(system, design, &components),
            start,
        )
    }

    fn robust_design(
        &self,
        system: &ReferenceSystem,
        workload: &WorkloadVector,
        radius: f64,
        init: &RobustInit,
    ) -> Evaluation<TuningDesign> {
        let start = TuningDesign::clamped(init.bits as f64, init.ratio);
        let temperature = radius * init.lagrange_kl / TILT_SCALE;
        let blend = (init.lagrange_cost / TILT_SCALE).clamp(0.0, 1.0);
        let components = workload.components().to_vec();
        self.refine(
            move |design| {
                let base = expected_cost(system, design, &components);
                let worst = tilted_cost(system, design, &components, temperature);
                (1.0 - blend) * base + blend * worst
            },
            start,
        )
    }
}

impl CostEvaluator for ReferenceOracle {
    type System = ReferenceSystem;
    type Design = TuningDesign;

    fn cost(
        &self,
        design: &TuningDesign,
        system: &ReferenceSystem,
        workload: &WorkloadVector,
    ) -> f64 {
        expected_cost(system, design, workload.components())
    }
}
