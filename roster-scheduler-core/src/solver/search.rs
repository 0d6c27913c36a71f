//! Deterministic branch-and-bound over the constraint model: interval
//! propagation to fixpoint, creation-order branching, lower-bound
//! completion for slack variables and incumbent pruning under a wall-clock
//! deadline.

use crate::solver::model::{Constraint, CpModel, LinearConstraint};
use log::debug;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Search space exhausted with an incumbent.
    Optimal,
    /// Deadline hit with an incumbent in hand.
    Feasible,
    /// Search space exhausted without any solution.
    Infeasible,
    /// Deadline hit before any solution was found.
    Timeout,
}

impl SolveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Timeout => "TIMEOUT",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolveParams {
    pub time_limit: Duration,
    /// Recorded in the log; the search itself is deterministic, so a fixed
    /// seed pins the whole run.
    pub seed: u64,
}

impl Default for SolveParams {
    fn default() -> Self {
        SolveParams {
            time_limit: Duration::from_secs(60),
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SolveStats {
    pub nodes: u64,
    pub propagations: u64,
    pub solutions: u64,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    /// One value per variable, in creation order. None without a solution.
    pub values: Option<Vec<i64>>,
    pub objective: Option<i64>,
    pub stats: SolveStats,
    pub log: Vec<String>,
}

/// The capability the roster pipeline needs from a solving engine.
pub trait Backend {
    fn solve(&self, model: &CpModel, params: &SolveParams) -> SolveOutcome;
}

/// In-tree branch-and-bound backend.
#[derive(Debug, Default)]
pub struct BnbSolver;

impl BnbSolver {
    pub fn new() -> BnbSolver {
        BnbSolver
    }
}

impl Backend for BnbSolver {
    fn solve(&self, model: &CpModel, params: &SolveParams) -> SolveOutcome {
        Search::new(model, params).run()
    }
}

struct Search<'m> {
    model: &'m CpModel,
    lo: Vec<i64>,
    hi: Vec<i64>,
    /// (var index, old lo, old hi) entries, popped on backtrack.
    trail: Vec<(usize, i64, i64)>,
    /// var index -> constraints mentioning it.
    watches: Vec<Vec<usize>>,
    /// var index -> objective coefficient (0 when absent).
    obj_coef: Vec<i64>,
    deadline: Instant,
    started: Instant,
    timed_out: bool,
    best: Option<(i64, Vec<i64>)>,
    stats: SolveStats,
    log: Vec<String>,
}

impl<'m> Search<'m> {
    fn new(model: &'m CpModel, params: &SolveParams) -> Search<'m> {
        let n = model.num_vars();
        let mut lo = Vec::with_capacity(n);
        let mut hi = Vec::with_capacity(n);
        for &(l, h) in model.domains() {
            lo.push(l);
            hi.push(h);
        }

        let mut watches: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (index, con) in model.constraints().iter().enumerate() {
            for var in con.vars() {
                watches[var.index()].push(index);
            }
        }

        let mut obj_coef = vec![0i64; n];
        for (coef, var) in model.objective() {
            obj_coef[var.index()] += coef;
        }

        let started = Instant::now();
        let mut log = Vec::new();
        log.push(format!(
            "model: {} vars, {} constraints, {} objective terms",
            n,
            model.num_constraints(),
            model.objective().len()
        ));
        log.push(format!(
            "search: time limit {:.0}s, seed {}",
            params.time_limit.as_secs_f64(),
            params.seed
        ));

        Search {
            model,
            lo,
            hi,
            trail: Vec::new(),
            watches,
            obj_coef,
            deadline: started
                .checked_add(params.time_limit)
                .unwrap_or_else(|| started + Duration::from_secs(86_400)),
            started,
            timed_out: false,
            best: None,
            stats: SolveStats::default(),
            log,
        }
    }

    fn run(mut self) -> SolveOutcome {
        let root_ok = self.domains_sane() && self.propagate_all();
        if root_ok {
            self.dive();
        }

        self.stats.elapsed = self.started.elapsed();
        let status = match (&self.best, self.timed_out) {
            (Some(_), false) => SolveStatus::Optimal,
            (Some(_), true) => SolveStatus::Feasible,
            (None, false) => SolveStatus::Infeasible,
            (None, true) => SolveStatus::Timeout,
        };
        self.log.push(format!(
            "status: {}, nodes {}, propagations {}, elapsed {}ms",
            status.as_str(),
            self.stats.nodes,
            self.stats.propagations,
            self.stats.elapsed.as_millis()
        ));
        debug!("solver finished: {}", status.as_str());

        let (values, objective) = match self.best {
            Some((cost, values)) => (Some(values), Some(cost)),
            None => (None, None),
        };
        SolveOutcome {
            status,
            values,
            objective,
            stats: self.stats,
            log: self.log,
        }
    }

    fn domains_sane(&self) -> bool {
        self.lo.iter().zip(&self.hi).all(|(l, h)| l <= h)
    }

    fn dive(&mut self) {
        self.stats.nodes += 1;
        if self.stats.nodes & 0x1FF == 0 && Instant::now() >= self.deadline {
            self.timed_out = true;
        }
        if self.timed_out {
            return;
        }

        let bound = self.objective_bound();
        if let Some((best_cost, _)) = &self.best {
            if bound >= *best_cost {
                return;
            }
        }

        // Slack variables sit at their cheapest bound once the booleans are
        // decided; when that completion satisfies everything the subtree's
        // optimum is reached.
        if let Some(values) = self.try_completion() {
            let cost = self.model.objective_of(&values);
            self.stats.solutions += 1;
            self.log.push(format!(
                "incumbent: objective {} at node {} ({}ms)",
                cost,
                self.stats.nodes,
                self.started.elapsed().as_millis()
            ));
            self.best = Some((cost, values));
            return;
        }

        let Some(var) = self.pick_branch_var() else {
            // All variables fixed yet the completion failed: dead end.
            return;
        };

        for (branch_lo, branch_hi) in self.branch_values(var) {
            let mark = self.trail.len();
            let feasible = self.apply(var, branch_lo, branch_hi);
            if feasible {
                self.dive();
            }
            self.restore(mark);
            if self.timed_out {
                return;
            }
        }
    }

    /// First unfixed variable in creation order.
    fn pick_branch_var(&self) -> Option<usize> {
        (0..self.lo.len()).find(|&v| self.lo[v] < self.hi[v])
    }

    /// Two sub-domains to try, in order. Variables outside the objective
    /// take their high value first (work assignments pay off through the
    /// coverage constraints); objective-weighted slack goes low first.
    fn branch_values(&self, var: usize) -> [(i64, i64); 2] {
        let (l, h) = (self.lo[var], self.hi[var]);
        if h - l == 1 {
            if self.obj_coef[var] > 0 {
                [(l, l), (h, h)]
            } else {
                [(h, h), (l, l)]
            }
        } else {
            // Wide domain: assign the low bound, else exclude it.
            [(l, l), (l + 1, h)]
        }
    }

    fn apply(&mut self, var: usize, new_lo: i64, new_hi: i64) -> bool {
        self.tighten(var, new_lo, new_hi);
        if self.lo[var] > self.hi[var] {
            return false;
        }
        let queue: Vec<usize> = self.watches[var].clone();
        self.propagate(queue)
    }

    fn tighten(&mut self, var: usize, new_lo: i64, new_hi: i64) {
        let (old_lo, old_hi) = (self.lo[var], self.hi[var]);
        let lo = old_lo.max(new_lo);
        let hi = old_hi.min(new_hi);
        if lo != old_lo || hi != old_hi {
            self.trail.push((var, old_lo, old_hi));
            self.lo[var] = lo;
            self.hi[var] = hi;
        }
    }

    /// Tightens and re-enqueues the watchers of the variable; false when
    /// the domain empties.
    fn tighten_and_wake(
        &mut self,
        var: usize,
        new_lo: i64,
        new_hi: i64,
        in_queue: &mut [bool],
        queue: &mut VecDeque<usize>,
    ) -> bool {
        let (old_lo, old_hi) = (self.lo[var], self.hi[var]);
        let lo = old_lo.max(new_lo);
        let hi = old_hi.min(new_hi);
        if lo == old_lo && hi == old_hi {
            return true;
        }
        self.trail.push((var, old_lo, old_hi));
        self.lo[var] = lo;
        self.hi[var] = hi;
        if lo > hi {
            return false;
        }
        for &watched in &self.watches[var] {
            if !in_queue[watched] {
                in_queue[watched] = true;
                queue.push_back(watched);
            }
        }
        true
    }

    fn restore(&mut self, mark: usize) {
        while self.trail.len() > mark {
            let (var, old_lo, old_hi) = self.trail.pop().unwrap();
            self.lo[var] = old_lo;
            self.hi[var] = old_hi;
        }
    }

    fn propagate_all(&mut self) -> bool {
        let all: Vec<usize> = (0..self.model.num_constraints()).collect();
        self.propagate(all)
    }

    /// Interval propagation to fixpoint. Stale activity bounds only ever
    /// loosen the derived bounds, so re-enqueueing on change is sound.
    fn propagate(&mut self, seed: Vec<usize>) -> bool {
        let mut in_queue = vec![false; self.model.num_constraints()];
        let mut queue: VecDeque<usize> = VecDeque::new();
        for c in seed {
            if !in_queue[c] {
                in_queue[c] = true;
                queue.push_back(c);
            }
        }

        while let Some(c) = queue.pop_front() {
            in_queue[c] = false;
            self.stats.propagations += 1;
            match &self.model.constraints()[c] {
                Constraint::Linear(con) => {
                    if !self.propagate_linear(con, &mut in_queue, &mut queue) {
                        return false;
                    }
                }
                Constraint::MaxEquality(me) => {
                    let target = me.target.index();
                    let mut max_lo = me.floor;
                    let mut max_hi = me.floor;
                    for op in &me.operands {
                        max_lo = max_lo.max(self.lo[op.index()]);
                        max_hi = max_hi.max(self.hi[op.index()]);
                    }
                    if !self.tighten_and_wake(target, max_lo, max_hi, &mut in_queue, &mut queue) {
                        return false;
                    }
                    let target_hi = self.hi[target];
                    for op in &me.operands {
                        if !self.tighten_and_wake(
                            op.index(),
                            i64::MIN,
                            target_hi,
                            &mut in_queue,
                            &mut queue,
                        ) {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }

    fn propagate_linear(
        &mut self,
        con: &LinearConstraint,
        in_queue: &mut [bool],
        queue: &mut VecDeque<usize>,
    ) -> bool {
        let mut min_act = 0i64;
        let mut max_act = 0i64;
        for &(coef, var) in &con.terms {
            let v = var.index();
            if coef > 0 {
                min_act += coef * self.lo[v];
                max_act += coef * self.hi[v];
            } else {
                min_act += coef * self.hi[v];
                max_act += coef * self.lo[v];
            }
        }
        if let Some(hi) = con.hi {
            if min_act > hi {
                return false;
            }
        }
        if let Some(lo) = con.lo {
            if max_act < lo {
                return false;
            }
        }

        for &(coef, var) in &con.terms {
            let v = var.index();
            let (contrib_min, contrib_max) = if coef > 0 {
                (coef * self.lo[v], coef * self.hi[v])
            } else {
                (coef * self.hi[v], coef * self.lo[v])
            };

            let (mut new_lo, mut new_hi) = (self.lo[v], self.hi[v]);
            if let Some(hi) = con.hi {
                let slack = hi - (min_act - contrib_min);
                if coef > 0 {
                    new_hi = new_hi.min(div_floor(slack, coef));
                } else {
                    new_lo = new_lo.max(div_ceil(slack, coef));
                }
            }
            if let Some(lo) = con.lo {
                let gap = lo - (max_act - contrib_max);
                if coef > 0 {
                    new_lo = new_lo.max(div_ceil(gap, coef));
                } else {
                    new_hi = new_hi.min(div_floor(gap, coef));
                }
            }

            if (new_lo > self.lo[v] || new_hi < self.hi[v])
                && !self.tighten_and_wake(v, new_lo, new_hi, in_queue, queue)
            {
                return false;
            }
        }
        true
    }

    /// Valid lower bound of the objective under the current domains.
    fn objective_bound(&self) -> i64 {
        self.model
            .objective()
            .iter()
            .map(|&(coef, var)| {
                let v = var.index();
                if coef > 0 { coef * self.lo[v] } else { coef * self.hi[v] }
            })
            .sum()
    }

    /// Candidate assignment putting every unfixed variable at its cheapest
    /// bound; returns it when it satisfies every constraint.
    fn try_completion(&self) -> Option<Vec<i64>> {
        let values: Vec<i64> = (0..self.lo.len())
            .map(|v| {
                if self.obj_coef[v] < 0 { self.hi[v] } else { self.lo[v] }
            })
            .collect();
        if self.model.is_satisfied(&values) {
            Some(values)
        } else {
            None
        }
    }
}

fn div_floor(a: i64, b: i64) -> i64 {
    let q = a / b;
    if a % b != 0 && (a < 0) != (b < 0) { q - 1 } else { q }
}

fn div_ceil(a: i64, b: i64) -> i64 {
    let q = a / b;
    if a % b != 0 && (a < 0) == (b < 0) { q + 1 } else { q }
}
