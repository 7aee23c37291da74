use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use crate::solver::{ConstraintId, LinExpr, MilpSolver, Sense, SolveOutcome, VarId};

const EPS: f64 = 1e-9;

#[derive(Debug, Clone)]
struct StoredConstraint {
    coeffs: Vec<(VarId, f64)>,
    sense: Sense,
    rhs: f64,
}

/// Exact depth-first branch-and-bound over 0/1 variables. Pruning uses the
/// optimistic objective bound plus per-constraint reachability of the
/// right-hand side. Exponential in the worst case but exact, which is all
/// the oracle contract asks for; an industrial MILP can be swapped in
/// behind the same trait.
#[derive(Debug, Default)]
pub struct BranchBound {
    names: Vec<String>,
    constraints: Vec<Option<StoredConstraint>>,
    objective: Option<Vec<f64>>,
    values: Vec<f64>,
    time_limit: Option<Duration>,
}

impl BranchBound {
    pub fn new() -> Self {
        BranchBound::default()
    }

    /// Per-solve wall-clock budget; exceeding it reports TimedOut.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    fn merged(expr: LinExpr) -> Vec<(VarId, f64)> {
        let mut acc: FxHashMap<VarId, f64> = FxHashMap::default();
        for (v, c) in expr.terms {
            *acc.entry(v).or_insert(0.0) += c;
        }
        let mut coeffs: Vec<(VarId, f64)> = acc.into_iter().filter(|&(_, c)| c != 0.0).collect();
        coeffs.sort_unstable_by_key(|&(v, _)| v);
        coeffs
    }
}

struct Search {
    order: Vec<VarId>,
    objective: Vec<f64>,
    /// Per active constraint: coefficients, sense, rhs.
    constraints: Vec<StoredConstraint>,
    /// var -> (constraint index, coefficient) adjacency.
    touching: Vec<Vec<(usize, f64)>>,
    /// Current activity per constraint.
    activity: Vec<f64>,
    /// Sum of positive / negative coefficients of still-unassigned vars.
    pos_residual: Vec<f64>,
    neg_residual: Vec<f64>,
    assignment: Vec<f64>,
    best: Option<(f64, Vec<f64>)>,
    deadline: Option<Instant>,
    timed_out: bool,
}

impl Search {
    fn feasible_so_far(&self) -> bool {
        for (k, c) in self.constraints.iter().enumerate() {
            let lo = self.activity[k] + self.neg_residual[k];
            let hi = self.activity[k] + self.pos_residual[k];
            let ok = match c.sense {
                Sense::Le => lo <= c.rhs + EPS,
                Sense::Ge => hi >= c.rhs - EPS,
                Sense::Eq => lo <= c.rhs + EPS && hi >= c.rhs - EPS,
            };
            if !ok {
                return false;
            }
        }
        true
    }

    fn assign(&mut self, var: VarId, value: f64) {
        self.assignment[var] = value;
        for &(k, coeff) in &self.touching[var] {
            self.activity[k] += coeff * value;
            if coeff > 0.0 {
                self.pos_residual[k] -= coeff;
            } else {
                self.neg_residual[k] -= coeff;
            }
        }
    }

    fn unassign(&mut self, var: VarId, value: f64) {
        self.assignment[var] = 0.0;
        for &(k, coeff) in &self.touching[var] {
            self.activity[k] -= coeff * value;
            if coeff > 0.0 {
                self.pos_residual[k] += coeff;
            } else {
                self.neg_residual[k] += coeff;
            }
        }
    }

    fn dfs(&mut self, depth: usize, current: f64, optimistic_rest: f64) {
        if self.timed_out {
            return;
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() > deadline {
                self.timed_out = true;
                return;
            }
        }
        if let Some((best, _)) = &self.best {
            if current + optimistic_rest <= best + EPS {
                return;
            }
        }
        if !self.feasible_so_far() {
            return;
        }
        if depth == self.order.len() {
            let better = match &self.best {
                None => true,
                Some((best, _)) => current > best + EPS,
            };
            if better {
                self.best = Some((current, self.assignment.clone()));
            }
            return;
        }

        let var = self.order[depth];
        let coeff = self.objective[var];
        let rest = optimistic_rest - coeff.max(0.0);
        // Try the objective-favored value first.
        let branches = if coeff > 0.0 { [1.0, 0.0] } else { [0.0, 1.0] };
        for value in branches {
            self.assign(var, value);
            self.dfs(depth + 1, current + coeff * value, rest);
            self.unassign(var, value);
            if self.timed_out {
                return;
            }
        }
    }
}

impl MilpSolver for BranchBound {
    fn add_bool_var(&mut self, name: String) -> VarId {
        self.names.push(name);
        self.names.len() - 1
    }

    fn num_vars(&self) -> usize {
        self.names.len()
    }

    fn add_constraint(&mut self, expr: LinExpr, sense: Sense, rhs: f64) -> ConstraintId {
        self.constraints.push(Some(StoredConstraint {
            coeffs: Self::merged(expr),
            sense,
            rhs,
        }));
        self.constraints.len() - 1
    }

    fn remove_constraint(&mut self, id: ConstraintId) {
        self.constraints[id] = None;
    }

    fn num_constraints(&self) -> usize {
        self.constraints.iter().flatten().count()
    }

    fn set_objective(&mut self, expr: LinExpr) {
        let mut dense = vec![0.0; self.names.len()];
        for (v, c) in Self::merged(expr) {
            dense[v] = c;
        }
        self.objective = Some(dense);
    }

    fn clear_objective(&mut self) {
        self.objective = None;
    }

    fn solve(&mut self) -> SolveOutcome {
        let nv = self.names.len();
        let mut objective = self.objective.clone().unwrap_or_else(|| vec![0.0; nv]);
        objective.resize(nv, 0.0);

        let active: Vec<StoredConstraint> = self.constraints.iter().flatten().cloned().collect();
        let mut touching = vec![Vec::new(); nv];
        let mut activity = vec![0.0; active.len()];
        let mut pos_residual = vec![0.0; active.len()];
        let mut neg_residual = vec![0.0; active.len()];
        for (k, c) in active.iter().enumerate() {
            for &(v, coeff) in &c.coeffs {
                touching[v].push((k, coeff));
                if coeff > 0.0 {
                    pos_residual[k] += coeff;
                } else {
                    neg_residual[k] += coeff;
                }
            }
            activity[k] = 0.0;
        }

        // Branch on high-impact variables first.
        let mut order: Vec<VarId> = (0..nv).collect();
        order.sort_by(|&a, &b| {
            objective[b].abs().partial_cmp(&objective[a].abs()).expect("objective is finite")
        });
        let optimistic: f64 = objective.iter().map(|c| c.max(0.0)).sum();

        let mut search = Search {
            order,
            objective,
            constraints: active,
            touching,
            activity,
            pos_residual,
            neg_residual,
            assignment: vec![0.0; nv],
            best: None,
            deadline: self.time_limit.map(|l| Instant::now() + l),
            timed_out: false,
        };
        search.dfs(0, 0.0, optimistic);

        if search.timed_out {
            return SolveOutcome::TimedOut;
        }
        match search.best.take() {
            Some((value, assignment)) => {
                self.values = assignment;
                SolveOutcome::Optimal(value)
            }
            None => SolveOutcome::Infeasible,
        }
    }

    fn var_value(&self, var: VarId) -> f64 {
        self.values[var]
    }
}
