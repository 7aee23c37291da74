use log::{debug, info, warn};

use crate::model::IpModel;
use crate::solver::{LinExpr, MilpSolver, Sense, SolveOutcome};
use crate::structure::SecondaryStructure;

/// Walks the Pareto frontier by epsilon-constraint scalarization: maximize
/// expected accuracy (obj2) under a sliding lower bound on the motif score
/// (obj1), excluding each solution found with a forbid clause. Solutions
/// arrive in non-decreasing obj1 order; the kept set is never dominated.
pub struct ParetoWalker<S: MilpSolver> {
    solver: S,
    model: IpModel,
    pareto: Vec<SecondaryStructure>,
}

impl<S: MilpSolver> ParetoWalker<S> {
    pub fn new(solver: S, model: IpModel) -> Self {
        ParetoWalker { solver, model, pareto: Vec::new() }
    }

    pub fn pareto(&self) -> &[SecondaryStructure] {
        &self.pareto
    }

    pub fn into_pareto(self) -> Vec<SecondaryStructure> {
        self.pareto
    }

    /// Explore the whole frontier, starting unbounded. The walk is a
    /// tail-shaped recursion on the lower bound and runs as iteration.
    pub fn explore(&mut self) -> &[SecondaryStructure] {
        self.extend(f64::NEG_INFINITY, f64::INFINITY);
        &self.pareto
    }

    fn extend(&mut self, lambda_min: f64, lambda_max: f64) {
        let mut lambda_min = lambda_min;
        loop {
            let s = match self.solve_objective2(lambda_min, lambda_max) {
                Some(s) => s,
                None => break,
            };
            if !self.is_undominated_yet(&s) {
                debug!("solution is dominated, stopping");
                break;
            }
            lambda_min = s.obj1();
            self.add_solution(s);
        }
    }

    fn is_undominated_yet(&self, s: &SecondaryStructure) -> bool {
        !self.pareto.iter().any(|p| p.dominates(s))
    }

    fn add_solution(&mut self, s: SecondaryStructure) {
        // Stale entries can only appear when solutions tie on obj1.
        self.pareto.retain(|p| {
            if s.dominates(p) {
                debug!("removing dominated structure from Pareto set: {}", p);
                false
            } else {
                true
            }
        });
        info!("adding structure to Pareto set: {}", s);
        self.pareto.push(s);
    }

    /// Maximize obj2 subject to lambda_min <= obj1 <= lambda_max, read the
    /// assignment back, and forbid it for later calls. None means the
    /// feasible region is exhausted (or the time budget ran out).
    fn solve_objective2(&mut self, lambda_min: f64, lambda_max: f64) -> Option<SecondaryStructure> {
        debug!(
            "solving objective 2 with {} <= obj1 <= {}",
            lambda_min, lambda_max
        );
        self.solver.set_objective(self.model.obj2().clone());
        let mut bounds = Vec::new();
        if lambda_min.is_finite() {
            bounds.push(self.solver.add_constraint(
                self.model.obj1().clone(),
                Sense::Ge,
                lambda_min,
            ));
        }
        if lambda_max.is_finite() {
            bounds.push(self.solver.add_constraint(
                self.model.obj1().clone(),
                Sense::Le,
                lambda_max,
            ));
        }

        let outcome = self.solver.solve();
        let result = match outcome {
            SolveOutcome::Infeasible => {
                debug!("no more solutions to find");
                None
            }
            SolveOutcome::TimedOut => {
                warn!("solver time budget exhausted; returning the Pareto set found so far");
                None
            }
            SolveOutcome::Optimal(value) => {
                debug!("solution with objective 2 value {}", value);
                let s = self.model.materialize(&self.solver);
                self.forbid_current_assignment();
                Some(s)
            }
        };

        for id in bounds {
            self.solver.remove_constraint(id);
        }
        self.solver.clear_objective();
        result
    }

    /// Exclude exactly the current assignment:
    /// sum over ones of (1 - x) plus sum over zeros of x must be >= 1.
    fn forbid_current_assignment(&mut self) {
        let mut expr = LinExpr::new();
        let mut ones = 0usize;
        for var in 0..self.solver.num_vars() {
            if self.solver.var_value(var) > 0.5 {
                expr.add_term(var, -1.0);
                ones += 1;
            } else {
                expr.add_term(var, 1.0);
            }
        }
        self.solver.add_constraint(expr, Sense::Ge, 1.0 - ones as f64);
        debug!("added the {}th constraint (forbid clause)", self.solver.num_constraints());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch_bound::BranchBound;
    use crate::model::IpModel;
    use mf_motifs::{Component, Motif, MotifSource};
    use mf_partition::BasePairProbs;

    fn two_component_motif(id: &str, score: i32, c1: (usize, usize), c2: (usize, usize)) -> Motif {
        Motif {
            id: id.into(),
            source: MotifSource::RnaMotifAtlas,
            score,
            reversed: false,
            components: vec![Component::new(c1.0, c1.1), Component::new(c2.0, c2.1)],
            links: vec![],
        }
    }

    fn single_component_motif(id: &str, score: i32, start: usize, end: usize) -> Motif {
        Motif {
            id: id.into(),
            source: MotifSource::RnaMotifAtlas,
            score,
            reversed: false,
            components: vec![Component::new(start, end)],
            links: vec![],
        }
    }

    /// A 12-nt toy posterior with a 3-pair helix.
    fn toy_probs() -> BasePairProbs {
        let mut p = BasePairProbs::zeros(12);
        p.set(0, 11, 0.9);
        p.set(1, 10, 0.8);
        p.set(2, 9, 0.3);
        p
    }

    #[test]
    fn test_walker_without_motifs_finds_best_accuracy() {
        let mut solver = BranchBound::new();
        let model = IpModel::build(&mut solver, &toy_probs(), vec![], 0.01);
        let mut walker = ParetoWalker::new(solver, model);
        let pareto = walker.explore().to_vec();
        assert_eq!(pareto.len(), 1);
        let best = &pareto[0];
        assert_eq!(best.obj1(), 0.0);
        assert!((best.obj2() - 2.0).abs() < 1e-9);
        assert_eq!(best.pairs(), &[(0, 11), (1, 10), (2, 9)]);
    }

    #[test]
    fn test_compatible_motif_dominates_plain_structure() {
        // The motif's closing pairs are both part of the accuracy optimum,
        // so inserting it costs nothing and its structure replaces the
        // plain one on the frontier.
        let mut solver = BranchBound::new();
        let site = two_component_motif("IL_9.1", 10, (1, 2), (9, 10));
        let model = IpModel::build(&mut solver, &toy_probs(), vec![site], 0.01);
        let mut walker = ParetoWalker::new(solver, model);
        let pareto = walker.explore().to_vec();
        assert_eq!(pareto.len(), 1);
        let best = &pareto[0];
        assert_eq!(best.obj1(), 10.0);
        assert!((best.obj2() - 2.0).abs() < 1e-9);
        assert_eq!(best.motifs().len(), 1);
        assert_eq!(best.motifs()[0].identifier(), "IL_9.1");
    }

    #[test]
    fn test_overlapping_equal_sites_both_on_frontier() {
        // Two equal-scored sites sharing nucleotides: K4 forbids the
        // combination, and neither singleton dominates the other.
        let mut solver = BranchBound::new();
        let a = two_component_motif("IL_A", 5, (0, 1), (10, 11));
        let b = two_component_motif("IL_B", 5, (1, 2), (9, 10));
        let model = IpModel::build(&mut solver, &toy_probs(), vec![a, b], 0.01);
        let mut walker = ParetoWalker::new(solver, model);
        let pareto = walker.explore().to_vec();
        assert_eq!(pareto.len(), 2);
        let ids: Vec<String> = pareto
            .iter()
            .map(|s| s.motifs()[0].identifier())
            .collect();
        assert!(ids.contains(&"IL_A".to_string()));
        assert!(ids.contains(&"IL_B".to_string()));
        for s in &pareto {
            assert_eq!(s.motifs().len(), 1);
            assert_eq!(s.obj1(), 5.0);
            assert!((s.obj2() - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_forbid_clause_changes_next_solution() {
        let mut solver = BranchBound::new();
        let model = IpModel::build(&mut solver, &toy_probs(), vec![], 0.01);
        let mut walker = ParetoWalker::new(solver, model);
        let first = walker.solve_objective2(f64::NEG_INFINITY, f64::INFINITY).unwrap();
        let second = walker.solve_objective2(f64::NEG_INFINITY, f64::INFINITY).unwrap();
        assert_ne!(first.pairs(), second.pairs());
        assert!(second.obj2() < first.obj2() + 1e-9);
    }

    #[test]
    fn test_pareto_invariant() {
        let mut solver = BranchBound::new();
        let site = single_component_motif("IL_9.1", 10, 1, 10);
        let model = IpModel::build(&mut solver, &toy_probs(), vec![site], 0.01);
        let mut walker = ParetoWalker::new(solver, model);
        let pareto = walker.explore().to_vec();
        for (a, sa) in pareto.iter().enumerate() {
            for (b, sb) in pareto.iter().enumerate() {
                if a != b {
                    assert!(!sa.dominates(sb), "{} dominates {}", sa, sb);
                }
            }
        }
    }

    #[test]
    fn test_unreachable_motif_is_never_inserted() {
        // theta above every p(u, v): no y variables at all, so K6
        // degenerates to C <= 0 and the Pareto set is the empty structure.
        let mut solver = BranchBound::new();
        let site = single_component_motif("IL_9.1", 10, 1, 10);
        let model = IpModel::build(&mut solver, &toy_probs(), vec![site], 0.99);
        let mut walker = ParetoWalker::new(solver, model);
        let pareto = walker.explore().to_vec();
        assert_eq!(pareto.len(), 1);
        assert!(pareto[0].is_empty_structure());
        assert_eq!(pareto[0].obj1(), 0.0);
        assert_eq!(pareto[0].obj2(), 0.0);
    }
}
