use log::{debug, info};
use rustc_hash::FxHashMap;

use mf_motifs::Motif;
use mf_partition::BasePairProbs;

use crate::solver::{LinExpr, MilpSolver, Sense, VarId};
use crate::structure::SecondaryStructure;

/// The 0/1 program over one sequence: decision variables y(u,v) for every
/// allowed base pair and C(x,i) for every candidate motif component, the
/// pairing and insertion constraint families, and the two linear
/// objectives. Rebuilt fresh per sequence; the walker only mutates it by
/// appending forbid clauses.
#[derive(Debug)]
pub struct IpModel {
    n: usize,
    /// (u, v, p(u,v)) per y variable, in creation order.
    y_pairs: Vec<(usize, usize, f64)>,
    y_index: FxHashMap<(usize, usize), VarId>,
    sites: Vec<Motif>,
    /// Per site, one variable per component.
    c_vars: Vec<Vec<VarId>>,
    obj1: LinExpr,
    obj2: LinExpr,
}

impl IpModel {
    /// Create the decision variables and constraints on the solver.
    pub fn build<S: MilpSolver>(
        solver: &mut S,
        probs: &BasePairProbs,
        sites: Vec<Motif>,
        theta: f64,
    ) -> Self {
        let n = probs.len();

        // y(u,v) for every pair above the probability cutoff.
        let mut y_pairs = Vec::new();
        let mut y_index = FxHashMap::default();
        for u in 0..n.saturating_sub(6) {
            for v in (u + 4)..n {
                let p = probs.get(u, v);
                if p > theta {
                    let var = solver.add_bool_var(format!("y{},{}", u, v));
                    y_index.insert((u, v), var);
                    y_pairs.push((u, v, p));
                }
            }
        }

        // C(x,i) for every component of every candidate site.
        let mut c_vars = Vec::with_capacity(sites.len());
        for (x, site) in sites.iter().enumerate() {
            debug!("candidate insertion site {}", site.pos_string());
            let vars = site
                .components
                .iter()
                .enumerate()
                .map(|(i, c)| solver.add_bool_var(format!("C{},{}-{}", x, i, c.pos.0)))
                .collect();
            c_vars.push(vars);
        }
        info!(
            "{} + {} (yuv + Cxi) decision variables are used",
            y_pairs.len(),
            solver.num_vars() - y_pairs.len()
        );

        let mut model = IpModel {
            n,
            y_pairs,
            y_index,
            sites,
            c_vars,
            obj1: LinExpr::new(),
            obj2: LinExpr::new(),
        };
        model.add_constraints(solver);
        info!("a total of {} constraints are used", solver.num_constraints());

        // obj1: motif scores, weighted on each site's first component.
        let mut obj1 = LinExpr::new();
        for (x, site) in model.sites.iter().enumerate() {
            obj1.add_term(model.c_vars[x][0], site.score as f64);
        }
        // obj2: expected accuracy over the allowed pairs.
        let mut obj2 = LinExpr::new();
        for &(u, v, p) in &model.y_pairs {
            obj2.add_term(model.y_index[&(u, v)], p);
        }
        model.obj1 = obj1;
        model.obj2 = obj2;
        model
    }

    /// The pair (u, v) is an allowed decision variable: far enough apart,
    /// inside the modeled region, and above the probability cutoff.
    pub fn allowed(&self, u: usize, v: usize) -> bool {
        let (a, b) = if v > u { (u, v) } else { (v, u) };
        if b - a < 4 {
            return false;
        }
        if a + 6 >= self.n || b >= self.n {
            return false;
        }
        self.y_index.contains_key(&(a, b))
    }

    /// The y variable of an allowed pair, order-insensitive.
    pub fn y(&self, u: usize, v: usize) -> Option<VarId> {
        let (a, b) = if v > u { (u, v) } else { (v, u) };
        self.y_index.get(&(a, b)).copied()
    }

    pub fn c(&self, x: usize, i: usize) -> VarId {
        self.c_vars[x][i]
    }

    pub fn obj1(&self) -> &LinExpr {
        &self.obj1
    }

    pub fn obj2(&self) -> &LinExpr {
        &self.obj2
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn sites(&self) -> &[Motif] {
        &self.sites
    }

    fn add_constraints<S: MilpSolver>(&self, solver: &mut S) {
        let n = self.n;

        // At most one pairing per nucleotide.
        for u in 0..n {
            let mut expr = LinExpr::new();
            let mut count = 0;
            for v in 0..u {
                if let Some(var) = self.allowed_y(v, u) {
                    expr.add_term(var, 1.0);
                    count += 1;
                }
            }
            for v in (u + 4)..n {
                if let Some(var) = self.allowed_y(u, v) {
                    expr.add_term(var, 1.0);
                    count += 1;
                }
            }
            if count > 1 {
                solver.add_constraint(expr, Sense::Le, 1.0);
            }
        }

        // No lone base pairs, left-end form.
        for u in 0..n {
            let mut expr = LinExpr::new();
            let mut count = 0;
            if u > 0 {
                for v in u..n {
                    if let Some(var) = self.allowed_y(u - 1, v) {
                        expr.add_term(var, 1.0);
                    }
                }
            }
            for v in (u + 1)..n {
                if let Some(var) = self.allowed_y(u, v) {
                    expr.add_term(var, -1.0);
                    count += 1;
                }
            }
            for v in (u + 2)..n {
                if let Some(var) = self.allowed_y(u + 1, v) {
                    expr.add_term(var, 1.0);
                }
            }
            if count > 0 {
                solver.add_constraint(expr, Sense::Ge, 0.0);
            }
        }
        // No lone base pairs, right-end form.
        for v in 2..n {
            let mut expr = LinExpr::new();
            let mut count = 0;
            for u in 0..=(v - 2) {
                if let Some(var) = self.allowed_y(u, v - 1) {
                    expr.add_term(var, 1.0);
                }
            }
            for u in 0..v {
                if let Some(var) = self.allowed_y(u, v) {
                    expr.add_term(var, -1.0);
                    count += 1;
                }
            }
            for u in 0..=v {
                if let Some(var) = self.allowed_y(u, v + 1) {
                    expr.add_term(var, 1.0);
                }
            }
            if count > 0 {
                solver.add_constraint(expr, Sense::Ge, 0.0);
            }
        }

        // No base pair strictly inside an inserted component.
        for (x, site) in self.sites.iter().enumerate() {
            for (i, comp) in site.components.iter().enumerate() {
                let k = comp.k() as f64;
                let mut expr = LinExpr::new();
                expr.add_term(self.c_vars[x][i], k - 2.0);
                let mut count = 0;
                for u in (comp.pos.0 + 1)..comp.pos.1.saturating_sub(1) {
                    for v in 0..n {
                        if let Some(var) = self.allowed_y(u, v) {
                            expr.add_term(var, 1.0);
                            count += 1;
                        }
                    }
                }
                if count > 1 {
                    solver.add_constraint(expr, Sense::Le, k - 2.0);
                }
            }
        }

        // No two inserted components may cover the same nucleotide.
        for u in 0..n {
            let mut expr = LinExpr::new();
            let mut nterms = 0;
            for (x, site) in self.sites.iter().enumerate() {
                for (i, comp) in site.components.iter().enumerate() {
                    if comp.contains(u) {
                        expr.add_term(self.c_vars[x][i], 1.0);
                        nterms += 1;
                    }
                }
            }
            if nterms > 1 {
                solver.add_constraint(expr, Sense::Le, 1.0);
            }
        }

        // All-or-nothing insertion of multi-component motifs.
        for (x, site) in self.sites.iter().enumerate() {
            if site.components.len() < 2 {
                continue;
            }
            let mut expr = LinExpr::new();
            for i in 1..site.components.len() {
                expr.add_term(self.c_vars[x][i], 1.0);
            }
            expr.add_term(self.c_vars[x][0], -((site.components.len() - 1) as f64));
            solver.add_constraint(expr, Sense::Eq, 0.0);
        }

        // The closing base pairs of an inserted motif must exist. With no
        // allowed pair the sum degenerates and the motif is forbidden.
        for (x, site) in self.sites.iter().enumerate() {
            let first = site.components[0].pos.0;
            let last = site.components.last().expect("validated motif").pos.1;
            let mut expr = LinExpr::new();
            expr.add_term(self.c_vars[x][0], 1.0);
            if let Some(var) = self.allowed_y(first, last) {
                expr.add_term(var, -1.0);
            }
            solver.add_constraint(expr, Sense::Le, 0.0);
            for j in 0..site.components.len().saturating_sub(1) {
                let mut expr = LinExpr::new();
                expr.add_term(self.c_vars[x][j], 1.0);
                if let Some(var) =
                    self.allowed_y(site.components[j].pos.1, site.components[j + 1].pos.0)
                {
                    expr.add_term(var, -1.0);
                }
                solver.add_constraint(expr, Sense::Le, 0.0);
            }
        }
    }

    fn allowed_y(&self, u: usize, v: usize) -> Option<VarId> {
        if self.allowed(u, v) {
            self.y(u, v)
        } else {
            None
        }
    }

    /// Read the solver's assignment back into a structure.
    pub fn materialize<S: MilpSolver>(&self, solver: &S) -> SecondaryStructure {
        let mut s = SecondaryStructure::new(self.n);
        for (x, site) in self.sites.iter().enumerate() {
            // All-or-nothing insertion makes the first component decisive.
            if solver.var_value(self.c_vars[x][0]) > 0.5 {
                s.insert_motif(site);
            }
        }
        for &(u, v, _) in &self.y_pairs {
            if solver.var_value(self.y_index[&(u, v)]) > 0.5 {
                s.set_basepair(u, v);
            }
        }
        s.sort();
        s.set_objectives(self.obj1.eval(solver), self.obj2.eval(solver));
        s
    }
}
