use std::fmt::Write as _;

use colored::*;
use ndarray::Array2;

use mf_energy::{EnergyParams, LoopEval, RnaSequence, rt_37};

use crate::engine::{boltz, partition_fast, partition_reference, FoldMode, PartitionTables};
use crate::pseudoknots::partition_pseudoknots;

/// Posterior base-pair probabilities p(i, j). Symmetric; stored
/// upper-triangular.
#[derive(Debug, Clone)]
pub struct BasePairProbs {
    n: usize,
    p: Array2<f64>,
}

impl BasePairProbs {
    pub(crate) fn from_upper(p: Array2<f64>) -> Self {
        let n = p.nrows();
        BasePairProbs { n, p }
    }

    pub fn zeros(n: usize) -> Self {
        BasePairProbs { n, p: Array2::zeros((n, n)) }
    }

    /// Directly set p(u, v); for externally supplied posteriors and tests.
    pub fn set(&mut self, u: usize, v: usize, p: f64) {
        let (a, b) = if u < v { (u, v) } else { (v, u) };
        self.p[[a, b]] = p;
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline]
    pub fn get(&self, u: usize, v: usize) -> f64 {
        if u == v {
            return 0.0;
        }
        let (a, b) = if u < v { (u, v) } else { (v, u) };
        self.p[[a, b]]
    }

    /// Total pairing probability of nucleotide u; at most 1 in a consistent
    /// ensemble.
    pub fn row_sum(&self, u: usize) -> f64 {
        (0..self.n).map(|v| self.get(u, v)).sum()
    }

    /// The -log10(p) map the verbose mode prints: one digit per pair, with
    /// the pairs above theta (the future decision variables) in green.
    pub fn render(&self, seq: &RnaSequence, theta: f64) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\t=== -log10(p(i,j)) for each pair (i,j) of nucleotides: ===");
        let _ = writeln!(out, "\t{}", seq.as_str());
        for u in 0..self.n {
            let mut row = String::new();
            for v in 0..self.n {
                let p = self.get(u, v);
                if p < 5e-10 {
                    row.push(' ');
                } else {
                    let digit = format!("{}", (-p.log10()) as i32);
                    if p > theta {
                        row.push_str(&format!("{}", digit.green()));
                    } else {
                        row.push_str(&digit);
                    }
                }
            }
            let _ = writeln!(out, "\t{}{}", row, seq.base(u));
        }
        let _ = writeln!(out, "\t{} basepairs are kept as decision variables.", "green".green());
        out
    }
}

/// Outside recursion over the pseudoknot-free tables: probability mass is
/// distributed from P(0, n-1) = 1 down through Pb and Pm using the ratios
/// already stored in Q, Qb and Qm. The final p(i, j) is Pb(i, j).
pub fn posterior_no_pk(
    seq: &RnaSequence,
    params: &EnergyParams,
    t: &PartitionTables,
) -> BasePairProbs {
    let n = t.n;
    let rt = rt_37();
    let (a1, a2, a3) = (params.a1, params.a2, params.a3);
    let eval = LoopEval::new(params, seq.bases());

    let mut p: Array2<f64> = Array2::zeros((n, n));
    let mut pb: Array2<f64> = Array2::zeros((n, n));
    let mut pm: Array2<f64> = Array2::zeros((n, n));
    p[[0, n - 1]] = 1.0;

    for l in (5..=n).rev() {
        for i in 0..=(n - l) {
            let j = i + l - 1;

            let p_ij = p[[i, j]];
            let pm_ij = pm[[i, j]];
            let q_ij = t.q[[i, j]];
            let qm_ij = t.qm[[i, j]];
            for d in i..=(j - 4) {
                for e in (d + 4)..=j {
                    let qb_de = t.qb[[d, e]];
                    if qb_de == 0.0 {
                        continue;
                    }
                    if p_ij > 0.0 {
                        let dp = if d > i {
                            p_ij * t.q[[i, d - 1]] * qb_de / q_ij
                        } else {
                            p_ij * qb_de / q_ij
                        };
                        debug_assert!(dp.is_finite());
                        if d > i {
                            p[[i, d - 1]] += dp;
                        }
                        pb[[d, e]] += dp;
                    }
                    if pm_ij > 0.0 {
                        let dp = pm_ij * qb_de * boltz(a2 + a3 * (d - i + j - e) as f64, rt) / qm_ij;
                        debug_assert!(dp.is_finite());
                        pb[[d, e]] += dp;
                        if d > i {
                            let dp = pm_ij
                                * t.qm[[i, d - 1]]
                                * qb_de
                                * boltz(a2 + a3 * (j - e) as f64, rt)
                                / qm_ij;
                            debug_assert!(dp.is_finite());
                            pm[[i, d - 1]] += dp;
                            pb[[d, e]] += dp;
                        }
                    }
                }
            }

            let pb_ij = pb[[i, j]];
            let qb_ij = t.qb[[i, j]];
            if pb_ij > 0.0 && qb_ij > 0.0 {
                for d in (i + 1)..=j.saturating_sub(5) {
                    for e in (d + 4)..=(j - 1) {
                        let qb_de = t.qb[[d, e]];
                        if qb_de == 0.0 {
                            continue;
                        }
                        let dp = pb_ij * qb_de * boltz(eval.interior(i, d, e, j, false), rt) / qb_ij;
                        debug_assert!(dp.is_finite());
                        pb[[d, e]] += dp;
                        if d >= i + 2 {
                            let dp = pb_ij
                                * t.qm[[i + 1, d - 1]]
                                * qb_de
                                * boltz(a1 + 2.0 * a2 + (j - e - 1) as f64 * a3, rt)
                                / qb_ij;
                            debug_assert!(dp.is_finite());
                            pm[[i + 1, d - 1]] += dp;
                            pb[[d, e]] += dp;
                        }
                    }
                }
            }
        }
    }

    BasePairProbs::from_upper(pb)
}

/// The pseudoknot posterior is unfinished: the outside pass over
/// Qg/Qgl/Qgr has never been validated and is stubbed to the zero matrix.
pub fn posterior_pk(n: usize) -> BasePairProbs {
    log::warn!(
        "{} the pseudoknot posterior is a stub; all pairing probabilities are zero",
        "WARNING:".red()
    );
    BasePairProbs::zeros(n)
}

/// Full pipeline: partition function then posterior, per fold mode.
pub fn base_pair_probabilities(
    seq: &RnaSequence,
    params: &EnergyParams,
    mode: FoldMode,
) -> BasePairProbs {
    match mode {
        FoldMode::NoPkFast => {
            let t = partition_fast(seq, params);
            posterior_no_pk(seq, params, &t)
        }
        FoldMode::NoPkReference => {
            let t = partition_reference(seq, params);
            posterior_no_pk(seq, params, &t)
        }
        FoldMode::PkFast | FoldMode::PkSlow => {
            let _ = partition_pseudoknots(seq, params, mode);
            posterior_pk(seq.len())
        }
    }
}
