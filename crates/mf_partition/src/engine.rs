use ndarray::Array2;
use rayon::prelude::*;

use mf_energy::{EnergyParams, LoopEval, RnaSequence, rt_37};

/// Which recursion computes the ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FoldMode {
    /// Pseudoknot-free, O(n^3) with the fast interior-loop slabs.
    #[default]
    NoPkFast,
    /// Pseudoknot-free reference recursion, O(n^4).
    NoPkReference,
    /// Pseudoknot-enabled, experimental.
    PkFast,
    /// Pseudoknot-enabled reference, experimental.
    PkSlow,
}

/// Pseudoknot-free partition-function tables.
#[derive(Debug, Clone)]
pub struct PartitionTables {
    pub n: usize,
    pub q: Array2<f64>,
    pub qb: Array2<f64>,
    pub qm: Array2<f64>,
}

#[inline]
pub(crate) fn boltz(dg: f64, rt: f64) -> f64 {
    (-dg / rt).exp()
}

fn seeded(n: usize) -> (Array2<f64>, Array2<f64>, Array2<f64>) {
    let mut q = Array2::zeros((n, n));
    let qb = Array2::zeros((n, n));
    let qm = Array2::zeros((n, n));
    // l = 2, 3, 4: no hairpin fits, only the empty structure contributes.
    for l in 2..5 {
        for i in 0..=(n - l) {
            q[[i, i + l - 1]] = 1.0;
        }
    }
    (q, qb, qm)
}

/// Reference O(n^4) recursion (Dirks & Pierce 2003; McCaskill 1990).
/// Computes Q, Qb and Qm; the multiloop energy is the linear
/// a1 + k*a2 + u*a3 model; pseudoknots are assumed impossible.
pub fn partition_reference(seq: &RnaSequence, params: &EnergyParams) -> PartitionTables {
    let n = seq.len();
    let rt = rt_37();
    let (a1, a2, a3) = (params.a1, params.a2, params.a3);
    let (mut q, mut qb, mut qm) = seeded(n);

    for l in 5..=n {
        // Cells at length l only read lengths < l, so the loop over i is
        // data-parallel; results are committed after the sweep.
        let cells: Vec<(usize, f64, f64, f64)> = (0..=(n - l))
            .into_par_iter()
            .map(|i| {
                let j = i + l - 1;
                let eval = LoopEval::new(params, seq.bases());

                let mut qb_ij = 0.0;
                if seq.can_pair(i, j) {
                    qb_ij = boltz(eval.hairpin(i, j), rt);
                    for d in (i + 1)..=j.saturating_sub(5) {
                        for e in (d + 4)..=(j - 1) {
                            let qb_de = qb[[d, e]];
                            if qb_de == 0.0 {
                                continue;
                            }
                            qb_ij += qb_de * boltz(eval.interior(i, d, e, j, false), rt);
                            if d >= i + 2 {
                                qb_ij += qb_de
                                    * qm[[i + 1, d - 1]]
                                    * boltz(a1 + 2.0 * a2 + (j - e - 1) as f64 * a3, rt);
                            }
                        }
                    }
                }

                let mut qm_ij = 0.0;
                let mut q_ij = 1.0;
                for d in i..=(j - 4) {
                    for e in (d + 4)..=j {
                        let qb_de = qb[[d, e]];
                        if qb_de == 0.0 {
                            continue;
                        }
                        qm_ij += qb_de * boltz(a2 + a3 * (d - i + j - e) as f64, rt);
                        if d > i {
                            qm_ij += qb_de * qm[[i, d - 1]] * boltz(a2 + a3 * (j - e) as f64, rt);
                            q_ij += q[[i, d - 1]] * qb_de;
                        } else {
                            q_ij += qb_de;
                        }
                    }
                }
                (i, qb_ij, qm_ij, q_ij)
            })
            .collect();

        for (i, qb_ij, qm_ij, q_ij) in cells {
            let j = i + l - 1;
            qb[[i, j]] = qb_ij;
            qm[[i, j]] = qm_ij;
            q[[i, j]] = q_ij;
        }
    }

    log::info!("partition function is {:e}", q[[0, n - 1]]);
    PartitionTables { n, q, qb, qm }
}

/// Per-row result of one parallel sweep of the fast recursion.
struct FastCell {
    i: usize,
    qb: f64,
    qs: f64,
    qms: f64,
    qm: f64,
    q: f64,
    qx2_row: Option<Vec<f64>>,
}

/// O(n^3) recursion: Qs and Qms collapse the rightmost-pair double sums,
/// and generic interior loops with both sides >= 4 are amortized across
/// lengths through the rolling Qx/Qx1/Qx2 slabs (a weight recorded at loop
/// size s ages by exp(-(Gloop(s+2) - Gloop(s))/RT) per length step).
/// Agrees with `partition_reference` to numeric tolerance.
pub fn partition_fast(seq: &RnaSequence, params: &EnergyParams) -> PartitionTables {
    let n = seq.len();
    let rt = rt_37();
    let (a1, a2, a3) = (params.a1, params.a2, params.a3);
    let (mut q, mut qb, mut qm) = seeded(n);
    let mut qs: Array2<f64> = Array2::zeros((n, n));
    let mut qms: Array2<f64> = Array2::zeros((n, n));
    let mut qx: Array2<f64> = Array2::zeros((n, n));
    let mut qx1: Array2<f64> = Array2::zeros((n, n));
    let mut qx2: Array2<f64> = Array2::zeros((n, n));

    for l in 5..=n {
        // Age the slabs by two length steps.
        std::mem::swap(&mut qx, &mut qx1);
        std::mem::swap(&mut qx1, &mut qx2);
        qx2.fill(0.0);

        let cells: Vec<FastCell> = (0..=(n - l))
            .into_par_iter()
            .map(|i| {
                let j = i + l - 1;
                let eval = LoopEval::new(params, seq.bases());

                // Fresh generic interior loops become extensible once the
                // shorter side reaches 4; record them at their total size.
                let mut qx_row: Vec<f64> = qx.row(i).to_vec();
                if l >= 15 {
                    let d = i + 5; // L1 = 4, L2 >= 4
                    for e in (d + 4)..=(j - 5) {
                        let l2 = j - e - 1;
                        qx_row[4 + l2] += qb[[d, e]]
                            * boltz(eval.asymmetry(4, l2)
                                + eval.mismatch_interior(d, e, d + 1, e - 1), rt);
                    }
                    let e = j - 5; // L2 = 4, L1 > 4
                    for d in (i + 6)..=(e - 4) {
                        let l1 = d - i - 1;
                        qx_row[l1 + 4] += qb[[d, e]]
                            * boltz(eval.asymmetry(l1, 4)
                                + eval.mismatch_interior(d, e, d + 1, e - 1), rt);
                    }
                }
                let qx2_row = if l >= 15 && i > 0 {
                    let mut row = vec![0.0; n];
                    for s in 8..=(l - 7) {
                        row[s + 2] = qx_row[s]
                            * boltz(eval.gloop(s + 2) - eval.gloop(s), rt);
                    }
                    Some(row)
                } else {
                    None
                };

                let mut qb_ij = 0.0;
                if seq.can_pair(i, j) {
                    qb_ij = boltz(eval.hairpin(i, j), rt);
                    if l >= 15 {
                        // Close the aged generic loops with this pair's mismatch.
                        let mm_ij = boltz(eval.mismatch_interior(i, j, i + 1, j - 1), rt);
                        for s in 8..=(l - 7) {
                            qb_ij += qx_row[s] * mm_ij;
                        }
                    }
                    // Small inextensible loops, L1 <= 3 and L2 <= 3.
                    for d in (i + 1)..=(i + 4) {
                        for e in (d + 4).max(j.saturating_sub(4))..=(j - 1) {
                            let qb_de = qb[[d, e]];
                            if qb_de > 0.0 {
                                qb_ij += qb_de * boltz(eval.interior(i, d, e, j, false), rt);
                            }
                        }
                    }
                    // Bulges and asymmetric loops, L1 <= 3 and L2 >= 4.
                    for d in (i + 1)..=(i + 4) {
                        for e in (d + 4)..=j.saturating_sub(5) {
                            let qb_de = qb[[d, e]];
                            if qb_de > 0.0 {
                                qb_ij += qb_de * boltz(eval.interior(i, d, e, j, false), rt);
                            }
                        }
                    }
                    // Bulges and asymmetric loops, L2 <= 3 and L1 >= 4.
                    for e in j.saturating_sub(4)..=(j - 1) {
                        for d in (i + 5)..=e.saturating_sub(4) {
                            let qb_de = qb[[d, e]];
                            if qb_de > 0.0 {
                                qb_ij += qb_de * boltz(eval.interior(i, d, e, j, false), rt);
                            }
                        }
                    }
                    // Multiloop closure.
                    for d in (i + 6)..=j.saturating_sub(5) {
                        qb_ij += qm[[i + 1, d - 1]] * qms[[d, j - 1]] * boltz(a1 + a2, rt);
                    }
                }

                // Rightmost pair starting at i, plain and multiloop-weighted.
                let mut qs_ij = 0.0;
                let mut qms_ij = 0.0;
                for d in (i + 4)..=j {
                    let qb_id = if d == j { qb_ij } else { qb[[i, d]] };
                    if qb_id == 0.0 {
                        continue;
                    }
                    qs_ij += qb_id;
                    qms_ij += qb_id * boltz(a2 + a3 * (j - d) as f64, rt);
                }

                let mut qm_ij = 0.0;
                let mut q_ij = 1.0;
                for d in i..=(j - 4) {
                    let (qs_dj, qms_dj) = if d == i {
                        (qs_ij, qms_ij)
                    } else {
                        (qs[[d, j]], qms[[d, j]])
                    };
                    qm_ij += qms_dj * boltz(a3 * (d - i) as f64, rt);
                    if d > i {
                        qm_ij += qms_dj * qm[[i, d - 1]];
                        q_ij += q[[i, d - 1]] * qs_dj;
                    } else {
                        q_ij += qs_dj;
                    }
                }

                FastCell { i, qb: qb_ij, qs: qs_ij, qms: qms_ij, qm: qm_ij, q: q_ij, qx2_row }
            })
            .collect();

        for cell in cells {
            let j = cell.i + l - 1;
            qb[[cell.i, j]] = cell.qb;
            qs[[cell.i, j]] = cell.qs;
            qms[[cell.i, j]] = cell.qms;
            qm[[cell.i, j]] = cell.qm;
            q[[cell.i, j]] = cell.q;
            if let Some(row) = cell.qx2_row {
                for (s, v) in row.into_iter().enumerate() {
                    qx2[[cell.i - 1, s]] = v;
                }
            }
        }
    }

    log::info!("partition function (fast) is {:e}", q[[0, n - 1]]);
    PartitionTables { n, q, qb, qm }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_energy::default_params;

    fn tables_for(seq: &str) -> (PartitionTables, PartitionTables) {
        let rna = RnaSequence::new("test", seq).unwrap();
        let p = default_params();
        (partition_reference(&rna, p), partition_fast(&rna, p))
    }

    #[test]
    fn test_no_pairs_means_empty_ensemble() {
        let (slow, fast) = tables_for("AAAAA");
        assert_eq!(slow.q[[0, 4]], 1.0);
        assert_eq!(fast.q[[0, 4]], 1.0);
        assert_eq!(slow.qb[[0, 4]], 0.0);
    }

    #[test]
    fn test_hairpin_dominates() {
        let (slow, _) = tables_for("GCGCAAAAGCGC");
        // The full ensemble outweighs the empty structure by orders of
        // magnitude thanks to the 4-stack stem.
        assert!(slow.q[[0, 11]] > 100.0);
        assert!(slow.qb[[0, 11]] > 0.0);
    }

    #[test]
    fn test_engines_agree_short() {
        for seq in ["GCGCAAAAGCGC", "GGGAAAUCCC", "AUGCAUGGCAUGCAUCG"] {
            let (slow, fast) = tables_for(seq);
            let n = slow.n;
            let rel = (slow.q[[0, n - 1]] - fast.q[[0, n - 1]]).abs() / slow.q[[0, n - 1]];
            assert!(rel < 1e-6, "{}: rel error {}", seq, rel);
        }
    }

    #[test]
    fn test_engines_agree_long_with_generic_loops() {
        // Long enough (> 15 nt windows) to exercise the Qx slabs.
        let seq = "GGGGCUAAAAAAAAGCAAAAGCUAAAAAAAAGCCCC";
        let (slow, fast) = tables_for(seq);
        let n = slow.n;
        for i in 0..n {
            for j in i..n {
                let a = slow.q[[i, j]];
                let b = fast.q[[i, j]];
                let denom = a.abs().max(1.0);
                assert!((a - b).abs() / denom < 1e-6,
                    "Q({}, {}) mismatch: {} vs {}", i, j, a, b);
            }
        }
        let rel = (slow.qb[[0, n - 1]] - fast.qb[[0, n - 1]]).abs()
            / slow.qb[[0, n - 1]].max(f64::MIN_POSITIVE);
        assert!(rel < 1e-6);
    }

    #[test]
    fn test_unpairable_closing_has_no_weight() {
        let (slow, _) = tables_for("GCGCAAAAGCGC");
        // (0, 5) is G-A: no closed ensemble.
        assert_eq!(slow.qb[[0, 5]], 0.0);
    }
}
