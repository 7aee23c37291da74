use colored::*;
use log::warn;
use ndarray::Array2;

use mf_energy::{EnergyParams, LoopEval, RnaSequence, rt_37};

use crate::engine::{boltz, FoldMode};
use crate::tensor::Tensor4;

/// Pseudoknot-enabled partition-function tables: the pair matrices plus the
/// gapped tensors of the Dirks & Pierce recursion.
#[derive(Debug, Clone)]
pub struct PkPartitionTables {
    pub n: usize,
    pub q: Array2<f64>,
    pub qb: Array2<f64>,
    pub qm: Array2<f64>,
    pub qp: Array2<f64>,
    pub qz: Array2<f64>,
    pub qg: Tensor4,
    pub qgl: Tensor4,
    pub qgr: Tensor4,
    pub qgls: Tensor4,
    pub qgrs: Tensor4,
}

/// Pseudoknot-enabled recursion (Dirks & Pierce 2003). Both fold modes run
/// the same reference body for now; the fast-interior-loop specialization
/// of the gapped tensors is unfinished and neither mode is suitable for
/// production use.
pub fn partition_pseudoknots(
    seq: &RnaSequence,
    params: &EnergyParams,
    mode: FoldMode,
) -> PkPartitionTables {
    let label = match mode {
        FoldMode::PkFast => "fast O(n^5)",
        FoldMode::PkSlow => "slow O(n^8)",
        _ => panic!("partition_pseudoknots called without a pseudoknot mode"),
    };
    warn!(
        "{} you are using the {} computation of the partition function, \
         which is an unfinished method. Your results will be wrong!",
        "/!\\".red().bold(),
        label
    );

    let n = seq.len();
    let rt = rt_37();
    let eval = LoopEval::new(params, seq.bases());
    let (a1, a2, a3) = (params.a1, params.a2, params.a3);
    let b1 = params.pk_penalty;
    let b1m = params.pk_multiloop_penalty;
    let b1p = params.pk_pk_penalty;
    let b2 = params.pk_paired_penalty;
    let b3 = params.pk_unpaired_penalty;

    let mut q: Array2<f64> = Array2::zeros((n, n));
    let mut qb: Array2<f64> = Array2::zeros((n, n));
    let mut qm: Array2<f64> = Array2::zeros((n, n));
    let mut qp: Array2<f64> = Array2::zeros((n, n));
    let mut qz: Array2<f64> = Array2::zeros((n, n));
    let mut qg = Tensor4::zeros(n);
    let mut qgl = Tensor4::zeros(n);
    let mut qgr = Tensor4::zeros(n);
    let mut qgls = Tensor4::zeros(n);
    let mut qgrs = Tensor4::zeros(n);

    let allowed = |u: usize, v: usize| seq.can_span(u, v) && seq.can_pair(u, v);
    let wc = |u: usize, v: usize| seq.pair_type(u, v).is_wc();
    // Empty windows Q(i, i-1) and Qz(i, i-1) count as 1.
    let left = |m: &Array2<f64>, i: usize, d: usize| if d > i { m[[i, d - 1]] } else { 1.0 };

    for l in 1..=n {
        for i in 0..=(n - l) {
            let j = i + l - 1;

            if allowed(i, j) {
                // Qb recursion.
                let mut qb_ij = boltz(eval.hairpin(i, j), rt);
                for d in (i + 1)..=j.saturating_sub(5) {
                    for e in (d + 4)..=(j - 1) {
                        if !allowed(d, e) {
                            continue;
                        }
                        qb_ij += boltz(eval.interior(i, d, e, j, true), rt) * qb[[d, e]];
                        if d >= i + 6 && wc(d, e) && wc(i, j) {
                            qb_ij += qm[[i + 1, d - 1]]
                                * qb[[d, e]]
                                * boltz(a1 + 2.0 * a2 + (j - e - 1) as f64 * a3, rt);
                        }
                    }
                }
                if wc(i, j) {
                    // Rightmost pseudoknot filling [d, e] inside the pair.
                    for d in (i + 1)..=j.saturating_sub(9) {
                        for e in (d + 8)..=(j - 1) {
                            let g = a1 + b1m + 3.0 * a2 + (j - e - 1) as f64 * a3;
                            qb_ij += boltz(g + a3 * (d - i - 1) as f64, rt) * qp[[d, e]];
                            qb_ij += qm[[i + 1, d - 1]] * qp[[d, e]] * boltz(g, rt);
                        }
                    }
                }
                qb[[i, j]] = qb_ij;

                // Qg: a gapped helix, optionally extended by one interior loop.
                qg.set(i, i, j, j, 1.0);
                for d in (i + 1)..=j.saturating_sub(5) {
                    for e in (d + 4)..=(j - 1) {
                        if allowed(d, e) {
                            qg.add(i, d, e, j, boltz(eval.interior(i, d, e, j, true), rt));
                        }
                    }
                }
            }

            if allowed(i, j) && wc(i, j) {
                // Qg: multiloop closures on either or both sides.
                for d in (i + 6)..=j.saturating_sub(5) {
                    for e in (d + 4)..=(j - 1) {
                        if allowed(d, e) && wc(d, e) {
                            qg.add(i, d, e, j,
                                qm[[i + 1, d - 1]]
                                    * boltz(a1 + 2.0 * a2 + (j - e - 1) as f64 * a3, rt));
                        }
                    }
                }
                for d in (i + 1)..=j.saturating_sub(10) {
                    for e in (d + 4)..=(j - 6) {
                        if allowed(d, e) && wc(d, e) {
                            qg.add(i, d, e, j,
                                boltz(a1 + 2.0 * a2 + (d - i - 1) as f64 * a3, rt)
                                    * qm[[e + 1, j - 1]]);
                        }
                    }
                }
                for d in (i + 6)..=j.saturating_sub(10) {
                    for e in (d + 4)..=(j - 6) {
                        if allowed(d, e) && wc(d, e) {
                            qg.add(i, d, e, j,
                                qm[[i + 1, d - 1]] * boltz(a1 + 2.0 * a2, rt) * qm[[e + 1, j - 1]]);
                        }
                    }
                }
                // Interior extension plus multiloop, left / right / both.
                for d in (i + 7)..=j.saturating_sub(6) {
                    for e in (d + 4)..=(j - 2) {
                        if !allowed(d, e) {
                            continue;
                        }
                        for f in (e + 1)..=(j - 1) {
                            qg.add(i, d, e, j,
                                qgls.get(i + 1, d, e, f)
                                    * boltz(a1 + a2 + (j - f - 1) as f64 * a3, rt));
                        }
                    }
                }
                for d in (i + 2)..=j.saturating_sub(11) {
                    for e in (d + 4)..=(j - 7) {
                        if !allowed(d, e) {
                            continue;
                        }
                        for c in (i + 1)..=(d - 1) {
                            qg.add(i, d, e, j,
                                boltz(a1 + a2 + (c - i - 1) as f64 * a3, rt)
                                    * qgrs.get(c, d, e, j - 1));
                        }
                    }
                }
                for d in (i + 7)..=j.saturating_sub(11) {
                    for e in (d + 4)..=(j - 7) {
                        if !allowed(d, e) {
                            continue;
                        }
                        for c in (i + 6)..=(d - 1) {
                            qg.add(i, d, e, j,
                                qm[[i + 1, c - 1]] * qgrs.get(c, d, e, j - 1) * boltz(a1 + a2, rt));
                        }
                    }
                }
            }

            // Qgls / Qgrs: gapped helix glued to a multiloop arm.
            for c in (i + 5)..=j.saturating_sub(6) {
                if !(allowed(c, j) && wc(c, j)) {
                    continue;
                }
                for d in (c + 1)..=j.saturating_sub(5) {
                    for e in (d + 4)..=(j - 1) {
                        if allowed(d, e) {
                            qgls.add(i, d, e, j,
                                boltz(a2, rt) * qm[[i, c - 1]] * qg.get(c, d, e, j));
                        }
                    }
                }
            }
            for d in (i + 1)..=j.saturating_sub(10) {
                for e in (d + 4)..=(j - 6) {
                    if !allowed(d, e) {
                        continue;
                    }
                    for f in (e + 1)..=(j - 5) {
                        if allowed(i, f) && wc(i, f) {
                            qgrs.add(i, d, e, j,
                                qg.get(i, d, e, f) * qm[[f + 1, j]] * boltz(a2, rt));
                        }
                    }
                }
            }

            // Qgl / Qgr: compose inner segments through the gap region Qz.
            for d in (i + 1)..=j.saturating_sub(5) {
                for f in (d + 4)..=(j - 1) {
                    if !(allowed(d, f) && wc(d, f)) {
                        continue;
                    }
                    for e in d..=(f - 3) {
                        let qz_de = if e > d { qz[[d + 1, e]] } else { 1.0 };
                        qgl.add(i, e, f, j, qg.get(i, d, f, j) * qz_de * boltz(b2, rt));
                    }
                }
            }
            for d in (i + 1)..=j.saturating_sub(4) {
                for e in (d + 3)..=(j - 1) {
                    for f in e..=(j - 1) {
                        let qz_ef = if f > e { qz[[e, f - 1]] } else { 1.0 };
                        qgr.add(i, d, e, j, qgl.get(i, d, f, j) * qz_ef);
                    }
                }
            }

            // Qp: two gapped hemispheres sharing crossing helices.
            for d in (i + 2)..=j.saturating_sub(4) {
                for e in (d + 2).max(i + 5)..=j.saturating_sub(3) {
                    for f in (e + 1)..=(j - 2) {
                        qp[[i, j]] += qgl.get(i, d - 1, e, f) * qgr.get(d, e - 1, f + 1, j);
                    }
                }
            }

            // Q, Qm, Qz recursions.
            let interior_window = i > 0 && j != n - 1;
            let mut q_ij = 1.0;
            let mut qm_ij = 0.0;
            let mut qz_ij = if interior_window {
                boltz(b3 * (j - i + 1) as f64, rt)
            } else {
                0.0
            };
            for d in i..=j.saturating_sub(4) {
                for e in (d + 4)..=j {
                    if !(allowed(d, e) && wc(d, e)) {
                        continue;
                    }
                    let qb_de = qb[[d, e]];
                    q_ij += left(&q, i, d) * qb_de;
                    if interior_window {
                        qm_ij += boltz(a2 + (d - i + j - e) as f64 * a3, rt) * qb_de;
                        if d >= i + 5 {
                            qm_ij += qm[[i, d - 1]] * qb_de
                                * boltz(a2 + (j - e) as f64 * a3, rt);
                        }
                        qz_ij += left(&qz, i, d) * qb_de
                            * boltz(b2 + (j - e) as f64 * b3, rt);
                    }
                }
            }
            for d in i..=j.saturating_sub(8) {
                for e in (d + 8)..=j {
                    let qp_de = qp[[d, e]];
                    if qp_de == 0.0 {
                        continue;
                    }
                    q_ij += left(&q, i, d) * qp_de * boltz(b1, rt);
                    if interior_window {
                        qm_ij += boltz(b1m + 2.0 * a2 + (d - i + j - e) as f64 * a3, rt) * qp_de;
                        if d >= i + 5 {
                            qm_ij += qm[[i, d - 1]] * qp_de
                                * boltz(b1m + 2.0 * a2 + (j - e) as f64 * a3, rt);
                        }
                        qz_ij += left(&qz, i, d) * qp_de
                            * boltz(b1p + 2.0 * b2 + (j - e) as f64 * b3, rt);
                    }
                }
            }
            q[[i, j]] = q_ij;
            qm[[i, j]] = qm_ij;
            if interior_window {
                qz[[i, j]] = qz_ij;
            }
        }
    }

    log::info!("pseudoknot partition function is {:e}", q[[0, n - 1]]);
    PkPartitionTables { n, q, qb, qm, qp, qz, qg, qgl, qgr, qgls, qgrs }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_energy::default_params;

    #[test]
    fn test_pk_tables_have_sane_shape() {
        let rna = RnaSequence::new("test", "GCGCAAAAGCGC").unwrap();
        let t = partition_pseudoknots(&rna, default_params(), FoldMode::PkSlow);
        assert_eq!(t.n, 12);
        assert!(t.q[[0, t.n - 1]] >= 1.0);
        for i in 0..t.n {
            for j in i..t.n {
                assert!(t.q[[i, j]].is_finite());
                assert!(t.qb[[i, j]] >= 0.0);
            }
        }
    }

    #[test]
    fn test_pk_ensemble_contains_the_stem() {
        let rna = RnaSequence::new("test", "GCGCAAAAGCGC").unwrap();
        let t = partition_pseudoknots(&rna, default_params(), FoldMode::PkFast);
        // The closed ensemble at the outer stem pair must carry weight.
        assert!(t.qb[[0, 11]] > 0.0);
    }

    #[test]
    #[should_panic(expected = "without a pseudoknot mode")]
    fn test_pk_rejects_plain_modes() {
        let rna = RnaSequence::new("test", "GCGCAAAAGCGC").unwrap();
        partition_pseudoknots(&rna, default_params(), FoldMode::NoPkFast);
    }
}
