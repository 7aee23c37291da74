use crate::nucleotides::{Base, PairTypeRNA};
use crate::params::EnergyParams;

/// Closed-form loop free energies over one sequence. All costs are pure
/// functions of the sequence and the parameter set.
pub struct LoopEval<'a> {
    params: &'a EnergyParams,
    seq: &'a [Base],
}

/// Table index of a loop base; N aliases the A entry, which also serves
/// the "no mismatch" lookups.
#[inline]
fn ti(b: Base) -> usize {
    match b {
        Base::N => 0,
        b => b as usize,
    }
}

impl<'a> LoopEval<'a> {
    pub fn new(params: &'a EnergyParams, seq: &'a [Base]) -> Self {
        LoopEval { params, seq }
    }

    #[inline]
    fn pt(&self, i: usize, j: usize) -> PairTypeRNA {
        PairTypeRNA::from((self.seq[i], self.seq[j]))
    }

    /// Terminal AU penalty for the pair closing at (i, j).
    #[inline]
    pub fn au_penalty(&self, i: usize, j: usize) -> f64 {
        match self.pt(i, j) {
            PairTypeRNA::AU | PairTypeRNA::UA => self.params.au_penalty,
            _ => 0.0,
        }
    }

    /// Generic interior-loop initiation for total size l, with the
    /// logarithmic extrapolation above 30.
    pub fn gloop(&self, l: usize) -> f64 {
        let p = self.params;
        if l <= 30 {
            p.interior37[l - 1]
        } else {
            p.interior37[29] + p.loop_greater30 * (l as f64 / 30.0).ln()
        }
    }

    /// Asymmetry cost of an interior loop with side lengths l1, l2.
    pub fn asymmetry(&self, l1: usize, l2: usize) -> f64 {
        let p = self.params;
        let penalty = (l1 as f64 - l2 as f64).abs()
            * p.asymmetry_penalty[l1.min(l2).min(4) - 1];
        self.gloop(l1 + l2) + p.max_asymmetry.min(penalty)
    }

    /// Interior closing mismatch for the pair (i, j) with loop bases at
    /// positions k (5') and l (3').
    #[inline]
    pub fn mismatch_interior(&self, i: usize, j: usize, k: usize, l: usize) -> f64 {
        self.params.mismatch_interior37[ti(self.seq[k])][ti(self.seq[l])]
            [self.pt(i, j) as usize]
    }

    /// Interior mismatch for a side too short to carry one.
    #[inline]
    pub fn mismatch_interior_default(&self, i: usize, j: usize) -> f64 {
        self.params.mismatch_interior37[0][0][self.pt(i, j) as usize]
    }

    /// Hairpin loop closed by (i, j), size j - i - 1 >= 3.
    pub fn hairpin(&self, i: usize, j: usize) -> f64 {
        let p = self.params;
        let s = self.seq;
        let size = j - i - 1;
        assert!(size >= 3, "hairpin ({}, {}) below minimum size", i, j);

        let poly_c = s[i + 1..j].iter().all(|&b| b == Base::C);

        let mut e = if size <= 30 {
            p.hairpin37[size - 1]
        } else {
            p.hairpin37[29] + p.loop_greater30 * (size as f64 / 30.0).ln()
        };

        if size == 3 {
            e += self.au_penalty(i, j);
            e += p.triloop37[ti(s[i])][ti(s[i + 1])][ti(s[i + 2])][ti(s[j - 1])][ti(s[j])];
            if poly_c {
                e += p.polyc_penalty;
            }
            if s[i + 1] == Base::G && s[i + 2] == Base::G && s[j - 1] == Base::G {
                e += p.hairpin_ggg;
            }
        } else if size == 4 {
            e += p.tloop37[ti(s[i])][ti(s[i + 1])][ti(s[i + 2])]
                [ti(s[j - 2])][ti(s[j - 1])][ti(s[j])];
            e += p.mismatch_hairpin37[ti(s[i + 1])][ti(s[j - 1])][self.pt(i, j) as usize];
            if poly_c {
                e += p.polyc_slope * size as f64 + p.polyc_int;
            }
        } else {
            e += p.mismatch_hairpin37[ti(s[i + 1])][ti(s[j - 1])][self.pt(i, j) as usize];
            if poly_c {
                e += p.polyc_slope * size as f64 + p.polyc_int;
            }
        }
        e
    }

    /// Interior loop (stack, bulge or true interior) closed by (i, j) with
    /// enclosed pair (h, m). `pk` scales the cost when the loop sits inside
    /// a pseudoknot.
    pub fn interior(&self, i: usize, h: usize, m: usize, j: usize, pk: bool) -> f64 {
        let p = self.params;
        let s = self.seq;
        let l1 = h - i - 1;
        let l2 = j - m - 1;
        let size = l1 + l2;

        // helix
        if size == 0 {
            let span = if pk { p.pk_stack_span } else { 1.0 };
            return p.stack37[self.pt(i, j) as usize][self.pt(h, m) as usize] * span;
        }

        let mut e;
        if l1 == 0 || l2 == 0 {
            // bulge
            e = if size <= 30 {
                p.bulge37[size - 1]
            } else {
                p.bulge37[29] + p.loop_greater30 * (size as f64 / 30.0).ln()
            };
            if size == 1 {
                // single bulge, treated as a stacked region
                e += p.stack37[self.pt(i, j) as usize][self.pt(h, m) as usize];
                e -= p.salt_correction;
            } else {
                e += self.au_penalty(i, j);
                e += self.au_penalty(h, m);
            }
        } else {
            let asymmetry = l1.abs_diff(l2);
            if asymmetry > 1 || size > 4 {
                e = self.asymmetry(l1, l2);
                if l1 > 1 && l2 > 1 {
                    e += self.mismatch_interior(m, h, m + 1, h - 1);
                    e += self.mismatch_interior(i, j, i + 1, j - 1);
                } else if l1 == 1 || l2 == 1 {
                    e += self.mismatch_interior_default(m, h);
                    e += self.mismatch_interior_default(i, j);
                } else {
                    unreachable!("unclassified interior loop ({}, {})", l1, l2);
                }
            } else if l1 == 1 && l2 == 1 {
                e = p.int11_37[self.pt(i, j) as usize][self.pt(h, m) as usize]
                    [ti(s[i + 1])][ti(s[j - 1])];
            } else if l1 == 2 && l2 == 2 {
                e = p.int22_37[self.pt(i, j) as usize][self.pt(h, m) as usize]
                    [ti(s[i + 1])][ti(s[j - 1])][ti(s[i + 2])][ti(s[j - 2])];
            } else if l1 == 1 && l2 == 2 {
                e = p.int21_37[self.pt(i, j) as usize][ti(s[j - 2])][ti(s[i + 1])]
                    [self.pt(h, m) as usize][ti(s[j - 1])];
            } else if l1 == 2 && l2 == 1 {
                e = p.int21_37[self.pt(m, h) as usize][ti(s[i + 1])][ti(s[j - 1])]
                    [self.pt(j, i) as usize][ti(s[i + 2])];
            } else {
                unreachable!("error in tabulated interior loop ({}, {})", l1, l2);
            }
        }
        e * if pk { p.pk_interior_span } else { 1.0 }
    }

    /// Linear multiloop model: a1 + a2 * branches + a3 * unpaired.
    pub fn multiloop(&self, branches: usize, unpaired: usize) -> f64 {
        let p = self.params;
        p.a1 + p.a2 * branches as f64 + p.a3 * unpaired as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::default_params;
    use crate::nucleotides::NucleotideVec;

    fn eval_on(seq: &str) -> (NucleotideVec, &'static EnergyParams) {
        (NucleotideVec::from_lossy(seq), default_params())
    }

    #[test]
    fn test_tetraloop_hairpin() {
        let (seq, p) = eval_on("GCGCAAAAGCGC");
        let eval = LoopEval::new(p, &seq);
        // CG closing an AAAA loop: initiation + A/A closing mismatch, no
        // tetraloop bonus for cAAAAg.
        let e = eval.hairpin(3, 8);
        let expected = p.hairpin37[3]
            + p.mismatch_hairpin37[0][0][PairTypeRNA::CG as usize];
        assert!((e - expected).abs() < 1e-9);
    }

    #[test]
    fn test_triloop_au_penalty() {
        let (seq, p) = eval_on("GCAUUUUCG");
        let eval = LoopEval::new(p, &seq);
        // A-U closing a UUU loop: size-3 hairpins carry the AU terminal
        // penalty instead of a closing mismatch.
        let e = eval.hairpin(2, 6);
        assert!((e - (p.hairpin37[2] + p.au_penalty)).abs() < 1e-9);
    }

    #[test]
    fn test_poly_c_hairpin() {
        let (seq, p) = eval_on("GCCCCCC");
        let eval = LoopEval::new(p, &seq);
        // G(CCCCC)C: size-5 poly-C loop.
        let e = eval.hairpin(0, 6);
        let expected = p.hairpin37[4]
            + p.mismatch_hairpin37[1][1][PairTypeRNA::GC as usize]
            + p.polyc_slope * 5.0
            + p.polyc_int;
        assert!((e - expected).abs() < 1e-9);
    }

    #[test]
    fn test_stack() {
        let (seq, p) = eval_on("GCGCAAAAGCGC");
        let eval = LoopEval::new(p, &seq);
        let e = eval.interior(0, 1, 10, 11, false);
        assert_eq!(e, p.stack37[PairTypeRNA::GC as usize][PairTypeRNA::CG as usize]);
        assert!(e < -3.0);
    }

    #[test]
    fn test_single_bulge_stacks() {
        let (seq, p) = eval_on("GACAAAAAGC");
        let eval = LoopEval::new(p, &seq);
        // closing (0, 9) G-C, inner (2, 8) C-G, one bulged A on the 5' side:
        // treated as a stacked region.
        let e = eval.interior(0, 2, 8, 9, false);
        let expected = p.bulge37[0]
            + p.stack37[PairTypeRNA::GC as usize][PairTypeRNA::CG as usize]
            - p.salt_correction;
        assert!((e - expected).abs() < 1e-9);
    }

    #[test]
    fn test_large_bulge_au_penalties() {
        let (seq, p) = eval_on("ACAAAAAAAAAGAAU");
        let eval = LoopEval::new(p, &seq);
        // closing (0, 14) A-U, inner (1, 11) C-G, two bulged bases on the
        // 3' side: both closing pairs pay their terminal penalty.
        let e = eval.interior(0, 1, 11, 14, false);
        let expected = p.bulge37[1] + eval.au_penalty(0, 14) + eval.au_penalty(1, 11);
        assert!((e - expected).abs() < 1e-9);
    }

    #[test]
    fn test_int11_lookup() {
        let (seq, p) = eval_on("GAGAAACUC");
        let eval = LoopEval::new(p, &seq);
        // closing (0, 8) G-C, inner (2, 6) G-C, 1x1 loop A/U.
        let e = eval.interior(0, 2, 6, 8, false);
        let expected = p.int11_37[PairTypeRNA::GC as usize][PairTypeRNA::GC as usize]
            [Base::A as usize][Base::U as usize];
        assert_eq!(e, expected);
    }

    #[test]
    fn test_asymmetric_interior() {
        let (seq, p) = eval_on("GAAAGAAACAUC");
        let eval = LoopEval::new(p, &seq);
        // closing (0, 11) G-C, inner (4, 8) G-C, l1 = 3, l2 = 2.
        let e = eval.interior(0, 4, 8, 11, false);
        let expected = eval.asymmetry(3, 2)
            + eval.mismatch_interior(8, 4, 9, 3)
            + eval.mismatch_interior(0, 11, 1, 10);
        assert!((e - expected).abs() < 1e-9);
    }

    #[test]
    fn test_gloop_extrapolation() {
        let (seq, p) = eval_on("GCGCAAAAGCGC");
        let eval = LoopEval::new(p, &seq);
        assert_eq!(eval.gloop(30), p.interior37[29]);
        let g40 = eval.gloop(40);
        assert!((g40 - (p.interior37[29] + p.loop_greater30 * (40.0f64 / 30.0).ln())).abs() < 1e-9);
        assert!(g40 > eval.gloop(30));
    }

    #[test]
    fn test_multiloop_linear() {
        let (seq, p) = eval_on("GCGCAAAAGCGC");
        let eval = LoopEval::new(p, &seq);
        assert!((eval.multiloop(2, 3) - (p.a1 + 2.0 * p.a2 + 3.0 * p.a3)).abs() < 1e-12);
    }
}
