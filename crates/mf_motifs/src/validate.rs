use std::fmt;

use crate::motif::{Motif, MotifSource};

/// Why a motif was rejected. Rejections are warnings at the catalog level:
/// the offending motif is skipped and processing continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotifFlaw {
    NonAcguBase(char),
    BadPosition(i64),
    BrokenBackbone(i64, i64),
    HelixTooShort(i64, i64),
    TooShort(usize),
    NoBasePairs,
    NoComponents,
}

impl fmt::Display for MotifFlaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotifFlaw::NonAcguBase(c) => {
                write!(f, "sequence signature contains non-ACGU base '{}'", c)
            }
            MotifFlaw::BadPosition(p) => {
                write!(f, "position {} is not strictly positive", p)
            }
            MotifFlaw::BrokenBackbone(p1, p2) => {
                write!(f, "contiguity annotation between non-consecutive positions {} and {}", p1, p2)
            }
            MotifFlaw::HelixTooShort(p1, p2) => {
                write!(f, "canonical cis pair between {} and {} spans fewer than 4 nucleotides", p1, p2)
            }
            MotifFlaw::TooShort(n) => {
                write!(f, "total length {} is below the 5-nucleotide minimum", n)
            }
            MotifFlaw::NoBasePairs => {
                write!(f, "no base-pair annotations")
            }
            MotifFlaw::NoComponents => {
                write!(f, "no components")
            }
        }
    }
}

impl std::error::Error for MotifFlaw {}

/// Structural validation of a parsed motif. Pattern-carrying motifs
/// (Carnaval RINs, DESC models) must cover at least 5 nucleotides and carry
/// at least one base-pair annotation; score-catalog motifs only need a
/// non-empty component list. DESC geometry is checked at parse time by
/// `DescFile::validate`.
pub fn validate_motif(m: &Motif) -> Result<(), MotifFlaw> {
    if m.components.is_empty() {
        return Err(MotifFlaw::NoComponents);
    }
    let located = m.components.iter().all(|c| c.seq.is_some());
    if located || m.source == MotifSource::Carnaval {
        let len = m.total_length();
        if len < 5 {
            return Err(MotifFlaw::TooShort(len));
        }
        if m.links.is_empty() {
            return Err(MotifFlaw::NoBasePairs);
        }
    }
    Ok(())
}
