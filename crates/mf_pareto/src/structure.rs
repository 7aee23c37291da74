use std::fmt;

use mf_motifs::Motif;

const OPEN: [char; 4] = ['(', '[', '{', '<'];
const CLOSE: [char; 4] = [')', ']', '}', '>'];

/// One feasible secondary structure read back from the solver: its base
/// pairs, the motifs it inserts, and the two objective values.
#[derive(Debug, Clone)]
pub struct SecondaryStructure {
    n: usize,
    pairs: Vec<(usize, usize)>,
    motifs: Vec<Motif>,
    objectives: [f64; 2],
}

impl SecondaryStructure {
    pub fn new(n: usize) -> Self {
        SecondaryStructure { n, pairs: Vec::new(), motifs: Vec::new(), objectives: [0.0; 2] }
    }

    pub fn set_basepair(&mut self, u: usize, v: usize) {
        debug_assert!(u < v && v < self.n);
        self.pairs.push((u, v));
    }

    pub fn insert_motif(&mut self, m: &Motif) {
        self.motifs.push(m.clone());
    }

    pub fn sort(&mut self) {
        self.pairs.sort_unstable();
    }

    pub fn set_objectives(&mut self, obj1: f64, obj2: f64) {
        self.objectives = [obj1, obj2];
    }

    pub fn obj1(&self) -> f64 {
        self.objectives[0]
    }

    pub fn obj2(&self) -> f64 {
        self.objectives[1]
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    pub fn motifs(&self) -> &[Motif] {
        &self.motifs
    }

    pub fn is_empty_structure(&self) -> bool {
        self.pairs.is_empty() && self.motifs.is_empty()
    }

    /// Pareto dominance: at least as good on both objectives and strictly
    /// better on one.
    pub fn dominates(&self, other: &Self) -> bool {
        self.obj1() >= other.obj1()
            && self.obj2() >= other.obj2()
            && (self.obj1() > other.obj1() || self.obj2() > other.obj2())
    }

    /// Dot-bracket rendering; crossing pairs are pushed to deeper bracket
    /// levels (pseudoknot notation).
    pub fn to_bracket_string(&self) -> String {
        let mut chars: Vec<char> = vec!['.'; self.n];
        let mut sorted = self.pairs.clone();
        sorted.sort_unstable();
        let mut levels: Vec<Vec<(usize, usize)>> = Vec::new();
        for &(u, v) in &sorted {
            let crosses = |placed: &[(usize, usize)]| {
                placed.iter().any(|&(a, b)| (a < u && u < b && b < v) || (u < a && a < v && v < b))
            };
            let level = match levels.iter().position(|placed| !crosses(placed)) {
                Some(l) => l,
                None => {
                    levels.push(Vec::new());
                    levels.len() - 1
                }
            };
            levels[level].push((u, v));
            chars[u] = OPEN[level % OPEN.len()];
            chars[v] = CLOSE[level % CLOSE.len()];
        }
        chars.into_iter().collect()
    }
}

impl fmt::Display for SecondaryStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{:.2}\t{:.2}", self.to_bracket_string(), self.obj1(), self.obj2())?;
        for m in &self.motifs {
            write!(f, "\t+ {}", m.pos_string())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_motifs::{Component, MotifSource};

    fn structure(n: usize, pairs: &[(usize, usize)], obj1: f64, obj2: f64) -> SecondaryStructure {
        let mut s = SecondaryStructure::new(n);
        for &(u, v) in pairs {
            s.set_basepair(u, v);
        }
        s.sort();
        s.set_objectives(obj1, obj2);
        s
    }

    #[test]
    fn test_dot_bracket_nested() {
        let s = structure(12, &[(0, 11), (1, 10), (2, 9), (3, 8)], 0.0, 3.9);
        assert_eq!(s.to_bracket_string(), "((((....))))");
    }

    #[test]
    fn test_dot_bracket_crossing() {
        let s = structure(10, &[(0, 5), (3, 9)], 0.0, 0.0);
        assert_eq!(s.to_bracket_string(), "(..[.)...]");
    }

    #[test]
    fn test_dominance() {
        let a = structure(5, &[], 1.0, 1.0);
        let b = structure(5, &[], 1.0, 0.5);
        let c = structure(5, &[], 0.5, 2.0);
        assert!(a.dominates(&b));
        assert!(!b.dominates(&a));
        assert!(!a.dominates(&c));
        assert!(!c.dominates(&a));
        assert!(!a.dominates(&a.clone()));
    }

    #[test]
    fn test_display_with_motif() {
        let mut s = structure(10, &[(0, 9)], 10.0, 1.5);
        s.insert_motif(&Motif {
            id: "3".into(),
            source: MotifSource::Carnaval,
            score: 10,
            reversed: false,
            components: vec![Component::new(1, 4)],
            links: vec![],
        });
        let text = s.to_string();
        assert!(text.starts_with("(........)\t10.00\t1.50"));
        assert!(text.contains("RIN3 ( 1-4 )"));
    }
}
