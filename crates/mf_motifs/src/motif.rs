use std::fmt;

/// Which catalog a motif came from. The distinction only matters at parse
/// time and when formatting identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotifSource {
    Rna3dMotif,
    RnaMotifAtlas,
    Carnaval,
}

/// One contiguous segment of a motif: a 0-based inclusive position interval
/// plus an optional sequence pattern (literal bases and gap dots).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub pos: (usize, usize),
    pub seq: Option<String>,
}

impl Component {
    pub fn new(start: usize, end: usize) -> Self {
        Component { pos: (start, end), seq: None }
    }

    pub fn with_seq(start: usize, end: usize, seq: &str) -> Self {
        Component { pos: (start, end), seq: Some(seq.to_string()) }
    }

    /// Segment length.
    pub fn k(&self) -> usize {
        self.pos.1 - self.pos.0 + 1
    }

    pub fn contains(&self, u: usize) -> bool {
        u >= self.pos.0 && u <= self.pos.1
    }
}

/// A base-pair annotation between two motif positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub nts: (usize, usize),
    pub long_range: bool,
}

/// A structural motif: provenance, score, and an ordered list of
/// components. Immutable once parsed; candidate insertion sites are clones
/// with concrete component positions.
#[derive(Debug, Clone)]
pub struct Motif {
    pub id: String,
    pub source: MotifSource,
    pub score: i32,
    pub reversed: bool,
    pub components: Vec<Component>,
    pub links: Vec<Link>,
}

impl Motif {
    /// `RIN<id>` for Carnaval, the atlas id for the Motif Atlas, the PDB id
    /// otherwise.
    pub fn identifier(&self) -> String {
        match self.source {
            MotifSource::Carnaval => format!("RIN{}", self.id),
            _ => self.id.clone(),
        }
    }

    pub fn pos_string(&self) -> String {
        let mut s = format!("{} ( ", self.identifier());
        for c in &self.components {
            s.push_str(&format!("{}-{} ", c.pos.0, c.pos.1));
        }
        s.push(')');
        s
    }

    /// Total number of nucleotides covered by the components.
    pub fn total_length(&self) -> usize {
        self.components.iter().map(|c| c.k()).sum()
    }

    /// Serialization inverse of the jar3d CSV decoder (1-based positions).
    pub fn to_jar3d_csv(&self) -> String {
        let mut s = format!(
            "{},{},{}",
            self.id,
            if self.reversed { "True" } else { "False" },
            self.score
        );
        s.push_str(&format!(",{},{}", self.components[0].pos.0 + 1, self.components[0].pos.1 + 1));
        match self.components.get(1) {
            Some(c) => s.push_str(&format!(",{},{}", c.pos.0 + 1, c.pos.1 + 1)),
            None => s.push_str(",-"),
        }
        s
    }

    /// Serialization inverse of the BayesPairing CSV decoder.
    pub fn to_bayespairing_csv(&self) -> String {
        let mut s = format!("{},{}", self.id, self.score);
        for c in &self.components {
            s.push_str(&format!(",{},{}", c.pos.0 + 1, c.pos.1 + 1));
        }
        s
    }
}

impl PartialEq for Motif {
    fn eq(&self, other: &Self) -> bool {
        self.identifier() == other.identifier()
            && self.score == other.score
            && self.reversed == other.reversed
            && self.components == other.components
    }
}

impl fmt::Display for Motif {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pos_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motif(id: &str, source: MotifSource) -> Motif {
        Motif {
            id: id.to_string(),
            source,
            score: 8,
            reversed: false,
            components: vec![Component::new(2, 5), Component::new(12, 14)],
            links: vec![],
        }
    }

    #[test]
    fn test_identifier_formatting() {
        assert_eq!(motif("42", MotifSource::Carnaval).identifier(), "RIN42");
        assert_eq!(motif("IL_85647.3", MotifSource::RnaMotifAtlas).identifier(), "IL_85647.3");
        assert_eq!(motif("1Y27", MotifSource::Rna3dMotif).identifier(), "1Y27");
    }

    #[test]
    fn test_pos_string() {
        let m = motif("42", MotifSource::Carnaval);
        assert_eq!(m.pos_string(), "RIN42 ( 2-5 12-14 )");
    }

    #[test]
    fn test_total_length_and_contains() {
        let m = motif("x", MotifSource::Rna3dMotif);
        assert_eq!(m.total_length(), 7);
        assert!(m.components[0].contains(2));
        assert!(m.components[0].contains(5));
        assert!(!m.components[0].contains(6));
    }

    #[test]
    fn test_equality_ignores_links() {
        let mut a = motif("x", MotifSource::Rna3dMotif);
        let b = motif("x", MotifSource::Rna3dMotif);
        a.links.push(Link { nts: (0, 6), long_range: false });
        assert_eq!(a, b);
        let mut c = b.clone();
        c.score = 9;
        assert_ne!(a, c);
    }
}
