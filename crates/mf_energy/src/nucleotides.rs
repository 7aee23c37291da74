use std::fmt;
use std::ops::Deref;

use log::warn;
use colored::*;
use strum::EnumCount;
use strum_macros::EnumCount;

#[derive(Debug)]
pub enum SequenceError {
    Plain(String),
    InvalidChar(char),
    TooShort(usize),
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceError::Plain(s) => {
                write!(f, "ERROR: {}", s)
            }
            SequenceError::InvalidChar(c) => {
                write!(f, "Unsupported nucleotide: '{}'", c)
            }
            SequenceError::TooShort(n) => {
                write!(f, "Sequence of length {} is too short (minimum 5)", n)
            }
        }
    }
}

impl std::error::Error for SequenceError {}

#[derive(Clone, Hash, Copy, Debug, Eq, PartialEq, EnumCount)]
pub enum Base { A, C, G, U, N }

impl TryFrom<char> for Base {
    type Error = SequenceError;
    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_uppercase() {
            'A' => Ok(Base::A),
            'C' => Ok(Base::C),
            'G' => Ok(Base::G),
            'U' | 'T' => Ok(Base::U),
            'N' => Ok(Base::N),
            _ => Err(SequenceError::InvalidChar(c)),
        }
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Base::A => 'A',
            Base::C => 'C',
            Base::G => 'G',
            Base::U => 'U',
            Base::N => 'N',
        };
        write!(f, "{}", c)
    }
}

#[derive(Clone, Hash, Debug, Eq, PartialEq)]
pub struct NucleotideVec(pub Vec<Base>);

impl Deref for NucleotideVec {
    type Target = [Base];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<&str> for NucleotideVec {
    type Error = SequenceError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let mut vec = Vec::with_capacity(s.len());
        for c in s.chars() {
            vec.push(Base::try_from(c)?);
        }
        Ok(NucleotideVec(vec))
    }
}

impl fmt::Display for NucleotideVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for base in &self.0 {
            write!(f, "{}", base)?;
        }
        Ok(())
    }
}

impl NucleotideVec {
    /// Lenient conversion: T becomes U, anything unrecognized becomes a
    /// non-pairing N. Both rewrites emit a single warning.
    pub fn from_lossy(s: &str) -> Self {
        let mut unknown = Vec::new();
        let mut contains_t = false;
        let vec = s.chars().map(|c| {
            if c == 'T' || c == 't' {
                contains_t = true;
            }
            Base::try_from(c).unwrap_or_else(|_| {
                unknown.push(c);
                Base::N
            })
        }).collect();
        if contains_t {
            warn!("{} thymines automatically replaced by uraciles", "WARNING:".red());
        }
        if !unknown.is_empty() {
            warn!("{} unknown chars in input sequence replaced by N: {:?}",
                "WARNING:".red(), unknown);
        }
        NucleotideVec(vec)
    }
}

const PAIR_LOOKUP: [[PairTypeRNA; Base::COUNT]; Base::COUNT] = {
    use Base::*;
    use PairTypeRNA::*;
    let mut table = [[NN; Base::COUNT]; Base::COUNT];
    table[A as usize][U as usize] = AU;
    table[U as usize][A as usize] = UA;
    table[C as usize][G as usize] = CG;
    table[G as usize][C as usize] = GC;
    table[G as usize][U as usize] = GU;
    table[U as usize][G as usize] = UG;
    table
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumCount)]
pub enum PairTypeRNA { AU, UA, CG, GC, GU, UG, NN }

/// Number of real (pairing) pair types, i.e. excluding NN.
pub const NPAIRS: usize = PairTypeRNA::COUNT - 1;

impl From<(Base, Base)> for PairTypeRNA {
    fn from(pair: (Base, Base)) -> Self {
        PAIR_LOOKUP[pair.0 as usize][pair.1 as usize]
    }
}

impl fmt::Display for PairTypeRNA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PairTypeRNA::AU => "A-U",
            PairTypeRNA::UA => "U-A",
            PairTypeRNA::CG => "C-G",
            PairTypeRNA::GC => "G-C",
            PairTypeRNA::GU => "G-U",
            PairTypeRNA::UG => "U-G",
            PairTypeRNA::NN => "N-N",
        };
        write!(f, "{}", s)
    }
}

impl PairTypeRNA {
    pub fn can_pair(&self) -> bool {
        self != &PairTypeRNA::NN
    }

    /// Watson-Crick pairs only (no wobble).
    pub fn is_wc(&self) -> bool {
        matches!(self
            , PairTypeRNA::GC | PairTypeRNA::CG
            | PairTypeRNA::AU | PairTypeRNA::UA)
    }

    pub fn invert(&self) -> PairTypeRNA {
        use PairTypeRNA::*;
        match self {
            AU => UA,
            UA => AU,
            CG => GC,
            GC => CG,
            GU => UG,
            UG => GU,
            NN => NN,
        }
    }
}

/// An immutable RNA sequence: the character form as given (after the T->U
/// rewrite) and the nucleotide-code form, created once at construction.
#[derive(Debug, Clone)]
pub struct RnaSequence {
    name: String,
    chars: String,
    bases: NucleotideVec,
}

impl RnaSequence {
    pub fn new(name: &str, seq: &str) -> Result<Self, SequenceError> {
        if seq.len() < 5 {
            return Err(SequenceError::TooShort(seq.len()));
        }
        let bases = NucleotideVec::from_lossy(seq);
        let chars: String = bases.iter().map(|b| b.to_string()).collect();
        Ok(RnaSequence { name: name.to_string(), chars, bases })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.chars
    }

    pub fn bases(&self) -> &[Base] {
        &self.bases
    }

    pub fn base(&self, i: usize) -> Base {
        self.bases[i]
    }

    pub fn pair_type(&self, i: usize, j: usize) -> PairTypeRNA {
        PairTypeRNA::from((self.bases[i], self.bases[j]))
    }

    pub fn can_pair(&self, i: usize, j: usize) -> bool {
        self.pair_type(i, j).can_pair()
    }

    /// Whether positions u and v are far enough apart to close a hairpin,
    /// regardless of the bases involved. The left end must additionally
    /// leave room for a full hairpin before the 3' tail.
    pub fn can_span(&self, u: usize, v: usize) -> bool {
        let (a, b) = if v > u { (u, v) } else { (v, u) };
        if b - a < 4 {
            return false;
        }
        if a + 4 >= self.len() {
            return false;
        }
        b < self.len()
    }
}

impl fmt::Display for RnaSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.chars)
    }
}
