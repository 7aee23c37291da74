use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::nucleotides::NPAIRS;

#[derive(Debug)]
pub enum ParamError {
    Io(std::io::Error),
    Parse(String),
    MissingValue(&'static str, usize),
    TrailingValues(usize),
}

impl std::error::Error for ParamError {}

impl From<std::io::Error> for ParamError {
    fn from(e: std::io::Error) -> Self {
        ParamError::Io(e)
    }
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamError::Io(e) => write!(f, "I/O error: {}", e),
            ParamError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ParamError::MissingValue(table, index) => {
                write!(f, "Missing value in parameter table '{}' at index {}", table, index)
            }
            ParamError::TrailingValues(n) => {
                write!(f, "{} unread values at end of parameter stream", n)
            }
        }
    }
}

const NB: usize = 4;

/// Nearest-neighbor free-energy parameter set, 37 degrees Celsius, kcal/mol.
/// Read-only after construction.
#[derive(Debug, Clone)]
pub struct EnergyParams {
    pub stack37: [[f64; NPAIRS]; NPAIRS],

    pub hairpin37: [f64; 30],
    pub bulge37: [f64; 30],
    pub interior37: [f64; 30],

    pub asymmetry_penalty: [f64; 4],
    pub max_asymmetry: f64,

    pub mismatch_hairpin37: [[[f64; NPAIRS]; NB]; NB],
    pub mismatch_interior37: [[[f64; NPAIRS]; NB]; NB],

    pub dangle5_37: [[f64; NB]; NPAIRS],
    pub dangle3_37: [[f64; NB]; NPAIRS],

    /// Multiloop linear model: a1 (initiation), a2 (per branch), a3 (per
    /// unpaired nucleotide).
    pub a1: f64,
    pub a2: f64,
    pub a3: f64,

    pub au_penalty: f64,

    pub int11_37: Box<[[[[f64; NB]; NB]; NPAIRS]; NPAIRS]>,
    pub int22_37: Box<[[[[[[f64; NB]; NB]; NB]; NB]; NPAIRS]; NPAIRS]>,
    pub int21_37: Box<[[[[[f64; NB]; NPAIRS]; NB]; NB]; NPAIRS]>,

    pub polyc_penalty: f64,
    pub polyc_slope: f64,
    pub polyc_int: f64,

    pub pk_penalty: f64,
    pub pk_paired_penalty: f64,
    pub pk_unpaired_penalty: f64,
    pub pk_multiloop_penalty: f64,
    pub pk_pk_penalty: f64,
    pub pk_band_penalty: f64,
    pub pk_stack_span: f64,
    pub pk_interior_span: f64,
    pub multiloop_penalty_pk: f64,
    pub multiloop_paired_penalty_pk: f64,
    pub multiloop_unpaired_penalty_pk: f64,

    pub intermolecular_initiation: f64,

    pub triloop37: Box<[[[[[f64; NB]; NB]; NB]; NB]; NB]>,
    pub tloop37: Box<[[[[[[f64; NB]; NB]; NB]; NB]; NB]; NB]>,

    pub salt_correction: f64,
    pub loop_greater30: f64,
    pub hairpin_ggg: f64,
}

/// Cursor over the packed integer stream of the parameter blob.
struct Stream {
    values: Vec<i64>,
    at: usize,
}

impl Stream {
    fn next(&mut self, table: &'static str) -> Result<f64, ParamError> {
        let v = self.values.get(self.at)
            .ok_or(ParamError::MissingValue(table, self.at))?;
        self.at += 1;
        Ok(*v as f64 / 100.0)
    }
}

impl EnergyParams {
    fn zeroed() -> Self {
        EnergyParams {
            stack37: [[0.0; NPAIRS]; NPAIRS],
            hairpin37: [0.0; 30],
            bulge37: [0.0; 30],
            interior37: [0.0; 30],
            asymmetry_penalty: [0.0; 4],
            max_asymmetry: 3.0,
            mismatch_hairpin37: [[[0.0; NPAIRS]; NB]; NB],
            mismatch_interior37: [[[0.0; NPAIRS]; NB]; NB],
            dangle5_37: [[0.0; NB]; NPAIRS],
            dangle3_37: [[0.0; NB]; NPAIRS],
            a1: 0.0,
            a2: 0.0,
            a3: 0.0,
            au_penalty: 0.0,
            int11_37: Box::new([[[[0.0; NB]; NB]; NPAIRS]; NPAIRS]),
            int22_37: Box::new([[[[[[0.0; NB]; NB]; NB]; NB]; NPAIRS]; NPAIRS]),
            int21_37: Box::new([[[[[0.0; NB]; NPAIRS]; NB]; NB]; NPAIRS]),
            polyc_penalty: 0.0,
            polyc_slope: 0.0,
            polyc_int: 0.0,
            pk_penalty: 0.0,
            pk_paired_penalty: 0.0,
            pk_unpaired_penalty: 0.0,
            pk_multiloop_penalty: 0.0,
            pk_pk_penalty: 0.0,
            pk_band_penalty: 0.0,
            pk_stack_span: 1.0,
            pk_interior_span: 1.0,
            multiloop_penalty_pk: 0.0,
            multiloop_paired_penalty_pk: 0.0,
            multiloop_unpaired_penalty_pk: 0.0,
            intermolecular_initiation: 0.0,
            triloop37: Box::new([[[[[0.0; NB]; NB]; NB]; NB]; NB]),
            tloop37: Box::new([[[[[[0.0; NB]; NB]; NB]; NB]; NB]; NB]),
            salt_correction: 0.0,
            loop_greater30: 1.079, // 1.75 * RT
            hairpin_ggg: 0.0,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ParamError> {
        let file = File::open(path)?;
        Self::from_packed_stream(BufReader::new(file))
    }

    /// Parses the packed integer stream: whitespace-separated values in the
    /// fixed order of the blob (stacks, hairpin, bulge, interior, asymmetry,
    /// mismatch tables, dangles, multiloop, AU penalty, 1x1, 2x2, 2x1,
    /// poly-C, pseudoknot, intermolecular, triloops, tetraloops), scaled by
    /// 100 on disk. Lines starting with '#' are comments.
    pub fn from_packed_stream<R: BufRead>(reader: R) -> Result<Self, ParamError> {
        let mut values = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            for tok in line.split_whitespace() {
                let v = tok.parse::<i64>()
                    .map_err(|_| ParamError::Parse(format!("not an integer: '{}'", tok)))?;
                values.push(v);
            }
        }
        let mut s = Stream { values, at: 0 };
        let mut p = EnergyParams::zeroed();

        for x in 0..NPAIRS {
            for y in 0..NPAIRS {
                p.stack37[x][y] = s.next("stack")?;
            }
        }
        for i in 0..30 {
            p.hairpin37[i] = s.next("hairpin")?;
        }
        for i in 0..30 {
            p.bulge37[i] = s.next("bulge")?;
        }
        for i in 0..30 {
            p.interior37[i] = s.next("interior")?;
        }
        for i in 0..4 {
            p.asymmetry_penalty[i] = s.next("asymmetry")?;
        }
        for b1 in 0..NB {
            for b2 in 0..NB {
                for x in 0..NPAIRS {
                    p.mismatch_hairpin37[b1][b2][x] = s.next("mismatch_hairpin")?;
                }
            }
        }
        for b1 in 0..NB {
            for b2 in 0..NB {
                for x in 0..NPAIRS {
                    p.mismatch_interior37[b1][b2][x] = s.next("mismatch_interior")?;
                }
            }
        }
        for x in 0..NPAIRS {
            for b in 0..NB {
                p.dangle5_37[x][b] = s.next("dangle5")?;
            }
        }
        for x in 0..NPAIRS {
            for b in 0..NB {
                p.dangle3_37[x][b] = s.next("dangle3")?;
            }
        }
        p.a1 = s.next("multiloop")?;
        p.a2 = s.next("multiloop")?;
        p.a3 = s.next("multiloop")?;
        p.au_penalty = s.next("au_penalty")?;
        for x in 0..NPAIRS {
            for y in 0..NPAIRS {
                for b1 in 0..NB {
                    for b2 in 0..NB {
                        p.int11_37[x][y][b1][b2] = s.next("int11")?;
                    }
                }
            }
        }
        for x in 0..NPAIRS {
            for y in 0..NPAIRS {
                for a in 0..NB {
                    for b in 0..NB {
                        for c in 0..NB {
                            for d in 0..NB {
                                p.int22_37[x][y][a][b][c][d] = s.next("int22")?;
                            }
                        }
                    }
                }
            }
        }
        for x in 0..NPAIRS {
            for a in 0..NB {
                for b in 0..NB {
                    for y in 0..NPAIRS {
                        for c in 0..NB {
                            p.int21_37[x][a][b][y][c] = s.next("int21")?;
                        }
                    }
                }
            }
        }
        p.polyc_penalty = s.next("polyC")?;
        p.polyc_slope = s.next("polyC")?;
        p.polyc_int = s.next("polyC")?;
        p.pk_penalty = s.next("pseudoknot")?;
        p.pk_paired_penalty = s.next("pseudoknot")?;
        p.pk_unpaired_penalty = s.next("pseudoknot")?;
        p.pk_multiloop_penalty = s.next("pseudoknot")?;
        p.pk_pk_penalty = s.next("pseudoknot")?;
        p.intermolecular_initiation = s.next("intermolecular")?;
        for a in 0..NB {
            for b in 0..NB {
                for c in 0..NB {
                    for d in 0..NB {
                        for e in 0..NB {
                            p.triloop37[a][b][c][d][e] = s.next("triloops")?;
                        }
                    }
                }
            }
        }
        for a in 0..NB {
            for b in 0..NB {
                for c in 0..NB {
                    for d in 0..NB {
                        for e in 0..NB {
                            for f in 0..NB {
                                p.tloop37[a][b][c][d][e][f] = s.next("tetraloops")?;
                            }
                        }
                    }
                }
            }
        }

        if s.at != s.values.len() {
            return Err(ParamError::TrailingValues(s.values.len() - s.at));
        }

        p.multiloop_penalty_pk = p.a1;
        p.multiloop_paired_penalty_pk = p.a2;
        p.multiloop_unpaired_penalty_pk = p.a3;
        Ok(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tiny_stream() -> String {
        // A structurally complete stream with recognizable values in the
        // leading tables and zeros elsewhere.
        let mut v: Vec<i64> = Vec::new();
        v.extend((0..36).map(|i| -(i as i64) * 10)); // stack
        v.extend(std::iter::repeat(570).take(30)); // hairpin
        v.extend(std::iter::repeat(380).take(30)); // bulge
        v.extend(std::iter::repeat(170).take(30)); // interior
        v.extend([50, 50, 50, 50]); // asymmetry
        v.extend(std::iter::repeat(0).take(96 + 96 + 24 + 24));
        v.extend([340, 40, 0, 50]); // multiloop + AU
        v.extend(std::iter::repeat(0).take(576 + 9216 + 2304));
        v.extend([140, 30, 160]); // polyC
        v.extend([960, 10, 10, 1500, 1500]); // pseudoknot
        v.push(558); // intermolecular
        v.extend(std::iter::repeat(0).take(1024 + 4096));
        let mut s = String::from("# test stream\n");
        for chunk in v.chunks(16) {
            let line: Vec<String> = chunk.iter().map(|x| x.to_string()).collect();
            s.push_str(&line.join(" "));
            s.push('\n');
        }
        s
    }

    #[test]
    fn test_parse_packed_stream() {
        let p = EnergyParams::from_packed_stream(Cursor::new(tiny_stream())).unwrap();
        assert_eq!(p.stack37[0][0], 0.0);
        assert_eq!(p.stack37[0][1], -0.1);
        assert_eq!(p.stack37[5][5], -3.5);
        assert_eq!(p.hairpin37[3], 5.7);
        assert_eq!(p.a1, 3.4);
        assert_eq!(p.a2, 0.4);
        assert_eq!(p.au_penalty, 0.5);
        assert_eq!(p.polyc_slope, 0.3);
        assert_eq!(p.pk_penalty, 9.6);
        assert_eq!(p.pk_multiloop_penalty, 15.0);
        assert_eq!(p.multiloop_penalty_pk, p.a1);
    }

    #[test]
    fn test_truncated_stream() {
        let err = EnergyParams::from_packed_stream(Cursor::new("0 0 0\n")).unwrap_err();
        assert!(matches!(err, ParamError::MissingValue("stack", 3)));
    }

    #[test]
    fn test_trailing_values() {
        let mut s = tiny_stream();
        s.push_str("\n17\n");
        let err = EnergyParams::from_packed_stream(Cursor::new(s)).unwrap_err();
        assert!(matches!(err, ParamError::TrailingValues(1)));
    }

    #[test]
    fn test_garbage_token() {
        let err = EnergyParams::from_packed_stream(Cursor::new("0 x 0\n")).unwrap_err();
        assert!(matches!(err, ParamError::Parse(_)));
    }
}
