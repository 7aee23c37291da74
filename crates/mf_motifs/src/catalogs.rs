use std::fmt;
use std::io::BufRead;

use crate::motif::{Component, Link, Motif, MotifSource};

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Malformed(String),
}

impl std::error::Error for CatalogError {}

impl From<std::io::Error> for CatalogError {
    fn from(e: std::io::Error) -> Self {
        CatalogError::Io(e)
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Io(e) => write!(f, "I/O error: {}", e),
            CatalogError::Malformed(msg) => write!(f, "Malformed catalog entry: {}", msg),
        }
    }
}

fn int(tok: &str, what: &str) -> Result<i64, CatalogError> {
    tok.trim().parse::<i64>()
        .map_err(|_| CatalogError::Malformed(format!("{}: '{}' is not an integer", what, tok)))
}

/// A 1-based inclusive catalog position, converted to the internal 0-based
/// convention.
fn position(tok: &str, what: &str) -> Result<usize, CatalogError> {
    let v = int(tok, what)?;
    if v < 1 {
        return Err(CatalogError::Malformed(format!("{}: position {} is not 1-based", what, v)));
    }
    Ok(v as usize - 1)
}

impl Motif {
    /// Decode one CSV catalog line. Lines carrying a literal True/False
    /// token come from jar3d; everything else is BayesPairing output.
    pub fn from_csv_line(line: &str) -> Result<Motif, CatalogError> {
        let tokens: Vec<&str> = line.trim().split(',').collect();
        if line.contains("True") || line.contains("False") {
            Self::from_jar3d_tokens(&tokens)
        } else {
            Self::from_bayespairing_tokens(&tokens)
        }
    }

    fn from_jar3d_tokens(tokens: &[&str]) -> Result<Motif, CatalogError> {
        if tokens.len() < 6 {
            return Err(CatalogError::Malformed(format!(
                "jar3d line has {} fields, expected at least 6", tokens.len())));
        }
        let mut components = vec![Component::new(
            position(tokens[3], "jar3d start")?,
            position(tokens[4], "jar3d end")?,
        )];
        if tokens[5].trim() != "-" {
            let t6 = tokens.get(6).ok_or_else(|| {
                CatalogError::Malformed("jar3d line is missing the second component end".into())
            })?;
            components.push(Component::new(
                position(tokens[5], "jar3d start")?,
                position(t6, "jar3d end")?,
            ));
        }
        Ok(Motif {
            id: tokens[0].trim().to_string(),
            source: MotifSource::RnaMotifAtlas,
            score: int(tokens[2], "jar3d score")? as i32,
            reversed: tokens[1].trim() == "True",
            components,
            links: vec![],
        })
    }

    fn from_bayespairing_tokens(tokens: &[&str]) -> Result<Motif, CatalogError> {
        if tokens.len() < 2 {
            return Err(CatalogError::Malformed("BayesPairing line has no score field".into()));
        }
        let id = tokens[0].trim().to_string();
        let source = if id.contains("rna3dmotif") {
            MotifSource::Rna3dMotif
        } else {
            MotifSource::RnaMotifAtlas
        };
        let score = int(tokens[1], "BayesPairing score")? as i32;

        // Pairs where start >= end are skipped with the cursor still
        // advancing by two; a trailing odd token is never read. Both quirks
        // are inherited behavior.
        let mut components = Vec::new();
        let mut i = 2;
        while i + 1 < tokens.len() {
            let a = int(tokens[i], "BayesPairing start")?;
            let b = int(tokens[i + 1], "BayesPairing end")?;
            if a < b {
                components.push(Component::new(
                    position(tokens[i], "BayesPairing start")?,
                    position(tokens[i + 1], "BayesPairing end")?,
                ));
            }
            i += 2;
        }
        Ok(Motif { id, source, score, reversed: false, components, links: vec![] })
    }

    /// Decode one Carnaval RIN file: a links section (semicolon-separated
    /// `nt,nt,long_range` records on one line) and a components section
    /// (`start,end;k;seq` per line).
    pub fn from_rin<R: BufRead>(reader: R, id: u32, reversed: bool) -> Result<Motif, CatalogError> {
        let mut lines = reader.lines();
        lines.next().transpose()?; // header_link
        let links_line = lines.next().transpose()?
            .ok_or_else(|| CatalogError::Malformed("RIN file has no links line".into()))?;

        let mut links = Vec::new();
        for record in links_line.split(';') {
            let record = record.trim();
            if record.is_empty() {
                continue;
            }
            let fields: Vec<&str> = record.split(',').collect();
            if fields.len() != 3 {
                return Err(CatalogError::Malformed(format!(
                    "RIN link record '{}' does not have 3 fields", record)));
            }
            links.push(Link {
                nts: (int(fields[0], "RIN link")? as usize, int(fields[1], "RIN link")? as usize),
                long_range: fields[2].trim() == "True",
            });
        }

        lines.next().transpose()?; // header_comp
        let mut components = Vec::new();
        for line in lines {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                break;
            }
            let sections: Vec<&str> = line.split(';').collect();
            if sections.len() != 3 {
                return Err(CatalogError::Malformed(format!(
                    "RIN component line '{}' does not have 3 sections", line)));
            }
            let pos: Vec<&str> = sections[0].split(',').collect();
            if pos.len() != 2 {
                return Err(CatalogError::Malformed(format!(
                    "RIN component position '{}' is not a pair", sections[0])));
            }
            components.push(Component::with_seq(
                int(pos[0], "RIN start")? as usize,
                int(pos[1], "RIN end")? as usize,
                sections[2].trim(),
            ));
        }

        let score = (components.len() * components.len()) as i32;
        Ok(Motif {
            id: id.to_string(),
            source: MotifSource::Carnaval,
            score,
            reversed,
            components,
            links,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_jar3d_two_components() {
        let m = Motif::from_csv_line("IL_85647.3,False,19,9,13,25,29").unwrap();
        assert_eq!(m.source, MotifSource::RnaMotifAtlas);
        assert_eq!(m.id, "IL_85647.3");
        assert_eq!(m.score, 19);
        assert!(!m.reversed);
        assert_eq!(m.components, vec![Component::new(8, 12), Component::new(24, 28)]);
    }

    #[test]
    fn test_jar3d_single_component() {
        let m = Motif::from_csv_line("HL_1234.1,True,7,3,8,-").unwrap();
        assert!(m.reversed);
        assert_eq!(m.components.len(), 1);
        assert_eq!(m.components[0].pos, (2, 7));
    }

    #[test]
    fn test_jar3d_roundtrip() {
        for line in ["IL_85647.3,False,19,9,13,25,29", "HL_1234.1,True,7,3,8,-"] {
            let m = Motif::from_csv_line(line).unwrap();
            assert_eq!(m.to_jar3d_csv(), line);
        }
    }

    #[test]
    fn test_bayespairing_sources() {
        let atlas = Motif::from_csv_line("IL_301.5,12,4,9,20,24").unwrap();
        assert_eq!(atlas.source, MotifSource::RnaMotifAtlas);
        let pdb = Motif::from_csv_line("rna3dmotif_1Y27,12,4,9").unwrap();
        assert_eq!(pdb.source, MotifSource::Rna3dMotif);
    }

    #[test]
    fn test_bayespairing_roundtrip() {
        let line = "IL_301.5,12,4,9,20,24";
        let m = Motif::from_csv_line(line).unwrap();
        assert_eq!(m.to_bayespairing_csv(), line);
    }

    #[test]
    fn test_bayespairing_skips_inverted_pairs() {
        // (9, 4) is malformed; the cursor still advances by two.
        let m = Motif::from_csv_line("IL_301.5,12,9,4,20,24").unwrap();
        assert_eq!(m.components, vec![Component::new(19, 23)]);
    }

    #[test]
    fn test_bayespairing_ignores_trailing_odd_token() {
        let m = Motif::from_csv_line("IL_301.5,12,4,9,77").unwrap();
        assert_eq!(m.components, vec![Component::new(3, 8)]);
    }

    #[test]
    fn test_rin_parse() {
        let rin = "\
header_link
0,7,False;1,6,False;2,5,True;
header_comp
0,3;4;GGAC
9,12;4;GUCC
";
        let m = Motif::from_rin(Cursor::new(rin), 17, false).unwrap();
        assert_eq!(m.identifier(), "RIN17");
        assert_eq!(m.links.len(), 3);
        assert_eq!(m.links[2], Link { nts: (2, 5), long_range: true });
        assert_eq!(m.components.len(), 2);
        assert_eq!(m.components[0].seq.as_deref(), Some("GGAC"));
        assert_eq!(m.components[1].pos, (9, 12));
        assert_eq!(m.score, 4);
    }

    #[test]
    fn test_rin_rejects_bad_link() {
        let rin = "header_link\n0,7\nheader_comp\n";
        assert!(Motif::from_rin(Cursor::new(rin), 1, false).is_err());
    }

    #[test]
    fn test_csv_garbage_is_malformed() {
        assert!(Motif::from_csv_line("id,notascore,1,5").is_err());
        assert!(Motif::from_csv_line("id,True,x,1,5,-").is_err());
        assert!(Motif::from_csv_line("id,3,0,5").is_err());
    }
}
