use std::io::BufRead;

use regex::Regex;

use crate::catalogs::CatalogError;
use crate::motif::{Component, Link, Motif, MotifSource};
use crate::validate::MotifFlaw;

/// Parsed DESC file: the Bases line plus the interaction records.
#[derive(Debug, Clone)]
pub struct DescFile {
    /// (position, nucleotide) in file order.
    pub bases: Vec<(i64, char)>,
    /// (position, position, edge code such as "+/+", "-/-", "C/C", "W/H").
    pub interactions: Vec<(i64, i64, String)>,
}

fn malformed(msg: String) -> CatalogError {
    CatalogError::Malformed(msg)
}

fn paren_field(s: &str) -> Result<i64, CatalogError> {
    let open = s.find('(')
        .ok_or_else(|| malformed(format!("no '(' in DESC interaction '{}'", s)))?;
    let rest = &s[open + 1..];
    let close = rest.find(')')
        .ok_or_else(|| malformed(format!("no ')' in DESC interaction '{}'", s)))?;
    let field: String = rest[..close].chars().filter(|c| !c.is_whitespace()).collect();
    let pos = field.split('_').next().unwrap_or("");
    pos.parse::<i64>()
        .map_err(|_| malformed(format!("bad DESC base '{}'", field)))
}

impl DescFile {
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, CatalogError> {
        let mut lines = reader.lines();
        lines.next().transpose()?; // "id: <number>"
        let bases_line = lines.next().transpose()?
            .ok_or_else(|| malformed("DESC file has no Bases line".into()))?;
        let rest = bases_line.trim();
        let rest = rest.strip_prefix("Bases:").unwrap_or(rest);

        let mut bases = Vec::new();
        for tok in rest.split_whitespace() {
            let (pos, nt) = tok.split_once('_')
                .ok_or_else(|| malformed(format!("bad DESC base token '{}'", tok)))?;
            let pos = pos.parse::<i64>()
                .map_err(|_| malformed(format!("bad DESC position in '{}'", tok)))?;
            let nt = nt.chars().next()
                .ok_or_else(|| malformed(format!("empty nucleotide in '{}'", tok)))?;
            bases.push((pos, nt));
        }

        let mut interactions = Vec::new();
        for line in lines {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let slash = match line.find('/') {
                Some(s) if s > 0 && s + 1 < line.len() => s,
                _ => continue,
            };
            let edge = line[slash - 1..=slash + 1].to_string();
            let p1 = paren_field(&line[..slash])?;
            let p2 = paren_field(&line[slash + 1..])?;
            interactions.push((p1, p2, edge));
        }
        Ok(DescFile { bases, interactions })
    }

    /// Geometry checks: every base must be A/C/G/U at a positive position,
    /// a contiguity (C/C) edge must join consecutive positions, and a
    /// canonical cis edge (+/+ or -/-) must span at least 4 nucleotides.
    pub fn validate(&self) -> Result<(), MotifFlaw> {
        for &(pos, nt) in &self.bases {
            if !matches!(nt, 'A' | 'C' | 'G' | 'U') {
                return Err(MotifFlaw::NonAcguBase(nt));
            }
            if pos <= 0 {
                return Err(MotifFlaw::BadPosition(pos));
            }
        }
        for (p1, p2, edge) in &self.interactions {
            if edge == "C/C" && p2 - p1 != 1 {
                return Err(MotifFlaw::BrokenBackbone(*p1, *p2));
            }
            if (edge == "+/+" || edge == "-/-") && p2 - p1 < 4 {
                return Err(MotifFlaw::HelixTooShort(*p1, *p2));
            }
        }
        Ok(())
    }

    /// Regex over the whole motif: literal nucleotides with "."-runs for
    /// gaps of 2 to 5 positions and ".{5,}" beyond.
    pub fn signature_regex(&self) -> String {
        let mut seq = String::new();
        let mut last = self.bases.first().map(|&(p, _)| p).unwrap_or(0);
        for &(pos, nt) in &self.bases {
            match pos - last {
                d if d > 5 => seq.push_str(".{5,}"),
                2 => seq.push('.'),
                3 => seq.push_str(".."),
                4 => seq.push_str("..."),
                5 => seq.push_str("...."),
                _ => {}
            }
            seq.push(nt);
            last = pos;
        }
        seq
    }

    /// The motif can be inserted somewhere on the RNA iff its signature
    /// matches.
    pub fn is_insertible(&self, rna: &str) -> Result<bool, CatalogError> {
        let re = Regex::new(&self.signature_regex())
            .map_err(|e| malformed(format!("DESC signature is not a valid regex: {}", e)))?;
        Ok(re.is_match(rna))
    }

    /// Build the in-memory motif: components are the maximal runs of
    /// positions with gaps <= 5, each carrying its dotted pattern; the
    /// score is the squared component count.
    pub fn into_motif(self, pdb_id: &str) -> Result<Motif, CatalogError> {
        let mut components: Vec<Component> = Vec::new();
        let mut run_pattern = String::new();
        let mut run_bounds: Option<(i64, i64)> = None;

        let mut flush = |pattern: &mut String, bounds: &mut Option<(i64, i64)>|
            -> Result<(), CatalogError> {
            if let Some((start, end)) = bounds.take() {
                if start < 1 {
                    return Err(malformed(format!("DESC position {} is not 1-based", start)));
                }
                components.push(Component::with_seq(
                    start as usize - 1,
                    end as usize - 1,
                    pattern,
                ));
                pattern.clear();
            }
            Ok(())
        };

        let mut last = self.bases.first().map(|&(p, _)| p).unwrap_or(0);
        for &(pos, nt) in &self.bases {
            match pos - last {
                d if d > 5 => flush(&mut run_pattern, &mut run_bounds)?,
                2 => run_pattern.push('.'),
                3 => run_pattern.push_str(".."),
                4 => run_pattern.push_str("..."),
                5 => run_pattern.push_str("...."),
                _ => {}
            }
            run_pattern.push(nt);
            run_bounds = Some(match run_bounds {
                None => (pos, pos),
                Some((start, _)) => (start, pos),
            });
            last = pos;
        }
        flush(&mut run_pattern, &mut run_bounds)?;

        let mut links = Vec::new();
        for &(p1, p2, _) in &self.interactions {
            if p1 < 1 || p2 < 1 {
                return Err(malformed(format!("DESC link ({}, {}) is not 1-based", p1, p2)));
            }
            links.push(Link {
                nts: (p1 as usize - 1, p2 as usize - 1),
                long_range: false,
            });
        }

        let score = (components.len() * components.len()) as i32;
        Ok(Motif {
            id: pdb_id.to_string(),
            source: MotifSource::Rna3dMotif,
            score,
            reversed: false,
            components,
            links,
        })
    }
}
