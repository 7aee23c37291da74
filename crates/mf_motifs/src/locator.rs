use log::debug;
use regex::Regex;

use crate::catalogs::CatalogError;
use crate::motif::Motif;

/// Minimum number of positions between the inclusive end of one component
/// match and the start of the next (the minimum hairpin distance).
const MIN_COMPONENT_GAP: usize = 5;

/// Enumerate all placements of the ordered component patterns on the RNA:
/// for each match of the first pattern, recurse on the suffix starting
/// `MIN_COMPONENT_GAP` after its end. Positions are 0-based inclusive.
pub fn find_component_placements(
    rna: &str,
    patterns: &[Regex],
) -> Vec<Vec<(usize, usize)>> {
    if patterns.is_empty() {
        return Vec::new();
    }
    place(rna, 0, patterns)
}

fn place(window: &str, offset: usize, patterns: &[Regex]) -> Vec<Vec<(usize, usize)>> {
    let (first, rest) = patterns.split_first().expect("place called without patterns");
    let mut results = Vec::new();

    for m in first.find_iter(window) {
        if m.end() == m.start() {
            continue;
        }
        let start = m.start() + offset;
        let end = start + (m.end() - m.start()) - 1;
        if rest.is_empty() {
            results.push(vec![(start, end)]);
            continue;
        }
        let local_end = m.end() - 1;
        if local_end + MIN_COMPONENT_GAP >= window.len() {
            // No room left to host the remaining components.
            continue;
        }
        let tails = place(
            &window[local_end + MIN_COMPONENT_GAP..],
            end + MIN_COMPONENT_GAP,
            rest,
        );
        for tail in tails {
            let mut placement = Vec::with_capacity(1 + tail.len());
            placement.push((start, end));
            placement.extend(tail);
            results.push(placement);
        }
    }
    results
}

/// Concrete insertion sites of a motif on the RNA: one clone per placement,
/// with the component intervals rewritten to the matched positions. Motifs
/// without sequence patterns (score catalogs) already carry concrete
/// positions and map to themselves.
pub fn enumerate_sites(motif: &Motif, rna: &str) -> Result<Vec<Motif>, CatalogError> {
    if motif.components.iter().any(|c| c.seq.is_none()) {
        return Ok(vec![motif.clone()]);
    }

    let mut patterns = Vec::with_capacity(motif.components.len());
    for c in &motif.components {
        let seq = c.seq.as_deref().unwrap_or_default();
        let re = Regex::new(seq).map_err(|e| {
            CatalogError::Malformed(format!(
                "motif {}: component pattern '{}' is not a valid regex: {}",
                motif.identifier(), seq, e))
        })?;
        patterns.push(re);
    }

    let placements = find_component_placements(rna, &patterns);
    debug!("motif {}: {} candidate insertion sites", motif.identifier(), placements.len());

    Ok(placements
        .into_iter()
        .map(|placement| {
            let mut site = motif.clone();
            for (c, pos) in site.components.iter_mut().zip(placement) {
                c.pos = pos;
            }
            site
        })
        .collect())
}
