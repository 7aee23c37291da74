use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use colored::*;
use log::{info, warn};

use mf_energy::RnaSequence;
use mf_motifs::{enumerate_sites, validate_motif, DescFile, Motif};

/// Load every motif from one catalog file; the encoding is chosen by
/// extension (.csv for jar3d / BayesPairing lines, .rin for Carnaval,
/// .desc for rna3dmotif models). Unparseable content is an error; motifs
/// failing validation are skipped with a warning.
pub fn load_catalog(path: &Path) -> Result<Vec<Motif>> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("0");
    match ext {
        "csv" => {
            let reader = BufReader::new(File::open(path)?);
            let mut motifs = Vec::new();
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let motif = Motif::from_csv_line(&line)
                    .with_context(|| format!("in catalog {}", path.display()))?;
                motifs.push(motif);
            }
            Ok(motifs)
        }
        "rin" => {
            let id: u32 = stem.chars().filter(|c| c.is_ascii_digit()).collect::<String>()
                .parse().unwrap_or(0);
            let reader = BufReader::new(File::open(path)?);
            Ok(vec![Motif::from_rin(reader, id, false)?])
        }
        "desc" => {
            let reader = BufReader::new(File::open(path)?);
            let desc = DescFile::parse(reader)?;
            if let Err(flaw) = desc.validate() {
                warn!("{} motif {} rejected: {}", "WARNING:".red(), stem, flaw);
                return Ok(vec![]);
            }
            Ok(vec![desc.into_motif(stem)?])
        }
        other => Err(anyhow!(
            "unknown catalog extension '{}' for {} (expected csv, rin or desc)",
            other,
            path.display()
        )),
    }
}

/// Validate the catalog motifs and enumerate their candidate insertion
/// sites on the sequence. Flawed motifs and out-of-range sites are skipped
/// with a warning; an empty result with a non-empty catalog is an error.
pub fn prepare_sites(motifs: Vec<Motif>, rna: &RnaSequence) -> Result<Vec<Motif>> {
    let had_input = !motifs.is_empty();
    let mut sites = Vec::new();
    for motif in motifs {
        if let Err(flaw) = validate_motif(&motif) {
            warn!("{} motif {} rejected: {}", "WARNING:".red(), motif.identifier(), flaw);
            continue;
        }
        for site in enumerate_sites(&motif, rna.as_str())? {
            let in_range = site.components.iter().all(|c| c.pos.1 < rna.len());
            if !in_range {
                warn!(
                    "{} site {} does not fit on a {}-nt sequence",
                    "WARNING:".red(),
                    site.pos_string(),
                    rna.len()
                );
                continue;
            }
            sites.push(site);
        }
    }
    if had_input && sites.is_empty() {
        bail!("no motif insertion sites survived validation");
    }
    info!("{} candidate insertion sites", sites.len());
    Ok(sites)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_motifs::{Component, Link, MotifSource};

    fn rna() -> RnaSequence {
        RnaSequence::new("test", "GGGAAAAAUCCC").unwrap()
    }

    fn rin_motif() -> Motif {
        Motif {
            id: "5".into(),
            source: MotifSource::Carnaval,
            score: 4,
            reversed: false,
            components: vec![
                Component::with_seq(0, 2, "GGG"),
                Component::with_seq(6, 8, "CCC"),
            ],
            links: vec![Link { nts: (0, 8), long_range: false }],
        }
    }

    #[test]
    fn test_prepare_sites_locates_rin() {
        let sites = prepare_sites(vec![rin_motif()], &rna()).unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].components[0].pos, (0, 2));
        assert_eq!(sites[0].components[1].pos, (9, 11));
    }

    #[test]
    fn test_prepare_sites_rejects_flawed_motif() {
        let mut bad = rin_motif();
        bad.links.clear();
        assert!(prepare_sites(vec![bad], &rna()).is_err());
    }

    #[test]
    fn test_prepare_sites_empty_catalog_is_fine() {
        assert!(prepare_sites(vec![], &rna()).unwrap().is_empty());
    }

    #[test]
    fn test_prepare_sites_drops_out_of_range_csv_site() {
        let far = Motif {
            id: "IL_7.1".into(),
            source: MotifSource::RnaMotifAtlas,
            score: 3,
            reversed: false,
            components: vec![Component::new(40, 45)],
            links: vec![],
        };
        assert!(prepare_sites(vec![far], &rna()).is_err());
    }
}
