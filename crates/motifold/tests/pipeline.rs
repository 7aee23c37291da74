//! End-to-end scenarios: posterior engine to Pareto set.

use mf_energy::{default_params, RnaSequence};
use mf_motifs::{Component, Link, Motif, MotifSource};
use mf_pareto::{BranchBound, IpModel, ParetoWalker, SecondaryStructure};
use mf_partition::{base_pair_probabilities, partition_fast, FoldMode};
use motifold::catalog_io::prepare_sites;

fn pareto_for(seq: &str, sites: Vec<Motif>, theta: f64) -> Vec<SecondaryStructure> {
    let rna = RnaSequence::new("test", seq).unwrap();
    let probs = base_pair_probabilities(&rna, default_params(), FoldMode::NoPkFast);
    let mut solver = BranchBound::new();
    let model = IpModel::build(&mut solver, &probs, sites, theta);
    let mut walker = ParetoWalker::new(solver, model);
    walker.explore().to_vec()
}

fn two_component_motif(
    id: &str,
    score: i32,
    c1: (usize, usize),
    c2: (usize, usize),
) -> Motif {
    Motif {
        id: id.into(),
        source: MotifSource::RnaMotifAtlas,
        score,
        reversed: false,
        components: vec![Component::new(c1.0, c1.1), Component::new(c2.0, c2.1)],
        links: vec![],
    }
}

fn assert_pareto_invariant(pareto: &[SecondaryStructure]) {
    for (a, sa) in pareto.iter().enumerate() {
        for (b, sb) in pareto.iter().enumerate() {
            if a != b {
                assert!(!sa.dominates(sb), "{} dominates {}", sa, sb);
            }
        }
    }
}

/// E1: a clean stem-loop without motifs.
#[test]
fn e1_hairpin_stem_loop() {
    let pareto = pareto_for("GCGCAAAAGCGC", vec![], 0.01);
    assert_eq!(pareto.len(), 1);
    let s = &pareto[0];
    assert_eq!(s.to_bracket_string(), "((((....))))");
    assert_eq!(s.obj1(), 0.0);
    assert!(s.obj2() >= 3.5, "obj2 = {}", s.obj2());
    assert_pareto_invariant(&pareto);
}

/// E2: no base pair fits on 5 nucleotides; the ensemble is the empty
/// structure alone.
#[test]
fn e2_all_adenine() {
    let rna = RnaSequence::new("test", "AAAAA").unwrap();
    let tables = partition_fast(&rna, default_params());
    assert_eq!(tables.q[[0, 4]], 1.0);

    let pareto = pareto_for("AAAAA", vec![], 0.01);
    assert_eq!(pareto.len(), 1);
    assert!(pareto[0].is_empty_structure());
    assert_eq!(pareto[0].obj1(), 0.0);
    assert_eq!(pareto[0].obj2(), 0.0);
}

/// E3: a compatible motif rides on top of the native stem and dominates
/// the plain structure.
#[test]
fn e3_motif_on_native_stem() {
    let motif = two_component_motif("GNRA", 10, (0, 2), (7, 9));
    let pareto = pareto_for("GGGAAAUCCC", vec![motif], 0.01);
    let best = pareto
        .iter()
        .find(|s| s.obj1() == 10.0)
        .expect("motif-bearing structure on the frontier");
    assert_eq!(best.to_bracket_string(), "(((....)))");
    assert_eq!(best.motifs().len(), 1);
    // The plain stem is dominated and must have been filtered out.
    assert!(!pareto.iter().any(|s| s.obj1() == 0.0 && !s.is_empty_structure()));
    assert_pareto_invariant(&pareto);
}

/// E4: theta above every pairing probability leaves no y variables; K6
/// degenerates and forbids the motif.
#[test]
fn e4_theta_above_everything() {
    let motif = two_component_motif("GNRA", 10, (0, 2), (7, 9));
    let pareto = pareto_for("GGGAAAUCCC", vec![motif], 0.999);
    assert_eq!(pareto.len(), 1);
    assert!(pareto[0].is_empty_structure());
}

/// E5: two equal-scored sites sharing a nucleotide; K4 forbids the pair of
/// them, and each survives alone on the frontier.
#[test]
fn e5_overlapping_sites() {
    let a = two_component_motif("SITE_A", 5, (0, 1), (8, 9));
    let b = two_component_motif("SITE_B", 5, (1, 2), (7, 8));
    let pareto = pareto_for("GGGAAAUCCC", vec![a, b], 0.01);
    assert!(pareto.iter().all(|s| s.motifs().len() <= 1));
    let ids: Vec<String> = pareto
        .iter()
        .filter_map(|s| s.motifs().first().map(|m| m.identifier()))
        .collect();
    assert!(ids.contains(&"SITE_A".to_string()));
    assert!(ids.contains(&"SITE_B".to_string()));
    assert_pareto_invariant(&pareto);
}

/// E6, overlapping flavor: with distinct scores the combination is still
/// impossible, so no structure carries both motifs.
#[test]
fn e6_overlap_forbids_combination() {
    let a = two_component_motif("SITE_A", 5, (0, 1), (8, 9));
    let b = two_component_motif("SITE_B", 7, (1, 2), (7, 8));
    let pareto = pareto_for("GGGAAAUCCC", vec![a, b], 0.01);
    assert!(pareto.iter().all(|s| s.motifs().len() <= 1));
    assert_pareto_invariant(&pareto);
}

/// E6, disjoint flavor: compatible sites with closing pairs in the allowed
/// set combine, and the combination dominates both singletons.
#[test]
fn e6_disjoint_sites_combine() {
    let a = two_component_motif("SITE_A", 9, (0, 1), (8, 9));
    let b = two_component_motif("SITE_B", 8, (2, 2), (7, 7));
    let pareto = pareto_for("GGGAAAUCCC", vec![a, b], 0.01);
    let combined = pareto
        .iter()
        .find(|s| s.motifs().len() == 2)
        .expect("combined structure on the frontier");
    assert_eq!(combined.obj1(), 17.0);
    // Both singletons are dominated by the combination.
    assert!(!pareto.iter().any(|s| s.motifs().len() == 1));
    assert_pareto_invariant(&pareto);
}

/// Monotone discovery: obj1 never decreases along the walk, so the Pareto
/// set (in insertion order) is sorted by obj1.
#[test]
fn monotone_obj1_discovery() {
    let a = two_component_motif("SITE_A", 5, (0, 1), (8, 9));
    let b = two_component_motif("SITE_B", 7, (1, 2), (7, 8));
    let pareto = pareto_for("GGGAAAUCCC", vec![a, b], 0.01);
    for w in pareto.windows(2) {
        assert!(w[0].obj1() <= w[1].obj1());
    }
}

/// Locator-driven sites feed the same pipeline: a Carnaval-style motif is
/// placed by regex and inserted.
#[test]
fn located_rin_motif_is_inserted() {
    let rin = Motif {
        id: "12".into(),
        source: MotifSource::Carnaval,
        score: 6,
        reversed: false,
        components: vec![
            Component::with_seq(0, 2, "GGG"),
            Component::with_seq(6, 8, "CCC"),
        ],
        links: vec![Link { nts: (0, 8), long_range: false }],
    };
    let rna = RnaSequence::new("test", "GGGAAAAAUCCC").unwrap();
    let sites = prepare_sites(vec![rin], &rna).unwrap();
    assert_eq!(sites.len(), 1);

    let probs = base_pair_probabilities(&rna, default_params(), FoldMode::NoPkFast);
    let mut solver = BranchBound::new();
    let model = IpModel::build(&mut solver, &probs, sites, 0.01);
    let mut walker = ParetoWalker::new(solver, model);
    let pareto = walker.explore().to_vec();
    let best = pareto
        .iter()
        .find(|s| s.obj1() == 6.0)
        .expect("RIN12 inserted");
    assert_eq!(best.motifs()[0].identifier(), "RIN12");
}
