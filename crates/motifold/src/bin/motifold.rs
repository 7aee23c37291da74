use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{ArgAction, Parser, ValueEnum};
use colored::*;
use env_logger::Builder;
use log::info;

use mf_energy::{default_params, EnergyParams, RnaSequence};
use mf_partition::{base_pair_probabilities, FoldMode};
use mf_pareto::{BranchBound, IpModel, ParetoWalker};
use motifold::catalog_io::{load_catalog, prepare_sites};
use motifold::input_parsers::read_sequence_input;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PkOption {
    Off,
    Fast,
    Slow,
}

#[derive(Debug, Parser)]
#[command(name = "motifold")]
#[command(version, about = "Pareto-optimal RNA secondary structures with inserted 3D motifs")]
struct Cli {
    /// RNA sequence (overrides INPUT)
    #[arg(short, long)]
    sequence: Option<String>,

    /// Input file (FASTA-like), or "-" for stdin
    #[arg(value_name = "INPUT", default_value = "-")]
    input: String,

    /// Motif catalog (.csv, .rin or .desc)
    #[arg(short, long, value_name = "PATH")]
    motifs: Option<PathBuf>,

    /// Base-pair probability cutoff for the decision variables
    #[arg(short, long, default_value_t = 0.01)]
    theta: f64,

    /// Pseudoknot recursions (experimental, results unreliable)
    #[arg(long, value_enum, default_value_t = PkOption::Off)]
    pseudoknots: PkOption,

    /// Use the O(n^4) reference recursion instead of the fast one
    #[arg(long)]
    reference: bool,

    /// Energy parameter stream (packed integers); built-in 1995 set if absent
    #[arg(long, value_name = "FILE")]
    params: Option<PathBuf>,

    /// Per-solver-call time budget, in seconds
    #[arg(long, value_name = "SECONDS")]
    time_limit: Option<u64>,

    /// Verbosity (-v = info, -vv = debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (header, seq) = match &cli.sequence {
        Some(s) => (None, s.clone()),
        None => read_sequence_input(&cli.input)?,
    };
    let name = header
        .as_deref()
        .and_then(|h| h.strip_prefix('>'))
        .and_then(|h| h.split_whitespace().next())
        .unwrap_or("anonymous")
        .to_string();
    let rna = RnaSequence::new(&name, &seq)?;
    info!(">sequence formatted ({} nt)", rna.len());

    let loaded_params;
    let params: &EnergyParams = match &cli.params {
        Some(path) => {
            loaded_params = EnergyParams::from_file(path)?;
            &loaded_params
        }
        None => default_params(),
    };

    let mode = match (cli.pseudoknots, cli.reference) {
        (PkOption::Off, false) => FoldMode::NoPkFast,
        (PkOption::Off, true) => FoldMode::NoPkReference,
        (PkOption::Fast, _) => FoldMode::PkFast,
        (PkOption::Slow, _) => FoldMode::PkSlow,
    };

    info!(">computing pairing probabilities...");
    let probs = base_pair_probabilities(&rna, params, mode);
    if cli.verbose > 0 {
        println!("{}", probs.render(&rna, cli.theta));
    }

    let sites = match &cli.motifs {
        Some(path) => prepare_sites(load_catalog(path)?, &rna)?,
        None => Vec::new(),
    };

    let mut solver = BranchBound::new();
    if let Some(secs) = cli.time_limit {
        solver = solver.with_time_limit(Duration::from_secs(secs));
    }
    let model = IpModel::build(&mut solver, &probs, sites, cli.theta);
    let mut walker = ParetoWalker::new(solver, model);
    let pareto = walker.explore();

    if pareto.is_empty() {
        bail!("the solver found no feasible structure");
    }
    println!("{}", rna.as_str().yellow());
    for s in pareto {
        println!("{}", s);
    }
    Ok(())
}
