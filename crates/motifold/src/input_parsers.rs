use std::fs::File;
use std::io::{stdin, BufRead, BufReader, Cursor};
use std::path::Path;

use anyhow::{anyhow, Result};

/// Read a header (optional) and a sequence from a FASTA-like source.
pub fn read_sequence<R: BufRead>(reader: R) -> Result<(Option<String>, String)> {
    let mut header: Option<String> = None;
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('>') {
            header = Some(line.to_string());
        } else {
            let token = line.split_whitespace().next().unwrap_or_default();
            return Ok((header, token.to_string()));
        }
    }
    Err(anyhow!("Missing sequence line"))
}

pub fn read_sequence_string(s: &str) -> Result<(Option<String>, String)> {
    read_sequence(Cursor::new(s))
}

pub fn read_sequence_file<P: AsRef<Path>>(path: P) -> Result<(Option<String>, String)> {
    read_sequence(BufReader::new(File::open(path)?))
}

/// Read either from stdin ("-") or a file path.
pub fn read_sequence_input(s: &str) -> Result<(Option<String>, String)> {
    if s == "-" {
        read_sequence(BufReader::new(stdin()))
    } else {
        read_sequence_file(s)
    }
}
