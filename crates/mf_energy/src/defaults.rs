use std::io::Cursor;

use once_cell::sync::Lazy;

use crate::params::EnergyParams;

/// The Serra & Turner 1995 parameter blob shipped with the crate, in the
/// same packed format accepted by `EnergyParams::from_packed_stream`.
const DEFAULT_BLOB: &str = include_str!("../data/rna1995.dG");

static DEFAULT_PARAMS: Lazy<EnergyParams> = Lazy::new(|| {
    EnergyParams::from_packed_stream(Cursor::new(DEFAULT_BLOB))
        .unwrap_or_else(|e| panic!("embedded parameter blob is corrupt: {}", e))
});

/// Process-wide read-only default parameter set, parsed on first use.
pub fn default_params() -> &'static EnergyParams {
    &DEFAULT_PARAMS
}
