/// Base, PairTypeRNA, NucleotideVec, RnaSequence.
mod nucleotides;

/// Nearest-neighbor parameter tables & packed-stream loader.
mod params;

/// Compiled-in Serra & Turner 1995 default parameters.
mod defaults;

/// Closed-form loop free energies (hairpin, stack, bulge, interior).
mod loops;

pub use nucleotides::*;
pub use params::*;
pub use defaults::*;
pub use loops::*;

pub const ZERO_C_IN_KELVIN: f64 = 273.15;

/// kB * Avogadro, in kcal/mol/K.
pub const GAS_CONSTANT: f64 = 1.98717e-3;

/// RT at 37 degrees Celsius, in kcal/mol.
pub fn rt_37() -> f64 {
    GAS_CONSTANT * (ZERO_C_IN_KELVIN + 37.0)
}
