/// Motif, Component, Link, provenance tags.
mod motif;

/// CSV (jar3d, BayesPairing) and RIN catalog decoders.
mod catalogs;

/// DESC catalog decoder, validity and insertability checks.
mod desc;

/// Motif validators shared across catalog encodings.
mod validate;

/// Regex-based enumeration of candidate insertion sites.
mod locator;

pub use motif::*;
pub use catalogs::*;
pub use desc::*;
pub use validate::*;
pub use locator::*;
