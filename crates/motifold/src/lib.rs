/// Sequence input adapters (inline, FASTA-like files, stdin).
pub mod input_parsers;

/// Catalog loading, validation and site enumeration.
pub mod catalog_io;
