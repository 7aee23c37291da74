/// Flat 4-dimensional tensors with explicit indexing.
mod tensor;

/// Pseudoknot-free partition-function engines (reference and fast).
mod engine;

/// Experimental pseudoknot-enabled recursions.
mod pseudoknots;

/// Outside algorithm and the base-pair probability matrix.
mod posterior;

pub use tensor::*;
pub use engine::*;
pub use pseudoknots::*;
pub use posterior::*;
