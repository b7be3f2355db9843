use thiserror::Error;

/// Errors raised by performance graph lookups.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InterpError {
    /// The flow lies outside the tabulated range, or a bracketing curve has
    /// no usable splines.
    #[error("flow {flow} is outside the usable range of the graph")]
    InvalidFlow { flow: f64 },

    /// A curve index fell outside its family.
    #[error("curve index {index} is out of range")]
    InvalidParam { index: usize },

    /// The query or its result is not a finite number.
    #[error("interpolation failed for flow {flow} at downstream depth {depth}")]
    Interpolation { flow: f64, depth: f64 },
}
