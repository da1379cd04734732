//! Compiler error types.

use oscar_core::QuantityError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("invalid resource quantity for {field}: {value:?}: {source}")]
    InvalidResourceQuantity {
        /// Service field holding the value: `cpu` or `memory`.
        field: &'static str,
        value: String,
        #[source]
        source: QuantityError,
    },
}

pub type CompileResult<T> = Result<T, CompileError>;
