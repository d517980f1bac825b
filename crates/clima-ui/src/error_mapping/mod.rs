//! Maps crate errors to clima_core::AppError for consistent user-facing messages.
//! Each source crate has its own module to keep mappings small and readable.

mod storage;
mod weather;

use clima_core::AppError;

/// Conversion into the top-level error taxonomy.
///
/// A trait rather than `From` impls: both sides live in other crates.
pub trait IntoAppError {
    fn into_app_error(self) -> AppError;
}
