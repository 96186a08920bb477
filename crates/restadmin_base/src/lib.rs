/* 📖 # Why have restadmin_base as a core library?
restadmin_base provides the foundational error handling, tracing setup and the
platform abstraction layer used across all crates.
This ensures consistency in error handling and prevents circular dependencies between crates.
*/

pub mod error;
pub mod pal;
mod pal_tests;
pub mod tracing;

// Re-export commonly used types for convenience
pub use error::{Error as RestAdminError, ErrorKind, Result as RestAdminResult, ResultExt};
pub use pal::{FilePath, MockPal, Pal, PalHandle, RealPal};
