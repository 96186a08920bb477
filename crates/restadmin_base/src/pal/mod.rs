/* 📖 # What is the Platform Abstraction Layer?

The PAL provides a trait-based abstraction over filesystem operations, enabling testable code.
Module configuration files and generated skeleton sources are read and written through it:
- Testability: MockPal allows deterministic unit tests without filesystem access
- Flexibility: Switch between real filesystem and in-memory implementations
- Consistency: All filesystem operations use the same error handling
*/

mod file_path;
pub mod mock;
pub mod real_pal;
mod traits;

pub use file_path::FilePath;
pub use mock::MockPal;
pub use real_pal::RealPal;
pub use traits::{Pal, PalHandle, ReadSeek};
