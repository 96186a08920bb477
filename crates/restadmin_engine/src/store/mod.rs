pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileConfigStore;
pub use memory::InMemoryConfigStore;
pub use traits::{ConfigStore, StoreHandle};
