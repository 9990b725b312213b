pub mod file;
pub mod memory;

pub use file::FileSlot;
pub use memory::MemorySlot;
