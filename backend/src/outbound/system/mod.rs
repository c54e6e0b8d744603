//! Host resource probes backing the disk and memory health indicators.

mod disk;
mod memory;

pub use disk::FsStorageProbe;
pub use memory::ProcMemoryProbe;
