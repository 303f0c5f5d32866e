//! Session lifecycle, registry, and per-session serialized execution.

mod registry;
mod worker;

pub use registry::SessionRegistry;
