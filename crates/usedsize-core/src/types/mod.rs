//! # Types
//!
//! Backend-agnostic types describing what the inspector reports about the
//! inspected process: addresses, static types with their fields, addressable
//! objects, and the process itself.

pub mod address;
pub mod object;
pub mod process;

// Re-export all public types
pub use address::Address;
pub use object::{Field, ObjectRef, TypeId, TypeInfo};
pub use process::{MemoryRegion, ProcessId};
