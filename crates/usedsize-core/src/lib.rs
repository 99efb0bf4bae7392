//! # usedsize-core
//!
//! Computes how much memory an object in a halted process actually holds:
//! its own storage plus every payload its containers own on the heap.
//!
//! `sizeof(std::vector<T>)` is the same whether the vector is empty or holds
//! a million elements. This crate walks the live data structures instead:
//!
//! - **Contiguous arrays** (`std::vector`): control block plus live elements
//! - **Circular lists** (`std::list`): control block plus every node payload
//! - **Pairs** (`std::pair`): both members
//! - **Ordered maps** (`std::map`): control block plus every key and value,
//!   found by an in-order walk of the red-black tree
//! - **Domain records**: field by field, or from a fixed recipe
//!
//! Anything else counts its static size.
//!
//! ## Architecture
//!
//! - [`Inspector`]: access to a process's memory and debug information.
//!   Backends: [`snapshot::Snapshot`] (in-memory) and
//!   `platform::linux::ProcessInspector` (live process, Linux only).
//! - [`shapes`]: classification of types into shapes and one handler per
//!   shape.
//! - [`SizeResolver`]: the recursive entry point every handler goes through.
//! - [`Session`]: the user-facing commands (size, log to file, store).
//!
//! ## Why unsafe code is needed
//!
//! The Linux backend sends `SIGSTOP`/`SIGCONT` and queries the page size
//! through `libc`. Size resolution itself is safe code.

#![allow(unsafe_code)] // Required for libc calls in the Linux backend

pub mod config;
pub mod error;
pub mod expr;
pub mod inspector;
pub mod platform;
pub mod resolver;
pub mod session;
pub mod shapes;
pub mod snapshot;
pub mod symbols;
pub mod types;

pub use config::ResolverConfig;
// Re-export commonly used types
pub use error::{SizeError, SizeResult};
pub use inspector::Inspector;
#[cfg(target_os = "linux")]
pub use platform::linux::{ProcessInspector, StopGuard};
pub use resolver::{ShapeHandler, SizeResolver};
pub use session::{FieldReport, Session};
pub use shapes::Shape;
pub use snapshot::Snapshot;
