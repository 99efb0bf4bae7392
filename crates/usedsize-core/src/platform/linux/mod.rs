//! # Linux Live-Process Backend
//!
//! Inspects a running process without `ptrace`:
//!
//! - **Debug information**: the executable behind `/proc/<pid>/exe`, indexed
//!   by [`crate::symbols::DwarfCatalog`]
//! - **Load bias**: the executable's first mapping in `/proc/<pid>/maps`
//! - **Memory**: positioned reads and writes on `/proc/<pid>/mem`
//! - **Consistency**: [`StopGuard`] holds the process stopped for a query
//!
//! ## References
//!
//! - [proc(5) man page](https://man7.org/linux/man-pages/man5/proc.5.html)
//! - [kill(2) man page](https://man7.org/linux/man-pages/man2/kill.2.html)

pub mod guards;
pub mod maps;
pub mod memory;
pub mod process;

pub use guards::StopGuard;
pub use memory::ProcessMemory;
pub use process::ProcessInspector;
