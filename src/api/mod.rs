//! Purpose: Define the public Rust API boundary for recstore.
//! Exports: Store trait, handle, record type, format selection, and errors.
//! Role: Additive-only surface used by the CLI, the shell, and integration tests.
//! Invariants: Callers reach store variants only through `RecordStore`.

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::format::Format;
pub use crate::core::record::{Record, parse_assignment};
pub use crate::core::store::{RecordStore, StoreHandle, create_store_file, open_store};
