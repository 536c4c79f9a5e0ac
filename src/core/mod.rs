// Core modules implementing the record stores, file formats, and error modeling.
pub mod atomic;
pub mod error;
pub mod format;
pub mod record;
pub mod store;
pub mod structured;
pub mod tabular;
