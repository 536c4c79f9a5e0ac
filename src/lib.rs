//! Purpose: Shared library crate used by the `recstore` CLI and tests.
//! Exports: `api` (stable surface), `core` (stores, formats, errors), `render`, `shell`.
//! Role: Record stores for CSV and JSON files plus the interactive session.
//! Invariants: Core modules hold no process-wide state; callers pass paths and handles.
//! Invariants: The shell depends on the stores, never the other way around.
pub mod api;
pub mod core;
pub mod render;
pub mod shell;
