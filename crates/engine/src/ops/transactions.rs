//! Transaction operations.
//!
//! Writes (`write`) keep bill and owner balances in step with the recorded
//! transactions and patch the per-user cache after the store commit. Reads
//! (`list`) go through the cache for the per-user listing only.

mod list;
mod write;
