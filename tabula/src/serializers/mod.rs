//! Wire formats for table snapshots
//!
//! The secret-storage subsystem consumes snapshots through a plain
//! `serialize`/`deserialize` byte pair; JSON is the format it speaks.

pub mod json;
