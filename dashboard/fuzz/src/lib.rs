//! Property-based fuzz testing for OPCLW account decoding and instruction
//! encoding.
//!
//! # Usage
//!
//! ```bash
//! # Run all property-based tests
//! cargo test --release -p opclw-dashboard-fuzz
//!
//! # Run the fuzz test runner
//! cargo run --release -p opclw-dashboard-fuzz
//!
//! # Run with more iterations
//! PROPTEST_CASES=10000 cargo test --release -p opclw-dashboard-fuzz
//! ```

pub mod arbitrary;
pub mod invariants;

pub use arbitrary::*;
pub use invariants::*;

// Include fuzz targets as test modules
#[cfg(test)]
#[path = "../fuzz_targets/task_decode.rs"]
mod task_decode_tests;

#[cfg(test)]
#[path = "../fuzz_targets/codec_strings.rs"]
mod codec_strings_tests;

#[cfg(test)]
#[path = "../fuzz_targets/create_task_payload.rs"]
mod create_task_payload_tests;
