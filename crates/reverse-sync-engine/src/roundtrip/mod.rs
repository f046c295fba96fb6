//! # Lossless Round-trip
//!
//! Restores the original target markup from block-format text plus a
//! [`RoundtripRecord`] built when the page was converted.
//!
//! ## Restoration Paths
//!
//! 1. **Fast**: the block text hashes to the recorded value, so the stored
//!    fragments are reassembled verbatim.
//! 2. **Splice**: blocks are compared one by one; unchanged blocks keep their
//!    stored fragment, changed ones are re-rendered and have their lost
//!    information restored.
//! 3. **Fallback**: every block is re-rendered.
//!
//! ## Key Invariants
//!
//! - `prefix + interleave(fragments, separators) + suffix` equals the original
//!   markup; [`build_record`] fails otherwise.
//! - Records carry a schema version and are rejected on mismatch.

pub mod fragments;
pub mod record;
pub mod rehydrate;

pub use fragments::{FragmentSplit, element_end, extract_fragments};
pub use record::{
    DocumentEnvelope, RecordBlock, RoundtripRecord, SCHEMA_VERSION, build_record, first_mismatch,
    sha256_hex,
};
pub use rehydrate::{
    SpliceDetail, SpliceMethod, SpliceOutcome, fallback_rehydrate, record_matches, rehydrate,
    splice_rehydrate,
};
