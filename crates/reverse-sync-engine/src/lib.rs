pub mod blocks;
pub mod diff;
pub mod error;
pub mod io;
pub mod lost_info;
pub mod mapper;
pub mod markup;
pub mod patch;
pub mod patcher;
pub mod render;
pub mod rope;
pub mod roundtrip;
pub mod sidecar;
pub mod sync;
pub mod text;
pub mod verify;

// Re-export key types for easier usage
pub use blocks::{Block, BlockKind, StructuralKind, parse_blocks};
pub use diff::{Alignment, BlockChange, ChangeKind, diff_blocks};
pub use error::StructuralError;
pub use io::IoError;
pub use lost_info::LostInfo;
pub use mapper::{RecordKind, TargetElementRecord, map_target};
pub use markup::Document;
pub use patch::{PatchOperation, PatchPlan, Strategy, build_patches};
pub use patcher::{apply_patches, resolve_address};
pub use roundtrip::{
    RoundtripRecord, SpliceOutcome, build_record, extract_fragments, rehydrate, splice_rehydrate,
};
pub use sidecar::{MappingFile, SidecarEntry, SidecarIndex, generate_mapping};
pub use sync::{SyncOutcome, sync_document};
pub use verify::{BatchSummary, CaseReport, verify_case};
