//! Interaction recording.
//!
//! Every request that reaches the engine produces one JSON document in the log
//! collection, named `{millisecond timestamp}_{fingerprint}.json`.
//!
//! # Module Structure
//!
//! - `types` - Record document shape and body/header decoding
//! - `artifact` - Artifact naming and fingerprinting
//! - `keyword` - Optional keyword derivation from a path -> field map
//! - `recorder` - Builds and persists records

mod artifact;
mod keyword;
mod recorder;
mod types;

pub use artifact::{artifact_name, fallback_name, fingerprint, TIMESTAMP_WIDTH};
pub use keyword::{KeywordError, KeywordMap, KeywordSource};
pub use recorder::{InteractionRecorder, RecordOutcome, RequestInfo, ResponseInfo};
pub use types::{
    decode_body, empty_object, header_map_to_record, round_cost, InteractionRecord,
    RecordedResponse,
};
