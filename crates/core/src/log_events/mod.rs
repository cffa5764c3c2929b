//! Log event extraction.
//!
//! The engine reports progress and completion only as free text. This module
//! turns each line into a typed [`LogEvent`] so nothing else in the crate has
//! to look at raw log text.

mod extractor;
mod types;

pub use extractor::{detect_completion, LogExtractor, FAILURE_MARKERS, SUCCESS_MARKERS};
pub use types::{
    CompletionMarker, CompletionOutcome, DurationEvent, LogEvent, ProgressEvent,
};
