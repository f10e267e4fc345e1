pub mod conversation;
pub mod document;
pub mod enums;
pub mod pii;

pub use conversation::ChatTurn;
pub use document::{SourceDocument, SourceKind};
pub use enums::{ChatRole, InvalidEnum, PiiCategory};
pub use pii::{CandidateSchemaError, ExtractionResult, PiiCandidate, PiiRecord};
