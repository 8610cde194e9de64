//! Catalog compensation: the heart of Catalogist.
//!
//! A run follows an **Extract → Repair → Split** flow:
//!
//! 1. **Receive** an extracted catalog forest (possibly absent or empty)
//! 2. **Fall back** to the default module templates when nothing usable came in
//! 3. **Repair** otherwise: the backend reasons in Thought / Action / Final Answer
//!    text, the controller runs the requested tools against the current best
//!    forest and validates every Final Answer
//! 4. **Split** the annotated forest into business, technical and pricing views
//!
//! The repair loop ends on a valid Final Answer or after `max_iterations`
//! backend calls, whichever comes first.

pub mod classifier;
pub mod controller;
pub mod linker;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod trace;
pub mod transcript;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use classifier::{CatalogViews, classify_and_split, classify_node, extract_view};
pub use controller::{RepairController, RepairOutcome, RepairStatus};
pub use linker::{LinkReport, LinkTemplate, TemplateLinker};
pub use orchestrator::{
    CompensationOrchestrator, CompensationResult, CompensationSettings, CompensationSource,
};
pub use parser::{Directive, Malformed};
pub use trace::{ReasoningTrace, TraceEntry, TraceKind};
pub use transcript::{CallbackSink, FileSink, Transcript, TranscriptSink};
