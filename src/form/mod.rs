//! Multi-mode content editing form engine
//!
//! One engine drives the create and edit forms of every record kind. The
//! pieces:
//! - `schema`: declarative validation rules, shared with the server side
//! - `state`: a pure reducer over the complete form state
//! - `image`: URL probing behind a debounce window, and local preview
//!   handles with explicit release
//! - `client`: typed HTTP client mapping server responses onto the editor's
//!   error taxonomy
//! - `adapter`: per-kind parameters (schema, endpoints, navigation)
//! - `pipeline`: `RecordEditor`, the stateful composition of all of the
//!   above and the submission sequence

pub mod adapter;
pub mod client;
pub mod image;
pub mod pipeline;
pub mod schema;
pub mod state;

pub use adapter::RecordAdapter;
pub use client::{ApiClient, ClientError, SubmitMethod, SubmitPayload};
pub use image::{DebouncedUrlProbe, ImageProbe, ObjectUrlRegistry, ProbeError};
pub use pipeline::{CancelDecision, RecordEditor, SubmitOutcome};
pub use schema::{Field, FieldErrors, RecordSchema};
pub use state::{reduce, ColorMode, FormAction, FormState, ImageFile, PreviewState};
