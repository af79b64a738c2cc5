//! Submission pipeline
//!
//! `RecordEditor` wires the pieces of the form engine together: the reducer
//! owns the state, the adapter supplies per-kind parameters, the debounced
//! probe validates URL input, the object URL registry tracks local preview
//! handles, and the API client talks to the server. The editor is the only
//! place side effects happen; everything it does to the state goes through
//! `reduce`.
//!
//! The submission sequence is fixed: full schema validation first (an
//! invalid draft never reaches the network), then exactly one multipart
//! request (POST when creating, PATCH when editing), then mapping of the
//! response onto state. A server-side 400 lands its field errors exactly
//! where local validation would have put them.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::form::adapter::RecordAdapter;
use crate::form::client::{ApiClient, ClientError, SubmitPayload};
use crate::form::image::{
    CheckedImageProbe, DebouncedUrlProbe, HttpImageProbe, ImageProbe, ObjectUrlRegistry,
    ProbeError, ProbeOutcome, PROBE_DEBOUNCE,
};
use crate::form::schema::{messages, Field, FieldErrors, ImageFileMeta, RecordDraft};
use crate::form::state::{reduce, ColorMode, FormAction, FormState, ImageFile, TextField};
use crate::models::{ContentRecord, ImageSource};

/// Form-level messages shown above the action buttons
pub mod form_messages {
    pub const NOT_FOUND: &str = "The record could not be found.";
    pub const TIMED_OUT: &str = "The request timed out. Try again.";
    pub const LOAD_FAILED: &str = "Failed to load the record.";
    pub const SAVE_FAILED: &str = "Something went wrong while saving. Try again.";
}

/// How a submission attempt ended
#[derive(Debug)]
pub enum SubmitOutcome {
    /// A submission or the initial fetch was already in flight; nothing done
    Ignored,
    /// The draft failed validation (locally or server-side); field errors
    /// are set in the state
    Invalid,
    /// The request failed; a form-level error is set in the state
    Failed,
    /// The record was persisted
    Saved {
        record: ContentRecord,
        /// Where to navigate next; `None` when a success callback took over
        navigate_to: Option<String>,
    },
}

/// What should happen after the user asks to leave the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelDecision {
    /// Unsaved edits exist; ask before discarding
    ConfirmDiscard,
    /// Nothing to lose; navigate to the listing page
    Navigate(String),
}

/// One live editing session over a record.
///
/// Create with [`RecordEditor::create`] or [`RecordEditor::edit`] (followed
/// by [`start_load`](Self::start_load)), drive it with the setter methods,
/// and apply asynchronous completions with [`tick`](Self::tick) or
/// [`pump`](Self::pump). Call [`close`](Self::close) on teardown; it aborts
/// the in-flight fetch, cancels pending probes and releases every preview
/// handle. Dropping the editor does the same.
pub struct RecordEditor {
    state: FormState,
    adapter: RecordAdapter,
    client: Arc<ApiClient>,
    validator: DebouncedUrlProbe,
    probe_rx: mpsc::UnboundedReceiver<ProbeOutcome>,
    fetch_tx: mpsc::UnboundedSender<Result<ContentRecord, ClientError>>,
    fetch_rx: mpsc::UnboundedReceiver<Result<ContentRecord, ClientError>>,
    fetch_task: Option<JoinHandle<()>>,
    previews: ObjectUrlRegistry,
    /// ID of the record being edited, when known before the fetch resolves
    target_id: Option<i64>,
}

impl RecordEditor {
    /// Editor for a new record: empty fields, submits with POST
    pub fn create(adapter: RecordAdapter, client: Arc<ApiClient>) -> Self {
        Self::with_state(adapter, client, FormState::create_mode(), None)
    }

    /// Editor for an existing record: loading until [`start_load`] resolves,
    /// submits with PATCH.
    ///
    /// Singleton kinds are edited without an ID; list kinds need one.
    pub fn edit(adapter: RecordAdapter, client: Arc<ApiClient>, id: Option<i64>) -> Self {
        Self::with_state(adapter, client, FormState::edit_mode(), id)
    }

    fn with_state(
        adapter: RecordAdapter,
        client: Arc<ApiClient>,
        state: FormState,
        target_id: Option<i64>,
    ) -> Self {
        let probe: Arc<dyn ImageProbe> = Arc::new(CheckedImageProbe::new(Arc::new(
            HttpImageProbe::new(crate::form::client::REQUEST_TIMEOUT),
        )));
        let (validator, probe_rx) = DebouncedUrlProbe::new(probe, PROBE_DEBOUNCE);
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();

        Self {
            state,
            adapter,
            client,
            validator,
            probe_rx,
            fetch_tx,
            fetch_rx,
            fetch_task: None,
            previews: ObjectUrlRegistry::new(),
            target_id,
        }
    }

    /// Replace the URL validator; the probe is still wrapped in the format
    /// check and debounced by `delay`.
    pub fn with_probe(mut self, probe: Arc<dyn ImageProbe>, delay: std::time::Duration) -> Self {
        let checked: Arc<dyn ImageProbe> = Arc::new(CheckedImageProbe::new(probe));
        let (validator, probe_rx) = DebouncedUrlProbe::new(checked, delay);
        self.validator = validator;
        self.probe_rx = probe_rx;
        self
    }

    /// Current form state
    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// The adapter parameterizing this editor
    pub fn adapter(&self) -> &RecordAdapter {
        &self.adapter
    }

    /// Number of live local preview handles
    pub fn live_preview_handles(&self) -> usize {
        self.previews.len()
    }

    fn dispatch(&mut self, action: FormAction) {
        self.state = reduce(std::mem::take(&mut self.state), action);
    }

    fn draft(&self) -> RecordDraft<'_> {
        RecordDraft {
            title: &self.state.title,
            content: &self.state.content,
            date: &self.state.date,
            image_source: self.state.image_source(),
            image_url: &self.state.image_url,
            image_file: self.state.image_file.as_ref().map(|file| ImageFileMeta {
                content_type: &file.content_type,
                len: file.bytes.len(),
            }),
            has_stored_image: self.state.has_stored_image,
        }
    }

    /// Validate one field against the current draft and set or clear its
    /// error. Used as fields change so feedback is immediate.
    fn revalidate(&mut self, field: Field) {
        let message = self.adapter.schema().validate_field(&self.draft(), field);
        self.dispatch(FormAction::SetError { field, message });
    }

    // ------------------------------------------------------------------
    // Initial fetch (edit mode)
    // ------------------------------------------------------------------

    /// Kick off the initial fetch. The completion is applied by [`tick`] or
    /// [`pump`]; until then the state stays in loading.
    pub fn start_load(&mut self) {
        let Some(path) = self.adapter.fetch_path(self.target_id) else {
            self.dispatch(FormAction::SetLoading(false));
            self.dispatch(FormAction::SetFormError(
                form_messages::NOT_FOUND.to_string(),
            ));
            return;
        };

        self.dispatch(FormAction::SetLoading(true));
        let client = Arc::clone(&self.client);
        let tx = self.fetch_tx.clone();
        self.fetch_task = Some(tokio::spawn(async move {
            let result = client.fetch_record(&path).await;
            // Receiver gone means the editor was torn down mid-fetch.
            let _ = tx.send(result);
        }));
    }

    fn apply_fetch(&mut self, result: Result<ContentRecord, ClientError>) {
        match result {
            Ok(record) => {
                self.target_id = Some(record.id);
                self.dispatch(FormAction::ResetFromRecord(Box::new(record)));
            }
            Err(err) => {
                tracing::error!("Initial record fetch failed: {}", err);
                let message = match err {
                    ClientError::NotFound => form_messages::NOT_FOUND,
                    ClientError::TimedOut => form_messages::TIMED_OUT,
                    _ => form_messages::LOAD_FAILED,
                };
                self.dispatch(FormAction::SetLoading(false));
                self.dispatch(FormAction::SetFormError(message.to_string()));
            }
        }
    }

    // ------------------------------------------------------------------
    // Event pump
    // ------------------------------------------------------------------

    /// Wait for the next asynchronous completion (initial fetch or URL
    /// probe) and apply it.
    pub async fn tick(&mut self) {
        enum Event {
            Fetch(Result<ContentRecord, ClientError>),
            Probe(ProbeOutcome),
        }

        let event = {
            let fetch_rx = &mut self.fetch_rx;
            let probe_rx = &mut self.probe_rx;
            tokio::select! {
                Some(result) = fetch_rx.recv() => Event::Fetch(result),
                Some(outcome) = probe_rx.recv() => Event::Probe(outcome),
            }
        };

        match event {
            Event::Fetch(result) => self.apply_fetch(result),
            Event::Probe(outcome) => self.apply_probe(outcome),
        }
    }

    /// Apply every completion that is already queued, without waiting
    pub fn pump(&mut self) {
        while let Ok(result) = self.fetch_rx.try_recv() {
            self.apply_fetch(result);
        }
        while let Ok(outcome) = self.probe_rx.try_recv() {
            self.apply_probe(outcome);
        }
    }

    fn apply_probe(&mut self, outcome: ProbeOutcome) {
        // Superseded or cancelled probes are dead on arrival.
        if outcome.generation != self.validator.current_generation() {
            return;
        }
        // The URL branch may have been left or its text changed since.
        if !self.state.use_image_url || self.state.image_url.trim() != outcome.url {
            return;
        }

        match outcome.result {
            Ok(()) => {
                self.dispatch(FormAction::SetError {
                    field: Field::Image,
                    message: None,
                });
            }
            Err(ProbeError::InvalidFormat) => {
                self.dispatch(FormAction::SetError {
                    field: Field::Image,
                    message: Some(messages::IMAGE_URL_INVALID.to_string()),
                });
            }
            Err(_) => {
                self.dispatch(FormAction::SetError {
                    field: Field::Image,
                    message: Some(messages::IMAGE_LOAD_FAILED.to_string()),
                });
            }
        }
    }

    // ------------------------------------------------------------------
    // Field setters
    // ------------------------------------------------------------------

    pub fn set_title(&mut self, value: impl Into<String>) {
        self.dispatch(FormAction::SetField {
            field: TextField::Title,
            value: value.into(),
        });
        self.revalidate(Field::Title);
    }

    pub fn set_content(&mut self, value: impl Into<String>) {
        self.dispatch(FormAction::SetField {
            field: TextField::Content,
            value: value.into(),
        });
        self.revalidate(Field::Content);
    }

    pub fn set_date(&mut self, value: impl Into<String>) {
        self.dispatch(FormAction::SetField {
            field: TextField::Date,
            value: value.into(),
        });
        self.revalidate(Field::Date);
    }

    /// Update the URL field. A non-empty value schedules a debounced probe;
    /// clearing the field cancels any pending probe and its error.
    pub fn set_image_url(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.dispatch(FormAction::SetField {
            field: TextField::ImageUrl,
            value: value.clone(),
        });

        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.validator.cancel();
            self.dispatch(FormAction::SetError {
                field: Field::Image,
                message: None,
            });
        } else {
            self.validator.schedule(trimmed.to_string());
        }
    }

    /// Select a file for the upload branch.
    ///
    /// The previous preview handle is released first. A file that fails the
    /// type or size rules is not kept at all: the selection is cleared and
    /// the error set, so a submit cannot pick up an invalid file.
    pub fn select_file(&mut self, file: ImageFile) {
        self.release_local_preview();

        let message = self.adapter.schema().validate_field(
            &RecordDraft {
                image_source: ImageSource::Upload,
                image_file: Some(ImageFileMeta {
                    content_type: &file.content_type,
                    len: file.bytes.len(),
                }),
                ..RecordDraft::default()
            },
            Field::Image,
        );

        match message {
            Some(message) => {
                self.dispatch(FormAction::SetImageFile(None));
                self.dispatch(FormAction::SetImagePreviewUrl(String::new()));
                self.dispatch(FormAction::SetError {
                    field: Field::Image,
                    message: Some(message),
                });
            }
            None => {
                let preview = self.previews.create(&file);
                self.dispatch(FormAction::SetImageFile(Some(file)));
                self.dispatch(FormAction::SetImagePreviewUrl(preview));
                self.dispatch(FormAction::SetError {
                    field: Field::Image,
                    message: None,
                });
            }
        }
    }

    /// Flip between the URL and upload branches. Local preview handles and
    /// pending probes belong to the branch being left and are released.
    pub fn set_use_image_url(&mut self, use_url: bool) {
        if use_url == self.state.use_image_url {
            return;
        }
        self.release_local_preview();
        self.validator.cancel();
        self.dispatch(FormAction::SetUseImageUrl(use_url));
    }

    pub fn set_color_mode(&mut self, mode: ColorMode) {
        self.dispatch(FormAction::SetColorMode(mode));
    }

    pub fn toggle_color_mode(&mut self) {
        let mode = self.state.color_mode.toggled();
        self.dispatch(FormAction::SetColorMode(mode));
    }

    fn release_local_preview(&mut self) {
        if self.state.image_preview_url.starts_with("blob:") {
            let handle = self.state.image_preview_url.clone();
            self.previews.revoke(&handle);
        }
    }

    // ------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------

    /// Run the submission sequence.
    ///
    /// Full validation first; an invalid draft sets its field errors and
    /// never reaches the network. Otherwise exactly one request goes out
    /// and its result is mapped back onto the state.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if self.state.is_submitting || self.state.is_loading {
            return SubmitOutcome::Ignored;
        }

        let errors = self.adapter.schema().validate(&self.draft());
        if !errors.is_empty() {
            self.dispatch(FormAction::SetErrors(errors));
            return SubmitOutcome::Invalid;
        }

        self.dispatch(FormAction::SetErrors(FieldErrors::new()));
        self.dispatch(FormAction::SetFormError(String::new()));
        self.dispatch(FormAction::SetSubmitting(true));

        let payload = self.payload();
        let (method, path) = self.adapter.submit_target(self.state.record_id);
        let result = self.client.submit(method, &path, payload).await;
        self.dispatch(FormAction::SetSubmitting(false));

        match result {
            Ok(record) => {
                self.adapter.notify_success(&record);
                let navigate_to = if self.adapter.has_success_callback() {
                    None
                } else {
                    Some(self.adapter.listing_path().to_string())
                };
                self.release_local_preview();
                self.dispatch(FormAction::ResetFromRecord(Box::new(record.clone())));
                SubmitOutcome::Saved {
                    record,
                    navigate_to,
                }
            }
            Err(ClientError::Rejected(errors)) => {
                self.dispatch(FormAction::SetErrors(errors));
                SubmitOutcome::Invalid
            }
            Err(ClientError::NotFound) => {
                self.dispatch(FormAction::SetFormError(
                    form_messages::NOT_FOUND.to_string(),
                ));
                SubmitOutcome::Failed
            }
            Err(ClientError::TimedOut) => {
                self.dispatch(FormAction::SetFormError(
                    form_messages::TIMED_OUT.to_string(),
                ));
                SubmitOutcome::Failed
            }
            Err(err) => {
                tracing::error!("Submit failed: {}", err);
                self.dispatch(FormAction::SetFormError(
                    form_messages::SAVE_FAILED.to_string(),
                ));
                SubmitOutcome::Failed
            }
        }
    }

    /// Build the multipart payload from the current state. Only the active
    /// image branch is populated.
    fn payload(&self) -> SubmitPayload {
        let (image_url, image_file) = if self.state.use_image_url {
            let url = self.state.image_url.trim();
            ((!url.is_empty()).then(|| url.to_string()), None)
        } else {
            (None, self.state.image_file.clone())
        };

        SubmitPayload {
            title: self.state.title.clone(),
            content: self.state.content.clone(),
            date: self.state.date.clone(),
            image_source: self.state.image_source(),
            image_url,
            image_file,
        }
    }

    // ------------------------------------------------------------------
    // Leaving the form
    // ------------------------------------------------------------------

    /// The user asked to leave. With unsaved edits the caller must confirm
    /// through [`confirm_discard`](Self::confirm_discard) first.
    pub fn request_cancel(&self) -> CancelDecision {
        if self.state.dirty {
            CancelDecision::ConfirmDiscard
        } else {
            CancelDecision::Navigate(self.adapter.listing_path().to_string())
        }
    }

    /// Discard unsaved edits and return where to navigate
    pub fn confirm_discard(&mut self) -> String {
        self.close();
        self.adapter.listing_path().to_string()
    }

    /// Tear the editor down: abort the in-flight fetch, cancel pending
    /// probes, release every preview handle. Idempotent.
    pub fn close(&mut self) {
        if let Some(task) = self.fetch_task.take() {
            task.abort();
        }
        self.validator.cancel();
        self.previews.revoke_all();
    }
}

impl Drop for RecordEditor {
    fn drop(&mut self) {
        self.close();
    }
}
