//! Form state engine
//!
//! A reducer-style state machine over `FormState`. Every mutation of the
//! editing form goes through `reduce`, a pure function of (state, action);
//! side effects such as debounced URL probes and network calls live in the
//! surrounding pipeline, never here. That keeps every transition unit-testable
//! and makes the preview rendering a pure derivation of current values.

use serde::{Deserialize, Serialize};

use crate::form::schema::{Field, FieldErrors};
use crate::models::{ContentRecord, ImageSource};

/// A file the user picked for upload: the editor-side "opaque file handle"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Original file name
    pub name: String,
    /// MIME type reported for the file
    pub content_type: String,
    /// File contents
    pub bytes: Vec<u8>,
}

/// Editor color scheme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Light,
    Dark,
}

impl ColorMode {
    /// The other mode
    pub fn toggled(self) -> Self {
        match self {
            ColorMode::Light => ColorMode::Dark,
            ColorMode::Dark => ColorMode::Light,
        }
    }
}

/// A text field of the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Title,
    Content,
    Date,
    ImageUrl,
}

/// What the image preview panel should show, derived purely from state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    /// No image source selected yet
    Empty,
    /// A source is selected but failed validation or failed to load
    Failed,
    /// A loadable preview is available at `image_preview_url`
    Ready,
}

/// Complete state of one editing form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    /// Database ID when editing an existing record
    pub record_id: Option<i64>,
    /// Title field text
    pub title: String,
    /// Content field text (markdown)
    pub content: String,
    /// Date field text
    pub date: String,
    /// Which image branch the UI currently exposes. Decoupled from any
    /// persisted `imageSource` so the user can toggle before a value commits.
    pub use_image_url: bool,
    /// URL field text (URL branch)
    pub image_url: String,
    /// Selected file (upload branch)
    pub image_file: Option<ImageFile>,
    /// Where the preview panel loads its image from. A literal URL in URL
    /// mode, a local preview handle in upload mode, or empty.
    pub image_preview_url: String,
    /// The record being edited already has a stored binary image
    pub has_stored_image: bool,
    /// Per-field validation errors from the most recent pass
    pub errors: FieldErrors,
    /// Form-level error shown above the action buttons
    pub form_error: String,
    /// A submission is in flight
    pub is_submitting: bool,
    /// The initial fetch has not resolved yet
    pub is_loading: bool,
    /// Unsaved edits exist
    pub dirty: bool,
    /// Editor color scheme
    pub color_mode: ColorMode,
}

impl FormState {
    /// Initial state for create mode: empty fields, not loading
    pub fn create_mode() -> Self {
        Self {
            use_image_url: true,
            ..Self::default()
        }
    }

    /// Initial state for edit mode: empty fields, loading until the initial
    /// fetch resolves
    pub fn edit_mode() -> Self {
        Self {
            is_loading: true,
            ..Self::create_mode()
        }
    }

    /// The image strategy the current toggle position maps to
    pub fn image_source(&self) -> ImageSource {
        if self.use_image_url {
            ImageSource::Url
        } else {
            ImageSource::Upload
        }
    }

    /// Whether the active image branch carries any value
    pub fn has_image_source(&self) -> bool {
        if self.use_image_url {
            !self.image_url.trim().is_empty()
        } else {
            self.image_file.is_some() || self.has_stored_image
        }
    }

    /// Derive what the preview panel shows. No hidden flags: purely a
    /// function of the current URL, preview, and error values.
    pub fn preview_state(&self) -> PreviewState {
        if !self.has_image_source() {
            PreviewState::Empty
        } else if self.errors.contains_key(&Field::Image) {
            PreviewState::Failed
        } else if !self.image_preview_url.is_empty() {
            PreviewState::Ready
        } else {
            PreviewState::Empty
        }
    }

    /// Text of a field error, if set
    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }
}

/// All state transitions of the form engine
#[derive(Debug, Clone)]
pub enum FormAction {
    /// Set one text field's value
    SetField { field: TextField, value: String },
    /// Set or clear (with `None`) one field's error
    SetError {
        field: Field,
        message: Option<String>,
    },
    /// Replace all field errors (submit-time validation, server 400 mapping)
    SetErrors(FieldErrors),
    /// Set or clear the form-level error
    SetFormError(String),
    /// Flag a submission as in flight / settled
    SetSubmitting(bool),
    /// Flag the initial fetch as in flight / settled
    SetLoading(bool),
    /// Select or clear the upload-branch file
    SetImageFile(Option<ImageFile>),
    /// Flip between the URL and upload branches
    SetUseImageUrl(bool),
    /// Point the preview panel at a new location
    SetImagePreviewUrl(String),
    /// Repopulate every field from a fetched record (edit mode initial load)
    ResetFromRecord(Box<ContentRecord>),
    /// Switch the editor color scheme
    SetColorMode(ColorMode),
}

/// Apply one action to the state. Pure: no I/O, no timers, no channels.
pub fn reduce(mut state: FormState, action: FormAction) -> FormState {
    match action {
        FormAction::SetField { field, value } => {
            match field {
                TextField::Title => state.title = value,
                TextField::Content => state.content = value,
                TextField::Date => state.date = value,
                TextField::ImageUrl => {
                    // The preview mirrors the URL text immediately; the
                    // debounced probe only confirms or flags it later.
                    if state.use_image_url {
                        state.image_preview_url = value.clone();
                    }
                    state.image_url = value;
                }
            }
            state.dirty = true;
        }
        FormAction::SetError { field, message } => match message {
            Some(message) => {
                state.errors.insert(field, message);
            }
            None => {
                state.errors.remove(&field);
            }
        },
        FormAction::SetErrors(errors) => state.errors = errors,
        FormAction::SetFormError(message) => state.form_error = message,
        FormAction::SetSubmitting(submitting) => state.is_submitting = submitting,
        FormAction::SetLoading(loading) => state.is_loading = loading,
        FormAction::SetImageFile(file) => {
            state.image_file = file;
            state.dirty = true;
        }
        FormAction::SetUseImageUrl(use_url) => {
            if use_url != state.use_image_url {
                state.use_image_url = use_url;
                state.errors.remove(&Field::Image);
                // Switching modes leaves no residue in the inactive branch
                if use_url {
                    state.image_file = None;
                    state.image_preview_url = state.image_url.clone();
                } else {
                    state.image_url.clear();
                    state.image_preview_url.clear();
                }
            }
        }
        FormAction::SetImagePreviewUrl(url) => state.image_preview_url = url,
        FormAction::ResetFromRecord(record) => {
            let use_image_url = record.image_source == ImageSource::Url;
            let has_stored_image = record.has_stored_image();
            // An uploaded image is previewed through the record's image
            // endpoint; a URL image through the URL itself.
            let preview = match record.image_url {
                Some(ref url) => url.clone(),
                None if has_stored_image => record.image_endpoint(),
                None => String::new(),
            };
            state = FormState {
                record_id: Some(record.id),
                title: record.title,
                content: record.content,
                date: record.date.unwrap_or_default(),
                use_image_url,
                image_url: record.image_url.unwrap_or_default(),
                image_file: None,
                image_preview_url: preview,
                has_stored_image,
                errors: FieldErrors::new(),
                form_error: String::new(),
                is_submitting: false,
                is_loading: false,
                dirty: false,
                color_mode: state.color_mode,
            };
        }
        FormAction::SetColorMode(mode) => state.color_mode = mode,
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::schema::messages;
    use crate::models::RecordKind;
    use chrono::Utc;

    fn record(image_source: ImageSource) -> ContentRecord {
        ContentRecord {
            id: 7,
            kind: RecordKind::EarlyLife,
            title: "Old".into(),
            content: "Old text".into(),
            content_html: String::new(),
            date: None,
            image_source,
            image_url: match image_source {
                ImageSource::Url => Some("https://example.com/a.jpg".into()),
                ImageSource::Upload => None,
            },
            image_type: match image_source {
                ImageSource::Url => None,
                ImageSource::Upload => Some("image/png".into()),
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_create_mode_is_not_loading_edit_mode_is() {
        assert!(!FormState::create_mode().is_loading);
        assert!(FormState::edit_mode().is_loading);
    }

    #[test]
    fn test_set_field_marks_dirty_and_mirrors_url_preview() {
        let state = reduce(
            FormState::create_mode(),
            FormAction::SetField {
                field: TextField::ImageUrl,
                value: "https://example.com/x.png".into(),
            },
        );
        assert!(state.dirty);
        assert_eq!(state.image_url, "https://example.com/x.png");
        assert_eq!(state.image_preview_url, "https://example.com/x.png");
    }

    #[test]
    fn test_set_error_and_clear_error() {
        let state = reduce(
            FormState::create_mode(),
            FormAction::SetError {
                field: Field::Title,
                message: Some(messages::TITLE_REQUIRED.into()),
            },
        );
        assert_eq!(state.error(Field::Title), Some(messages::TITLE_REQUIRED));

        let state = reduce(
            state,
            FormAction::SetError {
                field: Field::Title,
                message: None,
            },
        );
        assert!(state.error(Field::Title).is_none());
        assert!(state.errors.is_empty(), "cleared errors leave no stale keys");
    }

    #[test]
    fn test_switch_to_upload_clears_url_branch() {
        let mut state = FormState::create_mode();
        state.image_url = "https://example.com/a.jpg".into();
        state.image_preview_url = state.image_url.clone();

        let state = reduce(state, FormAction::SetUseImageUrl(false));
        assert!(state.image_url.is_empty());
        assert!(state.image_preview_url.is_empty());
        assert!(!state.use_image_url);
    }

    #[test]
    fn test_switch_to_url_clears_file_branch() {
        let mut state = FormState::create_mode();
        state.use_image_url = false;
        state.image_file = Some(ImageFile {
            name: "a.png".into(),
            content_type: "image/png".into(),
            bytes: vec![1, 2, 3],
        });
        state.image_preview_url = "blob:deadbeef".into();

        let state = reduce(state, FormAction::SetUseImageUrl(true));
        assert!(state.image_file.is_none());
        assert!(state.use_image_url);
        // Preview follows the (empty) URL branch now
        assert!(state.image_preview_url.is_empty());
    }

    #[test]
    fn test_mode_switch_drops_stale_image_error() {
        let mut state = FormState::create_mode();
        state
            .errors
            .insert(Field::Image, messages::IMAGE_URL_INVALID.into());
        let state = reduce(state, FormAction::SetUseImageUrl(false));
        assert!(state.error(Field::Image).is_none());
    }

    #[test]
    fn test_reset_from_url_record() {
        let state = reduce(
            FormState::edit_mode(),
            FormAction::ResetFromRecord(Box::new(record(ImageSource::Url))),
        );
        assert_eq!(state.record_id, Some(7));
        assert_eq!(state.title, "Old");
        assert!(state.use_image_url);
        assert_eq!(state.image_preview_url, "https://example.com/a.jpg");
        assert!(!state.is_loading);
        assert!(!state.dirty);
    }

    #[test]
    fn test_reset_from_upload_record_previews_image_endpoint() {
        let state = reduce(
            FormState::edit_mode(),
            FormAction::ResetFromRecord(Box::new(record(ImageSource::Upload))),
        );
        assert!(!state.use_image_url);
        assert!(state.has_stored_image);
        assert_eq!(state.image_preview_url, "/api/v1/early-life/7/image");
    }

    #[test]
    fn test_reset_keeps_color_mode() {
        let mut state = FormState::edit_mode();
        state.color_mode = ColorMode::Dark;
        let state = reduce(
            state,
            FormAction::ResetFromRecord(Box::new(record(ImageSource::Url))),
        );
        assert_eq!(state.color_mode, ColorMode::Dark);
    }

    // ========================================================================
    // Preview derivation
    // ========================================================================

    #[test]
    fn test_preview_empty_without_source() {
        let state = FormState::create_mode();
        assert_eq!(state.preview_state(), PreviewState::Empty);
    }

    #[test]
    fn test_preview_failed_when_image_error_present() {
        let mut state = FormState::create_mode();
        state.image_url = "notaurl".into();
        state.image_preview_url = "notaurl".into();
        state
            .errors
            .insert(Field::Image, messages::IMAGE_URL_INVALID.into());
        assert_eq!(state.preview_state(), PreviewState::Failed);
    }

    #[test]
    fn test_preview_ready_with_valid_url() {
        let mut state = FormState::create_mode();
        state.image_url = "https://example.com/a.jpg".into();
        state.image_preview_url = state.image_url.clone();
        assert_eq!(state.preview_state(), PreviewState::Ready);
    }

    #[test]
    fn test_color_mode_toggle() {
        assert_eq!(ColorMode::Light.toggled(), ColorMode::Dark);
        assert_eq!(ColorMode::Dark.toggled(), ColorMode::Light);
    }
}
