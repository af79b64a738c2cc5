//! Generic record adapter
//!
//! Parameterizes the form engine per record kind: which schema validates the
//! draft, which endpoints fetch and persist it, and where to navigate after
//! a save. The state machine and submission sequence behave identically for
//! every kind; only these parameters differ.

use crate::form::client::SubmitMethod;
use crate::form::schema::RecordSchema;
use crate::models::{ContentRecord, RecordKind};

/// Called with the persisted record after a successful save
pub type SuccessCallback = Box<dyn Fn(&ContentRecord) + Send + Sync>;

/// Per-kind parameters of the form engine
pub struct RecordAdapter {
    kind: RecordKind,
    schema: RecordSchema,
    listing_path: String,
    on_success: Option<SuccessCallback>,
}

impl RecordAdapter {
    /// Adapter for a record kind with its default schema and listing page
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            schema: RecordSchema::for_kind(kind),
            listing_path: format!("/admin/{}", kind.resource()),
            on_success: None,
        }
    }

    /// Override where the editor navigates after a save or discard
    pub fn with_listing_path(mut self, path: impl Into<String>) -> Self {
        self.listing_path = path.into();
        self
    }

    /// Supply a success callback; when set, it replaces the default
    /// navigate-to-listing behavior
    pub fn with_success(mut self, callback: SuccessCallback) -> Self {
        self.on_success = Some(callback);
        self
    }

    /// The record kind this adapter serves
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// The validation schema for this kind
    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// Listing page used for default navigation
    pub fn listing_path(&self) -> &str {
        &self.listing_path
    }

    /// Path of the initial fetch in edit mode.
    ///
    /// Singleton kinds are fetched without an ID (the server returns the one
    /// record); list kinds need the ID of the entry being edited, so `None`
    /// is returned when it is missing.
    pub fn fetch_path(&self, id: Option<i64>) -> Option<String> {
        let resource = self.kind.resource();
        if self.kind.is_singleton() {
            Some(format!("/api/v1/{}", resource))
        } else {
            id.map(|id| format!("/api/v1/{}/{}", resource, id))
        }
    }

    /// Method and path for persisting the draft: POST to the collection when
    /// creating, PATCH to the record when editing
    pub fn submit_target(&self, id: Option<i64>) -> (SubmitMethod, String) {
        let resource = self.kind.resource();
        match id {
            Some(id) => (
                SubmitMethod::Patch,
                format!("/api/v1/{}/{}", resource, id),
            ),
            None => (SubmitMethod::Post, format!("/api/v1/{}", resource)),
        }
    }

    /// Whether a success callback replaces default navigation
    pub fn has_success_callback(&self) -> bool {
        self.on_success.is_some()
    }

    /// Invoke the success callback, if any
    pub(crate) fn notify_success(&self, record: &ContentRecord) {
        if let Some(ref callback) = self.on_success {
            callback(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singleton_fetch_path_needs_no_id() {
        let adapter = RecordAdapter::new(RecordKind::EarlyLife);
        assert_eq!(
            adapter.fetch_path(None).as_deref(),
            Some("/api/v1/early-life")
        );
    }

    #[test]
    fn test_list_kind_fetch_path_requires_id() {
        let adapter = RecordAdapter::new(RecordKind::PlayerCareer);
        assert_eq!(adapter.fetch_path(None), None);
        assert_eq!(
            adapter.fetch_path(Some(3)).as_deref(),
            Some("/api/v1/player-career/3")
        );
    }

    #[test]
    fn test_submit_target_switches_method_on_id() {
        let adapter = RecordAdapter::new(RecordKind::CoachingCareer);
        let (method, path) = adapter.submit_target(None);
        assert_eq!(method, SubmitMethod::Post);
        assert_eq!(path, "/api/v1/coaching-career");

        let (method, path) = adapter.submit_target(Some(9));
        assert_eq!(method, SubmitMethod::Patch);
        assert_eq!(path, "/api/v1/coaching-career/9");
    }

    #[test]
    fn test_default_listing_path_per_kind() {
        assert_eq!(
            RecordAdapter::new(RecordKind::EarlyLife).listing_path(),
            "/admin/early-life"
        );
        assert_eq!(
            RecordAdapter::new(RecordKind::PlayerCareer)
                .with_listing_path("/admin")
                .listing_path(),
            "/admin"
        );
    }

    #[test]
    fn test_career_kinds_require_date_singleton_does_not() {
        assert!(RecordAdapter::new(RecordKind::PlayerCareer).schema().date_required);
        assert!(!RecordAdapter::new(RecordKind::EarlyLife).schema().date_required);
    }
}
