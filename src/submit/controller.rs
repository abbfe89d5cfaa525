//! Per-form submission controller.
//!
//! Composes extraction, annotation, and the transport into the submit
//! lifecycle: clear errors, show loading, extract, transform, send, then
//! annotate-or-succeed. One controller owns one form subtree; submissions on
//! it are strictly serialized by the `Idle`/`Submitting` gate and by
//! disabling the triggering control while a request is in flight.

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::annotate::{self, FieldErrorSet, FormErrorSet};
use crate::dom::{Document, NodeId};
use crate::extract::extract;
use crate::value::FormValue;

use super::transport::{HttpTransport, Transport, TransportResponse};

/// Hooks and request shaping supplied by the consumer. All hooks have
/// logging defaults, so `SubmitOptions::default()` is a working setup.
pub struct SubmitOptions {
    on_success: Box<dyn Fn(&Value) + Send + Sync>,
    on_error: Box<dyn Fn(&SubmitFailure) + Send + Sync>,
    build_request: Box<dyn Fn(FormValue) -> Value + Send + Sync>,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            on_success: Box::new(|response| info!(%response, "submit succeeded")),
            on_error: Box::new(|failure| {
                warn!(status = ?failure.status, message = %failure.message, "submit failed")
            }),
            build_request: Box::new(|value| value.to_json()),
        }
    }
}

impl SubmitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effect invoked with the parsed success payload.
    pub fn on_success(mut self, hook: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.on_success = Box::new(hook);
        self
    }

    /// Effect invoked with raw failure details. Runs on every failure,
    /// whether or not the body could be parsed for annotation.
    pub fn on_error(mut self, hook: impl Fn(&SubmitFailure) + Send + Sync + 'static) -> Self {
        self.on_error = Box::new(hook);
        self
    }

    /// Transform from the extracted form value to the request payload.
    /// Defaults to the identity encoding.
    pub fn build_request(
        mut self,
        hook: impl Fn(FormValue) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.build_request = Box::new(hook);
        self
    }
}

/// Raw details of a failed submission handed to the error hook.
#[derive(Debug, Clone)]
pub struct SubmitFailure {
    /// HTTP status, when a response was received at all.
    pub status: Option<u16>,
    /// Raw response body, when one was received.
    pub body: Option<String>,
    pub message: String,
}

/// Lifecycle state of one attached controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitState {
    #[default]
    Idle,
    Submitting,
}

/// Recognized shape of a failure body. Anything else is skipped silently;
/// the error hook still runs.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    field_errors: Option<FieldErrorSet>,
    #[serde(default)]
    form_errors: Option<FormErrorSet>,
}

/// Controller registered on one form subtree.
pub struct SubmissionController {
    form: NodeId,
    trigger: Option<NodeId>,
    endpoint: String,
    options: SubmitOptions,
    transport: Box<dyn Transport>,
    state: SubmitState,
}

impl SubmissionController {
    /// Attach a controller to `form`, posting to `endpoint` over HTTP.
    pub fn attach(
        doc: &Document,
        form: NodeId,
        endpoint: impl Into<String>,
        options: SubmitOptions,
    ) -> Result<Self> {
        let transport = Box::new(HttpTransport::new()?);
        Ok(Self::attach_with_transport(
            doc, form, endpoint, options, transport,
        ))
    }

    /// Attach with a caller-supplied transport.
    pub fn attach_with_transport(
        doc: &Document,
        form: NodeId,
        endpoint: impl Into<String>,
        options: SubmitOptions,
        transport: Box<dyn Transport>,
    ) -> Self {
        let trigger = doc.find_first(form, |d, n| d.attr(n, "type") == Some("submit"));
        Self {
            form,
            trigger,
            endpoint: endpoint.into(),
            options,
            transport,
            state: SubmitState::Idle,
        }
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }

    /// The form subtree this controller owns.
    pub fn form(&self) -> NodeId {
        self.form
    }

    /// The submit control found at attach time, if any.
    pub fn trigger(&self) -> Option<NodeId> {
        self.trigger
    }

    /// Run one submission lifecycle. A trigger while a submission is in
    /// flight (controller `Submitting`, or the trigger control disabled) is
    /// ignored without issuing a request.
    pub async fn submit(&mut self, doc: &mut Document) {
        if self.state == SubmitState::Submitting {
            return;
        }
        if let Some(trigger) = self.trigger {
            if doc.attr(trigger, "disabled").is_some() {
                return;
            }
        }

        self.state = SubmitState::Submitting;
        annotate::clear_form_errors(doc, self.form);
        annotate::clear_field_errors(doc, self.form);
        if let Some(trigger) = self.trigger {
            annotate::set_loading(doc, trigger, true);
        }

        let value = extract(doc, self.form);
        let request = (self.options.build_request)(value);
        info!(endpoint = %self.endpoint, "submitting form");
        let result = self.transport.post_json(&self.endpoint, &request).await;

        if let Some(trigger) = self.trigger {
            annotate::set_loading(doc, trigger, false);
        }
        self.state = SubmitState::Idle;

        match result {
            Ok(response) if response.is_success() => self.handle_success(response),
            Ok(response) => self.handle_failure(doc, response),
            Err(err) => {
                warn!(error = %err, "submit transport failed");
                (self.options.on_error)(&SubmitFailure {
                    status: None,
                    body: None,
                    message: err.to_string(),
                });
            }
        }
    }

    fn handle_success(&self, response: TransportResponse) {
        match serde_json::from_str::<Value>(&response.body) {
            Ok(parsed) => (self.options.on_success)(&parsed),
            Err(err) => {
                warn!(status = response.status, "success response body was not JSON");
                (self.options.on_error)(&SubmitFailure {
                    status: Some(response.status),
                    body: Some(response.body),
                    message: format!("invalid JSON in response body: {err}"),
                });
            }
        }
    }

    fn handle_failure(&self, doc: &mut Document, response: TransportResponse) {
        if response.is_error_status() {
            if let Ok(errors) = serde_json::from_str::<ErrorResponse>(&response.body) {
                if let Some(field_errors) = &errors.field_errors {
                    annotate::apply_field_errors(doc, self.form, field_errors);
                }
                if let Some(form_errors) = &errors.form_errors {
                    annotate::apply_form_errors(doc, self.form, form_errors);
                }
            }
        }
        warn!(status = response.status, "submit failed");
        (self.options.on_error)(&SubmitFailure {
            status: Some(response.status),
            body: Some(response.body),
            message: "submit failed".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::{
        ALERT_CLASS, ERROR_MESSAGE_CLASS, ERROR_STATE_CLASS, FIELD_GROUP_CLASS, FORM_ERROR_CLASS,
        HELP_BLOCK_CLASS,
    };
    use crate::submit::MockTransport;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// A form with one wrapped `job_name` field and a submit button.
    fn job_form(doc: &mut Document) -> (NodeId, NodeId, NodeId) {
        let form = doc.create_element("form");
        let group = doc.create_element("div");
        doc.add_class(group, FIELD_GROUP_CLASS);
        doc.append_child(form, group);
        let input = doc.create_element("input");
        doc.set_attr(input, "type", "text");
        doc.set_attr(input, "name", "job_name");
        doc.set_attr(input, "value", "Report");
        doc.append_child(group, input);
        let button = doc.create_element("button");
        doc.set_attr(button, "type", "submit");
        doc.append_child(form, button);
        (form, group, button)
    }

    fn response(status: u16, body: &str) -> TransportResponse {
        TransportResponse {
            status,
            body: body.to_string(),
        }
    }

    fn error_counter(options: SubmitOptions) -> (SubmitOptions, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let hook_count = count.clone();
        let options = options.on_error(move |_| {
            hook_count.fetch_add(1, Ordering::SeqCst);
        });
        (options, count)
    }

    fn message_blocks(doc: &Document, root: NodeId) -> Vec<String> {
        doc.find_all(root, |d, n| {
            d.has_class(n, HELP_BLOCK_CLASS) && d.has_class(n, ERROR_MESSAGE_CLASS)
        })
        .into_iter()
        .map(|n| doc.text(n).to_string())
        .collect()
    }

    mod success_path {
        use super::*;

        #[tokio::test]
        async fn test_success_invokes_hook_and_reenables_trigger() {
            let mut doc = Document::new();
            let (form, _, button) = job_form(&mut doc);

            let mut mock = MockTransport::new();
            mock.expect_post_json()
                .withf(|endpoint, _| endpoint == "/jobs")
                .times(1)
                .returning(|_, _| Ok(response(200, r#"{"id": 7}"#)));

            let seen = Arc::new(Mutex::new(Vec::new()));
            let hook_seen = seen.clone();
            let options = SubmitOptions::new()
                .on_success(move |payload| hook_seen.lock().unwrap().push(payload.clone()));

            let mut controller = SubmissionController::attach_with_transport(
                &doc,
                form,
                "/jobs",
                options,
                Box::new(mock),
            );
            controller.submit(&mut doc).await;

            assert_eq!(controller.state(), SubmitState::Idle);
            assert_eq!(doc.attr(button, "disabled"), None);
            assert_eq!(*seen.lock().unwrap(), vec![serde_json::json!({"id": 7})]);
        }

        #[tokio::test]
        async fn test_build_request_shapes_the_payload() {
            let mut doc = Document::new();
            let (form, _, _) = job_form(&mut doc);

            let mut mock = MockTransport::new();
            mock.expect_post_json()
                .withf(|_, body| body["job"]["job_name"] == "Report")
                .times(1)
                .returning(|_, _| Ok(response(200, "{}")));

            let options = SubmitOptions::new()
                .build_request(|value| serde_json::json!({ "job": value.to_json() }));
            let mut controller = SubmissionController::attach_with_transport(
                &doc,
                form,
                "/jobs",
                options,
                Box::new(mock),
            );
            controller.submit(&mut doc).await;
        }

        #[tokio::test]
        async fn test_non_json_success_body_routes_to_error_hook() {
            let mut doc = Document::new();
            let (form, _, _) = job_form(&mut doc);

            let mut mock = MockTransport::new();
            mock.expect_post_json()
                .times(1)
                .returning(|_, _| Ok(response(200, "<html>ok</html>")));

            let (options, errors) = error_counter(SubmitOptions::new().on_success(|_| {
                panic!("success hook must not run for an unparseable body");
            }));
            let mut controller = SubmissionController::attach_with_transport(
                &doc,
                form,
                "/jobs",
                options,
                Box::new(mock),
            );
            controller.submit(&mut doc).await;

            assert_eq!(errors.load(Ordering::SeqCst), 1);
        }
    }

    mod failure_path {
        use super::*;

        #[tokio::test]
        async fn test_field_errors_annotate_and_error_hook_runs_once() {
            let mut doc = Document::new();
            let (form, group, button) = job_form(&mut doc);

            let mut mock = MockTransport::new();
            mock.expect_post_json().times(1).returning(|_, _| {
                Ok(response(
                    400,
                    r#"{"field_errors": {"job_name": ["A value is required."]}}"#,
                ))
            });

            let (options, errors) = error_counter(SubmitOptions::new());
            let mut controller = SubmissionController::attach_with_transport(
                &doc,
                form,
                "/jobs",
                options,
                Box::new(mock),
            );
            controller.submit(&mut doc).await;

            assert!(doc.has_class(group, ERROR_STATE_CLASS));
            assert_eq!(
                message_blocks(&doc, form),
                vec!["A value is required.".to_string()]
            );
            assert_eq!(errors.load(Ordering::SeqCst), 1);
            assert_eq!(doc.attr(button, "disabled"), None);
            assert_eq!(controller.state(), SubmitState::Idle);
        }

        #[tokio::test]
        async fn test_form_errors_insert_banner() {
            let mut doc = Document::new();
            let (form, _, _) = job_form(&mut doc);

            let mut mock = MockTransport::new();
            mock.expect_post_json()
                .times(1)
                .returning(|_, _| Ok(response(422, r#"{"form_errors": ["rate limited"]}"#)));

            let (options, errors) = error_counter(SubmitOptions::new());
            let mut controller = SubmissionController::attach_with_transport(
                &doc,
                form,
                "/jobs",
                options,
                Box::new(mock),
            );
            controller.submit(&mut doc).await;

            let banners = doc.find_all(form, |d, n| {
                d.has_class(n, ALERT_CLASS) && d.has_class(n, FORM_ERROR_CLASS)
            });
            assert_eq!(banners.len(), 1);
            assert_eq!(doc.text(banners[0]), "rate limited");
            assert_eq!(errors.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_unparseable_error_body_skips_annotation() {
            let mut doc = Document::new();
            let (form, group, _) = job_form(&mut doc);

            let mut mock = MockTransport::new();
            mock.expect_post_json()
                .times(1)
                .returning(|_, _| Ok(response(500, "Internal Server Error")));

            let (options, errors) = error_counter(SubmitOptions::new());
            let mut controller = SubmissionController::attach_with_transport(
                &doc,
                form,
                "/jobs",
                options,
                Box::new(mock),
            );
            controller.submit(&mut doc).await;

            assert!(!doc.has_class(group, ERROR_STATE_CLASS));
            assert!(message_blocks(&doc, form).is_empty());
            assert_eq!(errors.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_transport_failure_reaches_error_hook() {
            let mut doc = Document::new();
            let (form, _, button) = job_form(&mut doc);

            let mut mock = MockTransport::new();
            mock.expect_post_json()
                .times(1)
                .returning(|_, _| Err(anyhow::anyhow!("connection refused")));

            let details = Arc::new(Mutex::new(Vec::new()));
            let hook_details = details.clone();
            let options = SubmitOptions::new()
                .on_error(move |failure| hook_details.lock().unwrap().push(failure.clone()));
            let mut controller = SubmissionController::attach_with_transport(
                &doc,
                form,
                "/jobs",
                options,
                Box::new(mock),
            );
            controller.submit(&mut doc).await;

            let details = details.lock().unwrap();
            assert_eq!(details.len(), 1);
            assert_eq!(details[0].status, None);
            assert!(details[0].message.contains("connection refused"));
            assert_eq!(doc.attr(button, "disabled"), None);
        }
    }

    mod serialization_gate {
        use super::*;

        #[tokio::test]
        async fn test_disabled_trigger_produces_no_request() {
            let mut doc = Document::new();
            let (form, _, button) = job_form(&mut doc);
            doc.set_attr(button, "disabled", "disabled");

            let mut mock = MockTransport::new();
            mock.expect_post_json().times(0);

            let (options, errors) = error_counter(SubmitOptions::new().on_success(|_| {
                panic!("no request means no success");
            }));
            let mut controller = SubmissionController::attach_with_transport(
                &doc,
                form,
                "/jobs",
                options,
                Box::new(mock),
            );
            controller.submit(&mut doc).await;

            assert_eq!(errors.load(Ordering::SeqCst), 0);
            assert_eq!(controller.state(), SubmitState::Idle);
        }

        #[tokio::test]
        async fn test_resubmit_clears_previous_annotations() {
            let mut doc = Document::new();
            let (form, group, _) = job_form(&mut doc);

            let calls = Arc::new(AtomicUsize::new(0));
            let mock_calls = calls.clone();
            let mut mock = MockTransport::new();
            mock.expect_post_json().times(2).returning(move |_, _| {
                if mock_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Ok(response(
                        400,
                        r#"{"field_errors": {"job_name": ["required"]}, "form_errors": ["try later"]}"#,
                    ))
                } else {
                    Ok(response(200, "{}"))
                }
            });

            let mut controller = SubmissionController::attach_with_transport(
                &doc,
                form,
                "/jobs",
                SubmitOptions::new(),
                Box::new(mock),
            );
            controller.submit(&mut doc).await;
            assert!(doc.has_class(group, ERROR_STATE_CLASS));

            controller.submit(&mut doc).await;
            assert!(!doc.has_class(group, ERROR_STATE_CLASS));
            assert!(message_blocks(&doc, form).is_empty());
            assert!(doc
                .find_all(form, |d, n| d.has_class(n, FORM_ERROR_CLASS))
                .is_empty());
        }
    }
}
