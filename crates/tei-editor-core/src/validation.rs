/*
 * validation.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Version-tagged asynchronous validation.
 */

//! Validation runs off the edit path. A [`ValidationTicket`] captures the
//! version and text at the time the request is made; a report for any
//! version other than the current one is discarded as stale.

use std::cell::RefCell;
use std::sync::Arc;

use async_trait::async_trait;
use tei_error_reporting::DiagnosticMessage;

use crate::buffer::TextBuffer;
use crate::config::EditorConfig;
use crate::editor::{EditorEvent, XmlEditor};
use crate::error::Result;
use crate::snapshot::DocumentVersion;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationTicket {
    pub version: DocumentVersion,
    pub text: Arc<str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub version: DocumentVersion,
    pub diagnostics: Vec<DiagnosticMessage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Applied {
        version: DocumentVersion,
        diagnostics: usize,
    },
    Stale {
        reported: DocumentVersion,
        current: DocumentVersion,
    },
}

impl ValidationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ValidationOutcome::Applied { .. })
    }
}

impl<B: TextBuffer> XmlEditor<B> {
    pub fn begin_validation(&self) -> Result<ValidationTicket> {
        let snapshot = self.snapshot()?;
        Ok(ValidationTicket {
            version: snapshot.version(),
            text: snapshot.shared_text(),
        })
    }

    /// Publish `report` if it was produced for the current version.
    pub fn apply_validation(&mut self, report: ValidationReport) -> ValidationOutcome {
        if report.version != self.version {
            tracing::debug!(
                reported = %report.version,
                current = %self.version,
                "discarding stale validation result"
            );
            return ValidationOutcome::Stale {
                reported: report.version,
                current: self.version,
            };
        }
        let count = report.diagnostics.len();
        self.validation = report.diagnostics;
        self.emit(EditorEvent::ValidationUpdated {
            version: report.version,
            diagnostics: self.validation.clone(),
        });
        ValidationOutcome::Applied {
            version: report.version,
            diagnostics: count,
        }
    }

    /// Diagnostics of the last applied validation.
    pub fn validation_diagnostics(&self) -> &[DiagnosticMessage] {
        &self.validation
    }
}

/// A schema or rule checker run against a captured text.
#[async_trait(?Send)]
pub trait Validator {
    async fn validate(&self, ticket: &ValidationTicket) -> Result<Vec<DiagnosticMessage>>;
}

/// Runs a [`Validator`] until its result lands on the current version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationDriver {
    max_retries: u32,
}

impl ValidationDriver {
    pub fn new(max_retries: u32) -> Self {
        ValidationDriver { max_retries }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        ValidationDriver::new(config.max_validation_retries)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Validate the current text, starting over against the latest text
    /// whenever the document changes while `validator` is running. The
    /// editor is only borrowed between awaits.
    pub async fn run<B, V>(&self, editor: &RefCell<XmlEditor<B>>, validator: &V) -> Result<ValidationOutcome>
    where
        B: TextBuffer,
        V: Validator + ?Sized,
    {
        let mut attempt = 0;
        loop {
            let ticket = editor.borrow().begin_validation()?;
            let diagnostics = validator.validate(&ticket).await?;
            let outcome = editor.borrow_mut().apply_validation(ValidationReport {
                version: ticket.version,
                diagnostics,
            });
            match outcome {
                ValidationOutcome::Applied { .. } => return Ok(outcome),
                ValidationOutcome::Stale { .. } if attempt >= self.max_retries => {
                    tracing::warn!(attempts = attempt + 1, "validation never caught up with edits");
                    return Ok(outcome);
                }
                ValidationOutcome::Stale { current, .. } => {
                    attempt += 1;
                    tracing::debug!(attempt, version = %current, "retrying validation");
                }
            }
        }
    }
}

impl Default for ValidationDriver {
    fn default() -> Self {
        ValidationDriver::from_config(&EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MemoryBuffer;
    use crate::error::EditorError;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use tei_error_reporting::DiagnosticMessageBuilder;

    /// Warns once per `<note>` in the text.
    struct NoteCounter;

    #[async_trait(?Send)]
    impl Validator for NoteCounter {
        async fn validate(&self, ticket: &ValidationTicket) -> Result<Vec<DiagnosticMessage>> {
            Ok(ticket
                .text
                .match_indices("<note>")
                .map(|_| DiagnosticMessageBuilder::warning("Note found").build())
                .collect())
        }
    }

    /// Edits the document during the first `edits` validations.
    struct Interfering<'e> {
        editor: &'e RefCell<XmlEditor<MemoryBuffer>>,
        edits: usize,
        calls: Cell<usize>,
    }

    #[async_trait(?Send)]
    impl Validator for Interfering<'_> {
        async fn validate(&self, ticket: &ValidationTicket) -> Result<Vec<DiagnosticMessage>> {
            let calls = self.calls.get();
            self.calls.set(calls + 1);
            if calls < self.edits {
                let mut editor = self.editor.borrow_mut();
                let end = editor.buffer().text().len() - "</a>".len();
                editor.buffer_mut().insert(end, "<note>n</note>")?;
                editor.process_buffer_events();
            }
            NoteCounter.validate(ticket).await
        }
    }

    struct Unavailable;

    #[async_trait(?Send)]
    impl Validator for Unavailable {
        async fn validate(&self, _ticket: &ValidationTicket) -> Result<Vec<DiagnosticMessage>> {
            Err(EditorError::Validation("schema not loaded".into()))
        }
    }

    fn editor(text: &str) -> XmlEditor<MemoryBuffer> {
        XmlEditor::new(MemoryBuffer::new(text), EditorConfig::default())
    }

    #[test]
    fn test_stale_reports_are_rejected() {
        let mut editor = editor("<a/>");
        let ticket = editor.begin_validation().unwrap();
        assert_eq!(ticket.version, DocumentVersion(1));
        assert_eq!(&*ticket.text, "<a/>");

        editor.buffer_mut().insert(2, " ").unwrap();
        editor.process_buffer_events();
        editor.take_events();

        let outcome = editor.apply_validation(ValidationReport {
            version: ticket.version,
            diagnostics: vec![DiagnosticMessageBuilder::error("Invalid").build()],
        });
        assert_eq!(
            outcome,
            ValidationOutcome::Stale {
                reported: DocumentVersion(1),
                current: DocumentVersion(2),
            }
        );
        assert!(editor.validation_diagnostics().is_empty());
        assert!(editor.take_events().is_empty());
    }

    #[test]
    fn test_current_reports_are_published() {
        let mut editor = editor("<a/>");
        editor.take_events();
        let ticket = editor.begin_validation().unwrap();
        let outcome = editor.apply_validation(ValidationReport {
            version: ticket.version,
            diagnostics: vec![DiagnosticMessageBuilder::warning("Odd").build()],
        });
        assert!(outcome.is_applied());
        assert_eq!(editor.validation_diagnostics().len(), 1);
        assert!(matches!(
            &editor.take_events()[..],
            [EditorEvent::ValidationUpdated { version: DocumentVersion(1), .. }]
        ));
    }

    #[test]
    fn test_no_document_to_validate() {
        let editor = editor("");
        assert_eq!(editor.begin_validation(), Err(EditorError::NoDocumentLoaded));
    }

    #[test]
    fn test_driver_applies_on_a_quiet_document() {
        let editor = RefCell::new(editor("<a><note>x</note></a>"));
        let outcome = pollster::block_on(ValidationDriver::default().run(&editor, &NoteCounter)).unwrap();
        assert_eq!(
            outcome,
            ValidationOutcome::Applied {
                version: DocumentVersion(1),
                diagnostics: 1,
            }
        );
    }

    #[test]
    fn test_driver_retries_against_the_latest_text() {
        let editor = RefCell::new(editor("<a></a>"));
        let validator = Interfering {
            editor: &editor,
            edits: 2,
            calls: Cell::new(0),
        };
        let outcome = pollster::block_on(ValidationDriver::new(3).run(&editor, &validator)).unwrap();
        assert_eq!(
            outcome,
            ValidationOutcome::Applied {
                version: DocumentVersion(3),
                diagnostics: 2,
            }
        );
        assert_eq!(validator.calls.get(), 3);
        assert_eq!(editor.borrow().validation_diagnostics().len(), 2);
    }

    #[test]
    fn test_driver_gives_up_after_the_retry_limit() {
        let editor = RefCell::new(editor("<a></a>"));
        let validator = Interfering {
            editor: &editor,
            edits: usize::MAX,
            calls: Cell::new(0),
        };
        let outcome = pollster::block_on(ValidationDriver::new(1).run(&editor, &validator)).unwrap();
        assert!(!outcome.is_applied());
        assert_eq!(validator.calls.get(), 2);
        assert!(editor.borrow().validation_diagnostics().is_empty());
    }

    #[test]
    fn test_validator_failures_propagate() {
        let editor = RefCell::new(editor("<a/>"));
        let result = pollster::block_on(ValidationDriver::default().run(&editor, &Unavailable));
        let err = result.unwrap_err();
        assert_eq!(err, EditorError::Validation("schema not loaded".into()));
        assert_eq!(err.to_diagnostic().code.as_deref(), Some("T-5-1"));
        assert!(editor.borrow().validation_diagnostics().is_empty());
    }
}
