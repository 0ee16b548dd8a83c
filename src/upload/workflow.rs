//! Two-step upload wizard.
//!
//! `BasicInfo` collects the descriptive fields; moving on to
//! `MediaAndSubmit` is gated on them. Going back is always allowed.
//! Submission happens only from `MediaAndSubmit`.

use super::attachment::{Attachment, Collection};
use super::draft::UploadDraft;
use super::manifest::parse_manifest;
use crate::api::ApiClient;
use crate::error::ClientError;
use crate::feedback::{Notice, Route};
use crate::models::Product;
use crate::validation::{FieldError, ValidationErrors};
use tracing::{info, warn};

const GENERIC_FAILURE: &str =
    "An unexpected error occurred while uploading the software. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    BasicInfo,
    MediaAndSubmit,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// The listing exists; the draft has been discarded.
    Created {
        product: Product,
        notice: Notice,
        next: Route,
    },
    /// No token held. Nothing was sent.
    SignInRequired(Route),
    /// The draft does not pass validation. Nothing was sent.
    Invalid(ValidationErrors),
    /// `submit` was called before reaching the media step.
    NotReady,
    /// The backend or transport failed; the draft is intact.
    Failed(Notice),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadWorkflow {
    step: Step,
    draft: UploadDraft,
}

impl Default for UploadWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadWorkflow {
    pub fn new() -> Self {
        Self {
            step: Step::BasicInfo,
            draft: UploadDraft::default(),
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn draft(&self) -> &UploadDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut UploadDraft {
        &mut self.draft
    }

    /// Fill fields from a project manifest. On any parse problem the draft is
    /// left exactly as it was.
    pub fn load_manifest(&mut self, content: &str) -> Notice {
        match parse_manifest(content) {
            Ok(fields) => {
                self.draft.apply_manifest(fields);
                info!("manifest applied to upload draft");
                Notice::success(
                    "Manifest loaded",
                    "Form fields were filled in from the manifest.",
                )
            }
            Err(e) => {
                warn!(error = %e, "manifest rejected");
                Notice::error(
                    "Manifest not loaded",
                    format!("{e}. Please check the file format."),
                )
            }
        }
    }

    pub fn add_attachments(
        &mut self,
        collection: Collection,
        batch: impl IntoIterator<Item = Attachment>,
    ) -> Vec<FieldError> {
        self.draft.add_attachments(collection, batch)
    }

    /// Advance to the media step if the basic fields pass.
    pub fn next_step(&mut self) -> Result<(), ValidationErrors> {
        if let Step::BasicInfo = self.step {
            self.draft.validate_basic_info()?;
            self.step = Step::MediaAndSubmit;
            info!("upload workflow moved to media step");
        }
        Ok(())
    }

    pub fn back(&mut self) {
        self.step = Step::BasicInfo;
    }

    /// Send the draft as a new listing.
    ///
    /// The exclusive borrow is what keeps a workflow to one submission at a
    /// time. Dropping the returned future cancels the request and leaves the
    /// workflow as it was.
    pub async fn submit(&mut self, api: &ApiClient) -> SubmitOutcome {
        if api.session().token().is_none() {
            info!("upload submission without a session; redirecting to sign in");
            return SubmitOutcome::SignInRequired(Route::sign_in_from(&Route::Upload));
        }
        if self.step != Step::MediaAndSubmit {
            return SubmitOutcome::NotReady;
        }
        if let Err(errors) = self.draft.validate() {
            return SubmitOutcome::Invalid(errors);
        }

        let result = match self.draft.to_form().await {
            Ok(form) => api.create_product(form).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(product) => {
                info!(product_id = %product.id, "listing created");
                *self = Self::new();
                SubmitOutcome::Created {
                    product,
                    notice: Notice::success(
                        "Upload complete",
                        "Software successfully uploaded! It will be reviewed before being published.",
                    ),
                    next: Route::Catalogue,
                }
            }
            Err(ClientError::AuthRequired) => {
                SubmitOutcome::SignInRequired(Route::sign_in_from(&Route::Upload))
            }
            Err(e) => {
                warn!(error = %e, "listing upload failed");
                SubmitOutcome::Failed(Notice::error("Upload failed", e.user_message(GENERIC_FAILURE)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Field;

    fn fill_basic(workflow: &mut UploadWorkflow, title: &str) {
        let fields = &mut workflow.draft_mut().fields;
        fields.title = title.to_string();
        fields.description = "Summarises variant calls across a cohort.".to_string();
        fields.category = "utilities".to_string();
        fields.version = "0.1.0".to_string();
        fields.compatibility_version = "0.5.4".to_string();
    }

    #[test]
    fn title_of_four_blocks_transition() {
        let mut workflow = UploadWorkflow::new();
        fill_basic(&mut workflow, "Abcd");
        let errors = workflow.next_step().unwrap_err();
        assert!(errors.has(Field::Title));
        assert_eq!(workflow.step(), Step::BasicInfo);

        fill_basic(&mut workflow, "Abcde");
        workflow.next_step().unwrap();
        assert_eq!(workflow.step(), Step::MediaAndSubmit);
    }

    #[test]
    fn license_does_not_gate_first_step() {
        let mut workflow = UploadWorkflow::new();
        fill_basic(&mut workflow, "Variant Summary");
        assert!(workflow.draft().fields.license.is_empty());
        assert!(workflow.next_step().is_ok());
    }

    #[test]
    fn back_is_unconditional_and_keeps_draft() {
        let mut workflow = UploadWorkflow::new();
        fill_basic(&mut workflow, "Variant Summary");
        workflow.next_step().unwrap();
        workflow.draft_mut().fields.title.clear();
        workflow.back();
        assert_eq!(workflow.step(), Step::BasicInfo);
        assert_eq!(workflow.draft().fields.version, "0.1.0");
    }

    #[test]
    fn bad_manifest_leaves_fields_untouched() {
        let mut workflow = UploadWorkflow::new();
        fill_basic(&mut workflow, "Variant Summary");
        let before = workflow.draft().clone();

        let notice = workflow.load_manifest("this is = = not toml");
        assert!(notice.is_error());
        assert_eq!(workflow.draft(), &before);

        let notice = workflow.load_manifest("[tool.ruff]\nline-length = 88\n");
        assert!(notice.is_error());
        assert_eq!(workflow.draft(), &before);
    }

    #[test]
    fn manifest_fills_fields() {
        let mut workflow = UploadWorkflow::new();
        let notice = workflow.load_manifest(
            "[tool.poetry]\nname = \"variant-summary\"\nversion = \"2.1.0\"\nlicense = \"BSD-3-Clause\"\n",
        );
        assert!(!notice.is_error());
        let fields = &workflow.draft().fields;
        assert_eq!(fields.title, "variant-summary");
        assert_eq!(fields.version, "2.1.0");
        assert_eq!(fields.license, "BSD-3-Clause");
    }
}
