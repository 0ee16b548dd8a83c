//! New-listing upload: draft state, attachments, manifest autofill and the
//! two-step workflow that submits it.

pub mod attachment;
pub mod draft;
pub mod manifest;
pub mod workflow;

pub use attachment::{Attachment, Attachments, Collection, MAX_FILE_SIZE, MAX_IMAGES};
pub use draft::{UploadDraft, MAX_TAGS};
pub use manifest::{parse_manifest, ManifestError, ManifestFields};
pub use workflow::{Step, SubmitOutcome, UploadWorkflow};
