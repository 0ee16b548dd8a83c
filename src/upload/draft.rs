use super::attachment::{Attachment, Attachments, Collection};
use super::manifest::ManifestFields;
use crate::error::ClientResult;
use crate::validation::{Field, FieldError, ListingFields, ValidationErrors};
use reqwest::multipart::Form;

pub const MAX_TAGS: usize = 10;

/// Everything typed or picked into the upload form so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDraft {
    pub fields: ListingFields,
    pub external_url: String,
    /// Taken from a manifest; shown to the user, not sent.
    pub authors: Vec<String>,
    tags: Vec<String>,
    files: Attachments,
    images: Attachments,
}

impl Default for UploadDraft {
    fn default() -> Self {
        Self {
            fields: ListingFields::default(),
            external_url: String::new(),
            authors: Vec::new(),
            tags: Vec::new(),
            files: Attachments::new(Collection::Files),
            images: Attachments::new(Collection::Images),
        }
    }
}

impl UploadDraft {
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Trimmed; blank, duplicate (case-sensitive) or an 11th tag is refused.
    pub fn add_tag(&mut self, tag: &str) -> Result<(), FieldError> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(FieldError::new(Field::Tags, "Tag cannot be empty"));
        }
        if self.tags.iter().any(|t| t == tag) {
            return Err(FieldError::new(Field::Tags, format!("Tag '{tag}' already added")));
        }
        if self.tags.len() >= MAX_TAGS {
            return Err(FieldError::new(Field::Tags, "Maximum 10 tags allowed"));
        }
        self.tags.push(tag.to_string());
        Ok(())
    }

    pub fn remove_tag(&mut self, index: usize) -> Option<String> {
        (index < self.tags.len()).then(|| self.tags.remove(index))
    }

    pub fn attachments(&self, collection: Collection) -> &Attachments {
        match collection {
            Collection::Files => &self.files,
            Collection::Images => &self.images,
        }
    }

    fn attachments_mut(&mut self, collection: Collection) -> &mut Attachments {
        match collection {
            Collection::Files => &mut self.files,
            Collection::Images => &mut self.images,
        }
    }

    /// Add picked files; returns the per-file rejections.
    pub fn add_attachments(
        &mut self,
        collection: Collection,
        batch: impl IntoIterator<Item = Attachment>,
    ) -> Vec<FieldError> {
        self.attachments_mut(collection).extend(batch)
    }

    pub fn remove_attachment(&mut self, collection: Collection, index: usize) -> Option<Attachment> {
        self.attachments_mut(collection).remove(index)
    }

    /// Overwrite the fields the manifest provides; absent keys leave fields alone.
    pub fn apply_manifest(&mut self, manifest: ManifestFields) {
        if let Some(title) = manifest.title {
            self.fields.title = title;
        }
        if let Some(description) = manifest.description {
            self.fields.description = description;
        }
        if let Some(version) = manifest.version {
            self.fields.version = version;
        }
        if let Some(license) = manifest.license {
            self.fields.license = license;
        }
        if let Some(authors) = manifest.authors {
            self.authors = authors;
        }
    }

    /// Rules for leaving the first step.
    pub fn validate_basic_info(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.fields.check_basic_info(&mut errors);
        errors.into_result()
    }

    /// Rules for submission.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.fields.check_all(&mut errors);

        if self.tags.is_empty() {
            errors.push(Field::Tags, "Add at least one tag");
        } else if self.tags.len() > MAX_TAGS {
            errors.push(Field::Tags, "Maximum 10 tags allowed");
        }
        if self.images.is_empty() {
            errors.push(Field::Images, "Please add at least one image");
        }
        errors.check_optional_url(Field::ExternalUrl, &self.external_url);
        if self.files.is_empty() && self.external_url.trim().is_empty() {
            errors.push(
                Field::Files,
                "Either a file upload or an external URL must be provided",
            );
        }
        errors.into_result()
    }

    /// Assemble the `POST /products` multipart body.
    pub async fn to_form(&self) -> ClientResult<Form> {
        let f = &self.fields;
        let mut form = Form::new()
            .text("title", f.title.clone())
            .text("description", f.description.clone())
            .text("category", f.category.clone())
            .text("oncodash_version", f.compatibility_version.clone())
            .text("version", f.version.clone())
            .text("license", f.license.clone());

        let external_url = self.external_url.trim();
        if !external_url.is_empty() {
            form = form.text("external_url", external_url.to_string());
        }
        for file in self.files.iter() {
            form = form.part("files", file.to_part().await?);
        }
        for (i, tag) in self.tags.iter().enumerate() {
            form = form.text(format!("tags[{i}]"), tag.clone());
        }
        for image in self.images.iter() {
            form = form.part("images", image.to_part().await?);
        }
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_draft() -> UploadDraft {
        let mut draft = UploadDraft::default();
        draft.fields = ListingFields {
            title: "Cohort Explorer".into(),
            description: "Explore patient cohorts interactively.".into(),
            category: "utilities".into(),
            version: "1.0.0".into(),
            license: "MIT".into(),
            compatibility_version: "0.6.0".into(),
        };
        draft.add_tag("cohorts").unwrap();
        draft.external_url = "https://example.org/cohort.zip".into();
        let rejected = draft.add_attachments(
            Collection::Images,
            [Attachment::from_bytes("shot.png", "image/png", vec![1, 2, 3])],
        );
        assert!(rejected.is_empty());
        draft
    }

    #[test]
    fn tags_are_trimmed_unique_and_capped() {
        let mut draft = UploadDraft::default();
        draft.add_tag("  viz ").unwrap();
        assert_eq!(draft.tags(), ["viz"]);
        assert!(draft.add_tag("viz").is_err());
        draft.add_tag("Viz").unwrap();
        assert!(draft.add_tag("   ").is_err());

        for i in 0..8 {
            draft.add_tag(&format!("t{i}")).unwrap();
        }
        let err = draft.add_tag("eleventh").unwrap_err();
        assert_eq!(err.message, "Maximum 10 tags allowed");
        assert_eq!(draft.tags().len(), 10);

        assert_eq!(draft.remove_tag(0).as_deref(), Some("viz"));
        assert_eq!(draft.tags()[0], "Viz");
        assert!(draft.remove_tag(42).is_none());
    }

    #[test]
    fn manifest_overwrites_only_present_keys() {
        let mut draft = UploadDraft::default();
        draft.fields.title = "Typed title".into();
        draft.fields.license = "GPL-3.0".into();
        draft.apply_manifest(ManifestFields {
            title: Some("from-manifest".into()),
            version: Some("2.0.0".into()),
            authors: Some(vec!["Ada".into()]),
            ..ManifestFields::default()
        });
        assert_eq!(draft.fields.title, "from-manifest");
        assert_eq!(draft.fields.version, "2.0.0");
        assert_eq!(draft.fields.license, "GPL-3.0");
        assert_eq!(draft.authors, ["Ada"]);
    }

    #[test]
    fn full_validation() {
        assert!(complete_draft().validate().is_ok());

        let mut draft = complete_draft();
        draft.external_url = "  ".into();
        let errors = draft.validate().unwrap_err();
        assert!(errors.has(Field::Files));

        draft.add_attachments(
            Collection::Files,
            [Attachment::from_bytes("tool.zip", "application/zip", vec![0])],
        );
        assert!(draft.validate().is_ok());

        draft.external_url = "not a url".into();
        assert!(draft.validate().unwrap_err().has(Field::ExternalUrl));

        let mut empty = UploadDraft::default();
        empty.fields = complete_draft().fields;
        let errors = empty.validate().unwrap_err();
        assert!(errors.has(Field::Tags));
        assert!(errors.has(Field::Images));
        assert!(errors.has(Field::Files));
    }

    #[tokio::test]
    async fn form_builds_from_memory_attachments() {
        let draft = complete_draft();
        let form = draft.to_form().await.unwrap();
        assert!(!form.boundary().is_empty());
    }
}
