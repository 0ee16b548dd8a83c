//! Field-scoped validation shared by the upload, edit, review and account forms.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Description,
    Category,
    Tags,
    Version,
    License,
    CompatibilityVersion,
    Files,
    Images,
    ExternalUrl,
    Rating,
    Comment,
    Name,
    Email,
    Password,
    NewPassword,
    ConfirmPassword,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::Category => "category",
            Field::Tags => "tags",
            Field::Version => "version",
            Field::License => "license",
            Field::CompatibilityVersion => "oncodash_version",
            Field::Files => "files",
            Field::Images => "images",
            Field::ExternalUrl => "external_url",
            Field::Rating => "rating",
            Field::Comment => "comment",
            Field::Name => "name",
            Field::Email => "email",
            Field::Password => "current_password",
            Field::NewPassword => "new_password",
            Field::ConfirmPassword => "confirm_password",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for FieldError {}

/// Every failing field of a form, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: Field, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn has(&self, field: Field) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn for_field(&self, field: Field) -> impl Iterator<Item = &FieldError> {
        self.0.iter().filter(move |e| e.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub(crate) fn check_length(&mut self, field: Field, value: &str, min: usize, max: usize, label: &str) {
        let len = value.chars().count();
        if len < min {
            self.push(field, format!("{label} must be at least {min} characters"));
        } else if len > max {
            self.push(field, format!("{label} must be at most {max} characters"));
        }
    }

    pub(crate) fn check_required(&mut self, field: Field, value: &str, message: &str) {
        if value.trim().is_empty() {
            self.push(field, message);
        }
    }

    /// Blank is fine; anything else must be an absolute http(s) URL.
    pub(crate) fn check_optional_url(&mut self, field: Field, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        match reqwest::Url::parse(value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => self.push(field, "Must be a valid http(s) URL"),
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&lines.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

pub const TITLE_MIN: usize = 5;
pub const TITLE_MAX: usize = 100;
pub const DESCRIPTION_MIN: usize = 20;
pub const DESCRIPTION_MAX: usize = 1000;

/// The scalar descriptive fields every listing carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFields {
    pub title: String,
    pub description: String,
    pub category: String,
    pub version: String,
    pub license: String,
    pub compatibility_version: String,
}

impl ListingFields {
    /// Rules gating the first upload step; license is not among them.
    pub fn check_basic_info(&self, errors: &mut ValidationErrors) {
        errors.check_length(Field::Title, &self.title, TITLE_MIN, TITLE_MAX, "Title");
        errors.check_length(
            Field::Description,
            &self.description,
            DESCRIPTION_MIN,
            DESCRIPTION_MAX,
            "Description",
        );
        errors.check_required(Field::Category, &self.category, "Please select a category");
        errors.check_required(Field::Version, &self.version, "Version is required");
        errors.check_required(
            Field::CompatibilityVersion,
            &self.compatibility_version,
            "Please select an Oncodash version",
        );
    }

    pub fn check_all(&self, errors: &mut ValidationErrors) {
        self.check_basic_info(errors);
        errors.check_required(Field::License, &self.license, "License is required");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(title: &str) -> ListingFields {
        ListingFields {
            title: title.to_string(),
            description: "A tool that summarises tumour samples.".to_string(),
            category: "utilities".to_string(),
            version: "1.0.0".to_string(),
            license: String::new(),
            compatibility_version: "0.6.0".to_string(),
        }
    }

    #[test]
    fn title_bounds() {
        let mut errors = ValidationErrors::new();
        listing("Abcd").check_basic_info(&mut errors);
        assert!(errors.has(Field::Title));

        let mut errors = ValidationErrors::new();
        listing("Abcde").check_basic_info(&mut errors);
        assert!(errors.is_empty(), "{errors}");

        let mut errors = ValidationErrors::new();
        listing(&"x".repeat(101)).check_basic_info(&mut errors);
        assert!(errors.has(Field::Title));
    }

    #[test]
    fn lengths_count_characters() {
        let mut errors = ValidationErrors::new();
        listing("Ünïcø").check_basic_info(&mut errors);
        assert!(!errors.has(Field::Title));
    }

    #[test]
    fn license_only_checked_in_full_validation() {
        let fields = listing("Valid title");
        let mut basic = ValidationErrors::new();
        fields.check_basic_info(&mut basic);
        assert!(basic.is_empty());

        let mut all = ValidationErrors::new();
        fields.check_all(&mut all);
        assert_eq!(all.len(), 1);
        assert!(all.has(Field::License));
    }

    #[test]
    fn optional_url() {
        let mut errors = ValidationErrors::new();
        errors.check_optional_url(Field::ExternalUrl, "  ");
        errors.check_optional_url(Field::ExternalUrl, "https://example.org/tool.zip");
        assert!(errors.is_empty());

        errors.check_optional_url(Field::ExternalUrl, "example.org/tool.zip");
        errors.check_optional_url(Field::ExternalUrl, "ftp://example.org/tool.zip");
        assert_eq!(errors.for_field(Field::ExternalUrl).count(), 2);
    }
}
