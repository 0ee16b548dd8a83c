//! Editing and deleting an existing listing.

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::feedback::{Notice, Route};
use crate::models::{Product, ProductUpdate};
use crate::validation::{Field, ListingFields, ValidationErrors};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub product_id: String,
    pub fields: ListingFields,
    pub external_url: String,
}

#[derive(Debug)]
pub enum EditOutcome {
    Saved {
        product: Product,
        notice: Notice,
        next: Route,
    },
    Deleted {
        notice: Notice,
        next: Route,
    },
    SignInRequired(Route),
    Invalid(ValidationErrors),
    Failed(Notice),
}

impl EditDraft {
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            fields: ListingFields {
                title: product.title.clone(),
                description: product.description.clone(),
                category: product.category.clone(),
                version: product.version.clone(),
                license: product.license.clone(),
                compatibility_version: product.compatibility_version.clone(),
            },
            external_url: product.external_url.clone().unwrap_or_default(),
        }
    }

    /// Fetch the listing and open it for editing.
    pub async fn load(api: &ApiClient, product_id: &str) -> Result<Self, Notice> {
        api.get_product(product_id)
            .await
            .map(|detail| Self::from_product(&detail.product))
            .map_err(|e| {
                warn!(product_id, error = %e, "failed to load listing for edit");
                Notice::error("Load failed", e.user_message("Failed to load product data"))
            })
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.fields.check_all(&mut errors);
        errors.check_optional_url(Field::ExternalUrl, &self.external_url);
        errors.into_result()
    }

    pub fn to_update(&self) -> ProductUpdate {
        let f = &self.fields;
        let external_url = self.external_url.trim();
        ProductUpdate {
            title: f.title.clone(),
            description: f.description.clone(),
            category: f.category.clone(),
            version: f.version.clone(),
            license: f.license.clone(),
            oncodash_version: f.compatibility_version.clone(),
            external_url: (!external_url.is_empty()).then(|| external_url.to_string()),
        }
    }

    fn sign_in_route(&self) -> Route {
        Route::sign_in_from(&Route::Product(self.product_id.clone()))
    }

    pub async fn save(&self, api: &ApiClient) -> EditOutcome {
        if !api.session().is_authenticated() {
            return EditOutcome::SignInRequired(self.sign_in_route());
        }
        if let Err(errors) = self.validate() {
            return EditOutcome::Invalid(errors);
        }

        match api.update_product(&self.product_id, &self.to_update()).await {
            Ok(product) => {
                info!(product_id = %self.product_id, "listing updated");
                EditOutcome::Saved {
                    product,
                    notice: Notice::success("Saved", "Product updated successfully."),
                    next: Route::Catalogue,
                }
            }
            Err(ClientError::AuthRequired) => EditOutcome::SignInRequired(self.sign_in_route()),
            Err(e) => {
                warn!(product_id = %self.product_id, error = %e, "listing update failed");
                EditOutcome::Failed(Notice::error("Update failed", e.user_message("Failed to update product")))
            }
        }
    }

    pub async fn delete(&self, api: &ApiClient) -> EditOutcome {
        if !api.session().is_authenticated() {
            return EditOutcome::SignInRequired(self.sign_in_route());
        }

        match api.delete_product(&self.product_id).await {
            Ok(()) => {
                info!(product_id = %self.product_id, "listing deleted");
                EditOutcome::Deleted {
                    notice: Notice::success("Deleted", "Product deleted successfully."),
                    next: Route::Catalogue,
                }
            }
            Err(ClientError::AuthRequired) => EditOutcome::SignInRequired(self.sign_in_route()),
            Err(e) => {
                warn!(product_id = %self.product_id, error = %e, "listing delete failed");
                EditOutcome::Failed(Notice::error("Delete failed", e.user_message("Failed to delete product")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            id: "12".into(),
            title: "Cohort Explorer".into(),
            description: "Explore patient cohorts interactively.".into(),
            category: "utilities".into(),
            version: "1.0.0".into(),
            license: "MIT".into(),
            compatibility_version: "0.6.0".into(),
            external_url: Some("https://example.org/c.zip".into()),
            ..Product::default()
        }
    }

    #[test]
    fn draft_mirrors_product() {
        let draft = EditDraft::from_product(&product());
        assert_eq!(draft.product_id, "12");
        assert_eq!(draft.external_url, "https://example.org/c.zip");
        assert!(draft.validate().is_ok());

        let update = draft.to_update();
        assert_eq!(update.oncodash_version, "0.6.0");
        assert_eq!(update.external_url.as_deref(), Some("https://example.org/c.zip"));
    }

    #[test]
    fn blank_url_is_omitted_and_bad_url_rejected() {
        let mut draft = EditDraft::from_product(&product());
        draft.external_url = " ".into();
        assert!(draft.validate().is_ok());
        let body = serde_json::to_value(draft.to_update()).unwrap();
        assert!(body.get("external_url").is_none());

        draft.external_url = "c.zip".into();
        draft.fields.license.clear();
        let errors = draft.validate().unwrap_err();
        assert!(errors.has(Field::ExternalUrl));
        assert!(errors.has(Field::License));
    }
}
