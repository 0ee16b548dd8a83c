//! Writing a review for a listing.

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::feedback::{Notice, Route};
use crate::models::Review;
use crate::validation::{Field, ValidationErrors};
use tracing::{info, warn};

pub const COMMENT_MAX: usize = 1000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewDraft {
    pub rating: u8,
    pub comment: String,
}

#[derive(Debug)]
pub enum ReviewOutcome {
    Posted { review: Review, notice: Notice },
    SignInRequired(Route),
    Invalid(ValidationErrors),
    Failed(Notice),
}

impl ReviewDraft {
    pub fn new(rating: u8, comment: impl Into<String>) -> Self {
        Self {
            rating,
            comment: comment.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !(1..=5).contains(&self.rating) {
            errors.push(Field::Rating, "Please select a rating between 1 and 5");
        }
        errors.check_required(Field::Comment, &self.comment, "Please write a comment");
        if self.comment.chars().count() > COMMENT_MAX {
            errors.push(Field::Comment, "Comment must be at most 1000 characters");
        }
        errors.into_result()
    }

    /// Post the review. On success the draft is cleared for the next one.
    pub async fn submit(&mut self, api: &ApiClient, product_id: &str) -> ReviewOutcome {
        let sign_in = || Route::sign_in_from(&Route::Product(product_id.to_string()));
        if !api.session().is_authenticated() {
            return ReviewOutcome::SignInRequired(sign_in());
        }
        if let Err(errors) = self.validate() {
            return ReviewOutcome::Invalid(errors);
        }

        match api
            .post_review(product_id, self.rating, self.comment.trim())
            .await
        {
            Ok(review) => {
                info!(product_id, rating = self.rating, "review posted");
                *self = Self::default();
                ReviewOutcome::Posted {
                    review,
                    notice: Notice::success("Review submitted", "Thanks for your feedback!"),
                }
            }
            Err(ClientError::AuthRequired) => ReviewOutcome::SignInRequired(sign_in()),
            Err(e) => {
                warn!(product_id, error = %e, "review rejected");
                ReviewOutcome::Failed(Notice::error("Review failed", e.user_message("Failed to submit review")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_range_and_comment() {
        assert!(ReviewDraft::new(5, "Works well").validate().is_ok());
        assert!(ReviewDraft::new(1, "Meh").validate().is_ok());

        let errors = ReviewDraft::new(0, "  ").validate().unwrap_err();
        assert!(errors.has(Field::Rating));
        assert!(errors.has(Field::Comment));

        let errors = ReviewDraft::new(6, "x".repeat(1001)).validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
