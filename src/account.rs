//! The signed-in user's own account: profile, listings and password.

use crate::api::ApiClient;
use crate::error::ClientResult;
use crate::feedback::Notice;
use crate::models::{Product, User};
use crate::validation::{Field, ValidationErrors};
use tracing::{info, warn};

pub const PASSWORD_MIN: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordChange {
    pub current: String,
    pub new: String,
    pub confirm: String,
}

impl PasswordChange {
    pub fn new(
        current: impl Into<String>,
        new: impl Into<String>,
        confirm: impl Into<String>,
    ) -> Self {
        Self {
            current: current.into(),
            new: new.into(),
            confirm: confirm.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let short = |value: &str| value.chars().count() < PASSWORD_MIN;

        if short(&self.current) {
            errors.push(Field::Password, "Password must be at least 6 characters");
        }
        if short(&self.new) {
            errors.push(Field::NewPassword, "Password must be at least 6 characters");
        }
        if short(&self.confirm) {
            errors.push(Field::ConfirmPassword, "Password must be at least 6 characters");
        } else if self.new != self.confirm {
            errors.push(Field::ConfirmPassword, "Passwords don't match");
        }
        errors.into_result()
    }
}

/// Profile plus the listings the user has published.
#[derive(Debug, Clone)]
pub struct AccountOverview {
    pub user: User,
    pub products: Vec<Product>,
}

pub async fn overview(api: &ApiClient) -> ClientResult<AccountOverview> {
    let (user, products) = tokio::try_join!(api.current_user(), api.my_products())?;
    Ok(AccountOverview { user, products })
}

/// Validate then send. Field problems come back without a request being made.
pub async fn change_password(
    api: &ApiClient,
    change: &PasswordChange,
) -> Result<Notice, ValidationErrors> {
    change.validate()?;
    Ok(match api.change_password(&change.current, &change.new).await {
        Ok(()) => {
            info!("password changed");
            Notice::success("Password updated", "Your password has been changed.")
        }
        Err(e) => {
            warn!(error = %e, "password change failed");
            Notice::error("Password not changed", e.user_message("Failed to change password"))
        }
    })
}
