//! What workflows hand back to the front end: transient notices and
//! navigation targets.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A transient, user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Navigation targets, rendered as the web front end's paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Catalogue,
    Upload,
    Product(String),
    /// Sign-in page; `return_to` is where to go once signed in.
    SignIn { return_to: String },
}

impl Route {
    pub fn sign_in_from(route: &Route) -> Self {
        Route::SignIn {
            return_to: route.to_string(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Catalogue => f.write_str("/marketplace"),
            Route::Upload => f.write_str("/upload"),
            Route::Product(id) => write!(f, "/product/{id}"),
            Route::SignIn { .. } => f.write_str("/auth?tab=login"),
        }
    }
}
