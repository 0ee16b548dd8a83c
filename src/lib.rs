//! Client for the software marketplace backend.
//!
//! The library carries everything the `market` binary needs: the REST client,
//! the session, the catalogue filter/sort engine and the upload/edit/review
//! workflows. Nothing here renders output; workflows report back through
//! [`feedback::Notice`] and [`feedback::Route`].

pub mod account;
pub mod api;
pub mod auth;
pub mod catalogue;
pub mod config;
pub mod edit;
pub mod error;
pub mod feedback;
pub mod models;
pub mod review;
pub mod session;
pub mod upload;
pub mod validation;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, ConfigError};
pub use session::{session_channel, Session, SessionReader, SessionWriter};
