//! REST client for the marketplace backend

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::{
    ChangePasswordRequest, ErrorBody, ForgotPasswordRequest, LoginRequest, LoginResponse,
    NewReviewRequest, Product, ProductDetail, ProductEnvelope, ProductUpdate, RegisterRequest,
    RegisterResponse, Review, User,
};
use crate::session::SessionReader;
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client for the marketplace API.
///
/// Attaches the current bearer token from the session to every authenticated
/// call. Calls that need a token fail with [`ClientError::AuthRequired`]
/// before anything goes on the wire when none is held.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
    session: SessionReader,
}

impl ApiClient {
    pub fn new(config: ClientConfig, session: SessionReader) -> ClientResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("software-market/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            session,
        })
    }

    pub fn session(&self) -> &SessionReader {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.config.endpoint(path);
        debug!(%method, %url, "api request");
        self.client.request(method, url)
    }

    fn authed(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let token = self.session.token().ok_or(ClientError::AuthRequired)?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> ClientResult<T> {
        let response = Self::check(request.send().await?).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// For endpoints whose success body carries nothing we need.
    async fn send_unit(request: RequestBuilder) -> ClientResult<()> {
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn check(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(ErrorBody::into_message);
        warn!(%status, message = message.as_deref().unwrap_or(""), "api call failed");

        let detail = message.clone().unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized(detail),
            StatusCode::FORBIDDEN => ClientError::Forbidden(detail),
            StatusCode::NOT_FOUND => ClientError::NotFound(detail),
            StatusCode::UNSUPPORTED_MEDIA_TYPE => ClientError::UnsupportedMediaType(detail),
            _ => ClientError::Api { status, message },
        })
    }

    // ========== Auth ==========

    pub async fn register(&self, name: &str, email: &str, password: &str) -> ClientResult<User> {
        let body = RegisterRequest {
            name,
            email,
            password,
        };
        let response: RegisterResponse =
            Self::send(self.request(Method::POST, "auth/register").json(&body)).await?;
        Ok(response.user)
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<LoginResponse> {
        let body = LoginRequest { email, password };
        Self::send(self.request(Method::POST, "auth/login").json(&body)).await
    }

    pub async fn forgot_password(&self, email: &str) -> ClientResult<()> {
        let body = ForgotPasswordRequest { email };
        Self::send_unit(self.request(Method::POST, "auth/forgot-password").json(&body)).await
    }

    // ========== Products ==========

    pub async fn list_products(&self) -> ClientResult<Vec<Product>> {
        Self::send(self.request(Method::GET, "products")).await
    }

    pub async fn get_product(&self, id: &str) -> ClientResult<ProductDetail> {
        Self::send(self.request(Method::GET, &format!("products/{id}"))).await
    }

    /// `POST /products` with a prepared multipart body.
    pub async fn create_product(&self, form: Form) -> ClientResult<Product> {
        let request = self.authed(Method::POST, "products")?.multipart(form);
        let envelope: ProductEnvelope = Self::send(request).await?;
        Ok(envelope.into_product())
    }

    pub async fn update_product(&self, id: &str, update: &ProductUpdate) -> ClientResult<Product> {
        let request = self
            .authed(Method::PUT, &format!("products/{id}"))?
            .json(update);
        let envelope: ProductEnvelope = Self::send(request).await?;
        Ok(envelope.into_product())
    }

    pub async fn delete_product(&self, id: &str) -> ClientResult<()> {
        Self::send_unit(self.authed(Method::DELETE, &format!("products/{id}"))?).await
    }

    // ========== Account ==========

    pub async fn current_user(&self) -> ClientResult<User> {
        Self::send(self.authed(Method::GET, "user")?).await
    }

    pub async fn my_products(&self) -> ClientResult<Vec<Product>> {
        Self::send(self.authed(Method::GET, "user/products")?).await
    }

    pub async fn change_password(&self, current: &str, new: &str) -> ClientResult<()> {
        let body = ChangePasswordRequest {
            current_password: current,
            new_password: new,
        };
        Self::send_unit(self.authed(Method::POST, "user/change-password")?.json(&body)).await
    }

    // ========== Reviews ==========

    pub async fn list_reviews(&self, product_id: &str) -> ClientResult<Vec<Review>> {
        Self::send(self.request(Method::GET, &format!("reviews/{product_id}"))).await
    }

    pub async fn post_review(
        &self,
        product_id: &str,
        rating: u8,
        comment: &str,
    ) -> ClientResult<Review> {
        let body = NewReviewRequest { rating, comment };
        let request = self
            .authed(Method::POST, &format!("reviews/{product_id}"))?
            .json(&body);
        Self::send(request).await
    }
}
