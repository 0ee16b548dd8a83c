use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    #[serde(default, deserialize_with = "de::id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// A listed software package as returned by `GET /products`.
///
/// The backend is inconsistent about key casing and omits fields freely, so
/// every field has a default and numbers decode leniently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(default, deserialize_with = "de::string")]
    pub title: String,
    #[serde(default, deserialize_with = "de::string")]
    pub description: String,
    #[serde(default, deserialize_with = "de::string")]
    pub category: String,
    #[serde(default, deserialize_with = "de::or_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "de::string")]
    pub version: String,
    #[serde(default, deserialize_with = "de::string")]
    pub license: String,
    #[serde(default, rename = "oncodash_version", deserialize_with = "de::string")]
    pub compatibility_version: String,
    #[serde(default, deserialize_with = "de::or_default")]
    pub seller: Seller,
    #[serde(default, alias = "downloadCount", deserialize_with = "de::number")]
    pub download_count: f64,
    #[serde(default, alias = "reviewCount", deserialize_with = "de::number")]
    pub review_count: f64,
    #[serde(default, deserialize_with = "de::number")]
    pub rating: f64,
    #[serde(default, deserialize_with = "de::number")]
    pub price: f64,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, deserialize_with = "de::optional_string")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "de::or_default")]
    pub images: Vec<String>,
    #[serde(default, deserialize_with = "de::optional_string")]
    pub file_url: Option<String>,
    #[serde(default, deserialize_with = "de::optional_string")]
    pub external_url: Option<String>,
    #[serde(default, alias = "createdAt", deserialize_with = "de::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updatedAt", deserialize_with = "de::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// All image URLs, the primary `image_url` first.
    pub fn image_urls(&self) -> Vec<&str> {
        self.image_url
            .iter()
            .chain(self.images.iter())
            .map(String::as_str)
            .collect()
    }

    /// Where the software can be fetched from, preferring the uploaded file.
    pub fn download_location(&self) -> Option<&str> {
        self.file_url.as_deref().or(self.external_url.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVersion {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(default, deserialize_with = "de::string")]
    pub version: String,
}

/// `GET /products/:id` response: the product plus its reviews and sibling versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub versions: Vec<ProductVersion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(default, alias = "productId", deserialize_with = "de::id")]
    pub product_id: String,
    #[serde(default, alias = "userId", deserialize_with = "de::id")]
    pub user_id: String,
    #[serde(default, alias = "userName")]
    pub user_name: String,
    #[serde(default, alias = "userAvatar")]
    pub user_avatar: Option<String>,
    #[serde(default, deserialize_with = "de::number")]
    pub rating: f64,
    #[serde(default)]
    pub comment: String,
    #[serde(default, alias = "createdAt", deserialize_with = "de::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Seller,
    Admin,
    /// Also stands in for any role this client does not know.
    #[default]
    #[serde(other)]
    User,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default, deserialize_with = "de::or_default")]
    pub role: Role,
    #[serde(default, alias = "createdAt", deserialize_with = "de::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct RegisterResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordRequest<'a> {
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

/// Editable fields sent as the JSON body of `PUT /products/:id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductUpdate {
    pub title: String,
    pub description: String,
    pub category: String,
    pub version: String,
    pub license: String,
    pub oncodash_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewReviewRequest<'a> {
    pub rating: u8,
    pub comment: &'a str,
}

/// Create/update responses come back either bare or as `{ "message", "product" }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProductEnvelope {
    Wrapped { product: Product },
    Bare(Product),
}

impl ProductEnvelope {
    pub(crate) fn into_product(self) -> Product {
        match self {
            Self::Wrapped { product } | Self::Bare(product) => product,
        }
    }
}

/// Error body; the backend uses `error` or `message` depending on the route.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    pub(crate) fn into_message(self) -> Option<String> {
        self.error
            .or(self.message)
            .filter(|m| !m.trim().is_empty())
    }
}

mod de {
    use super::*;

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        })
    }

    /// `null` reads as the type's default.
    pub fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
    }

    /// Versions sometimes arrive as bare numbers (`1.0`).
    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        })
    }

    pub fn optional_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(string(d).map(Some)?.filter(|s| !s.trim().is_empty()))
    }

    /// Absent, null or malformed numbers decode to zero.
    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        let n = match Option::<Value>::deserialize(d)? {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        };
        Ok(if n.is_finite() { n } else { 0.0 })
    }

    pub fn timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) => parse_timestamp(&s),
            _ => None,
        })
    }

    pub(super) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(naive.and_utc());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }
}
