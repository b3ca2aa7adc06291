use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// -- JWT Claims --

/// JWT claims issued at login and checked on every protected route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
}

/// Distinguishes "field absent" (`None`) from "field set to null"
/// (`Some(None)`) when used with `#[serde(default)]`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub nickname: Option<String>,
}

/// OAuth2 password-grant form. `username` carries the email; other form
/// fields (`grant_type`, `scope`, ...) are accepted and ignored.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserPatch {
    pub active: Option<bool>,
    /// Sets both superuser flags.
    pub is_superuser: Option<bool>,
}

// -- Categories --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
}

// -- Sentences --

/// Unknown fields (e.g. a client-supplied `likes`) are ignored; new sentences
/// always start at zero likes.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSentenceRequest {
    pub category_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub from_source: Option<String>,
    #[serde(default)]
    pub from_who: Option<String>,
}

/// A JSON body that is either a single object or an array of them. Also used
/// for the reply, so the response mirrors the shape of the request.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }

    pub fn is_many(&self) -> bool {
        matches!(self, OneOrMany::Many(_))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SentencePatch {
    pub category_id: Option<Uuid>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub from_source: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub from_who: Option<Option<String>>,
    pub is_disabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SampleQuery {
    #[serde(default = "default_sample_limit")]
    pub limit: u32,
}

fn default_sample_limit() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub is_disabled: Option<bool>,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchRequest {
    pub ids: Vec<Uuid>,
    #[serde(default)]
    pub is_disabled: Option<bool>,
}
