use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

/// The utilization submission form. `value` is interpreted against the
/// configured schema (hours or percentage) by the handler.
#[derive(Debug, Deserialize)]
pub struct EntryForm {
    pub project: String,
    #[serde(default)]
    pub description: String,
    pub week_ending: NaiveDate,
    pub value: f64,
}

/// Dashboard filter query, all fields optional. Non-admin requests ignore
/// `user` and are pinned to the session's own username.
#[derive(Debug, Deserialize, Default)]
pub struct FilterForm {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub user: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub project: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub to: Option<NaiveDate>,
}

// HTML forms submit untouched fields as empty strings; treat those as unset.
fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(text) => text.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}
