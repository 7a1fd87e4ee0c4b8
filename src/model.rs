use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::{Validate, ValidationError};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+@[A-Za-z0-9_]+\.(ru|com)$").expect("valid regex")
});

static LOGIN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("valid regex"));

#[derive(Serialize, Deserialize, Validate, Debug, Clone, PartialEq, Eq)]
pub struct User {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Email is required"))]
    #[validate(regex(path = *EMAIL_PATTERN, message = "Email should be valid"))]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Login is required"))]
    #[validate(regex(
        path = *LOGIN_PATTERN,
        message = "Login without white spaces is required"
    ))]
    pub login: String,
    /// Display name. Blank names are replaced by the login when stored.
    #[serde(default)]
    pub name: Option<String>,
    #[validate(custom(function = "in_the_past", message = "Date must be in the past"))]
    pub birthday: NaiveDate,
}

#[derive(Serialize, Deserialize, Validate, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Description is required"))]
    #[validate(length(
        max = 200,
        message = "Description must be no longer than 200 characters"
    ))]
    pub description: String,
    /// Length in minutes.
    #[validate(range(min = 1, message = "Duration must be positive"))]
    pub duration: i32,
    #[validate(custom(
        function = "after_cinema_birthday",
        message = "Release date should be later than 28.12.1895"
    ))]
    pub release_date: NaiveDate,
    pub mpa: Mpa,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default, rename = "likes_count")]
    pub likes_count: u64,
}

/// Requests may reference a genre by id only; responses always carry the name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Genre {
    pub id: u32,
    #[serde(default)]
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Mpa {
    pub id: u32,
    #[serde(default)]
    pub name: String,
}

pub fn cinema_birthday() -> NaiveDate {
    NaiveDate::from_ymd_opt(1895, 12, 28).expect("valid date")
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn in_the_past(date: &NaiveDate) -> Result<(), ValidationError> {
    if *date >= chrono::Local::now().date_naive() {
        return Err(ValidationError::new("past"));
    }
    Ok(())
}

fn after_cinema_birthday(date: &NaiveDate) -> Result<(), ValidationError> {
    if *date <= cinema_birthday() {
        return Err(ValidationError::new("release_date"));
    }
    Ok(())
}

impl User {
    /// The name to store: the given name, or the login when it is blank.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => self.login.clone(),
        }
    }
}

impl Film {
    /// Requested genre ids, deduplicated and in ascending order.
    pub fn genre_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.genres.iter().map(|genre| genre.id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
