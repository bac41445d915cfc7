//! Submitted forms and their validation.
//!
//! Each form is deserialized straight from the urlencoded body with every
//! field defaulted, so a missing field shows up as a validation error on the
//! re-rendered form instead of a 422 from the extractor. `clean` trims and
//! checks the input and either produces the record to store or the list of
//! field errors to show.
//!
//! Uniqueness (category name/slug, username) is left to the database; the
//! handlers turn a [`crate::db::DbError::Duplicate`] into a field error with
//! [`FormErrors::add`].

use serde::Deserialize;

use crate::slug::category_slug;
use crate::types::{NewCategory, NewPage};

pub const NAME_MAX: usize = 128;
pub const TITLE_MAX: usize = 128;
pub const URL_MAX: usize = 200;
pub const USERNAME_MAX: usize = 150;

/// One message attached to one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Validation errors for a whole form, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(Vec<FieldError>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages for one field.
    pub fn for_field(&self, field: &str) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(move |e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

fn required(errors: &mut FormErrors, field: &'static str, value: &str, max: usize) {
    if value.is_empty() {
        errors.add(field, "This field is required.");
    } else if value.chars().count() > max {
        errors.add(
            field,
            format!("Ensure this value has at most {max} characters."),
        );
    }
}

/// Prefix `http://` when the URL has no scheme, then check it has a host.
///
/// Returns `None` when the result can't be a usable link.
pub fn normalize_url(raw: &str) -> Option<String> {
    let url = raw.trim();
    let url = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{url}")
    };

    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or("");
    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    if host.is_empty() || url.chars().any(char::is_whitespace) {
        return None;
    }
    Some(url)
}

// ============================================================================
// Content forms
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub name: String,
}

impl CategoryForm {
    pub fn clean(&self) -> Result<NewCategory, FormErrors> {
        let mut errors = FormErrors::default();
        let name = self.name.trim();
        required(&mut errors, "name", name, NAME_MAX);

        let slug = category_slug(name);
        if !name.is_empty() && slug.is_empty() {
            errors.add("name", "The name must contain at least one letter or digit.");
        }

        errors.into_result(NewCategory {
            name: name.to_string(),
            slug,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageForm {
    pub title: String,
    pub url: String,
}

impl PageForm {
    pub fn clean(&self) -> Result<NewPage, FormErrors> {
        let mut errors = FormErrors::default();
        let title = self.title.trim();
        required(&mut errors, "title", title, TITLE_MAX);

        let raw_url = self.url.trim();
        let mut url = String::new();
        if raw_url.is_empty() {
            errors.add("url", "This field is required.");
        } else {
            match normalize_url(raw_url) {
                Some(u) if u.chars().count() > URL_MAX => errors.add(
                    "url",
                    format!("Ensure this value has at most {URL_MAX} characters."),
                ),
                Some(u) => url = u,
                None => errors.add("url", "Enter a valid URL."),
            }
        }

        errors.into_result(NewPage {
            title: title.to_string(),
            url,
        })
    }
}

// ============================================================================
// Account forms
// ============================================================================

/// Registration: account fields plus the profile's website.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub website: String,
}

/// A registration that passed validation. The password is still plain text
/// and must be hashed before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanRegistration {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    pub website: Option<String>,
}

impl RegisterForm {
    pub fn clean(&self) -> Result<CleanRegistration, FormErrors> {
        let mut errors = FormErrors::default();

        let username = self.username.trim();
        required(&mut errors, "username", username, USERNAME_MAX);
        if !username.is_empty()
            && !username
                .chars()
                .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        let email = self.email.trim();
        if !email.is_empty() && !looks_like_email(email) {
            errors.add("email", "Enter a valid email address.");
        }

        if self.password.is_empty() {
            errors.add("password", "This field is required.");
        }

        let website = self.website.trim();
        let mut clean_website = None;
        if !website.is_empty() {
            match normalize_url(website) {
                Some(u) if u.chars().count() <= URL_MAX => clean_website = Some(u),
                _ => errors.add("website", "Enter a valid URL."),
            }
        }

        errors.into_result(CleanRegistration {
            username: username.to_string(),
            email: (!email.is_empty()).then(|| email.to_string()),
            password: self.password.clone(),
            website: clean_website,
        })
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Where to go after a successful login, carried over from the guard.
    pub next: Option<String>,
}

/// Accept only same-site absolute paths as a post-login target.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

/// Query string of the login page, set by the login guard.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NextParam {
    pub next: Option<String>,
}
