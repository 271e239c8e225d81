//! Form validation
//!
//! Every check runs before any mutation is attempted. Failures carry one
//! message per field so the caller can show them next to the inputs.

use crate::storage::SignUp;
use crate::types::TrackMetadata;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Minimum password length for new accounts
pub const MIN_PASSWORD_LEN: usize = 6;

/// Maximum display name length
pub const MAX_DISPLAY_NAME_LEN: usize = 50;

/// Field-level validation messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    /// Empty error set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field (first message per field wins)
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(field.into()).or_insert_with(|| message.into());
    }

    /// Message for a field, if any
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// True when no field failed
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of failed fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterate over (field, message) pairs in field order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.fields {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Loose structural email check: `local@domain.tld`, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

/// Validate a sign-up form
pub fn validate_sign_up(form: &SignUp) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if !is_valid_email(&form.email) {
        errors.add("email", "Please enter a valid email address");
    }

    if form.password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        );
    }

    let name_len = form.display_name.chars().count();
    if name_len == 0 {
        errors.add("displayName", "Display name is required");
    } else if name_len > MAX_DISPLAY_NAME_LEN {
        errors.add("displayName", "Display name too long");
    }

    errors.into_result()
}

/// Validate a sign-in form
pub fn validate_sign_in(email: &str, password: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if !is_valid_email(email) {
        errors.add("email", "Please enter a valid email address");
    }

    if password.is_empty() {
        errors.add("password", "Password is required");
    }

    errors.into_result()
}

/// Validate upload metadata and the audio source
///
/// `has_audio` is false when no file was chosen (or the URL is blank).
pub fn validate_upload(metadata: &TrackMetadata, has_audio: bool) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if !has_audio {
        errors.add("audio", "Audio file is required");
    }

    if metadata.title.trim().is_empty() {
        errors.add("title", "Title is required");
    }

    if metadata.artist.trim().is_empty() {
        errors.add("artist", "Artist is required");
    }

    errors.into_result()
}

/// File name without its last extension, used to prefill the title
pub fn title_from_file_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.contains('/') => stem.to_string(),
        _ => file_name.to_string(),
    }
}

/// Last path segment of a URL without extension, percent-decoded
pub fn title_from_url(raw: &str) -> Option<String> {
    let url = url::Url::parse(raw).ok()?;
    let segment = url.path_segments()?.last()?.to_string();
    if segment.is_empty() {
        return None;
    }

    let decoded = percent_encoding::percent_decode_str(&segment)
        .decode_utf8_lossy()
        .into_owned();
    Some(title_from_file_name(&decoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_up(email: &str, password: &str, name: &str) -> SignUp {
        SignUp {
            email: email.to_string(),
            password: password.to_string(),
            display_name: name.to_string(),
        }
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("listener@example.com"));
        assert!(is_valid_email("a.b+c@mail.example.org"));
        assert!(!is_valid_email("listener"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("listener@example"));
        assert!(!is_valid_email("listener@.com"));
        assert!(!is_valid_email("list ener@example.com"));
        assert!(!is_valid_email("a@b@example.com"));
    }

    #[test]
    fn sign_up_reports_every_field() {
        let errors = validate_sign_up(&sign_up("bad", "123", "")).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("email"), Some("Please enter a valid email address"));
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 6 characters")
        );
        assert_eq!(errors.get("displayName"), Some("Display name is required"));
    }

    #[test]
    fn sign_up_rejects_long_display_name() {
        let name = "x".repeat(MAX_DISPLAY_NAME_LEN + 1);
        let errors = validate_sign_up(&sign_up("a@b.co", "secret1", &name)).unwrap_err();
        assert_eq!(errors.get("displayName"), Some("Display name too long"));
    }

    #[test]
    fn sign_up_accepts_valid_form() {
        assert!(validate_sign_up(&sign_up("a@b.co", "secret", "Sam")).is_ok());
    }

    #[test]
    fn sign_in_requires_password() {
        let errors = validate_sign_in("a@b.co", "").unwrap_err();
        assert_eq!(errors.get("password"), Some("Password is required"));
        assert!(errors.get("email").is_none());
    }

    #[test]
    fn upload_requires_title_artist_and_audio() {
        let errors = validate_upload(&TrackMetadata::new("  ", ""), false).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(validate_upload(&TrackMetadata::new("Song", "Band"), true).is_ok());
    }

    #[test]
    fn display_joins_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "Title is required");
        errors.add("artist", "Artist is required");
        assert_eq!(
            errors.to_string(),
            "artist: Artist is required; title: Title is required"
        );
    }

    #[test]
    fn titles_from_names_and_urls() {
        assert_eq!(title_from_file_name("my song.mp3"), "my song");
        assert_eq!(title_from_file_name("archive.tar.gz"), "archive.tar");
        assert_eq!(title_from_file_name("noext"), "noext");
        assert_eq!(
            title_from_url("https://cdn.example.com/audio/Late%20Night.ogg").as_deref(),
            Some("Late Night")
        );
        assert_eq!(title_from_url("https://cdn.example.com/"), None);
        assert_eq!(title_from_url("not a url"), None);
    }
}
