//! Field-level validation shared by every entity constructor.
//!
//! Validation runs before any port is called. Each check returns a
//! [`ValidationError`] naming the offending field and a stable code; the raw
//! input is never echoed back.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::json;

use super::Error;

/// Stable machine-readable reason attached to a [`ValidationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCode {
    /// Required field missing or blank.
    Required,
    /// Value shorter than the lower bound.
    TooShort { min: usize },
    /// Value longer than the upper bound.
    TooLong { max: usize },
    /// Value does not match the expected shape.
    InvalidFormat,
    /// Value contains characters outside the permitted set.
    InvalidCharacters,
    /// Numeric value outside the permitted range.
    OutOfRange,
    /// Value is not a member of a closed set.
    UnknownValue,
    /// Wrong JSON type for the field.
    InvalidType,
}

impl ValidationCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::TooShort { .. } => "too_short",
            Self::TooLong { .. } => "too_long",
            Self::InvalidFormat => "invalid_format",
            Self::InvalidCharacters => "invalid_characters",
            Self::OutOfRange => "out_of_range",
            Self::UnknownValue => "unknown_value",
            Self::InvalidType => "invalid_type",
        }
    }
}

/// A single field failed validation.
///
/// # Examples
/// ```
/// use discovery_backend::domain::validation::{validate_username, ValidationCode};
///
/// let err = validate_username("a").expect_err("too short");
/// assert_eq!(err.field(), "username");
/// assert_eq!(err.code(), ValidationCode::TooShort { min: 3 });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    field: &'static str,
    code: ValidationCode,
}

impl ValidationError {
    /// Build an error for `field` with the given reason.
    pub const fn new(field: &'static str, code: ValidationCode) -> Self {
        Self { field, code }
    }

    /// Logical field name, as seen by API callers.
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Reason the field was rejected.
    pub fn code(&self) -> ValidationCode {
        self.code
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = self.field;
        match self.code {
            ValidationCode::Required => write!(f, "{field} is required"),
            ValidationCode::TooShort { min } => {
                write!(f, "{field} must be at least {min} characters")
            }
            ValidationCode::TooLong { max } => write!(f, "{field} must be at most {max} characters"),
            ValidationCode::InvalidFormat => write!(f, "{field} has an invalid format"),
            ValidationCode::InvalidCharacters => write!(f, "{field} contains invalid characters"),
            ValidationCode::OutOfRange => write!(f, "{field} is out of range"),
            ValidationCode::UnknownValue => write!(f, "{field} is not a recognised value"),
            ValidationCode::InvalidType => write!(f, "{field} has the wrong type"),
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for Error {
    fn from(value: ValidationError) -> Self {
        Error::invalid_request(value.to_string()).with_details(json!({
            "field": value.field,
            "code": value.code.as_str(),
        }))
    }
}

/// Upper bound for email addresses.
pub const EMAIL_MAX: usize = 255;
/// Username length bounds.
pub const USERNAME_MIN: usize = 3;
/// Username length bounds.
pub const USERNAME_MAX: usize = 50;
/// Password length bounds.
pub const PASSWORD_MIN: usize = 8;
/// Password length bounds.
pub const PASSWORD_MAX: usize = 256;
/// Upper bound for short labels such as names and targets.
pub const LABEL_MAX: usize = 255;
/// Upper bound for long free-text descriptions.
pub const DESCRIPTION_MAX: usize = 2000;
/// Upper bound for structure strings.
pub const SMILES_MAX: usize = 500;

const MARKUP_CHARACTERS: [char; 6] = ['<', '>', '"', '\'', '&', '\\'];
const SCRIPT_MARKERS: [&str; 3] = ["<script", "javascript:", "onerror="];
const SMILES_PUNCTUATION: &str = "()[]=#$:/\\@+-.%*";

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static USERNAME_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| {
        Regex::new("^[a-zA-Z0-9_-]+$")
            .unwrap_or_else(|error| panic!("username regex failed to compile: {error}"))
    })
}

fn check_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let length = value.chars().count();
    if length < min {
        return Err(ValidationError::new(field, ValidationCode::TooShort { min }));
    }
    if length > max {
        return Err(ValidationError::new(field, ValidationCode::TooLong { max }));
    }
    Ok(())
}

/// Normalise and validate an email address (trimmed, lower-cased).
pub fn validate_email(raw: &str) -> Result<String, ValidationError> {
    let value = raw.trim().to_ascii_lowercase();
    if value.is_empty() {
        return Err(ValidationError::new("email", ValidationCode::Required));
    }
    check_length("email", &value, 1, EMAIL_MAX)?;
    if !email_regex().is_match(&value) {
        return Err(ValidationError::new("email", ValidationCode::InvalidFormat));
    }
    Ok(value)
}

/// Validate a username: 3-50 characters from `[A-Za-z0-9_-]`.
pub fn validate_username(raw: &str) -> Result<String, ValidationError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::new("username", ValidationCode::Required));
    }
    check_length("username", value, USERNAME_MIN, USERNAME_MAX)?;
    if !username_regex().is_match(value) {
        return Err(ValidationError::new(
            "username",
            ValidationCode::InvalidCharacters,
        ));
    }
    Ok(value.to_owned())
}

/// Validate a plaintext password. Whitespace is preserved.
pub fn validate_password(raw: &str) -> Result<(), ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::new("password", ValidationCode::Required));
    }
    check_length("password", raw, PASSWORD_MIN, PASSWORD_MAX)
}

/// Validate a required display label that must not carry markup characters.
pub fn validate_safe_name(
    field: &'static str,
    raw: &str,
    max: usize,
) -> Result<String, ValidationError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::new(field, ValidationCode::Required));
    }
    check_length(field, value, 1, max)?;
    if value.chars().any(|c| MARKUP_CHARACTERS.contains(&c) || c.is_control()) {
        return Err(ValidationError::new(field, ValidationCode::InvalidCharacters));
    }
    Ok(value.to_owned())
}

/// Validate optional free text; blank input collapses to `None`.
pub fn validate_optional_text(
    field: &'static str,
    raw: Option<&str>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    check_length(field, value, 1, max)?;
    if contains_script_marker(value) {
        return Err(ValidationError::new(field, ValidationCode::InvalidCharacters));
    }
    Ok(Some(value.to_owned()))
}

fn contains_script_marker(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    SCRIPT_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Syntactic check for a SMILES structure string.
///
/// Guards storage against malformed input only: restricted character set,
/// balanced parentheses, and non-nested, balanced atom brackets. Chemical
/// validity is not assessed.
///
/// # Examples
/// ```
/// use discovery_backend::domain::validation::validate_smiles;
///
/// assert!(validate_smiles("CC(=O)Oc1ccccc1C(=O)O").is_ok());
/// assert!(validate_smiles("CC(C").is_err());
/// ```
pub fn validate_smiles(raw: &str) -> Result<String, ValidationError> {
    const FIELD: &str = "smiles";
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::new(FIELD, ValidationCode::Required));
    }
    check_length(FIELD, value, 1, SMILES_MAX)?;
    if contains_script_marker(value) {
        return Err(ValidationError::new(FIELD, ValidationCode::InvalidCharacters));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || SMILES_PUNCTUATION.contains(c))
    {
        return Err(ValidationError::new(FIELD, ValidationCode::InvalidCharacters));
    }

    let mut depth = 0_usize;
    let mut in_bracket = false;
    for c in value.chars() {
        match c {
            '(' if !in_bracket => depth += 1,
            ')' if !in_bracket => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(ValidationError::new(FIELD, ValidationCode::InvalidFormat))?;
            }
            '[' if !in_bracket => in_bracket = true,
            ']' if in_bracket => in_bracket = false,
            '(' | ')' | '[' | ']' => {
                return Err(ValidationError::new(FIELD, ValidationCode::InvalidFormat));
            }
            _ => {}
        }
    }
    if depth != 0 || in_bracket {
        return Err(ValidationError::new(FIELD, ValidationCode::InvalidFormat));
    }
    Ok(value.to_owned())
}

/// Validate an optional finite number within an inclusive range.
pub fn validate_range(
    field: &'static str,
    value: Option<f64>,
    min: f64,
    max: f64,
) -> Result<Option<f64>, ValidationError> {
    match value {
        Some(number) if !number.is_finite() || number < min || number > max => {
            Err(ValidationError::new(field, ValidationCode::OutOfRange))
        }
        other => Ok(other),
    }
}
