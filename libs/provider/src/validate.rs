use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ProviderError;

static ACCOUNT_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{12}$").expect("valid regex"));
static OU_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:r-[0-9a-z]{4,32}|ou-[0-9a-z]{4,32}-[a-z0-9]{8,32})$").expect("valid regex")
});
static PERMISSION_ARN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^arn:(aws|aws-us-gov|aws-cn|aws-iso|aws-iso-b):sso:::permissionSet/(sso)?ins-[a-zA-Z0-9\-.]{16}/ps-[a-zA-Z0-9\-./]{16}$",
    )
    .expect("valid regex")
});

/// Returns the trimmed value, or a configuration error when it is absent or blank.
pub fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, ProviderError> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ProviderError::config(field, "must not be empty")),
    }
}

pub fn required_value<T>(field: &str, value: Option<&T>) -> Result<(), ProviderError> {
    match value {
        Some(_) => Ok(()),
        None => Err(ProviderError::config(field, "must be set")),
    }
}

pub fn account_id(field: &str, value: &str) -> Result<(), ProviderError> {
    matches(field, value, &ACCOUNT_ID, "must be a 12 digit AWS account number")
}

pub fn ou_id(field: &str, value: &str) -> Result<(), ProviderError> {
    matches(field, value, &OU_ID, "must be a root id (r-...) or an OU id (ou-...)")
}

pub fn permission_arn(field: &str, value: &str) -> Result<(), ProviderError> {
    matches(
        field,
        value,
        &PERMISSION_ARN,
        "must be an IAM Identity Center permission set ARN",
    )
}

fn matches(field: &str, value: &str, pattern: &Regex, message: &str) -> Result<(), ProviderError> {
    if pattern.is_match(value) {
        Ok(())
    } else {
        Err(ProviderError::config(field, format!("{message}, got `{value}`")))
    }
}
