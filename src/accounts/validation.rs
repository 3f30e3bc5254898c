//! Field rules for account creation and update.
//!
//! Everything here is pure: a raw request goes in, either a normalized input or the
//! full list of issues comes out. Nothing is applied unless every field passes.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::accounts::{
    dto::{CreateAccountRequest, UpdateAccountRequest},
    repo_types::Role,
};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 20;
pub const PASSWORD_MIN: usize = 6;
pub const PASSWORD_MAX: usize = 50;

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[a-zA-Z0-9_]+$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// One failing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Validated input for account creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAccountInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Validated input for a profile update. At least one field is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAccountInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

// Each rule checks the raw value first and normalizes afterwards, so surrounding
// whitespace counts towards length and format.

fn username(raw: &str) -> Result<String, String> {
    let len = raw.chars().count();
    if len < USERNAME_MIN {
        return Err(format!("username must be at least {USERNAME_MIN} characters"));
    }
    if len > USERNAME_MAX {
        return Err(format!("username must be at most {USERNAME_MAX} characters"));
    }
    if !USERNAME_RE.is_match(raw) {
        return Err("username may only contain letters, digits and underscores".into());
    }
    Ok(raw.trim().to_string())
}

fn email(raw: &str) -> Result<String, String> {
    if !is_valid_email(raw) {
        return Err("email must be a valid email address".into());
    }
    Ok(raw.to_lowercase().trim().to_string())
}

fn password(raw: &str) -> Result<String, String> {
    let len = raw.chars().count();
    if len < PASSWORD_MIN {
        return Err(format!("password must be at least {PASSWORD_MIN} characters"));
    }
    if len > PASSWORD_MAX {
        return Err(format!("password must be at most {PASSWORD_MAX} characters"));
    }
    let value = raw.trim();
    if value.is_empty() {
        return Err("password must not be empty".into());
    }
    Ok(value.to_string())
}

fn role(raw: Option<&str>) -> Result<Role, String> {
    match raw {
        None => Ok(Role::default()),
        Some(r) => r
            .parse::<Role>()
            .map_err(|_| "role must be one of: admin, user".to_string()),
    }
}

fn required(
    field: &'static str,
    raw: Option<&str>,
    rule: fn(&str) -> Result<String, String>,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    match raw {
        None => {
            issues.push(ValidationIssue::new(field, format!("{field} is required")));
            None
        }
        Some(v) => optional(field, Some(v), rule, issues),
    }
}

fn optional(
    field: &'static str,
    raw: Option<&str>,
    rule: fn(&str) -> Result<String, String>,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    let v = raw?;
    match rule(v) {
        Ok(clean) => Some(clean),
        Err(message) => {
            issues.push(ValidationIssue::new(field, message));
            None
        }
    }
}

pub fn validate_create(req: &CreateAccountRequest) -> Result<CreateAccountInput, Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    let username = required("username", req.username.as_deref(), username, &mut issues);
    let email = required("email", req.email.as_deref(), email, &mut issues);
    let password = required("password", req.password.as_deref(), password, &mut issues);
    let role = match role(req.role.as_deref()) {
        Ok(r) => Some(r),
        Err(message) => {
            issues.push(ValidationIssue::new("role", message));
            None
        }
    };

    match (username, email, password, role) {
        (Some(username), Some(email), Some(password), Some(role)) if issues.is_empty() => {
            Ok(CreateAccountInput {
                username,
                email,
                password,
                role,
            })
        }
        _ => Err(issues),
    }
}

/// Any `role` sent by the caller never reaches this point: the request type has no
/// such field, so serde drops it during deserialization.
pub fn validate_update(req: &UpdateAccountRequest) -> Result<UpdateAccountInput, Vec<ValidationIssue>> {
    if req.username.is_none() && req.email.is_none() && req.password.is_none() {
        return Err(vec![ValidationIssue::new(
            "body",
            "at least one field must be provided for update",
        )]);
    }

    let mut issues = Vec::new();
    let username = optional("username", req.username.as_deref(), username, &mut issues);
    let email = optional("email", req.email.as_deref(), email, &mut issues);
    let password = optional("password", req.password.as_deref(), password, &mut issues);

    if !issues.is_empty() {
        return Err(issues);
    }
    Ok(UpdateAccountInput {
        username,
        email,
        password,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(username: &str, email: &str, password: &str) -> CreateAccountRequest {
        CreateAccountRequest {
            username: Some(username.into()),
            email: Some(email.into()),
            password: Some(password.into()),
            role: None,
        }
    }

    fn paths(issues: &[ValidationIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn create_normalizes_and_defaults_role() {
        let input = validate_create(&create("alice01", "A@Example.com", " secret1 ")).unwrap();
        assert_eq!(input.username, "alice01");
        assert_eq!(input.email, "a@example.com");
        assert_eq!(input.password, "secret1");
        assert_eq!(input.role, Role::User);
    }

    #[test]
    fn create_accepts_explicit_admin() {
        let mut req = create("root_admin", "root@example.com", "secret1");
        req.role = Some("admin".into());
        assert_eq!(validate_create(&req).unwrap().role, Role::Admin);
    }

    #[test]
    fn create_reports_every_bad_field() {
        let issues = validate_create(&create("ab", "not-an-email", "abc")).unwrap_err();
        assert_eq!(paths(&issues), vec!["username", "email", "password"]);
    }

    #[test]
    fn create_reports_missing_fields() {
        let issues = validate_create(&CreateAccountRequest::default()).unwrap_err();
        assert_eq!(paths(&issues), vec!["username", "email", "password"]);
        assert_eq!(issues[0].message, "username is required");
    }

    #[test]
    fn create_rejects_unknown_role() {
        let mut req = create("alice01", "a@example.com", "secret1");
        req.role = Some("superuser".into());
        let issues = validate_create(&req).unwrap_err();
        assert_eq!(paths(&issues), vec!["role"]);
    }

    #[test]
    fn username_rules() {
        assert!(username("abc").is_ok());
        assert!(username("a_b_c_123").is_ok());
        assert!(username("ab").is_err());
        assert!(username(&"x".repeat(21)).is_err());
        assert!(username(&"x".repeat(20)).is_ok());
        assert!(username("bad-name").is_err());
        assert!(username("with space").is_err());
    }

    #[test]
    fn password_rules() {
        assert!(password("      ").unwrap_err().contains("empty"));
        assert!(password("abc").unwrap_err().contains("at least"));
        assert!(password(&"p".repeat(51)).is_err());
        assert_eq!(password("  abcdef  ").unwrap(), "abcdef");
    }

    #[test]
    fn padding_counts_before_trim() {
        // Length is measured on the raw value; the stored password is trimmed.
        let input = validate_create(&create("alice01", "a@example.com", "  abc  ")).unwrap();
        assert_eq!(input.password, "abc");

        // Format is checked on the raw value, so padded emails are rejected.
        let issues = validate_create(&create("alice01", " a@example.com ", "secret1")).unwrap_err();
        assert_eq!(paths(&issues), vec!["email"]);

        let issues = validate_create(&create(" alice01 ", "a@example.com", "secret1")).unwrap_err();
        assert_eq!(paths(&issues), vec!["username"]);
    }

    #[test]
    fn email_rules() {
        assert!(is_valid_email("user@example.com"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("not-an-email"));
        assert!(email("two@@example.com").is_err());
    }

    #[test]
    fn update_rejects_empty_body() {
        let issues = validate_update(&UpdateAccountRequest::default()).unwrap_err();
        assert_eq!(paths(&issues), vec!["body"]);
    }

    #[test]
    fn update_ignores_role() {
        let req: UpdateAccountRequest =
            serde_json::from_str(r#"{"email":"New@X.com","role":"admin"}"#).unwrap();
        let input = validate_update(&req).unwrap();
        assert_eq!(input.email.as_deref(), Some("new@x.com"));
        assert!(input.username.is_none());
        assert!(input.password.is_none());
    }

    #[test]
    fn update_with_only_role_is_empty() {
        let req: UpdateAccountRequest = serde_json::from_str(r#"{"role":"admin"}"#).unwrap();
        assert!(validate_update(&req).is_err());
    }

    #[test]
    fn update_validates_present_fields() {
        let req = UpdateAccountRequest {
            username: Some("ok_name".into()),
            email: None,
            password: Some("abc".into()),
        };
        let issues = validate_update(&req).unwrap_err();
        assert_eq!(paths(&issues), vec!["password"]);
    }
}
