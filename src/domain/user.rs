use serde::{Deserialize, Serialize};
use uuid::Uuid;

const USERNAME_MIN_LEN: usize = 3;
const USERNAME_MAX_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("payload validation error: from field 'username'")]
    InvalidUsername,
    #[error("payload validation error: from field 'email'")]
    InvalidEmail,
}

/// User details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    /// bcrypt hash; `None` for accounts created through Google.
    pub password_hash: Option<String>,
    pub picture: String,
}

impl User {
    /// Builds a locally registered user, validating the submitted fields.
    ///
    /// Inner spaces of a valid username are stored as underscores, so
    /// `"al ex"` becomes `"al_ex"`. Emails are stored lowercased.
    pub fn register(
        username: &str,
        email: &str,
        password_hash: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let username = username.trim();
        validate_username(username)?;

        let email = normalize_email(email);
        validate_email(&email)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            picture: gravatar_url(&email),
            username: username.replace(' ', "_"),
            email,
            password_hash: Some(password_hash.into()),
        })
    }

    pub fn from_google(
        id: impl Into<String>,
        fullname: impl Into<String>,
        email: impl Into<String>,
        picture: impl Into<String>,
    ) -> Self {
        let email: String = email.into();
        Self {
            id: id.into(),
            username: fullname.into(),
            email: normalize_email(&email),
            password_hash: None,
            picture: picture.into(),
        }
    }
}

/// 3 to 8 ASCII letters or digits. Inner spaces are allowed and count
/// towards the length.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len)
        || username.starts_with(' ')
        || username.ends_with(' ')
        || !username.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ')
    {
        return Err(ValidationError::InvalidUsername);
    }

    Ok(())
}

/// Accepts a bare `local@domain` address whose domain has at least two
/// non-empty labels.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let (local, domain) = email
        .split_once('@')
        .ok_or(ValidationError::InvalidEmail)?;

    let well_formed = !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(|c| c.is_whitespace() || c.is_control())
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty());

    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

/// Email identity is case-insensitive; every stored or looked-up address goes
/// through here first.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn gravatar_url(email: &str) -> String {
    format!(
        "https://www.gravatar.com/avatar/{:x}",
        md5::compute(email.trim().to_lowercase().as_bytes())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_accepts_valid_fields() {
        let user = User::register("alex", " Alex@Example.org ", "hash").unwrap();

        assert_eq!(user.username, "alex");
        assert_eq!(user.email, "alex@example.org");
        assert_eq!(user.password_hash.as_deref(), Some("hash"));
        assert!(Uuid::parse_str(&user.id).is_ok());
        assert_eq!(user.picture, gravatar_url("alex@example.org"));
    }

    #[test]
    fn register_rejects_bad_usernames() {
        for username in ["ab", "abcdefghi", "al_ex", "al-ex", "", "ālex", "a   ", "abcd efgh"] {
            assert_eq!(
                User::register(username, "alex@example.org", "hash"),
                Err(ValidationError::InvalidUsername),
                "{username:?} should be rejected"
            );
        }
    }

    #[test]
    fn register_turns_inner_spaces_into_underscores() {
        for (input, stored) in [("al ex", "al_ex"), (" al ex ", "al_ex"), ("a b c", "a_b_c")] {
            let user = User::register(input, "alex@example.org", "hash").unwrap();
            assert_eq!(user.username, stored);
        }
    }

    #[test]
    fn register_rejects_bad_emails() {
        let emails = [
            "",
            "alex",
            "@example.org",
            "alex@",
            "alex@example",
            "a@b@c.d",
            "a lex@x.org",
            "alex@x..org",
        ];
        for email in emails {
            assert_eq!(
                User::register("alex", email, "hash"),
                Err(ValidationError::InvalidEmail),
                "{email:?} should be rejected"
            );
        }
    }

    #[test]
    fn validation_error_names_the_field() {
        assert_eq!(
            ValidationError::InvalidEmail.to_string(),
            "payload validation error: from field 'email'"
        );
    }

    #[test]
    fn google_users_have_no_password() {
        let user = User::from_google("g-1", "Alex Miller", "alex@gmail.com", "https://pic");

        assert_eq!(user.username, "Alex Miller");
        assert!(user.password_hash.is_none());

        let user = User::from_google("g-2", "Bo", " Bo@Gmail.com", "");
        assert_eq!(user.email, "bo@gmail.com");
    }
}
