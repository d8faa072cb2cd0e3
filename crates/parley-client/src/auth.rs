//! Client-side checks run before credentials reach the backend.

use parley_core::AuthError;

use crate::api::RegisterForm;

/// Validate a registration form.
///
/// Checks, in order: a plausible email, matching confirmation, minimum
/// password length in characters.
pub fn validate_registration(
    form: &RegisterForm,
    min_password_chars: usize,
) -> Result<(), AuthError> {
    if !looks_like_email(&form.email) {
        return Err(AuthError::InvalidEmail);
    }
    if form.password != form.confirm {
        return Err(AuthError::PasswordMismatch);
    }
    if form.password.chars().count() < min_password_chars {
        return Err(AuthError::PasswordTooShort {
            min: min_password_chars,
        });
    }
    Ok(())
}

/// Login needs a non-empty email and password.
pub fn validate_login(email: &str, password: &str) -> Result<(), AuthError> {
    if !looks_like_email(email) {
        return Err(AuthError::InvalidEmail);
    }
    if password.is_empty() {
        return Err(AuthError::PasswordTooShort { min: 1 });
    }
    Ok(())
}

fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !email.contains(' '),
        None => false,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn form(email: &str, password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            email: email.into(),
            username: None,
            password: password.into(),
            confirm: confirm.into(),
        }
    }

    #[test]
    fn accepts_valid_form() {
        assert_eq!(validate_registration(&form("a@b.io", "secret", "secret"), 6), Ok(()));
    }

    #[test]
    fn rejects_mismatch_before_length() {
        assert_eq!(
            validate_registration(&form("a@b.io", "abc", "abd"), 6),
            Err(AuthError::PasswordMismatch)
        );
    }

    #[test]
    fn rejects_short_password() {
        assert_eq!(
            validate_registration(&form("a@b.io", "12345", "12345"), 6),
            Err(AuthError::PasswordTooShort { min: 6 })
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(validate_registration(&form("a@b.io", "ééééé", "ééééé"), 6).is_err());
        assert_eq!(validate_registration(&form("a@b.io", "éééééé", "éééééé"), 6), Ok(()));
    }

    #[test]
    fn rejects_bad_email() {
        for email in ["", "plain", "@b.io", "a@", "a b@c.io"] {
            assert_eq!(
                validate_registration(&form(email, "secret", "secret"), 6),
                Err(AuthError::InvalidEmail),
                "{email}"
            );
        }
    }

    #[test]
    fn login_requires_password() {
        assert!(validate_login("a@b.io", "x").is_ok());
        assert_eq!(
            validate_login("a@b.io", ""),
            Err(AuthError::PasswordTooShort { min: 1 })
        );
    }
}
