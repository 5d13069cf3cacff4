use acctform::{AccountErrors, AccountRecord, ErrorField};

const LABEL_MAX_CHARS: usize = 50;
const LOGIN_MAX_CHARS: usize = 100;
const PASSWORD_MAX_CHARS: usize = 100;

// Form-level checks, flags every field so stale errors get cleared
pub fn validate(record: &AccountRecord) -> AccountErrors {
    let mut errors = AccountErrors::default();
    errors.set(ErrorField::Label, record.label_raw.chars().count() > LABEL_MAX_CHARS);
    errors.set(
        ErrorField::Login,
        record.login.trim().is_empty() || record.login.chars().count() > LOGIN_MAX_CHARS,
    );
    errors.set(
        ErrorField::Password,
        record.password.as_ref().map_or(false, |p| p.chars().count() > PASSWORD_MAX_CHARS),
    );
    errors.set(ErrorField::Type, false);
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_login_is_flagged() {
        let errors = validate(&AccountRecord::default());
        assert!(errors.has(ErrorField::Login));
        assert!(!errors.has(ErrorField::Label));
        assert!(!errors.has(ErrorField::Password));
    }

    #[test]
    fn length_limits() {
        let record = AccountRecord {
            label_raw: "x".repeat(51),
            login: "l".repeat(100),
            password: Some("p".repeat(101)),
            ..AccountRecord::default()
        };
        let errors = validate(&record);
        assert!(errors.has(ErrorField::Label));
        assert!(!errors.has(ErrorField::Login));
        assert!(errors.has(ErrorField::Password));
    }

    #[test]
    fn missing_password_is_fine_for_any_type() {
        let record = AccountRecord {
            login: "admin".to_owned(),
            ..AccountRecord::default()
        };
        assert!(!validate(&record).has_errors());
    }
}
