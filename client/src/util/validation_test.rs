use super::*;

#[test]
fn accepts_ordinary_addresses() {
    for ok in ["a@b.co", "first.last+tag@mail.example.com", "o'neil@example.ie", "x_y@sub-domain.example.org"] {
        assert!(is_valid_email(ok), "{ok}");
    }
}

#[test]
fn rejects_malformed_addresses() {
    for bad in ["", "plain", "@b.co", "a@", "a@b", "a@b.c", "a@@b.co", "a b@c.co", ".a@b.co", "a..b@c.co", "a@-b.co", "a@b.c0"] {
        assert!(!is_valid_email(bad), "{bad}");
    }
}

#[test]
fn first_rejection_per_field_wins() {
    let mut errors = FieldErrors::default();
    errors.reject(Field::Name, "first");
    errors.reject(Field::Name, "second");
    assert_eq!(errors.get(Field::Name), Some("first"));
    assert_eq!(errors.fields().collect::<Vec<_>>(), vec![Field::Name]);
}

#[test]
fn auth_error_displays_server_message_or_key() {
    let with_message = FormError::Auth { key: "auth.signIn.error", message: Some("Invalid email or password".into()) };
    assert_eq!(with_message.to_string(), "Invalid email or password");
    let bare = FormError::Auth { key: "auth.signIn.error", message: None };
    assert_eq!(bare.to_string(), "auth.signIn.error");
    assert!(bare.field_errors().is_none());
}
