//! Tests for the domain user model.

use super::*;
use rstest::{fixture, rstest};

#[fixture]
fn user() -> User {
    User::try_from_strings("user@hospitable.com", "hospitable", "hashed").expect("valid user")
}

#[rstest]
#[case("Ada@Example.COM", "ada@example.com")]
#[case("  grace@navy.mil ", "grace@navy.mil")]
fn emails_are_trimmed_and_lowercased(#[case] raw: &str, #[case] expected: &str) {
    let email = Email::new(raw).expect("valid email");
    assert_eq!(email.as_ref(), expected);
}

#[rstest]
#[case("", UserValidationError::EmptyEmail)]
#[case("   ", UserValidationError::EmptyEmail)]
#[case("no-at-sign", UserValidationError::InvalidEmail)]
#[case("@missing.local", UserValidationError::InvalidEmail)]
#[case("missing-domain@", UserValidationError::InvalidEmail)]
#[case("two@at@signs", UserValidationError::InvalidEmail)]
#[case("spaced out@x.com", UserValidationError::InvalidEmail)]
fn malformed_emails_are_rejected(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(Email::new(raw), Err(expected));
}

#[rstest]
fn usernames_are_required() {
    assert_eq!(Username::new("  "), Err(UserValidationError::EmptyUsername));
}

#[rstest]
fn usernames_have_a_length_cap() {
    let long = "x".repeat(USERNAME_MAX + 1);
    assert_eq!(
        Username::new(long),
        Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX })
    );
}

#[rstest]
fn password_hash_is_redacted_in_debug_output() {
    let hash = PasswordHash::new("$2a$14$secret").expect("non-empty hash");
    let rendered = format!("{hash:?}");
    assert!(!rendered.contains("secret"));
    assert_eq!(hash.expose(), "$2a$14$secret");
}

#[rstest]
fn empty_password_hash_is_rejected() {
    assert_eq!(
        PasswordHash::new(""),
        Err(UserValidationError::EmptyPasswordHash)
    );
}

#[rstest]
fn setters_replace_identity_and_profile(mut user: User) {
    user.set_email(Email::new("author@whole.com").expect("valid email"));
    user.set_username(Username::new("whole").expect("valid username"));
    user.set_bio("hospitable bio");
    user.set_image("https://img.test/hospitable.png");

    assert_eq!(user.email().as_ref(), "author@whole.com");
    assert_eq!(user.username().as_ref(), "whole");
    assert_eq!(user.bio(), "hospitable bio");
    assert_eq!(user.image(), "https://img.test/hospitable.png");
}

#[rstest]
fn profile_satisfies_the_author_capability(user: User) {
    let user = user.with_bio("bio").with_image("image");
    let profile = user.profile();

    assert_eq!(Author::email(&profile), Author::email(&user));
    assert_eq!(Author::bio(&profile), "bio");
    assert_eq!(Author::image(&profile), "image");
    assert_eq!(profile.username.as_ref(), "hospitable");
}
