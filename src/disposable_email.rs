use crate::error::AppError;

// Throwaway inbox providers commonly used for spam signups
const DISPOSABLE_DOMAINS: &[&str] = &[
    "10minutemail.com",
    "10minutemail.net",
    "guerrillamail.com",
    "guerrillamail.net",
    "guerrillamailblock.com",
    "sharklasers.com",
    "grr.la",
    "guerrillamail.biz",
    "guerrillamail.org",
    "guerrillamail.de",
    "spam4.me",
    "mailinator.com",
    "mailinator.net",
    "mailinator2.com",
    "mailtothis.com",
    "tempmail.com",
    "temp-mail.org",
    "temp-mail.io",
    "getnada.com",
    "mohmal.com",
    "throwaway.email",
    "throwawaymail.com",
    "trashmail.com",
    "trashmail.net",
    "trash-mail.com",
    "yopmail.com",
    "yopmail.net",
    "yopmail.fr",
    "fakeinbox.com",
    "emailondeck.com",
    "mintemail.com",
    "mailnesia.com",
    "mailcatch.com",
    "maildrop.cc",
    "dispostable.com",
    "spamgourmet.com",
    "mytemp.email",
    "mytempemail.com",
    "tmails.net",
    "gufum.com",
];

pub fn is_disposable_email(email: &str) -> bool {
    let email = email.trim().to_ascii_lowercase();
    match email.split('@').nth(1) {
        Some(domain) if !domain.is_empty() => DISPOSABLE_DOMAINS.contains(&domain),
        _ => false,
    }
}

pub fn validate_not_disposable(email: &str) -> Result<(), AppError> {
    if is_disposable_email(email) {
        return Err(AppError::BadRequest(
            "Temporary email addresses are not allowed".to_string(),
        ));
    }
    Ok(())
}
