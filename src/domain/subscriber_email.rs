#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    /// Trims and lowercases `s`, then checks it has the loose `local@domain.tld` shape.
    pub fn parse(s: &str) -> Result<SubscriberEmail, String> {
        let email = s.trim().to_lowercase();
        if email.is_empty() {
            return Err("Valid email is required.".to_string());
        }
        if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(format!("{} is not a valid subscriber email.", email));
        }
        let has_valid_shape = email
            .match_indices('@')
            .any(|(at, _)| at > 0 && has_inner_dot(&email[at + 1..]));
        if has_valid_shape {
            Ok(Self(email))
        } else {
            Err(format!("{} is not a valid subscriber email.", email))
        }
    }
}

// A dot with at least one character on either side.
fn has_inner_dot(domain: &str) -> bool {
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<SubscriberEmail> for String {
    fn from(val: SubscriberEmail) -> Self {
        val.0
    }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
