#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubscriberName(String);

impl SubscriberName {
    /// Names are optional: a missing or blank name becomes an empty one.
    pub fn parse(s: Option<&str>) -> SubscriberName {
        Self(s.unwrap_or_default().trim().to_string())
    }
}

impl AsRef<str> for SubscriberName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<SubscriberName> for String {
    fn from(val: SubscriberName) -> Self {
        val.0
    }
}
