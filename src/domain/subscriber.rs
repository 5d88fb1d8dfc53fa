use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::NewSubscriber;

/// A persisted sign-up, as stored in the subscribers file.
///
/// Fields stay plain strings so that records written before emails were
/// normalized can still be read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

impl Subscriber {
    pub fn new(new_subscriber: NewSubscriber, date: OffsetDateTime) -> Self {
        Self {
            email: new_subscriber.email.into(),
            name: new_subscriber.name.into(),
            date,
        }
    }

    pub fn has_email(&self, email: &str) -> bool {
        self.email.to_lowercase() == email.to_lowercase()
    }
}
