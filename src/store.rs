mod error;
mod subscriber_store;
mod writer;

pub use error::StoreError;
pub use subscriber_store::SubscriberStore;
pub use writer::StoreWriter;
