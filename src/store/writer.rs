use tokio::sync::{mpsc, oneshot};

use super::{StoreError, SubscriberStore};
use crate::domain::{NewSubscriber, Subscriber};

const QUEUE_CAPACITY: usize = 64;

struct AppendCommand {
    new_subscriber: NewSubscriber,
    reply: oneshot::Sender<Result<Subscriber, StoreError>>,
}

/// Handle to the task that performs every write to the subscriber store.
///
/// Appends are queued and applied one at a time, so the duplicate re-check in
/// [`SubscriberStore::append`] and the write that follows it cannot interleave
/// with another append from this process.
#[derive(Clone, Debug)]
pub struct StoreWriter {
    sender: mpsc::Sender<AppendCommand>,
}

impl StoreWriter {
    /// Spawns the writer task on the current tokio runtime.
    pub fn spawn(store: SubscriberStore) -> Self {
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        tokio::spawn(run_writer(store, receiver));
        Self { sender }
    }

    pub async fn append(&self, new_subscriber: NewSubscriber) -> Result<Subscriber, StoreError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(AppendCommand {
                new_subscriber,
                reply,
            })
            .await
            .map_err(|_| StoreError::WriterClosed)?;
        response.await.map_err(|_| StoreError::WriterClosed)?
    }
}

#[tracing::instrument(name = "Store writer", skip_all, fields(path = %store.path().display()))]
async fn run_writer(store: SubscriberStore, mut receiver: mpsc::Receiver<AppendCommand>) {
    while let Some(AppendCommand {
        new_subscriber,
        reply,
    }) = receiver.recv().await
    {
        let result = store.append(new_subscriber).await;
        // The requester may have gone away; the write stands either way.
        let _ = reply.send(result);
    }
    tracing::info!("Store writer stopped");
}
