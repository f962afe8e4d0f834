//! Realtime change feed
//!
//! The hosted record store pushes a notification whenever a row changes in one of the
//! tables a client subscribed to. This module models those notifications and the
//! channel they travel on; [`MemoryStore`](crate::store::MemoryStore) emits them
//! synchronously on every mutation, so the subscription flow can be exercised without
//! a server.

use std::fmt::{Display, Error, Formatter};

use tokio::sync::mpsc;

/// What happened to a row
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A single change notification, as received from the store's realtime channel
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeEvent {
    /// The table the changed row lives in
    pub table: &'static str,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(table: &'static str, kind: ChangeKind) -> Self {
        Self { table, kind }
    }
}

impl Display for ChangeEvent {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        let kind = match self.kind {
            ChangeKind::Insert => "insert",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        };
        write!(f, "{} on {}", kind, self.table)
    }
}

/// The emitting end of a change feed
pub type FeedSender = mpsc::UnboundedSender<ChangeEvent>;
/// The subscribing end of a change feed
pub type FeedReceiver = mpsc::UnboundedReceiver<ChangeEvent>;

/// Create a feed channel pair.
///
/// The channel is unbounded: change events are tiny and the subscriber drains them on
/// every refresh, so backpressure would only complicate the emitting side.
pub fn change_channel() -> (FeedSender, FeedReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_display() {
        let event = ChangeEvent::new("courses", ChangeKind::Delete);
        assert_eq!(format!("{}", event), "delete on courses");
    }

    #[tokio::test]
    async fn channel_delivers_in_order() {
        let (sender, mut receiver) = change_channel();
        sender.send(ChangeEvent::new("courses", ChangeKind::Insert)).unwrap();
        sender.send(ChangeEvent::new("study_materials", ChangeKind::Update)).unwrap();

        assert_eq!(receiver.recv().await.unwrap().table, "courses");
        assert_eq!(receiver.recv().await.unwrap().kind, ChangeKind::Update);
    }
}
