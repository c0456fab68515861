//! Fan-out of move events to subscribers

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::SliderMoveEvent;

/// Queue depth of each subscription
pub const SUBSCRIBER_QUEUE_CAPACITY: usize = 16;

/// What to do when a subscriber's queue is full
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Wait for room. A stalled subscriber holds back every later delivery
    /// and the decode path behind it.
    #[default]
    Block,
    /// Drop the event for that subscriber only
    DropNewest,
}

/// Remainder of a delivery that had to wait for a full queue
pub type PendingDelivery = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Ordered list of subscriber queues
#[derive(Debug, Default)]
pub struct Dispatcher {
    subscribers: Vec<mpsc::Sender<SliderMoveEvent>>,
    policy: DeliveryPolicy,
}

impl Dispatcher {
    pub fn new(policy: DeliveryPolicy) -> Self {
        Self {
            subscribers: Vec::new(),
            policy,
        }
    }

    pub fn add(&mut self, sender: mpsc::Sender<SliderMoveEvent>) {
        self.subscribers.push(sender);
        debug!(subscribers = self.subscribers.len(), "Added slider move subscriber");
    }

    pub fn set_policy(&mut self, policy: DeliveryPolicy) {
        if self.policy != policy {
            debug!(?policy, "Delivery policy changed");
            self.policy = policy;
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver `event` to every subscriber in registration order.
    ///
    /// Queues with room are filled right away. Under [`DeliveryPolicy::Block`]
    /// the first full queue stops the walk and the rest of the delivery,
    /// starting with that subscriber, is returned for the caller to drive.
    /// Nothing else may be dispatched until it completes.
    pub fn dispatch(&mut self, event: SliderMoveEvent) -> Option<PendingDelivery> {
        self.prune_closed();

        for (idx, subscriber) in self.subscribers.iter().enumerate() {
            match subscriber.try_send(event) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Closed(_)) => {}
                Err(mpsc::error::TrySendError::Full(_)) => match self.policy {
                    DeliveryPolicy::DropNewest => {
                        warn!(subscriber = idx, ?event, "Subscriber queue full, dropping move event");
                    }
                    DeliveryPolicy::Block => {
                        debug!(subscriber = idx, "Subscriber queue full, waiting for room");
                        let remaining = self.subscribers[idx..].to_vec();
                        return Some(Box::pin(async move {
                            for subscriber in remaining {
                                let _ = subscriber.send(event).await;
                            }
                        }));
                    }
                },
            }
        }

        None
    }

    /// Forget subscribers whose receiver is gone
    pub fn prune_closed(&mut self) {
        let before = self.subscribers.len();
        self.subscribers.retain(|subscriber| !subscriber.is_closed());

        let removed = before - self.subscribers.len();
        if removed > 0 {
            debug!(
                removed,
                remaining = self.subscribers.len(),
                "Pruned closed subscribers"
            );
        }
    }
}
