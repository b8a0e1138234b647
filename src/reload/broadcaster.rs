//! Reload Broadcaster - the live subscriber set
//!
//! Every open `/live-reload` stream is a `Subscriber` owned by the
//! broadcaster. Writes happen only while the set is locked, so a
//! subscriber's frames never interleave and the `connected` frame is always
//! the first one on its stream.
//!
//! ```text
//! Dispatcher --subscribe--> Broadcaster <--notify_reload-- ReloadActor
//!                               |
//!                               +--frame--> every open stream
//! ```

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use super::frame::Frame;

/// Output half of a subscribed connection.
pub type Sink = Box<dyn Write + Send>;

/// Identifies one subscription for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Subscribers that accepted the frame
    pub delivered: usize,
    /// Subscribers removed because the write failed
    pub dropped: usize,
}

struct Subscriber {
    id: SubscriberId,
    sink: Sink,
}

#[derive(Default)]
struct Registry {
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

/// Shared handle to the subscriber set. Clones refer to the same set.
#[derive(Clone, Default)]
pub struct Broadcaster {
    inner: Arc<Mutex<Registry>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stream and send it the `connected` frame.
    ///
    /// A stream that cannot take the acknowledgement is not registered.
    pub fn subscribe(&self, sink: impl Write + Send + 'static) -> io::Result<SubscriberId> {
        let mut sink: Sink = Box::new(sink);
        let mut registry = self.inner.lock();

        write_frame(&mut sink, Frame::Connected)?;

        let id = SubscriberId(registry.next_id);
        registry.next_id += 1;
        registry.subscribers.push(Subscriber { id, sink });
        crate::debug!("reload"; "client {} connected (total: {})", id, registry.subscribers.len());
        Ok(id)
    }

    /// Write a `reload` frame to every subscriber.
    pub fn notify_reload(&self) -> Delivery {
        self.broadcast(Frame::Reload)
    }

    /// Write a keep-alive comment to every subscriber, pruning dead streams.
    pub fn heartbeat(&self) -> Delivery {
        self.broadcast(Frame::Heartbeat)
    }

    /// Drop every subscriber, ending their streams. Returns how many there were.
    pub fn close_all(&self) -> usize {
        let drained: Vec<_> = self.inner.lock().subscribers.drain(..).collect();
        drained.len()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `frame` to all subscribers; a failed write removes only that
    /// subscriber.
    fn broadcast(&self, frame: Frame) -> Delivery {
        let mut registry = self.inner.lock();
        let mut delivery = Delivery::default();

        registry
            .subscribers
            .retain_mut(|sub| match write_frame(&mut sub.sink, frame) {
                Ok(()) => {
                    delivery.delivered += 1;
                    true
                }
                Err(e) => {
                    crate::debug!("reload"; "client {} disconnected: {}", sub.id, e);
                    delivery.dropped += 1;
                    false
                }
            });

        if frame != Frame::Heartbeat {
            crate::debug!("reload"; "{} sent to {} clients", frame.label(), delivery.delivered);
        }
        delivery
    }
}

fn write_frame(sink: &mut Sink, frame: Frame) -> io::Result<()> {
    sink.write_all(frame.as_bytes())?;
    sink.flush()
}
