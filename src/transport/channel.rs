use std::sync::mpsc::{self, Receiver, Sender};

use super::{Sink, Source};
use crate::error::TransportError;

/// Receiving half of an in-process endpoint.
/// Once every sender is dropped the stream has ended.
pub struct ChannelSource<T> {
    name: String,
    receiver: Receiver<T>,
}

/// Sending half of an in-process endpoint
#[derive(Clone)]
pub struct ChannelSink<T> {
    name: String,
    sender: Sender<T>,
}

/// Create a connected sink/source pair named `name`
pub fn channel<T>(name: impl Into<String>) -> (ChannelSink<T>, ChannelSource<T>) {
    let name = name.into();
    let (sender, receiver) = mpsc::channel();
    (
        ChannelSink {
            name: name.clone(),
            sender,
        },
        ChannelSource { name, receiver },
    )
}

impl<T> Source<T> for ChannelSource<T> {
    fn acquire(&mut self) -> Result<Option<T>, TransportError> {
        Ok(self.receiver.recv().ok())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<T> Sink<T> for ChannelSink<T> {
    fn publish(&mut self, unit: T) -> Result<(), TransportError> {
        self.sender
            .send(unit)
            .map_err(|_| TransportError::Disconnected(self.name.clone()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
