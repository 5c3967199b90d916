use alloc::borrow::Cow;

use crate::NativeEvent;

/// A host's refusal to grant a native subscription.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HostError {
    message: Cow<'static, str>,
}

impl HostError {
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("failed to subscribe to `{event}` events: {source}")]
    Subscribe {
        event: NativeEvent,
        #[source]
        source: HostError,
    },

    #[error("failed to observe document mutations: {source}")]
    ObserveMutations {
        #[source]
        source: HostError,
    },
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
