use crate::algebra::{Connection, RelationalStore};
use futures::future::BoxFuture;
use orderdesk_domain::{ConnectionDescriptor, InternalError, OrderdeskError, TableSchema};
use std::sync::Arc;
use strum::AsRefStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum GuardState {
    Unconnected,
    Connecting,
    Ready,
    Closed,
}

/// Scopes exactly one unit of work to one connection.
///
/// `run` connects (bounded by the descriptor timeout), optionally ensures a
/// table, hands the connection to the work and closes it afterwards whatever
/// the outcome. There are no retries and a guard cannot be reused.
pub struct ConnectionGuard {
    store: Arc<dyn RelationalStore>,
    descriptor: ConnectionDescriptor,
    state: GuardState,
}

impl ConnectionGuard {
    pub fn new(store: Arc<dyn RelationalStore>, descriptor: ConnectionDescriptor) -> Self {
        Self {
            store,
            descriptor,
            state: GuardState::Unconnected,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    fn transition(&mut self, next: GuardState) {
        tracing::debug!(
            from = self.state.as_ref(),
            to = next.as_ref(),
            "Connection guard for {}",
            self.descriptor
        );
        self.state = next;
    }

    pub async fn run<T, F>(
        &mut self,
        schema: Option<&'static TableSchema>,
        work: F,
    ) -> Result<T, OrderdeskError>
    where
        T: Send,
        F: for<'c> FnOnce(
                &'c mut (dyn Connection + 'static),
            ) -> BoxFuture<'c, Result<T, OrderdeskError>>
            + Send,
    {
        if self.state != GuardState::Unconnected {
            return Err(InternalError::connection_error(
                &format!(
                    "Connection guard already used, current state is {}",
                    self.state.as_ref()
                ),
                Some("guard"),
            ));
        }

        self.transition(GuardState::Connecting);

        let timeout = self.descriptor.connect_timeout();
        let connected =
            tokio::time::timeout(timeout, self.store.connect(&self.descriptor)).await;

        let mut connection = match connected {
            Ok(Ok(connection)) => connection,
            Ok(Err(e)) => {
                self.transition(GuardState::Closed);
                tracing::error!("Could not connect to {}: {e}", self.descriptor);
                return Err(e);
            }
            Err(_) => {
                self.transition(GuardState::Closed);
                tracing::error!(
                    "Timed out after {}s connecting to {}",
                    timeout.as_secs_f32(),
                    self.descriptor
                );
                return Err(InternalError::connection_error(
                    &format!(
                        "Timed out after {}s connecting to {}",
                        timeout.as_secs_f32(),
                        self.descriptor
                    ),
                    Some("timeout"),
                ));
            }
        };

        self.transition(GuardState::Ready);

        let result = match schema {
            Some(schema) => match connection.ensure_table(schema).await {
                Ok(()) => work(connection.as_mut()).await,
                Err(e) => Err(e),
            },
            None => work(connection.as_mut()).await,
        };

        if let Err(e) = connection.close().await {
            tracing::warn!("Failed to close connection to {}: {e}", self.descriptor);
        }
        self.transition(GuardState::Closed);

        result
    }
}
