//! bb8 adapter for database sessions.

use std::sync::Arc;

use async_trait::async_trait;
use plsync_core::{ConnectionConfig, Connector, DbError, DbSession};
use tracing::debug;

/// Opens sessions for one resolved connection configuration.
pub struct SessionManager<C> {
    connector: Arc<C>,
    config: ConnectionConfig,
}

impl<C> SessionManager<C> {
    /// Create a manager for `config`.
    pub fn new(connector: Arc<C>, config: ConnectionConfig) -> Self {
        Self { connector, config }
    }

    /// The configuration sessions are opened with.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }
}

#[async_trait]
impl<C: Connector> bb8::ManageConnection for SessionManager<C> {
    type Connection = C::Session;
    type Error = DbError;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        debug!(env = %self.config.env, user = %self.config.user, "Opening database session");
        self.connector.connect(&self.config).await
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        conn.ping().await
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

/// A leased session. Derefs to the session and returns it to its pool when
/// dropped.
pub type Lease<C> = bb8::PooledConnection<'static, SessionManager<C>>;
