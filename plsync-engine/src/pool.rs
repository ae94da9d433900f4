//! One connection pool per (environment, user) pair.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bb8::Pool;
use plsync_core::{ConnectionConfig, Connector};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::connection::{Lease, SessionManager};
use crate::error::EngineResult;

/// Configuration for each connection pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of sessions per pool.
    pub max_connections: u32,
    /// Minimum number of idle sessions to keep. `None` opens sessions lazily.
    pub min_idle: Option<u32>,
    /// Maximum time to wait for a session.
    pub connection_timeout: Duration,
    /// Maximum idle time before a session is closed.
    pub idle_timeout: Option<Duration>,
    /// Maximum lifetime of a session.
    pub max_lifetime: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_idle: None,
            connection_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)), // 10 minutes
            max_lifetime: Some(Duration::from_secs(1800)), // 30 minutes
        }
    }
}

/// Key of a pool: environment and uppercased user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
    /// Environment name.
    pub env: String,
    /// Database user, uppercased.
    pub user: String,
}

impl PoolKey {
    /// Key for a resolved configuration.
    pub fn for_config(config: &ConnectionConfig) -> Self {
        Self {
            env: config.env.clone(),
            user: config.user.to_uppercase(),
        }
    }
}

/// Pool status information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStatus {
    /// Pool key.
    pub key: PoolKey,
    /// Current number of sessions (including idle).
    pub connections: u32,
    /// Number of idle sessions.
    pub idle_connections: u32,
    /// Maximum size of the pool.
    pub max_size: u32,
}

/// Owns the session pools of an engine.
///
/// A pool is created on the first lease for its (environment, user) pair and
/// kept until [`close`](Self::close) or drop.
pub struct ConnectionPoolManager<C: Connector> {
    connector: Arc<C>,
    config: PoolConfig,
    pools: Mutex<HashMap<PoolKey, Pool<SessionManager<C>>>>,
}

impl<C: Connector> ConnectionPoolManager<C> {
    /// Create a manager with default pool sizing.
    pub fn new(connector: C) -> Self {
        Self::with_pool_config(connector, PoolConfig::default())
    }

    /// Create a manager with custom pool sizing.
    pub fn with_pool_config(connector: C, config: PoolConfig) -> Self {
        Self {
            connector: Arc::new(connector),
            config,
            pools: Mutex::new(HashMap::new()),
        }
    }

    /// The connector sessions are opened with.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Pool sizing applied to new pools.
    pub fn pool_config(&self) -> &PoolConfig {
        &self.config
    }

    async fn pool_for(&self, config: &ConnectionConfig) -> Pool<SessionManager<C>> {
        let key = PoolKey::for_config(config);
        let mut pools = self.pools.lock().await;

        pools
            .entry(key)
            .or_insert_with_key(|key| {
                let manager = SessionManager::new(Arc::clone(&self.connector), config.clone());
                let pool = Pool::builder()
                    .max_size(self.config.max_connections)
                    .min_idle(self.config.min_idle)
                    .connection_timeout(self.config.connection_timeout)
                    .idle_timeout(self.config.idle_timeout)
                    .max_lifetime(self.config.max_lifetime)
                    .build_unchecked(manager);

                info!(
                    env = %key.env,
                    user = %key.user,
                    max_connections = self.config.max_connections,
                    "Session pool created"
                );
                pool
            })
            .clone()
    }

    /// Lease a session for `config`, waiting for pool capacity if needed.
    pub async fn lease(&self, config: &ConnectionConfig) -> EngineResult<Lease<C>> {
        let pool = self.pool_for(config).await;
        debug!(env = %config.env, user = %config.user, "Acquiring session from pool");
        Ok(pool.get_owned().await?)
    }

    /// Return a leased session to its pool.
    pub fn release(&self, lease: Lease<C>) {
        drop(lease);
    }

    /// Number of pools created so far.
    pub async fn pool_count(&self) -> usize {
        self.pools.lock().await.len()
    }

    /// Status of every pool.
    pub async fn status(&self) -> Vec<PoolStatus> {
        let pools = self.pools.lock().await;
        let mut status: Vec<PoolStatus> = pools
            .iter()
            .map(|(key, pool)| {
                let state = pool.state();
                PoolStatus {
                    key: key.clone(),
                    connections: state.connections,
                    idle_connections: state.idle_connections,
                    max_size: self.config.max_connections,
                }
            })
            .collect();
        status.sort_by(|a, b| (&a.key.env, &a.key.user).cmp(&(&b.key.env, &b.key.user)));
        status
    }

    /// Drop every pool. Outstanding leases stay usable until dropped.
    pub async fn close(&self) {
        let mut pools = self.pools.lock().await;
        info!(pools = pools.len(), "Closing session pools");
        pools.clear();
    }
}
