//! # plsync-cache
//!
//! Local record of the last DDL time observed for each database object.
//!
//! The engine reads it before every export or compile to detect remote
//! changes made outside plsync, and writes it after every successful one.
//! Records are keyed by object identity, upserted, and never evicted.
//!
//! ## Example
//!
//! ```rust,no_run
//! use plsync_cache::{DdlTimeStore, SqliteDdlCache};
//! use plsync_core::{DdlTime, ObjectIdentity, ObjectType};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = SqliteDdlCache::open(".plsync/ddl_times.db").await?;
//! let id = ObjectIdentity::new("HR", "EMP_API", ObjectType::PackageBody);
//!
//! cache.put(&id, Some(DdlTime::from_canonical("2023-01-01 10:00:00")?)).await?;
//! assert_eq!(cache.get(&id).await?.as_deref(), Some("2023-01-01 10:00:00"));
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod error;
pub mod store;

pub use error::{CacheError, CacheResult};
pub use store::{DdlTimeRecord, DdlTimeStore, SqliteDdlCache};
