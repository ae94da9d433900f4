//! Resolution of unqualified names across the database's search contexts.
//!
//! Each context (0 to 9) is a distinct lookup scope such as procedures,
//! packages or types. Contexts are tried in order; "not resolvable in this
//! context" moves on to the next one, any other fault stops the search.

use std::ops::RangeInclusive;

use plsync_core::{DbError, DbSession, NameResolution};
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{EngineError, EngineResult};

/// Resolution contexts, in search order.
pub const RESOLUTION_CONTEXTS: RangeInclusive<u8> = 0..=9;

/// Classification of one context lookup.
#[derive(Debug)]
pub enum ContextOutcome {
    /// The name resolved to an object.
    Resolved(NameResolution),
    /// Not found in this context, try the next one.
    Continue,
    /// A fault that ends the search.
    Terminal(DbError),
}

impl ContextOutcome {
    /// Classify the result of a name resolution call.
    pub fn classify(result: Result<NameResolution, DbError>) -> Self {
        match result {
            Ok(resolution) if resolution.is_resolved() => Self::Resolved(resolution),
            Ok(_) => Self::Continue,
            Err(e) if e.is_name_not_resolvable() => Self::Continue,
            Err(e) => Self::Terminal(e),
        }
    }
}

/// A name resolved to its owner and object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedName {
    /// Owning schema.
    pub owner: String,
    /// Object name (`part1`, else `part2`).
    pub object_name: String,
    /// Context the name resolved in.
    pub context: u8,
    /// Raw resolution out binds.
    pub resolution: NameResolution,
}

/// Tries resolution contexts for a name.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameResolver;

impl NameResolver {
    /// Create a resolver.
    pub fn new() -> Self {
        Self
    }

    /// Resolve `name`, stopping at the first context that yields an object.
    pub async fn resolve<S>(&self, session: &mut S, name: &str) -> EngineResult<ResolvedName>
    where
        S: DbSession + ?Sized,
    {
        for context in RESOLUTION_CONTEXTS {
            match ContextOutcome::classify(session.name_resolve(name, context).await) {
                ContextOutcome::Resolved(resolution) => {
                    let object_name = resolution.object_name().unwrap_or_default().to_string();
                    let owner = resolution.schema.clone().unwrap_or_default();
                    debug!(name, context, owner = %owner, object_name = %object_name, "Resolved name");
                    return Ok(ResolvedName {
                        owner,
                        object_name,
                        context,
                        resolution,
                    });
                }
                ContextOutcome::Continue => {
                    trace!(name, context, "Name not resolvable in context");
                }
                ContextOutcome::Terminal(e) => return Err(e.into()),
            }
        }

        Err(EngineError::NameNotResolved(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDatabase, FakeSession};
    use plsync_core::{ConnectionConfig, Connector};

    async fn session(db: &FakeDatabase) -> FakeSession {
        crate::testing::FakeConnector::new(db.clone())
            .connect(&ConnectionConfig {
                env: "DEV".into(),
                user: "HR".into(),
                password: String::new(),
                connect_string: String::new(),
                is_default: true,
            })
            .await
            .unwrap()
    }

    fn resolution(schema: &str, part1: &str) -> NameResolution {
        NameResolution {
            schema: Some(schema.into()),
            part1: Some(part1.into()),
            part1_type: Some("9".into()),
            object_number: Some(73_110),
            ..Default::default()
        }
    }

    #[test]
    fn test_classify() {
        assert!(matches!(
            ContextOutcome::classify(Ok(resolution("HR", "EMP_API"))),
            ContextOutcome::Resolved(_)
        ));
        assert!(matches!(
            ContextOutcome::classify(Ok(NameResolution::default())),
            ContextOutcome::Continue
        ));
        assert!(matches!(
            ContextOutcome::classify(Err(DbError::new("ORA-04047").with_code(4047))),
            ContextOutcome::Continue
        ));
        assert!(matches!(
            ContextOutcome::classify(Err(DbError::new("ORA-06564").with_code(6564))),
            ContextOutcome::Terminal(_)
        ));
    }

    #[tokio::test]
    async fn test_resolves_in_context_seven_after_eight_attempts() {
        let db = FakeDatabase::new();
        db.add_resolution("emp_api", 7, resolution("HR", "EMP_API"));
        let mut session = session(&db).await;

        let resolved = NameResolver::new().resolve(&mut session, "emp_api").await.unwrap();
        assert_eq!(resolved.context, 7);
        assert_eq!(resolved.owner, "HR");
        assert_eq!(resolved.object_name, "EMP_API");

        let contexts: Vec<u8> = db.resolve_attempts().into_iter().map(|(_, c)| c).collect();
        assert_eq!(contexts, (0..=7).collect::<Vec<u8>>());
    }

    #[tokio::test]
    async fn test_terminal_fault_stops_probing() {
        let db = FakeDatabase::new();
        db.fail_resolve_in(2, DbError::new("ORA-06564: object does not exist").with_code(6564));
        db.add_resolution("emp_api", 7, resolution("HR", "EMP_API"));
        let mut session = session(&db).await;

        let err = NameResolver::new().resolve(&mut session, "emp_api").await.unwrap_err();
        assert!(matches!(err, EngineError::Database(ref e) if e.code == Some(6564)));
        assert_eq!(db.resolve_attempts().len(), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_is_not_found() {
        let db = FakeDatabase::new();
        let mut session = session(&db).await;

        let err = NameResolver::new().resolve(&mut session, "ghost").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(db.resolve_attempts().len(), 10);
    }
}
