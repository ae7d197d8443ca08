//! Persistent record of sent notifications and last declared versions

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[cfg(test)]
use mockall::automock;

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::version::error::LedgerError;
use crate::version::semver::{SemanticVersion, parse_version};

/// Trait for the notification ledger backing store
#[cfg_attr(test, automock)]
pub trait NotificationStore: Send + Sync + 'static {
    /// True iff a notification for this exact (dependency, version) pair was sent
    fn has_notified(&self, dependency: &str, version: &SemanticVersion)
    -> Result<bool, LedgerError>;

    /// Mark the pair as notified. Recording the same pair again is a no-op.
    fn record_notified(
        &self,
        dependency: &str,
        version: &SemanticVersion,
    ) -> Result<(), LedgerError>;

    /// Last declared version observed for a dependency across all manifests
    fn get_declared_version(
        &self,
        dependency: &str,
    ) -> Result<Option<SemanticVersion>, LedgerError>;

    /// Store the declared version for a dependency (last write wins)
    fn set_declared_version(
        &self,
        dependency: &str,
        version: &SemanticVersion,
    ) -> Result<(), LedgerError>;

    /// Versions already notified for a dependency, oldest first
    fn notified_versions(&self, dependency: &str) -> Result<Vec<String>, LedgerError>;
}

/// Schema migrations
/// Each version contains a list of SQL statements to execute
const MIGRATIONS: &[&[&str]] = &[
    // v1: index for per-dependency history lookups
    &["CREATE INDEX IF NOT EXISTS idx_notifications_dependency ON notifications(dependency)"],
];

pub struct Ledger {
    conn: Mutex<Connection>,
}

impl Ledger {
    pub fn new(db_path: &Path) -> Result<Self, LedgerError> {
        info!("Opening notification ledger at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        // Enable WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        debug!("Database connection established");

        let ledger = Self {
            conn: Mutex::new(conn),
        };

        ledger.create_schema()?;
        info!("Ledger initialized successfully");

        Ok(ledger)
    }

    /// Acquire database connection lock with proper error handling
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, LedgerError> {
        self.conn.lock().map_err(|_| LedgerError::LockPoisoned)
    }

    fn current_timestamp_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn create_schema(&self) -> Result<(), LedgerError> {
        debug!("Creating database schema");

        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS notifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                dependency TEXT NOT NULL,
                version TEXT NOT NULL,
                notified_at INTEGER NOT NULL,
                UNIQUE(dependency, version)
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS declared_versions (
                dependency TEXT PRIMARY KEY,
                version TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        Self::apply_migrations(&conn)?;

        debug!("Database schema created successfully");
        Ok(())
    }

    /// Apply pending migrations based on user_version pragma
    fn apply_migrations(conn: &Connection) -> Result<(), LedgerError> {
        let current_version: i32 =
            conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        for (i, statements) in MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i32;
            if version > current_version {
                for sql in *statements {
                    conn.execute(sql, [])?;
                }
                debug!("Applied migration v{}", version);
            }
        }

        let target_version = MIGRATIONS.len() as i32;
        if target_version > current_version {
            conn.pragma_update(None, "user_version", target_version)?;
            debug!("Updated schema version to v{}", target_version);
        }

        Ok(())
    }
}

impl NotificationStore for Ledger {
    fn has_notified(
        &self,
        dependency: &str,
        version: &SemanticVersion,
    ) -> Result<bool, LedgerError> {
        let conn = self.lock_conn()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM notifications WHERE dependency = ?1 AND version = ?2)",
            (dependency, version.to_string()),
            |row| row.get(0),
        )?;

        Ok(exists)
    }

    fn record_notified(
        &self,
        dependency: &str,
        version: &SemanticVersion,
    ) -> Result<(), LedgerError> {
        let conn = self.lock_conn()?;
        let inserted = conn.execute(
            r#"
            INSERT INTO notifications (dependency, version, notified_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(dependency, version) DO NOTHING
            "#,
            (dependency, version.to_string(), Self::current_timestamp_ms()),
        )?;

        if inserted == 0 {
            debug!("{}@{} already recorded as notified", dependency, version);
        }

        Ok(())
    }

    fn get_declared_version(
        &self,
        dependency: &str,
    ) -> Result<Option<SemanticVersion>, LedgerError> {
        let conn = self.lock_conn()?;
        let stored: Option<String> = conn
            .query_row(
                "SELECT version FROM declared_versions WHERE dependency = ?1",
                [dependency],
                |row| row.get(0),
            )
            .optional()?;

        stored
            .map(|v| parse_version(&v).map_err(|_| LedgerError::InvalidVersion(v)))
            .transpose()
    }

    fn set_declared_version(
        &self,
        dependency: &str,
        version: &SemanticVersion,
    ) -> Result<(), LedgerError> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT INTO declared_versions (dependency, version, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(dependency) DO UPDATE SET
                version = excluded.version,
                updated_at = excluded.updated_at
            "#,
            (dependency, version.to_string(), Self::current_timestamp_ms()),
        )?;

        Ok(())
    }

    fn notified_versions(&self, dependency: &str) -> Result<Vec<String>, LedgerError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT version FROM notifications WHERE dependency = ?1 ORDER BY notified_at, id",
        )?;

        let versions = stmt
            .query_map([dependency], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn create_test_ledger() -> (TempDir, Ledger) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let ledger = Ledger::new(&db_path).unwrap();
        (temp_dir, ledger)
    }

    #[test]
    fn has_notified_returns_false_for_unknown_pair() {
        let (_temp_dir, ledger) = create_test_ledger();

        let result = ledger
            .has_notified("react", &SemanticVersion::new(18, 0, 0))
            .unwrap();

        assert!(!result);
    }

    #[test]
    fn record_notified_is_idempotent() {
        let (_temp_dir, ledger) = create_test_ledger();
        let version = SemanticVersion::new(18, 0, 0);

        ledger.record_notified("react", &version).unwrap();
        ledger.record_notified("react", &version).unwrap();

        assert!(ledger.has_notified("react", &version).unwrap());
        assert_eq!(ledger.notified_versions("react").unwrap(), vec!["18.0.0"]);
    }

    #[rstest]
    #[case("react", SemanticVersion::new(18, 0, 0), true)]
    #[case("react", SemanticVersion::new(18, 0, 1), false)]
    #[case("react-dom", SemanticVersion::new(18, 0, 0), false)]
    fn has_notified_matches_exact_pair_only(
        #[case] dependency: &str,
        #[case] version: SemanticVersion,
        #[case] expected: bool,
    ) {
        let (_temp_dir, ledger) = create_test_ledger();
        ledger
            .record_notified("react", &SemanticVersion::new(18, 0, 0))
            .unwrap();

        assert_eq!(ledger.has_notified(dependency, &version).unwrap(), expected);
    }

    #[test]
    fn notifications_survive_reopening_the_database() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let version = SemanticVersion::new(5, 0, 0);

        {
            let ledger = Ledger::new(&db_path).unwrap();
            ledger.record_notified("webpack", &version).unwrap();
        }

        let reopened = Ledger::new(&db_path).unwrap();
        assert!(reopened.has_notified("webpack", &version).unwrap());
    }

    #[test]
    fn get_declared_version_returns_none_when_never_set() {
        let (_temp_dir, ledger) = create_test_ledger();

        assert_eq!(ledger.get_declared_version("lodash").unwrap(), None);
    }

    #[test]
    fn set_declared_version_last_write_wins() {
        let (_temp_dir, ledger) = create_test_ledger();

        ledger
            .set_declared_version("lodash", &SemanticVersion::new(4, 17, 0))
            .unwrap();
        ledger
            .set_declared_version("lodash", &SemanticVersion::new(3, 10, 1))
            .unwrap();

        assert_eq!(
            ledger.get_declared_version("lodash").unwrap(),
            Some(SemanticVersion::new(3, 10, 1))
        );
    }

    #[test]
    fn notified_versions_lists_versions_in_recording_order() {
        let (_temp_dir, ledger) = create_test_ledger();

        ledger
            .record_notified("eslint", &SemanticVersion::new(8, 0, 0))
            .unwrap();
        ledger
            .record_notified("eslint", &SemanticVersion::new(9, 0, 0))
            .unwrap();
        ledger
            .record_notified("prettier", &SemanticVersion::new(3, 0, 0))
            .unwrap();

        assert_eq!(
            ledger.notified_versions("eslint").unwrap(),
            vec!["8.0.0", "9.0.0"]
        );
    }

    #[test]
    fn new_sets_schema_version() {
        let (_temp_dir, ledger) = create_test_ledger();
        let conn = ledger.lock_conn().unwrap();

        let version: i32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();

        assert_eq!(version, MIGRATIONS.len() as i32);
    }
}
