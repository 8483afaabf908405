use std::str::FromStr;

use thiserror::Error;

/// Consistency guarantee requested from the store for one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IsolationLevel {
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    /// Returns the SQL spelling of the level.
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

impl std::fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

/// Error returned when parsing an unknown isolation level name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown isolation level: {0}")]
pub struct ParseIsolationLevelError(String);

impl FromStr for IsolationLevel {
    type Err = ParseIsolationLevelError;

    /// Accepts `read_committed`, `READ COMMITTED`, `repeatable-read`, etc.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "read_committed" => Ok(IsolationLevel::ReadCommitted),
            "repeatable_read" => Ok(IsolationLevel::RepeatableRead),
            "serializable" => Ok(IsolationLevel::Serializable),
            _ => Err(ParseIsolationLevelError(s.to_string())),
        }
    }
}

/// Options for beginning a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxOptions {
    pub isolation: IsolationLevel,
    pub read_only: bool,
}

impl TxOptions {
    /// Creates read-write options at the given isolation level.
    pub fn new(isolation: IsolationLevel) -> Self {
        Self {
            isolation,
            read_only: false,
        }
    }

    /// Creates read-write options at the strictest isolation level.
    pub fn serializable() -> Self {
        Self::new(IsolationLevel::Serializable)
    }

    /// Marks the transaction read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Returns the statement that applies these options to a freshly begun
    /// transaction. Must run before any other statement in it.
    pub fn set_transaction_sql(&self) -> String {
        let access = if self.read_only {
            "READ ONLY"
        } else {
            "READ WRITE"
        };
        format!(
            "SET TRANSACTION ISOLATION LEVEL {} {}",
            self.isolation.as_sql(),
            access
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_read_committed_read_write() {
        let options = TxOptions::default();
        assert_eq!(options.isolation, IsolationLevel::ReadCommitted);
        assert!(!options.read_only);
    }

    #[test]
    fn test_set_transaction_sql_includes_level_and_access_mode() {
        assert_eq!(
            TxOptions::serializable().set_transaction_sql(),
            "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE READ WRITE"
        );
        assert_eq!(
            TxOptions::new(IsolationLevel::RepeatableRead)
                .read_only()
                .set_transaction_sql(),
            "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY"
        );
    }

    #[test]
    fn test_parses_common_spellings() {
        assert_eq!(
            "read_committed".parse::<IsolationLevel>().unwrap(),
            IsolationLevel::ReadCommitted
        );
        assert_eq!(
            "REPEATABLE READ".parse::<IsolationLevel>().unwrap(),
            IsolationLevel::RepeatableRead
        );
        assert_eq!(
            " Serializable ".parse::<IsolationLevel>().unwrap(),
            IsolationLevel::Serializable
        );
        assert_eq!(
            "repeatable-read".parse::<IsolationLevel>().unwrap(),
            IsolationLevel::RepeatableRead
        );
    }

    #[test]
    fn test_rejects_unknown_level() {
        let err = "snapshot".parse::<IsolationLevel>().unwrap_err();
        assert_eq!(err.to_string(), "unknown isolation level: snapshot");
    }
}
