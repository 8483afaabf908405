//! Buyer accounts.

use chrono::{DateTime, Utc};
use common::AccountId;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};
use store::{CancelSignal, PgStore, RetryPolicy, RetryingExecutor, TxOptions, sqlstate};

use crate::error::{DomainError, Result};

/// A buyer. Orders reference accounts but never own them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub name: String,
}

impl NewAccount {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }

    /// Rejects blank names and emails without an `@`.
    pub fn validate(&self) -> Result<()> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::InvalidRequest(format!(
                "invalid email address: {:?}",
                self.email
            )));
        }
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidRequest("name must not be empty".into()));
        }
        Ok(())
    }
}

/// Maps an `accounts` row.
pub fn row_to_account(row: &PgRow) -> std::result::Result<Account, sqlx::Error> {
    Ok(Account {
        id: AccountId::new(row.try_get("id")?),
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Inserts an account. A taken email is [`DomainError::AlreadyExists`].
pub async fn insert_account(conn: &mut PgConnection, account: &NewAccount) -> Result<Account> {
    let row = sqlx::query(
        r#"
        INSERT INTO accounts (email, name)
        VALUES ($1, $2)
        RETURNING id, email, name, created_at
        "#,
    )
    .bind(account.email.trim())
    .bind(account.name.trim())
    .fetch_one(conn)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.code().as_deref() == Some(sqlstate::UNIQUE_VIOLATION)
        {
            return DomainError::AlreadyExists(format!("account with email {}", account.email));
        }
        DomainError::Store(e)
    })?;

    Ok(row_to_account(&row)?)
}

/// Loads an account by id.
pub async fn fetch_account(conn: &mut PgConnection, id: AccountId) -> Result<Account> {
    let row = sqlx::query("SELECT id, email, name, created_at FROM accounts WHERE id = $1")
        .bind(id.as_i64())
        .fetch_optional(conn)
        .await?
        .ok_or(DomainError::AccountNotFound(id))?;

    Ok(row_to_account(&row)?)
}

/// Returns true if the account exists.
pub async fn account_exists(conn: &mut PgConnection, id: AccountId) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE id = $1)")
        .bind(id.as_i64())
        .fetch_one(conn)
        .await?;
    Ok(exists)
}

/// Account workflows.
#[derive(Debug, Clone)]
pub struct AccountService {
    executor: RetryingExecutor<PgStore>,
    options: TxOptions,
}

impl AccountService {
    /// Creates a service running its transactions with `options`.
    pub fn new(store: PgStore, policy: RetryPolicy, options: TxOptions) -> Self {
        Self {
            executor: RetryingExecutor::new(store, policy),
            options,
        }
    }

    /// Registers a new account.
    #[tracing::instrument(skip(self, cancel), fields(email = %account.email))]
    pub async fn create_account(
        &self,
        account: NewAccount,
        cancel: &CancelSignal,
    ) -> Result<Account> {
        account.validate()?;

        let created = self
            .executor
            .run_with_retry(self.options, cancel, |tx| {
                let account = account.clone();
                Box::pin(async move { insert_account(&mut **tx, &account).await })
            })
            .await
            .map_err(DomainError::from)?;

        tracing::info!(account_id = %created.id, "account created");
        Ok(created)
    }

    /// Loads an account by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_account(&self, id: AccountId) -> Result<Account> {
        let mut conn = self.executor.source().pool().acquire().await?;
        fetch_account(&mut conn, id).await
    }
}
