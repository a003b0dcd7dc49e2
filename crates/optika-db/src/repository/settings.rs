//! # Settings Repository
//!
//! Terminals and the loyalty program. Both are configuration the checkout
//! reads once per transaction and never writes.
//!
//! Terminal installment rates are stored as a JSON object in a TEXT column
//! (`{"3": 400, "6": 450}`), so the row needs a manual mapping step from
//! the raw TEXT into the typed `BTreeMap<u32, u32>`.

use std::collections::{BTreeMap, HashMap};

use sqlx::SqlitePool;
use tracing::warn;

use crate::error::{DbError, DbResult};
use optika_core::{LoyaltySettings, Terminal};

/// Raw terminal row before the rate map is parsed.
#[derive(Debug, sqlx::FromRow)]
struct TerminalRow {
    id: String,
    name: String,
    fee_bps: u32,
    installment_rates: String,
}

impl TerminalRow {
    fn into_terminal(self) -> DbResult<Terminal> {
        let installment_rates: BTreeMap<u32, u32> = serde_json::from_str(&self.installment_rates)
            .map_err(|e| DbError::corrupt(format!("terminal {}", self.id), e.to_string()))?;

        Ok(Terminal {
            id: self.id,
            name: self.name,
            fee_bps: self.fee_bps,
            installment_rates,
        })
    }
}

/// Repository for terminals and loyalty configuration.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Loads all active terminals, keyed by id (the shape fee resolution
    /// and commission preparation consume).
    pub async fn list_terminals(&self) -> DbResult<HashMap<String, Terminal>> {
        let rows = sqlx::query_as::<_, TerminalRow>(
            "SELECT id, name, fee_bps, installment_rates \
             FROM terminals WHERE is_active = 1",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut terminals = HashMap::with_capacity(rows.len());
        for row in rows {
            let terminal = row.into_terminal()?;
            terminals.insert(terminal.id.clone(), terminal);
        }
        Ok(terminals)
    }

    /// Inserts or replaces a terminal.
    pub async fn upsert_terminal(&self, terminal: &Terminal) -> DbResult<()> {
        let rates = serde_json::to_string(&terminal.installment_rates)
            .map_err(|e| DbError::Internal(e.to_string()))?;

        sqlx::query(
            "INSERT INTO terminals (id, name, fee_bps, installment_rates, is_active) \
             VALUES (?1, ?2, ?3, ?4, 1) \
             ON CONFLICT(id) DO UPDATE SET \
                 name = excluded.name, \
                 fee_bps = excluded.fee_bps, \
                 installment_rates = excluded.installment_rates, \
                 is_active = 1",
        )
        .bind(&terminal.id)
        .bind(&terminal.name)
        .bind(terminal.fee_bps)
        .bind(&rates)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deactivates a terminal (it disappears from checkout but stays
    /// referenced by historical payments).
    pub async fn deactivate_terminal(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE terminals SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Terminal", id));
        }
        Ok(())
    }

    /// Loads the loyalty program settings.
    ///
    /// The row is seeded by the initial migration; a missing row means a
    /// hand-edited database, so fall back to a disabled program rather
    /// than fail the checkout.
    pub async fn get_loyalty_settings(&self) -> DbResult<LoyaltySettings> {
        let settings = sqlx::query_as::<_, LoyaltySettings>(
            "SELECT enabled, global_bps, cash_bps, card_bps, transfer_bps, referral_bps \
             FROM loyalty_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        match settings {
            Some(s) => Ok(s),
            None => {
                warn!("loyalty_settings row missing, treating program as disabled");
                Ok(LoyaltySettings::disabled())
            }
        }
    }

    /// Replaces the loyalty program settings.
    pub async fn update_loyalty_settings(&self, settings: &LoyaltySettings) -> DbResult<()> {
        sqlx::query(
            "UPDATE loyalty_settings SET \
                 enabled = ?1, global_bps = ?2, cash_bps = ?3, \
                 card_bps = ?4, transfer_bps = ?5, referral_bps = ?6 \
             WHERE id = 1",
        )
        .bind(settings.enabled)
        .bind(settings.global_bps)
        .bind(settings.cash_bps)
        .bind(settings.card_bps)
        .bind(settings.transfer_bps)
        .bind(settings.referral_bps)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
