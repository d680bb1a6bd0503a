//! Startup seeding for the items table.
//!
//! Runs once from the process entry point after the store connection is
//! established and before the server starts accepting traffic, so that
//! benchmark numbers are taken against a fully populated table.

use rand::Rng;
use tracing::info;

use crate::application::repos::{ItemsRepo, RepoError};
use crate::config::SeedSettings;

const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Seeding is switched off in the settings.
    Disabled,
    /// The table already held rows; nothing was inserted.
    AlreadySeeded { rows: u64 },
    /// Rows were inserted in `batches` batches.
    Seeded { rows: u64, batches: u32 },
}

/// Populate an empty items table with synthetic rows.
///
/// A non-empty table skips seeding entirely. Inserts go out in fixed-size
/// batches so no single statement carries the whole data set.
pub async fn seed_items(
    repo: &dyn ItemsRepo,
    settings: &SeedSettings,
) -> Result<SeedOutcome, RepoError> {
    if !settings.enabled {
        info!(target = "scaffale::seed", "Seeding disabled");
        return Ok(SeedOutcome::Disabled);
    }

    let existing = repo.count_items().await?;
    if existing > 0 {
        info!(
            target = "scaffale::seed",
            rows = existing,
            "Database already seeded"
        );
        return Ok(SeedOutcome::AlreadySeeded { rows: existing });
    }

    let total = settings.total;
    let batch_size = settings.batch_size.get();
    info!(
        target = "scaffale::seed",
        total, batch_size, "Seeding items table"
    );

    let mut inserted: u32 = 0;
    let mut batches: u32 = 0;
    while inserted < total {
        let len = batch_size.min(total - inserted);
        let names: Vec<String> = (0..len).map(|j| synthetic_name(inserted + j + 1)).collect();
        repo.insert_items(&names).await?;
        inserted += len;
        batches += 1;
        info!(target = "scaffale::seed", inserted, total, "Inserted batch");
    }

    info!(
        target = "scaffale::seed",
        rows = inserted,
        batches,
        "Seed complete"
    );
    Ok(SeedOutcome::Seeded {
        rows: u64::from(inserted),
        batches,
    })
}

/// `Item #<n> - <suffix>` with a random six-character base36 suffix.
fn synthetic_name(n: u32) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("Item #{n} - {suffix}")
}
