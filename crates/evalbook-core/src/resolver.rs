//! Idempotent get-or-create over any record kind.
//!
//! The lookup and the insert run in one IMMEDIATE transaction on the store's
//! connection, so two callers racing on the same search criteria cannot both
//! miss and both insert. Other writers to the same file (another process
//! bypassing the resolver) are not covered by this; the tables carry no
//! uniqueness constraint over arbitrary search criteria.

use crate::errors::Result;
use crate::model::{Column, FieldSet, Record};
use crate::storage::store::{find_one_by, insert_row, update_row};
use crate::storage::Store;
use chrono::Utc;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Overwrite fill fields on an existing row.
    pub update: bool,
    /// Let empty fill values (empty string, JSON null) clear a field instead
    /// of being skipped.
    pub allow_null: bool,
}

impl ResolveOptions {
    pub fn update() -> Self {
        Self {
            update: true,
            allow_null: false,
        }
    }

    pub fn allow_null(mut self) -> Self {
        self.allow_null = true;
        self
    }
}

/// Returns the single row matching `search`, creating it from
/// `search ∪ fill` when none exists.
///
/// With `opts.update`, an existing row gets every fill field written over it.
/// Fails with `AmbiguousMatch` when `search` matches several rows and with
/// `Validation` when a required column is in neither field set.
pub fn get_or_create<R: Record>(
    store: &Store,
    search: &R::Fields,
    fill: &R::Fields,
    opts: ResolveOptions,
) -> Result<R> {
    let search = search.columns()?;
    let fill = fill.columns()?;
    store.transaction(|conn| resolve_in::<R>(conn, &search, &fill, opts))
}

pub fn update_or_create<R: Record>(
    store: &Store,
    search: &R::Fields,
    fill: &R::Fields,
    allow_null: bool,
) -> Result<R> {
    let opts = ResolveOptions {
        update: true,
        allow_null,
    };
    get_or_create(store, search, fill, opts)
}

pub(crate) fn resolve_in<R: Record>(
    conn: &Connection,
    search: &[Column],
    fill: &[Column],
    opts: ResolveOptions,
) -> Result<R> {
    let Some(existing) = find_one_by::<R>(conn, search)? else {
        let now = Utc::now();
        let created: R = insert_row(conn, &merge(search, fill), now, now)?;
        tracing::debug!(
            event = "evalbook.resolve.created",
            kind = %R::KIND,
            id = created.id()
        );
        return Ok(created);
    };

    if !opts.update {
        return Ok(existing);
    }

    let changes: Vec<Column> = fill
        .iter()
        .filter(|c| opts.allow_null || !c.empty)
        .cloned()
        .collect();
    if changes.is_empty() {
        return Ok(existing);
    }

    let updated: R = update_row(conn, existing.id(), &changes, Utc::now())?;
    tracing::debug!(
        event = "evalbook.resolve.updated",
        kind = %R::KIND,
        id = updated.id(),
        fields = changes.len()
    );
    Ok(updated)
}

/// Fill values win over search values naming the same column.
fn merge(search: &[Column], fill: &[Column]) -> Vec<Column> {
    let mut out: Vec<Column> = search
        .iter()
        .filter(|s| !fill.iter().any(|f| f.name == s.name))
        .cloned()
        .collect();
    out.extend(fill.iter().cloned());
    out
}
