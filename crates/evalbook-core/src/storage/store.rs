use crate::errors::{Result, StoreError};
use crate::model::{
    describe_columns, BelongsTo, Collects, Column, EntityKind, FieldSet, HasMany, Membership,
    Record,
};
use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// SQLite-backed record store. Cloning shares the connection.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub models: u64,
    pub problem_sets: u64,
    pub problems: u64,
    pub submission_sets: u64,
    pub submissions: u64,
    pub evaluation_sets: u64,
    pub evaluations: u64,
    pub version: Option<i64>,
}

impl Store {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create db directory {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open sqlite db {}", path.display()))?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        tracing::debug!(event = "evalbook.store.opened", path = %path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn init_schema(&self) -> Result<()> {
        let conn = self.lock();
        conn.execute_batch(crate::storage::schema::DDL)?;
        migrate_v3(&conn)?;
        conn.pragma_update(None, "user_version", crate::storage::schema::SCHEMA_VERSION)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-statement leaves nothing half-applied outside a transaction.
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs `f` inside one IMMEDIATE transaction while holding the connection.
    ///
    /// The write lock is taken up front, so a read-then-insert inside `f`
    /// cannot interleave with another writer.
    pub fn transaction<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    pub fn get<R: Record>(&self, id: i64) -> Result<R> {
        let conn = self.lock();
        select_by_id(&conn, id)
    }

    pub fn find_one<R: Record>(&self, criteria: &R::Fields) -> Result<Option<R>> {
        let conn = self.lock();
        find_one_by(&conn, &criteria.columns()?)
    }

    pub fn find_all<R: Record>(&self, criteria: &R::Fields) -> Result<Vec<R>> {
        let conn = self.lock();
        find_rows(&conn, &criteria.columns()?, None)
    }

    pub fn insert<R: Record>(&self, fields: &R::Fields) -> Result<R> {
        let conn = self.lock();
        let now = Utc::now();
        insert_row(&conn, &fields.columns()?, now, now)
    }

    pub fn update<R: Record>(&self, id: i64, fields: &R::Fields) -> Result<R> {
        let conn = self.lock();
        update_row(&conn, id, &fields.columns()?, Utc::now())
    }

    /// Follows a singular parent edge. A missing parent is an integrity error.
    pub fn parent<C, P>(&self, child: &C) -> Result<P>
    where
        C: BelongsTo<P>,
        P: Record,
    {
        let conn = self.lock();
        select_parent(&conn, child)
    }

    /// Child rows in primary-key order.
    pub fn children<P, C>(&self, parent: &P) -> Result<Vec<C>>
    where
        P: HasMany<C>,
        C: Record,
    {
        let conn = self.lock();
        find_rows(&conn, &[Column::integer(P::FOREIGN_KEY, parent.id())], None)
    }

    /// Adds `member` to `set`'s association table. Returns false when the
    /// pair was already present.
    pub fn link<S, M>(&self, set: &S, member: &M) -> Result<bool>
    where
        S: Collects<M>,
        M: Record,
    {
        let conn = self.lock();
        link_pair::<S, M>(&conn, set.id(), member.id())
    }

    /// Association-table members in member-id order.
    pub fn linked<S, M>(&self, set: &S) -> Result<Vec<M>>
    where
        S: Collects<M>,
        M: Record,
    {
        let conn = self.lock();
        select_linked::<S, M>(&conn, set.id())
    }

    /// Owned members first, then linked members not already owned.
    pub fn members<S, M>(&self, set: &S, membership: Membership) -> Result<Vec<M>>
    where
        S: Collects<M>,
        M: Record,
    {
        let mut out: Vec<M> = self.children(set)?;
        if membership == Membership::OwnedAndLinked {
            let mut seen: HashSet<i64> = out.iter().map(|m| m.id()).collect();
            for m in self.linked(set)? {
                if seen.insert(m.id()) {
                    out.push(m);
                }
            }
        }
        Ok(out)
    }

    /// Number of rows `members` would return, counted in SQL.
    pub fn member_count<S, M>(&self, set: &S, membership: Membership) -> Result<u64>
    where
        S: Collects<M>,
        M: Record,
    {
        let conn = self.lock();
        let mut sql = format!(
            "SELECT COUNT(*) FROM {} m WHERE m.{} = ?1",
            M::KIND.table(),
            <S as HasMany<M>>::FOREIGN_KEY
        );
        if membership == Membership::OwnedAndLinked {
            sql.push_str(&format!(
                " OR m.id IN (SELECT {} FROM {} WHERE {} = ?1)",
                S::MEMBER_COLUMN,
                S::LINK_TABLE,
                S::SET_COLUMN
            ));
        }
        let n: i64 = conn.query_row(&sql, params![set.id()], |r| r.get(0))?;
        Ok(n as u64)
    }

    pub fn count<R: Record>(&self) -> Result<u64> {
        let conn = self.lock();
        count_rows(&conn, R::KIND)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.lock();
        let version: Option<i64> = conn
            .query_row("PRAGMA user_version", [], |r| r.get(0))
            .optional()?;
        Ok(StoreStats {
            models: count_rows(&conn, EntityKind::Model)?,
            problem_sets: count_rows(&conn, EntityKind::ProblemSet)?,
            problems: count_rows(&conn, EntityKind::Problem)?,
            submission_sets: count_rows(&conn, EntityKind::SubmissionSet)?,
            submissions: count_rows(&conn, EntityKind::Submission)?,
            evaluation_sets: count_rows(&conn, EntityKind::EvaluationSet)?,
            evaluations: count_rows(&conn, EntityKind::Evaluation)?,
            version,
        })
    }
}

// ---------------------------------------------------------------------------
// Connection-level operations, shared by the store and by transactional callers
// ---------------------------------------------------------------------------

fn select_list<R: Record>(prefix: &str) -> String {
    ["id", "created_at", "updated_at"]
        .iter()
        .chain(R::COLUMNS.iter())
        .map(|c| format!("{prefix}{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn sql_timestamp(t: DateTime<Utc>) -> SqlValue {
    SqlValue::Text(t.to_rfc3339_opts(SecondsFormat::Micros, true))
}

pub(crate) fn select_by_id<R: Record>(conn: &Connection, id: i64) -> Result<R> {
    let sql = format!(
        "SELECT {} FROM {} WHERE id = ?1",
        select_list::<R>(""),
        R::KIND.table()
    );
    conn.query_row(&sql, params![id], R::from_row)
        .optional()?
        .ok_or(StoreError::NotFound { kind: R::KIND, id })
}

pub(crate) fn select_parent<C, P>(conn: &Connection, child: &C) -> Result<P>
where
    C: BelongsTo<P>,
    P: Record,
{
    select_by_id(conn, child.parent_id()).map_err(|e| match e {
        StoreError::NotFound { .. } => StoreError::Integrity {
            kind: C::KIND,
            id: child.id(),
            relation: C::RELATION,
        },
        other => other,
    })
}

/// Exact-match lookup. `IS` makes a null criterion match a null column.
pub(crate) fn find_rows<R: Record>(
    conn: &Connection,
    criteria: &[Column],
    limit: Option<usize>,
) -> Result<Vec<R>> {
    let mut sql = format!(
        "SELECT {} FROM {}",
        select_list::<R>(""),
        R::KIND.table()
    );
    if !criteria.is_empty() {
        let clauses: Vec<String> = criteria
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} IS ?{}", c.name, i + 1))
            .collect();
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY id ASC");
    if let Some(n) = limit {
        sql.push_str(&format!(" LIMIT {n}"));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        rusqlite::params_from_iter(criteria.iter().map(|c| &c.value)),
        R::from_row,
    )?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub(crate) fn find_one_by<R: Record>(conn: &Connection, criteria: &[Column]) -> Result<Option<R>> {
    let mut rows = find_rows::<R>(conn, criteria, Some(2))?;
    if rows.len() > 1 {
        return Err(StoreError::AmbiguousMatch {
            kind: R::KIND,
            criteria: describe_columns(criteria),
        });
    }
    Ok(rows.pop())
}

pub(crate) fn insert_row<R: Record>(
    conn: &Connection,
    cols: &[Column],
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Result<R> {
    if let Some(field) = R::REQUIRED
        .iter()
        .find(|req| !cols.iter().any(|c| c.name == **req))
    {
        return Err(StoreError::Validation {
            kind: R::KIND,
            field: *field,
        });
    }

    let mut names = vec!["created_at", "updated_at"];
    let mut values = vec![sql_timestamp(created_at), sql_timestamp(updated_at)];
    for c in cols {
        names.push(c.name);
        values.push(c.value.clone());
    }
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        R::KIND.table(),
        names.join(", "),
        placeholders.join(", ")
    );
    conn.execute(&sql, rusqlite::params_from_iter(values.iter()))?;

    select_by_id(conn, conn.last_insert_rowid())
}

pub(crate) fn update_row<R: Record>(
    conn: &Connection,
    id: i64,
    cols: &[Column],
    updated_at: DateTime<Utc>,
) -> Result<R> {
    let mut sets: Vec<String> = Vec::new();
    let mut values: Vec<SqlValue> = Vec::new();
    for c in cols {
        values.push(c.value.clone());
        sets.push(format!("{} = ?{}", c.name, values.len()));
    }
    values.push(sql_timestamp(updated_at));
    sets.push(format!("updated_at = ?{}", values.len()));
    values.push(SqlValue::Integer(id));

    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?{}",
        R::KIND.table(),
        sets.join(", "),
        values.len()
    );
    let changed = conn.execute(&sql, rusqlite::params_from_iter(values.iter()))?;
    if changed == 0 {
        return Err(StoreError::NotFound { kind: R::KIND, id });
    }

    select_by_id(conn, id)
}

pub(crate) fn link_pair<S, M>(conn: &Connection, set_id: i64, member_id: i64) -> Result<bool>
where
    S: Collects<M>,
    M: Record,
{
    let sql = format!(
        "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?1, ?2)",
        S::LINK_TABLE,
        S::SET_COLUMN,
        S::MEMBER_COLUMN
    );
    let inserted = conn.execute(&sql, params![set_id, member_id])?;
    Ok(inserted == 1)
}

fn select_linked<S, M>(conn: &Connection, set_id: i64) -> Result<Vec<M>>
where
    S: Collects<M>,
    M: Record,
{
    let sql = format!(
        "SELECT {} FROM {} m JOIN {} l ON l.{} = m.id WHERE l.{} = ?1 ORDER BY m.id ASC",
        select_list::<M>("m."),
        M::KIND.table(),
        S::LINK_TABLE,
        S::MEMBER_COLUMN,
        S::SET_COLUMN
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![set_id], M::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn count_rows(conn: &Connection, kind: EntityKind) -> Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
    let n: i64 = conn.query_row(&sql, [], |r| r.get(0))?;
    Ok(n as u64)
}

// v3: models and the run/grading sets gained is_example; older files only
// carry name/notes there.
fn migrate_v3(conn: &Connection) -> Result<()> {
    for table in ["models", "submission_sets", "evaluation_sets"] {
        let cols = get_columns(conn, table)?;
        add_column_if_missing(conn, &cols, table, "is_example", "INTEGER NOT NULL DEFAULT 0")?;
    }
    Ok(())
}

fn get_columns(conn: &Connection, table: &str) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    let mut out = HashSet::new();
    for r in rows {
        out.insert(r?);
    }
    Ok(out)
}

fn add_column_if_missing(
    conn: &Connection,
    cols: &HashSet<String>,
    table: &str,
    col: &str,
    ty: &str,
) -> Result<()> {
    if !cols.contains(col) {
        let sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, col, ty);
        conn.execute(&sql, [])?;
        tracing::info!(event = "evalbook.store.migrated", table, column = col);
    }
    Ok(())
}
