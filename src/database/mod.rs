//! The project database session.
//!
//! [`ProjectDatabase`] owns the SQLite connection every record reads from and
//! writes to. It creates the record tables on open, runs nested transactions
//! as one, and applies the configured concurrency policy on save.

pub mod schema;

use std::cell::Cell;
use std::path::Path;

use log::{debug, info, warn};
use rusqlite::{Connection, OpenFlags, ToSql, named_params};
use uuid::Uuid;

use crate::config::{ConcurrencyPolicy, ProjectConfig};
use crate::errors::{ProjectError, ProjectResult};
use crate::record::{Record, RemovedRecord, RowValues, TableSchema};
use crate::records::{DataPointRecord, FileReferenceRecord, MeasureRecord};

/// Named parameters of a statement.
pub type NamedParams<'a> = &'a [(&'a str, &'a dyn ToSql)];

/// An open project database.
pub struct ProjectDatabase {
    connection: Connection,
    config: ProjectConfig,
    transaction_depth: Cell<u32>,
}

impl std::fmt::Debug for ProjectDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectDatabase")
            .field("path", &self.config.path)
            .field("transaction_depth", &self.transaction_depth.get())
            .finish()
    }
}

impl ProjectDatabase {
    /// Open (and if needed create) the database described by `config`.
    pub fn open(config: ProjectConfig) -> ProjectResult<Self> {
        let connection = match &config.path {
            Some(path) => {
                let mut flags = OpenFlags::default();
                if !config.create_if_missing {
                    flags.remove(OpenFlags::SQLITE_OPEN_CREATE);
                }
                Connection::open_with_flags(path, flags)?
            }
            None => Connection::open_in_memory()?,
        };

        let database = Self {
            connection,
            config,
            transaction_depth: Cell::new(0),
        };
        database.transaction(schema::initialize)?;

        info!(
            target: database.log_target(),
            "Opened project database {}",
            database
                .config
                .path
                .as_deref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| String::from(":memory:"))
        );
        Ok(database)
    }

    /// Open the database file at `path`, creating it if missing.
    pub fn open_path<P: AsRef<Path>>(path: P) -> ProjectResult<Self> {
        Self::open(ProjectConfig::new(path.as_ref()))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> ProjectResult<Self> {
        Self::open(ProjectConfig::in_memory())
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn log_target(&self) -> &str {
        &self.config.log_target
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction_depth.get() > 0
    }

    /// Run `f` inside a transaction.
    ///
    /// Nested calls join the outermost transaction; only the outermost call
    /// commits. An error from `f`, or a failed commit, rolls the outermost
    /// transaction back.
    pub fn transaction<T, F>(&self, f: F) -> ProjectResult<T>
    where
        F: FnOnce(&Self) -> ProjectResult<T>,
    {
        let depth = self.transaction_depth.get();
        if depth > 0 {
            self.transaction_depth.set(depth + 1);
            let result = f(self);
            self.transaction_depth.set(depth);
            return result;
        }

        self.connection.execute_batch("BEGIN")?;
        self.transaction_depth.set(1);
        let result = f(self);
        self.transaction_depth.set(0);

        match result {
            Ok(value) => match self.connection.execute_batch("COMMIT") {
                Ok(()) => Ok(value),
                Err(commit) => {
                    // A failed COMMIT leaves the transaction open
                    if let Err(rollback) = self.connection.execute_batch("ROLLBACK") {
                        warn!(target: self.log_target(), "Rollback after failed commit failed: {rollback}");
                    }
                    debug!(target: self.log_target(), "Commit failed, rolled back: {commit}");
                    Err(commit.into())
                }
            },
            Err(e) => {
                if let Err(rollback) = self.connection.execute_batch("ROLLBACK") {
                    warn!(target: self.log_target(), "Rollback failed: {rollback}");
                }
                debug!(target: self.log_target(), "Rolled back transaction: {e}");
                Err(e)
            }
        }
    }

    /// Persist the working copy of `record` and checkpoint it as committed.
    ///
    /// Under [`ConcurrencyPolicy::RejectStale`] the save is refused when the
    /// stored row changed since `record` last committed.
    pub fn save_record<R: Record>(&self, record: &mut R) -> ProjectResult<()> {
        self.transaction(|db| {
            if db.config.concurrency_policy == ConcurrencyPolicy::RejectStale && record.is_stale(db)? {
                warn!(
                    target: db.log_target(),
                    "Refusing to overwrite {} row {} changed by another writer",
                    record.database_table_name(),
                    record.id()
                );
                return Err(ProjectError::StaleRecord {
                    table: record.database_table_name(),
                    id: record.id(),
                });
            }
            record.save_row(db)
        })?;
        record.save_last_values();
        Ok(())
    }

    /// Rebase every stored path under `original_base` onto `new_base`.
    ///
    /// Covers file reference paths, data point directories and measure
    /// scripts. Returns the number of records changed.
    pub fn update_path_data(&self, original_base: &Path, new_base: &Path) -> ProjectResult<usize> {
        let updated = self.transaction(|db| {
            Ok(FileReferenceRecord::update_all_path_data(db, original_base, new_base)?
                + DataPointRecord::update_all_path_data(db, original_base, new_base)?
                + MeasureRecord::update_all_path_data(db, original_base, new_base)?)
        })?;
        info!(
            target: self.log_target(),
            "Relocated {updated} records from {} to {}",
            original_base.display(),
            new_base.display()
        );
        Ok(updated)
    }

    /// Id of the row in `schema`'s table whose handle is `handle`.
    pub fn find_id_by_handle(&self, schema: &TableSchema, handle: Uuid) -> ProjectResult<Option<i64>> {
        let sql = format!("SELECT id FROM {} WHERE handle=:handle", schema.table());
        let mut statement = self.connection.prepare_cached(&sql)?;
        let mut rows = statement.query(named_params! { ":handle": handle.to_string() })?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Number of rows in `schema`'s table.
    pub fn count_rows(&self, schema: &TableSchema) -> ProjectResult<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", schema.table());
        let count: i64 = self.connection.query_row(&sql, [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    pub(crate) fn insert_row(&self, schema: &TableSchema, handle: Uuid) -> ProjectResult<i64> {
        let sql = format!("INSERT INTO {} (handle) VALUES (:handle)", schema.table());
        let mut statement = self.connection.prepare_cached(&sql)?;
        statement.execute(named_params! { ":handle": handle.to_string() })?;
        Ok(self.connection.last_insert_rowid())
    }

    pub(crate) fn select_row(&self, schema: &TableSchema, id: i64) -> ProjectResult<Option<RowValues>> {
        let rows = self.select_rows(schema, Some("id=:id"), named_params! { ":id": id })?;
        Ok(rows.into_iter().next())
    }

    /// Rows of `schema`'s table matching `clause`, which may carry an
    /// `ORDER BY` after the condition.
    pub(crate) fn select_rows(
        &self,
        schema: &TableSchema,
        clause: Option<&str>,
        params: NamedParams<'_>,
    ) -> ProjectResult<Vec<RowValues>> {
        let sql = match clause {
            Some(clause) => format!("{} WHERE {clause}", schema.select_sql()),
            None => format!("{} ORDER BY id", schema.select_sql()),
        };
        let mut statement = self.connection.prepare_cached(&sql)?;
        let rows = statement.query_map(params, |row| RowValues::from_row(schema, row))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub(crate) fn delete_row(&self, schema: &TableSchema, id: i64) -> ProjectResult<usize> {
        self.delete_rows(schema, "id=:id", named_params! { ":id": id })
    }

    pub(crate) fn delete_rows(
        &self,
        schema: &TableSchema,
        clause: &str,
        params: NamedParams<'_>,
    ) -> ProjectResult<usize> {
        let sql = format!("DELETE FROM {} WHERE {clause}", schema.table());
        let mut statement = self.connection.prepare_cached(&sql)?;
        Ok(statement.execute(params)?)
    }

    /// Ids and handles of the rows of `schema`'s table matching `clause` for `:id`.
    fn select_keys(&self, schema: &TableSchema, clause: &str, id: i64) -> ProjectResult<Vec<(i64, Uuid)>> {
        let sql = format!("SELECT id, handle FROM {} WHERE {clause} ORDER BY id", schema.table());
        let mut statement = self.connection.prepare_cached(&sql)?;
        let rows = statement.query_map(named_params! { ":id": id }, |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, Option<String>>(1)?))
        })?;
        rows.map(|row| -> ProjectResult<(i64, Uuid)> {
            let (id, handle) = row?;
            let handle = handle
                .and_then(|handle| Uuid::parse_str(&handle).ok())
                .unwrap_or_else(Uuid::nil);
            Ok((id, handle))
        })
        .collect()
    }

    /// Delete every join row referencing row `id` of `table`.
    pub(crate) fn remove_links(&self, table: &str, id: i64) -> ProjectResult<Vec<RemovedRecord>> {
        let mut removed = Vec::new();
        for (join, column) in schema::linking_columns(table) {
            let clause = format!("{column}=:id");
            for (link_id, handle) in self.select_keys(join, &clause, id)? {
                self.delete_row(join, link_id)?;
                removed.push(RemovedRecord {
                    table: join.table(),
                    id: link_id,
                    handle,
                });
            }
        }
        Ok(removed)
    }

    /// Delete, depth first, every row still owned by row `id` of `table`.
    ///
    /// Reaches rows that cannot be loaded as records, which the record level
    /// cascade never sees.
    pub(crate) fn remove_owned_rows(&self, table: &str, id: i64) -> ProjectResult<Vec<RemovedRecord>> {
        let mut removed = Vec::new();
        for (owned, clause) in schema::owned_rows(table) {
            for (owned_id, handle) in self.select_keys(owned, &clause, id)? {
                removed.extend(self.remove_owned_rows(owned.table(), owned_id)?);
                removed.extend(self.remove_links(owned.table(), owned_id)?);
                self.delete_row(owned, owned_id)?;
                warn!(
                    target: self.log_target(),
                    "Removed {} row {owned_id} left behind by {table} row {id}",
                    owned.table()
                );
                removed.push(RemovedRecord {
                    table: owned.table(),
                    id: owned_id,
                    handle,
                });
            }
        }
        Ok(removed)
    }

    /// Load records through `factory`, skipping rows it rejects.
    pub(crate) fn load_records<R>(
        &self,
        schema: &TableSchema,
        clause: Option<&str>,
        params: NamedParams<'_>,
        factory: fn(&RowValues, &ProjectDatabase) -> Option<R>,
    ) -> ProjectResult<Vec<R>> {
        Ok(self
            .select_rows(schema, clause, params)?
            .iter()
            .filter_map(|row| factory(row, self))
            .collect())
    }

    /// Load the record with `id` through `factory`.
    pub(crate) fn load_record<R>(
        &self,
        schema: &TableSchema,
        id: i64,
        factory: fn(&RowValues, &ProjectDatabase) -> Option<R>,
    ) -> ProjectResult<Option<R>> {
        Ok(self
            .select_row(schema, id)?
            .and_then(|row| factory(&row, self)))
    }
}
