//! # Lookup Caches
//!
//! Lookup caches resolve human-entered filter values (a school name, a class
//! abbreviation, or a numeric id) to the id actually stored in the database.
//!
//! A [`LookupTable`] is loaded once at startup and is read-only afterwards.
//! Its state is explicit: `Uninitialized → Loading → Ready`. Reading a table
//! that is not `Ready` is an error, never a silent miss.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};
use std::time::Instant;

use sea_orm::{ConnectionTrait, Statement};

use crate::errors::CacheError;

/// Resolves filter input to a canonical id.
pub trait LookupCache: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Resolve a numeric id or a case-insensitive name to an id.
    ///
    /// `Ok(None)` is a miss; `Err` means the cache cannot be consulted.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NotReady`] when the cache has not been loaded.
    fn get_id(&self, input: &str) -> Result<Option<i64>, CacheError>;
}

/// Where a lookup table is loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupSource {
    pub table: &'static str,
    pub id_column: &'static str,
    /// Columns matched case-insensitively (name, abbreviation, ...)
    pub name_columns: &'static [&'static str],
    /// Optional trusted condition, e.g. `display = 1`
    pub condition: Option<&'static str>,
}

impl LookupSource {
    pub const fn new(
        table: &'static str,
        id_column: &'static str,
        name_columns: &'static [&'static str],
    ) -> Self {
        Self {
            table,
            id_column,
            name_columns,
            condition: None,
        }
    }

    #[must_use]
    pub const fn with_condition(mut self, condition: &'static str) -> Self {
        self.condition = Some(condition);
        self
    }

    fn select_sql(&self) -> String {
        let mut columns = vec![self.id_column];
        columns.extend_from_slice(self.name_columns);
        let mut sql = format!("SELECT {} FROM {}", columns.join(", "), self.table);
        if let Some(condition) = self.condition {
            sql.push_str(" WHERE ");
            sql.push_str(condition);
        }
        sql
    }
}

/// A canonical lookup row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupEntry {
    pub id: i64,
    pub names: Vec<String>,
}

impl LookupEntry {
    pub fn new<I, S>(id: i64, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

/// Observable cache state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Uninitialized,
    Loading,
    Ready,
}

#[derive(Debug, Default)]
struct LookupIndex {
    by_id: HashMap<i64, LookupEntry>,
    by_name: HashMap<String, i64>,
}

impl LookupIndex {
    fn from_entries(entries: impl IntoIterator<Item = LookupEntry>) -> Self {
        let mut index = Self::default();
        for entry in entries {
            for name in &entry.names {
                let key = name.trim().to_lowercase();
                if !key.is_empty() {
                    // First row wins on duplicate names
                    index.by_name.entry(key).or_insert(entry.id);
                }
            }
            index.by_id.insert(entry.id, entry);
        }
        index
    }

    fn resolve(&self, input: &str) -> Option<i64> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        if let Ok(id) = input.parse::<i64>() {
            return self.by_id.contains_key(&id).then_some(id);
        }
        self.by_name.get(&input.to_lowercase()).copied()
    }
}

#[derive(Debug)]
enum CacheState {
    Uninitialized,
    Loading,
    Ready(LookupIndex),
}

/// Returns a table to `Uninitialized` unless its load completed.
struct LoadingGuard<'a> {
    table: &'a LookupTable,
    completed: bool,
}

impl<'a> LoadingGuard<'a> {
    fn new(table: &'a LookupTable) -> Self {
        Self {
            table,
            completed: false,
        }
    }

    fn complete(mut self) {
        self.completed = true;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        let mut state = self.table.state.write().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, CacheState::Loading) {
            *state = CacheState::Uninitialized;
            tracing::warn!(cache = self.table.name, "lookup cache load did not complete");
        }
    }
}

/// An in-memory lookup table.
#[derive(Debug)]
pub struct LookupTable {
    name: &'static str,
    source: Option<LookupSource>,
    state: RwLock<CacheState>,
}

impl LookupTable {
    /// An uninitialized table that loads from `source`.
    pub fn new(name: &'static str, source: LookupSource) -> Self {
        Self {
            name,
            source: Some(source),
            state: RwLock::new(CacheState::Uninitialized),
        }
    }

    /// A table that is ready immediately, from static rows.
    pub fn from_entries(name: &'static str, entries: impl IntoIterator<Item = LookupEntry>) -> Self {
        Self {
            name,
            source: None,
            state: RwLock::new(CacheState::Ready(LookupIndex::from_entries(entries))),
        }
    }

    pub fn status(&self) -> CacheStatus {
        match self.state.read().as_deref() {
            Ok(CacheState::Ready(_)) => CacheStatus::Ready,
            Ok(CacheState::Loading) => CacheStatus::Loading,
            Ok(CacheState::Uninitialized) | Err(_) => CacheStatus::Uninitialized,
        }
    }

    /// Load the table from the database. A ready table is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Load`] if the query fails. The table goes back to
    /// `Uninitialized` on any failure, or if the returned future is dropped
    /// before it completes.
    pub async fn load<C: ConnectionTrait>(&self, db: &C) -> Result<usize, CacheError> {
        let Some(source) = self.source else {
            return self.len();
        };
        {
            let mut state = self.write_state()?;
            match *state {
                CacheState::Ready(ref index) => return Ok(index.by_id.len()),
                CacheState::Loading => {
                    return Err(CacheError::NotReady {
                        cache: self.name.to_string(),
                    });
                }
                CacheState::Uninitialized => *state = CacheState::Loading,
            }
        }
        let loading = LoadingGuard::new(self);

        let started = Instant::now();
        let entries = Self::fetch_entries(db, &source)
            .await
            .map_err(|source| CacheError::Load {
                cache: self.name.to_string(),
                source,
            })?;
        let index = LookupIndex::from_entries(entries);
        let count = index.by_id.len();
        *self.write_state()? = CacheState::Ready(index);
        loading.complete();

        tracing::info!(
            cache = self.name,
            rows = count,
            elapsed_ms = started.elapsed().as_millis(),
            "lookup cache initialized"
        );
        Ok(count)
    }

    async fn fetch_entries<C: ConnectionTrait>(
        db: &C,
        source: &LookupSource,
    ) -> Result<Vec<LookupEntry>, sea_orm::DbErr> {
        let statement = Statement::from_string(db.get_database_backend(), source.select_sql());
        let rows = db.query_all(statement).await?;
        rows.iter()
            .map(|row| {
                let id = row.try_get::<i64>("", source.id_column)?;
                let mut names = Vec::with_capacity(source.name_columns.len());
                for column in source.name_columns {
                    if let Some(name) = row.try_get::<Option<String>>("", column)? {
                        names.push(name);
                    }
                }
                Ok(LookupEntry { id, names })
            })
            .collect()
    }

    /// Number of rows in a ready table.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NotReady`] when the table has not been loaded.
    pub fn len(&self) -> Result<usize, CacheError> {
        let state = self.read_state()?;
        Ok(self.index(&state)?.by_id.len())
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, CacheState>, CacheError> {
        self.state.read().map_err(|_| CacheError::Poisoned {
            cache: self.name.to_string(),
        })
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, CacheState>, CacheError> {
        self.state.write().map_err(|_| CacheError::Poisoned {
            cache: self.name.to_string(),
        })
    }

    fn index<'a>(&self, state: &'a CacheState) -> Result<&'a LookupIndex, CacheError> {
        match state {
            CacheState::Ready(index) => Ok(index),
            CacheState::Uninitialized | CacheState::Loading => Err(CacheError::NotReady {
                cache: self.name.to_string(),
            }),
        }
    }
}

impl LookupCache for LookupTable {
    fn name(&self) -> &str {
        self.name
    }

    fn get_id(&self, input: &str) -> Result<Option<i64>, CacheError> {
        let state = self.read_state()?;
        Ok(self.index(&state)?.resolve(input))
    }
}
