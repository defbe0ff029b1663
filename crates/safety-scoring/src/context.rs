//! Process-wide scoring context with atomic reload
//!
//! A [`ScoringContext`] bundles the grid index and the model loaded together.
//! Handlers hold a [`SharedContext`] and take an `Arc` snapshot per request;
//! a reload builds a complete new context and swaps the pointer, so a request
//! sees either the old or the new table/model, never a mix.

use crate::engine::ScoringEngine;
use crate::model::ScoreModel;
use crate::{Result, ScoringError};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use safety_grid::{GridError, GridIndex};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Where the context loads from
#[derive(Debug, Clone)]
pub struct ContextPaths {
    pub model: PathBuf,
    pub table: PathBuf,
}

/// Outcome of a context load
#[derive(Debug, Clone, Serialize)]
pub struct ContextStatus {
    pub model_loaded: bool,
    pub table_loaded: bool,
    pub cells: usize,
    pub loaded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_error: Option<String>,
}

/// Immutable model + table snapshot
#[derive(Debug)]
pub struct ScoringContext {
    engine: ScoringEngine,
    status: ContextStatus,
}

impl ScoringContext {
    /// Build from already-loaded parts
    pub fn new(model: Option<ScoreModel>, index: GridIndex) -> Self {
        let status = ContextStatus {
            model_loaded: model.is_some(),
            table_loaded: index.has_table(),
            cells: index.cell_count(),
            loaded_at: Utc::now(),
            model_error: None,
            table_error: None,
        };
        Self {
            engine: ScoringEngine::new(model, index),
            status,
        }
    }

    /// Load model and table from disk.
    ///
    /// Never fails: a missing/broken model leaves `model_loaded = false` and
    /// scoring returns `ModelUnavailable`; a missing/broken table leaves an
    /// empty index (all-zero features).
    pub fn load(paths: &ContextPaths) -> Self {
        let (model, model_error) = match ScoreModel::load(&paths.model) {
            Ok(m) => (Some(m), None),
            Err(e) => {
                error!("Safety model unavailable ({:?}): {}", paths.model, e);
                (None, Some(e.to_string()))
            }
        };

        let (index, table_error) = match GridIndex::load(&paths.table) {
            Ok(index) => (index, None),
            Err(GridError::TableUnavailable(path)) => {
                warn!("{:?} not found, scoring every cell on zero features", path);
                (GridIndex::empty(), Some(format!("{} not found", path.display())))
            }
            Err(e) => {
                warn!("Feature table unreadable, scoring on zero features: {}", e);
                (GridIndex::empty(), Some(e.to_string()))
            }
        };

        let mut ctx = Self::new(model, index);
        ctx.status.model_error = model_error;
        ctx.status.table_error = table_error;

        info!(
            "Scoring context loaded: model={} table={} cells={}",
            ctx.status.model_loaded, ctx.status.table_loaded, ctx.status.cells
        );
        ctx
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub fn status(&self) -> &ContextStatus {
        &self.status
    }

    pub fn is_ready(&self) -> bool {
        self.status.model_loaded
    }
}

/// Shared handle to the current [`ScoringContext`]
#[derive(Clone)]
pub struct SharedContext {
    current: Arc<RwLock<Arc<ScoringContext>>>,
    paths: Option<ContextPaths>,
}

impl SharedContext {
    /// Load from disk and remember the paths for `reload`
    pub fn load(paths: ContextPaths) -> Self {
        let ctx = ScoringContext::load(&paths);
        Self {
            current: Arc::new(RwLock::new(Arc::new(ctx))),
            paths: Some(paths),
        }
    }

    /// Wrap an in-memory context; `reload` is unavailable
    pub fn from_context(ctx: ScoringContext) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(ctx))),
            paths: None,
        }
    }

    /// Snapshot for one request; the lock is released before returning
    pub fn current(&self) -> Arc<ScoringContext> {
        Arc::clone(&self.current.read())
    }

    /// Publish a new context, returning the previous one
    pub fn replace(&self, ctx: ScoringContext) -> Arc<ScoringContext> {
        std::mem::replace(&mut *self.current.write(), Arc::new(ctx))
    }

    /// Reload from the paths the context was first loaded from.
    ///
    /// The new context is published only if its model loaded; otherwise the
    /// running context is kept and the load error is returned.
    pub fn reload(&self) -> Result<ContextStatus> {
        let paths = self
            .paths
            .as_ref()
            .ok_or_else(|| ScoringError::Model("context was not loaded from disk".to_string()))?;

        let ctx = ScoringContext::load(paths);
        if !ctx.is_ready() {
            let reason = ctx
                .status
                .model_error
                .clone()
                .unwrap_or_else(|| "model not loaded".to_string());
            warn!("Reload rejected, keeping current context: {}", reason);
            return Err(ScoringError::Model(reason));
        }

        let status = ctx.status.clone();
        self.replace(ctx);
        info!("Scoring context reloaded ({} cells)", status.cells);
        Ok(status)
    }
}
