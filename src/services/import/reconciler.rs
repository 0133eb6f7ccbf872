//! Per-entity row reconciliation

use async_trait::async_trait;

use super::columns::{ColumnSpec, Row};
use super::report::RowOutcome;
use super::resolver::EntityResolver;
use crate::db::{ImportTx, StoreResult};
use crate::types::ImportKind;

/// Turns one CSV row into a create, an update or a reported skip.
///
/// Expected skips come back as `Ok` outcomes. An `Err` is either a
/// row-scoped store constraint (reported for the row) or fatal for the batch,
/// see [`crate::db::StoreError::is_row_scoped`].
#[async_trait]
pub trait RowReconciler: Send + Sync {
    fn kind(&self) -> ImportKind;

    fn columns(&self) -> &'static [ColumnSpec];

    async fn reconcile(
        &self,
        tx: &mut dyn ImportTx,
        resolver: &mut EntityResolver,
        row: &Row<'_>,
    ) -> StoreResult<RowOutcome>;
}
