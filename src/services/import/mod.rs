//! Bulk CSV reconciliation
//!
//! One import call decodes the upload, opens a single transaction and walks
//! the rows in file order. Each row runs inside its own savepoint so a
//! rejected row leaves nothing behind, while every applied row is committed
//! together at the end. Only storage failures outside the row vocabulary
//! abort the batch.

pub mod cache;
pub mod columns;
pub mod device;
pub mod encoding;
pub mod error;
pub mod inspection_item;
pub mod item_name;
pub mod reconciler;
pub mod report;
pub mod resolver;

use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::db::{ImportStore, ImportTx, StoreError, StoreResult};
use crate::types::{ImportKind, ImportResponse};

use self::columns::{ColumnMap, Row};
use self::device::DeviceReconciler;
use self::inspection_item::InspectionItemReconciler;
use self::item_name::ItemNameReconciler;
use self::reconciler::RowReconciler;
use self::report::{describe_store_error, ImportReport, RowOutcome};
use self::resolver::EntityResolver;

pub use self::encoding::SourceEncoding;
pub use self::error::ImportError;

const DRY_RUN_PREFIX: &str = "[ドライラン] ";

/// One uploaded file
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub kind: ImportKind,
    pub bytes: Vec<u8>,
    /// Overrides the kind's default encoding
    pub encoding: Option<SourceEncoding>,
    /// Run every row, then roll back instead of committing
    pub dry_run: bool,
}

/// Run one import end to end
pub async fn import_csv(
    store: &dyn ImportStore,
    request: ImportRequest,
    import_id: Uuid,
) -> Result<ImportResponse, ImportError> {
    let span = info_span!("import", kind = request.kind.as_str(), %import_id);

    let reconciler: &dyn RowReconciler = match request.kind {
        ImportKind::Device => &DeviceReconciler,
        ImportKind::InspectionItem => &InspectionItemReconciler,
        ImportKind::InspectionItemName => &ItemNameReconciler,
    };

    run_import(store, reconciler, request).instrument(span).await
}

async fn run_import(
    store: &dyn ImportStore,
    reconciler: &dyn RowReconciler,
    request: ImportRequest,
) -> Result<ImportResponse, ImportError> {
    let kind = reconciler.kind();
    let declared = request.encoding.unwrap_or_else(|| kind.default_encoding());
    let parsed = encoding::read_upload(&request.bytes, declared)?;
    info!(rows = parsed.records.len(), encoding = %parsed.encoding, "File decoded");

    let columns = ColumnMap::resolve(&parsed.headers, reconciler.columns());
    let mut report = ImportReport::new(kind, parsed.records.len());
    let mut resolver = EntityResolver::default();
    let mut tx = store.begin().await.map_err(ImportError::Storage)?;

    for record in &parsed.records {
        let row = Row::new(record, &parsed.headers, &columns);
        match reconcile_row(&mut *tx, &mut resolver, reconciler, &row).await {
            Ok(outcome) => report.record(&row, outcome),
            Err(e) => {
                error!(row = row.number(), "Import aborted: {}", e);
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("Rollback after failure also failed: {}", rollback_err);
                }
                return Err(ImportError::Storage(e));
            }
        }
    }

    debug!(cached = resolver.cached_entities(), "Rows processed");

    if request.dry_run {
        tx.rollback().await.map_err(ImportError::Storage)?;
    } else if let Err(e) = tx.commit().await {
        error!("Commit failed, nothing was imported: {}", e);
        return Err(ImportError::Commit(e));
    }

    info!(imported = report.imported_rows(), dry_run = request.dry_run, "{}", report.message());

    let mut response = report.into_response();
    if request.dry_run {
        response.message.insert_str(0, DRY_RUN_PREFIX);
    }
    Ok(response)
}

/// Reconcile one row inside a savepoint. Row-scoped store errors become
/// row outcomes; anything else is returned for the batch to abort on.
async fn reconcile_row(
    tx: &mut dyn ImportTx,
    resolver: &mut EntityResolver,
    reconciler: &dyn RowReconciler,
    row: &Row<'_>,
) -> StoreResult<RowOutcome> {
    let checkpoint = resolver.checkpoint();
    tx.savepoint().await?;

    let outcome = match reconciler.reconcile(tx, resolver, row).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_row_scoped() => {
            let message = describe_store_error(&e);
            match e {
                StoreError::UniqueViolation { .. } => RowOutcome::Duplicate(message),
                _ => RowOutcome::Invalid(message),
            }
        }
        Err(e) => return Err(e),
    };

    if outcome.is_applied() {
        tx.release_savepoint().await?;
    } else {
        tx.rollback_to_savepoint().await?;
        resolver.rollback_to(checkpoint);
    }
    Ok(outcome)
}
