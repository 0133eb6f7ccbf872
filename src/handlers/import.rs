//! CSV import endpoints
//!
//! Each endpoint takes a `multipart/form-data` body with the file in the
//! part named `file`. Row-level problems come back as 200 with an `errors`
//! list; only a file that can't be read or stored fails the request.

use std::fmt;

use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::AppState;
use crate::services::import::{import_csv, ImportError, ImportRequest, SourceEncoding};
use crate::types::{ErrorResponse, ImportKind};

const FILE_FIELD: &str = "file";

#[derive(Debug, Default, Deserialize)]
pub struct ImportQuery {
    /// `sjis` or `utf-8`; the endpoint's default when absent
    pub encoding: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
}

/// A failed import call, tagged with its import id for log correlation
#[derive(Debug)]
pub struct ImportFailure {
    import_id: Uuid,
    error: ImportError,
}

impl fmt::Display for ImportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl ResponseError for ImportFailure {
    fn status_code(&self) -> StatusCode {
        match self.error {
            ImportError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ref e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(
            self.import_id,
            self.error.code(),
            self.error.to_string(),
        ))
    }
}

/// Read the `file` part into memory, refusing anything over `limit` bytes
async fn read_file_field(mut payload: Multipart, limit: usize) -> Result<Vec<u8>, ImportError> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ImportError::Upload(e.to_string()))?;
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| ImportError::Upload(e.to_string()))?;
            if bytes.len() + chunk.len() > limit {
                return Err(ImportError::TooLarge { limit });
            }
            bytes.extend_from_slice(&chunk);
        }
        debug!(bytes = bytes.len(), "Received upload");
        return Ok(bytes);
    }

    Err(ImportError::MissingFile)
}

async fn handle_import(
    kind: ImportKind,
    state: web::Data<AppState>,
    query: web::Query<ImportQuery>,
    payload: Multipart,
) -> Result<HttpResponse, ImportFailure> {
    let import_id = Uuid::new_v4();
    let fail = |error: ImportError| {
        warn!(%import_id, kind = kind.as_str(), code = error.code(), "Import failed: {}", error);
        ImportFailure { import_id, error }
    };

    let encoding = match query.encoding.as_deref() {
        Some(raw) => Some(
            raw.parse::<SourceEncoding>()
                .map_err(|_| fail(ImportError::UnsupportedEncoding(raw.to_string())))?,
        ),
        None => None,
    };
    let bytes = read_file_field(payload, state.max_upload_bytes).await.map_err(fail)?;

    let request = ImportRequest {
        kind,
        bytes,
        encoding,
        dry_run: query.dry_run,
    };
    let response = import_csv(state.store.as_ref(), request, import_id)
        .await
        .map_err(fail)?;

    Ok(HttpResponse::Ok().json(response))
}

/// `POST /api/devices/import`
pub async fn import_devices(
    state: web::Data<AppState>,
    query: web::Query<ImportQuery>,
    payload: Multipart,
) -> Result<HttpResponse, ImportFailure> {
    handle_import(ImportKind::Device, state, query, payload).await
}

/// `POST /api/inspection-items/import`
pub async fn import_inspection_items(
    state: web::Data<AppState>,
    query: web::Query<ImportQuery>,
    payload: Multipart,
) -> Result<HttpResponse, ImportFailure> {
    handle_import(ImportKind::InspectionItem, state, query, payload).await
}

/// `POST /api/inspection-item-names/import`
pub async fn import_item_names(
    state: web::Data<AppState>,
    query: web::Query<ImportQuery>,
    payload: Multipart,
) -> Result<HttpResponse, ImportFailure> {
    handle_import(ImportKind::InspectionItemName, state, query, payload).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::header;
    use actix_web::{test, App};
    use encoding_rs::SHIFT_JIS;
    use serde_json::Value;

    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::handlers::configure_routes;

    const BOUNDARY: &str = "----inspection-import-boundary";

    fn multipart_body(field: &str, content: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"upload.csv\"\r\nContent-Type: text/csv\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload(uri: &str, field: &str, content: &[u8]) -> test::TestRequest {
        test::TestRequest::post()
            .uri(uri)
            .insert_header((header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}")))
            .set_payload(multipart_body(field, content))
    }

    async fn call(store: &MemoryStore, max_upload_bytes: usize, req: test::TestRequest) -> (StatusCode, Value) {
        let state = AppState {
            store: Arc::new(store.clone()),
            max_upload_bytes,
        };
        let app = test::init_service(App::new().app_data(web::Data::new(state)).service(configure_routes())).await;
        let resp = test::call_service(&app, req.to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }

    #[actix_web::test]
    async fn test_shift_jis_device_upload() {
        let store = MemoryStore::new();
        let (csv, _, _) = SHIFT_JIS.encode("機器名,顧客名,ラック番号\nweb-01,テスト顧客1,5\n");

        let (status, body) = call(&store, 1024, upload("/api/devices/import", "file", &csv)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["importedRows"], 1);
        assert_eq!(body["data"]["totalRows"], 1);
        assert_eq!(body["data"]["importedItems"][0]["customerName"], "テスト顧客1");
        assert_eq!(body["data"]["importedItems"][0]["created"], true);
        assert!(body["data"].get("errors").is_none());
        assert_eq!(store.devices().len(), 1);
    }

    #[actix_web::test]
    async fn test_row_errors_still_return_ok() {
        let store = MemoryStore::new();
        let csv = "点検項目名\n外観確認\n外観確認\n";

        let (status, body) = call(&store, 1024, upload("/api/inspection-item-names/import", "file", csv.as_bytes())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["importedRows"], 1);
        assert_eq!(body["data"]["errors"][0]["rowNumber"], 3);
        assert_eq!(body["data"]["errors"][0]["row"]["点検項目名"], "外観確認");
    }

    #[actix_web::test]
    async fn test_missing_file_part_is_bad_request() {
        let store = MemoryStore::new();

        let (status, body) = call(&store, 1024, upload("/api/devices/import", "attachment", b"x")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "MISSING_FILE");
    }

    #[actix_web::test]
    async fn test_oversized_upload_is_rejected() {
        let store = MemoryStore::new();
        let csv = "機器名,顧客名\n".repeat(20);

        let (status, body) = call(&store, 64, upload("/api/devices/import?encoding=utf-8", "file", csv.as_bytes())).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"]["code"], "FILE_TOO_LARGE");
    }

    #[actix_web::test]
    async fn test_unknown_encoding_is_bad_request() {
        let store = MemoryStore::new();

        let (status, body) = call(&store, 1024, upload("/api/devices/import?encoding=latin1", "file", b"a,b\n")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "UNSUPPORTED_ENCODING");
    }

    #[actix_web::test]
    async fn test_commit_failure_is_server_error() {
        let store = MemoryStore::new();
        store.fail_commit();

        let (status, body) = call(
            &store,
            1024,
            upload("/api/inspection-items/import?encoding=utf-8", "file", "点検項目名,機器名,顧客名\n外観確認,web-01,A社\n".as_bytes()),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "COMMIT_FAILED");
        assert!(store.items().is_empty());
    }
}
