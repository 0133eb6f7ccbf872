//! File-level import failures

use thiserror::Error;

use crate::db::StoreError;

/// Failure of the whole import call. Nothing from the batch is kept.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("ファイルがアップロードされていません")]
    MissingFile,

    #[error("アップロードを読み込めません: {0}")]
    Upload(String),

    #[error("ファイルサイズが上限({limit}バイト)を超えています")]
    TooLarge { limit: usize },

    #[error("対応していない文字コードです: {0}")]
    UnsupportedEncoding(String),

    #[error("ファイルを{encoding}として読み込めません")]
    Undecodable { encoding: &'static str },

    #[error("CSVを解析できません: {0}")]
    Unparsable(#[from] csv::Error),

    #[error("CSVにヘッダー行がありません")]
    EmptyFile,

    #[error("データベースエラーのためインポートを中止しました: {0}")]
    Storage(#[source] StoreError),

    #[error("コミットに失敗したためインポートを取り消しました: {0}")]
    Commit(#[source] StoreError),
}

impl ImportError {
    pub fn code(&self) -> &'static str {
        match self {
            ImportError::MissingFile => "MISSING_FILE",
            ImportError::Upload(_) => "UPLOAD_ERROR",
            ImportError::TooLarge { .. } => "FILE_TOO_LARGE",
            ImportError::UnsupportedEncoding(_) => "UNSUPPORTED_ENCODING",
            ImportError::Undecodable { .. } => "UNDECODABLE_FILE",
            ImportError::Unparsable(_) => "UNPARSABLE_FILE",
            ImportError::EmptyFile => "EMPTY_FILE",
            ImportError::Storage(_) => "STORAGE_ERROR",
            ImportError::Commit(_) => "COMMIT_FAILED",
        }
    }

    /// Whether the caller sent something we can't import, as opposed to the
    /// worker failing to store it
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ImportError::Storage(_) | ImportError::Commit(_))
    }
}
