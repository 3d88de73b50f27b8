//! Ingestion 错误类型

use contracts::{ContractError, SourceId};
use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 启动前协作者不可用 (帧源 / 检测器 / 分类器)
    #[error("{source_id} setup failed ({stage}): {cause}")]
    Setup {
        /// 来源 ID
        source_id: SourceId,
        /// 失败的阶段
        stage: &'static str,
        /// 底层错误
        #[source]
        cause: ContractError,
    },

    /// 工作线程创建失败
    #[error("failed to spawn worker thread for {source_id}: {cause}")]
    Spawn {
        source_id: SourceId,
        #[source]
        cause: std::io::Error,
    },

    /// 工作线程 panic
    #[error("worker {source_id} panicked: {message}")]
    WorkerPanicked { source_id: SourceId, message: String },
}

impl IngestionError {
    pub fn setup(source_id: SourceId, stage: &'static str, cause: ContractError) -> Self {
        Self::Setup {
            source_id,
            stage,
            cause,
        }
    }

    pub fn spawn(source_id: SourceId, cause: std::io::Error) -> Self {
        Self::Spawn { source_id, cause }
    }

    /// 来源 ID
    pub fn source_id(&self) -> SourceId {
        match self {
            Self::Setup { source_id, .. }
            | Self::Spawn { source_id, .. }
            | Self::WorkerPanicked { source_id, .. } => *source_id,
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
