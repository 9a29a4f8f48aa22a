use thiserror::Error;

/// 分页同步错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageSyncError {
    /// 配置错误（页大小为 0、首页序号为 0 等）
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// 页面拉取失败（网络、解码、服务端错误等，由 PageFetcher 报告）
    #[error("Page fetch failed: {0}")]
    Fetch(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for PageSyncError {
    fn from(error: serde_json::Error) -> Self {
        PageSyncError::Serialization(error.to_string())
    }
}

impl PageSyncError {
    /// 创建拉取失败错误
    pub fn fetch(message: impl Into<String>) -> Self {
        PageSyncError::Fetch(message.into())
    }

    /// 判断是否是拉取失败（可通过后续滚动或手动刷新重新拉取）
    pub fn is_fetch_error(&self) -> bool {
        matches!(self, PageSyncError::Fetch(_))
    }
}

pub type Result<T> = std::result::Result<T, PageSyncError>;
