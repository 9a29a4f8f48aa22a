//! 分页同步配置
//!
//! 默认值与宿主列表页保持一致：首页序号 1，每页 25 条，页面 3 分钟后过期。

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PageSyncError, Result};

/// 默认首页序号
pub const DEFAULT_PAGE_FIRST_INDEX: usize = 1;

/// 默认每页条数
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// 默认页面过期时间（秒）
pub const DEFAULT_PAGE_TTL_SECS: u64 = 3 * 60;

/// 默认事件广播缓冲区大小
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

/// 分页同步配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSyncConfig {
    /// 首页序号（>= 1）
    pub page_first_index: usize,

    /// 每页条数（>= 1）
    pub page_size: usize,

    /// 页面过期时间（秒），超过后需要重新拉取
    pub page_ttl_secs: u64,

    /// 事件广播缓冲区大小
    pub event_buffer_size: usize,
}

impl Default for PageSyncConfig {
    fn default() -> Self {
        Self {
            page_first_index: DEFAULT_PAGE_FIRST_INDEX,
            page_size: DEFAULT_PAGE_SIZE,
            page_ttl_secs: DEFAULT_PAGE_TTL_SECS,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl PageSyncConfig {
    pub fn builder() -> PageSyncConfigBuilder {
        PageSyncConfigBuilder::new()
    }

    /// 从 JSON 加载配置，缺省字段使用默认值
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PageSyncConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 页面过期时间
    pub fn page_ttl(&self) -> Duration {
        Duration::from_secs(self.page_ttl_secs)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.page_first_index < 1 {
            return Err(PageSyncError::InvalidConfig(format!(
                "page_first_index must be >= 1, got {}",
                self.page_first_index
            )));
        }
        if self.page_size < 1 {
            return Err(PageSyncError::InvalidConfig(format!(
                "page_size must be >= 1, got {}",
                self.page_size
            )));
        }
        if self.event_buffer_size < 1 {
            return Err(PageSyncError::InvalidConfig(format!(
                "event_buffer_size must be >= 1, got {}",
                self.event_buffer_size
            )));
        }
        Ok(())
    }
}

/// 配置构建器
#[derive(Debug, Clone, Default)]
pub struct PageSyncConfigBuilder {
    config: PageSyncConfig,
}

impl PageSyncConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: PageSyncConfig::default(),
        }
    }

    pub fn page_first_index(mut self, index: usize) -> Self {
        self.config.page_first_index = index;
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.config.page_size = size;
        self
    }

    /// 设置页面过期时间（不足一秒的部分会被舍去）
    pub fn page_ttl(mut self, ttl: Duration) -> Self {
        self.config.page_ttl_secs = ttl.as_secs();
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.config.event_buffer_size = size;
        self
    }

    pub fn build(self) -> PageSyncConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PageSyncConfig::default();
        assert_eq!(config.page_first_index, 1);
        assert_eq!(config.page_size, 25);
        assert_eq!(config.page_ttl(), Duration::from_secs(180));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = PageSyncConfig::builder()
            .page_first_index(0)
            .page_size(10)
            .page_ttl(Duration::from_secs(60))
            .build();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.page_ttl_secs, 60);

        // 首页序号 0 不合法
        assert!(matches!(
            config.validate(),
            Err(PageSyncError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let config = PageSyncConfig::builder().page_size(0).build();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn test_from_json_str() {
        let config = PageSyncConfig::from_json_str(r#"{"page_size": 50}"#).unwrap();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.page_first_index, DEFAULT_PAGE_FIRST_INDEX);
        assert_eq!(config.page_ttl_secs, DEFAULT_PAGE_TTL_SECS);

        assert!(matches!(
            PageSyncConfig::from_json_str(r#"{"page_size": 0}"#),
            Err(PageSyncError::InvalidConfig(_))
        ));
        assert!(matches!(
            PageSyncConfig::from_json_str("not json"),
            Err(PageSyncError::Serialization(_))
        ));
    }
}
