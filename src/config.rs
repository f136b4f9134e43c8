//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! 配置模块
//!
//! 定义熔断器与注册表的配置结构。
//!
//! `CircuitBreakerConfig` 在构造时校验，之后不可变；
//! `RegistryConfig` 支持从 YAML / TOML / JSON 文件加载默认值与按名称覆盖的参数。

use crate::constants::{DEFAULT_FAILURE_THRESHOLD, DEFAULT_SUCCESS_THRESHOLD, DEFAULT_TIMEOUT_MS};
use crate::error::CircuitronError;
use ahash::AHashMap as HashMap;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// 失败判定函数
///
/// 返回 `true` 表示该错误计入失败次数。
pub type FailurePredicate = Arc<dyn Fn(&(dyn StdError + 'static)) -> bool + Send + Sync>;

/// 默认失败判定：所有错误均计入失败
fn count_every_error(_: &(dyn StdError + 'static)) -> bool {
    true
}

/// 熔断器配置
#[derive(Clone)]
pub struct CircuitBreakerConfig {
    /// 名称（注册表中的唯一键）
    pub name: String,
    /// 失败阈值（达到此值时熔断）
    pub failure_threshold: u64,
    /// 成功阈值（半开状态下达到此值时恢复）
    pub success_threshold: u64,
    /// 冷却时间（打开状态后等待此时间再允许探测）
    pub timeout: Duration,
    /// 失败判定
    pub is_failure: FailurePredicate,
}

impl CircuitBreakerConfig {
    /// 使用默认参数创建配置
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            success_threshold: DEFAULT_SUCCESS_THRESHOLD,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            is_failure: Arc::new(count_every_error),
        }
    }

    /// 设置失败阈值
    pub fn failure_threshold(mut self, threshold: u64) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// 设置成功阈值
    pub fn success_threshold(mut self, threshold: u64) -> Self {
        self.success_threshold = threshold;
        self
    }

    /// 设置冷却时间
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 设置失败判定函数
    ///
    /// # 示例
    /// ```rust
    /// use circuitron::config::CircuitBreakerConfig;
    ///
    /// // 找不到记录属于正常业务结果，不计入失败
    /// let config = CircuitBreakerConfig::new("database").is_failure(|err| {
    ///     err.downcast_ref::<std::io::Error>()
    ///         .map(|e| e.kind() != std::io::ErrorKind::NotFound)
    ///         .unwrap_or(true)
    /// });
    /// ```
    pub fn is_failure<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&(dyn StdError + 'static)) -> bool + Send + Sync + 'static,
    {
        self.is_failure = Arc::new(predicate);
        self
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), CircuitronError> {
        if self.name.trim().is_empty() {
            return Err(CircuitronError::ConfigError(
                "熔断器名称不能为空".to_string(),
            ));
        }

        if self.failure_threshold == 0 {
            return Err(CircuitronError::ConfigError(format!(
                "熔断器 '{}' 的失败阈值必须大于0",
                self.name
            )));
        }

        if self.success_threshold == 0 {
            return Err(CircuitronError::ConfigError(format!(
                "熔断器 '{}' 的成功阈值必须大于0",
                self.name
            )));
        }

        Ok(())
    }
}

impl std::fmt::Debug for CircuitBreakerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreakerConfig")
            .field("name", &self.name)
            .field("failure_threshold", &self.failure_threshold)
            .field("success_threshold", &self.success_threshold)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// 可序列化的熔断器参数
///
/// 所有字段可选，缺省时使用默认值或 [`RegistryConfig::defaults`]。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BreakerSettings {
    pub failure_threshold: Option<u64>,
    pub success_threshold: Option<u64>,
    pub timeout_ms: Option<u64>,
}

impl BreakerSettings {
    /// 用 `other` 中已设置的字段覆盖当前值
    pub fn merged_with(&self, other: &BreakerSettings) -> BreakerSettings {
        BreakerSettings {
            failure_threshold: other.failure_threshold.or(self.failure_threshold),
            success_threshold: other.success_threshold.or(self.success_threshold),
            timeout_ms: other.timeout_ms.or(self.timeout_ms),
        }
    }

    /// 应用到熔断器配置
    pub fn apply(&self, mut config: CircuitBreakerConfig) -> CircuitBreakerConfig {
        if let Some(threshold) = self.failure_threshold {
            config.failure_threshold = threshold;
        }
        if let Some(threshold) = self.success_threshold {
            config.success_threshold = threshold;
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout = Duration::from_millis(ms);
        }
        config
    }
}

/// 注册表配置
///
/// ```yaml
/// defaults:
///   failure_threshold: 5
///   timeout_ms: 30000
/// breakers:
///   payment-api:
///     failure_threshold: 3
///     timeout_ms: 10000
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// 所有熔断器的默认参数
    pub defaults: BreakerSettings,
    /// 按名称覆盖的参数
    pub breakers: HashMap<String, BreakerSettings>,
}

impl RegistryConfig {
    /// 从YAML字符串解析
    pub fn from_yaml_str(content: &str) -> Result<Self, CircuitronError> {
        let config: RegistryConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从TOML字符串解析
    pub fn from_toml_str(content: &str) -> Result<Self, CircuitronError> {
        let config: RegistryConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从JSON字符串解析
    pub fn from_json_str(content: &str) -> Result<Self, CircuitronError> {
        let config: RegistryConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载，格式由扩展名决定
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CircuitronError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => Err(CircuitronError::ConfigError(format!(
                "不支持的配置文件格式: {:?}",
                other
            ))),
        }
    }

    /// 生成指定名称的熔断器配置
    pub fn config_for(&self, name: &str) -> CircuitBreakerConfig {
        let settings = match self.breakers.get(name) {
            Some(overrides) => self.defaults.merged_with(overrides),
            None => self.defaults.clone(),
        };
        settings.apply(CircuitBreakerConfig::new(name))
    }

    /// 校验所有配置项
    pub fn validate(&self) -> Result<(), CircuitronError> {
        for name in self.breakers.keys() {
            self.config_for(name).validate()?;
        }
        // 默认值本身也必须合法
        self.defaults
            .apply(CircuitBreakerConfig::new("defaults"))
            .validate()
    }
}
