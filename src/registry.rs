//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! 熔断器注册表
//!
//! 按名称共享熔断器实例：同一名称的首次查找创建实例，之后的查找返回同一个实例，
//! 从而让不同调用点共享同一依赖的失败计数。
//!
//! 注册表是普通的值，在进程启动时创建一次，通过 `Arc` 传递给需要它的组件。

use crate::circuit_breaker::CircuitBreaker;
use crate::config::{CircuitBreakerConfig, RegistryConfig};
use crate::error::{CircuitBreakerStats, CircuitronError};
use crate::guard::{wrap, Guarded};
use crate::listener::StateListener;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// 熔断器注册表
pub struct BreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>, ahash::RandomState>,
    config: RegistryConfig,
    listeners: Vec<Arc<dyn StateListener>>,
}

impl BreakerRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// 使用默认参数与按名称覆盖的参数创建注册表
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            breakers: DashMap::with_hasher(ahash::RandomState::new()),
            config,
            listeners: Vec::new(),
        }
    }

    /// 添加监听器，之后创建的每个熔断器都会收到它
    pub fn with_listener(mut self, listener: Arc<dyn StateListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// 获取或创建熔断器
    ///
    /// 名称已存在时直接返回已有实例，`config` 中的其他参数被忽略。
    ///
    /// # 示例
    /// ```rust
    /// use circuitron::config::CircuitBreakerConfig;
    /// use circuitron::registry::BreakerRegistry;
    /// use std::sync::Arc;
    ///
    /// let registry = BreakerRegistry::new();
    /// let a = registry.get_or_create(CircuitBreakerConfig::new("database")).unwrap();
    /// let b = registry.get_or_create(CircuitBreakerConfig::new("database")).unwrap();
    /// assert!(Arc::ptr_eq(&a, &b));
    /// ```
    pub fn get_or_create(
        &self,
        config: CircuitBreakerConfig,
    ) -> Result<Arc<CircuitBreaker>, CircuitronError> {
        // 快路径：只读查找
        if let Some(breaker) = self.breakers.get(&config.name) {
            return Ok(breaker.value().clone());
        }

        match self.breakers.entry(config.name.clone()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let breaker = Arc::new(
                    CircuitBreaker::new(config)?.with_listeners(self.listeners.iter().cloned()),
                );
                debug!(breaker = %breaker.name(), "注册熔断器");
                entry.insert(breaker.clone());
                Ok(breaker)
            }
        }
    }

    /// 按名称获取或创建熔断器，参数取自注册表配置
    pub fn get_or_create_named(&self, name: &str) -> Result<Arc<CircuitBreaker>, CircuitronError> {
        if let Some(breaker) = self.get(name) {
            return Ok(breaker);
        }
        self.get_or_create(self.config.config_for(name))
    }

    /// 获取已存在的熔断器
    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).map(|entry| entry.value().clone())
    }

    /// 是否存在指定名称的熔断器
    pub fn contains(&self, name: &str) -> bool {
        self.breakers.contains_key(name)
    }

    /// 获取熔断器并包装操作
    pub fn wrap<F>(
        &self,
        config: CircuitBreakerConfig,
        operation: F,
    ) -> Result<Guarded<F>, CircuitronError> {
        Ok(wrap(self.get_or_create(config)?, operation))
    }

    /// 已注册的熔断器名称（已排序）
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.breakers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// 所有熔断器的统计信息，按名称排序
    pub fn snapshot(&self) -> Vec<CircuitBreakerStats> {
        let mut stats: Vec<CircuitBreakerStats> =
            self.breakers.iter().map(|e| e.value().stats()).collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }

    /// 重置所有熔断器，实例本身保留
    pub fn reset_all(&self) {
        // 先收集，重置时不持有分片锁
        let breakers: Vec<Arc<CircuitBreaker>> =
            self.breakers.iter().map(|e| e.value().clone()).collect();
        for breaker in breakers {
            breaker.reset();
        }
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// 清除所有熔断器
    ///
    /// 仅用于测试隔离；生产环境中注册表条目与进程同生命周期。
    pub fn clear(&self) {
        self.breakers.clear();
    }

    /// 获取注册表配置
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl Default for BreakerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BreakerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BreakerRegistry")
            .field("breakers", &self.names())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
