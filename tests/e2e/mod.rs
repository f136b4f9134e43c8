//! 端到端测试模块
//!
//! 测试完整的熔断与恢复流程

#[allow(unused_imports)]
mod recovery_cycle;
#[allow(unused_imports)]
mod shared_dependency;
