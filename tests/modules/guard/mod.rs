//! 调用包装模块测试

#[allow(unused_imports)]
pub mod integration;
