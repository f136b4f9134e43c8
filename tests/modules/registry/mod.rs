//! 注册表模块测试
