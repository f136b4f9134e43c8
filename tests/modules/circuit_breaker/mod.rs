//! 熔断器模块测试
