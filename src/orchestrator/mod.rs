//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 读取批次文件，创建 HTTP 网关
//! - 启动进度日志消费者
//! - 写出失败记录和最终报告
//!
//! ### `batch_driver` - 批量驱动器
//! - 逐条推进记录，单条在途
//! - 记录之间的节流间隔
//! - 暂停 / 停止 / 显式重试
//!
//! ### `single_registration` - 单条注册
//! - 校验后以规模为 1 的一轮执行同一流程
//!
//! ## 层次关系
//!
//! ```text
//! app / single_registration
//!     ↓
//! batch_driver (处理 Vec<Record>)
//!     ↓
//! workflow::OnboardingFlow (处理单条 Record)
//!     ↓
//! services (能力层：gateway / store / reporter / validation)
//!     ↓
//! infrastructure (基础设施：HttpExecutor)
//! ```

pub mod app;
pub mod batch_driver;
pub mod single_registration;

pub use app::App;
pub use batch_driver::{BatchDriver, DriverControl, DriverState, RunReport};
pub use single_registration::register_single;
