//! # Candidate Onboard
//!
//! 把一批候选人简历逐条注册到远端求职平台，并上传每个人的原始简历
//!
//! ## 架构设计
//!
//! 本系统沿用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（HTTP Client），只暴露能力
//! - `HttpExecutor` - 唯一的 client owner，提供 post_json() 能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `RemoteGateway` - 注册 / 上传文档两个远端调用
//! - `RecordStore` - 唯一可变的记录聚合
//! - `ProgressReporter` - 非阻塞的进度事件
//! - `FailureWriter` - 写 failed.txt 能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一条记录"的完整处理流程
//! - `RecordCtx` - 上下文封装（record_id + 序号）
//! - `OnboardingFlow` - 流程编排（register → upload → completed / failed）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_driver` - 逐条、节流地推进整个批次
//! - `orchestrator/app` - 应用入口，管理资源与输出
//! - `orchestrator/single_registration` - 单条注册

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, GatewayError};
pub use models::{BatchSummary, CandidateFields, Record, RecordId, RecordState};
pub use orchestrator::{register_single, App, BatchDriver, DriverControl, RunReport};
pub use services::{ProgressEvent, ProgressReporter, RecordStore, RemoteGateway};
pub use workflow::{DocumentSettings, OnboardingFlow, RecordCtx, RecordOutcome};
