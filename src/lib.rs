//! # EMR Upload Bot
//!
//! 通过一个长期存在的浏览器会话，把文档上传到患者病历中
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `browser/` - 启动或连接浏览器
//! - `infrastructure/` - `JsExecutor`，唯一的 page owner
//!
//! ### ② 会话层（Session）
//! - `session/` - `SessionHandle`：initialize / login / submit_document / close
//!
//! ### ③ 业务能力层（Services）
//! - `FileResolver` - 按固定优先级定位文件
//! - `parse_patient_descriptor` - 解析 "姓名 + 出生日期"
//! - `BatchSource` - 批量患者列表
//! - `OutcomeLog` - 只追加的上传结果日志
//!
//! ### ④ 流程层（Workflow）
//! - `UploadFlow` - 一位患者一份文档，返回 `ItemResult`
//!
//! ### ⑤ 编排层（Orchestration）
//! - `UploadOrchestrator` - 模式选择、会话生命周期、批量统计与最终处置

pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod session;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, Credentials};
pub use error::{AppError, AppResult};
pub use models::{BatchOutcome, Disposition, ExecutionMode, PatientIdentity, PatientRecord};
pub use orchestrator::{FileInput, Interrupt, RunReport, RunRequest, UploadOrchestrator};
pub use session::{BrowserSession, SessionHandle, SubmitStatus};
pub use workflow::{ItemResult, UploadFlow};
