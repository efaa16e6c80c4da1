//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责模式选择、会话生命周期和结果统计，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! upload_orchestrator (单文件 / 批量 Vec<PatientRecord>)
//!     ↓
//! workflow::UploadFlow (处理单条记录)
//!     ↓
//! session::SessionHandle (外部会话：登录 / 上传)
//!     ↓
//! infrastructure (基础设施：JsExecutor)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源独占**：只有编排层持有会话
//! 2. **严格顺序**：一次只有一个提交在进行
//! 3. **单条隔离**：单条记录的失败只增加计数，不中断批量

pub mod interrupt;
pub mod upload_orchestrator;

pub use interrupt::{Interrupt, InterruptTrigger};
pub use upload_orchestrator::{
    FileInput, RunPhase, RunReport, RunRequest, UploadOrchestrator, UploadPlan,
};
