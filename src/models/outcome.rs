//! 执行模式、批量计数与最终处置

use std::fmt::Display;

/// 执行模式
///
/// 在校验阶段确定一次，运行期间不再改变
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// 单文件：恰好一个文件，最多一个患者描述
    Single,
    /// 批量：患者身份全部来自批量数据源
    Batch,
}

impl ExecutionMode {
    /// 根据解析出的文件数量选择模式
    pub fn for_file_count(count: usize) -> Self {
        if count > 1 {
            ExecutionMode::Batch
        } else {
            ExecutionMode::Single
        }
    }
}

impl Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Single => write!(f, "Single File"),
            ExecutionMode::Batch => write!(f, "Batch Processing"),
        }
    }
}

/// 批量计数
///
/// 处置时满足 `attempted == succeeded + failed`；
/// `skipped_missing` 单独统计，不计入 `attempted`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped_missing: usize,
}

impl BatchOutcome {
    pub fn record_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self) {
        self.attempted += 1;
        self.failed += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped_missing += 1;
    }

    /// 计数是否自洽
    pub fn is_consistent(&self) -> bool {
        self.attempted == self.succeeded + self.failed
    }

    /// 根据计数计算最终处置
    pub fn disposition(&self) -> Disposition {
        if self.succeeded == 0 {
            Disposition::Failed
        } else if self.failed == 0 && self.skipped_missing == 0 {
            Disposition::Complete
        } else {
            Disposition::Partial
        }
    }
}

/// 运行的最终处置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// 全部成功
    Complete,
    /// 至少一个成功，但存在失败或因缺少文件跳过的记录
    Partial,
    /// 没有任何成功
    Failed,
}

impl Disposition {
    pub fn is_success(&self) -> bool {
        !matches!(self, Disposition::Failed)
    }

    /// 进程退出码
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_for_file_count() {
        assert_eq!(ExecutionMode::for_file_count(1), ExecutionMode::Single);
        assert_eq!(ExecutionMode::for_file_count(2), ExecutionMode::Batch);
    }

    #[test]
    fn test_disposition_from_counters() {
        let mut outcome = BatchOutcome::default();
        assert_eq!(outcome.disposition(), Disposition::Failed);

        outcome.record_failure();
        assert_eq!(outcome.disposition(), Disposition::Failed);

        outcome.record_success();
        assert_eq!(outcome.disposition(), Disposition::Partial);
        assert!(outcome.is_consistent());

        let mut clean = BatchOutcome::default();
        clean.record_success();
        clean.record_success();
        assert_eq!(clean.disposition(), Disposition::Complete);

        clean.record_skipped();
        assert_eq!(clean.disposition(), Disposition::Partial);
        assert_eq!(clean.attempted, 2, "跳过的记录不计入 attempted");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Disposition::Complete.exit_code(), 0);
        assert_eq!(Disposition::Partial.exit_code(), 0);
        assert_eq!(Disposition::Failed.exit_code(), 1);
    }
}
