//! 错误/退出控制器
//!
//! 所有致命条件的唯一出口。只有第一条诊断信息有效，后续调用不会覆盖它。

use std::process::ExitCode;

use crate::scripting::ScriptRuntimeError;

/// 控制器状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitState {
    /// 正常运行
    Running,
    /// 请求正常退出
    GracefulStop,
    /// 致命错误退出，携带最终诊断信息
    Failed(String),
}

/// 错误/退出控制器
#[derive(Debug)]
pub struct ExitController {
    state: ExitState,
    suppressed: usize,
}

impl Default for ExitController {
    fn default() -> Self {
        Self::new()
    }
}

impl ExitController {
    pub fn new() -> Self {
        Self {
            state: ExitState::Running,
            suppressed: 0,
        }
    }

    /// 记录致命错误并请求以非零状态终止进程
    ///
    /// 幂等：第一次调用的信息为最终诊断，后续调用只被计数和记录日志。
    pub fn error_exit(&mut self, message: impl Into<String>) {
        let message = message.into();
        match self.state {
            ExitState::Failed(_) => {
                self.suppressed += 1;
                tracing::warn!(target: "exit", "Suppressed additional fatal error: {}", message);
            }
            _ => {
                tracing::error!(target: "exit", "{}", message);
                self.state = ExitState::Failed(message);
            }
        }
    }

    /// 脚本运行时错误的唯一消费者
    pub fn on_script_runtime_error(&mut self, record: &ScriptRuntimeError) {
        if let Some(stack) = &record.stack {
            tracing::debug!(target: "exit", "Script stack:\n{}", stack);
        }
        self.error_exit(record.to_string());
    }

    /// 正常退出请求
    ///
    /// 只标记停止；脚本宿主统一在 Stop 阶段释放。致命状态不会被降级。
    pub fn on_exit_requested(&mut self) {
        if self.state == ExitState::Running {
            tracing::info!(target: "exit", "Exit requested");
            self.state = ExitState::GracefulStop;
        }
    }

    pub fn state(&self) -> &ExitState {
        &self.state
    }

    /// 主循环是否应该结束
    pub fn should_stop(&self) -> bool {
        self.state != ExitState::Running
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, ExitState::Failed(_))
    }

    /// 最终诊断信息
    pub fn diagnostic(&self) -> Option<&str> {
        match &self.state {
            ExitState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// 被忽略的后续致命错误数量
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.is_failed() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}
