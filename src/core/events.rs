//! 进程级事件总线
//!
//! 脚本运行时错误与退出请求通过通道投递，而不是在触发它们的调用中返回。
//! 任意持有 `EventSender` 的组件（包括脚本绑定闭包）都可以发布事件，
//! 主循环在每帧调用 `EventBus::drain` 分发给订阅者。

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashSet;

use crate::scripting::ScriptRuntimeError;

/// 事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ScriptRuntimeError,
    ExitRequested,
}

/// 编辑器事件
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// 脚本抛出未捕获的错误
    ScriptRuntimeError(ScriptRuntimeError),
    /// 请求退出（无负载）
    ExitRequested,
}

impl EditorEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EditorEvent::ScriptRuntimeError(_) => EventKind::ScriptRuntimeError,
            EditorEvent::ExitRequested => EventKind::ExitRequested,
        }
    }
}

/// 事件发送端，可克隆并跨闭包传递
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<EditorEvent>,
}

impl EventSender {
    /// 发布事件；总线已销毁时事件被丢弃
    pub fn send(&self, event: EditorEvent) {
        if self.tx.send(event).is_err() {
            tracing::warn!(target: "events", "Event bus closed, dropping event");
        }
    }
}

/// 事件总线
pub struct EventBus {
    tx: Sender<EditorEvent>,
    rx: Receiver<EditorEvent>,
    subscriptions: HashSet<EventKind>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            subscriptions: HashSet::new(),
        }
    }

    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
        }
    }

    /// 订阅事件类型
    pub fn subscribe(&mut self, kind: EventKind) {
        self.subscriptions.insert(kind);
    }

    pub fn is_subscribed(&self, kind: EventKind) -> bool {
        self.subscriptions.contains(&kind)
    }

    /// 取出所有待处理事件，未订阅的类型被丢弃
    pub fn drain(&self) -> Vec<EditorEvent> {
        self.rx
            .try_iter()
            .filter(|event| {
                let subscribed = self.is_subscribed(event.kind());
                if !subscribed {
                    tracing::trace!(target: "events", "No subscriber for {:?}", event.kind());
                }
                subscribed
            })
            .collect()
    }
}
