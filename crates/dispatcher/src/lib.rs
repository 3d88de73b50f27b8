//! # Dispatcher
//!
//! 事件分发模块。
//!
//! 负责：
//! - 消费 `EventQueue`，按事件类型路由到渲染 sink 或执行器 sink
//! - 按 `ShutdownPolicy` 触发 `StopSignal`
//! - 协调停机：等待 worker 结束、排空队列、释放 sinks

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod report;
pub mod sinks;
pub mod state;

pub use contracts::{ActuatorSink, Event, RenderSink};
pub use dispatcher::{
    create_actuator_sink, create_render_sink, Dispatcher, DispatcherBuilder, DispatcherConfig,
};
pub use error::DispatcherError;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use report::{ActuatorFailure, DispatchReport, StopReason, WorkerOutcome};
pub use sinks::{
    DeviceActuator, LogActuator, LogRenderSink, MemoryActuator, MemoryRenderSink,
    SinkEvent, SinkJournal, SnapshotRenderSink,
};
pub use state::{DispatcherState, StateMachine};
