//! Event pipeline 指标收集模块
//!
//! 记录事件队列、传感器工作线程与分发器的运行指标。

use std::collections::BTreeMap;

use contracts::{ActuatorId, EventKind, SourceId};
use metrics::{counter, gauge, histogram};

/// 记录事件入队
pub fn record_event_enqueued(source: Option<SourceId>, kind: EventKind) {
    let source = source.map_or_else(|| "none".to_string(), |s| s.to_string());
    counter!(
        "sortline_events_enqueued_total",
        "source" => source,
        "kind" => kind.as_str()
    )
    .increment(1);
}

/// 记录事件在队列中的停留时间
pub fn record_queue_latency_ms(latency_ms: f64) {
    histogram!("sortline_queue_latency_ms").record(latency_ms);
}

/// 记录出队超时 (正常轮询结果)
pub fn record_dequeue_timeout() {
    counter!("sortline_dequeue_timeouts_total").increment(1);
}

/// 记录队列深度
pub fn record_queue_depth(depth: usize) {
    gauge!("sortline_queue_depth").set(depth as f64);
}

/// 记录事件分发
pub fn record_event_dispatched(kind: EventKind, after_stop: bool) {
    let phase = if after_stop { "stopping" } else { "running" };
    counter!(
        "sortline_events_dispatched_total",
        "kind" => kind.as_str(),
        "phase" => phase
    )
    .increment(1);
}

/// 记录执行器命令
pub fn record_actuator_push(actuator: ActuatorId, success: bool, latency_ms: f64) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "sortline_actuator_pushes_total",
        "actuator" => actuator.to_string(),
        "status" => status
    )
    .increment(1);
    histogram!("sortline_actuator_latency_ms").record(latency_ms);
}

/// 记录渲染失败
pub fn record_render_failure(display: &str) {
    counter!(
        "sortline_render_failures_total",
        "display" => display.to_string()
    )
    .increment(1);
}

/// 记录传感器迭代中的检测/分类失败
pub fn record_detection_error(source: SourceId) {
    counter!(
        "sortline_detection_errors_total",
        "source" => source.to_string()
    )
    .increment(1);
}

/// 记录工作线程退出
pub fn record_worker_exit(source: SourceId, reason: &str) {
    counter!(
        "sortline_worker_exits_total",
        "source" => source.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// 分发指标聚合器
///
/// 在内存中聚合指标，便于运行结束后输出摘要。
#[derive(Debug, Clone, Default)]
pub struct DispatchMetricsAggregator {
    /// 各类事件数量
    pub kind_counts: BTreeMap<&'static str, u64>,

    /// 各来源的帧数量 (live + detected)
    pub source_frames: BTreeMap<SourceId, u64>,

    /// 各执行器的命令数量
    pub actuator_counts: BTreeMap<ActuatorId, u64>,

    /// 渲染耗时 (毫秒)
    pub render_stats: RunningStats,

    /// 执行器耗时 (毫秒)
    pub actuator_stats: RunningStats,
}

impl DispatchMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次分发
    pub fn record_kind(&mut self, kind: EventKind, source: Option<SourceId>) {
        *self.kind_counts.entry(kind.as_str()).or_insert(0) += 1;
        if matches!(kind, EventKind::RawFrame | EventKind::DetectedFrame) {
            if let Some(source) = source {
                *self.source_frames.entry(source).or_insert(0) += 1;
            }
        }
    }

    pub fn record_render_ms(&mut self, ms: f64) {
        self.render_stats.push(ms);
    }

    pub fn record_actuator_ms(&mut self, actuator: ActuatorId, ms: f64) {
        *self.actuator_counts.entry(actuator).or_insert(0) += 1;
        self.actuator_stats.push(ms);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> DispatchSummary {
        DispatchSummary {
            total_events: self.kind_counts.values().sum(),
            kind_counts: self.kind_counts.clone(),
            source_frames: self.source_frames.clone(),
            actuator_counts: self.actuator_counts.clone(),
            render_ms: StatsSummary::from(&self.render_stats),
            actuator_ms: StatsSummary::from(&self.actuator_stats),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 分发摘要
#[derive(Debug, Clone, Default)]
pub struct DispatchSummary {
    pub total_events: u64,
    pub kind_counts: BTreeMap<&'static str, u64>,
    pub source_frames: BTreeMap<SourceId, u64>,
    pub actuator_counts: BTreeMap<ActuatorId, u64>,
    pub render_ms: StatsSummary,
    pub actuator_ms: StatsSummary,
}

impl std::fmt::Display for DispatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Summary ===")?;
        writeln!(f, "Total events: {}", self.total_events)?;
        for (kind, count) in &self.kind_counts {
            writeln!(f, "  {}: {}", kind, count)?;
        }
        for (source, count) in &self.source_frames {
            writeln!(f, "Frames from {}: {}", source, count)?;
        }
        for (actuator, count) in &self.actuator_counts {
            writeln!(f, "Actuator {} pushes: {}", actuator, count)?;
        }
        writeln!(f, "Render (ms): {}", self.render_ms)?;
        writeln!(f, "Actuator (ms): {}", self.actuator_ms)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
