//! Mock 协作者
//!
//! 用于无摄像头 / 无模型环境的测试。所有行为都是脚本化、可预测的。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use contracts::{
    BoundingBox, ClassScores, ColorClassifier, ColorMatch, ContractError, DefectInference, Frame,
    FrameSource, Region, RegionDetector,
};
use tracing::trace;

/// Mock 帧源
///
/// 产生 `frames` 帧纯色图像后耗尽；`endless()` 永不耗尽。
#[derive(Debug)]
pub struct ScriptedFrameSource {
    name: String,
    remaining: Option<u64>,
    next_seq: u64,
    acquire_delay: Duration,
    fail_open: bool,
    acquired: Arc<AtomicU64>,
    released: Arc<AtomicBool>,
}

impl ScriptedFrameSource {
    /// 创建产生 `frames` 帧的帧源
    pub fn new(frames: u64) -> Self {
        Self {
            name: "scripted".to_string(),
            remaining: Some(frames),
            next_seq: 0,
            acquire_delay: Duration::ZERO,
            fail_open: false,
            acquired: Arc::new(AtomicU64::new(0)),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 永不耗尽的帧源
    pub fn endless() -> Self {
        Self {
            remaining: None,
            ..Self::new(0)
        }
    }

    /// 每次 acquire 阻塞一段时间 (模拟摄像头帧间隔)
    pub fn with_acquire_delay(mut self, delay: Duration) -> Self {
        self.acquire_delay = delay;
        self
    }

    /// open() 失败 (模拟设备不可用)
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// 已产生帧数 (共享计数)
    pub fn acquired_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.acquired)
    }

    /// 是否已释放 (共享标志)
    pub fn released_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }
}

impl FrameSource for ScriptedFrameSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<(), ContractError> {
        if self.fail_open {
            return Err(ContractError::unavailable(&self.name, "scripted open failure"));
        }
        Ok(())
    }

    fn acquire(&mut self) -> Result<Option<Frame>, ContractError> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return Ok(None);
            }
            *remaining -= 1;
        }
        if !self.acquire_delay.is_zero() {
            thread::sleep(self.acquire_delay);
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.acquired.fetch_add(1, Ordering::Relaxed);
        trace!(seq, "scripted frame acquired");

        let shade = (seq % 256) as u8;
        Ok(Some(Frame::filled_rgb(seq, 8, 8, [shade, shade, shade])))
    }

    fn release(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// 单帧检测结果脚本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectOutcome {
    /// 检测到区域 (整帧左上 4x4)
    Hit,
    /// 无检测
    Miss,
    /// 检测器报错
    Error,
}

/// Mock 检测器
///
/// 按脚本逐帧返回结果；脚本用完后返回 `fallback`。
#[derive(Debug)]
pub struct ScriptedDetector {
    script: VecDeque<DetectOutcome>,
    fallback: DetectOutcome,
    fail_prepare: bool,
}

impl ScriptedDetector {
    pub fn new(script: impl IntoIterator<Item = DetectOutcome>, fallback: DetectOutcome) -> Self {
        Self {
            script: script.into_iter().collect(),
            fallback,
            fail_prepare: false,
        }
    }

    /// 永不检测到
    pub fn never() -> Self {
        Self::new([], DetectOutcome::Miss)
    }

    /// 每帧都检测到
    pub fn always() -> Self {
        Self::new([], DetectOutcome::Hit)
    }

    /// prepare() 失败 (模拟预设加载失败)
    pub fn failing_prepare(mut self) -> Self {
        self.fail_prepare = true;
        self
    }
}

impl RegionDetector for ScriptedDetector {
    fn prepare(&mut self) -> Result<(), ContractError> {
        if self.fail_prepare {
            return Err(ContractError::unavailable("scripted_detector", "preset missing"));
        }
        Ok(())
    }

    fn detect(&mut self, frame: &Frame) -> Result<Option<Region>, ContractError> {
        let outcome = self.script.pop_front().unwrap_or(self.fallback);
        match outcome {
            DetectOutcome::Hit => {
                let bounds = BoundingBox {
                    x: 0,
                    y: 0,
                    width: frame.width.min(4),
                    height: frame.height.min(4),
                };
                Region::from_parent(frame, bounds).map(Some)
            }
            DetectOutcome::Miss => Ok(None),
            DetectOutcome::Error => Err(ContractError::detection("scripted detection error")),
        }
    }
}

/// Mock 推理：固定概率输出
#[derive(Debug, Clone)]
pub struct FixedInference {
    scores: Option<ClassScores>,
}

impl FixedInference {
    pub fn new(scores: ClassScores) -> Self {
        Self {
            scores: Some(scores),
        }
    }

    /// 两类输出 {"x": p, "circle": 1 - p}
    pub fn defect(p: f32) -> Self {
        Self::new(ClassScores::from([
            ("x".to_string(), p),
            ("circle".to_string(), 1.0 - p),
        ]))
    }

    /// 每次推理都失败
    pub fn failing() -> Self {
        Self { scores: None }
    }
}

impl DefectInference for FixedInference {
    fn infer(&mut self, _region: &Region) -> Result<ClassScores, ContractError> {
        self.scores
            .clone()
            .ok_or_else(|| ContractError::detection("scripted inference failure"))
    }
}

/// Mock 颜色分类：固定标签
#[derive(Debug, Clone)]
pub struct FixedColor {
    result: ColorMatch,
}

impl FixedColor {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            result: ColorMatch {
                label: label.into(),
                confidence,
            },
        }
    }
}

impl ColorClassifier for FixedColor {
    fn classify(&mut self, _region: &Region) -> Result<ColorMatch, ContractError> {
        Ok(self.result.clone())
    }
}
