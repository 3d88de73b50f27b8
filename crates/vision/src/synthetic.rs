//! SyntheticFrameSource - 生成模拟传送带画面
//!
//! 灰色传送带上一个彩色方块从左向右移动，每 `item_every` 帧进入一个新方块。
//! 用于无相机环境下的开发和测试。

use contracts::{ContractError, Frame, FrameSource, PixelFormat};
use tracing::trace;

const BELT_COLOR: [u8; 3] = [140, 140, 140];

/// 合成帧源
#[derive(Debug, Clone)]
pub struct SyntheticFrameSource {
    name: String,
    frames: u64,
    width: u32,
    height: u32,
    item_color: [u8; 3],
    item_every: u64,
    produced: u64,
}

impl SyntheticFrameSource {
    /// 创建合成帧源，共产生 `frames` 帧后耗尽
    pub fn new(frames: u64, width: u32, height: u32, item_color: [u8; 3], item_every: u64) -> Self {
        Self {
            name: format!("synthetic:{width}x{height}"),
            frames,
            width: width.max(1),
            height: height.max(1),
            item_color,
            item_every: item_every.max(1),
            produced: 0,
        }
    }

    /// 方块边长（画面高度的三分之一）
    fn item_side(&self) -> u32 {
        (self.height / 3).clamp(1, self.width)
    }

    /// 第 `seq` 帧中方块左上角的 x 坐标
    fn item_x(&self, seq: u64) -> u32 {
        let travel = (self.width - self.item_side()) as u64;
        let phase = seq % self.item_every;
        let steps = (self.item_every - 1).max(1);
        (phase * travel / steps) as u32
    }

    fn render(&self, seq: u64) -> Result<Frame, ContractError> {
        let side = self.item_side();
        let x0 = self.item_x(seq);
        let y0 = (self.height - side) / 2;

        let mut data = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for y in 0..self.height {
            for x in 0..self.width {
                let inside = x >= x0 && x < x0 + side && y >= y0 && y < y0 + side;
                data.extend_from_slice(if inside { &self.item_color } else { &BELT_COLOR });
            }
        }

        Frame::new(seq, self.width, self.height, PixelFormat::Rgb8, data)
    }
}

impl FrameSource for SyntheticFrameSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn acquire(&mut self) -> Result<Option<Frame>, ContractError> {
        if self.produced >= self.frames {
            return Ok(None);
        }
        let seq = self.produced;
        self.produced += 1;
        trace!(seq, x = self.item_x(seq), "synthetic frame");
        self.render(seq).map(Some)
    }

    fn release(&mut self) {
        self.produced = self.frames;
    }
}
