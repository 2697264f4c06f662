use geo::LineString;
use ndarray::{s, Array2};

use crate::line::rasterize_line;
use crate::poly::rasterize_ring;

/// 背景像素的值
const BACKGROUND: u8 = 0;
/// 前景像素的值
const FOREGROUND: u8 = 1;

/// 二值掩膜画布，保存栅格化的中间结果。
///
/// 画布以[BACKGROUND]初始化，之后每次写入都把像素覆盖为[FOREGROUND]。
/// 由于采用覆盖而不是累加，同一像素被多个部件覆盖时结果仍然是1，
/// 这正是二值掩膜需要的"饱和或"语义。
///
/// 数组形状为`(height, width)`，行号随y增大，因此水平相邻的像素在内存中也相邻。
#[derive(Clone, Debug)]
pub(crate) struct Rasterizer {
    /// 存储栅格化结果的二维数组
    pixels: Array2<u8>,
}

impl Rasterizer {
    pub fn new(height: usize, width: usize) -> Self {
        Rasterizer {
            pixels: Array2::from_elem((height, width), BACKGROUND),
        }
    }

    pub fn width(&self) -> usize {
        self.pixels.shape()[1]
    }

    pub fn height(&self) -> usize {
        self.pixels.shape()[0]
    }

    /// 填充第`y`行中`[x_start, x_end)`范围内的像素
    pub fn fill_span(&mut self, x_start: usize, x_end: usize, y: usize) {
        debug_assert!(x_end <= self.width());
        debug_assert!(y < self.height());
        self.pixels
            .slice_mut(s![y, x_start..x_end])
            .fill(FOREGROUND);
    }

    /// 填充第`y`行中`[x_start, x_end]`范围内的像素（包含两端）
    pub fn fill_row(&mut self, x_start: usize, x_end: usize, y: usize) {
        self.fill_span(x_start, x_end + 1, y);
    }

    /// 填充第`x`列中`[y_start, y_end]`范围内的像素（包含两端）
    pub fn fill_column(&mut self, x: usize, y_start: usize, y_end: usize) {
        debug_assert!(x < self.width());
        debug_assert!(y_end < self.height());
        self.pixels
            .slice_mut(s![y_start..=y_end, x])
            .fill(FOREGROUND);
    }

    /// 按像素中心规则填充一个闭合环所围的区域
    pub fn burn_ring(&mut self, ring: &LineString<f64>) {
        rasterize_ring(ring, self);
    }

    /// 填充环上每条边经过的所有像素
    pub fn burn_outline(&mut self, ring: &LineString<f64>) {
        ring.lines().for_each(|line| rasterize_line(&line, self));
    }

    /// 获取完成的栅格数组
    pub fn finish(self) -> Array2<u8> {
        self.pixels
    }
}
