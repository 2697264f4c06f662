#![doc = include_str!("../README.md")]
use std::fmt;

use thiserror::Error;

mod canvas;
mod line;
mod poly;

pub mod crs;
pub mod dataset;
pub mod hash;
pub mod mask;
pub mod remap;

pub use crs::{utm_crs, Crs, EPSG_4326};
pub use dataset::{DatasetDefinition, DatasetRegistry, DeclaredDataset, EsaWorldCover, LabelMap};
pub use hash::{digest_text, hash_region, hash_region_list};
pub use mask::{rasterize_mask, Footprint, MaskBuilder, MaskRasterizer, RasterShape};
pub use remap::{apply_range_map, apply_value_map, RangeMap, ResolvedValueMap, ValueMap};

#[cfg(test)]
mod proptests;
#[cfg(test)]
mod tests;

/// 坐标轴，用于在错误信息中指明哪一个方向出了问题
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// 水平方向（经度 / 栅格列）
    X,
    /// 垂直方向（纬度 / 栅格行）
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => f.write_str("x"),
            Axis::Y => f.write_str("y"),
        }
    }
}

/// 本库的错误类型
///
/// 所有校验都在读取输入数组或分配输出数组之前完成，
/// 因此出错时不会返回任何部分结果。
#[derive(Error, Clone, Debug, PartialEq)]
pub enum TileError {
    /// 提供的几何图形中至少有一个坐标是NaN或无限的
    #[error("提供的几何图形中至少有一个坐标是NaN或无限的")]
    NonFiniteCoordinate,

    /// 几何图形不包含任何坐标
    #[error("几何图形为空")]
    EmptyGeometry,

    /// 几何类型没有面积，无法生成掩膜
    #[error("不支持的几何类型: {0}")]
    UnsupportedGeometry(&'static str),

    /// 几何图形在某个轴上的范围为零，无法归一化
    #[error("几何图形在{axis}轴上的范围为零")]
    DegenerateGeometry { axis: Axis },

    /// 栅格形状缺失或包含为零的维度
    #[error("无效的栅格形状: {0}")]
    InvalidRasterShape(String),

    /// 值映射包含非整数或重复的条目
    #[error("无效的值映射: {0}")]
    InvalidValueMap(String),

    /// 区间映射不是一维、不能转换为浮点数或不是严格递增的
    #[error("无效的区间映射: {0}")]
    InvalidRangeMap(String),

    /// 该经纬度没有对应的UTM分带
    #[error("无法获取经纬度 {lon}, {lat} 对应的UTM分带")]
    UtmZoneNotFound { lon: f64, lat: f64 },

    /// 注册表中没有该名称的数据集定义
    #[error("未知的数据集定义: {0}")]
    UnknownDataset(String),

    /// 数据集声明文件无法解析
    #[error("无效的数据集配置: {0}")]
    InvalidConfig(String),
}

/// 本库使用的结果类型，使用[TileError]作为错误类型。
pub type Result<T> = std::result::Result<T, TileError>;
