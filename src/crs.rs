//! 坐标参考系标识与UTM分带查询。
use std::fmt;

use crate::{Result, TileError};

/// 以EPSG代码表示的坐标参考系
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Crs(u32);

/// WGS 84 经纬度坐标系，几何默认使用的坐标系
pub const EPSG_4326: Crs = Crs(4326);

/// UTM分带覆盖的纬度范围
const UTM_MIN_LAT: f64 = -80.0;
const UTM_MAX_LAT: f64 = 84.0;
/// 每个分带的经度宽度
const ZONE_WIDTH: f64 = 6.0;
const ZONE_COUNT: u32 = 60;

impl Crs {
    pub const fn from_epsg(code: u32) -> Self {
        Crs(code)
    }

    pub fn epsg(&self) -> u32 {
        self.0
    }

    /// 如果是WGS 84 UTM坐标系，返回`(分带号, 是否北半球)`
    pub fn utm_zone(&self) -> Option<(u32, bool)> {
        match self.0 {
            32601..=32660 => Some((self.0 - 32600, true)),
            32701..=32760 => Some((self.0 - 32700, false)),
            _ => None,
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

/// 返回经纬度所在的WGS 84 UTM坐标系（单位为米）
///
/// 分带边界上的点取编号较小的分带，赤道上的点取北半球。
///
/// # 错误
/// 点不在任何UTM分带的适用范围内（纬度超出`[-80, 84]`、经度超出`[-180, 180]`
/// 或坐标不是有限值）时返回[TileError::UtmZoneNotFound]
///
/// # 示例
///
/// ```rust
/// # fn main() -> geo_tilekit::Result<()> {
/// let crs = geo_tilekit::utm_crs(-3.70, 40.42)?;
/// assert_eq!(crs.to_string(), "EPSG:32630");
/// # Ok(())}
/// ```
pub fn utm_crs(lon: f64, lat: f64) -> Result<Crs> {
    let covered = lon.is_finite()
        && lat.is_finite()
        && (-180.0..=180.0).contains(&lon)
        && (UTM_MIN_LAT..=UTM_MAX_LAT).contains(&lat);
    if !covered {
        return Err(TileError::UtmZoneNotFound { lon, lat });
    }

    let zone = (((lon + 180.0) / ZONE_WIDTH).ceil() as u32).clamp(1, ZONE_COUNT);
    let base = if lat >= 0.0 { 32600 } else { 32700 };
    Ok(Crs(base + zone))
}
