//! 几何区域的确定性短哈希。
//!
//! 哈希只取决于几何外包框的坐标（保留5位小数），与坐标的内存布局、
//! 部件顺序或顶点数量无关，可以用作瓦片或区域的稳定标识。
use geo::{BoundingRect, Coord, Rect};
use itertools::Itertools;
use sha2::{Digest, Sha256};

use crate::{Result, TileError};

/// 哈希的十进制模数，取模后的值最多需要13位十六进制
const HASH_MODULUS: u64 = 1_000_000_000_000_000;
/// 输出的十六进制字符数
const HASH_WIDTH: usize = 13;
/// 坐标保留的小数位数
const DECIMALS: i32 = 5;

/// 对任意文本求SHA-256摘要，按大端整数对10^15取模，输出13位小写十六进制
///
/// ```rust
/// let h = geo_tilekit::digest_text("abc");
/// assert_eq!(h.len(), 13);
/// assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
/// ```
pub fn digest_text(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let reduced = digest
        .iter()
        .fold(0u64, |acc, &byte| (acc * 256 + u64::from(byte)) % HASH_MODULUS);
    format!("{reduced:0width$x}", width = HASH_WIDTH)
}

fn round_coordinate(value: f64) -> f64 {
    let scale = 10f64.powi(DECIMALS);
    // 加0.0把-0.0规范为0.0
    (value * scale).round_ties_even() / scale + 0.0
}

/// 外包框边界环的规范文本
///
/// 顶点顺序固定为左下、右下、右上、左上、左下。
fn envelope_text(envelope: Rect<f64>) -> String {
    let (min, max) = (envelope.min(), envelope.max());
    let ring = [
        min,
        Coord { x: max.x, y: min.y },
        max,
        Coord { x: min.x, y: max.y },
        min,
    ];
    let body = ring
        .iter()
        .map(|c| {
            format!(
                "{:.prec$} {:.prec$}",
                round_coordinate(c.x),
                round_coordinate(c.y),
                prec = DECIMALS as usize
            )
        })
        .join(",");
    format!("[{body}]")
}

/// 计算单个几何的区域哈希
///
/// 参与摘要的文本是本库自己的规范格式`[x y,x y,...]`，不是NumPy数组的打印结果，
/// 因此得到的标识与用NumPy打印坐标再求摘要的旧流水线生成的标识不相同。
///
/// # 错误
/// * [TileError::EmptyGeometry] - 几何没有外包框
/// * [TileError::NonFiniteCoordinate] - 外包框含有NaN或无限值
///
/// # 示例
///
/// ```rust
/// # fn main() -> geo_tilekit::Result<()> {
/// use geo::{polygon, Rect};
/// use geo_tilekit::hash_region;
///
/// let triangle = polygon![(x: 0., y: 0.), (x: 2., y: 0.), (x: 1., y: 3.)];
/// let envelope = Rect::new((0., 0.), (2., 3.));
/// assert_eq!(hash_region(&triangle)?, hash_region(&envelope)?);
/// # Ok(())}
/// ```
pub fn hash_region<G>(region: &G) -> Result<String>
where
    G: BoundingRect<f64> + ?Sized,
{
    let envelope: Option<Rect<f64>> = region.bounding_rect().into();
    let envelope = envelope.ok_or(TileError::EmptyGeometry)?;
    let (min, max) = (envelope.min(), envelope.max());
    if ![min.x, min.y, max.x, max.y].iter().all(|v| v.is_finite()) {
        return Err(TileError::NonFiniteCoordinate);
    }
    Ok(digest_text(&envelope_text(envelope)))
}

/// 计算几何列表的哈希：各成员哈希按顺序以单个空格连接后再求一次哈希
///
/// 结果与顺序有关，交换两个不同的成员会得到不同的哈希。
pub fn hash_region_list<G>(regions: &[G]) -> Result<String>
where
    G: BoundingRect<f64>,
{
    let joined = regions
        .iter()
        .map(hash_region)
        .collect::<Result<Vec<_>>>()?
        .join(" ");
    Ok(digest_text(&joined))
}
