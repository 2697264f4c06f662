//! 将面状几何栅格化为二值掩膜。
//!
//! 掩膜的坐标系不是地理坐标，而是几何自身的外包框：所有部件共用同一个外包框
//! 归一化到`[0, 1]`，y轴翻转（第0行对应最北端），再按`(width, height)`缩放
//! 到像素网格上。这样多部件几何之间的相对位置保持不变，而掩膜正好铺满整个栅格。
use euclid::{Transform2D, UnknownUnit, Vector2D};
use geo::{
    coords_iter::CoordsIter, map_coords::MapCoordsInPlace, Coord, Geometry, LineString,
    MultiPolygon, Polygon, Rect, Triangle,
};
use ndarray::Array2;

use crate::{canvas::Rasterizer, Axis, Result, TileError};

/// 仿射变换，将几何坐标映射到像素坐标
type Transform = Transform2D<f64, UnknownUnit, UnknownUnit>;
type EuclidPoint = euclid::Point2D<f64, UnknownUnit>;

/// 栅格形状，`(height, width)`，两个维度都至少为1
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RasterShape {
    pub height: usize,
    pub width: usize,
}

impl RasterShape {
    /// 创建栅格形状
    ///
    /// # 错误
    /// 任一维度为零时返回[TileError::InvalidRasterShape]
    pub fn new(height: usize, width: usize) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(TileError::InvalidRasterShape(format!(
                "维度不能为零: ({height}, {width})"
            )));
        }
        Ok(RasterShape { height, width })
    }
}

impl TryFrom<(usize, usize)> for RasterShape {
    type Error = TileError;

    fn try_from((height, width): (usize, usize)) -> Result<Self> {
        RasterShape::new(height, width)
    }
}

/// 只使用前两个维度，例如`[256, 256, 3]`得到`256 x 256`
impl TryFrom<&[usize]> for RasterShape {
    type Error = TileError;

    fn try_from(shape: &[usize]) -> Result<Self> {
        match shape {
            [height, width, ..] => RasterShape::new(*height, *width),
            _ => Err(TileError::InvalidRasterShape(format!(
                "至少需要两个维度，得到{}个",
                shape.len()
            ))),
        }
    }
}

/// 可以生成掩膜的面状几何
///
/// 只有外环参与栅格化，内环（洞）会被忽略。
pub trait Footprint {
    /// 返回每个部件的外环，顺序与部件顺序一致
    fn exterior_rings(&self) -> Result<Vec<LineString<f64>>>;
}

impl Footprint for Polygon<f64> {
    fn exterior_rings(&self) -> Result<Vec<LineString<f64>>> {
        Ok(vec![self.exterior().clone()])
    }
}

impl Footprint for MultiPolygon<f64> {
    fn exterior_rings(&self) -> Result<Vec<LineString<f64>>> {
        Ok(self.iter().map(|poly| poly.exterior().clone()).collect())
    }
}

impl Footprint for Rect<f64> {
    fn exterior_rings(&self) -> Result<Vec<LineString<f64>>> {
        self.to_polygon().exterior_rings()
    }
}

impl Footprint for Triangle<f64> {
    fn exterior_rings(&self) -> Result<Vec<LineString<f64>>> {
        self.to_polygon().exterior_rings()
    }
}

impl Footprint for Geometry<f64> {
    fn exterior_rings(&self) -> Result<Vec<LineString<f64>>> {
        match self {
            Geometry::Polygon(poly) => poly.exterior_rings(),
            Geometry::MultiPolygon(polys) => polys.exterior_rings(),
            Geometry::Rect(rect) => rect.exterior_rings(),
            Geometry::Triangle(tri) => tri.exterior_rings(),
            Geometry::GeometryCollection(gc) => {
                let mut rings = Vec::new();
                for member in gc.iter() {
                    rings.extend(member.exterior_rings()?);
                }
                Ok(rings)
            }
            Geometry::Point(_) => Err(TileError::UnsupportedGeometry("Point")),
            Geometry::MultiPoint(_) => Err(TileError::UnsupportedGeometry("MultiPoint")),
            Geometry::Line(_) => Err(TileError::UnsupportedGeometry("Line")),
            Geometry::LineString(_) => Err(TileError::UnsupportedGeometry("LineString")),
            Geometry::MultiLineString(_) => {
                Err(TileError::UnsupportedGeometry("MultiLineString"))
            }
        }
    }
}

/// 掩膜栅格化器构建器
///
/// # 示例
///
/// ```rust
/// # use geo_tilekit::{Result, MaskBuilder};
/// # fn main() -> Result<()> {
/// let rasterizer = MaskBuilder::new().height(32).width(64).all_touched(true).build()?;
/// assert_eq!(rasterizer.shape().width, 64);
/// # Ok(())}
/// ```
#[derive(Debug, Clone, Default)]
pub struct MaskBuilder {
    height: Option<usize>,
    width: Option<usize>,
    all_touched: bool,
}

impl MaskBuilder {
    pub fn new() -> Self {
        MaskBuilder::default()
    }

    /// 设置输出掩膜的高度（行数）
    pub fn height(mut self, height: usize) -> Self {
        self.height = Some(height);
        self
    }

    /// 设置输出掩膜的宽度（列数）
    pub fn width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    /// 一次设置高度和宽度
    pub fn shape(self, shape: RasterShape) -> Self {
        self.height(shape.height).width(shape.width)
    }

    /// 除了中心落在几何内的像素外，也填充边界经过的所有像素
    ///
    /// 默认关闭，即只按像素中心判断。
    pub fn all_touched(mut self, all_touched: bool) -> Self {
        self.all_touched = all_touched;
        self
    }

    /// 构建掩膜栅格化器
    ///
    /// # 错误
    /// 缺少高度或宽度，或者任一维度为零时返回[TileError::InvalidRasterShape]
    pub fn build(self) -> Result<MaskRasterizer> {
        match (self.height, self.width) {
            (None, _) => Err(TileError::InvalidRasterShape("缺少`height`参数".into())),
            (_, None) => Err(TileError::InvalidRasterShape("缺少`width`参数".into())),
            (Some(height), Some(width)) => Ok(MaskRasterizer {
                shape: RasterShape::new(height, width)?,
                all_touched: self.all_touched,
            }),
        }
    }
}

/// 掩膜栅格化器
///
/// 每次调用[MaskRasterizer::rasterize]都会分配新的数组，栅格化器本身不保存状态，
/// 可以在多个线程之间共享。
///
/// # 示例
///
/// ```rust
/// # use geo_tilekit::{Result, MaskBuilder};
/// # fn main() -> Result<()> {
/// use geo::polygon;
/// use ndarray::array;
///
/// let triangle = polygon![(x: 0., y: 0.), (x: 4., y: 0.), (x: 0., y: 4.)];
/// let mask = MaskBuilder::new().height(4).width(4).build()?.rasterize(&triangle)?;
/// assert_eq!(
///     mask,
///     array![
///         [1, 0, 0, 0],
///         [1, 1, 0, 0],
///         [1, 1, 1, 0],
///         [1, 1, 1, 1]
///     ]
/// );
/// # Ok(())}
/// ```
#[derive(Clone, Copy, Debug)]
pub struct MaskRasterizer {
    shape: RasterShape,
    all_touched: bool,
}

impl MaskRasterizer {
    pub fn shape(&self) -> RasterShape {
        self.shape
    }

    pub fn all_touched(&self) -> bool {
        self.all_touched
    }

    /// 栅格化几何，返回形状为`(height, width)`、取值只有0和1的掩膜
    ///
    /// # 错误
    /// * [TileError::EmptyGeometry] - 几何没有任何坐标
    /// * [TileError::NonFiniteCoordinate] - 存在NaN或无限坐标
    /// * [TileError::DegenerateGeometry] - 外包框在某个轴上的范围为零
    /// * [TileError::UnsupportedGeometry] - 几何没有面积
    pub fn rasterize<G>(&self, geometry: &G) -> Result<Array2<u8>>
    where
        G: Footprint + ?Sized,
    {
        let rings = geometry.exterior_rings()?;
        let parts = rings.len();
        let bounds = shared_bounds(&rings)?;
        let to_pixels = pixel_transform(bounds, self.shape);

        let mut canvas = Rasterizer::new(self.shape.height, self.shape.width);
        for mut ring in rings {
            ring.map_coords_in_place(move |coord| {
                to_pixels
                    .transform_point(EuclidPoint::new(coord.x, coord.y))
                    .to_tuple()
                    .into()
            });
            canvas.burn_ring(&ring);
            if self.all_touched {
                canvas.burn_outline(&ring);
            }
        }

        log::debug!(
            "rasterized {parts} part(s) into a {}x{} mask",
            self.shape.height,
            self.shape.width
        );
        Ok(canvas.finish())
    }
}

/// 用默认设置（像素中心规则）栅格化几何
///
/// `raster_shape`只使用前两个维度`(height, width)`。
///
/// ```rust
/// # fn main() -> geo_tilekit::Result<()> {
/// use geo::{MultiPolygon, polygon};
///
/// let parts = MultiPolygon::new(vec![
///     polygon![(x: 0., y: 0.), (x: 1., y: 0.), (x: 1., y: 1.), (x: 0., y: 1.)],
///     polygon![(x: 3., y: 3.), (x: 4., y: 3.), (x: 4., y: 4.), (x: 3., y: 4.)],
/// ]);
/// let mask = geo_tilekit::rasterize_mask(&parts, &[8, 8, 3])?;
/// assert_eq!(mask.dim(), (8, 8));
/// assert_eq!(mask[[7, 0]], 1);
/// assert_eq!(mask[[0, 7]], 1);
/// assert_eq!(mask[[0, 0]], 0);
/// # Ok(())}
/// ```
pub fn rasterize_mask<G>(geometry: &G, raster_shape: &[usize]) -> Result<Array2<u8>>
where
    G: Footprint + ?Sized,
{
    let shape = RasterShape::try_from(raster_shape)?;
    MaskBuilder::new().shape(shape).build()?.rasterize(geometry)
}

/// 所有部件外环的共同外包框
fn shared_bounds(rings: &[LineString<f64>]) -> Result<Rect<f64>> {
    let mut coords = rings.iter().flat_map(|ring| ring.coords_iter()).peekable();
    let Some(&first) = coords.peek() else {
        return Err(TileError::EmptyGeometry);
    };

    let (mut min, mut max) = (first, first);
    for coord in coords {
        if !(coord.x.is_finite() && coord.y.is_finite()) {
            return Err(TileError::NonFiniteCoordinate);
        }
        min = Coord {
            x: min.x.min(coord.x),
            y: min.y.min(coord.y),
        };
        max = Coord {
            x: max.x.max(coord.x),
            y: max.y.max(coord.y),
        };
    }

    if max.x == min.x {
        return Err(TileError::DegenerateGeometry { axis: Axis::X });
    }
    if max.y == min.y {
        return Err(TileError::DegenerateGeometry { axis: Axis::Y });
    }
    Ok(Rect::new(min, max))
}

/// 外包框到像素网格的变换
///
/// 等价于`x' = (x - min_x) / dx * width`，`y' = (1 - (y - min_y) / dy) * height`。
fn pixel_transform(bounds: Rect<f64>, shape: RasterShape) -> Transform {
    let width = shape.width as f64;
    let height = shape.height as f64;
    Transform::translation(-bounds.min().x, -bounds.min().y)
        .then_scale(width / bounds.width(), -height / bounds.height())
        .then_translate(Vector2D::new(0., height))
}
