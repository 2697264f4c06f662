use geo::{winding_order::Winding, LineString, Point};
use itertools::Itertools;

use crate::canvas::Rasterizer;

/// 环上的一条边，两个端点
type Edge = (Point<f64>, Point<f64>);

/// 将环拆成按顺时针方向排列的边
fn clockwise_edges(ring: &LineString<f64>) -> Vec<Edge> {
    if ring.is_cw() {
        ring.points().tuple_windows::<Edge>().collect()
    } else {
        ring.points().rev().tuple_windows::<Edge>().collect()
    }
}

/// 按扫描线填充一个闭合环所围的区域
///
/// 算法参考GDAL的`GDALdllImageFilledPolygon`：对每一行取像素中心高度`y + 0.5`
/// 作为扫描线，求出它与各边的交点，排序后两两配对填充。交点按四舍五入取整，
/// 所以只有中心落在环内的像素会被填充。
///
/// 边按`[y1, y2)`半开区间参与求交，这样经过顶点的扫描线只会被计数一次，
/// 奇偶配对也就不会错位。
///
/// # 参数
/// * `ring` - 已经变换到像素坐标的闭合环
/// * `rasterizer` - 目标画布
pub(crate) fn rasterize_ring(ring: &LineString<f64>, rasterizer: &mut Rasterizer) {
    debug_assert!(ring.is_closed());

    let Some((min_y, max_y)) = ring
        .points()
        .map(|point| point.y().floor() as isize)
        .minmax()
        .into_option()
    else {
        return;
    };
    let min_y = min_y.max(0);
    let max_y = max_y.min(rasterizer.height() as isize - 1);
    let max_x = rasterizer.width() as isize;

    let edges = clockwise_edges(ring);
    let mut xs: Vec<isize> = Vec::with_capacity(edges.len());

    for y in min_y..=max_y {
        let scan_y = 0.5 + y as f64;

        for (p1, p2) in edges.iter() {
            let (y1, y2) = (p1.y(), p2.y());
            if (y1 < scan_y && y2 < scan_y) || (y1 > scan_y && y2 > scan_y) {
                continue;
            }

            let (y1, x1, y2, x2) = if y1 < y2 {
                (y1, p1.x(), y2, p2.x())
            } else if y1 > y2 {
                (y2, p2.x(), y1, p1.x())
            } else {
                // 与扫描线重合的水平边
                if p1.x() > p2.x() {
                    let x_start = (p2.x() + 0.5).floor() as isize;
                    let x_end = (p1.x() + 0.5).floor() as isize;
                    if x_start < max_x && x_end > 0 {
                        rasterizer.fill_span(
                            x_start.max(0) as usize,
                            x_end.min(max_x) as usize,
                            y as usize,
                        );
                    }
                }
                continue;
            };

            if scan_y >= y1 && scan_y < y2 {
                let intersect = (scan_y - y1) * (x2 - x1) / (y2 - y1) + x1;
                xs.push((intersect + 0.5).floor() as isize);
            }
        }

        xs.sort_unstable();
        for pair in xs.chunks_exact(2) {
            let x_start = pair[0].max(0);
            let x_end = pair[1].min(max_x);
            if x_start < max_x && x_end > x_start {
                rasterizer.fill_span(x_start as usize, x_end as usize, y as usize);
            }
        }
        xs.clear();
    }
}
