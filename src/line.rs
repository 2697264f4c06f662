use geo::Line;

use crate::canvas::Rasterizer;

/// 判断线段是否接近垂直或水平的阈值（像素）
const AXIS_THRESHOLD: f64 = 0.01;

/// 将线段经过的每个像素都写入画布
///
/// 用于`all_touched`模式下的边界描边。线段会先被裁剪到画布范围内，
/// 完全落在画布外的线段直接忽略。
pub(crate) fn rasterize_line(line: &Line<f64>, rasterizer: &mut Rasterizer) {
    let width = rasterizer.width() as f64;
    let height = rasterizer.height() as f64;

    if (line.start.y < 0. && line.end.y < 0.)
        || (line.start.y > height && line.end.y > height)
        || (line.start.x < 0. && line.end.x < 0.)
        || (line.start.x > width && line.end.x > width)
    {
        return;
    }

    // 统一从左向右处理
    let line = if line.start.x > line.end.x {
        Line::new(line.end, line.start)
    } else {
        *line
    };

    let is_vertical =
        line.start.x.floor() == line.end.x.floor() || line.dx().abs() < AXIS_THRESHOLD;
    let is_horizontal =
        line.start.y.floor() == line.end.y.floor() || line.dy().abs() < AXIS_THRESHOLD;

    if is_vertical {
        burn_vertical(&line, rasterizer);
    } else if is_horizontal {
        burn_horizontal(&line, rasterizer);
    } else {
        burn_diagonal(&line, width, height, rasterizer);
    }
}

fn burn_vertical(line: &Line<f64>, rasterizer: &mut Rasterizer) {
    let ix = line.end.x.floor() as isize;
    if ix < 0 || ix >= rasterizer.width() as isize {
        return;
    }
    let (y_start, y_end) = if line.start.y > line.end.y {
        (line.end.y, line.start.y)
    } else {
        (line.start.y, line.end.y)
    };
    // 负数转换为usize时饱和为0
    let last = rasterizer.height() - 1;
    let y_start = (y_start.floor() as usize).min(last);
    let y_end = (y_end.floor() as usize).min(last);
    rasterizer.fill_column(ix as usize, y_start, y_end);
}

fn burn_horizontal(line: &Line<f64>, rasterizer: &mut Rasterizer) {
    let iy = line.start.y.floor() as isize;
    if iy < 0 || iy >= rasterizer.height() as isize {
        return;
    }
    // 调用方已保证 start.x <= end.x
    let last = rasterizer.width() - 1;
    let x_start = (line.start.x.floor() as usize).min(last);
    let x_end = (line.end.x.floor() as usize).min(last);
    rasterizer.fill_row(x_start, x_end, iy as usize);
}

/// 逐像素沿斜线前进，每次移动到下一个像素列或下一条扫描线中较近的一个
fn burn_diagonal(
    line: &Line<f64>,
    width: f64,
    height: f64,
    rasterizer: &mut Rasterizer,
) {
    const STEP_EPSILON: f64 = 0.000000001;

    let slope = line.slope();
    let (mut x_start, mut y_start) = line.start.x_y();
    let (mut x_end, mut y_end) = line.end.x_y();

    // 在x方向裁剪
    if x_end > width {
        y_end -= (x_end - width) * slope;
        x_end = width;
    }
    if x_start < 0. {
        y_start -= x_start * slope;
        x_start = 0.;
    }

    // 在y方向裁剪
    if y_end > y_start {
        if y_start < 0. {
            x_start -= y_start / slope;
            y_start = 0.;
        }
        if y_end >= height {
            x_end -= (y_end - height) / slope;
        }
    } else {
        if y_start >= height {
            x_start += (height - y_start) / slope;
            y_start = height;
        }
        if y_end < 0. {
            x_end -= y_end / slope;
        }
    }

    while x_start >= 0. && x_start < x_end {
        let ix = x_start.floor() as usize;
        let iy = y_start.floor() as isize;

        if iy >= 0 && (iy as usize) < rasterizer.height() && ix < rasterizer.width() {
            rasterizer.fill_row(ix, ix, iy as usize);
        }

        let mut x_step = (x_start + 1.).floor() - x_start;
        let mut y_step = x_step * slope;

        if (y_start + y_step).floor() as isize != iy {
            // 先到达下一条扫描线
            y_step = if slope < 0. {
                (iy as f64 - y_start).min(-STEP_EPSILON)
            } else {
                ((iy + 1) as f64 - y_start).max(STEP_EPSILON)
            };
            x_step = y_step / slope;
        }

        x_start += x_step;
        y_start += y_step;
    }
}
