//! 标签数组的取值重映射。
//!
//! * [ValueMap]：离散编码到离散编码的映射，可以是有序列表，也可以是显式映射表；
//! * [RangeMap]：按严格递增的断点把连续值分桶为`0..=n`的类别编号。
//!
//! 两种映射都在构造或解析时完成校验，之后的映射过程不会失败，
//! 也不会修改输入数组。
use std::collections::HashMap;

use ndarray::{Array, ArrayBase, Data, Dimension};
use num_traits::{NumCast, PrimInt, ToPrimitive};
use serde::Deserialize;
use serde_json::Value;

use crate::{Result, TileError};

/// 离散取值映射
///
/// 0始终是合法的编码：列表形式缺少0时会在最前面补上，
/// 映射表形式的键和值都不含0时会补一条`0 -> 0`。
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Value")]
pub enum ValueMap {
    /// 互不相同的编码列表。排序后第`i`个值成为位置`i`映射到的目标值
    Ordered(Vec<i64>),
    /// 显式的`源编码 -> 目标编码`映射，保持插入顺序
    Explicit(Vec<(i64, i64)>),
}

/// 规范化后的映射：有序的`(源, 目标)`对，以及未命中编码的填充值
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedValueMap {
    pairs: Vec<(i64, i64)>,
    init_val: i64,
}

impl ValueMap {
    pub fn ordered(codes: impl IntoIterator<Item = i64>) -> Self {
        ValueMap::Ordered(codes.into_iter().collect())
    }

    pub fn explicit(pairs: impl IntoIterator<Item = (i64, i64)>) -> Self {
        ValueMap::Explicit(pairs.into_iter().collect())
    }

    /// 把两种形式统一成一张显式映射表
    ///
    /// 填充值的规则：若0映射到0则为0，否则为映射表中的第一个键。
    ///
    /// # 错误
    /// 列表中有重复编码或映射表中有重复键时返回[TileError::InvalidValueMap]
    pub fn resolve(&self) -> Result<ResolvedValueMap> {
        let pairs = match self {
            ValueMap::Ordered(codes) => {
                let mut codes = codes.clone();
                codes.sort_unstable();
                if let Some(dup) = codes.windows(2).find(|w| w[0] == w[1]) {
                    return Err(TileError::InvalidValueMap(format!(
                        "列表中的编码{}重复",
                        dup[0]
                    )));
                }
                if codes.binary_search(&0).is_err() {
                    codes.insert(0, 0);
                }
                (0..).zip(codes).collect::<Vec<(i64, i64)>>()
            }
            ValueMap::Explicit(pairs) => {
                let mut seen = HashMap::with_capacity(pairs.len());
                for &(key, value) in pairs {
                    if seen.insert(key, value).is_some() {
                        return Err(TileError::InvalidValueMap(format!("键{key}重复")));
                    }
                }
                let mut pairs = pairs.clone();
                if !pairs.iter().any(|&(k, v)| k == 0 || v == 0) {
                    pairs.push((0, 0));
                }
                pairs
            }
        };

        let init_val = if pairs.contains(&(0, 0)) {
            0
        } else {
            // 两个分支都保证了至少有一个键
            pairs.first().map_or(0, |&(key, _)| key)
        };

        Ok(ResolvedValueMap { pairs, init_val })
    }
}

impl ResolvedValueMap {
    pub fn pairs(&self) -> &[(i64, i64)] {
        &self.pairs
    }

    /// 所有输出像素的初始值，也是未命中编码得到的值
    pub fn init_val(&self) -> i64 {
        self.init_val
    }

    /// 查找单个编码的映射结果
    pub fn lookup(&self, code: i64) -> i64 {
        self.pairs
            .iter()
            .find(|&&(key, _)| key == code)
            .map_or(self.init_val, |&(_, value)| value)
    }
}

impl TryFrom<&Value> for ValueMap {
    type Error = TileError;

    /// 从JSON解析：整数数组为[ValueMap::Ordered]，
    /// 键为整数字符串、值为整数的对象为[ValueMap::Explicit]
    fn try_from(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_i64().ok_or_else(|| {
                        TileError::InvalidValueMap(format!("列表中的值必须是整数: {item}"))
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(ValueMap::Ordered),
            Value::Object(entries) => entries
                .iter()
                .map(|(key, item)| {
                    let key = key.trim().parse::<i64>().map_err(|_| {
                        TileError::InvalidValueMap(format!("映射表的键必须是整数: {key:?}"))
                    })?;
                    let item = item.as_i64().ok_or_else(|| {
                        TileError::InvalidValueMap(format!("映射表的值必须是整数: {item}"))
                    })?;
                    Ok((key, item))
                })
                .collect::<Result<Vec<_>>>()
                .map(ValueMap::Explicit),
            other => Err(TileError::InvalidValueMap(format!(
                "值映射必须是列表或映射表: {other}"
            ))),
        }
    }
}

impl TryFrom<Value> for ValueMap {
    type Error = TileError;

    fn try_from(value: Value) -> Result<Self> {
        ValueMap::try_from(&value)
    }
}

/// 按值映射改写整数数组，返回同形状、同元素类型的新数组
///
/// 输出先全部填充为[ResolvedValueMap::init_val]，再把命中映射表的像素改写为目标值，
/// 因此未出现在映射表中的编码得到的是填充值而不是原值。
///
/// # 错误
/// 映射不合法，或者目标值超出元素类型的范围时返回[TileError::InvalidValueMap]，
/// 此时不会读取输入数组。
///
/// # 示例
///
/// ```rust
/// # fn main() -> geo_tilekit::Result<()> {
/// use geo_tilekit::{apply_value_map, ValueMap};
/// use ndarray::array;
///
/// let labels = array![[0u8, 1], [2, 3]];
/// let remapped = apply_value_map(&labels, &ValueMap::explicit([(1, 5)]))?;
/// assert_eq!(remapped, array![[0, 5], [0, 0]]);
/// # Ok(())}
/// ```
pub fn apply_value_map<A, S, D>(array: &ArrayBase<S, D>, value_map: &ValueMap) -> Result<Array<A, D>>
where
    A: PrimInt,
    S: Data<Elem = A>,
    D: Dimension,
{
    let resolved = value_map.resolve()?;

    let narrow = |code: i64| {
        <A as NumCast>::from(code).ok_or_else(|| {
            TileError::InvalidValueMap(format!("目标值{code}超出数组元素类型的范围"))
        })
    };
    let init_val = narrow(resolved.init_val)?;
    let mut table = HashMap::with_capacity(resolved.pairs.len());
    for &(key, value) in &resolved.pairs {
        if value != resolved.init_val {
            table.insert(key, narrow(value)?);
        }
    }

    Ok(array.map(|cell| {
        cell.to_i64()
            .and_then(|code| table.get(&code).copied())
            .unwrap_or(init_val)
    }))
}

/// 区间映射：`n`个严格递增的断点把实数轴分成`n + 1`个左闭右开区间，编号`0..=n`
///
/// 例如断点`[5, 10, 12]`：小于5为0，`[5, 10)`为1，`[10, 12)`为2，不小于12为3。
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct RangeMap {
    breakpoints: Vec<f64>,
}

impl RangeMap {
    /// # 错误
    /// 断点不是严格递增（包括重复值和NaN）时返回[TileError::InvalidRangeMap]
    pub fn new(breakpoints: Vec<f64>) -> Result<Self> {
        if let Some(w) = breakpoints.windows(2).find(|w| !(w[1] > w[0])) {
            return Err(TileError::InvalidRangeMap(format!(
                "断点必须严格递增且不能重复: {} 之后是 {}",
                w[0], w[1]
            )));
        }
        Ok(RangeMap { breakpoints })
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.breakpoints
    }

    /// 类别数量，即断点数加一
    pub fn classes(&self) -> usize {
        self.breakpoints.len() + 1
    }

    /// 单个值所属的类别。NaN不属于任何区间，归为0
    pub fn class_of(&self, x: f64) -> usize {
        self.breakpoints.partition_point(|&b| b <= x)
    }
}

fn breakpoint(value: &Value) -> Result<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| TileError::InvalidRangeMap(format!("断点必须是浮点数: {value}")))
}

impl TryFrom<&Value> for RangeMap {
    type Error = TileError;

    /// 从JSON解析。单个数值视为只有一个断点；嵌套数组不是一维的，会被拒绝。
    /// 校验顺序：维度、能否转换为浮点数、是否严格递增。
    fn try_from(value: &Value) -> Result<Self> {
        let items = match value {
            Value::Array(items) => items.as_slice(),
            Value::Object(_) => {
                return Err(TileError::InvalidRangeMap("区间映射必须是一维的".into()))
            }
            scalar => std::slice::from_ref(scalar),
        };
        if items
            .iter()
            .any(|item| matches!(item, Value::Array(_) | Value::Object(_)))
        {
            return Err(TileError::InvalidRangeMap("区间映射必须是一维的".into()));
        }
        let breakpoints = items.iter().map(breakpoint).collect::<Result<Vec<_>>>()?;
        RangeMap::new(breakpoints)
    }
}

impl TryFrom<Value> for RangeMap {
    type Error = TileError;

    fn try_from(value: Value) -> Result<Self> {
        RangeMap::try_from(&value)
    }
}

/// 按区间映射把数组中的值分桶，返回同形状的类别编号数组
///
/// ```rust
/// # fn main() -> geo_tilekit::Result<()> {
/// use geo_tilekit::{apply_range_map, RangeMap};
/// use ndarray::array;
///
/// let classes = apply_range_map(&array![1., 5., 9., 20.], &RangeMap::new(vec![5., 10., 12.])?);
/// assert_eq!(classes, array![0, 1, 1, 3]);
/// # Ok(())}
/// ```
pub fn apply_range_map<A, S, D>(array: &ArrayBase<S, D>, range_map: &RangeMap) -> Array<usize, D>
where
    A: ToPrimitive,
    S: Data<Elem = A>,
    D: Dimension,
{
    array.map(|cell| range_map.class_of(cell.to_f64().unwrap_or(f64::NAN)))
}
