//! 数据集定义及其注册表。
//!
//! 数据集定义描述一个数据源的标签如何重映射。定义要么是编译进来的类型，
//! 要么是从TOML声明文件读取的[DeclaredDataset]；注册表按名称查找它们，
//! 名称中的`-`会被忽略，因此`esa-worldcover`和`esaworldcover`指向同一个定义。
//!
//! 声明文件的格式：
//!
//! ```toml
//! [[dataset]]
//! name = "forest-height"
//! description = "canopy height buckets"
//! range_map = [5.0, 10.0, 20.0]
//!
//! [[dataset]]
//! name = "landcover"
//! value_map = { 10 = 1, 20 = 2, 30 = 3 }
//! ```
use std::collections::HashMap;

use ndarray::ArrayD;
use serde::Deserialize;

use crate::{apply_range_map, apply_value_map, RangeMap, Result, TileError, ValueMap};

/// 数据集的标签映射方式
#[derive(Clone, Debug, PartialEq)]
pub enum LabelMap {
    Values(ValueMap),
    Ranges(RangeMap),
}

/// 数据集定义
pub trait DatasetDefinition: Send + Sync {
    /// 注册表中使用的名称
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// 标签映射，没有时标签原样保留
    fn label_map(&self) -> Option<&LabelMap>;

    /// 按[DatasetDefinition::label_map]重映射标签数组
    ///
    /// 区间映射得到的类别编号以`i64`返回，与输入元素类型一致。
    fn remap_labels(&self, labels: &ArrayD<i64>) -> Result<ArrayD<i64>> {
        match self.label_map() {
            Some(LabelMap::Values(map)) => apply_value_map(labels, map),
            Some(LabelMap::Ranges(map)) => {
                Ok(apply_range_map(labels, map).mapv(|class| class as i64))
            }
            None => Ok(labels.clone()),
        }
    }
}

/// ESA WorldCover 10米土地覆盖，11个原始编码映射为类别`1..=11`，0为无数据
#[derive(Clone, Debug)]
pub struct EsaWorldCover {
    label_map: LabelMap,
}

impl Default for EsaWorldCover {
    fn default() -> Self {
        EsaWorldCover {
            label_map: LabelMap::Values(ValueMap::explicit(
                [10, 20, 30, 40, 50, 60, 70, 80, 90, 95, 100]
                    .into_iter()
                    .zip(1..),
            )),
        }
    }
}

impl DatasetDefinition for EsaWorldCover {
    fn name(&self) -> &str {
        "esa-worldcover"
    }

    fn description(&self) -> &str {
        "ESA WorldCover 10m land cover classes"
    }

    fn label_map(&self) -> Option<&LabelMap> {
        Some(&self.label_map)
    }
}

/// 在TOML中声明的数据集定义
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawDataset")]
pub struct DeclaredDataset {
    name: String,
    description: String,
    label_map: Option<LabelMap>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDataset {
    name: String,
    #[serde(default)]
    description: String,
    value_map: Option<ValueMap>,
    range_map: Option<RangeMap>,
}

impl TryFrom<RawDataset> for DeclaredDataset {
    type Error = TileError;

    fn try_from(raw: RawDataset) -> Result<Self> {
        let label_map = match (raw.value_map, raw.range_map) {
            (Some(_), Some(_)) => {
                return Err(TileError::InvalidConfig(format!(
                    "数据集{}不能同时声明value_map和range_map",
                    raw.name
                )))
            }
            (Some(values), None) => {
                // 提前发现重复编码
                values.resolve()?;
                Some(LabelMap::Values(values))
            }
            (None, Some(ranges)) => Some(LabelMap::Ranges(ranges)),
            (None, None) => None,
        };
        Ok(DeclaredDataset {
            name: raw.name,
            description: raw.description,
            label_map,
        })
    }
}

impl DatasetDefinition for DeclaredDataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn label_map(&self) -> Option<&LabelMap> {
        self.label_map.as_ref()
    }
}

#[derive(Deserialize)]
struct DatasetFile {
    #[serde(default)]
    dataset: Vec<DeclaredDataset>,
}

/// 注册表键：去掉名称中的`-`
fn registry_key(name: &str) -> String {
    name.replace('-', "")
}

/// 按名称查找数据集定义
#[derive(Default)]
pub struct DatasetRegistry {
    definitions: HashMap<String, Box<dyn DatasetDefinition>>,
}

impl DatasetRegistry {
    /// 空注册表
    pub fn new() -> Self {
        DatasetRegistry::default()
    }

    /// 预先注册了内置定义的注册表
    pub fn with_builtins() -> Self {
        let mut registry = DatasetRegistry::new();
        registry.register(Box::new(EsaWorldCover::default()));
        registry
    }

    /// 注册定义，同名的旧定义会被替换
    pub fn register(&mut self, definition: Box<dyn DatasetDefinition>) {
        let key = registry_key(definition.name());
        if self.definitions.contains_key(&key) {
            log::debug!("replacing dataset definition {}", definition.name());
        } else {
            log::debug!("registering dataset definition {}", definition.name());
        }
        self.definitions.insert(key, definition);
    }

    /// 从TOML文本读取并注册所有`[[dataset]]`，返回注册的数量
    ///
    /// 任何一条声明无效时都不会注册任何定义。
    ///
    /// ```rust
    /// # fn main() -> geo_tilekit::Result<()> {
    /// use geo_tilekit::DatasetRegistry;
    ///
    /// let mut registry = DatasetRegistry::new();
    /// let added = registry.load_toml(r#"
    ///     [[dataset]]
    ///     name = "slope-classes"
    ///     range_map = [5.0, 15.0, 30.0]
    /// "#)?;
    /// assert_eq!(added, 1);
    /// assert_eq!(registry.get("slopeclasses")?.name(), "slope-classes");
    /// # Ok(())}
    /// ```
    pub fn load_toml(&mut self, text: &str) -> Result<usize> {
        let file: DatasetFile =
            toml::from_str(text).map_err(|e| TileError::InvalidConfig(e.to_string()))?;
        let count = file.dataset.len();
        for definition in file.dataset {
            self.register(Box::new(definition));
        }
        Ok(count)
    }

    /// 按名称查找定义
    ///
    /// # 错误
    /// 没有该名称的定义时返回[TileError::UnknownDataset]
    pub fn get(&self, name: &str) -> Result<&dyn DatasetDefinition> {
        self.definitions
            .get(&registry_key(name))
            .map(|definition| definition.as_ref())
            .ok_or_else(|| TileError::UnknownDataset(name.to_string()))
    }

    /// 已注册定义的名称，按字母排序
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.definitions.values().map(|d| d.name()).collect();
        names.sort_unstable();
        names
    }
}
