//! 分析函数返回结构的校验与修复
//!
//! 分析函数的输出是无类型的JSON，只有通过这里的显式校验之后才能进入流水线。

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// 返回结构不符合约定
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{0}")]
pub struct ContractViolation(pub String);

impl ContractViolation {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// 基于顶层JSON对象的字段读取器
pub struct ShapeReader<'a> {
    object: &'a Map<String, Value>,
}

impl<'a> ShapeReader<'a> {
    pub fn new(raw: &'a Value) -> Result<Self, ContractViolation> {
        raw.as_object()
            .map(|object| Self { object })
            .ok_or_else(|| ContractViolation::new("response is not a JSON object"))
    }

    fn field(&self, key: &str) -> Result<&'a Value, ContractViolation> {
        match self.object.get(key) {
            Some(Value::Null) | None => Err(ContractViolation::new(format!(
                "required key `{}` is missing",
                key
            ))),
            Some(value) => Ok(value),
        }
    }

    /// 必填且非空的字符串
    pub fn string(&self, key: &str) -> Result<String, ContractViolation> {
        let text = self
            .field(key)?
            .as_str()
            .ok_or_else(|| ContractViolation::new(format!("`{}` must be a string", key)))?
            .trim();
        if text.is_empty() {
            return Err(ContractViolation::new(format!("`{}` must not be empty", key)));
        }
        Ok(text.to_string())
    }

    /// 可选字符串，空白视为缺失
    pub fn optional_string(&self, key: &str) -> Option<String> {
        self.object
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    }

    /// 数值字段，兼容以字符串形式返回的数字
    pub fn number(&self, key: &str) -> Result<f64, ContractViolation> {
        as_number(self.field(key)?)
            .ok_or_else(|| ContractViolation::new(format!("`{}` must be a number", key)))
    }

    /// 字符串列表：丢弃空白项，超长部分截断；修复后数量不足`min`视为违约
    pub fn string_list(
        &self,
        key: &str,
        min: usize,
        max: usize,
    ) -> Result<Vec<String>, ContractViolation> {
        let items = self
            .field(key)?
            .as_array()
            .ok_or_else(|| ContractViolation::new(format!("`{}` must be a list", key)))?;

        let mut list = Vec::with_capacity(items.len().min(max));
        for item in items {
            let Some(text) = item.as_str() else {
                return Err(ContractViolation::new(format!(
                    "`{}` must only contain strings",
                    key
                )));
            };
            let text = text.trim();
            if !text.is_empty() && list.len() < max {
                list.push(text.to_string());
            }
        }

        if list.len() < min {
            return Err(ContractViolation::new(format!(
                "`{}` needs at least {} item(s), got {}",
                key,
                min,
                list.len()
            )));
        }
        Ok(list)
    }

    /// 数值字典，如 `{"pain_severity": 80}`
    pub fn number_map(&self, key: &str) -> Result<BTreeMap<String, f64>, ContractViolation> {
        let object = self
            .field(key)?
            .as_object()
            .ok_or_else(|| ContractViolation::new(format!("`{}` must be an object", key)))?;

        object
            .iter()
            .map(|(name, value)| {
                as_number(value)
                    .map(|number| (name.trim().to_lowercase(), number))
                    .ok_or_else(|| {
                        ContractViolation::new(format!("`{}.{}` must be a number", key, name))
                    })
            })
            .collect()
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|number| number.is_finite())
}
