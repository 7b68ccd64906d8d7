use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::category::Category;

/// 入参校验错误，在任何阶段启动之前同步返回
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Idea text must not be empty")]
    EmptyIdea,
}

/// 待验证的产品想法（不可变）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    text: String,
    category_hint: Option<Category>,
}

impl Idea {
    /// 创建想法；文本去除首尾空白后不能为空，非法的类别提示会被忽略
    pub fn new(text: &str, category_hint: Option<&str>) -> Result<Self, InputError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(InputError::EmptyIdea);
        }

        let category_hint = category_hint.and_then(|hint| match hint.parse::<Category>() {
            Ok(category) => Some(category),
            Err(_) => {
                tracing::debug!("忽略无法识别的类别提示: {}", hint);
                None
            }
        });

        Ok(Self {
            text: text.to_string(),
            category_hint,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn category_hint(&self) -> Option<Category> {
        self.category_hint
    }

    /// 日志中使用的截断文本
    pub fn preview(&self) -> String {
        const MAX_CHARS: usize = 50;
        if self.text.chars().count() > MAX_CHARS {
            let truncated: String = self.text.chars().take(MAX_CHARS).collect();
            format!("{}...", truncated)
        } else {
            self.text.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_idea_is_rejected() {
        assert_eq!(Idea::new("", None), Err(InputError::EmptyIdea));
        assert_eq!(Idea::new("   \n\t", None), Err(InputError::EmptyIdea));
    }

    #[test]
    fn test_idea_text_is_trimmed() {
        let idea = Idea::new("  A social network for dogs  ", None).unwrap();
        assert_eq!(idea.text(), "A social network for dogs");
        assert_eq!(idea.category_hint(), None);
    }

    #[test]
    fn test_valid_hint_is_kept_and_invalid_hint_ignored() {
        let idea = Idea::new("Budgeting for students", Some("fintech")).unwrap();
        assert_eq!(idea.category_hint(), Some(Category::Fintech));

        let idea = Idea::new("Budgeting for students", Some("crypto_things")).unwrap();
        assert_eq!(idea.category_hint(), None);
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let idea = Idea::new(&"x".repeat(80), None).unwrap();
        assert_eq!(idea.preview().chars().count(), 53);
    }
}
