//! 身份解析 - 核心层
//!
//! 只负责"这条评分记录应该归到哪个学生"的判定，不修改任何状态
//!
//! 三种模式按优先级逐条选择（不是全局开关）：
//! 1. 隐私模式：没有学号但有序号 → 按 `order_<序号>` 聚合
//! 2. 花名册模式：花名册生效且有学号 → 学号必须已在名册中，否则拒绝
//! 3. 开放模式：无花名册但有学号 → 学号直接作为聚合键

use crate::models::sheet::ScoreObservation;

/// 单条评分记录的身份解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// 隐私模式：按序号聚合，实体永不记录姓名
    Sequence { key: String },
    /// 学号模式（花名册内或开放模式）：按学号聚合
    Student { key: String },
    /// 花名册生效但学号不在名册中：拒绝，防止抄录错误撕裂名册
    Unmatched { student_id: String },
    /// 既无学号也无序号：无效输入，拒绝
    Invalid,
}

/// 解析一条评分记录的聚合键
///
/// # 参数
/// - `observation`: 评分记录
/// - `roster_active`: 花名册是否生效
/// - `is_known`: 判断某学号是否已存在于名册实体中
///
/// # 返回
/// 返回解析结果；调用方负责据此创建实体或记录拒绝
pub fn resolve<F>(observation: &ScoreObservation, roster_active: bool, is_known: F) -> Resolution
where
    F: Fn(&str) -> bool,
{
    match (&observation.student_id, observation.order) {
        // 隐私模式：只有序号
        (None, Some(order)) => Resolution::Sequence {
            key: format!("order_{}", order),
        },
        // 有学号
        (Some(student_id), _) => {
            if roster_active && !is_known(student_id) {
                Resolution::Unmatched {
                    student_id: student_id.clone(),
                }
            } else {
                Resolution::Student {
                    key: student_id.clone(),
                }
            }
        }
        // 既无学号也无序号
        (None, None) => Resolution::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(student_id: Option<&str>, order: Option<i64>) -> ScoreObservation {
        ScoreObservation {
            order,
            student_id: student_id.map(|s| s.to_string()),
            name: None,
            score: Some(7.0),
        }
    }

    #[test]
    fn test_privacy_mode_keys_by_order() {
        let obs = observation(None, Some(12));
        let result = resolve(&obs, false, |_| false);
        assert_eq!(
            result,
            Resolution::Sequence {
                key: "order_12".to_string()
            }
        );
    }

    #[test]
    fn test_privacy_mode_wins_even_with_roster() {
        // 隐私模式优先于花名册模式逐条判定
        let obs = observation(None, Some(3));
        let result = resolve(&obs, true, |_| false);
        assert_eq!(
            result,
            Resolution::Sequence {
                key: "order_3".to_string()
            }
        );
    }

    #[test]
    fn test_roster_mode_accepts_known_id() {
        let obs = observation(Some("B1001"), Some(1));
        let result = resolve(&obs, true, |id| id == "B1001");
        assert_eq!(
            result,
            Resolution::Student {
                key: "B1001".to_string()
            }
        );
    }

    #[test]
    fn test_roster_mode_rejects_unknown_id() {
        // 名册外的学号必须被拒绝，不能悄悄创建新实体
        let obs = observation(Some("B9999"), Some(1));
        let result = resolve(&obs, true, |id| id == "B1001");
        assert_eq!(
            result,
            Resolution::Unmatched {
                student_id: "B9999".to_string()
            }
        );
    }

    #[test]
    fn test_open_mode_uses_id_verbatim() {
        let obs = observation(Some("B2002"), None);
        let result = resolve(&obs, false, |_| false);
        assert_eq!(
            result,
            Resolution::Student {
                key: "B2002".to_string()
            }
        );
    }

    #[test]
    fn test_no_identity_is_invalid() {
        let obs = observation(None, None);
        assert_eq!(resolve(&obs, false, |_| false), Resolution::Invalid);
        assert_eq!(resolve(&obs, true, |_| true), Resolution::Invalid);
    }
}
