//! 成绩册（聚合器）- 核心层
//!
//! 把多份评分表的 OCR 结果从"评分表视角"转置为"学生视角"：
//! 每位学生一条记录，按合并顺序收集多位评分人的分数。
//!
//! ## 职责
//! - 惰性创建学生记录（只通过身份解析的匹配路径创建）
//! - 逐份合并评分表，保持每位学生评分的到达顺序
//! - 结构化返回合并结果，由调用方决定如何记录日志
//! - 提供排序快照与统计信息
//!
//! 核心假设单写者访问：合并必须由一个控制线程串行调用

use crate::aggregator::identity::{resolve, Resolution};
use crate::models::roster::Roster;
use crate::models::sheet::{DocumentResult, ScoreObservation, StudentRecord};
use std::collections::HashMap;
use thiserror::Error;

/// 成绩册的结构性错误
///
/// 只有违反文档化前置条件的调用才会返回错误；
/// 逐条 / 逐份的数据问题一律通过 [`MergeOutcome`] 返回，不会失败
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoreBookError {
    #[error("花名册必须在合并任何评分表之前载入")]
    RosterAfterMerge,
    #[error("花名册在本成绩册生命周期内只能载入一次")]
    RosterAlreadyLoaded,
}

/// 单份评分表的合并结果
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// 该评分表是否被合并（OCR 失败的评分表为 false，实体零改动）
    pub merged: bool,
    /// 成功配对的评分记录数
    pub matched: usize,
    /// 被拒绝的评分记录数（名册外学号 + 无效记录）
    pub unmatched: usize,
    /// 被拒绝的评分记录，供调用方记录诊断日志
    pub rejected: Vec<ScoreObservation>,
}

/// 统计信息
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub total_students: usize,
    /// 成功合并的评分表数量
    pub total_documents: usize,
    /// 每位学生的平均评分数（保留两位小数）
    pub avg_scores_per_student: f64,
    /// 评分数等于评分表数的学生数（即每份评分表都评过的学生）
    pub students_with_all_scores: usize,
}

/// 成绩册
///
/// 内部用 HashMap + 插入顺序键列表实现保序映射：
/// 快照的平序（未排序）输出顺序 = 学生首次出现的顺序
#[derive(Debug, Default)]
pub struct ScoreBook {
    records: HashMap<String, StudentRecord>,
    /// 与 records 同步维护的插入顺序
    insertion_order: Vec<String>,
    /// 已成功合并的评分表文件名（追加写）
    processed_documents: Vec<String>,
    roster_active: bool,
}

impl ScoreBook {
    /// 创建空成绩册
    pub fn new() -> Self {
        Self::default()
    }

    /// 载入花名册，预先创建全部学生记录
    ///
    /// 必须在任何 `merge_document` 之前调用，且只能调用一次；
    /// 载入后花名册模式对本成绩册的余生持续生效
    pub fn load_roster(&mut self, roster: &Roster) -> Result<(), ScoreBookError> {
        if !self.processed_documents.is_empty() {
            return Err(ScoreBookError::RosterAfterMerge);
        }
        if self.roster_active {
            return Err(ScoreBookError::RosterAlreadyLoaded);
        }

        for student in &roster.students {
            let mut record = StudentRecord::new(&student.student_id);
            record.order = Some(student.order);
            record.name = Some(student.name.clone());
            self.insert_record(record);
        }

        self.roster_active = true;
        Ok(())
    }

    /// 花名册是否生效
    pub fn roster_active(&self) -> bool {
        self.roster_active
    }

    /// 合并一份评分表的处理结果
    ///
    /// OCR 失败的评分表整体跳过（零副作用）；
    /// 单条记录的问题只拒绝该条，继续处理其余记录
    pub fn merge_document(&mut self, result: &DocumentResult) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        if !result.success {
            return outcome;
        }
        let data = match &result.data {
            Some(data) => data,
            None => return outcome,
        };

        for observation in &data.scores {
            let resolution = resolve(observation, self.roster_active, |id| {
                self.records.contains_key(id)
            });

            match resolution {
                Resolution::Sequence { key } => {
                    let record = self.record_for_key(&key);
                    if record.order.is_none() {
                        record.order = observation.order;
                    }
                    // 隐私模式实体永不记录姓名
                    record.scores.push(observation.score);
                    outcome.matched += 1;
                }
                Resolution::Student { key } => {
                    let record = self.record_for_key(&key);
                    if record.order.is_none() {
                        record.order = observation.order;
                    }
                    if record.name.is_none() {
                        record.name = observation.name.clone();
                    }
                    record.scores.push(observation.score);
                    outcome.matched += 1;
                }
                Resolution::Unmatched { .. } | Resolution::Invalid => {
                    outcome.unmatched += 1;
                    outcome.rejected.push(observation.clone());
                }
            }
        }

        self.processed_documents.push(result.file_name.clone());
        outcome.merged = true;
        outcome
    }

    /// 按输入顺序合并多份评分表
    ///
    /// 合并顺序决定每位学生评分的排列顺序：
    /// 同一输入列表重放必然得到完全相同的评分序列
    ///
    /// # 返回
    /// 返回成功合并的评分表数量
    pub fn merge_documents(&mut self, results: &[DocumentResult]) -> usize {
        results
            .iter()
            .filter(|result| self.merge_document(result).merged)
            .count()
    }

    /// 生成当前学生记录的快照
    ///
    /// # 参数
    /// - `sort_by_order`: 是否按报告顺序升序排序（稳定排序，
    ///   无顺序的记录排在最后并保持插入顺序）
    pub fn snapshot(&self, sort_by_order: bool) -> Vec<StudentRecord> {
        let mut data: Vec<StudentRecord> = self
            .insertion_order
            .iter()
            .filter_map(|key| self.records.get(key))
            .cloned()
            .collect();

        if sort_by_order {
            data.sort_by_key(|record| record.order.map_or((1u8, 0i64), |order| (0u8, order)));
        }

        data
    }

    /// 已成功合并的评分表文件名
    pub fn processed_documents(&self) -> &[String] {
        &self.processed_documents
    }

    /// 统计信息
    ///
    /// 空成绩册返回全零，不会失败
    pub fn statistics(&self) -> Statistics {
        let total_students = self.records.len();
        let total_documents = self.processed_documents.len();

        if total_students == 0 {
            return Statistics {
                total_students: 0,
                total_documents,
                avg_scores_per_student: 0.0,
                students_with_all_scores: 0,
            };
        }

        let score_counts: Vec<usize> = self
            .records
            .values()
            .map(|record| record.scores.len())
            .collect();

        let avg = score_counts.iter().sum::<usize>() as f64 / score_counts.len() as f64;
        let avg_rounded = (avg * 100.0).round() / 100.0;

        let students_with_all = score_counts
            .iter()
            .filter(|&&count| count == total_documents)
            .count();

        Statistics {
            total_students,
            total_documents,
            avg_scores_per_student: avg_rounded,
            students_with_all_scores: students_with_all,
        }
    }

    /// 清空所有数据（包括花名册状态），用于同进程内的独立批次复用
    pub fn reset(&mut self) {
        self.records.clear();
        self.insertion_order.clear();
        self.processed_documents.clear();
        self.roster_active = false;
    }

    /// 取出或创建指定键的学生记录
    ///
    /// 创建只发生在身份解析的匹配路径上，此处不做任何判断
    fn record_for_key(&mut self, key: &str) -> &mut StudentRecord {
        if !self.records.contains_key(key) {
            self.insertion_order.push(key.to_string());
        }
        self.records
            .entry(key.to_string())
            .or_insert_with(|| StudentRecord::new(key))
    }

    fn insert_record(&mut self, record: StudentRecord) {
        if !self.records.contains_key(&record.student_id) {
            self.insertion_order.push(record.student_id.clone());
        }
        self.records.insert(record.student_id.clone(), record);
    }
}
