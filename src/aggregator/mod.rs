//! 核心层（Aggregator）
//!
//! ## 职责
//!
//! 本层是整个系统的核心：把"每张评分表一行"的 OCR 结果
//! 转置为"每位学生一条"的汇总记录，并计算稳健的最终成绩。
//!
//! ## 模块划分
//!
//! ### `identity` - 身份解析
//! - 按单条评分记录判定聚合键（隐私 / 花名册 / 开放 三种模式）
//! - 纯函数，返回解析结果而不是直接修改状态
//!
//! ### `score_book` - 成绩册（聚合器）
//! - 持有全部学生记录，按合并顺序追加评分
//! - 结构化返回合并结果（匹配数 / 未匹配数 / 被拒记录）
//!
//! ### `scoring` - 稳健评分
//! - 去除前后各 10% 极端值后取平均
//! - 最终成绩 = 平均分 × 10，银行家舍入
//!
//! ## 设计原则
//!
//! 1. **单线程同步**：评分顺序 = 合并顺序，核心不做内部加锁
//! 2. **不做 I/O**：输入输出都是内存中的结构，独立可测
//! 3. **逐条容错**：单条记录或单份评分表的问题从不中止整体流程

pub mod identity;
pub mod score_book;
pub mod scoring;

// 重新导出主要类型
pub use identity::{resolve, Resolution};
pub use score_book::{MergeOutcome, ScoreBook, ScoreBookError, Statistics};
pub use scoring::{compute_final_scores, final_score, trimmed_mean, FinalScore};
