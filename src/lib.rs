//! # Grade Sheet OCR
//!
//! 一个用于自动化评分表数字化的 Rust 应用程序：
//! 扫描评分表 PDF，通过视觉模型 OCR 提取手写评分，
//! 按学生汇总多位评分人的分数，去除极端值后计算最终成绩并输出 CSV。
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个评分表
//! - `pdf_scanner` - 扫描与校验 PDF 文件能力
//! - `OcrService` - 视觉模型 OCR 提取能力
//! - `CsvWriter` - 写 CSV 能力
//!
//! ### ② 核心层（Aggregator）
//! - `aggregator/` - 纯同步核心，不做任何 I/O
//! - `identity` - 身份解析（隐私 / 花名册 / 开放 三种模式）
//! - `ScoreBook` - 按学生汇总评分，保序合并
//! - `scoring` - 去除极端值的稳健评分
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量评分表处理器，管理并发与流程
//!
//! ## 数据流
//!
//! ```text
//! pdf_scanner (Vec<PathBuf>)
//!     ↓
//! OcrService (Vec<DocumentResult>，并发受 Semaphore 限制)
//!     ↓ 按文件名排序，保证合并顺序确定
//! ScoreBook (逐份合并 → snapshot)
//!     ↓
//! scoring (去除前后 10% 极端值 → 最终成绩)
//!     ↓
//! CsvWriter (scores.csv / final_scores.csv)
//! ```

pub mod aggregator;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use aggregator::identity::{resolve, Resolution};
pub use aggregator::score_book::{MergeOutcome, ScoreBook, Statistics};
pub use aggregator::scoring::{compute_final_scores, final_score, trimmed_mean, FinalScore};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::roster::{load_roster, Roster, RosterStudent};
pub use models::sheet::{DocumentResult, ScoreObservation, SheetData, StudentRecord};
pub use orchestrator::App;
pub use services::csv_writer::CsvWriter;
pub use services::ocr_service::OcrService;
