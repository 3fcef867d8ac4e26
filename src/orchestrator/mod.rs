//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责整个批次的流程调度，是系统的"指挥中心"。
//!
//! ### `batch_processor` - 批量评分表处理器
//! - 管理应用生命周期（初始化、运行）
//! - 扫描并校验评分表 PDF
//! - 控制 OCR 并发数量（Semaphore）
//! - 把并发得到的结果按文件名重新排序，再串行合并进成绩册
//! - 输出全局统计信息与 CSV
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<PathBuf>)
//!     ↓
//! services (能力层：pdf_scanner / OcrService / CsvWriter)
//!     ↓
//! aggregator (核心层：ScoreBook / scoring，单线程串行)
//! ```
//!
//! ## 设计原则
//!
//! 1. **并发只在 I/O**：OCR 可以并发，核心合并必须串行且顺序确定
//! 2. **无业务逻辑**：只做调度和统计，评分语义全部在核心层
//! 3. **逐份容错**：单份评分表失败不影响批次

pub mod batch_processor;

// 重新导出主要类型
pub use batch_processor::App;
