//! # danci-recall - 单词回忆概率预测
//!
//! 为单个学习者、单个单词估计"此刻能回忆起来"的概率。
//!
//! - **多通道遗忘** - 阅读、闪卡、测验等每种交互模式各自按指数衰减
//! - **在线逻辑回归** - 每条交互记录后做一步 SGD 更新权重
//! - **上下文加权** - 事件上下文与当前上下文的余弦相似度折算证据权重
//!
//! ## 模块结构
//!
//! - [`predictor`] - 回忆预测器 (衰减计数、概率读出、在线更新)
//! - [`registry`] - 按单词分键的预测器池 (每词一把锁、并行批量读出)
//! - [`config`] - 预测器配置 (半衰期、学习率、初始权重)
//! - [`similarity`] - 上下文余弦相似度
//! - [`sanitize`] - 参数校验
//! - [`types`] - 公共类型和常量
//! - [`error`] - 错误类型
//!
//! ## 使用示例
//!
//! ```rust
//! use danci_recall::{Outcome, RecallPredictor};
//!
//! let t0 = 1_700_000_000.0;
//! let mut predictor = RecallPredictor::default();
//! predictor.update("reading", Outcome::Success, t0, None, None).unwrap();
//! predictor.update("flashcard", Outcome::Success, t0 + 86_400.0, None, None).unwrap();
//!
//! let p = predictor.probability(t0 + 5.0 * 86_400.0, None).unwrap();
//! assert!(p > 0.0 && p < 1.0);
//! ```

// ============================================================================
// 模块声明
// ============================================================================

pub mod config;
pub mod error;
pub mod logging;
pub mod predictor;
pub mod registry;
pub mod sanitize;
pub mod similarity;
pub mod types;

// ============================================================================
// 重新导出
// ============================================================================

/// 重新导出所有公共类型
pub use types::*;

pub use config::PredictorConfig;
pub use error::{RecallError, Result};

/// 重新导出回忆预测器
pub use predictor::{ModeState, PredictorSnapshot, RecallPredictor};

pub use registry::RecallRegistry;

pub use similarity::cosine_similarity;
