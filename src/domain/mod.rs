//! Domain Layer - 领域层
//!
//! 包含:
//! - Speech Context: 语言、语速、打断按键、目标音频格式、播放结果
//! - 文本清洗与分段

pub mod speech;

mod text_segmenter;

pub use text_segmenter::{
    sanitize_text, segment_text, SegmentConfig, DEFAULT_MAX_CHARS,
};
