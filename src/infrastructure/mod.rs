//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod agi;
pub mod signal;

pub use agi::{AgiClient, StdioAgiClient};
pub use signal::wait_for_shutdown;
