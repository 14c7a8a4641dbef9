pub mod logs;
pub mod system;
