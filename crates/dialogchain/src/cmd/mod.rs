pub mod bench;
pub mod create;
pub mod dev;
pub mod doctor;
pub mod export;
pub mod logs;
pub mod platform;
pub mod process;
pub mod validate;
