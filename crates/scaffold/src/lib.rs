//! DialogChain project generation

pub mod files;
pub mod project;
pub mod scaffold;
pub mod template;
