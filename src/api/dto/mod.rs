pub mod solution;
pub mod template;
