pub mod health;
pub mod solution;
pub mod template;
