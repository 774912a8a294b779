pub mod common;
pub use common::*;

pub mod control;
pub mod expression;
pub mod statement;
