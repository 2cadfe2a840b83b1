pub mod check;
pub mod generate;
pub mod pipeline;
pub mod proto;

#[cfg(test)]
mod commands_tests;
