pub mod adapters;
pub mod config;
pub mod core;
pub mod storage;
pub mod view;

#[cfg(test)]
mod tests;
