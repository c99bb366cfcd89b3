pub mod config;
pub mod controller;
pub mod feedback;
pub mod hid;
pub mod mapping;
pub mod runtime;

#[cfg(test)]
mod mock;
