//! Library catalog service: the authors and books modules, their bootstrap,
//! and sample data seeding.

pub mod app;
pub mod modules;
pub mod seed;

pub use modules::Catalog;
