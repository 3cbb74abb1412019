//! Construction of the [`KartOpt`](crate::KartOpt) facade.

mod builder;

pub use builder::KartOptBuilder;
