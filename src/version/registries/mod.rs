//! Registry implementations for looking up latest versions

pub mod npm;

pub use npm::NpmRegistry;
