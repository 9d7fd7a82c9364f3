//! Read entities definitions.

pub mod land;
