pub(crate) mod core;
pub(crate) mod durable;
pub(crate) mod error;
pub(crate) mod geo;
