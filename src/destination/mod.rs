pub(crate) mod mapillary;
pub(crate) mod service;
pub(crate) mod tokens;
