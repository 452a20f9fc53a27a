pub(crate) mod layout;
pub(crate) mod store;
pub(crate) mod summary;
