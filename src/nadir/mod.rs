pub(crate) mod composite;
pub(crate) mod pixel;
pub(crate) mod preview;
