pub(crate) mod capture;
pub(crate) mod directory;
pub(crate) mod exif_meta;
pub(crate) mod video;
