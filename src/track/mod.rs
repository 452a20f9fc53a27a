pub(crate) mod correlate;
pub(crate) mod gpx;
pub(crate) mod model;
