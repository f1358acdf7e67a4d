pub mod http;
pub mod sampler;
pub mod source;
pub mod stats;
pub mod window;

pub use http::HttpRasterSource;
pub use sampler::{points_from_window, points_within, sample_raster};
pub use source::{GridFileSource, RasterSource, RetryOnce};
pub use stats::{HumusStats, StatsUnavailable, humus_stats};
pub use window::{GeoGrid, RasterWindow};
