#![doc = include_str!("../README.md")]

pub mod compare;
pub mod equivalence;
pub mod error;
pub mod exec;
pub mod raster;
pub mod textdiff;
pub mod tile;

pub use compare::{compare, images_match, is_blank, ImageComparison};
pub use equivalence::{gerbers_equivalent, svgs_equivalent};
pub use error::{Error, Result};
pub use exec::{run_and_capture, CommandOutput};
pub use raster::{gerbv_installed, GerbvRasterizer, Rasterizer};
pub use textdiff::text_files_match;
pub use tile::{TileGrid, DEFAULT_MAX_PIXELS};
