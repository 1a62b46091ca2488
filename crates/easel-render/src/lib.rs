//! Easel Render Library
//!
//! CPU rendering of Easel scenes, PNG export, and the `image`-backed decoder
//! and filter backend the editor plugs in.

pub mod export;
pub mod filters;
mod raster;
mod renderer;
mod surface;

pub use export::{encode_png, export_png};
pub use filters::{ImageFilters, apply_filter, apply_filters, decode_image};
pub use renderer::{CpuRenderer, MAX_SURFACE_SIZE, RenderError, RenderResult, Renderer, render};
pub use surface::LiveSurface;
