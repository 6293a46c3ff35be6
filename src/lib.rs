//! flow-hooks
//!
//! Subscribable lifecycle events over a game loop the application does not
//! own, plus whole-image pixel uploads into engine textures. The loop (a
//! `winit` window with a `wgpu` surface) fires `initialize`, `update` and
//! `draw`; application code attaches callbacks and pushes pixel data from
//! inside them.
//!
//! High-level modules
//! - `lifecycle`: the event hub and the host-engine seam it calls back into
//! - `flow`: the game loop that drives the hub
//! - `context`: GPU/window context and the handles given to subscribers
//! - `config`: window and frame-pacing settings
//! - `time`: game time and frame statistics
//! - `data_structures`: colours and textures
//! - `resources`: pushing caller data into engine resources
//! - `error`: texture upload failures
//!

pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod lifecycle;
pub mod resources;
pub mod time;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::Vector2;
pub use data_structures::color::Color;
pub use data_structures::texture::{CpuTexture, GpuTexture, PixelTexture, Size};
pub use error::TextureError;
pub use lifecycle::{HostEngine, LifecycleHub, Phase, SubscriptionId};
pub use resources::set_texture_pixels;
pub use time::GameTime;
