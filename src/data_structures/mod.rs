//! Engine data structures: colours and textures.
//!
//! - `color` contains the RGBA8 colour type and the named palette
//! - `texture` contains the pixel upload primitive and CPU/GPU texture stores

pub mod color;
pub mod texture;
