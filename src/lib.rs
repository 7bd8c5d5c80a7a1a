//! Playback of recorded entity positions as moving wireframe markers.
//!
//! A position log is loaded into a [`track::TrackLog`], replayed at an
//! advancing simulation time by a [`track::Interpolator`], and every frame is
//! drawn headlessly through a [`camera::FreeFlyCamera`].

pub mod aabb;
pub mod camera;
pub mod clock;
pub mod color;
pub mod config;
pub mod scene;
pub mod track;
