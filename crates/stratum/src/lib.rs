//! # Stratum — Layered 2D Sprite Rendering
//!
//! A backend-agnostic 2D renderer: atlas sprites, vector shapes and text,
//! drawn through one or more cameras onto priority-ordered layers with
//! per-layer z ordering and viewport culling.
//!
//! Start with `use stratum::prelude::*`, fill a [`VisualStore`](store::VisualStore),
//! load atlases into a [`ResourceRegistry`](atlas::ResourceRegistry) and call
//! [`Renderer::render`](render2d::Renderer::render) once per frame with any
//! [`Backend`](render::Backend).

pub mod animation;
pub mod atlas;
pub mod camera;
pub mod config;
pub mod layer;
pub mod math;
pub mod prelude;
pub mod render;
pub mod render2d;
pub mod store;

#[cfg(feature = "hot-reload")]
pub mod asset;
