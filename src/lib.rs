//! I Need A Smile - one click, one silly picture
//!
//! Picks a scene from weighted inspiration tags, asks an image-generation
//! API to paint it, and learns from the 1-5 star ratings which tags make
//! people smile. Served over HTTP behind a reverse proxy.

pub mod config;
pub mod imagegen;
pub mod inspiration;
pub mod proxy;
pub mod server;
pub mod service;
pub mod storage;
