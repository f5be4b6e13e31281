//! Wallpaper upload pipeline.
//!
//! [`receive`] drains the multipart body onto disk; [`upload`] validates the
//! batch, runs live media through the transformer, and appends items to the
//! target group.

pub mod receive;
pub mod upload;
