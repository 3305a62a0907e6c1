pub mod factor;
pub mod smart_resize;

pub use smart_resize::{smart_resize, SmartResizeParams};
