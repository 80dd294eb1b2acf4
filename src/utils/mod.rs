pub mod screenshot;

pub use screenshot::ScreenshotSink;
