//! Interactive session: device selection, then scanning page after page.

mod app;
mod screens;

pub use app::run;
