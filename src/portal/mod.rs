mod driver;
mod stealth;
mod wait;

pub(crate) mod engine;
pub(crate) mod extractor;
pub(crate) mod helper;
pub(crate) mod html_parsing;
pub(crate) mod normalizer;
pub(crate) mod query_planner;
pub(crate) mod session;

pub use driver::WebDriverLauncher;
pub use engine::Engine;
