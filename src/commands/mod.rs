mod clip;
mod help;
mod start;

pub use clip::clip;
pub use help::help;
pub use start::start;
