pub mod clock;
pub mod logging;
pub mod text;
pub mod time;
