pub use crate::app::App;
pub use taskmart_types::prelude::*;

// vim: ts=4
