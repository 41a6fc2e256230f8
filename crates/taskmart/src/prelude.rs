pub use taskmart_core::prelude::*;

// vim: ts=4
