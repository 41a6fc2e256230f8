pub use taskmart_types::prelude::*;

// vim: ts=4
