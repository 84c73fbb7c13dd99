// growable bitfield packed msb-first into bytes,
// with bulk index-set and inclusive range operators

pub mod dsa;

pub use dsa::bitfield::{BitField,BitsError,Result};
