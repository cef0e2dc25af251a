mod hash;
mod wallet;

#[cfg(test)]
mod hash_tests;

pub use hash::*;
pub use wallet::*;
