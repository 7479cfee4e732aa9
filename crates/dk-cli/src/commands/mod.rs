//! CLI command implementations

pub(crate) mod common;
pub(crate) mod create;
pub(crate) mod down;
pub(crate) mod migrate;
pub(crate) mod status;
pub(crate) mod up;

#[cfg(test)]
pub(crate) mod test_support;
