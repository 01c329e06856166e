//! HTTP surface for the Verifily engine (used by the `verifily` binary and tests).

pub mod gateway;
