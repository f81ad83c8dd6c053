//! Library side of `proof_tool`: checking `eth_getProof` responses offline,
//! and the logging setup of the binary.

pub mod eip1186;
pub mod tracing;
