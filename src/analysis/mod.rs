//! Static analysis over computation graphs.
pub mod topology;
