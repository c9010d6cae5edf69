//! Módulo de hashing estable (bucketing de rollout).

pub mod hash;

pub use hash::digest_mod;
