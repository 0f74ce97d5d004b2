//! Deterministic RNG stream derivation.
//!
//! Every randomized subsystem draws from its own stream, seeded by
//! domain-separating the user-visible session seed. Identical seeds
//! therefore replay identical simulations regardless of how often the
//! other streams are consumed.

use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

pub(crate) fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes())
        .expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// Stream for the classmate simulation.
#[must_use]
pub fn sim_rng(user_seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(derive_stream_seed(user_seed, b"classmates"))
}

/// Stream for cosmetic chat draws.
#[must_use]
pub fn chat_rng(user_seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(derive_stream_seed(user_seed, b"chat"))
}
