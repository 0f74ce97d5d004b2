//! Seed-sweep expansion: each base seed deterministically derives its
//! extra iterations, so a sweep is reproducible from the command line.

use anyhow::{Context, Result, bail};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Parse the comma-separated seed list and expand each entry to
/// `iterations` seeds (the base seed first, derived seeds after).
pub fn resolve_seed_inputs(input: &str, iterations: usize) -> Result<Vec<u64>> {
    let mut bases = Vec::new();
    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let seed = parse_seed(part).with_context(|| format!("invalid seed `{part}`"))?;
        bases.push(seed);
    }
    if bases.is_empty() {
        bail!("no seeds given");
    }

    let per_base = iterations.max(1);
    let mut seeds = Vec::with_capacity(bases.len() * per_base);
    for base in bases {
        seeds.push(base);
        let mut derive = ChaCha20Rng::seed_from_u64(base);
        for _ in 1..per_base {
            seeds.push(derive.r#gen());
        }
    }
    Ok(seeds)
}

fn parse_seed(part: &str) -> Result<u64> {
    let parsed = if let Some(hex) = part.strip_prefix("0x").or_else(|| part.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)?
    } else {
        part.parse::<u64>()?
    };
    Ok(parsed)
}
