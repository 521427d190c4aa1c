use rand::{rngs::SmallRng, Rng, SeedableRng};

/// Independent random streams derived from the world seed.
#[derive(Clone, Copy, Debug)]
#[repr(u64)]
pub enum Stream {
    Agent = 1,
    Contact = 2,
    Placement = 3,
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Mixes `keys` into `seed`. The result only depends on the values, so two
/// callers asking for the same keys always get the same number regardless of
/// the order in which they ask.
pub fn keyed_seed(seed: u64, stream: Stream, keys: &[u64]) -> u64 {
    keys.iter()
        .fold(splitmix64(seed ^ stream as u64), |h, k| splitmix64(h ^ k))
}

pub fn keyed_rng(seed: u64, stream: Stream, keys: &[u64]) -> SmallRng {
    SmallRng::seed_from_u64(keyed_seed(seed, stream, keys))
}

/// Draws from `[-range, range]`.
pub fn symmetric<R: Rng>(rng: &mut R, range: f64) -> f64 {
    if range == 0.0 {
        0.0
    } else {
        rng.gen_range(-range..=range)
    }
}
