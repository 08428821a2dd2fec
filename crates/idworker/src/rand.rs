use rand::{Rng, rng};

/// A source of random integers.
///
/// Workers draw from it once per new millisecond to seed the sequence. Plug in
/// a fixed source to make sequences deterministic in tests.
///
/// # Example
/// ```
/// use idworker::RandSource;
///
/// struct FixedRand;
/// impl RandSource for FixedRand {
///     fn rand(&self) -> u64 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedRand.rand(), 1234);
/// ```
pub trait RandSource {
    /// Returns a uniformly distributed random integer.
    fn rand(&self) -> u64;
}

/// A `RandSource` that uses the thread-local RNG (`rand::rng()`).
///
/// The RNG is cryptographically secure (ChaCha-based) and reseeded
/// periodically from the OS.
///
/// ⚠️ NOTE: The underlying `ThreadRng` is not `Send` or `Sync`. This type is a
/// zero-sized wrapper that reaches for the current thread's generator on each
/// call, so it is freely shareable across threads.
#[derive(Default, Clone, Copy, Debug)]
pub struct ThreadRandom;

impl RandSource for ThreadRandom {
    fn rand(&self) -> u64 {
        rng().random()
    }
}
