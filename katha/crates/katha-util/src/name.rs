//! Identifier names and the per-process hash seed.
//!
//! Environments and module proxies are keyed by identifier. To keep
//! lookup cheap the 64-bit hash of each identifier is computed once,
//! at lexing time, with a seed fixed for the lifetime of the process.
//! A [`Name`] bundles the spelling with that precomputed hash:
//! `Hash` feeds the stored value straight to the hasher, while `Eq`
//! compares the spelling, so two identifiers that happen to collide
//! still resolve to distinct bindings.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use ahash::RandomState;
use rand::RngCore;

/// Per-process seed for identifier and value hashing.
///
/// Derived from the startup clock mixed with OS randomness, making
/// hash values (and therefore internal table layouts) unpredictable
/// across runs.
#[derive(Clone, Copy, Debug)]
pub struct HashSeed {
    state: (u64, u64, u64, u64),
}

impl HashSeed {
    /// Creates the process seed from the current clock.
    pub fn from_clock() -> Self {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        let noise = rand::thread_rng().next_u64();
        Self::from_parts(stamp, noise)
    }

    /// Creates a deterministic seed. Used by tests that need stable
    /// hashes within a run.
    pub fn from_parts(a: u64, b: u64) -> Self {
        Self {
            state: (a, b, a.rotate_left(17) ^ b, b.rotate_left(31) ^ a),
        }
    }

    /// Hashes an identifier spelling with this seed.
    pub fn hash_str(&self, text: &str) -> u64 {
        let (a, b, c, d) = self.state;
        let state = RandomState::with_seeds(a, b, c, d);
        state.hash_one(text)
    }

    /// Hashes raw bytes with this seed.
    pub fn hash_bytes(&self, bytes: &[u8]) -> u64 {
        let (a, b, c, d) = self.state;
        let state = RandomState::with_seeds(a, b, c, d);
        state.hash_one(bytes)
    }
}

/// An identifier: spelling plus its precomputed seeded hash.
///
/// # Examples
///
/// ```
/// use katha_util::name::{HashSeed, Name};
///
/// let seed = HashSeed::from_parts(1, 2);
/// let a = Name::new("ধরি", &seed);
/// let b = Name::new("ধরি", &seed);
/// assert_eq!(a, b);
/// assert_eq!(a.hash64(), b.hash64());
/// ```
#[derive(Clone, Debug)]
pub struct Name {
    text: Rc<str>,
    hash: u64,
}

impl Name {
    /// Creates a name, hashing the spelling with `seed`.
    pub fn new(text: impl Into<Rc<str>>, seed: &HashSeed) -> Self {
        let text = text.into();
        let hash = seed.hash_str(&text);
        Self { text, hash }
    }

    /// Creates a name from a spelling and an already-computed hash.
    ///
    /// The caller must have produced `hash` with the same process
    /// seed; tokens carry exactly that.
    pub fn from_raw(text: impl Into<Rc<str>>, hash: u64) -> Self {
        Self {
            text: text.into(),
            hash,
        }
    }

    /// The identifier spelling.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The precomputed 64-bit hash.
    pub fn hash64(&self) -> u64 {
        self.hash
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        // Hash equality alone is not identity; the spelling decides.
        self.hash == other.hash && self.text == other.text
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
