//! Collision-free temporary names.
//!
//! Names are content-addressed: a scope's seed is a SHA-256 digest of where
//! it lives (source name and call offset, or its parent's seed), and each
//! name mixes the seed with the hint and a per-scope counter. The same input
//! always yields the same names, and no state is shared between scopes.

use sha2::{Digest, Sha256};

pub const DEFAULT_PREFIX: &str = "__macro_local_";

#[derive(Debug, Clone)]
pub struct FreshNames {
    prefix: String,
    seed: [u8; 32],
    counter: u64,
}

impl FreshNames {
    /// A top-level scope for the call starting at `offset` in `source_name`.
    pub fn root(prefix: impl Into<String>, source_name: &str, offset: usize) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source_name.as_bytes());
        hasher.update(offset.to_le_bytes());
        Self {
            prefix: prefix.into(),
            seed: hasher.finalize().into(),
            counter: 0,
        }
    }

    /// A scope for a call nested inside this one at `offset`.
    pub fn child(&self, offset: usize) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(self.seed);
        hasher.update(b"/");
        hasher.update(offset.to_le_bytes());
        Self {
            prefix: self.prefix.clone(),
            seed: hasher.finalize().into(),
            counter: 0,
        }
    }

    /// Produces `<prefix><len(hint)><hint><6 hex>_`, skipping any candidate
    /// that already occurs in one of the `reserved` texts.
    pub fn make_unique(&mut self, hint: &str, reserved: &[&str]) -> String {
        loop {
            let mut hasher = Sha256::new();
            hasher.update(self.seed);
            hasher.update(hint.as_bytes());
            hasher.update(self.counter.to_le_bytes());
            self.counter += 1;

            let digest = hasher.finalize();
            let suffix: String = digest[..3].iter().map(|b| format!("{b:02x}")).collect();
            let name = format!("{}{}{}{}_", self.prefix, hint.len(), hint, suffix);
            if !reserved.iter().any(|text| text.contains(&name)) {
                return name;
            }
            tracing::trace!(name = %name, "fresh name collides with source text, retrying");
        }
    }
}
