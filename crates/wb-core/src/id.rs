use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for entity IDs.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// A lightweight, interned identifier shared by nodes and frames.
/// Internally a 4-byte `Spur` index.
///
/// Ordering follows interning order, not string order; it only exists so
/// ids can key ordered maps and graph maps.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(Spur);

impl EntityId {
    /// Intern a string as an EntityId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        EntityId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Look up an id without interning it. `None` means no entity anywhere
    /// in the process was ever given this id.
    pub fn get(s: &str) -> Option<Self> {
        INTERNER.get(s).map(EntityId)
    }
}

/// Hands out `prefix_N` ids, skipping any the caller reports as taken.
///
/// Each board owns one, so two boards in the same process number
/// independently and a loaded board never collides with fresh ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next free id with the given prefix (e.g. `node_3`).
    pub fn next(&mut self, prefix: &str, taken: impl Fn(EntityId) -> bool) -> EntityId {
        loop {
            let candidate = EntityId::intern(&format!("{prefix}_{}", self.next));
            self.next += 1;
            if !taken(candidate) {
                return candidate;
            }
        }
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(EntityId::intern(&s))
    }
}
