use rand::{RngCore, SeedableRng};
use rand::rngs::StdRng;
use std::fmt;

/// A 96-bit object identifier, rendered as 24 uppercase hex digits.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Gid(String);

impl Gid {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Gid {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Hands out identifiers for one serialization pass.
///
/// The first 32 bits come from a counter so identifiers never collide within
/// one generator, and keep their creation order when Xcode sorts objects by
/// identifier. The remaining 64 bits are random. Seeding the generator makes
/// the output reproducible between runs.
pub struct IdGenerator {
  next: u32,
  rng:  StdRng
}

impl IdGenerator {
  pub fn new() -> Self {
    IdGenerator { next: 0, rng: StdRng::from_entropy() }
  }

  pub fn with_seed(seed: u64) -> Self {
    IdGenerator { next: 0, rng: StdRng::seed_from_u64(seed) }
  }

  /// Number of identifiers handed out so far.
  pub fn count(&self) -> u32 {
    self.next
  }

  pub fn next_id(&mut self) -> Gid {
    let mut bytes = [0u8; 12];
    self.rng.fill_bytes(&mut bytes[4..]);

    let prefix = self.next;
    self.next = self.next.wrapping_add(1);
    bytes[0] =  (prefix >> 24)         as u8;
    bytes[1] = ((prefix >> 16) & 0xFF) as u8;
    bytes[2] = ((prefix >> 8)  & 0xFF) as u8;
    bytes[3] =  (prefix        & 0xFF) as u8;

    let mut id = String::with_capacity(24);
    for b in &bytes {
      id.push(hex_char(b >> 4));
      id.push(hex_char(b & 0xF));
    }
    Gid(id)
  }
}

impl Default for IdGenerator {
  fn default() -> Self {
    Self::new()
  }
}

fn hex_char(b: u8) -> char {
  match b < 10 {
    true  => (b'0' + b)        as char,
    false => (b'A' + (b - 10)) as char
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  #[test]
  fn ids_are_24_hex_digits() {
    let id = IdGenerator::new().next_id();
    assert_eq!(id.as_str().len(), 24);
    assert!(id.as_str().chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
  }

  #[test]
  fn ids_are_unique_and_ordered() {
    let mut g   = IdGenerator::new();
    let ids     = (0..10_000).map(|_| g.next_id()).collect::<Vec<_>>();
    let uniques = ids.iter().collect::<HashSet<_>>();
    assert_eq!(uniques.len(), ids.len());
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(g.count(), 10_000);
  }

  #[test]
  fn seeded_generators_repeat() {
    let mut a = IdGenerator::with_seed(42);
    let mut b = IdGenerator::with_seed(42);
    for _ in 0..16 {
      assert_eq!(a.next_id(), b.next_id());
    }
  }
}
