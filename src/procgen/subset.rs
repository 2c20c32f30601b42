// seeded Fisher-Yates subset selection
//
// picks which buildings receive a damage effect: uniform, without replacement,
// and reproducible for a given stream state

use std::collections::HashSet;

use super::rng::SeedStream;

/// The chosen indices, in shuffle order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DamageSelection {
    order: Vec<usize>,
    members: HashSet<usize>,
}

impl DamageSelection {
    pub fn contains(&self, index: usize) -> bool {
        self.members.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.order.iter().copied()
    }
}

/// Selects `count` distinct indices from `0..population`, drawing from `stream`.
/// `count` is clamped to `population`; an empty result consumes no draws.
pub fn select(population: usize, count: usize, stream: &mut SeedStream) -> DamageSelection {
    let count = count.min(population);
    if count == 0 {
        return DamageSelection::default();
    }

    let mut indices: Vec<usize> = (0..population).collect();
    for i in (1..population).rev() {
        let j = stream.index_inclusive(i);
        indices.swap(i, j);
    }
    indices.truncate(count);

    let members = indices.iter().copied().collect();
    DamageSelection {
        order: indices,
        members,
    }
}

/// Same as [`select`] on a fresh stream for `seed`.
pub fn select_seeded(population: usize, count: usize, seed: u64) -> DamageSelection {
    select(population, count, &mut SeedStream::new(seed))
}
