use euchre_core::model::player::PlayerPosition;

/// Upper bound on distinct seatings of four agents.
pub const MAX_SEAT_PERMUTATIONS: usize = 24;

/// Deterministic seatings of four agents; entry `i` is the agent index at
/// seat `i` (North, East, South, West).
pub struct SeatPermutations {
    permutations: Vec<[usize; 4]>,
}

impl SeatPermutations {
    pub fn new(count: usize) -> Self {
        let limit = count.min(MAX_SEAT_PERMUTATIONS);
        let mut permutations = Vec::with_capacity(limit);
        let mut base = [0usize, 1, 2, 3];
        generate(&mut base, 0, limit, &mut permutations);
        Self { permutations }
    }

    pub fn as_slice(&self) -> &[[usize; 4]] {
        &self.permutations
    }

    pub fn len(&self) -> usize {
        self.permutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permutations.is_empty()
    }
}

/// Agent indices that share a partnership under `permutation`.
pub fn partners(permutation: &[usize; 4], seat: PlayerPosition) -> (usize, usize) {
    (
        permutation[seat.index()],
        permutation[seat.partner().index()],
    )
}

fn generate(data: &mut [usize; 4], start: usize, limit: usize, output: &mut Vec<[usize; 4]>) {
    if output.len() >= limit {
        return;
    }

    if start == data.len() - 1 {
        output.push(*data);
        return;
    }

    for idx in start..data.len() {
        data.swap(start, idx);
        generate(data, start + 1, limit, output);
        data.swap(start, idx);
        if output.len() >= limit {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_permutation_is_identity() {
        let perms = SeatPermutations::new(1);
        assert_eq!(perms.as_slice(), &[[0, 1, 2, 3]]);
    }

    #[test]
    fn caps_at_twenty_four_unique_seatings() {
        let perms = SeatPermutations::new(100);
        assert_eq!(perms.len(), MAX_SEAT_PERMUTATIONS);
        let mut seen = perms.as_slice().to_vec();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), MAX_SEAT_PERMUTATIONS);
    }

    #[test]
    fn default_rotation_changes_partnerships() {
        let perms = SeatPermutations::new(4);
        let pairs: Vec<(usize, usize)> = perms
            .as_slice()
            .iter()
            .map(|perm| partners(perm, PlayerPosition::North))
            .collect();
        assert_eq!(pairs[0], (0, 2));
        assert_eq!(pairs[1], (0, 3));
        assert!(pairs.iter().any(|&(_, partner)| partner == 1));
    }
}
