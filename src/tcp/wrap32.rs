use std::ops::Add;

const PERIOD: u64 = 1 << 32;

/// A 32-bit sequence number in modular arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wrap32 {
    value: u32,
}

impl Wrap32 {
    pub fn new(value: u32) -> Self {
        Wrap32 { value }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    /// Wrap an absolute sequence number against the given zero point
    pub fn wrap(n: u64, zero_point: Wrap32) -> Self {
        Wrap32::new((zero_point.value as u64).wrapping_add(n) as u32)
    }

    /// Unwrap to the absolute sequence number closest to `checkpoint`.
    ///
    /// Considers the candidates in the three 2^32 periods around the
    /// checkpoint's period and picks the one with the least unsigned
    /// distance. Ties go to the smaller value.
    pub fn unwrap(&self, zero_point: Wrap32, checkpoint: u64) -> u64 {
        let base = self.value.wrapping_sub(zero_point.value) as u64;
        let period_index = checkpoint >> 32;

        let mut candidates = Vec::with_capacity(3);
        for index in [period_index.saturating_sub(1), period_index, period_index + 1] {
            if let Some(offset) = index.checked_mul(PERIOD) {
                if let Some(candidate) = base.checked_add(offset) {
                    candidates.push(candidate);
                }
            }
        }

        // Candidates are sorted ascending, so the first minimum wins ties.
        candidates
            .into_iter()
            .min_by_key(|candidate| candidate.abs_diff(checkpoint))
            .unwrap_or(base)
    }
}

impl Add<u32> for Wrap32 {
    type Output = Wrap32;

    fn add(self, rhs: u32) -> Wrap32 {
        Wrap32::new(self.value.wrapping_add(rhs))
    }
}

// -- Unit tests --
