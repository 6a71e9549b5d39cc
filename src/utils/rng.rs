//! Seedable random source.
//!
//! Weight initialization, dropout masks and visitation-order shuffling all
//! draw from a [`SimpleRng`], so a fixed seed reproduces a training run.

/// Xorshift64 generator.
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    /// A zero seed would lock xorshift at zero; it is replaced by a fixed
    /// non-zero constant.
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 0x9e37_79b9_7f4a_7c15 } else { seed };
        Self { state }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform in `[0, 1)` from the top 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in `[low, high)`.
    pub fn gen_range_f64(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }

    /// Uniform in `[0, upper)`; `0` when `upper == 0`.
    pub fn gen_usize(&mut self, upper: usize) -> usize {
        match upper {
            0 => 0,
            n => (self.next_u64() % n as u64) as usize,
        }
    }

    /// In-place Fisher-Yates permutation.
    pub fn shuffle_usize(&mut self, data: &mut [usize]) {
        for i in (1..data.len()).rev() {
            let j = self.gen_usize(i + 1);
            data.swap(i, j);
        }
    }
}

impl Default for SimpleRng {
    fn default() -> Self {
        Self::new(0)
    }
}
