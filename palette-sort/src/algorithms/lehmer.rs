use rand::{Error, RngCore};

const MULTIPLIER: u64 = 16807;
const MODULUS: u64 = (1 << 31) - 1;

/// Park-Miller minimal standard generator. Seeded identically, it produces
/// the same stream on every platform and every run.
#[derive(Debug, Clone)]
pub struct Lehmer {
    state: u64,
}

impl Lehmer {
    pub fn new(seed: u32) -> Self {
        let state = seed as u64 % MODULUS;
        Self {
            state: if state == 0 { 1 } else { state },
        }
    }

    /// The raw sequence, in `1..2^31 - 1`.
    pub fn step(&mut self) -> u32 {
        self.state = self.state * MULTIPLIER % MODULUS;
        self.state as u32
    }
}

impl Default for Lehmer {
    fn default() -> Self {
        Self::new(1)
    }
}

impl RngCore for Lehmer {
    /// Two raw steps contribute their top 16 of 31 bits each.
    fn next_u32(&mut self) -> u32 {
        let high = self.step() >> 15;
        let low = self.step() >> 15;
        (high << 16) | low
    }

    fn next_u64(&mut self) -> u64 {
        ((self.next_u32() as u64) << 32) | self.next_u32() as u64
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
