/// Inverse Burrows-Wheeler-Transform, handing out the original block one byte at a time.
///
/// Each entry of the merged array holds, in its high 24 bits, the row of the next byte and, in
/// its low 8 bits, the byte itself. Following the chain from the start pointer walks the block
/// in its original order.
#[derive(Debug)]
pub struct InverseBwt {
    merged: Vec<u32>,
    current: u32,
    remaining: usize,
}

impl InverseBwt {
    /// Build the merged array. `counts` are the byte frequencies of `bwt`, and `start` must be
    /// less than `bwt.len()` (the decoder checks this before getting here).
    pub fn new(bwt: &[u8], counts: &[u32; 256], start: usize) -> Self {
        // Convert frequency count to a cumulative sum of frequencies
        let mut base = [0_u32; 256];
        for i in 0..255 {
            base[i + 1] = base[i] + counts[i];
        }

        let mut merged = vec![0_u32; bwt.len()];
        for (i, &s) in bwt.iter().enumerate() {
            merged[base[s as usize] as usize] = (i as u32) << 8 | s as u32;
            base[s as usize] += 1;
        }

        let current = merged.get(start).copied().unwrap_or(0);
        Self {
            merged,
            current,
            remaining: bwt.len(),
        }
    }
}

impl Iterator for InverseBwt {
    type Item = u8;

    #[inline]
    fn next(&mut self) -> Option<u8> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let byte = self.current as u8;
        self.current = self.merged[(self.current >> 8) as usize];
        Some(byte)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for InverseBwt {}

/// Decode a whole Burrows-Wheeler-Transform at once.
pub fn bwt_decode(key: u32, bwt_in: &[u8]) -> Vec<u8> {
    let counts = crate::tools::freq_count::freqs(bwt_in);
    InverseBwt::new(bwt_in, &counts, key as usize).collect()
}
