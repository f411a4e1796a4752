use rayon::prelude::*;

/// Returns a frequency count of the bytes in `data`. Uses parallelism when the data set is
/// over 64k.
pub fn freqs(data: &[u8]) -> [u32; 256] {
    if data.len() > 64_000 {
        // 16k is pretty much the sweet spot for chunk size.
        data.par_chunks(16_000)
            .fold(
                || [0_u32; 256],
                |mut freqs, chunk| {
                    chunk.iter().for_each(|&el| freqs[el as usize] += 1);
                    freqs
                },
            )
            .reduce(
                || [0_u32; 256],
                |mut s, f| {
                    s.iter_mut().zip(f.iter()).for_each(|(a, b)| *a += b);
                    s
                },
            )
    } else {
        let mut freqs = [0_u32; 256];
        data.iter().for_each(|&el| freqs[el as usize] += 1);
        freqs
    }
}

#[cfg(test)]
mod test {
    use super::freqs;

    #[test]
    fn small_freqs_test() {
        let f = freqs(b"hello");
        assert_eq!(f[b'l' as usize], 2);
        assert_eq!(f[b'h' as usize], 1);
        assert_eq!(f.iter().sum::<u32>(), 5);
    }

    #[test]
    fn parallel_freqs_match_sequential() {
        let data = (0..200_000_u32)
            .map(|i| (i * 7 % 251) as u8)
            .collect::<Vec<u8>>();
        let mut expected = [0_u32; 256];
        data.iter().for_each(|&b| expected[b as usize] += 1);
        assert_eq!(freqs(&data), expected);
    }
}
