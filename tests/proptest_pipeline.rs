//! Property-based tests for the compression pipeline.
//!
//! - compress then decompress gives back the input
//! - the suffix array matches a naive rotation sort
//! - MTF/RLE2 decoding reproduces the encoder's input

use proptest::prelude::*;

use rbzip2::bwt_algorithms::bwt_decode::bwt_decode;
use rbzip2::bwt_algorithms::bwt_sort::{bwt_encode, naive_rotation_sort, suffix_array};
use rbzip2::tools::rle2_mtf::rle2_mtf_encode;
use rbzip2::tools::rle2_mtf_decode::Rle2MtfDecoder;
use rbzip2::{compress, decompress, CompressionLevel};

/// Bytes from a small alphabet, which gives long repeats and runs.
fn low_entropy_strategy(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop_oneof![Just(b'a'), Just(b'b'), Just(b'c')], 0..max_len)
}

/// Any bytes.
fn any_bytes_strategy(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..max_len)
}

/// Runs of random length, to exercise RLE1 and RUNA/RUNB.
fn runs_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec((any::<u8>(), 1_usize..600), 0..20).prop_map(|runs| {
        runs.into_iter()
            .flat_map(|(byte, len)| std::iter::repeat(byte).take(len))
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        max_shrink_iters: 200,
        ..ProptestConfig::default()
    })]

    #[test]
    fn prop_round_trip_any(data in any_bytes_strategy(4000)) {
        let packed = compress(&data, CompressionLevel::new(1)).unwrap();
        prop_assert_eq!(decompress(&packed).unwrap(), data);
    }

    #[test]
    fn prop_round_trip_low_entropy(data in low_entropy_strategy(4000)) {
        let packed = compress(&data, CompressionLevel::new(9)).unwrap();
        prop_assert_eq!(decompress(&packed).unwrap(), data);
    }

    #[test]
    fn prop_round_trip_runs(data in runs_strategy()) {
        let packed = compress(&data, CompressionLevel::new(2)).unwrap();
        prop_assert_eq!(decompress(&packed).unwrap(), data);
    }

    #[test]
    fn prop_suffix_array_matches_naive(data in low_entropy_strategy(200)) {
        prop_assert_eq!(suffix_array(&data), naive_rotation_sort(&data));
    }

    #[test]
    fn prop_suffix_array_matches_naive_any(data in any_bytes_strategy(200)) {
        prop_assert_eq!(suffix_array(&data), naive_rotation_sort(&data));
    }

    #[test]
    fn prop_bwt_inverts(data in low_entropy_strategy(1000)) {
        prop_assume!(!data.is_empty());
        let (key, bwt) = bwt_encode(&data);
        prop_assert_eq!(bwt_decode(key, &bwt), data);
    }

    #[test]
    fn prop_mtf_rle2_inverts(data in runs_strategy()) {
        prop_assume!(!data.is_empty());
        let mut in_use = [false; 256];
        data.iter().for_each(|&b| in_use[b as usize] = true);
        let encoded = rle2_mtf_encode(&data, &in_use);
        let symbols = (0..=255_u8).filter(|&b| in_use[b as usize]).collect();
        let mut decoder = Rle2MtfDecoder::new(symbols, data.len());
        let mut done = false;
        for &symbol in &encoded.symbols {
            prop_assert!(!done);
            done = decoder.decode_symbol(symbol).unwrap();
        }
        prop_assert!(done);
        prop_assert_eq!(decoder.finish().0, data);
    }
}
