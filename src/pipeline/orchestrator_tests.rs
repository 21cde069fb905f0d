use std::sync::Arc;

use crate::config::{CodecConfig, SelectionPolicy};
use crate::error::CodecError;
use crate::pipeline::descriptor::{
    ItemWidth, PacketAlgorithm, PropertyAlgorithm, DEFAULT_COMPRESSION, LEMPEL_ZIV,
};
use crate::pipeline::orchestrator::Codec;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// Test Helpers
/// Every packet hint the round-trip tests sweep over.
fn all_packet_hints() -> Vec<u8> {
    let mut hints = vec![DEFAULT_COMPRESSION, 0x00, 0x20];
    hints.extend(0x80..0x88u8);
    hints
}

/// Compresses with `hint`, checks the descriptor parses, and decodes again.
fn roundtrip_samples(codec: &Codec, samples: &[i32], hint: u8) -> Vec<u8> {
    let compressed = codec.compress_packet_data(samples, hint).unwrap();
    let (consumed, decoded) = codec
        .decompress_packet_data(&compressed, samples.len())
        .unwrap();
    assert_eq!(decoded, samples, "hint 0x{:02X}", hint);
    assert_eq!(consumed, compressed.len(), "hint 0x{:02X}", hint);
    compressed
}

fn stroke_channel(len: usize) -> Vec<i32> {
    // A smooth pen trajectory with a little jitter.
    (0..len as i32)
        .map(|i| 1_000 + i * 12 + (i * i) / 40 + (i % 3) - 1)
        .collect()
}

//==================================================================================
// 1. Concrete Packet Scenarios
//==================================================================================

#[test]
fn test_all_zero_samples_pick_width_one_or_the_zero_bucket() {
    let codec = Codec::new();
    for hint in all_packet_hints() {
        let compressed = roundtrip_samples(&codec, &[0, 0, 0], hint);
        match PacketAlgorithm::from_byte(compressed[0]).unwrap() {
            PacketAlgorithm::Gorilla { bit_width, .. } => assert_eq!(bit_width, 1),
            PacketAlgorithm::Huffman { .. } => {
                // Three zero-bucket codes fit in one byte.
                assert_eq!(compressed.len(), 2);
            }
        }
    }
}

#[test]
fn test_near_constant_samples_use_delta_delta_gorilla() {
    let codec = Codec::new();
    let samples = [100, 101, 99, 100, 100];
    let compressed = roundtrip_samples(&codec, &samples, 0x20);
    match PacketAlgorithm::from_byte(compressed[0]).unwrap() {
        PacketAlgorithm::Gorilla {
            bit_width,
            delta_delta,
        } => {
            assert!(delta_delta);
            assert!(bit_width <= 4);
        }
        other => panic!("expected gorilla, got {:?}", other),
    }
}

#[test]
fn test_default_hint_prefers_gorilla_on_a_size_tie() {
    let codec = Codec::new();
    let samples = [100, 101, 99, 100, 100];
    let huffman = codec.compress_packet_data(&samples, 0x82).unwrap();
    let gorilla = codec.compress_packet_data(&samples, 0x20).unwrap();
    assert_eq!(huffman.len(), gorilla.len());

    let compressed = roundtrip_samples(&codec, &samples, DEFAULT_COMPRESSION);
    match PacketAlgorithm::from_byte(compressed[0]).unwrap() {
        PacketAlgorithm::Gorilla {
            bit_width,
            delta_delta,
        } => {
            assert!(delta_delta);
            assert!(bit_width <= 4);
        }
        other => panic!("expected gorilla, got {:?}", other),
    }
    assert_eq!(compressed, gorilla);
}

#[test]
fn test_every_hint_roundtrips_a_stroke() {
    let codec = Codec::new();
    let samples = stroke_channel(257);
    for hint in all_packet_hints() {
        roundtrip_samples(&codec, &samples, hint);
    }
}

#[test]
fn test_extreme_values_roundtrip_through_huffman_escapes() {
    let codec = Codec::new();
    let samples = vec![i32::MIN, i32::MAX, i32::MIN, 0, -1, 1, i32::MAX];
    for hint in all_packet_hints() {
        roundtrip_samples(&codec, &samples, hint);
    }
}

#[test]
fn test_single_sample_roundtrips() {
    let codec = Codec::new();
    for hint in all_packet_hints() {
        roundtrip_samples(&codec, &[-42], hint);
    }
}

//==================================================================================
// 2. Selection Rules
//==================================================================================

#[test]
fn test_default_hint_never_keeps_an_expanding_huffman() {
    let codec = Codec::new();
    let mut rng = StdRng::seed_from_u64(0x1A2B_3C4D);
    for _ in 0..20 {
        let samples: Vec<i32> = (0..200).map(|_| rng.random::<i32>()).collect();
        let compressed = roundtrip_samples(&codec, &samples, DEFAULT_COMPRESSION);
        assert!(
            matches!(
                PacketAlgorithm::from_byte(compressed[0]).unwrap(),
                PacketAlgorithm::Gorilla { .. }
            ),
            "random wide samples must fall back to gorilla, got 0x{:02X}",
            compressed[0]
        );
    }
}

#[test]
fn test_default_hint_is_never_larger_than_gorilla() {
    let codec = Codec::new();
    let mut rng = StdRng::seed_from_u64(7);
    for round in 0..50 {
        let spread = 1i32 << (round % 31);
        let samples: Vec<i32> = (0..64).map(|_| rng.random_range(-spread..spread)).collect();
        let chosen = codec.compress_packet_data(&samples, DEFAULT_COMPRESSION).unwrap();
        let gorilla = codec.compress_packet_data(&samples, 0x20).unwrap();
        assert!(chosen.len() <= gorilla.len());
    }
}

#[test]
fn test_explicit_huffman_falls_back_only_past_four_bytes_per_sample() {
    let codec = Codec::new();
    let alternating: Vec<i32> = (0..16)
        .map(|i| if i % 2 == 0 { i32::MAX } else { i32::MIN })
        .collect();
    let compressed = roundtrip_samples(&codec, &alternating, 0x80);
    assert_eq!(compressed[0] & 0xC0, 0x00);

    // Smooth data stays on the requested table.
    let compressed = roundtrip_samples(&codec, &stroke_channel(64), 0x85);
    assert_eq!(compressed[0], 0x85);
}

#[test]
fn test_legacy_ratio_policy_keeps_modest_huffman() {
    let config = CodecConfig::from_json(r#"{"packet_selection": "legacy_ratio"}"#).unwrap();
    assert_eq!(config.packet_selection, SelectionPolicy::LegacyRatio);
    let codec = Codec::with_config(Arc::new(config)).unwrap();

    let samples = stroke_channel(100);
    let compressed = roundtrip_samples(&codec, &samples, DEFAULT_COMPRESSION);
    assert!(matches!(
        PacketAlgorithm::from_byte(compressed[0]).unwrap(),
        PacketAlgorithm::Huffman { .. }
    ));
}

//==================================================================================
// 3. Custom Huffman Tables
//==================================================================================

#[test]
fn test_custom_table_is_addressed_after_the_defaults() {
    let mut codec = Codec::new();
    let index = codec.register_huffman_table(&[0, 2, 4, 32]).unwrap();
    assert_eq!(index, 8);

    let samples = stroke_channel(40);
    let compressed = roundtrip_samples(&codec, &samples, 0x80 | index);
    assert_eq!(compressed[0], 0x88);

    // A codec without the table cannot read the payload.
    let result = Codec::new().decompress_packet_data(&compressed, samples.len());
    assert!(matches!(result, Err(CodecError::MalformedInput(_))));
}

#[test]
fn test_custom_tables_from_config() {
    let config = CodecConfig {
        custom_huffman_tables: vec![vec![0, 32], vec![0, 1, 2, 32]],
        ..CodecConfig::default()
    };
    let codec = Codec::with_config(Arc::new(config)).unwrap();
    roundtrip_samples(&codec, &stroke_channel(30), 0x89);

    let bad = CodecConfig {
        custom_huffman_tables: vec![vec![0, 4, 8]],
        ..CodecConfig::default()
    };
    assert!(matches!(
        Codec::with_config(Arc::new(bad)),
        Err(CodecError::InvalidArgument(_))
    ));
}

#[test]
fn test_custom_table_registry_is_bounded() {
    let mut codec = Codec::new();
    for expected in 8..=31u8 {
        assert_eq!(codec.register_huffman_table(&[0, 32]).unwrap(), expected);
    }
    assert!(codec.register_huffman_table(&[0, 32]).is_err());
}

//==================================================================================
// 4. Argument Errors & Bounded Decode
//==================================================================================

#[test]
fn test_invalid_packet_arguments() {
    let codec = Codec::new();
    assert!(matches!(
        codec.compress_packet_data(&[], DEFAULT_COMPRESSION),
        Err(CodecError::InvalidArgument(_))
    ));
    assert!(matches!(
        codec.compress_packet_data(&[1, 2, 3], 0x40),
        Err(CodecError::InvalidArgument(_))
    ));
    assert!(matches!(
        codec.compress_packet_data(&[1, 2, 3], 0x88),
        Err(CodecError::InvalidArgument(_))
    ));
    assert!(matches!(
        codec.decompress_packet_data(&[], 1),
        Err(CodecError::InvalidArgument(_))
    ));
}

#[test]
fn test_huge_count_on_short_buffer_is_malformed() {
    let codec = Codec::new();
    for input in [&[0x00u8, 0x01][..], &[0x20, 0x02, 0x04, 0x00], &[0x82, 0xFF]] {
        assert!(
            matches!(
                codec.decompress_packet_data(input, usize::MAX),
                Err(CodecError::MalformedInput(_))
            ),
            "descriptor 0x{:02X}",
            input[0]
        );
    }
}

#[test]
fn test_zero_count_consumes_only_the_descriptor() {
    let codec = Codec::new();
    let compressed = codec
        .compress_packet_data(&stroke_channel(20), DEFAULT_COMPRESSION)
        .unwrap();
    assert_eq!(
        codec.decompress_packet_data(&compressed, 0).unwrap(),
        (1, Vec::new())
    );
}

#[test]
fn test_reserved_descriptor_family_is_malformed() {
    let codec = Codec::new();
    assert!(matches!(
        codec.decompress_packet_data(&[0x41, 0x00], 1),
        Err(CodecError::MalformedInput(_))
    ));
}

#[test]
fn test_every_truncation_is_malformed() {
    let codec = Codec::new();
    let samples = stroke_channel(50);
    for hint in all_packet_hints() {
        let compressed = codec.compress_packet_data(&samples, hint).unwrap();
        for cut in 1..compressed.len() {
            let result = codec.decompress_packet_data(&compressed[..cut], samples.len());
            assert!(
                matches!(result, Err(CodecError::MalformedInput(_))),
                "hint 0x{:02X}, cut at {}",
                hint,
                cut
            );
        }
    }
}

#[test]
fn test_shorter_count_decodes_a_prefix() {
    let codec = Codec::new();
    let samples = stroke_channel(30);
    for hint in all_packet_hints() {
        let compressed = codec.compress_packet_data(&samples, hint).unwrap();
        let (consumed, decoded) = codec.decompress_packet_data(&compressed, 10).unwrap();
        assert_eq!(decoded, &samples[..10]);
        assert!(consumed <= compressed.len());
    }
}

#[test]
fn test_shared_codec_serves_concurrent_callers() {
    std::thread::scope(|scope| {
        for seed in 0..4u64 {
            scope.spawn(move || {
                let mut rng = StdRng::seed_from_u64(seed);
                let samples: Vec<i32> = (0..500).map(|_| rng.random_range(-300..300)).collect();
                roundtrip_samples(Codec::shared(), &samples, DEFAULT_COMPRESSION);
            });
        }
    });
}

//==================================================================================
// 5. Property Buffers
//==================================================================================

#[test]
fn test_property_default_hint_roundtrips_odd_and_even_lengths() {
    let codec = Codec::new();
    for bytes in [
        vec![7u8],
        vec![1, 2, 3],
        vec![0xFF, 0xFF, 0x00, 0x00],
        (0..=255u8).collect::<Vec<_>>(),
        vec![0x10, 0x27, 0x00, 0x00, 0xF0, 0xD8, 0xFF, 0xFF], // 10000, -10000
    ] {
        let compressed = codec.compress_property_data(&bytes, DEFAULT_COMPRESSION).unwrap();
        assert_eq!(codec.decompress_property_data(&compressed).unwrap(), bytes);
    }
}

#[test]
fn test_property_ints_choose_int_items() {
    let codec = Codec::new();
    let items: Vec<i32> = vec![100_000, -100_000, 5, 70_000];
    let bytes: Vec<u8> = items.iter().flat_map(|v| v.to_le_bytes()).collect();
    let compressed = codec.compress_property_data(&bytes, DEFAULT_COMPRESSION).unwrap();
    match PropertyAlgorithm::from_byte(compressed[0]).unwrap() {
        PropertyAlgorithm::Gorilla(layout) => {
            assert_eq!(layout.item_width, ItemWidth::Int);
            assert_eq!(layout.bit_width, 18);
        }
        other => panic!("expected gorilla, got {:?}", other),
    }
    assert_eq!(compressed.len(), 1 + 9);
    assert_eq!(codec.decompress_property_data(&compressed).unwrap(), bytes);
}

#[test]
fn test_property_explicit_hints() {
    let codec = Codec::new();
    let bytes: Vec<u8> = [3i16, -4, 0, 2]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();

    // Short items, 16 bits.
    let compressed = codec.compress_property_data(&bytes, 0x20 | 24).unwrap();
    assert_eq!(compressed[0], 0x20 | 24);
    assert_eq!(compressed.len(), 1 + 8);
    assert_eq!(codec.decompress_property_data(&compressed).unwrap(), bytes);

    // Byte items, 8 bits: the pad is recomputed from the data.
    let compressed = codec.compress_property_data(&bytes, 0x00).unwrap();
    assert_eq!(codec.decompress_property_data(&compressed).unwrap(), bytes);

    // Int items on a buffer that is not a multiple of four bytes.
    assert!(matches!(
        codec.compress_property_data(&bytes[..6], 0x40 | 40),
        Err(CodecError::InvalidArgument(_))
    ));
    // A hinted width too narrow for the data.
    assert!(matches!(
        codec.compress_property_data(&[0x7F], 0x02),
        Err(CodecError::InvalidArgument(_))
    ));
}

#[test]
fn test_property_invalid_arguments() {
    let codec = Codec::new();
    assert!(matches!(
        codec.compress_property_data(&[], DEFAULT_COMPRESSION),
        Err(CodecError::InvalidArgument(_))
    ));
    assert!(matches!(
        codec.compress_property_data(&[1, 2], LEMPEL_ZIV),
        Err(CodecError::InvalidArgument(_))
    ));
    assert!(matches!(
        codec.decompress_property_data(&[]),
        Err(CodecError::InvalidArgument(_))
    ));
    assert!(matches!(
        codec.decompress_property_data(&[0x08]),
        Err(CodecError::MalformedInput(_))
    ));
}

#[test]
fn test_property_lz_payload_decodes() {
    let codec = Codec::new();
    let input = [LEMPEL_ZIV, 0xFF, b'p', b'r', b'e', b's', b's', b'u', b'r', b'e'];
    assert_eq!(
        codec.decompress_property_data(&input).unwrap(),
        b"pressure".to_vec()
    );
}

#[test]
fn test_property_decode_respects_item_limit() {
    let config = CodecConfig {
        max_property_items: 4,
        ..CodecConfig::default()
    };
    let codec = Codec::with_config(Arc::new(config)).unwrap();
    let compressed = codec
        .compress_property_data(&[1, 2, 3, 4, 5], DEFAULT_COMPRESSION)
        .unwrap();
    assert!(matches!(
        codec.decompress_property_data(&compressed),
        Err(CodecError::MalformedInput(_))
    ));

    let lz = [LEMPEL_ZIV, 0xFF, 1, 2, 3, 4, 5];
    assert!(matches!(
        codec.decompress_property_data(&lz),
        Err(CodecError::MalformedInput(_))
    ));
}
