//! Property-based tests for heap preservation and signature removal
//!
//! Uses proptest to check the rewrite invariants across random heaps,
//! checksum algorithms and TOC shapes

mod common;

use common::{parse, Fixture};
use proptest::prelude::*;
use std::fs;
use tempfile::TempDir;
use xar_unsign::{strip_signature, Outcome, StripOptions};

fn toc_with(files: usize, signed: bool) -> String {
    let mut toc = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><xar><toc>");
    toc.push_str("<creation-time>2012-03-24T17:00:00</creation-time>");
    if signed {
        toc.push_str("<signature style=\"RSA\"><offset>20</offset><size>256</size></signature>");
    }
    for i in 0..files {
        toc.push_str(&format!(
            "<file id=\"{}\"><name>file{}</name><data><offset>{}</offset></data></file>",
            i + 1,
            i,
            i * 512
        ));
    }
    toc.push_str("</toc></xar>");
    toc
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_heap_bytes_preserved(
        heap in prop::collection::vec(any::<u8>(), 0..32 * 1024),
        alg in 0u32..3,
        files in 0usize..40,
    ) {
        let dir = TempDir::new().unwrap();
        let fixture = Fixture::new(&toc_with(files, true), alg).with_heap(heap);
        let source = fixture.write_to(&dir.path().join("in.pkg"));
        let dest = dir.path().join("out.pkg");

        let report = strip_signature(&source, Some(&dest), &StripOptions::default()).unwrap();
        prop_assert!(report.outcome.is_replaced());

        let out = fs::read(&dest).unwrap();
        let parsed = parse(&out);
        prop_assert_eq!(&parsed.heap, &fixture.heap);
        prop_assert_eq!(parsed.checksum_algorithm, alg);
        prop_assert_eq!(parsed.toc_length_uncompressed, parsed.toc.len() as u64);

        let text = String::from_utf8(parsed.toc).unwrap();
        prop_assert!(!text.contains("<signature"));
        prop_assert_eq!(text.matches("<file ").count(), files);
    }

    #[test]
    fn prop_unsigned_copy_is_byte_identical(
        heap in prop::collection::vec(any::<u8>(), 0..16 * 1024),
        alg in 0u32..3,
        files in 0usize..20,
    ) {
        let dir = TempDir::new().unwrap();
        let fixture = Fixture::new(&toc_with(files, false), alg).with_heap(heap);
        let source = fixture.write_to(&dir.path().join("in.pkg"));
        let dest = dir.path().join("out.pkg");

        let report = strip_signature(&source, Some(&dest), &StripOptions::default()).unwrap();
        prop_assert!(matches!(report.outcome, Outcome::Copied(_)));
        prop_assert_eq!(fs::read(&dest).unwrap(), fixture.to_bytes());
    }

    #[test]
    fn prop_compression_level_does_not_change_toc(
        level in 0u32..10,
        files in 1usize..10,
    ) {
        let dir = TempDir::new().unwrap();
        let fixture = Fixture::new(&toc_with(files, true), 1);
        let source = fixture.write_to(&dir.path().join("in.pkg"));
        let a = dir.path().join("a.pkg");
        let b = dir.path().join("b.pkg");

        strip_signature(&source, Some(&a), &StripOptions::default()).unwrap();
        strip_signature(&source, Some(&b), &StripOptions::new().with_compression_level(level)).unwrap();

        let a = parse(&fs::read(&a).unwrap());
        let b = parse(&fs::read(&b).unwrap());
        prop_assert_eq!(a.toc, b.toc);
        prop_assert_eq!(a.heap, b.heap);
    }
}
