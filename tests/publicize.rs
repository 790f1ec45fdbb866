mod common;

use std::fs;

use common::{member_flags, sample_metadata, type_flags, write_image, ImageBuilder, MetadataBuilder};
use publicizer::prelude::*;

fn assert_fully_public(module: &Module) {
    let types = flatten_all(module);
    assert_eq!(types.len(), module.type_count());
    assert!(count_non_public(module, &types).is_empty());

    for index in types {
        let expected = if module[index].is_nested() {
            TypeVisibility::NestedPublic
        } else {
            TypeVisibility::Public
        };
        assert_eq!(module[index].visibility(), expected, "{}", module.full_name(index));
    }
}

fn roundtrip(image: Vec<u8>) -> (PublicizeStats, Module) {
    let mut module = Module::from_mem(image).unwrap();
    let types = flatten_all(&module);
    let stats = publicize(&mut module, &types);
    let reloaded = Module::from_mem(module.to_bytes().unwrap()).unwrap();
    (stats, reloaded)
}

#[test]
fn sample_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_image(
        dir.path(),
        "Game.dll",
        &ImageBuilder::new().metadata(sample_metadata()).build(),
    );
    let original = fs::read(&input).unwrap();

    let report = process_batch(&[input.clone()], &BatchOptions::new(dir.path().join("out")));
    assert_eq!(report.success_count(), 1);

    let output = dir.path().join("out").join("Game_publicized.dll");
    let module = Module::from_path(&output).unwrap();
    assert_fully_public(&module);
    assert_eq!(module.type_count(), 5);
    assert_eq!(module.method_count(), 5);
    assert_eq!(module.field_count(), 6);

    // input untouched, output differs only in flag bytes
    assert_eq!(fs::read(&input).unwrap(), original);
    let rewritten = fs::read(&output).unwrap();
    assert_eq!(rewritten.len(), original.len());
    let changed = original
        .iter()
        .zip(rewritten.iter())
        .filter(|(before, after)| before != after)
        .count();
    assert!(changed > 0 && changed <= 12);
}

#[test]
fn metadata_layout_variants() {
    let variants = [
        sample_metadata(),
        sample_metadata().large_strings(true),
        sample_metadata().uncompressed(true),
        sample_metadata().pointer_tables(true),
        sample_metadata().type_refs(3).custom_attributes(3),
        sample_metadata()
            .uncompressed(true)
            .pointer_tables(true)
            .large_strings(true),
    ];

    for meta in variants {
        let (stats, module) = roundtrip(ImageBuilder::new().metadata(meta).build());
        assert_eq!(
            stats,
            PublicizeStats {
                types: 4,
                methods: 4,
                fields: 4
            }
        );
        assert_fully_public(&module);
    }
}

#[test]
fn pe32_plus_with_checksum() {
    let image = ImageBuilder::new()
        .metadata(sample_metadata())
        .pe32_plus(true)
        .stale_checksum(true)
        .build();
    let (_, module) = roundtrip(image);

    assert!(module.file().is_pe32_plus());
    assert_ne!(module.file().checksum(), 0xDEAD_BEEF);
    assert_fully_public(&module);
}

#[test]
fn other_attributes_preserved() {
    let mut meta = MetadataBuilder::new();
    let outer = meta.add_type("Lib", "Outer", type_flags::NOT_PUBLIC | type_flags::SEALED);
    let inner = meta.add_nested_type(outer, "Inner", type_flags::NESTED_ASSEMBLY);
    meta.add_method(
        inner,
        ".cctor",
        member_flags::PRIVATE | member_flags::STATIC | member_flags::SPECIAL_NAME,
    );
    meta.add_field(outer, "s_instance", member_flags::PRIVATE | member_flags::STATIC);

    let (_, module) = roundtrip(ImageBuilder::new().metadata(meta).build());
    let outer = module.roots()[1];
    let inner = module[outer].nested[0];

    assert_eq!(module[outer].flags(), type_flags::PUBLIC | type_flags::SEALED);
    assert_eq!(module[inner].flags(), type_flags::NESTED_PUBLIC);
    assert_eq!(
        module[inner].methods[0].flags(),
        member_flags::PUBLIC | member_flags::STATIC | member_flags::SPECIAL_NAME
    );
    assert_eq!(
        module[outer].fields[0].flags(),
        member_flags::PUBLIC | member_flags::STATIC
    );
}

#[test]
fn batch_isolates_bad_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let good = ImageBuilder::new().metadata(sample_metadata()).build();
    let native = ImageBuilder::new()
        .metadata(sample_metadata())
        .without_clr_directory()
        .build();

    let inputs = vec![
        write_image(dir.path(), "A.dll", &good),
        write_image(dir.path(), "Native.dll", &native),
        write_image(dir.path(), "Empty.dll", &[]),
        dir.path().join("Missing.dll"),
        write_image(dir.path(), "Z.dll", &good),
    ];

    let options = BatchOptions::new(dir.path().join("out")).with_parallel(true);
    let report = process_batch(&inputs, &options);

    let reasons: Vec<Option<FailureReason>> = report
        .outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Outcome::Success { .. } => None,
            Outcome::Failure { reason, .. } => Some(*reason),
        })
        .collect();
    assert_eq!(
        reasons,
        [
            None,
            Some(FailureReason::Format),
            Some(FailureReason::Format),
            Some(FailureReason::Unreadable),
            None,
        ]
    );
    assert_eq!(report.exit_code(), 0);

    let mut written: Vec<String> = fs::read_dir(dir.path().join("out"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    written.sort();
    assert_eq!(written, ["A_publicized.dll", "Z_publicized.dll"]);
}

#[test]
fn outputs_can_be_publicized_again() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_image(
        dir.path(),
        "Game.dll",
        &ImageBuilder::new().metadata(sample_metadata()).build(),
    );

    let first = process_batch(&[input], &BatchOptions::new(dir.path().join("first")));
    let Outcome::Success { output, .. } = &first.outcomes[0].result else {
        panic!("first pass failed");
    };

    let second = process_batch(
        &[output.clone()],
        &BatchOptions::strict(dir.path().join("second")),
    );
    assert!(second.is_success());
    assert!(second.total_stats().is_empty());

    let second_output = dir.path().join("second").join("Game_publicized_publicized.dll");
    assert_eq!(fs::read(output).unwrap(), fs::read(second_output).unwrap());
}
