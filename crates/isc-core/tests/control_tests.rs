use isc_core::prelude::*;
use isc_core::{sanitize_url, SkipReason};
use isc_index::{Drift, DriftKind, ReconcileStep};
use isc_meta::{keys, EntityId, MetaStore};
use isc_test_utils::{
    asset_url, content_with, img, img_tag_with_class, post, setup_control, setup_flaky_control,
    site_with_assets,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use std::io::Write;

fn indexed_ids(outcome: &SaveOutcome) -> Vec<u64> {
    match outcome {
        SaveOutcome::Indexed { images, .. } => images.ids().into_iter().map(|i| i.get()).collect(),
        SaveOutcome::Skipped(reason) => panic!("unexpected skip: {reason}"),
    }
}

#[test]
fn test_save_builds_both_indexes() {
    let site = site_with_assets([10, 11]).with_post(1, content_with(&[10, 11]));
    let isc = setup_control(site);

    let outcome = isc.on_content_saved(post(1), None);

    assert!(outcome.is_clean());
    assert_eq!(indexed_ids(&outcome), vec![10, 11]);
    assert_eq!(
        isc.store().get_meta(EntityId::new(1), keys::CONTENT_IMAGES).unwrap(),
        Some(json!({
            "10": {"src": asset_url(10)},
            "11": {"src": asset_url(11)},
        }))
    );
    assert_eq!(
        isc.store().get_meta(EntityId::new(10), keys::IMAGE_CONTENTS).unwrap(),
        Some(json!([1]))
    );
}

#[test]
fn test_edit_moves_relations() {
    let mut isc = setup_control(site_with_assets([10, 11, 13]).with_post(1, content_with(&[10, 11])));
    isc.on_content_saved(post(1), None);

    isc.host_mut().set_content(post(1), content_with(&[11, 13]));
    let outcome = isc.on_content_saved(post(1), None);

    let SaveOutcome::Indexed { report, .. } = outcome else {
        panic!("save was skipped");
    };
    assert_eq!(report.added, vec![img(13)]);
    assert_eq!(report.removed, vec![img(10)]);

    let relations = isc.image_post_relations().unwrap();
    let lookup = |id: u64| relations.iter().find(|(i, _)| *i == img(id)).map(|(_, p)| p.clone());
    assert!(lookup(10).unwrap().is_empty());
    assert!(lookup(11).unwrap().contains(post(1)));
    assert!(lookup(13).unwrap().contains(post(1)));
}

#[test]
fn test_thumbnail_overrides_content_entry() {
    let mut site = site_with_assets([10]).with_post(1, content_with(&[10]));
    site.set_thumbnail(post(1), Some(img(10)));
    let isc = setup_control(site);

    let SaveOutcome::Indexed { images, .. } = isc.on_content_saved(post(1), None) else {
        panic!("save was skipped");
    };

    let entry = images.get(img(10)).unwrap();
    assert!(entry.thumbnail);
    assert_eq!(entry.src, asset_url(10));
    assert_eq!(images.len(), 1);
}

#[test]
fn test_thumbnail_only_post_is_indexed() {
    let mut site = site_with_assets([10]).with_post(1, "no images here");
    site.set_thumbnail(post(1), Some(img(10)));
    let isc = setup_control(site);

    assert_eq!(indexed_ids(&isc.on_content_saved(post(1), None)), vec![10]);
}

#[test]
fn test_class_hint_and_shortcodes() {
    let site = site_with_assets([10, 11])
        .with_shortcode("hero", img_tag_with_class(11))
        .with_post(1, format!("{}[hero]", img_tag_with_class(10)));
    let isc = setup_control(site);

    assert_eq!(indexed_ids(&isc.on_content_saved(post(1), None)), vec![10, 11]);
}

#[test]
fn test_autosave_leaves_indexes_alone() {
    let isc = setup_control(site_with_assets([10]).with_post(1, content_with(&[10])));

    let outcome = isc.handle_save(SaveContext::autosave(), post(1), None);

    assert_eq!(outcome, SaveOutcome::Skipped(SkipReason::Autosave));
    assert!(isc.image_post_relations().unwrap().is_empty());
}

#[test]
fn test_partial_failure_does_not_abort_save() {
    let site = site_with_assets([10, 11, 12, 13]).with_post(1, content_with(&[10, 11, 12, 13]));
    let isc = setup_flaky_control(site);
    isc.store().fail_writes(img(13));

    let outcome = isc.on_content_saved(post(1), None);

    let SaveOutcome::Indexed {
        report,
        snapshot_saved,
        ..
    } = &outcome
    else {
        panic!("save was skipped");
    };
    assert!(*snapshot_saved);
    assert_eq!(report.skipped.len(), 1);
    assert!(!outcome.is_clean());
    assert_eq!(isc.image_post_relations().unwrap().len(), 3);

    isc.store().heal(img(13));
    let SaveOutcome::Indexed { report, .. } = isc.on_content_saved(post(1), None) else {
        panic!("save was skipped");
    };
    assert_eq!(report.healed, vec![img(13)]);
    assert!(isc.verify_index().unwrap().is_empty());
}

#[test]
fn test_failed_snapshot_write_is_reported() {
    let isc = setup_flaky_control(site_with_assets([10]).with_post(1, content_with(&[10])));
    isc.store().fail_writes(post(1));

    let outcome = isc.on_content_saved(post(1), None);

    assert!(matches!(
        outcome,
        SaveOutcome::Indexed {
            snapshot_saved: false,
            ..
        }
    ));
    assert_eq!(isc.verify_index().unwrap().len(), 1);
}

#[test]
fn test_delete_unlists_content() {
    let isc = setup_control(
        site_with_assets([10, 11])
            .with_post(1, content_with(&[10, 11]))
            .with_post(2, content_with(&[11])),
    );
    isc.reindex_all();

    let report = isc.on_content_deleted(post(1));

    assert_eq!(report.removed, vec![img(10), img(11)]);
    let forward = isc.post_image_relations().unwrap();
    assert_eq!(forward.len(), 1);
    assert_eq!(forward[0].0, post(2));
    assert!(isc.verify_index().unwrap().is_empty());
}

#[test]
fn test_delete_with_failed_unlisting() {
    let isc = setup_flaky_control(site_with_assets([10, 11]).with_post(1, content_with(&[10, 11])));
    isc.on_content_saved(post(1), None);
    isc.store().fail_writes(img(11));

    let report = isc.on_content_deleted(post(1));

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].image, img(11));
    assert_eq!(report.skipped[0].step, ReconcileStep::Remove);
    assert!(isc.post_image_relations().unwrap().is_empty());
    assert_eq!(
        isc.verify_index().unwrap(),
        vec![Drift {
            content: post(1),
            image: img(11),
            kind: DriftKind::MissingForward,
        }]
    );
}

#[test]
fn test_reindex_all_and_clear() {
    let isc = setup_control(
        site_with_assets([10, 11])
            .with_post(1, content_with(&[10]))
            .with_typed_post(2, "page", content_with(&[10, 11]))
            .with_typed_post(3, "revision", content_with(&[11])),
    );

    let summary = isc.reindex_all();

    assert_eq!(summary.indexed, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.images, 3);
    assert!(summary.unclean.is_empty());

    assert_eq!(isc.clear_index().unwrap(), 4);
    assert!(isc.post_image_relations().unwrap().is_empty());
    assert!(isc.image_post_relations().unwrap().is_empty());
}

#[test]
fn test_attachment_fields_flow() {
    let isc = setup_control(site_with_assets([10, 11, 12]));
    isc.attachment_added(img(10)).unwrap();
    isc.attachment_added(img(11)).unwrap();
    isc.save_attachment_fields(img(11), &AttachmentFields::with_source("").own())
        .unwrap();

    assert_eq!(isc.missing_sources(), vec![img(10)]);
    assert_eq!(isc.unused_assets(), vec![img(12)]);
    assert_eq!(isc.missing_sources_warning(), Some(1));

    isc.save_attachment_fields(
        img(10),
        &AttachmentFields::with_source(" Photo: Jane ").with_url("javascript:void(0)"),
    )
    .unwrap();

    assert_eq!(isc.missing_sources_warning(), Some(0));
    let stored = isc.attachment_fields(img(10)).unwrap();
    assert_eq!(stored.source, "Photo: Jane");
    assert_eq!(stored.source_url, "");
    assert_eq!(sanitize_url("javascript:void(0)"), "");
}

#[test]
fn test_options_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "warning_onesource_missing = false").unwrap();
    writeln!(file, "valid_image_post_types = [\"attachment\", \"media\"]").unwrap();

    let options = IscOptions::load(file.path()).unwrap();

    assert!(!options.warning_onesource_missing);
    assert!(options.is_valid_image_type("media"));
    assert!(options.is_excluded_type("revision"));
}

#[test]
fn test_options_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = IscOptions::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, IscError::Io { .. }));
}

proptest! {
    #[test]
    fn prop_edit_sequences_stay_symmetric(
        edits in proptest::collection::vec(
            (1..4u64, proptest::collection::vec(10..16u64, 0..5), any::<bool>()),
            1..20,
        )
    ) {
        let mut isc = setup_control(site_with_assets(10..16));
        for (content, images, delete) in edits {
            if delete {
                isc.host_mut().remove_post(post(content));
                isc.on_content_deleted(post(content));
            } else {
                isc.host_mut().set_content(post(content), content_with(&images));
                let outcome = isc.on_content_saved(post(content), None);
                prop_assert!(outcome.is_clean());
            }
        }
        prop_assert!(isc.verify_index().unwrap().is_empty());
    }
}
