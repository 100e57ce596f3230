//! Import, dedup and identity migration.

use skillrepo::core::hash;
use skillrepo::engine::MetadataPatch;
use skillrepo::preset::PresetDraft;

use crate::fixture::E2EFixture;

#[test]
fn identical_content_imports_once() {
    let mut fixture = E2EFixture::new("identical_content_imports_once");
    fixture.write_named_source("lint");
    let mut engine = fixture.engine();

    fixture.log_step("Import twice");
    let first = fixture.import_named(&mut engine, "lint");
    let result = engine.scan().unwrap();
    let candidate = result.classification.already_imported[0].clone();
    let second = engine.import(&candidate).unwrap();

    fixture.log_step("Verify one stored skill");
    assert_eq!(first.id, second.id);
    assert_eq!(fixture.stored_dirs(), vec![first.id.clone()]);
    assert_eq!(engine.document().skills.len(), 1);
    assert_eq!(engine.list_skills().unwrap().len(), 1);
}

#[test]
fn reimport_with_new_content_carries_tags_and_presets() {
    let mut fixture = E2EFixture::new("reimport_with_new_content_carries_tags_and_presets");
    let manifest = fixture.write_named_source("lint");
    fixture.write_named_source("fmt");
    let mut engine = fixture.engine();

    fixture.log_step("Import, tag and group");
    let old = fixture.import_named(&mut engine, "lint");
    let fmt = fixture.import_named(&mut engine, "fmt");
    engine
        .update_metadata(
            &old.id,
            MetadataPatch {
                tags: Some(vec!["rust".into(), "ci".into()]),
                ..MetadataPatch::default()
            },
        )
        .unwrap();
    let preset = engine
        .save_preset(
            PresetDraft {
                name: "checks".into(),
                skill_ids: vec![old.id.clone(), fmt.id.clone()],
                ..PresetDraft::default()
            },
            false,
        )
        .unwrap();

    fixture.log_step("Edit the source and re-import under the same name");
    std::fs::write(&manifest, "---\nname: lint\ndescription: stricter\n---\n").unwrap();
    let new = fixture.import_named(&mut engine, "lint");

    fixture.log_step("Verify identity moved");
    assert_ne!(new.id, old.id);
    assert_eq!(new.migrated_from.as_deref(), Some(old.id.as_str()));

    let doc = engine.document();
    assert!(!doc.skills.contains_key(&old.id));
    assert_eq!(doc.skills[&new.id].tags, vec!["rust".to_string(), "ci".to_string()]);
    let members = &doc.preset(&preset.id).unwrap().skill_ids;
    assert!(members.contains(&new.id));
    assert!(!members.contains(&old.id));
    assert!(members.contains(&fmt.id));

    let mut dirs = vec![new.id.clone(), fmt.id];
    dirs.sort();
    assert_eq!(fixture.stored_dirs(), dirs);
}

#[test]
fn edited_body_only_manifest_gets_new_digest() {
    let mut fixture = E2EFixture::new("edited_body_only_manifest_gets_new_digest");
    let manifest = fixture.write_source("Skill", "# Skill\ndescription: do X");
    let mut engine = fixture.engine();

    fixture.log_step("Import d1");
    let d1 = fixture.import_named(&mut engine, "Skill");
    assert_eq!(d1.id, hash::digest_bytes(b"# Skill\ndescription: do X"));
    engine
        .update_metadata(
            &d1.id,
            MetadataPatch {
                tags: Some(vec!["x".into()]),
                ..MetadataPatch::default()
            },
        )
        .unwrap();

    fixture.log_step("Edit to Y and reimport");
    std::fs::write(&manifest, "# Skill\ndescription: do Y").unwrap();
    let d2 = fixture.import_named(&mut engine, "Skill");

    assert_ne!(d1.id, d2.id);
    let skills = engine.list_skills().unwrap();
    assert_eq!(skills.len(), 1);
    assert_eq!(skills[0].id, d2.id);
    assert_eq!(skills[0].tags, vec!["x".to_string()]);
    assert!(!engine.document().skills.contains_key(&d1.id));
}

#[test]
fn missing_scan_root_is_reported_not_fatal() {
    let mut fixture = E2EFixture::new("missing_scan_root_is_reported_not_fatal");
    fixture.write_named_source("lint");
    let mut config = fixture.config_for(&fixture.repo_root);
    config.scan.global.push(fixture.root.join("nowhere").display().to_string());
    let mut engine = skillrepo::Engine::open(config, Vec::new()).unwrap();

    fixture.log_step("Scan with one missing root");
    let result = engine.scan().unwrap();
    assert_eq!(result.classification.discoverable.len(), 1);
    assert_eq!(result.sources.iter().filter(|s| !s.is_ok()).count(), 1);
}
