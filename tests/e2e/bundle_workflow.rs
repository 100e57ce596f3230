//! Bundle export and import across stores.

use std::collections::{BTreeMap, BTreeSet};

use skillrepo::Engine;
use skillrepo::bundle::ExportSelection;
use skillrepo::engine::MetadataPatch;
use skillrepo::preset::PresetDraft;

use crate::fixture::E2EFixture;

/// name -> tags, and preset name -> member names.
fn snapshot(engine: &mut Engine) -> (BTreeMap<String, BTreeSet<String>>, BTreeMap<String, BTreeSet<String>>) {
    let skills = engine.list_skills().unwrap();
    let names: BTreeMap<&str, &str> = skills.iter().map(|s| (s.id.as_str(), s.name.as_str())).collect();
    let presets = engine
        .list_presets()
        .unwrap()
        .into_iter()
        .map(|p| {
            let members = p.skill_ids.iter().map(|id| names[id.as_str()].to_string()).collect();
            (p.name, members)
        })
        .collect();
    let tags = skills
        .iter()
        .map(|s| (s.name.clone(), s.tags.iter().cloned().collect()))
        .collect();
    (tags, presets)
}

fn populated(fixture: &E2EFixture) -> Engine {
    for name in ["alpha", "beta", "gamma"] {
        fixture.write_named_source(name);
    }
    let mut engine = fixture.engine();
    let a = fixture.import_named(&mut engine, "alpha");
    let b = fixture.import_named(&mut engine, "beta");
    let g = fixture.import_named(&mut engine, "gamma");
    engine
        .update_metadata(
            &a.id,
            MetadataPatch {
                tags: Some(vec!["web".into(), "lint".into()]),
                ..MetadataPatch::default()
            },
        )
        .unwrap();
    engine
        .update_metadata(
            &g.id,
            MetadataPatch {
                tags: Some(vec!["ops".into()]),
                ..MetadataPatch::default()
            },
        )
        .unwrap();
    for (name, ids) in [("front", vec![a.id.clone(), b.id.clone()]), ("ops", vec![g.id])] {
        engine
            .save_preset(
                PresetDraft {
                    name: name.into(),
                    skill_ids: ids,
                    ..PresetDraft::default()
                },
                false,
            )
            .unwrap();
    }
    engine
}

fn round_trip(dest_name: &str) {
    let mut fixture = E2EFixture::new(dest_name);
    let mut source = populated(&fixture);
    let before = snapshot(&mut source);

    fixture.log_step("Export everything");
    let dest = fixture.root.join(dest_name);
    let report = source.export_bundle(&ExportSelection::All, Some(&dest)).unwrap();
    assert_eq!(report.skills, 3);
    assert_eq!(report.presets, 2);

    fixture.log_step("Import into a fresh store");
    let fresh_root = fixture.root.join("fresh");
    let mut fresh = Engine::open(fixture.config_for(&fresh_root), Vec::new()).unwrap();
    let imported = fresh.import_bundle(&dest, false, false).unwrap();
    assert_eq!(imported.skills_imported, 3);
    assert_eq!(imported.presets_imported, 2);

    assert_eq!(snapshot(&mut fresh), before);
}

#[test]
fn directory_bundle_round_trips() {
    round_trip("bundle-dir");
}

#[test]
fn zip_bundle_round_trips() {
    round_trip("bundle.zip");
}

#[test]
fn preset_keeps_only_members_present_in_bundle() {
    let mut fixture = E2EFixture::new("preset_keeps_only_members_present_in_bundle");
    let bundle = fixture.root.join("partial");
    for name in ["alpha", "beta"] {
        let dir = bundle.join("skills").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("SKILL.md"), format!("# {name}\n")).unwrap();
    }
    std::fs::write(
        bundle.join("presets.json"),
        r#"{
  "version": 2,
  "presets": [
    { "id": "p1", "name": "trio", "skillIds": [], "skillNames": ["alpha", "beta", "gamma"] }
  ]
}"#,
    )
    .unwrap();

    fixture.log_step("Import the bundle");
    let mut engine = fixture.engine();
    let report = engine.import_bundle(&bundle, false, false).unwrap();

    assert_eq!(report.skills_imported, 2);
    let presets = engine.list_presets().unwrap();
    assert_eq!(presets.len(), 1);
    assert_eq!(presets[0].name, "trio");
    assert_eq!(presets[0].skill_ids.len(), 2);
}

#[test]
fn export_without_destination_uses_default_path() {
    let mut fixture = E2EFixture::new("export_without_destination_uses_default_path");
    let mut engine = populated(&fixture);

    fixture.log_step("No destination and no default");
    assert!(engine.export_bundle(&ExportSelection::All, None).is_err());

    fixture.log_step("Set default and export");
    let dest = fixture.root.join("default-bundle");
    engine.set_default_export_path(&dest).unwrap();
    let report = engine.export_bundle(&ExportSelection::All, None).unwrap();
    assert_eq!(report.destination, dest);
    assert!(dest.join("presets.json").is_file());
}
