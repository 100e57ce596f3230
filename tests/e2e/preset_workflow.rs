//! Applying presets to a target directory.

use skillrepo::preset::{ApplyMode, PresetDraft};

use crate::fixture::{E2EFixture, dir_names};

fn setup(fixture: &E2EFixture) -> (skillrepo::Engine, String) {
    fixture.write_named_source("alpha");
    fixture.write_named_source("beta");
    let mut engine = fixture.engine();
    let a = fixture.import_named(&mut engine, "alpha");
    let b = fixture.import_named(&mut engine, "beta");
    let preset = engine
        .save_preset(
            PresetDraft {
                name: "pair".into(),
                skill_ids: vec![a.id, b.id],
                ..PresetDraft::default()
            },
            false,
        )
        .unwrap();
    (engine, preset.id)
}

#[test]
fn replace_mode_leaves_only_members() {
    let mut fixture = E2EFixture::new("replace_mode_leaves_only_members");
    let (mut engine, preset) = setup(&fixture);
    let target = fixture.root.join("target");
    std::fs::create_dir_all(target.join("zeta")).unwrap();
    std::fs::write(target.join("zeta/SKILL.md"), "z").unwrap();

    fixture.log_step("Apply in replace mode");
    let report = engine.apply_preset(&preset, ApplyMode::Replace, &target).unwrap();

    assert_eq!(report.copied.len(), 2);
    assert_eq!(dir_names(&target), vec!["alpha".to_string(), "beta".to_string()]);
    assert!(target.join("alpha/SKILL.md").is_file());
}

#[test]
fn merge_mode_keeps_unrelated_entries() {
    let mut fixture = E2EFixture::new("merge_mode_keeps_unrelated_entries");
    let (mut engine, preset) = setup(&fixture);
    let target = fixture.root.join("target");
    std::fs::create_dir_all(target.join("zeta")).unwrap();

    fixture.log_step("Apply in merge mode");
    engine.apply_preset(&preset, ApplyMode::Merge, &target).unwrap();

    assert_eq!(
        dir_names(&target),
        vec!["alpha".to_string(), "beta".to_string(), "zeta".to_string()]
    );
}

#[test]
fn unknown_preset_is_an_error() {
    let fixture = E2EFixture::new("unknown_preset_is_an_error");
    let (mut engine, _) = setup(&fixture);
    let err = engine
        .apply_preset("missing", ApplyMode::Merge, &fixture.root.join("t"))
        .unwrap_err();
    assert!(matches!(err, skillrepo::RepoError::PresetNotFound(_)));
}
