//! Out-of-band deletions and debounced reconciliation.

use skillrepo::preset::PresetDraft;

use crate::fixture::E2EFixture;

#[test]
fn deleted_directory_is_pruned_on_next_read() {
    let mut fixture = E2EFixture::new("deleted_directory_is_pruned_on_next_read");
    fixture.write_named_source("lint");
    fixture.write_named_source("fmt");
    let mut engine = fixture.engine();

    fixture.log_step("Import two skills into a preset");
    let lint = fixture.import_named(&mut engine, "lint");
    let fmt = fixture.import_named(&mut engine, "fmt");
    let preset = engine
        .save_preset(
            PresetDraft {
                name: "all".into(),
                skill_ids: vec![lint.id.clone(), fmt.id.clone()],
                ..PresetDraft::default()
            },
            false,
        )
        .unwrap();

    fixture.log_step("Remove one directory behind the engine's back");
    std::fs::remove_dir_all(fixture.repo_root.join("skills").join(&lint.id)).unwrap();

    fixture.log_step("Read");
    let skills = engine.list_skills().unwrap();
    assert_eq!(skills.len(), 1);
    assert!(!engine.document().skills.contains_key(&lint.id));
    assert_eq!(engine.document().preset(&preset.id).unwrap().skill_ids, vec![fmt.id]);

    fixture.log_step("Second reconcile changes nothing");
    let report = engine.reconcile().unwrap();
    assert!(!report.changed());
}

#[test]
fn external_change_reconciles_after_quiet_window() {
    let mut fixture = E2EFixture::new("external_change_reconciles_after_quiet_window");
    fixture.write_named_source("lint");
    let mut engine = fixture.engine();
    let lint = fixture.import_named(&mut engine, "lint");

    let dir = fixture.repo_root.join("skills").join(&lint.id);
    std::fs::remove_dir_all(&dir).unwrap();

    fixture.log_step("Notify and poll");
    let relevant = engine.notify_external_change([dir.join("SKILL.md"), fixture.root.join("elsewhere.txt")]);
    assert_eq!(relevant, 1);

    let report = engine.poll_external_changes().unwrap().expect("debounce window is zero");
    assert_eq!(report.pruned_skills, vec![lint.id]);

    fixture.log_step("Nothing pending afterwards");
    assert!(engine.poll_external_changes().unwrap().is_none());
}

#[test]
fn second_handle_sees_first_handles_writes() {
    let mut fixture = E2EFixture::new("second_handle_sees_first_handles_writes");
    fixture.write_named_source("lint");
    let mut writer = fixture.engine();
    let mut reader = fixture.engine();

    fixture.log_step("Import through one handle, read through the other");
    let lint = fixture.import_named(&mut writer, "lint");
    let seen = reader.list_skills().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].id, lint.id);
}
