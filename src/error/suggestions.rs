//! Context-aware error suggestions.
//!
//! Complements the static suggestions in the `codes` module with hints that
//! name the entity involved.

use serde_json::Value;

use super::codes::ErrorCode;

/// Generate a context-aware suggestion for an error.
pub fn suggest_for_error(code: ErrorCode, context: Option<&Value>) -> String {
    match code {
        ErrorCode::SkillNotFound => suggest_skill_not_found(context),
        ErrorCode::SkillConflict | ErrorCode::PresetConflict => suggest_conflict(code, context),
        ErrorCode::PresetNotFound => suggest_preset_not_found(context),
        _ => code.suggestion().to_string(),
    }
}

fn suggest_skill_not_found(context: Option<&Value>) -> String {
    let Some(skill) = context
        .and_then(|c| c.get("skill"))
        .and_then(Value::as_str)
    else {
        return ErrorCode::SkillNotFound.suggestion().to_string();
    };

    format!(
        "Skill '{skill}' not found. Try:\n  - `skr list` to see imported skills\n  - a longer id prefix if '{skill}' is ambiguous"
    )
}

fn suggest_preset_not_found(context: Option<&Value>) -> String {
    match context
        .and_then(|c| c.get("preset"))
        .and_then(Value::as_str)
    {
        Some(preset) => format!("Preset '{preset}' not found. Run `skr preset list`"),
        None => ErrorCode::PresetNotFound.suggestion().to_string(),
    }
}

fn suggest_conflict(code: ErrorCode, context: Option<&Value>) -> String {
    let name = context.and_then(|c| c.get("name")).and_then(Value::as_str);
    let existing = context
        .and_then(|c| c.get("existing_id"))
        .and_then(Value::as_str);

    match (name, existing) {
        (Some(name), Some(existing)) => format!(
            "'{name}' already exists (id {existing}). Re-run with --force to overwrite it"
        ),
        _ => code.suggestion().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn skill_not_found_mentions_skill() {
        let ctx = json!({ "skill": "lint-rules" });
        let hint = suggest_for_error(ErrorCode::SkillNotFound, Some(&ctx));
        assert!(hint.contains("lint-rules"));
    }

    #[test]
    fn conflict_mentions_existing_id() {
        let ctx = json!({ "name": "deploy", "existing_id": "abc123" });
        let hint = suggest_for_error(ErrorCode::SkillConflict, Some(&ctx));
        assert!(hint.contains("abc123"));
        assert!(hint.contains("--force"));
    }

    #[test]
    fn falls_back_to_static_suggestion() {
        let hint = suggest_for_error(ErrorCode::IoError, None);
        assert_eq!(hint, ErrorCode::IoError.suggestion());
    }
}
