use rampart_types::{
    AssignedMitigation, DocumentField, FieldValue, PlanDocument, Presence, TankPosition,
};

use super::state::PlanState;
use super::store::AssignmentStore;

fn row(ability_id: &str, position: Option<TankPosition>) -> AssignedMitigation {
    AssignedMitigation {
        ability_id: ability_id.to_string(),
        position,
        precast_secs: 0.0,
        caster_job: Some("WAR".to_string()),
        caster: None,
        written_by: "tester".to_string(),
        written_at: 1_700_000_000_000,
    }
}

#[test]
fn test_remove_undoes_add_exactly() {
    let mut store = AssignmentStore::default();
    let before = store.snapshot();

    assert!(store.add("buster", row("wall", Some(TankPosition::MainTank))));
    assert!(store.remove("buster", "wall", Some(TankPosition::MainTank)));

    // Bit-for-bit: the emptied action key is gone too
    assert_eq!(store.snapshot(), before);
    assert!(!store.map().contains_key("buster"));
}

#[test]
fn test_duplicate_ability_position_pair_rejected() {
    let mut store = AssignmentStore::default();
    assert!(store.add("buster", row("wall", Some(TankPosition::MainTank))));
    assert!(!store.add("buster", row("wall", Some(TankPosition::MainTank))));

    // Same ability on the other tank is a different pair
    assert!(store.add("buster", row("wall", Some(TankPosition::OffTank))));
    assert_eq!(store.rows("buster").len(), 2);
}

#[test]
fn test_remove_without_position_matches_by_ability() {
    let mut store = AssignmentStore::default();
    store.add("buster", row("wall", Some(TankPosition::MainTank)));
    store.add("buster", row("wall", Some(TankPosition::OffTank)));

    assert!(store.remove("buster", "wall", None));
    assert_eq!(store.rows("buster").len(), 1);
    assert_eq!(store.rows("buster")[0].position, Some(TankPosition::OffTank));
}

#[test]
fn test_remove_with_position_leaves_other_rows() {
    let mut store = AssignmentStore::default();
    store.add("buster", row("wall", Some(TankPosition::MainTank)));
    store.add("buster", row("shield", None));

    assert!(!store.remove("buster", "wall", Some(TankPosition::OffTank)));
    assert!(store.remove("buster", "wall", Some(TankPosition::MainTank)));
    assert_eq!(store.rows("buster").len(), 1);
}

#[test]
fn test_remove_missing_returns_false() {
    let mut store = AssignmentStore::default();
    assert!(!store.remove("buster", "wall", None));
    store.add("buster", row("wall", None));
    assert!(!store.remove("buster", "other", None));
    assert!(!store.remove("other_action", "wall", None));
}

#[test]
fn test_update_precast() {
    let mut store = AssignmentStore::default();
    store.add("buster", row("wall", Some(TankPosition::MainTank)));

    assert!(store.update_precast("buster", "wall", Some(TankPosition::MainTank), 12.5));
    assert_eq!(store.rows("buster")[0].precast_secs, 12.5);

    assert!(!store.update_precast("buster", "ghost", None, 5.0));
}

#[test]
fn test_total_rows_counts_across_actions() {
    let mut store = AssignmentStore::default();
    store.add("a", row("wall", None));
    store.add("a", row("shield", None));
    store.add("b", row("wall", None));
    assert_eq!(store.total_rows(), 3);
}

#[test]
fn test_document_round_trip_through_state() {
    let toml = r#"
boss_id = "the_sunspire"

[[selected_jobs]]
job = "WAR"
claimed_by = "user-1"

[[selected_jobs]]
job = "SCH"

[tank_positions]
main_tank = "WAR"

[health_settings]
level = 90
party_max_hp = 82000
tank_max_hp = 110000
healing_per_100_potency = 6000.0

[assignments]
buster = [{ ability_id = "wall", position = "main_tank", precast_secs = 0.0, caster_job = "WAR", written_by = "user-1", written_at = 1 }]
"#;

    let document: PlanDocument = toml::from_str(toml).expect("Failed to parse TOML");
    let state = PlanState::from_document(document.clone());

    assert_eq!(state.boss_id, "the_sunspire");
    assert_eq!(state.selected_jobs.len(), 2);
    assert_eq!(state.selected_jobs.claimed_by("WAR"), Some("user-1"));
    assert_eq!(state.assignments.rows("buster").len(), 1);
    assert_eq!(state.health_settings.level, 90);

    assert_eq!(state.to_document(), document);
}

#[test]
fn test_legacy_job_array_normalized_at_the_edge() {
    // Older plans stored bare abbreviation arrays
    let toml = r#"
boss_id = "the_sunspire"
selected_jobs = ["WAR", "SCH"]
"#;

    let document: PlanDocument = toml::from_str(toml).expect("Failed to parse TOML");
    assert_eq!(document.selected_jobs.len(), 2);
    assert!(document.selected_jobs.contains("WAR"));
    assert_eq!(document.selected_jobs.claimed_by("WAR"), None);
}

#[test]
fn test_apply_assignments_clears_stack_cache() {
    let mut state = PlanState::default();
    state.stack_cache.put(45.0, 2);

    let value = FieldValue::Assignments {
        assignments: Default::default(),
    };
    state.apply_field(&value);

    assert_eq!(state.stack_cache.get(45.0), None);
}

#[test]
fn test_field_value_selects_own_presence_row() {
    let mut state = PlanState::default();
    state.presence.insert(
        "s1".to_string(),
        Presence {
            session: "s1".to_string(),
            selected_action: Some("buster".to_string()),
            updated_at: 10,
        },
    );

    let value = state.field_value(DocumentField::Presence, "s1");
    assert!(matches!(
        value,
        Some(FieldValue::Presence { presence }) if presence.selected_action.as_deref() == Some("buster")
    ));
    assert!(state.field_value(DocumentField::Presence, "s2").is_none());
}

#[test]
fn test_apply_presence_merges_by_session() {
    let mut state = PlanState::default();
    state.apply_field(&FieldValue::Presence {
        presence: Presence {
            session: "s1".to_string(),
            selected_action: None,
            updated_at: 1,
        },
    });
    state.apply_field(&FieldValue::Presence {
        presence: Presence {
            session: "s2".to_string(),
            selected_action: Some("open".to_string()),
            updated_at: 2,
        },
    });

    assert_eq!(state.presence.len(), 2);
}
