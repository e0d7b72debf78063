use greenland_game::{
    ContentCatalog, GameConfig, GameKind, SessionConfig, SessionRegistry, SessionState, ShareCode,
};
use serde_json::Value;

#[test]
fn session_state_serializes_with_game_tag() {
    let mut registry = SessionRegistry::with_defaults().unwrap();
    let id = registry
        .start_session(SessionConfig::new(GameKind::Strategy).with_seed(21))
        .unwrap();
    let state = registry.enact_policy(id, "language-act").unwrap();
    let value = serde_json::to_value(&state).unwrap();

    assert_eq!(value["game"], "strategy");
    assert_eq!(value["state"]["phase"], "playing");
    assert_eq!(value["state"]["turn"], 1);
    assert_eq!(value["state"]["enacted"][0], "language-act");
    assert_eq!(value["state"]["log"][0]["kind"], "policy_enacted");
    assert!(value["share_code"].as_str().unwrap().starts_with("PS-"));

    let back: SessionState = serde_json::from_value(value).unwrap();
    assert_eq!(back, state);
}

#[test]
fn trivia_state_hides_the_answer_while_asking() {
    let mut registry = SessionRegistry::with_defaults().unwrap();
    let id = registry
        .start_session(SessionConfig::new(GameKind::Trivia).with_seed(2))
        .unwrap();
    let value = serde_json::to_value(registry.state(id).unwrap()).unwrap();
    assert_eq!(value["state"]["phase"], "asking");
    assert_eq!(value["state"]["question"]["correct"], Value::Null);
    assert_eq!(value["state"]["remaining"], 15);
    assert_eq!(value["state"]["total"], 10);
}

#[test]
fn decide_state_reports_current_node() {
    let mut registry = SessionRegistry::with_defaults().unwrap();
    let id = registry
        .start_session(SessionConfig::new(GameKind::Decide).with_seed(3))
        .unwrap();
    let value = serde_json::to_value(registry.state(id).unwrap()).unwrap();
    assert_eq!(value["game"], "decide");
    assert_eq!(value["state"]["phase"], "in_progress");
    assert_eq!(value["state"]["node"], registry.scenario().root());
    assert_eq!(value["state"]["locked"], false);
}

#[test]
fn effects_accept_happiness_alias() {
    let json = r#"{"scenario": {"root": "a", "nodes": [
        {"id": "a", "prompt": "?", "choices": [
            {"id": "x", "label": "X", "effect": {"stats": {"happiness": 5}, "budget": -10}}
        ]}
    ]}}"#;
    let catalog = ContentCatalog::from_json(json).unwrap();
    let choice = &catalog.scenario.node("a").unwrap().choices[0];
    assert_eq!(choice.effect.delta(greenland_game::Axis::Culture), Some(5));
    assert_eq!(choice.effect.budget, -10);
}

#[test]
fn catalog_roundtrips_through_json() {
    let catalog = ContentCatalog::load_default().unwrap();
    let json = serde_json::to_string(&catalog).unwrap();
    let back = ContentCatalog::from_json(&json).unwrap();
    assert_eq!(back, catalog);
    back.validate(&GameConfig::default()).unwrap();
}

#[test]
fn default_assets_have_expected_shape() {
    let catalog = ContentCatalog::load_default().unwrap();
    assert_eq!(catalog.scenario.len(), 8);
    assert_eq!(catalog.policies.len(), 8);
    assert_eq!(catalog.events.len(), 6);
    assert_eq!(catalog.buildings.len(), 8);
    assert!(catalog.questions.len() >= 10);
    assert!(catalog.events.iter().all(|event| event.options.len() >= 2));
}

#[test]
fn config_serializes_every_section() {
    let value = serde_json::to_value(GameConfig::default()).unwrap();
    for section in ["decide", "strategy", "trivia", "map", "outcomes"] {
        assert!(value.get(section).is_some(), "missing {section}");
    }
    assert_eq!(value["strategy"]["horizon"], 10);
    assert_eq!(value["map"]["refund_pct"], 50);
    assert_eq!(value["outcomes"].as_array().unwrap().len(), 6);
}

#[test]
fn share_codes_name_their_game() {
    for game in GameKind::ALL {
        let code = ShareCode::from_entropy(game, 0x1234_5678);
        let parsed: ShareCode = code.to_string().parse().unwrap();
        assert_eq!(parsed.game(), game);
        assert_eq!(parsed.seed(), code.seed());
    }
}
