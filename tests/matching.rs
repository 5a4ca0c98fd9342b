use std::collections::BTreeSet;

use zoo_ecs::prelude::*;

struct Fixture {
    zoo: Zoo<()>,
    a: Entity,
    b: Entity,
    c: Entity,
    d: Entity,
    e: Entity,
}

fn fixture() -> Fixture {
    let mut zoo = Zoo::<()>::new();
    let bags = [
        ComponentBag::new().with("text", "a"),
        ComponentBag::new().with_tag("sprite"),
        ComponentBag::new().with_tag("sprite").with("text", "c"),
        ComponentBag::new()
            .with_tag("sprite")
            .with_tag("hidden")
            .with("text", "d"),
        ComponentBag::new().with("text", "e"),
    ];
    for bag in bags {
        zoo.world.add_entity(bag);
    }
    let spawned = zoo.flush().spawned;
    Fixture {
        zoo,
        a: spawned[0],
        b: spawned[1],
        c: spawned[2],
        d: spawned[3],
        e: spawned[4],
    }
}

fn set(entities: impl IntoIterator<Item = Entity>) -> BTreeSet<Entity> {
    entities.into_iter().collect()
}

fn registered(f: &mut Fixture, query: &str) -> BTreeSet<Entity> {
    let id = f
        .zoo
        .add_system(FnSystem::new(format!("q:{query}"), query).boxed())
        .unwrap();
    f.zoo.matched(id).unwrap().entities().clone()
}

#[test]
fn test_matching_correctness() {
    let mut f = fixture();
    let (a, b, c, d, e) = (f.a, f.b, f.c, f.d, f.e);

    let cases = [
        ("text", set([a, c, d, e])),
        ("sprite", set([b, c, d])),
        ("text & sprite", set([c, d])),
        ("text & sprite & !hidden", set([c])),
        ("sprite & hidden | sprite & text", set([c, d])),
    ];

    for (query, expected) in cases {
        assert_eq!(set(f.zoo.world.query(query).unwrap()), expected, "ad hoc {query}");
        assert_eq!(registered(&mut f, query), expected, "matched set {query}");
    }
}

#[test]
fn test_query_keys_has_every_key() {
    let f = fixture();
    assert_eq!(
        set(f.zoo.world.query_keys(&["text", "sprite"])),
        set([f.c, f.d])
    );
}

#[test]
fn test_removal_takes_effect_after_flush() {
    let mut f = fixture();
    let sprites = f
        .zoo
        .add_system(FnSystem::new("sprites", "sprite").boxed())
        .unwrap();
    let texts = f
        .zoo
        .add_system(FnSystem::new("texts", "text").boxed())
        .unwrap();

    f.zoo.world.remove_components(f.c, ["sprite"]);
    assert!(f.zoo.matched(sprites).unwrap().contains(f.c));
    assert!(f.zoo.world.has(f.c, "sprite"));

    f.zoo.update(&mut ()).unwrap();
    assert!(!f.zoo.matched(sprites).unwrap().contains(f.c));
    assert!(f.zoo.matched(texts).unwrap().contains(f.c));
    assert!(f.zoo.world.index_is_consistent());
}

#[test]
fn test_negated_term_gains_entity_on_removal() {
    let mut f = fixture();
    let visible = f
        .zoo
        .add_system(FnSystem::new("visible", "sprite & !hidden").boxed())
        .unwrap();
    assert!(!f.zoo.matched(visible).unwrap().contains(f.d));

    f.zoo.world.remove_components(f.d, ["hidden"]);
    f.zoo.flush();
    assert!(f.zoo.matched(visible).unwrap().contains(f.d));
}

#[test]
fn test_remove_entity_drops_from_every_set() {
    let mut f = fixture();
    let ids = f
        .zoo
        .add_systems([
            FnSystem::new("all", "").boxed(),
            FnSystem::new("texts", "text").boxed(),
        ])
        .unwrap();

    f.zoo.world.remove_entity(f.a);
    f.zoo.flush();

    for id in ids {
        assert!(!f.zoo.matched(id).unwrap().contains(f.a));
    }
    assert_eq!(
        f.zoo.world.get::<&str>(f.a, "text").unwrap_err(),
        ZooError::UnknownEntity(f.a)
    );
}

#[test]
fn test_missing_component_read() {
    let f = fixture();
    let err = f.zoo.world.get::<Tag>(f.a, "sprite").unwrap_err();
    assert_eq!(
        err,
        ZooError::MissingComponent {
            entity: f.a,
            key: "sprite".to_string()
        }
    );
}

#[test]
fn test_flush_is_idempotent() {
    let mut f = fixture();
    f.zoo.world.add_components(f.b, ComponentBag::new().with("text", "b"));

    let first = f.zoo.flush();
    let second = f.zoo.flush();
    assert_eq!(first.applied, 1);
    assert!(second.is_empty());
    assert_eq!(f.zoo.world.entity_count(), 5);
}

#[test]
fn test_add_then_remove_restores_shape() {
    let mut f = fixture();
    let before: Vec<String> = f
        .zoo
        .world
        .bag(f.c)
        .unwrap()
        .keys()
        .into_iter()
        .map(str::to_string)
        .collect();

    f.zoo.world.add_components(
        f.c,
        ComponentBag::new().with("velocity", (1.0f32, 0.0f32)).with_tag("hidden"),
    );
    f.zoo.flush();
    assert!(f.zoo.world.has(f.c, "velocity"));

    f.zoo.world.remove_components(f.c, ["velocity", "hidden"]);
    f.zoo.flush();
    let after: Vec<&str> = f.zoo.world.bag(f.c).unwrap().keys();
    assert_eq!(after, before);
}

#[test]
fn test_fifo_race_with_remove_entity() {
    let mut f = fixture();

    // edits queued ahead of the removal land, then the removal wins
    f.zoo.world.add_components(f.e, ComponentBag::new().with_tag("sprite"));
    f.zoo.world.remove_entity(f.e);
    // edits queued behind it find nothing
    f.zoo.world.add_components(f.e, ComponentBag::new().with_tag("hidden"));

    let report = f.zoo.flush();
    assert_eq!(report.applied, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.despawned, vec![f.e]);
    assert!(!f.zoo.world.contains(f.e));
}

#[test]
fn test_level_bags_from_json() {
    let mut zoo = Zoo::<()>::new();
    let level = serde_json::json!([
        { "sprite": "hero.png", "position": { "x": 0, "y": 0 } },
        { "text": "Press start" }
    ]);
    if let serde_json::Value::Array(entities) = level {
        for entity in entities {
            zoo.world.add_entity(ComponentBag::from_json(entity).unwrap());
        }
    }
    let spawned = zoo.flush().spawned;

    assert_eq!(zoo.world.query("sprite & position").unwrap(), vec![spawned[0]]);
    assert_eq!(
        zoo.world
            .get::<serde_json::Value>(spawned[1], "text")
            .unwrap(),
        &serde_json::json!("Press start")
    );
}
