//! Load → match → consume scenarios driven through the public API.

use std::sync::Arc;
use std::thread;

use lattice_common::{ItemId, ItemStack, RecipeId};
use lattice_crafting::{
    decode_recipe, encode_recipe, find_shaped_placement, load_recipes_from_str, CraftingGrid,
    ItemCatalog, RecipeRegistry, RecipeShape, TagCatalog, TagCatalogHandle,
};

const ITEMS: &str = r#"{
    "minecraft:a": 1, "minecraft:b": 2, "minecraft:c": 3, "minecraft:d": 4, "minecraft:x": 5,
    "minecraft:oak_log": 10, "minecraft:birch_log": 11,
    "minecraft:stick": 20, "minecraft:oak_planks": 30, "minecraft:birch_planks": 31,
    "minecraft:campfire": 40, "minecraft:crafting_table": 41
}"#;

const TAGS: &str = r#"{
    "minecraft:logs": ["oak_log", "birch_log"],
    "minecraft:planks": ["oak_planks"]
}"#;

const A: ItemId = ItemId::new(1);
const B: ItemId = ItemId::new(2);
const C: ItemId = ItemId::new(3);
const D: ItemId = ItemId::new(4);
const X: ItemId = ItemId::new(5);
const OAK_LOG: ItemId = ItemId::new(10);
const BIRCH_LOG: ItemId = ItemId::new(11);
const STICK: ItemId = ItemId::new(20);
const OAK_PLANKS: ItemId = ItemId::new(30);
const BIRCH_PLANKS: ItemId = ItemId::new(31);
const CAMPFIRE: ItemId = ItemId::new(40);

struct Fixture {
    items: ItemCatalog,
    tags: Arc<TagCatalogHandle>,
}

impl Fixture {
    fn new() -> Self {
        let items = ItemCatalog::from_json_str(ITEMS).expect("items");
        let tags = TagCatalog::from_json_str(TAGS, &items).expect("tags");
        Self {
            items,
            tags: Arc::new(TagCatalogHandle::new(tags)),
        }
    }

    fn registry(&self, document: &str) -> Arc<RecipeRegistry> {
        let outcome = load_recipes_from_str(document, &self.items);
        assert!(outcome.is_clean(), "{:?}", outcome.rejected);
        Arc::new(outcome.registry)
    }

    fn grid(&self, size: u8, document: &str) -> CraftingGrid {
        CraftingGrid::new(size, size, self.registry(document), Arc::clone(&self.tags))
            .expect("grid")
    }
}

fn one(item: ItemId) -> Option<ItemStack> {
    Some(ItemStack::one(item))
}

#[test]
fn shaped_two_by_two_crafts_and_empties_grid() {
    let fixture = Fixture::new();
    let mut grid = fixture.grid(
        2,
        r#"[{
            "shaped": true,
            "pattern": ["AB", "CD"],
            "key": {
                "A": {"item": "minecraft:a"}, "B": {"item": "minecraft:b"},
                "C": {"item": "minecraft:c"}, "D": {"item": "minecraft:d"}
            },
            "result": {"id": "minecraft:x", "count": 1}
        }]"#,
    );

    for (slot, item) in [(1, A), (2, B), (3, C), (4, D)] {
        grid.set_slot(slot, one(item)).expect("slot");
    }

    assert_eq!(grid.craftable_recipe(), Some(RecipeId::FIRST));
    grid.on_grid_cell_changed();
    assert_eq!(grid.result(), ItemStack::new(X, 1));

    assert_eq!(grid.consume(), Some(RecipeId::FIRST));
    assert!(grid.cells().iter().all(Option::is_none));
    assert_eq!(grid.last_crafted(), Some(RecipeId::FIRST));
}

#[test]
fn clearing_the_grid_drops_the_pending_result() {
    let fixture = Fixture::new();
    let mut grid = fixture.grid(
        2,
        r#"[{"shaped": false, "ingredients": [{"item": "a"}], "result": {"id": "x", "count": 2}}]"#,
    );

    grid.set_slot(3, one(A)).expect("slot");
    assert_eq!(grid.result(), ItemStack::new(X, 2));

    grid.clear();
    assert!(grid.cells().iter().all(Option::is_none));
    assert_eq!(grid.result(), None);
    assert_eq!(grid.take_result(), None);
}

#[test]
fn shaped_pattern_in_wrong_arrangement_does_not_match() {
    let fixture = Fixture::new();
    let mut grid = fixture.grid(
        2,
        r#"[{
            "shaped": true,
            "pattern": ["AB", "CD"],
            "key": {
                "A": {"item": "a"}, "B": {"item": "b"}, "C": {"item": "c"}, "D": {"item": "d"}
            },
            "result": {"id": "x", "count": 1}
        }]"#,
    );

    for (slot, item) in [(1, B), (2, A), (3, C), (4, D)] {
        grid.set_slot(slot, one(item)).expect("slot");
    }
    assert_eq!(grid.craftable_recipe(), None);
    assert_eq!(grid.result(), None);
}

#[test]
fn shapeless_matches_at_any_positions() {
    let fixture = Fixture::new();
    let registry = fixture.registry(
        r#"[{
            "shaped": false,
            "ingredients": [{"tag": "minecraft:logs"}, {"item": "minecraft:stick"}],
            "result": {"id": "minecraft:campfire", "count": 1}
        }]"#,
    );

    for log_cell in 0..9 {
        for stick_cell in (0..9).filter(|&cell| cell != log_cell) {
            let mut grid =
                CraftingGrid::new(3, 3, Arc::clone(&registry), Arc::clone(&fixture.tags))
                    .expect("grid");
            grid.set_cell(log_cell, one(BIRCH_LOG)).expect("cell");
            grid.set_cell(stick_cell, one(STICK)).expect("cell");

            assert_eq!(
                grid.result(),
                ItemStack::new(CAMPFIRE, 1),
                "log at {log_cell}, stick at {stick_cell}"
            );
        }
    }
}

#[test]
fn shaped_consumption_uses_the_matched_offset() {
    let fixture = Fixture::new();
    let registry = fixture.registry(
        r##"[{
            "shaped": true,
            "pattern": ["#", "#"],
            "key": {"#": {"tag": "minecraft:planks"}},
            "result": {"id": "minecraft:stick", "count": 4}
        }]"##,
    );
    let mut grid = CraftingGrid::new(3, 3, Arc::clone(&registry), Arc::clone(&fixture.tags))
        .expect("grid");

    // Column 2, rows 1-2: every other offset leaves an item outside the
    // recipe window.
    grid.set_cell_at(2, 1, ItemStack::new(OAK_PLANKS, 2)).expect("cell");
    grid.set_cell_at(2, 2, ItemStack::new(OAK_PLANKS, 1)).expect("cell");

    let recipe = registry.get(RecipeId::FIRST).expect("recipe");
    let tags = fixture.tags.snapshot();
    assert_eq!(find_shaped_placement(recipe, &grid.snapshot(), &tags), Some((2, 1)));

    let before = grid.cells().to_vec();
    assert_eq!(grid.take_result(), ItemStack::new(STICK, 4));

    for (index, (old, new)) in before.iter().zip(grid.cells()).enumerate() {
        match index {
            5 => assert_eq!(*new, ItemStack::new(OAK_PLANKS, 1)),
            8 => assert_eq!(*new, None),
            _ => assert_eq!(old, new, "cell {index} changed"),
        }
    }
}

#[test]
fn consume_without_match_is_a_no_op() {
    let fixture = Fixture::new();
    let mut grid = fixture.grid(
        3,
        r#"[{"shaped": false, "ingredients": [{"item": "oak_log"}],
             "result": {"id": "oak_planks", "count": 4}}]"#,
    );

    grid.set_cell(4, one(OAK_LOG)).expect("cell");
    assert_eq!(grid.consume(), Some(RecipeId::FIRST));

    grid.set_cell(0, one(STICK)).expect("cell");
    grid.set_cell(1, one(STICK)).expect("cell");
    let before = grid.cells().to_vec();

    assert_eq!(grid.consume(), None);
    assert_eq!(grid.cells(), before.as_slice());
    assert_eq!(grid.last_crafted(), Some(RecipeId::FIRST));
}

#[test]
fn earlier_recipe_wins_when_both_match() {
    let fixture = Fixture::new();
    let mut grid = fixture.grid(
        2,
        r#"[
            {"shaped": false, "ingredients": [{"tag": "logs"}],
             "result": {"id": "oak_planks", "count": 4}},
            {"shaped": false, "ingredients": [{"item": "oak_log"}],
             "result": {"id": "stick", "count": 1}}
        ]"#,
    );

    grid.set_cell(0, one(OAK_LOG)).expect("cell");
    assert_eq!(grid.craftable_recipe(), Some(RecipeId::new(1)));
    assert_eq!(grid.result(), ItemStack::new(OAK_PLANKS, 4));
}

#[test]
fn greedy_shapeless_assignment_depends_on_placement() {
    let fixture = Fixture::new();
    let document = r#"[{
        "shaped": false,
        "ingredients": [{"tag": "logs"}, {"item": "oak_log"}],
        "result": {"id": "campfire", "count": 1}
    }]"#;

    // The tag ingredient claims the oak log in cell 0, leaving only the birch
    // log for the oak ingredient, although birch→tag and oak→item would fit.
    let mut blocked = fixture.grid(2, document);
    blocked.set_cell(0, one(OAK_LOG)).expect("cell");
    blocked.set_cell(1, one(BIRCH_LOG)).expect("cell");
    assert_eq!(blocked.craftable_recipe(), None);
    assert_eq!(blocked.consume(), None);
    assert_eq!(blocked.cell(0), one(OAK_LOG));

    let mut swapped = fixture.grid(2, document);
    swapped.set_cell(0, one(BIRCH_LOG)).expect("cell");
    swapped.set_cell(1, one(OAK_LOG)).expect("cell");
    assert_eq!(swapped.craftable_recipe(), Some(RecipeId::FIRST));
}

#[test]
fn tag_catalog_replacement_reaches_existing_grids() {
    let fixture = Fixture::new();
    let mut grid = fixture.grid(
        2,
        r#"[{"shaped": false, "ingredients": [{"tag": "planks"}, {"tag": "planks"}],
             "result": {"id": "stick", "count": 4}}]"#,
    );

    grid.set_cell(0, one(BIRCH_PLANKS)).expect("cell");
    grid.set_cell(2, one(OAK_PLANKS)).expect("cell");
    assert_eq!(grid.result(), None);

    let mut extended = TagCatalog::from_json_str(TAGS, &fixture.items).expect("tags");
    extended.insert("planks", [BIRCH_PLANKS]);
    fixture.tags.replace(extended);

    grid.on_grid_cell_changed();
    assert_eq!(grid.result(), ItemStack::new(STICK, 4));
}

#[test]
fn unknown_tag_recipe_never_matches_but_others_do() {
    let fixture = Fixture::new();
    let mut grid = fixture.grid(
        2,
        r#"[
            {"shaped": false, "ingredients": [{"tag": "minecraft:wool"}],
             "result": {"id": "stick", "count": 1}},
            {"shaped": false, "ingredients": [{"item": "oak_log"}],
             "result": {"id": "oak_planks", "count": 4}}
        ]"#,
    );

    grid.set_cell(3, one(OAK_LOG)).expect("cell");
    assert_eq!(grid.craftable_recipe(), Some(RecipeId::new(2)));
}

#[test]
fn wire_round_trip_keeps_shape_and_result() {
    let fixture = Fixture::new();
    let registry = fixture.registry(
        r#"[
            {"shaped": true, "pattern": ["AB", " C"],
             "key": {"A": {"item": "a"}, "B": {"item": "b"}, "C": {"item": "c"}},
             "result": {"id": "x", "count": 3}},
            {"shaped": false, "ingredients": [{"item": "a"}, {"item": "d"}],
             "result": {"id": "campfire", "count": 1}}
        ]"#,
    );
    let tags = fixture.tags.snapshot();

    for recipe in registry.iter() {
        let decoded = decode_recipe(&encode_recipe(recipe, &tags)).expect("decode");
        assert_eq!(decoded.id, recipe.id());
        assert_eq!(decoded.shape, recipe.shape());
        assert_eq!(decoded.result, ItemStack::new(recipe.result(), recipe.result_count()));
        assert_eq!(decoded.ingredients.len(), recipe.ingredients().len());
    }

    let shaped = registry.get(RecipeId::FIRST).expect("recipe");
    let decoded = decode_recipe(&encode_recipe(shaped, &tags)).expect("decode");
    assert_eq!(decoded.shape, RecipeShape::Shaped { width: 2, height: 2 });
    assert_eq!(decoded.ingredients, vec![one(A), one(B), None, one(C)]);
}

#[test]
fn shared_grid_serializes_access_across_threads() {
    let fixture = Fixture::new();
    let shared = fixture
        .grid(
            2,
            r#"[{"shaped": false, "ingredients": [{"tag": "logs"}, {"item": "stick"}],
                 "result": {"id": "campfire", "count": 1}}]"#,
        )
        .into_shared();

    thread::scope(|scope| {
        let first = Arc::clone(&shared);
        scope.spawn(move || {
            first.lock().set_cell(0, ItemStack::new(OAK_LOG, 2)).expect("cell");
        });
        let second = Arc::clone(&shared);
        scope.spawn(move || {
            second.lock().set_cell(3, ItemStack::new(STICK, 2)).expect("cell");
        });
    });

    let mut grid = shared.lock();
    assert_eq!(grid.result(), ItemStack::new(CAMPFIRE, 1));
    assert_eq!(grid.take_result(), ItemStack::new(CAMPFIRE, 1));
    assert_eq!(grid.cell(0), ItemStack::new(OAK_LOG, 1));
    assert_eq!(grid.cell(3), ItemStack::new(STICK, 1));
}
