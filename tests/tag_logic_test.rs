// AND/OR semantics of multi-valued tag filters, executed against a real database.
//
// Wall of Fire has school 3 twice and Mage Armor has school 2 twice, so the
// `COUNT(DISTINCT ...) = N` check is exercised with duplicated junction rows.

mod common;
use common::{SpellRow, ids, list, setup_catalog, setup_test_db, sorted_ids};
use grimoire::Resource;

#[tokio::test]
async fn test_school_or_logic_matches_any() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    let catalog = setup_catalog(&db).await;
    let spells = catalog.config(Resource::Spells);

    let page = list::<SpellRow>(spells, &db, &[("school", "1,3")]).await;
    assert_eq!(sorted_ids(&page), vec![1, 2, 3, 5]);
    assert_eq!(page.total, 4);
}

#[tokio::test]
async fn test_school_and_logic_requires_all() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    let catalog = setup_catalog(&db).await;
    let spells = catalog.config(Resource::Spells);

    // Fire Shield is the only abjuration evocation
    let page = list::<SpellRow>(spells, &db, &[("school", "1,3"), ("school_logic", "and")]).await;
    assert_eq!(ids(&page), vec![2]);
    assert_eq!(page.total, 1);

    // Names resolve through the school cache
    let page = list::<SpellRow>(
        spells,
        &db,
        &[("school", "Abjuration"), ("school", "evocation"), ("school_logic", "AND")],
    )
    .await;
    assert_eq!(ids(&page), vec![2]);
}

#[tokio::test]
async fn test_duplicated_junction_rows_do_not_satisfy_and_logic() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    let catalog = setup_catalog(&db).await;
    let spells = catalog.config(Resource::Spells);

    // Mage Armor has two conjuration rows and no evocation row
    let page = list::<SpellRow>(spells, &db, &[("school", "2,3"), ("school_logic", "and")]).await;
    assert_eq!(ids(&page), vec![3]);

    // Wall of Fire's duplicated evocation row does not make it abjuration
    let page = list::<SpellRow>(spells, &db, &[("school", "1,3"), ("school_logic", "and")]).await;
    assert!(!ids(&page).contains(&3));
}

#[tokio::test]
async fn test_repeated_request_values_do_not_inflate_and_count() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    let catalog = setup_catalog(&db).await;
    let spells = catalog.config(Resource::Spells);

    let page = list::<SpellRow>(
        spells,
        &db,
        &[("school", "3,3,evocation"), ("school_logic", "and")],
    )
    .await;
    assert_eq!(sorted_ids(&page), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_class_filter_and_logic_on_alternate_base() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    let catalog = setup_catalog(&db).await;
    let spells = catalog.config(Resource::Spells);

    // Only Wall of Fire is on both the wizard and cleric lists
    let page = list::<SpellRow>(spells, &db, &[("classId", "wiz,clr"), ("classId_logic", "and")]).await;
    assert_eq!(ids(&page), vec![3]);

    // OR over classes still yields one row per spell
    let page = list::<SpellRow>(spells, &db, &[("classId", "Wizard,Sorcerer")]).await;
    assert_eq!(sorted_ids(&page), vec![1, 2, 3, 4, 5]);
    assert_eq!(page.total, 5);
}

#[tokio::test]
async fn test_hidden_level_rows_are_ignored() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    let catalog = setup_catalog(&db).await;
    let spells = catalog.config(Resource::Spells);

    // Shield's cleric row is not displayed
    let page = list::<SpellRow>(spells, &db, &[("classId", "3")]).await;
    assert_eq!(ids(&page), vec![3]);
}

#[tokio::test]
async fn test_source_filter_respects_display_flag() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    let catalog = setup_catalog(&db).await;
    let spells = catalog.config(Resource::Spells);

    let page = list::<SpellRow>(spells, &db, &[("source", "SpC")]).await;
    assert!(page.results.is_empty());
    assert_eq!(page.total, 0);

    let page = list::<SpellRow>(spells, &db, &[("source", "phb")]).await;
    assert_eq!(page.total, 5);
}

#[tokio::test]
async fn test_and_logic_includes_supersets() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    let catalog = setup_catalog(&db).await;
    let spells = catalog.config(Resource::Spells);

    // Fireball has verbal, somatic and material; Fire Shield lacks material
    let page = list::<SpellRow>(spells, &db, &[("components", "V,M"), ("components_logic", "and")]).await;
    assert_eq!(ids(&page), vec![1]);
    assert_eq!(page.total, 1);

    // Every spell has verbal and somatic, whatever else it has
    let page = list::<SpellRow>(spells, &db, &[("components", "V,S"), ("components_logic", "and")]).await;
    assert_eq!(sorted_ids(&page), vec![1, 2, 3, 4, 5]);
}
