use axum::Router;
use grimoire::filtering::config::FilterConfig;
use grimoire::operations::{ListPage, fetch_page_as};
use grimoire::query::ListQuery;
use grimoire::{AppState, Catalog, RawParams, build_list_query, process, router};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, FromQueryResult};

// Helper function to get database URL from environment or default to SQLite
fn get_test_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string())
}

const TABLES: [&str; 23] = [
    "spells",
    "spell_level_map",
    "spell_school_map",
    "spell_subschool_map",
    "spell_descriptor_map",
    "spell_component_map",
    "spell_source_map",
    "spell_schools",
    "spell_subschools",
    "spell_descriptors",
    "spell_components",
    "source_books",
    "editions",
    "classes",
    "class_source_map",
    "races",
    "race_traits",
    "skills",
    "feats",
    "feat_benefit_map",
    "reference_tables",
    "reference_table_rows",
    "reference_table_columns",
];

const SCHEMA: &[&str] = &[
    "CREATE TABLE spells (spell_id INTEGER PRIMARY KEY, spell_name TEXT NOT NULL, \
     spell_level INTEGER, edition_id INTEGER NOT NULL)",
    "CREATE TABLE spell_level_map (spell_id INTEGER NOT NULL, class_id INTEGER NOT NULL, \
     spell_level INTEGER NOT NULL, display INTEGER NOT NULL)",
    "CREATE TABLE spell_school_map (spell_id INTEGER NOT NULL, school_id INTEGER NOT NULL)",
    "CREATE TABLE spell_subschool_map (spell_id INTEGER NOT NULL, sub_id INTEGER NOT NULL)",
    "CREATE TABLE spell_descriptor_map (spell_id INTEGER NOT NULL, desc_id INTEGER NOT NULL)",
    "CREATE TABLE spell_component_map (spell_id INTEGER NOT NULL, comp_id INTEGER NOT NULL)",
    "CREATE TABLE spell_source_map (spell_id INTEGER NOT NULL, book_id INTEGER NOT NULL, \
     page_number INTEGER, display INTEGER NOT NULL)",
    "CREATE TABLE spell_schools (school_id INTEGER PRIMARY KEY, school_name TEXT NOT NULL)",
    "CREATE TABLE spell_subschools (sub_id INTEGER PRIMARY KEY, subschool TEXT NOT NULL)",
    "CREATE TABLE spell_descriptors (desc_id INTEGER PRIMARY KEY, descriptor TEXT NOT NULL)",
    "CREATE TABLE spell_components (comp_id INTEGER PRIMARY KEY, comp_name TEXT NOT NULL, \
     comp_abbrev TEXT)",
    "CREATE TABLE source_books (book_id INTEGER PRIMARY KEY, title TEXT NOT NULL, \
     abbrev_title TEXT, display INTEGER NOT NULL)",
    "CREATE TABLE editions (edition_id INTEGER PRIMARY KEY, edition_abbrev TEXT NOT NULL)",
    "CREATE TABLE classes (class_id INTEGER PRIMARY KEY, class_name TEXT NOT NULL, \
     class_abbr TEXT, edition_id INTEGER, is_prestige_class INTEGER, display INTEGER NOT NULL, \
     caster INTEGER, hit_die INTEGER)",
    "CREATE TABLE class_source_map (class_id INTEGER NOT NULL, book_id INTEGER NOT NULL)",
    "CREATE TABLE races (race_id INTEGER PRIMARY KEY, race_name TEXT NOT NULL, \
     edition_id INTEGER, display INTEGER, size_id INTEGER, race_speed INTEGER, \
     favored_class_id INTEGER)",
    "CREATE TABLE race_traits (trait_slug VARCHAR(64) PRIMARY KEY, trait_name TEXT, \
     trait_description TEXT)",
    "CREATE TABLE skills (skill_id INTEGER PRIMARY KEY, skill_name TEXT NOT NULL, \
     skill_description TEXT, ability_id INTEGER, trained_only INTEGER, \
     skill_armor_check_penalty INTEGER, skill_check TEXT, skill_action TEXT, \
     skill_try_again INTEGER, skill_try_again_desc TEXT, skill_special TEXT, \
     skill_synergy_desc TEXT, untrained_desc TEXT)",
    "CREATE TABLE feats (feat_id INTEGER PRIMARY KEY, feat_name TEXT NOT NULL, feat_type TEXT, \
     feat_description TEXT, feat_benefit TEXT, feat_normal TEXT, feat_special TEXT, \
     feat_prereq TEXT, feat_multi_times INTEGER)",
    "CREATE TABLE feat_benefit_map (benefit_id INTEGER PRIMARY KEY, feat_id INTEGER NOT NULL, \
     benefit_type TEXT, benefit_type_id INTEGER, benefit_amount INTEGER)",
    "CREATE TABLE reference_tables (id INTEGER PRIMARY KEY, name TEXT NOT NULL, description TEXT, \
     slug VARCHAR(64) NOT NULL)",
    "CREATE TABLE reference_table_rows (id INTEGER PRIMARY KEY, table_id INTEGER NOT NULL, \
     row_index INTEGER NOT NULL, label TEXT)",
    "CREATE TABLE reference_table_columns (id INTEGER PRIMARY KEY, table_id INTEGER NOT NULL, \
     column_index INTEGER NOT NULL, header TEXT)",
];

/// Five spells across three schools and three classes.
///
/// Wall of Fire and Mage Armor each carry a duplicated junction row.
const SEED: &[&str] = &[
    "INSERT INTO spell_schools (school_id, school_name) VALUES \
     (1, 'Abjuration'), (2, 'Conjuration'), (3, 'Evocation')",
    "INSERT INTO spell_subschools (sub_id, subschool) VALUES (1, 'Creation')",
    "INSERT INTO spell_descriptors (desc_id, descriptor) VALUES (1, 'Fire'), (2, 'Force')",
    "INSERT INTO spell_components (comp_id, comp_name, comp_abbrev) VALUES \
     (1, 'Verbal', 'V'), (2, 'Somatic', 'S'), (3, 'Material', 'M')",
    "INSERT INTO source_books (book_id, title, abbrev_title, display) VALUES \
     (1, 'Player''s Handbook', 'PHB', 1), (2, 'Spell Compendium', 'SpC', 1), \
     (3, 'Unreleased Playtest', 'UP', 0)",
    "INSERT INTO editions (edition_id, edition_abbrev) VALUES (4, '3E'), (5, '3.5E')",
    "INSERT INTO classes (class_id, class_name, class_abbr, edition_id, is_prestige_class, \
     display, caster, hit_die) VALUES \
     (1, 'Wizard', 'Wiz', 5, 0, 1, 1, 4), (2, 'Sorcerer', 'Sor', 5, 0, 1, 1, 4), \
     (3, 'Cleric', 'Clr', 5, 0, 1, 1, 8), (4, 'Fighter', 'Ftr', 4, 0, 1, 0, 10), \
     (5, 'Archmage', 'Arc', 5, 1, 0, 1, 4)",
    "INSERT INTO class_source_map (class_id, book_id) VALUES (1, 1), (2, 1), (3, 1), (4, 1), (4, 2)",
    "INSERT INTO spells (spell_id, spell_name, spell_level, edition_id) VALUES \
     (1, 'Fireball', 3, 5), (2, 'Fire Shield', 4, 5), (3, 'Wall of Fire', 4, 4), \
     (4, 'Mage Armor', 1, 5), (5, 'Shield', 1, 4)",
    "INSERT INTO spell_school_map (spell_id, school_id) VALUES \
     (1, 3), (2, 1), (2, 3), (3, 2), (3, 3), (3, 3), (4, 2), (4, 2), (5, 1)",
    "INSERT INTO spell_descriptor_map (spell_id, desc_id) VALUES (1, 1), (2, 1), (3, 1), (4, 2), (5, 2)",
    "INSERT INTO spell_component_map (spell_id, comp_id) VALUES \
     (1, 1), (1, 2), (1, 3), (2, 1), (2, 2), (3, 1), (3, 2), (4, 1), (4, 2), (5, 1), (5, 2)",
    "INSERT INTO spell_source_map (spell_id, book_id, page_number, display) VALUES \
     (1, 1, 231, 1), (2, 1, 230, 1), (3, 1, 298, 1), (4, 1, 249, 1), (5, 1, 278, 1), (3, 2, 10, 0)",
    "INSERT INTO spell_level_map (spell_id, class_id, spell_level, display) VALUES \
     (1, 1, 3, 1), (1, 2, 3, 1), (2, 1, 4, 1), (2, 2, 4, 1), (3, 1, 4, 1), (3, 3, 5, 1), \
     (4, 1, 1, 1), (4, 2, 1, 1), (5, 1, 1, 1), (5, 2, 1, 1), (5, 3, 1, 0)",
    "INSERT INTO races (race_id, race_name, edition_id, display, size_id, race_speed, favored_class_id) \
     VALUES (1, 'Human', 5, 1, 3, 30, NULL), (2, 'Dwarf', 5, 1, 3, 20, 4), (3, 'Gnome', 5, 1, 2, 20, 1)",
    "INSERT INTO race_traits (trait_slug, trait_name, trait_description) VALUES \
     ('darkvision', 'Darkvision', 'See in the dark up to 60 feet.'), \
     ('stonecunning', 'Stonecunning', 'Notice unusual stonework.')",
    "INSERT INTO skills (skill_id, skill_name, ability_id, trained_only) VALUES \
     (1, 'Spellcraft', 4, 1), (2, 'Climb', 1, 0)",
    "INSERT INTO feats (feat_id, feat_name, feat_type, feat_benefit, feat_multi_times) VALUES \
     (1, 'Power Attack', 'General', 'Trade attack bonus for damage.', 0), \
     (2, 'Spell Focus', 'General', 'Add +1 to the save DC of spells.', 1)",
    "INSERT INTO feat_benefit_map (benefit_id, feat_id, benefit_type, benefit_type_id, benefit_amount) \
     VALUES (1, 2, 'school_dc', 3, 1)",
    "INSERT INTO reference_tables (id, name, description, slug) VALUES \
     (1, 'Turn Undead', 'Turning checks by cleric level.', 'turn-undead'), \
     (2, 'Carrying Capacity', 'Loads by Strength score.', 'carrying-capacity'), \
     (3, 'Empty Table', NULL, 'empty-table')",
    "INSERT INTO reference_table_rows (id, table_id, row_index, label) VALUES \
     (1, 1, 0, 'Skeleton'), (2, 1, 1, 'Zombie'), (3, 1, 2, 'Ghoul'), \
     (4, 2, 0, 'Strength 10'), (5, 2, 1, 'Strength 18')",
    "INSERT INTO reference_table_columns (id, table_id, column_index, header) VALUES \
     (1, 1, 0, 'Creature'), (2, 1, 1, 'Hit Dice'), \
     (3, 2, 0, 'Light'), (4, 2, 1, 'Medium'), (5, 2, 2, 'Heavy')",
];

async fn cleanup_test_tables(db: &DatabaseConnection) {
    for table in TABLES {
        let _ = db.execute_unprepared(&format!("DROP TABLE IF EXISTS {table}")).await;
    }
}

#[allow(dead_code)]
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    // Surface compiled SQL with `cargo test -- --nocapture`
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    let database_url = get_test_database_url();
    let db = Database::connect(&database_url).await?;

    // For persistent databases, clean up any existing tables
    if !database_url.starts_with("sqlite::memory:") {
        cleanup_test_tables(&db).await;
    }

    for statement in SCHEMA.iter().chain(SEED) {
        db.execute_unprepared(statement).await?;
    }
    Ok(db)
}

#[allow(dead_code)]
pub async fn setup_catalog(db: &DatabaseConnection) -> Catalog {
    Catalog::load(db).await.expect("Failed to load catalog")
}

#[allow(dead_code)]
pub fn setup_test_app(db: &DatabaseConnection, catalog: Catalog) -> Router {
    router(AppState::new(db.clone(), catalog))
}

#[allow(dead_code)]
pub fn compile(config: &FilterConfig, db: &DatabaseConnection, pairs: &[(&str, &str)]) -> ListQuery {
    let raw = RawParams::from_pairs(pairs.iter().copied());
    let request = process(&raw, config).expect("caches are loaded");
    assert!(request.errors.is_empty(), "unexpected errors: {:?}", request.errors);
    build_list_query(config, &request, db.get_database_backend()).expect("request compiles")
}

/// Compile and run a list request, mapping rows to `M`.
#[allow(dead_code)]
pub async fn list<M: FromQueryResult>(
    config: &FilterConfig,
    db: &DatabaseConnection,
    pairs: &[(&str, &str)],
) -> ListPage<M> {
    let raw = RawParams::from_pairs(pairs.iter().copied());
    let request = process(&raw, config).expect("caches are loaded");
    let query = compile(config, db, pairs);
    fetch_page_as(db, &query, request.pagination, config.resource())
        .await
        .expect("query executes")
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct SpellRow {
    pub spell_id: i64,
    pub spell_name: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct ReferenceTableRow {
    pub id: i64,
    pub name: String,
    pub row_count: i64,
    pub column_count: i64,
}

#[allow(dead_code)]
pub fn ids(page: &ListPage<SpellRow>) -> Vec<i64> {
    page.results.iter().map(|row| row.spell_id).collect()
}

#[allow(dead_code)]
pub fn sorted_ids(page: &ListPage<SpellRow>) -> Vec<i64> {
    let mut ids = ids(page);
    ids.sort_unstable();
    ids
}
