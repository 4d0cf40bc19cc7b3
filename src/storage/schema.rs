//! Database schema definitions

/// SQL to create the types table (skill and item categories)
pub const CREATE_TYPES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS types (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    category TEXT NOT NULL,
    name TEXT NOT NULL,
    UNIQUE(category, name)
)
"#;

/// SQL to create the classes table
pub const CREATE_CLASSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS classes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    faction TEXT NOT NULL,
    role TEXT,
    description TEXT NOT NULL DEFAULT '',
    icon TEXT,
    talent_tree TEXT
)
"#;

/// SQL to create the skills table
/// `level_values` holds the per-level parameter table as JSON
pub const CREATE_SKILLS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS skills (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    icon TEXT,
    description TEXT NOT NULL DEFAULT '',
    max_level INTEGER NOT NULL DEFAULT 1,
    level_values TEXT NOT NULL DEFAULT '{}',
    skill_type_id INTEGER REFERENCES types(id) ON DELETE SET NULL
)
"#;

/// SQL to create the class <-> skill join table
pub const CREATE_CLASS_SKILLS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS class_skills (
    class_id INTEGER NOT NULL REFERENCES classes(id) ON DELETE CASCADE,
    skill_id INTEGER NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
    PRIMARY KEY (class_id, skill_id)
)
"#;

/// SQL to create the talents table
pub const CREATE_TALENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS talents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    class_id INTEGER NOT NULL REFERENCES classes(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    icon TEXT,
    description TEXT NOT NULL DEFAULT '',
    max_level INTEGER NOT NULL DEFAULT 1,
    level_values TEXT NOT NULL DEFAULT '{}',
    UNIQUE(class_id, name)
)
"#;

/// SQL to create the items table
pub const CREATE_ITEMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    icon TEXT,
    item_type_id INTEGER REFERENCES types(id) ON DELETE SET NULL,
    level INTEGER,
    rarity TEXT,
    description TEXT NOT NULL DEFAULT ''
)
"#;

/// SQL to create the posts table (guides, lore, news)
pub const CREATE_POSTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    summary TEXT,
    content TEXT NOT NULL DEFAULT '',
    kind TEXT NOT NULL DEFAULT 'guide',
    published INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

pub const CREATE_TAGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
)
"#;

pub const CREATE_POST_TAGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS post_tags (
    post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
    tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (post_id, tag_id)
)
"#;

/// SQL to create the weekly_schedules table
pub const CREATE_WEEKLY_SCHEDULES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS weekly_schedules (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    day_of_week INTEGER NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
    start_time TEXT NOT NULL,
    end_time TEXT,
    description TEXT,
    sort_order INTEGER NOT NULL DEFAULT 0
)
"#;

/// SQL to create the events table
/// `external_id` is the feed guid; the UNIQUE constraint makes sync reruns idempotent
pub const CREATE_EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    original_title TEXT,
    link TEXT,
    published_at TEXT,
    created_at TEXT NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_talents_class ON talents(class_id)",
    "CREATE INDEX IF NOT EXISTS idx_class_skills_skill ON class_skills(skill_id)",
    "CREATE INDEX IF NOT EXISTS idx_items_type ON items(item_type_id)",
    "CREATE INDEX IF NOT EXISTS idx_posts_kind ON posts(kind, published)",
    "CREATE INDEX IF NOT EXISTS idx_post_tags_tag ON post_tags(tag_id)",
    "CREATE INDEX IF NOT EXISTS idx_schedules_day ON weekly_schedules(day_of_week, sort_order)",
    "CREATE INDEX IF NOT EXISTS idx_events_published ON events(published_at)",
];

/// Tables in dependency order, used for stats
pub const TABLES: &[&str] = &[
    "types",
    "classes",
    "skills",
    "class_skills",
    "talents",
    "items",
    "posts",
    "tags",
    "post_tags",
    "weekly_schedules",
    "events",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_TYPES_TABLE,
        CREATE_CLASSES_TABLE,
        CREATE_SKILLS_TABLE,
        CREATE_CLASS_SKILLS_TABLE,
        CREATE_TALENTS_TABLE,
        CREATE_ITEMS_TABLE,
        CREATE_POSTS_TABLE,
        CREATE_TAGS_TABLE,
        CREATE_POST_TAGS_TABLE,
        CREATE_WEEKLY_SCHEDULES_TABLE,
        CREATE_EVENTS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
