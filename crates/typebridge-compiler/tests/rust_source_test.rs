use std::path::Path;

use typebridge_compiler::config::{SourceKind, CONFIG_FILE};
use typebridge_compiler::{Generator, GeneratorConfig, GeneratorError, ShapeCache};

const MODEL: &str = r#"
use serde::{Deserialize, Serialize};

/// Primary key of a user.
#[bridge(branded)]
#[derive(Serialize, Deserialize)]
pub struct UserId(u32);

/// A registered user.
#[derive(Serialize, Deserialize, Bridge)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[validate(length(min = 1, max = 20))]
    pub display_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(range(min = 1, max = 100))]
    pub age: Option<u32>,
}
"#;

const ACTIVITY: &str = r#"
#[bridge]
pub struct ActivityLog {
    pub id: u64,
    pub timestamp: u64,
    pub actor: crate::model::UserId,
}
"#;

fn write_project(root: &Path) {
    std::fs::create_dir_all(root.join("src")).unwrap();
    std::fs::write(root.join("src").join("model.rs"), MODEL).unwrap();
    std::fs::write(root.join("src").join("activity.rs"), ACTIVITY).unwrap();
}

fn config(root: &Path) -> GeneratorConfig {
    GeneratorConfig {
        input: root.join("src"),
        output: root.join("bindings"),
        ..Default::default()
    }
}

#[test]
fn generate_writes_bundle_from_rust_sources() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    write_project(root);

    let result = Generator::new(config(root)).generate().unwrap();
    assert_eq!(result.types, 3);
    assert_eq!(result.files, 5);

    let out = root.join("bindings");
    for file in ["runtime.ts", "index.ts", "UserId.ts", "User.ts", "ActivityLog.ts"] {
        assert!(out.join(file).exists(), "{file} missing");
    }

    let user = std::fs::read_to_string(out.join("User.ts")).unwrap();
    assert!(user.contains("  displayName: string;"));
    assert!(user.contains("  age?: number | null;"));

    // activity.rs sorts first, but its reference to UserId still orders it later.
    let index = std::fs::read_to_string(out.join("index.ts")).unwrap();
    assert!(index.find("'./UserId'").unwrap() < index.find("'./ActivityLog'").unwrap());
}

#[test]
fn nothing_is_written_when_a_type_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    write_project(root);
    std::fs::write(
        root.join("src").join("broken.rs"),
        "#[bridge]\npub struct Level {\n    #[validate(range(max = 300))]\n    pub value: u8,\n}\n",
    )
    .unwrap();

    let err = Generator::new(config(root)).generate().unwrap_err();
    assert!(matches!(err, GeneratorError::UnrepresentableConstraint { .. }));
    assert!(!root.join("bindings").exists());
}

#[test]
fn unsupported_items_are_all_reported() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("src")).unwrap();
    std::fs::write(
        root.join("src").join("lib.rs"),
        "#[bridge]\npub struct Grid<const N: usize> { cells: [u8; N] }\n\n#[bridge]\npub struct Pair(u8, u8);\n",
    )
    .unwrap();

    let err = Generator::new(config(root)).check().unwrap_err();
    let errors = err.iter();
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .all(|e| matches!(e, GeneratorError::UnsupportedSource { .. })));
    assert!(err.to_string().contains("2 errors"));
}

#[test]
fn generic_tuple_and_char_fields_are_bridged() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("src")).unwrap();
    std::fs::write(
        root.join("src").join("feed.rs"),
        r#"
#[bridge]
pub struct Page<T> { pub items: Vec<T>, pub next: Option<String> }

#[bridge]
pub struct Post { pub initial: char, pub score: (u8, bool) }

#[bridge]
pub struct Feed { pub posts: Page<Post> }
"#,
    )
    .unwrap();

    let generator = Generator::new(config(root));
    assert_eq!(generator.order().unwrap(), vec!["Page", "Post", "Feed"]);
    generator.generate().unwrap();

    let out = root.join("bindings");
    let page = std::fs::read_to_string(out.join("Page.ts")).unwrap();
    assert!(page.contains("export interface Page<T> {"));
    assert!(page.contains("export const validatePage = <T>(validateT: Validator<T>): Validator<Page<T>> =>"));

    let post = std::fs::read_to_string(out.join("Post.ts")).unwrap();
    assert!(post.contains("  initial: string;\n  score: [number, boolean];"));
    assert!(post.contains("  initial: v.string({ char: true }),"));

    let feed = std::fs::read_to_string(out.join("Feed.ts")).unwrap();
    assert!(feed.contains("import { type Page, validatePage } from './Page';"));
    assert!(feed.contains("  posts: Page<Post>;"));
    assert!(feed.contains("  posts: validatePage(validatePost),"));

    let table = generator.shape_table().unwrap();
    let feed = serde_json::json!({ "posts": { "items": [{ "initial": "é", "score": [3, true] }], "next": null } });
    assert!(table.validate("Feed", &feed).is_empty());
    let wide = serde_json::json!({ "posts": { "items": [{ "initial": "ab", "score": [3, true] }], "next": null } });
    let issues = table.validate("Feed", &wide);
    assert_eq!(issues[0].path, "$.posts.items[0].initial");
    assert_eq!(issues[0].message, "expected a single character");
}

#[test]
fn check_and_order_do_not_write() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    write_project(root);

    let generator = Generator::new(config(root));
    assert_eq!(generator.check().unwrap().types, 3);
    assert_eq!(generator.order().unwrap(), vec!["UserId", "ActivityLog", "User"]);
    assert!(!root.join("bindings").exists());
}

#[test]
fn cache_reuses_unchanged_types() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    write_project(root);

    let config = GeneratorConfig {
        cache: true,
        ..config(root)
    };

    let first = Generator::new(config.clone()).generate().unwrap();
    assert_eq!(first.cached, 0);
    let before = std::fs::read_to_string(root.join("bindings").join("User.ts")).unwrap();

    let second = Generator::new(config.clone()).generate().unwrap();
    assert_eq!(second.cached, 3);
    let after = std::fs::read_to_string(root.join("bindings").join("User.ts")).unwrap();
    assert_eq!(before, after);

    // Widening UserId invalidates it and both types that reference it.
    let widened = MODEL.replace("pub struct UserId(u32);", "pub struct UserId(u64);");
    std::fs::write(root.join("src").join("model.rs"), widened).unwrap();
    let third = Generator::new(config.clone()).generate().unwrap();
    assert_eq!(third.cached, 0);

    let cache = ShapeCache::load(&config.cache_path()).unwrap();
    assert_eq!(cache.entries.len(), 3);
}

#[test]
fn json_source_and_config_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    std::fs::write(
        root.join("types.json"),
        r#"[
            { "name": "Tag", "kind": "newtype", "underlying": { "primitive": "string" },
              "constraints": [{ "constraint": "pattern", "regex": "^[a-z-]+$" }] },
            { "name": "Post", "kind": "struct", "fields": [
                { "name": "tags", "type": { "sequence": { "named": "Tag" } } }
            ] }
        ]"#,
    )
    .unwrap();
    std::fs::write(
        root.join(CONFIG_FILE),
        "input = \"types.json\"\noutput = \"out\"\nsource = \"json\"\nvalidators = \"zod\"\n",
    )
    .unwrap();

    let config = GeneratorConfig::load(&root.join(CONFIG_FILE)).unwrap();
    assert_eq!(config.source, SourceKind::Json);

    let result = Generator::new(config).generate().unwrap();
    assert_eq!(result.types, 2);

    let tag = std::fs::read_to_string(root.join("out").join("Tag.ts")).unwrap();
    assert!(tag.contains("export type Tag = string;"));
    assert!(tag.contains("TagSchema"));
    assert!(tag.contains(r#"new RegExp("^[a-z-]+$")"#));
}
