use folio::models::{
    Category, CategoryInput, CommentInput, NewUser, PostFilter, PostInput, PostStatus, Tag,
    TagInput,
};
use folio::services::lookup::{self, LookupError, LookupFailure};
use folio::services::validation::FieldErrors;
use folio::services::{auth, comments, posts, taxonomy};
use folio::config::DatabaseConfig;
use folio::Database;

fn create_test_db() -> Database {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let id: u32 = rng.gen();
    let name = format!("test_db_{}", id);

    let db = Database::open_memory(&name).expect("Failed to create test database");
    db.migrate().expect("Failed to run migrations");
    db
}

const TEST_PASSWORD: &str = "Password123";

fn create_author(db: &Database) -> i64 {
    auth::create_user(
        db,
        &NewUser {
            email: "author@example.com".to_string(),
            password: TEST_PASSWORD.to_string(),
            ..Default::default()
        },
    )
    .expect("Failed to create user")
    .id
}

fn field_errors(err: anyhow::Error) -> FieldErrors {
    err.downcast::<FieldErrors>()
        .expect("expected field errors")
}

fn post_input(title: &str) -> PostInput {
    PostInput {
        title: Some(title.to_string()),
        content: Some(format!("Body of {}", title)),
        ..Default::default()
    }
}

mod database_tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let db = create_test_db();
        assert_eq!(db.migration_version().unwrap(), 1);
        db.migrate().unwrap();
        assert_eq!(db.migration_version().unwrap(), 1);
    }

    #[test]
    fn test_file_database_uses_configured_pool_size() {
        use rand::Rng;
        let id: u32 = rand::thread_rng().gen();
        let dir = std::env::temp_dir().join(format!("folio_pool_{}", id));
        let config = DatabaseConfig {
            path: dir.join("folio.db").to_string_lossy().into_owned(),
            pool_size: 3,
        };

        let db = Database::from_config(&config).unwrap();
        assert_eq!(db.max_connections(), 3);
        db.migrate().unwrap();
        assert_eq!(db.migration_version().unwrap(), 1);

        drop(db);
        let _ = std::fs::remove_dir_all(&dir);
    }
}

mod auth_integration_tests {
    use super::*;

    #[test]
    fn test_create_and_authenticate_user() {
        let db = create_test_db();
        let user = auth::create_user(
            &db,
            &NewUser {
                email: "  Test@Example.com ".to_string(),
                password: TEST_PASSWORD.to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                ..Default::default()
            },
        )
        .expect("Failed to create user");

        assert_eq!(user.email, "test@example.com");
        assert!(user.is_active);
        assert!(!user.is_staff);

        let found = auth::authenticate(&db, "test@example.com", TEST_PASSWORD).unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.first_name, "Ada");
    }

    #[test]
    fn test_authenticate_failures() {
        let db = create_test_db();
        create_author(&db);

        let err = auth::authenticate(&db, "nobody@example.com", TEST_PASSWORD).unwrap_err();
        assert_eq!(
            field_errors(err).get("email").unwrap(),
            ["User with email 'nobody@example.com' does not exist."]
        );

        let err = auth::authenticate(&db, "author@example.com", "WrongPass456").unwrap_err();
        assert_eq!(
            field_errors(err).get("password").unwrap(),
            ["Incorrect password."]
        );
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let db = create_test_db();
        create_author(&db);

        let err = auth::create_user(
            &db,
            &NewUser {
                email: "AUTHOR@example.com".to_string(),
                password: TEST_PASSWORD.to_string(),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(
            field_errors(err).get("email").unwrap(),
            ["User with email 'author@example.com' already exists."]
        );
    }

    #[test]
    fn test_short_password_rejected() {
        let db = create_test_db();
        let err = auth::create_user(
            &db,
            &NewUser {
                email: "short@example.com".to_string(),
                password: "abc".to_string(),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(
            field_errors(err).get("password").unwrap(),
            ["Password must be at least 8 characters long."]
        );
        assert!(!auth::has_users(&db).unwrap());
    }

    #[test]
    fn test_taken_email_and_weak_password_reported_together() {
        let db = create_test_db();
        create_author(&db);

        let err = auth::create_user(
            &db,
            &NewUser {
                email: "author@example.com".to_string(),
                password: "12345678".to_string(),
                ..Default::default()
            },
        )
        .unwrap_err();
        let errors = field_errors(err);
        assert_eq!(
            errors.get("email").unwrap(),
            ["User with email 'author@example.com' already exists."]
        );
        assert_eq!(
            errors.get("password").unwrap(),
            ["This password is entirely numeric."]
        );
    }

    #[test]
    fn test_deactivate_and_remove() {
        let db = create_test_db();
        let id = create_author(&db);

        assert!(auth::set_active(&db, "author@example.com", false).unwrap());
        assert!(auth::authenticate(&db, "author@example.com", TEST_PASSWORD).is_err());
        assert!(!auth::get_user(&db, id).unwrap().unwrap().is_active);

        assert!(auth::soft_delete_user(&db, "author@example.com").unwrap());
        assert!(auth::get_user(&db, id).unwrap().is_none());
        assert!(auth::list_users(&db).unwrap().is_empty());
        assert!(!auth::soft_delete_user(&db, "author@example.com").unwrap());
    }

    #[test]
    fn test_update_password() {
        let db = create_test_db();
        create_author(&db);

        assert!(auth::update_password(&db, "author@example.com", "NewPass456").unwrap());
        assert!(auth::authenticate(&db, "author@example.com", TEST_PASSWORD).is_err());
        assert!(auth::authenticate(&db, "author@example.com", "NewPass456").is_ok());
        assert!(!auth::update_password(&db, "ghost@example.com", "NewPass456").unwrap());
    }
}

mod taxonomy_integration_tests {
    use super::*;

    #[test]
    fn test_create_derives_slug() {
        let db = create_test_db();
        let category = taxonomy::create(&db, &CategoryInput::new("Rust Tips", None)).unwrap();
        assert_eq!(category.name, "Rust Tips");
        assert_eq!(category.slug, "rust-tips");
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let db = create_test_db();
        taxonomy::create(&db, &TagInput::new("rust", None)).unwrap();

        let err = taxonomy::create(&db, &TagInput::new("rust", Some("rust-2"))).unwrap_err();
        assert_eq!(
            field_errors(err).get("name").unwrap(),
            ["tag with this name already exists."]
        );
    }

    #[test]
    fn test_uniqueness_covers_soft_deleted_rows() {
        let db = create_test_db();
        let tag = taxonomy::create(&db, &TagInput::new("rust", None)).unwrap();
        taxonomy::soft_delete::<Tag>(&db, tag.id).unwrap();

        let err = taxonomy::create(&db, &TagInput::new("rust", None)).unwrap_err();
        let errors = field_errors(err);
        assert!(errors.get("name").is_some());
        assert!(errors.get("slug").is_some());
    }

    #[test]
    fn test_symbol_only_name_needs_explicit_slug() {
        let db = create_test_db();
        let err = taxonomy::create(&db, &TagInput::new("!!!", None)).unwrap_err();
        assert!(field_errors(err).get("slug").is_some());

        let tag = taxonomy::create(&db, &TagInput::new("!!!", Some("bang"))).unwrap();
        assert_eq!(tag.slug, "bang");
    }

    #[test]
    fn test_update_keeps_slug_unless_sent() {
        let db = create_test_db();
        let category = taxonomy::create(&db, &CategoryInput::new("News", None)).unwrap();

        let updated = taxonomy::update(&db, &category, &CategoryInput::new("World News", None)).unwrap();
        assert_eq!(updated.name, "World News");
        assert_eq!(updated.slug, "news");

        let updated =
            taxonomy::update(&db, &updated, &CategoryInput::new("World News", Some("world"))).unwrap();
        assert_eq!(updated.slug, "world");
    }

    #[test]
    fn test_list_count_and_search() {
        let db = create_test_db();
        for name in ["alpha", "beta", "alphabet"] {
            taxonomy::create(&db, &TagInput::new(name, None)).unwrap();
        }
        let beta = lookup::find_one::<Tag>(&db, "2").unwrap();
        taxonomy::soft_delete::<Tag>(&db, beta.id).unwrap();

        assert_eq!(taxonomy::count::<Tag>(&db, None).unwrap(), 2);
        assert_eq!(taxonomy::count::<Tag>(&db, Some("alpha")).unwrap(), 2);
        assert_eq!(taxonomy::count::<Tag>(&db, Some("bet")).unwrap(), 1);

        let page = taxonomy::list::<Tag>(&db, None, 1, 1).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "alphabet");
    }

    #[test]
    fn test_search_wildcards_match_literally() {
        let db = create_test_db();
        for name in ["100% rust", "snake_case", "plain", "back\\slash"] {
            taxonomy::create(&db, &TagInput::new(name, None)).unwrap();
        }

        assert_eq!(taxonomy::count::<Tag>(&db, Some("%")).unwrap(), 1);
        assert_eq!(taxonomy::count::<Tag>(&db, Some("_")).unwrap(), 1);
        assert_eq!(taxonomy::count::<Tag>(&db, Some("\\")).unwrap(), 1);
        let found = taxonomy::list::<Tag>(&db, Some("e_c"), 10, 0).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "snake_case");
    }

    #[test]
    fn test_lookup_failures() {
        let db = create_test_db();
        taxonomy::create(&db, &CategoryInput::new("News", None)).unwrap();

        let failure = |key: &str| {
            lookup::find_one::<Category>(&db, key)
                .unwrap_err()
                .downcast::<LookupError>()
                .unwrap()
                .failure
        };
        assert_eq!(failure("abc"), LookupFailure::Malformed);
        assert_eq!(failure("42"), LookupFailure::NotFound);
        assert_eq!(failure("99999999999999999999"), LookupFailure::NotFound);
        assert!(lookup::find_one::<Category>(&db, "1").is_ok());
    }
}

mod post_integration_tests {
    use super::*;

    #[test]
    fn test_create_post_with_relations() {
        let db = create_test_db();
        let author = create_author(&db);
        let category = taxonomy::create(&db, &CategoryInput::new("News", None)).unwrap();
        let rust = taxonomy::create(&db, &TagInput::new("rust", None)).unwrap();
        let web = taxonomy::create(&db, &TagInput::new("web", None)).unwrap();

        let input = PostInput {
            category_id: Some(Some(category.id)),
            tag_ids: Some(vec![rust.id, web.id, rust.id]),
            status: Some("published".to_string()),
            ..post_input("Hello World")
        };
        let post = posts::create(&db, author, &input).unwrap();
        assert_eq!(post.slug, "hello-world");
        assert_eq!(post.status, PostStatus::Published);

        let detail = posts::detail(&db, post).unwrap();
        assert_eq!(detail.author, "author@example.com");
        assert_eq!(detail.category, Some(category));
        assert_eq!(detail.tags, vec![rust, web]);
    }

    #[test]
    fn test_unknown_relations_rejected() {
        let db = create_test_db();
        let author = create_author(&db);

        let input = PostInput {
            category_id: Some(Some(9)),
            tag_ids: Some(vec![7]),
            ..post_input("Orphan")
        };
        let errors = field_errors(posts::create(&db, author, &input).unwrap_err());
        assert_eq!(
            errors.get("category_id").unwrap(),
            ["Invalid pk \"9\" - object does not exist."]
        );
        assert_eq!(
            errors.get("tag_ids").unwrap(),
            ["Invalid pk \"7\" - object does not exist."]
        );
    }

    #[test]
    fn test_duplicate_slug_rejected() {
        let db = create_test_db();
        let author = create_author(&db);
        posts::create(&db, author, &post_input("Same")).unwrap();

        let err = posts::create(&db, author, &post_input("Same")).unwrap_err();
        assert_eq!(
            field_errors(err).get("slug").unwrap(),
            ["post with this slug already exists."]
        );
    }

    #[test]
    fn test_update_replaces_tags_and_clears_category() {
        let db = create_test_db();
        let author = create_author(&db);
        let category = taxonomy::create(&db, &CategoryInput::new("News", None)).unwrap();
        let rust = taxonomy::create(&db, &TagInput::new("rust", None)).unwrap();
        let web = taxonomy::create(&db, &TagInput::new("web", None)).unwrap();

        let post = posts::create(
            &db,
            author,
            &PostInput {
                category_id: Some(Some(category.id)),
                tag_ids: Some(vec![rust.id]),
                ..post_input("Draft One")
            },
        )
        .unwrap();

        let patch = PostInput {
            category_id: Some(None),
            tag_ids: Some(vec![web.id]),
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        let updated = posts::update(&db, &post, &patch).unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.slug, "draft-one");
        assert_eq!(updated.content, post.content);
        assert_eq!(updated.category_id, None);

        let detail = posts::detail(&db, updated).unwrap();
        assert_eq!(detail.tags, vec![web]);
    }

    #[test]
    fn test_soft_deleted_relations_are_hidden() {
        let db = create_test_db();
        let author = create_author(&db);
        let category = taxonomy::create(&db, &CategoryInput::new("News", None)).unwrap();
        let rust = taxonomy::create(&db, &TagInput::new("rust", None)).unwrap();
        let post = posts::create(
            &db,
            author,
            &PostInput {
                category_id: Some(Some(category.id)),
                tag_ids: Some(vec![rust.id]),
                ..post_input("Linked")
            },
        )
        .unwrap();

        taxonomy::soft_delete::<Category>(&db, category.id).unwrap();
        taxonomy::soft_delete::<Tag>(&db, rust.id).unwrap();

        let detail = posts::detail(&db, post).unwrap();
        assert!(detail.category.is_none());
        assert!(detail.tags.is_empty());
    }

    #[test]
    fn test_list_filters() {
        let db = create_test_db();
        let author = create_author(&db);
        let category = taxonomy::create(&db, &CategoryInput::new("News", None)).unwrap();
        let rust = taxonomy::create(&db, &TagInput::new("rust", None)).unwrap();

        posts::create(
            &db,
            author,
            &PostInput {
                status: Some("published".to_string()),
                category_id: Some(Some(category.id)),
                ..post_input("Published News")
            },
        )
        .unwrap();
        posts::create(
            &db,
            author,
            &PostInput {
                tag_ids: Some(vec![rust.id]),
                ..post_input("Rusty Draft")
            },
        )
        .unwrap();
        let gone = posts::create(&db, author, &post_input("Deleted")).unwrap();
        posts::soft_delete(&db, gone.id).unwrap();

        let all = PostFilter::default();
        assert_eq!(posts::count(&db, &all).unwrap(), 2);
        let listed = posts::list(&db, &all, 10, 0).unwrap();
        assert_eq!(listed[0].slug, "rusty-draft");

        let by = |filter: PostFilter| posts::count(&db, &filter).unwrap();
        assert_eq!(
            by(PostFilter {
                status: Some("draft".to_string()),
                ..Default::default()
            }),
            1
        );
        assert_eq!(
            by(PostFilter {
                category: Some("news".to_string()),
                ..Default::default()
            }),
            1
        );
        assert_eq!(
            by(PostFilter {
                tag: Some("rust".to_string()),
                ..Default::default()
            }),
            1
        );
        assert_eq!(
            by(PostFilter {
                search: Some("body of published".to_string()),
                ..Default::default()
            }),
            1
        );
        assert!(posts::get_by_slug(&db, "deleted").unwrap().is_none());

        let search = |term: &str| {
            by(PostFilter {
                search: Some(term.to_string()),
                ..Default::default()
            })
        };
        assert_eq!(search("%"), 0);
        assert_eq!(search("_"), 0);
    }

    #[test]
    fn test_comments_follow_post() {
        let db = create_test_db();
        let author = create_author(&db);
        let post = posts::create(&db, author, &post_input("Chatty")).unwrap();

        let first = comments::create(
            &db,
            &post,
            author,
            &CommentInput {
                body: Some(" First! ".to_string()),
            },
        )
        .unwrap();
        assert_eq!(first.body, "First!");
        assert_eq!(first.author, "author@example.com");
        assert_eq!(first.post, "chatty");

        comments::create(
            &db,
            &post,
            author,
            &CommentInput {
                body: Some("Second".to_string()),
            },
        )
        .unwrap();

        let listed = comments::list_for_post(&db, &post).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);

        posts::soft_delete(&db, post.id).unwrap();
        assert!(lookup::find_one::<folio::models::Post>(&db, "chatty").is_err());
    }
}
