use projtree_core::db::open_db_in_memory;
use projtree_core::{
    GeoPoint, Project, ProjectStore, ProjectUpdate, ProjectValidationError, SqliteProjectStore,
    StoreError, UNKNOWN_LOCATION,
};

fn setup() -> rusqlite::Connection {
    open_db_in_memory().unwrap()
}

#[test]
fn create_and_find_by_id_roundtrip() {
    let conn = setup();
    let store = SqliteProjectStore::try_new(&conn).unwrap();

    let project = Project::new("harbor")
        .description("harbor expansion")
        .location("Shanghai")
        .coordinate(GeoPoint::new(31.2304, 121.4737).unwrap());
    let id = store.create(&project).unwrap();
    assert_eq!(id, "harbor");

    let loaded = store.find_by_id("harbor", false).unwrap().unwrap();
    assert_eq!(loaded.project_id, "harbor");
    assert_eq!(loaded.parent_proj_id, "");
    assert_eq!(loaded.description, "harbor expansion");
    assert_eq!(loaded.location, "Shanghai");
    assert_eq!(loaded.coordinate, project.coordinate);
    assert!(!loaded.deleted);
    assert!(loaded.create_time > 0);
    assert_eq!(loaded.create_time, loaded.last_update);
}

#[test]
fn default_location_is_unknown() {
    let conn = setup();
    let store = SqliteProjectStore::try_new(&conn).unwrap();

    store.create(&Project::new("bare")).unwrap();
    let loaded = store.find_by_id("bare", false).unwrap().unwrap();
    assert_eq!(loaded.location, UNKNOWN_LOCATION);
    assert_eq!(loaded.coordinate, None);
}

#[test]
fn blank_location_is_stored_as_unknown() {
    let conn = setup();
    let store = SqliteProjectStore::try_new(&conn).unwrap();

    store.create(&Project::new("blank").location("")).unwrap();
    let loaded = store.find_by_id("blank", false).unwrap().unwrap();
    assert_eq!(loaded.location, UNKNOWN_LOCATION);

    let mut update = loaded.to_update();
    update.location = "   ".to_string();
    store.update_fields("blank", &update).unwrap();
    let loaded = store.find_by_id("blank", false).unwrap().unwrap();
    assert_eq!(loaded.location, UNKNOWN_LOCATION);
}

#[test]
fn padded_id_is_rejected() {
    let conn = setup();
    let store = SqliteProjectStore::try_new(&conn).unwrap();

    let err = store.create(&Project::new(" x ")).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ProjectValidationError::PaddedProjectId(ref id)) if id == " x "
    ));
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn create_with_missing_parent_fails() {
    let conn = setup();
    let store = SqliteProjectStore::try_new(&conn).unwrap();

    let err = store
        .create(&Project::with_parent("orphan", "ghost"))
        .unwrap_err();
    assert!(matches!(err, StoreError::ParentNotFound(id) if id == "ghost"));
    assert!(!store.exists("orphan").unwrap());
}

#[test]
fn create_under_soft_deleted_parent_is_allowed() {
    let conn = setup();
    let store = SqliteProjectStore::try_new(&conn).unwrap();

    store.create(&Project::new("parent")).unwrap();
    store.set_deleted_flag("parent", true).unwrap();
    store
        .create(&Project::with_parent("child", "parent"))
        .unwrap();
    assert!(store.exists("child").unwrap());
}

#[test]
fn duplicate_id_is_rejected_even_when_soft_deleted() {
    let conn = setup();
    let store = SqliteProjectStore::try_new(&conn).unwrap();

    store.create(&Project::new("dup")).unwrap();
    store.set_deleted_flag("dup", true).unwrap();

    let err = store.create(&Project::new("dup")).unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(id) if id == "dup"));
}

#[test]
fn create_rejects_invalid_records() {
    let conn = setup();
    let store = SqliteProjectStore::try_new(&conn).unwrap();

    let err = store.create(&Project::new("")).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ProjectValidationError::EmptyProjectId)
    ));
}

#[test]
fn find_by_id_respects_include_deleted() {
    let conn = setup();
    let store = SqliteProjectStore::try_new(&conn).unwrap();

    store.create(&Project::new("gone")).unwrap();
    store.set_deleted_flag("gone", true).unwrap();

    assert!(store.find_by_id("gone", false).unwrap().is_none());
    let loaded = store.find_by_id("gone", true).unwrap().unwrap();
    assert!(loaded.deleted);
}

#[test]
fn find_by_name_matches_trimmed_identifier() {
    let conn = setup();
    let store = SqliteProjectStore::try_new(&conn).unwrap();

    store.create(&Project::new("bridge")).unwrap();
    let loaded = store.find_by_name("  bridge ", false).unwrap().unwrap();
    assert_eq!(loaded.project_id, "bridge");
    assert!(store.find_by_name("tunnel", true).unwrap().is_none());
    assert!(store.find_by_name("   ", true).unwrap().is_none());
}

#[test]
fn update_fields_overwrites_mutable_subset_only() {
    let conn = setup();
    let store = SqliteProjectStore::try_new(&conn).unwrap();

    store.create(&Project::new("root")).unwrap();
    store
        .create(&Project::with_parent("leaf", "root").coordinate(GeoPoint::new(1.0, 1.0).unwrap()))
        .unwrap();
    let before = store.find_by_id("leaf", true).unwrap().unwrap();

    store
        .update_fields(
            "leaf",
            &ProjectUpdate {
                description: "resurveyed".to_string(),
                location: "Nairobi".to_string(),
                coordinate: None,
            },
        )
        .unwrap();

    let after = store.find_by_id("leaf", true).unwrap().unwrap();
    assert_eq!(after.description, "resurveyed");
    assert_eq!(after.location, "Nairobi");
    assert_eq!(after.coordinate, None);
    assert_eq!(after.parent_proj_id, "root");
    assert_eq!(after.create_time, before.create_time);
    assert!(after.last_update >= before.last_update);
}

#[test]
fn update_and_flag_on_missing_project_return_not_found() {
    let conn = setup();
    let store = SqliteProjectStore::try_new(&conn).unwrap();

    let update = Project::new("nobody").to_update();
    assert!(matches!(
        store.update_fields("nobody", &update).unwrap_err(),
        StoreError::NotFound(id) if id == "nobody"
    ));
    assert!(matches!(
        store.set_deleted_flag("nobody", true).unwrap_err(),
        StoreError::NotFound(_)
    ));
}

#[test]
fn scan_all_includes_deleted_rows_in_insertion_order() {
    let conn = setup();
    let store = SqliteProjectStore::try_new(&conn).unwrap();

    for id in ["c", "a", "b"] {
        store.create(&Project::new(id)).unwrap();
    }
    store.set_deleted_flag("a", true).unwrap();

    let ids: Vec<String> = store
        .scan_all()
        .unwrap()
        .into_iter()
        .map(|p| p.project_id)
        .collect();
    assert_eq!(ids, ["c", "a", "b"]);
    assert_eq!(store.count().unwrap(), 3);
}

#[test]
fn list_children_returns_direct_children_only() {
    let conn = setup();
    let store = SqliteProjectStore::try_new(&conn).unwrap();

    store.create(&Project::new("root")).unwrap();
    store.create(&Project::with_parent("a", "root")).unwrap();
    store.create(&Project::with_parent("b", "root")).unwrap();
    store.create(&Project::with_parent("a1", "a")).unwrap();
    store.set_deleted_flag("b", true).unwrap();

    let active: Vec<String> = store
        .list_children("root", false)
        .unwrap()
        .into_iter()
        .map(|p| p.project_id)
        .collect();
    assert_eq!(active, ["a"]);
    assert_eq!(store.list_children("root", true).unwrap().len(), 2);

    let roots = store.list_children("", false).unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].project_id, "root");
}

#[test]
fn malformed_stored_coordinate_is_surfaced() {
    let conn = setup();
    let store = SqliteProjectStore::try_new(&conn).unwrap();

    store.create(&Project::new("bad")).unwrap();
    conn.execute(
        "UPDATE projects SET coordinate = 'POINT(east north)' WHERE project_id = 'bad';",
        [],
    )
    .unwrap();

    let err = store.find_by_id("bad", true).unwrap_err();
    assert!(matches!(err, StoreError::MalformedCoordinate { project_id, .. } if project_id == "bad"));
    assert!(store.scan_all().is_err());
}

#[test]
fn coordinate_is_stored_as_wkt_text() {
    let conn = setup();
    let store = SqliteProjectStore::try_new(&conn).unwrap();

    store
        .create(&Project::new("wkt").coordinate(GeoPoint::new(10.5, -20.25).unwrap()))
        .unwrap();
    let raw: String = conn
        .query_row(
            "SELECT coordinate FROM projects WHERE project_id = 'wkt';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(raw, "POINT(-20.250000 10.500000)");
}
