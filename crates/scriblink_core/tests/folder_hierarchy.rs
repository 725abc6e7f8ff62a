use rusqlite::{params, Connection};
use scriblink_core::db::open_db_in_memory;
use scriblink_core::{
    ErrorKind, Folder, FolderService, FolderServiceError, SqliteFolderRepository,
    ROOT_FOLDER_TITLE,
};
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn service(conn: &Connection) -> FolderService<SqliteFolderRepository<'_>> {
    FolderService::new(SqliteFolderRepository::try_new(conn).unwrap())
}

/// root -> a -> b -> c, plus root -> d.
struct Tree {
    user: Uuid,
    root: Folder,
    a: Folder,
    b: Folder,
    c: Folder,
    d: Folder,
}

fn build_tree(service: &FolderService<SqliteFolderRepository<'_>>) -> Tree {
    let user = Uuid::new_v4();
    let root = service.initialize_root(user).unwrap();
    let a = service.create_child(user, "A", root.id).unwrap();
    let b = service.create_child(user, "B", a.id).unwrap();
    let c = service.create_child(user, "C", b.id).unwrap();
    let d = service.create_child(user, "D", root.id).unwrap();
    Tree {
        user,
        root,
        a,
        b,
        c,
        d,
    }
}

fn folder_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM folders;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn initialize_root_creates_empty_root_once() {
    let conn = setup();
    let service = service(&conn);
    let user = Uuid::new_v4();

    let root = service.initialize_root(user).unwrap();
    assert_eq!(root.title, ROOT_FOLDER_TITLE);
    assert_eq!(root.owner, user);
    assert!(root.is_empty());

    let err = service.initialize_root(user).unwrap_err();
    assert!(matches!(err, FolderServiceError::AlreadyExists(id) if id == user));
    assert_eq!(err.kind(), ErrorKind::StructuralViolation);

    assert_eq!(service.root_folder(user).unwrap().unwrap().id, root.id);
    assert!(service.root_folder(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn create_child_round_trips_through_lookup() {
    let conn = setup();
    let service = service(&conn);
    let user = Uuid::new_v4();
    let root = service.initialize_root(user).unwrap();

    let child = service.create_child(user, "X", root.id).unwrap();
    let loaded = service.get_folder(child.id).unwrap();
    assert_eq!(loaded.title, "X");
    assert_eq!(loaded.owner, user);
    assert!(loaded.subfolders.is_empty());
    assert!(loaded.items.is_empty());

    let root = service.get_folder(root.id).unwrap();
    assert_eq!(root.subfolders, vec![child.id]);
    assert_eq!(service.find_parent(child.id).unwrap(), Some(root.id));
    assert_eq!(service.find_parent(root.id).unwrap(), None);
}

#[test]
fn create_child_keeps_insertion_order() {
    let conn = setup();
    let service = service(&conn);
    let user = Uuid::new_v4();
    let root = service.initialize_root(user).unwrap();

    let first = service.create_child(user, "First", root.id).unwrap();
    let second = service.create_child(user, "Second", root.id).unwrap();
    let third = service.create_child(user, "Third", root.id).unwrap();

    let titles: Vec<String> = service
        .children(root.id)
        .unwrap()
        .into_iter()
        .map(|folder| folder.title)
        .collect();
    assert_eq!(titles, vec!["First", "Second", "Third"]);
    assert_eq!(
        service.get_folder(root.id).unwrap().subfolders,
        vec![first.id, second.id, third.id]
    );
}

#[test]
fn create_child_requires_existing_owned_parent() {
    let conn = setup();
    let service = service(&conn);
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let root = service.initialize_root(owner).unwrap();

    let missing = Uuid::new_v4();
    let err = service.create_child(owner, "X", missing).unwrap_err();
    assert!(matches!(err, FolderServiceError::ParentNotFound(id) if id == missing));

    let err = service.create_child(stranger, "X", root.id).unwrap_err();
    assert!(matches!(
        err,
        FolderServiceError::NotOwner { user, folder } if user == stranger && folder == root.id
    ));
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    let err = service.create_child(owner, "   ", root.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn create_child_resolves_parent_before_title() {
    let conn = setup();
    let service = service(&conn);
    let owner = Uuid::new_v4();
    let root = service.initialize_root(owner).unwrap();

    let missing = Uuid::new_v4();
    let err = service.create_child(owner, "  ", missing).unwrap_err();
    assert!(matches!(err, FolderServiceError::ParentNotFound(id) if id == missing));

    let err = service.create_child(Uuid::new_v4(), "", root.id).unwrap_err();
    assert!(matches!(err, FolderServiceError::NotOwner { .. }));
}

#[test]
fn deleting_root_allows_fresh_root() {
    let conn = setup();
    let service = service(&conn);
    let tree = build_tree(&service);

    let deletion = service.delete_folder(tree.root.id).unwrap();
    assert_eq!(deletion.removed_folders.len(), 5);
    assert!(service.list_folders(tree.user).unwrap().is_empty());

    let fresh = service.initialize_root(tree.user).unwrap();
    assert_ne!(fresh.id, tree.root.id);
    assert_eq!(service.root_folder(tree.user).unwrap().unwrap().id, fresh.id);
}

#[test]
fn root_initialization_fails_once_user_owns_any_folder() {
    let conn = setup();
    let service = service(&conn);
    let tree = build_tree(&service);

    service.delete_folder(tree.a.id).unwrap();
    let err = service.initialize_root(tree.user).unwrap_err();
    assert!(matches!(err, FolderServiceError::AlreadyExists(_)));
}

#[test]
fn move_reparents_and_detaches_from_old_parent() {
    let conn = setup();
    let service = service(&conn);
    let tree = build_tree(&service);

    let moved = service.move_folder(tree.c.id, tree.d.id).unwrap();
    assert_eq!(moved.id, tree.c.id);

    assert!(service.get_folder(tree.b.id).unwrap().subfolders.is_empty());
    assert_eq!(service.get_folder(tree.d.id).unwrap().subfolders, vec![tree.c.id]);
    assert_eq!(service.find_parent(tree.c.id).unwrap(), Some(tree.d.id));
}

#[test]
fn move_under_current_parent_moves_folder_last() {
    let conn = setup();
    let service = service(&conn);
    let tree = build_tree(&service);
    assert_eq!(
        service.get_folder(tree.root.id).unwrap().subfolders,
        vec![tree.a.id, tree.d.id]
    );

    service.move_folder(tree.a.id, tree.root.id).unwrap();
    service.move_folder(tree.a.id, tree.root.id).unwrap();

    let root = service.get_folder(tree.root.id).unwrap();
    assert_eq!(root.subfolders, vec![tree.d.id, tree.a.id]);
    assert_eq!(service.find_parent(tree.a.id).unwrap(), Some(tree.root.id));
    assert_eq!(service.get_folder(tree.a.id).unwrap().subfolders, vec![tree.b.id]);
}

#[test]
fn move_into_itself_fails() {
    let conn = setup();
    let service = service(&conn);
    let tree = build_tree(&service);

    let err = service.move_folder(tree.a.id, tree.a.id).unwrap_err();
    assert!(matches!(err, FolderServiceError::SelfMove(id) if id == tree.a.id));
    assert_eq!(err.kind(), ErrorKind::StructuralViolation);
}

#[test]
fn move_into_any_descendant_fails_and_leaves_graph_unchanged() {
    let conn = setup();
    let service = service(&conn);
    let tree = build_tree(&service);

    let before: Vec<Folder> = service.list_folders(tree.user).unwrap();
    for descendant in [tree.b.id, tree.c.id] {
        let err = service.move_folder(tree.a.id, descendant).unwrap_err();
        assert!(matches!(
            err,
            FolderServiceError::CyclicMove { folder, new_parent }
                if folder == tree.a.id && new_parent == descendant
        ));
        assert_eq!(err.kind(), ErrorKind::StructuralViolation);
    }
    let err = service.move_folder(tree.root.id, tree.c.id).unwrap_err();
    assert!(matches!(err, FolderServiceError::CyclicMove { .. }));

    let after: Vec<Folder> = service.list_folders(tree.user).unwrap();
    assert_eq!(before, after);
}

#[test]
fn move_requires_same_owner_and_existing_ids() {
    let conn = setup();
    let service = service(&conn);
    let tree = build_tree(&service);
    let other_user = Uuid::new_v4();
    let other_root = service.initialize_root(other_user).unwrap();

    let err = service.move_folder(tree.a.id, other_root.id).unwrap_err();
    assert!(matches!(err, FolderServiceError::OwnerMismatch { .. }));
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    let missing = Uuid::new_v4();
    let err = service.move_folder(missing, tree.root.id).unwrap_err();
    assert!(matches!(err, FolderServiceError::FolderNotFound(id) if id == missing));
    let err = service.move_folder(tree.a.id, missing).unwrap_err();
    assert!(matches!(err, FolderServiceError::ParentNotFound(id) if id == missing));
}

#[test]
fn move_of_detached_folder_attaches_cleanly() {
    let conn = setup();
    let service = service(&conn);
    let tree = build_tree(&service);

    conn.execute(
        "DELETE FROM folder_subfolders WHERE child_uuid = ?1;",
        [tree.d.id.to_string()],
    )
    .unwrap();
    assert_eq!(service.find_parent(tree.d.id).unwrap(), None);

    service.move_folder(tree.d.id, tree.c.id).unwrap();
    assert_eq!(service.find_parent(tree.d.id).unwrap(), Some(tree.c.id));
}

#[test]
fn insert_item_is_idempotent_and_moves_between_folders() {
    let conn = setup();
    let service = service(&conn);
    let tree = build_tree(&service);
    let note = Uuid::new_v4();

    service.insert_item(note, tree.a.id).unwrap();
    service.insert_item(note, tree.a.id).unwrap();
    let items = service.items(tree.a.id).unwrap();
    assert_eq!(items, vec![note]);

    service.insert_item(note, tree.b.id).unwrap();
    assert!(service.items(tree.a.id).unwrap().is_empty());
    assert_eq!(service.items(tree.b.id).unwrap(), vec![note]);
    assert_eq!(service.folder_of_item(note).unwrap(), Some(tree.b.id));

    let missing = Uuid::new_v4();
    let err = service.insert_item(note, missing).unwrap_err();
    assert!(matches!(err, FolderServiceError::FolderNotFound(id) if id == missing));
    assert_eq!(service.folder_of_item(note).unwrap(), Some(tree.b.id));
}

#[test]
fn delete_item_removes_membership() {
    let conn = setup();
    let service = service(&conn);
    let tree = build_tree(&service);
    let note = Uuid::new_v4();

    service.insert_item(note, tree.c.id).unwrap();
    service.delete_item(note).unwrap();
    assert!(service.items(tree.c.id).unwrap().is_empty());

    let err = service.delete_item(note).unwrap_err();
    assert!(matches!(err, FolderServiceError::ItemNotFound(id) if id == note));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn delete_folder_removes_closure_and_detaches_from_parent() {
    let conn = setup();
    let service = service(&conn);
    let tree = build_tree(&service);
    let in_b = Uuid::new_v4();
    let in_c = Uuid::new_v4();
    let in_d = Uuid::new_v4();
    service.insert_item(in_b, tree.b.id).unwrap();
    service.insert_item(in_c, tree.c.id).unwrap();
    service.insert_item(in_d, tree.d.id).unwrap();

    let deletion = service.delete_folder(tree.a.id).unwrap();
    assert_eq!(deletion.removed_folders, vec![tree.a.id, tree.b.id, tree.c.id]);
    let mut orphaned = deletion.orphaned_items.clone();
    orphaned.sort();
    let mut expected = vec![in_b, in_c];
    expected.sort();
    assert_eq!(orphaned, expected);

    for id in [tree.a.id, tree.b.id, tree.c.id] {
        assert!(matches!(
            service.get_folder(id),
            Err(FolderServiceError::FolderNotFound(_))
        ));
    }
    let root = service.get_folder(tree.root.id).unwrap();
    assert_eq!(root.subfolders, vec![tree.d.id]);
    assert_eq!(service.items(tree.d.id).unwrap(), vec![in_d]);
    assert_eq!(service.folder_of_item(in_b).unwrap(), None);
    assert_eq!(folder_count(&conn), 2);
}

#[test]
fn delete_missing_folder_fails() {
    let conn = setup();
    let service = service(&conn);
    let missing = Uuid::new_v4();

    let err = service.delete_folder(missing).unwrap_err();
    assert!(matches!(err, FolderServiceError::FolderNotFound(id) if id == missing));
}

#[test]
fn rename_updates_title() {
    let conn = setup();
    let service = service(&conn);
    let tree = build_tree(&service);

    let renamed = service.rename_folder(tree.b.id, "  Biology ").unwrap();
    assert_eq!(renamed.title, "Biology");
    assert_eq!(renamed.subfolders, vec![tree.c.id]);
}

#[test]
fn descendant_check_follows_subfolder_edges() {
    let conn = setup();
    let service = service(&conn);
    let tree = build_tree(&service);

    assert!(service.is_descendant(tree.c.id, tree.root.id).unwrap());
    assert!(service.is_descendant(tree.c.id, tree.a.id).unwrap());
    assert!(!service.is_descendant(tree.d.id, tree.a.id).unwrap());
    assert!(!service.is_descendant(tree.a.id, tree.c.id).unwrap());
    assert!(!service.is_descendant(tree.a.id, tree.a.id).unwrap());
}

#[test]
fn descendant_check_terminates_on_cycles_and_dead_edges() {
    let conn = setup();
    let service = service(&conn);
    let tree = build_tree(&service);

    conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
    // Corrupt the graph: a -> b -> c -> a, and c -> <missing>.
    conn.execute(
        "DELETE FROM folder_subfolders WHERE child_uuid = ?1;",
        [tree.a.id.to_string()],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO folder_subfolders (parent_uuid, child_uuid, position) VALUES (?1, ?2, 0);",
        params![tree.c.id.to_string(), tree.a.id.to_string()],
    )
    .unwrap();
    let dead = Uuid::new_v4();
    conn.execute(
        "INSERT INTO folder_subfolders (parent_uuid, child_uuid, position) VALUES (?1, ?2, 1);",
        params![tree.c.id.to_string(), dead.to_string()],
    )
    .unwrap();

    assert!(!service.is_descendant(tree.d.id, tree.a.id).unwrap());
    assert!(service.is_descendant(dead, tree.a.id).unwrap());
    assert!(service.is_descendant(tree.a.id, tree.b.id).unwrap());

    let children = service.children(tree.c.id).unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id, tree.a.id);

    let deletion = service.delete_folder(tree.b.id).unwrap();
    assert_eq!(deletion.removed_folders, vec![tree.b.id, tree.c.id, tree.a.id]);
}
