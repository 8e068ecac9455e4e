use uuid::Uuid;

use crate::Database;

pub(crate) fn open_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(&dir.path().join("tandem-test.db")).unwrap();
    (dir, db)
}

pub(crate) fn seed_user(db: &Database, username: &str) -> String {
    let id = Uuid::new_v4().to_string();
    db.create_user(&id, username, username, "$argon2id$test-hash")
        .unwrap();
    id
}

/// Two users already linked as partners.
pub(crate) fn seed_pair(db: &Database) -> (String, String) {
    let a = seed_user(db, "akira");
    let b = seed_user(db, "botan");
    db.create_mutual_pair(&a, &b).unwrap();
    (a, b)
}
