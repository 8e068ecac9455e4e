//! User records and the pairing ledger.
//!
//! A partnership is a mutual, symmetric, exclusive link. Both sides are
//! written in one transaction, and lookups check both foreign-key
//! directions so a link is found no matter which row carries it.

use rusqlite::Connection;

use crate::Database;
use crate::error::{RoomError, RoomResult};
use crate::models::UserRow;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        display_name: &str,
        password_hash: &str,
    ) -> RoomResult<()> {
        self.with_write(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, display_name, password) VALUES (?1, ?2, ?3, ?4)",
                (id, username, display_name, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> RoomResult<Option<UserRow>> {
        self.with_read(|conn| query_user(conn, "username = ?1", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> RoomResult<Option<UserRow>> {
        self.with_read(|conn| query_user(conn, "id = ?1", id))
    }

    // -- Pairing ledger --

    /// The linked partner, whichever side owns the link. None if unpaired.
    pub fn partner_of(&self, user_id: &str) -> RoomResult<Option<UserRow>> {
        self.with_read(|conn| match partner_link(conn, user_id)? {
            Some(partner_id) => query_user(conn, "id = ?1", &partner_id),
            None => Ok(None),
        })
    }

    pub fn is_paired(&self, user_id: &str) -> RoomResult<bool> {
        self.with_read(|conn| Ok(partner_link(conn, user_id)?.is_some()))
    }

    /// Atomically link two users as partners. Both links are written or
    /// neither; a half-paired state is never observable.
    pub fn create_mutual_pair(&self, a: &str, b: &str) -> RoomResult<()> {
        if a == b {
            return Err(RoomError::SelfPair);
        }

        self.with_write(|conn| {
            let tx = conn.transaction()?;

            if query_user(&tx, "id = ?1", a)?.is_none() || query_user(&tx, "id = ?1", b)?.is_none()
            {
                return Err(RoomError::UserNotFound);
            }
            if partner_link(&tx, a)?.is_some() || partner_link(&tx, b)?.is_some() {
                return Err(RoomError::AlreadyPaired);
            }

            tx.execute("UPDATE users SET partner_id = ?1 WHERE id = ?2", (b, a))?;
            tx.execute("UPDATE users SET partner_id = ?1 WHERE id = ?2", (a, b))?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Dissolve whichever partnership `user_id` participates in, clearing
    /// the link on both sides. Idempotent when there is no partner.
    pub fn unpair(&self, user_id: &str) -> RoomResult<()> {
        self.with_write(|conn| {
            // One statement covers the user's own row and any row pointing
            // back at them, regardless of which side owns the link.
            conn.execute(
                "UPDATE users SET partner_id = NULL WHERE id = ?1 OR partner_id = ?1",
                [user_id],
            )?;
            Ok(())
        })
    }
}

/// Resolve the partner id checking both link directions.
pub(crate) fn partner_link(conn: &Connection, user_id: &str) -> RoomResult<Option<String>> {
    let forward: Option<Option<String>> = conn
        .query_row(
            "SELECT partner_id FROM users WHERE id = ?1",
            [user_id],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(Some(partner_id)) = forward {
        return Ok(Some(partner_id));
    }

    let reverse: Option<String> = conn
        .query_row(
            "SELECT id FROM users WHERE partner_id = ?1",
            [user_id],
            |row| row.get(0),
        )
        .optional()?;

    Ok(reverse)
}

pub(crate) fn query_user(
    conn: &Connection,
    predicate: &str,
    value: &str,
) -> RoomResult<Option<UserRow>> {
    let sql = format!(
        "SELECT id, username, display_name, password, partner_id, created_at
         FROM users WHERE {predicate}"
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                display_name: row.get(2)?,
                password: row.get(3)?,
                partner_id: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results.
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> RoomResult<Option<T>>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> RoomResult<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::RoomError;
    use crate::testutil::{open_db, seed_user};

    #[test]
    fn mutual_pair_links_both_sides() {
        let (_dir, db) = open_db();
        let a = seed_user(&db, "akira");
        let b = seed_user(&db, "botan");

        db.create_mutual_pair(&a, &b).unwrap();

        assert_eq!(db.partner_of(&a).unwrap().unwrap().id, b);
        assert_eq!(db.partner_of(&b).unwrap().unwrap().id, a);
        assert!(db.is_paired(&a).unwrap());
        assert!(db.is_paired(&b).unwrap());
    }

    #[test]
    fn self_pair_is_rejected() {
        let (_dir, db) = open_db();
        let a = seed_user(&db, "akira");

        assert_eq!(db.create_mutual_pair(&a, &a), Err(RoomError::SelfPair));
        assert!(!db.is_paired(&a).unwrap());
    }

    #[test]
    fn pairing_is_exclusive() {
        let (_dir, db) = open_db();
        let a = seed_user(&db, "akira");
        let b = seed_user(&db, "botan");
        let c = seed_user(&db, "chiro");

        db.create_mutual_pair(&a, &b).unwrap();

        assert_eq!(db.create_mutual_pair(&a, &c), Err(RoomError::AlreadyPaired));
        assert_eq!(db.create_mutual_pair(&c, &b), Err(RoomError::AlreadyPaired));

        // the original pairing is intact
        assert_eq!(db.partner_of(&a).unwrap().unwrap().id, b);
        assert!(db.partner_of(&c).unwrap().is_none());
    }

    #[test]
    fn pair_with_unknown_user_fails() {
        let (_dir, db) = open_db();
        let a = seed_user(&db, "akira");

        assert_eq!(
            db.create_mutual_pair(&a, "missing"),
            Err(RoomError::UserNotFound)
        );
        assert!(!db.is_paired(&a).unwrap());
    }

    #[test]
    fn unpair_clears_both_sides_and_is_idempotent() {
        let (_dir, db) = open_db();
        let a = seed_user(&db, "akira");
        let b = seed_user(&db, "botan");
        db.create_mutual_pair(&a, &b).unwrap();

        db.unpair(&a).unwrap();
        assert!(db.partner_of(&a).unwrap().is_none());
        assert!(db.partner_of(&b).unwrap().is_none());

        // no partner left — still succeeds
        db.unpair(&a).unwrap();
    }

    #[test]
    fn unpair_works_from_either_side() {
        let (_dir, db) = open_db();
        let a = seed_user(&db, "akira");
        let b = seed_user(&db, "botan");
        db.create_mutual_pair(&a, &b).unwrap();

        db.unpair(&b).unwrap();
        assert!(db.partner_of(&a).unwrap().is_none());
        assert!(db.partner_of(&b).unwrap().is_none());
    }

    #[test]
    fn unpaired_users_can_pair_again() {
        let (_dir, db) = open_db();
        let a = seed_user(&db, "akira");
        let b = seed_user(&db, "botan");
        let c = seed_user(&db, "chiro");

        db.create_mutual_pair(&a, &b).unwrap();
        db.unpair(&a).unwrap();
        db.create_mutual_pair(&a, &c).unwrap();

        assert_eq!(db.partner_of(&a).unwrap().unwrap().id, c);
        assert!(db.partner_of(&b).unwrap().is_none());
    }
}
