//! Statements against an open connection. Every function takes a plain
//! `&Connection` so callers can compose several of them inside one
//! `Database::transaction`.

use crate::models::{
    CategoryRow, NewSentence, NewUser, PermissionRow, SentenceFilter, SentenceRow, UserRow,
};
use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{Connection, Row, params, params_from_iter};
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, email, hashed_password, nickname, active, is_superuser, created_at";

const CATEGORY_COLUMNS: &str = "id, name, description, created_at, updated_at";

const SENTENCE_SELECT: &str = "
    SELECT s.id, s.content, s.from_source, s.from_who, s.likes, s.is_disabled,
           s.category_id, s.creator_id, s.created_at, s.updated_at,
           c.id, c.name, c.description, c.created_at, c.updated_at
    FROM sentences s
    JOIN sentence_categories c ON c.id = s.category_id";

// -- Users --

pub fn user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
    let row = conn.query_row(&sql, [email], user_from_row).optional()?;
    Ok(row)
}

pub fn user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    let row = conn.query_row(&sql, [id], user_from_row).optional()?;
    Ok(row)
}

/// Inserts the user together with its permission record. Both rows land in
/// whatever transaction `conn` belongs to.
pub fn insert_user(conn: &Connection, user: &NewUser<'_>) -> Result<UserRow> {
    let user_id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO users (id, email, hashed_password, nickname, active, is_superuser)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id,
            user.email,
            user.hashed_password,
            user.nickname,
            user.active,
            user.is_superuser
        ],
    )?;
    conn.execute(
        "INSERT INTO sentence_user_config (id, user_id, is_superuser) VALUES (?1, ?2, ?3)",
        params![Uuid::new_v4().to_string(), user_id, user.is_superuser],
    )?;

    user_by_id(conn, &user_id)?.ok_or_else(|| anyhow::anyhow!("User {} vanished after insert", user_id))
}

pub fn permission_by_user(conn: &Connection, user_id: &str) -> Result<Option<PermissionRow>> {
    let row = conn
        .query_row(
            "SELECT id, user_id, is_superuser FROM sentence_user_config WHERE user_id = ?1",
            [user_id],
            |row| {
                Ok(PermissionRow {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    is_superuser: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Updates account flags. `is_superuser` is written to both the user row and
/// its permission record.
pub fn set_user_flags(
    conn: &Connection,
    user_id: &str,
    active: Option<bool>,
    is_superuser: Option<bool>,
) -> Result<()> {
    if let Some(active) = active {
        conn.execute("UPDATE users SET active = ?1 WHERE id = ?2", params![active, user_id])?;
    }
    if let Some(is_superuser) = is_superuser {
        conn.execute(
            "UPDATE users SET is_superuser = ?1 WHERE id = ?2",
            params![is_superuser, user_id],
        )?;
        conn.execute(
            "UPDATE sentence_user_config SET is_superuser = ?1 WHERE user_id = ?2",
            params![is_superuser, user_id],
        )?;
    }
    Ok(())
}

// -- Categories --

pub fn category_by_id(conn: &Connection, id: &str) -> Result<Option<CategoryRow>> {
    let sql = format!("SELECT {CATEGORY_COLUMNS} FROM sentence_categories WHERE id = ?1");
    let row = conn.query_row(&sql, [id], |row| category_from_row(row, 0)).optional()?;
    Ok(row)
}

/// True when another category (not `exclude_id`) already uses `name`.
pub fn category_name_taken(conn: &Connection, name: &str, exclude_id: Option<&str>) -> Result<bool> {
    let taken = conn
        .query_row(
            "SELECT 1 FROM sentence_categories WHERE name = ?1 AND id IS NOT ?2",
            params![name, exclude_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    Ok(taken)
}

pub fn insert_category(conn: &Connection, name: &str, description: Option<&str>) -> Result<CategoryRow> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO sentence_categories (id, name, description) VALUES (?1, ?2, ?3)",
        params![id, name, description],
    )?;
    category_by_id(conn, &id)?.ok_or_else(|| anyhow::anyhow!("Category {} vanished after insert", id))
}

/// Writes the row's mutable fields back and bumps `updated_at`.
pub fn update_category(conn: &Connection, category: &CategoryRow) -> Result<CategoryRow> {
    conn.execute(
        "UPDATE sentence_categories
         SET name = ?1, description = ?2, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
         WHERE id = ?3",
        params![category.name, category.description, category.id],
    )?;
    category_by_id(conn, &category.id)?
        .ok_or_else(|| anyhow::anyhow!("Category {} vanished after update", category.id))
}

/// Deletes the category and, through the foreign key, its sentences.
pub fn delete_category(conn: &Connection, id: &str) -> Result<bool> {
    let n = conn.execute("DELETE FROM sentence_categories WHERE id = ?1", [id])?;
    Ok(n > 0)
}

pub fn list_categories(conn: &Connection) -> Result<Vec<CategoryRow>> {
    let sql = format!("SELECT {CATEGORY_COLUMNS} FROM sentence_categories ORDER BY name");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| category_from_row(row, 0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// -- Sentences --

pub fn sentence_by_id(conn: &Connection, id: &str) -> Result<Option<SentenceRow>> {
    let sql = format!("{SENTENCE_SELECT} WHERE s.id = ?1");
    let row = conn.query_row(&sql, [id], sentence_from_row).optional()?;
    Ok(row)
}

/// True when another sentence (not `exclude_id`) already has this content.
pub fn content_taken(conn: &Connection, content: &str, exclude_id: Option<&str>) -> Result<bool> {
    let taken = conn
        .query_row(
            "SELECT 1 FROM sentences WHERE content = ?1 AND id IS NOT ?2",
            params![content, exclude_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    Ok(taken)
}

/// Returns which of `contents` are already stored.
pub fn existing_contents(conn: &Connection, contents: &[&str]) -> Result<Vec<String>> {
    if contents.is_empty() {
        return Ok(vec![]);
    }

    let placeholders: Vec<String> = (1..=contents.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "SELECT content FROM sentences WHERE content IN ({})",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(contents.iter()), |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(rows)
}

pub fn insert_sentence(conn: &Connection, sentence: &NewSentence<'_>) -> Result<SentenceRow> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO sentences (id, content, from_source, from_who, likes, is_disabled, category_id, creator_id)
         VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?7)",
        params![
            id,
            sentence.content,
            sentence.from_source,
            sentence.from_who,
            sentence.is_disabled,
            sentence.category_id,
            sentence.creator_id
        ],
    )?;
    sentence_by_id(conn, &id)?.ok_or_else(|| anyhow::anyhow!("Sentence {} vanished after insert", id))
}

/// Writes the row's mutable fields back, bumps `updated_at` and returns the
/// re-read row (with its possibly new category joined in).
pub fn update_sentence(conn: &Connection, sentence: &SentenceRow) -> Result<SentenceRow> {
    conn.execute(
        "UPDATE sentences
         SET content = ?1, from_source = ?2, from_who = ?3, is_disabled = ?4, category_id = ?5,
             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
         WHERE id = ?6",
        params![
            sentence.content,
            sentence.from_source,
            sentence.from_who,
            sentence.is_disabled,
            sentence.category_id,
            sentence.id
        ],
    )?;
    sentence_by_id(conn, &sentence.id)?
        .ok_or_else(|| anyhow::anyhow!("Sentence {} vanished after update", sentence.id))
}

pub fn delete_sentence(conn: &Connection, id: &str) -> Result<bool> {
    let n = conn.execute("DELETE FROM sentences WHERE id = ?1", [id])?;
    Ok(n > 0)
}

/// Up to `limit` sentences in random order, optionally from one category.
/// Disabled sentences are included.
pub fn random_sentences(
    conn: &Connection,
    category_id: Option<&str>,
    limit: u32,
) -> Result<Vec<SentenceRow>> {
    let sql = format!("{SENTENCE_SELECT} WHERE (?1 IS NULL OR s.category_id = ?1) ORDER BY RANDOM() LIMIT ?2");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![category_id, limit], sentence_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_sentences(conn: &Connection, filter: &SentenceFilter) -> Result<u64> {
    let (clause, values) = filter_clause(filter);
    let sql = format!("SELECT COUNT(*) FROM sentences s{clause}");
    let count: i64 = conn.query_row(&sql, params_from_iter(values), |r| r.get(0))?;
    Ok(count as u64)
}

/// One page of sentences, newest first. Rows created in the same
/// millisecond fall back to insertion order.
pub fn sentence_page(
    conn: &Connection,
    filter: &SentenceFilter,
    limit: u32,
    offset: u64,
) -> Result<Vec<SentenceRow>> {
    let (clause, mut values) = filter_clause(filter);
    let sql = format!(
        "{SENTENCE_SELECT}{clause} ORDER BY s.created_at DESC, s.rowid DESC LIMIT ?{} OFFSET ?{}",
        values.len() + 1,
        values.len() + 2
    );
    values.push(Value::Integer(i64::from(limit)));
    values.push(Value::Integer(offset as i64));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values), sentence_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn set_disabled(conn: &Connection, ids: &[String], is_disabled: bool) -> Result<usize> {
    if ids.is_empty() {
        return Ok(0);
    }

    let placeholders: Vec<String> = (2..=ids.len() + 1).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "UPDATE sentences SET is_disabled = ?1, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
         WHERE id IN ({})",
        placeholders.join(", ")
    );

    let mut values = vec![Value::Integer(i64::from(is_disabled))];
    values.extend(ids.iter().cloned().map(Value::Text));
    let n = conn.execute(&sql, params_from_iter(values))?;
    Ok(n)
}

pub fn delete_sentences(conn: &Connection, ids: &[String]) -> Result<usize> {
    if ids.is_empty() {
        return Ok(0);
    }

    let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!("DELETE FROM sentences WHERE id IN ({})", placeholders.join(", "));
    let n = conn.execute(&sql, params_from_iter(ids.iter()))?;
    Ok(n)
}

/// Adds `delta` to the like counter, never going below zero. Returns the new
/// count, or `None` if the sentence does not exist.
pub fn adjust_likes(conn: &Connection, id: &str, delta: i64) -> Result<Option<i64>> {
    let n = conn.execute(
        "UPDATE sentences SET likes = MAX(likes + ?1, 0) WHERE id = ?2",
        params![delta, id],
    )?;
    if n == 0 {
        return Ok(None);
    }
    let likes = conn.query_row("SELECT likes FROM sentences WHERE id = ?1", [id], |r| r.get(0))?;
    Ok(Some(likes))
}

// -- Row mapping --

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        hashed_password: row.get(2)?,
        nickname: row.get(3)?,
        active: row.get(4)?,
        is_superuser: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn category_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<CategoryRow> {
    Ok(CategoryRow {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        description: row.get(offset + 2)?,
        created_at: row.get(offset + 3)?,
        updated_at: row.get(offset + 4)?,
    })
}

fn sentence_from_row(row: &Row<'_>) -> rusqlite::Result<SentenceRow> {
    Ok(SentenceRow {
        id: row.get(0)?,
        content: row.get(1)?,
        from_source: row.get(2)?,
        from_who: row.get(3)?,
        likes: row.get(4)?,
        is_disabled: row.get(5)?,
        category_id: row.get(6)?,
        creator_id: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        category: category_from_row(row, 10)?,
    })
}

/// Builds the WHERE clause for a filter, numbering placeholders from ?1.
fn filter_clause(filter: &SentenceFilter) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    if let Some(creator_id) = &filter.creator_id {
        values.push(Value::Text(creator_id.clone()));
        conditions.push(format!("s.creator_id = ?{}", values.len()));
    }
    if let Some(category_id) = &filter.category_id {
        values.push(Value::Text(category_id.clone()));
        conditions.push(format!("s.category_id = ?{}", values.len()));
    }
    if let Some(is_disabled) = filter.is_disabled {
        values.push(Value::Integer(i64::from(is_disabled)));
        conditions.push(format!("s.is_disabled = ?{}", values.len()));
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        values.push(Value::Text(format!("%{}%", escape_like(search))));
        conditions.push(format!("s.content LIKE ?{} ESCAPE '\\'", values.len()));
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), values)
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
