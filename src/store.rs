use rusqlite::{Connection, OptionalExtension};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Local stand-in for the remote list backend: lists addressed by opaque
/// ids, integer-keyed items holding a raw field map, and an attachment
/// sub-resource per item. Reads support expansion of lookup fields into
/// embedded `{ "Id", "Title" }` objects.
pub struct ListStore {
    conn: Connection,
    workspace: PathBuf,
    origin: String,
}

#[derive(Debug, Clone)]
pub struct RawItem {
    pub id: i64,
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct AttachmentInfo {
    pub file_name: String,
    pub server_path: String,
}

/// Lookup-expansion request: resolve the ids held in `field` against the
/// list titled `list` and embed the matches under `into`. The raw `field`
/// value is left untouched so callers still see the stored ids.
#[derive(Debug, Clone, Copy)]
pub struct Expand {
    pub field: &'static str,
    pub into: &'static str,
    pub list: &'static str,
}

impl ListStore {
    pub fn open(workspace: &Path, origin: &str) -> anyhow::Result<ListStore> {
        std::fs::create_dir_all(workspace)?;
        let db_path = workspace.join("orbit.sqlite3");
        let conn = Connection::open(db_path)?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS lists(
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL UNIQUE
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS items(
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                list_id TEXT NOT NULL,
                fields TEXT NOT NULL,
                FOREIGN KEY(list_id) REFERENCES lists(id)
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_items_list ON items(list_id)",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS attachments(
                list_id TEXT NOT NULL,
                item_id INTEGER NOT NULL,
                file_name TEXT NOT NULL,
                server_path TEXT NOT NULL,
                PRIMARY KEY(list_id, item_id, file_name),
                FOREIGN KEY(list_id) REFERENCES lists(id)
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_attachments_item ON attachments(list_id, item_id)",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS settings(
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        Ok(ListStore {
            conn,
            workspace: workspace.to_path_buf(),
            origin: origin.trim_end_matches('/').to_string(),
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Returns the id of the list titled `title`, creating it on first use.
    pub fn ensure_list(&self, title: &str) -> anyhow::Result<String> {
        let existing: Option<String> = self
            .conn
            .query_row("SELECT id FROM lists WHERE title = ?", [title], |r| {
                r.get(0)
            })
            .optional()?;
        if let Some(id) = existing {
            return Ok(id);
        }
        let id = Uuid::new_v4().to_string();
        self.conn
            .execute("INSERT INTO lists(id, title) VALUES(?, ?)", (&id, title))?;
        Ok(id)
    }

    pub fn items(&self, list_id: &str, expand: &[Expand]) -> anyhow::Result<Vec<RawItem>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, fields FROM items WHERE list_id = ? ORDER BY id")?;
        let rows = stmt
            .query_map([list_id], |r| {
                Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut out = Vec::with_capacity(rows.len());
        for (id, raw) in rows {
            let mut fields: Map<String, Value> =
                serde_json::from_str(&raw).unwrap_or_default();
            for ex in expand {
                self.expand_field(&mut fields, ex)?;
            }
            out.push(RawItem { id, fields });
        }
        Ok(out)
    }

    pub fn get_item(&self, list_id: &str, item_id: i64) -> anyhow::Result<Option<RawItem>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT fields FROM items WHERE list_id = ? AND id = ?",
                (list_id, item_id),
                |r| r.get(0),
            )
            .optional()?;
        Ok(raw.map(|raw| RawItem {
            id: item_id,
            fields: serde_json::from_str(&raw).unwrap_or_default(),
        }))
    }

    pub fn add_item(&self, list_id: &str, fields: &Map<String, Value>) -> anyhow::Result<i64> {
        let raw = serde_json::to_string(fields)?;
        self.conn.execute(
            "INSERT INTO items(list_id, fields) VALUES(?, ?)",
            (list_id, &raw),
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Shallow-merges `fields` into the stored raw map.
    pub fn update_item(
        &self,
        list_id: &str,
        item_id: i64,
        fields: &Map<String, Value>,
    ) -> anyhow::Result<bool> {
        let Some(existing) = self.get_item(list_id, item_id)? else {
            return Ok(false);
        };
        let mut merged = existing.fields;
        for (k, v) in fields {
            merged.insert(k.clone(), v.clone());
        }
        let raw = serde_json::to_string(&Value::Object(merged))?;
        let n = self.conn.execute(
            "UPDATE items SET fields = ? WHERE list_id = ? AND id = ?",
            (&raw, list_id, item_id),
        )?;
        Ok(n > 0)
    }

    pub fn delete_item(&self, list_id: &str, item_id: i64) -> anyhow::Result<bool> {
        for att in self.attachments(list_id, item_id)? {
            self.attachment_delete(list_id, item_id, &att.file_name)?;
        }
        let n = self.conn.execute(
            "DELETE FROM items WHERE list_id = ? AND id = ?",
            (list_id, item_id),
        )?;
        Ok(n > 0)
    }

    pub fn attachments(&self, list_id: &str, item_id: i64) -> anyhow::Result<Vec<AttachmentInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT file_name, server_path FROM attachments
             WHERE list_id = ? AND item_id = ?
             ORDER BY file_name",
        )?;
        let rows = stmt
            .query_map((list_id, item_id), |r| {
                Ok(AttachmentInfo {
                    file_name: r.get(0)?,
                    server_path: r.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Stores the bytes under the workspace and records the attachment.
    /// Re-uploading the same file name overwrites in place.
    pub fn attachment_add(
        &self,
        list_id: &str,
        item_id: i64,
        file_name: &str,
        bytes: &[u8],
    ) -> anyhow::Result<String> {
        let dir = self
            .workspace
            .join("attachments")
            .join(list_id)
            .join(item_id.to_string());
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join(file_name), bytes)?;

        let server_path = format!("/attachments/{}/{}/{}", list_id, item_id, file_name);
        self.conn.execute(
            "INSERT INTO attachments(list_id, item_id, file_name, server_path)
             VALUES(?, ?, ?, ?)
             ON CONFLICT(list_id, item_id, file_name) DO UPDATE SET
               server_path = excluded.server_path",
            (list_id, item_id, file_name, &server_path),
        )?;
        Ok(server_path)
    }

    pub fn attachment_delete(
        &self,
        list_id: &str,
        item_id: i64,
        file_name: &str,
    ) -> anyhow::Result<bool> {
        let n = self.conn.execute(
            "DELETE FROM attachments WHERE list_id = ? AND item_id = ? AND file_name = ?",
            (list_id, item_id, file_name),
        )?;
        let path = self
            .workspace
            .join("attachments")
            .join(list_id)
            .join(item_id.to_string())
            .join(file_name);
        if path.is_file() {
            std::fs::remove_file(path)?;
        }
        Ok(n > 0)
    }

    pub fn setting_get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?", [key], |r| {
                r.get(0)
            })
            .optional()?;
        Ok(raw.and_then(|s| serde_json::from_str(&s).ok()))
    }

    pub fn setting_set(&self, key: &str, value: &Value) -> anyhow::Result<()> {
        let raw = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT INTO settings(key, value) VALUES(?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            (key, &raw),
        )?;
        Ok(())
    }

    /// Resolves the lookup ids in `fields[ex.field]` against the target
    /// list and embeds the matches. Single-valued lookups embed one object,
    /// multi-valued lookups an array. Dangling ids resolve to nothing.
    fn expand_field(&self, fields: &mut Map<String, Value>, ex: &Expand) -> anyhow::Result<()> {
        let ids: Vec<i64> = match fields.get(ex.field) {
            Some(Value::Number(n)) => n.as_i64().into_iter().collect(),
            Some(Value::Array(arr)) => arr.iter().filter_map(Value::as_i64).collect(),
            Some(Value::String(s)) => s.parse::<i64>().into_iter().collect(),
            _ => return Ok(()),
        };
        let multi = matches!(fields.get(ex.field), Some(Value::Array(_)));
        let target_list = self.ensure_list(ex.list)?;

        let mut embedded = Vec::new();
        for id in ids {
            if let Some(item) = self.get_item(&target_list, id)? {
                let title = item
                    .fields
                    .get("Title")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                embedded.push(json!({ "Id": item.id, "Title": title }));
            }
        }

        if multi {
            fields.insert(ex.into.to_string(), Value::Array(embedded));
        } else if let Some(obj) = embedded.into_iter().next() {
            fields.insert(ex.into.to_string(), obj);
        }
        Ok(())
    }
}
