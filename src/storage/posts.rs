//! Post and tag persistence

use rusqlite::{params, OptionalExtension};
use crate::Result;
use crate::model::{Post, PostKind, Tag};
use super::sqlite::{enum_column, WikiStore};

const POST_COLUMNS: &str = "p.id, p.slug, p.title, p.summary, p.content, p.kind, p.published, p.created_at, p.updated_at";

/// Filter for listing posts
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub kind: Option<PostKind>,
    pub tag: Option<String>,
    pub published_only: bool,
    pub limit: Option<usize>,
}

impl PostFilter {
    pub fn published() -> Self {
        Self { published_only: true, ..Self::default() }
    }
}

impl WikiStore {
    /// Insert or update a post keyed by slug and replace its tags.
    ///
    /// `created_at` of an existing post is preserved.
    pub fn upsert_post(&self, post: &Post) -> Result<i64> {
        post.validate()?;
        self.savepoint("upsert_post", || {
            let id: i64 = self.conn.query_row(
                r#"
                INSERT INTO posts (slug, title, summary, content, kind, published, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(slug) DO UPDATE SET
                    title = excluded.title,
                    summary = excluded.summary,
                    content = excluded.content,
                    kind = excluded.kind,
                    published = excluded.published,
                    updated_at = excluded.updated_at
                RETURNING id
                "#,
                params![
                    post.slug,
                    post.title,
                    post.summary,
                    post.content,
                    post.kind.as_str(),
                    post.published,
                    post.created_at,
                    post.updated_at,
                ],
                |row| row.get(0),
            )?;
            self.set_post_tags(id, &post.tags)?;
            Ok(id)
        })
    }

    /// Replace the tags of a post, creating unknown tags on the way
    pub fn set_post_tags(&self, post_id: i64, tags: &[String]) -> Result<()> {
        self.conn.execute("DELETE FROM post_tags WHERE post_id = ?1", [post_id])?;
        for name in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            let tag_id: i64 = self.conn.query_row(
                "INSERT INTO tags (name) VALUES (?1) ON CONFLICT(name) DO UPDATE SET name = excluded.name RETURNING id",
                [name],
                |row| row.get(0),
            )?;
            self.conn.execute(
                "INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?1, ?2)",
                params![post_id, tag_id],
            )?;
        }
        Ok(())
    }

    pub fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let post = self
            .conn
            .query_row(
                &format!("SELECT {} FROM posts p WHERE p.slug = ?1", POST_COLUMNS),
                [slug],
                Self::row_to_post,
            )
            .optional()?;
        match post {
            Some(mut post) => {
                post.tags = self.tags_for_post(post.id)?;
                Ok(Some(post))
            }
            None => Ok(None),
        }
    }

    /// Posts matching `filter`, newest first
    pub fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        let limit: i64 = filter.limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {}
            FROM posts p
            WHERE (?1 IS NULL OR p.kind = ?1)
              AND (?2 = 0 OR p.published = 1)
              AND (?3 IS NULL OR EXISTS (
                    SELECT 1 FROM post_tags pt JOIN tags t ON t.id = pt.tag_id
                    WHERE pt.post_id = p.id AND t.name = ?3))
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT ?4
            "#,
            POST_COLUMNS
        ))?;
        let mut posts = stmt
            .query_map(
                params![
                    filter.kind.map(|k| k.as_str()),
                    filter.published_only,
                    filter.tag,
                    limit,
                ],
                Self::row_to_post,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for post in &mut posts {
            post.tags = self.tags_for_post(post.id)?;
        }
        Ok(posts)
    }

    pub fn delete_post(&self, id: i64) -> Result<bool> {
        let changed = self.conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    pub fn tags_for_post(&self, post_id: i64) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.name FROM tags t JOIN post_tags pt ON pt.tag_id = t.id WHERE pt.post_id = ?1 ORDER BY t.name",
        )?;
        let tags = stmt
            .query_map([post_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(tags)
    }

    /// All tags with the number of posts using them
    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT t.id, t.name, COUNT(pt.post_id)
            FROM tags t
            LEFT JOIN post_tags pt ON pt.tag_id = t.id
            GROUP BY t.id, t.name
            ORDER BY t.name
            "#,
        )?;
        let tags = stmt
            .query_map([], |row| {
                let posts: i64 = row.get(2)?;
                Ok(Tag { id: row.get(0)?, name: row.get(1)?, posts: posts as usize })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    fn row_to_post(row: &rusqlite::Row) -> rusqlite::Result<Post> {
        Ok(Post {
            id: row.get(0)?,
            slug: row.get(1)?,
            title: row.get(2)?,
            summary: row.get(3)?,
            content: row.get(4)?,
            kind: enum_column(row, 5)?,
            published: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
            tags: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::PostFilter;
    use crate::model::{Post, PostKind};
    use crate::storage::WikiStore;
    use chrono::{Duration, Utc};

    #[test]
    fn test_post_with_tags() {
        let store = WikiStore::open_in_memory().unwrap();
        let post = Post::new("pvp-basics", "PvP basics", "<p>Stay alive</p>")
            .with_tags(&["pvp", "beginner", "pvp"])
            .published();
        store.upsert_post(&post).unwrap();

        let loaded = store.get_post_by_slug("pvp-basics").unwrap().unwrap();
        assert_eq!(loaded.tags, vec!["beginner".to_string(), "pvp".to_string()]);
        assert!(loaded.published);
    }

    #[test]
    fn test_upsert_replaces_tags_and_keeps_created_at() {
        let store = WikiStore::open_in_memory().unwrap();
        let mut post = Post::new("lore-1", "The Chosen", "");
        post.created_at = Utc::now() - Duration::days(10);
        post.tags = vec!["lore".to_string()];
        let id = store.upsert_post(&post).unwrap();
        let created = store.get_post_by_slug("lore-1").unwrap().unwrap().created_at;

        let mut edited = Post::new("lore-1", "The Chosen (revised)", "");
        edited.tags = vec!["history".to_string()];
        assert_eq!(store.upsert_post(&edited).unwrap(), id);

        let loaded = store.get_post_by_slug("lore-1").unwrap().unwrap();
        assert_eq!(loaded.title, "The Chosen (revised)");
        assert_eq!(loaded.tags, vec!["history".to_string()]);
        assert_eq!(loaded.created_at, created);

        let tags = store.list_tags().unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.iter().find(|t| t.name == "lore").unwrap().posts, 0);
    }

    #[test]
    fn test_list_posts_filters() {
        let store = WikiStore::open_in_memory().unwrap();
        store.upsert_post(&Post::new("a", "A", "").with_tags(&["pve"]).published()).unwrap();
        store.upsert_post(&Post::new("b", "B", "").with_tags(&["pvp"]).published()).unwrap();
        store.upsert_post(&Post::new("draft", "Draft", "").with_tags(&["pvp"])).unwrap();
        let mut lore = Post::new("c", "C", "").published();
        lore.kind = PostKind::Lore;
        store.upsert_post(&lore).unwrap();

        assert_eq!(store.list_posts(&PostFilter::default()).unwrap().len(), 4);
        assert_eq!(store.list_posts(&PostFilter::published()).unwrap().len(), 3);

        let pvp = PostFilter { tag: Some("pvp".to_string()), ..PostFilter::published() };
        let found = store.list_posts(&pvp).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].slug, "b");

        let lore_only = PostFilter { kind: Some(PostKind::Lore), ..PostFilter::default() };
        assert_eq!(store.list_posts(&lore_only).unwrap()[0].slug, "c");

        let limited = PostFilter { limit: Some(2), ..PostFilter::default() };
        assert_eq!(store.list_posts(&limited).unwrap().len(), 2);
    }

    #[test]
    fn test_delete_post_cascades_links() {
        let store = WikiStore::open_in_memory().unwrap();
        let id = store.upsert_post(&Post::new("gone", "Gone", "").with_tags(&["x"])).unwrap();
        assert!(store.delete_post(id).unwrap());
        assert_eq!(store.stats().unwrap().count("post_tags"), 0);
    }
}
