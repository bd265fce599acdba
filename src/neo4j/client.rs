//! Neo4j client for categories, responses and users

use crate::categories::{Category, CategoryDeletion};
use crate::responses::{Reference, Response, ResponseFilter, ResponseSort};
use crate::users::{Role, User};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use neo4rs::{query, Graph, Query, Txn};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Name of the full-text index over response title, question and answer
pub const RESPONSE_FULLTEXT_INDEX: &str = "response_text";

/// Client for Neo4j operations
pub struct Neo4jClient {
    graph: Arc<Graph>,
}

/// Fixed-width RFC 3339 so that string ordering is chronological.
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(node: &neo4rs::Node, key: &str) -> Result<DateTime<Utc>> {
    node.get::<String>(key)?
        .parse()
        .with_context(|| format!("Invalid timestamp in {}", key))
}

/// Optional string properties are stored as "" when absent.
fn optional_string(node: &neo4rs::Node, key: &str) -> Option<String> {
    node.get::<String>(key).ok().filter(|s| !s.is_empty())
}

/// Escape Lucene query syntax so user input is matched as plain terms.
///
/// Operator characters are backslash-escaped and the boolean keywords
/// `AND`, `OR` and `NOT` are lowercased, which the analyzer treats as words.
pub fn escape_lucene(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| match word {
            "AND" | "OR" | "NOT" => word.to_lowercase(),
            _ => escape_lucene_chars(word),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape_lucene_chars(word: &str) -> String {
    let mut escaped = String::with_capacity(word.len());
    for c in word.chars() {
        if matches!(
            c,
            '+' | '-'
                | '&'
                | '|'
                | '!'
                | '('
                | ')'
                | '{'
                | '}'
                | '['
                | ']'
                | '^'
                | '"'
                | '~'
                | '*'
                | '?'
                | ':'
                | '\\'
                | '/'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// SKIP/LIMIT parameters; values past `i64::MAX` clamp instead of wrapping negative.
fn cypher_int(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn order_clause(sort: ResponseSort) -> &'static str {
    match sort {
        ResponseSort::Newest => "ORDER BY r.created_at DESC",
        ResponseSort::Oldest => "ORDER BY r.created_at ASC",
        ResponseSort::TitleAsc => "ORDER BY r.title ASC, r.created_at ASC",
        ResponseSort::TitleDesc => "ORDER BY r.title DESC, r.created_at ASC",
    }
}

/// Run a count query inside a transaction, draining the stream.
async fn txn_count(txn: &mut Txn, q: Query) -> Result<i64> {
    let mut stream = txn.execute(q).await?;
    let mut count = 0;
    while let Some(row) = stream.next(txn.handle()).await? {
        count = row.get::<i64>("n")?;
    }
    Ok(count)
}

impl Neo4jClient {
    /// Create a new Neo4j client
    pub async fn new(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password)
            .await
            .context("Failed to connect to Neo4j")?;

        let client = Self {
            graph: Arc::new(graph),
        };

        // Initialize schema
        client.init_schema().await?;

        Ok(client)
    }

    /// Initialize constraints and indexes
    async fn init_schema(&self) -> Result<()> {
        let constraints = vec![
            "CREATE CONSTRAINT category_id IF NOT EXISTS FOR (c:Category) REQUIRE c.id IS UNIQUE",
            "CREATE CONSTRAINT category_name IF NOT EXISTS FOR (c:Category) REQUIRE c.name IS UNIQUE",
            "CREATE CONSTRAINT category_slug IF NOT EXISTS FOR (c:Category) REQUIRE c.slug IS UNIQUE",
            "CREATE CONSTRAINT response_id IF NOT EXISTS FOR (r:Response) REQUIRE r.id IS UNIQUE",
            "CREATE CONSTRAINT user_id IF NOT EXISTS FOR (u:User) REQUIRE u.id IS UNIQUE",
            "CREATE CONSTRAINT user_email IF NOT EXISTS FOR (u:User) REQUIRE u.email IS UNIQUE",
        ];

        let indexes = vec![
            "CREATE INDEX category_parent IF NOT EXISTS FOR (c:Category) ON (c.parent_id)",
            "CREATE INDEX response_created IF NOT EXISTS FOR (r:Response) ON (r.created_at)",
            "CREATE INDEX response_title IF NOT EXISTS FOR (r:Response) ON (r.title)",
        ];

        for constraint in constraints {
            if let Err(e) = self.graph.run(query(constraint)).await {
                tracing::warn!("Constraint may already exist: {}", e);
            }
        }

        for index in indexes {
            if let Err(e) = self.graph.run(query(index)).await {
                tracing::warn!("Index may already exist: {}", e);
            }
        }

        // Search depends on this one, so failure is fatal.
        let fulltext = format!(
            "CREATE FULLTEXT INDEX {} IF NOT EXISTS FOR (r:Response) ON EACH [r.title, r.question, r.answer]",
            RESPONSE_FULLTEXT_INDEX
        );
        self.graph
            .run(query(&fulltext))
            .await
            .context("Failed to create full-text index")?;

        Ok(())
    }

    /// Execute a parameterized Cypher query and collect all rows
    async fn execute_with_params(&self, q: Query) -> Result<Vec<neo4rs::Row>> {
        let mut result = self.graph.execute(q).await?;
        let mut rows = Vec::new();
        while let Some(row) = result.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Execute a query returning a single `n` count
    async fn count(&self, q: Query) -> Result<i64> {
        let rows = self.execute_with_params(q).await?;
        match rows.first() {
            Some(row) => Ok(row.get::<i64>("n")?),
            None => Ok(0),
        }
    }

    pub async fn health_check(&self) -> Result<bool> {
        let rows = self.execute_with_params(query("RETURN 1 AS ok")).await?;
        Ok(!rows.is_empty())
    }

    // ========================================================================
    // Category operations
    // ========================================================================

    /// Create a category, locking its parent so a concurrent delete of the
    /// parent sees the new child.
    pub async fn create_category(&self, category: &Category) -> Result<()> {
        let q = query(
            r#"
            OPTIONAL MATCH (p:Category {id: $parent_id})
            WITH collect(p) AS parents
            FOREACH (p IN parents | SET p._lock = true REMOVE p._lock)
            CREATE (c:Category {
                id: $id,
                name: $name,
                description: $description,
                slug: $slug,
                parent_id: $parent_id,
                created_at: $created_at,
                updated_at: $updated_at
            })
            "#,
        )
        .param("id", category.id.to_string())
        .param("name", category.name.clone())
        .param("description", category.description.clone())
        .param("slug", category.slug.clone())
        .param(
            "parent_id",
            category
                .parent_category
                .map(|p| p.to_string())
                .unwrap_or_default(),
        )
        .param("created_at", timestamp(&category.created_at))
        .param("updated_at", timestamp(&category.updated_at));

        self.graph.run(q).await?;
        Ok(())
    }

    /// Get a category by ID
    pub async fn get_category(&self, id: Uuid) -> Result<Option<Category>> {
        let q = query("MATCH (c:Category {id: $id}) RETURN c").param("id", id.to_string());
        self.first_category(q).await
    }

    /// Get a category by slug
    pub async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let q = query("MATCH (c:Category {slug: $slug}) RETURN c").param("slug", slug);
        self.first_category(q).await
    }

    pub async fn find_category_conflict(
        &self,
        name: Option<&str>,
        slug: Option<&str>,
        exclude: Option<Uuid>,
    ) -> Result<Option<Category>> {
        let q = query(
            r#"
            MATCH (c:Category)
            WHERE ((($name <> '') AND c.name = $name) OR (($slug <> '') AND c.slug = $slug))
              AND c.id <> $exclude
            RETURN c
            LIMIT 1
            "#,
        )
        .param("name", name.unwrap_or_default())
        .param("slug", slug.unwrap_or_default())
        .param(
            "exclude",
            exclude.map(|id| id.to_string()).unwrap_or_default(),
        );
        self.first_category(q).await
    }

    /// List all categories sorted by name
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let q = query("MATCH (c:Category) RETURN c ORDER BY c.name");
        self.collect_categories(q).await
    }

    pub async fn get_categories_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Category>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let q = query("MATCH (c:Category) WHERE c.id IN $ids RETURN c").param(
            "ids",
            ids.iter().map(|id| id.to_string()).collect::<Vec<_>>(),
        );
        let found = self.collect_categories(q).await?;

        // Preserve caller order
        Ok(ids
            .iter()
            .filter_map(|id| found.iter().find(|c| c.id == *id).cloned())
            .collect())
    }

    pub async fn count_responses_per_category(&self) -> Result<HashMap<Uuid, usize>> {
        let q = query(
            r#"
            MATCH (r:Response)
            UNWIND r.category_ids AS category_id
            RETURN category_id, count(r) AS n
            "#,
        );

        let mut counts = HashMap::new();
        for row in self.execute_with_params(q).await? {
            let id: String = row.get("category_id")?;
            // Dangling or malformed ids are not attributable to any category
            if let Ok(id) = id.parse::<Uuid>() {
                counts.insert(id, row.get::<i64>("n")? as usize);
            }
        }
        Ok(counts)
    }

    pub async fn update_category(&self, category: &Category) -> Result<bool> {
        let q = query(
            r#"
            MATCH (c:Category {id: $id})
            OPTIONAL MATCH (p:Category {id: $parent_id})
            WITH c, collect(p) AS parents
            FOREACH (p IN parents | SET p._lock = true REMOVE p._lock)
            SET c.name = $name,
                c.description = $description,
                c.slug = $slug,
                c.parent_id = $parent_id,
                c.updated_at = $updated_at
            RETURN count(c) AS n
            "#,
        )
        .param("id", category.id.to_string())
        .param("name", category.name.clone())
        .param("description", category.description.clone())
        .param("slug", category.slug.clone())
        .param(
            "parent_id",
            category
                .parent_category
                .map(|p| p.to_string())
                .unwrap_or_default(),
        )
        .param("updated_at", timestamp(&category.updated_at));

        Ok(self.count(q).await? > 0)
    }

    /// Delete a category inside a transaction that first write-locks it.
    ///
    /// Response and child writes lock the categories they reference, so the
    /// counts taken here cannot go stale before the delete commits.
    pub async fn delete_category_guarded(&self, id: Uuid) -> Result<CategoryDeletion> {
        let mut txn = self.graph.start_txn().await?;
        let outcome = Self::guarded_delete_in_txn(&mut txn, &id.to_string()).await;

        match outcome {
            Ok(CategoryDeletion::Deleted) => {
                txn.commit().await?;
                Ok(CategoryDeletion::Deleted)
            }
            Ok(refused) => {
                if let Err(e) = txn.rollback().await {
                    tracing::warn!("Rollback after refused category delete failed: {}", e);
                }
                Ok(refused)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::warn!("Rollback after failed category delete failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    async fn guarded_delete_in_txn(txn: &mut Txn, id: &str) -> Result<CategoryDeletion> {
        let locked = txn_count(
            txn,
            query(
                "MATCH (c:Category {id: $id}) SET c._lock = true REMOVE c._lock RETURN count(c) AS n",
            )
            .param("id", id),
        )
        .await?;
        if locked == 0 {
            return Ok(CategoryDeletion::NotFound);
        }

        let referencing = txn_count(
            txn,
            query("MATCH (r:Response) WHERE $id IN r.category_ids RETURN count(r) AS n")
                .param("id", id),
        )
        .await?;
        if referencing > 0 {
            return Ok(CategoryDeletion::ReferencedByResponses(referencing as usize));
        }

        let children = txn_count(
            txn,
            query("MATCH (c:Category {parent_id: $id}) RETURN count(c) AS n").param("id", id),
        )
        .await?;
        if children > 0 {
            return Ok(CategoryDeletion::HasChildren(children as usize));
        }

        txn.run(query("MATCH (c:Category {id: $id}) DETACH DELETE c").param("id", id))
            .await?;
        Ok(CategoryDeletion::Deleted)
    }

    async fn first_category(&self, q: Query) -> Result<Option<Category>> {
        let mut result = self.graph.execute(q).await?;
        if let Some(row) = result.next().await? {
            let node: neo4rs::Node = row.get("c")?;
            Ok(Some(self.node_to_category(&node)?))
        } else {
            Ok(None)
        }
    }

    async fn collect_categories(&self, q: Query) -> Result<Vec<Category>> {
        let mut categories = Vec::new();
        for row in self.execute_with_params(q).await? {
            let node: neo4rs::Node = row.get("c")?;
            categories.push(self.node_to_category(&node)?);
        }
        Ok(categories)
    }

    /// Helper to convert Neo4j node to Category
    fn node_to_category(&self, node: &neo4rs::Node) -> Result<Category> {
        Ok(Category {
            id: node.get::<String>("id")?.parse()?,
            name: node.get("name")?,
            description: node.get("description")?,
            slug: node.get("slug")?,
            parent_category: optional_string(node, "parent_id")
                .map(|p| p.parse())
                .transpose()?,
            created_at: parse_timestamp(node, "created_at")?,
            updated_at: parse_timestamp(node, "updated_at")?,
        })
    }

    // ========================================================================
    // Response operations
    // ========================================================================

    /// Create a response, locking the categories it references.
    pub async fn create_response(&self, response: &Response) -> Result<()> {
        let q = query(
            r#"
            OPTIONAL MATCH (c:Category) WHERE c.id IN $category_ids
            WITH collect(c) AS cats
            FOREACH (c IN cats | SET c._lock = true REMOVE c._lock)
            CREATE (r:Response {
                id: $id,
                title: $title,
                question: $question,
                answer: $answer,
                excerpt: $excerpt,
                references: $references,
                category_ids: $category_ids,
                tags: $tags,
                author: $author,
                pdf_url: $pdf_url,
                created_at: $created_at,
                updated_at: $updated_at
            })
            "#,
        );
        let q = Self::bind_response(q, response)?
            .param("created_at", timestamp(&response.created_at));

        self.graph.run(q).await?;
        Ok(())
    }

    pub async fn get_response(&self, id: Uuid) -> Result<Option<Response>> {
        let q = query("MATCH (r:Response {id: $id}) RETURN r").param("id", id.to_string());

        let mut result = self.graph.execute(q).await?;
        if let Some(row) = result.next().await? {
            let node: neo4rs::Node = row.get("r")?;
            Ok(Some(self.node_to_response(&node)?))
        } else {
            Ok(None)
        }
    }

    /// Update every mutable field, locking the referenced categories first.
    pub async fn update_response(&self, response: &Response) -> Result<bool> {
        let q = query(
            r#"
            MATCH (r:Response {id: $id})
            OPTIONAL MATCH (c:Category) WHERE c.id IN $category_ids
            WITH r, collect(c) AS cats
            FOREACH (c IN cats | SET c._lock = true REMOVE c._lock)
            SET r.title = $title,
                r.question = $question,
                r.answer = $answer,
                r.excerpt = $excerpt,
                r.references = $references,
                r.category_ids = $category_ids,
                r.tags = $tags,
                r.author = $author,
                r.pdf_url = $pdf_url,
                r.updated_at = $updated_at
            RETURN count(r) AS n
            "#,
        );
        let q = Self::bind_response(q, response)?;

        Ok(self.count(q).await? > 0)
    }

    pub async fn delete_response(&self, id: Uuid) -> Result<bool> {
        let q = query(
            r#"
            MATCH (r:Response {id: $id})
            DETACH DELETE r
            RETURN count(*) AS n
            "#,
        )
        .param("id", id.to_string());

        Ok(self.count(q).await? > 0)
    }

    pub async fn list_responses(&self, filter: &ResponseFilter) -> Result<(Vec<Response>, usize)> {
        let where_clause = r#"
            WHERE ($category = '' OR $category IN r.category_ids)
              AND ($tag = '' OR $tag IN r.tags)
        "#;
        let category = filter.category.map(|c| c.to_string()).unwrap_or_default();
        let tag = filter.tag.clone().unwrap_or_default();

        let count_q = query(&format!(
            "MATCH (r:Response) {} RETURN count(r) AS n",
            where_clause
        ))
        .param("category", category.clone())
        .param("tag", tag.clone());
        let total = self.count(count_q).await? as usize;

        let page_q = query(&format!(
            "MATCH (r:Response) {} RETURN r {} SKIP $skip LIMIT $limit",
            where_clause,
            order_clause(filter.sort)
        ))
        .param("category", category)
        .param("tag", tag)
        .param("skip", cypher_int(filter.skip))
        .param("limit", cypher_int(filter.limit));

        let mut responses = Vec::new();
        for row in self.execute_with_params(page_q).await? {
            let node: neo4rs::Node = row.get("r")?;
            responses.push(self.node_to_response(&node)?);
        }

        Ok((responses, total))
    }

    /// Full-text search backed by the `response_text` index.
    pub async fn search_responses(
        &self,
        search: &str,
        limit: usize,
    ) -> Result<Vec<(Response, f64)>> {
        let q = query(
            r#"
            CALL db.index.fulltext.queryNodes($index, $search)
            YIELD node, score
            RETURN node, score
            ORDER BY score DESC
            LIMIT $limit
            "#,
        )
        .param("index", RESPONSE_FULLTEXT_INDEX)
        .param("search", escape_lucene(search))
        .param("limit", cypher_int(limit));

        let mut hits = Vec::new();
        for row in self.execute_with_params(q).await? {
            let node: neo4rs::Node = row.get("node")?;
            let score: f64 = row.get("score")?;
            hits.push((self.node_to_response(&node)?, score));
        }
        Ok(hits)
    }

    /// Bind the mutable response properties shared by create and update
    fn bind_response(q: Query, response: &Response) -> Result<Query> {
        let references = serde_json::to_string(&response.references)
            .context("Failed to serialize references")?;

        Ok(q.param("id", response.id.to_string())
            .param("title", response.title.clone())
            .param("question", response.question.clone())
            .param("answer", response.answer.clone())
            .param("excerpt", response.excerpt.clone())
            .param("references", references)
            .param(
                "category_ids",
                response
                    .categories
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>(),
            )
            .param("tags", response.tags.clone())
            .param("author", response.author.clone())
            .param("pdf_url", response.pdf_url.clone().unwrap_or_default())
            .param("updated_at", timestamp(&response.updated_at)))
    }

    /// Helper to convert Neo4j node to Response
    fn node_to_response(&self, node: &neo4rs::Node) -> Result<Response> {
        let references: Vec<Reference> = serde_json::from_str(&node.get::<String>("references")?)
            .context("Invalid references JSON on response")?;
        let categories = node
            .get::<Vec<String>>("category_ids")
            .unwrap_or_default()
            .iter()
            .map(|c| c.parse())
            .collect::<std::result::Result<Vec<Uuid>, _>>()?;

        Ok(Response {
            id: node.get::<String>("id")?.parse()?,
            title: node.get("title")?,
            question: node.get("question")?,
            answer: node.get("answer")?,
            excerpt: node.get("excerpt")?,
            references,
            categories,
            tags: node.get::<Vec<String>>("tags").unwrap_or_default(),
            author: node.get("author")?,
            pdf_url: optional_string(node, "pdf_url"),
            created_at: parse_timestamp(node, "created_at")?,
            updated_at: parse_timestamp(node, "updated_at")?,
        })
    }

    // ========================================================================
    // User operations
    // ========================================================================

    pub async fn create_user(&self, user: &User) -> Result<()> {
        let q = query(
            r#"
            CREATE (u:User {
                id: $id,
                name: $name,
                email: $email,
                password_hash: $password_hash,
                role: $role,
                is_active: $is_active,
                last_login: $last_login,
                created_at: $created_at,
                updated_at: $updated_at
            })
            "#,
        );
        let q = Self::bind_user(q, user).param("created_at", timestamp(&user.created_at));

        self.graph.run(q).await?;
        Ok(())
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let q = query("MATCH (u:User {id: $id}) RETURN u").param("id", id.to_string());
        self.first_user(q).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let q = query("MATCH (u:User {email: $email}) RETURN u").param("email", email);
        self.first_user(q).await
    }

    pub async fn update_user(&self, user: &User) -> Result<bool> {
        let q = query(
            r#"
            MATCH (u:User {id: $id})
            SET u.name = $name,
                u.email = $email,
                u.password_hash = $password_hash,
                u.role = $role,
                u.is_active = $is_active,
                u.last_login = $last_login,
                u.updated_at = $updated_at
            RETURN count(u) AS n
            "#,
        );
        let q = Self::bind_user(q, user);

        Ok(self.count(q).await? > 0)
    }

    fn bind_user(q: Query, user: &User) -> Query {
        q.param("id", user.id.to_string())
            .param("name", user.name.clone())
            .param("email", user.email.clone())
            .param("password_hash", user.password_hash.clone())
            .param("role", user.role.to_string())
            .param("is_active", user.is_active)
            .param(
                "last_login",
                user.last_login.as_ref().map(timestamp).unwrap_or_default(),
            )
            .param("updated_at", timestamp(&user.updated_at))
    }

    async fn first_user(&self, q: Query) -> Result<Option<User>> {
        let mut result = self.graph.execute(q).await?;
        if let Some(row) = result.next().await? {
            let node: neo4rs::Node = row.get("u")?;
            Ok(Some(self.node_to_user(&node)?))
        } else {
            Ok(None)
        }
    }

    /// Helper to convert Neo4j node to User
    fn node_to_user(&self, node: &neo4rs::Node) -> Result<User> {
        let role: Role = node
            .get::<String>("role")?
            .parse()
            .map_err(|e: String| anyhow!(e))?;

        Ok(User {
            id: node.get::<String>("id")?.parse()?,
            name: node.get("name")?,
            email: node.get("email")?,
            password_hash: node.get("password_hash")?,
            role,
            is_active: node.get("is_active")?,
            last_login: optional_string(node, "last_login")
                .map(|s| s.parse())
                .transpose()
                .context("Invalid last_login timestamp")?,
            created_at: parse_timestamp(node, "created_at")?,
            updated_at: parse_timestamp(node, "updated_at")?,
        })
    }
}
