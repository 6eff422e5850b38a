//! SQLite-backed record store

use async_trait::async_trait;
use roster_core::{
    storage_error, NewPrincipal, NewStudent, Principal, PrincipalStore, RosterResult, StoreError,
    StoreResult, Student, StudentStore, StudentUpdate,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, error, info};

/// Database user record
#[derive(Debug, sqlx::FromRow)]
struct PrincipalRecord {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    role: String,
}

impl TryFrom<PrincipalRecord> for Principal {
    type Error = StoreError;

    fn try_from(record: PrincipalRecord) -> Result<Self, Self::Error> {
        let role = record.role.parse().map_err(|e: String| {
            error!(principal_id = record.id, "Stored role is invalid: {}", e);
            StoreError::Corrupt(e)
        })?;

        Ok(Principal {
            id: record.id,
            username: record.username,
            email: record.email,
            password_hash: record.password_hash,
            role,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StudentRecord {
    id: i64,
    name: String,
    email: String,
    age: Option<i32>,
    grade: Option<String>,
}

impl From<StudentRecord> for Student {
    fn from(record: StudentRecord) -> Self {
        Student {
            id: record.id,
            name: record.name,
            email: record.email,
            age: record.age,
            grade: record.grade,
        }
    }
}

/// Translate driver errors; unique-constraint hits become [`StoreError::Duplicate`]
fn map_sqlx_error(operation: &str, e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let field = if db_err.message().contains("email") {
                "email"
            } else {
                "username"
            };
            return StoreError::Duplicate {
                field: field.to_string(),
            };
        }
    }

    error!("Database operation '{}' failed: {}", operation, e);
    StoreError::Unavailable(e.to_string())
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Principals and students stored in SQLite
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open the database at `database_url`, creating file and tables as needed
    pub async fn connect(database_url: &str) -> RosterResult<Self> {
        info!("Connecting to database: {}", database_url);

        let pool = if is_memory_url(database_url) {
            // Every connection to `:memory:` is a separate database; keep exactly one alive
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(database_url)
                .await
        } else {
            let options = SqliteConnectOptions::from_str(database_url)
                .map_err(|e| storage_error!("database", "parse url", "Invalid database URL", e))?
                .create_if_missing(true);

            if let Some(parent) = options.get_filename().parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    info!("Creating parent directory: {}", parent.display());
                    std::fs::create_dir_all(parent)?;
                }
            }

            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await
        }
        .map_err(|e| {
            storage_error!("database", "connect", "Failed to connect to database", e)
        })?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating tables if missing
    pub async fn from_pool(pool: SqlitePool) -> RosterResult<Self> {
        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create_tables(&self) -> RosterResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user'
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            storage_error!("database", "create users table", "Failed to create users table", e)
        })?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS students (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                age INTEGER,
                grade TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            storage_error!("database", "create students table", "Failed to create students table", e)
        })?;

        debug!("Database tables ready");
        Ok(())
    }

    async fn find_principal(&self, column: &str, value: &str) -> StoreResult<Option<Principal>> {
        // `column` is only ever one of the fixed names passed by the trait methods
        let query = format!(
            "SELECT id, username, email, password_hash, role FROM users WHERE {} = ?",
            column
        );

        sqlx::query_as::<_, PrincipalRecord>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find principal", e))?
            .map(Principal::try_from)
            .transpose()
    }
}

#[async_trait]
impl PrincipalStore for SqliteStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Principal>> {
        sqlx::query_as::<_, PrincipalRecord>(
            "SELECT id, username, email, password_hash, role FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find principal by id", e))?
        .map(Principal::try_from)
        .transpose()
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Principal>> {
        self.find_principal("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Principal>> {
        self.find_principal("email", email).await
    }

    async fn insert(&self, principal: NewPrincipal) -> StoreResult<Principal> {
        let id = sqlx::query(
            "INSERT INTO users (username, email, password_hash, role) VALUES (?, ?, ?, ?)",
        )
        .bind(&principal.username)
        .bind(&principal.email)
        .bind(&principal.password_hash)
        .bind(principal.role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert principal", e))?
        .last_insert_rowid();

        debug!(principal_id = id, "User inserted: {}", principal.username);
        Ok(principal.with_id(id))
    }
}

#[async_trait]
impl StudentStore for SqliteStore {
    async fn create(&self, student: NewStudent) -> StoreResult<Student> {
        let id = sqlx::query("INSERT INTO students (name, email, age, grade) VALUES (?, ?, ?, ?)")
            .bind(&student.name)
            .bind(&student.email)
            .bind(student.age)
            .bind(&student.grade)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("create student", e))?
            .last_insert_rowid();

        Ok(student.with_id(id))
    }

    async fn list(&self) -> StoreResult<Vec<Student>> {
        let records = sqlx::query_as::<_, StudentRecord>(
            "SELECT id, name, email, age, grade FROM students ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list students", e))?;

        Ok(records.into_iter().map(Student::from).collect())
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Student>> {
        let record = sqlx::query_as::<_, StudentRecord>(
            "SELECT id, name, email, age, grade FROM students WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get student", e))?;

        Ok(record.map(Student::from))
    }

    async fn update(&self, id: i64, update: StudentUpdate) -> StoreResult<Option<Student>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin update", e))?;

        let record = sqlx::query_as::<_, StudentRecord>(
            "SELECT id, name, email, age, grade FROM students WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("load student for update", e))?;

        let Some(record) = record else {
            return Ok(None);
        };

        let mut student = Student::from(record);
        update.apply(&mut student);

        sqlx::query("UPDATE students SET name = ?, email = ?, age = ?, grade = ? WHERE id = ?")
            .bind(&student.name)
            .bind(&student.email)
            .bind(student.age)
            .bind(&student.grade)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update student", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit update", e))?;

        Ok(Some(student))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM students WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete student", e))?;

        Ok(result.rows_affected() > 0)
    }
}
