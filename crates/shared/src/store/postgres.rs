//! Postgres store backends

use async_trait::async_trait;
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{AdminStore, QuestionStore};
use crate::admin::{Admin, LoginHistoryEntry, NewAdmin};
use crate::error::StoreResult;
use crate::lockout::{LockState, LOCKOUT_DURATION, LOGIN_HISTORY_CAP, MAX_LOGIN_ATTEMPTS};
use crate::question::{NewQuestion, Question};

/// Database row for the admins table
#[derive(Debug, FromRow)]
struct AdminRow {
    id: Uuid,
    email: String,
    password_hash: String,
    login_attempts: i32,
    lock_until: Option<OffsetDateTime>,
    last_login: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
}

impl AdminRow {
    fn into_admin(self, login_history: Vec<LoginHistoryEntry>) -> Admin {
        Admin {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
            login_attempts: self.login_attempts,
            lock_until: self.lock_until,
            last_login: self.last_login,
            login_history,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    attempted_at: OffsetDateTime,
    ip: String,
    user_agent: Option<String>,
    success: bool,
}

#[derive(Debug, FromRow)]
struct LockStateRow {
    login_attempts: i32,
    lock_until: Option<OffsetDateTime>,
}

#[derive(Clone)]
pub struct PgAdminStore {
    pool: PgPool,
}

impl PgAdminStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_history(&self, admin_id: Uuid) -> StoreResult<Vec<LoginHistoryEntry>> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            r#"
            SELECT attempted_at, ip, user_agent, success
            FROM admin_login_history
            WHERE admin_id = $1
            ORDER BY attempted_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(admin_id)
        .bind(LOGIN_HISTORY_CAP as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| LoginHistoryEntry::new(r.attempted_at, r.ip, r.user_agent, r.success))
            .collect())
    }

    async fn hydrate(&self, row: Option<AdminRow>) -> StoreResult<Option<Admin>> {
        match row {
            Some(row) => {
                let history = self.load_history(row.id).await?;
                Ok(Some(row.into_admin(history)))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl AdminStore for PgAdminStore {
    async fn count_admins(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Admin>> {
        let row: Option<AdminRow> = sqlx::query_as(
            r#"
            SELECT id, email, password_hash, login_attempts, lock_until, last_login, created_at
            FROM admins
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        self.hydrate(row).await
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Admin>> {
        let row: Option<AdminRow> = sqlx::query_as(
            r#"
            SELECT id, email, password_hash, login_attempts, lock_until, last_login, created_at
            FROM admins
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        self.hydrate(row).await
    }

    async fn create_first_admin(
        &self,
        new: NewAdmin,
        now: OffsetDateTime,
    ) -> StoreResult<Option<Admin>> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent bootstrap attempts; readers are not blocked
        sqlx::query("LOCK TABLE admins IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
            .fetch_one(&mut *tx)
            .await?;
        if existing > 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let admin = Admin::from_new(new, now);
        sqlx::query(
            r#"
            INSERT INTO admins (id, email, password_hash, login_attempts, created_at, updated_at)
            VALUES ($1, $2, $3, 0, $4, $4)
            "#,
        )
        .bind(admin.id)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(admin.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(admin))
    }

    async fn apply_failed_attempt(
        &self,
        id: Uuid,
        now: OffsetDateTime,
    ) -> StoreResult<Option<LockState>> {
        // Same transitions as LockState::after_failure, evaluated in one
        // statement against the pre-update row.
        let row: Option<LockStateRow> = sqlx::query_as(
            r#"
            UPDATE admins
            SET login_attempts = CASE
                    WHEN lock_until IS NOT NULL AND lock_until <= $2::timestamptz THEN 1
                    ELSE login_attempts + 1
                END,
                lock_until = CASE
                    WHEN lock_until IS NOT NULL AND lock_until <= $2::timestamptz THEN NULL
                    WHEN lock_until IS NULL AND login_attempts + 1 >= $3 THEN $4::timestamptz
                    ELSE lock_until
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING login_attempts, lock_until
            "#,
        )
        .bind(id)
        .bind(now)
        .bind(MAX_LOGIN_ATTEMPTS)
        .bind(now + LOCKOUT_DURATION)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| LockState::new(r.login_attempts, r.lock_until)))
    }

    async fn reset_attempts(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE admins
            SET login_attempts = 0, lock_until = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_last_login(&self, id: Uuid, at: OffsetDateTime) -> StoreResult<()> {
        sqlx::query("UPDATE admins SET last_login = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn append_history(&self, id: Uuid, entry: LoginHistoryEntry) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO admin_login_history (admin_id, attempted_at, ip, user_agent, success)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(entry.timestamp)
        .bind(&entry.ip)
        .bind(&entry.user_agent)
        .bind(entry.success)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM admin_login_history
            WHERE admin_id = $1
              AND id NOT IN (
                SELECT id FROM admin_login_history
                WHERE admin_id = $1
                ORDER BY attempted_at DESC, id DESC
                LIMIT $2
              )
            "#,
        )
        .bind(id)
        .bind(LOGIN_HISTORY_CAP as i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Database row for the questions table
#[derive(Debug, FromRow)]
struct QuestionRow {
    id: Uuid,
    question: String,
    options: Json<Vec<String>>,
    correct_answer: Option<i32>,
    created_at: OffsetDateTime,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Self {
            id: row.id,
            question: row.question,
            options: row.options.0,
            correct_answer: row.correct_answer,
            created_at: row.created_at,
        }
    }
}

#[derive(Clone)]
pub struct PgQuestionStore {
    pool: PgPool,
}

impl PgQuestionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuestionStore for PgQuestionStore {
    async fn list(&self) -> StoreResult<Vec<Question>> {
        let rows: Vec<QuestionRow> = sqlx::query_as(
            "SELECT id, question, options, correct_answer, created_at FROM questions ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Question::from).collect())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Question>> {
        let row: Option<QuestionRow> = sqlx::query_as(
            "SELECT id, question, options, correct_answer, created_at FROM questions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Question::from))
    }

    async fn create(&self, new: NewQuestion, now: OffsetDateTime) -> StoreResult<Question> {
        let question = Question::from_new(new, now);
        sqlx::query(
            r#"
            INSERT INTO questions (id, question, options, correct_answer, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(question.id)
        .bind(&question.question)
        .bind(Json(&question.options))
        .bind(question.correct_answer)
        .bind(question.created_at)
        .execute(&self.pool)
        .await?;
        Ok(question)
    }
}
