use sqlx::MySqlPool;
use tracing::warn;

/// Records lifecycle hints (clock-in accepted, clock-out accepted) as
/// notification rows. Delivery failures are logged and dropped; they must
/// never fail or roll back the attendance transition that produced them.
#[derive(Clone)]
pub struct Notifier {
    pool: MySqlPool,
}

impl Notifier {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, user_id: u64, title: &str, message: &str) {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (user_id, title, message)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(message)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!(error = %e, user_id, title, "failed to record notification");
        }
    }
}
