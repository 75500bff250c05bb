//! Controller de notificaciones

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::notification::Notification;
use crate::repositories::notification_repository::NotificationRepository;
use crate::utils::errors::AppError;

const RECENT_LIMIT: i64 = 50;

pub struct NotificationController {
    repository: NotificationRepository,
}

impl NotificationController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: NotificationRepository::new(pool),
        }
    }

    pub async fn list_recent(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError> {
        self.repository.recent_for_user(user_id, RECENT_LIMIT).await
    }
}
