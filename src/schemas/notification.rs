use serde::Serialize;

use crate::core::time::format_primitive;
use crate::db::models::Notification;
use crate::db::types::NotificationKind;

#[derive(Debug, Serialize)]
pub(crate) struct NotificationResponse {
    pub(crate) id: String,
    pub(crate) message: String,
    pub(crate) kind: NotificationKind,
    pub(crate) link: Option<String>,
    pub(crate) is_read: bool,
    pub(crate) created_at: String,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id,
            message: notification.message,
            kind: notification.kind,
            link: notification.link,
            is_read: notification.is_read,
            created_at: format_primitive(notification.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct NotificationListResponse {
    pub(crate) notifications: Vec<NotificationResponse>,
    pub(crate) unread_count: i64,
}
