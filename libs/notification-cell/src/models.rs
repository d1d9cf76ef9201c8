// libs/notification-cell/src/models.rs
use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub related_object_id: Option<Uuid>,
    pub related_object_type: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Appointment,
    Message,
    Exercise,
    System,
}

impl NotificationType {
    pub const ALL: [NotificationType; 4] = [
        NotificationType::Appointment,
        NotificationType::Message,
        NotificationType::Exercise,
        NotificationType::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Appointment => "appointment",
            NotificationType::Message => "message",
            NotificationType::Exercise => "exercise",
            NotificationType::System => "system",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationListQuery {
    pub is_read: Option<bool>,
    #[serde(rename = "type")]
    pub notification_type: Option<NotificationType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationStats {
    pub total: usize,
    pub unread: usize,
    pub read: usize,
    pub recent_week: usize,
    pub by_type: BTreeMap<String, usize>,
}

impl NotificationStats {
    pub fn from_notifications(notifications: &[Notification], now: DateTime<Utc>) -> Self {
        let week_ago = now - Duration::days(7);
        let unread = notifications.iter().filter(|n| !n.is_read).count();

        let by_type = NotificationType::ALL
            .iter()
            .map(|kind| {
                let count = notifications
                    .iter()
                    .filter(|n| n.notification_type == *kind)
                    .count();
                (kind.as_str().to_string(), count)
            })
            .collect();

        Self {
            total: notifications.len(),
            unread,
            read: notifications.len() - unread,
            recent_week: notifications.iter().filter(|n| n.created_at >= week_ago).count(),
            by_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(kind: NotificationType, is_read: bool, age_days: i64, now: DateTime<Utc>) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            recipient_id: Uuid::new_v4(),
            notification_type: kind,
            title: "t".to_string(),
            message: "m".to_string(),
            related_object_id: None,
            related_object_type: None,
            is_read,
            created_at: now - Duration::days(age_days),
        }
    }

    #[test]
    fn test_stats_breakdown() {
        let now = Utc::now();
        let notifications = vec![
            notification(NotificationType::Appointment, false, 1, now),
            notification(NotificationType::Appointment, true, 10, now),
            notification(NotificationType::Exercise, false, 3, now),
        ];

        let stats = NotificationStats::from_notifications(&notifications, now);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.unread, 2);
        assert_eq!(stats.read, 1);
        assert_eq!(stats.recent_week, 2);
        assert_eq!(stats.by_type["appointment"], 2);
        assert_eq!(stats.by_type["message"], 0);
        assert_eq!(stats.by_type["exercise"], 1);
    }
}
