// libs/notification-cell/src/services/notification.rs
use anyhow::Result;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Notification, NotificationListQuery};

/// Every query is pinned to one recipient; users only ever see their own notifications.
pub struct NotificationService {
    supabase: SupabaseClient,
}

impl NotificationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_notifications(
        &self,
        recipient_id: Uuid,
        query: &NotificationListQuery,
        auth_token: &str,
    ) -> Result<Vec<Notification>> {
        let mut path = format!("/rest/v1/notifications?recipient_id=eq.{}", recipient_id);

        if let Some(is_read) = query.is_read {
            path.push_str(&format!("&is_read=eq.{}", is_read));
        }
        if let Some(kind) = query.notification_type {
            path.push_str(&format!("&notification_type=eq.{}", kind.as_str()));
        }
        path.push_str("&order=created_at.desc");

        debug!("Fetching notifications for {}", recipient_id);

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let notifications = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Notification>, _>>()?;

        Ok(notifications)
    }

    pub async fn unread_notifications(
        &self,
        recipient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Notification>> {
        let query = NotificationListQuery {
            is_read: Some(false),
            notification_type: None,
        };
        self.list_notifications(recipient_id, &query, auth_token).await
    }

    /// `None` when no such notification belongs to the recipient.
    pub async fn get_notification(
        &self,
        recipient_id: Uuid,
        notification_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<Notification>> {
        let path = format!(
            "/rest/v1/notifications?id=eq.{}&recipient_id=eq.{}",
            notification_id, recipient_id
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        match result.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    /// `None` when no such notification belongs to the recipient.
    pub async fn mark_read(
        &self,
        recipient_id: Uuid,
        notification_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<Notification>> {
        let path = format!(
            "/rest/v1/notifications?id=eq.{}&recipient_id=eq.{}",
            notification_id, recipient_id
        );

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(json!({ "is_read": true })),
            Some(SupabaseClient::return_representation()),
        ).await?;

        match result.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    /// Returns how many notifications changed.
    pub async fn mark_all_read(&self, recipient_id: Uuid, auth_token: &str) -> Result<usize> {
        let path = format!(
            "/rest/v1/notifications?recipient_id=eq.{}&is_read=eq.false",
            recipient_id
        );

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(json!({ "is_read": true })),
            Some(SupabaseClient::return_representation()),
        ).await?;

        info!("Marked {} notifications read for {}", result.len(), recipient_id);
        Ok(result.len())
    }

    /// Returns whether a notification was removed.
    pub async fn delete_notification(
        &self,
        recipient_id: Uuid,
        notification_id: Uuid,
        auth_token: &str,
    ) -> Result<bool> {
        let path = format!(
            "/rest/v1/notifications?id=eq.{}&recipient_id=eq.{}",
            notification_id, recipient_id
        );

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
            Some(SupabaseClient::return_representation()),
        ).await?;

        Ok(!result.is_empty())
    }
}
