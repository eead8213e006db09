use std::collections::HashMap;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rand::{rngs::OsRng, TryRngCore};
use serde::Serialize;
use tokio::sync::Mutex;

const OBJECT_ID_BYTES: usize = 12;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub phone_no: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub salt: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub id: String,
    pub user_id: String,
    pub media_id: i64,
    pub media_title: String,
    pub media_poster: Option<String>,
    pub showtime: String,
    pub theater: String,
    pub language: Option<String>,
    pub format: Option<String>,
    pub booking_date: NaiveDate,
    pub seats: Vec<String>,
    pub total_price: u32,
    pub created_at: DateTime<Utc>,
}

pub fn new_object_id() -> Result<String> {
    let mut bytes = [0u8; OBJECT_ID_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| anyhow!("Failed to generate id: {e}"))?;
    Ok(hex::encode(bytes))
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: UserRecord) -> Result<()>;
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>>;
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>>;
    async fn update_credentials(&self, id: &str, password_hash: &str, salt: &str) -> Result<bool>;
    async fn remove_user(&self, id: &str) -> Result<bool>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert_booking(&self, booking: BookingRecord) -> Result<()>;
    async fn bookings_for_user(&self, user_id: &str) -> Result<Vec<BookingRecord>>;
    async fn remove_booking(&self, user_id: &str, booking_id: &str) -> Result<bool>;
    async fn remove_bookings_for_user(&self, user_id: &str) -> Result<usize>;
}

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, UserRecord>>,
    bookings: Mutex<HashMap<String, BookingRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: UserRecord) -> Result<()> {
        let mut users = self.users.lock().await;
        if users.values().any(|u| u.username == user.username) {
            bail!("username {} already exists", user.username);
        }
        users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let users = self.users.lock().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        let users = self.users.lock().await;
        Ok(users.get(id).cloned())
    }

    async fn update_credentials(&self, id: &str, password_hash: &str, salt: &str) -> Result<bool> {
        let mut users = self.users.lock().await;
        let Some(user) = users.get_mut(id) else {
            return Ok(false);
        };
        user.password_hash = password_hash.to_string();
        user.salt = salt.to_string();
        Ok(true)
    }

    async fn remove_user(&self, id: &str) -> Result<bool> {
        let mut users = self.users.lock().await;
        Ok(users.remove(id).is_some())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert_booking(&self, booking: BookingRecord) -> Result<()> {
        let mut bookings = self.bookings.lock().await;
        bookings.insert(booking.id.clone(), booking);
        Ok(())
    }

    async fn bookings_for_user(&self, user_id: &str) -> Result<Vec<BookingRecord>> {
        let bookings = self.bookings.lock().await;
        let mut rows: Vec<BookingRecord> = bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        // Newest first; map iteration order is arbitrary.
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn remove_booking(&self, user_id: &str, booking_id: &str) -> Result<bool> {
        let mut bookings = self.bookings.lock().await;
        match bookings.get(booking_id) {
            Some(b) if b.user_id == user_id => {
                bookings.remove(booking_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove_bookings_for_user(&self, user_id: &str) -> Result<usize> {
        let mut bookings = self.bookings.lock().await;
        let before = bookings.len();
        bookings.retain(|_, b| b.user_id != user_id);
        Ok(before - bookings.len())
    }
}
