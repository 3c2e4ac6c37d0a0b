//! Clock and fixtures shared by the service tests.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;

use crate::config::LuckyDrawSettings;
use crate::models::{CreateRaffleRequest, User};
use crate::services::LuckyDraw;
use crate::store::MemoryStore;

pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    pub fn advance(&self, delta: Duration) {
        *self.lock_clock() += delta;
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

pub fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

pub const ADMIN_EMAIL: &str = "admin@example.com";

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<MutableClock>,
    pub lucky_draw: LuckyDraw,
    pub admin: User,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(LuckyDrawSettings::default())
    }

    /// Same fixtures with custom rules; the fixture admin is always added.
    pub fn with_settings(mut settings: LuckyDrawSettings) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(MutableClock::new(fixture_timestamp()));
        settings.admins.push(ADMIN_EMAIL.to_string());
        let lucky_draw = LuckyDraw::new(store.clone(), clock.clone(), settings);
        let admin = store.add_user("Admin", ADMIN_EMAIL);

        Self {
            store,
            clock,
            lucky_draw,
            admin,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    /// Creates a raffle whose window is expressed relative to the current
    /// fixture time.
    pub async fn raffle(&self, title: &str, starts_in: Duration, closes_in: Duration) -> i64 {
        let now = self.now();
        self.lucky_draw
            .create_raffle(
                &self.admin,
                CreateRaffleRequest {
                    title: Some(title.to_string()),
                    prize: Some(format!("{title} prize")),
                    start_time: Some(now + starts_in),
                    closing_time: Some(now + closes_in),
                    ..CreateRaffleRequest::default()
                },
            )
            .await
            .expect("fixture raffle is valid")
    }

    /// Registers a user holding one fresh ticket.
    pub async fn user_with_ticket(&self, name: &str) -> User {
        let user = self
            .store
            .add_user(name, &format!("{}@example.com", name.to_lowercase()));
        self.lucky_draw
            .draw_ticket(user.id)
            .await
            .expect("ticket drawn");
        user
    }
}
