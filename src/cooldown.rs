use std::{collections::HashMap, time::Duration};

use poise::serenity_prelude::UserId;
use time::{Date, OffsetDateTime, UtcOffset};
use tokio::sync::Mutex;

/// Entries idle for longer than this are dropped by [`Cooldowns::prune`].
/// Cooldown overrides are capped to the same value.
pub const MAX_TRACKED_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// The effective limits for one guild.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    pub cooldown: Duration,
    /// Lookups allowed per user per UTC day. `0` means unlimited.
    pub daily_limit: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    Cooldown { remaining_secs: u64 },
    DailyLimit { limit: u32 },
}

#[derive(Clone, Copy, Debug)]
struct Usage {
    last_used: OffsetDateTime,
    day: Date,
    count: u32,
}

/// Per-user invocation tracking for the `info` command.
#[derive(Default)]
pub struct Cooldowns {
    users: Mutex<HashMap<UserId, Usage>>,
}

impl Cooldowns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an invocation at `now` unless the user is still cooling down
    /// or has used up today's allowance.
    pub async fn check_and_record(
        &self,
        user: UserId,
        now: OffsetDateTime,
        limits: Limits,
    ) -> Result<(), Rejection> {
        let today = now.to_offset(UtcOffset::UTC).date();
        let mut users = self.users.lock().await;

        if let Some(usage) = users.get(&user) {
            let elapsed = (now - usage.last_used).whole_seconds().max(0) as u64;
            let cooldown = limits.cooldown.as_secs();

            if elapsed < cooldown {
                return Err(Rejection::Cooldown {
                    remaining_secs: cooldown - elapsed,
                });
            }

            if limits.daily_limit > 0 && usage.day == today && usage.count >= limits.daily_limit {
                return Err(Rejection::DailyLimit {
                    limit: limits.daily_limit,
                });
            }
        }

        let usage = users.entry(user).or_insert(Usage {
            last_used: now,
            day: today,
            count: 0,
        });

        if usage.day != today {
            usage.day = today;
            usage.count = 0;
        }

        usage.last_used = now;
        usage.count = usage.count.saturating_add(1);

        Ok(())
    }

    /// Drops users that haven't invoked anything within [`MAX_TRACKED_AGE`].
    /// Returns how many entries were removed.
    pub async fn prune(&self, now: OffsetDateTime) -> usize {
        let mut users = self.users.lock().await;
        let before = users.len();

        users.retain(|_, usage| (now - usage.last_used) < MAX_TRACKED_AGE);

        before - users.len()
    }

    pub async fn tracked_users(&self) -> usize {
        self.users.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn limits(cooldown_secs: u64, daily_limit: u32) -> Limits {
        Limits {
            cooldown: Duration::from_secs(cooldown_secs),
            daily_limit,
        }
    }

    #[tokio::test]
    async fn first_use_is_allowed() {
        let cooldowns = Cooldowns::new();
        let now = datetime!(2026-10-19 12:00:00 UTC);

        assert_eq!(
            cooldowns
                .check_and_record(UserId::new(1), now, limits(30, 30))
                .await,
            Ok(())
        );
        assert_eq!(cooldowns.tracked_users().await, 1);
    }

    #[tokio::test]
    async fn reports_remaining_whole_seconds() {
        let cooldowns = Cooldowns::new();
        let user = UserId::new(1);
        let start = datetime!(2026-10-19 12:00:00 UTC);

        cooldowns
            .check_and_record(user, start, limits(30, 0))
            .await
            .unwrap();

        let result = cooldowns
            .check_and_record(user, datetime!(2026-10-19 12:00:12.700 UTC), limits(30, 0))
            .await;
        assert_eq!(result, Err(Rejection::Cooldown { remaining_secs: 18 }));

        let result = cooldowns
            .check_and_record(user, datetime!(2026-10-19 12:00:30 UTC), limits(30, 0))
            .await;
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn rejected_attempts_do_not_extend_the_cooldown() {
        let cooldowns = Cooldowns::new();
        let user = UserId::new(7);

        cooldowns
            .check_and_record(user, datetime!(2026-10-19 12:00:00 UTC), limits(10, 0))
            .await
            .unwrap();
        assert!(cooldowns
            .check_and_record(user, datetime!(2026-10-19 12:00:09 UTC), limits(10, 0))
            .await
            .is_err());
        assert!(cooldowns
            .check_and_record(user, datetime!(2026-10-19 12:00:10 UTC), limits(10, 0))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn users_are_tracked_independently() {
        let cooldowns = Cooldowns::new();
        let now = datetime!(2026-10-19 12:00:00 UTC);

        cooldowns
            .check_and_record(UserId::new(1), now, limits(30, 0))
            .await
            .unwrap();

        assert_eq!(
            cooldowns
                .check_and_record(UserId::new(2), now, limits(30, 0))
                .await,
            Ok(())
        );
    }

    #[tokio::test]
    async fn zero_cooldown_never_blocks() {
        let cooldowns = Cooldowns::new();
        let user = UserId::new(1);
        let now = datetime!(2026-10-19 12:00:00 UTC);

        for _ in 0..5 {
            assert_eq!(
                cooldowns.check_and_record(user, now, limits(0, 0)).await,
                Ok(())
            );
        }
    }

    #[tokio::test]
    async fn daily_limit_resets_on_a_new_utc_day() {
        let cooldowns = Cooldowns::new();
        let user = UserId::new(1);

        for minute in 0..3u8 {
            let now = datetime!(2026-10-19 23:00:00 UTC).replace_minute(minute).unwrap();
            cooldowns
                .check_and_record(user, now, limits(0, 3))
                .await
                .unwrap();
        }

        let result = cooldowns
            .check_and_record(user, datetime!(2026-10-19 23:59:59 UTC), limits(0, 3))
            .await;
        assert_eq!(result, Err(Rejection::DailyLimit { limit: 3 }));

        let result = cooldowns
            .check_and_record(user, datetime!(2026-10-20 00:00:00 UTC), limits(0, 3))
            .await;
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn daily_limit_uses_utc_days_for_offset_times() {
        let cooldowns = Cooldowns::new();
        let user = UserId::new(1);

        cooldowns
            .check_and_record(user, datetime!(2026-10-19 23:30:00 UTC), limits(0, 1))
            .await
            .unwrap();

        // 01:40 at +2 is still 23:40 on the 19th in UTC.
        let result = cooldowns
            .check_and_record(user, datetime!(2026-10-20 01:40:00 +2), limits(0, 1))
            .await;
        assert_eq!(result, Err(Rejection::DailyLimit { limit: 1 }));
    }

    #[tokio::test]
    async fn prune_drops_stale_users() {
        let cooldowns = Cooldowns::new();

        cooldowns
            .check_and_record(UserId::new(1), datetime!(2026-10-18 08:00:00 UTC), limits(30, 0))
            .await
            .unwrap();
        cooldowns
            .check_and_record(UserId::new(2), datetime!(2026-10-19 11:00:00 UTC), limits(30, 0))
            .await
            .unwrap();

        let pruned = cooldowns.prune(datetime!(2026-10-19 12:00:00 UTC)).await;

        assert_eq!(pruned, 1);
        assert_eq!(cooldowns.tracked_users().await, 1);
    }
}
