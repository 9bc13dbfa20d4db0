//! Daily trigger loop.
//!
//! The first run is aimed at the next occurrence of the configured local time;
//! after that the loop sleeps a fixed period after each run completes, so
//! run time and clock drift accumulate.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use crate::clock::Clock;
use crate::config::ScheduleConfig;
use crate::event::{AppEvent, SchedulerState};

pub const DAILY_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Work triggered on every tick. Failures must be handled inside.
#[async_trait]
pub trait DailyJob: Send + Sync {
    async fn run(&self);
}

#[derive(Debug, Clone, Copy)]
pub struct DailySchedule {
    tz: Tz,
    at: NaiveTime,
}

impl DailySchedule {
    pub fn new(tz: Tz, at: NaiveTime) -> Self {
        Self { tz, at }
    }

    pub fn from_config(config: &ScheduleConfig) -> Result<Self> {
        Ok(Self::new(config.tz()?, config.time_of_day()?))
    }

    fn local_target(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        self.tz
            .from_local_datetime(&date.and_time(self.at))
            .earliest()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Today's target if it has not passed yet, otherwise the next day's.
    pub fn next_target(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut date = now.with_timezone(&self.tz).date_naive();
        // A local time can be skipped by a DST jump; try the following days.
        for _ in 0..3 {
            if let Some(target) = self.local_target(date) {
                if now <= target {
                    return target;
                }
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        now + to_chrono(DAILY_PERIOD)
    }

    pub fn delay_until_next(&self, now: DateTime<Utc>) -> Duration {
        (self.next_target(now) - now).to_std().unwrap_or(Duration::ZERO)
    }
}

pub struct DailyScheduler {
    schedule: DailySchedule,
    clock: Arc<dyn Clock>,
    period: Duration,
}

impl DailyScheduler {
    pub fn new(schedule: DailySchedule, clock: Arc<dyn Clock>) -> Self {
        Self {
            schedule,
            clock,
            period: DAILY_PERIOD,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Run until `shutdown` flips to true or its sender is dropped.
    pub async fn run(
        &self,
        job: Arc<dyn DailyJob>,
        events: mpsc::Sender<AppEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let _ = events.send(AppEvent::Scheduler(SchedulerState::Idle)).await;

        let now = self.clock.now();
        let mut delay = self.schedule.delay_until_next(now);
        let mut until = now + to_chrono(delay);

        loop {
            tracing::info!(next_run = %until, delay_secs = delay.as_secs(), "daily update scheduled");
            let _ = events
                .send(AppEvent::Scheduler(SchedulerState::Waiting { until }))
                .await;

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = wait_for_shutdown(&mut shutdown) => {
                    tracing::info!("scheduler shutting down");
                    let _ = events.send(AppEvent::Scheduler(SchedulerState::Stopped)).await;
                    return;
                }
            }

            let _ = events.send(AppEvent::Scheduler(SchedulerState::Running)).await;
            let started = tokio::time::Instant::now();
            job.run().await;
            let elapsed_ms = started.elapsed().as_millis() as u64;
            tracing::info!(elapsed_ms, "daily update finished");
            let _ = events
                .send(AppEvent::DailyUpdateCompleted { elapsed_ms })
                .await;

            delay = self.period;
            until = self.clock.now() + to_chrono(delay);
        }
    }
}

fn to_chrono(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or_else(|_| chrono::Duration::zero())
}

async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;

    fn schedule() -> DailySchedule {
        DailySchedule::new(New_York, NaiveTime::from_hms_opt(7, 30, 0).unwrap())
    }

    fn ny(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        New_York
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .single()
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn before_target_waits_until_today() {
        let now = ny(2025, 1, 15, 6, 0);
        assert_eq!(schedule().delay_until_next(now), Duration::from_secs(90 * 60));
    }

    #[test]
    fn exactly_at_target_fires_now() {
        let now = ny(2025, 1, 15, 7, 30);
        assert_eq!(schedule().delay_until_next(now), Duration::ZERO);
    }

    #[test]
    fn spring_forward_day_is_23_hours_apart() {
        // 2025-03-09 clocks jump 02:00 -> 03:00 in New York.
        let now = ny(2025, 3, 8, 7, 31);
        let target = schedule().next_target(now);
        assert_eq!(target, ny(2025, 3, 9, 7, 30));
        assert_eq!(
            schedule().delay_until_next(now),
            Duration::from_secs(23 * 3600 - 60)
        );
    }
}
