//! Delivery statistics shapes and the fold that builds them.
//!
//! Stores return grouped [`StatusCountRow`]s; [`NotificationStats::from_rows`]
//! turns them into totals, breakdowns and the trailing daily histogram so
//! every backend produces identical output.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::{NotificationChannel, NotificationStatus, NotificationType};

/// Number of calendar days in the trailing histogram, today included.
pub const HISTOGRAM_DAYS: i64 = 7;

/// One grouped count: how many records share a channel, type, status and local day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StatusCountRow {
    /// Channel.
    pub channel: NotificationChannel,
    /// Notification type.
    pub notification_type: NotificationType,
    /// Status.
    pub status: NotificationStatus,
    /// Local calendar day of `created_at`.
    pub day: NaiveDate,
    /// Number of records.
    pub count: i64,
}

/// Counts and delivery rate for one slice of notifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryBreakdown {
    /// Records still PENDING.
    pub pending: i64,
    /// Records that reached the channel (SENT + DELIVERED).
    pub sent: i64,
    /// Records with confirmed delivery.
    pub delivered: i64,
    /// Records currently FAILED.
    pub failed: i64,
    /// `delivered / sent` as a percentage; 0 when nothing was sent.
    pub delivery_rate: f64,
}

impl DeliveryBreakdown {
    fn add(&mut self, status: NotificationStatus, count: i64) {
        match status {
            NotificationStatus::Pending => self.pending += count,
            NotificationStatus::Sent => self.sent += count,
            NotificationStatus::Delivered => {
                self.sent += count;
                self.delivered += count;
            }
            NotificationStatus::Failed => self.failed += count,
        }
    }

    fn finish(&mut self) {
        self.delivery_rate = percentage(self.delivered, self.sent);
    }

    /// Total records in this slice.
    pub fn total(&self) -> i64 {
        self.pending + self.sent + self.failed
    }
}

/// Counts for one calendar day of the histogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    /// Local calendar day.
    pub date: NaiveDate,
    /// SENT + DELIVERED records created that day.
    pub sent: i64,
    /// DELIVERED records created that day.
    pub delivered: i64,
    /// FAILED records created that day.
    pub failed: i64,
}

/// Aggregate delivery health over a filtered set of notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationStats {
    /// Records in the filtered set.
    pub total: i64,
    /// Totals across every channel and type.
    #[serde(flatten)]
    pub overall: DeliveryBreakdown,
    /// Per-channel breakdown.
    pub by_channel: BTreeMap<NotificationChannel, DeliveryBreakdown>,
    /// Per-type breakdown.
    pub by_type: BTreeMap<NotificationType, DeliveryBreakdown>,
    /// Trailing daily histogram ending at `today`, oldest first, zero-filled.
    pub daily: Vec<DailyStats>,
}

impl NotificationStats {
    /// Fold grouped rows into statistics.
    ///
    /// `today` is the current calendar day in the reporting timezone; the
    /// rows' `day` values must be bucketed in the same timezone.
    pub fn from_rows(rows: &[StatusCountRow], today: NaiveDate) -> Self {
        let mut overall = DeliveryBreakdown::default();
        let mut by_channel: BTreeMap<NotificationChannel, DeliveryBreakdown> = BTreeMap::new();
        let mut by_type: BTreeMap<NotificationType, DeliveryBreakdown> = BTreeMap::new();

        let first_day = today - Duration::days(HISTOGRAM_DAYS - 1);
        let mut daily: Vec<DailyStats> = (0..HISTOGRAM_DAYS)
            .map(|offset| DailyStats {
                date: first_day + Duration::days(offset),
                sent: 0,
                delivered: 0,
                failed: 0,
            })
            .collect();

        for row in rows.iter().filter(|r| r.count > 0) {
            overall.add(row.status, row.count);
            by_channel
                .entry(row.channel)
                .or_default()
                .add(row.status, row.count);
            by_type
                .entry(row.notification_type)
                .or_default()
                .add(row.status, row.count);

            if row.day >= first_day && row.day <= today {
                let index = (row.day - first_day).num_days() as usize;
                let bucket = &mut daily[index];
                match row.status {
                    NotificationStatus::Sent => bucket.sent += row.count,
                    NotificationStatus::Delivered => {
                        bucket.sent += row.count;
                        bucket.delivered += row.count;
                    }
                    NotificationStatus::Failed => bucket.failed += row.count,
                    NotificationStatus::Pending => {}
                }
            }
        }

        overall.finish();
        by_channel.values_mut().for_each(DeliveryBreakdown::finish);
        by_type.values_mut().for_each(DeliveryBreakdown::finish);

        Self {
            total: overall.total(),
            overall,
            by_channel,
            by_type,
            daily,
        }
    }
}

/// `part / whole * 100`, rounded to two decimals; 0 when `whole` is 0.
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    let rate = part as f64 / whole as f64 * 100.0;
    (rate.clamp(0.0, 100.0) * 100.0).round() / 100.0
}
