//! Dashboard statistics — the aggregate cards above the device list.
//!
//! All aggregates are computed from the full, unfiltered snapshot;
//! narrowing the rendered list never changes these numbers. Every
//! formula is total on empty input: an empty snapshot produces zeros,
//! never NaN or infinities.

use serde::Serialize;

use crate::model::Device;

// ---------------------------------------------------------------------------
// Aggregated stats
// ---------------------------------------------------------------------------

/// The eight summary values shown on the dashboard.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardStats {
    pub total_devices: usize,
    pub active_devices: usize,
    /// Sum of every device's current draw. Off devices still count with
    /// whatever their latest sample reports.
    pub total_power_watts: f64,
    /// Projected monthly bill reduction at the configured tariff, in
    /// currency units: `total_power × rate × 24 h × 30 d ÷ 1000`.
    pub monthly_savings: f64,
    pub avg_usage_watts: f64,
    pub peak_usage_watts: f64,
    /// Energy at the current draw held for a day, in kWh.
    pub daily_usage_kwh: f64,
    /// Share of devices currently on, rounded to a whole percent.
    pub efficiency_pct: u32,
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Compute the stat cards from a snapshot.
///
/// `rate_per_kwh` feeds only the savings estimate; everything else is
/// derived from the devices alone.
pub fn build_stats(devices: &[Device], rate_per_kwh: f64) -> DashboardStats {
    if devices.is_empty() {
        return DashboardStats::default();
    }

    let total_devices = devices.len();
    let active_devices = devices.iter().filter(|d| d.is_on).count();

    let total_power_watts: f64 = devices.iter().map(Device::current_draw).sum();
    let peak_usage_watts = devices
        .iter()
        .map(Device::current_draw)
        .fold(0.0, f64::max);

    let monthly_savings = total_power_watts * rate_per_kwh * 24.0 * 30.0 / 1000.0;
    let avg_usage_watts = total_power_watts / total_devices as f64;
    let daily_usage_kwh = total_power_watts * 24.0 / 1000.0;
    let efficiency_pct = ((active_devices as f64 / total_devices as f64) * 100.0).round() as u32;

    DashboardStats {
        total_devices,
        active_devices,
        total_power_watts,
        monthly_savings,
        avg_usage_watts,
        peak_usage_watts,
        daily_usage_kwh,
        efficiency_pct,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
