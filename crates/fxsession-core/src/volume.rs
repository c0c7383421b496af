//! Volume curve rotation into the observer's timezone

use fxsession_api::{VOLUME_SLOTS, VolumeCurve, VolumeView, slot_for_hour};
use fxsession_util::utc_hour_to_local;

/// Half-hour steps the UTC curve must shift right to land on local time
fn rotation_steps(offset_hours: f64) -> usize {
    ((offset_hours * 2.0).round() as i64).rem_euclid(VOLUME_SLOTS as i64) as usize
}

/// Rotate a UTC-axis curve so slot `i` covers local `[i * 0.5, i * 0.5 + 0.5)`.
///
/// Offsets are rounded to the nearest half hour, so a +5:45 observer sees the
/// curve shifted by six hours.
pub fn rotate_volume_curve(curve: &VolumeCurve, offset_hours: f64) -> VolumeCurve {
    curve.rotated_right(rotation_steps(offset_hours))
}

/// Rotated curve plus the local position of "now" for chart markers
pub fn volume_view(curve: &VolumeCurve, offset_hours: f64, now_utc_hours: f64) -> VolumeView {
    let now_local_hour = utc_hour_to_local(now_utc_hours, offset_hours);
    VolumeView {
        curve: rotate_volume_curve(curve, offset_hours),
        observer_offset_hours: offset_hours,
        now_local_hour,
        now_slot: slot_for_hour(now_local_hour),
    }
}
