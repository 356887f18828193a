//! VISCA payload builders and reply parsers
//!
//! Builders produce the raw VISCA byte sequences documented by the vendor
//! (address byte 0x81, terminated by 0xFF); the envelope is added by the
//! client. Parsers operate on the reply body with the envelope already
//! stripped.
//!
//! Reply body forms:
//! - single value: `90 50 0p FF`
//! - four nibbles: `90 50 0p 0q 0r 0s FF` (larger values)
//! - device error: `90 6x .. FF`

use crate::error::{CameraError, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Pan/tilt movement direction
///
/// Wire encoding is the VISCA two-byte direction pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PanTiltDirection {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl PanTiltDirection {
    /// The VISCA direction byte pair
    pub fn wire_bytes(&self) -> [u8; 2] {
        match self {
            PanTiltDirection::Up => [0x03, 0x01],
            PanTiltDirection::Down => [0x03, 0x02],
            PanTiltDirection::Left => [0x01, 0x03],
            PanTiltDirection::Right => [0x02, 0x03],
            PanTiltDirection::UpLeft => [0x01, 0x01],
            PanTiltDirection::UpRight => [0x02, 0x01],
            PanTiltDirection::DownLeft => [0x01, 0x02],
            PanTiltDirection::DownRight => [0x02, 0x02],
        }
    }
}

/// Focus mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusMode {
    Auto,
    Manual,
}

impl FocusMode {
    /// Canonical VISCA mode byte
    pub fn as_u8(&self) -> u8 {
        match self {
            FocusMode::Auto => 0x02,
            FocusMode::Manual => 0x03,
        }
    }
}

/// Exposure mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExposureMode {
    Auto,
    Manual,
    ShutterPriority,
    IrisPriority,
    Bright,
}

impl ExposureMode {
    /// Canonical VISCA mode byte
    pub fn as_u8(&self) -> u8 {
        match self {
            ExposureMode::Auto => 0x00,
            ExposureMode::Manual => 0x03,
            ExposureMode::ShutterPriority => 0x0A,
            ExposureMode::IrisPriority => 0x0B,
            ExposureMode::Bright => 0x0D,
        }
    }
}

/// White balance mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhiteBalanceMode {
    Auto,
    Indoor,
    Outdoor,
    OnePush,
    Manual,
}

impl WhiteBalanceMode {
    /// Canonical VISCA mode byte
    pub fn as_u8(&self) -> u8 {
        match self {
            WhiteBalanceMode::Auto => 0x00,
            WhiteBalanceMode::Indoor => 0x01,
            WhiteBalanceMode::Outdoor => 0x02,
            WhiteBalanceMode::OnePush => 0x03,
            WhiteBalanceMode::Manual => 0x05,
        }
    }
}

/// Map a 0.0–1.5 speed factor to the VISCA pan speed range (1–24)
pub fn pan_speed_byte(speed: f32) -> u8 {
    ((speed * 12.0).round() as i32).clamp(1, 24) as u8
}

/// Map a 0.0–1.5 speed factor to the VISCA tilt speed range (1–20)
pub fn tilt_speed_byte(speed: f32) -> u8 {
    ((speed * 10.0).round() as i32).clamp(1, 20) as u8
}

/// Map a 0.0–1.0 speed factor to the VISCA zoom/focus speed range (0–7)
fn variable_speed_nibble(speed: f32) -> u8 {
    ((speed * 7.0) as i32).clamp(0, 7) as u8
}

/// Split a value into the VISCA four-nibble direct form `0p 0q 0r 0s`
fn four_nibbles(value: u16) -> [u8; 4] {
    [
        ((value >> 12) & 0x0F) as u8,
        ((value >> 8) & 0x0F) as u8,
        ((value >> 4) & 0x0F) as u8,
        (value & 0x0F) as u8,
    ]
}

// ---------------------------------------------------------------------------
// Motion commands
// ---------------------------------------------------------------------------

/// Pan/tilt move in the given direction
pub fn pan_tilt(direction: PanTiltDirection, pan_speed: f32, tilt_speed: f32) -> Bytes {
    let [d1, d2] = direction.wire_bytes();
    Bytes::from(vec![
        0x81,
        0x01,
        0x06,
        0x01,
        pan_speed_byte(pan_speed),
        tilt_speed_byte(tilt_speed),
        d1,
        d2,
        0xFF,
    ])
}

/// Stop pan/tilt movement
pub fn pan_tilt_stop() -> Bytes {
    Bytes::from_static(&[0x81, 0x01, 0x06, 0x01, 0x03, 0x03, 0x03, 0x03, 0xFF])
}

/// Set the maximum pan/tilt speed limit (pan 1–24, tilt 1–20)
///
/// Some cameras ship with a speed limiter engaged; resetting it to the
/// maximum restores full-rate movement.
pub fn set_speed_limit(pan_limit: u8, tilt_limit: u8) -> Bytes {
    Bytes::from(vec![
        0x81,
        0x01,
        0x06,
        0x11,
        pan_limit.clamp(1, 24),
        tilt_limit.clamp(1, 20),
        0xFF,
    ])
}

/// Zoom in (tele) with variable speed 0.0–1.0
pub fn zoom_in(speed: f32) -> Bytes {
    Bytes::from(vec![
        0x81,
        0x01,
        0x04,
        0x07,
        0x20 | variable_speed_nibble(speed),
        0xFF,
    ])
}

/// Zoom out (wide) with variable speed 0.0–1.0
pub fn zoom_out(speed: f32) -> Bytes {
    Bytes::from(vec![
        0x81,
        0x01,
        0x04,
        0x07,
        0x30 | variable_speed_nibble(speed),
        0xFF,
    ])
}

/// Stop zoom movement
pub fn zoom_stop() -> Bytes {
    Bytes::from_static(&[0x81, 0x01, 0x04, 0x07, 0x00, 0xFF])
}

/// Focus near with variable speed 0.0–1.0
pub fn focus_near(speed: f32) -> Bytes {
    Bytes::from(vec![
        0x81,
        0x01,
        0x04,
        0x08,
        0x30 | variable_speed_nibble(speed),
        0xFF,
    ])
}

/// Focus far with variable speed 0.0–1.0
pub fn focus_far(speed: f32) -> Bytes {
    Bytes::from(vec![
        0x81,
        0x01,
        0x04,
        0x08,
        0x20 | variable_speed_nibble(speed),
        0xFF,
    ])
}

/// Stop focus movement
pub fn focus_stop() -> Bytes {
    Bytes::from_static(&[0x81, 0x01, 0x04, 0x08, 0x00, 0xFF])
}

// ---------------------------------------------------------------------------
// Parameter commands
// ---------------------------------------------------------------------------

/// Enable or disable autofocus
pub fn set_autofocus(enable: bool) -> Bytes {
    let mode = if enable { 0x02 } else { 0x03 };
    Bytes::from(vec![0x81, 0x01, 0x04, 0x38, mode, 0xFF])
}

/// Trigger a single one-push autofocus operation
pub fn one_push_autofocus() -> Bytes {
    Bytes::from_static(&[0x81, 0x01, 0x04, 0x18, 0x01, 0xFF])
}

/// Set the exposure mode
pub fn set_exposure_mode(mode: ExposureMode) -> Bytes {
    Bytes::from(vec![0x81, 0x01, 0x04, 0x39, mode.as_u8(), 0xFF])
}

/// Set the iris value directly (0–17, 0 = closed)
pub fn set_iris(value: u16) -> Bytes {
    direct_value(0x4B, value.min(17))
}

/// Set the shutter speed value directly (0–21)
pub fn set_shutter(value: u16) -> Bytes {
    direct_value(0x4A, value.min(21))
}

/// Set the gain value directly (0–15)
pub fn set_gain(value: u16) -> Bytes {
    direct_value(0x4C, value.min(15))
}

/// Set the brightness level directly (0–41, Bright mode only)
pub fn set_brightness(value: u16) -> Bytes {
    direct_value(0x4D, value.min(41))
}

/// Enable or disable backlight compensation
pub fn set_backlight(enable: bool) -> Bytes {
    let mode = if enable { 0x02 } else { 0x03 };
    Bytes::from(vec![0x81, 0x01, 0x04, 0x33, mode, 0xFF])
}

/// Set the white balance mode
pub fn set_white_balance_mode(mode: WhiteBalanceMode) -> Bytes {
    Bytes::from(vec![0x81, 0x01, 0x04, 0x35, mode.as_u8(), 0xFF])
}

/// Trigger a single one-push white balance calibration
pub fn one_push_white_balance() -> Bytes {
    Bytes::from_static(&[0x81, 0x01, 0x04, 0x10, 0x05, 0xFF])
}

/// Set red gain for manual white balance (0–255)
pub fn set_red_gain(value: u16) -> Bytes {
    direct_value(0x43, value.min(255))
}

/// Set blue gain for manual white balance (0–255)
pub fn set_blue_gain(value: u16) -> Bytes {
    direct_value(0x44, value.min(255))
}

/// Store the current position into a physical preset slot
///
/// The device firmware owns the stored coordinates; positions are never
/// read back or cached application-side.
pub fn store_preset(slot: u8) -> Bytes {
    Bytes::from(vec![0x81, 0x01, 0x04, 0x3F, 0x01, slot, 0xFF])
}

/// Recall a previously stored preset slot
pub fn recall_preset(slot: u8) -> Bytes {
    Bytes::from(vec![0x81, 0x01, 0x04, 0x3F, 0x02, slot, 0xFF])
}

fn direct_value(register: u8, value: u16) -> Bytes {
    let [p, q, r, s] = four_nibbles(value);
    Bytes::from(vec![0x81, 0x01, 0x04, register, p, q, r, s, 0xFF])
}

// ---------------------------------------------------------------------------
// Inquiries
// ---------------------------------------------------------------------------

/// Focus mode inquiry
pub fn inq_focus_mode() -> Bytes {
    Bytes::from_static(&[0x81, 0x09, 0x04, 0x38, 0xFF])
}

/// Exposure mode inquiry
pub fn inq_exposure_mode() -> Bytes {
    Bytes::from_static(&[0x81, 0x09, 0x04, 0x39, 0xFF])
}

/// Iris value inquiry
pub fn inq_iris() -> Bytes {
    Bytes::from_static(&[0x81, 0x09, 0x04, 0x4B, 0xFF])
}

/// Shutter value inquiry
pub fn inq_shutter() -> Bytes {
    Bytes::from_static(&[0x81, 0x09, 0x04, 0x4A, 0xFF])
}

/// Gain value inquiry
pub fn inq_gain() -> Bytes {
    Bytes::from_static(&[0x81, 0x09, 0x04, 0x4C, 0xFF])
}

/// Brightness value inquiry
pub fn inq_brightness() -> Bytes {
    Bytes::from_static(&[0x81, 0x09, 0x04, 0x4D, 0xFF])
}

/// White balance mode inquiry
pub fn inq_white_balance_mode() -> Bytes {
    Bytes::from_static(&[0x81, 0x09, 0x04, 0x35, 0xFF])
}

/// Red gain inquiry
pub fn inq_red_gain() -> Bytes {
    Bytes::from_static(&[0x81, 0x09, 0x04, 0x43, 0xFF])
}

/// Blue gain inquiry
pub fn inq_blue_gain() -> Bytes {
    Bytes::from_static(&[0x81, 0x09, 0x04, 0x44, 0xFF])
}

/// Backlight compensation inquiry
pub fn inq_backlight() -> Bytes {
    Bytes::from_static(&[0x81, 0x09, 0x04, 0x33, 0xFF])
}

// ---------------------------------------------------------------------------
// Reply parsers
// ---------------------------------------------------------------------------

/// Check a reply body for the device-error form (`90 6x .. FF`)
fn check_device_error(body: &[u8]) -> Result<()> {
    if body.len() >= 2 && body[1] & 0xF0 == 0x60 {
        return Err(CameraError::protocol(format!(
            "device error reply 0x{:02X}",
            body[1]
        )));
    }
    Ok(())
}

/// Parse a single-value inquiry reply (`90 50 pp FF`), returning the value byte
pub fn parse_value_reply(body: &[u8]) -> Result<u8> {
    check_device_error(body)?;
    if body.len() < 4 || body[1] != 0x50 || body.last() != Some(&0xFF) {
        return Err(CameraError::protocol(format!(
            "unrecognized reply body ({} bytes)",
            body.len()
        )));
    }
    // The value is the last byte before the terminator; single-nibble
    // replies and full-byte mode replies both land there.
    Ok(body[body.len() - 2])
}

/// Parse a four-nibble inquiry reply (`90 50 0p 0q 0r 0s FF`)
pub fn parse_nibble_reply(body: &[u8]) -> Result<u16> {
    check_device_error(body)?;
    if body.len() != 7 || body[1] != 0x50 || body[6] != 0xFF {
        return Err(CameraError::protocol(format!(
            "unrecognized four-nibble reply body ({} bytes)",
            body.len()
        )));
    }
    Ok(((body[2] as u16 & 0x0F) << 12)
        | ((body[3] as u16 & 0x0F) << 8)
        | ((body[4] as u16 & 0x0F) << 4)
        | (body[5] as u16 & 0x0F))
}

/// Parse a backlight compensation reply into on/off
pub fn parse_backlight_reply(body: &[u8]) -> Result<bool> {
    match parse_value_reply(body)? {
        0x02 => Ok(true),
        0x03 => Ok(false),
        other => Err(CameraError::protocol(format!(
            "unexpected backlight value 0x{other:02X}"
        ))),
    }
}

/// Parse a focus mode reply
pub fn parse_focus_mode_reply(body: &[u8]) -> Result<FocusMode> {
    match parse_value_reply(body)? {
        0x02 => Ok(FocusMode::Auto),
        0x03 => Ok(FocusMode::Manual),
        other => Err(CameraError::protocol(format!(
            "unexpected focus mode value 0x{other:02X}"
        ))),
    }
}
