//! GPIO / peripheral pin assignments for the switchboard.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  The layout mirrors the NodeMCU v3 footprint the
//! board was first wired on (shared line on the on-board LED pin, D1/D2 for
//! the two switches, D7 for the dimmer).

/// GPIO number as understood by the ESP-IDF driver layer.
pub type Pin = i32;

// ---------------------------------------------------------------------------
// Wall switches (relay inputs, active LOW)
// ---------------------------------------------------------------------------

/// Shared control line.  Driven together with the left switch only.
pub const SWITCH_SHARED_GPIO: Pin = 2;
/// Dedicated line of the left switch (D1).
pub const SWITCH_LEFT_GPIO: Pin = 5;
/// Dedicated line of the right switch (D2).
pub const SWITCH_RIGHT_GPIO: Pin = 4;

// ---------------------------------------------------------------------------
// LED strip dimmer (MOSFET gate, LEDC PWM)
// ---------------------------------------------------------------------------

/// PWM output for the dimmable LED strip (D7).
pub const LIGHTBULB_GPIO: Pin = 13;

// ---------------------------------------------------------------------------
// Light sensor (GL5528 photocell in a voltage divider)
// ---------------------------------------------------------------------------

/// Analog input for the photocell divider (ADC1 channel 6).
pub const PHOTOCELL_ADC_GPIO: Pin = 34;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  10-bit gives 0 – 1023 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 10;
/// Largest duty value at [`PWM_RESOLUTION_BITS`].
pub const PWM_RANGE_MAX: u16 = (1 << PWM_RESOLUTION_BITS) - 1;
/// LEDC frequency for the LED strip (1 kHz, flicker-free).
pub const LIGHTBULB_PWM_FREQ_HZ: u32 = 1_000;

/// ADC full-scale raw value at 12-bit width.
pub const ADC_MAX: u16 = 4095;
