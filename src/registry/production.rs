//! Production descriptor pools.
//!
//! A production descriptor is a 4-tuple (recording, texture, space, mix)
//! picked one word from each pool.

pub static RECORDING: &[&str] = &[
    "studio recording",
    "live session",
    "home recording",
    "analog tape",
    "field recording",
    "vintage console",
];

pub static TEXTURE: &[&str] = &[
    "warm",
    "crisp",
    "gritty",
    "lush",
    "airy",
    "saturated",
    "dry",
];

pub static SPACE: &[&str] = &[
    "intimate room",
    "wide stereo",
    "cathedral reverb",
    "close-miked",
    "plate reverb",
    "open hall",
];

pub static MIX: &[&str] = &[
    "balanced mix",
    "punchy mix",
    "bass-forward mix",
    "vocal-forward mix",
    "dynamic mix",
    "glued bus compression",
];

/// The four pools in tuple order.
pub fn pools() -> [&'static [&'static str]; 4] {
    [RECORDING, TEXTURE, SPACE, MIX]
}
