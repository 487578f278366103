pub mod bundles;

pub mod color;

pub mod config;

pub mod game_snapshot;

pub mod drawing_support {
    pub const MAX_LONG_STRINGABLE_SECS: u32 = 5_999_999;
}
