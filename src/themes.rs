/// A named bundle of search queries for clips and background audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeSet {
    pub name: &'static str,
    pub video_queries: &'static [&'static str],
    pub audio_queries: &'static [&'static str],
}

pub const THEME_SETS: &[ThemeSet] = &[
    ThemeSet {
        name: "nature",
        video_queries: &[
            "forest peaceful",
            "ocean waves",
            "sunset nature",
            "rain window",
        ],
        audio_queries: &[
            "forest sounds",
            "ocean waves",
            "rain sounds",
            "nature ambient",
        ],
    },
    ThemeSet {
        name: "cozy",
        video_queries: &[
            "coffee morning",
            "fireplace warm",
            "candle flame",
            "cozy home",
        ],
        audio_queries: &["cafe atmosphere", "meditation music", "lo-fi chill"],
    },
];
