//! Closed vocabularies used across the store and the learning components
//!
//! Niche and template type are parsed once at the boundary so that a typo
//! surfaces as a validation error instead of silently routing template
//! resolution to the generic fallback.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $field:literal { $($variant:ident => $text:literal $(| $alias:literal)*),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text $(| $alias)* => Ok($name::$variant),)+
                    other => Err(Error::validation(
                        $field,
                        format!(
                            "unknown value '{}' (expected one of: {})",
                            other,
                            [$($text),+].join(", ")
                        ),
                    )),
                }
            }
        }
    };
}

string_enum!(
    /// Content vertical used as a partition key for ratings, patterns and templates
    Niche, "niche" {
        Skincare => "skincare" | "beauty",
        Tech => "tech",
        Fashion => "fashion",
        Fitness => "fitness",
        Food => "food",
        Travel => "travel",
        Pet => "pet" | "pets",
    }
);

string_enum!(
    /// Structural format of a generated piece of content
    TemplateType, "template_type" {
        Original => "original",
        Caption => "caption",
        ShortVideo => "short_video",
        ProductReview => "product_review",
        Comparison => "comparison",
        ProsCons => "pros_cons",
        Routine => "routine",
        SeoBlog => "seo_blog",
        InfluencerCaption => "influencer_caption",
        Tutorial => "tutorial",
    }
);

string_enum!(
    /// Social platforms that carry a per-platform rating
    Platform, "platform" {
        Instagram => "instagram",
        Tiktok => "tiktok",
        Youtube => "youtube",
        Twitter => "twitter" | "x",
    }
);

string_enum!(
    /// How strongly learned patterns should bias generation
    LearningIntensity, "learning_intensity" {
        Conservative => "conservative",
        Moderate => "moderate",
        Aggressive => "aggressive",
    }
);

impl Platform {
    /// Column in `content_ratings` holding this platform's score
    pub fn rating_column(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram_rating",
            Platform::Tiktok => "tiktok_rating",
            Platform::Youtube => "youtube_rating",
            Platform::Twitter => "twitter_rating",
        }
    }
}

impl Default for LearningIntensity {
    fn default() -> Self {
        LearningIntensity::Moderate
    }
}
