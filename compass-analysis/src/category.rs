//! Static ideological taxonomy rendered into the classification prompt.
//!
//! Loaded once, read-only for the lifetime of the process. The feature
//! lists are descriptive signals for the model, not exact-match rules.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Category {
    pub name: &'static str,
    pub description: &'static str,
    pub language_markers: &'static [&'static str],
    pub beliefs: &'static [&'static str],
    pub cultural_signifiers: &'static [&'static str],
    pub hashtags: &'static [&'static str],
}

pub const TAXONOMY: &[Category] = &[
    Category {
        name: "progressive_left",
        description: "Structural critique of markets and institutions; redistribution and collective action framing.",
        language_markers: &["systemic", "equity", "solidarity", "late capitalism", "mutual aid"],
        beliefs: &[
            "wealth inequality is a policy choice",
            "healthcare and housing are rights",
            "climate change demands state-led transition",
        ],
        cultural_signifiers: &["union drives", "tenant organizing", "degrowth discourse"],
        hashtags: &["#medicareforall", "#greennewdeal", "#unionstrong"],
    },
    Category {
        name: "establishment_liberal",
        description: "Institutionalist center-left; incremental reform through existing norms and expertise.",
        language_markers: &["norms", "democracy", "bipartisan", "evidence-based", "guardrails"],
        beliefs: &[
            "institutions are flawed but worth defending",
            "expertise should guide policy",
            "markets need smart regulation",
        ],
        cultural_signifiers: &["wonk podcasts", "op-ed citations", "fact-checker links"],
        hashtags: &["#votebluenomatter", "#democracy", "#factsmatter"],
    },
    Category {
        name: "centrist",
        description: "Deliberate positioning between camps; both-sides framing and aversion to tribal labels.",
        language_markers: &["nuance", "both sides", "horseshoe", "grownups in the room"],
        beliefs: &[
            "polarization is the core problem",
            "most answers are in the middle",
            "tone matters as much as substance",
        ],
        cultural_signifiers: &["heterodox panels", "civility discourse"],
        hashtags: &["#moderation", "#commonground"],
    },
    Category {
        name: "libertarian",
        description: "Individual liberty and market primacy; scepticism of state power in all forms.",
        language_markers: &["coercion", "voluntary", "fiat", "statist", "first principles"],
        beliefs: &[
            "taxation is theft or close to it",
            "central banks distort everything",
            "speech must be absolutely free",
        ],
        cultural_signifiers: &["austrian economics", "bitcoin maximalism", "homeschooling"],
        hashtags: &["#endthefed", "#bitcoin", "#donttreadonme"],
    },
    Category {
        name: "conservative_right",
        description: "Tradition, family, faith, and order; suspicion of rapid cultural change.",
        language_markers: &["heritage", "ordered liberty", "common sense", "silent majority"],
        beliefs: &[
            "family is the unit of civilization",
            "borders and law precede prosperity",
            "elites hold ordinary people in contempt",
        ],
        cultural_signifiers: &["church attendance", "small-town identity", "military service"],
        hashtags: &["#faithandfamily", "#backtheblue", "#americafirst"],
    },
    Category {
        name: "populist_right",
        description: "Anti-establishment nationalism; insider/outsider framing against managerial elites.",
        language_markers: &["globalist", "regime", "deep state", "legacy media", "based"],
        beliefs: &[
            "institutions are captured and unreformable",
            "the media manufactures consent",
            "national identity outranks global markets",
        ],
        cultural_signifiers: &["anon accounts", "frog memes", "alt-media streams"],
        hashtags: &["#maga", "#greatreset", "#wakeup"],
    },
];
