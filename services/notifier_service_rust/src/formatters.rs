use streamwatch_core::models::{
    BroadcastRecord, EmbedAuthor, EmbedFooter, EmbedImage, NotificationEmbed,
};

const EMBED_COLOR: u32 = 1369976;
const BOX_ART_URL: &str = "https://static-cdn.jtvnw.net/ttv-boxart/Illusion%20of%20Gaia-{width}x{height}.jpg";
const THUMBNAIL_URL: &str = "http://25.media.tumblr.com/tumblr_m8y204k2Pn1re8zjko1_1280.png";
const FOOTER_TEXT: &str = "Streaming IoG";

/// Box art size filled into Twitch `{width}x{height}` templates.
const ICON_SIZE: (u32, u32) = (52, 72);

/// Build the announcement for a broadcast that just went live.
///
/// `variant_tag` marks randomizer broadcasts, which get their own wording.
pub fn build_embed(record: &BroadcastRecord, variant_tag: &str, game_name: &str) -> NotificationEmbed {
    let name = &record.user_name;
    let url = record.channel_url();
    let icon_url = fill_size_template(BOX_ART_URL, ICON_SIZE);

    let (title, author) = if is_variant(record, variant_tag) {
        (
            format!("{name} is playing the randomizer! Check it out!"),
            format!("{name} is playing our game!"),
        )
    } else {
        (
            format!("{name} is playing {game_name}! Check it out and tell them about the randomizer!"),
            format!("{name} is playing {game_name}!"),
        )
    };

    NotificationEmbed {
        title,
        url: url.clone(),
        color: EMBED_COLOR,
        timestamp: record.started_at,
        footer: EmbedFooter {
            text: FOOTER_TEXT.to_string(),
            icon_url: icon_url.clone(),
        },
        thumbnail: EmbedImage {
            url: THUMBNAIL_URL.to_string(),
        },
        author: EmbedAuthor {
            name: author,
            url,
            icon_url,
        },
    }
}

pub fn is_variant(record: &BroadcastRecord, variant_tag: &str) -> bool {
    !variant_tag.is_empty() && record.has_tag(variant_tag)
}

fn fill_size_template(template: &str, (width, height): (u32, u32)) -> String {
    template
        .replace("{width}", &width.to_string())
        .replace("{height}", &height.to_string())
}
