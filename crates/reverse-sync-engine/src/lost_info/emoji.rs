/// Shortcode (without colons) → emoji for the shortcodes emoticon macros use.
const SHORTCODES: &[(&str, &str)] = &[
    ("check_mark", "✔️"),
    ("heavy_check_mark", "✔️"),
    ("white_check_mark", "✅"),
    ("ballot_box_with_check", "☑️"),
    ("cross_mark", "❌"),
    ("x", "❌"),
    ("negative_squared_cross_mark", "❎"),
    ("warning", "⚠️"),
    ("information_source", "ℹ️"),
    ("question", "❓"),
    ("grey_question", "❔"),
    ("exclamation", "❗"),
    ("heavy_exclamation_mark", "❗"),
    ("bulb", "💡"),
    ("star", "⭐"),
    ("star2", "🌟"),
    ("blue_star", "🔹"),
    ("large_blue_diamond", "🔷"),
    ("small_blue_diamond", "🔹"),
    ("smile", "😄"),
    ("smiley", "😃"),
    ("slightly_smiling_face", "🙂"),
    ("wink", "😉"),
    ("laughing", "😆"),
    ("disappointed", "😞"),
    ("cry", "😢"),
    ("stuck_out_tongue", "😛"),
    ("thumbsup", "👍"),
    ("+1", "👍"),
    ("thumbsdown", "👎"),
    ("-1", "👎"),
    ("clap", "👏"),
    ("pray", "🙏"),
    ("point_right", "👉"),
    ("eyes", "👀"),
    ("heart", "❤️"),
    ("fire", "🔥"),
    ("rocket", "🚀"),
    ("tada", "🎉"),
    ("memo", "📝"),
    ("pushpin", "📌"),
    ("round_pushpin", "📍"),
    ("paperclip", "📎"),
    ("link", "🔗"),
    ("lock", "🔒"),
    ("unlock", "🔓"),
    ("key", "🔑"),
    ("mag", "🔍"),
    ("gear", "⚙️"),
    ("wrench", "🔧"),
    ("hammer", "🔨"),
    ("bell", "🔔"),
    ("calendar", "📅"),
    ("clock3", "🕒"),
    ("hourglass", "⌛"),
    ("no_entry", "⛔"),
    ("no_entry_sign", "🚫"),
    ("stop_sign", "🛑"),
    ("red_circle", "🔴"),
    ("large_blue_circle", "🔵"),
    ("green_circle", "🟢"),
    ("yellow_circle", "🟡"),
    ("arrow_right", "➡️"),
    ("arrow_left", "⬅️"),
    ("arrow_up", "⬆️"),
    ("arrow_down", "⬇️"),
    ("new", "🆕"),
    ("sos", "🆘"),
    ("100", "💯"),
];

/// The emoji for a `:shortcode:` (colons optional).
pub fn emojize(shortcode: &str) -> Option<&'static str> {
    let name = shortcode.trim().trim_matches(':');
    SHORTCODES
        .iter()
        .find(|(code, _)| *code == name)
        .map(|(_, emoji)| *emoji)
}
