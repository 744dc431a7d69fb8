use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::ParsePrefixError;
use crate::feed::Episode;

/// Practical limit on a composed destination path, after which filenames
/// are shortened (historically 260 characters, the Windows MAX_PATH)
pub const MAX_PATH_LEN: usize = 260;

/// Filename decoration applied ahead of the episode title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrefixMode {
    #[default]
    None,
    Date,
    DateTime,
}

impl FromStr for PrefixMode {
    type Err = ParsePrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(Self::None),
            "DATE" => Ok(Self::Date),
            "DATE_TIME" => Ok(Self::DateTime),
            other => Err(ParsePrefixError(other.to_string())),
        }
    }
}

impl fmt::Display for PrefixMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "NONE",
            Self::Date => "DATE",
            Self::DateTime => "DATE_TIME",
        };
        f.write_str(s)
    }
}

/// Title reduced to something every mainstream filesystem accepts:
/// `\ / : " * ? < > |` stripped, whitespace runs collapsed, ends trimmed
pub fn safe_title(title: &str) -> String {
    let stripped = sanitize_filename::sanitize_with_options(
        title,
        sanitize_filename::Options {
            windows: true,
            truncate: true,
            replacement: "",
        },
    );
    collapse_spaces(stripped.trim())
}

/// Collapse runs of whitespace into single spaces
fn collapse_spaces(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut last_was_space = false;

    for c in s.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                result.push(' ');
                last_was_space = true;
            }
        } else {
            result.push(c);
            last_was_space = false;
        }
    }

    result
}

/// Generate the destination filename for an episode.
///
/// `Date` prepends the ISO date and a space; `DateTime` prepends the full
/// timestamp with `:` replaced by `-` so it survives on Windows.
pub fn generate_filename(episode: &Episode, mode: PrefixMode) -> String {
    let name = format!("{}.mp3", safe_title(&episode.title));
    match mode {
        PrefixMode::None => name,
        PrefixMode::Date => format!("{} {}", episode.published_at.format("%Y-%m-%d"), name),
        PrefixMode::DateTime => {
            format!("{} {}", episode.published_at.format("%Y-%m-%d_%H-%M-%S"), name)
        }
    }
}

/// Shorten `filename` so that `folder/filename` stays under the path
/// limit, dropping characters from the stem and keeping the extension.
///
/// The caller is responsible for rejecting folders that already bust the
/// limit on their own; with such a folder the stem can shrink to nothing.
pub fn fit_to_path_budget(folder: &Path, filename: &str) -> String {
    let folder_len = folder.to_string_lossy().chars().count();
    // folder + separator + name, strictly under the limit
    let budget = (MAX_PATH_LEN - 1).saturating_sub(folder_len + 1);

    if filename.chars().count() <= budget {
        return filename.to_string();
    }

    let (stem, ext) = match filename.rfind('.') {
        Some(i) => filename.split_at(i),
        None => (filename, ""),
    };
    let keep = budget.saturating_sub(ext.chars().count());
    let mut shortened: String = stem.chars().take(keep).collect();
    shortened.push_str(ext);
    shortened
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;
    use url::Url;

    fn make_episode(title: &str) -> Episode {
        Episode::new(
            Url::parse("https://example.com/ep.mp3").unwrap(),
            title,
            Utc.with_ymd_and_hms(2020, 1, 20, 15, 30, 5).unwrap(),
        )
    }

    // === safe_title ===

    #[test]
    fn safe_title_strips_forbidden_characters() {
        let hostile = "a\\b/c:d\"e*f?g<h>i|j";
        let safe = safe_title(hostile);
        for c in ['\\', '/', ':', '"', '*', '?', '<', '>', '|'] {
            assert!(!safe.contains(c), "{c} survived in {safe:?}");
        }
        assert_eq!(safe, "abcdefghij");
    }

    #[test]
    fn safe_title_collapses_space_runs() {
        assert_eq!(safe_title("Episode   with   spaces"), "Episode with spaces");
        assert!(!safe_title("a : b ? c").contains("  "));
    }

    #[test]
    fn safe_title_trims_ends() {
        assert_eq!(safe_title("  padded  "), "padded");
    }

    #[test]
    fn safe_title_keeps_punctuation_feeds_actually_use() {
        assert_eq!(
            safe_title("Nawak 6 : Qu'est-ce qu'on fait demain ?"),
            "Nawak 6 Qu'est-ce qu'on fait demain"
        );
    }

    #[test]
    fn safe_title_handles_only_invalid_chars() {
        assert_eq!(safe_title(":::///"), "");
    }

    // === generate_filename ===

    #[test]
    fn filename_without_prefix() {
        let episode = make_episode("Nawak 7 avec Yann");
        assert_eq!(
            generate_filename(&episode, PrefixMode::None),
            "Nawak 7 avec Yann.mp3"
        );
    }

    #[test]
    fn filename_with_date_prefix() {
        let episode = make_episode("Nawak 7 avec Yann");
        assert_eq!(
            generate_filename(&episode, PrefixMode::Date),
            "2020-01-20 Nawak 7 avec Yann.mp3"
        );
    }

    #[test]
    fn filename_with_date_time_prefix() {
        let episode = make_episode("Nawak 7 avec Yann");
        assert_eq!(
            generate_filename(&episode, PrefixMode::DateTime),
            "2020-01-20_15-30-05 Nawak 7 avec Yann.mp3"
        );
    }

    #[test]
    fn date_time_prefix_contains_no_colon() {
        let episode = make_episode("Test");
        assert!(!generate_filename(&episode, PrefixMode::DateTime).contains(':'));
    }

    #[test]
    fn prefixed_names_are_prefix_stable() {
        // Stripping the date token and the single space recovers the bare name
        let episode = make_episode("Some Episode");
        let bare = generate_filename(&episode, PrefixMode::None);

        let dated = generate_filename(&episode, PrefixMode::Date);
        let (token, rest) = dated.split_once(' ').unwrap();
        assert_eq!(token, "2020-01-20");
        assert_eq!(rest, bare);

        let timestamped = generate_filename(&episode, PrefixMode::DateTime);
        let (token, rest) = timestamped.split_once(' ').unwrap();
        assert_eq!(token, "2020-01-20_15-30-05");
        assert_eq!(rest, bare);
    }

    #[test]
    fn hostile_titles_never_produce_separators() {
        let titles = [
            "..\\..\\evil",
            "/etc/passwd",
            "CON",
            "a\tb\nc",
            "  * ? \" |  ",
        ];
        for title in titles {
            let episode = make_episode(title);
            let name = generate_filename(&episode, PrefixMode::None);
            assert!(!name.contains('/'), "{title:?} -> {name:?}");
            assert!(!name.contains('\\'), "{title:?} -> {name:?}");
            assert!(!name.chars().any(char::is_control), "{title:?} -> {name:?}");
        }
    }

    // === PrefixMode parsing ===

    #[test]
    fn prefix_mode_parses_known_values() {
        assert_eq!("NONE".parse::<PrefixMode>().unwrap(), PrefixMode::None);
        assert_eq!("DATE".parse::<PrefixMode>().unwrap(), PrefixMode::Date);
        assert_eq!(
            "DATE_TIME".parse::<PrefixMode>().unwrap(),
            PrefixMode::DateTime
        );
    }

    #[test]
    fn prefix_mode_rejects_unknown_values() {
        assert!("WRONG".parse::<PrefixMode>().is_err());
        assert!("date".parse::<PrefixMode>().is_err());
        assert!("".parse::<PrefixMode>().is_err());
    }

    #[test]
    fn prefix_mode_display_round_trips() {
        for mode in [PrefixMode::None, PrefixMode::Date, PrefixMode::DateTime] {
            assert_eq!(mode.to_string().parse::<PrefixMode>().unwrap(), mode);
        }
    }

    // === fit_to_path_budget ===

    #[test]
    fn short_names_pass_through() {
        let folder = PathBuf::from("/downloads");
        assert_eq!(fit_to_path_budget(&folder, "episode.mp3"), "episode.mp3");
    }

    #[test]
    fn long_names_are_truncated_keeping_extension() {
        let folder = PathBuf::from("/downloads");
        let long_name = format!("{}.mp3", "a".repeat(400));

        let fitted = fit_to_path_budget(&folder, &long_name);

        assert!(fitted.ends_with(".mp3"));
        let total = folder.to_string_lossy().chars().count() + 1 + fitted.chars().count();
        assert!(total < MAX_PATH_LEN, "composed path is {total} chars");
    }

    #[test]
    fn truncation_leaves_room_for_nothing_but_extension_in_the_worst_case() {
        let folder = PathBuf::from(format!("/{}", "d".repeat(250)));
        let fitted = fit_to_path_budget(&folder, "some very long episode name.mp3");
        assert!(fitted.ends_with(".mp3"));
        let total = folder.to_string_lossy().chars().count() + 1 + fitted.chars().count();
        assert!(total < MAX_PATH_LEN);
    }
}
