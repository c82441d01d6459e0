//! Line protocol parsing
//!
//! Every line exchanged between the backend and a surface is one command:
//!
//! ```text
//! name key=value key=value ...
//! ipc://name?key=value&key=value
//! ```
//!
//! Parsing never fails. A line that cannot be read as a command becomes a
//! degenerate [`Command`] with an empty name, which every router treats as a
//! no-op (or forwards verbatim, for the surface→backend direction).

use std::fmt;

use crate::encoding::decode_uri_component;

/// Optional scheme prefix of the URI form
const IPC_SCHEME: &str = "ipc://";

/// Protocol verbs understood by the routers.
///
/// Unknown verbs are not an error: [`Command::verb`] returns `None` and the
/// routers ignore (or forward) them, so newer backends keep working with
/// older shells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Title,
    Exit,
    Navigate,
    Resolve,
    Send,
    Dialog,
    Context,
    Stdout,
    Show,
    Hide,
    External,
    Size,
    GetScreenSize,
    Menu,
    Restart,
    Inspect,
}

impl Verb {
    /// Look up a verb by its wire name (case-sensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let verb = match name {
            "title" => Verb::Title,
            "exit" => Verb::Exit,
            "navigate" => Verb::Navigate,
            "resolve" => Verb::Resolve,
            "send" => Verb::Send,
            "dialog" => Verb::Dialog,
            "context" => Verb::Context,
            "stdout" => Verb::Stdout,
            "show" => Verb::Show,
            "hide" => Verb::Hide,
            "external" => Verb::External,
            "size" => Verb::Size,
            "getScreenSize" => Verb::GetScreenSize,
            "menu" => Verb::Menu,
            "restart" => Verb::Restart,
            "inspect" => Verb::Inspect,
            _ => return None,
        };
        Some(verb)
    }

    /// Wire name of the verb
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Title => "title",
            Verb::Exit => "exit",
            Verb::Navigate => "navigate",
            Verb::Resolve => "resolve",
            Verb::Send => "send",
            Verb::Dialog => "dialog",
            Verb::Context => "context",
            Verb::Stdout => "stdout",
            Verb::Show => "show",
            Verb::Hide => "hide",
            Verb::External => "external",
            Verb::Size => "size",
            Verb::GetScreenSize => "getScreenSize",
            Verb::Menu => "menu",
            Verb::Restart => "restart",
            Verb::Inspect => "inspect",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed protocol line.
///
/// Field values are kept exactly as received (usually percent-encoded); use
/// [`Command::decoded`] where the plain text is needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    name: String,
    index: Option<usize>,
    fields: Vec<(String, String)>,
}

impl Command {
    /// Parse a single line. Trailing line terminators are ignored.
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']).trim();
        if line.is_empty() {
            return Self::default();
        }

        let (name, pairs): (&str, Box<dyn Iterator<Item = &str> + '_>) =
            if let Some(rest) = line.strip_prefix(IPC_SCHEME) {
                let (name, query) = rest.split_once('?').unwrap_or((rest, ""));
                // Values are encoded in this form, raw whitespace means a broken line
                if query.contains(char::is_whitespace) {
                    return Self::default();
                }
                (name, Box::new(query.split('&')))
            } else if let Some((name, query)) = uri_form(line) {
                (name, Box::new(query.split('&')))
            } else {
                let mut tokens = line.split_whitespace();
                let name = tokens.next().unwrap_or_default();
                (name, Box::new(tokens))
            };

        if !is_valid_name(name) {
            return Self::default();
        }

        let mut command = Self {
            name: name.to_string(),
            ..Self::default()
        };

        for pair in pairs {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            if key.is_empty() {
                continue;
            }
            if key == "index" {
                command.index = Some(value.trim().parse().unwrap_or(0));
            }
            command.insert(key, value);
        }

        command
    }

    fn insert(&mut self, key: &str, value: &str) {
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.fields.push((key.to_string(), value.to_string())),
        }
    }

    /// Verb name as received; empty for malformed lines
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Typed verb, `None` for unknown or empty names
    pub fn verb(&self) -> Option<Verb> {
        Verb::from_name(&self.name)
    }

    /// Target window index (defaults to 0)
    pub fn index(&self) -> usize {
        self.index.unwrap_or(0)
    }

    /// Whether the line carried an `index` field at all
    pub fn has_explicit_index(&self) -> bool {
        self.index.is_some()
    }

    /// Raw field value, or `""` when the field is absent.
    pub fn get(&self, key: &str) -> &str {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    /// Percent-decoded field value, or `""` when the field is absent.
    pub fn decoded(&self, key: &str) -> String {
        decode_uri_component(self.get(key))
    }

    /// Whether a field is present (even if empty)
    pub fn has(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    /// Correlation token; `None` when absent or empty
    pub fn seq(&self) -> Option<&str> {
        Some(self.get("seq")).filter(|s| !s.is_empty())
    }

    /// Raw `value` field
    pub fn value(&self) -> &str {
        self.get("value")
    }

    /// Fields in the order they were first seen
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// True for lines that did not parse into a command
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

/// `name?k=v&k=v` without the scheme. Only taken when the part before `?` is
/// a bare name, so a space-form line with a `?` inside a value is unaffected.
fn uri_form(line: &str) -> Option<(&str, &str)> {
    let (name, query) = line.split_once('?')?;
    if is_valid_name(name) && !query.contains(char::is_whitespace) {
        Some((name, query))
    } else {
        None
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

/// Parse an integer field value, trimming whitespace.
///
/// Callers pick their own fallback; `exit` uses 0, `size` fails the command.
pub fn parse_int(field: &str, value: &str) -> crate::Result<i32> {
    value
        .trim()
        .parse::<i32>()
        .map_err(|_| crate::Error::invalid_number(field, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_space_form() {
        let cmd = Command::parse("getScreenSize index=0 seq=7");
        assert_eq!(cmd.name(), "getScreenSize");
        assert_eq!(cmd.verb(), Some(Verb::GetScreenSize));
        assert_eq!(cmd.index(), 0);
        assert!(cmd.has_explicit_index());
        assert_eq!(cmd.seq(), Some("7"));
    }

    #[test]
    fn test_parse_uri_form() {
        let cmd = Command::parse("ipc://title?index=1&value=Hello%20World&seq=3");
        assert_eq!(cmd.verb(), Some(Verb::Title));
        assert_eq!(cmd.index(), 1);
        assert_eq!(cmd.value(), "Hello%20World");
        assert_eq!(cmd.decoded("value"), "Hello World");
        assert_eq!(cmd.seq(), Some("3"));
    }

    #[test]
    fn test_uri_form_with_raw_whitespace_is_degenerate() {
        let cmd = Command::parse("ipc://title?seq=1 2&value=x");
        assert!(cmd.is_empty());
        assert_eq!(cmd.seq(), None);

        assert_eq!(Command::parse("ipc://title?seq=1%202&value=x").get("seq"), "1%202");
    }

    #[test]
    fn test_parse_uri_form_without_scheme() {
        let cmd = Command::parse("navigate?index=1&value=file%3A%2F%2Fa.html");
        assert_eq!(cmd.verb(), Some(Verb::Navigate));
        assert_eq!(cmd.index(), 1);
        assert_eq!(cmd.decoded("value"), "file://a.html");
    }

    #[test]
    fn test_missing_field_is_empty_string() {
        let cmd = Command::parse("exit");
        assert_eq!(cmd.get("value"), "");
        assert_eq!(cmd.decoded("nothing"), "");
        assert_eq!(cmd.seq(), None);
        assert!(!cmd.has("value"));
    }

    #[test]
    fn test_empty_seq_is_absent() {
        let cmd = Command::parse("external value=x seq=");
        assert!(cmd.has("seq"));
        assert_eq!(cmd.seq(), None);
    }

    #[test]
    fn test_field_lookup_is_case_sensitive() {
        let cmd = Command::parse("send Event=a event=b");
        assert_eq!(cmd.get("event"), "b");
        assert_eq!(cmd.get("Event"), "a");
        assert_eq!(cmd.get("EVENT"), "");
    }

    #[test]
    fn test_value_split_on_first_equals() {
        let cmd = Command::parse("send event=x value=a=b=c");
        assert_eq!(cmd.value(), "a=b=c");
    }

    #[test]
    fn test_repeated_key_last_wins_in_place() {
        let cmd = Command::parse("title value=a seq=1 value=b");
        assert_eq!(cmd.value(), "b");
        let keys: Vec<_> = cmd.fields().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["value", "seq"]);
    }

    #[test]
    fn test_tokens_without_equals_are_ignored() {
        let cmd = Command::parse("show stray index=1 =nokey");
        assert_eq!(cmd.verb(), Some(Verb::Show));
        assert_eq!(cmd.index(), 1);
        assert_eq!(cmd.fields().count(), 1);
    }

    #[test]
    fn test_unparseable_index_defaults_to_zero() {
        let cmd = Command::parse("show index=abc");
        assert_eq!(cmd.index(), 0);
        assert!(cmd.has_explicit_index());

        let cmd = Command::parse("show");
        assert_eq!(cmd.index(), 0);
        assert!(!cmd.has_explicit_index());
    }

    #[test]
    fn test_malformed_lines_are_degenerate() {
        for line in ["", "   ", "\n", "{\"json\":true}", "=value", "héllo value=1"] {
            let cmd = Command::parse(line);
            assert!(cmd.is_empty(), "expected degenerate command for {:?}", line);
            assert_eq!(cmd.get("value"), "");
            assert_eq!(cmd.verb(), None);
        }
    }

    #[test]
    fn test_unknown_verb_parses_without_verb() {
        let cmd = Command::parse("teleport value=mars");
        assert_eq!(cmd.name(), "teleport");
        assert_eq!(cmd.verb(), None);
        assert_eq!(cmd.value(), "mars");
    }

    #[test]
    fn test_line_terminators_are_stripped() {
        let cmd = Command::parse("exit value=3\r\n");
        assert_eq!(cmd.value(), "3");
    }

    #[test]
    fn test_parse_is_deterministic() {
        let lines = [
            "getScreenSize index=0 seq=7",
            "ipc://send?event=ready&value=%7B%7D",
            "garbage \u{0}",
            "",
        ];
        for line in lines {
            assert_eq!(Command::parse(line), Command::parse(line));
        }
    }

    #[test]
    fn test_verb_names_round_trip() {
        let verbs = [
            Verb::Title,
            Verb::Exit,
            Verb::Navigate,
            Verb::Resolve,
            Verb::Send,
            Verb::Dialog,
            Verb::Context,
            Verb::Stdout,
            Verb::Show,
            Verb::Hide,
            Verb::External,
            Verb::Size,
            Verb::GetScreenSize,
            Verb::Menu,
            Verb::Restart,
            Verb::Inspect,
        ];
        for verb in verbs {
            assert_eq!(Verb::from_name(verb.as_str()), Some(verb));
        }
        assert_eq!(Verb::from_name("Title"), None);
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("value", "42").unwrap(), 42);
        assert_eq!(parse_int("value", " -3 ").unwrap(), -3);
        assert!(parse_int("value", "4x").is_err());
        assert!(parse_int("value", "").is_err());
    }
}
