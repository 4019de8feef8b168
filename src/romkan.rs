//! Rōmaji to hiragana transliteration by greedy longest-match rewriting.
//!
//! The crate embeds no kana-mapping data of its own: callers build a
//! [`RomkanConverter`] from their own merged (default-table-overlaid-by-user)
//! `romaji -> hiragana` map.

use std::collections::HashMap;

use regex::{escape, Regex};

pub struct RomkanConverter {
    map: HashMap<String, String>,
    /// Left-anchored, longest-key-first alternation with a single-char
    /// fallback; used to greedily rewrite from the front of the string.
    pattern: Regex,
    /// End-anchored mirror of the same alternation; used to find the last
    /// "unit" for backspace handling.
    last_char_pattern: Regex,
}

impl RomkanConverter {
    /// `table` is the fully merged rōmaji→hiragana mapping (default table
    /// already overlaid by any user customization); longer keys are given
    /// priority during matching regardless of insertion order.
    pub fn build(table: &HashMap<String, String>) -> RomkanConverter {
        let mut keys: Vec<&String> = table.keys().collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()));

        let mut forward_src = String::from("^(");
        let mut backward_src = String::from("(");
        for key in &keys {
            forward_src.push_str(&escape(key));
            forward_src.push('|');
            backward_src.push_str(&escape(key));
            backward_src.push('|');
        }
        forward_src.push_str(".)");
        backward_src.push_str(".)$");

        RomkanConverter {
            map: table.clone(),
            pattern: Regex::new(&forward_src).expect("romkan forward pattern must compile"),
            last_char_pattern: Regex::new(&backward_src)
                .expect("romkan backward pattern must compile"),
        }
    }

    /// Lowercases, normalizes a bare `nn` run to `n'` (so it matches the
    /// `n'` table entry rather than two separate `n`s), then greedily
    /// consumes longest-matching fragments from the front, falling back to
    /// passing a fragment through verbatim when it has no table entry.
    pub fn to_hiragana(&self, input: &str) -> String {
        let lowered = input.to_lowercase();
        let normalized = lowered.replace("nn", "n'");

        let mut rest = normalized.as_str();
        let mut out = String::new();
        while !rest.is_empty() {
            let m = self
                .pattern
                .captures(rest)
                .and_then(|c| c.get(1))
                .expect("forward pattern always matches at least one char via the `.` fallback");
            let fragment = m.as_str();
            rest = &rest[fragment.len()..];
            match self.map.get(fragment) {
                Some(hira) => out.push_str(hira),
                None => out.push_str(fragment),
            }
        }
        out
    }

    /// Strips the last matched "unit" (one table key, or else one char) —
    /// used when a host wants to undo a single logical keystroke.
    pub fn remove_last_char(&self, input: &str) -> String {
        self.last_char_pattern.replace(input, "").into_owned()
    }
}
