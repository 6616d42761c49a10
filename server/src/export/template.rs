// String-key placeholder substitution for report templates. `{name}`
// is replaced when the key exists; unknown braces pass through verbatim
// so CSS blocks in templates survive.

use std::collections::HashMap;

pub fn apply(template: &str, values: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find(['{', '}']) {
            Some(close) if after.as_bytes()[close] == b'}' => {
                let key = &after[..close];
                if let Some(value) = values.get(key) {
                    out.push_str(value);
                } else {
                    out.push('{');
                    out.push_str(key);
                    out.push('}');
                }
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_known_keys() {
        let result = apply(
            "<h1>{track} — {phase}</h1>",
            &values(&[("track", "AS5"), ("phase", "race")]),
        );
        assert_eq!(result, "<h1>AS5 — race</h1>");
    }

    #[test]
    fn leaves_unknown_keys_and_css_braces_alone() {
        let template = "body { color: red } {missing} {track}";
        let result = apply(template, &values(&[("track", "AS5")]));
        assert_eq!(result, "body { color: red } {missing} AS5");
    }

    #[test]
    fn handles_nested_open_brace() {
        let result = apply("a {{track}", &values(&[("track", "AS5")]));
        assert_eq!(result, "a {AS5");
    }
}
