//! The "Hebrew Vocabulary" note model and its JSON form.

use serde_json::{json, Value};
use sha2::{Digest, Sha256};

pub const MODEL_NAME: &str = "Hebrew Vocabulary";

/// Note fields in order.
pub const FIELDS: [&str; 10] = [
    "Hebrew",
    "Niqqud",
    "Transliteration",
    "Translation",
    "Gender",
    "Number",
    "Form",
    "Type",
    "Audio",
    "Tags",
];

/// A card template: name, question format, answer format.
pub struct Template {
    pub name: &'static str,
    pub qfmt: &'static str,
    pub afmt: &'static str,
}

pub const TEMPLATES: [Template; 2] = [
    Template {
        name: "Hebrew to English",
        qfmt: r#"<div class="prettify-flashcard" style="text-align: center;">
<div class="prettify-field prettify-field--front">
    <h1>{{Hebrew}}</h1>
    <h2>{{Niqqud}}</h2>
    <p>{{Transliteration}}</p>
    {{Audio}}
</div>
</div>"#,
        afmt: r#"<div class="prettify-flashcard" style="text-align: center;">
<div class="prettify-field prettify-field--front">
    <h1>{{Hebrew}}</h1>
    <h2>{{Niqqud}}</h2>
    <p>{{Transliteration}}</p>
    {{Audio}}
</div>
<hr class="prettify-divider prettify-divider--answer" id="answer" />
<div class="prettify-field prettify-field--back">
    <h1>{{Translation}}</h1>
    {{#Gender}}<p><strong>Gender:</strong> {{Gender}}</p>{{/Gender}}
    {{#Number}}<p><strong>Number:</strong> {{Number}}</p>{{/Number}}
    {{#Form}}<p><strong>Form:</strong> {{Form}}</p>{{/Form}}
    {{#Type}}<p><strong>Type:</strong> {{Type}}</p>{{/Type}}
</div>
{{#Tags}}<div class="prettify-tags">{{clickable:Tags}}</div>{{/Tags}}
</div>"#,
    },
    Template {
        name: "English to Hebrew",
        qfmt: r#"<div class="prettify-flashcard" style="text-align: center;">
<div class="prettify-field prettify-field--front">
    <h1>{{Translation}}</h1>
</div>
</div>"#,
        afmt: r#"<div class="prettify-flashcard" style="text-align: center;">
<div class="prettify-field prettify-field--front">
    <h1>{{Translation}}</h1>
    {{#Gender}}<p><strong>Gender:</strong> {{Gender}}</p>{{/Gender}}
    {{#Number}}<p><strong>Number:</strong> {{Number}}</p>{{/Number}}
    {{#Form}}<p><strong>Form:</strong> {{Form}}</p>{{/Form}}
    {{#Type}}<p><strong>Type:</strong> {{Type}}</p>{{/Type}}
</div>
<hr class="prettify-divider prettify-divider--answer" id="answer" />
<div class="prettify-field prettify-field--back">
    <h1>{{Hebrew}}</h1>
    <h2>{{Niqqud}}</h2>
    <p>{{Transliteration}}</p>
    {{Audio}}
</div>
{{#Tags}}<div class="prettify-tags">{{clickable:Tags}}</div>{{/Tags}}
</div>"#,
    },
];

pub const DEFAULT_CSS: &str = r#".card {
    font-family: "Segoe UI", Arial, sans-serif;
    font-size: 20px;
    color: #1f2328;
    background-color: #fafafa;
}

.prettify-flashcard {
    max-width: 36em;
    margin: 1em auto;
}

.prettify-field h1,
.prettify-field h2 {
    margin: 0.3em 0;
}

.prettify-field--front h1,
.prettify-field--front h2 {
    direction: rtl;
}

.prettify-divider {
    border: none;
    border-top: 1px solid #d0d7de;
    margin: 1em 0;
}

.prettify-tags {
    font-size: 0.7em;
    color: #57606a;
}
"#;

/// Field indexes a template needs at least one of to produce a card.
fn required_fields(template: usize) -> Value {
    match template {
        0 => json!([template, "any", [0, 1, 2, 8]]),
        _ => json!([template, "any", [3]]),
    }
}

/// Positive id derived from `key`, stable across runs and small enough for
/// the JSON number type Anki reads ids with.
pub fn stable_id(key: &str) -> i64 {
    let digest = Sha256::digest(key.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(bytes) >> 12) as i64
}

/// Model JSON as stored in `col.models`.
pub fn model_json(model_id: i64, deck_id: i64, css: &str, modified: i64) -> Value {
    let fields: Vec<Value> = FIELDS
        .iter()
        .enumerate()
        .map(|(ord, name)| {
            json!({
                "name": name,
                "ord": ord,
                "sticky": false,
                "rtl": false,
                "font": "Arial",
                "size": 20,
                "media": [],
            })
        })
        .collect();

    let templates: Vec<Value> = TEMPLATES
        .iter()
        .enumerate()
        .map(|(ord, t)| {
            json!({
                "name": t.name,
                "ord": ord,
                "qfmt": t.qfmt,
                "afmt": t.afmt,
                "bqfmt": "",
                "bafmt": "",
                "did": null,
            })
        })
        .collect();

    json!({
        "id": model_id,
        "name": MODEL_NAME,
        "type": 0,
        "mod": modified,
        "usn": -1,
        "sortf": 0,
        "did": deck_id,
        "tmpls": templates,
        "flds": fields,
        "css": css,
        "latexPre": "\\documentclass[12pt]{article}\n\\special{papersize=3in,5in}\n\\usepackage{amssymb,amsmath}\n\\pagestyle{empty}\n\\setlength{\\parindent}{0in}\n\\begin{document}\n",
        "latexPost": "\\end{document}",
        "latexsvg": false,
        "req": (0..TEMPLATES.len()).map(required_fields).collect::<Vec<_>>(),
        "tags": [],
        "vers": [],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn stable_id_is_deterministic_and_positive() {
        let id = stable_id("Hebrew Vocabulary::Skills::05. Food");
        assert_eq!(id, stable_id("Hebrew Vocabulary::Skills::05. Food"));
        assert_ne!(id, stable_id("Hebrew Vocabulary::Skills::06. Food"));
        assert!(id > 0);
        assert!(id < (1i64 << 52));
    }

    #[test]
    fn model_lists_fields_and_templates_in_order() {
        let model = model_json(7, 9, DEFAULT_CSS, 0);
        let names: Vec<&str> = model["flds"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, FIELDS.to_vec());

        let templates = model["tmpls"].as_array().unwrap();
        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0]["name"], "Hebrew to English");
        assert_eq!(templates[1]["name"], "English to Hebrew");
        assert_eq!(model["req"][1], json!([1, "any", [3]]));
    }

    #[test]
    fn audio_plays_with_the_hebrew_side() {
        assert!(TEMPLATES[0].qfmt.contains("{{Audio}}"));
        assert!(!TEMPLATES[1].qfmt.contains("{{Audio}}"));
        assert!(TEMPLATES[1].afmt.contains("{{Audio}}"));
    }
}
