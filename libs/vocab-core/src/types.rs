//! Core types for the vocabulary card schema.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel stored for grammatical attributes the dataset leaves blank.
pub const NOT_APPLICABLE: &str = "N/A";

/// Deck name reserved for free-form notes next to the skill decks.
pub(crate) const NOTES_DECK: &str = "Notes";

/// A named, numbered lesson group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillGroup {
    pub ordinal: i64,
    pub name: String,
}

impl SkillGroup {
    pub fn new(ordinal: i64, name: impl Into<String>) -> Self {
        Self {
            ordinal,
            name: name.into(),
        }
    }

    /// Remote deck name, e.g. `"12. Food"`.
    pub fn deck_name(&self) -> String {
        format!("{}. {}", self.ordinal, self.name)
    }

    /// Zero-padded key used for Anki deck paths and tags, e.g. `"05. Food"`.
    pub fn sort_key(&self) -> String {
        format!("{:02}. {}", self.ordinal, self.name)
    }

    /// Whether a skill name can round-trip through its deck name.
    pub fn is_valid_name(name: &str) -> bool {
        let name = name.trim();
        !name.is_empty() && name != NOTES_DECK
    }

    /// Parse a remote deck name back into a skill group.
    ///
    /// Returns `None` for names without an integer `"<n>. "` prefix and for
    /// the notes deck.
    pub fn parse_deck_name(name: &str) -> Option<Self> {
        let (prefix, skill) = name.split_once(". ")?;
        let ordinal = prefix.trim().parse::<i64>().ok()?;
        if skill.is_empty() || skill == NOTES_DECK {
            return None;
        }
        Some(Self::new(ordinal, skill))
    }
}

/// One vocabulary entry, already assigned to its skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyRecord {
    pub skill: SkillGroup,
    pub hebrew: String,
    pub niqqud: String,
    pub transliteration: String,
    pub translation: String,
    pub gender: String,
    pub number: String,
    pub form: String,
    pub word_type: String,
}

/// Composite identity used to detect an existing remote card.
///
/// Hebrew spelling and vowelization are deliberately absent: two sources may
/// spell the same word differently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint {
    pub translation: String,
    pub skill: String,
    pub gender: String,
    pub number: String,
    pub form: String,
    pub word_type: String,
}

impl Fingerprint {
    pub fn new(
        translation: &str,
        skill: &str,
        gender: &str,
        number: &str,
        form: &str,
        word_type: &str,
    ) -> Self {
        Self {
            translation: translation.to_string(),
            skill: skill.to_string(),
            gender: or_sentinel(gender),
            number: or_sentinel(number),
            form: or_sentinel(form),
            word_type: or_sentinel(word_type),
        }
    }
}

/// Map blank attribute values onto the sentinel.
pub(crate) fn or_sentinel(value: &str) -> String {
    if value.trim().is_empty() {
        NOT_APPLICABLE.to_string()
    } else {
        value.to_string()
    }
}

/// Fixed field keys of the remote card template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKey {
    Hebrew,
    Niqqud,
    Transliteration,
    Translation,
    Gender,
    Number,
    Form,
    Type,
    Audio,
}

impl FieldKey {
    /// Keys every created card carries.
    pub const CARD: [FieldKey; 8] = [
        Self::Hebrew,
        Self::Niqqud,
        Self::Transliteration,
        Self::Translation,
        Self::Gender,
        Self::Number,
        Self::Form,
        Self::Type,
    ];

    /// Template field id.
    pub fn id(self) -> &'static str {
        match self {
            Self::Hebrew => "SN2D3Qsv",
            Self::Niqqud => "bqI7P9U8",
            Self::Transliteration => "AB9ZA1Qw",
            Self::Translation => "BHGrp74l",
            Self::Gender => "OubS6rNu",
            Self::Number => "x2CPIOeh",
            Self::Form => "hQpDm4Xy",
            Self::Type => "C0QicIIh",
            Self::Audio => "E17KMyhO",
        }
    }

    /// Human readable field name, as used by the Anki note model.
    pub fn label(self) -> &'static str {
        match self {
            Self::Hebrew => "Hebrew",
            Self::Niqqud => "Niqqud",
            Self::Transliteration => "Transliteration",
            Self::Translation => "Translation",
            Self::Gender => "Gender",
            Self::Number => "Number",
            Self::Form => "Form",
            Self::Type => "Type",
            Self::Audio => "Audio",
        }
    }
}

/// A single template field value as the remote store serializes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    pub id: String,
    #[serde(default)]
    pub value: String,
}

impl FieldValue {
    pub fn new(key: FieldKey, value: impl Into<String>) -> Self {
        Self {
            id: key.id().to_string(),
            value: value.into(),
        }
    }
}

/// Field mapping keyed by template field id.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Markdown reference to an uploaded attachment.
pub fn audio_markdown(file_name: &str) -> String {
    format!("![audio](@media/{})", file_name)
}

impl VocabularyRecord {
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::new(
            &self.translation,
            &self.skill.name,
            &self.gender,
            &self.number,
            &self.form,
            &self.word_type,
        )
    }

    /// Value for a card field. `Audio` is not part of the record.
    pub fn value(&self, key: FieldKey) -> Option<&str> {
        let value = match key {
            FieldKey::Hebrew => &self.hebrew,
            FieldKey::Niqqud => &self.niqqud,
            FieldKey::Transliteration => &self.transliteration,
            FieldKey::Translation => &self.translation,
            FieldKey::Gender => &self.gender,
            FieldKey::Number => &self.number,
            FieldKey::Form => &self.form,
            FieldKey::Type => &self.word_type,
            FieldKey::Audio => return None,
        };
        Some(value.as_str())
    }

    /// Structured fields for the remote card, optionally with an audio reference.
    pub fn card_fields(&self, audio: Option<&str>) -> FieldMap {
        let mut fields: FieldMap = FieldKey::CARD
            .iter()
            .filter_map(|&key| {
                self.value(key)
                    .map(|value| (key.id().to_string(), FieldValue::new(key, value)))
            })
            .collect();

        if let Some(audio) = audio {
            fields.insert(
                FieldKey::Audio.id().to_string(),
                FieldValue::new(FieldKey::Audio, audio),
            );
        }
        fields
    }

    /// Markdown body shown on the remote card.
    pub fn card_content(&self, audio: Option<&str>) -> String {
        let mut content = format!(
            "# {} ({})\n\n{}\n\n---\n\n{}\n\nGender: {}\nNumber: {}\nForm: {}\nType: {}",
            self.hebrew,
            self.niqqud,
            self.transliteration,
            self.translation,
            self.gender,
            self.number,
            self.form,
            self.word_type,
        );
        if let Some(audio) = audio {
            content.push_str("\n\n");
            content.push_str(audio);
        }
        content
    }
}

/// Rebuild a fingerprint from a remote card's fields.
///
/// `skill` is the skill of the deck holding the card. Cards without a
/// translation cannot be matched and yield `None`.
pub fn fingerprint_from_fields(fields: &FieldMap, skill: &str) -> Option<Fingerprint> {
    let read = |key: FieldKey| fields.get(key.id()).map(|f| f.value.as_str());

    let translation = read(FieldKey::Translation).filter(|t| !t.is_empty())?;
    Some(Fingerprint::new(
        translation,
        skill,
        read(FieldKey::Gender).unwrap_or(NOT_APPLICABLE),
        read(FieldKey::Number).unwrap_or(NOT_APPLICABLE),
        read(FieldKey::Form).unwrap_or(NOT_APPLICABLE),
        read(FieldKey::Type).unwrap_or(NOT_APPLICABLE),
    ))
}
