use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Records shorter than this (in characters, after trimming) are dropped while mapping.
const MIN_TEXT_CHARS: usize = 10;

pub const SOURCE_NAME: &str = "fawazahmed0";

/// A single hadith as returned to API callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HadithResult {
    pub hadith_number: String,
    pub collection: String,
    pub book_name: String,
    pub chapter_name: String,
    pub hadith_arabic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hadith_english: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrator: Option<String>,
    pub source: String,
}

impl HadithResult {
    /// Key used to collapse duplicate records coming from different editions.
    pub fn dedup_key(&self) -> &str {
        self.hadith_arabic.trim()
    }
}

/// One full edition document from the upstream editions API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Edition {
    #[serde(default)]
    pub metadata: EditionMetadata,
    #[serde(default)]
    pub collection_name: Option<String>,
    pub hadiths: Vec<RawHadith>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditionMetadata {
    #[serde(default)]
    pub name: Option<String>,
    /// Book number -> book title
    #[serde(default)]
    pub section: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHadith {
    #[serde(default)]
    pub hadithnumber: Option<NumberOrText>,
    #[serde(default)]
    pub number: Option<NumberOrText>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub english: Option<String>,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub grades: Vec<GradeEntry>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub reference: Option<Reference>,
    #[serde(default)]
    pub book: Option<Label>,
    #[serde(default, rename = "bookName")]
    pub book_name: Option<String>,
    #[serde(default)]
    pub chapter: Option<Label>,
    #[serde(default, rename = "chapterName")]
    pub chapter_name: Option<String>,
    #[serde(default)]
    pub narrator: Option<String>,
    #[serde(default)]
    pub reporter: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

impl fmt::Display for NumberOrText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberOrText::Number(n) => write!(f, "{}", n),
            NumberOrText::Text(s) => write!(f, "{}", s.trim()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GradeEntry {
    Detailed { grade: String },
    Plain(String),
}

impl GradeEntry {
    fn grade(&self) -> &str {
        match self {
            GradeEntry::Detailed { grade } => grade,
            GradeEntry::Plain(grade) => grade,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Reference {
    #[serde(default)]
    pub book: Option<NumberOrText>,
    #[serde(default)]
    pub hadith: Option<NumberOrText>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Named {
    #[serde(default)]
    pub name: Option<String>,
}

/// A book or chapter label, which upstream sends as an object, a bare string or a number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Named(Named),
    Title(String),
    Other(serde_json::Value),
}

impl Label {
    fn into_name(self) -> Option<String> {
        match self {
            Label::Named(named) => named.name,
            Label::Title(title) => Some(title),
            Label::Other(_) => None,
        }
    }
}

impl Edition {
    /// Map the upstream document into flat results, dropping records without usable text.
    pub fn into_results(self, slug: &str) -> Vec<HadithResult> {
        let collection = self
            .metadata
            .name
            .clone()
            .or_else(|| self.collection_name.clone())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| slug.to_string());
        let arabic_edition = slug.starts_with("ara-");
        let sections = self.metadata.section;

        self.hadiths
            .into_iter()
            .filter_map(|raw| {
                let text = non_empty(raw.text)
                    .or_else(|| non_empty(raw.english))
                    .or_else(|| non_empty(raw.translation))?;
                if text.trim().chars().count() <= MIN_TEXT_CHARS {
                    return None;
                }

                let hadith_number = raw
                    .hadithnumber
                    .or(raw.number)
                    .map(|n| n.to_string())
                    .unwrap_or_default();

                let book_from_section = raw
                    .reference
                    .as_ref()
                    .and_then(|r| r.book.as_ref())
                    .and_then(|b| sections.get(&b.to_string()))
                    .cloned();
                let book_name = raw
                    .book
                    .and_then(Label::into_name)
                    .or(raw.book_name)
                    .or(book_from_section)
                    .unwrap_or_default();

                let chapter_name = raw
                    .chapter
                    .and_then(Label::into_name)
                    .or(raw.chapter_name)
                    .unwrap_or_default();

                let grade = raw
                    .grades
                    .first()
                    .map(|g| g.grade().to_string())
                    .or(raw.grade)
                    .and_then(|g| non_empty(Some(g)));

                let narrator = non_empty(raw.narrator).or_else(|| non_empty(raw.reporter));

                Some(HadithResult {
                    hadith_number,
                    collection: collection.clone(),
                    book_name,
                    chapter_name,
                    hadith_english: if arabic_edition { None } else { Some(text.clone()) },
                    hadith_arabic: text,
                    grade,
                    narrator,
                    source: SOURCE_NAME.to_string(),
                })
            })
            .collect()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "metadata": {
            "name": "Sahih al Bukhari",
            "section": {"0": "", "1": "Revelation", "2": "Belief"}
        },
        "hadiths": [
            {"hadithnumber": 1, "arabicnumber": 1, "text": "إنما الأعمال بالنيات وإنما لكل امرئ ما نوى",
             "grades": [], "reference": {"book": 1, "hadith": 1}},
            {"hadithnumber": 2.5, "text": "قصير",
             "grades": [], "reference": {"book": 1, "hadith": 2}},
            {"hadithnumber": "8", "text": "بني الإسلام على خمس شهادة أن لا إله إلا الله",
             "grades": [{"name": "Albani", "grade": "Sahih"}], "reference": {"book": 2, "hadith": 1}}
        ]
    }"#;

    #[test]
    fn test_maps_edition_document() {
        let edition: Edition = serde_json::from_str(SAMPLE).unwrap();
        let results = edition.into_results("ara-bukhari");

        // The short record is dropped
        assert_eq!(results.len(), 2);

        assert_eq!(results[0].hadith_number, "1");
        assert_eq!(results[0].collection, "Sahih al Bukhari");
        assert_eq!(results[0].book_name, "Revelation");
        assert_eq!(results[0].hadith_english, None);
        assert_eq!(results[0].grade, None);
        assert_eq!(results[0].source, SOURCE_NAME);

        assert_eq!(results[1].hadith_number, "8");
        assert_eq!(results[1].book_name, "Belief");
        assert_eq!(results[1].grade.as_deref(), Some("Sahih"));
    }

    #[test]
    fn test_tolerates_alternative_field_names() {
        let json = r#"{
            "collection_name": "Muwatta",
            "hadiths": [
                {"number": 12, "english": "Actions are judged by their intentions only",
                 "bookName": "Book of Faith", "chapter": "Intentions",
                 "grade": "Hasan", "reporter": "Umar"}
            ]
        }"#;
        let edition: Edition = serde_json::from_str(json).unwrap();
        let results = edition.into_results("eng-malik");

        assert_eq!(results.len(), 1);
        let h = &results[0];
        assert_eq!(h.hadith_number, "12");
        assert_eq!(h.collection, "Muwatta");
        assert_eq!(h.book_name, "Book of Faith");
        assert_eq!(h.chapter_name, "Intentions");
        assert_eq!(h.grade.as_deref(), Some("Hasan"));
        assert_eq!(h.narrator.as_deref(), Some("Umar"));
        assert!(h.hadith_english.is_some());
    }

    #[test]
    fn test_serializes_camel_case_and_skips_missing() {
        let h = HadithResult {
            hadith_number: "3".to_string(),
            collection: "Sahih Muslim".to_string(),
            book_name: String::new(),
            chapter_name: String::new(),
            hadith_arabic: "نص الحديث".to_string(),
            hadith_english: None,
            grade: None,
            narrator: None,
            source: SOURCE_NAME.to_string(),
        };
        let value = serde_json::to_value(&h).unwrap();

        assert_eq!(value["hadithNumber"], "3");
        assert_eq!(value["hadithArabic"], "نص الحديث");
        assert!(value.get("hadithEnglish").is_none());
        assert!(value.get("grade").is_none());
    }

    #[test]
    fn test_missing_hadiths_is_rejected() {
        let result = serde_json::from_str::<Edition>(r#"{"metadata": {"name": "x"}}"#);
        assert!(result.is_err());
    }
}
