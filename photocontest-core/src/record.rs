//! Registration Record - the row forwarded to the spreadsheet

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of image slots on a record.
pub const MAX_IMAGES: usize = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Mobile,
    Dslr,
}

impl Category {
    /// Display label for a raw category code.
    ///
    /// Only `mobile` is special-cased; every other code, including an unknown
    /// one, is filed under DSLR.
    pub fn label_for_code(code: &str) -> &'static str {
        match code {
            "mobile" => Category::Mobile.label(),
            _ => Category::Dslr.label(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Mobile => "Mobile Photography",
            Category::Dslr => "DSLR Photography",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mobile" => Ok(Category::Mobile),
            "dslr" => Ok(Category::Dslr),
            other => Err(format!("unknown category code: {other}")),
        }
    }
}

/// Editable form fields, addressed by their wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    NameBengali,
    NameEnglish,
    Category,
    Email,
    PhoneNumber,
    WhatsappNumber,
    Institution,
    Class,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::NameBengali,
        Field::NameEnglish,
        Field::Category,
        Field::Email,
        Field::PhoneNumber,
        Field::WhatsappNumber,
        Field::Institution,
        Field::Class,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            Field::NameBengali => "nameBengali",
            Field::NameEnglish => "nameEnglish",
            Field::Category => "category",
            Field::Email => "email",
            Field::PhoneNumber => "phoneNumber",
            Field::WhatsappNumber => "whatsappNumber",
            Field::Institution => "institution",
            Field::Class => "class",
        }
    }

    /// Human label used in notices.
    pub fn label(&self) -> &'static str {
        match self {
            Field::NameBengali => "Name (Bengali)",
            Field::NameEnglish => "Name (English)",
            Field::Category => "Category",
            Field::Email => "Email",
            Field::PhoneNumber => "Phone Number",
            Field::WhatsappNumber => "WhatsApp Number",
            Field::Institution => "Institution",
            Field::Class => "Class",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.wire_name() == s)
            .ok_or_else(|| format!("unknown field: {s}"))
    }
}

/// Values the applicant types in. `category` holds the raw code.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FormFields {
    pub name_bengali: String,
    pub name_english: String,
    pub category: String,
    pub email: String,
    pub phone_number: String,
    pub whatsapp_number: String,
    pub institution: String,
    pub class: String,
}

impl FormFields {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::NameBengali => &self.name_bengali,
            Field::NameEnglish => &self.name_english,
            Field::Category => &self.category,
            Field::Email => &self.email,
            Field::PhoneNumber => &self.phone_number,
            Field::WhatsappNumber => &self.whatsapp_number,
            Field::Institution => &self.institution,
            Field::Class => &self.class,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::NameBengali => &mut self.name_bengali,
            Field::NameEnglish => &mut self.name_english,
            Field::Category => &mut self.category,
            Field::Email => &mut self.email,
            Field::PhoneNumber => &mut self.phone_number,
            Field::WhatsappNumber => &mut self.whatsapp_number,
            Field::Institution => &mut self.institution,
            Field::Class => &mut self.class,
        };
        *slot = value.into();
    }

    /// Fields left blank (whitespace counts as blank), in form order.
    pub fn missing(&self) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|f| self.get(*f).trim().is_empty())
            .collect()
    }
}

/// One submission's worth of data, in the column order of the sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    pub name_bengali: String,
    pub name_english: String,
    pub category: String,
    pub email: String,
    pub phone_number: String,
    pub whatsapp_number: String,
    pub institution: String,
    pub class: String,
    pub image1: String,
    pub image2: String,
    pub image3: String,
}

impl RegistrationRecord {
    /// Assemble a record from field values and uploaded URLs.
    ///
    /// The category code is replaced by its display label. Slot N takes the
    /// Nth URL; missing slots are empty strings and URLs past the third are
    /// never forwarded.
    pub fn assemble(fields: &FormFields, image_urls: &[String]) -> Self {
        let slot = |i: usize| image_urls.get(i).cloned().unwrap_or_default();

        Self {
            name_bengali: fields.name_bengali.clone(),
            name_english: fields.name_english.clone(),
            category: Category::label_for_code(&fields.category).to_string(),
            email: fields.email.clone(),
            phone_number: fields.phone_number.clone(),
            whatsapp_number: fields.whatsapp_number.clone(),
            institution: fields.institution.clone(),
            class: fields.class.clone(),
            image1: slot(0),
            image2: slot(1),
            image3: slot(2),
        }
    }

    pub fn image_urls(&self) -> [&str; MAX_IMAGES] {
        [self.image1.as_str(), self.image2.as_str(), self.image3.as_str()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> FormFields {
        FormFields {
            name_bengali: "রহিম".to_string(),
            name_english: "Rahim".to_string(),
            category: "mobile".to_string(),
            email: "rahim@example.com".to_string(),
            phone_number: "01700000000".to_string(),
            whatsapp_number: "01700000001".to_string(),
            institution: "Dhaka College".to_string(),
            class: "11".to_string(),
        }
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(Category::label_for_code("mobile"), "Mobile Photography");
        assert_eq!(Category::label_for_code("dslr"), "DSLR Photography");
        assert_eq!(Category::label_for_code("film"), "DSLR Photography");
        assert_eq!(Category::label_for_code(""), "DSLR Photography");
        assert_eq!("mobile".parse::<Category>().map(|c| c.label()), Ok("Mobile Photography"));
        assert!("film".parse::<Category>().is_err());
    }

    #[test]
    fn test_record_serializes_with_sheet_field_names() {
        let record = RegistrationRecord::assemble(&filled(), &[]);
        let value = serde_json::to_value(&record).unwrap();
        let obj = value.as_object().unwrap();

        for key in [
            "nameBengali", "nameEnglish", "category", "email", "phoneNumber",
            "whatsappNumber", "institution", "class", "image1", "image2", "image3",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(obj.len(), 11);
        assert_eq!(obj["category"], "Mobile Photography");
    }

    #[test]
    fn test_assemble_fills_empty_slots() {
        let urls = vec!["https://cdn/a.jpg".to_string()];
        let record = RegistrationRecord::assemble(&filled(), &urls);
        assert_eq!(record.image_urls(), ["https://cdn/a.jpg", "", ""]);
    }

    #[test]
    fn test_assemble_caps_at_three_slots() {
        let urls: Vec<String> = (0..4).map(|i| format!("u{i}")).collect();
        let record = RegistrationRecord::assemble(&filled(), &urls);
        assert_eq!(record.image_urls(), ["u0", "u1", "u2"]);
    }

    #[test]
    fn test_field_lookup_by_wire_name() {
        assert_eq!("whatsappNumber".parse::<Field>(), Ok(Field::WhatsappNumber));
        assert!("nickname".parse::<Field>().is_err());

        let mut fields = FormFields::default();
        fields.set(Field::Class, "10");
        assert_eq!(fields.get(Field::Class), "10");
    }

    #[test]
    fn test_missing_treats_whitespace_as_blank() {
        let mut fields = filled();
        fields.email = "   ".to_string();
        assert_eq!(fields.missing(), vec![Field::Email]);
        assert_eq!(FormFields::default().missing().len(), 8);
    }
}
