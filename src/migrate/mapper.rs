//! Field mapping between the source and destination item schemas.
//!
//! Mapping runs in two steps:
//! 1. [`map`] reads a [`RawItem`] into a provider-agnostic [`NormalizedItem`],
//!    validating every value against the destination's constraints.
//! 2. [`denormalize`] lays a [`NormalizedItem`] out as a [`DestinationItem`]
//!    using the fixed per-kind tables below. This step cannot fail and copies
//!    every normalized value unchanged.
//!
//! Both steps are deterministic: the same input always yields the same output.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::migrate::classify::ItemKind;
use crate::model::{
    Category, DestinationItem, FieldPurpose, FieldType, ItemField, ItemUrl, RawItem, Section,
    SectionRef,
};

/// Longest accepted item title, in bytes.
pub const MAX_TITLE_LEN: usize = 512;
/// Longest accepted field value (including URLs and custom fields), in bytes.
pub const MAX_VALUE_LEN: usize = 8 * 1024;
/// Longest accepted notes body, in bytes.
pub const MAX_NOTES_LEN: usize = 64 * 1024;

/// Longest card number, in digits.
const MAX_CARD_DIGITS: usize = 19;

const NOTES_FIELD_ID: &str = "notesPlain";
const CUSTOM_SECTION_ID: &str = "custom_fields";
const CUSTOM_SECTION_LABEL: &str = "Custom Fields";

// ============================================================================
// Errors
// ============================================================================

/// A source value that cannot be represented in the destination schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Field '{field}' cannot be mapped: {reason}")]
pub struct FieldMappingError {
    /// Semantic name of the offending field (e.g. `expiryDate`).
    pub field: String,
    pub reason: String,
}

impl FieldMappingError {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Normalized representation
// ============================================================================

/// Semantic field names. Each kind accepts a fixed subset, see
/// [`FieldName::vocabulary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    Username,
    Password,
    OneTimePassword,
    CardholderName,
    CardNumber,
    CardBrand,
    ExpiryDate,
    SecurityCode,
    NameTitle,
    FirstName,
    MiddleName,
    LastName,
    Company,
    Address,
    Phone,
    Email,
}

impl FieldName {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::Username => "username",
            FieldName::Password => "password",
            FieldName::OneTimePassword => "oneTimePassword",
            FieldName::CardholderName => "cardholderName",
            FieldName::CardNumber => "cardNumber",
            FieldName::CardBrand => "cardBrand",
            FieldName::ExpiryDate => "expiryDate",
            FieldName::SecurityCode => "securityCode",
            FieldName::NameTitle => "nameTitle",
            FieldName::FirstName => "firstName",
            FieldName::MiddleName => "middleName",
            FieldName::LastName => "lastName",
            FieldName::Company => "company",
            FieldName::Address => "address",
            FieldName::Phone => "phone",
            FieldName::Email => "email",
        }
    }

    /// Field names a [`NormalizedItem`] of `kind` may carry.
    pub fn vocabulary(kind: ItemKind) -> &'static [FieldName] {
        match kind {
            ItemKind::Login => &[
                FieldName::Username,
                FieldName::Password,
                FieldName::OneTimePassword,
            ],
            ItemKind::SecureNote => &[],
            ItemKind::CreditCard => &[
                FieldName::CardholderName,
                FieldName::CardNumber,
                FieldName::CardBrand,
                FieldName::ExpiryDate,
                FieldName::SecurityCode,
            ],
            ItemKind::Identity => &[
                FieldName::NameTitle,
                FieldName::FirstName,
                FieldName::MiddleName,
                FieldName::LastName,
                FieldName::Company,
                FieldName::Address,
                FieldName::Phone,
                FieldName::Username,
                FieldName::Email,
            ],
        }
    }
}

/// Source data with no dedicated destination field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub label: String,
    pub value: String,
    pub concealed: bool,
}

/// Provider-agnostic item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedItem {
    pub source_id: String,
    pub kind: ItemKind,
    pub title: String,
    pub notes: String,
    fields: BTreeMap<FieldName, String>,
    /// Ordered; the first entry is the primary URL.
    pub urls: Vec<String>,
    pub overflow: Vec<CustomField>,
}

impl NormalizedItem {
    /// Creates an empty item after checking the title.
    pub fn new(source_id: &str, kind: ItemKind, title: &str) -> Result<Self, FieldMappingError> {
        if title.trim().is_empty() {
            return Err(FieldMappingError::new("title", "title is empty"));
        }
        check_len("title", title, MAX_TITLE_LEN)?;

        Ok(Self {
            source_id: source_id.to_string(),
            kind,
            title: title.to_string(),
            notes: String::new(),
            fields: BTreeMap::new(),
            urls: Vec::new(),
            overflow: Vec::new(),
        })
    }

    /// Sets a field. Empty values are ignored so absent stays absent.
    ///
    /// # Errors
    ///
    /// Fails if `name` is outside this kind's vocabulary or the value is too
    /// long for the destination.
    pub fn insert(&mut self, name: FieldName, value: &str) -> Result<(), FieldMappingError> {
        if !FieldName::vocabulary(self.kind).contains(&name) {
            return Err(FieldMappingError::new(
                name.as_str(),
                format!("not a {} field", self.kind),
            ));
        }
        if value.is_empty() {
            return Ok(());
        }
        check_len(name.as_str(), value, MAX_VALUE_LEN)?;
        self.fields.insert(name, value.to_string());
        Ok(())
    }

    pub fn get(&self, name: FieldName) -> Option<&str> {
        self.fields.get(&name).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (FieldName, &str)> {
        self.fields.iter().map(|(name, value)| (*name, value.as_str()))
    }

    pub fn set_notes(&mut self, notes: &str) -> Result<(), FieldMappingError> {
        check_len("notes", notes, MAX_NOTES_LEN)?;
        self.notes = notes.to_string();
        Ok(())
    }

    pub fn push_url(&mut self, url: &str) -> Result<(), FieldMappingError> {
        if url.is_empty() {
            return Ok(());
        }
        check_len("urls", url, MAX_VALUE_LEN)?;
        self.urls.push(url.to_string());
        Ok(())
    }

    pub fn push_overflow(
        &mut self,
        label: &str,
        value: &str,
        concealed: bool,
    ) -> Result<(), FieldMappingError> {
        check_len(label, value, MAX_VALUE_LEN)?;
        self.overflow.push(CustomField {
            label: label.to_string(),
            value: value.to_string(),
            concealed,
        });
        Ok(())
    }
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), FieldMappingError> {
    if value.len() > max {
        return Err(FieldMappingError::new(
            field,
            format!("{} bytes exceeds the limit of {}", value.len(), max),
        ));
    }
    Ok(())
}

// ============================================================================
// Source -> normalized
// ============================================================================

/// Reads `raw` as an item of `kind`.
pub fn map(raw: &RawItem, kind: ItemKind) -> Result<NormalizedItem, FieldMappingError> {
    let mut item = NormalizedItem::new(&raw.id, kind, &raw.name)?;
    item.set_notes(raw.notes.as_deref().unwrap_or_default())?;

    match kind {
        ItemKind::Login => map_login(raw, &mut item)?,
        // Title and notes carry the whole note.
        ItemKind::SecureNote => {}
        ItemKind::CreditCard => map_card(raw, &mut item)?,
        ItemKind::Identity => map_identity(raw, &mut item)?,
    }

    map_custom_fields(raw, &mut item)?;
    map_unmapped(raw, &mut item)?;
    Ok(item)
}

fn map_login(raw: &RawItem, item: &mut NormalizedItem) -> Result<(), FieldMappingError> {
    let Some(login) = raw.login.as_ref() else {
        return Ok(());
    };

    let username = login.username.as_deref().unwrap_or_default();
    item.insert(FieldName::Username, username)?;
    item.insert(
        FieldName::Password,
        login.password.as_deref().unwrap_or_default(),
    )?;

    if let Some(seed) = login.totp.as_deref().filter(|s| !s.trim().is_empty()) {
        let uri = otp_uri(&raw.name, username, seed);
        item.insert(FieldName::OneTimePassword, &uri)?;
    }

    for uri in &login.uris {
        item.push_url(uri.uri.as_deref().unwrap_or_default().trim())?;
    }
    Ok(())
}

/// Builds an `otpauth://` URI from a bare seed. Values that already carry a
/// scheme (`otpauth://`, `steam://`) are kept as they are.
fn otp_uri(title: &str, username: &str, seed: &str) -> String {
    let seed = seed.trim();
    if seed.contains("://") {
        return seed.to_string();
    }

    let secret: String = seed.chars().filter(|c| !c.is_whitespace()).collect();
    let label = if username.is_empty() {
        urlencoding::encode(title).into_owned()
    } else {
        format!(
            "{}:{}",
            urlencoding::encode(title),
            urlencoding::encode(username)
        )
    };
    format!(
        "otpauth://totp/{}?secret={}",
        label,
        urlencoding::encode(&secret)
    )
}

fn map_card(raw: &RawItem, item: &mut NormalizedItem) -> Result<(), FieldMappingError> {
    let Some(card) = raw.card.as_ref() else {
        return Ok(());
    };

    item.insert(
        FieldName::CardholderName,
        card.cardholder_name.as_deref().unwrap_or_default(),
    )?;
    item.insert(FieldName::CardBrand, card.brand.as_deref().unwrap_or_default())?;

    if let Some(number) = card.number.as_deref().map(str::trim) {
        validate_card_number(number)?;
        item.insert(FieldName::CardNumber, number)?;
    }

    if let Some(code) = card.code.as_deref().map(str::trim) {
        if !code.is_empty() && !(code.len() == 3 || code.len() == 4) {
            return Err(FieldMappingError::new(
                FieldName::SecurityCode.as_str(),
                "security code must have 3 or 4 digits",
            ));
        }
        if !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(FieldMappingError::new(
                FieldName::SecurityCode.as_str(),
                "security code is not numeric",
            ));
        }
        item.insert(FieldName::SecurityCode, code)?;
    }

    if let Some(expiry) = expiry_date(card.exp_month.as_ref(), card.exp_year.as_ref())? {
        item.insert(FieldName::ExpiryDate, &expiry)?;
    }
    Ok(())
}

fn validate_card_number(number: &str) -> Result<(), FieldMappingError> {
    let field = FieldName::CardNumber.as_str();
    if number
        .chars()
        .any(|c| !(c.is_ascii_digit() || c == ' ' || c == '-'))
    {
        return Err(FieldMappingError::new(
            field,
            "card number contains characters other than digits, spaces and dashes",
        ));
    }
    let digits = number.chars().filter(char::is_ascii_digit).count();
    if digits > MAX_CARD_DIGITS {
        return Err(FieldMappingError::new(
            field,
            format!("{} digits exceeds the limit of {}", digits, MAX_CARD_DIGITS),
        ));
    }
    Ok(())
}

/// Renders expiry month and year as `YYYY/MM`. Both absent yields `None`.
fn expiry_date(
    month: Option<&serde_json::Value>,
    year: Option<&serde_json::Value>,
) -> Result<Option<String>, FieldMappingError> {
    let field = FieldName::ExpiryDate.as_str();
    let month = json_text(field, month)?;
    let year = json_text(field, year)?;

    let (month, year) = match (month, year) {
        (None, None) => return Ok(None),
        (Some(month), Some(year)) => (month, year),
        (Some(_), None) => {
            return Err(FieldMappingError::new(field, "expiry month without year"));
        }
        (None, Some(_)) => {
            return Err(FieldMappingError::new(field, "expiry year without month"));
        }
    };

    if month.is_empty() || !month.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldMappingError::new(
            field,
            format!("expiry month '{}' is not numeric", month),
        ));
    }
    let month: u32 = month
        .parse()
        .map_err(|_| FieldMappingError::new(field, format!("invalid expiry month '{}'", month)))?;
    if !(1..=12).contains(&month) {
        return Err(FieldMappingError::new(
            field,
            format!("expiry month {} is out of range", month),
        ));
    }

    if year.is_empty() || !year.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldMappingError::new(
            field,
            format!("expiry year '{}' is not numeric", year),
        ));
    }
    let year = match year.len() {
        1 | 2 => format!("20{:0>2}", year),
        4 => year,
        _ => {
            return Err(FieldMappingError::new(
                field,
                format!("invalid expiry year '{}'", year),
            ));
        }
    };

    Ok(Some(format!("{}/{:02}", year, month)))
}

/// Text of a string-or-number JSON value; null and blank strings are absent.
fn json_text(
    field: &str,
    value: Option<&serde_json::Value>,
) -> Result<Option<String>, FieldMappingError> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(FieldMappingError::new(
            field,
            format!("unexpected value {}", other),
        )),
    }
}

fn map_identity(raw: &RawItem, item: &mut NormalizedItem) -> Result<(), FieldMappingError> {
    let Some(identity) = raw.identity.as_ref() else {
        return Ok(());
    };
    let text = |value: &Option<String>| value.as_deref().unwrap_or_default().to_string();

    item.insert(FieldName::NameTitle, &text(&identity.title))?;
    item.insert(FieldName::FirstName, &text(&identity.first_name))?;
    item.insert(FieldName::MiddleName, &text(&identity.middle_name))?;
    item.insert(FieldName::LastName, &text(&identity.last_name))?;
    item.insert(FieldName::Company, &text(&identity.company))?;

    let address = compose_address(
        &[
            text(&identity.address1),
            text(&identity.address2),
            text(&identity.address3),
        ],
        &[
            (" ", [text(&identity.city), text(&identity.postal_code)]),
            (", ", [text(&identity.state), text(&identity.country)]),
        ],
    );
    item.insert(FieldName::Address, &address)?;

    item.insert(FieldName::Phone, &text(&identity.phone))?;
    item.insert(FieldName::Username, &text(&identity.username))?;
    item.insert(FieldName::Email, &text(&identity.email))?;

    // No dedicated destination field for these.
    for (label, value, concealed) in [
        ("social security number", &identity.ssn, true),
        ("passport number", &identity.passport_number, false),
        ("license number", &identity.license_number, false),
    ] {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            item.push_overflow(label, value, concealed)?;
        }
    }
    Ok(())
}

/// Joins street lines and `(separator, parts)` lines, skipping blanks.
fn compose_address(street: &[String], joined: &[(&str, [String; 2])]) -> String {
    let mut out: Vec<String> = street
        .iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    for (separator, parts) in joined {
        let present: Vec<&str> = parts
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect();
        if !present.is_empty() {
            out.push(present.join(separator));
        }
    }
    out.join("\n")
}

fn map_custom_fields(raw: &RawItem, item: &mut NormalizedItem) -> Result<(), FieldMappingError> {
    for (position, field) in raw.fields.iter().enumerate() {
        // Unnamed fields are labelled by their 1-based position.
        let label = match field.name.as_deref().filter(|name| !name.is_empty()) {
            Some(name) => name.to_string(),
            None => format!("field {}", position + 1),
        };
        let concealed = match field.field_type {
            0 | 2 => false,
            1 => true,
            // Linked fields point at another field of the same item.
            3 => continue,
            other => {
                return Err(FieldMappingError::new(
                    label,
                    format!("unknown custom field type {}", other),
                ));
            }
        };

        item.push_overflow(&label, field.value.as_deref().unwrap_or_default(), concealed)?;
    }
    Ok(())
}

/// Item keys that describe vault bookkeeping rather than item content.
const ITEM_METADATA_KEYS: &[&str] = &[
    "collectionIds",
    "creationDate",
    "deletedDate",
    "edit",
    "favorite",
    "folderId",
    "key",
    "object",
    "organizationId",
    "organizationUseTotp",
    "reprompt",
    "revisionDate",
    "secureNote",
    "viewPassword",
];

/// Unmapped keys whose label contains one of these are concealed.
const CONCEALED_KEY_MARKERS: &[&str] = &["credential", "fido2", "history", "key", "secret"];

/// Copies every source value without a slot into the overflow, labelled with
/// its JSON path (`login.fido2Credentials`, `passwordHistory`, ...).
fn map_unmapped(raw: &RawItem, item: &mut NormalizedItem) -> Result<(), FieldMappingError> {
    let mut unmapped: Vec<(String, &serde_json::Value)> = raw
        .extra
        .iter()
        .filter(|(key, _)| !ITEM_METADATA_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value))
        .collect();

    match item.kind {
        ItemKind::Login => {
            if let Some(login) = raw.login.as_ref() {
                unmapped.extend(prefixed("login", &login.extra));
                for (index, uri) in login.uris.iter().enumerate() {
                    let path = format!("login.uris[{}]", index);
                    if let Some(rule) = uri.match_.as_ref() {
                        unmapped.push((format!("{}.match", path), rule));
                    }
                    unmapped.extend(prefixed(&path, &uri.extra));
                }
            }
        }
        ItemKind::SecureNote => {}
        ItemKind::CreditCard => {
            if let Some(card) = raw.card.as_ref() {
                unmapped.extend(prefixed("card", &card.extra));
            }
        }
        ItemKind::Identity => {
            if let Some(identity) = raw.identity.as_ref() {
                unmapped.extend(prefixed("identity", &identity.extra));
            }
        }
    }

    for (label, value) in unmapped {
        let Some(text) = unmapped_text(value) else {
            continue;
        };
        let lower = label.to_ascii_lowercase();
        let concealed = CONCEALED_KEY_MARKERS.iter().any(|marker| lower.contains(marker));
        item.push_overflow(&label, &text, concealed)?;
    }
    Ok(())
}

fn prefixed<'v>(
    path: &str,
    extra: &'v BTreeMap<String, serde_json::Value>,
) -> Vec<(String, &'v serde_json::Value)> {
    extra
        .iter()
        .map(|(key, value)| (format!("{}.{}", path, key), value))
        .collect()
}

/// Strings as they are, anything else as compact JSON. Empty values yield
/// `None`.
fn unmapped_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(a) if a.is_empty() => None,
        serde_json::Value::Object(o) if o.is_empty() => None,
        other => Some(other.to_string()),
    }
}

// ============================================================================
// Normalized -> destination
// ============================================================================

/// One row of a per-kind destination table.
struct Slot {
    name: FieldName,
    id: &'static str,
    label: &'static str,
    field_type: FieldType,
    purpose: Option<FieldPurpose>,
    section: Option<(&'static str, &'static str)>,
}

const IDENTIFICATION: Option<(&str, &str)> = Some(("name", "Identification"));
const ADDRESS: Option<(&str, &str)> = Some(("address", "Address"));
const INTERNET: Option<(&str, &str)> = Some(("internet", "Internet Details"));

const fn slot(
    name: FieldName,
    id: &'static str,
    label: &'static str,
    field_type: FieldType,
    purpose: Option<FieldPurpose>,
    section: Option<(&'static str, &'static str)>,
) -> Slot {
    Slot {
        name,
        id,
        label,
        field_type,
        purpose,
        section,
    }
}

const LOGIN_SLOTS: &[Slot] = &[
    slot(FieldName::Username, "username", "username", FieldType::String, Some(FieldPurpose::Username), None),
    slot(FieldName::Password, "password", "password", FieldType::Concealed, Some(FieldPurpose::Password), None),
    slot(FieldName::OneTimePassword, "totp", "one-time password", FieldType::Otp, None, None),
];

const CARD_SLOTS: &[Slot] = &[
    slot(FieldName::CardholderName, "cardholder", "cardholder name", FieldType::String, None, None),
    slot(FieldName::CardBrand, "type", "type", FieldType::CreditCardType, None, None),
    slot(FieldName::CardNumber, "ccnum", "number", FieldType::CreditCardNumber, None, None),
    slot(FieldName::SecurityCode, "cvv", "verification number", FieldType::Concealed, None, None),
    slot(FieldName::ExpiryDate, "expiry", "expiry date", FieldType::MonthYear, None, None),
];

const IDENTITY_SLOTS: &[Slot] = &[
    slot(FieldName::NameTitle, "title", "title", FieldType::String, None, IDENTIFICATION),
    slot(FieldName::FirstName, "firstname", "first name", FieldType::String, None, IDENTIFICATION),
    slot(FieldName::MiddleName, "middlename", "middle name", FieldType::String, None, IDENTIFICATION),
    slot(FieldName::LastName, "lastname", "last name", FieldType::String, None, IDENTIFICATION),
    slot(FieldName::Company, "company", "company", FieldType::String, None, IDENTIFICATION),
    slot(FieldName::Address, "address", "address", FieldType::String, None, ADDRESS),
    slot(FieldName::Phone, "phone", "phone", FieldType::Phone, None, ADDRESS),
    slot(FieldName::Username, "username", "username", FieldType::String, None, INTERNET),
    slot(FieldName::Email, "email", "email", FieldType::Email, None, INTERNET),
];

fn slots(kind: ItemKind) -> &'static [Slot] {
    match kind {
        ItemKind::Login => LOGIN_SLOTS,
        ItemKind::SecureNote => &[],
        ItemKind::CreditCard => CARD_SLOTS,
        ItemKind::Identity => IDENTITY_SLOTS,
    }
}

fn category(kind: ItemKind) -> Category {
    match kind {
        ItemKind::Login => Category::Login,
        ItemKind::SecureNote => Category::SecureNote,
        ItemKind::CreditCard => Category::CreditCard,
        ItemKind::Identity => Category::Identity,
    }
}

fn declare_section(sections: &mut Vec<Section>, id: &str, label: &str) -> SectionRef {
    if !sections.iter().any(|s| s.id == id) {
        sections.push(Section {
            id: id.to_string(),
            label: Some(label.to_string()),
        });
    }
    SectionRef { id: id.to_string() }
}

/// Lays `item` out in the destination schema.
pub fn denormalize(item: &NormalizedItem) -> DestinationItem {
    let mut sections: Vec<Section> = Vec::new();
    let mut fields = Vec::new();

    if !item.notes.is_empty() || item.kind == ItemKind::SecureNote {
        fields.push(ItemField {
            id: Some(NOTES_FIELD_ID.to_string()),
            section: None,
            field_type: FieldType::String,
            purpose: Some(FieldPurpose::Notes),
            label: "notes".to_string(),
            value: item.notes.clone(),
        });
    }

    for slot in slots(item.kind) {
        let Some(value) = item.get(slot.name) else {
            continue;
        };
        let section = slot
            .section
            .map(|(id, label)| declare_section(&mut sections, id, label));
        fields.push(ItemField {
            id: Some(slot.id.to_string()),
            section,
            field_type: slot.field_type,
            purpose: slot.purpose,
            label: slot.label.to_string(),
            value: value.to_string(),
        });
    }

    for custom in &item.overflow {
        let section = declare_section(&mut sections, CUSTOM_SECTION_ID, CUSTOM_SECTION_LABEL);
        fields.push(ItemField {
            id: None,
            section: Some(section),
            field_type: if custom.concealed {
                FieldType::Concealed
            } else {
                FieldType::String
            },
            purpose: None,
            label: custom.label.clone(),
            value: custom.value.clone(),
        });
    }

    let urls = item
        .urls
        .iter()
        .enumerate()
        .map(|(i, href)| ItemUrl {
            href: href.clone(),
            primary: i == 0,
        })
        .collect();

    DestinationItem {
        title: item.title.clone(),
        category: category(item.kind),
        sections,
        fields,
        urls,
    }
}

/// [`map`] followed by [`denormalize`].
pub fn translate(raw: &RawItem, kind: ItemKind) -> Result<DestinationItem, FieldMappingError> {
    map(raw, kind).map(|item| denormalize(&item))
}

// ============================================================================
// Tests
// ============================================================================
